//! The three matching strategies, evaluated per searchable field.

use crate::normalize::normalize;
use loreweave_models::MatchStrategy;
use strsim::normalized_levenshtein;

/// Minimum entity length for the substring strategy.
const MIN_SUBSTRING_LEN: usize = 3;

/// Fixed confidence for a substring hit.
const SUBSTRING_CONFIDENCE: f32 = 0.9;

/// Run all three strategies against one candidate field and keep the best.
/// Ties resolve in declared order: exact, substring, fuzzy.
pub fn best_match(
    entity_norm: &str,
    candidate: &str,
    fuzzy_threshold: f32,
) -> Option<(MatchStrategy, f32)> {
    let candidate_norm = normalize(candidate);
    if entity_norm.is_empty() || candidate_norm.is_empty() {
        return None;
    }

    let mut best: Option<(MatchStrategy, f32)> = None;

    if candidate_norm == entity_norm {
        best = Some((MatchStrategy::Exact, 1.0));
    }

    if entity_norm.len() >= MIN_SUBSTRING_LEN
        && (candidate_norm.contains(entity_norm) || entity_norm.contains(candidate_norm.as_str()))
    {
        best = pick(best, (MatchStrategy::Substring, SUBSTRING_CONFIDENCE));
    }

    let similarity = normalized_levenshtein(entity_norm, &candidate_norm) as f32;
    if similarity >= fuzzy_threshold {
        best = pick(best, (MatchStrategy::Fuzzy, similarity));
    }

    best
}

/// Keep the higher-confidence candidate; the incumbent wins ties because
/// strategies are tried in declared order.
fn pick(
    current: Option<(MatchStrategy, f32)>,
    challenger: (MatchStrategy, f32),
) -> Option<(MatchStrategy, f32)> {
    match current {
        Some(incumbent) if incumbent.1 >= challenger.1 => Some(incumbent),
        _ => Some(challenger),
    }
}

/// Word-level scan used for long content fields where whole-string fuzzy
/// comparison is meaningless. Exact token-run beats raw containment.
pub fn content_match(entity_norm: &str, content: &str) -> Option<(MatchStrategy, f32)> {
    if entity_norm.len() < MIN_SUBSTRING_LEN {
        return None;
    }
    let content_lower = content.to_lowercase();
    if !content_lower.contains(entity_norm) {
        return None;
    }

    // Whole-word occurrence counts as exact; mid-word containment as substring
    let bounded = content_lower
        .match_indices(entity_norm)
        .any(|(idx, matched)| {
            let before_ok = idx == 0
                || !content_lower[..idx]
                    .chars()
                    .next_back()
                    .map(char::is_alphanumeric)
                    .unwrap_or(false);
            let after_ok = content_lower[idx + matched.len()..]
                .chars()
                .next()
                .map(|c| !c.is_alphanumeric())
                .unwrap_or(true);
            before_ok && after_ok
        });

    if bounded {
        Some((MatchStrategy::Exact, 1.0))
    } else {
        Some((MatchStrategy::Substring, SUBSTRING_CONFIDENCE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_beats_everything() {
        let (strategy, confidence) = best_match("elara", "Elara", 0.75).unwrap();
        assert_eq!(strategy, MatchStrategy::Exact);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn exact_wins_tie_against_fuzzy_at_full_similarity() {
        // identical strings give fuzzy similarity 1.0; declared order keeps exact
        let (strategy, _) = best_match("grappling", "grappling", 0.75).unwrap();
        assert_eq!(strategy, MatchStrategy::Exact);
    }

    #[test]
    fn substring_requires_three_chars() {
        assert!(best_match("ac", "black armor", 0.75).is_none());
        let (strategy, confidence) = best_match("athletics", "Athletics (Str)", 0.75).unwrap();
        assert_eq!(strategy, MatchStrategy::Substring);
        assert_eq!(confidence, 0.9);
    }

    #[test]
    fn fuzzy_catches_near_misses() {
        // one edit away: similarity above 0.9 and no containment either way
        let hit = best_match("eldarith of regret", "Eldaryth of Regret", 0.75).unwrap();
        assert_eq!(hit.0, MatchStrategy::Fuzzy);
        assert!(hit.1 > 0.9);
    }

    #[test]
    fn fuzzy_below_threshold_is_no_match() {
        assert!(best_match("elara", "grimwald", 0.75).is_none());
    }

    #[test]
    fn content_match_distinguishes_word_boundaries() {
        let (strategy, _) = content_match("grappling", "Rules for grappling a foe.").unwrap();
        assert_eq!(strategy, MatchStrategy::Exact);

        let (strategy, _) = content_match("rapp", "Rules for grappling a foe.").unwrap();
        assert_eq!(strategy, MatchStrategy::Substring);
    }
}
