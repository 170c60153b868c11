//! Calibration: temperature scaling and per-label thresholding.
//!
//! The temperature is fit offline on a labelled validation set and
//! shipped with the deployment; here it is just applied.

use crate::backends::NUM_LABELS;
use loreweave_config::RoutingThresholds;

/// Calibrated probabilities and the boolean multi-label decision.
#[derive(Debug, Clone)]
pub struct CalibratedDecision {
    /// character_data, session_notes, rulebook, needs_context
    pub probs: [f32; NUM_LABELS],
    pub decisions: [bool; NUM_LABELS],
    /// 1 − max(tool probability); low risk means the classifier is sure
    pub risk: f32,
}

#[derive(Debug, Clone)]
pub struct Calibrator {
    temperature: f32,
    thresholds: RoutingThresholds,
}

impl Calibrator {
    pub fn new(temperature: f32, thresholds: RoutingThresholds) -> Self {
        // A degenerate temperature would blow up the sigmoid
        let temperature = if temperature <= 0.0 { 1.0 } else { temperature };
        Self {
            temperature,
            thresholds,
        }
    }

    pub fn calibrate(&self, logits: [f32; NUM_LABELS]) -> CalibratedDecision {
        let mut probs = [0.0f32; NUM_LABELS];
        for (prob, logit) in probs.iter_mut().zip(logits) {
            *prob = sigmoid(logit / self.temperature);
        }

        let thresholds = [
            self.thresholds.character,
            self.thresholds.session_notes,
            self.thresholds.rulebook,
            self.thresholds.needs_context,
        ];

        let mut decisions = [false; NUM_LABELS];
        for idx in 0..NUM_LABELS {
            decisions[idx] = probs[idx] >= thresholds[idx];
        }

        // Risk ignores the needs_context head
        let max_tool_prob = probs[..3].iter().copied().fold(0.0f32, f32::max);
        let risk = 1.0 - max_tool_prob;

        CalibratedDecision {
            probs,
            decisions,
            risk,
        }
    }

    /// True when every selected tool clears its threshold by the margin.
    pub fn confident(&self, decision: &CalibratedDecision, margin: f32) -> bool {
        let thresholds = [
            self.thresholds.character,
            self.thresholds.session_notes,
            self.thresholds.rulebook,
        ];

        let mut any = false;
        for idx in 0..3 {
            if decision.decisions[idx] {
                any = true;
                if decision.probs[idx] < thresholds[idx] + margin {
                    return false;
                }
            }
        }
        any
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibrator() -> Calibrator {
        Calibrator::new(1.0, RoutingThresholds::default())
    }

    #[test]
    fn high_logit_clears_threshold() {
        let decision = calibrator().calibrate([3.0, -3.0, -3.0, -3.0]);
        assert!(decision.decisions[0]);
        assert!(!decision.decisions[1]);
        assert!(decision.risk < 0.1);
    }

    #[test]
    fn temperature_softens_probabilities() {
        let sharp = Calibrator::new(0.5, RoutingThresholds::default()).calibrate([2.0, 0.0, 0.0, 0.0]);
        let soft = Calibrator::new(4.0, RoutingThresholds::default()).calibrate([2.0, 0.0, 0.0, 0.0]);
        assert!(sharp.probs[0] > soft.probs[0]);
    }

    #[test]
    fn confident_requires_margin() {
        let calibrator = calibrator();
        // probability just over threshold but inside the margin
        let logit = logit_for(0.6);
        let decision = calibrator.calibrate([logit, -3.0, -3.0, -3.0]);
        assert!(decision.decisions[0]);
        assert!(!calibrator.confident(&decision, 0.1));

        let decision = calibrator.calibrate([logit_for(0.9), -3.0, -3.0, -3.0]);
        assert!(calibrator.confident(&decision, 0.1));
    }

    #[test]
    fn no_tool_selected_is_not_confident() {
        let calibrator = calibrator();
        let decision = calibrator.calibrate([-3.0, -3.0, -3.0, -3.0]);
        assert!(!calibrator.confident(&decision, 0.1));
    }

    fn logit_for(p: f32) -> f32 {
        (p / (1.0 - p)).ln()
    }
}
