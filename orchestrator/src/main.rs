//! CLI driver: loads config and corpora, wires providers, runs one
//! query, and prints the event stream. Stands in for the real transport
//! during development.

use futures_util::{pin_mut, StreamExt};
use loreweave_config::EngineConfig;
use loreweave_models::character::sample;
use loreweave_models::{
    QueryEvent, RuleCategory, RulebookCorpus, Section, SectionLevel, SessionCorpus, SessionNote,
};
use loreweave_observability::{init_tracing, TracingConfig};
use orchestrator::providers::{
    CachedEmbedder, EmbeddingClient, HashingEmbedder, LlmClient, MockLlm, MockReply,
    OpenAiEmbeddingClient, OpenAiLlmClient,
};
use orchestrator::stores::{load_rulebook, load_sessions, InMemoryCharacterStore};
use orchestrator::QueryEngine;
use std::collections::BTreeMap;
use std::sync::Arc;
use telemetry::JsonlFeedbackStore;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(TracingConfig::for_service("loreweave"));

    let mut args = std::env::args().skip(1);
    let character_name = args.next().unwrap_or_else(|| "Duskryn Nightwarden".to_string());
    let query: String = args.collect::<Vec<_>>().join(" ");
    let query = if query.is_empty() {
        "What's my AC?".to_string()
    } else {
        query
    };

    let config = EngineConfig::from_env();

    // Providers: real endpoints when configured, offline stand-ins otherwise
    let llm: Arc<dyn LlmClient> = match OpenAiLlmClient::from_env() {
        Ok(client) => Arc::new(client),
        Err(_) => {
            warn!("OPENAI_API_KEY not set; running with the offline stub LLM");
            Arc::new(offline_llm())
        }
    };
    let embedder: Arc<dyn EmbeddingClient> = match std::env::var("OPENAI_API_KEY") {
        Ok(api_key) => {
            let base = std::env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
            let model = std::env::var("LOREWEAVE_EMBED_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string());
            Arc::new(CachedEmbedder::new(
                Arc::new(OpenAiEmbeddingClient::new(base, api_key, model)),
                4096,
            ))
        }
        Err(_) => Arc::new(HashingEmbedder::new()),
    };

    // Stores: files when configured, the built-in demo data otherwise
    let characters = match std::env::var("LOREWEAVE_CHARACTER_DIR") {
        Ok(dir) => InMemoryCharacterStore::from_dir(dir)?,
        Err(_) => InMemoryCharacterStore::new(vec![sample::duskryn()]),
    };
    let sessions = match std::env::var("LOREWEAVE_SESSIONS_FILE") {
        Ok(path) => load_sessions(path)?,
        Err(_) => demo_sessions(),
    };
    let rulebook = match std::env::var("LOREWEAVE_RULEBOOK_FILE") {
        Ok(path) => load_rulebook(path)?,
        Err(_) => demo_rulebook(),
    };

    let feedback_path = std::env::var("LOREWEAVE_FEEDBACK_FILE")
        .unwrap_or_else(|_| "loreweave_feedback.jsonl".to_string());

    let engine = QueryEngine::new(
        config,
        llm,
        embedder,
        Arc::new(characters),
        Arc::new(sessions),
        Arc::new(rulebook),
        Arc::new(JsonlFeedbackStore::new(feedback_path)),
    )?;

    info!(character = %character_name, "❓ {}", query);

    let events = engine.process_query_stream(&query, &character_name);
    pin_mut!(events);

    while let Some(event) = events.next().await {
        match &event {
            QueryEvent::ResponseChunk { content } => print!("{content}"),
            QueryEvent::ResponseComplete => println!(),
            other => println!("[{}] {}", other.kind(), serde_json::to_string(other)?),
        }
    }

    Ok(())
}

/// Offline stub: answers routing calls with a character-summary plan and
/// the final call with a fixed notice.
fn offline_llm() -> MockLlm {
    MockLlm::new(|messages| {
        let system = messages.first().map(|m| m.content.as_str()).unwrap_or("");
        if system.contains("route questions") {
            MockReply::Text(
                r#"{"tools_needed": [{"tool": "character_data", "intention": "character_summary", "confidence": 0.6}]}"#
                    .to_string(),
            )
        } else if system.contains("Extract the proper nouns") {
            MockReply::Text(r#"{"entities": []}"#.to_string())
        } else {
            MockReply::Text(
                "Offline mode: configure OPENAI_API_KEY for real answers. \
                 The retrieved context above is what would ground the reply."
                    .to_string(),
            )
        }
    })
}

fn demo_sessions() -> SessionCorpus {
    let mut npcs = BTreeMap::new();
    npcs.insert(
        "Elara".to_string(),
        "Asked the party to recover the drowned chalice from the Sunken Chapel".to_string(),
    );
    let mut decisions = BTreeMap::new();
    decisions.insert(
        "Duskryn Nightwarden".to_string(),
        vec!["Spared the captured cultist for questioning".to_string()],
    );

    let notes = vec![
        SessionNote {
            session_number: 11,
            date: chrono::NaiveDate::from_ymd_opt(2026, 6, 20).unwrap(),
            title: "The Sunken Chapel".to_string(),
            summary: "The party descended beneath the lake and found the chapel flooded; \
                      Elara's chalice was gone."
                .to_string(),
            key_events: vec![
                "Fought the drowned acolytes".to_string(),
                "Discovered cult markings matching Duskryn's visions".to_string(),
            ],
            npcs,
            locations: vec!["Sunken Chapel".to_string(), "Lake Veles".to_string()],
            encounters: vec!["Drowned acolytes".to_string()],
            spells_used: vec!["Bless".to_string()],
            items: vec!["Cult signet ring".to_string()],
            decisions,
            quotes: vec!["\"The lake keeps what it takes.\"".to_string()],
            cliffhanger: Some("Who moved the chalice before the party arrived?".to_string()),
            summary_embedding: vec![],
            event_embeddings: vec![],
        },
        SessionNote {
            session_number: 12,
            date: chrono::NaiveDate::from_ymd_opt(2026, 6, 27).unwrap(),
            title: "Ashes of Thornhollow".to_string(),
            summary: "Thornhollow's granary burned in the night; the cult left a warning \
                      nailed to the temple door."
                .to_string(),
            key_events: vec!["Tracked the arsonist to the old mill".to_string()],
            npcs: BTreeMap::new(),
            locations: vec!["Thornhollow".to_string()],
            encounters: vec![],
            spells_used: vec![],
            items: vec![],
            decisions: BTreeMap::new(),
            quotes: vec![],
            cliffhanger: None,
            summary_embedding: vec![],
            event_embeddings: vec![],
        },
    ];

    SessionCorpus::new(notes).expect("demo sessions are well-formed")
}

fn demo_rulebook() -> RulebookCorpus {
    let sections = vec![
        Section {
            id: 1,
            title: "Combat".to_string(),
            level: SectionLevel::Chapter,
            content: String::new(),
            parent_id: None,
            children_ids: vec![2, 3],
            categories: vec![RuleCategory::Combat],
            vector: vec![],
        },
        Section {
            id: 2,
            title: "Grappling".to_string(),
            level: SectionLevel::Leaf,
            content: "When you want to grab a creature or wrestle with it, you can use the \
                      Attack action to make a special melee attack, a grapple. The target \
                      must be no more than one size larger than you. Using at least one \
                      free hand, you try to seize the target by making a grapple check: a \
                      Strength (Athletics) check contested by the target's Strength \
                      (Athletics) or Dexterity (Acrobatics) check."
                .to_string(),
            parent_id: Some(1),
            children_ids: vec![],
            categories: vec![RuleCategory::Combat, RuleCategory::AbilitiesSkills],
            vector: vec![],
        },
        Section {
            id: 3,
            title: "Opportunity Attacks".to_string(),
            level: SectionLevel::Leaf,
            content: "You can make an opportunity attack when a hostile creature that you \
                      can see moves out of your reach."
                .to_string(),
            parent_id: Some(1),
            children_ids: vec![],
            categories: vec![RuleCategory::Combat],
            vector: vec![],
        },
        Section {
            id: 4,
            title: "Resting".to_string(),
            level: SectionLevel::Leaf,
            content: "A short rest is a period of downtime, at least 1 hour long. A long \
                      rest is a period of extended downtime, at least 8 hours long."
                .to_string(),
            parent_id: None,
            children_ids: vec![],
            categories: vec![RuleCategory::Exploration],
            vector: vec![],
        },
    ];

    RulebookCorpus::new(sections).expect("demo rulebook is well-formed")
}
