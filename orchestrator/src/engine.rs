//! The query engine and its state machine.
//!
//! One instance owns every store, provider, cache, and the local router;
//! it is reentrant across queries. Within a query the stages run in
//! strict order: local routing, (optional) LLM routing, entity
//! resolution, parallel retrieval, context assembly, final streaming.
//! Metadata events are emitted in a fixed order: routing, entities,
//! context_sources, response chunks, performance.

use crate::assemble::{assemble, ToolSlice};
use crate::errors::{EngineError, EngineResult};
use crate::parse;
use crate::plan;
use crate::providers::{ChatMessage, EmbeddingClient, LlmClient};
use crate::stores::CharacterStore;
use async_stream::stream;
use character_rag::CharacterRetriever;
use entity_search::{section_to_tool, EntitySearchEngine};
use futures::Stream;
use futures_util::StreamExt;
use loreweave_config::EngineConfig;
use loreweave_models::{
    Character, ContextSourcesMetadata, EntitiesMetadata, EntitySearchResult, HistoryTurn,
    PerformanceMetrics, Query, QueryEvent, RoutingDecision, RoutingMetadata, RulebookCorpus,
    SessionCorpus, StageTimings, TokenCounts, Tool, ToolQueryInput, estimate_tokens,
    MAX_HISTORY_TURNS,
};
use parking_lot::Mutex;
use prompts::{entity_extractor_prompt, final_answer_prompt, tool_selector_prompt, Prompt};
use query_router::{FastpathHit, LocalRouteOutcome, LocalRouter};
use rulebook_rag::RulebookRetriever;
use session_rag::SessionRetriever;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::{FeedbackSink, QueryRecord};
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

const ROUTING_MAX_TOKENS: u32 = 512;
const ANSWER_MAX_TOKENS: u32 = 1024;

/// The central orchestrator.
pub struct QueryEngine {
    config: EngineConfig,
    llm: Arc<dyn LlmClient>,
    embedder: Arc<dyn EmbeddingClient>,
    characters: Arc<dyn CharacterStore>,
    sessions: Arc<SessionCorpus>,
    rulebook: Arc<RulebookCorpus>,
    router: Arc<LocalRouter>,
    entity_engine: EntitySearchEngine,
    feedback: Arc<dyn FeedbackSink>,
    /// Per-character conversation history, single writer per session
    history: Mutex<HashMap<String, Vec<HistoryTurn>>>,
}

impl QueryEngine {
    /// Build the engine, verifying the registry and corpus integrity.
    /// Either failing is a programmer error and refuses startup.
    pub fn new(
        config: EngineConfig,
        llm: Arc<dyn LlmClient>,
        embedder: Arc<dyn EmbeddingClient>,
        characters: Arc<dyn CharacterStore>,
        sessions: Arc<SessionCorpus>,
        rulebook: Arc<RulebookCorpus>,
        feedback: Arc<dyn FeedbackSink>,
    ) -> EngineResult<Self> {
        loreweave_registry::verify().map_err(|e| EngineError::Internal(e.to_string()))?;
        rulebook
            .verify_category_index()
            .map_err(|e| EngineError::Internal(e.to_string()))?;

        let artifact_path = std::env::var("LOREWEAVE_FEWSHOT_ARTIFACT").ok();
        let router = Arc::new(LocalRouter::new(&config.routing, artifact_path.as_deref()));
        let entity_engine = EntitySearchEngine::new(config.entity.fuzzy_threshold);

        info!(
            sessions = sessions.len(),
            rulebook_sections = rulebook.len(),
            "🚀 Query engine ready"
        );

        Ok(Self {
            config,
            llm,
            embedder,
            characters,
            sessions,
            rulebook,
            router,
            entity_engine,
            feedback,
            history: Mutex::new(HashMap::new()),
        })
    }

    /// Process one query, yielding the tagged event sequence.
    ///
    /// Dropping the returned stream cancels the query: in-flight stage
    /// futures are dropped at their next suspension point and no
    /// telemetry is written for the cancelled query.
    pub fn process_query_stream<'a>(
        &'a self,
        user_query: &str,
        character_name: &str,
    ) -> impl Stream<Item = QueryEvent> + Send + 'a {
        let user_query = user_query.to_string();
        let character_name = character_name.to_string();

        stream! {
            let total_start = Instant::now();
            let qid = Uuid::new_v4().to_string();
            let mut timings = StageTimings::default();

            yield QueryEvent::MessageReceived { query_id: qid.clone() };

            // ---- Input validation -------------------------------------
            let character = match self.characters.load_character(&character_name).await {
                Ok(Some(character)) => character,
                Ok(None) => {
                    yield QueryEvent::Error {
                        message: format!("Unknown character: {character_name}"),
                    };
                    return;
                }
                Err(e) => {
                    error!("Character store failure: {}", e);
                    yield QueryEvent::Error { message: "Internal server error".to_string() };
                    return;
                }
            };

            let session_history = self.history_for(&character_name);
            let query = match Query::new(user_query.clone(), character_name.clone(), session_history) {
                Ok(query) => query,
                Err(e) => {
                    yield QueryEvent::Error { message: e.to_string() };
                    return;
                }
            };

            // ---- EXAMINE_LOCAL ----------------------------------------
            let mut fastpath_hit = false;
            let mut local_risk: Option<f32> = None;
            let mut classifier_probs: Option<Vec<f32>> = None;
            let mut with_context = false;
            let mut ctx_snippets: Vec<(String, String)> = Vec::new();
            let mut canned_reply: Option<String> = None;
            let mut decision: Option<RoutingDecision> = None;

            if self.config.routing.local_enabled {
                let local_start = Instant::now();
                let outcome = self.run_local(&query.text).await;
                timings.local_ms = elapsed_ms(local_start).max(1);

                match outcome {
                    Some(LocalRouteOutcome::Fastpath(hit)) => {
                        fastpath_hit = true;
                        timings.fastpath_ms = timings.local_ms.max(1);
                        match hit {
                            FastpathHit::CannedReply(reply) => canned_reply = Some(reply),
                            FastpathHit::ToolPlan { tool, intention } => {
                                decision = Some(plan::from_fastpath(tool, intention));
                            }
                        }
                    }
                    Some(LocalRouteOutcome::Abstain { risk }) => {
                        local_risk = Some(risk);
                        decision = Some(plan::abstained());
                    }
                    Some(LocalRouteOutcome::Plan { tools, probs, risk, with_context: ctx, ctx_snippets: snippets }) => {
                        local_risk = Some(risk);
                        classifier_probs = Some(probs.to_vec());
                        with_context = ctx;
                        ctx_snippets = snippets;
                        match plan::from_local(tools) {
                            Ok(local_plan) => decision = Some(local_plan),
                            Err(e) => warn!("Local plan invalid ({}), falling back to LLM", e),
                        }
                    }
                    Some(LocalRouteOutcome::Decline { probs, risk, with_context: ctx, ctx_snippets: snippets }) => {
                        local_risk = Some(risk);
                        classifier_probs = Some(probs.to_vec());
                        with_context = ctx;
                        ctx_snippets = snippets;
                    }
                    None => {}
                }
            }

            // ---- Fastpath canned reply: no retrieval, no LLM ----------
            if let Some(reply) = canned_reply {
                yield QueryEvent::RoutingMetadata(RoutingMetadata {
                    tools: vec![],
                    intentions: BTreeMap::new(),
                    source: loreweave_models::DecisionSource::Local,
                    abstained: false,
                    fastpath_hit: true,
                    fallback: false,
                });
                yield QueryEvent::EntitiesMetadata(EntitiesMetadata { results: vec![] });
                yield QueryEvent::ContextSources(ContextSourcesMetadata {
                    sources: vec![],
                    omitted: vec![],
                });
                yield QueryEvent::ResponseChunk { content: reply.clone() };

                timings.total_ms = elapsed_ms(total_start).max(1);
                yield QueryEvent::PerformanceMetrics(PerformanceMetrics {
                    stages: timings.clone(),
                    token_counts: None,
                });
                yield QueryEvent::ResponseComplete;

                let empty_plan = RoutingDecision {
                    tools_needed: vec![],
                    entities: vec![],
                    source: loreweave_models::DecisionSource::Local,
                    abstained: false,
                };
                self.finish_query(&qid, &query, true, classifier_probs, local_risk, false,
                    &empty_plan, with_context, timings, None, "complete", &reply);
                return;
            }

            // ---- LLM_ROUTE (when the local layer declined) ------------
            let mut routing_fallback = false;
            let decision = match decision {
                Some(decision) => decision,
                None => {
                    let routing_start = Instant::now();
                    let (routed, fallback) = self.llm_route(&query, &ctx_snippets).await;
                    timings.routing_llm_ms = elapsed_ms(routing_start).max(1);
                    routing_fallback = fallback;
                    routed
                }
            };

            // ---- Emit routing metadata --------------------------------
            let mut intentions_map = BTreeMap::new();
            for need in &decision.tools_needed {
                intentions_map.insert(
                    need.tool.as_str().to_string(),
                    need.intentions.iter().map(|i| i.as_str().to_string()).collect(),
                );
            }
            yield QueryEvent::RoutingMetadata(RoutingMetadata {
                tools: decision.selected_tools(),
                intentions: intentions_map,
                source: decision.source,
                abstained: decision.abstained,
                fastpath_hit,
                fallback: routing_fallback,
            });

            // ---- RESOLVE_ENTITIES -------------------------------------
            let resolution_start = Instant::now();
            let selected_tools = decision.selected_tools();
            let entity_results = if decision.abstained {
                HashMap::new()
            } else {
                match self.entity_engine.resolve(
                    &decision.entities,
                    &selected_tools,
                    Some(&character),
                    Some(self.sessions.as_ref()),
                    Some(self.rulebook.as_ref()),
                ) {
                    Ok(results) => results,
                    Err(e) => {
                        // Missing storage for a selected tool is fatal
                        error!("Entity resolution aborted: {}", e);
                        yield QueryEvent::Error { message: "Internal server error".to_string() };
                        self.finish_query(&qid, &query, fastpath_hit, classifier_probs, local_risk,
                            false, &decision, with_context, timings, None, "error", "");
                        return;
                    }
                }
            };
            timings.entity_resolution_ms = elapsed_ms(resolution_start);

            let mut sorted_results: Vec<EntitySearchResult> =
                entity_results.values().cloned().collect();
            sorted_results.sort_by(|a, b| a.entity_name.cmp(&b.entity_name));
            yield QueryEvent::EntitiesMetadata(EntitiesMetadata { results: sorted_results });

            // ---- DISPATCH_RETRIEVERS ----------------------------------
            let inputs = build_tool_inputs(&decision, &entity_results);
            let (slices, omitted, retrieval_ms) = self.dispatch(&character, &query, inputs).await;
            timings.retrieval_ms = retrieval_ms;

            let sources: Vec<Tool> = slices.iter().map(|(tool, _)| *tool).collect();
            yield QueryEvent::ContextSources(ContextSourcesMetadata {
                sources: sources.clone(),
                omitted: omitted.clone(),
            });

            // ---- ASSEMBLE_CONTEXT -------------------------------------
            let context = assemble(&decision, slices, &entity_results);
            let omitted_names: Vec<&str> = omitted.iter().map(|t| t.as_str()).collect();
            let prompt = final_answer_prompt(&context, &query.text, &query.session_history, &omitted_names);
            let prompt_tokens = estimate_tokens(&prompt.system) + estimate_tokens(&prompt.user);

            // ---- FINAL_STREAM -----------------------------------------
            let final_start = Instant::now();
            let final_budget = Duration::from_millis(self.config.limits.final_llm_timeout_ms);
            let messages = vec![
                ChatMessage::system(prompt.system.clone()),
                ChatMessage::user(prompt.user.clone()),
            ];

            let llm_stream = match timeout(final_budget, self.llm.stream(&messages, ANSWER_MAX_TOKENS)).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    error!("Final LLM call failed before streaming: {}", e);
                    yield QueryEvent::Error { message: "The assistant could not produce an answer".to_string() };
                    self.finish_query(&qid, &query, fastpath_hit, classifier_probs, local_risk,
                        routing_fallback, &decision, with_context, timings, None, "error", "");
                    return;
                }
                Err(_) => {
                    yield QueryEvent::Error { message: "The answer timed out".to_string() };
                    self.finish_query(&qid, &query, fastpath_hit, classifier_probs, local_risk,
                        routing_fallback, &decision, with_context, timings, None, "error", "");
                    return;
                }
            };

            let mut llm_stream = llm_stream;
            let mut answer = String::new();
            let mut stream_error: Option<String> = None;

            loop {
                let remaining = final_budget.saturating_sub(final_start.elapsed());
                if remaining.is_zero() {
                    stream_error = Some("answer stream timed out".to_string());
                    break;
                }
                match timeout(remaining, llm_stream.next()).await {
                    Ok(Some(Ok(chunk))) => {
                        answer.push_str(&chunk);
                        yield QueryEvent::ResponseChunk { content: chunk };
                    }
                    Ok(Some(Err(e))) => {
                        stream_error = Some(e.to_string());
                        break;
                    }
                    Ok(None) => break,
                    Err(_) => {
                        stream_error = Some("answer stream timed out".to_string());
                        break;
                    }
                }
            }

            timings.final_llm_ms = elapsed_ms(final_start).max(1);
            timings.total_ms = elapsed_ms(total_start).max(1);

            if let Some(message) = stream_error {
                // Failure mid-stream ends with an error event and no
                // response_complete, whether or not chunks were emitted
                error!("Final stream failed: {}", message);
                yield QueryEvent::Error { message: "The answer was interrupted".to_string() };
                self.finish_query(&qid, &query, fastpath_hit, classifier_probs, local_risk,
                    routing_fallback, &decision, with_context, timings, None, "error", &answer);
                return;
            }

            let token_counts = TokenCounts {
                prompt_tokens,
                completion_tokens: estimate_tokens(&answer),
            };
            yield QueryEvent::PerformanceMetrics(PerformanceMetrics {
                stages: timings.clone(),
                token_counts: Some(token_counts.clone()),
            });
            yield QueryEvent::ResponseComplete;

            self.finish_query(&qid, &query, fastpath_hit, classifier_probs, local_risk,
                routing_fallback, &decision, with_context, timings, Some(token_counts),
                "complete", &answer);
        }
    }

    /// Run the local router inside its latency budget. `None` means the
    /// local layer produced nothing usable (disabled, timed out, or
    /// panicked) and LLM routing takes over.
    async fn run_local(&self, query_text: &str) -> Option<LocalRouteOutcome> {
        let budget = Duration::from_millis(self.config.limits.local_classifier_timeout_ms);
        let router = Arc::clone(&self.router);
        let text = query_text.to_string();

        match timeout(budget, tokio::task::spawn_blocking(move || router.route(&text))).await {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(e)) => {
                error!("Local router task failed: {}", e);
                None
            }
            Err(_) => {
                warn!("Local router exceeded {}ms, declining", budget.as_millis());
                None
            }
        }
    }

    /// The two concurrent routing calls with one repair attempt each.
    /// Returns the decision and whether the heuristic fallback was used.
    async fn llm_route(&self, query: &Query, ctx_snippets: &[(String, String)]) -> (RoutingDecision, bool) {
        let selector = tool_selector_prompt(&query.text, ctx_snippets);
        let extractor = entity_extractor_prompt(&query.text, ctx_snippets);
        let max_intentions = self.config.limits.max_intentions_per_tool;

        let (tools, entities) = tokio::join!(
            self.call_selector(&selector, max_intentions),
            self.call_extractor(&extractor),
        );

        let entities = entities.unwrap_or_default();

        match tools {
            Some(tools_needed) if !tools_needed.is_empty() => {
                match plan::from_llm(tools_needed, entities.clone()) {
                    Ok(decision) => (decision, false),
                    Err(e) => {
                        warn!("LLM plan failed validation ({}), using fallback", e);
                        (plan::fallback(entities), true)
                    }
                }
            }
            _ => {
                warn!("Routing LLM produced no usable plan, using fallback");
                (plan::fallback(entities), true)
            }
        }
    }

    async fn call_selector(
        &self,
        prompt: &Prompt,
        max_intentions: usize,
    ) -> Option<Vec<loreweave_models::ToolNeed>> {
        let reply = self.routing_call(prompt).await?;
        match parse::parse_selector(&reply, max_intentions) {
            Ok(needs) => Some(needs),
            Err(e) => {
                warn!("Selector parse failed ({}), attempting repair", e);
                let repaired = self.repair_call(&reply).await?;
                parse::parse_selector(&repaired, max_intentions)
                    .map_err(|e| warn!("Selector repair failed: {}", e))
                    .ok()
            }
        }
    }

    async fn call_extractor(&self, prompt: &Prompt) -> Option<Vec<loreweave_models::Entity>> {
        let reply = self.routing_call(prompt).await?;
        match parse::parse_entities(&reply) {
            Ok(entities) => Some(entities),
            Err(e) => {
                warn!("Extractor parse failed ({}), attempting repair", e);
                let repaired = self.repair_call(&reply).await?;
                parse::parse_entities(&repaired)
                    .map_err(|e| warn!("Extractor repair failed: {}", e))
                    .ok()
            }
        }
    }

    async fn routing_call(&self, prompt: &Prompt) -> Option<String> {
        let budget = Duration::from_millis(self.config.limits.routing_llm_timeout_ms);
        let messages = vec![
            ChatMessage::system(prompt.system.clone()),
            ChatMessage::user(prompt.user.clone()),
        ];
        match timeout(budget, self.llm.call(&messages, ROUTING_MAX_TOKENS)).await {
            Ok(Ok(reply)) => Some(reply),
            Ok(Err(e)) => {
                warn!("Routing LLM call failed: {}", e);
                None
            }
            Err(_) => {
                warn!("Routing LLM call timed out");
                None
            }
        }
    }

    /// One-shot JSON repair: ask the model to reshape its own reply.
    async fn repair_call(&self, malformed: &str) -> Option<String> {
        let prompt = Prompt {
            system: "Rewrite the following into strictly valid JSON preserving its meaning. \
                     Output JSON only."
                .to_string(),
            user: malformed.to_string(),
        };
        self.routing_call(&prompt).await
    }

    /// Launch every selected retriever concurrently, each under the
    /// retrieval timeout. Failed or timed-out tools are omitted.
    async fn dispatch(
        &self,
        character: &Character,
        query: &Query,
        inputs: Vec<ToolQueryInput>,
    ) -> (Vec<(Tool, ToolSlice)>, Vec<Tool>, BTreeMap<String, u64>) {
        let budget = Duration::from_millis(self.config.limits.retrieval_timeout_ms);

        // One query embedding shared by the semantic retrievers
        let needs_embedding = inputs
            .iter()
            .any(|input| matches!(input.tool, Tool::SessionNotes | Tool::Rulebook));
        let query_embedding = if needs_embedding {
            match timeout(budget, self.embedder.embed(&query.text)).await {
                Ok(Ok(vector)) => Some(vector),
                Ok(Err(e)) => {
                    warn!("Query embedding failed ({}), semantic scoring disabled", e);
                    None
                }
                Err(_) => {
                    warn!("Query embedding timed out, semantic scoring disabled");
                    None
                }
            }
        } else {
            None
        };

        // Context hints for rulebook scoring: recent question texts
        let context_hints: Vec<String> = query
            .session_history
            .iter()
            .rev()
            .take(3)
            .map(|turn| turn.query.clone())
            .collect();

        let tasks = inputs.into_iter().map(|input| {
            let tool = input.tool;
            let embedding = query_embedding.clone();
            let hints = context_hints.clone();
            async move {
                let started = Instant::now();
                let result = timeout(
                    budget,
                    self.run_retriever(character, input, embedding.as_deref(), &hints),
                )
                .await;
                let took = elapsed_ms(started).max(1);
                match result {
                    Ok(Ok(slice)) => (tool, took, Some(slice)),
                    Ok(Err(e)) => {
                        warn!("Retriever {} failed: {}", tool.as_str(), e);
                        (tool, took, None)
                    }
                    Err(_) => {
                        warn!("Retriever {} timed out", tool.as_str());
                        (tool, took, None)
                    }
                }
            }
        });

        let outcomes = futures::future::join_all(tasks).await;

        let mut slices = Vec::new();
        let mut omitted = Vec::new();
        let mut retrieval_ms = BTreeMap::new();
        for (tool, took, slice) in outcomes {
            retrieval_ms.insert(tool.as_str().to_string(), took);
            match slice {
                Some(slice) => slices.push((tool, slice)),
                None => omitted.push(tool),
            }
        }
        (slices, omitted, retrieval_ms)
    }

    async fn run_retriever(
        &self,
        character: &Character,
        input: ToolQueryInput,
        query_embedding: Option<&[f32]>,
        context_hints: &[String],
    ) -> EngineResult<ToolSlice> {
        match input.tool {
            Tool::CharacterData => {
                let slice = CharacterRetriever::query(character, &input)
                    .map_err(|e| EngineError::Internal(e.to_string()))?;
                Ok(ToolSlice::Character(slice))
            }
            Tool::SessionNotes => {
                let hits = SessionRetriever::query(
                    self.sessions.as_ref(),
                    &input,
                    query_embedding,
                    self.config.retrieval.session.top_k,
                )
                .map_err(|e| EngineError::Internal(e.to_string()))?;
                Ok(ToolSlice::Sessions(hits))
            }
            Tool::Rulebook => {
                let hits = RulebookRetriever::query(
                    self.rulebook.as_ref(),
                    &input,
                    query_embedding,
                    context_hints,
                    self.config.retrieval.rulebook.k,
                    self.config.retrieval.rulebook.token_budget,
                )
                .map_err(|e| EngineError::Internal(e.to_string()))?;
                Ok(ToolSlice::Rules(hits))
            }
        }
    }

    fn history_for(&self, character_name: &str) -> Vec<HistoryTurn> {
        self.history
            .lock()
            .get(&character_name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    /// Terminal bookkeeping: telemetry record (exactly one, regardless
    /// of outcome), context-detector feed, and history update.
    #[allow(clippy::too_many_arguments)]
    fn finish_query(
        &self,
        qid: &str,
        query: &Query,
        fastpath_hit: bool,
        classifier_probs: Option<Vec<f32>>,
        risk: Option<f32>,
        fallback: bool,
        decision: &RoutingDecision,
        with_context: bool,
        timings: StageTimings,
        token_counts: Option<TokenCounts>,
        outcome: &str,
        answer: &str,
    ) {
        let mut plan_map = BTreeMap::new();
        for need in &decision.tools_needed {
            plan_map.insert(
                need.tool.as_str().to_string(),
                need.intentions
                    .iter()
                    .map(|i| i.as_str().to_string())
                    .collect(),
            );
        }
        let record = QueryRecord {
            qid: qid.to_string(),
            timestamp: chrono::Utc::now(),
            query_text: query.text.clone(),
            character_name: query.character_name.clone(),
            fastpath_hit,
            classifier_probs,
            risk,
            abstain: decision.abstained,
            plan: plan_map,
            fallback,
            with_context,
            latency_ms: timings,
            token_counts,
            labels_gold: vec![],
            result_quality: None,
            outcome: outcome.to_string(),
        };
        if let Err(e) = self.feedback.append(&record) {
            error!("Telemetry append failed: {}", e);
        }

        if outcome == "complete" && !answer.is_empty() {
            self.router.observe(&query.text, answer);
            let mut history = self.history.lock();
            let turns = history
                .entry(query.character_name.to_lowercase())
                .or_default();
            turns.push(HistoryTurn {
                query: query.text.clone(),
                answer: answer.to_string(),
            });
            if turns.len() > MAX_HISTORY_TURNS {
                let excess = turns.len() - MAX_HISTORY_TURNS;
                turns.drain(..excess);
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Per-tool retrieval inputs from the routing decision and resolution
/// results. Multi-location entities reach every selected tool they
/// matched in; entities that matched nowhere reach every selected tool.
fn build_tool_inputs(
    decision: &RoutingDecision,
    entity_results: &HashMap<String, EntitySearchResult>,
) -> Vec<ToolQueryInput> {
    decision
        .tools_needed
        .iter()
        .map(|need| {
            let mut entities = Vec::new();
            let mut auto_include = Vec::new();

            let mut names: Vec<&String> = entity_results.keys().collect();
            names.sort();

            for name in names {
                let result = &entity_results[name];
                let matched_tools = result.matched_tools();
                let relevant = matched_tools.contains(&need.tool) || matched_tools.is_empty();
                if relevant {
                    entities.push(result.entity_name.clone());
                }
                for entity_match in &result.matches {
                    if entity_match.source_tool == need.tool
                        && section_to_tool(&entity_match.section_path) == Some(need.tool)
                        && !auto_include.contains(&entity_match.section_path)
                    {
                        auto_include.push(entity_match.section_path.clone());
                    }
                }
            }

            ToolQueryInput {
                tool: need.tool,
                intentions: need.intentions.clone(),
                entities,
                auto_include_sections: auto_include,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreweave_models::{
        CharacterIntention, DecisionSource, EntityMatch, Intention, MatchStrategy, ToolNeed,
    };

    fn decision_with_tools(tools: Vec<Tool>) -> RoutingDecision {
        RoutingDecision {
            tools_needed: tools
                .into_iter()
                .map(|tool| ToolNeed {
                    tool,
                    intentions: vec![match tool {
                        Tool::CharacterData => {
                            Intention::Character(CharacterIntention::CombatInfo)
                        }
                        Tool::SessionNotes => Intention::parse(tool, "npc_info").unwrap(),
                        Tool::Rulebook => Intention::parse(tool, "rule_mechanics").unwrap(),
                    }],
                    confidence: 0.9,
                })
                .collect(),
            entities: vec![],
            source: DecisionSource::Llm,
            abstained: false,
        }
    }

    fn result(name: &str, matches: Vec<(Tool, &str)>) -> EntitySearchResult {
        EntitySearchResult {
            entity_name: name.to_string(),
            matches: matches
                .into_iter()
                .map(|(tool, path)| EntityMatch {
                    source_tool: tool,
                    section_path: path.to_string(),
                    matched_text: name.to_string(),
                    strategy: MatchStrategy::Exact,
                    confidence: 1.0,
                })
                .collect(),
        }
    }

    #[test]
    fn multi_location_entities_reach_every_matched_tool() {
        let decision = decision_with_tools(vec![Tool::CharacterData, Tool::Rulebook]);
        let mut results = HashMap::new();
        results.insert(
            "grappling".to_string(),
            result(
                "grappling",
                vec![
                    (Tool::Rulebook, "rulebook.2"),
                    (
                        Tool::CharacterData,
                        "character_data.proficiencies_and_modifiers",
                    ),
                ],
            ),
        );

        let inputs = build_tool_inputs(&decision, &results);
        for input in &inputs {
            assert!(input.entities.contains(&"grappling".to_string()));
        }

        let character_input = inputs
            .iter()
            .find(|i| i.tool == Tool::CharacterData)
            .unwrap();
        assert!(character_input
            .auto_include_sections
            .contains(&"character_data.proficiencies_and_modifiers".to_string()));

        let rulebook_input = inputs.iter().find(|i| i.tool == Tool::Rulebook).unwrap();
        assert!(rulebook_input
            .auto_include_sections
            .contains(&"rulebook.2".to_string()));
    }

    #[test]
    fn unmatched_entities_reach_every_selected_tool() {
        let decision = decision_with_tools(vec![Tool::CharacterData, Tool::SessionNotes]);
        let mut results = HashMap::new();
        results.insert("mystery".to_string(), result("mystery", vec![]));

        let inputs = build_tool_inputs(&decision, &results);
        for input in &inputs {
            assert_eq!(input.entities, vec!["mystery".to_string()]);
            assert!(input.auto_include_sections.is_empty());
        }
    }

    #[test]
    fn entities_matched_elsewhere_only_do_not_leak() {
        let decision = decision_with_tools(vec![Tool::CharacterData, Tool::SessionNotes]);
        let mut results = HashMap::new();
        results.insert(
            "eldaryth".to_string(),
            result("eldaryth", vec![(Tool::CharacterData, "character_data.inventory")]),
        );

        let inputs = build_tool_inputs(&decision, &results);
        let session_input = inputs
            .iter()
            .find(|i| i.tool == Tool::SessionNotes)
            .unwrap();
        assert!(session_input.entities.is_empty());
    }
}
