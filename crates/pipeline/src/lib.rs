use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{Duration, Utc};
use copilot_core::{
    classify_intent_rules, compose_answer, detect_sensitive, dispatch, escalation_message,
    normalize_text, parse_model_reply, ActionSuggestion, ChatInput, ConversationSession,
    ConversationTurn, Intent, PolicyStore, RetrievedPassage, TurnOutcome, GENERIC_FALLBACK,
    UNKNOWN_HINT,
};
use copilot_llm::{build_copilot_prompt, LanguageModel};
use copilot_observability::AppMetrics;
use copilot_retrieval::{PolicyRetriever, DEFAULT_TOP_K};
use copilot_storage::SessionRepository;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierMode {
    Rules,
    ModelAssisted,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub mode: ClassifierMode,
    /// Intent assigned when no rule matches: `General` or `Unknown`.
    pub fallback_intent: Intent,
    pub retrieval_top_k: usize,
    pub session_ttl_hours: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: ClassifierMode::Rules,
            fallback_intent: Intent::General,
            retrieval_top_k: DEFAULT_TOP_K,
            session_ttl_hours: 24,
        }
    }
}

/// One classified turn before reply assembly.
struct Classification {
    intent: Intent,
    /// Response drafted by the model collaborator, when there is one.
    drafted_response: Option<String>,
    drafted_action: Option<ActionSuggestion>,
}

/// The conversation pipeline. Owns nothing global: history lives in the
/// session repository, collaborators come in behind their traits.
#[derive(Clone)]
pub struct CopilotAgent<S, L>
where
    S: SessionRepository,
    L: LanguageModel,
{
    retriever: Arc<dyn PolicyRetriever>,
    model: Option<L>,
    policies: PolicyStore,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
    config: PipelineConfig,
}

impl<S, L> CopilotAgent<S, L>
where
    S: SessionRepository,
    L: LanguageModel,
{
    pub fn new(
        retriever: Arc<dyn PolicyRetriever>,
        model: Option<L>,
        policies: PolicyStore,
        store: Arc<S>,
        metrics: Arc<AppMetrics>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            retriever,
            model,
            policies,
            store,
            metrics,
            config,
        }
    }

    /// Processes one query to completion: classify, route, respond, persist.
    /// Collaborator failures degrade into visible replies; they never abort
    /// the turn.
    #[instrument(skip(self, input))]
    pub async fn submit(&self, input: ChatInput) -> Result<TurnOutcome> {
        let started = Instant::now();
        self.metrics.inc_request();

        let query = normalize_text(&input.text);
        let session_id = input
            .session_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut session = self.load_or_create_session(&session_id).await?;
        session.turns.push(ConversationTurn::user(&query));

        let sensitive = detect_sensitive(&query);

        let outcome = if sensitive {
            // Escalation short-circuits before any collaborator call.
            self.escalated_turn(&session_id, Intent::Escalate, &query, &session.turns)
        } else {
            let classification = self.classify(&query).await;

            if classification.intent.escalates() {
                self.escalated_turn(&session_id, classification.intent, &query, &session.turns)
            } else {
                self.answered_turn(&session_id, &query, classification)
            }
        };

        session.turns.push(ConversationTurn::system(&outcome.response));
        if let Some(action) = &outcome.action {
            session
                .turns
                .push(ConversationTurn::system(format!("Action: {}", action.text)));
        }
        if outcome.intent == Intent::Unknown && !outcome.escalated {
            session.turns.push(ConversationTurn::system(UNKNOWN_HINT));
        }

        session.expires_at = Utc::now() + Duration::hours(self.config.session_ttl_hours);
        self.store.upsert_session(&session).await?;

        self.metrics.observe_latency(started.elapsed());
        info!(
            session_id = %session_id,
            intent = outcome.intent.as_label(),
            escalated = outcome.escalated,
            "turn handled"
        );

        Ok(outcome)
    }

    /// The only operation allowed to truncate a conversation.
    pub async fn reset_history(&self, session_id: &str) -> Result<()> {
        self.store.clear_session(session_id).await
    }

    pub async fn history(&self, session_id: &str) -> Result<Vec<ConversationTurn>> {
        Ok(self
            .store
            .load_session(session_id)
            .await?
            .map(|session| session.turns)
            .unwrap_or_default())
    }

    pub fn kb_search(&self, query: &str, top_k: usize) -> Vec<RetrievedPassage> {
        self.retriever.search(query, top_k)
    }

    pub fn policies(&self) -> &PolicyStore {
        &self.policies
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        self.store.purge_expired(Utc::now()).await
    }

    async fn load_or_create_session(&self, session_id: &str) -> Result<ConversationSession> {
        Ok(self
            .store
            .load_session(session_id)
            .await?
            .unwrap_or_else(|| ConversationSession {
                session_id: session_id.to_string(),
                expires_at: Utc::now() + Duration::hours(self.config.session_ttl_hours),
                turns: Vec::new(),
            }))
    }

    async fn classify(&self, query: &str) -> Classification {
        if self.config.mode == ClassifierMode::ModelAssisted {
            if let Some(model) = &self.model {
                let prompt = build_copilot_prompt(query, &self.policies);
                match model.complete(&prompt).await {
                    Ok(raw) => match parse_model_reply(&raw) {
                        Ok(parsed) => {
                            return Classification {
                                intent: parsed.intent,
                                drafted_response: Some(parsed.response),
                                drafted_action: parsed.action.map(ActionSuggestion::new),
                            };
                        }
                        Err(err) => {
                            warn!(error = %err, "model output failed schema parse");
                        }
                    },
                    Err(err) => {
                        warn!(error = %err, "model completion failed");
                    }
                }

                // ClassificationFailure: degrade to unknown + apology,
                // keep the pipeline alive.
                self.metrics.inc_llm_fallback();
                return Classification {
                    intent: Intent::Unknown,
                    drafted_response: Some(GENERIC_FALLBACK.to_string()),
                    drafted_action: None,
                };
            }
        }

        Classification {
            intent: classify_intent_rules(query, self.config.fallback_intent),
            drafted_response: None,
            drafted_action: None,
        }
    }

    fn escalated_turn(
        &self,
        session_id: &str,
        intent: Intent,
        query: &str,
        history: &[ConversationTurn],
    ) -> TurnOutcome {
        self.metrics.inc_escalation();

        TurnOutcome {
            session_id: session_id.to_string(),
            intent,
            response: escalation_message(query, history),
            action: None,
            escalated: true,
        }
    }

    fn answered_turn(
        &self,
        session_id: &str,
        query: &str,
        classification: Classification,
    ) -> TurnOutcome {
        let passages = self.retriever.search(query, self.config.retrieval_top_k);
        self.metrics.add_retrieval_hits(passages.len());

        let intent = classification.intent;
        let response = match classification.drafted_response {
            Some(drafted) => drafted,
            None => compose_answer(intent, self.policies.lookup(intent), &passages),
        };
        let action = classification.drafted_action.or_else(|| dispatch(intent));

        TurnOutcome {
            session_id: session_id.to_string(),
            intent,
            response,
            action,
            escalated: false,
        }
    }
}
