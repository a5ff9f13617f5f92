use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use copilot_core::{ChatInput, Intent, PolicyStore, RetrievedPassage, Speaker, GENERIC_FALLBACK, UNKNOWN_HINT};
use copilot_llm::{LanguageModel, LlmError};
use copilot_observability::AppMetrics;
use copilot_pipeline::{ClassifierMode, CopilotAgent, PipelineConfig};
use copilot_retrieval::PolicyRetriever;
use copilot_storage::MemoryStore;

#[derive(Default)]
struct StubRetriever {
    passages: Vec<RetrievedPassage>,
    calls: AtomicUsize,
}

impl StubRetriever {
    fn with_passage(snippet: &str) -> Self {
        Self {
            passages: vec![RetrievedPassage {
                doc_id: "doc".to_string(),
                title: "Policy".to_string(),
                snippet: snippet.to_string(),
                score: 1.0,
                source_path: "policies/doc.md".to_string(),
            }],
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PolicyRetriever for StubRetriever {
    fn search(&self, _query: &str, top_k: usize) -> Vec<RetrievedPassage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.passages.iter().take(top_k).cloned().collect()
    }
}

#[derive(Clone)]
struct ScriptedModel {
    output: Option<String>,
}

impl ScriptedModel {
    fn replies(raw: &str) -> Self {
        Self {
            output: Some(raw.to_string()),
        }
    }

    fn unavailable() -> Self {
        Self { output: None }
    }
}

impl LanguageModel for ScriptedModel {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        match &self.output {
            Some(text) => Ok(text.clone()),
            None => Err(LlmError::Unavailable),
        }
    }
}

fn agent(
    mode: ClassifierMode,
    model: Option<ScriptedModel>,
    retriever: Arc<StubRetriever>,
) -> CopilotAgent<MemoryStore, ScriptedModel> {
    CopilotAgent::new(
        retriever as Arc<dyn PolicyRetriever>,
        model,
        PolicyStore::default(),
        Arc::new(MemoryStore::new()),
        AppMetrics::shared(),
        PipelineConfig {
            mode,
            ..PipelineConfig::default()
        },
    )
}

fn ask(text: &str) -> ChatInput {
    ChatInput {
        session_id: Some("test-session".to_string()),
        text: text.to_string(),
    }
}

#[tokio::test]
async fn leave_query_answers_from_policy_store() {
    let retriever = Arc::new(StubRetriever::default());
    let agent = agent(ClassifierMode::Rules, None, retriever.clone());

    let outcome = agent.submit(ask("What's our leave policy?")).await.unwrap();

    assert_eq!(outcome.intent, Intent::Leave);
    assert!(!outcome.escalated);
    assert!(outcome.response.contains("Annual Leave"));
    assert_eq!(retriever.calls(), 1);
}

#[tokio::test]
async fn sensitive_query_escalates_without_calling_retrieval() {
    let retriever = Arc::new(StubRetriever::with_passage("some policy"));
    let agent = agent(ClassifierMode::Rules, None, retriever.clone());

    let outcome = agent
        .submit(ask("I'm dealing with harassment at work"))
        .await
        .unwrap();

    assert!(outcome.escalated);
    assert_eq!(outcome.intent, Intent::Escalate);
    assert!(outcome.response.contains("Escalation to HR"));
    assert!(outcome.action.is_none());
    assert_eq!(retriever.calls(), 0);
}

#[tokio::test]
async fn sensitive_detector_overrides_model_classification() {
    // Model would happily classify this as payslip; the detector must win.
    let retriever = Arc::new(StubRetriever::default());
    let model = ScriptedModel::replies("Intent: payslip\nResponse: here you go\nAction: none");
    let agent = agent(ClassifierMode::ModelAssisted, Some(model), retriever.clone());

    let outcome = agent
        .submit(ask("my payslip dispute turned into discrimination"))
        .await
        .unwrap();

    assert!(outcome.escalated);
    assert_eq!(retriever.calls(), 0);
}

#[tokio::test]
async fn burnout_query_escalates_even_when_model_says_leave() {
    // The detector runs before classification, so a model that mislabels a
    // burnout query as leave never gets the chance to route it topically.
    let retriever = Arc::new(StubRetriever::with_passage("leave policy text"));
    let model = ScriptedModel::replies(
        "Intent: leave\nResponse: You have 20 days of annual leave.\nAction: Leave application form emailed.",
    );
    let agent = agent(ClassifierMode::ModelAssisted, Some(model), retriever.clone());

    let outcome = agent
        .submit(ask("I am completely burned out and stressed at work"))
        .await
        .unwrap();

    assert!(outcome.escalated);
    assert_eq!(outcome.intent, Intent::Escalate);
    assert!(outcome.action.is_none());
    assert_eq!(retriever.calls(), 0);
}

#[tokio::test]
async fn payslip_query_dispatches_action_and_queries_retrieval() {
    let retriever = Arc::new(StubRetriever::with_passage("Payslips are issued monthly"));
    let agent = agent(ClassifierMode::Rules, None, retriever.clone());

    let outcome = agent.submit(ask("Can I get my April payslip")).await.unwrap();

    assert_eq!(outcome.intent, Intent::Payslip);
    assert!(outcome.action.unwrap().text.contains("payslip"));
    assert_eq!(retriever.calls(), 1);
}

#[tokio::test]
async fn malformed_model_output_degrades_to_unknown() {
    let retriever = Arc::new(StubRetriever::default());
    let model = ScriptedModel::replies("complete nonsense with no labels");
    let agent = agent(ClassifierMode::ModelAssisted, Some(model), retriever);

    let outcome = agent.submit(ask("something ambiguous")).await.unwrap();

    assert_eq!(outcome.intent, Intent::Unknown);
    assert_eq!(outcome.response, GENERIC_FALLBACK);
    assert!(outcome.action.is_none());
    assert!(!outcome.escalated);
}

#[tokio::test]
async fn unreachable_model_degrades_to_unknown() {
    let retriever = Arc::new(StubRetriever::default());
    let agent = agent(
        ClassifierMode::ModelAssisted,
        Some(ScriptedModel::unavailable()),
        retriever,
    );

    let outcome = agent.submit(ask("anything at all")).await.unwrap();

    assert_eq!(outcome.intent, Intent::Unknown);
    assert_eq!(outcome.response, GENERIC_FALLBACK);
}

#[tokio::test]
async fn well_formed_model_output_drives_the_reply() {
    let retriever = Arc::new(StubRetriever::default());
    let model = ScriptedModel::replies(
        "Intent: appraisal\nResponse: Appraisals run in June and December.\nAction: Reminder sent for your self-assessment form.",
    );
    let agent = agent(ClassifierMode::ModelAssisted, Some(model), retriever);

    let outcome = agent.submit(ask("when is my performance review")).await.unwrap();

    assert_eq!(outcome.intent, Intent::Appraisal);
    assert!(outcome.response.contains("June and December"));
    assert!(outcome.action.unwrap().text.contains("Reminder"));
}

#[tokio::test]
async fn model_escalate_intent_is_honored() {
    let retriever = Arc::new(StubRetriever::default());
    let model = ScriptedModel::replies(
        "Intent: escalate\nResponse: This will be escalated to HR.\nAction: none",
    );
    let agent = agent(ClassifierMode::ModelAssisted, Some(model), retriever.clone());

    let outcome = agent.submit(ask("please get me a human")).await.unwrap();

    assert!(outcome.escalated);
    assert_eq!(outcome.intent, Intent::Escalate);
    assert_eq!(retriever.calls(), 0);
}

#[tokio::test]
async fn history_grows_per_turn_and_reset_empties_it() {
    let retriever = Arc::new(StubRetriever::default());
    let agent = agent(ClassifierMode::Rules, None, retriever);

    // leave turn: user + response + action entries
    agent.submit(ask("What's our leave policy?")).await.unwrap();
    // general turn: user + response entries
    agent.submit(ask("where is the cafeteria")).await.unwrap();

    let history = agent.history("test-session").await.unwrap();
    assert_eq!(history.len(), 5);

    agent.reset_history("test-session").await.unwrap();
    assert!(agent.history("test-session").await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_turn_appends_escalation_hint_to_history() {
    let retriever = Arc::new(StubRetriever::default());
    let model = ScriptedModel::replies("complete nonsense with no labels");
    let agent = agent(ClassifierMode::ModelAssisted, Some(model), retriever);

    let outcome = agent.submit(ask("something ambiguous")).await.unwrap();
    assert_eq!(outcome.intent, Intent::Unknown);

    // user entry, fallback response, then the hint offering escalation
    let history = agent.history("test-session").await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].speaker, Speaker::System);
    assert_eq!(history[2].text, UNKNOWN_HINT);
}

#[tokio::test]
async fn repeated_query_yields_same_intent_and_action() {
    let retriever = Arc::new(StubRetriever::default());
    let agent = agent(ClassifierMode::Rules, None, retriever);

    let first = agent.submit(ask("Can I get my April payslip")).await.unwrap();
    let second = agent.submit(ask("Can I get my April payslip")).await.unwrap();

    assert_eq!(first.intent, second.intent);
    assert_eq!(first.action, second.action);
}

#[tokio::test]
async fn rule_miss_with_empty_corpus_returns_sentinel() {
    let retriever = Arc::new(StubRetriever::default());
    let agent = agent(ClassifierMode::Rules, None, retriever);

    let outcome = agent.submit(ask("where is the cafeteria")).await.unwrap();

    assert_eq!(outcome.intent, Intent::General);
    assert_eq!(outcome.response, copilot_core::NO_INFORMATION);
}
