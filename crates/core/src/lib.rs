pub mod action;
pub mod intent;
pub mod models;
pub mod parser;
pub mod policy;
pub mod reply;

pub use action::{dispatch, ACTION_TABLE};
pub use intent::{classify_intent_rules, detect_sensitive, normalize_text, SENSITIVE_TOPICS};
pub use models::*;
pub use parser::{parse_model_reply, ParseError, ParsedReply};
pub use policy::PolicyStore;
pub use reply::{compose_answer, escalation_message, GENERIC_FALLBACK, NO_INFORMATION, UNKNOWN_HINT};
