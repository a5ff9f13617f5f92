use crate::models::{ConversationTurn, Intent, RetrievedPassage, Speaker};

pub const NO_INFORMATION: &str =
    "No information found for that topic. An HR representative can help if you escalate.";

pub const GENERIC_FALLBACK: &str =
    "I'm sorry, I couldn't process your query. Please try rephrasing it.";

pub const UNKNOWN_HINT: &str =
    "I'm not sure how to handle that. Would you like to escalate this to HR? (say 'escalate' to proceed)";

/// Assembles the answered-path response: policy text for the intent when the
/// store has one, plus the top retrieved passages, else the sentinel.
pub fn compose_answer(
    intent: Intent,
    policy_text: Option<&str>,
    retrieved: &[RetrievedPassage],
) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(text) = policy_text {
        sections.push(text.trim().to_string());
    }

    let snippets = retrieved
        .iter()
        .take(3)
        .map(|passage| format!("- {} ({})", passage.snippet, passage.title))
        .collect::<Vec<_>>();
    if !snippets.is_empty() {
        sections.push(format!("Related policy excerpts:\n{}", snippets.join("\n")));
    }

    if sections.is_empty() {
        return NO_INFORMATION.to_string();
    }

    if intent == Intent::General || intent == Intent::Unknown {
        sections.insert(0, "Here is what I found:".to_string());
    }

    sections.join("\n\n")
}

/// Escalation message referencing the query and recent conversation context.
pub fn escalation_message(query: &str, history: &[ConversationTurn]) -> String {
    let context = history
        .iter()
        .rev()
        .take(6)
        .rev()
        .map(|turn| {
            let who = match turn.speaker {
                Speaker::User => "user",
                Speaker::System => "system",
            };
            format!("- {who}: {}", turn.text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Escalation to HR\n\
         This query requires human attention due to its sensitive nature.\n\
         Query: {query}\n\
         Conversation context:\n{context}\n\
         An HR representative will reach out to you soon."
    )
}
