use crate::models::Intent;

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Phrases that force human routing no matter what the classifier says.
pub const SENSITIVE_TOPICS: &[&str] = &[
    "mental health",
    "harassment",
    "discrimination",
    "bullying",
    "burnout",
    "burned out",
    "burnt out",
    "stress",
    "depression",
    "anxiety",
];

pub fn detect_sensitive(text: &str) -> bool {
    let lower = text.to_lowercase();
    SENSITIVE_TOPICS.iter().any(|topic| lower.contains(topic))
}

/// Rule table evaluated top to bottom, first match wins. The order here is
/// the tie-break policy: escalation-worthy rows sit above the topical ones.
pub const INTENT_RULES: &[(Intent, &[&str])] = &[
    (
        Intent::Escalate,
        &["escalate", "speak to hr", "talk to a human"],
    ),
    (
        Intent::MentalHealth,
        &["mental", "stress", "burnout", "depression", "anxiety"],
    ),
    (
        Intent::Leave,
        &["leave", "vacation", "holiday", "day off", "time off"],
    ),
    (
        Intent::Payslip,
        &["payslip", "salary", "payment", "compensation", "payroll"],
    ),
    (
        Intent::Appraisal,
        &["appraisal", "review", "performance"],
    ),
    (
        Intent::Interview,
        &["interview", "candidate", "hiring"],
    ),
];

/// Rule-based classifier. Total: always returns a member of the intent set,
/// falling back to `fallback` when no rule matches.
pub fn classify_intent_rules(text: &str, fallback: Intent) -> Intent {
    let lower = text.to_lowercase();

    for (intent, keywords) in INTENT_RULES {
        if contains_any(&lower, keywords) {
            return *intent;
        }
    }

    fallback
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
