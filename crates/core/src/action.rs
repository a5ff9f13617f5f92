use crate::models::{ActionSuggestion, Intent};

/// Open mapping from intent to follow-up action. Adding a row here is the
/// whole story for wiring a new automated action.
pub const ACTION_TABLE: &[(Intent, &str)] = &[
    (
        Intent::Leave,
        "Leave request form emailed; fill it out and submit via the HR portal.",
    ),
    (
        Intent::Payslip,
        "Latest payslip emailed to your inbox.",
    ),
    (
        Intent::Appraisal,
        "Appraisal form reminder sent to you and your manager; submission due tomorrow.",
    ),
    (
        Intent::Interview,
        "Interview slot scheduled in 3 days at 10:00.",
    ),
];

/// Intents absent from the table yield `None`: no automated action.
pub fn dispatch(intent: Intent) -> Option<ActionSuggestion> {
    ACTION_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == intent)
        .map(|(_, text)| ActionSuggestion::new(*text))
}
