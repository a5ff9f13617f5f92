use copilot_core::PolicyStore;

/// Structured prompt asking the model to classify the query and draft a
/// reply in the fixed `Intent:` / `Response:` / `Action:` output schema.
pub fn build_copilot_prompt(query: &str, policies: &PolicyStore) -> String {
    format!(
        "You are an HR copilot that assists employees with common HR queries.\n\
         \n\
         1. Classify the intent of the query. Possible intents:\n\
            - leave (leave policy questions)\n\
            - payslip (salary or payslip questions)\n\
            - appraisal (appraisals or performance reviews)\n\
            - interview (interview scheduling)\n\
            - escalate (sensitive topics such as mental health, harassment, discrimination)\n\
            - general (anything else you can still answer)\n\
            - unknown (if the intent is unclear)\n\
         \n\
         2. If the intent is leave, payslip, or appraisal, answer from this policy data:\n\
         {policy_block}\n\
         \n\
         3. If applicable, suggest a follow-up action for the intent.\n\
         \n\
         4. If the intent is escalate, say the query will be escalated to HR and do not \
            provide a policy answer or action.\n\
         \n\
         User query: {query}\n\
         \n\
         Reply in exactly this format:\n\
         Intent: [intent]\n\
         Response: [response text]\n\
         Action: [action text, or 'none']",
        policy_block = policies.as_prompt_block(),
    )
}
