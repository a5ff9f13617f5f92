use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::Intent;

/// Read-only topic -> policy text mapping. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    entries: BTreeMap<Intent, String>,
}

impl PolicyStore {
    pub fn new(entries: BTreeMap<Intent, String>) -> Self {
        Self { entries }
    }

    /// Loads topic/text pairs from a JSON object file, e.g.
    /// `{"leave": "...", "payslip": "..."}`. Keys that are not known
    /// intent labels are rejected.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading policy file: {}", path.display()))?;
        let map: BTreeMap<String, String> =
            serde_json::from_str(&raw).context("policy file is not a JSON object of strings")?;

        let mut entries = BTreeMap::new();
        for (key, text) in map {
            let intent = Intent::parse(&key)
                .with_context(|| format!("unknown policy topic key: {key}"))?;
            entries.insert(intent, text);
        }

        Ok(Self { entries })
    }

    pub fn lookup(&self, intent: Intent) -> Option<&str> {
        self.entries.get(&intent).map(String::as_str)
    }

    pub fn topics(&self) -> impl Iterator<Item = (Intent, &str)> + '_ {
        self.entries.iter().map(|(intent, text)| (*intent, text.as_str()))
    }

    pub fn as_prompt_block(&self) -> String {
        self.entries
            .iter()
            .map(|(intent, text)| format!("{}: {}", intent.as_label(), text.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            Intent::Leave,
            "Leave Policy\n\
             - Annual Leave: 20 days per year, accrued monthly.\n\
             - Sick Leave: 10 days per year, fully paid.\n\
             - Maternity/Paternity Leave: 12 weeks, fully paid.\n\
             - Unpaid Leave: Available upon approval for up to 30 days.\n\
             To apply, submit a request via the HR portal at least 5 days in advance."
                .to_string(),
        );
        entries.insert(
            Intent::Appraisal,
            "Appraisal Policy\n\
             - Appraisals occur bi-annually: June and December.\n\
             - Employees must submit a self-assessment form 2 weeks prior.\n\
             - Managers will schedule a 1:1 review meeting post-submission.\n\
             Contact HR if you haven't received your appraisal form."
                .to_string(),
        );
        entries.insert(
            Intent::Payslip,
            "Payslip Information\n\
             - Payslips are issued on the last working day of each month.\n\
             - Access your payslip via the HR portal under 'Payroll'.\n\
             - For discrepancies, email hr@company.com with your employee ID."
                .to_string(),
        );

        Self { entries }
    }
}
