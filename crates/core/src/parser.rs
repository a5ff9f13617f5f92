//! Strict parser for the model-output contract: labeled `Intent:`,
//! `Response:` and optional `Action:` lines. Label decoration the model
//! tends to add (`*`, `-`, bold markers) is tolerated; missing labels are
//! not, and come back as a typed error the caller must handle.

use thiserror::Error;

use crate::models::Intent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub intent: Intent,
    pub response: String,
    pub action: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("model output has no Intent line")]
    MissingIntent,
    #[error("model output names an unknown intent: {0}")]
    UnknownIntent(String),
    #[error("model output has no Response line")]
    MissingResponse,
}

pub fn parse_model_reply(raw: &str) -> Result<ParsedReply, ParseError> {
    let mut intent_label: Option<String> = None;
    let mut response_lines: Vec<String> = Vec::new();
    let mut action_lines: Vec<String> = Vec::new();

    enum Section {
        None,
        Response,
        Action,
    }
    let mut section = Section::None;

    for line in raw.lines() {
        if let Some(value) = label_value(line, "intent") {
            intent_label = Some(value.to_string());
            section = Section::None;
        } else if let Some(value) = label_value(line, "response") {
            response_lines.clear();
            if !value.is_empty() {
                response_lines.push(value.to_string());
            }
            section = Section::Response;
        } else if let Some(value) = label_value(line, "action") {
            if !value.is_empty() {
                action_lines.push(value.to_string());
            }
            section = Section::Action;
        } else {
            match section {
                Section::Response => response_lines.push(line.trim().to_string()),
                Section::Action => action_lines.push(line.trim().to_string()),
                Section::None => {}
            }
        }
    }

    let intent_label = intent_label.ok_or(ParseError::MissingIntent)?;
    let intent =
        Intent::parse(&intent_label).ok_or(ParseError::UnknownIntent(intent_label))?;

    let response = response_lines.join("\n").trim().to_string();
    if response.is_empty() {
        return Err(ParseError::MissingResponse);
    }

    let action = {
        let text = action_lines.join("\n").trim().to_string();
        if text.is_empty() || text.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(text)
        }
    };

    Ok(ParsedReply {
        intent,
        response,
        action,
    })
}

/// Matches `Label: value` allowing leading list/bold decoration, e.g.
/// `- *Intent*: leave` or `**Response:** text`.
fn label_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let trimmed = line
        .trim_start()
        .trim_start_matches(|c| c == '-' || c == '*' || c == ' ');

    let prefix = trimmed.get(..label.len())?;
    if !prefix.eq_ignore_ascii_case(label) {
        return None;
    }

    let rest = trimmed[label.len()..].trim_start_matches(|c| c == '*' || c == ' ');
    rest.strip_prefix(':').map(str::trim)
}
