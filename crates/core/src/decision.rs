//! Structured decisions extracted from language model output
//!
//! The model is asked to answer with a single JSON object:
//!
//! ```json
//! {"tool": "book_appointment", "output": "...", "missing_info": "none", "time": "2026-10-18 10:00"}
//! ```
//!
//! [`parse`] is the only way such text becomes a [`ParsedDecision`]. It
//! tolerates a surrounding code fence but never guesses structure from prose.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::ParseFailure;

/// Backend action the engine can run on behalf of a patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    BookAppointment,
    GetReport,
    ReportEmergency,
}

impl Capability {
    /// Wire name used in prompts and model replies
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::BookAppointment => "book_appointment",
            Capability::GetReport => "get_report",
            Capability::ReportEmergency => "report_emergency",
        }
    }

    /// Name of the tool-specific value field, if the tool takes one
    pub fn value_field(self) -> Option<&'static str> {
        match self {
            Capability::BookAppointment => Some("time"),
            Capability::ReportEmergency => Some("details"),
            Capability::GetReport => None,
        }
    }
}

/// Tool named by the model: a capability or the `general` no-op
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    BookAppointment,
    GetReport,
    ReportEmergency,
    General,
}

impl ToolKind {
    /// Map a wire name to a tool. Unknown names become `General`.
    pub fn from_wire(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "book_appointment" => ToolKind::BookAppointment,
            "get_report" => ToolKind::GetReport,
            "report_emergency" => ToolKind::ReportEmergency,
            _ => ToolKind::General,
        }
    }

    pub fn capability(self) -> Option<Capability> {
        match self {
            ToolKind::BookAppointment => Some(Capability::BookAppointment),
            ToolKind::GetReport => Some(Capability::GetReport),
            ToolKind::ReportEmergency => Some(Capability::ReportEmergency),
            ToolKind::General => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self.capability() {
            Some(capability) => capability.as_str(),
            None => "general",
        }
    }
}

/// What the model decided for one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDecision {
    pub tool: ToolKind,
    /// Text meant for the patient (an answer or a clarification question)
    pub output_text: String,
    /// Parameter the model still needs, `None` when nothing is missing
    pub missing_field: Option<String>,
    /// Tool-specific value (`time` or `details`) when the model supplied one
    pub supplied_value: Option<String>,
}

/// Parse raw model output into a decision
pub fn parse(raw: &str) -> Result<ParsedDecision, ParseFailure> {
    let payload = strip_fence(raw.trim());
    if payload.is_empty() {
        return Err(ParseFailure::Empty);
    }

    let value: JsonValue =
        serde_json::from_str(payload).map_err(|e| ParseFailure::Malformed(e.to_string()))?;
    let object = value.as_object().ok_or(ParseFailure::NotAnObject)?;

    let tool = ToolKind::from_wire(required_str(object, "tool")?);
    let output_text = required_str(object, "output")?.to_string();

    let missing_field = optional_str(object, "missing_info")?
        .map(str::trim)
        .filter(|field| !field.is_empty() && !field.eq_ignore_ascii_case("none"))
        .map(str::to_string);

    let supplied_value = match tool.capability().and_then(Capability::value_field) {
        Some(field) => optional_str(object, field)?
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string),
        None => None,
    };

    Ok(ParsedDecision {
        tool,
        output_text,
        missing_field,
        supplied_value,
    })
}

/// Remove a wrapping ``` fence (with optional info string) when both ends are present
fn strip_fence(text: &str) -> &str {
    let Some(inner) = text
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return text;
    };

    // Info strings such as `json` are alphanumeric; a JSON payload never starts with one
    inner
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        .trim()
}

fn required_str<'a>(
    object: &'a Map<String, JsonValue>,
    field: &'static str,
) -> Result<&'a str, ParseFailure> {
    match object.get(field) {
        None | Some(JsonValue::Null) => Err(ParseFailure::MissingField(field)),
        Some(JsonValue::String(s)) => Ok(s),
        Some(_) => Err(ParseFailure::InvalidField(field)),
    }
}

fn optional_str<'a>(
    object: &'a Map<String, JsonValue>,
    field: &'static str,
) -> Result<Option<&'a str>, ParseFailure> {
    match object.get(field) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(_) => Err(ParseFailure::InvalidField(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_payload() {
        let raw = r#"{"tool": "report_emergency", "output": "Help is coming", "missing_info": "none", "details": "snake bite"}"#;
        let decision = parse(raw).unwrap();

        assert_eq!(decision.tool, ToolKind::ReportEmergency);
        assert_eq!(decision.output_text, "Help is coming");
        assert_eq!(decision.missing_field, None);
        assert_eq!(decision.supplied_value.as_deref(), Some("snake bite"));
    }

    #[test]
    fn strips_fence_with_info_string() {
        let raw = "  ```json\n{\"tool\": \"general\", \"output\": \"Hello!\"}\n```\n";
        let decision = parse(raw).unwrap();

        assert_eq!(decision.tool, ToolKind::General);
        assert_eq!(decision.output_text, "Hello!");
    }

    #[test]
    fn strips_single_line_fence() {
        let raw = "```{\"tool\": \"get_report\", \"output\": \"One moment\"}```";
        assert_eq!(parse(raw).unwrap().tool, ToolKind::GetReport);
    }

    #[test]
    fn unbalanced_fence_is_not_stripped() {
        let raw = "```json\n{\"tool\": \"general\", \"output\": \"Hi\"}";
        assert!(matches!(parse(raw), Err(ParseFailure::Malformed(_))));
    }

    #[test]
    fn missing_info_defaults_to_none() {
        let decision = parse(r#"{"tool": "general", "output": "Hi"}"#).unwrap();
        assert_eq!(decision.missing_field, None);

        let decision = parse(r#"{"tool": "general", "output": "Hi", "missing_info": "None"}"#).unwrap();
        assert_eq!(decision.missing_field, None);

        let decision = parse(r#"{"tool": "general", "output": "Hi", "missing_info": ""}"#).unwrap();
        assert_eq!(decision.missing_field, None);
    }

    #[test]
    fn reports_missing_slot() {
        let raw = r#"{"tool": "book_appointment", "output": "What time suits you?", "missing_info": "time"}"#;
        let decision = parse(raw).unwrap();

        assert_eq!(decision.tool, ToolKind::BookAppointment);
        assert_eq!(decision.missing_field.as_deref(), Some("time"));
        assert_eq!(decision.supplied_value, None);
    }

    #[test]
    fn unknown_tool_normalizes_to_general() {
        let decision = parse(r#"{"tool": "cancel_appointment", "output": "Sorry"}"#).unwrap();
        assert_eq!(decision.tool, ToolKind::General);
    }

    #[test]
    fn value_field_follows_the_tool() {
        // `details` belongs to report_emergency, so a booking ignores it
        let raw = r#"{"tool": "book_appointment", "output": "ok", "details": "x", "time": " 10:00 "}"#;
        let decision = parse(raw).unwrap();
        assert_eq!(decision.supplied_value.as_deref(), Some("10:00"));

        let raw = r#"{"tool": "get_report", "output": "ok", "time": "10:00"}"#;
        assert_eq!(parse(raw).unwrap().supplied_value, None);
    }

    #[test]
    fn rejects_missing_required_fields() {
        assert_eq!(
            parse(r#"{"output": "Hi"}"#),
            Err(ParseFailure::MissingField("tool"))
        );
        assert_eq!(
            parse(r#"{"tool": "general"}"#),
            Err(ParseFailure::MissingField("output"))
        );
        assert_eq!(
            parse(r#"{"tool": 3, "output": "Hi"}"#),
            Err(ParseFailure::InvalidField("tool"))
        );
    }

    #[test]
    fn rejects_non_payload_text() {
        assert_eq!(parse("   "), Err(ParseFailure::Empty));
        assert_eq!(parse("```json\n```"), Err(ParseFailure::Empty));
        assert_eq!(parse(r#"["general"]"#), Err(ParseFailure::NotAnObject));
        assert!(matches!(
            parse("Sure! I booked it for you."),
            Err(ParseFailure::Malformed(_))
        ));
        assert!(matches!(
            parse(r#"{"tool": "general", "outp"#),
            Err(ParseFailure::Malformed(_))
        ));
    }
}
