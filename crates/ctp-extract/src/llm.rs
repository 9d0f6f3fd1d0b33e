//! Inference through an OpenAI-compatible chat completions endpoint.
//!
//! Each chunk becomes one request asking for a JSON object in the review
//! form's mapping shape. Replies are normalized before validation so that
//! common model quirks (numbers for counts, `null` for unknowns, a bare
//! study type string) don't discard an otherwise useful answer.

use std::time::Duration;

use ctp_ingest::Chunk;
use ctp_model::{ClinicalTrialRecord, StudyType};
use reqwest::blocking::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::InferenceFailure;
use crate::inferer::ChunkInferer;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Longest error body kept in [`InferenceFailure::Status`].
const MAX_ERROR_BODY: usize = 500;

const SYSTEM_PROMPT: &str = "You extract structured registration data from clinical trial \
protocol excerpts. Reply with a single JSON object using exactly the keys of the template. \
Use an empty string or empty list for anything the excerpt does not state. Never guess. \
Set study_design.study_type to \"Interventional\", \"Observational\" or \"\" and fill only \
the matching sub-design.";

const RECORD_TEMPLATE: &str = r#"{
  "brief_title": "", "official_title": "", "acronym": "", "org_study_id": "",
  "enrollment": "", "enrollment_type": "", "overall_status": "",
  "start_date": "", "primary_completion_date": "",
  "brief_summary": "", "detailed_description": "",
  "study_design": {
    "study_type": "",
    "interventional_design": {"interventional_subtype": "", "phase": "", "assignment": "", "allocation": ""},
    "observational_design": {"observational_study_design": "", "timing": "", "biospecimen_retention": "", "number_of_groups": ""}
  },
  "eligibility": {"criteria": "", "gender": "", "minimum_age": "", "maximum_age": "", "healthy_volunteers": ""},
  "primary_outcomes": [{"outcome_measure": "", "outcome_time_frame": "", "outcome_description": ""}],
  "secondary_outcomes": [{"outcome_measure": "", "outcome_time_frame": "", "outcome_description": ""}],
  "arm_groups": [{"arm_group_label": "", "arm_type": "", "arm_group_description": ""}],
  "interventions": [{"intervention_name": "", "intervention_type": "", "intervention_description": ""}],
  "sponsors": {"lead_sponsor": "", "collaborators": []},
  "conditions": [], "keywords": []
}"#;

/// Keys whose value is a list of plain strings.
const STRING_LIST_KEYS: &[&str] = &["conditions", "keywords", "collaborators"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Base URL; `/chat/completions` is appended.
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// HTTP timeout for one request.
    pub request_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Chat-completions backed [`ChunkInferer`].
#[derive(Debug, Clone)]
pub struct LlmInferer {
    client: Client,
    config: LlmConfig,
    url: String,
}

impl LlmInferer {
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be constructed.
    pub fn new(config: LlmConfig) -> Result<Self, InferenceFailure> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| InferenceFailure::Transport {
                message: e.to_string(),
            })?;
        let url = format!("{}/chat/completions", config.endpoint.trim_end_matches('/'));
        Ok(Self {
            client,
            config,
            url,
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "model": self.config.model,
            "temperature": 0,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {
                    "role": "user",
                    "content": format!("Template:\n{RECORD_TEMPLATE}\n\nProtocol excerpt:\n{text}"),
                },
            ],
        })
    }
}

impl ChunkInferer for LlmInferer {
    fn name(&self) -> &'static str {
        "llm"
    }

    fn infer(&self, chunk: &Chunk) -> Result<ClinicalTrialRecord, InferenceFailure> {
        let mut request = self.client.post(&self.url).json(&self.request_body(&chunk.text));
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request.send().map_err(|e| InferenceFailure::Transport {
            message: e.to_string(),
        })?;
        let status = response.status();
        let body = response.text().map_err(|e| InferenceFailure::Transport {
            message: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(InferenceFailure::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }
        debug!(chunk_index = chunk.index, bytes = body.len(), "completion received");
        parse_completion(&body)
    }
}

/// Pull the record out of a chat completion response body.
pub fn parse_completion(body: &str) -> Result<ClinicalTrialRecord, InferenceFailure> {
    let payload: Value = serde_json::from_str(body).map_err(InferenceFailure::malformed)?;
    let content = payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| InferenceFailure::malformed("missing choices[0].message.content"))?;
    parse_record_reply(content)
}

/// Parse the model's reply text into a record.
///
/// # Errors
///
/// Returns [`InferenceFailure::MalformedResponse`] when the reply is not a
/// JSON object or does not fit the record shape after normalization.
pub fn parse_record_reply(reply: &str) -> Result<ClinicalTrialRecord, InferenceFailure> {
    let mut value: Value =
        serde_json::from_str(strip_code_fence(reply)).map_err(InferenceFailure::malformed)?;
    if !value.is_object() {
        return Err(InferenceFailure::malformed("reply is not a JSON object"));
    }
    normalize_reply(&mut value);
    ClinicalTrialRecord::from_mapping(value).map_err(InferenceFailure::malformed)
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn normalize_reply(value: &mut Value) {
    normalize_value(value);
    let Some(object) = value.as_object_mut() else {
        return;
    };
    let design = match object.remove("study_design") {
        Some(Value::String(text)) => json!({"study_type": StudyType::detect(&text).as_str()}),
        Some(Value::Object(mut design)) => {
            let mut study_type = design
                .get("study_type")
                .and_then(Value::as_str)
                .map_or(StudyType::Unknown, StudyType::detect);
            if !study_type.is_known() {
                study_type = match (
                    has_values(design.get("interventional_design")),
                    has_values(design.get("observational_design")),
                ) {
                    (true, false) => StudyType::Interventional,
                    (false, true) => StudyType::Observational,
                    _ => StudyType::Unknown,
                };
            }
            design.insert("study_type".to_string(), Value::from(study_type.as_str()));
            Value::Object(design)
        }
        Some(other) => other,
        None => return,
    };
    object.insert("study_design".to_string(), design);
}

/// True for an object with at least one non-blank string value.
fn has_values(design: Option<&Value>) -> bool {
    design.and_then(Value::as_object).is_some_and(|fields| {
        fields
            .values()
            .any(|value| value.as_str().is_some_and(|text| !text.trim().is_empty()))
    })
}

/// Drop nulls, stringify numbers and booleans, split delimited list strings.
fn normalize_value(value: &mut Value) {
    match value {
        Value::Object(object) => {
            object.retain(|_, entry| !entry.is_null());
            for (key, entry) in object.iter_mut() {
                if STRING_LIST_KEYS.contains(&key.as_str())
                    && let Value::String(text) = entry
                {
                    *entry = text
                        .split([',', ';'])
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .map(Value::from)
                        .collect();
                }
                normalize_value(entry);
            }
        }
        Value::Array(items) => {
            items.retain(|item| !item.is_null());
            items.iter_mut().for_each(normalize_value);
        }
        Value::Number(number) => *value = Value::String(number.to_string()),
        Value::Bool(flag) => *value = Value::from(if *flag { "Yes" } else { "No" }),
        Value::Null | Value::String(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctp_model::StudyDesign;

    #[test]
    fn parses_plain_reply() {
        let record = parse_record_reply(r#"{"brief_title": "Trial A", "conditions": ["Asthma"]}"#)
            .unwrap();
        assert_eq!(record.brief_title, "Trial A");
        assert_eq!(record.conditions, ["Asthma"]);
    }

    #[test]
    fn strips_code_fences() {
        let record = parse_record_reply("```json\n{\"acronym\": \"TA\"}\n```").unwrap();
        assert_eq!(record.acronym, "TA");
    }

    #[test]
    fn normalizes_model_quirks() {
        let record = parse_record_reply(
            r#"{
                "enrollment": 120,
                "official_title": null,
                "keywords": "asthma; inhaler",
                "eligibility": {"healthy_volunteers": false},
                "study_design": {
                    "study_type": "Interventional (Clinical Trial)",
                    "interventional_design": {"phase": "Phase 2"},
                    "observational_design": {"timing": "Prospective"}
                },
                "primary_outcomes": [null, {"outcome_measure": "FEV1"}]
            }"#,
        )
        .unwrap();
        assert_eq!(record.enrollment, "120");
        assert_eq!(record.official_title, "");
        assert_eq!(record.keywords, ["asthma", "inhaler"]);
        assert_eq!(record.eligibility.healthy_volunteers, "No");
        assert_eq!(record.primary_outcomes.len(), 1);
        match record.study_design {
            StudyDesign::Interventional {
                interventional_design,
            } => assert_eq!(interventional_design.phase, "Phase 2"),
            other => panic!("unexpected design: {other:?}"),
        }
    }

    #[test]
    fn bare_study_type_string_is_accepted() {
        let record = parse_record_reply(r#"{"study_design": "observational"}"#).unwrap();
        assert_eq!(record.study_design.study_type(), StudyType::Observational);

        let record = parse_record_reply(r#"{"study_design": {"study_type": "N/A"}}"#).unwrap();
        assert_eq!(record.study_design, StudyDesign::Unknown);
    }

    #[test]
    fn blank_study_type_follows_the_filled_sub_design() {
        let record = parse_record_reply(
            r#"{"study_design": {
                "study_type": "",
                "interventional_design": {"phase": ""},
                "observational_design": {"number_of_groups": 2}
            }}"#,
        )
        .unwrap();
        match record.study_design {
            StudyDesign::Observational {
                observational_design,
            } => assert_eq!(observational_design.number_of_groups, "2"),
            other => panic!("unexpected design: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_object_replies() {
        assert!(matches!(
            parse_record_reply("[1, 2]"),
            Err(InferenceFailure::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse_record_reply("I could not find anything."),
            Err(InferenceFailure::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse_record_reply(r#"{"arm_groups": {"label": "x"}}"#),
            Err(InferenceFailure::MalformedResponse { .. })
        ));
    }

    #[test]
    fn reads_completion_envelope() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"brief_title\": \"Trial B\"}"}}]
        })
        .to_string();
        assert_eq!(parse_completion(&body).unwrap().brief_title, "Trial B");
        assert!(parse_completion(r#"{"choices": []}"#).is_err());
    }

    #[test]
    fn builds_chat_request() {
        let inferer = LlmInferer::new(LlmConfig {
            endpoint: "http://localhost:8080/v1/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(inferer.url, "http://localhost:8080/v1/chat/completions");
        let body = inferer.request_body("Brief Title: Trial A");
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["temperature"], 0);
        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.ends_with("Brief Title: Trial A"));
        assert!(user.contains("\"interventional_design\""));
    }

    #[test]
    fn unreachable_endpoint_is_a_transport_failure() {
        let inferer = LlmInferer::new(LlmConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            request_timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap();
        let chunk = Chunk {
            index: 0,
            start: 0,
            text: "Brief Title: Trial A".to_string(),
        };
        assert!(matches!(
            inferer.infer(&chunk),
            Err(InferenceFailure::Transport { .. })
        ));
    }
}
