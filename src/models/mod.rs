pub mod config;
pub mod providers;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A partially filled record plus everything the model needs to complete it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputationRequest {
    pub input_data: Map<String, Value>,
    pub all_field_info: BTreeMap<String, String>,
    pub format_instructions: String,
}

/// Envelope returned by `POST /api/impute`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ImputeResponse {
    pub imputed_data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Joins every message with the given role, in order.
pub fn joined_content(messages: &[PromptMessage], role: Role) -> String {
    messages
        .iter()
        .filter(|m| m.role == role)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_requires_all_fields() {
        let missing = r#"{"input_data": {"name": "Ana"}, "all_field_info": {"name": "string"}}"#;
        let err = serde_json::from_str::<ImputationRequest>(missing).unwrap_err();
        assert!(err.to_string().contains("format_instructions"));
    }

    #[test]
    fn test_request_keeps_null_values() {
        let body = r#"{
            "input_data": {"name": "Ana", "age": null},
            "all_field_info": {"name": "string", "age": "integer"},
            "format_instructions": "JSON"
        }"#;
        let request: ImputationRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.input_data.get("age"), Some(&Value::Null));
        assert_eq!(request.all_field_info["age"], "integer");
    }

    #[test]
    fn test_field_info_must_be_strings() {
        let body = r#"{
            "input_data": {},
            "all_field_info": {"age": 3},
            "format_instructions": "JSON"
        }"#;
        assert!(serde_json::from_str::<ImputationRequest>(body).is_err());
    }

    #[test]
    fn test_joined_content_filters_by_role() {
        let messages = vec![
            PromptMessage::system("a"),
            PromptMessage::user("b"),
            PromptMessage::system("c"),
        ];
        assert_eq!(joined_content(&messages, Role::System), "a\n\nc");
        assert_eq!(joined_content(&messages, Role::User), "b");
    }
}
