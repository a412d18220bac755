use crate::models::{ImputationRequest, PromptMessage};
use serde::Deserialize;
use std::error::Error;
use std::path::Path;
use tracing::info;

const DEFAULT_SYSTEM_TEMPLATE: &str = "Given the following field information, fill in any missing values in the provided data. Use the format: {format_instructions}.";
const DEFAULT_USER_TEMPLATE: &str = "Field Information: {all_field_info}, Data: {input_data}";

#[derive(Debug, Deserialize, Clone)]
pub struct PromptTemplates {
    #[serde(default = "default_system")]
    pub system: String,
    #[serde(default = "default_user")]
    pub user: String,
}

fn default_system() -> String {
    DEFAULT_SYSTEM_TEMPLATE.to_string()
}

fn default_user() -> String {
    DEFAULT_USER_TEMPLATE.to_string()
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: default_system(),
            user: default_user(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PromptManager {
    templates: PromptTemplates,
}

impl PromptManager {
    pub fn new(templates: PromptTemplates) -> Self {
        Self { templates }
    }

    pub async fn from_file(path: &Path) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let config_str = tokio::fs::read_to_string(path).await?;
        let templates: PromptTemplates = serde_yaml::from_str(&config_str)?;
        info!("Loaded prompt templates from {}", path.display());
        Ok(Self::new(templates))
    }

    /// Renders the system and user messages for one imputation request.
    ///
    /// Maps are substituted as compact JSON. Values are not escaped.
    pub fn format_imputation(
        &self,
        request: &ImputationRequest,
    ) -> Result<Vec<PromptMessage>, serde_json::Error> {
        let all_field_info = serde_json::to_string(&request.all_field_info)?;
        let input_data = serde_json::to_string(&request.input_data)?;
        let values = [
            ("format_instructions", request.format_instructions.as_str()),
            ("all_field_info", all_field_info.as_str()),
            ("input_data", input_data.as_str()),
        ];
        let render = |template: &str| render_template(template, &values);

        Ok(vec![
            PromptMessage::system(render(&self.templates.system)),
            PromptMessage::user(render(&self.templates.user)),
        ])
    }
}

/// Substitutes `{name}` placeholders in one pass over the template.
///
/// Substituted text is never scanned again. Unknown `{...}` tokens are kept as is.
fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let value = tail.find('}').and_then(|close| {
            let name = &tail[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
