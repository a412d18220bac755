use serde_json::{Deserializer, Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum JsonExtractError {
    #[error("no '{{' found in response")]
    NoObject,
    #[error("{0}")]
    Parse(#[from] serde_json::Error),
}

/// Finds the first complete JSON object embedded in `text`.
///
/// Every `{` is tried as a starting point, left to right. From each one a
/// single JSON value is stream-parsed, so prose after the object is ignored.
/// Candidates that fail to parse, or parse into something other than an
/// object, are skipped. When no candidate yields an object, the error from
/// the first candidate is returned.
pub fn extract_first_json_object(text: &str) -> Result<Map<String, Value>, JsonExtractError> {
    let mut first_error = None;

    for (start, _) in text.match_indices('{') {
        let mut stream = Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => {
                debug!(offset = start, "Extracted JSON object from response");
                return Ok(map);
            }
            Some(Ok(_)) | None => {}
            Some(Err(e)) => {
                first_error.get_or_insert(e);
            }
        }
    }

    Err(first_error.map_or(JsonExtractError::NoObject, JsonExtractError::Parse))
}
