//! Generative Language API request building and response parsing

use serde_json::json;
use url::Url;

use crate::Result;

/// Build the `generateContent` endpoint for a model
///
/// The model identifier is appended as a single encoded path segment.
///
/// # Errors
///
/// Returns error if `api_base` is not an absolute URL
pub fn endpoint(api_base: &str, model: &str) -> Result<String> {
    let mut url = Url::parse(api_base.trim_end_matches('/'))?;
    url.path_segments_mut()
        .map_err(|()| crate::Error::Config(format!("cannot use '{api_base}' as a base URL")))?
        .push(&format!("{model}:generateContent"));
    Ok(url.into())
}

/// Build the JSON request body carrying the rendered prompt
#[must_use]
pub fn request_body(prompt: &str) -> serde_json::Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }]
    })
}

/// Extract the reply text from a response body
///
/// Returns `None` if the body is not JSON or lacks
/// `candidates[0].content.parts[0].text` as a non-empty string.
#[must_use]
pub fn parse_reply(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}
