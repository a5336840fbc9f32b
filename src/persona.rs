//! Assistant persona: display name and instruction template
//!
//! The persona is the replaceable asset wrapped around every user query
//! before it is sent to the provider. A default persona is compiled into
//! the binary; a JSON or TOML file can replace it at startup.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Embedded default persona
const EMBEDDED_PERSONA: &str = include_str!("../personas/rev.json");

/// Identity and instruction template for the assistant
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Persona {
    /// Unique identifier
    pub id: String,

    /// Display name, used as the speaker label in mock replies
    pub name: String,

    /// Instruction template placed ahead of the user query
    pub instructions: String,
}

impl Persona {
    /// Load the embedded default persona
    ///
    /// # Errors
    ///
    /// Returns error if the embedded JSON is malformed
    pub fn embedded() -> Result<Self> {
        serde_json::from_str(EMBEDDED_PERSONA)
            .map_err(|e| Error::Persona(format!("embedded persona is invalid: {e}")))
    }

    /// Load a persona from file (JSON by extension, TOML otherwise)
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let persona: Self = if is_json {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };

        tracing::debug!(path = %path.display(), id = %persona.id, "loaded persona from file");
        Ok(persona)
    }

    /// Load the override file if given, falling back to the embedded persona
    ///
    /// # Errors
    ///
    /// Returns error only if the embedded persona itself is unusable
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            match Self::from_file(path) {
                Ok(persona) => return Ok(persona),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load persona file, using embedded persona"
                    );
                }
            }
        }

        Self::embedded()
    }

    /// Wrap a user query in the instruction template
    #[must_use]
    pub fn render_prompt(&self, text: &str) -> String {
        format!("{}\nUser query: {text}", self.instructions)
    }

    /// Build a locally synthesized fallback reply
    ///
    /// Always contains the literal input text and the `(mock)` marker.
    #[must_use]
    pub fn mock_reply(&self, text: &str, detail: &str) -> String {
        format!("{} (mock): I heard \"{text}\". ({detail})", self.name)
    }
}
