use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const SEQUENCE_MARKER: &str = "{n}";

/// Format string producing keyword placeholders, e.g. `[REDACTED_{n}]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlaceholderTemplate(String);

impl PlaceholderTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(SEQUENCE_MARKER) {
            return Err(Error::InvalidTemplate(format!(
                "'{}' has no {} substitution point",
                template, SEQUENCE_MARKER
            )));
        }
        Ok(Self(template))
    }

    /// Render the placeholder for sequence number `n`
    pub fn render(&self, n: u64) -> String {
        self.0.replace(SEQUENCE_MARKER, &n.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PlaceholderTemplate {
    fn default() -> Self {
        Self("[REDACTED_{n}]".to_string())
    }
}

impl TryFrom<String> for PlaceholderTemplate {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PlaceholderTemplate> for String {
    fn from(value: PlaceholderTemplate) -> Self {
        value.0
    }
}
