use serde::{Deserialize, Serialize};

/// A fixed byte prefix identifying a binary format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicSignature {
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MagicSignature {
    pub fn new(name: &str, mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    pub fn matches(&self, content: &[u8]) -> bool {
        !self.bytes.is_empty() && content.starts_with(&self.bytes)
    }
}

/// A content regex. `name` is what shows up in the threat text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub name: String,
    pub pattern: String,
}

impl PatternRule {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
        }
    }
}
