use serde_json::Value;

/// A single unit of conversation history before normalization.
///
/// Every variant collapses into one transcript line block; the tag labels
/// (`[user]`, `[tool_output]`, ...) come from whoever records the entry.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryEntry {
    Raw(String),
    Tagged { kind: String, content: String },
    Message { role: String, content: String },
    Structured(Value),
}

impl MemoryEntry {
    pub fn raw(content: impl Into<String>) -> Self {
        MemoryEntry::Raw(content.into())
    }

    pub fn tagged(kind: impl Into<String>, content: impl Into<String>) -> Self {
        MemoryEntry::Tagged {
            kind: kind.into(),
            content: content.into(),
        }
    }

    pub fn message(role: impl Into<String>, content: impl Into<String>) -> Self {
        MemoryEntry::Message {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Flatten into the stored transcript form. Total: structured payloads
    /// that cannot be pretty-printed fall back to their compact rendering.
    pub fn normalize(&self) -> String {
        match self {
            MemoryEntry::Raw(content) => content.clone(),
            MemoryEntry::Tagged { kind, content } => format!("[{kind}]\n{content}"),
            MemoryEntry::Message { role, content } => format!("[{role}]\n{content}"),
            MemoryEntry::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

impl From<&str> for MemoryEntry {
    fn from(content: &str) -> Self {
        MemoryEntry::Raw(content.to_string())
    }
}

impl From<String> for MemoryEntry {
    fn from(content: String) -> Self {
        MemoryEntry::Raw(content)
    }
}

impl From<Value> for MemoryEntry {
    fn from(value: Value) -> Self {
        MemoryEntry::Structured(value)
    }
}
