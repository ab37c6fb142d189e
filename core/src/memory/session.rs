use std::sync::Mutex;

use super::entry::MemoryEntry;

/// Conversation history for one session.
///
/// Entries are normalized to plain text at append time; reads see a single
/// joined transcript. Each session owns its memory, nothing is shared across
/// sessions.
#[derive(Debug, Default)]
pub struct SessionMemory {
    entries: Mutex<Vec<String>>,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, entry: impl Into<MemoryEntry>) {
        let line = entry.into().normalize();
        self.entries.lock().unwrap().push(line);
    }

    /// The full transcript, entries joined by newlines in insertion order.
    pub fn context(&self) -> String {
        self.entries.lock().unwrap().join("\n")
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let memory = SessionMemory::new();
        memory.add(MemoryEntry::tagged("user", "first"));
        memory.add(MemoryEntry::tagged("tool_output", "second"));

        assert_eq!(memory.context(), "[user]\nfirst\n[tool_output]\nsecond");
    }

    #[test]
    fn clear_empties_transcript() {
        let memory = SessionMemory::new();
        memory.add("something");
        assert!(!memory.is_empty());

        memory.clear();
        assert!(memory.is_empty());
        assert_eq!(memory.context(), "");
    }

    #[test]
    fn accepts_plain_strings() {
        let memory = SessionMemory::new();
        memory.add("raw line");
        assert_eq!(memory.context(), "raw line");
    }
}
