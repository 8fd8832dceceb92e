use crate::state::entry::{Entry, EntryId, EntryState};
use std::collections::HashMap;

/// Ordered, append-only transcript. Entries are looked up by id, never by
/// ambient position; nothing final is removed or reordered.
#[derive(Default)]
pub struct ConversationLog {
    entries: Vec<Entry>,
    index: HashMap<EntryId, usize>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.index.get(&id).map(|&i| &self.entries[i])
    }

    pub(super) fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.index.get(&id).map(|&i| &mut self.entries[i])
    }

    pub fn append(&mut self, entry: Entry) {
        debug_assert!(!self.index.contains_key(&entry.id), "duplicate entry id");
        self.index.insert(entry.id, self.entries.len());
        self.entries.push(entry);
    }

    /// Rewrite an existing entry in place, or append when the id is new.
    pub fn replace_or_append(&mut self, entry: Entry) {
        match self.index.get(&entry.id) {
            Some(&i) => self.entries[i] = entry,
            None => self.append(entry),
        }
    }

    /// Remove an entry that never left `Pending`. Streaming and final
    /// entries stay put.
    pub(super) fn remove_pending(&mut self, id: EntryId) -> bool {
        let Some(&i) = self.index.get(&id) else {
            return false;
        };
        if self.entries[i].state != EntryState::Pending {
            return false;
        }

        self.entries.remove(i);
        self.index.remove(&id);
        for (j, entry) in self.entries.iter().enumerate().skip(i) {
            self.index.insert(entry.id, j);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::entry::Speaker;

    fn entry(id: EntryId, text: &str, state: EntryState) -> Entry {
        Entry {
            id,
            speaker: Speaker::Bot,
            text: text.to_string(),
            label: None,
            state,
        }
    }

    #[test]
    fn test_append_preserves_order_and_indexes_by_id() {
        let mut log = ConversationLog::new();
        log.append(entry(1, "first", EntryState::Final));
        log.append(entry(2, "second", EntryState::Final));

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].text, "first");
        assert_eq!(log.get(2).map(|e| e.text.as_str()), Some("second"));
    }

    #[test]
    fn test_replace_or_append_rewrites_in_place() {
        let mut log = ConversationLog::new();
        log.append(entry(1, "working", EntryState::Pending));
        log.append(entry(2, "later", EntryState::Final));

        log.replace_or_append(entry(1, "resolved", EntryState::Final));

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].text, "resolved");
        assert_eq!(log.entries()[0].state, EntryState::Final);
    }

    #[test]
    fn test_remove_refuses_non_pending_entries() {
        let mut log = ConversationLog::new();
        log.append(entry(1, "kept", EntryState::Final));
        log.append(entry(2, "working", EntryState::Pending));
        log.append(entry(3, "tail", EntryState::Final));

        assert!(!log.remove_pending(1));
        assert!(log.remove_pending(2));
        assert!(!log.remove_pending(2));

        assert_eq!(log.len(), 2);
        // Later entries stay reachable by id after the removal shifts them.
        assert_eq!(log.get(3).map(|e| e.text.as_str()), Some("tail"));
    }
}
