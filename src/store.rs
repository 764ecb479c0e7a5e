//! The chat store: one owned container for the chat list and active id.
//!
//! Every mutation persists through the key-value store before returning.
//! Rendering is the event loop's job; it redraws after each handled event.

use std::collections::HashSet;

use crate::state::{Chat, ChatState, Message};
use crate::storage::{self, KeyValueStore};

/// Names the placeholder a scheduled reply will fill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub chat_id: String,
    pub message_id: String,
}

pub struct ChatStore {
    state: ChatState,
    backend: Box<dyn KeyValueStore>,
}

impl ChatStore {
    /// Load whatever is stored and repair it so the invariants hold.
    pub fn open(backend: Box<dyn KeyValueStore>) -> Self {
        let mut state = storage::load_state(backend.as_ref()).unwrap_or_default();

        let mut seen = HashSet::new();
        state.chats.retain(|chat| seen.insert(chat.id.clone()));

        // Placeholders from an interrupted session have no timer behind them
        for chat in &mut state.chats {
            chat.messages.retain(|m| !m.pending);
        }

        if let Some(id) = &state.active_chat_id {
            if !state.chats.iter().any(|c| &c.id == id) {
                state.active_chat_id = None;
            }
        }

        Self { state, backend }
    }

    /// First-run setup: make sure something is active.
    pub fn boot(&mut self) {
        if self.state.chats.is_empty() {
            self.create_chat();
        } else if self.state.active_chat_id.is_none() {
            self.state.active_chat_id = Some(self.state.chats[0].id.clone());
            self.persist();
        }
        tracing::info!(
            "booted with {} chat(s), active {:?}",
            self.state.chats.len(),
            self.state.active_chat_id
        );
    }

    pub fn chats(&self) -> &[Chat] {
        &self.state.chats
    }

    pub fn active_chat_id(&self) -> Option<&str> {
        self.state.active_chat_id.as_deref()
    }

    pub fn active_chat(&self) -> Option<&Chat> {
        let id = self.state.active_chat_id.as_ref()?;
        self.state.chats.iter().find(|c| &c.id == id)
    }

    pub fn active_index(&self) -> Option<usize> {
        let id = self.state.active_chat_id.as_ref()?;
        self.state.chats.iter().position(|c| &c.id == id)
    }

    fn active_chat_mut(&mut self) -> Option<&mut Chat> {
        let id = self.state.active_chat_id.clone()?;
        self.state.chats.iter_mut().find(|c| c.id == id)
    }

    fn persist(&self) -> bool {
        storage::save_state(self.backend.as_ref(), &self.state)
    }

    pub fn create_chat(&mut self) -> String {
        let chat = Chat::new();
        let id = chat.id.clone();
        self.state.chats.insert(0, chat);
        self.state.active_chat_id = Some(id.clone());
        self.persist();
        tracing::debug!("created chat {}", id);
        id
    }

    pub fn select_chat(&mut self, id: &str) {
        if !self.state.chats.iter().any(|c| c.id == id) {
            return;
        }
        self.state.active_chat_id = Some(id.to_string());
        self.persist();
    }

    /// Returns false when no chat has this id.
    pub fn delete_chat(&mut self, id: &str) -> bool {
        let Some(index) = self.state.chats.iter().position(|c| c.id == id) else {
            return false;
        };
        self.state.chats.remove(index);
        if self.state.active_chat_id.as_deref() == Some(id) {
            self.state.active_chat_id = self.state.chats.first().map(|c| c.id.clone());
        }
        self.persist();
        tracing::debug!("deleted chat {}", id);
        true
    }

    /// Append a user message to the active chat.
    ///
    /// Returns the trimmed text when it was stored, so the caller can ask
    /// for a reply. Blank input or no active chat stores nothing.
    pub fn append_user_message(&mut self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let chat = self.active_chat_mut()?;
        chat.messages.push(Message::user(trimmed));
        chat.touch();
        chat.refresh_title();
        self.persist();
        Some(trimmed.to_string())
    }

    /// Insert a pending assistant placeholder into the active chat.
    pub fn request_reply(&mut self) -> Option<PendingReply> {
        let chat = self.active_chat_mut()?;
        let placeholder = Message::placeholder();
        let pending = PendingReply {
            chat_id: chat.id.clone(),
            message_id: placeholder.id.clone(),
        };
        chat.messages.push(placeholder);
        self.persist();
        Some(pending)
    }

    /// Fill a placeholder with its reply. Dropped when the chat is no longer
    /// active or the placeholder is gone.
    pub fn resolve_reply(&mut self, pending: &PendingReply, reply: String) -> bool {
        if self.active_chat_id() != Some(pending.chat_id.as_str()) {
            tracing::debug!("dropping reply for inactive chat {}", pending.chat_id);
            return false;
        }
        let Some(chat) = self.active_chat_mut() else {
            return false;
        };
        let Some(message) = chat.message_mut(&pending.message_id) else {
            return false;
        };
        if !message.pending {
            return false;
        }
        message.content = reply;
        message.pending = false;
        chat.touch();
        self.persist();
        true
    }

    /// Remove placeholders whose timers were cancelled.
    pub fn discard_pending(&mut self, chat_id: &str, message_ids: &[String]) {
        if message_ids.is_empty() {
            return;
        }
        let Some(chat) = self.state.chats.iter_mut().find(|c| c.id == chat_id) else {
            return;
        };
        let before = chat.messages.len();
        chat.messages
            .retain(|m| !(m.pending && message_ids.contains(&m.id)));
        if chat.messages.len() != before {
            self.persist();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Role, DEFAULT_TITLE, GREETING, PLACEHOLDER};
    use crate::storage::FileStore;

    fn open_store(dir: &tempfile::TempDir) -> ChatStore {
        ChatStore::open(Box::new(FileStore::new(dir.path())))
    }

    fn assert_active_valid(store: &ChatStore) {
        if let Some(id) = store.active_chat_id() {
            assert!(store.chats().iter().any(|c| c.id == id));
        }
    }

    #[test]
    fn test_boot_with_nothing_stored() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        store.boot();

        assert_eq!(store.chats().len(), 1);
        let chat = store.active_chat().unwrap();
        assert_eq!(chat.title, DEFAULT_TITLE);
        assert_eq!(chat.messages.len(), 1);
        assert_eq!(chat.messages[0].role, Role::Assistant);
        assert_eq!(chat.messages[0].content, GREETING);
    }

    #[test]
    fn test_boot_activates_first_when_none_active() {
        let dir = tempfile::tempdir().unwrap();
        let first = {
            let mut store = open_store(&dir);
            store.create_chat();
            let first = store.create_chat();
            store.state.active_chat_id = None;
            store.persist();
            first
        };
        let mut store = open_store(&dir);
        store.boot();
        assert_eq!(store.chats().len(), 2);
        assert_eq!(store.active_chat_id(), Some(first.as_str()));
    }

    #[test]
    fn test_create_inserts_first_and_activates() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        let a = store.create_chat();
        let b = store.create_chat();
        assert_eq!(store.chats()[0].id, b);
        assert_eq!(store.chats()[1].id, a);
        assert_eq!(store.active_chat_id(), Some(b.as_str()));
        assert!(!store.chats()[0].messages.is_empty());
    }

    #[test]
    fn test_delete_only_chat() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        let x = store.create_chat();
        assert!(store.delete_chat(&x));
        assert!(store.chats().is_empty());
        assert_eq!(store.active_chat_id(), None);
    }

    #[test]
    fn test_delete_active_moves_to_new_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        let a = store.create_chat();
        let b = store.create_chat();
        store.create_chat();
        store.select_chat(&b);
        store.delete_chat(&b);
        assert_eq!(store.chats().len(), 2);
        assert_eq!(store.active_chat_id(), Some(store.chats()[0].id.as_str()));
        assert_ne!(store.active_chat_id(), Some(a.as_str()));
    }

    #[test]
    fn test_delete_inactive_keeps_selection_and_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        let a = store.create_chat();
        let b = store.create_chat();
        store.select_chat(&a);
        assert_eq!(store.active_index(), Some(1));

        store.delete_chat(&b);
        assert_eq!(store.active_chat_id(), Some(a.as_str()));
        assert_eq!(store.active_index(), Some(0));
        assert_eq!(store.chats().len(), 1);

        // Deleting a later chat doesn't shift the active one
        let c = store.create_chat();
        store.create_chat();
        store.select_chat(&c);
        store.delete_chat(&a);
        assert_eq!(store.active_chat_id(), Some(c.as_str()));
        assert_eq!(store.active_index(), Some(1));
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        let a = store.create_chat();
        assert!(!store.delete_chat("missing"));
        assert_eq!(store.active_chat_id(), Some(a.as_str()));
    }

    #[test]
    fn test_select_unknown_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        let a = store.create_chat();
        store.select_chat("missing");
        assert_eq!(store.active_chat_id(), Some(a.as_str()));
    }

    #[test]
    fn test_active_always_valid_across_create_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        let mut ids: Vec<String> = Vec::new();
        for round in 0..12 {
            if round % 3 == 2 {
                let victim = ids.remove(round % ids.len());
                store.delete_chat(&victim);
            } else {
                ids.push(store.create_chat());
            }
            assert_active_valid(&store);
        }
        while let Some(id) = ids.pop() {
            store.delete_chat(&id);
            assert_active_valid(&store);
        }
        assert_eq!(store.active_chat_id(), None);
    }

    #[test]
    fn test_whitespace_message_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        store.create_chat();
        let before = store.active_chat().unwrap().clone();
        assert_eq!(store.append_user_message("   \n\t "), None);
        assert_eq!(store.active_chat().unwrap(), &before);
    }

    #[test]
    fn test_message_without_active_chat_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        assert_eq!(store.append_user_message("hi"), None);
        assert_eq!(store.request_reply(), None);
    }

    #[test]
    fn test_first_message_sets_title() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        store.create_chat();
        let long = "x".repeat(100);
        assert_eq!(store.append_user_message(&format!("  {}  ", long)), Some(long.clone()));
        let chat = store.active_chat().unwrap();
        assert_eq!(chat.title, "x".repeat(60));
        assert_eq!(chat.messages.last().unwrap().content, long);
    }

    #[test]
    fn test_send_then_reply() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        store.create_chat();
        store.append_user_message("Hello").unwrap();
        let pending = store.request_reply().unwrap();

        let messages = &store.active_chat().unwrap().messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "Hello");
        assert_eq!(messages[2].content, PLACEHOLDER);
        assert!(messages[2].pending);

        assert!(store.resolve_reply(&pending, "Echoing back: Hello.".to_string()));
        let last = store.active_chat().unwrap().messages.last().unwrap();
        assert_eq!(last.content, "Echoing back: Hello.");
        assert!(!last.pending);

        // A second delivery finds nothing pending
        assert!(!store.resolve_reply(&pending, "again".to_string()));
    }

    #[test]
    fn test_two_pending_replies_resolve_independently() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        store.create_chat();
        store.append_user_message("one");
        let first = store.request_reply().unwrap();
        store.append_user_message("two");
        let second = store.request_reply().unwrap();

        assert!(store.resolve_reply(&second, "reply two".to_string()));
        assert!(store.resolve_reply(&first, "reply one".to_string()));

        let contents: Vec<&str> = store
            .active_chat()
            .unwrap()
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents[1..], ["one", "reply one", "two", "reply two"]);
    }

    #[test]
    fn test_reply_dropped_after_switch() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        let a = store.create_chat();
        store.append_user_message("Hello");
        let pending = store.request_reply().unwrap();
        store.create_chat();

        assert!(!store.resolve_reply(&pending, "late".to_string()));
        store.select_chat(&a);
        assert!(store.active_chat().unwrap().messages.last().unwrap().pending);
    }

    #[test]
    fn test_reply_dropped_after_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        let a = store.create_chat();
        store.append_user_message("Hello");
        let pending = store.request_reply().unwrap();
        store.delete_chat(&a);
        assert!(!store.resolve_reply(&pending, "late".to_string()));
    }

    #[test]
    fn test_discard_pending_removes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        let a = store.create_chat();
        store.append_user_message("Hello");
        let pending = store.request_reply().unwrap();
        store.discard_pending(&a, &[pending.message_id]);
        let chat = store.active_chat().unwrap();
        assert_eq!(chat.messages.len(), 2);
        assert!(chat.messages.iter().all(|m| !m.pending));
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let saved = {
            let mut store = open_store(&dir);
            store.create_chat();
            store.append_user_message("persist me");
            store.create_chat();
            store.state.clone()
        };
        let store = open_store(&dir);
        assert_eq!(store.state, saved);
    }

    #[test]
    fn test_open_repairs_stale_state() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileStore::new(dir.path());
        let mut chat = Chat::new();
        chat.messages.push(Message::user("q"));
        chat.messages.push(Message::placeholder());
        let state = ChatState {
            chats: vec![chat.clone(), chat.clone()],
            active_chat_id: Some("gone".to_string()),
        };
        storage::save_state(&backend, &state);

        let store = ChatStore::open(Box::new(backend));
        assert_eq!(store.chats().len(), 1);
        assert_eq!(store.chats()[0].messages.len(), 2);
        assert_eq!(store.active_chat_id(), None);
    }
}
