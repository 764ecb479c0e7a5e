use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc;

use crate::composer::Composer;
use crate::config::Config;
use crate::reply::ReplyScheduler;
use crate::storage::{self, FileStore, KeyValueStore};
use crate::store::{ChatStore, PendingReply};
use crate::theme::ThemeSetting;
use crate::tui::AppEvent;

pub const SUGGESTIONS: [&str; 4] = [
    "Summarize this article",
    "Draft a friendly email",
    "Explain this concept simply",
    "Brainstorm ideas for a weekend trip",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Composer,
    Sidebar,
    Suggestions,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Composer => FocusPane::Sidebar,
            FocusPane::Sidebar => FocusPane::Suggestions,
            FocusPane::Suggestions => FocusPane::Composer,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusPane::Composer => FocusPane::Suggestions,
            FocusPane::Sidebar => FocusPane::Composer,
            FocusPane::Suggestions => FocusPane::Sidebar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    None,
    ConfirmDelete { id: String, title: String },
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: FocusPane,
    pub popup: Popup,

    // Chats
    pub store: ChatStore,
    pub sidebar_state: ListState,
    pub replies: ReplyScheduler,

    // Transcript
    pub transcript_scroll: u16,
    /// Pinned to the newest message until the user scrolls up
    pub follow_transcript: bool,
    pub transcript_height: u16,
    pub transcript_width: u16,

    // Composer
    pub composer: Composer,
    pub max_input_rows: u16,
    pub suggestion_idx: usize,

    // Theme
    pub theme: ThemeSetting,
    prefs: Box<dyn KeyValueStore>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub sidebar_area: Option<Rect>,
    pub transcript_area: Option<Rect>,
}

impl App {
    pub fn new(config: &Config, tx: mpsc::UnboundedSender<AppEvent>) -> anyhow::Result<Self> {
        let data_dir = config.data_dir()?;
        let backend = FileStore::new(&data_dir);
        Ok(Self::with_stores(
            Box::new(backend.clone()),
            Box::new(backend),
            config,
            tx,
        ))
    }

    /// Build from explicit stores for chat state and preferences.
    pub fn with_stores(
        chats: Box<dyn KeyValueStore>,
        prefs: Box<dyn KeyValueStore>,
        config: &Config,
        tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let mut store = ChatStore::open(chats);
        store.boot();
        let theme = storage::load_theme(prefs.as_ref());

        let mut app = Self {
            should_quit: false,
            focus: FocusPane::Composer,
            popup: Popup::None,

            store,
            sidebar_state: ListState::default(),
            replies: ReplyScheduler::new(config.reply_delay(), tx),

            transcript_scroll: 0,
            follow_transcript: true,
            transcript_height: 0,
            transcript_width: 0,

            composer: Composer::new(),
            max_input_rows: config.max_input_rows(),
            suggestion_idx: 0,

            theme,
            prefs,

            animation_frame: 0,

            sidebar_area: None,
            transcript_area: None,
        };
        app.sync_sidebar();
        app
    }

    /// Point the sidebar highlight at the active chat.
    fn sync_sidebar(&mut self) {
        self.sidebar_state.select(self.store.active_index());
    }

    fn after_switch(&mut self) {
        self.sync_sidebar();
        self.follow_transcript = true;
    }

    /// Abort timers for `chat_id` and drop their placeholders.
    fn cancel_replies(&mut self, chat_id: &str) {
        let abandoned = self.replies.cancel_chat(chat_id);
        self.store.discard_pending(chat_id, &abandoned);
    }

    pub fn new_chat(&mut self) {
        if let Some(previous) = self.store.active_chat_id().map(str::to_string) {
            self.cancel_replies(&previous);
        }
        self.store.create_chat();
        self.after_switch();
        self.focus = FocusPane::Composer;
    }

    pub fn select_chat(&mut self, id: &str) {
        if !self.store.chats().iter().any(|c| c.id == id) {
            return;
        }
        let previous = self.store.active_chat_id().map(str::to_string);
        if previous.as_deref() == Some(id) {
            return;
        }
        if let Some(previous) = previous {
            self.cancel_replies(&previous);
        }
        self.store.select_chat(id);
        self.after_switch();
    }

    pub fn delete_chat(&mut self, id: &str) {
        self.replies.cancel_chat(id);
        if self.store.delete_chat(id) {
            self.after_switch();
        }
    }

    /// Submit the composer's text. Blank input leaves the composer as is.
    pub fn submit(&mut self) {
        if self.composer.text().trim().is_empty() {
            return;
        }
        let text = self.composer.take();
        let Some(trimmed) = self.store.append_user_message(&text) else {
            return;
        };
        self.follow_transcript = true;
        if let Some(pending) = self.store.request_reply() {
            self.replies.schedule(pending, trimmed);
        }
    }

    pub fn receive_reply(&mut self, pending: PendingReply, content: String) {
        self.replies.complete(&pending.message_id);
        if self.store.resolve_reply(&pending, content) {
            self.follow_transcript = true;
        }
    }

    pub fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
        storage::save_theme(self.prefs.as_ref(), self.theme);
    }

    // Sidebar navigation
    pub fn sidebar_down(&mut self) {
        let len = self.store.chats().len();
        if len > 0 {
            let i = self.sidebar_state.selected().unwrap_or(0);
            self.sidebar_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn sidebar_up(&mut self) {
        if !self.store.chats().is_empty() {
            let i = self.sidebar_state.selected().unwrap_or(0);
            self.sidebar_state.select(Some(i.saturating_sub(1)));
        }
    }

    pub fn highlighted_chat_id(&self) -> Option<String> {
        self.sidebar_state
            .selected()
            .and_then(|i| self.store.chats().get(i))
            .map(|c| c.id.clone())
    }

    pub fn select_highlighted(&mut self) {
        if let Some(id) = self.highlighted_chat_id() {
            self.select_chat(&id);
        }
    }

    /// Open the confirmation popup for the highlighted chat.
    pub fn confirm_delete_highlighted(&mut self) {
        let Some(i) = self.sidebar_state.selected() else {
            return;
        };
        if let Some(chat) = self.store.chats().get(i) {
            self.popup = Popup::ConfirmDelete {
                id: chat.id.clone(),
                title: chat.display_title().to_string(),
            };
        }
    }

    pub fn accept_popup(&mut self) {
        if let Popup::ConfirmDelete { id, .. } = std::mem::replace(&mut self.popup, Popup::None) {
            self.delete_chat(&id);
        }
    }

    pub fn dismiss_popup(&mut self) {
        self.popup = Popup::None;
    }

    // Suggestion chips
    pub fn suggestion_next(&mut self) {
        self.suggestion_idx = (self.suggestion_idx + 1).min(SUGGESTIONS.len() - 1);
    }

    pub fn suggestion_prev(&mut self) {
        self.suggestion_idx = self.suggestion_idx.saturating_sub(1);
    }

    /// Fill the composer with the highlighted suggestion without sending it.
    pub fn apply_suggestion(&mut self) {
        if let Some(text) = SUGGESTIONS.get(self.suggestion_idx) {
            self.composer.set_text(text);
            self.focus = FocusPane::Composer;
        }
    }

    // Transcript scrolling
    pub fn scroll_up(&mut self, lines: u16) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(lines);
        self.follow_transcript = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.transcript_scroll = self.transcript_scroll.saturating_add(lines);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.replies.pending_count() > 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
