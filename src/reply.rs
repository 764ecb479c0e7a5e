use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::store::PendingReply;
use crate::tui::AppEvent;

pub const DEFAULT_REPLY_DELAY_MS: u64 = 450;

fn templates(text: &str) -> [String; 3] {
    [
        format!("You said: \"{}\". I can help refine or expand on that.", text),
        format!(
            "Here are some thoughts about \"{}\":\n- Key points\n- Examples\n- Follow-ups",
            text
        ),
        format!("Echoing back: {}. What outcome are you aiming for?", text),
    ]
}

/// Pick one canned reply for `text`, uniformly at random.
pub fn generate_reply<R: Rng>(text: &str, rng: &mut R) -> String {
    let mut options = templates(text);
    let idx = rng.gen_range(0..options.len());
    std::mem::take(&mut options[idx])
}

struct Scheduled {
    chat_id: String,
    handle: JoinHandle<()>,
}

/// Delayed mock replies, one timer task per placeholder.
pub struct ReplyScheduler {
    delay: Duration,
    tx: mpsc::UnboundedSender<AppEvent>,
    tasks: HashMap<String, Scheduled>,
}

impl ReplyScheduler {
    pub fn new(delay: Duration, tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            delay,
            tx,
            tasks: HashMap::new(),
        }
    }

    pub fn schedule(&mut self, pending: PendingReply, text: String) {
        let delay = self.delay;
        let tx = self.tx.clone();
        let key = pending.message_id.clone();
        let chat_id = pending.chat_id.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let content = generate_reply(&text, &mut rand::thread_rng());
            let _ = tx.send(AppEvent::Reply { pending, content });
        });

        self.tasks.insert(key, Scheduled { chat_id, handle });
    }

    /// Forget a timer whose reply has been delivered.
    pub fn complete(&mut self, message_id: &str) {
        self.tasks.remove(message_id);
    }

    /// Abort every timer for `chat_id`, returning the placeholders left behind.
    pub fn cancel_chat(&mut self, chat_id: &str) -> Vec<String> {
        let ids: Vec<String> = self
            .tasks
            .iter()
            .filter(|(_, s)| s.chat_id == chat_id)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &ids {
            if let Some(scheduled) = self.tasks.remove(id) {
                scheduled.handle.abort();
            }
        }
        if !ids.is_empty() {
            tracing::debug!("cancelled {} pending repl(ies) for {}", ids.len(), chat_id);
        }
        ids
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Drop for ReplyScheduler {
    fn drop(&mut self) {
        for (_, scheduled) in self.tasks.drain() {
            scheduled.handle.abort();
        }
    }
}
