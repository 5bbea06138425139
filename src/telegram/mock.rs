use super::types::{Chat, Message, Update, User};
use super::MessengerService;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Outbound call recorded by [`MockTelegramClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum SentAction {
    DeleteWebhook {
        drop_pending_updates: bool,
    },
    Message {
        chat_id: i64,
        message_id: i64,
        text: String,
        reply_to: Option<i64>,
    },
    Photo {
        chat_id: i64,
        message_id: i64,
        url: String,
        caption: String,
        spoiler: bool,
        reply_to: Option<i64>,
    },
    Delete {
        chat_id: i64,
        message_id: i64,
    },
}

/// Telegram rejects `sendMessage` texts longer than this.
const MESSAGE_CHAR_LIMIT: usize = 4096;

/// One scripted `getUpdates` response, served in order.
enum Poll {
    Batch(Vec<Update>),
    Fail,
}

#[derive(Default)]
struct Failures {
    send_message: usize,
    send_photo: usize,
    delete_message: usize,
}

/// In-memory transport. Replays queued update batches and poll failures in
/// order, and records every successful outbound call; scripted failures are
/// not recorded.
#[derive(Clone)]
pub struct MockTelegramClient {
    username: String,
    polls: Arc<Mutex<VecDeque<Poll>>>,
    actions: Arc<Mutex<Vec<SentAction>>>,
    failures: Arc<Mutex<Failures>>,
    next_message_id: Arc<Mutex<i64>>,
    get_updates_count: Arc<Mutex<usize>>,
}

impl MockTelegramClient {
    pub fn new() -> Self {
        Self {
            username: "imagine_test_bot".to_string(),
            polls: Arc::new(Mutex::new(VecDeque::new())),
            actions: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Failures::default())),
            next_message_id: Arc::new(Mutex::new(1000)),
            get_updates_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_updates(self, updates: Vec<Update>) -> Self {
        self.polls.lock().unwrap().push_back(Poll::Batch(updates));
        self
    }

    /// Queue `count` consecutive failing polls after anything already queued.
    pub fn with_get_updates_failures(self, count: usize) -> Self {
        self.polls
            .lock()
            .unwrap()
            .extend((0..count).map(|_| Poll::Fail));
        self
    }

    pub fn with_send_message_failures(self, count: usize) -> Self {
        self.failures.lock().unwrap().send_message = count;
        self
    }

    pub fn with_send_photo_failures(self, count: usize) -> Self {
        self.failures.lock().unwrap().send_photo = count;
        self
    }

    pub fn with_delete_message_failures(self, count: usize) -> Self {
        self.failures.lock().unwrap().delete_message = count;
        self
    }

    pub fn get_actions(&self) -> Vec<SentAction> {
        self.actions.lock().unwrap().clone()
    }

    pub fn get_updates_call_count(&self) -> usize {
        *self.get_updates_count.lock().unwrap()
    }

    /// Resolve once at least `count` outbound actions have been recorded.
    pub async fn wait_for_actions(&self, count: usize) {
        loop {
            let recorded = self.actions.lock().unwrap().len();
            if recorded >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Build an incoming text message update for tests.
    pub fn text_update(update_id: i64, chat_id: i64, message_id: i64, text: &str) -> Update {
        Update {
            update_id,
            message: Some(Message {
                message_id,
                date: Utc::now(),
                chat: Chat { id: chat_id },
                from: Some(User {
                    id: chat_id,
                    first_name: "Tester".to_string(),
                    username: None,
                }),
                text: Some(text.to_string()),
            }),
        }
    }

    fn take_failure(&self, select: impl FnOnce(&mut Failures) -> &mut usize) -> bool {
        let mut failures = self.failures.lock().unwrap();
        let remaining = select(&mut failures);
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }

    fn record(&self, chat_id: i64, build: impl FnOnce(i64) -> SentAction) -> Message {
        let message_id = {
            let mut next = self.next_message_id.lock().unwrap();
            *next += 1;
            *next
        };
        self.actions.lock().unwrap().push(build(message_id));
        Message {
            message_id,
            date: Utc::now(),
            chat: Chat { id: chat_id },
            from: None,
            text: None,
        }
    }
}

impl Default for MockTelegramClient {
    fn default() -> Self {
        Self::new()
    }
}

fn scripted_error(method: &str) -> Error {
    Error::Telegram {
        code: 500,
        description: format!("scripted {} failure", method),
    }
}

#[async_trait]
impl MessengerService for MockTelegramClient {
    async fn get_me(&self) -> Result<User> {
        Ok(User {
            id: 1,
            first_name: "Imagine".to_string(),
            username: Some(self.username.clone()),
        })
    }

    async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<()> {
        self.actions.lock().unwrap().push(SentAction::DeleteWebhook {
            drop_pending_updates,
        });
        Ok(())
    }

    async fn get_updates(&self, offset: Option<i64>, _timeout_secs: u64) -> Result<Vec<Update>> {
        *self.get_updates_count.lock().unwrap() += 1;

        let next = self.polls.lock().unwrap().pop_front();
        match next {
            Some(Poll::Fail) => Err(scripted_error("getUpdates")),
            Some(Poll::Batch(batch)) => Ok(batch
                .into_iter()
                .filter(|u| offset.map_or(true, |o| u.update_id >= o))
                .collect()),
            None => {
                // Stand-in for an idle long poll
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<Message> {
        if self.take_failure(|f| &mut f.send_message) {
            return Err(scripted_error("sendMessage"));
        }
        if text.chars().count() > MESSAGE_CHAR_LIMIT {
            return Err(Error::Telegram {
                code: 400,
                description: "Bad Request: message is too long".to_string(),
            });
        }
        Ok(self.record(chat_id, |message_id| SentAction::Message {
            chat_id,
            message_id,
            text: text.to_string(),
            reply_to,
        }))
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: &str,
        spoiler: bool,
        reply_to: Option<i64>,
    ) -> Result<Message> {
        if self.take_failure(|f| &mut f.send_photo) {
            return Err(scripted_error("sendPhoto"));
        }
        Ok(self.record(chat_id, |message_id| SentAction::Photo {
            chat_id,
            message_id,
            url: photo_url.to_string(),
            caption: caption.to_string(),
            spoiler,
            reply_to,
        }))
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        if self.take_failure(|f| &mut f.delete_message) {
            return Err(scripted_error("deleteMessage"));
        }
        self.actions.lock().unwrap().push(SentAction::Delete {
            chat_id,
            message_id,
        });
        Ok(())
    }
}
