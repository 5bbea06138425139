//! Application orchestration: long polling, command dispatch and the `/img` flow.

use crate::ai::{ImageInferenceService, RunwareImageClient};
use crate::commands::Command;
use crate::generation::{self, OutboundMessage};
use crate::messages;
use crate::models::{Config, GenerationProfile};
use crate::telegram::{Message, MessengerService, TelegramClient, Update};
use crate::{Error, Result};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, error, info, warn};

/// Long-polling behaviour.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub timeout_secs: u64,
    pub drop_pending_updates: bool,
    /// First delay after a failed poll; doubles on each consecutive failure.
    pub retry_delay: Duration,
    /// Upper bound for the delay between failed polls.
    pub max_retry_delay: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            drop_pending_updates: true,
            retry_delay: Duration::from_millis(500),
            max_retry_delay: Duration::from_secs(5),
        }
    }
}

/// Owns the transport and inference clients for the lifetime of the process.
pub struct App {
    telegram: Box<dyn MessengerService>,
    inference: Box<dyn ImageInferenceService>,
    profile: GenerationProfile,
    poll: PollSettings,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub telegram: Box<dyn MessengerService>,
    pub inference: Box<dyn ImageInferenceService>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(
        services: AppServices,
        profile: GenerationProfile,
        poll: PollSettings,
    ) -> Self {
        Self {
            telegram: services.telegram,
            inference: services.inference,
            profile,
            poll,
        }
    }

    /// Construct the production app from configuration.
    pub fn new(config: &Config, drop_pending_updates: bool) -> Self {
        // Reuse one HTTP connection pool across both clients.
        let http_client = reqwest::Client::new();

        let telegram = TelegramClient::new_with_client(
            config.telegram_bot_token.clone(),
            http_client.clone(),
        )
        .with_api_url(config.telegram_api_url.clone());

        let inference =
            RunwareImageClient::new_with_client(config.runware_api_key.clone(), http_client)
                .with_base_url(config.runware_base_url.clone());

        let profile = config.generation_profile();
        info!("Image provider: Runware (model: {})", profile.model);

        Self::with_services(
            AppServices {
                telegram: Box::new(telegram),
                inference: Box::new(inference),
            },
            profile,
            PollSettings {
                timeout_secs: config.poll_timeout_secs,
                drop_pending_updates,
                ..PollSettings::default()
            },
        )
    }

    /// Poll for updates until `shutdown` resolves, handling each update on its own task.
    ///
    /// In-flight handlers are awaited before returning. Only the startup calls
    /// (`getMe`, `deleteWebhook`) can fail the run; polling failures are logged
    /// and retried with a capped exponential delay until shutdown.
    pub async fn run<F>(self: Arc<Self>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let me = self.telegram.get_me().await?;
        info!(
            "Authorized as {} (@{}, id {})",
            me.first_name,
            me.username.as_deref().unwrap_or("-"),
            me.id
        );

        self.telegram
            .delete_webhook(self.poll.drop_pending_updates)
            .await?;
        if self.poll.drop_pending_updates {
            info!("Cleared webhook and dropped pending updates");
        }

        let bot_username: Option<Arc<str>> = me.username.map(Arc::from);
        let mut handlers = JoinSet::new();
        let mut offset: Option<i64> = None;
        let mut backoff: Option<ExponentialBackoff> = None;
        let mut failed_polls: u32 = 0;

        tokio::pin!(shutdown);
        info!("Polling for updates");

        loop {
            let updates = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping polling");
                    break;
                }
                updates = self.telegram.get_updates(offset, self.poll.timeout_secs) => updates,
            };

            let updates = match updates {
                Ok(updates) => {
                    if failed_polls > 0 {
                        info!("Polling recovered after {} failed attempt(s)", failed_polls);
                        failed_polls = 0;
                        backoff = None;
                    }
                    updates
                }
                Err(e) => {
                    failed_polls += 1;
                    let delay = backoff
                        .get_or_insert_with(|| self.poll_backoff())
                        .next()
                        .unwrap_or(self.poll.max_retry_delay);
                    warn!(
                        "Polling for updates failed ({} in a row): {}. Retrying in {:?}",
                        failed_polls, e, delay
                    );
                    tokio::select! {
                        _ = &mut shutdown => {
                            info!("Shutdown requested, stopping polling");
                            break;
                        }
                        _ = tokio::time::sleep(delay) => continue,
                    }
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);
                let app = Arc::clone(&self);
                let username = bot_username.clone();
                handlers.spawn(async move {
                    app.handle_update(update, username.as_deref()).await;
                });
            }

            while let Some(joined) = handlers.try_join_next() {
                if let Err(e) = joined {
                    error!("Update handler panicked: {}", e);
                }
            }
        }

        if !handlers.is_empty() {
            info!("Waiting for {} in-flight handler(s)", handlers.len());
        }
        while let Some(joined) = handlers.join_next().await {
            if let Err(e) = joined {
                error!("Update handler panicked: {}", e);
            }
        }

        Ok(())
    }

    fn poll_backoff(&self) -> ExponentialBackoff {
        // Delays of 2^n * factor ms: retry_delay, then doubling up to the cap.
        let factor = (self.poll.retry_delay.as_millis() as u64 / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(self.poll.max_retry_delay)
    }

    /// Route one update to its command handler. Non-command messages are ignored.
    pub async fn handle_update(&self, update: Update, bot_username: Option<&str>) {
        let Some(message) = update.message else {
            debug!("Skipping update {} without a message", update.update_id);
            return;
        };
        let Some(command) = message
            .text
            .as_deref()
            .and_then(|text| Command::parse(text, bot_username))
        else {
            return;
        };

        let age = Utc::now().signed_duration_since(message.date);
        info!(
            "[chat {}] /{} from user {} (message {}, {}s old)",
            message.chat.id,
            command.name(),
            message.from.as_ref().map_or(0, |user| user.id),
            message.message_id,
            age.num_seconds()
        );

        match command {
            Command::Start | Command::Help => self.handle_start(&message).await,
            Command::Img { prompt } => self.handle_img(&message, &prompt).await,
        }
    }

    async fn handle_start(&self, message: &Message) {
        let chat_id = message.chat.id;
        if let Err(e) = self.telegram.send_message(chat_id, messages::START, None).await {
            warn!("[chat {}] Failed to send help message: {}", chat_id, e);
            let text = messages::escape_html(&e.diagnostic());
            if let Err(e) = self.telegram.send_message(chat_id, &text, None).await {
                error!("[chat {}] Failed to report help failure: {}", chat_id, e);
            }
        }
    }

    async fn handle_img(&self, message: &Message, prompt: &str) {
        let chat_id = message.chat.id;

        if prompt.trim().is_empty() {
            info!("[chat {}] Empty prompt, replying with usage", chat_id);
            if let Err(e) = self
                .telegram
                .send_message(chat_id, messages::START, Some(message.message_id))
                .await
            {
                error!("[chat {}] Failed to send usage message: {}", chat_id, e);
            }
            return;
        }

        let placeholder = match self
            .telegram
            .send_message(chat_id, messages::PROCESSING, Some(message.message_id))
            .await
        {
            Ok(sent) => Some(sent.message_id),
            Err(e) => {
                warn!("[chat {}] Failed to send placeholder: {}", chat_id, e);
                None
            }
        };

        let outcome = generation::generate(self.inference.as_ref(), prompt, &self.profile).await;

        // The placeholder goes away on every path, before the terminal reply.
        if let Some(placeholder_id) = placeholder {
            if let Err(e) = self.telegram.delete_message(chat_id, placeholder_id).await {
                warn!("[chat {}] Failed to delete placeholder: {}", chat_id, e);
            }
        }

        let reply = generation::compose(&outcome);
        match &outcome {
            generation::Outcome::Success { cost, .. } => {
                info!("[chat {}] Image generated (cost: {:?})", chat_id, cost)
            }
            generation::Outcome::NoImage => warn!("[chat {}] Provider returned no image", chat_id),
            generation::Outcome::Failure { .. } => {
                warn!("[chat {}] Generation failed, reporting error", chat_id)
            }
        }

        if let Err(e) = self.deliver(chat_id, &reply, message.message_id).await {
            error!("[chat {}] Failed to deliver reply: {}", chat_id, e);
            // A rejected photo still owes the user a terminal reply.
            if matches!(reply, OutboundMessage::Photo { .. }) {
                self.deliver_failure(chat_id, &e, message.message_id).await;
            }
        }
    }

    async fn deliver(&self, chat_id: i64, reply: &OutboundMessage, reply_to: i64) -> Result<()> {
        match reply {
            OutboundMessage::Text { text } => {
                self.telegram
                    .send_message(chat_id, text, Some(reply_to))
                    .await?;
            }
            OutboundMessage::Photo {
                url,
                caption,
                spoiler,
            } => {
                self.telegram
                    .send_photo(chat_id, url, caption, *spoiler, Some(reply_to))
                    .await?;
            }
        }
        Ok(())
    }

    async fn deliver_failure(&self, chat_id: i64, err: &Error, reply_to: i64) {
        let reply = generation::compose(&generation::Outcome::Failure {
            diagnostic: err.diagnostic(),
        });
        if let Err(e) = self.deliver(chat_id, &reply, reply_to).await {
            error!("[chat {}] Failed to report delivery failure: {}", chat_id, e);
        }
    }
}
