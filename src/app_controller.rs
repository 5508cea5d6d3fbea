use anyhow::Result;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::app_config::Config;
use crate::errors::{AppError, TransportError};
use crate::job_client::JobClient;
use crate::providers::RenderProvider;
use crate::providers::render_api::RenderApi;
use crate::retry::RetryPolicy;
use crate::session::{ChatId, InMemorySessionStore, SessionManager};
use crate::telegram::models::Update;
use crate::telegram::{BotCommand, TelegramClient};

// @module: Application controller for the chat bot

/// A chat worker with nothing to do for this long shuts down
const WORKER_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Route one message to the session manager: slash commands first, then text
pub async fn route_message(manager: &SessionManager, chat: ChatId, text: &str) -> Result<(), TransportError> {
    match BotCommand::parse(text) {
        Some(command) => manager.handle_command(chat, command).await,
        None => manager.handle_text(chat, text).await,
    }
}

/// One worker task per active chat.
///
/// Messages of a chat are handled strictly in arrival order and each one to
/// completion; different chats are handled concurrently.
struct ChatWorkers {
    queues: Arc<Mutex<HashMap<ChatId, mpsc::UnboundedSender<String>>>>,
    manager: Arc<SessionManager>,
}

impl ChatWorkers {
    fn new(manager: Arc<SessionManager>) -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            manager,
        }
    }

    fn enqueue(&self, chat: ChatId, text: String) {
        let mut queues = self.queues.lock();

        let text = match queues.get(&chat) {
            Some(queue) => match queue.send(text) {
                Ok(()) => return,
                Err(mpsc::error::SendError(text)) => text,
            },
            None => text,
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        // The receiver is alive, so this cannot fail
        let _ = sender.send(text);
        queues.insert(chat, sender);

        debug!("Starting worker for chat {}", chat);
        tokio::spawn(Self::work(
            chat,
            receiver,
            Arc::clone(&self.manager),
            Arc::clone(&self.queues),
        ));
    }

    async fn work(
        chat: ChatId,
        mut receiver: mpsc::UnboundedReceiver<String>,
        manager: Arc<SessionManager>,
        queues: Arc<Mutex<HashMap<ChatId, mpsc::UnboundedSender<String>>>>,
    ) {
        loop {
            match tokio::time::timeout(WORKER_IDLE_TIMEOUT, receiver.recv()).await {
                Ok(Some(text)) => {
                    if let Err(e) = route_message(&manager, chat, &text).await {
                        error!("Failed to answer chat {}: {}", chat, e);
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    // Senders only enqueue while holding this lock
                    let mut queues = queues.lock();
                    if receiver.is_empty() {
                        queues.remove(&chat);
                        debug!("Worker for chat {} idle, stopping", chat);
                        break;
                    }
                }
            }
        }
    }

    fn active(&self) -> usize {
        self.queues.lock().len()
    }
}

/// Main application controller for the chat bot
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Bot API client, also the outbound transport of the manager
    telegram: Arc<TelegramClient>,
    // @field: Conversation logic
    manager: Arc<SessionManager>,
    // @field: Per-chat workers
    workers: ChatWorkers,
}

impl Controller {
    // @method: Create a new controller wired to the real Telegram and rendering APIs
    pub fn with_config(config: Config) -> Result<Self> {
        let telegram = Arc::new(TelegramClient::from_config(&config.telegram));

        let provider: Arc<dyn RenderProvider> = Arc::new(RenderApi::from_config(&config.render));
        let jobs = JobClient::new(provider)
            .with_submit_policy(config.render.submit_retry.clone())
            .with_status_policy(config.render.status_retry.clone())
            .with_schedule(config.polling.clone());

        let manager = SessionManager::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(jobs),
            telegram.clone(),
        )
        .with_run_trigger(config.telegram.run_trigger.clone());

        Ok(Self::from_parts(config, telegram, Arc::new(manager)))
    }

    /// Assemble a controller from prebuilt parts
    pub fn from_parts(config: Config, telegram: Arc<TelegramClient>, manager: Arc<SessionManager>) -> Self {
        Self {
            config,
            telegram,
            workers: ChatWorkers::new(Arc::clone(&manager)),
            manager,
        }
    }

    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Number of chats with a live worker
    pub fn active_chats(&self) -> usize {
        self.workers.active()
    }

    /// Queue a received update for its chat. Updates without text are ignored.
    pub fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            debug!("Ignoring update {} without a message", update.update_id);
            return;
        };
        let Some(text) = message.text else {
            debug!("Ignoring non-text message in chat {}", message.chat.id);
            return;
        };

        self.workers.enqueue(ChatId(message.chat.id), text);
    }

    /// Long-poll the Bot API until Ctrl-C
    pub async fn run(&self) -> Result<(), AppError> {
        self.run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Long-poll the Bot API until `shutdown` resolves.
    ///
    /// A bot token the API does not recognise is fatal; any other failure is
    /// logged and retried with backoff.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        match self
            .telegram
            .delete_webhook(self.config.telegram.drop_pending_updates)
            .await
        {
            Ok(()) => {}
            Err(e @ TransportError::ApiError { code: 401 | 404, .. }) => {
                error!("Telegram rejected the bot token: {}", e);
                return Err(AppError::Transport(e));
            }
            Err(e) => warn!("Could not reset webhook state: {}", e),
        }

        info!("Bot started, waiting for messages");

        let poll_backoff = RetryPolicy {
            max_attempts: u32::MAX,
            initial_delay_ms: 1_000,
            multiplier: 2.0,
            max_delay_ms: 30_000,
            retry_client_errors: true,
        };
        let mut offset: Option<i64> = None;
        let mut failures: u32 = 0;

        loop {
            let polled = tokio::select! {
                _ = &mut shutdown => break,
                polled = self.telegram.get_updates(offset, self.config.telegram.long_poll_timeout_secs) => polled,
            };

            match polled {
                Ok(updates) => {
                    failures = 0;
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        self.handle_update(update);
                    }
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let delay = poll_backoff.delay_for(failures);
                    error!("Polling for updates failed: {}. Retrying in {}s", e, delay.as_secs());
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!("Shutdown requested, stopping update polling");
        Ok(())
    }
}
