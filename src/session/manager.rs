/*!
 * Session manager for the campaign collection flow.
 *
 * This module handles:
 * - Interpreting each inbound message against the current session
 * - Creating, filling and clearing sessions
 * - Handing a complete session to the video renderer and reporting the outcome
 */

use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::errors::{TransportError, ValidationError};
use crate::job_client::VideoRenderer;
use crate::providers::RenderRequest;
use crate::script::build_script;
use crate::telegram::{BotCommand, ChatTransport};

use super::models::{CampaignParams, ChatId, FIELD_DELIMITER, Session};
use super::replies;
use super::store::SessionStore;

/// What an inbound text message means in the current session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// The run trigger; the session may or may not be complete
    Run,
    /// A parameter line for a session that has no parameters yet
    Parameters(Result<CampaignParams, ValidationError>),
    /// An asset link for an existing session
    Asset(String),
    /// Text for an existing session that is not a link
    NotAUrl,
    /// Text without a session
    NoSession,
}

/// Case-insensitive "starts with http" check
pub fn looks_like_url(text: &str) -> bool {
    text.get(..4).is_some_and(|prefix| prefix.eq_ignore_ascii_case("http"))
}

/// Classify trimmed message `text` for a conversation whose session is `session`.
///
/// Pure: performs no side effects and never mutates the session.
pub fn classify_message(text: &str, session: Option<&Session>, run_trigger: &str) -> Inbound {
    if text.to_lowercase() == run_trigger.to_lowercase() {
        return Inbound::Run;
    }

    match session {
        Some(session) if text.contains(FIELD_DELIMITER) && !session.has_parameters() => {
            Inbound::Parameters(CampaignParams::parse(text))
        }
        Some(_) if looks_like_url(text) => Inbound::Asset(text.to_string()),
        Some(_) => Inbound::NotAUrl,
        None => Inbound::NoSession,
    }
}

/// Removes the session when dropped, so a run never leaves a stale session behind
struct SessionCleanup<'a> {
    store: &'a dyn SessionStore,
    chat: ChatId,
}

impl Drop for SessionCleanup<'_> {
    fn drop(&mut self) {
        if self.store.delete(self.chat).is_some() {
            debug!("Session for chat {} cleared", self.chat);
        }
    }
}

/// Drives the conversation for every chat
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    renderer: Arc<dyn VideoRenderer>,
    transport: Arc<dyn ChatTransport>,
    run_trigger: String,
}

impl SessionManager {
    /// Create a session manager using `/go` as the run trigger
    pub fn new(
        store: Arc<dyn SessionStore>,
        renderer: Arc<dyn VideoRenderer>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            store,
            renderer,
            transport,
            run_trigger: "/go".to_string(),
        }
    }

    /// Use a different run trigger
    pub fn with_run_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.run_trigger = trigger.into();
        self
    }

    /// The underlying session store
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    async fn reply(&self, chat: ChatId, text: &str) -> Result<(), TransportError> {
        self.transport.send_message(chat, text).await.map(|_| ())
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Handle /start, /help and /reset
    pub async fn handle_command(&self, chat: ChatId, command: BotCommand) -> Result<(), TransportError> {
        match command {
            BotCommand::Start => {
                self.store.set(chat, Session::new());
                info!("Session started for chat {}", chat);
                self.reply(chat, replies::INTRO).await
            }
            BotCommand::Help => self.reply(chat, replies::INTRO).await,
            BotCommand::Reset => {
                if self.store.delete(chat).is_some() {
                    info!("Session reset for chat {}", chat);
                }
                self.reply(chat, replies::SESSION_CLEARED).await
            }
        }
    }

    // =========================================================================
    // Text messages
    // =========================================================================

    /// Handle a plain text message (anything that is not a command)
    pub async fn handle_text(&self, chat: ChatId, text: &str) -> Result<(), TransportError> {
        let text = text.trim();
        let session = self.store.get(chat);

        match classify_message(text, session.as_ref(), &self.run_trigger) {
            Inbound::Run => self.run(chat).await,
            Inbound::Parameters(Ok(params)) => {
                debug!(
                    "Chat {} parameters: duration={}s, aspect={}",
                    chat, params.duration_seconds, params.aspect_ratio
                );
                if self.store.update(chat, &mut |session| session.apply_params(params.clone())) {
                    self.reply(chat, replies::PARAMETERS_ACCEPTED).await
                } else {
                    self.reply(chat, replies::START_FIRST).await
                }
            }
            Inbound::Parameters(Err(ValidationError::TooFewFields(found))) => {
                debug!("Chat {} sent a parameter line with {} field(s)", chat, found);
                self.reply(chat, replies::TOO_FEW_FIELDS).await
            }
            Inbound::Parameters(Err(e)) => {
                debug!("Chat {} sent invalid parameters: {}", chat, e);
                self.reply(chat, replies::INVALID_VALUES).await
            }
            Inbound::Asset(url) => {
                if self.store.update(chat, &mut |session| session.add_asset(url.as_str())) {
                    debug!("Chat {} added asset {}", chat, url);
                    self.reply(chat, replies::ASSET_ADDED).await
                } else {
                    self.reply(chat, replies::START_FIRST).await
                }
            }
            Inbound::NotAUrl => self.reply(chat, replies::NOT_A_URL).await,
            Inbound::NoSession => self.reply(chat, replies::START_FIRST).await,
        }
    }

    // =========================================================================
    // Run
    // =========================================================================

    /// Submit the session's job and report the outcome.
    ///
    /// An incomplete (or missing) session is left untouched. Once a run starts
    /// the session is removed no matter how it ends.
    async fn run(&self, chat: ChatId) -> Result<(), TransportError> {
        let Some((campaign, assets)) = self
            .store
            .get(chat)
            .and_then(|session| session.campaign().map(|campaign| (campaign, session.assets)))
        else {
            return self.reply(chat, replies::MISSING_FIELDS).await;
        };

        self.store.update(chat, &mut |session| session.mark_running());
        let _cleanup = SessionCleanup {
            store: self.store.as_ref(),
            chat,
        };

        let script = build_script(
            &campaign.product,
            &campaign.audience,
            &campaign.tone,
            campaign.duration_seconds,
        );
        let request = RenderRequest::new(
            script,
            campaign.tone.as_str(),
            campaign.aspect_ratio,
            campaign.duration_seconds,
        )
        .with_assets(assets);

        info!(
            "Chat {} starting video job ({}s, {}, {} asset(s))",
            chat,
            campaign.duration_seconds,
            campaign.aspect_ratio,
            request.assets.len()
        );
        let progress = self.transport.send_message(chat, replies::JOB_STARTING).await?;

        match self.renderer.render(&request).await {
            Ok(url) => {
                info!("Chat {} video ready: {}", chat, url);
                let done = replies::job_done(&url);
                if let Err(e) = self.transport.edit_message(chat, progress, &done).await {
                    warn!("Could not update progress message for chat {}: {}", chat, e);
                    self.reply(chat, &done).await?;
                }
            }
            Err(e) => {
                error!("Video job error for chat {}: {}", chat, e);
                self.reply(chat, &replies::job_failed(&e)).await?;
            }
        }

        Ok(())
    }
}
