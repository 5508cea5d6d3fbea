/*!
 * Conversation session management.
 *
 * This module provides:
 * - Session models and parameter-line parsing
 * - A pluggable, process-lifetime session store
 * - The session manager that drives each conversation
 */

pub mod manager;
pub mod models;
pub mod replies;
pub mod store;

// Re-export main types
pub use manager::{Inbound, SessionManager, classify_message};
pub use models::{AspectRatio, CampaignParams, ChatId, Session, SessionState};
pub use store::{InMemorySessionStore, SessionStore};
