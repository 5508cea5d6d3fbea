/*!
 * # promobot - ad video bot
 *
 * A Telegram bot that collects ad-campaign parameters in a short conversation,
 * submits a video generation job to a rendering API and reports the result.
 *
 * ## Features
 *
 * - Per-chat sessions collecting product, audience, tone, duration and aspect ratio
 * - Asset links (logos, photos) attached to the render job
 * - Job submission and status polling with bounded exponential-backoff retries
 * - Hard timeout on the wait for a finished video
 * - Configuration from a JSON file layered with environment variables
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: Update polling and per-chat dispatch
 * - `session`: Conversation state machine:
 *   - `session::models`: Session data and parameter-line parsing
 *   - `session::store`: Session storage
 *   - `session::manager`: Message handling and run orchestration
 * - `script`: Ad script construction
 * - `job_client`: Job submission and wait-for-completion
 * - `retry`: Retry policies and the async retry executor
 * - `providers`: Rendering service clients:
 *   - `providers::render_api`: HTTP rendering API client
 *   - `providers::mock`: Scripted provider for tests
 * - `telegram`: Chat transport and Telegram Bot API client
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod job_client;
pub mod providers;
pub mod retry;
pub mod script;
pub mod session;
pub mod telegram;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, JobError, ProviderError, TransportError, ValidationError};
pub use job_client::{JobClient, PollSchedule, VideoRenderer};
pub use retry::RetryPolicy;
pub use script::build_script;
pub use session::{ChatId, InMemorySessionStore, Session, SessionManager, SessionStore};
