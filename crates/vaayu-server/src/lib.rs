//! Vaayu backend proxy.
//!
//! A thin HTTP surface in front of the AI prediction/decision service, the
//! feedback document store, and the push provider.

pub mod ai;
pub mod api;
pub mod config;
pub mod docs;
pub mod push;

pub use ai::{AiClient, AlertDecision, UpstreamError};
pub use api::{build_router, AppState};
pub use config::ServerConfig;
pub use docs::DocumentStore;
pub use push::{FcmSender, PushError};
