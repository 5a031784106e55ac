//! DocQuery Gateway HTTP Server
//!
//! Serves the single-page UI and the session API: document upload, page
//! images, queries, transcript and export.

pub mod attachments;
pub mod control_ui;
pub mod error;
pub mod health_api;
pub mod query_api;
pub mod server;
pub mod session_registry;

pub use error::ApiError;
pub use health_api::SetupStatus;
pub use server::{build_router, start_server, GatewayState};
pub use session_registry::SessionRegistry;
