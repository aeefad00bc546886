//! HTTP API.
//!
//! All routes sit at the root, speak JSON and allow any origin. Handlers
//! share one `ApiContext` holding the store and configuration.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ServerError};
pub use types::ApiContext;
