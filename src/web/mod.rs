//! Web API module.
//!
//! HTTP boundary over the file service: multipart uploads and metadata
//! queries.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
