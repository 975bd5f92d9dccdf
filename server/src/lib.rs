pub mod error;
pub mod handlers;
pub mod requests;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, Server, ServerConfig};
