//! Web host: serves sessions whose inputs replay from bookmarked URLs.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::WebError;
pub use server::{run_server, ServerConfig};
pub use state::{Session, SessionHandle, WebAppState};
