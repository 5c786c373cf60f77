// proxy module - same-origin BFF between the admin UI and the PR API

pub mod handlers;
pub mod middleware;
pub mod server;
pub mod upstream;

pub use server::{AppState, ProxyServer};
