// Upstream module - the real PR API behind the proxy

pub mod client;

pub use client::{UpstreamAuth, UpstreamClient, UpstreamError, UpstreamResponse, API_KEY_HEADER};
