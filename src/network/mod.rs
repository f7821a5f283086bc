//! HTTP networking module
//!
//! Provides the shared HTTP client used by the search, completion and bot connector clients.

mod client;
mod request;

pub use client::HttpClient;
pub use request::{HttpRequest, HttpResponse, RequestBody};
