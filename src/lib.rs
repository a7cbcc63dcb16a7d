//! Usage gateway — authenticated caching reverse proxy for a billing/usage API.
//!
//! Callers log in once for a bearer token, then issue read queries that are
//! forwarded upstream with the configured credential; successful JSON bodies
//! are memoized in an in-process TTL cache keyed by a digest of the
//! normalized query.

use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod proxy;

/// Shared application state passed to every handler.
pub struct AppState {
    pub users: Arc<dyn auth::store::UserStore>,
    pub tokens: auth::token::TokenService,
    pub cache: cache::ResponseCache,
    pub upstream: proxy::upstream::UpstreamClient,
    pub config: config::Config,
}
