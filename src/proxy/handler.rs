//! The parameterized proxy dispatcher.
//!
//! Every protected query route runs the same pipeline, driven by its
//! [`QueryEndpoint`] descriptor: verify the bearer token, validate required
//! parameters, normalize, derive the cache key, and either serve the cached
//! document or fetch, classify and store the upstream response.

use std::sync::Arc;

use axum::extract::{RawQuery, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use crate::auth::token::bearer_token;
use crate::errors::AppError;
use crate::proxy::endpoints::{self, QueryEndpoint};
use crate::proxy::key;
use crate::AppState;

/// One route per descriptor, all backed by [`dispatch`].
pub fn query_routes() -> Router<Arc<AppState>> {
    let mut router = Router::new();
    for endpoint in endpoints::ENDPOINTS {
        router = router.route(
            &format!("/{}", endpoint.name),
            get(
                move |state: State<Arc<AppState>>, headers: HeaderMap, query: RawQuery| {
                    dispatch(endpoint, state, headers, query)
                },
            ),
        );
    }
    router
}

#[tracing::instrument(skip_all, fields(endpoint = endpoint.name))]
async fn dispatch(
    endpoint: &'static QueryEndpoint,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, AppError> {
    // Auth comes first; nothing else runs for an unauthenticated caller.
    let token = bearer_token(&headers)?;
    state.tokens.verify(token, state.users.as_ref()).await?;

    let raw: Vec<(String, String)> = url::form_urlencoded::parse(
        query.as_deref().unwrap_or_default().as_bytes(),
    )
    .into_owned()
    .collect();

    for required in endpoint.required.iter().copied() {
        let present = raw.iter().any(|(k, v)| k == required && !v.is_empty());
        if !present {
            return Err(AppError::MissingParameter(required));
        }
    }

    let params = key::normalize(endpoint, &raw)?;
    let cache_key = key::derive(endpoint.name, &params);

    if let Some(cached) = state.cache.get(&cache_key) {
        tracing::info!(key = %cache_key, "cache hit");
        return Ok(Json(cached));
    }

    let response = state
        .upstream
        .fetch(
            endpoint.upstream_path,
            &key::query_pairs(&params),
            endpoint.timeout,
        )
        .await?;

    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| AppError::UpstreamUnreachable(e.to_string()))?;

    if !status.is_success() {
        tracing::error!(
            key = %cache_key,
            status = status.as_u16(),
            "upstream rejected the query"
        );
        return Err(AppError::UpstreamRejected {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    let document: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(key = %cache_key, "upstream body is not JSON: {}", e);
        AppError::UpstreamMalformed
    })?;

    state.cache.set(&cache_key, document.clone());
    tracing::info!(key = %cache_key, "cached upstream response");

    Ok(Json(document))
}
