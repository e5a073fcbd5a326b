//! Cross-origin policy from configuration.

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, Method};
use medphase_core::config::CorsConfig;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Header carrying the applied phase on successful responses
pub const PHASE_HEADER: &str = "x-processing-phase";

/// Build the CORS layer.
///
/// Origins may be exact (`https://viewer.example.org`), the wildcard `*`, or
/// contain a single `*` standing for any run of characters
/// (`https://*.github.io`, `http://localhost:*`). Response headers the
/// browser client needs are exposed.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let patterns = config.allowed_origins.clone();
        AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
            origin
                .to_str()
                .map(|o| patterns.iter().any(|p| origin_matches(p, o)))
                .unwrap_or(false)
        })
    };

    // Credentials rule out wildcard header lists.
    let headers = if config.allow_credentials {
        AllowHeaders::mirror_request()
    } else {
        AllowHeaders::any()
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(headers)
        .allow_credentials(config.allow_credentials)
        .expose_headers([
            CONTENT_TYPE,
            CONTENT_DISPOSITION,
            HeaderName::from_static(PHASE_HEADER),
        ])
}

/// Match an origin against an exact value or a single-`*` pattern.
fn origin_matches(pattern: &str, origin: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == origin,
        Some((prefix, suffix)) => {
            origin.len() >= prefix.len() + suffix.len()
                && origin.starts_with(prefix)
                && origin.ends_with(suffix)
        }
    }
}
