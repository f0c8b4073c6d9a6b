use ::url::Url;

use crate::error::ChatApiError;

/// Default backend address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Normalize a backend base address.
///
/// Normalization rules:
/// 1) blank input falls back to [`DEFAULT_BASE_URL`]
/// 2) a missing scheme is taken as `http://`
/// 3) trailing slashes are removed
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        input.trim()
    };

    let with_scheme = if base.contains("://") {
        base.to_string()
    } else {
        format!("http://{base}")
    };

    with_scheme.trim_end_matches('/').to_string()
}

/// Joins a normalized base address with an endpoint path such as `/weather`.
pub fn endpoint_url(base: &str, path: &str) -> String {
    let base = normalize_base_url(base);
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

/// Builds the realtime endpoint for `identity`: `ws(s)://<host>/ws/<identity>`.
///
/// The identity is percent-encoded as a single path segment.
pub fn websocket_url(base: &str, identity: &str) -> Result<String, ChatApiError> {
    let normalized = normalize_base_url(base);
    let mut url = Url::parse(&normalized)
        .map_err(|error| ChatApiError::InvalidBaseUrl(format!("{normalized}: {error}")))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ChatApiError::InvalidBaseUrl(format!(
                "unsupported scheme '{other}' in {normalized}"
            )))
        }
    };
    url.set_scheme(scheme).map_err(|_| {
        ChatApiError::InvalidBaseUrl(format!("cannot switch {normalized} to {scheme}"))
    })?;

    url.path_segments_mut()
        .map_err(|_| ChatApiError::InvalidBaseUrl(format!("{normalized} cannot be a base")))?
        .pop_if_empty()
        .push("ws")
        .push(identity);

    Ok(url.to_string())
}
