use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use crate::body::Body;
use crate::cache::Cache;
use crate::options::{assemble, with_accept_content_type, FetchOption};
use crate::transport::{ResponseBody, Transport, TransportRequest, TransportResponse};
use crate::{FetchError, Result};

/// Fetches `url` and returns the response body.
///
/// Options are applied in order over the default configuration. The response
/// is accepted when its status is in `200..400` (or
/// [`with_ignore_status`](crate::with_ignore_status) is set) and its content
/// type matches the one required via
/// [`with_accept_content_type`](crate::with_accept_content_type), if any.
/// With a cache configured, a hit short-circuits the exchange and a miss
/// writes the accepted body back before returning it.
///
/// ```no_run
/// use http_fetch::{fetch, with_random_user_agent};
///
/// # async fn example() -> http_fetch::Result<()> {
/// let body = fetch("https://example.com/feed.xml", [with_random_user_agent()]).await?;
/// let content = body.bytes().await?;
/// # let _ = content;
/// # Ok(())
/// # }
/// ```
pub async fn fetch(
    url: impl AsRef<str>,
    options: impl IntoIterator<Item = FetchOption>,
) -> Result<Body> {
    let mut options = assemble(options);

    // Cached content is served as-is; classification does not reapply.
    if let Some(binding) = &options.cache {
        if let Some(content) = binding.cache.get(&binding.key).await {
            #[cfg(feature = "tracing")]
            tracing::debug!("cache hit for key '{}'", binding.key);
            return Ok(Body::buffered(content));
        }
    }

    let mut headers = std::mem::take(&mut options.headers);
    if let Some(content_type) = &options.body_content_type {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            headers.insert(header::CONTENT_TYPE, value);
        }
    }
    let request = TransportRequest {
        method: options.method.clone(),
        url: url.as_ref().to_owned(),
        headers,
        body: options.body.take(),
        timeout: options.timeout,
    };
    let TransportResponse {
        status,
        headers,
        body,
    } = options.transport().exchange(request).await?;

    if !(200..400).contains(&status.as_u16()) {
        let decoder = options
            .error_decoder
            .as_ref()
            .filter(|_| matches_content_type(&headers, "application/json"));
        if let Some(decoder) = decoder {
            // A failed read degrades to empty input so the decoder's
            // bad-status fallback applies.
            let content = body.read_to_end().await.unwrap_or_default();
            return Err(decoder(&content, status));
        }
        if !options.ignore_status {
            drop(body);
            return Err(FetchError::Status(status));
        }
    }

    if let Some(expected) = &options.accept_content_type {
        if !matches_content_type(&headers, expected) {
            let observed = headers
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_owned();
            drop(body);
            return Err(FetchError::ContentType(observed));
        }
    }

    if let Some(binding) = &options.cache {
        let content = body.read_to_end().await?;
        if let Err(_err) = binding
            .cache
            .set(&binding.key, content.clone(), binding.ttl)
            .await
        {
            #[cfg(feature = "tracing")]
            tracing::debug!("cache write for key '{}' failed: {_err}", binding.key);
        }
        return Ok(Body::buffered(content));
    }

    Ok(Body::remote(body))
}

/// Fetches `url` and reads the body to completion.
pub async fn fetch_bytes(
    url: impl AsRef<str>,
    options: impl IntoIterator<Item = FetchOption>,
) -> Result<Bytes> {
    let body = fetch(url, options).await?;
    body.bytes().await
}

/// Fetches `url` and decodes the body as JSON into `T`.
///
/// The response content type is required to be `application/json`, as if
/// [`with_accept_content_type`](crate::with_accept_content_type) were passed
/// last.
///
/// ```no_run
/// use http_fetch::fetch_json;
///
/// #[derive(serde::Deserialize)]
/// struct Widget {
///     id: u64,
/// }
///
/// # async fn example() -> http_fetch::Result<()> {
/// let widget: Widget = fetch_json("https://api.example.com/widgets/7", []).await?;
/// # let _ = widget.id;
/// # Ok(())
/// # }
/// ```
pub async fn fetch_json<T>(
    url: impl AsRef<str>,
    options: impl IntoIterator<Item = FetchOption>,
) -> Result<T>
where
    T: DeserializeOwned,
{
    let body = fetch(
        url,
        options
            .into_iter()
            .chain([with_accept_content_type("application/json")]),
    )
    .await?;
    let content = body.bytes().await?;
    serde_json::from_slice(&content)
        .map_err(|err| FetchError::Decode(format!("invalid JSON body: {err}")))
}

fn matches_content_type(headers: &HeaderMap, expected: &str) -> bool {
    let observed = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    media_type(observed).eq_ignore_ascii_case(media_type(expected))
}

/// Strips parameters such as `charset` from a content-type value.
fn media_type(value: &str) -> &str {
    value.split(';').next().unwrap_or_default().trim()
}
