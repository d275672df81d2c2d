use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::cache::Cache;
use crate::transport::{default_transport, ReqwestTransport, Transport};
use crate::{user_agent, FetchError};

pub(crate) type ErrorDecoder = Box<dyn Fn(&[u8], StatusCode) -> FetchError + Send + Sync>;

pub(crate) struct CacheBinding {
    pub(crate) cache: Arc<dyn Cache>,
    pub(crate) key: String,
    pub(crate) ttl: Duration,
}

/// Merged configuration for one fetch call.
///
/// Built fresh per call by folding [`FetchOption`] values over the defaults,
/// then discarded when the call returns.
pub(crate) struct FetchOptions {
    pub(crate) transport: Option<Arc<dyn Transport>>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) cache: Option<CacheBinding>,
    pub(crate) error_decoder: Option<ErrorDecoder>,
    pub(crate) method: Method,
    pub(crate) body: Option<Bytes>,
    pub(crate) body_content_type: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) accept_content_type: Option<String>,
    pub(crate) ignore_status: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            transport: None,
            timeout: None,
            cache: None,
            error_decoder: None,
            method: Method::GET,
            body: None,
            body_content_type: None,
            headers: HeaderMap::new(),
            accept_content_type: None,
            ignore_status: false,
        }
    }
}

impl FetchOptions {
    /// The configured transport, or the shared default when none was set.
    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone().unwrap_or_else(default_transport)
    }
}

/// Single deferred configuration change applied during option assembly.
///
/// Build values with the `with_*` functions and pass them to
/// [`fetch`](crate::fetch) and friends. Options are applied in order; later
/// ones win over earlier ones writing the same field.
pub struct FetchOption(Box<dyn FnOnce(&mut FetchOptions) + Send>);

impl FetchOption {
    fn new(apply: impl FnOnce(&mut FetchOptions) + Send + 'static) -> Self {
        Self(Box::new(apply))
    }
}

/// Folds `options` over the default configuration.
pub(crate) fn assemble(options: impl IntoIterator<Item = FetchOption>) -> FetchOptions {
    let mut assembled = FetchOptions::default();
    for option in options {
        (option.0)(&mut assembled);
    }
    assembled
}

/// Caps the time budget for the network exchange.
///
/// Body reads performed after the exchange (cache write-through, error body
/// decoding) are not covered by the budget.
pub fn with_timeout(timeout: Duration) -> FetchOption {
    FetchOption::new(move |options| options.timeout = Some(timeout))
}

/// Substitutes the transport used for the exchange.
pub fn with_transport(transport: Arc<dyn Transport>) -> FetchOption {
    FetchOption::new(move |options| options.transport = Some(transport))
}

/// Performs the exchange with `client` instead of the shared default.
pub fn with_client(client: reqwest::Client) -> FetchOption {
    with_transport(Arc::new(ReqwestTransport::from(client)))
}

/// Consults `cache` under `key` before the exchange and writes the body back
/// under the same key and `ttl` on success.
///
/// A hit is returned as-is: no status or content-type classification is
/// reapplied to cached content. A zero `ttl` caches without expiry.
pub fn with_cache(cache: Arc<dyn Cache>, key: impl Into<String>, ttl: Duration) -> FetchOption {
    let key = key.into();
    FetchOption::new(move |options| options.cache = Some(CacheBinding { cache, key, ttl }))
}

/// Decodes JSON failure bodies into `T` and returns the decoded value as the
/// call's error, wrapped in [`FetchError::Api`].
///
/// Applies when the status is non-success and the response content type is
/// `application/json`. When the body does not decode into `T`, the call
/// fails with [`FetchError::Status`] instead of a decode error.
pub fn with_error_type<T>() -> FetchOption
where
    T: DeserializeOwned + std::error::Error + Send + Sync + 'static,
{
    FetchOption::new(|options| {
        options.error_decoder = Some(Box::new(|content: &[u8], status: StatusCode| {
            match serde_json::from_slice::<T>(content) {
                Ok(decoded) => FetchError::Api(Box::new(decoded)),
                Err(_) => FetchError::Status(status),
            }
        }));
    })
}

/// Sets the request method. The default is GET.
pub fn with_method(method: Method) -> FetchOption {
    FetchOption::new(move |options| options.method = method)
}

/// Attaches a request body and its content type.
///
/// The content type given here overrides any `Content-Type` header configured
/// through [`with_header`].
pub fn with_body(content: impl Into<Bytes>, content_type: impl Into<String>) -> FetchOption {
    let content = content.into();
    let content_type = content_type.into();
    FetchOption::new(move |options| {
        options.body = Some(content);
        options.body_content_type = Some(content_type);
    })
}

/// Sets a header, replacing all previously configured values for `name`.
///
/// Invalid header names or values are skipped.
pub fn with_header(name: impl Into<String>, value: impl Into<String>) -> FetchOption {
    let name = name.into();
    let value = value.into();
    FetchOption::new(move |options| {
        if let Some((name, value)) = parse_header(&name, &value) {
            options.headers.insert(name, value);
        }
    })
}

/// Appends a header value for `name` without clearing previously configured
/// ones.
///
/// Invalid header names or values are skipped.
pub fn with_appended_header(name: impl Into<String>, value: impl Into<String>) -> FetchOption {
    let name = name.into();
    let value = value.into();
    FetchOption::new(move |options| {
        if let Some((name, value)) = parse_header(&name, &value) {
            options.headers.append(name, value);
        }
    })
}

/// Sets the `User-Agent` header to a random entry from the built-in pool.
///
/// The pool is consulted once, when the option is built.
pub fn with_random_user_agent() -> FetchOption {
    with_header(USER_AGENT.as_str(), user_agent::random())
}

/// Sets the `Authorization` header from a bearer token.
///
/// The `Bearer ` prefix is added when missing (case-insensitive check).
pub fn with_bearer_auth(token: impl AsRef<str>) -> FetchOption {
    with_header(
        AUTHORIZATION.as_str(),
        normalize_bearer_authorization(token.as_ref()),
    )
}

/// Rejects responses whose content type differs from `content_type`.
///
/// Parameters such as `charset` are ignored when comparing.
pub fn with_accept_content_type(content_type: impl Into<String>) -> FetchOption {
    let content_type = content_type.into();
    FetchOption::new(move |options| options.accept_content_type = Some(content_type))
}

/// Returns the body for non-success statuses instead of failing.
///
/// Has no effect when an error decoder installed by [`with_error_type`]
/// matches the response.
pub fn with_ignore_status() -> FetchOption {
    FetchOption::new(|options| options.ignore_status = true)
}

fn parse_header(name: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
    let value = HeaderValue::from_str(value).ok()?;
    Some((name, value))
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}
