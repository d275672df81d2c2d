//! `http-fetch` is a configurable helper for one-shot HTTP retrievals.
//!
//! A fetch is described by a stack of composable options; the pipeline
//! applies caching, content-type negotiation, and status-aware error
//! decoding, and returns the response body:
//! - [`fetch`] returns the body as a lazily readable [`Body`]
//! - [`fetch_bytes`] returns the body read to completion
//! - [`fetch_json`] decodes the body into a caller-chosen type

mod body;
mod cache;
mod client;
mod error;
mod options;
mod transport;
pub mod user_agent;

pub use body::Body;
pub use cache::{Cache, MemoryCache};
pub use client::{fetch, fetch_bytes, fetch_json};
pub use error::FetchError;
pub use options::{
    with_accept_content_type, with_appended_header, with_bearer_auth, with_body, with_cache,
    with_client, with_error_type, with_header, with_ignore_status, with_method,
    with_random_user_agent, with_timeout, with_transport, FetchOption,
};
pub use transport::{ReqwestTransport, ResponseBody, Transport, TransportRequest, TransportResponse};

pub use reqwest::{Method, StatusCode};

pub type Result<T> = std::result::Result<T, FetchError>;
