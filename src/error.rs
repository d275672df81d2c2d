use reqwest::StatusCode;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success HTTP status with no decodable error payload.
    #[error("bad status: {0}")]
    Status(StatusCode),
    /// Structured error payload decoded from a failure response body.
    #[error("{0}")]
    Api(Box<dyn std::error::Error + Send + Sync>),
    /// Response content type differs from the required one.
    ///
    /// Carries the raw `Content-Type` header value that was observed.
    #[error("bad content-type: {0}")]
    ContentType(String),
    /// Cache backend failure. The fetch pipeline itself never surfaces this;
    /// it exists for [`Cache`](crate::Cache) implementations to report through.
    #[error("cache error: {0}")]
    Cache(String),
    /// Body or JSON decoding error.
    #[error("decode error: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use crate::FetchError;

    #[test]
    fn status_display_includes_code_and_phrase() {
        let err = FetchError::Status(StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "bad status: 404 Not Found");
    }

    #[test]
    fn content_type_display_includes_observed_value() {
        let err = FetchError::ContentType("text/plain; charset=utf-8".to_owned());
        assert_eq!(err.to_string(), "bad content-type: text/plain; charset=utf-8");
    }
}
