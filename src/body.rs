use bytes::Bytes;

use crate::transport::ResponseBody;
use crate::{FetchError, Result};

/// Response body returned by [`fetch`](crate::fetch).
///
/// Holds either content already buffered in memory (cache hits and cache
/// write-through) or the still-unconsumed transport body. Dropping it without
/// reading releases the underlying connection.
pub struct Body(BodyInner);

enum BodyInner {
    Buffered(Bytes),
    Remote(Box<dyn ResponseBody>),
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            BodyInner::Buffered(content) => {
                f.debug_tuple("Body::Buffered").field(content).finish()
            }
            BodyInner::Remote(_) => f.debug_tuple("Body::Remote").finish(),
        }
    }
}

impl Body {
    pub(crate) fn buffered(content: impl Into<Bytes>) -> Self {
        Self(BodyInner::Buffered(content.into()))
    }

    pub(crate) fn remote(body: Box<dyn ResponseBody>) -> Self {
        Self(BodyInner::Remote(body))
    }

    /// Reads the body to completion.
    pub async fn bytes(self) -> Result<Bytes> {
        match self.0 {
            BodyInner::Buffered(content) => Ok(content),
            BodyInner::Remote(body) => body.read_to_end().await,
        }
    }

    /// Reads the body to completion as UTF-8 text.
    pub async fn text(self) -> Result<String> {
        let content = self.bytes().await?;
        String::from_utf8(content.to_vec())
            .map_err(|err| FetchError::Decode(format!("invalid UTF-8 body: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::{Body, FetchError};

    #[tokio::test]
    async fn buffered_content_reads_back() {
        let body = Body::buffered(Bytes::from_static(b"content"));
        let content = body.bytes().await.expect("must read");
        assert_eq!(content, Bytes::from_static(b"content"));
    }

    #[tokio::test]
    async fn text_rejects_invalid_utf8() {
        let body = Body::buffered(Bytes::from_static(&[0xff, 0xfe]));
        let err = body.text().await.expect_err("must fail");
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
