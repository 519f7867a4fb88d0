use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use http_body::{Body as HttpBody, Frame, SizeHint};
use http_body_util::{combinators::BoxBody, BodyExt};

/// The body type of every `Response` in this crate.
///
/// Served files stream through it; applications behind the static layer
/// build their bodies with the `From` conversions.
pub struct Body(BoxBody<Bytes, crate::Error>);

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("size_hint", &self.0.size_hint())
            .finish()
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

impl HttpBody for Body {
    type Data = Bytes;
    type Error = crate::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.0).poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.0.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.0.size_hint()
    }
}

impl Body {
    /// A body with no data, as used for `HEAD` replies.
    pub fn empty() -> Self {
        Body(
            http_body_util::Empty::<Bytes>::new()
                .map_err(crate::Error::new)
                .boxed(),
        )
    }

    pub(crate) fn wrap_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + Sync + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
    {
        let body = http_body_util::StreamBody::new(
            stream.map(|item| item.map(Frame::data).map_err(crate::Error::new)),
        );
        Body(body.boxed())
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body(
            http_body_util::Full::new(b)
                .map_err(crate::Error::new)
                .boxed(),
        )
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Bytes::from(s).into()
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Bytes::from(s).into()
    }
}
