//! Outward response stream
//!
//! Every request yields one [`ResponseStream`]. At most one `Err` item is ever
//! produced and it is always the last one. Dropping the stream, or cancelling it,
//! releases any pending wait and stops further emissions.

use crate::error::FetchError;
use crate::interceptor::writer::CacheWriter;
use crate::request::{Request, Response};
use crate::transport::Transport;
use crate::types::CacheKeySet;
use futures::future;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Lazy sequence of responses for one request
pub struct ResponseStream {
    inner: BoxStream<'static, Result<Response, FetchError>>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl ResponseStream {
    pub(crate) fn new(
        cancel: CancellationToken,
        inner: impl Stream<Item = Result<Response, FetchError>> + Send + 'static,
    ) -> Self {
        let guard = cancel.clone().drop_guard();
        Self {
            inner: inner.boxed(),
            cancel,
            _guard: guard,
        }
    }

    /// Stop the stream; later polls return `None`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token cancelled when the stream is cancelled or dropped
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the first item, dropping the rest of the stream
    pub async fn first(mut self) -> Option<Result<Response, FetchError>> {
        self.next().await
    }
}

impl Stream for ResponseStream {
    type Item = Result<Response, FetchError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        self.inner.poll_next_unpin(cx)
    }
}

/// Subscription pass-through: write each event as a side effect and forward it
pub(crate) fn subscription(
    request: Request,
    transport: Arc<dyn Transport>,
    writer: CacheWriter,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<Response, FetchError>> + Send + 'static {
    transport
        .proceed(request.clone())
        .take_until(cancel.cancelled_owned())
        .then(move |event| {
            let request = request.clone();
            let writer = writer.clone();
            async move {
                let response = event.map_err(FetchError::from)?.tagged(false);
                writer
                    .maybe_write_to_cache(&request, &response, CacheKeySet::new())
                    .await;
                Ok::<Response, FetchError>(response)
            }
        })
        .scan(false, |failed, item: Result<Response, FetchError>| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        })
}
