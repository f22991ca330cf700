//! Message flows of statement execution.
//!
//! Both flows submit a single exchange, then split its messages into one window per executed
//! statement, each becoming a [`PgResult`].
use futures_core::Stream;
use std::{
    future::poll_fn,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, ready},
};

use crate::{
    Result,
    client::Responses,
    codec::Codecs,
    postgres::BackendMessage,
    result::PgResult,
};

pub(crate) mod extended;
pub(crate) mod simple;
mod window;

pub use window::Window;

/// Results of an execution, one per executed statement, in execution order.
///
/// An error from the connection ends the stream. Dropping it discards the remaining results.
#[derive(Debug)]
#[must_use = "streams do nothing unless polled"]
pub struct Results {
    windows: Window<Responses>,
    codecs: Arc<Codecs>,
}

impl Results {
    pub(crate) fn new(
        responses: Responses,
        boundary: fn(&BackendMessage) -> bool,
        codecs: Arc<Codecs>,
    ) -> Self {
        Self { windows: Window::new(responses, boundary), codecs }
    }

    /// Returns the next result.
    pub async fn next(&mut self) -> Option<Result<PgResult>> {
        poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    /// Collect every result.
    ///
    /// The exchange is drained before a connection error is returned.
    pub async fn collect(mut self) -> Result<Vec<PgResult>> {
        let mut results = vec![];
        let mut error = None;
        while let Some(result) = self.next().await {
            match result {
                Ok(result) => results.push(result),
                Err(err) if error.is_none() => error = Some(err),
                Err(_) => {}
            }
        }
        match error {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }

    /// Total number of rows affected by every statement.
    ///
    /// Fails with the first error of any statement, once every result has been received, so
    /// the transaction status reflects the whole exchange.
    pub async fn rows_updated(mut self) -> Result<u64> {
        let mut rows = 0;
        let mut error = None;
        while let Some(result) = self.next().await {
            match result.and_then(|result| result.rows_updated()) {
                Ok(updated) => rows += updated.unwrap_or(0),
                Err(err) if error.is_none() => error = Some(err),
                Err(_) => {}
            }
        }
        match error {
            Some(err) => Err(err),
            None => Ok(rows),
        }
    }
}

impl Stream for Results {
    type Item = Result<PgResult>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let me = &mut *self;
        match ready!(Pin::new(&mut me.windows).poll_next(cx)) {
            Some(Ok(messages)) => Poll::Ready(Some(Ok(PgResult::new(messages, me.codecs.clone())))),
            Some(Err(err)) => Poll::Ready(Some(Err(err))),
            None => Poll::Ready(None),
        }
    }
}
