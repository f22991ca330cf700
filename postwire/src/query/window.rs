use futures_core::Stream;
use std::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use crate::{Result, common::verbose, postgres::BackendMessage};

pin_project_lite::pin_project! {
    /// Split a message stream into windows, each ending with a boundary message.
    ///
    /// The boundary message is included in its window. Messages after the last boundary form a
    /// final window. An error ends the stream, the partial window is discarded.
    #[derive(Debug)]
    pub struct Window<S> {
        #[pin]
        stream: S,
        boundary: fn(&BackendMessage) -> bool,
        window: Vec<BackendMessage>,
        done: bool,
    }
}

impl<S> Window<S> {
    pub fn new(stream: S, boundary: fn(&BackendMessage) -> bool) -> Self {
        Self { stream, boundary, window: vec![], done: false }
    }
}

impl<S> Stream for Window<S>
where
    S: Stream<Item = Result<BackendMessage>>,
{
    type Item = Result<Vec<BackendMessage>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut me = self.project();

        if *me.done {
            return Poll::Ready(None);
        }

        loop {
            match ready!(me.stream.as_mut().poll_next(cx)) {
                Some(Ok(message)) => {
                    let end = (me.boundary)(&message);
                    me.window.push(message);
                    if end {
                        verbose!(len = me.window.len(), "Window");
                        return Poll::Ready(Some(Ok(std::mem::take(me.window))));
                    }
                }
                Some(Err(err)) => {
                    *me.done = true;
                    me.window.clear();
                    return Poll::Ready(Some(Err(err)));
                }
                None => {
                    *me.done = true;
                    if me.window.is_empty() {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(Ok(std::mem::take(me.window))));
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::future::poll_fn;

    use super::*;
    use crate::{
        client::Responses,
        client::ConnectionClosed,
        postgres::backend::{BindComplete, CloseComplete, NoData, ParseComplete},
    };

    fn is_close(message: &BackendMessage) -> bool {
        matches!(message, BackendMessage::CloseComplete(_))
    }

    async fn collect(mut window: Window<Responses>) -> Vec<Result<Vec<BackendMessage>>> {
        let mut output = vec![];
        while let Some(item) = poll_fn(|cx| Pin::new(&mut window).poll_next(cx)).await {
            output.push(item);
        }
        output
    }

    #[tokio::test]
    async fn inclusive_boundaries() {
        let (send, responses) = Responses::channel();
        for message in [
            BindComplete.into(),
            CloseComplete.into(),
            BindComplete.into(),
            NoData.into(),
            CloseComplete.into(),
            ParseComplete.into(),
        ] {
            send.send(Ok(message)).unwrap();
        }
        drop(send);

        let windows: Vec<_> = collect(Window::new(responses, is_close))
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(
            windows,
            vec![
                vec![BindComplete.into(), CloseComplete.into()],
                vec![BindComplete.into(), NoData.into(), CloseComplete.into()],
                vec![ParseComplete.into()],
            ]
        );
    }

    #[tokio::test]
    async fn error_ends_stream() {
        let (send, responses) = Responses::channel();
        send.send(Ok(BindComplete.into())).unwrap();
        send.send(Err(ConnectionClosed.into())).unwrap();
        send.send(Ok(CloseComplete.into())).unwrap();
        drop(send);

        let output = collect(Window::new(responses, is_close)).await;
        assert_eq!(output.len(), 1);
        assert!(output[0].is_err());
    }
}
