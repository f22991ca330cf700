use std::{
    collections::VecDeque,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, ready},
};
use tokio::sync::{mpsc::UnboundedReceiver, oneshot};

use super::{Command, ConnectionClosed, PgStream, ResponseSender, Shared};
use crate::{
    Error,
    common::{logger, verbose},
    postgres::{
        BackendMessage,
        frontend::{CopyFail, Terminate},
    },
};

#[derive(Debug, PartialEq, Eq)]
enum State {
    Running,
    /// Wait for inflight exchanges, then terminate.
    Closing,
    /// `Terminate` is buffered, flush and shutdown.
    Terminating,
}

/// The task owning the socket of a [`PgClient`][super::PgClient].
///
/// Each inflight exchange is answered by exactly one `ReadyForQuery`, so replies are routed to
/// the front of the inflight queue, which is popped on every `ReadyForQuery`.
pub(crate) struct WorkerFuture {
    stream: PgStream,
    recv: UnboundedReceiver<Command>,
    inflight: VecDeque<ResponseSender>,
    shared: Arc<Shared>,
    closers: Vec<oneshot::Sender<()>>,
    state: State,
}

impl WorkerFuture {
    pub(crate) fn new(stream: PgStream, recv: UnboundedReceiver<Command>, shared: Arc<Shared>) -> Self {
        Self {
            stream,
            recv,
            inflight: VecDeque::with_capacity(1),
            shared,
            closers: vec![],
            state: State::Running,
        }
    }

    fn poll_commands(&mut self, cx: &mut Context) {
        while let Poll::Ready(command) = self.recv.poll_recv(cx) {
            match command {
                Some(Command::Exchange { request, reply }) => {
                    self.stream.send_encoded(&request);
                    self.inflight.push_back(reply);
                }
                Some(Command::Close(send)) => {
                    self.closers.push(send);
                    self.state = State::Closing;
                    return;
                }
                // all handles dropped
                None => {
                    self.state = State::Closing;
                    return;
                }
            }
        }
    }

    fn handle(&mut self, message: BackendMessage) {
        match message {
            BackendMessage::ParameterStatus(param) => {
                self.shared.set_param(&param.name, &param.value);
            }
            BackendMessage::BackendKeyData(key_data) => self.shared.set_key_data(key_data),
            BackendMessage::NoticeResponse(notice) => {
                let notice = notice.into_diagnostic();
                logger!(warn, "{notice}");
                self.shared.notice(notice);
            }
            BackendMessage::NotificationResponse(notification) => {
                self.shared.notification(notification);
            }
            BackendMessage::ReadyForQuery(ready) => {
                verbose!(status = ?ready.status, "ReadyForQuery");
                self.shared.set_status(ready.status);
                self.inflight.pop_front();
            }
            BackendMessage::CopyInResponse(_) | BackendMessage::CopyBothResponse(_) => {
                self.stream.send(CopyFail { message: "COPY FROM STDIN is not supported" });
            }
            message => match self.inflight.front() {
                // receiver may be dropped, the rest of its window is discarded
                Some(reply) => {
                    let _ = reply.send(Ok(message));
                }
                None => logger!(
                    warn,
                    "unexpected `{}` message with no pending request",
                    BackendMessage::message_name(message.msgtype()),
                ),
            },
        }
    }

    /// Close the command channel and reject everything still queued in it.
    fn reject_pending(&mut self) {
        self.recv.close();
        while let Ok(command) = self.recv.try_recv() {
            match command {
                Command::Exchange { reply, .. } => {
                    let _ = reply.send(Err(ConnectionClosed.into()));
                }
                Command::Close(send) => self.closers.push(send),
            }
        }
    }

    fn fail(&mut self, err: Error) -> Poll<()> {
        logger!(error, "connection error: {err}");

        let mut inflight = std::mem::take(&mut self.inflight).into_iter();
        if let Some(reply) = inflight.next() {
            let _ = reply.send(Err(err));
        }
        for reply in inflight {
            let _ = reply.send(Err(ConnectionClosed.into()));
        }

        self.reject_pending();
        // closers are dropped, `close` observes the connection as closed
        Poll::Ready(())
    }
}

impl Future for WorkerFuture {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let me = self.get_mut();

        loop {
            if me.state == State::Running {
                me.poll_commands(cx);
            }

            if me.state == State::Closing && me.inflight.is_empty() {
                me.reject_pending();
                me.stream.send(Terminate);
                me.state = State::Terminating;
            }

            if me.stream.has_pending_write() {
                if let Poll::Ready(Err(err)) = me.stream.poll_flush(cx) {
                    return me.fail(err.into());
                }
            }

            if me.state == State::Terminating {
                if me.stream.has_pending_write() {
                    return Poll::Pending;
                }

                if let Err(_err) = ready!(me.stream.poll_shutdown(cx)) {
                    logger!(error, "shutdown error: {_err}");
                }

                logger!(debug, "connection terminated");
                for send in me.closers.drain(..) {
                    let _ = send.send(());
                }
                return Poll::Ready(());
            }

            match me.stream.poll_recv(cx) {
                Poll::Ready(Ok(message)) => me.handle(message),
                Poll::Ready(Err(err)) => return me.fail(err),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
