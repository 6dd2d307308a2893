//! Connection wrapper that reports responses the peer never received.
//!
//! Once hyper owns a connection its write errors are dropped by the server
//! loop, so they are logged here, on the way to the socket.

use std::{
    future::{ready, Ready},
    io,
    pin::Pin,
    task::{Context, Poll},
};

use axum_server::accept::Accept;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::error;

/// Wraps every accepted connection into a [`WriteErrorLogger`].
///
/// For HTTPS it sits below the TLS acceptor, on the raw TCP stream.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct WriteErrorAcceptor;

impl<I, S> Accept<I, S> for WriteErrorAcceptor {
    type Stream = WriteErrorLogger<I>;
    type Service = S;
    type Future = Ready<io::Result<(Self::Stream, Self::Service)>>;

    fn accept(&self, stream: I, service: S) -> Self::Future {
        ready(Ok((WriteErrorLogger::new(stream), service)))
    }
}

pub(crate) struct WriteErrorLogger<I> {
    inner: I,
    failed: bool,
}

impl<I> WriteErrorLogger<I> {
    fn new(inner: I) -> Self {
        WriteErrorLogger {
            inner,
            failed: false,
        }
    }

    // only the first failure of a connection is logged, hyper gives up on it
    // right after
    fn report<T>(&mut self, poll: Poll<io::Result<T>>) -> Poll<io::Result<T>> {
        if let Poll::Ready(Err(e)) = &poll {
            if !self.failed {
                self.failed = true;
                error!(error = %e, kind = ?e.kind(), "Error writing admission response");
            }
        }
        poll
    }
}

impl<I> AsyncRead for WriteErrorLogger<I>
where
    I: AsyncRead + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<I> AsyncWrite for WriteErrorLogger<I>
where
    I: AsyncWrite + Unpin,
{
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write(cx, buf);
        self.report(poll)
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write_vectored(cx, bufs);
        self.report(poll)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let poll = Pin::new(&mut self.inner).poll_flush(cx);
        self.report(poll)
    }

    // a peer that already went away makes shutdown fail too, that is not a
    // lost response
    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
