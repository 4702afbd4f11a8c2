use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::http::connection::{Connection, Handler};

/// A running server.
///
/// [`Server::serve`] binds and returns straight away while connections are
/// accepted in the background, one task per connection. The `closed` flag is
/// set once, by [`Server::close`] (or on drop), and is checked by the accept
/// loop whenever accepting fails or it is woken for shutdown.
pub struct Server {
    local_addr: SocketAddr,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    accept_loop: Option<JoinHandle<()>>,
}

impl Server {
    pub async fn serve<A, H>(addr: A, handler: H) -> anyhow::Result<Self>
    where
        A: ToSocketAddrs,
        H: Handler,
    {
        let listener = TcpListener::bind(addr)
            .await
            .context("could not bind listener")?;
        let local_addr = listener.local_addr()?;
        info!("Listening on {}", local_addr);

        let closed = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(Notify::new());

        let accept_loop = tokio::spawn(accept_loop(
            listener,
            Arc::new(handler),
            Arc::clone(&closed),
            Arc::clone(&shutdown),
        ));

        Ok(Self {
            local_addr,
            closed,
            shutdown,
            accept_loop: Some(accept_loop),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stops accepting. The listening socket is closed once this returns;
    /// connections already being served run to completion.
    pub async fn close(&mut self) -> anyhow::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();

        if let Some(accept_loop) = self.accept_loop.take() {
            accept_loop.await.context("accept loop panicked")?;
        }
        Ok(())
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();
    }
}

async fn accept_loop<H: Handler>(
    listener: TcpListener,
    handler: Arc<H>,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    loop {
        let accepted = tokio::select! {
            res = listener.accept() => res,
            _ = shutdown.notified() => {
                if closed.load(Ordering::SeqCst) {
                    break;
                }
                continue;
            }
        };

        match accepted {
            Ok((socket, peer)) => {
                debug!(%peer, "Accepted connection");

                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    if let Err(e) = Connection::new(socket, handler).run().await {
                        tracing::error!("Connection error from {}: {}", peer, e);
                    }
                });
            }
            Err(e) => {
                if closed.load(Ordering::SeqCst) {
                    break;
                }
                warn!("could not accept connection: {}", e);
            }
        }
    }

    debug!("accept loop stopped");
}
