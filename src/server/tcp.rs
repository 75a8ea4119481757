use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::cache::engine::LruCache;

use super::client_handler::Client;
use super::stats::Stats;

#[derive(Clone, Copy)]
pub struct TextServerConfig {
    rx_timeout_secs: u64,
    connection_limit: usize,
    workers: usize,
}

impl TextServerConfig {
    pub fn new(rx_timeout_secs: u64, connection_limit: usize, workers: usize) -> TextServerConfig {
        TextServerConfig {
            rx_timeout_secs,
            connection_limit,
            workers,
        }
    }
}

type ConnectionQueue = Arc<Mutex<mpsc::Receiver<(TcpStream, SocketAddr)>>>;

/// Accepts connections and hands them to a fixed pool of workers through a
/// bounded queue. A full queue blocks the acceptor, which is the admission
/// control: at most `connection_limit` connections wait for a worker.
pub struct TextServer {
    config: TextServerConfig,
    store: Arc<LruCache>,
    stats: Arc<Stats>,
    shutdown: CancellationToken,
}

impl TextServer {
    pub fn new(
        config: TextServerConfig,
        store: Arc<LruCache>,
        stats: Arc<Stats>,
        shutdown: CancellationToken,
    ) -> TextServer {
        TextServer {
            config,
            store,
            stats,
            shutdown,
        }
    }

    /// Runs until the shutdown token fires, then drops the listener and
    /// waits for every worker to drain.
    pub async fn run<A: ToSocketAddrs>(&mut self, addr: A) -> io::Result<()> {
        let listener = TcpListener::bind(addr).await?;

        let (conn_tx, conn_rx) = mpsc::channel(self.config.connection_limit);
        let conn_rx: ConnectionQueue = Arc::new(Mutex::new(conn_rx));

        let mut workers = Vec::with_capacity(self.config.workers);
        for id in 0..self.config.workers {
            workers.push(tokio::spawn(connection_worker(
                id,
                conn_rx.clone(),
                self.store.clone(),
                self.stats.clone(),
                self.config.rx_timeout_secs,
                self.shutdown.clone(),
            )));
        }

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!("Shutdown requested, closing listener");
                    break;
                }
                connection = listener.accept() => match connection {
                    Ok((socket, addr)) => {
                        socket.set_nodelay(true)?;
                        if conn_tx.send((socket, addr)).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        error!("accept error: {}", err);
                    }
                },
            }
        }

        drop(listener);
        drop(conn_tx);
        for worker in workers {
            let _ = worker.await;
        }
        Ok(())
    }
}

/// One pool worker: picks connections off the queue and runs each handler
/// to completion before taking the next.
async fn connection_worker(
    id: usize,
    conn_rx: ConnectionQueue,
    store: Arc<LruCache>,
    stats: Arc<Stats>,
    rx_timeout_secs: u64,
    shutdown: CancellationToken,
) {
    debug!("Connection worker {} started", id);
    loop {
        let connection = tokio::select! {
            _ = shutdown.cancelled() => break,
            connection = async { conn_rx.lock().await.recv().await } => connection,
        };
        match connection {
            Some((socket, addr)) => {
                let client = Client::new(
                    store.clone(),
                    stats.clone(),
                    socket,
                    addr,
                    rx_timeout_secs,
                    shutdown.clone(),
                );
                client.handle().await;
            }
            // acceptor is gone and the queue is drained
            None => break,
        }
    }
    debug!("Connection worker {} stopped", id);
}
