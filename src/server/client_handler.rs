use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::sink::SinkExt;
use futures::StreamExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::cache::engine::LruCache;
use crate::protocol::text::TextRequest;
use crate::protocol::text_codec::MemcacheTextCodec;

use super::handler::TextHandler;
use super::stats::Stats;

/// Hard per-connection read deadline. Armed once when handling starts and
/// not refreshed by activity.
pub const READ_TIMEOUT_SECS: u64 = 30;

/// One accepted connection: a reader task feeding parsed requests through
/// a channel, and this handler consuming them, driving the cache and
/// writing replies. The reader owns the read half, the handler the write
/// half, so the two never touch the socket concurrently.
pub struct Client {
    socket: TcpStream,
    addr: SocketAddr,
    handler: TextHandler,
    rx_timeout_secs: u64,
    shutdown: CancellationToken,
}

impl Client {
    pub fn new(
        store: Arc<LruCache>,
        stats: Arc<Stats>,
        socket: TcpStream,
        addr: SocketAddr,
        rx_timeout_secs: u64,
        shutdown: CancellationToken,
    ) -> Client {
        Client {
            socket,
            addr,
            handler: TextHandler::new(store, stats),
            rx_timeout_secs,
            shutdown,
        }
    }

    pub async fn handle(self) {
        debug!("New client connected: {}", self.addr);
        let deadline = Instant::now() + Duration::from_secs(self.rx_timeout_secs);

        let (read_half, write_half) = self.socket.into_split();
        let mut writer = FramedWrite::new(write_half, MemcacheTextCodec::new());
        let (request_tx, mut requests) = mpsc::channel(1);
        let reader = tokio::spawn(read_requests(read_half, request_tx));

        loop {
            let request = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!("Shutdown requested, disconnecting client: {}", self.addr);
                    break;
                }
                request = timeout_at(deadline, requests.recv()) => match request {
                    Err(_elapsed) => {
                        debug!(
                            "Timeout {}s elapsed, disconnecting client: {}",
                            self.rx_timeout_secs, self.addr
                        );
                        break;
                    }
                    Ok(None) => {
                        debug!("Connection closed: {}", self.addr);
                        break;
                    }
                    Ok(Some(request)) => request,
                },
            };

            match self.handler.handle_request(request) {
                Some(response) => {
                    if let Err(err) = writer.send(response).await {
                        error!("error on sending response; error = {:?}", err);
                        break;
                    }
                }
                // quit: close without a reply
                None => break,
            }
        }

        // A reader blocked in I/O is abandoned here; aborting it drops the
        // read half and fully closes the socket.
        reader.abort();
    }
}

/// Reader task: decodes requests off the socket and forwards them to the
/// handler. Ends on EOF, on a transport error, or once the handler side of
/// the channel is gone; dropping the sender tells the handler it is done.
async fn read_requests(read_half: OwnedReadHalf, requests: mpsc::Sender<TextRequest>) {
    let mut frames = FramedRead::new(read_half, MemcacheTextCodec::new());
    while let Some(decoded) = frames.next().await {
        match decoded {
            Ok(request) => {
                if requests.send(request).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                error!("Error when reading frame; error = {:?}", err);
                break;
            }
        }
    }
}
