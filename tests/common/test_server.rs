use std::net::TcpListener;

use memclite::server::cli::parser;
use memclite::server::runtime_builder::start_server_with_ctxt;
use memclite::server::server_context::ServerContext;
use tokio_util::sync::CancellationToken;

use super::params_builder::MemclitedServerParamsBuilder;

pub struct MemclitedTestServer {
    thread_join_handle: Option<std::thread::JoinHandle<()>>,
    cancellation_token: CancellationToken,
    port: u16,
}

impl MemclitedTestServer {
    fn new(
        thread_join_handle: std::thread::JoinHandle<()>,
        cancellation_token: CancellationToken,
        port: u16,
    ) -> MemclitedTestServer {
        MemclitedTestServer {
            thread_join_handle: Some(thread_join_handle),
            cancellation_token,
            port,
        }
    }

    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    #[allow(dead_code)]
    pub fn kill(&mut self) {
        self.cancellation_token.cancel();
        if let Some(thread_join_handle) = self.thread_join_handle.take() {
            thread_join_handle.join().unwrap();
        }
    }
}

impl Drop for MemclitedTestServer {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
        if let Some(thread_join_handle) = self.thread_join_handle.take() {
            if thread_join_handle.join().is_err() {
                eprintln!("Problem when joining server thread");
            }
        }
    }
}

/// Grabs a port the OS considers free right now. The listener is dropped
/// before the server binds, so this is best effort, good enough for tests.
fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub fn spawn_server(mut params: MemclitedServerParamsBuilder) -> MemclitedTestServer {
    let port = free_port();
    params.with_port(port);
    let config = parser::parse(params.build()).unwrap();
    let ctxt = ServerContext::get_default_server_context(&config);
    let cancellation_token = ctxt.cancellation_token();
    let handle = std::thread::spawn(move || start_server_with_ctxt(config, ctxt));
    MemclitedTestServer::new(handle, cancellation_token, port)
}
