use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::cli::parser::MemcliteConfig;
use super::client_handler::READ_TIMEOUT_SECS;
use super::server_context::ServerContext;
use super::tcp::{TextServer, TextServerConfig};

fn get_worker_thread_name() -> String {
    static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
    let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
    format!("memclited-wrk-{}", id)
}

fn create_multi_thread_runtime() -> tokio::runtime::Runtime {
    Builder::new_multi_thread()
        .thread_name_fn(get_worker_thread_name)
        .enable_all()
        .build()
        .unwrap()
}

fn register_ctrlc_handler(runtime: &tokio::runtime::Runtime, cancellation_token: CancellationToken) {
    runtime.handle().spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl-c signal");
        info!("Ctrl-C received, shutting down...");
        cancellation_token.cancel();
    });
}

pub fn start_server(config: MemcliteConfig) {
    let ctxt = ServerContext::get_default_server_context(&config);
    start_server_with_ctxt(config, ctxt)
}

pub fn start_server_with_ctxt(config: MemcliteConfig, ctxt: ServerContext) {
    let runtime = create_multi_thread_runtime();
    register_ctrlc_handler(&runtime, ctxt.cancellation_token());

    let addr = SocketAddr::new(config.listen_address, config.port);
    let server_config = TextServerConfig::new(
        READ_TIMEOUT_SECS,
        config.connection_limit as usize,
        config.workers,
    );
    let mut server = TextServer::new(
        server_config,
        ctxt.store(),
        ctxt.stats(),
        ctxt.cancellation_token(),
    );
    if let Err(err) = runtime.block_on(server.run(addr)) {
        error!("Server error: {}", err);
    }
}
