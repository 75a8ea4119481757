use std::env;
use std::process;

use tracing::info;

use memclite::server::cli::parser;
use memclite::server::runtime_builder;
use memclite::version::MEMCLITE_VERSION;

fn main() {
    let config = match parser::parse(env::args().collect()) {
        Ok(config) => config,
        Err(err) => {
            eprint!("{}", err);
            process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .init();

    info!("memclited {}", MEMCLITE_VERSION);
    info!("Listen address: {}", config.listen_address);
    info!("Listen port: {}", config.port);
    info!("Connection limit: {}", config.connection_limit);
    info!("Workers: {}", config.workers);
    info!("Memory limit: {} bytes", config.memory_limit);
    info!("Shards: {}", config.shards);

    runtime_builder::start_server(config);
}
