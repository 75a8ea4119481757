pub mod cli;
pub mod client_handler;
pub mod handler;
pub mod runtime_builder;
pub mod server_context;
pub mod stats;
pub mod tcp;
