pub const MEMCLITE_VERSION: &str = env!("CARGO_PKG_VERSION");
