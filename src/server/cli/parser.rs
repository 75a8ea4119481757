use byte_unit::Byte;
use clap::Parser;
use std::{net::IpAddr, ops::RangeInclusive};
use tracing::Level;

const DEFAULT_PORT: u16 = 11211;
const DEFAULT_ADDRESS: &str = "127.0.0.1";
const CONNECTION_LIMIT: u32 = 1024;
const NUM_WORKERS: usize = 8;
const NUM_SHARDS: u32 = 16;
const MEMORY_LIMIT: &str = "64MiB";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
/// memcached compatible text protocol cache server
pub struct MemcliteConfig {
    #[arg(short, long, value_name = "PORT", value_parser = port_in_range, default_value_t = DEFAULT_PORT)]
    /// TCP port to listen on
    pub port: u16,

    #[arg(short, long, value_name = "CONNECTION-LIMIT", default_value_t = CONNECTION_LIMIT)]
    /// max pending connections waiting for a worker
    pub connection_limit: u32,

    #[arg(short, long, value_name = "MEMORY-LIMIT", value_parser = parse_memory, default_value = MEMORY_LIMIT)]
    /// total cache capacity in bytes (accepts units, e.g. 64MiB)
    pub memory_limit: u64,

    #[arg(short, long, value_name = "WORKERS", default_value_t = NUM_WORKERS)]
    /// number of connection handling workers
    pub workers: usize,

    #[arg(short, long, value_name = "SHARDS", value_parser = shard_count, default_value_t = NUM_SHARDS)]
    /// number of cache shards the capacity is split across
    pub shards: u32,

    #[arg(short, long, action = clap::ArgAction::Count, default_value_t = 1)]
    /// sets the level of verbosity
    pub verbose: u8,

    #[arg(short, long, value_name = "listen", default_value_t = String::from(DEFAULT_ADDRESS).parse::<IpAddr>().unwrap())]
    /// interface to listen on
    pub listen_address: IpAddr,
}

const PORT_RANGE: RangeInclusive<usize> = 1..=65535;

fn port_in_range(s: &str) -> Result<u16, String> {
    let port: usize = s
        .parse()
        .map_err(|_| format!("`{s}` isn't a port number"))?;
    if PORT_RANGE.contains(&port) {
        Ok(port as u16)
    } else {
        Err(format!(
            "port not in range {}-{}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ))
    }
}

fn parse_memory(s: &str) -> Result<u64, String> {
    match Byte::parse_str(s, true) {
        Ok(bytes) => Ok(bytes.as_u64()),
        Err(byte_error) => Err(format!("{}", byte_error)),
    }
}

fn shard_count(s: &str) -> Result<u32, String> {
    let shards: u32 = s
        .parse()
        .map_err(|_| format!("`{s}` isn't a shard count"))?;
    if shards == 0 {
        Err(String::from("shard count must be at least 1"))
    } else {
        Ok(shards)
    }
}

impl MemcliteConfig {
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    fn from_args(args: Vec<String>) -> Result<MemcliteConfig, String> {
        let memclite_args = MemcliteConfig::parse_from(args.iter());
        Ok(memclite_args)
    }
}

pub fn parse(args: Vec<String>) -> Result<MemcliteConfig, String> {
    MemcliteConfig::from_args(args)
}
