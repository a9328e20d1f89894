use clap::{Parser, ValueEnum};
use snaplink_generator::random::DEFAULT_ALPHABET;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "SNAPLINK_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "SNAPLINK_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "SNAPLINK_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "SNAPLINK_MYSQL_DSN";
pub const CACHE_BACKEND_ENV: &str = "SNAPLINK_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "SNAPLINK_REDIS_URL";
pub const FLUSH_INTERVAL_ENV: &str = "SNAPLINK_FLUSH_INTERVAL_SECS";
pub const MAX_ATTEMPTS_ENV: &str = "SNAPLINK_MAX_ATTEMPTS";
pub const CODE_LENGTH_ENV: &str = "SNAPLINK_CODE_LENGTH";
pub const CODE_ALPHABET_ENV: &str = "SNAPLINK_CODE_ALPHABET";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "memory")]
    Memory,
    #[value(name = "redis")]
    Redis,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::Memory => write!(f, "memory"),
            CacheBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "snaplink")]
pub struct Cli {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Public base URL used to render short links in responses.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Memory
    )]
    pub cache: CacheBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("cache", "redis"))]
    pub redis_url: Option<String>,

    /// Seconds between periodic click flushes.
    #[arg(long, env = FLUSH_INTERVAL_ENV, default_value_t = 60)]
    pub flush_interval_secs: u64,

    /// Bound on candidate attempts per creation.
    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = 10)]
    pub max_attempts: u32,

    /// Length of generated short codes.
    #[arg(long, env = CODE_LENGTH_ENV, default_value_t = 7)]
    pub code_length: usize,

    /// Alphabet generated short codes are sampled from.
    #[arg(long, env = CODE_ALPHABET_ENV, default_value = DEFAULT_ALPHABET)]
    pub code_alphabet: String,
}
