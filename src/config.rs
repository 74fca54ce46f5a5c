use envconfig::Envconfig;
use std::net::SocketAddr;

#[derive(Debug, Envconfig, Clone)]
pub struct Config {
    /// Server bind address
    #[envconfig(from = "BIND_ADDR", default = "127.0.0.1:3000")]
    pub bind_addr: SocketAddr,

    /// Redis connection URL; empty keeps rate limiting process-local
    #[envconfig(from = "REDIS_URL", default = "")]
    pub redis_url: String,

    /// Directory uploads are written to
    #[envconfig(from = "UPLOAD_DIR", default = "./data/uploads")]
    pub upload_dir: String,

    /// Public base URL uploaded files are served under
    #[envconfig(from = "UPLOAD_BASE_URL", default = "http://127.0.0.1:3000/uploads")]
    pub upload_base_url: String,

    /// Maximum upload size in bytes
    #[envconfig(from = "MAX_UPLOAD_BYTES", default = "10485760")]
    pub max_upload_bytes: usize,

    /// Log filter when RUST_LOG is not set
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,

    /// Bearer token seeded into the in-memory session store. Standalone and
    /// development use only; leave empty when a real identity provider is
    /// wired in.
    #[envconfig(from = "DEV_SESSION_TOKEN", default = "")]
    pub dev_session_token: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, envconfig::Error> {
        Config::init_from_env()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], 3000).into(),
            redis_url: String::new(),
            upload_dir: "./data/uploads".to_string(),
            upload_base_url: "http://127.0.0.1:3000/uploads".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            log_level: "info".to_string(),
            dev_session_token: String::new(),
        }
    }
}
