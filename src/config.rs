use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::{bail, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_filter: String,
    /// Unset selects the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8081);

        let host = env::var("HOST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        let log_filter = env::var("RUST_LOG")
            .unwrap_or_else(|_| "church_school_api=info,tower_http=info".into());

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => bail!("JWT_SECRET not set"),
        };

        Ok(Self {
            host,
            port,
            log_filter,
            database_url,
            jwt_secret,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
