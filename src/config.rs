//! Server configuration from environment variables

use std::env;

use log::warn;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

/// Listen address for the relay server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Read `RELAY_HOST` and `RELAY_PORT`, falling back to defaults.
    pub fn from_env() -> Self {
        let host = match env::var("RELAY_HOST") {
            Ok(host) if !host.is_empty() => host,
            _ => DEFAULT_HOST.to_string(),
        };

        let port = match env::var("RELAY_PORT") {
            Ok(value) => match value.parse() {
                Ok(port) => port,
                Err(_) => {
                    warn!("Invalid RELAY_PORT {:?}, using {}", value, DEFAULT_PORT);
                    DEFAULT_PORT
                }
            },
            Err(_) => DEFAULT_PORT,
        };

        Self { host, port }
    }

    /// Address string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}
