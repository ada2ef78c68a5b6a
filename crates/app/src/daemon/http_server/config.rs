/// Listener settings for the admin HTTP server.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Level of the per-request trace events
    pub log_level: tracing::Level,
}

impl Config {
    pub fn new(host: String, port: u16, log_level: tracing::Level) -> Self {
        Self {
            host,
            port,
            log_level,
        }
    }

    /// Base URL of the admin pages, for the startup banner.
    pub fn admin_url(&self) -> String {
        format!("http://{}:{}{}/", self.host, self.port, super::ADMIN_PREFIX)
    }
}
