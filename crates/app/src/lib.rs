// Library exports for the binary and the integration tests

// Daemon/service modules (HTTP server, process bootstrap)
pub mod daemon;

// Re-export key types for convenience
pub use daemon::http_server;
pub use daemon::spawn_service;
pub use daemon::ServiceConfig;
pub use daemon::ServiceState;
pub use daemon::StateSetupError;
