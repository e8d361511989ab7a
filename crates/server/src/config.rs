//! Server configuration from the environment.

use std::path::PathBuf;

pub const WORKSPACE_ENV: &str = "CUTSYNC_WORKSPACE";
pub const PORT_ENV: &str = "CUTSYNC_PORT";
pub const DEFAULT_PORT: u16 = 8765;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Workspace directory holding the snapshot, queue, and archive.
    pub workspace: PathBuf,
    pub port: u16,
}

impl ServerConfig {
    /// Read configuration from `CUTSYNC_WORKSPACE` and `CUTSYNC_PORT`,
    /// falling back to `~/.cutsync` and port 8765.
    pub fn from_env() -> Self {
        let workspace = std::env::var(WORKSPACE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_workspace());
        let port = std::env::var(PORT_ENV)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        Self { workspace, port }
    }

    pub fn addr(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}

fn default_workspace() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".cutsync")
}
