//! Configuration Management
//!
//! Runtime settings of the issue service. The binary fills them from command
//! line flags or the environment:
//!
//! - `DATABASE_URL`: SQLite connection string (default: `sqlite://issues.db`)
//! - `BIND_ADDRESS`: HTTP server bind address (default: `0.0.0.0:3000`)

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://issues.db".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}
