use clap::{Parser, ValueEnum};
use issue_service::Config;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines
    Pretty,
    /// One JSON object per event
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "issuetracker", version)]
#[command(about = "Per-project issue tracking API")]
pub struct Cli {
    /// SQLite connection string
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://issues.db")]
    pub database_url: String,

    /// Address the HTTP server listens on
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0:3000")]
    pub bind_address: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            database_url: self.database_url.clone(),
            bind_address: self.bind_address.clone(),
        }
    }
}
