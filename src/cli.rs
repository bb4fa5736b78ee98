//! Command-line interface definitions using clap
//!
//! 命令行参数覆盖配置文件和 `SHORTENER__*` 环境变量；
//! 每个参数也可以直接用不带前缀的环境变量设置（SERVER_ADDRESS、BASE_URL 等）。

use clap::{Parser, Subcommand};

use crate::config::StaticConfig;

/// Shortener - a small URL shortener service
#[derive(Parser, Debug)]
#[command(name = "shortener")]
#[command(version)]
#[command(about = "A small URL shortener service", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    /// Listen address (host:port)
    #[arg(long, short = 'a', env = "SERVER_ADDRESS")]
    pub address: Option<String>,

    /// Base URL prepended to short ids
    #[arg(long, short = 'b', env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Line-log storage file
    #[arg(long, short = 'f', env = "FILE_STORAGE_PATH")]
    pub file_storage_path: Option<String>,

    /// Database DSN (sqlite:// or postgres://)
    #[arg(long, short = 'd', env = "DATABASE_DSN")]
    pub database_dsn: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// 把命令行参数写回配置；未给出的参数保持配置文件里的值
    pub fn apply_overrides(&self, config: &mut StaticConfig) {
        if let Some(address) = &self.address {
            config.server.address = address.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.server.base_url = base_url.clone();
        }
        if let Some(path) = &self.file_storage_path {
            config.storage.file_storage_path = path.clone();
        }
        if let Some(dsn) = &self.database_dsn {
            config.storage.database_dsn = dsn.clone();
        }
    }
}
