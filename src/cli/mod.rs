//! CLI module for Teamgate
//!
//! Operator subcommands:
//! - `config`: print the effective configuration
//! - `hash-password`: hash a password with the configured cost
//! - `demo`: run the membership scenario against the in-memory backend

pub mod demo;
pub mod tools;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Teamgate - identity and access-control core
#[derive(Parser)]
#[command(name = "teamgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the effective configuration as JSON
    Config,

    /// Hash a password (read from stdin when not given)
    HashPassword {
        password: Option<String>,
    },

    /// Run the end-to-end team membership scenario
    Demo,
}

/// Load `.env`, the layered configuration and the log subscriber
pub fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);
    config
}
