//! Configuration and hashing helpers

use std::io::BufRead;

use anyhow::Context;

use crate::config::AppConfig;
use crate::infrastructure::user::{Argon2Hasher, PasswordHasher};

/// Print the effective configuration
pub fn show_config(config: &AppConfig) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Print the hash of `password`, or of the first stdin line
pub fn hash_password(config: &AppConfig, password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(password) => password,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    anyhow::ensure!(!password.is_empty(), "Password must not be empty");

    let hasher = Argon2Hasher::new(config.hash_cost())?;
    println!("{}", hasher.hash(&password)?);
    Ok(())
}
