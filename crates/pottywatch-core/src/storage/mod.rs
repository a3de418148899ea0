mod config;
pub mod database;
pub mod kv;

pub use config::{AlarmConfig, Config, DisplayConfig};
pub use database::Database;
pub use kv::{KvStore, MemoryStore};

use std::path::PathBuf;

/// Returns the directory holding the database and config file.
///
/// `POTTYWATCH_DATA_DIR` wins when set. Otherwise `~/.config/pottywatch[-dev]/`
/// based on POTTYWATCH_ENV (set POTTYWATCH_ENV=dev for a development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("POTTYWATCH_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POTTYWATCH_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pottywatch-dev")
            } else {
                base_dir.join("pottywatch")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
