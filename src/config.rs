//! Environment-driven configuration, resolved once at startup.
//!
//! The database path list is the single source of truth for both read
//! candidates and write targets - handlers never re-derive paths per
//! request.

use std::env;
use std::path::PathBuf;

use tracing::info;

/// Colon-separated list separator for path env vars.
const PATH_SEP: char = ':';

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the HTTP server.
    pub port: u16,
    /// Ordered database locations; the first is the primary.
    pub database_paths: Vec<PathBuf>,
    /// Directories probed when unlinking deleted records' images.
    pub upload_dirs: Vec<PathBuf>,
}

impl Config {
    pub fn load() -> Self {
        let port = var_or("PORT", "3001")
            .parse()
            .unwrap_or_else(|_| panic!("PORT must be a number"));

        let primary = PathBuf::from(var_or("DATABASE_PATH", "database.json"));
        let mut database_paths = vec![primary];
        for replica in split_paths(&var_or(
            "DATABASE_REPLICAS",
            "public/database.json:api/database.json",
        )) {
            if !database_paths.contains(&replica) {
                database_paths.push(replica);
            }
        }

        let upload_dirs = split_paths(&var_or(
            "UPLOAD_DIRS",
            "images/uploads:public/images/uploads",
        ));

        Config {
            port,
            database_paths,
            upload_dirs,
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => {
            info!("{} not set, using default: {}", key, default);
            default.to_string()
        }
    }
}

fn split_paths(raw: &str) -> Vec<PathBuf> {
    raw.split(PATH_SEP)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}
