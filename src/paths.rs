use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub fn database_file_path() -> Result<PathBuf> {
    database_file_path_from_env(env::var_os("WATCHTRACK_DB"))
}

pub fn database_file_path_from_env(env_value: Option<OsString>) -> Result<PathBuf> {
    match env_value {
        Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
        _ => {
            let base = dirs::data_dir().context("unable to resolve data directory")?;
            Ok(base.join("watchtrack").join("watchtrack.db"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_wins() {
        let path = database_file_path_from_env(Some(OsString::from("/tmp/custom.db")))
            .expect("override should resolve");
        assert_eq!(path, PathBuf::from("/tmp/custom.db"));
    }

    #[test]
    fn empty_override_falls_back_to_data_dir() {
        if let Ok(path) = database_file_path_from_env(Some(OsString::new())) {
            assert!(path.ends_with("watchtrack/watchtrack.db"));
        }
    }
}
