use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Ophtavisit";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the data directory (tests, kiosk installs).
pub const DATA_DIR_ENV: &str = "OPHTAVISIT_DATA_DIR";

/// File name of the record database inside the data directory.
pub const DATABASE_FILE: &str = "records.db";

/// Get the application data directory.
/// `$OPHTAVISIT_DATA_DIR` when set, otherwise ~/Ophtavisit/.
/// `None` only when no home directory can be determined.
pub fn app_data_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Get the path of the record database
pub fn database_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(DATABASE_FILE))
}

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "ophtavisit_lib=debug,warn"
    } else {
        "ophtavisit_lib=info,warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_lives_in_data_dir() {
        let (Some(db), Some(dir)) = (database_path(), app_data_dir()) else {
            return;
        };
        assert!(db.starts_with(dir));
        assert!(db.ends_with(DATABASE_FILE));
    }

    #[test]
    fn app_name_is_ophtavisit() {
        assert_eq!(APP_NAME, "Ophtavisit");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    #[test]
    fn log_filter_targets_this_crate() {
        assert!(default_log_filter().starts_with("ophtavisit_lib="));
    }
}
