//! Runtime configuration for movegrade.
//!
//! Every value has a compile-time default and can be overridden through a
//! dedicated environment variable. Command-line flags win over both.

use std::path::PathBuf;

const DEFAULT_CONFIG_DIR: &str = ".config/movegrade/data";
const DEV_DATA_DIR: &str = "./data";

/// Default idle timeout before a silent search is finalized.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = analysis::model::DEFAULT_IDLE_TIMEOUT_MS;

/// Get the data directory.
///
/// Priority:
/// 1. `MOVEGRADE_DATA_DIR` env variable if set
/// 2. `$HOME/.config/movegrade/data` if HOME is set
/// 3. `./data` as fallback
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MOVEGRADE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(DEFAULT_CONFIG_DIR);
    }

    PathBuf::from(DEV_DATA_DIR)
}

/// Directory of saved analyses.
pub fn get_analyses_dir() -> PathBuf {
    get_data_dir().join("analyses")
}

/// Engine binary to run, when pinned by `MOVEGRADE_ENGINE_PATH`.
pub fn get_engine_path() -> Option<PathBuf> {
    std::env::var_os("MOVEGRADE_ENGINE_PATH")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

/// Engine binary cache directory.
///
/// Priority:
/// 1. `MOVEGRADE_ENGINE_CACHE_DIR` env variable if set
/// 2. `<data dir>/engines`
pub fn get_engine_cache_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MOVEGRADE_ENGINE_CACHE_DIR") {
        return PathBuf::from(dir);
    }

    get_data_dir().join("engines")
}

/// Idle timeout in milliseconds. Unparseable values fall back to the default.
pub fn get_idle_timeout_ms() -> u64 {
    parse_idle_timeout(std::env::var("MOVEGRADE_IDLE_TIMEOUT_MS").ok().as_deref())
}

fn parse_idle_timeout(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_IDLE_TIMEOUT_MS)
}
