// SPDX-License-Identifier: MIT
//! Settings for the `carbom` command-line tool
//!
//! The library itself reads no environment; only the binary loads this.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Where `extract` writes PNG files
    pub output_dir: PathBuf,
    /// Abort `extract` on the first rendition that fails to decode
    pub stop_on_error: bool,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            stop_on_error: false,
            log_filter: "info".to_string(),
        }
    }
}

impl ExtractConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values keep defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            output_dir: lookup("CARBOM_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            stop_on_error: lookup("CARBOM_STOP_ON_ERROR")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.stop_on_error),
            log_filter: lookup("CARBOM_LOG").unwrap_or(defaults.log_filter),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.output_dir.as_os_str().is_empty() {
            return Err("CARBOM_OUTPUT_DIR cannot be empty".to_string());
        }

        if self.log_filter.trim().is_empty() {
            return Err("CARBOM_LOG cannot be empty".to_string());
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
