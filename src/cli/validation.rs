//! CLI argument validation functions
//!
//! This module provides custom validation functions for CLI arguments
//! that go beyond what clap can validate automatically.

use std::fs;
use std::path::PathBuf;

/// Validate that a file path is accessible (exists and is readable)
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }

    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }

    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!("Cannot read configuration file '{}': {}", path_str, e)),
    }
}

/// Validate the poll limit is a positive number
pub fn validate_max_iterations(value: &str) -> Result<u64, String> {
    let iterations: u64 = value.parse().map_err(|_| {
        format!("Iteration limit must be a valid positive number, got: '{}'", value)
    })?;

    if iterations == 0 {
        return Err("Iteration limit must be greater than 0".to_string());
    }

    Ok(iterations)
}
