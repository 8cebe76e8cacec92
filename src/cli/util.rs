//! CLI Utilities
//!
//! Shared input/output plumbing for the command handlers.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::types::{DocError, Result};

/// Read a JSON document from a file, or from stdin when the path is "-".
pub fn read_json_input(path: &Path) -> Result<Value> {
    let raw = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(path).map_err(|e| {
            DocError::MissingInput(format!("cannot read {}: {}", path.display(), e))
        })?
    };
    Ok(serde_json::from_str(&raw)?)
}

/// Write rendered output to a file, or print it to stdout when no target
/// is given. Parent directories are created as needed.
pub fn write_or_print(content: &str, target: Option<&Path>) -> Result<()> {
    match target {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, content)?;
        }
        None => println!("{}", content),
    }
    Ok(())
}
