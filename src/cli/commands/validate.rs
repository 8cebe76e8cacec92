//! Validate Command
//!
//! Checks a documentation snapshot for missing titles and content.

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::read_json_input;
use crate::config::Config;
use crate::docs::validate_documentation;
use crate::types::{DocError, Result};

pub fn run(config: &Config, input_path: &Path, format: &str) -> Result<()> {
    let out = Output::new();
    let input = read_json_input(input_path)?;

    let validation = validate_documentation(&input, config.lang);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&validation)?);
    } else {
        if validation.valid {
            out.success(&validation.message);
        } else {
            out.error(&validation.message);
            for issue in &validation.issues {
                match issue.index {
                    Some(index) => out.detail(&format!("[{}] {}", index, issue.error)),
                    None => out.detail(&issue.error),
                }
            }
        }
    }

    if !validation.valid {
        return Err(DocError::Validation(validation.message));
    }
    Ok(())
}
