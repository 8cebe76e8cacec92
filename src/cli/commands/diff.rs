//! Diff Command
//!
//! Compares two documentation snapshots and renders the changes.

use std::path::PathBuf;

use crate::cli::ui::Output;
use crate::cli::util::{read_json_input, write_or_print};
use crate::config::Config;
use crate::docs::{generate_docs_from_diff, DiffRequest, OutputFormat};
use crate::types::Result;

pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

pub fn run(config: &Config, args: DiffArgs) -> Result<()> {
    let out = Output::new();
    let old = read_json_input(&args.old)?;
    let new = read_json_input(&args.new)?;

    let request = DiffRequest {
        old,
        new,
        output_format: args.format,
        lang: config.lang,
    };

    let rendered = generate_docs_from_diff(&request)?;
    write_or_print(&rendered.to_display_string(), args.output.as_deref())?;

    if let Some(target) = &args.output {
        out.success(&format!("Diff written to {}", target.display()));
    }
    Ok(())
}
