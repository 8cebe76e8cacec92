//! Generate Command
//!
//! Renders documentation from a raw input snapshot.

use std::path::PathBuf;

use crate::cli::ui::Output;
use crate::cli::util::{read_json_input, write_or_print};
use crate::config::Config;
use crate::docs::{generate_docs_from_input, GenerateRequest, OutputFormat};
use crate::types::Result;

pub struct GenerateArgs {
    pub input: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub languages: Vec<String>,
}

pub fn run(config: &Config, args: GenerateArgs) -> Result<()> {
    let out = Output::new();
    let input = read_json_input(&args.input)?;

    let languages = if args.languages.is_empty() {
        config.languages.clone()
    } else {
        args.languages
    };

    let request = GenerateRequest {
        input,
        output_format: args.format,
        style: config.render_style(),
        lang: config.lang,
        languages,
    };

    let rendered = generate_docs_from_input(&request)?;
    write_or_print(&rendered.to_display_string(), args.output.as_deref())?;

    if let Some(target) = &args.output {
        out.success(&format!("Documentation written to {}", target.display()));
    }
    Ok(())
}
