//! Styled terminal output for the gendoc commands.

use console::style;

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    /// Indented follow-up line under a success/error/warning message.
    pub fn detail(&self, message: &str) {
        println!("  {}", style(message).dim());
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
