use std::io;

use anyhow::{anyhow, Result};
use bat::{PrettyPrinter, WrappingMode};
use cliclack::{spinner, ProgressBar};
use mdstream::target::RenderTarget;

/// Holds the latest markup while a spinner reports progress. The reply is
/// printed once the stream is done.
pub struct TerminalTarget {
    name: String,
    markup: String,
    spinner: ProgressBar,
}

impl TerminalTarget {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let spinner = spinner();
        spinner.start(format!("{}: searching relevant content...", name));
        Self {
            name,
            markup: String::new(),
            spinner,
        }
    }

    pub fn finish(&self) {
        self.spinner.stop(format!("{}: done", self.name));
    }

    pub fn fail(&self, reason: &str) {
        self.spinner.error(format!("{}: {}", self.name, reason));
    }
}

impl RenderTarget for TerminalTarget {
    fn replace(&mut self, markup: &str) -> io::Result<()> {
        self.markup.clear();
        self.markup.push_str(markup);
        self.spinner.set_message(format!(
            "{}: generating answer ({} bytes)",
            self.name,
            markup.len()
        ));
        Ok(())
    }

    fn content(&self) -> io::Result<String> {
        Ok(self.markup.clone())
    }
}

pub fn print_markup(markup: &str, theme: &str) -> Result<()> {
    PrettyPrinter::new()
        .input_from_bytes(markup.as_bytes())
        .theme(theme)
        .language("HTML")
        .wrapping_mode(WrappingMode::Character)
        .print()
        .map_err(|e| anyhow!("Failed to print reply: {}", e))?;
    println!();
    Ok(())
}
