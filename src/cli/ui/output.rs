//! Console messages for humans. Everything here goes to stderr; stdout is
//! reserved for result records.

use console::style;

use crate::pipeline::BatchSummary;

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        eprintln!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        eprintln!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        eprintln!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        eprintln!("\n{}", style(message).bold());
        eprintln!("{}", "─".repeat(40));
    }

    /// One-line run summary
    pub fn summary(&self, summary: &BatchSummary) {
        let line = format!(
            "{} documents: {} finalized, {} resolved, {} failed",
            summary.total, summary.finalized, summary.resolved, summary.failed
        );
        if summary.failed > 0 {
            self.warning(&line);
        } else {
            self.success(&line);
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
