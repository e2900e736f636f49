//! Collector for everything the pipeline reports.
//!
//! Each stage hands its errors to a [`Diagnostics`] value owned by the caller,
//! which then decides what to print and which exit code to use.

use log::debug;

use crate::error::LoxError;

#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<LoxError>,
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error and raise the matching flag.
    pub fn report(&mut self, error: LoxError) {
        debug!("Reporting diagnostic: {}", error);

        if error.is_static() {
            self.had_error = true;
        } else {
            self.had_runtime_error = true;
        }

        self.errors.push(error);
    }

    pub fn extend<I: IntoIterator<Item = LoxError>>(&mut self, errors: I) {
        for error in errors {
            self.report(error);
        }
    }

    /// A lexical, syntax or resolution error occurred.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    /// Hand the collected errors to the caller and clear the list; the flags
    /// stay raised until [`reset`](Self::reset).
    pub fn drain(&mut self) -> Vec<LoxError> {
        std::mem::take(&mut self.errors)
    }

    /// Forget everything, e.g. between two REPL lines.
    pub fn reset(&mut self) {
        self.errors.clear();
        self.had_error = false;
        self.had_runtime_error = false;
    }
}
