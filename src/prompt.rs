//! Interactive prompt capability.
//!
//! The two blocking prompts (profile picker, yes/no questions) sit behind this
//! trait so the flag manager and interactive `select` stay testable with a
//! scripted implementation instead of a terminal.

use anyhow::{Context, Result};
use inquire::{Confirm, InquireError, Select};

pub trait Prompt {
    /// Pick one option from a numbered list. `Ok(None)` means the user
    /// cancelled, which is not an error.
    fn pick(&self, title: &str, options: &[String]) -> Result<Option<usize>>;

    /// Ask a yes/no question with a default answer.
    fn confirm(&self, question: &str, default: bool) -> Result<bool>;
}

/// Terminal prompts via inquire.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn pick(&self, title: &str, options: &[String]) -> Result<Option<usize>> {
        let numbered: Vec<String> = options
            .iter()
            .enumerate()
            .map(|(i, opt)| format!("{}. {}", i + 1, opt))
            .collect();

        match Select::new(title, numbered.clone())
            .with_help_message("Enter to confirm, Esc to cancel")
            .prompt()
        {
            Ok(choice) => Ok(numbered.iter().position(|o| *o == choice)),
            Err(InquireError::OperationCanceled) => Ok(None),
            Err(e) => Err(e).context("Selection prompt failed"),
        }
    }

    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        Confirm::new(question)
            .with_default(default)
            .prompt()
            .context("Confirmation cancelled")
    }
}
