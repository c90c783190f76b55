// src/core/prompt.rs

use dialoguer::{Input, theme::ColorfulTheme};
use std::io::{self, BufRead, IsTerminal};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors raised while reading an answer from the user.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] io::Error),
    #[error("User Interface Error: {0}")]
    Dialoguer(#[from] dialoguer::Error),
    #[error("The input reader stopped before producing a line.")]
    ReaderGone,
}

/// A source of one line of user input, bounded by a deadline.
pub trait Prompter {
    /// Returns `Ok(None)` when `timeout` elapses before a line arrives.
    fn read_line(&self, prompt: &str, timeout: Duration) -> Result<Option<String>, PromptError>;
}

/// Reads from the controlling terminal (or plain stdin when it is not one).
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn read_line(&self, prompt: &str, timeout: Duration) -> Result<Option<String>, PromptError> {
        let prompt = prompt.to_string();
        read_with_deadline(move || read_blocking(&prompt), timeout)
    }
}

/// Runs `reader` on a helper thread and waits at most `timeout` for its line.
///
/// When the deadline passes the thread is abandoned and whatever it reads
/// later is dropped.
pub fn read_with_deadline<F>(reader: F, timeout: Duration) -> Result<Option<String>, PromptError>
where
    F: FnOnce() -> Result<String, PromptError> + Send + 'static,
{
    let deadline = Instant::now() + timeout;
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        // The receiver is gone once the deadline has passed.
        let _ = tx.send(reader());
    });

    let remaining = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(remaining) {
        Ok(line) => line.map(Some),
        Err(RecvTimeoutError::Timeout) => {
            log::debug!("No input received within {:?}.", timeout);
            Ok(None)
        }
        Err(RecvTimeoutError::Disconnected) => Err(PromptError::ReaderGone),
    }
}

fn read_blocking(prompt: &str) -> Result<String, PromptError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        let answer: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(answer)
    } else {
        eprint!("{}: ", prompt);
        let mut line = String::new();
        stdin.lock().read_line(&mut line)?;
        Ok(line)
    }
}

/// A prompter with a canned answer, for code paths that must never block.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    answer: Option<String>,
}

#[cfg(test)]
impl ScriptedPrompter {
    /// Always answers `answer`.
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
        }
    }

    /// Behaves as if the deadline always passes.
    pub fn silent() -> Self {
        Self { answer: None }
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn read_line(&self, _prompt: &str, _timeout: Duration) -> Result<Option<String>, PromptError> {
        Ok(self.answer.clone())
    }
}
