// SPDX-License-Identifier: GPL-3.0-only

//! Operator interaction
//!
//! The controller never touches stdin directly. Questions, notices and the
//! stop token all go through [`Operator`], so sessions can run against a
//! console or a scripted list of answers.

use crate::constants::timing::POLL_INTERVAL_MS;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One unit of operator input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Input stream ended
    Closed,
    /// External termination request arrived while waiting
    Interrupted,
}

pub trait Operator {
    /// Show an informational message
    fn notice(&mut self, message: &str);

    /// Ask a question and block for the answer
    fn prompt(&mut self, question: &str) -> Input;

    /// Wait up to `wait` for a line typed without a prompt
    fn poll_line(&mut self, wait: Duration) -> Option<Input>;
}

/// Operator on the terminal
///
/// Stdin is read on a helper thread so waits can observe the cancel flag.
pub struct ConsoleOperator {
    lines: Receiver<String>,
    cancel: Arc<AtomicBool>,
    closed: bool,
}

impl ConsoleOperator {
    pub fn new(cancel: Arc<AtomicBool>) -> Self {
        let (sender, lines) = mpsc::channel();
        let reader = std::thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if sender.send(line).is_err() {
                        break;
                    }
                }
                debug!("Stdin closed");
            });
        if let Err(e) = reader {
            warn!(error = %e, "Failed to start stdin reader, input is closed");
        }

        Self {
            lines,
            cancel,
            closed: false,
        }
    }

    fn receive(&mut self, deadline: Option<Instant>) -> Option<Input> {
        let poll = Duration::from_millis(POLL_INTERVAL_MS);
        loop {
            if self.cancel.load(Ordering::SeqCst) {
                return Some(Input::Interrupted);
            }
            if self.closed {
                return Some(Input::Closed);
            }

            let step = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    poll.min(deadline - now)
                }
                None => poll,
            };

            match self.lines.recv_timeout(step) {
                Ok(line) => return Some(Input::Line(line)),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => self.closed = true,
            }
        }
    }
}

impl Operator for ConsoleOperator {
    fn notice(&mut self, message: &str) {
        println!("{}", message);
    }

    fn prompt(&mut self, question: &str) -> Input {
        print!("{} ", question);
        let _ = std::io::stdout().flush();
        self.receive(None).unwrap_or(Input::Closed)
    }

    fn poll_line(&mut self, wait: Duration) -> Option<Input> {
        match self.receive(Some(Instant::now() + wait)) {
            // A closed stdin is not news on every poll
            Some(Input::Closed) => {
                std::thread::sleep(wait);
                None
            }
            other => other,
        }
    }
}

/// Operator that answers from a fixed list
///
/// Unanswered prompts read as a closed input, which every question treats
/// as its default. Used for unattended runs and tests.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: VecDeque<String>,
    echo: bool,
    pub notices: Vec<String>,
    pub prompts: Vec<String>,
}

impl ScriptedOperator {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Accept every default and print notices to the terminal
    pub fn unattended() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }
}

impl Operator for ScriptedOperator {
    fn notice(&mut self, message: &str) {
        if self.echo {
            println!("{}", message);
        }
        self.notices.push(message.to_string());
    }

    fn prompt(&mut self, question: &str) -> Input {
        self.prompts.push(question.to_string());
        match self.answers.pop_front() {
            Some(answer) => Input::Line(answer),
            None => Input::Closed,
        }
    }

    fn poll_line(&mut self, wait: Duration) -> Option<Input> {
        match self.answers.pop_front() {
            Some(line) => Some(Input::Line(line)),
            None => {
                std::thread::sleep(wait);
                None
            }
        }
    }
}
