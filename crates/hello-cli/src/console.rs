//! Line-oriented terminal I/O behind a trait so flows can be scripted

use std::collections::VecDeque;
use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::error::{CliError, Result};

#[async_trait]
pub trait Console: Send {
    /// Show `prompt` and read one line without its terminator
    async fn question(&mut self, prompt: &str) -> Result<String>;

    /// Write `text` followed by a newline
    fn println(&mut self, text: &str);
}

/// Console on the process's stdin and stdout
pub struct StdinConsole {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinConsole {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for StdinConsole {
    async fn question(&mut self, prompt: &str) -> Result<String> {
        let mut stdout = std::io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;
        self.lines.next_line().await?.ok_or(CliError::InputClosed)
    }

    fn println(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Console fed from a list of answers, recording everything shown
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    transcript: String,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: String::new(),
        }
    }

    /// Prompts, answers and output so far
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn remaining_answers(&self) -> usize {
        self.answers.len()
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn question(&mut self, prompt: &str) -> Result<String> {
        self.transcript.push_str(prompt);
        let answer = self.answers.pop_front().ok_or(CliError::InputClosed)?;
        self.transcript.push_str(&answer);
        self.transcript.push('\n');
        Ok(answer)
    }

    fn println(&mut self, text: &str) {
        self.transcript.push_str(text);
        self.transcript.push('\n');
    }
}
