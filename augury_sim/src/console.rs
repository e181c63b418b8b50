//! Line-oriented console prompts.
//!
//! Generic over reader and writer so sessions can be driven from a script.

use std::io::{self, BufRead, Write};

use augury_core::Scenario;

use crate::scenarios::ScenarioDraft;

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    /// Console on the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Writes a line.
    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()
    }

    /// Prints `message` and reads one trimmed line. End of input reads as empty.
    pub fn ask(&mut self, message: &str) -> io::Result<String> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// Asks until the answer parses as a positive integer.
    pub fn ask_turns(&mut self, message: &str) -> io::Result<usize> {
        loop {
            let answer = self.ask(message)?;
            match answer.parse::<usize>() {
                Ok(n) if n > 0 => return Ok(n),
                _ if answer.is_empty() && self.at_eof()? => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "input closed while reading turn count",
                    ))
                }
                _ => self.say("Please enter a positive whole number.")?,
            }
        }
    }

    /// Blocks until Enter.
    pub fn pause(&mut self, message: &str) -> io::Result<()> {
        self.ask(message).map(|_| ())
    }

    fn at_eof(&mut self) -> io::Result<bool> {
        Ok(self.input.fill_buf()?.is_empty())
    }

    /// Prompts for whatever the draft is missing.
    pub fn complete(&mut self, draft: ScenarioDraft) -> io::Result<Scenario> {
        let situation = match draft.situation {
            Some(s) => s,
            None => self.ask("\nEnter the scenario description: ")?,
        };
        let turns = match draft.turns {
            Some(t) => t,
            None => self.ask_turns("Enter number of turns to simulate: ")?,
        };
        let question = match draft.question {
            Some(q) => q,
            None => self.ask("Enter the question to answer at the end: ")?,
        };
        Ok(Scenario::new(situation, question, turns))
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}
