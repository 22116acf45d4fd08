//! Session loop: one lex, parse and execute cycle per logical command.

use crate::ast;
use crate::command::{ExitCode, Stdout};
use crate::config::{Config, InputSource};
use crate::env::Environment;
use crate::error::ShellError;
use crate::history::History;
use crate::input::CharStream;
use crate::interpreter::Executor;
use crate::lexer;
use crate::parser;
use crate::signals;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fmt;
use std::io;

pub const PROMPT: &str = "minish$ ";
/// Shown while a quote or a trailing backslash carries a command onto more lines.
pub const CONTINUATION_PROMPT: &str = "> ";

/// What a non-interactive loop does after a lex or syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnError {
    Continue,
    Abort,
}

/// An interpreter session.
///
/// Owns the [`Environment`], which lives for the whole session, and the
/// sink command output is written to.
pub struct Shell<'a, W: Stdout = io::Stdout> {
    config: &'a Config,
    env: Environment,
    executor: Executor<'a>,
    history: Option<History>,
    out: W,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config) -> Result<Self, ShellError> {
        Self::with_output(config, io::stdout())
    }
}

impl<'a, W: Stdout> Shell<'a, W> {
    pub fn with_output(config: &'a Config, out: W) -> Result<Self, ShellError> {
        let mut env = Environment::new();
        env.seed_positional(config.positional.clone())?;
        Ok(Self {
            config,
            env,
            executor: Executor::new(config),
            history: config.history_path.clone().map(History::new),
            out,
        })
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Reads the configured source to its end and returns the status the
    /// process should exit with.
    pub fn run(&mut self) -> ExitCode {
        if let Err(err) = signals::install() {
            tracing::warn!(error = %err, "cannot install SIGINT handler");
        }
        let config = self.config;
        match &config.source {
            InputSource::Interactive => self.run_interactive(),
            InputSource::Stdin => match CharStream::from_reader(io::stdin().lock()) {
                Ok(stream) => self.run_stream(stream, OnError::Continue),
                Err(err) => {
                    self.report(&format_args!("cannot read standard input: {err}"));
                    1
                }
            },
            InputSource::File(path) => match CharStream::open(path) {
                Ok(stream) => self.run_stream(stream, OnError::Abort),
                Err(err) => {
                    self.report(&format_args!("{}: {err}", path.display()));
                    if err.kind() == io::ErrorKind::NotFound {
                        127
                    } else {
                        1
                    }
                }
            },
            InputSource::Inline(text) => self.run_stream(CharStream::new(text), OnError::Abort),
        }
    }

    /// Runs one logical command, which may span several lines. On a lex or
    /// syntax error nothing is executed and the environment is left as it was.
    pub fn run_line(&mut self, line: &str) -> Result<ExitCode, ShellError> {
        let tokens = lexer::tokenize(line)?;
        tracing::debug!(?tokens, "lexed");
        let node = parser::parse(tokens)?;
        tracing::debug!(?node, "parsed");
        if self.config.ast_print {
            ast::print_tree(&node, &mut self.out)?;
        }
        Ok(self.executor.execute_to(&node, &mut self.env, &mut self.out))
    }

    fn run_stream(&mut self, mut stream: CharStream, on_error: OnError) -> ExitCode {
        while let Some(text) = next_command(&mut stream) {
            let result = self.run_line(&text);
            self.report_interrupt();
            if let Err(err) = result {
                self.report(&err);
                if on_error == OnError::Abort {
                    return err.status();
                }
            }
            if self.env.should_exit() {
                return self.env.last_status();
            }
        }
        0
    }

    fn run_interactive(&mut self) -> ExitCode {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(err) => {
                self.report(&format_args!("cannot start line editor: {err}"));
                return 1;
            }
        };

        loop {
            match read_command(&mut rl) {
                Ok(text) => {
                    let _ = rl.add_history_entry(text.as_str());
                    self.record(&text);
                    let result = self.run_line(&text);
                    self.report_interrupt();
                    if let Err(err) = result {
                        self.report(&err);
                    }
                    if self.env.should_exit() {
                        return self.env.last_status();
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    return 0;
                }
                Err(err) => {
                    self.report(&format_args!("read error: {err}"));
                    return 1;
                }
            }
        }
    }

    fn report_interrupt(&self) {
        if signals::take_interrupt() {
            tracing::info!("interrupted");
            self.report(&"received SIGINT");
        }
    }

    /// History failures never stop the session.
    fn record(&self, line: &str) {
        let Some(history) = &self.history else {
            return;
        };
        if let Err(err) = history.append(line) {
            tracing::warn!(path = %history.path().display(), error = %err, "history write failed");
            self.report(&format_args!("{}: {err}", history.path().display()));
        }
    }

    fn report(&self, err: &dyn fmt::Display) {
        eprintln!("{}: {}", self.config.program_name, err);
    }
}

/// Reads one logical command from `stream`: a line plus every line it
/// continues onto.
fn next_command(stream: &mut CharStream) -> Option<String> {
    let mut text = stream.next_line()?;
    while lexer::is_incomplete(&text) {
        let Some(line) = stream.next_line() else {
            break;
        };
        text.push('\n');
        text.push_str(&line);
    }
    Some(text)
}

/// Interactive counterpart of [`next_command`]. End of input in the middle
/// of a command hands over what was read so far.
fn read_command(rl: &mut DefaultEditor) -> Result<String, ReadlineError> {
    let mut text = rl.readline(PROMPT)?;
    while lexer::is_incomplete(&text) {
        match rl.readline(CONTINUATION_PROMPT) {
            Ok(line) => {
                text.push('\n');
                text.push_str(&line);
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }
    Ok(text)
}
