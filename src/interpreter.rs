//! Tree-walking executor.
//!
//! The executor expands the words of each simple command against the
//! [`Environment`] and hands the result to the first [`CommandFactory`] that
//! recognises the command name: built-ins first, then programs found on
//! `PATH`. It keeps no state of its own between calls.

use crate::ast::{Node, SimpleCommand, Word};
use crate::command::{CommandFactory, ExitCode, Stdout};
use crate::config::Config;
use crate::env::{self, Environment};
use crate::error::{ExpansionError, ShellError, SpawnError};
use crate::lexer::WordPart;
use std::fmt;
use std::io;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: builtins and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The default set of commands:
/// - built-ins: `echo`, `cd`, `pwd`, `exit`
/// - external command launcher
pub fn default_commands() -> Vec<Box<dyn CommandFactory>> {
    use crate::builtin::*;
    use crate::external::ExternalCommand;
    vec![
        Box::new(Factory::<Echo>::default()),
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<Pwd>::default()),
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<ExternalCommand>::default()),
    ]
}

/// Expands parameter references in `word`. Unset parameters become empty
/// text; quoted parts are copied verbatim. One word always yields exactly one
/// string: there is no field splitting.
pub fn expand_word(word: &Word, env: &Environment) -> Result<String, ExpansionError> {
    expand_with(word, |name| env.lookup(name))
}

fn expand_with(
    word: &Word,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ExpansionError> {
    match word {
        Word::Literal(s) => Ok(s.clone()),
        Word::Compound(parts) => {
            let mut result = String::new();
            for part in parts {
                match part {
                    WordPart::Literal(text) | WordPart::Quoted(text) => result.push_str(text),
                    WordPart::Param(name) => {
                        if !env::is_parameter_name(name) {
                            return Err(ExpansionError::BadSubstitution(name.clone()));
                        }
                        if let Some(value) = lookup(name) {
                            result.push_str(&value);
                        }
                    }
                }
            }
            Ok(result)
        }
    }
}

/// A simple command after expansion.
struct Expanded {
    assignments: Vec<(String, String)>,
    argv: Vec<String>,
}

/// Words see the environment as it was before the command. Assignment values
/// are expanded left to right, each seeing the ones before it.
fn expand_command(cmd: &SimpleCommand, env: &Environment) -> Result<Expanded, ExpansionError> {
    let argv = cmd
        .words
        .iter()
        .map(|word| expand_word(word, env))
        .collect::<Result<Vec<_>, _>>()?;

    let mut assignments: Vec<(String, String)> = Vec::with_capacity(cmd.assignments.len());
    for assignment in &cmd.assignments {
        let value = expand_with(&assignment.value, |name| {
            assignments
                .iter()
                .rev()
                .find(|(assigned, _)| assigned == name)
                .map(|(_, value)| value.clone())
                .or_else(|| env.lookup(name))
        })?;
        assignments.push((assignment.name.clone(), value));
    }
    Ok(Expanded { assignments, argv })
}

pub struct Executor<'a> {
    config: &'a Config,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl<'a> Executor<'a> {
    /// An executor with the [`default_commands`].
    pub fn new(config: &'a Config) -> Self {
        Self::with_commands(config, default_commands())
    }

    /// Create an executor with a custom set of command factories, queried in order.
    pub fn with_commands(config: &'a Config, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { config, commands }
    }

    /// Runs `node` with standard output inherited from the shell.
    pub fn execute(&self, node: &Node, env: &mut Environment) -> ExitCode {
        self.execute_to(node, env, &mut io::stdout())
    }

    /// Runs `node`, sending command output to `stdout`, and returns the exit
    /// status of the last command run. Failures are reported on stderr and
    /// turned into statuses; nothing is propagated to the caller.
    pub fn execute_to(
        &self,
        node: &Node,
        env: &mut Environment,
        stdout: &mut dyn Stdout,
    ) -> ExitCode {
        match node {
            Node::Noop => 0,
            Node::Simple(cmd) => {
                let status = match self.execute_simple(cmd, env, stdout) {
                    Ok(status) => status,
                    Err(err) => {
                        self.report(&err);
                        err.status()
                    }
                };
                env.set_last_status(status);
                status
            }
            Node::Sequence(children) => {
                let mut status = 0;
                for child in children {
                    status = self.execute_to(child, env, stdout);
                    if env.should_exit() {
                        break;
                    }
                }
                status
            }
        }
    }

    fn execute_simple(
        &self,
        cmd: &SimpleCommand,
        env: &mut Environment,
        stdout: &mut dyn Stdout,
    ) -> Result<ExitCode, ShellError> {
        // Nothing is applied unless the whole command expands.
        let Expanded { assignments, argv } = expand_command(cmd, env)?;

        let Some((name, args)) = argv.split_first() else {
            for (name, value) in assignments {
                tracing::debug!(%name, %value, "assign");
                env.set_var(name, value);
            }
            return Ok(0);
        };

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        env.scoped_exports(assignments, |env| self.dispatch(name, &args, env, stdout))
    }

    fn dispatch(
        &self,
        name: &str,
        args: &[&str],
        env: &mut Environment,
        stdout: &mut dyn Stdout,
    ) -> Result<ExitCode, ShellError> {
        tracing::debug!(name, ?args, "dispatch");
        let command = self
            .commands
            .iter()
            .find_map(|factory| factory.try_create(env, name, args))
            .ok_or_else(|| SpawnError::NotFound(name.to_string()))?;
        Ok(command.execute(stdout, env)?)
    }

    fn report(&self, err: &dyn fmt::Display) {
        eprintln!("{}: {}", self.config.program_name, err);
    }
}
