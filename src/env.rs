use crate::command::ExitCode;
use crate::error::ShellError;
use regex::Regex;
use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;
use std::sync::LazyLock;

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("name pattern is valid"));

/// Whether `name` can appear in a `${...}` reference: a variable name, a
/// positional index or one of the special parameters.
pub fn is_parameter_name(name: &str) -> bool {
    NAME.is_match(name)
        || (!name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()))
        || matches!(name, "?" | "#" | "@" | "*" | "$")
}

/// Mutable state of one interpreter session.
///
/// The environment contains:
/// - shell variables, looked up before the process environment;
/// - positional parameters (`$0` is the invocation name), installed once;
/// - the status of the last command and whether `exit` was requested;
/// - the working directory for command execution;
/// - the assignments exported to the command currently being run.
///
/// It is owned by a single session and dropped when that session ends.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: HashMap<String, String>,
    positional: Vec<String>,
    seeded: bool,
    exports: Vec<(String, String)>,
    last_status: ExitCode,
    should_exit: bool,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// An environment with no shell variables and no positional parameters.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars: HashMap::new(),
            positional: Vec::new(),
            seeded: false,
            exports: Vec::new(),
            last_status: 0,
            should_exit: false,
            current_dir,
        }
    }

    /// Installs the positional parameters. Only the first call succeeds; later
    /// calls leave the existing parameters untouched.
    pub fn seed_positional(&mut self, args: Vec<String>) -> Result<(), ShellError> {
        if self.seeded {
            return Err(ShellError::PositionalAlreadySeeded);
        }
        self.positional = args;
        self.seeded = true;
        Ok(())
    }

    /// Get the value of a variable.
    ///
    /// Looks up the key in the shell variables first, falling back to
    /// `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override a shell variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Resolves a parameter reference: special parameters, positional
    /// parameters, then variables. `None` means unset.
    pub fn lookup(&self, name: &str) -> Option<String> {
        match name {
            "?" => Some(self.last_status.to_string()),
            "#" => Some(self.positional.len().saturating_sub(1).to_string()),
            "@" | "*" => Some(self.positional.get(1..).unwrap_or_default().join(" ")),
            "$" => Some(std::process::id().to_string()),
            _ if name.bytes().all(|b| b.is_ascii_digit()) => name
                .parse::<usize>()
                .ok()
                .and_then(|index| self.positional.get(index).cloned()),
            _ => self.get_var(name),
        }
    }

    pub fn last_status(&self) -> ExitCode {
        self.last_status
    }

    pub fn set_last_status(&mut self, status: ExitCode) {
        self.last_status = status;
    }

    /// Marks the session as finished with `status`.
    pub fn request_exit(&mut self, status: ExitCode) {
        self.last_status = status;
        self.should_exit = true;
    }

    /// Set by `exit`; a session loop checks it after every command.
    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    /// Assignments exported to the command being run.
    pub fn exports(&self) -> &[(String, String)] {
        &self.exports
    }

    /// Runs `f` with `exports` handed to any program it spawns, restoring the
    /// previous exports afterwards.
    pub fn scoped_exports<R>(
        &mut self,
        exports: Vec<(String, String)>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let previous = std::mem::replace(&mut self.exports, exports);
        let result = f(self);
        self.exports = previous;
        result
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
