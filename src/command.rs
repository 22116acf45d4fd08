use crate::env::Environment;
use anyhow::Result;
use std::io::{self, Write};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Where a command's standard output goes.
///
/// Built-ins write to it directly. For external programs, a sink that
/// [`inherits`](Stdout::inherits) hands the shell's own stdout to the child;
/// any other sink receives the child's output through a pipe.
pub trait Stdout: Write {
    fn inherits(&self) -> bool {
        false
    }
}

impl Stdout for io::Stdout {
    fn inherits(&self) -> bool {
        true
    }
}

impl Stdout for Vec<u8> {}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    fn execute(self: Box<Self>, stdout: &mut dyn Stdout, env: &mut Environment)
    -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
/// Implementations can use the environment to resolve executables (e.g., using PATH).
pub trait CommandFactory {
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
