use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdout};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process against the session [`Environment`].
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Builds the command from its raw arguments. The default parses them
    /// with argh; commands whose operands may look like flags override it.
    fn parse(name: &str, args: &[&str]) -> Result<Self, EarlyExit> {
        Self::from_args(&[name], args)
    }

    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Stdout, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Stdout,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let status = match <T as BuiltinCommand>::execute(*self, stdout, env) {
            Ok(x) => x,
            Err(e) => {
                eprintln!("{}: {:#}", T::name(), e);
                1
            }
        };
        // Keep ordering with output of programs spawned afterwards.
        stdout.flush()?;
        Ok(status)
    }
}

/// Stands in for a builtin whose arguments did not parse: prints help or
/// the usage error.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Stdout,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        if self.is_error {
            eprintln!("{}", self.output.trim_end());
            Ok(2)
        } else {
            stdout.write_all(self.output.as_bytes())?;
            stdout.flush()?;
            Ok(0)
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::parse(name, args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Stdout, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.to_string_lossy())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Stdout, env: &mut Environment) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match env.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => anyhow::bail!("HOME not set"),
            },
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("can't canonicalize {}", new_dir.display()))?;

        // Spawned programs inherit the process working directory.
        env::set_current_dir(&canonical)
            .with_context(|| format!("can't chdir to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Exit the shell.
/// Without an argument, the status of the last command is used.
pub struct Exit {
    #[argh(positional)]
    /// exit status, taken modulo 256.
    pub status: Option<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    /// A lone numeric operand is taken as is, so negative statuses are not
    /// mistaken for flags.
    fn parse(name: &str, args: &[&str]) -> Result<Self, EarlyExit> {
        match args {
            [status] if status.trim().parse::<i64>().is_ok() => Ok(Exit {
                status: Some(status.to_string()),
            }),
            _ => Self::from_args(&[name], args),
        }
    }

    fn execute(self, _stdout: &mut dyn Stdout, env: &mut Environment) -> Result<ExitCode> {
        let status = match &self.status {
            None => env.last_status(),
            Some(text) => match text.trim().parse::<i64>() {
                Ok(n) => n.rem_euclid(256) as ExitCode,
                Err(_) => {
                    eprintln!("exit: {}: numeric argument required", text);
                    2
                }
            },
        };
        env.request_exit(status);
        Ok(status)
    }
}

#[derive(FromArgs)]
/// Write the arguments to standard output, separated by spaces.
/// By default, a trailing newline is printed.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    /// Leading `-n` words (including `-nn...`) are the only options; every
    /// other word is printed, even if it starts with `-`.
    fn parse(_name: &str, args: &[&str]) -> Result<Self, EarlyExit> {
        let flags = args.iter().take_while(|arg| is_no_newline_flag(arg)).count();
        Ok(Echo {
            no_newline: flags > 0,
            args: args[flags..].iter().map(|arg| arg.to_string()).collect(),
        })
    }

    fn execute(self, stdout: &mut dyn Stdout, _env: &mut Environment) -> Result<ExitCode> {
        let s = self.args.join(" ");
        if self.no_newline {
            write!(stdout, "{}", s)?;
        } else {
            writeln!(stdout, "{}", s)?;
        }
        Ok(0)
    }
}

fn is_no_newline_flag(arg: &str) -> bool {
    arg.strip_prefix('-')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c == 'n'))
}
