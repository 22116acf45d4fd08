//! Session configuration built once from the command line.

use argh::{EarlyExit, FromArgs};
use std::iter;
use std::path::PathBuf;

/// History file written in interactive sessions, relative to the working directory.
pub const HISTORY_FILE: &str = ".minish_history";

#[derive(FromArgs, Debug)]
/// A small POSIX-style command interpreter.
/// Reads commands from a terminal, standard input, a script file or -c.
pub struct Cli {
    #[argh(option, short = 'c')]
    /// run COMMAND instead of a script or standard input
    pub command: Option<String>,

    #[argh(switch)]
    /// print the syntax tree of each command before running it
    pub ast_print: bool,

    #[argh(positional, greedy)]
    /// script followed by its arguments; with -c, the arguments only
    pub args: Vec<String>,
}

/// Where the session reads its commands from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Line-edited prompt on a terminal.
    Interactive,
    /// Everything available on a non-terminal stdin.
    Stdin,
    File(PathBuf),
    /// The `-c` string.
    Inline(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Invocation name; prefixes diagnostics.
    pub program_name: String,
    pub source: InputSource,
    /// Seeded as `$0`, `$1`, ...
    pub positional: Vec<String>,
    pub ast_print: bool,
    pub history_path: Option<PathBuf>,
}

impl Config {
    /// Parses the arguments following `program_name`.
    ///
    /// `stdin_is_terminal` decides between interactive and pipe mode when no
    /// script or `-c` string is given. Help and usage errors come back as
    /// [`EarlyExit`] for the caller to print.
    pub fn from_args(
        program_name: &str,
        args: &[&str],
        stdin_is_terminal: bool,
    ) -> Result<Self, EarlyExit> {
        let cli = Cli::from_args(&[program_name], args)?;
        Ok(Self::from_cli(program_name, cli, stdin_is_terminal))
    }

    pub fn from_cli(program_name: &str, cli: Cli, stdin_is_terminal: bool) -> Self {
        let (source, positional) = match cli.command {
            Some(text) => (
                InputSource::Inline(text),
                iter::once(program_name.to_string()).chain(cli.args).collect(),
            ),
            None => match cli.args.first() {
                Some(script) => (InputSource::File(PathBuf::from(script)), cli.args),
                None if stdin_is_terminal => {
                    (InputSource::Interactive, vec![program_name.to_string()])
                }
                None => (InputSource::Stdin, vec![program_name.to_string()]),
            },
        };
        let history_path =
            matches!(source, InputSource::Interactive).then(|| PathBuf::from(HISTORY_FILE));
        Self {
            program_name: program_name.to_string(),
            source,
            positional,
            ast_print: cli.ast_print,
            history_path,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            program_name: "minish".to_string(),
            source: InputSource::Stdin,
            positional: vec!["minish".to_string()],
            ast_print: false,
            history_path: None,
        }
    }
}
