//! A small POSIX-style command interpreter.
//!
//! Source text goes through [`lexer::tokenize`] and [`parser::parse`] into an
//! [`ast::Node`], which the [`Executor`] runs against an [`env::Environment`].
//! [`Shell`] drives that cycle for each line of input, whichever the input
//! source selected by [`Config`].
//!
//! The modules [`command`] and [`env`] expose the traits and types needed to
//! plug custom commands into an [`Executor`].

pub mod ast;
mod builtin;
pub mod command;
pub mod config;
pub mod driver;
pub mod env;
pub mod error;
mod external;
pub mod history;
pub mod input;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod signals;

pub use config::Config;
pub use driver::Shell;
pub use interpreter::Executor;
