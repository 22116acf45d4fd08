//! Syntax tree produced by the parser.
//!
//! Every node owns its children through plain `Vec`s, so a tree is always a
//! tree: dropping the root drops everything below it and nothing outside can
//! hold on to an inner node.

use crate::lexer::WordPart;
use std::fmt;
use std::io::{self, Write};

/// A shell word, either a simple literal or a compound (with quoting or
/// parameter references).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Word {
    Literal(String),
    Compound(Vec<WordPart>),
}

impl Word {
    /// Collapses a single unquoted literal into [`Word::Literal`].
    pub fn from_parts(mut parts: Vec<WordPart>) -> Self {
        if parts.len() == 1 {
            if let WordPart::Literal(_) = &parts[0] {
                if let Some(WordPart::Literal(text)) = parts.pop() {
                    return Word::Literal(text);
                }
            }
        }
        Word::Compound(parts)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Word::Literal(text) => f.write_str(text),
            Word::Compound(parts) => parts.iter().try_for_each(|part| write!(f, "{part}")),
        }
    }
}

/// `name=value` at the start of a simple command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub value: Word,
}

/// Assignments followed by the command name and its arguments. Either list
/// may be empty, but not both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimpleCommand {
    pub assignments: Vec<Assignment>,
    /// `words[0]` is the command name.
    pub words: Vec<Word>,
}

/// AST node. New constructs (pipelines, redirections, compound commands)
/// are added as further variants.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Node {
    /// Blank or comment-only input.
    Noop,
    Simple(SimpleCommand),
    /// Commands separated by `;` or newlines, run in order.
    Sequence(Vec<Node>),
}

/// Writes an indented dump of `node` for debugging.
pub fn print_tree(node: &Node, out: &mut dyn Write) -> io::Result<()> {
    print_node(node, 0, out)
}

fn print_node(node: &Node, depth: usize, out: &mut dyn Write) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    match node {
        Node::Noop => writeln!(out, "{indent}noop"),
        Node::Simple(cmd) => {
            writeln!(out, "{indent}simple command")?;
            for assignment in &cmd.assignments {
                writeln!(out, "{indent}  assign {}={}", assignment.name, assignment.value)?;
            }
            for (i, word) in cmd.words.iter().enumerate() {
                writeln!(out, "{indent}  argv[{i}] {word}")?;
            }
            Ok(())
        }
        Node::Sequence(children) => {
            writeln!(out, "{indent}sequence")?;
            children
                .iter()
                .try_for_each(|child| print_node(child, depth + 1, out))
        }
    }
}
