use crate::ast::{Assignment, Node, SimpleCommand, Word};
use crate::error::SyntaxError;
use crate::lexer::{Operator, Token, TokenKind, WordPart};
use regex::Regex;
use std::iter::Peekable;
use std::sync::LazyLock;
use std::vec;

static ASSIGNMENT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*=").expect("assignment pattern is valid")
});

/// Recursive-descent builder over a token sequence. Tokens are moved out as
/// they are consumed, so each one is used at most once.
struct AstBuilder {
    tokens: Peekable<vec::IntoIter<Token>>,
}

impl AstBuilder {
    fn from(tokens: Vec<Token>) -> Self {
        AstBuilder {
            tokens: tokens.into_iter().peekable(),
        }
    }

    /// line := sep* (command (sep+ command)*)? sep* END
    fn build_ast(mut self) -> Result<Node, SyntaxError> {
        let mut commands = Vec::new();

        loop {
            match self.peek_kind() {
                None | Some(TokenKind::EndOfInput) => break,
                Some(TokenKind::Operator(Operator::Newline)) => {
                    self.consume();
                }
                Some(TokenKind::Word(_)) => {
                    commands.push(Node::Simple(self.parse_command()));
                    match self.peek_kind() {
                        None | Some(TokenKind::EndOfInput) => break,
                        Some(TokenKind::Operator(op)) if op.is_terminator() => {
                            self.consume();
                        }
                        _ => return Err(self.unexpected()),
                    }
                }
                Some(TokenKind::Operator(_)) => return Err(self.unexpected()),
            }
        }

        // Nothing may follow the end-of-input marker.
        self.consume();
        if self.peek_kind().is_some() {
            return Err(self.unexpected());
        }

        Ok(match commands.len() {
            0 => Node::Noop,
            1 => commands.remove(0),
            _ => Node::Sequence(commands),
        })
    }

    fn peek_kind(&mut self) -> Option<&TokenKind> {
        self.tokens.peek().map(|token| &token.kind)
    }

    fn consume(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    /// Consumes the next token and reports it as unexpected.
    fn unexpected(&mut self) -> SyntaxError {
        match self.consume() {
            Some(token) => SyntaxError::UnexpectedToken {
                token: token.to_string(),
                pos: token.pos,
            },
            None => SyntaxError::UnexpectedToken {
                token: "end of input".to_string(),
                pos: 0,
            },
        }
    }

    /// command := assignment* word*
    fn parse_command(&mut self) -> SimpleCommand {
        let mut command = SimpleCommand::default();

        while let Some(TokenKind::Word(_)) = self.peek_kind() {
            let Some(Token {
                kind: TokenKind::Word(parts),
                ..
            }) = self.consume()
            else {
                break;
            };

            // Assignments are only recognised before the command name.
            let parts = if command.words.is_empty() {
                match Self::split_assignment(parts) {
                    Ok(assignment) => {
                        command.assignments.push(assignment);
                        continue;
                    }
                    Err(parts) => parts,
                }
            } else {
                parts
            };
            command.words.push(Word::from_parts(parts));
        }

        command
    }

    /// Splits `NAME=value` into an assignment. The name must be unquoted, so
    /// `'x'=1` stays an ordinary word. Gives the parts back on mismatch.
    fn split_assignment(parts: Vec<WordPart>) -> Result<Assignment, Vec<WordPart>> {
        let head = match parts.first() {
            Some(WordPart::Literal(text)) if ASSIGNMENT_PREFIX.is_match(text) => text.clone(),
            _ => return Err(parts),
        };
        let Some((name, value_head)) = head.split_once('=') else {
            return Err(parts);
        };

        let mut value = Vec::with_capacity(parts.len());
        if !value_head.is_empty() {
            value.push(WordPart::Literal(value_head.to_string()));
        }
        value.extend(parts.into_iter().skip(1));

        Ok(Assignment {
            name: name.to_string(),
            value: Word::from_parts(value),
        })
    }
}

/// Builds the tree for one logical command line.
///
/// Empty input gives [`Node::Noop`]. There is no error recovery: the first
/// unexpected token aborts the parse.
pub fn parse(tokens: Vec<Token>) -> Result<Node, SyntaxError> {
    AstBuilder::from(tokens).build_ast()
}
