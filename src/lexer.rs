//! Lexical analysis (tokenization) of shell source text.
//!
//! The lexer is a small finite state machine over the characters of one
//! chunk of input. It never fails halfway: it either returns the complete
//! token sequence, always ending with [`TokenKind::EndOfInput`], or a
//! [`LexError`] pointing at the quote that was never closed.
//!
//! Control characters other than blanks and newline have no special meaning
//! and are passed through as literal text.

use crate::error::LexError;
use std::fmt;

/// A part of a word. Adjacent quoted and unquoted segments with no blank in
/// between form a single word made of several parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPart {
    /// Unquoted text.
    Literal(String),
    /// Text from a `'...'` or `"..."` region, or a backslash-escaped
    /// character. Taken verbatim at expansion time.
    Quoted(String),
    /// A parameter reference: `$name`, `${name}`, `$1`, `$?` and so on.
    /// Holds the name without the `$` and braces.
    Param(String),
}

impl fmt::Display for WordPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordPart::Literal(text) => write!(f, "{text}"),
            WordPart::Quoted(text) => write!(f, "'{text}'"),
            WordPart::Param(name) => write!(f, "${{{name}}}"),
        }
    }
}

/// Control operators. Only `;` and newline have meaning to the parser; the
/// rest are recognised so they can be rejected with a precise error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Semicolon,
    Newline,
    Pipe,
    OrIf,
    Amp,
    AndIf,
    Less,
    Great,
    DGreat,
    LParen,
    RParen,
}

impl Operator {
    fn starts_with(ch: char) -> bool {
        matches!(ch, ';' | '\n' | '|' | '&' | '<' | '>' | '(' | ')')
    }

    /// Longest operator starting with `ch`, with its width in characters.
    fn scan(ch: char, next: Option<char>) -> Option<(Operator, usize)> {
        let op = match (ch, next) {
            ('|', Some('|')) => return Some((Operator::OrIf, 2)),
            ('&', Some('&')) => return Some((Operator::AndIf, 2)),
            ('>', Some('>')) => return Some((Operator::DGreat, 2)),
            (';', _) => Operator::Semicolon,
            ('\n', _) => Operator::Newline,
            ('|', _) => Operator::Pipe,
            ('&', _) => Operator::Amp,
            ('<', _) => Operator::Less,
            ('>', _) => Operator::Great,
            ('(', _) => Operator::LParen,
            (')', _) => Operator::RParen,
            _ => return None,
        };
        Some((op, 1))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Semicolon => ";",
            Operator::Newline => "\n",
            Operator::Pipe => "|",
            Operator::OrIf => "||",
            Operator::Amp => "&",
            Operator::AndIf => "&&",
            Operator::Less => "<",
            Operator::Great => ">",
            Operator::DGreat => ">>",
            Operator::LParen => "(",
            Operator::RParen => ")",
        }
    }

    /// Whether this operator ends a command.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Operator::Semicolon | Operator::Newline)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Newline => f.write_str("newline"),
            op => f.write_str(op.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Word(Vec<WordPart>),
    Operator(Operator),
    EndOfInput,
}

/// A classified lexical unit together with the source text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text exactly as written, quotes included.
    pub raw: String,
    /// Character offset of the first character of the token.
    pub pos: usize,
}

impl Token {
    pub fn new(kind: TokenKind, raw: impl Into<String>, pos: usize) -> Self {
        Self {
            kind,
            raw: raw.into(),
            pos,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Word(_) => f.write_str(&self.raw),
            TokenKind::Operator(op) => write!(f, "{op}"),
            TokenKind::EndOfInput => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    current_word: Vec<WordPart>,
    buffer: String,
    word_start: usize,
    quote_start: usize,
    // Number of parts the current word had when the open quote was read.
    quote_mark: usize,
    // Input ended on an unquoted backslash.
    dangling_escape: bool,
    out: Vec<Token>,
}

impl LexingFSM {
    fn new(text: &str) -> Self {
        LexingFSM {
            input: text.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            current_word: Vec::new(),
            buffer: String::new(),
            word_start: 0,
            quote_start: 0,
            quote_mark: 0,
            dangling_escape: false,
            out: Vec::new(),
        }
    }

    fn make_tokens(mut self) -> Result<Vec<Token>, LexError> {
        self.scan()?;
        if self.state == LexingState::ReadingWord {
            self.finish_word(self.pos);
        }

        // Trailing newlines end the stream rather than separate commands.
        while matches!(
            self.out.last(),
            Some(Token {
                kind: TokenKind::Operator(Operator::Newline),
                ..
            })
        ) {
            self.out.pop();
        }
        self.out
            .push(Token::new(TokenKind::EndOfInput, "", self.input.len()));
        Ok(self.out)
    }

    /// Runs the machine over the whole input, failing if it stops inside a quote.
    fn scan(&mut self) -> Result<(), LexError> {
        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch)?,
                LexingState::ReadingWord => self.handle_word(ch)?,
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch)?,
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote => {
                return Err(LexError::UnterminatedSingleQuote(self.quote_start));
            }
            LexingState::ReadingDoubleQuote => {
                return Err(LexError::UnterminatedDoubleQuote(self.quote_start));
            }
            LexingState::ReadingWord | LexingState::Start => {}
        }
        Ok(())
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn handle_start(&mut self, ch: char) -> Result<(), LexError> {
        let at = self.pos - 1;
        match ch {
            ' ' | '\t' | '\r' => {}
            '#' => self.skip_comment(),
            '\\' if self.peek_char() == Some('\n') => {
                self.read_char();
            }
            c if Operator::starts_with(c) => self.read_operator(c, at),
            c => {
                self.word_start = at;
                self.state = LexingState::ReadingWord;
                self.handle_word(c)?;
            }
        }
        Ok(())
    }

    fn handle_word(&mut self, ch: char) -> Result<(), LexError> {
        let at = self.pos - 1;
        match ch {
            ' ' | '\t' | '\r' => {
                self.finish_word(at);
                self.state = LexingState::Start;
            }
            c if Operator::starts_with(c) => {
                self.finish_word(at);
                self.state = LexingState::Start;
                self.read_operator(c, at);
            }
            '\'' => self.open_quote(at, LexingState::ReadingSingleQuote),
            '"' => self.open_quote(at, LexingState::ReadingDoubleQuote),
            '\\' => match self.read_char() {
                Some('\n') => {}
                Some(c) => {
                    self.flush_buffer(false);
                    self.current_word.push(WordPart::Quoted(c.to_string()));
                }
                None => {
                    self.dangling_escape = true;
                    self.buffer.push('\\');
                }
            },
            '$' => self.handle_dollar(at, false)?,
            c => self.buffer.push(c),
        }
        Ok(())
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.close_quote(),
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) -> Result<(), LexError> {
        let at = self.pos - 1;
        match ch {
            '"' => self.close_quote(),
            '\\' => match self.peek_char() {
                Some(c @ ('$' | '"' | '\\' | '`')) => {
                    self.read_char();
                    self.buffer.push(c);
                }
                Some('\n') => {
                    self.read_char();
                }
                _ => self.buffer.push('\\'),
            },
            '$' => self.handle_dollar(at, true)?,
            c => self.buffer.push(c),
        }
        Ok(())
    }

    fn open_quote(&mut self, at: usize, state: LexingState) {
        self.flush_buffer(false);
        self.quote_start = at;
        self.quote_mark = self.current_word.len();
        self.state = state;
    }

    fn close_quote(&mut self) {
        // An empty quoted region still yields an (empty) part so that `''`
        // produces an argument.
        if !self.buffer.is_empty() || self.current_word.len() == self.quote_mark {
            self.current_word
                .push(WordPart::Quoted(std::mem::take(&mut self.buffer)));
        }
        self.state = LexingState::ReadingWord;
    }

    fn handle_dollar(&mut self, at: usize, quoted: bool) -> Result<(), LexError> {
        match self.read_param(at)? {
            Some(name) => {
                self.flush_buffer(quoted);
                self.current_word.push(WordPart::Param(name));
            }
            None => self.buffer.push('$'),
        }
        Ok(())
    }

    /// Reads the parameter name following a `$` at offset `at`. Returns
    /// `None` when the `$` does not start a reference.
    fn read_param(&mut self, at: usize) -> Result<Option<String>, LexError> {
        match self.peek_char() {
            Some('{') => {
                self.read_char();
                let mut name = String::new();
                loop {
                    match self.read_char() {
                        Some('}') => return Ok(Some(name)),
                        Some(c) => name.push(c),
                        None => return Err(LexError::UnterminatedBrace(at)),
                    }
                }
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(c) = self.peek_char() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    name.push(c);
                    self.read_char();
                }
                Ok(Some(name))
            }
            Some(c) if c.is_ascii_digit() || matches!(c, '?' | '#' | '@' | '*' | '$') => {
                self.read_char();
                Ok(Some(c.to_string()))
            }
            _ => Ok(None),
        }
    }

    fn read_operator(&mut self, ch: char, at: usize) {
        if let Some((op, width)) = Operator::scan(ch, self.peek_char()) {
            if width == 2 {
                self.read_char();
            }
            self.out
                .push(Token::new(TokenKind::Operator(op), op.as_str(), at));
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.read_char();
        }
    }

    fn flush_buffer(&mut self, quoted: bool) {
        if self.buffer.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.buffer);
        self.current_word.push(if quoted {
            WordPart::Quoted(text)
        } else {
            WordPart::Literal(text)
        });
    }

    /// Emits the word being built; `end` is the offset just past its last
    /// character.
    fn finish_word(&mut self, end: usize) {
        self.flush_buffer(false);
        if self.current_word.is_empty() {
            return;
        }
        let raw: String = self.input[self.word_start..end].iter().collect();
        let parts = std::mem::take(&mut self.current_word);
        self.out
            .push(Token::new(TokenKind::Word(parts), raw, self.word_start));
    }
}

/// Splits `text` into tokens.
///
/// The result always ends with a single [`TokenKind::EndOfInput`] token; a
/// trailing newline is folded into it.
pub fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    LexingFSM::new(text).make_tokens()
}

/// Whether `text` stops partway through a command: inside an open quote, or
/// on a backslash that escapes the line break to come. Such text should be
/// joined with the next input line before it is tokenized.
pub fn is_incomplete(text: &str) -> bool {
    let mut fsm = LexingFSM::new(text);
    match fsm.scan() {
        Ok(()) => fsm.dangling_escape,
        Err(LexError::UnterminatedSingleQuote(_) | LexError::UnterminatedDoubleQuote(_)) => true,
        Err(LexError::UnterminatedBrace(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn lit(s: &str) -> TokenKind {
        TokenKind::Word(vec![WordPart::Literal(s.to_string())])
    }

    #[test]
    fn blanks_separate_words() {
        assert_eq!(
            kinds("  echo\thello   world "),
            vec![lit("echo"), lit("hello"), lit("world"), TokenKind::EndOfInput]
        );
    }

    #[test]
    fn empty_input_is_just_end_of_input() {
        assert_eq!(kinds(""), vec![TokenKind::EndOfInput]);
        assert_eq!(kinds("   \n"), vec![TokenKind::EndOfInput]);
    }

    #[test]
    fn double_quotes_keep_whitespace_in_one_word() {
        let tokens = tokenize("echo \"a  b\"").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(
            tokens[1].kind,
            TokenKind::Word(vec![WordPart::Quoted("a  b".to_string())])
        );
        assert_eq!(tokens[1].raw, "\"a  b\"");
        assert_eq!(tokens[1].pos, 5);
    }

    #[test]
    fn single_quotes_suppress_parameters() {
        assert_eq!(
            kinds("'$HOME'"),
            vec![
                TokenKind::Word(vec![WordPart::Quoted("$HOME".to_string())]),
                TokenKind::EndOfInput
            ]
        );
    }

    #[test]
    fn double_quotes_allow_parameters() {
        assert_eq!(
            kinds("\"x=$x!\""),
            vec![
                TokenKind::Word(vec![
                    WordPart::Quoted("x=".to_string()),
                    WordPart::Param("x".to_string()),
                    WordPart::Quoted("!".to_string()),
                ]),
                TokenKind::EndOfInput
            ]
        );
    }

    #[test]
    fn parameter_forms() {
        assert_eq!(
            kinds("$a_1${b c}$1$?$$ $"),
            vec![
                TokenKind::Word(vec![
                    WordPart::Param("a_1".to_string()),
                    WordPart::Param("b c".to_string()),
                    WordPart::Param("1".to_string()),
                    WordPart::Param("?".to_string()),
                    WordPart::Param("$".to_string()),
                ]),
                lit("$"),
                TokenKind::EndOfInput
            ]
        );
    }

    #[test]
    fn only_one_digit_after_dollar() {
        assert_eq!(
            kinds("$10"),
            vec![
                TokenKind::Word(vec![
                    WordPart::Param("1".to_string()),
                    WordPart::Literal("0".to_string()),
                ]),
                TokenKind::EndOfInput
            ]
        );
    }

    #[test]
    fn adjacent_segments_form_one_word() {
        assert_eq!(
            kinds("a'b c'\"d\"e"),
            vec![
                TokenKind::Word(vec![
                    WordPart::Literal("a".to_string()),
                    WordPart::Quoted("b c".to_string()),
                    WordPart::Quoted("d".to_string()),
                    WordPart::Literal("e".to_string()),
                ]),
                TokenKind::EndOfInput
            ]
        );
    }

    #[test]
    fn empty_quotes_make_an_empty_word() {
        assert_eq!(
            kinds("echo '' \"\""),
            vec![
                lit("echo"),
                TokenKind::Word(vec![WordPart::Quoted(String::new())]),
                TokenKind::Word(vec![WordPart::Quoted(String::new())]),
                TokenKind::EndOfInput
            ]
        );
    }

    #[test]
    fn backslash_escapes() {
        assert_eq!(
            kinds("a\\ b \\$x"),
            vec![
                TokenKind::Word(vec![
                    WordPart::Literal("a".to_string()),
                    WordPart::Quoted(" ".to_string()),
                    WordPart::Literal("b".to_string()),
                ]),
                TokenKind::Word(vec![
                    WordPart::Quoted("$".to_string()),
                    WordPart::Literal("x".to_string()),
                ]),
                TokenKind::EndOfInput
            ]
        );
        assert_eq!(
            kinds("\"\\$x \\n\""),
            vec![
                TokenKind::Word(vec![WordPart::Quoted("$x \\n".to_string())]),
                TokenKind::EndOfInput
            ]
        );
    }

    #[test]
    fn operators_split_words() {
        assert_eq!(
            kinds("a;b|c||d&&e>>f"),
            vec![
                lit("a"),
                TokenKind::Operator(Operator::Semicolon),
                lit("b"),
                TokenKind::Operator(Operator::Pipe),
                lit("c"),
                TokenKind::Operator(Operator::OrIf),
                lit("d"),
                TokenKind::Operator(Operator::AndIf),
                lit("e"),
                TokenKind::Operator(Operator::DGreat),
                lit("f"),
                TokenKind::EndOfInput
            ]
        );
    }

    #[test]
    fn interior_newline_is_an_operator_trailing_is_not() {
        assert_eq!(
            kinds("a\nb\n\n"),
            vec![
                lit("a"),
                TokenKind::Operator(Operator::Newline),
                lit("b"),
                TokenKind::EndOfInput
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            kinds("echo a#b # trailing words\nls"),
            vec![
                lit("echo"),
                lit("a#b"),
                TokenKind::Operator(Operator::Newline),
                lit("ls"),
                TokenKind::EndOfInput
            ]
        );
    }

    #[test]
    fn control_characters_pass_through() {
        assert_eq!(kinds("a\u{7}b"), vec![lit("a\u{7}b"), TokenKind::EndOfInput]);
    }

    #[test]
    fn unterminated_quotes_report_the_opening_position() {
        assert_eq!(
            tokenize("echo 'abc"),
            Err(LexError::UnterminatedSingleQuote(5))
        );
        assert_eq!(
            tokenize("echo x\"abc"),
            Err(LexError::UnterminatedDoubleQuote(6))
        );
        assert_eq!(tokenize("echo ${abc"), Err(LexError::UnterminatedBrace(5)));
    }

    #[test]
    fn incomplete_input() {
        assert!(is_incomplete("echo a \\"));
        assert!(is_incomplete("echo 'a"));
        assert!(is_incomplete("echo \"a\nb"));
        assert!(!is_incomplete("echo a \\\\"));
        assert!(!is_incomplete("echo a # comment \\"));
        assert!(!is_incomplete("echo 'a\\'"));
        assert!(!is_incomplete("echo ${a"));
        assert!(!is_incomplete(""));
    }

    #[test]
    fn continuation_joins_lines() {
        assert_eq!(
            kinds("echo a \\\nb"),
            vec![lit("echo"), lit("a"), lit("b"), TokenKind::EndOfInput]
        );
    }

    #[test]
    fn lexing_is_total() {
        let inputs = [
            "\\", "'", "\"", "$", "${", "$(", "\"\\", "&&&", ">>>", "#", "\u{0}",
            "a\\\n", "''''", "\"'\"", "é ü", ";;\n;",
        ];
        for input in inputs {
            match tokenize(input) {
                Ok(tokens) => assert_eq!(
                    tokens.last().map(|t| &t.kind),
                    Some(&TokenKind::EndOfInput),
                    "input {input:?}"
                ),
                Err(err) => assert!(err.position() <= input.chars().count()),
            }
        }
    }
}
