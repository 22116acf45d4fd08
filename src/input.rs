//! Character stream over a fully buffered input source.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Input read in one bulk read and handed out a character at a time.
///
/// Invalid UTF-8 is replaced rather than rejected, so a script with stray
/// bytes still runs.
#[derive(Debug, Clone, Default)]
pub struct CharStream {
    chars: Vec<char>,
    pos: usize,
}

impl CharStream {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    /// Reads `reader` to its end.
    pub fn from_reader(mut reader: impl Read) -> io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::new(&String::from_utf8_lossy(&bytes)))
    }

    pub fn open(path: &Path) -> io::Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// Next character, or `None` at end of input.
    pub fn pop(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Everything up to the next newline, without it. A final line with no
    /// newline is still returned.
    pub fn next_line(&mut self) -> Option<String> {
        if self.is_eof() {
            return None;
        }
        let mut line = String::new();
        while let Some(ch) = self.pop() {
            if ch == '\n' {
                break;
            }
            line.push(ch);
        }
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn pop_and_peek() {
        let mut stream = CharStream::new("aé");
        assert_eq!(stream.peek(), Some('a'));
        assert_eq!(stream.pop(), Some('a'));
        assert_eq!(stream.pop(), Some('é'));
        assert!(stream.is_eof());
        assert_eq!(stream.pop(), None);
        assert_eq!(stream.peek(), None);
    }

    #[test]
    fn lines() {
        let mut stream = CharStream::new("echo a\n\necho b");
        assert_eq!(stream.next_line().as_deref(), Some("echo a"));
        assert_eq!(stream.next_line().as_deref(), Some(""));
        assert_eq!(stream.next_line().as_deref(), Some("echo b"));
        assert_eq!(stream.next_line(), None);
    }

    #[test]
    fn empty_input_has_no_lines() {
        assert_eq!(CharStream::new("").next_line(), None);
        assert_eq!(CharStream::new("\n").next_line().as_deref(), Some(""));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut stream = CharStream::from_reader(&b"a\xffb"[..]).unwrap();
        assert_eq!(stream.next_line().as_deref(), Some("a\u{fffd}b"));
    }

    #[test]
    fn open_reads_the_whole_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "x=1\necho $x\n").unwrap();
        let mut stream = CharStream::open(file.path()).unwrap();
        assert_eq!(stream.next_line().as_deref(), Some("x=1"));
        assert_eq!(stream.next_line().as_deref(), Some("echo $x"));
        assert_eq!(stream.next_line(), None);
    }

    #[test]
    fn open_missing_file() {
        let err = CharStream::open(Path::new("/nonexistent/minish/script")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
