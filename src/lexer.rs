//! Lexical analysis (tokenization) of a single command line.

use crate::vars::is_name_char;
use thiserror::Error;

/// A part of a word.
///
/// The lexer keeps track of how each piece of a word was written so that
/// expansion can apply the right rules later: quoted text is never split,
/// and only parameters produce substitutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPart {
    /// Unquoted literal text. Never contains whitespace.
    Literal(String),
    /// Text from inside single or double quotes, taken as-is.
    Quoted(String),
    /// `$NAME` or `${NAME}`. `quoted` is true inside double quotes.
    Param { name: String, quoted: bool },
}

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word, which may be composed of multiple parts.
    Word(Vec<WordPart>),
    /// The pipe operator, `|`.
    PipeOp,
}

/// Errors that can occur during lexical analysis.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexingError {
    /// A closing quote (single or double) was not found.
    #[error("unfinished quote")]
    UnfinishedQuote,
    /// A closing brace for `${...}` was not found.
    #[error("unfinished parameter substitution")]
    UnfinishedParamSubst,
    /// `${...}` contained something other than a variable name.
    #[error("bad substitution: ${{{0}}}")]
    BadSubstitution(String),
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
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            current_word: Vec::new(),
            buffer: String::new(),
        }
    }

    /// Runs the machine over the whole input.
    ///
    /// Fails if the line ends inside a quote or a `${...}` block.
    fn make_tokens(&mut self) -> Result<Vec<Token>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start | LexingState::ReadingWord => self.handle_unquoted(ch, &mut out)?,
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch)?,
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote | LexingState::ReadingDoubleQuote => {
                return Err(LexingError::UnfinishedQuote);
            }
            LexingState::ReadingWord => self.finish_word(&mut out),
            LexingState::Start => {}
        }

        Ok(out)
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

    fn handle_unquoted(&mut self, ch: char, out: &mut Vec<Token>) -> Result<(), LexingError> {
        match ch {
            c if c.is_whitespace() => {
                if self.state == LexingState::ReadingWord {
                    self.finish_word(out);
                }
            }
            '|' => {
                if self.state == LexingState::ReadingWord {
                    self.finish_word(out);
                }
                out.push(Token::PipeOp);
            }
            '\'' => {
                self.flush_literal();
                self.state = LexingState::ReadingSingleQuote;
            }
            '"' => {
                self.flush_literal();
                self.state = LexingState::ReadingDoubleQuote;
            }
            '$' => {
                self.state = LexingState::ReadingWord;
                if let Some(name) = self.read_param()? {
                    self.flush_literal();
                    self.current_word.push(WordPart::Param {
                        name,
                        quoted: false,
                    });
                } else {
                    self.buffer.push('$');
                }
            }
            c => {
                self.state = LexingState::ReadingWord;
                self.buffer.push(c);
            }
        }
        Ok(())
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => {
                self.current_word
                    .push(WordPart::Quoted(std::mem::take(&mut self.buffer)));
                self.state = LexingState::ReadingWord;
            }
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) -> Result<(), LexingError> {
        match ch {
            '"' => {
                self.current_word
                    .push(WordPart::Quoted(std::mem::take(&mut self.buffer)));
                self.state = LexingState::ReadingWord;
            }
            '$' => {
                if let Some(name) = self.read_param()? {
                    if !self.buffer.is_empty() {
                        self.current_word
                            .push(WordPart::Quoted(std::mem::take(&mut self.buffer)));
                    }
                    self.current_word.push(WordPart::Param { name, quoted: true });
                } else {
                    self.buffer.push('$');
                }
            }
            c => self.buffer.push(c),
        }
        Ok(())
    }

    /// Reads a parameter name right after a `$`.
    ///
    /// Returns `None` (consuming nothing) when the `$` does not start a
    /// substitution and must be kept as a literal character.
    fn read_param(&mut self) -> Result<Option<String>, LexingError> {
        match self.peek_char() {
            Some('{') => {
                self.read_char();
                let mut name = String::new();
                loop {
                    match self.read_char() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => return Err(LexingError::UnfinishedParamSubst),
                    }
                }
                if crate::vars::is_valid_name(&name) {
                    Ok(Some(name))
                } else {
                    Err(LexingError::BadSubstitution(name))
                }
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(c) = self.peek_char().filter(|c| is_name_char(*c)) {
                    name.push(c);
                    self.read_char();
                }
                Ok(Some(name))
            }
            _ => Ok(None),
        }
    }

    fn flush_literal(&mut self) {
        if !self.buffer.is_empty() {
            self.current_word
                .push(WordPart::Literal(std::mem::take(&mut self.buffer)));
        }
    }

    fn finish_word(&mut self, out: &mut Vec<Token>) {
        self.flush_literal();
        if !self.current_word.is_empty() {
            out.push(Token::Word(std::mem::take(&mut self.current_word)));
        }
        self.state = LexingState::Start;
    }
}

/// Splits `line` into words and pipe operators.
pub fn split_into_tokens(line: &str) -> Result<Vec<Token>, LexingError> {
    let mut lexer = LexingFSM::new(line);
    lexer.make_tokens()
}
