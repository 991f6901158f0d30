use crate::lexer::{self, LexingError, Token, WordPart};
use crate::vars::{Variables, is_valid_name};
use thiserror::Error;

/// Command name the parser gives to `NAME=value` stages.
pub const ASSIGNMENT_COMMAND: &str = "=";

/// A shell word: the parts it was written with, before expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word(pub Vec<WordPart>);

impl Word {
    /// Expands the word into zero or more fields.
    ///
    /// Unquoted parameters are split on whitespace; everything else is kept
    /// as written. A word made only of unquoted parameters whose values are
    /// empty produces no field at all, while `''` or `""` produce one empty
    /// field.
    pub fn expand_into(&self, vars: &Variables, fields: &mut Vec<String>) {
        let mut current: Option<String> = None;
        for part in &self.0 {
            match part {
                WordPart::Literal(text) | WordPart::Quoted(text) => {
                    current.get_or_insert_with(String::new).push_str(text);
                }
                WordPart::Param { name, quoted: true } => {
                    current
                        .get_or_insert_with(String::new)
                        .push_str(&vars.get(name));
                }
                WordPart::Param {
                    name,
                    quoted: false,
                } => {
                    let value = vars.get(name);
                    if value.starts_with(char::is_whitespace) {
                        fields.extend(current.take());
                    }
                    let mut pieces = value.split_whitespace().peekable();
                    let had_pieces = pieces.peek().is_some();
                    if let Some(first) = pieces.next() {
                        current.get_or_insert_with(String::new).push_str(first);
                    }
                    for piece in pieces {
                        fields.extend(current.take());
                        current = Some(piece.to_string());
                    }
                    if had_pieces && value.ends_with(char::is_whitespace) {
                        fields.extend(current.take());
                    }
                }
            }
        }
        fields.extend(current);
    }

    /// Expands the word into a single string, without any splitting.
    pub fn expand_joined(&self, vars: &Variables) -> String {
        self.0
            .iter()
            .map(|part| match part {
                WordPart::Literal(text) | WordPart::Quoted(text) => text.clone(),
                WordPart::Param { name, .. } => vars.get(name),
            })
            .collect()
    }
}

/// One stage of a pipeline, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// A command name followed by its arguments.
    Command { argv: Vec<Word> },
    /// `name=value`, optionally followed by extra words.
    Assignment {
        name: String,
        value: Word,
        rest: Vec<Word>,
    },
}

/// A stage after variable substitution: what the registry and the command see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDescriptor {
    pub command_name: String,
    pub arguments: Vec<String>,
}

impl Stage {
    /// Substitutes variables using the current contents of `vars`.
    pub fn expand(&self, vars: &Variables) -> StageDescriptor {
        match self {
            Stage::Command { argv } => {
                let mut fields = Vec::new();
                for word in argv {
                    word.expand_into(vars, &mut fields);
                }
                let mut fields = fields.into_iter();
                StageDescriptor {
                    command_name: fields.next().unwrap_or_default(),
                    arguments: fields.collect(),
                }
            }
            Stage::Assignment { name, value, rest } => {
                let mut arguments = vec![name.clone(), value.expand_joined(vars)];
                for word in rest {
                    word.expand_into(vars, &mut arguments);
                }
                StageDescriptor {
                    command_name: ASSIGNMENT_COMMAND.to_string(),
                    arguments,
                }
            }
        }
    }
}

/// A parsed line: one or more stages separated by `|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

/// Errors that make a whole line unparsable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error(transparent)]
    Lexing(#[from] LexingError),
    /// A pipe with nothing on one of its sides (`| a`, `a |`, `a | | b`).
    #[error("empty command in pipeline")]
    EmptyStage,
}

/// Result of parsing one line.
pub type ParsedPipeline = Result<Pipeline, ParsingError>;

/// Parses a line into a pipeline.
///
/// Either every stage parses or the whole line is rejected. A blank line is
/// a single stage with no words; it is not a parse error.
pub fn parse(line: &str) -> ParsedPipeline {
    let tokens = lexer::split_into_tokens(line)?;

    let mut segments: Vec<Vec<Word>> = vec![Vec::new()];
    for token in tokens {
        match token {
            Token::PipeOp => segments.push(Vec::new()),
            Token::Word(parts) => {
                if let Some(segment) = segments.last_mut() {
                    segment.push(Word(parts));
                }
            }
        }
    }

    if segments.len() > 1 && segments.iter().any(Vec::is_empty) {
        return Err(ParsingError::EmptyStage);
    }

    let stages: Vec<Stage> = segments.into_iter().map(build_stage).collect();
    log::debug!("parsed {} stage(s) from {:?}", stages.len(), line);
    Ok(Pipeline { stages })
}

fn build_stage(mut argv: Vec<Word>) -> Stage {
    if let Some((name, value)) = argv.first().and_then(split_assignment) {
        let rest = argv.split_off(1);
        return Stage::Assignment { name, value, rest };
    }
    Stage::Command { argv }
}

/// Recognizes `NAME=...` at the start of a word.
///
/// The name and the `=` must be unquoted literal text; the value is the rest
/// of the word, quoted parts included.
fn split_assignment(word: &Word) -> Option<(String, Word)> {
    let (first, tail) = word.0.split_first()?;
    let WordPart::Literal(text) = first else {
        return None;
    };
    let (name, value_head) = text.split_once('=')?;
    if !is_valid_name(name) {
        return None;
    }

    let mut value = Vec::with_capacity(word.0.len());
    if !value_head.is_empty() {
        value.push(WordPart::Literal(value_head.to_string()));
    }
    value.extend(tail.iter().cloned());
    Some((name.to_string(), Word(value)))
}
