/// Message reported for any line that fails to parse.
pub const PARSE_ERROR_MESSAGE: &str = "Error: failed to parse command sequence";

/// What a single stage (or a whole pipeline) produced.
///
/// `Failed` and `Terminated` both stop the pipeline. They differ in whether
/// the caller should treat the stop as an error or as a request to end the
/// session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The stage succeeded; the text is handed to the next stage.
    Continue(String),
    /// The stage failed with the given message.
    Failed(String),
    /// The session was asked to end.
    Terminated,
}

impl Outcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Outcome::Failed(message.into())
    }

    pub fn is_interrupted(&self) -> bool {
        !matches!(self, Outcome::Continue(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Outcome::Continue(text) | Outcome::Failed(text) => text,
            Outcome::Terminated => "",
        }
    }
}

/// Flat result shape handed to front-ends.
///
/// `interrupted` is set for both failures and termination requests;
/// `terminated` tells the two apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub interrupted: bool,
    pub text: String,
    pub terminated: bool,
}

impl ExecutionResult {
    /// The result used whenever a line cannot be parsed.
    pub fn parse_error() -> Self {
        Outcome::failed(PARSE_ERROR_MESSAGE).into()
    }
}

impl From<Outcome> for ExecutionResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Continue(text) => ExecutionResult {
                interrupted: false,
                text,
                terminated: false,
            },
            Outcome::Failed(text) => ExecutionResult {
                interrupted: true,
                text,
                terminated: false,
            },
            Outcome::Terminated => ExecutionResult {
                interrupted: true,
                text: String::new(),
                terminated: true,
            },
        }
    }
}
