use crate::config::Config;
use crate::env::{EnvError, Environment};
use crate::outcome::{ExecutionResult, Outcome, PARSE_ERROR_MESSAGE};
use crate::parser::{self, ParsedPipeline, Pipeline};
use crate::registry;
use crate::vars::Variables;
use std::path::Path;

/// A command interpreter session.
///
/// The session owns the variable store and the working directory; both live
/// as long as the session and are shared by every line it executes.
///
/// Example
/// ```
/// use pipeshell::Session;
/// let mut sh = Session::default();
/// sh.execute("X=10");
/// let result = sh.execute("echo $X a | wc");
/// assert!(!result.interrupted);
/// assert_eq!(result.text, "2 2 5");
/// ```
pub struct Session {
    env: Environment,
}

impl Session {
    /// Create a session as described by `config`.
    pub fn new(config: &Config) -> Result<Self, EnvError> {
        let vars = if config.session.inherit_env {
            Variables::from_process_env()
        } else {
            Variables::new()
        };
        let env = match &config.session.start_dir {
            Some(dir) => Environment::with_dir(vars, dir)?,
            None => {
                let mut env = Environment::new();
                env.vars = vars;
                env
            }
        };
        log::debug!(
            "session started in {} with {} variables",
            env.current_dir().display(),
            env.vars.len()
        );
        Ok(Self { env })
    }

    /// Parse and run one line.
    pub fn execute(&mut self, line: &str) -> ExecutionResult {
        self.run(line).into()
    }

    /// Same as [`Session::execute`], but returns the richer [`Outcome`].
    pub fn run(&mut self, line: &str) -> Outcome {
        let parsed = parser::parse(line);
        self.execute_parsed(&parsed)
    }

    /// Run an already parsed line. A parse error runs nothing.
    pub fn execute_parsed(&mut self, parsed: &ParsedPipeline) -> Outcome {
        match parsed {
            Ok(pipeline) => self.execute_pipeline(pipeline),
            Err(e) => {
                log::debug!("parse error: {e}");
                Outcome::failed(PARSE_ERROR_MESSAGE)
            }
        }
    }

    /// Run the stages left to right, handing each one the previous output.
    ///
    /// A stage is expanded only when its turn comes, so it sees assignments
    /// made by earlier stages. The first interrupted stage ends the pipeline.
    pub fn execute_pipeline(&mut self, pipeline: &Pipeline) -> Outcome {
        let mut carried = String::new();
        for (index, stage) in pipeline.stages.iter().enumerate() {
            let descriptor = stage.expand(&self.env.vars);
            let command = registry::resolve(&descriptor.command_name);
            log::debug!(
                "stage {index}: {:?} {:?}",
                descriptor.command_name,
                descriptor.arguments
            );
            match command.run(&descriptor.arguments, &carried, &mut self.env) {
                Outcome::Continue(text) => carried = text,
                interrupted => {
                    log::debug!("stage {index} interrupted the pipeline");
                    return interrupted;
                }
            }
        }
        Outcome::Continue(carried)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.env.vars.set(name, value);
    }

    /// Value of `name`, or an empty string when it was never set.
    pub fn get_variable(&self, name: &str) -> String {
        self.env.vars.get(name)
    }

    pub fn working_dir(&self) -> &Path {
        self.env.current_dir()
    }

    pub fn set_working_dir(&mut self, path: impl AsRef<Path>) -> Result<(), EnvError> {
        self.env.set_current_dir(path)
    }
}

impl Default for Session {
    /// An empty variable store in the process working directory.
    fn default() -> Self {
        Self {
            env: Environment::new(),
        }
    }
}
