//! Mapping from command names to command behaviors.

use crate::builtin::{Assign, Cat, Cd, Echo, Exit, Ls, Pwd, Wc, run_builtin};
use crate::env::Environment;
use crate::external::ExternalCommand;
use crate::outcome::Outcome;

/// Every command the interpreter knows how to run.
///
/// Built-ins are closed variants; any other name becomes `External` and is
/// looked up on disk only when it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Wc,
    Echo,
    Pwd,
    Cat,
    Cd,
    Ls,
    Assign,
    Exit,
    External(String),
}

/// Resolves a command name. Never fails: unknown names are external programs.
pub fn resolve(name: &str) -> CommandKind {
    match name {
        "wc" => CommandKind::Wc,
        "echo" => CommandKind::Echo,
        "pwd" => CommandKind::Pwd,
        "cat" => CommandKind::Cat,
        "cd" => CommandKind::Cd,
        "ls" => CommandKind::Ls,
        "=" => CommandKind::Assign,
        "exit" => CommandKind::Exit,
        other => CommandKind::External(other.to_string()),
    }
}

impl CommandKind {
    /// Runs the command once with `args` and the previous stage's text.
    pub fn run(&self, args: &[String], input: &str, env: &mut Environment) -> Outcome {
        match self {
            CommandKind::Wc => run_builtin::<Wc>(args, input, env),
            CommandKind::Echo => run_builtin::<Echo>(args, input, env),
            CommandKind::Pwd => run_builtin::<Pwd>(args, input, env),
            CommandKind::Cat => run_builtin::<Cat>(args, input, env),
            CommandKind::Cd => run_builtin::<Cd>(args, input, env),
            CommandKind::Ls => run_builtin::<Ls>(args, input, env),
            CommandKind::Assign => run_builtin::<Assign>(args, input, env),
            CommandKind::Exit => run_builtin::<Exit>(args, input, env),
            CommandKind::External(name) => ExternalCommand::new(name.clone(), args.to_vec()).run(input, env),
        }
    }
}
