//! A tiny, embeddable pipeline command interpreter.
//!
//! A line is a sequence of commands separated by `|`. Each command receives
//! the text the previous one produced and the whole line yields the text of
//! the last command, or stops at the first command that fails. Built-in
//! commands (`wc`, `echo`, `pwd`, `cat`, `cd`, `ls`, `exit` and `NAME=value`
//! assignments) are implemented in Rust; any other name is looked up on disk
//! and run as an external program.
//!
//! The main entry point is [`Session`], which keeps the variables and the
//! working directory between lines.

mod builtin;
pub mod config;
pub mod env;
mod external;
pub mod lexer;
pub mod logging;
pub mod outcome;
pub mod parser;
pub mod registry;
pub mod repl;
pub mod session;
pub mod vars;

pub use config::Config;
pub use outcome::{ExecutionResult, Outcome};
pub use session::Session;
