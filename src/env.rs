use crate::vars::Variables;
use std::env as stdenv;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised when the working directory cannot be changed.
#[derive(Error, Debug)]
pub enum EnvError {
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("can't resolve {path}: {source}")]
    Unresolvable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Mutable state shared by every command of a session.
///
/// The environment contains:
/// - `vars`: the variable store read by substitution and written by `=`.
/// - the working directory, against which relative paths are resolved.
///   It is private so that it can only move to an existing directory.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Session variables.
    pub vars: Variables,
    current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process directory into a new, empty-variable environment.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir()
            .and_then(fs::canonicalize)
            .unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars: Variables::new(),
            current_dir,
        }
    }

    /// Build an environment rooted at `dir`, which must be an existing directory.
    pub fn with_dir(vars: Variables, dir: impl AsRef<Path>) -> Result<Self, EnvError> {
        let mut env = Self::new();
        env.vars = vars;
        env.set_current_dir(dir)?;
        Ok(env)
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// Move the working directory to `path` (relative to the current one).
    ///
    /// The stored directory is canonical. On error nothing changes.
    pub fn set_current_dir(&mut self, path: impl AsRef<Path>) -> Result<(), EnvError> {
        let target = self.resolve(path.as_ref());
        if !target.is_dir() {
            return Err(EnvError::NotADirectory(target));
        }
        let canonical = fs::canonicalize(&target).map_err(|source| EnvError::Unresolvable {
            path: target,
            source,
        })?;
        self.current_dir = canonical;
        Ok(())
    }

    /// Join `path` onto the working directory unless it is already absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.current_dir.join(path)
    }

    /// Contents of `name` resolved against the working directory.
    ///
    /// Returns `None` when there is no such file (or it can't be read as text).
    pub fn read_file(&self, name: &str) -> Option<String> {
        let path = self.resolve(Path::new(name));
        if !path.is_file() {
            return None;
        }
        fs::read_to_string(path).ok()
    }

    /// Canonical form of `name`, falling back to the plain joined path.
    pub fn full_path(&self, name: &str) -> PathBuf {
        let path = self.resolve(Path::new(name));
        fs::canonicalize(&path).unwrap_or(path)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
