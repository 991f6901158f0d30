use crate::env::Environment;
use crate::outcome::Outcome;
use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;

/// Command that is not a builtin: a program looked up on disk and spawned.
pub struct ExternalCommand {
    name: String,
    args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Runs the program to completion in the session's working directory.
    ///
    /// `input` is written to the child's stdin. Anything on stderr makes the
    /// stage fail with that text; otherwise stdout (without trailing
    /// whitespace) is the result.
    pub fn run(&self, input: &str, env: &Environment) -> Outcome {
        let search_paths = env
            .vars
            .lookup("PATH")
            .map(OsString::from)
            .or_else(|| std::env::var_os("PATH"))
            .unwrap_or_default();

        let Some(program) =
            find_command_path(&search_paths, env.current_dir(), Path::new(&self.name))
        else {
            log::debug!("{:?} not found", self.name);
            return Outcome::failed(format!("command not found: {}", self.name));
        };

        log::debug!(
            "spawning {} {:?} in {}",
            program.display(),
            self.args,
            env.current_dir().display()
        );
        let output = match capture(&program, &self.args, input, env.current_dir()) {
            Ok(output) => output,
            Err(e) => {
                log::warn!("failed to run {}: {}", program.display(), e);
                return Outcome::failed(format!("{}: {}", self.name, e));
            }
        };
        log::debug!("{} exited with {}", self.name, output.status);

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if !stderr.is_empty() {
            return Outcome::failed(stderr);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Outcome::Continue(stdout.trim_end().to_string())
    }
}

/// Spawns `program` and collects everything it prints.
///
/// stdin is fed from a separate thread while stdout and stderr are drained
/// together, so a child blocking on a full pipe can't stall us.
fn capture(program: &Path, args: &[String], input: &str, cwd: &Path) -> io::Result<Output> {
    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let writer = child.stdin.take().map(|mut stdin| {
        let input = input.as_bytes().to_vec();
        thread::spawn(move || stdin.write_all(&input))
    });

    let output = child.wait_with_output()?;

    if let Some(writer) = writer {
        match writer.join() {
            Ok(Err(e)) if e.kind() != io::ErrorKind::BrokenPipe => {
                log::debug!("writing stdin of {} failed: {}", program.display(), e);
            }
            Err(_) => log::warn!("stdin writer for {} panicked", program.display()),
            _ => {}
        }
    }
    Ok(output)
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`) or `./`-prefixed:
///   resolved against `cwd`, returned if it exists.
/// - Single path component (no separators): search each directory in
///   `search_paths` (PATH) and return the first existing file.
/// - Empty path: returns `None`.
pub fn find_command_path(search_paths: &OsStr, cwd: &Path, path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return find_by_path(path);
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(Component::Normal(name)), None) => find_in_path(search_paths, name),
        _ => find_by_path(&cwd.join(path)),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| path.is_file())
}

fn find_by_path(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        Some(path.to_path_buf())
    } else {
        None
    }
}
