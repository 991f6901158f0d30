use crate::env::Environment;
use crate::outcome::Outcome;
use anyhow::{Result, bail};
use argh::{EarlyExit, FromArgs};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process. They receive the text piped from the previous stage
/// and decide for themselves whether to use it.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// When true, every argument is taken as a positional value, `--help`
    /// included.
    fn positional_only() -> bool {
        false
    }

    /// Switches recognized in front of the positional arguments.
    fn flags() -> &'static [&'static str] {
        &[]
    }

    /// Executes the command against the piped `input` and the session environment.
    ///
    /// An `Err` is reported as a failed stage carrying the error message.
    fn execute(self, input: &str, env: &mut Environment) -> Result<Outcome>;
}

/// Parses `args` for `T` and runs it.
///
/// Only `--help` and the command's own [`BuiltinCommand::flags`] are read as
/// options, and only before the first other argument. Everything else,
/// including `help`, `-` or `-5`, is positional data. `--help` output becomes
/// the stage's text; argument errors and execution errors become failures.
pub(crate) fn run_builtin<T: BuiltinCommand>(
    args: &[String],
    input: &str,
    env: &mut Environment,
) -> Outcome {
    let mut argv: Vec<&str> = Vec::with_capacity(args.len() + 1);
    let mut rest = args.iter().map(String::as_str).peekable();
    if !T::positional_only() {
        while let Some(&arg) = rest.peek() {
            let is_option = arg == "--help" || T::flags().contains(&arg);
            if !is_option || argv.contains(&arg) {
                break;
            }
            argv.push(arg);
            rest.next();
        }
    }
    argv.push("--");
    argv.extend(rest);

    match T::from_args(&[T::name()], &argv) {
        Ok(cmd) => match cmd.execute(input, env) {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Failed(e.to_string()),
        },
        Err(EarlyExit { output, status }) => match status {
            Ok(()) => Outcome::Continue(output),
            Err(()) => Outcome::Failed(format!("{}: {}", T::name(), output.trim_end())),
        },
    }
}

#[derive(FromArgs)]
/// count lines, words and bytes of a file or of the piped text
pub struct Wc {
    #[argh(positional, greedy)]
    /// file to count; the piped text is counted when omitted. Only the first name is used.
    pub files: Vec<String>,
}

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\n|\r").expect("line break pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s").expect("whitespace pattern"));

/// Line, word and byte counts as reported by `wc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStats {
    pub lines: usize,
    pub words: usize,
    pub bytes: usize,
}

impl TextStats {
    /// Counts `text`.
    ///
    /// Lines are the pieces left after splitting on any line break, so a
    /// trailing newline starts a new (empty) line. Words are the pieces of the
    /// trimmed text split on single whitespace characters.
    pub fn of(text: &str) -> Self {
        Self {
            lines: LINE_BREAK.split(text).count(),
            words: WHITESPACE.split(text.trim()).count(),
            bytes: text.len(),
        }
    }
}

impl BuiltinCommand for Wc {
    fn name() -> &'static str {
        "wc"
    }

    fn execute(self, input: &str, env: &mut Environment) -> Result<Outcome> {
        let text = match self.files.first() {
            Some(file) => match env.read_file(file) {
                Some(text) => text,
                None => bail!("No file named {file} found"),
            },
            None => input.to_string(),
        };
        let stats = TextStats::of(&text);
        Ok(Outcome::Continue(format!(
            "{} {} {}",
            stats.lines, stats.words, stats.bytes
        )))
    }
}

#[derive(FromArgs)]
/// write the arguments, separated by spaces.
/// by default, a trailing newline is printed.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn flags() -> &'static [&'static str] {
        &["-n"]
    }

    fn execute(self, _input: &str, _env: &mut Environment) -> Result<Outcome> {
        let mut s = self.args.join(" ");
        if !self.no_newline {
            s.push('\n');
        }
        Ok(Outcome::Continue(s))
    }
}

#[derive(FromArgs)]
/// print the current working directory
pub struct Pwd {
    #[argh(positional, greedy)]
    /// ignored
    pub _args: Vec<String>,
}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn positional_only() -> bool {
        true
    }

    fn execute(self, _input: &str, env: &mut Environment) -> Result<Outcome> {
        Ok(Outcome::Continue(
            env.full_path(".").to_string_lossy().into_owned(),
        ))
    }
}

#[derive(FromArgs)]
/// print a file, or pass the piped text through
pub struct Cat {
    #[argh(positional, greedy)]
    /// file to print; the piped text is used when omitted. Only the first name is used.
    pub files: Vec<String>,
}

impl BuiltinCommand for Cat {
    fn name() -> &'static str {
        "cat"
    }

    fn execute(self, input: &str, env: &mut Environment) -> Result<Outcome> {
        match self.files.first() {
            Some(file) => match env.read_file(file) {
                Some(text) => Ok(Outcome::Continue(text)),
                None => bail!("No file named {file} found"),
            },
            None => Ok(Outcome::Continue(input.to_string())),
        }
    }
}

#[derive(FromArgs)]
/// change the current working directory.
/// without a target nothing happens.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _input: &str, env: &mut Environment) -> Result<Outcome> {
        let Some(target) = self.target else {
            return Ok(Outcome::Continue(String::new()));
        };
        if env.set_current_dir(&target).is_err() {
            bail!("No directory named {target} found");
        }
        Ok(Outcome::Continue(String::new()))
    }
}

#[derive(FromArgs)]
/// list the entries of a directory
pub struct Ls {
    #[argh(positional)]
    /// directory to list; defaults to the current one.
    pub target: Option<String>,
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn execute(self, _input: &str, env: &mut Environment) -> Result<Outcome> {
        let target = self.target.unwrap_or_else(|| ".".to_string());
        let dir = env.resolve(Path::new(&target));
        if !dir.is_dir() {
            bail!("No directory named {target} found");
        }

        let Ok(entries) = fs::read_dir(&dir) else {
            bail!("Can not read from {target}");
        };
        let mut names = Vec::new();
        for entry in entries {
            let Ok(entry) = entry else {
                bail!("Can not read from {target}");
            };
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(Outcome::Continue(names.join("\n")))
    }
}

#[derive(FromArgs)]
/// assign a value to a session variable
pub struct Assign {
    #[argh(positional)]
    /// variable name.
    pub name: String,

    #[argh(positional)]
    /// value to store.
    pub value: String,
}

impl BuiltinCommand for Assign {
    fn name() -> &'static str {
        crate::parser::ASSIGNMENT_COMMAND
    }

    fn positional_only() -> bool {
        true
    }

    fn execute(self, _input: &str, env: &mut Environment) -> Result<Outcome> {
        if !crate::vars::is_valid_name(&self.name) {
            bail!("=: invalid variable name: {}", self.name);
        }
        env.vars.set(self.name, self.value);
        Ok(Outcome::Continue(String::new()))
    }
}

#[derive(FromArgs)]
/// end the session
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn positional_only() -> bool {
        true
    }

    fn execute(self, _input: &str, _env: &mut Environment) -> Result<Outcome> {
        Ok(Outcome::Terminated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::Variables;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn env_in(dir: &TempDir) -> Environment {
        Environment::with_dir(Variables::new(), dir.path()).unwrap()
    }

    fn write_file(dir: &TempDir, name: &str, content: &str) {
        let mut f = File::create(dir.path().join(name)).expect("create file");
        write!(f, "{}", content).expect("write");
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = env_in(&dir);
        let expected = fs::canonicalize(dir.path()).unwrap();

        let res = run_builtin::<Pwd>(&[], "", &mut env);
        assert_eq!(res, Outcome::Continue(expected.to_string_lossy().into_owned()));
    }

    #[test]
    fn test_pwd_ignores_args_and_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = env_in(&dir);
        let expected = fs::canonicalize(dir.path()).unwrap();

        let res = run_builtin::<Pwd>(&args(&["aaa", "--bbb", "-a"]), "kek", &mut env);
        assert_eq!(res, Outcome::Continue(expected.to_string_lossy().into_owned()));
    }

    #[test]
    fn test_echo_with_and_without_newline() {
        let mut env = Environment::new();

        let res = run_builtin::<Echo>(&args(&["hello", "world"]), "", &mut env);
        assert_eq!(res, Outcome::Continue("hello world\n".into()));

        let res = run_builtin::<Echo>(&args(&["-n", "foo", "bar"]), "", &mut env);
        assert_eq!(res, Outcome::Continue("foo bar".into()));
    }

    #[test]
    fn test_echo_keeps_spacing_inside_args() {
        let mut env = Environment::new();
        let res = run_builtin::<Echo>(&args(&["a", "a a", "c", "d   d"]), "ignored", &mut env);
        assert_eq!(res, Outcome::Continue("a a a c d   d\n".into()));
    }

    #[test]
    fn test_echo_without_args() {
        let mut env = Environment::new();
        assert_eq!(
            run_builtin::<Echo>(&[], "", &mut env),
            Outcome::Continue("\n".into())
        );
    }

    #[test]
    fn test_help_is_output_not_failure() {
        let mut env = Environment::new();
        let res = run_builtin::<Echo>(&args(&["--help"]), "", &mut env);
        match res {
            Outcome::Continue(text) => assert!(text.contains("Usage: echo")),
            other => panic!("expected help text, got {other:?}"),
        }
    }

    #[test]
    fn test_dash_arguments_are_data() {
        let mut env = Environment::new();
        assert_eq!(
            run_builtin::<Echo>(&args(&["-5"]), "", &mut env),
            Outcome::Continue("-5\n".into())
        );
        assert_eq!(
            run_builtin::<Echo>(&args(&["-", "--", "-x"]), "", &mut env),
            Outcome::Continue("- -- -x\n".into())
        );
        assert_eq!(
            run_builtin::<Echo>(&args(&["-n", "-n", "a"]), "", &mut env),
            Outcome::Continue("-n a".into())
        );
        assert_eq!(
            run_builtin::<Echo>(&args(&["a", "-n"]), "", &mut env),
            Outcome::Continue("a -n\n".into())
        );
        assert_eq!(
            run_builtin::<Echo>(&args(&["--", "--help"]), "", &mut env),
            Outcome::Continue("-- --help\n".into())
        );
    }

    #[test]
    fn test_help_word_is_data() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "help", "not usage");
        fs::create_dir(dir.path().join("sub")).unwrap();
        write_file(&dir, "-x", "dash file");
        let mut env = env_in(&dir);

        assert_eq!(
            run_builtin::<Echo>(&args(&["help"]), "", &mut env),
            Outcome::Continue("help\n".into())
        );
        assert_eq!(
            run_builtin::<Cat>(&args(&["help"]), "", &mut env),
            Outcome::Continue("not usage".into())
        );
        assert_eq!(
            run_builtin::<Wc>(&args(&["help"]), "", &mut env),
            Outcome::Continue("1 2 9".into())
        );
        assert_eq!(
            run_builtin::<Cat>(&args(&["-x"]), "", &mut env),
            Outcome::Continue("dash file".into())
        );
        assert_eq!(
            run_builtin::<Cat>(&args(&["--bogus"]), "", &mut env),
            Outcome::failed("No file named --bogus found")
        );
        assert_eq!(
            run_builtin::<Wc>(&args(&["-"]), "", &mut env),
            Outcome::failed("No file named - found")
        );
    }

    #[test]
    fn test_help_word_as_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("help")).unwrap();
        write_file(&dir, "help/inner", "");
        let mut env = env_in(&dir);

        assert_eq!(
            run_builtin::<Ls>(&args(&["help"]), "", &mut env),
            Outcome::Continue("inner".into())
        );
        assert_eq!(
            run_builtin::<Cd>(&args(&["help"]), "", &mut env),
            Outcome::Continue(String::new())
        );
        assert_eq!(
            env.current_dir(),
            fs::canonicalize(dir.path().join("help")).unwrap()
        );
        assert_eq!(
            run_builtin::<Ls>(&args(&["-5"]), "", &mut env),
            Outcome::failed("No directory named -5 found")
        );
    }

    #[test]
    fn test_help_flag_for_every_parsed_builtin() {
        let mut env = Environment::new();
        for (name, res) in [
            ("cat", run_builtin::<Cat>(&args(&["--help"]), "", &mut env)),
            ("wc", run_builtin::<Wc>(&args(&["--help"]), "", &mut env)),
            ("ls", run_builtin::<Ls>(&args(&["--help"]), "", &mut env)),
            ("cd", run_builtin::<Cd>(&args(&["--help"]), "", &mut env)),
        ] {
            assert!(!res.is_interrupted(), "{name}");
            assert!(res.text().contains(&format!("Usage: {name}")), "{name}");
        }
    }

    #[test]
    fn test_extra_positional_is_failure() {
        let mut env = Environment::new();
        let res = run_builtin::<Ls>(&args(&["a", "b"]), "", &mut env);
        assert!(res.is_interrupted());
        assert!(res.text().starts_with("ls: "));
    }

    #[test]
    fn test_text_stats_counting_rules() {
        assert_eq!(
            TextStats::of("a a a a\n"),
            TextStats {
                lines: 2,
                words: 4,
                bytes: 8
            }
        );
        assert_eq!(
            TextStats::of("a a"),
            TextStats {
                lines: 1,
                words: 2,
                bytes: 3
            }
        );
        assert_eq!(TextStats::of("one\r\ntwo\rthree").lines, 3);
        assert_eq!(TextStats::of("a  b").words, 3);
    }

    #[test]
    fn test_wc_counts_piped_text() {
        let mut env = Environment::new();
        let res = run_builtin::<Wc>(&[], "a a", &mut env);
        assert_eq!(res, Outcome::Continue("1 2 3".into()));
    }

    #[test]
    fn test_wc_counts_file_and_ignores_extra_args() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "kek", "a a");
        let mut env = env_in(&dir);

        let res = run_builtin::<Wc>(&args(&["kek"]), "", &mut env);
        assert_eq!(res, Outcome::Continue("1 2 3".into()));

        let res = run_builtin::<Wc>(&args(&["kek", "a", "b", "c"]), "zzz", &mut env);
        assert_eq!(res, Outcome::Continue("1 2 3".into()));
    }

    #[test]
    fn test_wc_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = env_in(&dir);
        let res = run_builtin::<Wc>(&args(&["asf"]), "", &mut env);
        assert_eq!(res, Outcome::failed("No file named asf found"));
    }

    #[test]
    fn test_cat_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "kek", "a\na\na a a b \nc");
        let mut env = env_in(&dir);

        let res = run_builtin::<Cat>(&args(&["kek"]), "", &mut env);
        assert_eq!(res, Outcome::Continue("a\na\na a a b \nc".into()));
    }

    #[test]
    fn test_cat_passes_piped_text_when_no_args() {
        let mut env = Environment::new();
        let res = run_builtin::<Cat>(&[], "from stdin\nline2\n", &mut env);
        assert_eq!(res, Outcome::Continue("from stdin\nline2\n".into()));
    }

    #[test]
    fn test_cat_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = env_in(&dir);
        let res = run_builtin::<Cat>(&args(&["missingfile.txt"]), "", &mut env);
        assert_eq!(res, Outcome::failed("No file named missingfile.txt found"));
    }

    #[test]
    fn test_cd_relative_and_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let mut env = env_in(&dir);

        let res = run_builtin::<Cd>(&args(&["sub"]), "", &mut env);
        assert_eq!(res, Outcome::Continue(String::new()));
        assert_eq!(
            env.current_dir(),
            fs::canonicalize(dir.path().join("sub")).unwrap()
        );

        run_builtin::<Cd>(&args(&[".."]), "", &mut env);
        assert_eq!(env.current_dir(), fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn test_cd_without_target_stays() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = env_in(&dir);
        env.vars.set("HOME", "/");
        let before = env.current_dir().to_path_buf();

        let res = run_builtin::<Cd>(&[], "", &mut env);
        assert_eq!(res, Outcome::Continue(String::new()));
        assert_eq!(env.current_dir(), before);
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = env_in(&dir);
        let before = env.current_dir().to_path_buf();

        let res = run_builtin::<Cd>(&args(&["into/missing/dir"]), "", &mut env);
        assert_eq!(
            res,
            Outcome::failed("No directory named into/missing/dir found")
        );
        assert_eq!(env.current_dir(), before);
    }

    #[test]
    fn test_ls_lists_sorted_entries() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "b.txt", "");
        write_file(&dir, "a.txt", "");
        fs::create_dir(dir.path().join("c")).unwrap();
        let mut env = env_in(&dir);

        assert_eq!(
            run_builtin::<Ls>(&[], "", &mut env),
            Outcome::Continue("a.txt\nb.txt\nc".into())
        );
        assert_eq!(
            run_builtin::<Ls>(&args(&["c"]), "", &mut env),
            Outcome::Continue(String::new())
        );
    }

    #[test]
    fn test_ls_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "file", "");
        let mut env = env_in(&dir);

        assert_eq!(
            run_builtin::<Ls>(&args(&["nope"]), "", &mut env),
            Outcome::failed("No directory named nope found")
        );
        assert_eq!(
            run_builtin::<Ls>(&args(&["file"]), "", &mut env),
            Outcome::failed("No directory named file found")
        );
    }

    #[test]
    fn test_assign_sets_and_overwrites() {
        let mut env = Environment::new();

        let res = run_builtin::<Assign>(&args(&["a", "10"]), "ignored input", &mut env);
        assert_eq!(res, Outcome::Continue(String::new()));
        assert_eq!(env.vars.get("a"), "10");

        run_builtin::<Assign>(&args(&["a", "40 40"]), "", &mut env);
        assert_eq!(env.vars.get("a"), "40 40");

        run_builtin::<Assign>(&args(&["neg", "-5"]), "", &mut env);
        assert_eq!(env.vars.get("neg"), "-5");
    }

    #[test]
    fn test_assign_wrong_arity() {
        let mut env = Environment::new();
        assert!(run_builtin::<Assign>(&args(&["a"]), "", &mut env).is_interrupted());
        assert!(run_builtin::<Assign>(&args(&["a", "1", "2"]), "", &mut env).is_interrupted());
        assert_eq!(env.vars.lookup("a"), None);
    }

    #[test]
    fn test_assign_rejects_bad_name() {
        let mut env = Environment::new();
        let res = run_builtin::<Assign>(&args(&["1x", "1"]), "", &mut env);
        assert!(res.is_interrupted());
        assert_eq!(env.vars.lookup("1x"), None);
    }

    #[test]
    fn test_exit_terminates_regardless_of_args() {
        let mut env = Environment::new();
        assert_eq!(run_builtin::<Exit>(&[], "", &mut env), Outcome::Terminated);
        assert_eq!(
            run_builtin::<Exit>(&args(&["a", "--help", "-c"]), "aaaa", &mut env),
            Outcome::Terminated
        );
    }
}
