use crate::config::ReplSettings;
use crate::outcome::ExecutionResult;
use crate::session::Session;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;

/// Read-Eval-Print Loop over a session.
///
/// Runs until `exit`, Ctrl-D, or a terminal error. Ctrl-C discards the
/// current line.
pub fn run(session: &mut Session, settings: &ReplSettings) -> rustyline::Result<()> {
    let mut rl = DefaultEditor::new()?;
    if let Some(history) = &settings.history_file
        && let Err(e) = rl.load_history(history)
    {
        log::debug!("no history loaded from {}: {}", history.display(), e);
    }

    loop {
        match rl.readline(&settings.prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    rl.add_history_entry(line.as_str())?;
                }
                let result = session.execute(&line);
                if result.terminated {
                    break;
                }
                print_result(&result);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                log::error!("readline failed: {err}");
                break;
            }
        }
    }

    if let Some(history) = &settings.history_file
        && let Err(e) = rl.save_history(history)
    {
        log::warn!("can't save history to {}: {}", history.display(), e);
    }
    Ok(())
}

/// Print a result the way the REPL and `-c` do: failures on stderr, success
/// on stdout, each ending with a newline.
pub fn print_result(result: &ExecutionResult) {
    if result.text.is_empty() {
        return;
    }
    let newline = if result.text.ends_with('\n') { "" } else { "\n" };
    if result.interrupted {
        eprint!("{}{}", result.text, newline);
    } else {
        print!("{}{}", result.text, newline);
        let _ = std::io::stdout().flush();
    }
}
