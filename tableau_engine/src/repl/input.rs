//! Terminal input handling for the console.
//!
//! Wraps rustyline configuration and completion tailored to the console's
//! command words and the save slots of the running world.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::save_files::collect_save_slots;

/// Outcome of reading a line from the console input.
pub enum InputEvent {
    Line(String),
    Eof,
    Interrupted,
}

const COMMAND_TERMS: &[&str] = &[
    "actors", "cancel", "choose", "click", "do", "done", "exit", "help", "load", "look", "quit", "running", "save", "saves",
    "scene", "tick", "verbs", "wait", "walk",
];

type ReplEditor = rustyline::Editor<ConsoleHelper, DefaultHistory>;

struct ConsoleHelper {
    save_dir: PathBuf,
}

impl Helper for ConsoleHelper {}

impl Completer for ConsoleHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let (start, prefix) = current_prefix(line, pos);
        if prefix.is_empty() {
            return Ok((start, Vec::new()));
        }
        let lower = prefix.to_lowercase();
        if let Some(partial) = lower.strip_prefix("load ") {
            let offset = pos - partial.len();
            let pairs = available_save_slots(&self.save_dir)
                .into_iter()
                .filter(|slot| slot.starts_with(partial))
                .map(|slot| Pair {
                    display: slot.clone(),
                    replacement: slot,
                })
                .collect();
            return Ok((offset, pairs));
        }
        let pairs = command_completions(&lower)
            .map(|term| Pair {
                display: term.to_string(),
                replacement: term.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ConsoleHelper {
    type Hint = String;
}

impl Highlighter for ConsoleHelper {}

impl Validator for ConsoleHelper {}

fn current_prefix(line: &str, pos: usize) -> (usize, String) {
    let slice = &line[..pos];
    let trimmed = slice.trim_start_matches(char::is_whitespace);
    let start = pos - trimmed.len();
    (start, trimmed.to_string())
}

fn command_completions(lower: &str) -> impl Iterator<Item = &'static str> + '_ {
    COMMAND_TERMS.iter().copied().filter(move |term| term.starts_with(lower))
}

fn available_save_slots(dir: &Path) -> Vec<String> {
    match collect_save_slots(dir) {
        Ok(slots) => {
            let mut names: Vec<String> = slots.into_iter().map(|slot| slot.slot).collect();
            names.dedup();
            names
        },
        Err(err) => {
            warn!("failed to enumerate save slots for completion: {err}");
            Vec::new()
        },
    }
}

/// Console line source.
///
/// Starts on a rustyline editor when stdin is a terminal and drops to plain
/// buffered stdin for pipes, or for good once the editor reports a hard error.
pub struct InputManager {
    editor: Option<Box<LineEditor>>,
    buffer: String,
}

impl InputManager {
    pub fn new(save_dir: &Path) -> Self {
        let editor = if io::stdin().is_terminal() {
            LineEditor::open(save_dir)
                .inspect_err(|err| warn!("line editor unavailable ({err}); reading plain stdin"))
                .ok()
        } else {
            info!("stdin is not a terminal; reading plain stdin");
            None
        };
        Self {
            editor,
            buffer: String::new(),
        }
    }

    pub fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        if let Some(editor) = self.editor.as_mut() {
            match editor.read_line(prompt) {
                Ok(event) => return Ok(event),
                Err(err) => {
                    warn!("line editor failed ({err}); reading plain stdin from now on");
                    self.editor = None;
                },
            }
        }
        self.read_plain(prompt)
    }

    fn read_plain(&mut self, prompt: &str) -> io::Result<InputEvent> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        self.buffer.clear();
        if io::stdin().read_line(&mut self.buffer)? == 0 {
            return Ok(InputEvent::Eof);
        }
        Ok(InputEvent::Line(self.buffer.trim_end_matches(['\n', '\r']).to_string()))
    }
}

struct LineEditor {
    editor: ReplEditor,
    history: Option<PathBuf>,
}

impl LineEditor {
    fn open(save_dir: &Path) -> io::Result<Box<Self>> {
        let mut editor = ReplEditor::new().map_err(readline_io_error)?;
        editor.set_helper(Some(ConsoleHelper {
            save_dir: save_dir.to_path_buf(),
        }));

        let history = dirs::data_dir().or_else(dirs::data_local_dir).map(|base| history_file(&base));
        if let Some(path) = &history {
            load_history(&mut editor, path);
        }
        info!("console input via rustyline");
        Ok(Box::new(Self { editor, history }))
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        let line = match self.editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => return Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => return Ok(InputEvent::Eof),
            Err(err) => return Err(readline_io_error(err)),
        };
        if !line.trim().is_empty() {
            self.remember(&line);
        }
        Ok(InputEvent::Line(line))
    }

    fn remember(&mut self, line: &str) {
        if let Err(err) = self.editor.add_history_entry(line) {
            warn!("history entry dropped: {err}");
        }
        if let Some(path) = &self.history
            && let Err(err) = self.editor.save_history(path)
        {
            warn!("could not write history {}: {err}", path.display());
        }
    }
}

fn load_history(editor: &mut ReplEditor, path: &Path) {
    if let Some(dir) = path.parent()
        && let Err(err) = fs::create_dir_all(dir)
    {
        warn!("could not create {}: {err}", dir.display());
        return;
    }
    match editor.load_history(path) {
        Ok(()) => {},
        Err(ReadlineError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
            info!("starting a new history file at {}", path.display());
        },
        Err(err) => warn!("could not read history {}: {err}", path.display()),
    }
}

fn readline_io_error(err: ReadlineError) -> io::Error {
    match err {
        ReadlineError::Io(io_err) => io_err,
        other => io::Error::other(other),
    }
}

fn history_file(base: &Path) -> PathBuf {
    base.join("tableau_engine").join("history.txt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TABLEAU_VERSION;
    use tempfile::tempdir;

    #[test]
    fn history_lives_under_the_engine_directory() {
        let path = history_file(Path::new("/tmp/tableau-test"));
        assert!(path.ends_with(Path::new("tableau_engine/history.txt")));
    }

    #[test]
    fn readline_errors_keep_their_io_kind() {
        let err = readline_io_error(ReadlineError::Io(io::Error::from(io::ErrorKind::BrokenPipe)));
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn command_words_complete_by_prefix() {
        let found: Vec<_> = command_completions("sa").collect();
        assert_eq!(found, vec!["save", "saves"]);
        assert!(command_completions("xyz").next().is_none());
    }

    #[test]
    fn save_slots_are_listed_once() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(format!("alpha-tableau-{TABLEAU_VERSION}.ron")), "()").unwrap();
        fs::write(dir.path().join("alpha-tableau-0.0.1.ron"), "()").unwrap();
        fs::write(dir.path().join("beta-tableau-0.0.1.ron"), "()").unwrap();
        assert_eq!(available_save_slots(dir.path()), vec!["alpha", "beta"]);
    }
}
