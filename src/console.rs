//! The console capability consumed by the shell: line input with completion and
//! key bindings, plus output and error channels.

use crate::command::CompletionTable;
use crate::keys::{Action, Key, KeyBindings};
use anyhow::Result;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Context, Editor, Event, EventContext, EventHandler, Helper,
    KeyCode, KeyEvent, Modifiers, RepeatCount,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

/// Everything the console needs to read one line on behalf of a context.
pub struct Prompt<'a> {
    /// Prompt segments, outermost context first.
    pub label: &'a [String],
    /// Completion source of the asking context.
    pub completions: &'a CompletionTable,
    /// Status text shown alongside the prompt.
    pub toolbar: Option<String>,
    pub key_bindings: Option<&'a KeyBindings>,
}

impl Prompt<'_> {
    /// The prompt as shown to the user, e.g. `dm > combat > `.
    pub fn render(&self) -> String {
        format!("{} > ", self.label.join(" > "))
    }
}

/// One unit of input handed back to the shell loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// A bound key chord fired before a line was submitted.
    Action(Action),
    /// The user hit Ctrl-C.
    Interrupted,
    /// The input stream was closed.
    Eof,
}

pub trait Console {
    /// Block until the user submits a line or triggers a bound chord.
    fn read_line(&mut self, prompt: &Prompt<'_>) -> Result<Input>;

    fn print(&mut self, text: &str);

    fn error(&mut self, text: &str);
}

/// Console handle shared by a root shell and all of its subshells.
pub type SharedConsole = Rc<RefCell<dyn Console>>;

/// Terminal console backed by rustyline.
pub struct RustylineConsole {
    editor: Editor<ShellHelper, DefaultHistory>,
    pending: Arc<Mutex<Option<Action>>>,
    bound: Vec<Vec<Key>>,
}

impl RustylineConsole {
    pub fn new() -> Result<Self> {
        let mut editor = Editor::<ShellHelper, DefaultHistory>::new()?;
        editor.set_helper(Some(ShellHelper::default()));
        Ok(Self {
            editor,
            pending: Arc::new(Mutex::new(None)),
            bound: Vec::new(),
        })
    }

    /// Replace the editor's chord bindings with `bindings`.
    fn rebind(&mut self, bindings: Option<&KeyBindings>) {
        for chord in self.bound.drain(..) {
            self.editor.unbind_sequence(chord_event(&chord));
        }
        let Some(bindings) = bindings else {
            return;
        };
        for binding in bindings.iter() {
            let trigger = Trigger {
                action: binding.action,
                pending: Arc::clone(&self.pending),
            };
            self.editor.bind_sequence(
                chord_event(&binding.chord),
                EventHandler::Conditional(Box::new(trigger)),
            );
            self.bound.push(binding.chord.clone());
        }
    }

    fn take_pending(&self) -> Option<Action> {
        self.pending.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl Console for RustylineConsole {
    fn read_line(&mut self, prompt: &Prompt<'_>) -> Result<Input> {
        if let Some(helper) = self.editor.helper_mut() {
            helper.completions = prompt.completions.clone();
        }
        self.rebind(prompt.key_bindings);
        if let Some(toolbar) = &prompt.toolbar {
            println!("[{toolbar}]");
        }

        match self.editor.readline(&prompt.render()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(match self.take_pending() {
                Some(action) => Input::Action(action),
                None => Input::Interrupted,
            }),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(err) => Err(err.into()),
        }
    }

    fn print(&mut self, text: &str) {
        println!("{text}");
    }

    fn error(&mut self, text: &str) {
        eprintln!("Error: {text}");
    }
}

/// Records the bound action and interrupts the line being edited, so the
/// shell runs the action before prompting again.
struct Trigger {
    action: Action,
    pending: Arc<Mutex<Option<Action>>>,
}

impl ConditionalEventHandler for Trigger {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        _ctx: &EventContext,
    ) -> Option<Cmd> {
        if let Ok(mut slot) = self.pending.lock() {
            *slot = Some(self.action);
        }
        Some(Cmd::Interrupt)
    }
}

fn key_event(key: Key) -> KeyEvent {
    match key {
        Key::Ctrl(c) => KeyEvent::ctrl(c),
        Key::Alt(c) => KeyEvent::new(c, Modifiers::ALT),
        Key::F(n) => KeyEvent(KeyCode::F(n), Modifiers::NONE),
    }
}

fn chord_event(chord: &[Key]) -> Event {
    match chord {
        [single] => Event::from(key_event(*single)),
        _ => Event::KeySeq(chord.iter().copied().map(key_event).collect()),
    }
}

/// Nested completer: the verb first, then the verb's first argument.
#[derive(Default)]
pub struct ShellHelper {
    completions: CompletionTable,
}

impl ShellHelper {
    fn candidates(&self, line: &str) -> (usize, Vec<String>) {
        let start = line
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);
        let prefix = &line[start..];
        let words: Vec<&str> = line[..start].split_whitespace().collect();

        let options: Vec<String> = match words.as_slice() {
            [] => self.completions.keys().cloned().collect(),
            [verb] => self.completions.get(*verb).cloned().unwrap_or_default(),
            _ => Vec::new(),
        };
        let matches = options
            .into_iter()
            .filter(|option| option.starts_with(prefix))
            .collect();
        (start, matches)
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, matches) = self.candidates(&line[..pos]);
        let pairs = matches
            .into_iter()
            .map(|word| Pair {
                display: word.clone(),
                replacement: word,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}
