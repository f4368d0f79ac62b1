use crate::console::{Console, Input, Prompt};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Everything a [`ScriptedConsole`] has shown or been asked.
#[derive(Debug, Default)]
pub struct Transcript {
    pub printed: Vec<String>,
    pub errors: Vec<String>,
    /// Rendered prompt of every read, in order.
    pub prompts: Vec<String>,
    pub toolbars: Vec<Option<String>>,
}

impl Transcript {
    pub fn last_printed(&self) -> Option<&str> {
        self.printed.last().map(String::as_str)
    }
}

/// Memory-backed console that replays scripted input.
///
/// Once the script runs out every read returns [`Input::Eof`].
pub struct ScriptedConsole {
    script: VecDeque<Input>,
    transcript: Rc<RefCell<Transcript>>,
}

impl ScriptedConsole {
    pub fn new(script: impl IntoIterator<Item = Input>) -> Self {
        Self {
            script: script.into_iter().collect(),
            transcript: Rc::new(RefCell::new(Transcript::default())),
        }
    }

    /// Convenience: create console and return (console, transcript_handle).
    pub fn with_handle(script: impl IntoIterator<Item = Input>) -> (Self, Rc<RefCell<Transcript>>) {
        let console = ScriptedConsole::new(script);
        let handle = Rc::clone(&console.transcript);
        (console, handle)
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, prompt: &Prompt<'_>) -> anyhow::Result<Input> {
        let mut transcript = self.transcript.borrow_mut();
        transcript.prompts.push(prompt.render());
        transcript.toolbars.push(prompt.toolbar.clone());
        Ok(self.script.pop_front().unwrap_or(Input::Eof))
    }

    fn print(&mut self, text: &str) {
        self.transcript.borrow_mut().printed.push(text.to_string());
    }

    fn error(&mut self, text: &str) {
        self.transcript.borrow_mut().errors.push(text.to_string());
    }
}
