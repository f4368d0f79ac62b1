use crate::cache::Cache;
use crate::campaign::CampaignStore;
use crate::command::{CompletionTable, Flow, Registry};
use crate::console::{Console, Input, Prompt, SharedConsole};
use crate::contexts::{self, CONTEXTS, ContextSpec};
use crate::croaker::CroakerClient;
use crate::keys::{Action, KeyBindings, PLAYLIST_SLOTS};
use anyhow::Result;
use std::cell::RefMut;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Collaborators command handlers call into.
pub struct Services {
    pub croaker: CroakerClient,
    pub store: Box<dyn CampaignStore>,
}

/// Process-wide pieces shared by a root shell and its subshells.
#[derive(Clone)]
pub struct Session {
    pub registry: Rc<Registry>,
    pub console: SharedConsole,
    pub services: Rc<Services>,
}

impl Session {
    pub fn new(registry: Registry, console: SharedConsole, services: Services) -> Self {
        Self {
            registry: Rc::new(registry),
            console,
            services: Rc::new(services),
        }
    }
}

/// One interactive context: reads lines, dispatches them through the registry,
/// and owns the subshells it can delegate to.
///
/// Example
/// ```no_run
/// use dmsh::{builtin, Cache, RustylineConsole, Services, Session, Shell};
/// use dmsh::campaign::TomlStore;
/// use dmsh::croaker::CroakerClient;
/// use std::{cell::RefCell, rc::Rc};
///
/// let console = Rc::new(RefCell::new(RustylineConsole::new().unwrap()));
/// let services = Services {
///     croaker: CroakerClient::new("localhost", 8003),
///     store: Box::new(TomlStore),
/// };
/// let mut shell = Shell::root(Session::new(builtin::registry(), console, services), Cache::new());
/// shell.start(None).unwrap();
/// ```
pub struct Shell {
    spec: &'static ContextSpec,
    label: Vec<String>,
    cache: Cache,
    session: Session,
    completions: CompletionTable,
    key_bindings: KeyBindings,
    subshells: BTreeMap<&'static str, Shell>,
}

impl Shell {
    /// Build a shell for `spec` without any subshells.
    ///
    /// `parent_label` is the prompt of the owning shell; this shell's own
    /// prompt segment is appended to it.
    pub fn new(spec: &'static ContextSpec, session: Session, cache: Cache, parent_label: &[String]) -> Self {
        let mut label = parent_label.to_vec();
        label.push(spec.prompt.to_string());
        Self {
            spec,
            label,
            cache,
            completions: session.registry.completion_table(spec.id),
            key_bindings: (spec.key_bindings)(),
            session,
            subshells: BTreeMap::new(),
        }
    }

    /// Build the root shell along with one subshell of every other context.
    pub fn root(session: Session, cache: Cache) -> Self {
        let mut shell = Self::new(contexts::root(), session, cache, &[]);
        shell.compose_subshells();
        shell
    }

    fn compose_subshells(&mut self) {
        for spec in CONTEXTS.iter().filter(|spec| spec.id != self.spec.id) {
            let subshell = Shell::new(spec, self.session.clone(), self.cache.clone(), &self.label);
            log::debug!("{}: composed subshell {}", self.spec.id, spec.id);
            self.subshells.insert(spec.id, subshell);
        }
    }

    pub fn id(&self) -> &'static str {
        self.spec.id
    }

    pub fn display_name(&self) -> &'static str {
        self.spec.display_name
    }

    pub fn label(&self) -> &[String] {
        &self.label
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn console(&self) -> RefMut<'_, dyn Console> {
        self.session.console.borrow_mut()
    }

    pub fn services(&self) -> &Services {
        &self.session.services
    }

    pub fn key_bindings(&self) -> &KeyBindings {
        &self.key_bindings
    }

    pub fn subshell(&self, id: &str) -> Option<&Shell> {
        self.subshells.get(id)
    }

    pub fn subshell_mut(&mut self, id: &str) -> Option<&mut Shell> {
        self.subshells.get_mut(id)
    }

    pub fn subshell_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.subshells.keys().copied()
    }

    pub fn toolbar(&self) -> Option<String> {
        self.spec.toolbar.map(|render| render(&self.cache))
    }

    /// Run the read-dispatch loop until a command leaves or quits.
    ///
    /// `initial_line` is dispatched before the first prompt. Ctrl-C and end of
    /// input behave like the quit action.
    pub fn start(&mut self, initial_line: Option<String>) -> Result<Flow> {
        let mut pending = initial_line;
        loop {
            let line = match pending.take() {
                Some(line) => line,
                None => match self.read_input()? {
                    Input::Line(line) => line,
                    Input::Action(action) => {
                        match self.perform(action)? {
                            Flow::Continue => continue,
                            flow => return Ok(flow),
                        }
                    }
                    Input::Interrupted | Input::Eof => {
                        return match self.perform(Action::Quit)? {
                            Flow::Continue => Ok(Flow::Quit),
                            flow => Ok(flow),
                        };
                    }
                },
            };

            let mut words = line.split_whitespace();
            let Some(verb) = words.next() else {
                continue;
            };
            let args: Vec<String> = words.map(str::to_owned).collect();
            match self.process(verb, &args)? {
                Flow::Continue => {}
                flow => return Ok(flow),
            }
        }
    }

    fn read_input(&self) -> Result<Input> {
        let prompt = Prompt {
            label: &self.label,
            completions: &self.completions,
            toolbar: self.toolbar(),
            key_bindings: Some(&self.key_bindings),
        };
        self.session.console.borrow_mut().read_line(&prompt)
    }

    /// Dispatch one command in this context.
    ///
    /// Unknown verbs are reported on the console and never fail; handler
    /// errors are passed through untouched.
    pub fn process(&mut self, verb: &str, args: &[String]) -> Result<Flow> {
        let handler = self
            .session
            .registry
            .lookup(self.spec.id, verb)
            .map(|cmd| cmd.handler);
        match handler {
            Some(handler) => {
                log::debug!("{}: {verb} {args:?}", self.spec.id);
                handler(self, args)
            }
            None => {
                self.console()
                    .error(&format!("Command {verb} not understood; try 'help' for help."));
                Ok(Flow::Continue)
            }
        }
    }

    /// The full usage block: title, then every command sorted by name.
    pub fn usage(&self) -> String {
        let mut text = format!(
            "{}\n\nAvailable commands are listed below. Try 'help COMMAND' for detailed help.\n\nCOMMANDS\n\n",
            self.display_name()
        );
        for cmd in self.session.registry.list_commands(self.spec.id) {
            text.push_str(&format!("    {:10}    {}\n", cmd.name, cmd.summary));
        }
        text
    }

    /// Usage of `topic` when it names a command here, else the full block.
    pub fn help_text(&self, topic: Option<&str>) -> String {
        topic
            .and_then(|name| self.session.registry.lookup(self.spec.id, name))
            .map(|cmd| cmd.usage.to_string())
            .unwrap_or_else(|| self.usage())
    }

    pub fn help(&mut self, args: &[String]) -> Result<Flow> {
        let text = self.help_text(args.first().map(String::as_str));
        self.console().print(&text);
        Ok(Flow::Continue)
    }

    /// Run a key-bound action through the same handler its command uses.
    pub fn perform(&mut self, action: Action) -> Result<Flow> {
        match action {
            Action::Quit => self.process("quit", &[]),
            Action::Help => self.process("help", &[]),
            Action::Save => self.process("save", &[]),
            Action::Date => self.process("date", &[]),
            Action::Npc => self.process("npc", &[]),
            Action::Skip => self.process("music", &["skip".to_string()]),
            Action::Play(slot) => {
                let Some(playlists) = self.cached_playlists() else {
                    return Ok(Flow::Continue);
                };
                match playlists.get(slot) {
                    Some(name) => self.process("music", &["play".to_string(), name.clone()]),
                    None => {
                        self.console()
                            .error(&format!("No playlist in slot {}.", slot + 1));
                        Ok(Flow::Continue)
                    }
                }
            }
            Action::Hotkeys => {
                if let Some(playlists) = self.cached_playlists() {
                    self.console().print(&hotkey_listing(&playlists));
                }
                Ok(Flow::Continue)
            }
        }
    }

    /// The croaker catalogue, or `None` after reporting why it is unavailable.
    fn cached_playlists(&self) -> Option<Vec<String>> {
        match self.services().croaker.playlists() {
            Ok(playlists) => Some(playlists.to_vec()),
            Err(e) => {
                self.console().error(&format!("Could not fetch playlists: {e}"));
                None
            }
        }
    }
}

fn hotkey_listing(playlists: &[String]) -> String {
    if playlists.is_empty() {
        return "The croaker server has no playlists.".to_string();
    }
    let mut text = String::from("To switch playlists, press Alt and a number:\n");
    for (slot, name) in playlists.iter().enumerate().take(PLAYLIST_SLOTS) {
        text.push_str(&format!("  {}  {name}\n", slot + 1));
    }
    text.push_str("\nSee also the music command.");
    text
}
