use crate::shell::Shell;
use anyhow::Result;
use std::collections::BTreeMap;

/// What the shell loop should do after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading commands in the current context.
    Continue,
    /// Leave the current context and return control to its owner.
    Leave,
    /// End the whole session.
    Quit,
}

/// Signature shared by every command handler.
///
/// Handlers receive the context they were invoked in and the argument words
/// following the verb. An `Err` is not recovered by the shell: handlers are
/// expected to report user mistakes and I/O failures on the console and
/// return `Ok`.
pub type Handler = fn(&mut Shell, &[String]) -> Result<Flow>;

/// A registered command, immutable once inserted into a [`Registry`].
#[derive(Clone)]
pub struct CommandDescriptor {
    /// Identifier of the context the command belongs to.
    pub context: &'static str,
    /// The verb the user types.
    pub name: &'static str,
    pub handler: Handler,
    /// One-line description for the `help` listing.
    pub summary: &'static str,
    /// Detailed usage text for `help <name>`.
    pub usage: &'static str,
    /// Words offered when completing the argument after the verb.
    pub completer: Option<&'static [&'static str]>,
}

impl std::fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("context", &self.context)
            .field("name", &self.name)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

/// Command name -> completion words for its first argument.
pub type CompletionTable = BTreeMap<String, Vec<String>>;

/// Table of commands keyed by owning context and command name.
///
/// Built once at startup (see [`crate::builtin::registry`]) and only read
/// afterwards. There is no way to remove a command.
#[derive(Debug, Default)]
pub struct Registry {
    contexts: BTreeMap<&'static str, BTreeMap<&'static str, CommandDescriptor>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command.
    ///
    /// The first registration of a (context, name) pair wins; later ones are
    /// dropped. Returns whether the descriptor was inserted.
    pub fn register(&mut self, descriptor: CommandDescriptor) -> bool {
        let commands = self.contexts.entry(descriptor.context).or_default();
        if commands.contains_key(descriptor.name) {
            log::debug!(
                "ignoring duplicate command {:?} in context {:?}",
                descriptor.name,
                descriptor.context
            );
            return false;
        }
        commands.insert(descriptor.name, descriptor);
        true
    }

    pub fn lookup(&self, context: &str, name: &str) -> Option<&CommandDescriptor> {
        self.contexts.get(context)?.get(name)
    }

    /// Commands of `context`, ordered by name.
    pub fn list_commands(&self, context: &str) -> impl Iterator<Item = &CommandDescriptor> {
        self.contexts
            .get(context)
            .into_iter()
            .flat_map(|commands| commands.values())
    }

    pub fn completion_table(&self, context: &str) -> CompletionTable {
        self.list_commands(context)
            .map(|cmd| {
                let words = cmd
                    .completer
                    .unwrap_or_default()
                    .iter()
                    .map(|w| w.to_string())
                    .collect();
                (cmd.name.to_string(), words)
            })
            .collect()
    }
}
