//! Key chords bound directly to shell actions.
//!
//! Bindings bypass line parsing. The console reports a triggered [`Action`]
//! and the owning shell resolves it through
//! [`Shell::perform`](crate::shell::Shell::perform), which runs the same handler
//! the typed command would.

/// A single physical key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A letter pressed together with Control.
    Ctrl(char),
    /// A character pressed together with Alt (Meta).
    Alt(char),
    /// A function key, `F(1)` being F1.
    F(u8),
}

/// Logical actions a key chord can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Save and leave, same as typing `quit`.
    Quit,
    /// Show help for the current context.
    Help,
    /// Save the campaign, same as typing `save`.
    Save,
    /// Show today's date.
    Date,
    /// Run the `npc` command.
    Npc,
    /// Skip to the next track.
    Skip,
    /// Play the n-th playlist of the cached catalogue.
    Play(usize),
    /// List which key plays which playlist.
    Hotkeys,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub chord: Vec<Key>,
    pub action: Action,
}

/// Fixed set of chord bindings owned by one shell context.
#[derive(Debug, Clone, Default)]
pub struct KeyBindings {
    bindings: Vec<KeyBinding>,
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `chord` to `action`.
    ///
    /// Chords are unique within the set: binding an already bound chord
    /// replaces its action. Distinct chords may share an action.
    pub fn bind(&mut self, chord: impl Into<Vec<Key>>, action: Action) -> &mut Self {
        let chord = chord.into();
        match self.bindings.iter_mut().find(|b| b.chord == chord) {
            Some(existing) => existing.action = action,
            None => self.bindings.push(KeyBinding { chord, action }),
        }
        self
    }

    pub fn action_for(&self, chord: &[Key]) -> Option<Action> {
        self.bindings
            .iter()
            .find(|b| b.chord == chord)
            .map(|b| b.action)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyBinding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Number of playlists reachable through the Alt-1..Alt-9 quick-switch keys.
pub const PLAYLIST_SLOTS: usize = 9;

/// The chord playing playlist `slot` (0-based), e.g. Alt-1 for slot 0.
pub fn playlist_chord(slot: usize) -> Option<Key> {
    if slot >= PLAYLIST_SLOTS {
        return None;
    }
    char::from_digit(slot as u32 + 1, 10).map(Key::Alt)
}

/// Bindings of the root shell.
pub fn dm_bindings() -> KeyBindings {
    let mut keys = KeyBindings::new();
    keys.bind([Key::Ctrl('q')], Action::Quit)
        .bind([Key::Ctrl('d')], Action::Quit)
        .bind([Key::F(1)], Action::Help)
        .bind([Key::F(4)], Action::Npc)
        .bind([Key::F(5)], Action::Date)
        .bind([Key::F(8)], Action::Save)
        .bind([Key::F(9)], Action::Hotkeys)
        .bind([Key::Ctrl('n')], Action::Skip);
    for slot in 0..PLAYLIST_SLOTS {
        if let Some(chord) = playlist_chord(slot) {
            keys.bind([chord], Action::Play(slot));
        }
    }
    keys
}

/// Bindings of the combat tracker.
pub fn combat_bindings() -> KeyBindings {
    let mut keys = KeyBindings::new();
    keys.bind([Key::Ctrl('q')], Action::Quit)
        .bind([Key::Ctrl('d')], Action::Quit)
        .bind([Key::F(1)], Action::Help);
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_chords_share_quit() {
        let keys = dm_bindings();
        assert_eq!(keys.action_for(&[Key::Ctrl('q')]), Some(Action::Quit));
        assert_eq!(keys.action_for(&[Key::Ctrl('d')]), Some(Action::Quit));
    }

    #[test]
    fn test_function_keys_run_frequent_commands() {
        let keys = dm_bindings();
        assert_eq!(keys.action_for(&[Key::F(1)]), Some(Action::Help));
        assert_eq!(keys.action_for(&[Key::F(4)]), Some(Action::Npc));
        assert_eq!(keys.action_for(&[Key::F(5)]), Some(Action::Date));
        assert_eq!(keys.action_for(&[Key::F(8)]), Some(Action::Save));
        assert_eq!(keys.action_for(&[Key::F(9)]), Some(Action::Hotkeys));
        assert_eq!(keys.action_for(&[Key::F(10)]), None);
    }

    #[test]
    fn test_alt_digits_map_to_playlist_slots() {
        let keys = dm_bindings();
        assert_eq!(keys.action_for(&[Key::Alt('1')]), Some(Action::Play(0)));
        assert_eq!(keys.action_for(&[Key::Alt('9')]), Some(Action::Play(8)));
        assert_eq!(keys.action_for(&[Key::Alt('0')]), None);
        assert_eq!(playlist_chord(8), Some(Key::Alt('9')));
        assert_eq!(playlist_chord(PLAYLIST_SLOTS), None);
    }

    #[test]
    fn test_rebinding_a_chord_replaces_its_action() {
        let mut keys = KeyBindings::new();
        keys.bind([Key::Ctrl('x')], Action::Skip);
        keys.bind([Key::Ctrl('x')], Action::Help);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys.action_for(&[Key::Ctrl('x')]), Some(Action::Help));
    }

    #[test]
    fn test_multi_key_chords_are_distinct_from_their_prefix() {
        let mut keys = KeyBindings::new();
        keys.bind([Key::Ctrl('x'), Key::Ctrl('s')], Action::Quit);
        assert_eq!(keys.action_for(&[Key::Ctrl('x')]), None);
        assert_eq!(
            keys.action_for(&[Key::Ctrl('x'), Key::Ctrl('s')]),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_combat_has_no_music_keys() {
        let keys = combat_bindings();
        assert!(keys.iter().all(|b| !matches!(b.action, Action::Skip | Action::Play(_) | Action::Hotkeys)));
        assert_eq!(keys.len(), 3);
        assert_eq!(keys.action_for(&[Key::F(8)]), None);
    }
}
