//! The fixed set of shell contexts known to dmsh.

use crate::cache::{Cache, keys};
use crate::campaign::CampaignDate;
use crate::keys::{KeyBindings, combat_bindings, dm_bindings};

pub const DM: &str = "dm";
pub const COMBAT: &str = "combat";

/// Static description of one context type, used to construct its shell.
pub struct ContextSpec {
    pub id: &'static str,
    /// Title shown at the top of `help`.
    pub display_name: &'static str,
    /// This context's own prompt segment.
    pub prompt: &'static str,
    pub key_bindings: fn() -> KeyBindings,
    pub toolbar: Option<fn(&Cache) -> String>,
}

/// Every context type, root first. The root shell instantiates each of the
/// others once as a subshell.
pub static CONTEXTS: [ContextSpec; 2] = [
    ContextSpec {
        id: DM,
        display_name: "Dungeon Master Shell",
        prompt: "dm",
        key_bindings: dm_bindings,
        toolbar: Some(dm_toolbar),
    },
    ContextSpec {
        id: COMBAT,
        display_name: "Combat Tracker",
        prompt: "combat",
        key_bindings: combat_bindings,
        toolbar: Some(combat_toolbar),
    },
];

pub fn root() -> &'static ContextSpec {
    &CONTEXTS[0]
}

fn dm_toolbar(cache: &Cache) -> String {
    let date = cache
        .get::<CampaignDate>(keys::DATE)
        .map(|d| d.to_string())
        .unwrap_or_else(|| "no date".to_string());
    let location = cache
        .get::<String>(keys::LOCATION)
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| "nowhere".to_string());
    let level = cache.get::<u8>(keys::LEVEL).unwrap_or(1);
    format!("{date} | {location} | level {level}")
}

fn combat_toolbar(cache: &Cache) -> String {
    let round = cache.get::<u32>(keys::COMBAT_ROUND).unwrap_or(0);
    format!("round {round}")
}
