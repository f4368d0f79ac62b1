//! Commands known to the shell at compile time.
//!
//! [`BUILTINS`] is the one place commands are declared; [`registry`] turns it
//! into the [`Registry`] every shell reads from. Commands with flags or
//! subcommands are parsed with [`argh`].

use crate::cache::keys;
use crate::campaign::{CampaignDate, CampaignState, MAX_LEVEL, MIN_LEVEL};
use crate::command::{CommandDescriptor, Flow, Registry};
use crate::contexts::{COMBAT, DM};
use crate::error::DmshError;
use crate::shell::Shell;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::path::PathBuf;

/// Every command, in no particular order. Duplicates would be dropped by the
/// registry, first one wins.
pub static BUILTINS: &[CommandDescriptor] = &[
    CommandDescriptor {
        context: DM,
        name: "help",
        handler: help,
        summary: "Display the help message.",
        usage: HELP_USAGE,
        completer: Some(&[
            "combat", "date", "help", "level", "location", "music", "npc", "quit", "save",
        ]),
    },
    CommandDescriptor {
        context: DM,
        name: "quit",
        handler: quit,
        summary: "Save the campaign and quit.",
        usage: QUIT_USAGE,
        completer: None,
    },
    CommandDescriptor {
        context: DM,
        name: "save",
        handler: save,
        summary: "Save the campaign.",
        usage: SAVE_USAGE,
        completer: None,
    },
    CommandDescriptor {
        context: DM,
        name: "date",
        handler: date,
        summary: "Show or set the campaign date.",
        usage: DATE_USAGE,
        completer: Some(&["set"]),
    },
    CommandDescriptor {
        context: DM,
        name: "location",
        handler: location,
        summary: "Show or set the party's location.",
        usage: LOCATION_USAGE,
        completer: Some(REGIONS),
    },
    CommandDescriptor {
        context: DM,
        name: "level",
        handler: level,
        summary: "Show or set the party level.",
        usage: LEVEL_USAGE,
        completer: None,
    },
    CommandDescriptor {
        context: DM,
        name: "music",
        handler: music,
        summary: "Control the croaker music server.",
        usage: MUSIC_USAGE,
        completer: Some(&["list", "play", "skip"]),
    },
    CommandDescriptor {
        context: DM,
        name: "combat",
        handler: combat,
        summary: "Enter the combat tracker.",
        usage: COMBAT_USAGE,
        completer: None,
    },
    CommandDescriptor {
        context: DM,
        name: "npc",
        handler: npc,
        summary: "Generate an NPC.",
        usage: NPC_USAGE,
        completer: None,
    },
    CommandDescriptor {
        context: COMBAT,
        name: "help",
        handler: help,
        summary: "Display the help message.",
        usage: HELP_USAGE,
        completer: Some(&["done", "help", "quit", "round"]),
    },
    CommandDescriptor {
        context: COMBAT,
        name: "round",
        handler: round,
        summary: "Show or advance the combat round.",
        usage: ROUND_USAGE,
        completer: Some(&["next", "reset"]),
    },
    CommandDescriptor {
        context: COMBAT,
        name: "done",
        handler: done,
        summary: "Leave the combat tracker.",
        usage: DONE_USAGE,
        completer: None,
    },
    CommandDescriptor {
        context: COMBAT,
        name: "quit",
        handler: quit,
        summary: "Save the campaign and quit.",
        usage: QUIT_USAGE,
        completer: None,
    },
];

/// Regions of the Sahwat Desert offered when completing `location`.
const REGIONS: &[&str] = &[
    "Calamity Ridge",
    "Dust River Canyon",
    "Gopher Gulch",
    "The Blooming Wastes",
];

const HELP_USAGE: &str = "\
help [COMMAND]

Display the list of commands, or the detailed help of COMMAND.
";

const QUIT_USAGE: &str = "\
quit

Save the campaign and end the session. Ctrl-Q, Ctrl-D and Ctrl-C do the same.
";

const SAVE_USAGE: &str = "\
save

Write the campaign to the data directory. The previous save is kept as a
numbered backup.
";

const DATE_USAGE: &str = "\
date
date set ERA.YEAR.MONTH.DAY

Without arguments, show today's date in the campaign. With 'set', move the
campaign to the given date, e.g. 'date set 2.1125.6.1'.
";

const LOCATION_USAGE: &str = "\
location [NAME...]

Without arguments, show where the party is. Otherwise set the party's location.
";

const LEVEL_USAGE: &str = "\
level [LEVEL]

Without arguments, show the party level. Otherwise set it; levels run 1 to 20.
";

const MUSIC_USAGE: &str = "\
music
music list [PLAYLIST]
music play PLAYLIST
music skip

Control playback on the croaker server. Without arguments, or with 'list' and
no playlist, show the playlists known when the shell first asked for them.
'list PLAYLIST' asks the server for that playlist's tracks. 'play' switches to
PLAYLIST and 'skip' moves to the next track.

Playlist names may contain spaces, e.g. 'music play Dust River'. Alt-1 to
Alt-9 play the first nine playlists, F9 lists them, and Ctrl-N skips.
";

const COMBAT_USAGE: &str = "\
combat [COMMAND...]

Enter the combat tracker, optionally running COMMAND there first. Type 'done'
to come back.
";

const NPC_USAGE: &str = "\
npc

Generate a random NPC. Not available in this version.
";

const ROUND_USAGE: &str = "\
round
round next
round reset

Show the current round, advance to the next one, or start over.
";

const DONE_USAGE: &str = "\
done

Leave the combat tracker and return to the main shell.
";

/// Build the registry of every builtin command.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    register_builtins(&mut registry);
    registry
}

pub fn register_builtins(registry: &mut Registry) {
    for descriptor in BUILTINS {
        registry.register(descriptor.clone());
    }
}

/// Parse `args` with argh, printing help or reporting bad arguments on the
/// console. Returns `None` when the command should not run.
fn parse_args<T: FromArgs>(shell: &Shell, name: &str, args: &[String]) -> Option<T> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match T::from_args(&[name], &args) {
        Ok(parsed) => Some(parsed),
        Err(EarlyExit { output, status }) => {
            match status {
                Ok(()) => shell.console().print(output.trim_end()),
                Err(()) => shell.console().error(output.trim_end()),
            }
            None
        }
    }
}

fn help(shell: &mut Shell, args: &[String]) -> Result<Flow> {
    shell.help(args)
}

/// Save the campaign held in the cache to the configured data directory.
pub fn save_campaign(shell: &Shell) -> crate::error::Result<(PathBuf, usize)> {
    let state = CampaignState::from_cache(shell.cache())
        .ok_or_else(|| DmshError::Config("no campaign loaded".to_string()))?;
    let path: PathBuf = shell
        .cache()
        .get(keys::DATA_PATH)
        .ok_or_else(|| DmshError::Config("no data path configured".to_string()))?;
    shell.services().store.save(&state, &path, &state.name)
}

fn report_saved(shell: &Shell, path: &std::path::Path, backups: usize) {
    shell
        .console()
        .print(&format!("Saved to {} ({backups} backups).", path.display()));
}

fn quit(shell: &mut Shell, _args: &[String]) -> Result<Flow> {
    match save_campaign(shell) {
        Ok((path, backups)) => report_saved(shell, &path, backups),
        Err(e) => {
            log::warn!("save on quit failed: {e}");
            shell
                .console()
                .error(&format!("Could not save the campaign: {e}"));
        }
    }
    Ok(Flow::Quit)
}

fn save(shell: &mut Shell, _args: &[String]) -> Result<Flow> {
    match save_campaign(shell) {
        Ok((path, backups)) => report_saved(shell, &path, backups),
        Err(e) => shell
            .console()
            .error(&format!("Could not save the campaign: {e}")),
    }
    Ok(Flow::Continue)
}

fn show_date(shell: &Shell) {
    match shell.cache().get::<CampaignDate>(keys::DATE) {
        Some(today) => shell.console().print(&format!("Today is {today}.")),
        None => shell.console().error("The campaign has no date."),
    }
}

fn date(shell: &mut Shell, args: &[String]) -> Result<Flow> {
    match args {
        [] => {}
        [sub, value] if sub == "set" => match value.parse::<CampaignDate>() {
            Ok(new_date) => shell.cache().set(keys::DATE, new_date),
            Err(e) => shell.console().error(&e.to_string()),
        },
        [sub, ..] if sub == "set" => shell.console().error("usage: date set ERA.YEAR.MONTH.DAY"),
        [other, ..] => {
            shell
                .console()
                .error(&format!("Unknown date command {other}; try 'help date'."));
            return Ok(Flow::Continue);
        }
    }
    show_date(shell);
    Ok(Flow::Continue)
}

fn location(shell: &mut Shell, args: &[String]) -> Result<Flow> {
    if !args.is_empty() {
        shell.cache().set(keys::LOCATION, args.join(" "));
    }
    match shell.cache().get::<String>(keys::LOCATION) {
        Some(place) if !place.is_empty() => shell.console().print(&format!("The party is in {place}.")),
        _ => shell.console().print("The party's whereabouts are unknown."),
    }
    Ok(Flow::Continue)
}

fn parse_level(value: &str) -> crate::error::Result<u8> {
    let got: i64 = value
        .parse()
        .map_err(|_| DmshError::InvalidLevel(value.to_string()))?;
    if !(i64::from(MIN_LEVEL)..=i64::from(MAX_LEVEL)).contains(&got) {
        return Err(DmshError::OutOfRange {
            what: "level",
            min: MIN_LEVEL.into(),
            max: MAX_LEVEL.into(),
            got,
        });
    }
    Ok(got as u8)
}

fn level(shell: &mut Shell, args: &[String]) -> Result<Flow> {
    if let Some(value) = args.first() {
        match parse_level(value) {
            Ok(new_level) => shell.cache().set(keys::LEVEL, new_level),
            Err(e) => shell.console().error(&e.to_string()),
        }
    }
    let current = shell.cache().get::<u8>(keys::LEVEL).unwrap_or(MIN_LEVEL);
    shell.console().print(&format!("The party is level {current}."));
    Ok(Flow::Continue)
}

#[derive(FromArgs)]
/// control playback on the croaker music server.
struct Music {
    #[argh(subcommand)]
    action: Option<MusicAction>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum MusicAction {
    List(MusicList),
    Play(MusicPlay),
    Skip(MusicSkip),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "list")]
/// list the playlists, or the tracks of one playlist.
struct MusicList {
    #[argh(positional, greedy)]
    /// playlist whose tracks to list.
    playlist: Vec<String>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "play")]
/// switch to a playlist.
struct MusicPlay {
    #[argh(positional, greedy)]
    /// playlist to play.
    playlist: Vec<String>,
}

/// Playlist names may contain spaces; the words are joined back together.
fn playlist_name(words: &[String]) -> Option<String> {
    (!words.is_empty()).then(|| words.join(" "))
}

#[derive(FromArgs)]
#[argh(subcommand, name = "skip")]
/// skip to the next track.
struct MusicSkip {}

fn music(shell: &mut Shell, args: &[String]) -> Result<Flow> {
    let Some(music) = parse_args::<Music>(shell, "music", args) else {
        return Ok(Flow::Continue);
    };
    let croaker = &shell.services().croaker;
    let catalogue = || croaker.playlists().map(|playlists| playlists.join("\n"));
    let reply = match music.action {
        None => catalogue(),
        Some(MusicAction::List(list)) => match playlist_name(&list.playlist) {
            Some(name) => croaker.list(Some(&name)),
            None => catalogue(),
        },
        Some(MusicAction::Play(play)) => croaker.play(playlist_name(&play.playlist).as_deref()),
        Some(MusicAction::Skip(_)) => croaker.skip(),
    };
    match reply {
        Ok(text) => shell.console().print(text.trim_end()),
        Err(e @ DmshError::MissingPlaylist) => shell.console().error(&e.to_string()),
        Err(e) => {
            log::warn!("croaker request failed: {e}");
            shell
                .console()
                .error(&format!("Could not reach croaker at {}: {e}", croaker.address()));
        }
    }
    Ok(Flow::Continue)
}

fn combat(shell: &mut Shell, args: &[String]) -> Result<Flow> {
    let initial = (!args.is_empty()).then(|| args.join(" "));
    let flow = match shell.subshell_mut(COMBAT) {
        Some(tracker) => {
            tracker
                .console()
                .print("Entering combat. Type 'done' to return.");
            tracker.start(initial)?
        }
        None => {
            shell.console().error("The combat tracker is not available.");
            Flow::Continue
        }
    };
    Ok(match flow {
        Flow::Quit => Flow::Quit,
        Flow::Continue | Flow::Leave => Flow::Continue,
    })
}

fn npc(shell: &mut Shell, _args: &[String]) -> Result<Flow> {
    shell
        .console()
        .error("npc: NPC generation is not implemented yet.");
    Ok(Flow::Continue)
}

fn round(shell: &mut Shell, args: &[String]) -> Result<Flow> {
    let current = shell.cache().get::<u32>(keys::COMBAT_ROUND).unwrap_or(0);
    match args.first().map(String::as_str) {
        None => {}
        Some("next") => shell.cache().set(keys::COMBAT_ROUND, current + 1),
        Some("reset") => shell.cache().set(keys::COMBAT_ROUND, 0u32),
        Some(other) => {
            shell
                .console()
                .error(&format!("Unknown round command {other}; try 'help round'."));
            return Ok(Flow::Continue);
        }
    }
    match shell.cache().get::<u32>(keys::COMBAT_ROUND).unwrap_or(0) {
        0 => shell.console().print("Combat has not started."),
        n => shell.console().print(&format!("Round {n}.")),
    }
    Ok(Flow::Continue)
}

fn done(shell: &mut Shell, _args: &[String]) -> Result<Flow> {
    shell.console().print("Leaving combat.");
    Ok(Flow::Leave)
}
