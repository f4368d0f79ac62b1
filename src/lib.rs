//! An interactive shell for running a tabletop campaign.
//!
//! The shell reads one command per line and dispatches it through a registry
//! built once at startup. Contexts such as the combat tracker are subshells of
//! the root shell and share its [`Cache`]. Frequent actions are also bound to
//! key chords. The `music` command drives a croaker server over a small line
//! protocol (see [`croaker`]).
//!
//! The main entry point is [`Shell`]. The public modules [`command`],
//! [`console`] and [`campaign`] expose the seams for adding commands, plugging
//! in another console, and storing campaigns elsewhere.

pub mod builtin;
pub mod cache;
pub mod campaign;
pub mod command;
pub mod config;
pub mod console;
pub mod contexts;
pub mod croaker;
pub mod error;
pub mod io_adapters;
pub mod keys;
pub mod shell;

pub use cache::Cache;
pub use console::{Console, RustylineConsole};
pub use error::{DmshError, Result};
pub use shell::{Services, Session, Shell};
