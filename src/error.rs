//! Error types for dmsh.

use std::io;

/// Errors produced by the shell's library layer.
///
/// Command handlers work in `anyhow::Result` and are expected to report these
/// to the console themselves; see [`crate::shell::Shell::process`].
#[derive(Debug, thiserror::Error)]
pub enum DmshError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid date {0:?}; expected ERA.YEAR.MONTH.DAY")]
    InvalidDate(String),

    #[error("{0:?} is not a level")]
    InvalidLevel(String),

    #[error("{what} must be between {min} and {max}, got {got}")]
    OutOfRange {
        what: &'static str,
        min: i64,
        max: i64,
        got: i64,
    },

    #[error("Must specify the playlist to play.")]
    MissingPlaylist,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DmshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let e = DmshError::Config("missing key".into());
        assert_eq!(format!("{e}"), "config error: missing key");
    }

    #[test]
    fn test_invalid_date_display() {
        let e = DmshError::InvalidDate("2.x".into());
        assert_eq!(
            format!("{e}"),
            "invalid date \"2.x\"; expected ERA.YEAR.MONTH.DAY"
        );
    }

    #[test]
    fn test_out_of_range_display() {
        let e = DmshError::OutOfRange {
            what: "level",
            min: 1,
            max: 20,
            got: 42,
        };
        assert_eq!(format!("{e}"), "level must be between 1 and 20, got 42");
    }

    #[test]
    fn test_missing_playlist_display() {
        assert_eq!(
            DmshError::MissingPlaylist.to_string(),
            "Must specify the playlist to play."
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let e: DmshError = io.into();
        assert!(matches!(e, DmshError::Io(_)));
        assert_eq!(format!("{e}"), "I/O error: refused");
    }

    #[test]
    fn test_invalid_level_display() {
        let e = DmshError::InvalidLevel("high".into());
        assert_eq!(format!("{e}"), "\"high\" is not a level");
    }
}
