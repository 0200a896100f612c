//! File-name wire format. A state file's body is empty; every field of
//! the protocol payload lives in the name:
//!
//! ```text
//! state_<player>_<timestamp>_<isDead>_<cumulativeGarbage>_<payload>.txt
//! ```
//!
//! `player` never contains `_` (sanitized at startup), and the base64
//! payload comes last, so parsing is four `split_once`s from the left.

use core::fmt;
use std::str::FromStr;

pub const STATE_PREFIX: &str = "state_";
pub const HIGHSCORE_PREFIX: &str = "highscore_";
pub const FILE_SUFFIX: &str = ".txt";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("not a state file name")]
    Pattern,
    #[error("bad numeric field {0:?}")]
    Number(String),
    #[error("bad liveness flag {0:?}")]
    Liveness(String),
}

/// Parsed state-file name, payload still encoded.
#[derive(Clone, Debug, PartialEq)]
pub struct StateFileName {
    pub player: String,
    /// Unix-epoch seconds at publish time.
    pub timestamp: f64,
    pub dead: bool,
    pub cumulative_garbage: u64,
    pub payload: String,
}

impl fmt::Display for StateFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{STATE_PREFIX}{}_{:.3}_{}_{}_{}{FILE_SUFFIX}",
            self.player,
            self.timestamp,
            u8::from(self.dead),
            self.cumulative_garbage,
            self.payload,
        )
    }
}

impl FromStr for StateFileName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(STATE_PREFIX)
            .and_then(|s| s.strip_suffix(FILE_SUFFIX))
            .ok_or(ParseError::Pattern)?;
        let (player, rest) = rest.split_once('_').ok_or(ParseError::Pattern)?;
        let (ts, rest) = rest.split_once('_').ok_or(ParseError::Pattern)?;
        let (dead, rest) = rest.split_once('_').ok_or(ParseError::Pattern)?;
        let (cumulative, payload) = rest.split_once('_').ok_or(ParseError::Pattern)?;

        let timestamp = f64::from_str(ts).map_err(|_| ParseError::Number(ts.into()))?;
        let dead = match dead {
            "0" => false,
            "1" => true,
            other => return Err(ParseError::Liveness(other.into())),
        };
        let cumulative_garbage =
            u64::from_str(cumulative).map_err(|_| ParseError::Number(cumulative.into()))?;

        Ok(StateFileName {
            player: player.to_owned(),
            timestamp,
            dead,
            cumulative_garbage,
            payload: payload.to_owned(),
        })
    }
}

/// Parsed high-score record name:
/// `highscore_<player>_<lines-sent>_<kos>_<tag>.txt`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighscoreFileName {
    pub player: String,
    pub lines_sent: u64,
    pub kos: u32,
    pub tag: String,
}

impl fmt::Display for HighscoreFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{HIGHSCORE_PREFIX}{}_{}_{}_{}{FILE_SUFFIX}",
            self.player, self.lines_sent, self.kos, self.tag,
        )
    }
}

impl FromStr for HighscoreFileName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(HIGHSCORE_PREFIX)
            .and_then(|s| s.strip_suffix(FILE_SUFFIX))
            .ok_or(ParseError::Pattern)?;
        let (player, rest) = rest.split_once('_').ok_or(ParseError::Pattern)?;
        let (lines, rest) = rest.split_once('_').ok_or(ParseError::Pattern)?;
        let (kos, tag) = rest.split_once('_').ok_or(ParseError::Pattern)?;

        Ok(HighscoreFileName {
            player: player.to_owned(),
            lines_sent: u64::from_str(lines).map_err(|_| ParseError::Number(lines.into()))?,
            kos: u32::from_str(kos).map_err(|_| ParseError::Number(kos.into()))?,
            tag: tag.to_owned(),
        })
    }
}

/// Turns an OS username into a protocol-safe player id.
pub fn sanitize_player_id(raw: &str) -> String {
    let cleaned = raw.replace('_', "-");
    if cleaned.is_empty() {
        "player".to_owned()
    } else {
        cleaned
    }
}
