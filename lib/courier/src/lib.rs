//! Shared-directory battle protocol: the bit-packed state codec, the
//! state-file naming scheme, the peer coordinator and high-score records.

#[macro_use]
extern crate tracing;

pub mod codec;
pub use codec::{decode, encode, DecodeError, Snapshot};

pub mod state_file;
pub use state_file::{sanitize_player_id, HighscoreFileName, ParseError, StateFileName};

pub mod coordinator;
pub use coordinator::{
    Coordinator, PeerEvent, PeerRecord, DEAD_STATE_CLEANUP_TIMEOUT, READ_INTERVAL,
    STATE_PUBLISH_INTERVAL, STATE_STALE_TIMEOUT,
};

pub mod highscore;
pub use highscore::{persist_best, read_leaderboard, HighscoreRecord};
