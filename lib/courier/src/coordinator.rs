//! Shared-directory peer coordination. Every process owns one state file
//! whose name carries the whole payload; peers poll the directory, mirror
//! each other's boards, and derive attacks and KOs from the monotonic
//! cumulative-garbage counter and the liveness flag.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::codec::{self, Snapshot};
use crate::state_file::{StateFileName, FILE_SUFFIX, STATE_PREFIX};

/// How often a process republishes its state, barring forced publishes.
pub const STATE_PUBLISH_INTERVAL: Duration = Duration::from_millis(100);

/// How often the directory is scanned for peers.
pub const READ_INTERVAL: Duration = Duration::from_millis(50);

/// An alive peer older than this is hidden from the live view.
pub const STATE_STALE_TIMEOUT: f64 = 2.0;

/// An alive peer's file older than this is garbage-collected.
pub const STALE_CLEANUP_TIMEOUT: f64 = 5.0;

/// A dead peer's file lingers this long so everyone can credit the KO.
pub const DEAD_STATE_CLEANUP_TIMEOUT: f64 = 30.0;

/// Latest decoded state for one peer.
#[derive(Clone, Debug)]
pub struct PeerRecord {
    pub player: String,
    pub snapshot: Snapshot,
    pub dead: bool,
    pub cumulative_garbage: u64,
    pub timestamp: f64,
}

impl PeerRecord {
    /// Whether the record is fresh enough to show on screen at `now`.
    pub fn visible(&self, now: f64) -> bool {
        let window = if self.dead {
            DEAD_STATE_CLEANUP_TIMEOUT
        } else {
            STATE_STALE_TIMEOUT
        };
        now - self.timestamp <= window
    }
}

/// Something a scan learned that the game loop must act on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerEvent {
    /// A peer's cumulative counter advanced; credit the delta as incoming
    /// garbage.
    Attack { from: String, lines: u32 },
    /// A peer flipped to dead for the first time this session.
    Knockout { player: String },
}

pub struct Coordinator {
    dir: PathBuf,
    player: String,
    peers: HashMap<String, PeerRecord>,
    /// Last credited cumulative counter per peer.
    ledger: HashMap<String, u64>,
    /// Peers already credited as KOs; never shrinks.
    known_dead: HashSet<String>,
}

impl Coordinator {
    /// Opens (creating if needed) the shared directory.
    pub fn new(dir: impl Into<PathBuf>, player: &str) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            player: player.to_owned(),
            peers: HashMap::new(),
            ledger: HashMap::new(),
            known_dead: HashSet::new(),
        })
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Wall-clock seconds used for state-file timestamps.
    pub fn unix_now() -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64())
    }

    /// Replaces our state file: old records are unlinked first so readers
    /// only ever observe one authoritative file per publisher.
    pub fn publish(
        &self,
        snapshot: &Snapshot,
        dead: bool,
        cumulative_garbage: u64,
    ) -> io::Result<()> {
        self.remove_own_state();
        let name = StateFileName {
            player: self.player.clone(),
            timestamp: Self::unix_now(),
            dead,
            cumulative_garbage,
            payload: codec::encode(snapshot),
        };
        fs::File::create(self.dir.join(name.to_string()))?;
        trace!(cumulative_garbage, dead, "published state");
        Ok(())
    }

    /// Unlinks every state file we own. Called before each publish and on
    /// the way out.
    pub fn remove_own_state(&self) {
        let own_prefix = format!("{STATE_PREFIX}{}_", self.player);
        for entry in list_dir(&self.dir) {
            if entry.starts_with(&own_prefix) {
                let _ = fs::remove_file(self.dir.join(&entry));
            }
        }
    }

    /// Scans the directory once: refreshes the peer cache, collects stale
    /// files, and returns the attacks and KOs derived from what changed.
    pub fn scan(&mut self, now: f64) -> Vec<PeerEvent> {
        let mut freshest: HashMap<String, StateFileName> = HashMap::new();

        for entry in list_dir(&self.dir) {
            if !entry.starts_with(STATE_PREFIX) || !entry.ends_with(FILE_SUFFIX) {
                continue;
            }
            let parsed: StateFileName = match entry.parse() {
                Ok(parsed) => parsed,
                Err(err) => {
                    trace!(%entry, %err, "ignoring unparseable state file");
                    continue;
                }
            };
            if parsed.player == self.player {
                continue;
            }

            let age = now - parsed.timestamp;
            let cleanup_after = if parsed.dead {
                DEAD_STATE_CLEANUP_TIMEOUT
            } else {
                STALE_CLEANUP_TIMEOUT
            };
            if age > cleanup_after {
                // a crashed process cannot clean up after itself; a live
                // one recreates its file on the next publish cycle
                debug!(player = %parsed.player, age, "collecting stale state file");
                let _ = fs::remove_file(self.dir.join(&entry));
                continue;
            }
            let stale_after = if parsed.dead {
                DEAD_STATE_CLEANUP_TIMEOUT
            } else {
                STATE_STALE_TIMEOUT
            };
            if age > stale_after {
                continue;
            }

            match freshest.get(&parsed.player) {
                Some(seen) if seen.timestamp >= parsed.timestamp => {}
                _ => {
                    freshest.insert(parsed.player.clone(), parsed);
                }
            }
        }

        let mut events = Vec::new();
        for (player, state) in freshest {
            let snapshot = match codec::decode(&state.payload) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    trace!(%player, %err, "discarding undecodable peer state");
                    continue;
                }
            };

            if state.dead && self.known_dead.insert(player.clone()) {
                info!(%player, "peer knocked out");
                events.push(PeerEvent::Knockout {
                    player: player.clone(),
                });
            }

            if !state.dead {
                let last = self.ledger.entry(player.clone()).or_insert(0);
                if state.cumulative_garbage > *last {
                    let lines = (state.cumulative_garbage - *last) as u32;
                    debug!(%player, lines, total = state.cumulative_garbage, "incoming attack");
                    events.push(PeerEvent::Attack {
                        from: player.clone(),
                        lines,
                    });
                    *last = state.cumulative_garbage;
                } else if state.cumulative_garbage < *last {
                    // counter went backwards: the peer restarted its
                    // session, so adopt the new baseline without credit
                    warn!(%player, old = *last, new = state.cumulative_garbage, "peer counter reset");
                    *last = state.cumulative_garbage;
                }
            }

            self.peers.insert(
                player.clone(),
                PeerRecord {
                    player,
                    snapshot,
                    dead: state.dead,
                    cumulative_garbage: state.cumulative_garbage,
                    timestamp: state.timestamp,
                },
            );
        }

        events
    }

    /// Cached peer records, most recent scan result per peer. Survives
    /// momentary directory-read failures.
    pub fn peers(&self) -> impl Iterator<Item = &PeerRecord> {
        self.peers.values()
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.remove_own_state();
    }
}

/// Directory listing that swallows transient errors; the next interval
/// will retry, and the peer cache bridges the gap.
fn list_dir(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(%err, "shared directory listing failed");
            return Vec::new();
        }
    };
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tetrion::{Board, Piece, Rot};

    static TEST_DIR_SEQ: AtomicU32 = AtomicU32::new(0);

    struct TestDir(PathBuf);

    impl TestDir {
        fn new(tag: &str) -> Self {
            let n = TEST_DIR_SEQ.fetch_add(1, Ordering::Relaxed);
            let dir = std::env::temp_dir().join(format!(
                "courier-test-{}-{tag}-{n}",
                std::process::id()
            ));
            let _ = fs::remove_dir_all(&dir);
            Self(dir)
        }
    }

    impl Drop for TestDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            board: Board::new(),
            piece: Piece::L,
            rot: Rot::N,
            x: 3,
            y: 5,
        }
    }

    fn state_files(dir: &Path) -> Vec<String> {
        let mut names = list_dir(dir)
            .into_iter()
            .filter(|n| n.starts_with(STATE_PREFIX))
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    #[test]
    fn test_publish_keeps_a_single_file() {
        let tmp = TestDir::new("publish");
        let coord = Coordinator::new(&tmp.0, "alice").unwrap();
        coord.publish(&snapshot(), false, 0).unwrap();
        coord.publish(&snapshot(), false, 3).unwrap();
        let files = state_files(&tmp.0);
        assert_eq!(files.len(), 1);
        let parsed: StateFileName = files[0].parse().unwrap();
        assert_eq!(parsed.cumulative_garbage, 3);
        assert!(!parsed.dead);
    }

    #[test]
    fn test_attacks_are_credited_exactly_once() {
        let tmp = TestDir::new("exactly-once");
        let alice = Coordinator::new(&tmp.0, "alice").unwrap();
        let mut bob = Coordinator::new(&tmp.0, "bob").unwrap();

        let mut credited = 0;
        for counter in [3u64, 7, 12] {
            alice.publish(&snapshot(), false, counter).unwrap();
            // irregular polling: sometimes twice per publish, sometimes not
            for _ in 0..2 {
                for event in bob.scan(Coordinator::unix_now()) {
                    if let PeerEvent::Attack { from, lines } = event {
                        assert_eq!(from, "alice");
                        credited += lines;
                    }
                }
            }
        }
        assert_eq!(credited, 12);
    }

    #[test]
    fn test_skipped_polls_merge_deltas() {
        let tmp = TestDir::new("merge");
        let alice = Coordinator::new(&tmp.0, "alice").unwrap();
        let mut bob = Coordinator::new(&tmp.0, "bob").unwrap();

        alice.publish(&snapshot(), false, 5).unwrap();
        alice.publish(&snapshot(), false, 9).unwrap();
        let events = bob.scan(Coordinator::unix_now());
        assert!(events.contains(&PeerEvent::Attack {
            from: "alice".into(),
            lines: 9,
        }));
    }

    #[test]
    fn test_counter_reset_is_not_negative_garbage() {
        let tmp = TestDir::new("reset");
        let alice = Coordinator::new(&tmp.0, "alice").unwrap();
        let mut bob = Coordinator::new(&tmp.0, "bob").unwrap();

        alice.publish(&snapshot(), false, 10).unwrap();
        bob.scan(Coordinator::unix_now());
        // alice restarts her session with a fresh counter
        alice.publish(&snapshot(), false, 2).unwrap();
        let events = bob.scan(Coordinator::unix_now());
        assert!(events.is_empty());
        // progress from the new baseline is credited again
        alice.publish(&snapshot(), false, 4).unwrap();
        let events = bob.scan(Coordinator::unix_now());
        assert_eq!(
            events,
            [PeerEvent::Attack {
                from: "alice".into(),
                lines: 2,
            }]
        );
    }

    #[test]
    fn test_knockout_credited_once() {
        let tmp = TestDir::new("ko");
        let alice = Coordinator::new(&tmp.0, "alice").unwrap();
        let mut bob = Coordinator::new(&tmp.0, "bob").unwrap();

        alice.publish(&snapshot(), true, 5).unwrap();
        let events = bob.scan(Coordinator::unix_now());
        assert_eq!(
            events,
            [PeerEvent::Knockout {
                player: "alice".into(),
            }]
        );
        assert!(bob.scan(Coordinator::unix_now()).is_empty());
    }

    #[test]
    fn test_dead_peers_send_no_attacks() {
        let tmp = TestDir::new("dead-attack");
        let alice = Coordinator::new(&tmp.0, "alice").unwrap();
        let mut bob = Coordinator::new(&tmp.0, "bob").unwrap();

        alice.publish(&snapshot(), true, 50).unwrap();
        let events = bob.scan(Coordinator::unix_now());
        assert!(events
            .iter()
            .all(|e| !matches!(e, PeerEvent::Attack { .. })));
    }

    #[test]
    fn test_stale_alive_files_are_collected() {
        let tmp = TestDir::new("stale");
        let alice = Coordinator::new(&tmp.0, "alice").unwrap();
        let mut bob = Coordinator::new(&tmp.0, "bob").unwrap();

        alice.publish(&snapshot(), false, 1).unwrap();
        // pretend a long time passes
        let future = Coordinator::unix_now() + STALE_CLEANUP_TIMEOUT + 1.0;
        let events = bob.scan(future);
        assert!(events.is_empty());
        assert!(state_files(&tmp.0).is_empty());
    }

    #[test]
    fn test_stale_but_not_collectable_is_hidden() {
        let tmp = TestDir::new("hidden");
        let alice = Coordinator::new(&tmp.0, "alice").unwrap();
        let mut bob = Coordinator::new(&tmp.0, "bob").unwrap();

        alice.publish(&snapshot(), false, 1).unwrap();
        let future = Coordinator::unix_now() + STATE_STALE_TIMEOUT + 1.0;
        let events = bob.scan(future);
        assert!(events.is_empty());
        assert!(bob.peers().next().is_none());
        // the file survives until the cleanup window passes
        assert_eq!(state_files(&tmp.0).len(), 1);
    }

    #[test]
    fn test_unparseable_names_are_ignored() {
        let tmp = TestDir::new("unparseable");
        let mut bob = Coordinator::new(&tmp.0, "bob").unwrap();
        fs::File::create(tmp.0.join("state_weird.txt")).unwrap();
        fs::File::create(tmp.0.join("state_x_notatime_0_0_p.txt")).unwrap();
        assert!(bob.scan(Coordinator::unix_now()).is_empty());
    }

    #[test]
    fn test_drop_removes_own_state() {
        let tmp = TestDir::new("drop");
        {
            let coord = Coordinator::new(&tmp.0, "alice").unwrap();
            coord.publish(&snapshot(), false, 0).unwrap();
            assert_eq!(state_files(&tmp.0).len(), 1);
        }
        assert!(state_files(&tmp.0).is_empty());
    }
}
