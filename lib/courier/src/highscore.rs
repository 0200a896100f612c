//! Per-player best-score records in the shared directory. One file per
//! player; a better score unlinks the old record before writing the new.

use std::fs;
use std::io;
use std::path::Path;

use rand::Rng;

use crate::state_file::{HighscoreFileName, FILE_SUFFIX, HIGHSCORE_PREFIX};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighscoreRecord {
    pub player: String,
    pub lines_sent: u64,
    pub kos: u32,
}

impl HighscoreRecord {
    fn rank(&self) -> (u64, u32) {
        (self.lines_sent, self.kos)
    }
}

/// All best-score records, highest first (KOs break ties). Duplicate
/// records for a player collapse to their best.
pub fn read_leaderboard(dir: &Path) -> Vec<HighscoreRecord> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut best: Vec<HighscoreRecord> = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.starts_with(HIGHSCORE_PREFIX) || !name.ends_with(FILE_SUFFIX) {
            continue;
        }
        let Ok(parsed) = name.parse::<HighscoreFileName>() else {
            continue;
        };
        let record = HighscoreRecord {
            player: parsed.player,
            lines_sent: parsed.lines_sent,
            kos: parsed.kos,
        };
        match best.iter_mut().find(|r| r.player == record.player) {
            Some(seen) if seen.rank() >= record.rank() => {}
            Some(seen) => *seen = record,
            None => best.push(record),
        }
    }

    best.sort_by(|a, b| b.rank().cmp(&a.rank()).then(a.player.cmp(&b.player)));
    best
}

/// Writes a new best record for `player` if it beats the one on disk.
pub fn persist_best(
    dir: &Path,
    player: &str,
    lines_sent: u64,
    kos: u32,
    rng: &mut impl Rng,
) -> io::Result<()> {
    let own_prefix = format!("{HIGHSCORE_PREFIX}{player}_");
    let mut old_files = Vec::new();
    let mut current_best: Option<HighscoreFileName> = None;

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.filter_map(|e| e.ok()) {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.starts_with(&own_prefix) {
                continue;
            }
            if let Ok(parsed) = name.parse::<HighscoreFileName>() {
                if current_best
                    .as_ref()
                    .map_or(true, |b| (parsed.lines_sent, parsed.kos) > (b.lines_sent, b.kos))
                {
                    current_best = Some(parsed);
                }
            }
            old_files.push(name);
        }
    }

    if let Some(best) = &current_best {
        if (best.lines_sent, best.kos) >= (lines_sent, kos) {
            return Ok(());
        }
    }

    for name in old_files {
        let _ = fs::remove_file(dir.join(name));
    }
    let name = HighscoreFileName {
        player: player.to_owned(),
        lines_sent,
        kos,
        tag: format!("{:08x}", rng.gen::<u32>()),
    };
    fs::File::create(dir.join(name.to_string()))?;
    debug!(player, lines_sent, kos, "persisted high score");
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_DIR_SEQ: AtomicU32 = AtomicU32::new(0);

    struct TestDir(PathBuf);

    impl TestDir {
        fn new(tag: &str) -> Self {
            let n = TEST_DIR_SEQ.fetch_add(1, Ordering::Relaxed);
            let dir = std::env::temp_dir().join(format!(
                "highscore-test-{}-{tag}-{n}",
                std::process::id()
            ));
            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }
    }

    impl Drop for TestDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_better_score_replaces_record() {
        let tmp = TestDir::new("replace");
        let mut rng = SmallRng::seed_from_u64(1);
        persist_best(&tmp.0, "alice", 10, 1, &mut rng).unwrap();
        persist_best(&tmp.0, "alice", 25, 2, &mut rng).unwrap();

        let board = read_leaderboard(&tmp.0);
        assert_eq!(
            board,
            [HighscoreRecord {
                player: "alice".into(),
                lines_sent: 25,
                kos: 2,
            }]
        );
        // only one file remains on disk
        let files = fs::read_dir(&tmp.0).unwrap().count();
        assert_eq!(files, 1);
    }

    #[test]
    fn test_worse_score_is_ignored() {
        let tmp = TestDir::new("worse");
        let mut rng = SmallRng::seed_from_u64(2);
        persist_best(&tmp.0, "alice", 30, 0, &mut rng).unwrap();
        persist_best(&tmp.0, "alice", 12, 5, &mut rng).unwrap();

        let board = read_leaderboard(&tmp.0);
        assert_eq!(board[0].lines_sent, 30);
    }

    #[test]
    fn test_leaderboard_sorted_by_lines_then_kos() {
        let tmp = TestDir::new("sort");
        let mut rng = SmallRng::seed_from_u64(3);
        persist_best(&tmp.0, "alice", 10, 0, &mut rng).unwrap();
        persist_best(&tmp.0, "bob", 20, 1, &mut rng).unwrap();
        persist_best(&tmp.0, "carol", 20, 3, &mut rng).unwrap();

        let names: Vec<String> = read_leaderboard(&tmp.0)
            .into_iter()
            .map(|r| r.player)
            .collect();
        assert_eq!(names, ["carol", "bob", "alice"]);
    }
}
