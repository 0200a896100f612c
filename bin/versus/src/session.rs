//! The cooperative game loop: input, gravity, locking, peer traffic and
//! rendering, one iteration every few milliseconds.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::KeyCode;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use courier::coordinator::{READ_INTERVAL, STATE_PUBLISH_INTERVAL};
use courier::{Coordinator, HighscoreRecord, PeerEvent, Snapshot};
use tetrion::{ClearKind, Dir, Game, LockSummary, Turn};

use crate::config::Action;
use crate::term::Screen;
use crate::view::{self, Frame, PeerView};

/// How long a callout stays on the message line.
const MESSAGE_TTL: Duration = Duration::from_millis(1500);

const LEADERBOARD_REFRESH: Duration = Duration::from_secs(2);

const LOOP_SLEEP: Duration = Duration::from_millis(10);

static ATTACK_MESSAGES: [&str; 5] = [
    "{player} sent you {lines} lines!",
    "{player} attacks with {lines} garbage!",
    "{player} says: take {lines} lines!",
    "incoming {lines} lines from {player}!",
    "{player} is not playing nice: {lines} lines!",
];

static KO_MESSAGES: [&str; 4] = [
    "{player} is out!",
    "{player} topped out. +1 KO!",
    "goodnight, {player}!",
    "{player} has left the board!",
];

pub struct Session {
    game: Game,
    coordinator: Coordinator,
    keymap: HashMap<KeyCode, Action>,
    rng: SmallRng,
    kos: u32,
    lines_sent: u64,
    selected_peer: usize,
    message: Option<(String, Instant)>,
    leaderboard: Vec<HighscoreRecord>,
}

enum Flow {
    Continue,
    Quit,
}

impl Session {
    pub fn new(game: Game, coordinator: Coordinator, keymap: HashMap<KeyCode, Action>) -> Self {
        Self {
            game,
            coordinator,
            keymap,
            rng: SmallRng::seed_from_u64(rand::thread_rng().gen()),
            kos: 0,
            lines_sent: 0,
            selected_peer: 0,
            message: None,
            leaderboard: Vec::new(),
        }
    }

    pub fn run(&mut self, screen: &mut Screen) -> Result<()> {
        // make ourselves visible to peers before the countdown
        self.publish();
        self.countdown(screen)?;

        let start = Instant::now();
        let mut last_publish = start;
        let mut last_scan = start;
        let mut last_leaderboard = start;
        let mut last_gravity = start;
        self.leaderboard = courier::read_leaderboard(self.coordinator.dir());

        loop {
            let now = Instant::now();

            if let Some((_, since)) = self.message {
                if now.duration_since(since) >= MESSAGE_TTL {
                    self.message = None;
                }
            }

            if now.duration_since(last_publish) >= STATE_PUBLISH_INTERVAL {
                last_publish = now;
                self.publish();
            }

            match self.handle_input(screen, now)? {
                Flow::Quit => break,
                Flow::Continue => {}
            }

            if now.duration_since(last_gravity) >= self.game.gravity_interval() {
                last_gravity = now;
                self.game.tick_gravity(now);
            }

            if let Some(summary) = self.game.lock_if_expired(now, self.kos) {
                self.after_lock(&summary);
            }

            if now.duration_since(last_scan) >= READ_INTERVAL {
                last_scan = now;
                self.absorb_peer_events();
            }

            if now.duration_since(last_leaderboard) >= LEADERBOARD_REFRESH {
                last_leaderboard = now;
                self.leaderboard = courier::read_leaderboard(self.coordinator.dir());
            }

            screen.draw(&self.frame())?;

            if self.game.dead {
                break;
            }

            std::thread::sleep(LOOP_SLEEP);
        }

        self.finish(screen)
    }

    fn countdown(&mut self, screen: &mut Screen) -> Result<()> {
        for text in ["3", "2", "1"] {
            screen.draw_countdown(text)?;
            std::thread::sleep(Duration::from_secs(1));
        }
        screen.draw_countdown("GO!")?;
        std::thread::sleep(Duration::from_millis(400));
        // drain anything mashed during the countdown
        while screen.poll_key(Duration::ZERO)?.is_some() {}
        Ok(())
    }

    fn handle_input(&mut self, screen: &mut Screen, now: Instant) -> Result<Flow> {
        while let Some(code) = screen.poll_key(Duration::ZERO)? {
            let Some(action) = self.keymap.get(&code).copied() else {
                continue;
            };
            match action {
                Action::MoveLeft => {
                    self.game.move_piece(Dir::Left, now);
                }
                Action::MoveRight => {
                    self.game.move_piece(Dir::Right, now);
                }
                Action::RotateCw => {
                    self.game.rotate(Turn::Cw, now);
                }
                Action::RotateCcw => {
                    self.game.rotate(Turn::Ccw, now);
                }
                Action::Rotate180 => {
                    self.game.rotate(Turn::Flip, now);
                }
                Action::SoftDrop => {
                    self.game.soft_drop();
                }
                Action::HardDrop => {
                    if let Some(summary) = self.game.hard_drop(self.kos) {
                        self.after_lock(&summary);
                    }
                }
                Action::Hold => {
                    self.game.try_hold();
                }
                Action::PeerPrev => self.cycle_peer(-1),
                Action::PeerNext => self.cycle_peer(1),
                Action::Quit => return Ok(Flow::Quit),
            }
        }
        Ok(Flow::Continue)
    }

    fn after_lock(&mut self, summary: &LockSummary) {
        if let Some(callout) = callout(summary) {
            self.post_message(callout);
        }
        if summary.attack > 0 {
            self.lines_sent += u64::from(summary.attack);
            info!(attack = summary.attack, total = self.lines_sent, "attack sent");
            // peers learn about the attack from the bumped counter
            self.publish();
        }
    }

    fn absorb_peer_events(&mut self) {
        for event in self.coordinator.scan(Coordinator::unix_now()) {
            match event {
                PeerEvent::Attack { from, lines } => {
                    let clamped = u8::try_from(lines).unwrap_or(u8::MAX);
                    self.game.garbage.enqueue(clamped, &from);
                    let template = ATTACK_MESSAGES
                        .choose(&mut self.rng)
                        .copied()
                        .unwrap_or(ATTACK_MESSAGES[0]);
                    let text = template
                        .replace("{player}", &from)
                        .replace("{lines}", &lines.to_string());
                    self.post_message(text);
                }
                PeerEvent::Knockout { player } => {
                    self.kos += 1;
                    let template = KO_MESSAGES
                        .choose(&mut self.rng)
                        .copied()
                        .unwrap_or(KO_MESSAGES[0]);
                    self.post_message(template.replace("{player}", &player));
                }
            }
        }
    }

    fn cycle_peer(&mut self, step: isize) {
        let count = self.coordinator.peers().count();
        if count == 0 {
            self.selected_peer = 0;
            return;
        }
        let current = self.selected_peer.min(count - 1) as isize;
        self.selected_peer = (current + step).rem_euclid(count as isize) as usize;
    }

    fn post_message(&mut self, text: String) {
        self.message = Some((text, Instant::now()));
    }

    fn publish(&mut self) {
        let snapshot = Snapshot {
            board: self.game.board.clone(),
            piece: self.game.active.piece,
            rot: self.game.active.rot,
            x: self.game.active.x,
            y: self.game.active.y,
        };
        if let Err(err) = self
            .coordinator
            .publish(&snapshot, self.game.dead, self.lines_sent)
        {
            // transient; the next interval retries
            debug!(%err, "publish failed");
        }
    }

    fn frame(&mut self) -> Frame {
        let now = Coordinator::unix_now();
        let mut records: Vec<_> = self
            .coordinator
            .peers()
            .filter(|r| r.visible(now))
            .collect();
        records.sort_by(|a, b| a.player.cmp(&b.player));
        let peers: Vec<PeerView> = records.into_iter().map(view::peer_board_view).collect();

        Frame {
            player: self.coordinator.player().to_owned(),
            board: view::local_board_view(&self.game),
            hold: self.game.hold,
            hold_used: self.game.hold_used,
            next: self.game.preview(),
            garbage: view::garbage_view(self.game.garbage.entries()),
            lines_cleared: self.game.lines_cleared,
            lines_sent: self.lines_sent,
            kos: self.kos,
            b2b: self.game.b2b,
            message: self.message.as_ref().map(|(text, _)| text.clone()),
            peers,
            selected_peer: self.selected_peer,
            leaderboard: self.leaderboard.clone(),
            dead: self.game.dead,
        }
    }

    /// Final dead-state publish, score persistence and the game-over
    /// screen. Runs on both top-out and quit.
    fn finish(&mut self, screen: &mut Screen) -> Result<()> {
        self.game.dead = true;
        self.publish();
        if let Err(err) = courier::persist_best(
            self.coordinator.dir(),
            self.coordinator.player(),
            self.lines_sent,
            self.kos,
            &mut self.rng,
        ) {
            warn!(%err, "could not persist high score");
        }
        self.leaderboard = courier::read_leaderboard(self.coordinator.dir());

        screen.draw_game_over(&self.frame())?;
        screen.wait_key()?;
        self.coordinator.remove_own_state();
        Ok(())
    }
}

/// Message-line text for a lock worth announcing.
fn callout(summary: &LockSummary) -> Option<String> {
    if summary.cleared == 0 {
        return None;
    }
    let count = match summary.cleared {
        1 => "SINGLE",
        2 => "DOUBLE",
        3 => "TRIPLE",
        _ => "QUAD",
    };
    let mut text = match summary.kind {
        ClearKind::TspinFull => format!("T-SPIN {count}!"),
        ClearKind::TspinMini => format!("MINI T-SPIN {count}!"),
        ClearKind::AllSpin => format!("{}-SPIN {count}!", summary.piece),
        ClearKind::Normal if summary.cleared == 4 => "TETRIS!".to_owned(),
        ClearKind::Normal => return perfect_only(summary),
    };
    if summary.perfect {
        text = format!("PERFECT CLEAR! {text}");
    }
    if summary.b2b {
        text = format!("B2B {text}");
    }
    Some(text)
}

fn perfect_only(summary: &LockSummary) -> Option<String> {
    summary.perfect.then(|| "PERFECT CLEAR!".to_owned())
}
