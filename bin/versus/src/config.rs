//! Keybinding profiles and the color table.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use crossterm::event::KeyCode;
use crossterm::style::Color;
use serde::{Deserialize, Serialize};

use tetrion::Block;

/// Everything the game loop dispatches on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    RotateCw,
    RotateCcw,
    Rotate180,
    SoftDrop,
    HardDrop,
    Hold,
    Quit,
    PeerPrev,
    PeerNext,
}

/// A key profile as stored on disk. Every field is a list of key names;
/// missing fields fall back to the built-in defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct KeyProfile {
    pub move_left: Vec<String>,
    pub move_right: Vec<String>,
    pub rotate_cw: Vec<String>,
    pub rotate_ccw: Vec<String>,
    pub rotate_180: Vec<String>,
    pub soft_drop: Vec<String>,
    pub hard_drop: Vec<String>,
    pub hold: Vec<String>,
    pub quit: Vec<String>,
    pub peer_prev: Vec<String>,
    pub peer_next: Vec<String>,
}

fn names(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|s| (*s).to_owned()).collect()
}

impl Default for KeyProfile {
    fn default() -> Self {
        Self {
            move_left: names(&["left", "a"]),
            move_right: names(&["right", "d"]),
            rotate_cw: names(&["up", "x", "w"]),
            rotate_ccw: names(&["z"]),
            rotate_180: names(&[]),
            soft_drop: names(&["down", "s"]),
            hard_drop: names(&["space"]),
            hold: names(&["c"]),
            quit: names(&["q", "esc"]),
            peer_prev: names(&["["]),
            peer_next: names(&["]"]),
        }
    }
}

impl KeyProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read key profile {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid key profile {}", path.display()))
    }

    /// Flattens the profile into a lookup table, rejecting unknown key
    /// names and double bindings.
    pub fn keymap(&self) -> Result<HashMap<KeyCode, Action>> {
        let groups: [(&[String], Action); 11] = [
            (&self.move_left, Action::MoveLeft),
            (&self.move_right, Action::MoveRight),
            (&self.rotate_cw, Action::RotateCw),
            (&self.rotate_ccw, Action::RotateCcw),
            (&self.rotate_180, Action::Rotate180),
            (&self.soft_drop, Action::SoftDrop),
            (&self.hard_drop, Action::HardDrop),
            (&self.hold, Action::Hold),
            (&self.quit, Action::Quit),
            (&self.peer_prev, Action::PeerPrev),
            (&self.peer_next, Action::PeerNext),
        ];

        let mut map = HashMap::new();
        for (keys, action) in groups {
            for name in keys {
                let code = parse_key(name)?;
                if map.insert(code, action).is_some() {
                    return Err(anyhow!("key {name:?} is bound twice"));
                }
            }
        }
        Ok(map)
    }
}

fn parse_key(name: &str) -> Result<KeyCode> {
    let lower = name.to_ascii_lowercase();
    let code = match lower.as_str() {
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "space" => KeyCode::Char(' '),
        "enter" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "esc" | "escape" => KeyCode::Esc,
        "backspace" => KeyCode::Backspace,
        _ => {
            let mut chars = lower.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return Err(anyhow!("unknown key name {name:?}")),
            }
        }
    };
    Ok(code)
}

/// Terminal color for each cell value, one per piece plus garbage.
pub fn block_color(block: Block) -> Color {
    match block {
        Block::I => Color::Cyan,
        Block::O => Color::Yellow,
        Block::T => Color::Magenta,
        Block::S => Color::Green,
        Block::Z => Color::Red,
        Block::J => Color::Blue,
        Block::L => Color::DarkYellow,
        Block::Garbage => Color::Grey,
    }
}
