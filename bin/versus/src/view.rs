//! Drawable snapshot of one loop iteration. Building the frame is pure;
//! the terminal layer consumes it without touching game state.

use courier::{HighscoreRecord, PeerRecord};
use tetrion::{Block, Game, GarbageEntry, Piece, COLS, ROWS};

/// What a board cell should look like on screen.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CellView {
    Empty,
    Filled(Block),
    Ghost(Block),
}

pub type BoardView = [[CellView; COLS as usize]; ROWS as usize];

#[derive(Clone, Debug)]
pub struct PeerView {
    pub player: String,
    pub board: BoardView,
    pub dead: bool,
}

#[derive(Clone, Debug)]
pub struct GarbageView {
    pub lines: u8,
    pub buffer_pieces: i8,
}

/// Everything the renderer needs for one repaint.
#[derive(Clone, Debug)]
pub struct Frame {
    pub player: String,
    pub board: BoardView,
    pub hold: Option<Piece>,
    pub hold_used: bool,
    pub next: Piece,
    pub garbage: Vec<GarbageView>,
    pub lines_cleared: u32,
    pub lines_sent: u64,
    pub kos: u32,
    pub b2b: bool,
    pub message: Option<String>,
    pub peers: Vec<PeerView>,
    /// Index into `peers` of the board to draw large.
    pub selected_peer: usize,
    pub leaderboard: Vec<HighscoreRecord>,
    pub dead: bool,
}

/// Local board with the ghost projection and the active piece overlaid.
pub fn local_board_view(game: &Game) -> BoardView {
    let mut view = base_view(game);
    if !game.dead {
        let block = Block::from(game.active.piece);
        let ghost_y = game.active.ghost_y(&game.board);
        for (dx, dy) in game.active.shape().cells() {
            paint(&mut view, game.active.x + dx, ghost_y + dy, CellView::Ghost(block));
        }
        for (x, y) in game.active.cells() {
            paint(&mut view, x, y, CellView::Filled(block));
        }
    }
    view
}

/// A peer's board with its active piece overlaid from the decoded state.
pub fn peer_board_view(record: &PeerRecord) -> PeerView {
    let snap = &record.snapshot;
    let mut view = [[CellView::Empty; COLS as usize]; ROWS as usize];
    for y in 0..ROWS {
        for x in 0..COLS {
            if let Some(block) = snap.board.cell(x, y) {
                view[y as usize][x as usize] = CellView::Filled(block);
            }
        }
    }
    if !record.dead {
        let block = Block::from(snap.piece);
        for (dx, dy) in snap.piece.shape(snap.rot).cells() {
            paint(&mut view, snap.x + dx, snap.y + dy, CellView::Filled(block));
        }
    }
    PeerView {
        player: record.player.clone(),
        board: view,
        dead: record.dead,
    }
}

pub fn garbage_view<'a>(entries: impl Iterator<Item = &'a GarbageEntry>) -> Vec<GarbageView> {
    entries
        .map(|e| GarbageView {
            lines: e.lines,
            buffer_pieces: e.buffer_pieces,
        })
        .collect()
}

fn base_view(game: &Game) -> BoardView {
    let mut view = [[CellView::Empty; COLS as usize]; ROWS as usize];
    for (y, row) in game.board.rows().iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            if let Some(block) = cell {
                view[y][x] = CellView::Filled(*block);
            }
        }
    }
    view
}

fn paint(view: &mut BoardView, x: i8, y: i8, cell: CellView) {
    if (0..COLS).contains(&x) && (0..ROWS).contains(&y) {
        // the active piece wins over its own ghost
        let slot = &mut view[y as usize][x as usize];
        if matches!(cell, CellView::Filled(_)) || *slot == CellView::Empty {
            *slot = cell;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tetrion::ActivePiece;

    #[test]
    fn test_ghost_sits_under_active_piece() {
        let mut game = Game::new_seeded(1);
        game.active = ActivePiece::spawn(Piece::O);
        game.active.y = 0;
        let view = local_board_view(&game);

        let block = Block::O;
        assert_eq!(view[0][4], CellView::Filled(block));
        assert_eq!(view[1][4], CellView::Filled(block));
        assert_eq!(view[18][4], CellView::Ghost(block));
        assert_eq!(view[19][5], CellView::Ghost(block));
    }

    #[test]
    fn test_resting_piece_shadows_its_ghost() {
        let mut game = Game::new_seeded(2);
        game.active = ActivePiece::spawn(Piece::O);
        game.active.y = 18;
        let view = local_board_view(&game);
        // ghost and piece coincide; the solid piece is drawn
        assert_eq!(view[18][4], CellView::Filled(Block::O));
        assert_eq!(view[19][4], CellView::Filled(Block::O));
    }

    #[test]
    fn test_dead_game_has_no_active_overlay() {
        let mut game = Game::new_seeded(3);
        game.dead = true;
        let view = local_board_view(&game);
        assert!(view
            .iter()
            .flatten()
            .all(|c| !matches!(c, CellView::Ghost(_))));
    }
}
