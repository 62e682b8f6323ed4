// Minefield model: mine placement, reveal/flood fill, flags and game outcome
// Mines are placed on the first cursor action so the opening cell is always safe

use log::{debug, info};
use rand::Rng;
use thiserror::Error;

use crate::xtm_grid::{Cell, CellPos, Grid, GridError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("invalid mine count {mines} for a board of {cells} cells; must be below the cell count")]
    InvalidConfiguration { mines: usize, cells: usize },
}

/// Game result, terminal once it leaves `InProgress`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Exploded,
    Victory,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::InProgress
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// What a click does to the selected cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Reveal,
    Flag,
    Chord, // Reveal the neighbors of a satisfied number
}

/// Source of candidate mine positions
///
/// Every [`rand::Rng`] is a picker drawing uniformly over the board. Tests
/// can implement this directly to script exact layouts.
pub trait MinePicker {
    /// Return a position; out-of-bounds answers are ignored by the caller.
    fn pick(&mut self, rows: usize, columns: usize) -> CellPos;
}

impl<R: Rng> MinePicker for R {
    fn pick(&mut self, rows: usize, columns: usize) -> CellPos {
        CellPos::new(self.gen_range(0..rows), self.gen_range(0..columns))
    }
}

/// Read-only cell state handed to the renderer
pub trait CellView {
    fn is_hidden(&self) -> bool;
    fn is_flagged(&self) -> bool;
    /// Only meaningful to show once the cell is revealed (or in debug peeking)
    fn is_mine(&self) -> bool;
    fn adjacent_mines(&self) -> u8;
}

impl CellView for Cell {
    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn is_flagged(&self) -> bool {
        self.flagged
    }

    fn is_mine(&self) -> bool {
        self.mine
    }

    fn adjacent_mines(&self) -> u8 {
        self.adj
    }
}

/// Main game state for one board
#[derive(Clone, Debug)]
pub struct Minefield {
    grid: Grid,
    mine_count: usize,
    mines_placed: bool,
    outcome: Outcome,
    cursor: CellPos,
    mines_disabled: bool, // Debug: revealing a mine does not explode
}

impl Minefield {
    /// Create a board with no mines placed yet
    pub fn new(rows: usize, columns: usize, mine_count: usize) -> Result<Self, FieldError> {
        let grid = Grid::new(rows, columns)?;
        if mine_count >= grid.len() {
            return Err(FieldError::InvalidConfiguration {
                mines: mine_count,
                cells: grid.len(),
            });
        }
        Ok(Minefield {
            grid,
            mine_count,
            mines_placed: false,
            outcome: Outcome::InProgress,
            cursor: CellPos::default(),
            mines_disabled: false,
        })
    }

    /// Throw the board away and start over, possibly with new dimensions
    ///
    /// On error the current board is left untouched.
    pub fn reset(&mut self, rows: usize, columns: usize, mine_count: usize) -> Result<(), FieldError> {
        *self = Minefield::new(rows, columns, mine_count)?;
        debug!("board reset to {rows}x{columns} with {mine_count} mines");
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn columns(&self) -> usize {
        self.grid.columns()
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    pub fn mines_placed(&self) -> bool {
        self.mines_placed
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn cursor(&self) -> CellPos {
        self.cursor
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.grid.cell(row, column)
    }

    pub fn is_selected(&self, row: usize, column: usize) -> bool {
        self.cursor == CellPos::new(row, column)
    }

    pub fn mines_disabled(&self) -> bool {
        self.mines_disabled
    }

    pub fn set_mines_disabled(&mut self, disabled: bool) {
        self.mines_disabled = disabled;
    }

    pub fn hidden_count(&self) -> usize {
        self.grid.iter().filter(|c| c.hidden).count()
    }

    /// Every safe cell is open. Matches `hidden_count() == mine_count` unless
    /// a mine was opened with mines disabled.
    fn cleared(&self) -> bool {
        self.grid.iter().all(|c| c.mine || !c.hidden)
    }

    pub fn flag_count(&self) -> usize {
        self.grid.iter().filter(|c| c.flagged).count()
    }

    /// Mine counter display value; negative when the player over-flags
    pub fn remaining_mines(&self) -> isize {
        self.mine_count as isize - self.flag_count() as isize
    }

    /// Place mines anywhere except the safe cell, then count neighbors
    ///
    /// Normally triggered by the first click. Does nothing once mines are placed.
    pub fn deploy_mines<P: MinePicker + ?Sized>(&mut self, safe_row: usize, safe_column: usize, picker: &mut P) {
        if self.mines_placed {
            return;
        }
        let (rows, columns) = (self.rows(), self.columns());
        let safe = self.grid.index_of(safe_row, safe_column);

        let mut placed = 0;
        while placed < self.mine_count {
            let pos = picker.pick(rows, columns);
            let Some(i) = self.grid.index_of(pos.row, pos.column) else {
                continue;
            };
            if Some(i) == safe || self.grid.at(i).mine {
                continue;
            }
            self.grid.at_mut(i).mine = true;
            placed += 1;
        }

        for i in 0..self.grid.len() {
            let adj = self
                .grid
                .at(i)
                .neighbors()
                .iter()
                .filter(|&&n| self.grid.at(n).mine)
                .count();
            self.grid.at_mut(i).adj = adj as u8;
        }
        self.mines_placed = true;
        debug!("deployed {} mines around safe cell ({safe_row}, {safe_column})", self.mine_count);
    }

    /// Reveal a cell, flood filling through cells with no adjacent mines
    pub fn reveal(&mut self, row: usize, column: usize) {
        if self.outcome.is_terminal() {
            return;
        }
        let Some(start) = self.grid.index_of(row, column) else {
            return;
        };
        let cell = self.grid.at(start);
        if !cell.hidden || cell.flagged {
            return;
        }

        self.grid.at_mut(start).hidden = false;
        let mut pending = vec![start];
        while let Some(i) = pending.pop() {
            let cell = self.grid.at(i);
            if cell.mine || cell.adj != 0 {
                continue;
            }
            for k in 0..cell.neighbors().len() {
                let n = self.grid.at(i).neighbors()[k];
                let neighbor = self.grid.at_mut(n);
                if neighbor.hidden && !neighbor.flagged {
                    neighbor.hidden = false;
                    pending.push(n);
                }
            }
        }

        if self.grid.at(start).mine && !self.mines_disabled {
            self.finish(Outcome::Exploded);
        } else if self.cleared() {
            self.finish(Outcome::Victory);
        }
    }

    /// Flip the flag on a hidden cell
    pub fn toggle_flag(&mut self, row: usize, column: usize) {
        if self.outcome.is_terminal() {
            return;
        }
        if let Some(cell) = self.grid.cell_mut(row, column) {
            if cell.hidden {
                cell.flagged = !cell.flagged;
            }
        }
    }

    /// Reveal the hidden, unflagged neighbors of a revealed number whose
    /// flagged neighbor count matches it
    pub fn chord(&mut self, row: usize, column: usize) {
        if self.outcome.is_terminal() {
            return;
        }
        let Some(i) = self.grid.index_of(row, column) else {
            return;
        };
        let cell = self.grid.at(i);
        if cell.hidden || cell.adj == 0 {
            return;
        }
        let flagged = cell.neighbors().iter().filter(|&&n| self.grid.at(n).flagged).count();
        if flagged != cell.adj as usize {
            return;
        }
        let targets: Vec<CellPos> = cell
            .neighbors()
            .iter()
            .filter_map(|&n| self.grid.pos_of(n))
            .collect();
        for pos in targets {
            self.reveal(pos.row, pos.column);
        }
    }

    /// Show every hidden cell; `endgame` also drops the flags on them
    pub fn reveal_all(&mut self, endgame: bool) {
        for cell in self.grid.iter_mut().filter(|c| c.hidden) {
            cell.hidden = false;
            if endgame {
                cell.flagged = false;
            }
        }
    }

    /// Step the cursor one cell, wrapping at the edges
    pub fn move_cursor(&mut self, direction: Direction) {
        let (rows, columns) = (self.rows(), self.columns());
        let CellPos { row, column } = self.cursor;
        self.cursor = match direction {
            Direction::Up => CellPos::new((row + rows - 1) % rows, column),
            Direction::Down => CellPos::new((row + 1) % rows, column),
            Direction::Left => CellPos::new(row, (column + columns - 1) % columns),
            Direction::Right => CellPos::new(row, (column + 1) % columns),
        };
    }

    /// Move the cursor directly; returns false when the position is off the board
    pub fn set_cursor(&mut self, row: usize, column: usize) -> bool {
        if self.grid.index_of(row, column).is_none() {
            return false;
        }
        self.cursor = CellPos::new(row, column);
        true
    }

    /// Apply an action to the cursor cell, placing mines first if needed
    ///
    /// A chord before the mines are placed does nothing.
    pub fn click_cursor<P: MinePicker + ?Sized>(&mut self, action: Action, picker: &mut P) {
        let CellPos { row, column } = self.cursor;
        if !self.mines_placed {
            if action == Action::Chord {
                return;
            }
            self.deploy_mines(row, column, picker);
        }
        match action {
            Action::Reveal => self.reveal(row, column),
            Action::Flag => self.toggle_flag(row, column),
            Action::Chord => self.chord(row, column),
        }
    }

    /// Pointer click: select the cell, then act on it like the cursor
    pub fn click_cell<P: MinePicker + ?Sized>(&mut self, row: usize, column: usize, action: Action, picker: &mut P) {
        if self.set_cursor(row, column) {
            self.click_cursor(action, picker);
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.outcome = outcome;
        self.reveal_all(true);
        info!("game over: {outcome:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Hands out a fixed sequence of positions, cycling when exhausted
    struct Scripted {
        picks: Vec<CellPos>,
        next: usize,
    }

    impl Scripted {
        fn new(picks: &[(usize, usize)]) -> Self {
            Scripted {
                picks: picks.iter().map(|&(r, c)| CellPos::new(r, c)).collect(),
                next: 0,
            }
        }
    }

    impl MinePicker for Scripted {
        fn pick(&mut self, _rows: usize, _columns: usize) -> CellPos {
            let pos = self.picks[self.next % self.picks.len()];
            self.next += 1;
            pos
        }
    }

    fn field_with_mines(rows: usize, columns: usize, mines: &[(usize, usize)], safe: (usize, usize)) -> Minefield {
        let mut field = Minefield::new(rows, columns, mines.len()).unwrap();
        field.deploy_mines(safe.0, safe.1, &mut Scripted::new(mines));
        field
    }

    #[test]
    fn rejects_too_many_mines() {
        assert_eq!(
            Minefield::new(3, 3, 9).unwrap_err(),
            FieldError::InvalidConfiguration { mines: 9, cells: 9 }
        );
        assert!(matches!(Minefield::new(0, 3, 0), Err(FieldError::Grid(_))));
        assert!(Minefield::new(3, 3, 8).is_ok());
    }

    #[test]
    fn counts_match_neighbors_after_deploy() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let mut field = Minefield::new(9, 11, 30).unwrap();
            field.deploy_mines(4, 5, &mut rng);
            let grid = field.grid();
            assert_eq!(grid.iter().filter(|c| c.mine).count(), 30);
            assert!(!grid.cell(4, 5).unwrap().mine);
            for cell in grid.iter() {
                let expected = cell.neighbors().iter().filter(|&&n| grid.at(n).mine).count();
                assert_eq!(cell.adj as usize, expected);
            }
        }
    }

    #[test]
    fn safe_cell_is_skipped_when_picked() {
        let mut field = Minefield::new(2, 2, 3).unwrap();
        let mut picker = Scripted::new(&[(0, 0), (0, 1), (0, 0), (7, 7), (1, 0), (0, 1), (1, 1)]);
        field.deploy_mines(0, 0, &mut picker);
        assert!(!field.cell(0, 0).unwrap().mine);
        assert!(field.cell(0, 1).unwrap().mine);
        assert!(field.cell(1, 0).unwrap().mine);
        assert!(field.cell(1, 1).unwrap().mine);
        assert_eq!(field.cell(0, 0).unwrap().adj, 3);
    }

    #[test]
    fn first_click_example_three_by_three() {
        let mut field = Minefield::new(3, 3, 1).unwrap();
        field.set_cursor(1, 1);
        field.click_cursor(Action::Reveal, &mut Scripted::new(&[(1, 1), (0, 0)]));
        assert!(field.cell(0, 0).unwrap().mine);
        assert_eq!(field.cell(1, 1).unwrap().adj, 1);
        assert!(!field.cell(1, 1).unwrap().hidden);
        assert_eq!(field.outcome(), Outcome::InProgress);
        assert!(field.mines_placed());
    }

    #[test]
    fn single_cell_without_mines_is_won_at_once() {
        let mut field = Minefield::new(1, 1, 0).unwrap();
        field.reveal(0, 0);
        assert_eq!(field.outcome(), Outcome::Victory);
    }

    #[test]
    fn revealing_a_mine_explodes_and_shows_everything() {
        let mut field = field_with_mines(3, 3, &[(2, 2)], (0, 0));
        field.toggle_flag(0, 1);
        field.reveal(2, 2);
        assert_eq!(field.outcome(), Outcome::Exploded);
        assert!(field.grid().iter().all(|c| !c.hidden && !c.flagged));
    }

    #[test]
    fn flood_fill_opens_zero_region() {
        // Mine in the corner: everything except the mine opens from the far corner
        let mut field = field_with_mines(4, 4, &[(0, 0)], (3, 3));
        field.reveal(3, 3);
        assert_eq!(field.outcome(), Outcome::Victory);

        let mut field = field_with_mines(4, 4, &[(0, 0), (3, 0)], (3, 3));
        field.toggle_flag(2, 3);
        field.reveal(0, 3);
        let grid = field.grid();
        for cell in grid.iter().filter(|c| !c.hidden && c.adj == 0) {
            for &n in cell.neighbors() {
                let neighbor = grid.at(n);
                assert!(!neighbor.hidden || neighbor.flagged);
            }
        }
        assert!(field.cell(2, 3).unwrap().hidden);
        assert_eq!(field.outcome(), Outcome::InProgress);
    }

    #[test]
    fn flagged_and_open_cells_ignore_reveal() {
        let mut field = field_with_mines(3, 3, &[(0, 0)], (2, 2));
        field.toggle_flag(1, 1);
        field.reveal(1, 1);
        assert!(field.cell(1, 1).unwrap().hidden);

        field.toggle_flag(1, 1);
        field.reveal(1, 1);
        assert!(!field.cell(1, 1).unwrap().hidden);
        field.toggle_flag(1, 1);
        assert!(!field.cell(1, 1).unwrap().flagged);
    }

    #[test]
    fn double_toggle_restores_flag() {
        let mut field = Minefield::new(2, 3, 1).unwrap();
        field.toggle_flag(1, 2);
        assert!(field.cell(1, 2).unwrap().flagged);
        field.toggle_flag(1, 2);
        assert!(!field.cell(1, 2).unwrap().flagged);
        assert_eq!(field.remaining_mines(), 1);
    }

    #[test]
    fn terminal_outcome_rejects_actions_but_not_movement() {
        let mut field = field_with_mines(3, 3, &[(0, 0)], (2, 2));
        field.reveal(0, 0);
        assert_eq!(field.outcome(), Outcome::Exploded);

        let mut other = Minefield::new(3, 3, 1).unwrap();
        other.reveal(0, 0);
        // hidden count dropped to zero without matching the mine count
        assert_eq!(other.outcome(), Outcome::InProgress);

        field.move_cursor(Direction::Left);
        assert_eq!(field.cursor(), CellPos::new(0, 2));
        let before = field.flag_count();
        field.toggle_flag(1, 1);
        assert_eq!(field.flag_count(), before);
    }

    #[test]
    fn cursor_wraps_in_every_direction() {
        let mut field = Minefield::new(3, 4, 0).unwrap();
        field.move_cursor(Direction::Up);
        assert_eq!(field.cursor(), CellPos::new(2, 0));
        field.move_cursor(Direction::Left);
        assert_eq!(field.cursor(), CellPos::new(2, 3));
        field.move_cursor(Direction::Down);
        assert_eq!(field.cursor(), CellPos::new(0, 3));
        field.move_cursor(Direction::Right);
        assert_eq!(field.cursor(), CellPos::new(0, 0));
        assert!(field.is_selected(0, 0));
        assert!(!field.set_cursor(3, 0));
    }

    #[test]
    fn reset_clears_mines() {
        let mut field = Minefield::new(5, 5, 5).unwrap();
        field.click_cursor(Action::Reveal, &mut StdRng::seed_from_u64(3));
        assert!(field.mines_placed());
        field.reset(5, 5, 5).unwrap();
        assert!(!field.mines_placed());
        assert!(field.grid().iter().all(|c| !c.mine && c.hidden));
        assert_eq!(field.outcome(), Outcome::InProgress);

        assert!(field.reset(2, 2, 4).is_err());
        assert_eq!(field.rows(), 5);
    }

    #[test]
    fn chord_opens_neighbors_of_satisfied_number() {
        let mut field = field_with_mines(3, 3, &[(0, 0)], (1, 1));
        field.reveal(1, 1);
        field.chord(1, 1);
        assert_eq!(field.hidden_count(), 8);

        field.toggle_flag(0, 0);
        field.chord(1, 1);
        assert_eq!(field.outcome(), Outcome::Victory);
    }

    #[test]
    fn chord_with_wrong_flag_explodes() {
        let mut field = field_with_mines(3, 3, &[(0, 0)], (1, 1));
        field.reveal(1, 1);
        field.toggle_flag(2, 2);
        field.chord(1, 1);
        assert_eq!(field.outcome(), Outcome::Exploded);
    }

    #[test]
    fn disabled_mines_do_not_explode() {
        let mut field = field_with_mines(3, 3, &[(0, 0)], (2, 2));
        field.set_mines_disabled(true);
        field.reveal(0, 0);
        assert_eq!(field.outcome(), Outcome::InProgress);
        assert!(!field.cell(0, 0).unwrap().hidden);
        field.reset(3, 3, 1).unwrap();
        assert!(!field.mines_disabled());
    }

    #[test]
    fn opened_mine_with_mines_disabled_needs_every_safe_cell() {
        let mut field = field_with_mines(1, 3, &[(0, 0)], (0, 2));
        field.set_mines_disabled(true);
        field.reveal(0, 0);
        field.reveal(0, 1);
        assert_eq!(field.outcome(), Outcome::InProgress);
        assert!(field.cell(0, 2).unwrap().hidden);

        field.reveal(0, 2);
        assert_eq!(field.outcome(), Outcome::Victory);
    }

    #[test]
    fn chord_before_deploy_does_nothing() {
        let mut field = Minefield::new(1, 3, 1).unwrap();
        let mut picker = Scripted::new(&[(0, 0), (0, 2)]);
        field.click_cell(0, 0, Action::Chord, &mut picker);
        assert!(!field.mines_placed());
        assert!(field.grid().iter().all(|c| c.hidden && !c.mine));

        field.click_cell(0, 2, Action::Reveal, &mut picker);
        assert!(field.mines_placed());
        assert!(!field.cell(0, 2).unwrap().mine);
        assert!(field.cell(0, 0).unwrap().mine);
        assert_ne!(field.outcome(), Outcome::Exploded);
    }

    #[test]
    fn pointer_click_moves_cursor_and_deploys() {
        let mut field = Minefield::new(4, 4, 3).unwrap();
        field.click_cell(2, 3, Action::Flag, &mut StdRng::seed_from_u64(11));
        assert_eq!(field.cursor(), CellPos::new(2, 3));
        assert!(field.mines_placed());
        assert!(!field.cell(2, 3).unwrap().mine);
        assert!(field.cell(2, 3).unwrap().flagged);

        field.click_cell(9, 9, Action::Reveal, &mut StdRng::seed_from_u64(11));
        assert_eq!(field.cursor(), CellPos::new(2, 3));
    }
}
