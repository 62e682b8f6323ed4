// Board geometry: a flat arena of cells with precomputed neighbor indices
// Knows nothing about mines being placed, only about where cells are

use thiserror::Error;

/// Position of a cell on the board, 0-indexed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellPos {
    pub row: usize,
    pub column: usize,
}

impl CellPos {
    pub fn new(row: usize, column: usize) -> Self {
        CellPos { row, column }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("invalid board dimensions {rows}x{columns}; both must be at least 1")]
    InvalidDimensions { rows: usize, columns: usize },
}

/// A single square of the board
#[derive(Clone, Debug)]
pub struct Cell {
    pub mine: bool,     // Contains a mine
    pub hidden: bool,   // Not yet revealed
    pub flagged: bool,  // Marked by the player (only while hidden)
    pub adj: u8,        // Adjacent mine count (0-8), valid once mines are placed
    neighbors: Vec<usize>,
}

impl Cell {
    fn new(neighbors: Vec<usize>) -> Self {
        Cell {
            mine: false,
            hidden: true,
            flagged: false,
            adj: 0,
            neighbors,
        }
    }

    /// Arena indices of the surrounding cells, in row-major order
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }
}

/// Fixed rows x columns arena of cells
///
/// Neighbor links are stored as indices into the arena so the grid never
/// holds references to itself. They are computed once in [`Grid::new`].
#[derive(Clone, Debug)]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Allocate a grid of hidden, unflagged, mine-free cells
    pub fn new(rows: usize, columns: usize) -> Result<Self, GridError> {
        let invalid = GridError::InvalidDimensions { rows, columns };
        if rows == 0 || columns == 0 {
            return Err(invalid);
        }
        let len = rows.checked_mul(columns).ok_or(invalid)?;

        let mut cells = Vec::with_capacity(len);
        for i in 0..len {
            let (r, c) = (i / columns, i % columns);
            let mut neighbors = Vec::with_capacity(8);
            for nr in r.saturating_sub(1)..=(r + 1).min(rows - 1) {
                for nc in c.saturating_sub(1)..=(c + 1).min(columns - 1) {
                    if nr == r && nc == c {
                        continue;
                    }
                    neighbors.push(nr * columns + nc);
                }
            }
            cells.push(Cell::new(neighbors));
        }

        Ok(Grid { rows, columns, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Convert a position to its arena index, `None` when out of bounds
    pub fn index_of(&self, row: usize, column: usize) -> Option<usize> {
        (row < self.rows && column < self.columns).then(|| row * self.columns + column)
    }

    /// Convert an arena index back to a position, `None` when out of bounds
    pub fn pos_of(&self, index: usize) -> Option<CellPos> {
        (index < self.cells.len()).then(|| CellPos::new(index / self.columns, index % self.columns))
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.index_of(row, column).map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, row: usize, column: usize) -> Option<&mut Cell> {
        let i = self.index_of(row, column)?;
        Some(&mut self.cells[i])
    }

    pub fn at(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn at_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }
}
