// Library side of the terminal Minesweeper
// The model (grid + minefield) has no terminal dependency; the shell and UI build on it

pub mod xtm_color;  // Terminal color depth detection and board palette
pub mod xtm_config; // Board presets and persisted preferences
pub mod xtm_field;  // Minefield model: mines, reveal, flags, outcome
pub mod xtm_grid;   // Cell arena and neighbor indices
pub mod xtm_scene;  // Menu / options / playing state machine
pub mod xtm_ui;     // Terminal rendering and event translation

pub use xtm_field::{Action, CellView, Direction, FieldError, MinePicker, Minefield, Outcome};
pub use xtm_grid::{Cell, CellPos, Grid, GridError};
