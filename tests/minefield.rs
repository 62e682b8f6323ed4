// Integration tests for the minefield model and navigation shell

use rand::SeedableRng;
use rand::rngs::StdRng;

use xtmines::xtm_config::Config;
use xtmines::xtm_scene::{Flow, Input, Key, KeyPress, Scene, Shell};
use xtmines::{Action, CellPos, CellView, Direction, MinePicker, Minefield, Outcome};

/// Picker that replays a fixed list of positions
struct Replay(Vec<CellPos>, usize);

impl MinePicker for Replay {
    fn pick(&mut self, _rows: usize, _columns: usize) -> CellPos {
        let pos = self.0[self.1 % self.0.len()];
        self.1 += 1;
        pos
    }
}

/// Every zero cell that is revealed has only revealed or flagged neighbors
fn assert_flood_closed(field: &Minefield) {
    let grid = field.grid();
    for cell in grid.iter() {
        if !cell.is_hidden() && !cell.is_mine() && cell.adjacent_mines() == 0 {
            for &n in cell.neighbors() {
                assert!(!grid.at(n).is_hidden() || grid.at(n).is_flagged());
            }
        }
    }
}

mod model {
    use super::*;

    #[test]
    fn deployed_boards_are_consistent() {
        let mut rng = StdRng::seed_from_u64(42);
        for (rows, columns, mines) in [(1, 2, 1), (3, 3, 8), (9, 9, 10), (16, 30, 99), (5, 40, 100)] {
            let mut field = Minefield::new(rows, columns, mines).unwrap();
            let safe = (rows / 2, columns / 2);
            field.set_cursor(safe.0, safe.1);
            field.click_cursor(Action::Reveal, &mut rng);

            let grid = field.grid();
            assert_eq!(grid.iter().filter(|c| c.is_mine()).count(), mines);
            assert!(!field.cell(safe.0, safe.1).unwrap().is_mine());
            assert_ne!(field.outcome(), Outcome::Exploded);
            for cell in grid.iter() {
                let expected = cell.neighbors().iter().filter(|&&n| grid.at(n).is_mine()).count();
                assert_eq!(cell.adjacent_mines() as usize, expected);
            }
            assert_flood_closed(&field);
        }
    }

    #[test]
    fn random_play_keeps_invariants() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut field = Minefield::new(12, 12, 20).unwrap();
        let moves = [Direction::Right, Direction::Down, Direction::Down, Direction::Left, Direction::Up];
        let mut step = 0;
        while field.outcome() == Outcome::InProgress && step < 500 {
            field.move_cursor(moves[step % moves.len()]);
            if step % 7 == 3 {
                field.click_cursor(Action::Flag, &mut rng);
            } else {
                field.click_cursor(Action::Reveal, &mut rng);
            }
            assert!(field.grid().iter().all(|c| !c.is_flagged() || c.is_hidden()));
            step += 1;
        }
        if field.outcome().is_terminal() {
            assert!(field.grid().iter().all(|c| !c.is_hidden()));
        }
    }

    #[test]
    fn scripted_layout_wins_after_clearing_all_safe_cells() {
        let mut field = Minefield::new(2, 3, 2).unwrap();
        let mut picker = Replay(vec![CellPos::new(0, 0), CellPos::new(1, 2)], 0);
        field.click_cell(0, 2, Action::Reveal, &mut picker);
        assert_eq!(field.outcome(), Outcome::InProgress);
        for (r, c) in [(0, 1), (1, 0), (1, 1)] {
            field.reveal(r, c);
        }
        assert_eq!(field.hidden_count(), 0);
        assert_eq!(field.outcome(), Outcome::Victory);
    }

    #[test]
    fn reveal_all_without_endgame_keeps_flags() {
        let mut field = Minefield::new(2, 2, 1).unwrap();
        field.toggle_flag(1, 1);
        field.reveal_all(false);
        assert!(field.cell(1, 1).unwrap().is_flagged());
        assert!(!field.cell(1, 1).unwrap().is_hidden());
        assert_eq!(field.outcome(), Outcome::InProgress);
    }
}

mod shell {
    use super::*;

    #[test]
    fn full_session_from_menu_to_exit() {
        let mut sh = Shell::new(Config::default(), StdRng::seed_from_u64(77)).unwrap();
        let press = |k| Input::KeyUp(KeyPress::plain(k));

        assert_eq!(sh.dispatch(press(Key::Enter)), Flow::Continue);
        assert_eq!(sh.scene, Scene::Playing);

        sh.dispatch(press(Key::Char('d')));
        sh.dispatch(press(Key::Char('s')));
        assert_eq!(sh.field.cursor(), CellPos::new(1, 1));
        sh.dispatch(press(Key::Char(' ')));
        assert!(sh.field.mines_placed());
        assert!(!sh.field.cell(1, 1).unwrap().is_mine());

        sh.dispatch(press(Key::Char('n')));
        assert!(!sh.field.mines_placed());
        assert_eq!(sh.clock.seconds(), 0);

        sh.dispatch(press(Key::Esc));
        assert_eq!(sh.scene, Scene::MainMenu);
        assert_eq!(sh.dispatch(press(Key::Esc)), Flow::Exit);
    }
}
