// Scene navigation: main menu, options and the running game
// Turns one input event at a time into minefield calls; drawing lives in xtm_ui

use log::{debug, info, warn};
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

use crate::xtm_config::{Config, Difficulty};
use crate::xtm_field::{Action, Direction, FieldError, Minefield, MinePicker};

/// Keys the shell understands, already decoupled from the terminal backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Backspace,
    Esc,
    Char(char),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        KeyPress { key, ctrl: false }
    }

    pub fn ctrl(c: char) -> Self {
        KeyPress {
            key: Key::Char(c),
            ctrl: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
    Middle,
}

/// One input event as delivered by the front end
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    PointerUp(Button, u16, u16), // button, column, row (terminal coordinates)
    KeyUp(KeyPress),
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scene {
    MainMenu,
    Options,
    Playing,
}

/// Whether the event loop keeps going after a dispatch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Entries of the main menu, in display order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuItem {
    NewGame,
    Options,
    Exit,
}

impl MenuItem {
    pub const ALL: [MenuItem; 3] = [MenuItem::NewGame, MenuItem::Options, MenuItem::Exit];

    pub fn label(self) -> &'static str {
        match self {
            MenuItem::NewGame => "New Game",
            MenuItem::Options => "Options",
            MenuItem::Exit => "Exit Game",
        }
    }
}

/// Screen regions recorded by the last draw, used to resolve pointer clicks
#[derive(Clone, Debug, Default)]
pub struct HitMap {
    pub board: Option<Rect>, // Cell area only, without borders
    pub cell_width: u16,     // Terminal columns per cell
    pub menu: Vec<(MenuItem, Rect)>,
    pub options: Vec<(usize, Rect)>,
}

fn contains(r: Rect, x: u16, y: u16) -> bool {
    x >= r.x && x < r.x.saturating_add(r.width) && y >= r.y && y < r.y.saturating_add(r.height)
}

impl HitMap {
    /// Map a terminal position to a (row, column) on the board
    pub fn cell_at(&self, x: u16, y: u16) -> Option<(usize, usize)> {
        let board = self.board?;
        if !contains(board, x, y) || self.cell_width == 0 {
            return None;
        }
        Some(((y - board.y) as usize, ((x - board.x) / self.cell_width) as usize))
    }

    pub fn menu_at(&self, x: u16, y: u16) -> Option<MenuItem> {
        self.menu.iter().find(|(_, r)| contains(*r, x, y)).map(|(item, _)| *item)
    }

    pub fn option_at(&self, x: u16, y: u16) -> Option<usize> {
        self.options.iter().find(|(_, r)| contains(*r, x, y)).map(|(i, _)| *i)
    }
}

/// Game clock, running from mine deployment until the outcome is decided
#[derive(Clone, Copy, Debug, Default)]
pub struct Clock {
    start: Option<Instant>,
    elapsed: Duration,
}

impl Clock {
    pub fn running(&self) -> bool {
        self.start.is_some()
    }

    pub fn seconds(&self) -> u64 {
        match self.start {
            Some(t0) => t0.elapsed().as_secs(),
            None => self.elapsed.as_secs(),
        }
    }

    fn start(&mut self) {
        self.start = Some(Instant::now());
        self.elapsed = Duration::ZERO;
    }

    fn stop(&mut self) {
        if let Some(t0) = self.start.take() {
            self.elapsed = t0.elapsed();
        }
    }

    fn clear(&mut self) {
        *self = Clock::default();
    }
}

/// Rows of the options screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionRow {
    Difficulty,
    Rows,
    Columns,
    Mines,
    ShowIndicator,
    AsciiIcons,
    Debug,
}

impl OptionRow {
    pub const ALL: [OptionRow; 7] = [
        OptionRow::Difficulty,
        OptionRow::Rows,
        OptionRow::Columns,
        OptionRow::Mines,
        OptionRow::ShowIndicator,
        OptionRow::AsciiIcons,
        OptionRow::Debug,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OptionRow::Difficulty => "Difficulty",
            OptionRow::Rows => "Custom rows",
            OptionRow::Columns => "Custom columns",
            OptionRow::Mines => "Custom mines",
            OptionRow::ShowIndicator => "Cursor indicator",
            OptionRow::AsciiIcons => "ASCII icons",
            OptionRow::Debug => "Debug mode",
        }
    }
}

/// Pending edits on the options screen; applied only when valid
#[derive(Clone, Debug)]
pub struct OptionsForm {
    pub focus: usize,
    pub draft: Config,
    pub error: Option<String>,
}

impl OptionsForm {
    fn new(cfg: &Config) -> Self {
        OptionsForm {
            focus: 0,
            draft: cfg.clone(),
            error: None,
        }
    }

    pub fn row(&self) -> OptionRow {
        OptionRow::ALL[self.focus]
    }

    /// Display value of a row
    pub fn value(&self, row: OptionRow) -> String {
        let d = &self.draft;
        let on_off = |b: bool| if b { "on" } else { "off" }.to_string();
        match row {
            OptionRow::Difficulty => d.difficulty.name().to_string(),
            OptionRow::Rows => d.custom_rows.to_string(),
            OptionRow::Columns => d.custom_columns.to_string(),
            OptionRow::Mines => d.custom_mines.to_string(),
            OptionRow::ShowIndicator => on_off(d.show_indicator),
            OptionRow::AsciiIcons => on_off(d.ascii_icons),
            OptionRow::Debug => on_off(d.debug),
        }
    }

    /// Step the focused value up or down
    fn adjust(&mut self, up: bool) {
        let row = self.row();
        let d = &mut self.draft;
        let step = |v: usize| if up { v.saturating_add(1) } else { v.saturating_sub(1).max(1) };
        match row {
            OptionRow::Difficulty => {
                let i = d.difficulty.to_index();
                let i = if up { (i + 1) % 4 } else { (i + 3) % 4 };
                d.difficulty = Difficulty::from_index(i, d.custom_rows, d.custom_columns, d.custom_mines);
            }
            OptionRow::Rows => d.custom_rows = step(d.custom_rows),
            OptionRow::Columns => d.custom_columns = step(d.custom_columns),
            OptionRow::Mines => d.custom_mines = if up { d.custom_mines + 1 } else { d.custom_mines.saturating_sub(1) },
            OptionRow::ShowIndicator => d.show_indicator = !d.show_indicator,
            OptionRow::AsciiIcons => d.ascii_icons = !d.ascii_icons,
            OptionRow::Debug => d.debug = !d.debug,
        }
        if let Difficulty::Custom(_, _, _) = d.difficulty {
            d.difficulty = Difficulty::Custom(d.custom_rows, d.custom_columns, d.custom_mines);
        }
        self.error = None;
    }

    /// Validate the draft by building the board it describes
    fn validate(&self) -> Result<(), String> {
        let (r, c, n) = self.draft.board();
        Minefield::new(r, c, n).map(|_| ()).map_err(|e| e.to_string())
    }
}

/// The navigation shell: owns configuration, the active minefield and the scene
pub struct Shell<P: MinePicker> {
    pub config: Config,
    pub scene: Scene,
    pub field: Minefield,
    pub menu_focus: usize,
    pub options: OptionsForm,
    pub hits: HitMap,
    pub clock: Clock,
    pub peek_mines: bool, // Debug: show mines on hidden cells
    pub message: Option<String>,
    picker: P,
    dirty: bool,
}

impl<P: MinePicker> Shell<P> {
    /// Start at the main menu. An unusable board in the config falls back to Beginner.
    pub fn new(mut config: Config, picker: P) -> Result<Self, FieldError> {
        let (r, c, n) = config.board();
        let field = match Minefield::new(r, c, n) {
            Ok(field) => field,
            Err(e) => {
                warn!("{e}; falling back to {}", Difficulty::Beginner.name());
                config.difficulty = Difficulty::Beginner;
                let (r, c, n) = Difficulty::Beginner.params();
                Minefield::new(r, c, n)?
            }
        };
        Ok(Shell {
            options: OptionsForm::new(&config),
            config,
            scene: Scene::MainMenu,
            field,
            menu_focus: 0,
            hits: HitMap::default(),
            clock: Clock::default(),
            peek_mines: false,
            message: None,
            picker,
            dirty: true,
        })
    }

    /// Whether a repaint is due; clears the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    /// Handle one input event
    pub fn dispatch(&mut self, input: Input) -> Flow {
        if input == Input::Quit {
            info!("quit requested");
            return Flow::Exit;
        }
        self.dirty = true;
        match self.scene {
            Scene::MainMenu => self.menu_input(input),
            Scene::Options => {
                self.options_input(input);
                Flow::Continue
            }
            Scene::Playing => {
                self.play_input(input);
                Flow::Continue
            }
        }
    }

    fn switch(&mut self, scene: Scene) {
        debug!("scene {:?} -> {:?}", self.scene, scene);
        self.scene = scene;
        self.hits = HitMap::default();
    }

    /// Build a fresh board from the current config and enter play
    pub fn start_game(&mut self) {
        let (r, c, n) = self.config.board();
        if let Err(e) = self.field.reset(r, c, n) {
            warn!("{e}");
            self.message = Some(e.to_string());
            return;
        }
        self.field.set_mines_disabled(false);
        self.peek_mines = false;
        self.clock.clear();
        self.message = None;
        info!("new {} game: {r}x{c}, {n} mines", self.config.difficulty.name());
        self.switch(Scene::Playing);
    }

    fn activate(&mut self, item: MenuItem) -> Flow {
        match item {
            MenuItem::NewGame => self.start_game(),
            MenuItem::Options => {
                self.options = OptionsForm::new(&self.config);
                self.switch(Scene::Options);
            }
            MenuItem::Exit => return Flow::Exit,
        }
        Flow::Continue
    }

    fn menu_input(&mut self, input: Input) -> Flow {
        let count = MenuItem::ALL.len();
        match input {
            Input::PointerUp(Button::Left, x, y) => {
                if let Some(item) = self.hits.menu_at(x, y) {
                    return self.activate(item);
                }
            }
            Input::KeyUp(KeyPress { key: Key::Char('d'), ctrl: true }) => {
                self.config.debug = !self.config.debug;
                info!("debug mode {}", if self.config.debug { "enabled" } else { "disabled" });
            }
            Input::KeyUp(KeyPress { key, ctrl: false }) => match key {
                Key::Up => self.menu_focus = (self.menu_focus + count - 1) % count,
                Key::Down => self.menu_focus = (self.menu_focus + 1) % count,
                Key::Enter | Key::Char(' ') => return self.activate(MenuItem::ALL[self.menu_focus]),
                Key::Char('n') => return self.activate(MenuItem::NewGame),
                Key::Char('o') => return self.activate(MenuItem::Options),
                Key::Char('q') | Key::Esc => return Flow::Exit,
                _ => {}
            },
            _ => {}
        }
        Flow::Continue
    }

    fn options_input(&mut self, input: Input) {
        let count = OptionRow::ALL.len();
        match input {
            Input::PointerUp(button, x, y) => {
                if let Some(i) = self.hits.option_at(x, y) {
                    self.options.focus = i;
                    if button != Button::Middle {
                        self.options.adjust(button == Button::Left);
                    }
                }
            }
            Input::KeyUp(KeyPress { key, ctrl: false }) => match key {
                Key::Up => self.options.focus = (self.options.focus + count - 1) % count,
                Key::Down => self.options.focus = (self.options.focus + 1) % count,
                Key::Left | Key::Char('-') => self.options.adjust(false),
                Key::Right | Key::Char('+') | Key::Char(' ') => self.options.adjust(true),
                Key::Enter => self.apply_options(),
                Key::Esc | Key::Char('q') => self.switch(Scene::MainMenu),
                _ => {}
            },
            _ => {}
        }
    }

    fn apply_options(&mut self) {
        if let Err(e) = self.options.validate() {
            self.options.error = Some(e);
            return;
        }
        self.config = self.options.draft.clone();
        info!("options applied: {:?}", self.config);
        self.switch(Scene::MainMenu);
    }

    fn play_input(&mut self, input: Input) {
        match input {
            Input::PointerUp(button, x, y) => {
                if let Some((row, column)) = self.hits.cell_at(x, y) {
                    let action = match button {
                        Button::Left => Action::Reveal,
                        Button::Right => Action::Flag,
                        Button::Middle => Action::Chord,
                    };
                    self.act(|field, picker| field.click_cell(row, column, action, picker));
                }
            }
            Input::KeyUp(KeyPress { key: Key::Char(c), ctrl: true }) if self.config.debug => match c {
                'm' => {
                    let disabled = !self.field.mines_disabled();
                    self.field.set_mines_disabled(disabled);
                    debug!("mines disabled: {disabled}");
                }
                'r' => self.peek_mines = !self.peek_mines,
                _ => {}
            },
            Input::KeyUp(KeyPress { key, ctrl: false }) => match key {
                Key::Up | Key::Char('w') => self.field.move_cursor(Direction::Up),
                Key::Down | Key::Char('s') => self.field.move_cursor(Direction::Down),
                Key::Left | Key::Char('a') => self.field.move_cursor(Direction::Left),
                Key::Right | Key::Char('d') => self.field.move_cursor(Direction::Right),
                Key::Enter | Key::Char(' ') => self.act(|field, picker| field.click_cursor(Action::Reveal, picker)),
                Key::Backspace | Key::Char('r') | Key::Char('f') => {
                    self.act(|field, picker| field.click_cursor(Action::Flag, picker))
                }
                Key::Char('c') => self.act(|field, picker| field.click_cursor(Action::Chord, picker)),
                Key::Char('n') => self.start_game(),
                Key::Char('q') | Key::Esc => self.switch(Scene::MainMenu),
                _ => {}
            },
            _ => {}
        }
    }

    /// Run a board action and keep the clock in step with the outcome
    fn act(&mut self, f: impl FnOnce(&mut Minefield, &mut P)) {
        let was_placed = self.field.mines_placed();
        f(&mut self.field, &mut self.picker);
        if !was_placed && self.field.mines_placed() {
            self.clock.start();
        }
        if self.field.outcome().is_terminal() && self.clock.running() {
            self.clock.stop();
        }
    }
}
