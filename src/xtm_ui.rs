use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use std::error::Error;
use std::io;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

use crate::xtm_color::Palette;
use crate::xtm_config::Config;
use crate::xtm_field::{CellView, MinePicker, Outcome};
use crate::xtm_scene::{Button, Flow, HitMap, Input, Key, KeyPress, MenuItem, OptionRow, Scene, Shell};

/// Terminal columns per board cell: one padding/indicator column plus the glyph
const CELL_WIDTH: u16 = 2;
/// Repaint interval for the clock while a game is running
const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Glyphs for cell states, with an ASCII fallback set
struct Glyphs {
    flag: &'static str,
    mine: &'static str,
    indicator: &'static str,
}

impl Glyphs {
    fn new(ascii: bool) -> Self {
        if ascii {
            Glyphs {
                flag: "F",
                mine: "*",
                indicator: ">",
            }
        } else {
            Glyphs {
                flag: "⚑",
                mine: "☼",
                indicator: "▸",
            }
        }
    }
}

/// Set up the terminal, run the event loop and restore the terminal
/// Returns the configuration as left by the options screen
pub fn run(config: Config) -> Result<Config, Box<dyn Error>> {
    let palette = Palette::detect();
    let mut shell = Shell::new(config, rand::thread_rng())?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut shell, &palette);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;
    Ok(shell.into_config())
}

/// Block for the next event, dispatch it and repaint when something changed
fn event_loop<B: Backend, P: MinePicker>(
    terminal: &mut Terminal<B>,
    shell: &mut Shell<P>,
    palette: &Palette,
) -> io::Result<()> {
    loop {
        if shell.take_dirty() {
            terminal.draw(|f| draw(f, shell, palette))?;
        }

        let ev = if shell.clock.running() {
            if !event::poll(CLOCK_TICK)? {
                shell.mark_dirty();
                continue;
            }
            event::read()?
        } else {
            event::read()?
        };

        if let Event::Resize(_, _) = ev {
            shell.mark_dirty();
            continue;
        }
        if let Some(input) = translate(ev) {
            if shell.dispatch(input) == Flow::Exit {
                return Ok(());
            }
        }
    }
}

/// Convert a terminal event into a shell input
///
/// Most terminals never report key releases, so presses are delivered as
/// key-up inputs and explicit releases are dropped to avoid acting twice.
pub fn translate(ev: Event) -> Option<Input> {
    match ev {
        Event::Key(KeyEvent {
            code, modifiers, kind, ..
        }) => {
            if kind == KeyEventKind::Release {
                return None;
            }
            let ctrl = modifiers.contains(KeyModifiers::CONTROL);
            let key = match code {
                KeyCode::Char('c') if ctrl => return Some(Input::Quit),
                KeyCode::Up => Key::Up,
                KeyCode::Down => Key::Down,
                KeyCode::Left => Key::Left,
                KeyCode::Right => Key::Right,
                KeyCode::Enter => Key::Enter,
                KeyCode::Backspace => Key::Backspace,
                KeyCode::Esc => Key::Esc,
                KeyCode::Char(c) => Key::Char(c.to_ascii_lowercase()),
                _ => return None,
            };
            Some(Input::KeyUp(KeyPress { key, ctrl }))
        }
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Up(button),
            column,
            row,
            ..
        }) => {
            let button = match button {
                MouseButton::Left => Button::Left,
                MouseButton::Right => Button::Right,
                MouseButton::Middle => Button::Middle,
            };
            Some(Input::PointerUp(button, column, row))
        }
        _ => None,
    }
}

fn draw<B: Backend, P: MinePicker>(f: &mut Frame<B>, shell: &mut Shell<P>, palette: &Palette) {
    shell.hits = HitMap::default();
    match shell.scene {
        Scene::MainMenu => draw_menu(f, shell, palette),
        Scene::Options => draw_options(f, shell, palette),
        Scene::Playing => draw_playing(f, shell, palette),
    }
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Render a centered warning when the terminal cannot fit the screen
fn too_small<B: Backend>(f: &mut Frame<B>, min_w: u16, min_h: u16) -> bool {
    let size = f.size();
    if size.width >= min_w && size.height >= min_h {
        return false;
    }
    let lines = vec![
        Spans::from(Span::raw("Terminal size too small.")),
        Spans::from(Span::raw(format!("Minimum required: {} x {}", min_w, min_h))),
    ];
    let warn = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("Resize Terminal"))
        .alignment(Alignment::Center);
    f.render_widget(Clear, size);
    let area = center_rect(40, 5, size);
    f.render_widget(warn, area);
    true
}

fn draw_menu<B: Backend, P: MinePicker>(f: &mut Frame<B>, shell: &mut Shell<P>, palette: &Palette) {
    if too_small(f, 40, 14) {
        return;
    }
    let size = f.size();
    let area = center_rect(36, 12, size);
    let title = if shell.config.debug { "Minesweeper! [debug]" } else { "Minesweeper!" };
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center),
        area,
    );

    let focus_style = Style::default().bg(palette.selected).fg(Color::Black).add_modifier(Modifier::BOLD);
    for (i, item) in MenuItem::ALL.iter().enumerate() {
        let rect = Rect::new(area.x + 1, area.y + 2 + 2 * i as u16, area.width.saturating_sub(2), 1);
        let style = if i == shell.menu_focus { focus_style } else { Style::default().fg(palette.glyph) };
        f.render_widget(
            Paragraph::new(Span::styled(item.label(), style)).alignment(Alignment::Center),
            rect,
        );
        shell.hits.menu.push((*item, rect));
    }

    let (r, c, n) = shell.config.board();
    let mut footer = vec![Spans::from(Span::raw(format!(
        "{} {}x{}, {} mines",
        shell.config.difficulty.name(),
        r,
        c,
        n
    )))];
    if let Some(msg) = &shell.message {
        footer.push(Spans::from(Span::styled(msg.clone(), Style::default().fg(palette.mine))));
    }
    let footer_rect = Rect::new(area.x + 1, area.y + 8, area.width.saturating_sub(2), 3);
    f.render_widget(Paragraph::new(Text::from(footer)).alignment(Alignment::Center), footer_rect);
}

fn draw_options<B: Backend, P: MinePicker>(f: &mut Frame<B>, shell: &mut Shell<P>, palette: &Palette) {
    let height = OptionRow::ALL.len() as u16 + 7;
    if too_small(f, 46, height + 2) {
        return;
    }
    let size = f.size();
    let area = center_rect(44, height, size);
    f.render_widget(Clear, area);
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .title("Options")
            .title_alignment(Alignment::Center),
        area,
    );

    let label_width = 20usize;
    let focus_style = Style::default().bg(palette.selected).fg(Color::Black).add_modifier(Modifier::BOLD);
    for (i, row) in OptionRow::ALL.iter().enumerate() {
        let rect = Rect::new(area.x + 2, area.y + 2 + i as u16, area.width.saturating_sub(4), 1);
        let label = format!("{:<width$}", row.label(), width = label_width);
        let value = format!("< {} >", shell.options.value(*row));
        let value_style = if i == shell.options.focus { focus_style } else { Style::default().fg(palette.key) };
        f.render_widget(
            Paragraph::new(Spans::from(vec![Span::raw(label), Span::styled(value, value_style)])),
            rect,
        );
        shell.hits.options.push((i, rect));
    }

    let mut lines = vec![Spans::from(Span::raw("←/→ change  ↑/↓ select  Enter apply  Esc back"))];
    if let Some(err) = &shell.options.error {
        lines.push(Spans::from(Span::styled(err.clone(), Style::default().fg(palette.mine))));
    }
    let rows = OptionRow::ALL.len() as u16;
    let help_rect = Rect::new(area.x + 1, area.y + 3 + rows, area.width.saturating_sub(2), 3);
    f.render_widget(
        Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .wrap(ratatui::widgets::Wrap { trim: true }),
        help_rect,
    );
}

fn draw_playing<B: Backend, P: MinePicker>(f: &mut Frame<B>, shell: &mut Shell<P>, palette: &Palette) {
    let field = &shell.field;
    let (rows, columns) = (field.rows(), field.columns());
    let board_w = to_u16(columns).saturating_mul(CELL_WIDTH).saturating_add(3);
    let board_h = to_u16(rows).saturating_add(2);
    if too_small(f, board_w.max(60), board_h.saturating_add(6)) {
        return;
    }
    let size = f.size();

    // layout: status row, board, key help
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(board_h), Constraint::Length(3)].as_ref())
        .split(size);

    // status row (left counters, right outcome)
    let left_text = format!(" Mines: {}   Time: {}s ", field.remaining_mines(), shell.clock.seconds());
    let (right_text, right_style) = match field.outcome() {
        Outcome::InProgress => (String::new(), Style::default()),
        Outcome::Exploded => (
            "BOOM! N: new game ".to_string(),
            Style::default().fg(palette.mine).add_modifier(Modifier::BOLD),
        ),
        Outcome::Victory => (
            "Cleared! N: new game ".to_string(),
            Style::default().fg(palette.grass).add_modifier(Modifier::BOLD),
        ),
    };
    let inner_w = chunks[0].width.saturating_sub(2) as usize;
    let used = left_text.as_str().width() + right_text.as_str().width();
    let mid_spaces = inner_w.saturating_sub(used).max(1);
    let status = Paragraph::new(Spans::from(vec![
        Span::raw(left_text),
        Span::raw(" ".repeat(mid_spaces)),
        Span::styled(right_text, right_style),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, chunks[0]);

    // board
    let glyphs = Glyphs::new(shell.config.ascii_icons);
    let board_area = center_rect(board_w, board_h, chunks[1]);
    let mut lines = Vec::with_capacity(rows);
    for r in 0..rows {
        let mut spans = Vec::with_capacity(columns * 2 + 1);
        for c in 0..columns {
            let Some(cell) = field.cell(r, c) else { continue };
            let (glyph, style) = cell_look(cell, shell.peek_mines, &glyphs, palette);
            let pad = if field.is_selected(r, c) {
                let bg = Style::default().bg(palette.selected);
                if shell.config.show_indicator {
                    Span::styled(glyphs.indicator, bg.fg(palette.key).add_modifier(Modifier::BOLD))
                } else {
                    Span::styled(" ", bg)
                }
            } else {
                Span::styled(" ", Style::default().bg(style.bg.unwrap_or(palette.soil)))
            };
            spans.push(pad);
            spans.push(Span::styled(glyph, style));
        }
        spans.push(Span::styled(" ", Style::default().bg(palette.soil)));
        lines.push(Spans::from(spans));
    }
    let title = if shell.config.debug {
        format!("{} [debug]", shell.config.difficulty.name())
    } else {
        shell.config.difficulty.name().to_string()
    };
    let board = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center),
    );
    f.render_widget(board, board_area);

    // key help
    let mut help = String::from(" Arrows/WASD move  Space reveal  F flag  C chord  N new  Q menu");
    if shell.config.debug {
        help.push_str("  ^M mines  ^R peek");
    }
    f.render_widget(
        Paragraph::new(Span::styled(help, Style::default().fg(palette.key))).block(Block::default().borders(Borders::ALL)),
        chunks[2],
    );

    shell.hits.board = Some(Rect::new(
        board_area.x + 1,
        board_area.y + 1,
        to_u16(columns).saturating_mul(CELL_WIDTH),
        to_u16(rows),
    ));
    shell.hits.cell_width = CELL_WIDTH;
}

/// Glyph and style for one cell
fn cell_look(cell: &impl CellView, peek_mines: bool, glyphs: &Glyphs, palette: &Palette) -> (String, Style) {
    let base = Style::default().fg(palette.glyph);
    if cell.is_flagged() {
        (glyphs.flag.to_string(), base.bg(palette.flag))
    } else if cell.is_hidden() {
        if peek_mines && cell.is_mine() {
            (glyphs.mine.to_string(), base.bg(palette.grass).fg(palette.mine))
        } else {
            (" ".to_string(), base.bg(palette.grass))
        }
    } else if cell.is_mine() {
        (glyphs.mine.to_string(), base.bg(palette.mine).add_modifier(Modifier::BOLD))
    } else if cell.adjacent_mines() > 0 {
        let n = cell.adjacent_mines();
        (n.to_string(), base.bg(palette.soil).fg(palette.number(n)).add_modifier(Modifier::BOLD))
    } else {
        (" ".to_string(), base.bg(palette.soil))
    }
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    let x = r.x + (r.width - width) / 2;
    let y = r.y + (r.height - height) / 2;
    Rect::new(x, y, width, height)
}
