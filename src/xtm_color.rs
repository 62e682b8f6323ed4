use ratatui::style::Color;
use term_color_support::ColorSupport;

/// How many colors the terminal can show
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Depth {
    TrueColor,
    Ansi256,
    Basic,
}

impl Depth {
    pub fn detect() -> Depth {
        let support = ColorSupport::stdout();
        if support.has_16m {
            Depth::TrueColor
        } else if support.has_256 {
            Depth::Ansi256
        } else {
            Depth::Basic
        }
    }

    /// Pick the closest rendition of an RGB color for this depth.
    fn shade(self, rgb: (u8, u8, u8), index256: u8, basic: Color) -> Color {
        match self {
            Depth::TrueColor => Color::Rgb(rgb.0, rgb.1, rgb.2),
            Depth::Ansi256 => Color::Indexed(index256),
            Depth::Basic => basic,
        }
    }
}

/// Colors used to draw the board: grass for hidden cells, soil for opened ones.
#[derive(Clone, Debug)]
pub struct Palette {
    pub grass: Color,
    pub flag: Color,
    pub soil: Color,
    pub mine: Color,
    pub selected: Color,
    pub glyph: Color,
    pub key: Color,
    pub numbers: [Color; 8],
}

impl Palette {
    pub fn detect() -> Palette {
        Palette::for_depth(Depth::detect())
    }

    pub fn for_depth(depth: Depth) -> Palette {
        // (r, g, b), ANSI 256 index, 16-color fallback
        let s = |rgb: (u8, u8, u8), i: u8, basic: Color| depth.shade(rgb, i, basic);
        Palette {
            grass: s((40, 160, 40), 34, Color::Green),
            flag: s((40, 40, 160), 19, Color::Blue),
            soil: s((100, 80, 80), 95, Color::DarkGray),
            mine: s((200, 20, 20), 160, Color::Red),
            selected: s((120, 120, 120), 244, Color::Gray),
            glyph: s((240, 240, 240), 255, Color::White),
            key: s((193, 156, 0), 178, Color::Yellow),
            numbers: [
                s((97, 214, 255), 81, Color::LightCyan),
                s((22, 198, 12), 46, Color::LightGreen),
                s((231, 72, 86), 203, Color::LightRed),
                s((180, 140, 255), 141, Color::LightMagenta),
                s((249, 241, 165), 229, Color::LightYellow),
                s((58, 150, 221), 38, Color::Cyan),
                s((242, 242, 242), 255, Color::White),
                s((204, 204, 204), 250, Color::Gray),
            ],
        }
    }

    /// Color for a revealed count of 1..=8
    pub fn number(&self, n: u8) -> Color {
        self.numbers[(n.clamp(1, 8) - 1) as usize]
    }
}
