//! Terminal output for netprof.
//!
//! Colors are off when any of these hold, checked in order: `--no-color`,
//! `NO_COLOR` set, `TERM=dumb`, or (in auto mode) stdout is not a TTY.
//! Tables are rendered with comfy-table; status labels go through anstream so
//! they degrade cleanly when piped.

use anstream::{eprintln, println};
use anstyle::{AnsiColor, Color, Style};
use clap::ValueEnum;
use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets};
use std::io::IsTerminal;

/// When to emit ANSI colors
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Always,
    #[default]
    Auto,
    Never,
}

/// Resolved display settings
#[derive(Debug, Clone)]
pub struct Ui {
    pub color_enabled: bool,
}

impl Ui {
    pub fn new(mode: ColorMode, force_no_color: bool) -> Self {
        let color_enabled = !force_no_color && !color_disabled_by_env() && mode.allows_color();

        if !color_enabled {
            anstream::ColorChoice::write_global(anstream::ColorChoice::Never);
        }

        Self { color_enabled }
    }

    fn paint(&self, s: &str, style: Style) -> String {
        if self.color_enabled {
            format!("{style}{s}{style:#}")
        } else {
            s.to_string()
        }
    }

    fn label(&self, text: &str, color: AnsiColor) -> String {
        self.paint(text, Style::new().fg_color(Some(Color::Ansi(color))).bold())
    }

    /// `OK <msg>` on stdout
    pub fn ok(&self, msg: impl AsRef<str>) {
        println!("{} {}", self.label("OK", AnsiColor::Green), msg.as_ref());
    }

    /// `WARN <msg>` on stdout
    pub fn warn(&self, msg: impl AsRef<str>) {
        println!("{} {}", self.label("WARN", AnsiColor::Yellow), msg.as_ref());
    }

    /// `ERROR <msg>` on stderr
    pub fn err(&self, msg: impl AsRef<str>) {
        eprintln!("{} {}", self.label("ERROR", AnsiColor::Red), msg.as_ref());
    }

    pub fn dim(&self, s: impl AsRef<str>) -> String {
        self.paint(
            s.as_ref(),
            Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))),
        )
    }

    pub fn bold(&self, s: impl AsRef<str>) -> String {
        self.paint(s.as_ref(), Style::new().bold())
    }

    /// Bordered table; plain markdown borders without color
    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.load_preset(if self.color_enabled {
            presets::UTF8_FULL_CONDENSED
        } else {
            presets::ASCII_MARKDOWN
        });
        table
    }

    /// Borderless key/value table
    pub fn simple_table(&self) -> Table {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.load_preset(presets::NOTHING);
        table
    }

    pub fn cell(&self, content: impl Into<String>) -> Cell {
        Cell::new(content.into())
    }

    pub fn header_cell(&self, content: impl Into<String>) -> Cell {
        let cell = Cell::new(content.into());
        if self.color_enabled {
            cell.add_attribute(Attribute::Bold)
        } else {
            cell
        }
    }

    /// Colored through comfy-table itself, so column widths stay correct
    pub fn colored_cell(&self, content: impl Into<String>, color: AnsiColor) -> Cell {
        let cell = Cell::new(content.into());
        if self.color_enabled {
            cell.fg(comfy_color(color))
        } else {
            cell
        }
    }

    /// Green `yes_label` when `present`, yellow `no_label` otherwise
    pub fn presence_cell(&self, present: bool, yes_label: &str, no_label: &str) -> Cell {
        if present {
            self.colored_cell(yes_label, AnsiColor::Green)
        } else {
            self.colored_cell(no_label, AnsiColor::Yellow)
        }
    }

    pub fn println(&self, msg: impl AsRef<str>) {
        println!("{}", msg.as_ref());
    }

    pub fn newline(&self) {
        println!();
    }

    pub fn section(&self, title: impl AsRef<str>) {
        println!("{}", self.bold(title));
    }
}

impl ColorMode {
    fn allows_color(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }
}

fn color_disabled_by_env() -> bool {
    std::env::var_os("NO_COLOR").is_some()
        || std::env::var("TERM").is_ok_and(|t| t == "dumb")
}

fn comfy_color(color: AnsiColor) -> comfy_table::Color {
    use comfy_table::Color as C;
    match color {
        AnsiColor::Black => C::Black,
        AnsiColor::Red | AnsiColor::BrightRed => C::Red,
        AnsiColor::Green | AnsiColor::BrightGreen => C::Green,
        AnsiColor::Yellow | AnsiColor::BrightYellow => C::Yellow,
        AnsiColor::Blue | AnsiColor::BrightBlue => C::Blue,
        AnsiColor::Magenta | AnsiColor::BrightMagenta => C::Magenta,
        AnsiColor::Cyan | AnsiColor::BrightCyan => C::Cyan,
        AnsiColor::White | AnsiColor::BrightWhite => C::White,
        AnsiColor::BrightBlack => C::DarkGrey,
    }
}
