use crate::types::*;
use crate::view_state::ViewSnapshot;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::{cursor, terminal, ExecutableCommand, QueueableCommand};
use std::io::{self, Write};

const CH0_MARK: char = '*';
const CH1_MARK: char = '+';
const BOTH_MARK: char = '#';
const AXIS_WIDTH: usize = 6;
const HELP: &str = "↑/↓ sensitivity  ←/→ window  r reset  p pause  e csv  s png  q quit";

/// Something that shows rendered frames.
pub trait FrameSink {
    fn draw(&mut self, frame: &RenderFrame, view: &ViewSnapshot) -> io::Result<()>;

    /// Whether to draw again on ticks where the frame did not change.
    fn redraw_when_held(&self) -> bool {
        true
    }
}

/// Full-screen terminal scope: both traces on one ASCII plot plus a status
/// line. Owns the terminal (raw mode, alternate screen) until dropped.
pub struct ConsoleDisplay<W: Write> {
    out: W,
    /// Terminal size at the last draw; a change forces a full clear.
    last_size: Option<(u16, u16)>,
}

impl ConsoleDisplay<io::Stdout> {
    pub fn setup() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        out.execute(terminal::EnterAlternateScreen)?;
        out.execute(cursor::Hide)?;
        Ok(Self {
            out,
            last_size: None,
        })
    }
}

impl<W: Write> ConsoleDisplay<W> {
    fn teardown(&mut self) {
        let _ = self.out.execute(cursor::Show);
        let _ = self.out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = self.out.flush();
    }
}

impl<W: Write> Drop for ConsoleDisplay<W> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<W: Write> FrameSink for ConsoleDisplay<W> {
    fn draw(&mut self, frame: &RenderFrame, view: &ViewSnapshot) -> io::Result<()> {
        let size = terminal::size().unwrap_or((80, 24));
        let (cols, rows) = size;
        let plot_cols = (cols as usize).saturating_sub(AXIS_WIDTH + 1).max(10);
        let plot_rows = (rows as usize).saturating_sub(4).max(4);
        let grid = plot_grid(frame, plot_cols, plot_rows);
        let (low, high) = frame.vertical_range;

        // Lines are overwritten in place; only a resize clears the screen.
        if self.last_size != Some(size) {
            self.out.queue(terminal::Clear(terminal::ClearType::All))?;
            self.last_size = Some(size);
        }
        self.out.queue(cursor::MoveTo(0, 0))?;

        self.out.queue(SetAttribute(Attribute::Bold))?;
        self.out.queue(Print(status_line(frame, view)))?;
        self.out.queue(SetAttribute(Attribute::Reset))?;
        self.out.queue(terminal::Clear(terminal::ClearType::UntilNewLine))?;
        self.out.queue(cursor::MoveToNextLine(1))?;

        for (r, line) in grid.iter().enumerate() {
            let label = if r == 0 {
                high.to_string()
            } else if r + 1 == grid.len() {
                low.to_string()
            } else {
                String::new()
            };
            self.out.queue(Print(format!("{:>5}│", label)))?;
            for ch in line.chars() {
                let color = match ch {
                    CH0_MARK => Some(Color::Blue),
                    CH1_MARK => Some(Color::Red),
                    BOTH_MARK => Some(Color::Magenta),
                    _ => None,
                };
                match color {
                    Some(c) => {
                        self.out.queue(SetForegroundColor(c))?;
                        self.out.queue(Print(ch))?;
                        self.out.queue(ResetColor)?;
                    }
                    None => {
                        self.out.queue(Print(ch))?;
                    }
                }
            }
            self.out.queue(terminal::Clear(terminal::ClearType::UntilNewLine))?;
            self.out.queue(cursor::MoveToNextLine(1))?;
        }

        self.out.queue(Print(format!(
            "{:>5}└{}",
            "",
            "─".repeat(plot_cols)
        )))?;
        self.out.queue(terminal::Clear(terminal::ClearType::UntilNewLine))?;
        self.out.queue(cursor::MoveToNextLine(1))?;
        self.out.queue(SetForegroundColor(Color::DarkGrey))?;
        self.out.queue(Print(HELP))?;
        self.out.queue(ResetColor)?;
        self.out.queue(terminal::Clear(terminal::ClearType::FromCursorDown))?;
        self.out.flush()
    }
}

/// Writes each frame as one JSON object per line. For headless runs and
/// piping into other tools.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn draw(&mut self, frame: &RenderFrame, _view: &ViewSnapshot) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, frame).map_err(io::Error::other)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }

    fn redraw_when_held(&self) -> bool {
        false
    }
}

fn status_line(frame: &RenderFrame, view: &ViewSnapshot) -> String {
    let latest = match frame.latest() {
        Some(s) => s.to_string(),
        None => "no data".to_string(),
    };
    format!("ADC SCOPE  {}  {}", latest, view)
}

/// Rasterise both channels into `rows` strings of `cols` characters.
///
/// The window is split into `cols` equal buckets; each column shows the
/// newest sample of its bucket. Values outside the vertical range are pinned
/// to the top or bottom row.
pub fn plot_grid(frame: &RenderFrame, cols: usize, rows: usize) -> Vec<String> {
    let mut grid = vec![vec![' '; cols]; rows];
    if frame.is_empty() || cols == 0 || rows == 0 {
        return grid.into_iter().map(|r| r.into_iter().collect()).collect();
    }

    let (low, high) = frame.vertical_range;
    let span = high.saturating_sub(low).max(1) as f64;
    let to_row = |v: u32| -> usize {
        let clamped = v.clamp(low, high);
        let frac = (clamped - low) as f64 / span;
        let from_bottom = (frac * (rows - 1) as f64).round() as usize;
        rows - 1 - from_bottom.min(rows - 1)
    };

    let n = frame.len();
    for col in 0..cols {
        // Index of the newest sample falling in this column's bucket.
        let idx = ((col + 1) * n).div_ceil(cols).saturating_sub(1).min(n - 1);
        let r0 = to_row(frame.ch0[idx]);
        let r1 = to_row(frame.ch1[idx]);
        grid[r0][col] = CH0_MARK;
        grid[r1][col] = if r1 == r0 { BOTH_MARK } else { CH1_MARK };
    }

    grid.into_iter().map(|r| r.into_iter().collect()).collect()
}
