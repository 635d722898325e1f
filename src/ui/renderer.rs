//! Terminal renderer using crossterm
//!
//! Draws the output log followed by the prompt line, like a shell would:
//! the prompt sits right below the last output row and is pinned to the
//! bottom once the log fills the screen.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{
        Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use unicode_width::UnicodeWidthStr;

use super::markup::{self, Line, Span, Style};
use crate::config::ColorScheme;
use crate::core::session::Terminal;

/// One composed screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Output rows, already wrapped to the screen width
    pub rows: Vec<Line>,
    /// Row of the prompt line
    pub prompt_row: u16,
    /// Logical lines hidden below the view while scrolled back
    pub lines_below: usize,
}

/// Lay out the terminal for a `cols` x `rows` screen
pub fn compose(term: &Terminal, cols: u16, rows: u16) -> Frame {
    let view = rows.saturating_sub(1).max(1) as usize;
    let width = cols.max(1) as usize;
    let output = term.output();
    let lines = markup::decode(output.markup());

    let max_top = lines.len().saturating_sub(view);
    let top = output.scroll_top().min(max_top);
    let at_bottom = top >= max_top;

    // wrapped rows per logical line, counted from `top`
    let mut wrapped: Vec<Line> = Vec::new();
    let source = if at_bottom { &lines[..] } else { &lines[top..] };
    for line in source {
        wrapped.extend(markup::wrap(line, width));
        if !at_bottom && wrapped.len() >= view {
            break;
        }
    }

    let visible: Vec<Line> = if at_bottom {
        let skip = wrapped.len().saturating_sub(view);
        wrapped.into_iter().skip(skip).collect()
    } else {
        wrapped.into_iter().take(view).collect()
    };

    Frame {
        prompt_row: visible.len().min(view) as u16,
        rows: visible,
        lines_below: if at_bottom { 0 } else { max_top - top },
    }
}

/// Terminal renderer
pub struct Renderer {
    /// Whether the terminal has been initialized
    initialized: bool,
    scheme: ColorScheme,
}

impl Renderer {
    pub fn new(scheme: ColorScheme) -> Self {
        Self {
            initialized: false,
            scheme,
        }
    }

    /// Current terminal size
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Initialize the terminal for rendering
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            DisableLineWrap,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;
        stdout.flush()?;
        self.initialized = true;
        Ok(())
    }

    /// Cleanup the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();

        let _ = execute!(stdout, ResetColor, SetAttribute(Attribute::Reset));
        let _ = execute!(stdout, Show);
        let _ = execute!(stdout, EnableLineWrap);
        let _ = execute!(stdout, LeaveAlternateScreen);
        let _ = stdout.flush();

        // Disable raw mode - this is the most important part
        terminal::disable_raw_mode()?;

        Ok(())
    }

    /// Render the terminal state
    pub fn render(&mut self, term: &Terminal) -> io::Result<()> {
        let (cols, rows) = Self::size()?;
        let frame = compose(term, cols, rows);

        let stdout = io::stdout();
        let mut stdout = io::BufWriter::with_capacity(65536, stdout.lock());

        // Begin synchronized update (reduces flicker)
        write!(stdout, "\x1b[?2026h")?;
        queue!(
            stdout,
            Hide,
            SetBackgroundColor(self.scheme.background.to_crossterm()),
            Clear(ClearType::All)
        )?;

        for (idx, row) in frame.rows.iter().enumerate() {
            queue!(stdout, MoveTo(0, idx as u16))?;
            self.draw_spans(&mut stdout, row)?;
        }

        if frame.lines_below > 0 {
            let indicator = format!("[↓ {} lines]", frame.lines_below);
            let col = (cols as usize).saturating_sub(indicator.width()) as u16;
            queue!(
                stdout,
                MoveTo(col, 0),
                SetForegroundColor(self.scheme.indicator.to_crossterm()),
                Print(indicator)
            )?;
        }

        // Prompt line
        let prompt = term.prompt().text();
        let input = term.input();
        queue!(stdout, MoveTo(0, frame.prompt_row))?;
        if !prompt.is_empty() {
            queue!(
                stdout,
                SetForegroundColor(self.scheme.prompt.to_crossterm()),
                Print(prompt),
                SetForegroundColor(self.scheme.text.to_crossterm()),
                Print(" ")
            )?;
        }
        queue!(
            stdout,
            SetForegroundColor(self.scheme.text.to_crossterm()),
            Print(input.value())
        )?;

        if input.is_focused() {
            let before: String = input.value().chars().take(input.cursor()).collect();
            let prompt_width = if prompt.is_empty() { 0 } else { prompt.width() + 1 };
            let col = (prompt_width + before.width()).min(cols.saturating_sub(1) as usize);
            queue!(stdout, MoveTo(col as u16, frame.prompt_row), Show)?;
        }

        queue!(stdout, ResetColor)?;
        // End synchronized update
        write!(stdout, "\x1b[?2026l")?;
        stdout.flush()
    }

    fn draw_spans<W: Write>(&self, out: &mut W, spans: &[Span]) -> io::Result<()> {
        for span in spans {
            let color = match span.style {
                Style::Text => self.scheme.text,
                Style::Prompt => self.scheme.prompt,
                Style::Image => self.scheme.image,
            };
            queue!(out, SetForegroundColor(color.to_crossterm()))?;
            if span.style == Style::Image {
                queue!(out, SetAttribute(Attribute::Italic))?;
            }
            queue!(out, Print(&span.text))?;
            if span.style == Style::Image {
                queue!(out, SetAttribute(Attribute::NoItalic))?;
            }
        }
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
