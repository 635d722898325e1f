//! Display surfaces owned by a terminal session.
//!
//! A session writes into three surfaces: the prompt label, the input line
//! and the output log. The traits keep the session independent from how the
//! surfaces are drawn; the in-memory implementations below are what the
//! renderer reads from.

/// Text label left of the input line
pub trait PromptSurface {
    fn text(&self) -> &str;
    fn set_text(&mut self, text: &str);
}

/// Editable single-line input
pub trait InputSurface {
    fn value(&self) -> &str;
    /// Replace the value and move the cursor to its end
    fn set_value(&mut self, value: &str);
    /// Cursor position in chars
    fn cursor(&self) -> usize;
    fn set_cursor(&mut self, cursor: usize);
    fn is_disabled(&self) -> bool;
    fn set_disabled(&mut self, disabled: bool);
    fn focus(&mut self);
    fn is_focused(&self) -> bool;
}

/// Append-only markup log with a scroll position.
///
/// Scroll values are in rendered lines; a line ends at each `<br/>`.
pub trait OutputSurface {
    fn markup(&self) -> &str;
    fn append(&mut self, markup: &str);
    fn clear(&mut self);
    fn scroll_top(&self) -> usize;
    fn set_scroll_top(&mut self, top: usize);
    fn scroll_height(&self) -> usize;
}

/// Line break token used by the output markup
pub const LINE_BREAK: &str = "<br/>";

/// Escape user-typed text so it is shown literally
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[derive(Debug, Default, Clone)]
pub struct PromptLine {
    text: String,
}

impl PromptSurface for PromptLine {
    fn text(&self) -> &str {
        &self.text
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }
}

#[derive(Debug, Default, Clone)]
pub struct InputLine {
    value: String,
    cursor: usize,
    disabled: bool,
    focused: bool,
}

impl InputSurface for InputLine {
    fn value(&self) -> &str {
        &self.value
    }

    fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.chars().count();
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.value.chars().count());
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.focused = false;
        }
    }

    fn focus(&mut self) {
        // disabled inputs cannot take focus
        self.focused = !self.disabled;
    }

    fn is_focused(&self) -> bool {
        self.focused
    }
}

#[derive(Debug, Default, Clone)]
pub struct OutputLog {
    markup: String,
    lines: usize,
    scroll_top: usize,
}

impl OutputSurface for OutputLog {
    fn markup(&self) -> &str {
        &self.markup
    }

    fn append(&mut self, markup: &str) {
        self.lines += markup.matches(LINE_BREAK).count();
        self.markup.push_str(markup);
    }

    fn clear(&mut self) {
        self.markup.clear();
        self.lines = 0;
        self.scroll_top = 0;
    }

    fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, top: usize) {
        self.scroll_top = top.min(self.lines);
    }

    fn scroll_height(&self) -> usize {
        self.lines
    }
}
