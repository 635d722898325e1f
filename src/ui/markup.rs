//! Output markup decoding
//!
//! The output log holds HTML-flavored inline markup. This module turns it
//! into styled lines for the renderer:
//!
//! - `<br/>` ends a line
//! - `&nbsp;` is a space that never collapses; other whitespace runs
//!   collapse to one space
//! - `<span class="prompt-color">` switches to the prompt style
//! - `<img src="..."/>` becomes an `[image: ...]` placeholder
//! - `&lt;` `&gt;` `&amp;` `&quot;` `&#39;` are decoded, unknown tags dropped

use unicode_width::UnicodeWidthChar;

/// Style of a run of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Text,
    Prompt,
    Image,
}

/// A run of text sharing one style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub style: Style,
    pub text: String,
}

pub type Line = Vec<Span>;

const NBSP: char = '\u{a0}';
const PROMPT_CLASS: &str = "prompt-color";

#[derive(Default)]
struct Decoder {
    lines: Vec<Line>,
    line: Line,
    styles: Vec<Style>,
    pending_space: bool,
}

impl Decoder {
    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or(Style::Text)
    }

    fn push_with(&mut self, style: Style, ch: char) {
        if self.pending_space && !self.line.is_empty() {
            self.pending_space = false;
            self.push_raw(style, ' ');
        }
        self.pending_space = false;
        self.push_raw(style, if ch == NBSP { ' ' } else { ch });
    }

    fn push_raw(&mut self, style: Style, ch: char) {
        match self.line.last_mut() {
            Some(span) if span.style == style => span.text.push(ch),
            _ => self.line.push(Span {
                style,
                text: ch.to_string(),
            }),
        }
    }

    fn push(&mut self, ch: char) {
        let style = self.style();
        self.push_with(style, ch);
    }

    fn push_str(&mut self, style: Style, text: &str) {
        for ch in text.chars() {
            self.push_with(style, ch);
        }
    }

    fn break_line(&mut self) {
        self.lines.push(std::mem::take(&mut self.line));
        self.pending_space = false;
    }

    fn tag(&mut self, tag: &str) {
        let tag = tag.trim();
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        let closing = tag.starts_with('/');

        match name.as_str() {
            "br" => self.break_line(),
            "span" if closing => {
                self.styles.pop();
            }
            "span" => {
                let style = if tag.contains(PROMPT_CLASS) {
                    Style::Prompt
                } else {
                    self.style()
                };
                self.styles.push(style);
            }
            "img" => {
                let src = attribute(tag, "src").unwrap_or("?");
                self.push_str(Style::Image, &format!("[image: {}]", src));
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line> {
        if !self.line.is_empty() {
            self.lines.push(self.line);
        }
        self.lines
    }
}

/// Value of `name="..."` inside a tag
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let key = format!("{}=\"", name);
    let start = tag.find(&key)? + key.len();
    let len = tag[start..].find('"')?;
    Some(&tag[start..start + len])
}

fn entity(name: &str) -> Option<char> {
    match name {
        "nbsp" => Some(NBSP),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "#39" | "apos" => Some('\''),
        _ => None,
    }
}

/// Decode markup into styled lines
pub fn decode(markup: &str) -> Vec<Line> {
    let mut decoder = Decoder::default();
    let mut rest = markup;

    while let Some(ch) = rest.chars().next() {
        match ch {
            '<' => {
                let starts_tag = rest[1..]
                    .chars()
                    .next()
                    .map_or(false, |c| c.is_ascii_alphabetic() || c == '/');
                let end = rest.find('>').filter(|&end| !rest[1..end].contains('<'));
                if let (true, Some(end)) = (starts_tag, end) {
                    decoder.tag(&rest[1..end]);
                    rest = &rest[end + 1..];
                    continue;
                }
                decoder.push('<');
            }
            '&' => {
                let decoded = rest[1..]
                    .find(';')
                    .filter(|&end| end <= 6)
                    .and_then(|end| entity(&rest[1..=end]).map(|c| (c, end + 2)));
                if let Some((decoded, len)) = decoded {
                    decoder.push(decoded);
                    rest = &rest[len..];
                    continue;
                }
                decoder.push('&');
            }
            c if c.is_whitespace() && c != NBSP => decoder.pending_space = true,
            c => decoder.push(c),
        }
        rest = &rest[ch.len_utf8()..];
    }

    decoder.finish()
}

/// Text of a line without styles
pub fn line_text(line: &Line) -> String {
    line.iter().map(|span| span.text.as_str()).collect()
}

/// Decoded markup as plain text, one line per `<br/>`
pub fn plain_text(markup: &str) -> String {
    decode(markup)
        .iter()
        .map(line_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a line into rows no wider than `width` columns
pub fn wrap(line: &Line, width: usize) -> Vec<Line> {
    let width = width.max(1);
    let mut rows: Vec<Line> = vec![Vec::new()];
    let mut used = 0;

    for span in line {
        for ch in span.text.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > width && used > 0 {
                rows.push(Vec::new());
                used = 0;
            }
            if let Some(row) = rows.last_mut() {
                match row.last_mut() {
                    Some(last) if last.style == span.style => last.text.push(ch),
                    _ => row.push(Span {
                        style: span.style,
                        text: ch.to_string(),
                    }),
                }
            }
            used += w;
        }
    }
    rows
}
