//! Output typist: writes text blocks into the output log.
//!
//! Text is rendered as a whole block; the configured delay is kept for
//! callers that want to pace output but no per-character staggering is done.

use std::io;
use std::process::{Command, ExitStatus};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use super::surface::{OutputSurface, LINE_BREAK};
use crate::error::TerminalError;
use crate::files::is_url;

/// Side effect used when a typed block is a bare URL
pub trait UrlOpener {
    fn open(&mut self, url: &str);
}

/// Opens URLs with the platform's default browser
#[derive(Debug, Default)]
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&mut self, url: &str) {
        let mut command = if cfg!(windows) {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", "", url]);
            command
        } else if cfg!(target_os = "macos") {
            let mut command = Command::new("open");
            command.arg(url);
            command
        } else {
            let mut command = Command::new("xdg-open");
            command.arg(url);
            command
        };
        match spawn_reaped(&mut command) {
            Ok((pid, _)) => debug!("Opened {} (pid {})", url, pid),
            Err(e) => warn!("Failed to open {}: {}", url, e),
        }
    }
}

/// Spawn `command`; a detached thread waits on the child
fn spawn_reaped(command: &mut Command) -> io::Result<(u32, JoinHandle<Option<ExitStatus>>)> {
    let mut child = command.spawn()?;
    let pid = child.id();
    let reaper = thread::spawn(move || match child.wait() {
        Ok(status) => {
            debug!("Opener (pid {}) exited with {}", pid, status);
            Some(status)
        }
        Err(e) => {
            warn!("Failed to wait for opener (pid {}): {}", pid, e);
            None
        }
    });
    Ok((pid, reaper))
}

/// Never opens anything (script mode)
#[derive(Debug, Default)]
pub struct NoopOpener;

impl UrlOpener for NoopOpener {
    fn open(&mut self, url: &str) {
        debug!("Not opening {} (opener disabled)", url);
    }
}

/// Renders text into an output surface
pub struct Typist {
    delay: Duration,
    opener: Box<dyn UrlOpener>,
}

impl Typist {
    /// Create a typist; a negative delay is rejected
    pub fn new(delay_ms: i64, opener: Box<dyn UrlOpener>) -> Result<Self, TerminalError> {
        let delay_ms = u64::try_from(delay_ms).map_err(|_| {
            TerminalError::invalid_argument(format!(
                "Invalid value {} for argument 'timer'.",
                delay_ms
            ))
        })?;
        Ok(Self {
            delay: Duration::from_millis(delay_ms),
            opener,
        })
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Type `text` into `output` and scroll to the bottom.
    ///
    /// The block is complete when this returns; callers run their
    /// continuation (unlock, reset) right after.
    pub fn type_text<O>(&mut self, output: &mut O, text: &str, respect_spaces: bool)
    where
        O: OutputSurface + ?Sized,
    {
        if is_url(text) {
            self.opener.open(text);
        }
        let mut markup = to_markup(text, respect_spaces);
        markup.push_str(LINE_BREAK);
        output.append(&markup);
        let bottom = output.scroll_height();
        output.set_scroll_top(bottom);
    }
}

/// Newlines become line breaks; spaces become `&nbsp;` when kept literally
pub fn to_markup(text: &str, respect_spaces: bool) -> String {
    let text = text.replace('\n', LINE_BREAK);
    if respect_spaces {
        text.replace(' ', "&nbsp;")
    } else {
        text
    }
}
