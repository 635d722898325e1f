//! Terminal session
//!
//! Owns the prompt, input and output surfaces and runs one
//! read-eval-print cycle per submitted line: lock the input, echo the line,
//! dispatch it, type the result, unlock.

use tracing::{debug, info, warn};

use super::commands::{self, Context, Outcome, XorShift};
use super::surface::{escape_markup, InputSurface, OutputSurface, PromptSurface, LINE_BREAK};
use super::typist::{SystemOpener, Typist, UrlOpener};
use crate::config::Config;
use crate::error::{DispatchError, TerminalError};
use crate::files::FileTable;

/// Semantic key actions delivered to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Enter
    Submit,
    /// Tab
    Complete,
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Quit,
}

/// `true` for client strings with a known legacy-engine signature
pub fn is_legacy_client(agent: &str) -> bool {
    let msie = agent.find("MSIE ").map_or(false, |pos| pos > 0);
    let trident = agent
        .find("Trident")
        .map_or(false, |pos| agent[pos..].contains("rv:11."));
    msie || trident
}

/// Builder collecting the surfaces and session parameters
pub struct TerminalBuilder {
    config: Config,
    files: FileTable,
    prompt: Option<Box<dyn PromptSurface>>,
    input: Option<Box<dyn InputSurface>>,
    output: Option<Box<dyn OutputSurface>>,
    opener: Option<Box<dyn UrlOpener>>,
    client: Option<String>,
    rng_seed: Option<u64>,
}

impl TerminalBuilder {
    pub fn prompt(mut self, prompt: impl PromptSurface + 'static) -> Self {
        self.prompt = Some(Box::new(prompt));
        self
    }

    pub fn input(mut self, input: impl InputSurface + 'static) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    pub fn output(mut self, output: impl OutputSurface + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    pub fn opener(mut self, opener: impl UrlOpener + 'static) -> Self {
        self.opener = Some(Box::new(opener));
        self
    }

    /// Client capability string checked for legacy engines
    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<Terminal, TerminalError> {
        self.config.validate()?;
        let prompt = self.prompt.ok_or_else(|| missing("prompt"))?;
        let input = self.input.ok_or_else(|| missing("cmdLine"))?;
        let output = self.output.ok_or_else(|| missing("output"))?;
        let opener = self.opener.unwrap_or_else(|| Box::new(SystemOpener));
        let typist = Typist::new(self.config.type_delay, opener)?;
        let rng = self.rng_seed.map_or_else(XorShift::from_time, XorShift::new);
        let legacy_client = self.client.as_deref().map_or(false, is_legacy_client);

        debug!(
            "Terminal built (delay {:?}, legacy client {})",
            typist.delay(),
            legacy_client
        );

        Ok(Terminal {
            complete_prompt: self.config.complete_prompt(),
            config: self.config,
            files: self.files,
            prompt,
            input,
            output,
            typist,
            rng,
            legacy_client,
            pending: String::new(),
            locked: false,
        })
    }
}

fn missing(argument: &str) -> TerminalError {
    TerminalError::invalid_argument(format!("Invalid value None for argument '{}'.", argument))
}

/// The single live terminal
pub struct Terminal {
    config: Config,
    files: FileTable,
    prompt: Box<dyn PromptSurface>,
    input: Box<dyn InputSurface>,
    output: Box<dyn OutputSurface>,
    typist: Typist,
    rng: XorShift,
    legacy_client: bool,
    complete_prompt: String,
    /// Line captured by the last lock
    pending: String,
    locked: bool,
}

impl Terminal {
    pub fn builder(config: Config, files: FileTable) -> TerminalBuilder {
        TerminalBuilder {
            config,
            files,
            prompt: None,
            input: None,
            output: None,
            opener: None,
            client: None,
            rng_seed: None,
        }
    }

    pub fn prompt(&self) -> &dyn PromptSurface {
        &*self.prompt
    }

    pub fn input(&self) -> &dyn InputSurface {
        &*self.input
    }

    pub fn output(&self) -> &dyn OutputSurface {
        &*self.output
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn complete_prompt(&self) -> &str {
        &self.complete_prompt
    }

    /// Line captured by the most recent lock
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// First cycle: clear the screen, print the welcome message, unlock
    pub fn initialize(&mut self) {
        info!("Terminal initializing as {}", self.complete_prompt);
        self.input.set_disabled(true);
        self.lock();
        self.reset();
    }

    /// Capture and echo the input line; input stays disabled until unlock
    pub fn lock(&mut self) {
        self.pending = self.input.value().to_string();
        self.input.set_value("");
        self.prompt.set_text("");
        let echo = format!(
            "<span class=\"prompt-color\">{}</span> {}{}",
            escape_markup(&self.complete_prompt),
            escape_markup(&self.pending),
            LINE_BREAK
        );
        self.output.append(&echo);
        self.input.set_disabled(true);
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.input.set_disabled(false);
        self.prompt.set_text(&self.complete_prompt);
        let bottom = self.output.scroll_height();
        self.output.set_scroll_top(bottom);
        self.input.focus();
        self.locked = false;
    }

    /// Wipe everything and print the welcome message, then unlock
    fn reset(&mut self) {
        self.output.clear();
        self.prompt.set_text("");
        let mut welcome = self.config.welcome.clone();
        if self.legacy_client {
            welcome.push('\n');
            welcome.push_str(&self.config.legacy_client_warning);
        }
        self.type_text(&welcome, true);
        self.unlock();
    }

    fn type_text(&mut self, text: &str, respect_spaces: bool) {
        self.typist.type_text(&mut *self.output, text, respect_spaces);
    }

    /// Run the line in the input surface
    pub fn handle_cmd(&mut self) {
        if self.locked {
            return;
        }
        let line = self.input.value().to_string();
        let tokens: Vec<&str> = line.split_whitespace().collect();
        self.lock();

        let ctx = Context {
            config: &self.config,
            files: &self.files,
        };
        let result = commands::dispatch(&tokens, &ctx, &mut self.rng);
        let first = tokens.first().copied().unwrap_or("");

        match result {
            Ok(Outcome::Type {
                text,
                respect_spaces,
            }) => {
                debug!("Dispatched '{}'", first);
                self.type_text(&text, respect_spaces);
                self.unlock();
            }
            Ok(Outcome::Clear) => self.clear(),
            Ok(Outcome::Reboot) => {
                info!("Rebooting");
                let notice = self.config.rebooting_message.clone();
                self.type_text(&notice, true);
                self.reset();
            }
            Err(DispatchError::CommandNotFound { token }) => {
                debug!("Command not found: '{}'", token);
                self.invalid_command(&token);
            }
            Err(err @ DispatchError::HandlerFailure { .. }) => {
                warn!("{}", err);
                self.invalid_command(first);
            }
        }
    }

    fn invalid_command(&mut self, token: &str) {
        let message = self
            .config
            .interpolate(&self.config.invalid_command_message, &escape_markup(token));
        self.type_text(&message, true);
        self.unlock();
    }

    fn clear(&mut self) {
        self.output.clear();
        self.prompt.set_text("");
        self.unlock();
    }

    /// Tab completion
    pub fn handle_fill(&mut self) {
        if self.locked {
            return;
        }
        let line = self.input.value().to_string();
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(candidates) = commands::complete_candidates(&tokens, &self.files) else {
            return;
        };
        let restored = tokens.join(" ");
        debug!("Completing '{}': {} candidate(s)", restored, candidates.len());

        match candidates.as_slice() {
            [] => self.input.set_value(&restored),
            [only] => {
                self.input.set_value(&format!("{} ", only));
                self.input.focus();
            }
            _ => {
                self.lock();
                self.type_text(&candidates.join("\n"), true);
                self.input.set_value(&restored);
                self.unlock();
            }
        }
    }

    /// Apply a key action; `false` when the session does not handle it
    pub fn handle_key(&mut self, action: KeyAction) -> bool {
        match action {
            KeyAction::Submit => self.handle_cmd(),
            KeyAction::Complete => self.handle_fill(),
            KeyAction::PageUp | KeyAction::PageDown | KeyAction::Quit => return false,
            edit if !self.input.is_disabled() => self.edit(edit),
            _ => {}
        }
        true
    }

    fn edit(&mut self, action: KeyAction) {
        let input = &mut *self.input;
        let cursor = input.cursor();
        let mut chars: Vec<char> = input.value().chars().collect();
        match action {
            KeyAction::Insert(ch) => {
                chars.insert(cursor, ch);
                set_chars(input, &chars, cursor + 1);
            }
            KeyAction::Backspace if cursor > 0 => {
                chars.remove(cursor - 1);
                set_chars(input, &chars, cursor - 1);
            }
            KeyAction::Delete if cursor < chars.len() => {
                chars.remove(cursor);
                set_chars(input, &chars, cursor);
            }
            KeyAction::Left => input.set_cursor(cursor.saturating_sub(1)),
            KeyAction::Right => input.set_cursor(cursor + 1),
            KeyAction::Home => input.set_cursor(0),
            KeyAction::End => input.set_cursor(chars.len()),
            _ => {}
        }
    }

    /// Scroll the output by `delta` lines for a viewport of `rows` lines
    pub fn scroll_by(&mut self, delta: isize, rows: usize) {
        let max_top = self.output.scroll_height().saturating_sub(rows);
        let top = self.output.scroll_top().min(max_top);
        let top = top.saturating_add_signed(delta).min(max_top);
        self.output.set_scroll_top(top);
    }
}

fn set_chars(input: &mut dyn InputSurface, chars: &[char], cursor: usize) {
    input.set_value(&chars.iter().collect::<String>());
    input.set_cursor(cursor);
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::core::surface::{InputLine, OutputLog, PromptLine};

    #[derive(Default, Clone)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl UrlOpener for Recorder {
        fn open(&mut self, url: &str) {
            self.0.borrow_mut().push(url.to_string());
        }
    }

    fn builder(config: Config, files: FileTable) -> TerminalBuilder {
        Terminal::builder(config, files)
            .prompt(PromptLine::default())
            .input(InputLine::default())
            .output(OutputLog::default())
            .opener(Recorder::default())
            .rng_seed(3)
    }

    fn terminal() -> Terminal {
        let mut term = builder(Config::default(), FileTable::default()).build().unwrap();
        term.initialize();
        term
    }

    fn echo(line: &str) -> String {
        format!(
            "<span class=\"prompt-color\">taylor@he:~$</span> {}<br/>",
            line
        )
    }

    fn submit(term: &mut Terminal, line: &str) {
        for ch in line.chars() {
            term.handle_key(KeyAction::Insert(ch));
        }
        term.handle_key(KeyAction::Submit);
    }

    fn assert_ready(term: &Terminal) {
        assert!(!term.is_locked());
        assert!(!term.input().is_disabled());
        assert!(term.input().is_focused());
        assert_eq!(term.prompt().text(), "taylor@he:~$");
    }

    const WELCOME: &str = "Welcome!&nbsp;Type&nbsp;'help'&nbsp;to&nbsp;get&nbsp;started.<br/>";

    #[test]
    fn test_missing_surface_is_rejected() {
        let result = Terminal::builder(Config::default(), FileTable::default())
            .prompt(PromptLine::default())
            .output(OutputLog::default())
            .build();
        assert!(matches!(
            result,
            Err(TerminalError::InvalidArgumentConfiguration { .. })
        ));
    }

    #[test]
    fn test_negative_delay_is_rejected() {
        let config = Config {
            type_delay: -1,
            ..Config::default()
        };
        assert!(matches!(
            builder(config, FileTable::default()).build(),
            Err(TerminalError::InvalidArgumentConfiguration { .. })
        ));
    }

    #[test]
    fn test_initialize_prints_welcome() {
        let term = terminal();
        assert_eq!(term.output().markup(), WELCOME);
        assert_ready(&term);
    }

    #[test]
    fn test_legacy_client_warning() {
        let mut term = builder(Config::default(), FileTable::default())
            .client("Mozilla/5.0 (Windows NT 10.0; Trident/7.0; rv:11.0) like Gecko")
            .build()
            .unwrap();
        term.initialize();
        let markup = term.output().markup();
        assert!(markup.starts_with("Welcome!"));
        assert!(markup.contains("<br/>Why&nbsp;are&nbsp;you&nbsp;using&nbsp;internet&nbsp;explorer?"));
    }

    #[test]
    fn test_reboot_repeats_legacy_warning() {
        let trident = "Mozilla/5.0 (Windows NT 10.0; Trident/7.0; rv:11.0) like Gecko";
        let legacy = || {
            let mut term = builder(Config::default(), FileTable::default())
                .client(trident)
                .build()
                .unwrap();
            term.initialize();
            term
        };
        let fresh = legacy();
        let mut term = legacy();
        submit(&mut term, "ls");
        submit(&mut term, "reboot");

        let expected = format!(
            "{}Why&nbsp;are&nbsp;you&nbsp;using&nbsp;internet&nbsp;explorer?&nbsp;This&nbsp;doesn't&nbsp;work&nbsp;with&nbsp;IE.&nbsp;Get&nbsp;on&nbsp;Chrome&nbsp;or&nbsp;something.<br/>",
            WELCOME
        );
        assert_eq!(term.output().markup(), expected);
        assert_eq!(term.output().markup(), fresh.output().markup());
        assert_ready(&term);
    }

    #[test]
    fn test_legacy_detection() {
        assert!(is_legacy_client("Mozilla/4.0 (compatible; MSIE 8.0; Windows NT 6.1)"));
        assert!(is_legacy_client("Mozilla/5.0 (Trident/7.0; rv:11.0)"));
        assert!(!is_legacy_client("MSIE 8.0"));
        assert!(!is_legacy_client("Mozilla/5.0 (X11; Linux x86_64) Firefox/118.0"));
        assert!(!is_legacy_client("rv:11.0 Trident"));
    }

    #[test]
    fn test_ls_echoes_and_lists() {
        let mut term = terminal();
        submit(&mut term, "ls");
        let expected = format!(
            "{}{}.<br/>..<br/>about.txt<br/>contact.txt<br/>linkedin.txt<br/>",
            WELCOME,
            echo("ls")
        );
        assert_eq!(term.output().markup(), expected);
        assert_eq!(term.pending(), "ls");
        assert_eq!(term.input().value(), "");
        assert_ready(&term);
    }

    #[test]
    fn test_cat_url_opens_browser() {
        let recorder = Recorder::default();
        let mut term = builder(Config::default(), FileTable::default())
            .opener(recorder.clone())
            .build()
            .unwrap();
        term.initialize();
        submit(&mut term, "cat linkedin.txt");
        assert_eq!(
            *recorder.0.borrow(),
            vec!["https://www.linkedin.com/in/taylorhe/".to_string()]
        );
        assert!(term
            .output()
            .markup()
            .ends_with("https://www.linkedin.com/in/taylorhe/<br/>"));
    }

    #[test]
    fn test_cat_without_argument_keeps_markup() {
        let mut term = terminal();
        submit(&mut term, "cat");
        let image = format!("{}<br/>", Config::default().cat_image);
        assert!(term.output().markup().ends_with(&image));
        assert_ready(&term);
    }

    #[test]
    fn test_cat_missing_file() {
        let mut term = terminal();
        submit(&mut term, "cat resume.pdf");
        assert!(term
            .output()
            .markup()
            .ends_with("File&nbsp;'resume.pdf'&nbsp;not&nbsp;found.<br/>"));
    }

    #[test]
    fn test_cat_missing_file_keeps_markup_in_name() {
        let mut term = terminal();
        submit(&mut term, "cat <b>");
        assert!(term
            .output()
            .markup()
            .ends_with("File&nbsp;'&lt;b&gt;'&nbsp;not&nbsp;found.<br/>"));

        submit(&mut term, "cat <img src=\"x\"/>");
        assert!(term
            .output()
            .markup()
            .ends_with("File&nbsp;'&lt;img'&nbsp;not&nbsp;found.<br/>"));
        assert_ready(&term);
    }

    #[test]
    fn test_invalid_command() {
        let mut term = terminal();
        submit(&mut term, "rm -rf <dir>");
        assert!(term
            .output()
            .markup()
            .ends_with("rm:&nbsp;command&nbsp;not&nbsp;found.<br/>"));
        assert!(term.output().markup().contains("rm -rf &lt;dir&gt;<br/>"));
        assert_ready(&term);
    }

    #[test]
    fn test_handler_failure_reads_as_invalid_command() {
        let config = Config::from_toml("[files]\n\"broken.txt\" = { a = 1 }\n").unwrap();
        let files = FileTable::from_config(&config);
        let mut term = builder(config, files).build().unwrap();
        term.initialize();
        submit(&mut term, "cat broken.txt");
        assert!(term
            .output()
            .markup()
            .ends_with("cat:&nbsp;command&nbsp;not&nbsp;found.<br/>"));
        assert_ready(&term);
    }

    #[test]
    fn test_clear_twice() {
        let mut term = terminal();
        submit(&mut term, "whoami");
        submit(&mut term, "clear");
        assert_eq!(term.output().markup(), "");
        assert_ready(&term);
        submit(&mut term, "clear");
        assert_eq!(term.output().markup(), "");
        assert_ready(&term);
    }

    #[test]
    fn test_reboot_matches_fresh_start() {
        let fresh = terminal();
        let mut term = terminal();
        submit(&mut term, "help");
        submit(&mut term, "reboot");
        assert_eq!(term.output().markup(), fresh.output().markup());
        assert_eq!(term.prompt().text(), fresh.prompt().text());
        assert_ready(&term);
    }

    #[test]
    fn test_fill_single_file_candidate() {
        let mut term = terminal();
        for ch in "cat li".chars() {
            term.handle_key(KeyAction::Insert(ch));
        }
        term.handle_key(KeyAction::Complete);
        assert_eq!(term.input().value(), "cat linkedin.txt ");
        assert_eq!(term.output().markup(), WELCOME);
        assert_ready(&term);
    }

    #[test]
    fn test_fill_lists_multiple_candidates() {
        let mut term = terminal();
        term.handle_key(KeyAction::Insert('v'));
        term.handle_key(KeyAction::Complete);
        let expected = format!("{}{}vi<br/>vim<br/>", WELCOME, echo("v"));
        assert_eq!(term.output().markup(), expected);
        assert_eq!(term.input().value(), "v");
        assert_ready(&term);
    }

    #[test]
    fn test_fill_keeps_pools_apart() {
        let mut term = terminal();
        term.handle_key(KeyAction::Insert('c'));
        term.handle_key(KeyAction::Complete);
        assert_eq!(term.input().value(), "c");
        assert!(term.output().markup().ends_with("cool<br/>cat<br/>clear<br/>"));
        assert!(!term.output().markup().contains("about.txt"));
    }

    #[test]
    fn test_fill_without_candidates_normalizes_input() {
        let mut term = terminal();
        submit(&mut term, "");
        let before = term.output().markup().to_string();
        for ch in " zz ".chars() {
            term.handle_key(KeyAction::Insert(ch));
        }
        term.handle_key(KeyAction::Complete);
        assert_eq!(term.input().value(), "zz");
        assert_eq!(term.output().markup(), before);
    }

    #[test]
    fn test_fill_ignored_for_long_lines() {
        let mut term = terminal();
        for ch in "ls a b".chars() {
            term.handle_key(KeyAction::Insert(ch));
        }
        term.handle_key(KeyAction::Complete);
        assert_eq!(term.input().value(), "ls a b");
    }

    #[test]
    fn test_locked_terminal_ignores_input() {
        let mut term = terminal();
        term.lock();
        assert!(term.handle_key(KeyAction::Insert('x')));
        term.handle_key(KeyAction::Submit);
        term.handle_key(KeyAction::Complete);
        assert_eq!(term.input().value(), "");
        assert!(term.is_locked());
        term.unlock();
        assert_ready(&term);
    }

    #[test]
    fn test_line_editing() {
        let mut term = terminal();
        for ch in "lx".chars() {
            term.handle_key(KeyAction::Insert(ch));
        }
        term.handle_key(KeyAction::Backspace);
        term.handle_key(KeyAction::Insert('s'));
        term.handle_key(KeyAction::Home);
        term.handle_key(KeyAction::Delete);
        term.handle_key(KeyAction::Insert('l'));
        assert_eq!(term.input().value(), "ls");
        assert_eq!(term.input().cursor(), 1);
        assert!(!term.handle_key(KeyAction::Quit));
    }

    #[test]
    fn test_scroll_by_clamps() {
        let mut term = terminal();
        for _ in 0..5 {
            submit(&mut term, "ls");
        }
        let height = term.output().scroll_height();
        term.scroll_by(-3, 10);
        assert_eq!(term.output().scroll_top(), height - 13);
        term.scroll_by(100, 10);
        assert_eq!(term.output().scroll_top(), height - 10);
        term.scroll_by(-1000, 10);
        assert_eq!(term.output().scroll_top(), 0);
    }
}
