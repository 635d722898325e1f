//! Command registry and handlers.
//!
//! Handlers are pure: they look at the parsed tokens, the configuration and
//! the file table, and describe what the session should do next.

use std::time::{SystemTime, UNIX_EPOCH};

use super::surface::escape_markup;
use crate::config::Config;
use crate::error::DispatchError;
use crate::files::{FileContent, FileTable};

/// Commands shown per line by `help`
const HELP_COMMANDS_PER_LINE: usize = 4;

/// Preambles for the editor taunt
const DISGUSTS: [&str; 4] = ["Yuck, ", "Eww, ", "Wow you use ", ""];

/// Every recognized command, in registry order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Cool,
    Ls,
    Cat,
    Whoami,
    Help,
    Clear,
    Reboot,
    Vi,
    Vim,
    Emacs,
    Sudo,
}

impl Command {
    pub const ALL: [Command; 11] = [
        Command::Cool,
        Command::Ls,
        Command::Cat,
        Command::Whoami,
        Command::Help,
        Command::Clear,
        Command::Reboot,
        Command::Vi,
        Command::Vim,
        Command::Emacs,
        Command::Sudo,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Command::Cool => "cool",
            Command::Ls => "ls",
            Command::Cat => "cat",
            Command::Whoami => "whoami",
            Command::Help => "help",
            Command::Clear => "clear",
            Command::Reboot => "reboot",
            Command::Vi => "vi",
            Command::Vim => "vim",
            Command::Emacs => "emacs",
            Command::Sudo => "sudo",
        }
    }

    /// Exact, case-sensitive lookup
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.token() == token)
    }

    /// One-line help text
    pub fn help(self, config: &Config) -> &str {
        match self {
            Command::Cool => &config.cool_help,
            Command::Ls => &config.ls_help,
            Command::Cat => &config.cat_help,
            Command::Whoami => &config.whoami_help,
            Command::Help => &config.help_help,
            Command::Clear => &config.clear_help,
            Command::Reboot => &config.reboot_help,
            Command::Vi => &config.vi_help,
            Command::Vim => &config.vim_help,
            Command::Emacs => &config.emacs_help,
            Command::Sudo => &config.sudo_help,
        }
    }
}

/// What the session does with a handler's result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Type the text, then unlock
    Type { text: String, respect_spaces: bool },
    /// Wipe output and prompt, then unlock without typing
    Clear,
    /// Type the rebooting notice, then run the full reset
    Reboot,
}

impl Outcome {
    fn text(text: impl Into<String>) -> Self {
        Self::Type {
            text: text.into(),
            respect_spaces: true,
        }
    }
}

/// xorshift64 generator for picking taunts
#[derive(Debug, Clone)]
pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x1234_5678_9ABC_DEF0 } else { seed })
    }

    /// Seeded from the wall clock
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(nanos)
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// Everything a handler may read
pub struct Context<'a> {
    pub config: &'a Config,
    pub files: &'a FileTable,
}

/// Route a parsed command line to its handler
pub fn dispatch(
    tokens: &[&str],
    ctx: &Context<'_>,
    rng: &mut XorShift,
) -> Result<Outcome, DispatchError> {
    let first = tokens.first().copied().unwrap_or("");
    let command = Command::from_token(first).ok_or_else(|| DispatchError::CommandNotFound {
        token: first.to_string(),
    })?;

    match command {
        Command::Cool => Ok(Outcome::text(ctx.config.cool_reply.as_str())),
        Command::Ls => Ok(ls(ctx)),
        Command::Cat => cat(tokens, ctx),
        Command::Whoami => Ok(Outcome::text(ctx.config.whoami.as_str())),
        Command::Help => help(tokens, ctx),
        Command::Clear => Ok(Outcome::Clear),
        Command::Reboot => Ok(Outcome::Reboot),
        Command::Vi => Ok(insult_editor("vi", "vim", rng)),
        Command::Vim => Ok(insult_editor("vim", "emacs", rng)),
        Command::Emacs => Ok(insult_editor("emacs", "vim", rng)),
        Command::Sudo => Ok(Outcome::text(ctx.config.sudo_message.as_str())),
    }
}

fn ls(ctx: &Context<'_>) -> Outcome {
    let mut result = String::from(".\n..\n");
    for name in ctx.files.names() {
        result.push_str(name);
        result.push('\n');
    }
    Outcome::text(result.trim())
}

fn cat(tokens: &[&str], ctx: &Context<'_>) -> Result<Outcome, DispatchError> {
    let config = ctx.config;
    let Some(name) = tokens.get(1).copied() else {
        return Ok(Outcome::Type {
            text: config.cat_image.clone(),
            respect_spaces: false,
        });
    };

    if name == config.welcome_file_name {
        return Ok(Outcome::text(config.welcome.as_str()));
    }
    match ctx.files.get(name) {
        Some(FileContent::Text(text)) | Some(FileContent::Url(text)) => Ok(Outcome::text(text.as_str())),
        Some(FileContent::Malformed { kind }) => Err(DispatchError::HandlerFailure {
            command: Command::Cat.token().to_string(),
            reason: format!("'{}' holds a {} instead of text", name, kind),
        }),
        None => Ok(Outcome::text(
            config.interpolate(&config.file_not_found, &escape_markup(name)),
        )),
    }
}

fn help(tokens: &[&str], ctx: &Context<'_>) -> Result<Outcome, DispatchError> {
    if let Some(topic) = tokens.get(1).copied() {
        let command = Command::from_token(topic).ok_or_else(|| DispatchError::CommandNotFound {
            token: topic.to_string(),
        })?;
        return Ok(Outcome::text(format!(
            "{}: {}",
            command.token(),
            command.help(ctx.config)
        )));
    }

    let listing = Command::ALL
        .chunks(HELP_COMMANDS_PER_LINE)
        .map(|line| {
            line.iter()
                .map(|cmd| cmd.token())
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Outcome::text(format!("{}\n\n{}", ctx.config.general_help, listing)))
}

fn insult_editor(current: &str, instead: &str, rng: &mut XorShift) -> Outcome {
    let disgust = rng.pick(&DISGUSTS);
    Outcome::text(format!("{}{}? Just use {}", disgust, current, instead))
}

/// Tab-completion candidates for the current input tokens.
///
/// `None` when completion does not apply: more than one token, unless it is
/// exactly `cat <prefix>`. File names and command names are separate pools.
pub fn complete_candidates(tokens: &[&str], files: &FileTable) -> Option<Vec<String>> {
    let cat = Command::Cat.token();
    match tokens.len() {
        0 | 1 => {}
        2 if tokens[0] == cat => {}
        _ => return None,
    }

    let first = tokens.first().copied().unwrap_or("").to_lowercase();
    if first == cat {
        let prefix = tokens.get(1).copied().unwrap_or("").to_lowercase();
        return Some(
            files
                .names()
                .filter(|name| name.starts_with(&prefix))
                .map(|name| format!("{} {}", cat, name))
                .collect(),
        );
    }

    Some(
        Command::ALL
            .iter()
            .map(|cmd| cmd.token())
            .filter(|token| token.starts_with(&first))
            .map(str::to_string)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(line: &str) -> Result<Outcome, DispatchError> {
        run_with(line, &FileTable::default())
    }

    fn run_with(line: &str, files: &FileTable) -> Result<Outcome, DispatchError> {
        let config = Config::default();
        let ctx = Context {
            config: &config,
            files,
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        dispatch(&tokens, &ctx, &mut XorShift::new(7))
    }

    fn typed(line: &str) -> String {
        match run(line) {
            Ok(Outcome::Type { text, .. }) => text,
            other => panic!("expected typed output, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_roundtrip() {
        for cmd in Command::ALL {
            assert_eq!(Command::from_token(cmd.token()), Some(cmd));
        }
        assert_eq!(Command::from_token("LS"), None);
        assert_eq!(Command::from_token(""), None);
    }

    #[test]
    fn test_ls_lists_dots_then_files() {
        assert_eq!(typed("ls"), ".\n..\nabout.txt\ncontact.txt\nlinkedin.txt");
    }

    #[test]
    fn test_cat_variants() {
        let config = Config::default();
        assert_eq!(
            run("cat"),
            Ok(Outcome::Type {
                text: config.cat_image.clone(),
                respect_spaces: false
            })
        );
        assert_eq!(
            typed("cat about.txt"),
            "This page was made because I wanted to present my portfolio differently."
        );
        assert_eq!(typed("cat linkedin.txt"), "https://www.linkedin.com/in/taylorhe/");
        assert_eq!(typed("cat nope.txt"), "File 'nope.txt' not found.");
        assert_eq!(typed("cat welcome.txt"), config.welcome);
    }

    #[test]
    fn test_cat_malformed_entry_fails() {
        let config = Config::from_toml("[files]\n\"bad.txt\" = [1, 2]\n").unwrap();
        let files = FileTable::from_config(&config);
        assert!(matches!(
            run_with("cat bad.txt", &files),
            Err(DispatchError::HandlerFailure { .. })
        ));
    }

    #[test]
    fn test_help_layout() {
        let text = typed("help");
        let config = Config::default();
        let expected = format!(
            "{}\n\ncool  ls  cat  whoami\nhelp  clear  reboot  vi\nvim  emacs  sudo",
            config.general_help
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_help_topic() {
        assert_eq!(typed("help ls"), "ls: List information about the files and folders.");
        assert_eq!(
            run("help frobnicate"),
            Err(DispatchError::CommandNotFound {
                token: "frobnicate".to_string()
            })
        );
    }

    #[test]
    fn test_fixed_replies() {
        assert_eq!(typed("cool"), "I know right?");
        assert_eq!(typed("sudo rm -rf /"), "Nice try, but no.");
        assert!(typed("whoami").starts_with("Name:"));
        assert_eq!(run("clear"), Ok(Outcome::Clear));
        assert_eq!(run("reboot"), Ok(Outcome::Reboot));
    }

    #[test]
    fn test_editor_taunts() {
        for (cmd, other) in [("vi", "vim"), ("vim", "emacs"), ("emacs", "vim")] {
            let text = typed(cmd);
            let tail = format!("{}? Just use {}", cmd, other);
            assert!(text.ends_with(&tail), "{}", text);
            let preamble = &text[..text.len() - tail.len()];
            assert!(DISGUSTS.contains(&preamble), "{:?}", preamble);
        }
    }

    #[test]
    fn test_unknown_and_case_sensitive() {
        assert_eq!(
            run("Ls"),
            Err(DispatchError::CommandNotFound {
                token: "Ls".to_string()
            })
        );
        assert_eq!(
            run(""),
            Err(DispatchError::CommandNotFound {
                token: String::new()
            })
        );
    }

    #[test]
    fn test_candidates_for_commands() {
        let files = FileTable::default();
        assert_eq!(
            complete_candidates(&["v"], &files),
            Some(vec!["vi".to_string(), "vim".to_string()])
        );
        assert_eq!(
            complete_candidates(&["c"], &files),
            Some(vec!["cool".to_string(), "cat".to_string(), "clear".to_string()])
        );
        assert_eq!(complete_candidates(&["wh"], &files), Some(vec!["whoami".to_string()]));
        assert_eq!(complete_candidates(&[], &files).map(|c| c.len()), Some(11));
    }

    #[test]
    fn test_candidates_for_files() {
        let files = FileTable::default();
        assert_eq!(
            complete_candidates(&["cat", "li"], &files),
            Some(vec!["cat linkedin.txt".to_string()])
        );
        assert_eq!(
            complete_candidates(&["cat"], &files),
            Some(vec![
                "cat about.txt".to_string(),
                "cat contact.txt".to_string(),
                "cat linkedin.txt".to_string(),
            ])
        );
        // file names never leak into command completion
        assert_eq!(complete_candidates(&["a"], &files), Some(vec![]));
    }

    #[test]
    fn test_candidates_inactive() {
        let files = FileTable::default();
        assert_eq!(complete_candidates(&["ls", "a"], &files), None);
        assert_eq!(complete_candidates(&["cat", "a", "b"], &files), None);
    }

    #[test]
    fn test_xorshift_deterministic() {
        let mut a = XorShift::new(42);
        let mut b = XorShift::new(42);
        for _ in 0..8 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
        assert_ne!(XorShift::new(0).next_u64(), 0);
    }
}
