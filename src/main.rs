//! termfolio - a portfolio page disguised as a shell
//!
//! termfolio draws a fake prompt, reads one line at a time and answers
//! with canned text: an `ls` of a tiny virtual directory, `cat` of its
//! files, `whoami`, `help` and a few jokes. Nothing is ever executed.
//!
//! # Quick Start
//!
//! ```text
//! termfolio                       # Interactive, full screen
//! termfolio --user ada --root     # Prompt becomes ada@he:~#
//! echo "cat about.txt" | termfolio --script
//! ```
//!
//! # Keys
//!
//! | Key | Action |
//! |-----|--------|
//! | Enter | Run the line |
//! | Tab | Complete a command or file name |
//! | PageUp/PageDown | Scroll the output |
//! | Ctrl+C / Ctrl+D | Quit |

mod config;
mod core;
mod error;
mod files;
mod ui;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Config;
use crate::core::session::{KeyAction, Terminal};
use crate::core::surface::{InputLine, OutputLog, PromptLine};
use crate::core::typist::{NoopOpener, SystemOpener};
use crate::files::FileTable;
use crate::ui::{markup, KeyMapper, Renderer};

/// Environment variable holding the client capability string
const CLIENT_ENV: &str = "TERMFOLIO_CLIENT";

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line arguments
#[derive(Debug, Default, PartialEq)]
struct Args {
    /// Explicit config file
    config_path: Option<PathBuf>,
    user: Option<String>,
    host: Option<String>,
    root: bool,
    type_delay: Option<i64>,
    client: Option<String>,
    /// Read commands from stdin instead of the keyboard
    script: bool,
}

impl Args {
    /// CLI values override the config file
    fn apply(&self, config: &mut Config) {
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if self.root {
            config.is_root = true;
        }
        if let Some(delay) = self.type_delay {
            config.type_delay = delay;
        }
    }
}

fn print_version() {
    eprintln!("termfolio {}", VERSION);
}

fn print_help() {
    eprintln!("termfolio {} - a portfolio page disguised as a shell", VERSION);
    eprintln!();
    eprintln!("Usage: termfolio [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <PATH>       Config file (default: ~/.termfolio/config.toml)");
    eprintln!("  --user <NAME>         User shown in the prompt");
    eprintln!("  --host <NAME>         Host shown in the prompt");
    eprintln!("  --root                Use the root prompt (#)");
    eprintln!("  --type-delay <MS>     Typing delay in milliseconds");
    eprintln!("  --client <AGENT>      Client capability string (or ${})", CLIENT_ENV);
    eprintln!("  --script              Read commands from stdin, print the output");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  Enter                 Run the line");
    eprintln!("  Tab                   Complete a command or file name");
    eprintln!("  PageUp/PageDown       Scroll the output");
    eprintln!("  Ctrl+C, Ctrl+D        Quit");
    eprintln!();
    eprintln!("Color schemes: {}", config::ColorScheme::list().join(", "));
    eprintln!("Log file: ~/.termfolio/termfolio.log (level from RUST_LOG)");
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut i = 1;

    let value = |i: usize, flag: &str| -> Result<String, String> {
        args.get(i)
            .cloned()
            .ok_or_else(|| format!("Missing value for {}", flag))
    };

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "--config" => {
                i += 1;
                parsed.config_path = Some(PathBuf::from(value(i, "--config")?));
            }
            "--user" => {
                i += 1;
                parsed.user = Some(value(i, "--user")?);
            }
            "--host" => {
                i += 1;
                parsed.host = Some(value(i, "--host")?);
            }
            "--root" => parsed.root = true,
            "--type-delay" => {
                i += 1;
                let raw = value(i, "--type-delay")?;
                let delay = raw
                    .parse::<i64>()
                    .map_err(|_| format!("Invalid type delay: {}", raw))?;
                parsed.type_delay = Some(delay);
            }
            "--client" => {
                i += 1;
                parsed.client = Some(value(i, "--client")?);
            }
            "--script" => parsed.script = true,
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

/// Log to `~/.termfolio/termfolio.log`; the screen belongs to the renderer
fn init_logging() {
    let log_path = config::home_dir()
        .map(|h| h.join(".termfolio").join("termfolio.log"))
        .unwrap_or_else(|| PathBuf::from("termfolio.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let argv: Vec<String> = env::args().collect();
    let args = match parse_args(&argv) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("termfolio {} starting...", VERSION);

    let mut config = Config::load(args.config_path.as_deref())?;
    args.apply(&mut config);
    let scheme = config.get_color_scheme();
    info!("Prompt: {}, color scheme: {}", config.complete_prompt(), scheme.name);

    let files = FileTable::from_config(&config);
    let client = args.client.clone().or_else(|| env::var(CLIENT_ENV).ok());

    let mut builder = Terminal::builder(config, files)
        .prompt(PromptLine::default())
        .input(InputLine::default())
        .output(OutputLog::default());
    if let Some(client) = client {
        builder = builder.client(client);
    }
    builder = if args.script {
        builder.opener(NoopOpener)
    } else {
        builder.opener(SystemOpener)
    };

    let mut term = match builder.build() {
        Ok(term) => term,
        Err(e) => {
            error!("Failed to build terminal: {}", e);
            return Err(e.into());
        }
    };

    if args.script {
        run_script(&mut term)
    } else {
        run_interactive(&mut term, scheme)
    }
}

/// Feed stdin lines to the terminal and print the output log at EOF
fn run_script(term: &mut Terminal) -> anyhow::Result<()> {
    term.initialize();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        for ch in line.chars() {
            term.handle_key(KeyAction::Insert(ch));
        }
        term.handle_key(KeyAction::Submit);
    }

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", markup::plain_text(term.output().markup()))?;
    stdout.flush()?;
    Ok(())
}

fn run_interactive(term: &mut Terminal, scheme: config::ColorScheme) -> anyhow::Result<()> {
    let (cols, rows) = Renderer::size()?;
    info!("Terminal size: {}x{}", cols, rows);

    let mut renderer = Renderer::new(scheme);
    renderer.init()?;

    // Set window title
    print!("\x1b]0;termfolio - {}\x07", term.complete_prompt());
    let _ = io::stdout().flush();

    term.initialize();
    let result = run_main_loop(term, &mut renderer);

    let _ = renderer.cleanup();
    if let Err(e) = &result {
        error!("Main loop failed: {}", e);
    }
    info!("termfolio exiting");
    result
}

fn run_main_loop(term: &mut Terminal, renderer: &mut Renderer) -> anyhow::Result<()> {
    let poll_timeout = Duration::from_millis(10);
    renderer.render(term)?;

    loop {
        if !event::poll(poll_timeout)? {
            continue;
        }

        let redraw = match event::read()? {
            Event::Key(key_event) => {
                // Only process key press events
                if key_event.kind != KeyEventKind::Press {
                    continue;
                }
                let Some(action) = KeyMapper::map(&key_event) else {
                    continue;
                };
                match action {
                    KeyAction::Quit => {
                        info!("Quit requested");
                        break;
                    }
                    KeyAction::PageUp | KeyAction::PageDown => {
                        let (_, rows) = Renderer::size()?;
                        let page = rows.saturating_sub(1).max(1) as usize;
                        let delta = if action == KeyAction::PageUp {
                            -(page as isize)
                        } else {
                            page as isize
                        };
                        term.scroll_by(delta, page);
                    }
                    other => {
                        term.handle_key(other);
                    }
                }
                true
            }
            Event::Paste(text) => {
                for ch in text.chars().filter(|c| !c.is_control()) {
                    term.handle_key(KeyAction::Insert(ch));
                }
                true
            }
            Event::Resize(cols, rows) => {
                info!("Resize: {}x{}", cols, rows);
                true
            }
            _ => false,
        };

        if redraw {
            renderer.render(term)?;
        }
    }

    Ok(())
}
