//! Configuration and color scheme management for termfolio.
//!
//! This module provides:
//! - TOML configuration loading from `~/.termfolio/config.toml`
//! - Built-in defaults for every display string (shallow merge: any field
//!   present in the file wins, absent fields keep their default)
//! - Built-in color schemes for the prompt and output
//!
//! # Configuration File
//!
//! ```toml
//! user = "taylor"
//! host = "he"
//! is_root = false
//! type_delay = 0
//! color_scheme = "dracula"
//! welcome = "Welcome! Type 'help' to get started."
//!
//! [files]
//! "about.txt" = "Hello there."
//! "github.txt" = "https://github.com/someone"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TerminalError;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general_help: String,
    pub cool_help: String,
    pub ls_help: String,
    pub cat_help: String,
    pub whoami_help: String,
    pub help_help: String,
    pub clear_help: String,
    pub reboot_help: String,
    pub vi_help: String,
    pub vim_help: String,
    pub emacs_help: String,
    pub sudo_help: String,

    pub welcome: String,
    /// Extra line shown after the welcome message for legacy clients
    pub legacy_client_warning: String,
    pub invalid_command_message: String,
    pub sudo_message: String,
    pub file_not_found: String,
    /// Placeholder replaced inside message templates
    pub value_token: String,
    /// Reserved name that `cat` answers with the welcome message
    pub welcome_file_name: String,
    pub whoami: String,
    pub cool_reply: String,
    pub rebooting_message: String,
    /// Markup emitted by `cat` without arguments
    pub cat_image: String,

    pub user: String,
    pub host: String,
    pub is_root: bool,
    /// Typing delay in milliseconds (signed so bad values can be rejected)
    pub type_delay: i64,

    /// Color scheme name
    pub color_scheme: String,

    /// File table overrides, keyed by file name
    pub files: toml::Table,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general_help: "Congrats on finding the help command!\nHere's a list of commands currently supported by this makeshift terminal.".to_string(),
            cool_help: "Pretty cool, right?".to_string(),
            ls_help: "List information about the files and folders.".to_string(),
            cat_help: "Read file content and print it to the standard output.".to_string(),
            whoami_help: "Who am I?".to_string(),
            help_help: "Print this menu.".to_string(),
            clear_help: "Clear the terminal screen.".to_string(),
            reboot_help: "Restart.".to_string(),
            vi_help: "Move (rename) files.".to_string(),
            vim_help: "Change the current working directory.".to_string(),
            emacs_help: "Remove files or directories.".to_string(),
            sudo_help: "Execute a command as the superuser.".to_string(),

            welcome: "Welcome! Type 'help' to get started.".to_string(),
            legacy_client_warning: "Why are you using internet explorer? This doesn't work with IE. Get on Chrome or something.".to_string(),
            invalid_command_message: "<value>: command not found.".to_string(),
            sudo_message: "Nice try, but no.".to_string(),
            file_not_found: "File '<value>' not found.".to_string(),
            value_token: "<value>".to_string(),
            welcome_file_name: "welcome.txt".to_string(),
            whoami: concat!(
                "Name:      Taylor He\n",
                "Major:     Computer Science\n",
                "School:    Stevens Tech Class of '19\n",
                "Languages: C++  Python  TypeScript",
            )
            .to_string(),
            cool_reply: "I know right?".to_string(),
            rebooting_message: "Rebooting".to_string(),
            cat_image: "<img src=\"/assets/img/derpcat.jpg\" style=\"height: 250px;\"/>".to_string(),

            user: "taylor".to_string(),
            host: "he".to_string(),
            is_root: false,
            type_delay: 0,

            color_scheme: "default".to_string(),
            files: toml::Table::new(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. The default path is optional and falls
    /// back to the built-in defaults when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, TerminalError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::get_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };
        let content = fs::read_to_string(&path)?;
        Self::from_toml(&content).map_err(|source| TerminalError::Config { path, source })
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".termfolio").join("config.toml"))
    }

    /// Check the session parameters
    pub fn validate(&self) -> Result<(), TerminalError> {
        if self.type_delay < 0 {
            return Err(TerminalError::invalid_argument(format!(
                "Invalid value {} for argument 'type_delay'.",
                self.type_delay
            )));
        }
        if self.value_token.is_empty() {
            return Err(TerminalError::invalid_argument(
                "Invalid empty value for argument 'value_token'.",
            ));
        }
        Ok(())
    }

    /// `user@host:~$`, or `user@host:~#` for root
    pub fn complete_prompt(&self) -> String {
        format!(
            "{}@{}:~{}",
            self.user,
            self.host,
            if self.is_root { '#' } else { '$' }
        )
    }

    /// Substitute `value` for the first placeholder in `template`
    pub fn interpolate(&self, template: &str, value: &str) -> String {
        template.replacen(&self.value_token, value, 1)
    }

    /// Get the color scheme
    pub fn get_color_scheme(&self) -> ColorScheme {
        ColorScheme::by_name(&self.color_scheme)
    }
}

/// Color definition (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(&self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// Color scheme definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorScheme {
    pub name: String,
    pub background: Color,
    pub text: Color,
    pub prompt: Color,
    /// Placeholder drawn in place of embedded images
    pub image: Color,
    /// "[↓ n lines]" indicator while scrolled back
    pub indicator: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_scheme()
    }
}

impl ColorScheme {
    pub fn default_scheme() -> Self {
        Self {
            name: "default".to_string(),
            background: Color::new(0, 0, 0),
            text: Color::new(220, 220, 220),
            prompt: Color::new(80, 250, 123),
            image: Color::new(150, 150, 150),
            indicator: Color::new(200, 200, 0),
        }
    }

    pub fn solarized_dark() -> Self {
        Self {
            name: "solarized-dark".to_string(),
            background: Color::new(0, 43, 54),
            text: Color::new(147, 161, 161),
            prompt: Color::new(133, 153, 0),
            image: Color::new(101, 123, 131),
            indicator: Color::new(181, 137, 0),
        }
    }

    pub fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            background: Color::new(40, 42, 54),
            text: Color::new(248, 248, 242),
            prompt: Color::new(189, 147, 249),
            image: Color::new(98, 114, 164),
            indicator: Color::new(80, 250, 123),
        }
    }

    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            background: Color::new(46, 52, 64),
            text: Color::new(216, 222, 233),
            prompt: Color::new(136, 192, 208),
            image: Color::new(147, 161, 181),
            indicator: Color::new(163, 190, 140),
        }
    }

    /// Get scheme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "solarized-dark" | "solarized_dark" => Self::solarized_dark(),
            "dracula" => Self::dracula(),
            "nord" => Self::nord(),
            _ => Self::default_scheme(),
        }
    }

    /// List available schemes
    pub fn list() -> Vec<&'static str> {
        vec!["default", "solarized-dark", "dracula", "nord"]
    }
}

// Get home directory
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = Config::from_toml("user = \"ada\"\nis_root = true\n").unwrap();
        assert_eq!(config.user, "ada");
        assert!(config.is_root);
        assert_eq!(config.host, "he");
        assert_eq!(config.welcome, Config::default().welcome);
        assert_eq!(config.complete_prompt(), "ada@he:~#");
    }

    #[test]
    fn test_default_prompt() {
        assert_eq!(Config::default().complete_prompt(), "taylor@he:~$");
    }

    #[test]
    fn test_files_table_parsed() {
        let config = Config::from_toml("[files]\n\"a.txt\" = \"hi\"\n\"b.txt\" = 3\n").unwrap();
        assert_eq!(config.files.len(), 2);
        assert_eq!(config.files.get("a.txt").and_then(|v| v.as_str()), Some("hi"));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let config = Config::from_toml("type_delay = -5").unwrap();
        assert!(matches!(
            config.validate(),
            Err(TerminalError::InvalidArgumentConfiguration { .. })
        ));
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_non_numeric_delay_is_a_parse_error() {
        assert!(Config::from_toml("type_delay = \"fast\"").is_err());
    }

    #[test]
    fn test_interpolate_first_token_only() {
        let config = Config::default();
        assert_eq!(
            config.interpolate(&config.file_not_found, "x.txt"),
            "File 'x.txt' not found."
        );
        assert_eq!(config.interpolate("<value> <value>", "a"), "a <value>");
    }

    #[test]
    fn test_scheme_lookup() {
        assert_eq!(ColorScheme::by_name("Dracula").name, "dracula");
        assert_eq!(ColorScheme::by_name("unknown").name, "default");
        assert_eq!(ColorScheme::list().len(), 4);
    }
}
