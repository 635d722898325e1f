//! The fake file table behind `ls` and `cat`.

use tracing::warn;

use crate::config::Config;

/// Content of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Displayable text
    Text(String),
    /// A bare URL, opened in the browser when printed
    Url(String),
    /// An override entry that was not a string
    Malformed { kind: String },
}

impl FileContent {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if is_url(&text) {
            Self::Url(text)
        } else {
            Self::Text(text)
        }
    }

    fn from_value(value: &toml::Value) -> Self {
        match value {
            toml::Value::String(text) => Self::from_text(text.as_str()),
            other => Self::Malformed {
                kind: other.type_str().to_string(),
            },
        }
    }
}

/// `true` when the whole text looks like a bare URL
pub fn is_url(text: &str) -> bool {
    (text.starts_with("http") || text.starts_with("www"))
        && !text.contains(' ')
        && !text.contains('\n')
}

/// Immutable ordered `name -> content` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTable {
    entries: Vec<(String, FileContent)>,
}

impl Default for FileTable {
    fn default() -> Self {
        Self::from_pairs([
            (
                "about.txt",
                "This page was made because I wanted to present my portfolio differently.",
            ),
            (
                "contact.txt",
                "The best way to contact me is at:\ntaylor.he7@gmail.com",
            ),
            ("linkedin.txt", "https://www.linkedin.com/in/taylorhe/"),
        ])
    }
}

impl FileTable {
    /// Build a table from `(name, text)` pairs, keeping their order
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut table = Self { entries: Vec::new() };
        for (name, text) in pairs {
            table.insert(name.to_string(), FileContent::from_text(text));
        }
        table
    }

    /// Default files with the config's `[files]` overrides merged in.
    ///
    /// Known names are replaced in place, new names are appended.
    pub fn from_config(config: &Config) -> Self {
        let mut table = Self::default();
        for (name, value) in &config.files {
            let content = FileContent::from_value(value);
            if let FileContent::Malformed { kind } = &content {
                warn!("File '{}' has a {} value instead of a string", name, kind);
            }
            table.insert(name.clone(), content);
        }
        table
    }

    fn insert(&mut self, name: String, content: FileContent) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = content,
            None => self.entries.push((name, content)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FileContent> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, content)| content)
    }

    /// File names in table order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}
