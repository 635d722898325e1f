//! Core terminal logic.
//!
//! - **surface**: prompt / input / output surfaces and their in-memory forms
//! - **typist**: writes text blocks into the output surface
//! - **commands**: command registry, handlers and tab-completion candidates
//! - **session**: the lock / dispatch / unlock cycle
//!
//! # Architecture
//!
//! ```text
//! Terminal
//! ├── PromptSurface (user@host:~$)
//! ├── InputSurface  (editable line, disabled while locked)
//! ├── OutputSurface (markup log + scroll position)
//! ├── Typist        (markup conversion, URL opener)
//! └── commands      (dispatch -> Outcome)
//! ```

pub mod surface;
pub mod typist;
pub mod commands;
pub mod session;
