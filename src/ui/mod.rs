//! User interface rendering and input handling.
//!
//! - **keymapper**: crossterm key events to session key actions
//! - **markup**: output-log markup decoding and width-aware wrapping
//! - **renderer**: full-screen renderer for the interactive mode

pub mod keymapper;
pub mod markup;
pub mod renderer;

pub use keymapper::*;
pub use renderer::Renderer;
