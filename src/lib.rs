//! Interactive erase/restore mask editing for a single photo.
//!
//! Pointer input is mapped into the image's natural pixel grid
//! ([`mapping`]), painted as circular stamps into a persistent mask
//! ([`mask`], [`brush`]) under an explicit edit-session state machine
//! ([`tool`]), and composited into a live preview or a full-resolution
//! cut-out ([`compositor`]). Whole-image work runs on a background
//! [`worker`].

pub mod brush;
pub mod compositor;
pub mod config;
pub mod draw;
pub mod error;
pub mod gamma;
pub mod input;
pub mod mapping;
pub mod mask;
pub mod output;
pub mod source;
pub mod tool;
pub mod types;
pub mod window;
pub mod worker;

pub use error::{Error, Result};
