//! Text Layer
//!
//! Structured message parts and their terminal rendering.

pub mod parts;
pub mod render;

pub use parts::{MessageBuilder, MessagePart, PartKind};
pub use render::{render, NameLookup, RenderError, Renderer};
