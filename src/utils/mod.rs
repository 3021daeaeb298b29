//! Shared utility functions.
//!
//! - `html`: escaping and filtered re-serialization of parsed HTML
//! - `mime`: image extension detection

pub mod html;
mod mime;

pub use html::{html_escape, serialize_children, serialize_filtered, visible_text, ElementAction};
pub use mime::image_extension;
