//! MP4-family (M4A/M4B) codec (§4.5): a generic ISOBMFF box tree, plus the
//! format-specific pieces layered on top of it — `ilst` metadata, a
//! Nero/QuickTime-style chapter track, and a subtitle track for
//! synchronized lyrics.

mod atom;
mod chapters;
mod container;
mod ilst;
mod lyrics;
mod read;
mod stbl;
mod write;

pub use read::read;
pub use write::{modify, strip, write};
