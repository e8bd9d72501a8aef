//! ID3v2 codec (§4.4): header/frame parsing, the CHAP/CTOC chapter tree,
//! and the read/write/modify/strip entry points the facade dispatches to.

mod chapters;
mod frame;
mod header;
mod mapping;
mod modify;
mod read;
mod write;

pub use modify::modify;
pub use read::read;
pub use write::{strip, write};
