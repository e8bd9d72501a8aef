//! Byte-buffer cursor (§4.1): big-endian reads/writes, syncsafe integers,
//! and the handful of string encodings ID3v2 and MP4 need.

mod cursor;

pub use cursor::{BinaryReader, BinaryWriter};
