//! Trail geometry decoding
//!
//! The service publishes each trail's path as well-known binary (WKB).
//! Only line geometries are meaningful for trails; everything else is
//! rejected explicitly.

pub mod wkb;

pub use wkb::{decode, encode_line_string, ByteOrder};
