//! Output formats rendered with external libraries.

pub mod cbor;
pub mod yaml;
