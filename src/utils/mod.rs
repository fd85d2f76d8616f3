pub mod base62;
pub mod time;

pub use base62::{decode as base62_decode, encode as base62_encode};
pub use time::{format_ts, parse_ts};
