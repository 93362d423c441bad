pub mod decode;
pub mod value;

pub use decode::{decode, DecodeError, MAX_DEPTH};
pub use value::{map_get_int, map_get_str, Value};
