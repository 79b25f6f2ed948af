use std::hash::Hash;

use crate::error::{Error, Result};

/// Trait for index keys with a text codec.
///
/// Keys are opaque to the tree itself, which only needs equality and
/// hashing. The text codec comes into play twice: `add_key` derives the
/// indexed text from the key, and the save stream interns each distinct
/// key as a string that `from_text` must be able to parse back.
pub trait Key: Clone + Eq + Hash {
    /// Render the key as its canonical text representation.
    fn to_text(&self) -> String;

    /// Parse a key back from its text representation.
    fn from_text(text: &str) -> Result<Self>;
}

impl Key for String {
    fn to_text(&self) -> String {
        self.clone()
    }

    fn from_text(text: &str) -> Result<Self> {
        Ok(text.to_string())
    }
}

// Default conversions for the primitive integer types, via Display/FromStr.
macro_rules! impl_int_key {
    ($($t:ty),*) => {
        $(impl Key for $t {
            fn to_text(&self) -> String {
                self.to_string()
            }

            fn from_text(text: &str) -> Result<Self> {
                text.parse().map_err(|e| {
                    Error::KeyCodec(format!("cannot parse {text:?} as {}: {e}", stringify!($t)))
                })
            }
        })*
    };
}

impl_int_key!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);
