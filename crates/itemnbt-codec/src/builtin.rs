//! Builtin codecs for primitive and common value types.

use itemnbt_tree::{Tag, TagKind};
use uuid::Uuid;

use crate::error::{CodecError, CodecResult};
use crate::registry::CodecRegistry;

/// A type that knows how to convert itself to and from a [`Tag`].
///
/// Register implementors with [`CodecRegistry::register_codec`].
pub trait TagCodec: Sized + 'static {
    fn encode(&self) -> Tag;
    fn decode(tag: &Tag) -> CodecResult<Self>;
}

/// Install every builtin codec into a fresh registry.
pub(crate) fn register_defaults(registry: &mut CodecRegistry) {
    registry.insert_builtin::<i8>();
    registry.insert_builtin::<i16>();
    registry.insert_builtin::<i32>();
    registry.insert_builtin::<i64>();
    registry.insert_builtin::<f32>();
    registry.insert_builtin::<f64>();
    registry.insert_builtin::<bool>();
    registry.insert_builtin::<String>();
    registry.insert_builtin::<Vec<i8>>();
    registry.insert_builtin::<Vec<i32>>();
    registry.insert_builtin::<Vec<i64>>();
    registry.insert_builtin::<Vec<String>>();
    registry.insert_builtin::<Uuid>();
}

fn mismatch(expected: TagKind, tag: &Tag) -> CodecError {
    CodecError::TagMismatch {
        expected,
        found: tag.kind(),
    }
}

/// Read a numeric tag as a whole number. Floating tags must hold an exact
/// integer; fractions, NaN, infinities and values past `i64` are out of range.
fn integral(tag: &Tag, expected: TagKind, target: &'static str) -> CodecResult<i64> {
    if let Some(v) = tag.as_i64() {
        return Ok(v);
    }
    match tag.as_f64() {
        Some(v) => Err(CodecError::OutOfRange {
            value: format!("{v:?}"),
            target,
        }),
        None => Err(mismatch(expected, tag)),
    }
}

/// Integer codecs accept any numeric tag and narrow with a range check.
macro_rules! integral_codec {
    ($ty:ty, $variant:ident) => {
        impl TagCodec for $ty {
            fn encode(&self) -> Tag {
                Tag::$variant(*self)
            }

            fn decode(tag: &Tag) -> CodecResult<Self> {
                let wide = integral(tag, TagKind::$variant, stringify!($ty))?;
                <$ty>::try_from(wide).map_err(|_| CodecError::OutOfRange {
                    value: wide.to_string(),
                    target: stringify!($ty),
                })
            }
        }
    };
}

integral_codec!(i8, Byte);
integral_codec!(i16, Short);
integral_codec!(i32, Int);
integral_codec!(i64, Long);

impl TagCodec for f32 {
    fn encode(&self) -> Tag {
        Tag::Float(*self)
    }

    /// Wider values round to the nearest `f32`; finite values too large for
    /// `f32` are out of range rather than becoming infinite.
    fn decode(tag: &Tag) -> CodecResult<Self> {
        if let Tag::Float(v) = tag {
            return Ok(*v);
        }
        let wide = tag.as_f64().ok_or_else(|| mismatch(TagKind::Float, tag))?;
        let narrow = wide as f32;
        if wide.is_finite() && narrow.is_infinite() {
            return Err(CodecError::OutOfRange {
                value: format!("{wide:?}"),
                target: "f32",
            });
        }
        Ok(narrow)
    }
}

impl TagCodec for f64 {
    fn encode(&self) -> Tag {
        Tag::Double(*self)
    }

    fn decode(tag: &Tag) -> CodecResult<Self> {
        tag.as_f64().ok_or_else(|| mismatch(TagKind::Double, tag))
    }
}

/// Booleans are stored as a byte; any non-zero whole number reads as `true`.
impl TagCodec for bool {
    fn encode(&self) -> Tag {
        Tag::Byte(i8::from(*self))
    }

    fn decode(tag: &Tag) -> CodecResult<Self> {
        integral(tag, TagKind::Byte, "bool").map(|v| v != 0)
    }
}

impl TagCodec for String {
    fn encode(&self) -> Tag {
        Tag::String(self.clone())
    }

    fn decode(tag: &Tag) -> CodecResult<Self> {
        tag.as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(TagKind::String, tag))
    }
}

macro_rules! array_codec {
    ($elem:ty, $variant:ident) => {
        impl TagCodec for Vec<$elem> {
            fn encode(&self) -> Tag {
                Tag::$variant(self.clone())
            }

            fn decode(tag: &Tag) -> CodecResult<Self> {
                match tag {
                    Tag::$variant(items) => Ok(items.clone()),
                    other => Err(mismatch(TagKind::$variant, other)),
                }
            }
        }
    };
}

array_codec!(i8, ByteArray);
array_codec!(i32, IntArray);
array_codec!(i64, LongArray);

impl TagCodec for Vec<String> {
    fn encode(&self) -> Tag {
        Tag::List(self.iter().cloned().map(Tag::String).collect())
    }

    fn decode(tag: &Tag) -> CodecResult<Self> {
        let items = tag.as_list().ok_or_else(|| mismatch(TagKind::List, tag))?;
        items.iter().map(String::decode).collect()
    }
}

/// UUIDs are stored as four big-endian `i32` words, most significant first.
/// The hyphenated string form is accepted on read.
impl TagCodec for Uuid {
    fn encode(&self) -> Tag {
        let words = self
            .as_bytes()
            .chunks_exact(4)
            .map(|w| i32::from_be_bytes([w[0], w[1], w[2], w[3]]))
            .collect();
        Tag::IntArray(words)
    }

    fn decode(tag: &Tag) -> CodecResult<Self> {
        match tag {
            Tag::IntArray(words) if words.len() == 4 => {
                let mut bytes = [0u8; 16];
                for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
                    chunk.copy_from_slice(&word.to_be_bytes());
                }
                Ok(Uuid::from_bytes(bytes))
            }
            Tag::IntArray(words) => Err(CodecError::InvalidPayload {
                target: "Uuid",
                reason: format!("expected 4 words, got {}", words.len()),
            }),
            Tag::String(s) => Uuid::parse_str(s).map_err(|e| CodecError::InvalidPayload {
                target: "Uuid",
                reason: e.to_string(),
            }),
            other => Err(mismatch(TagKind::IntArray, other)),
        }
    }
}
