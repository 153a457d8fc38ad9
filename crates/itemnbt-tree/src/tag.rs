use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compound::Compound;

/// The kind of a [`Tag`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    ByteArray,
    IntArray,
    LongArray,
    List,
    Compound,
}

impl TagKind {
    /// Whether tags of this kind carry a single numeric value.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Byte | Self::Short | Self::Int | Self::Long | Self::Float | Self::Double
        )
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::ByteArray => "byte_array",
            Self::IntArray => "int_array",
            Self::LongArray => "long_array",
            Self::List => "list",
            Self::Compound => "compound",
        };
        f.write_str(name)
    }
}

/// A single value in the tagged tree.
///
/// Tags are schema-less: the tree never checks that a key holds the same kind
/// of tag over time. Interpretation is left entirely to the codec layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(#[serde(with = "f32_repr")] f32),
    Double(#[serde(with = "f64_repr")] f64),
    String(String),
    ByteArray(Vec<i8>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    List(Vec<Tag>),
    Compound(Compound),
}

/// Serde form of floating tags. Finite values stay plain numbers; NaN and the
/// infinities, which JSON cannot hold, become `"NaN"`, `"Infinity"` and
/// `"-Infinity"`.
macro_rules! float_repr {
    ($module:ident, $ty:ident, $serialize:ident) => {
        mod $module {
            use serde::de::Error;
            use serde::{Deserialize, Deserializer, Serializer};

            #[derive(Deserialize)]
            #[serde(untagged)]
            enum Repr {
                Number($ty),
                Text(String),
            }

            pub(super) fn serialize<S: Serializer>(
                v: &$ty,
                serializer: S,
            ) -> Result<S::Ok, S::Error> {
                if v.is_finite() {
                    serializer.$serialize(*v)
                } else if v.is_nan() {
                    serializer.serialize_str("NaN")
                } else if v.is_sign_positive() {
                    serializer.serialize_str("Infinity")
                } else {
                    serializer.serialize_str("-Infinity")
                }
            }

            pub(super) fn deserialize<'de, D: Deserializer<'de>>(
                deserializer: D,
            ) -> Result<$ty, D::Error> {
                match Repr::deserialize(deserializer)? {
                    Repr::Number(v) => Ok(v),
                    Repr::Text(text) => match text.as_str() {
                        "NaN" => Ok($ty::NAN),
                        "Infinity" => Ok($ty::INFINITY),
                        "-Infinity" => Ok($ty::NEG_INFINITY),
                        other => Err(D::Error::custom(format!(
                            "invalid {} value {other:?}",
                            stringify!($ty)
                        ))),
                    },
                }
            }
        }
    };
}

float_repr!(f32_repr, f32, serialize_f32);
float_repr!(f64_repr, f64, serialize_f64);

/// `v` as an `i64` if it is a whole number in range. The bounds are
/// `-2^63` (inclusive) and `2^63` (exclusive), both exact in `f64`.
fn whole_i64(v: f64) -> Option<i64> {
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if v.is_finite() && v.fract() == 0.0 && (-BOUND..BOUND).contains(&v) {
        Some(v as i64)
    } else {
        None
    }
}

impl Tag {
    /// The kind of this tag.
    pub fn kind(&self) -> TagKind {
        match self {
            Self::Byte(_) => TagKind::Byte,
            Self::Short(_) => TagKind::Short,
            Self::Int(_) => TagKind::Int,
            Self::Long(_) => TagKind::Long,
            Self::Float(_) => TagKind::Float,
            Self::Double(_) => TagKind::Double,
            Self::String(_) => TagKind::String,
            Self::ByteArray(_) => TagKind::ByteArray,
            Self::IntArray(_) => TagKind::IntArray,
            Self::LongArray(_) => TagKind::LongArray,
            Self::List(_) => TagKind::List,
            Self::Compound(_) => TagKind::Compound,
        }
    }

    /// Integral view of a numeric tag.
    ///
    /// Floating tags convert only when they hold a whole number inside the
    /// `i64` range; fractions, NaN and infinities give `None`, as do
    /// non-numeric tags.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            Self::Float(v) => whole_i64(f64::from(*v)),
            Self::Double(v) => whole_i64(*v),
            _ => None,
        }
    }

    /// Whether the tag is one of the six numeric kinds.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Byte(_)
                | Self::Short(_)
                | Self::Int(_)
                | Self::Long(_)
                | Self::Float(_)
                | Self::Double(_)
        )
    }

    /// Floating-point view of a numeric tag. Returns `None` for non-numeric tags.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Byte(v) => Some(f64::from(*v)),
            Self::Short(v) => Some(f64::from(*v)),
            Self::Int(v) => Some(f64::from(*v)),
            Self::Long(v) => Some(*v as f64),
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Self::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut Compound> {
        match self {
            Self::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tag]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<i8> for Tag {
    fn from(v: i8) -> Self {
        Self::Byte(v)
    }
}

impl From<i16> for Tag {
    fn from(v: i16) -> Self {
        Self::Short(v)
    }
}

impl From<i32> for Tag {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Tag {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for Tag {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Tag {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Tag {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Tag {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Compound> for Tag {
    fn from(v: Compound) -> Self {
        Self::Compound(v)
    }
}

// ---------------------------------------------------------------------------
// SNBT rendering
// ---------------------------------------------------------------------------

/// Renders the tag in SNBT (stringified tree) notation.
impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte(v) => write!(f, "{v}b"),
            Self::Short(v) => write!(f, "{v}s"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Float(v) => write!(f, "{v}f"),
            Self::Double(v) => write!(f, "{v}d"),
            Self::String(s) => write_quoted(f, s),
            Self::ByteArray(items) => write_array(f, "B", items.iter().map(|v| format!("{v}b"))),
            Self::IntArray(items) => write_array(f, "I", items.iter().map(|v| v.to_string())),
            Self::LongArray(items) => write_array(f, "L", items.iter().map(|v| format!("{v}L"))),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Compound(c) => write!(f, "{c}"),
        }
    }
}

fn write_array(
    f: &mut fmt::Formatter<'_>,
    prefix: &str,
    items: impl Iterator<Item = String>,
) -> fmt::Result {
    write!(f, "[{prefix};")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        f.write_str(&item)?;
    }
    f.write_str("]")
}

pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            _ => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}
