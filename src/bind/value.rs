//! Conversions between parsed body values and Rust field types.

use super::item::{ValueKind, parse_bool};
use crate::utils::date::DateTimeUtc;

/// A body item's value after parsing per its declared kind.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyValue {
    /// Empty text for a non-string kind: reset to the zero value.
    Empty,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Time(DateTimeUtc),
}

impl BodyValue {
    const fn kind_name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Str(_) => "string",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Time(_) => "time",
        }
    }

    fn mismatch(&self, expected: &str) -> String {
        format!("expected {expected}, got {}", self.kind_name())
    }
}

/// Field types a [`BodyValue`] can be assigned to.
pub trait FromBodyValue: Sized {
    fn from_body_value(value: BodyValue) -> Result<Self, String>;

    /// Overwrite `slot` only when conversion succeeds.
    fn assign(slot: &mut Self, value: BodyValue) -> Result<(), String> {
        *slot = Self::from_body_value(value)?;
        Ok(())
    }
}

/// Field types that can be exported back as body items.
pub trait ToBodyValue {
    const KIND: ValueKind;

    fn to_body_text(&self) -> String;

    fn to_body_value(&self) -> (ValueKind, String) {
        (Self::KIND, self.to_body_text())
    }
}

impl FromBodyValue for String {
    fn from_body_value(value: BodyValue) -> Result<Self, String> {
        Ok(match value {
            BodyValue::Empty => Self::new(),
            BodyValue::Str(s) => s,
            BodyValue::Int(n) => n.to_string(),
            BodyValue::Float(f) => f.to_string(),
            BodyValue::Bool(b) => b.to_string(),
            BodyValue::Time(t) => t.to_rfc3339(),
        })
    }
}

impl ToBodyValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn to_body_text(&self) -> String {
        self.clone()
    }
}

macro_rules! impl_int {
    ($($ty:ty),* $(,)?) => {$(
        impl FromBodyValue for $ty {
            fn from_body_value(value: BodyValue) -> Result<Self, String> {
                match value {
                    BodyValue::Empty => Ok(0),
                    BodyValue::Int(n) => <$ty>::try_from(n)
                        .map_err(|_| format!("{n} is out of range for {}", stringify!($ty))),
                    BodyValue::Str(s) => s.trim().parse::<$ty>().map_err(|e| e.to_string()),
                    other => Err(other.mismatch("an integer")),
                }
            }
        }

        impl ToBodyValue for $ty {
            const KIND: ValueKind = ValueKind::Int;

            fn to_body_text(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

impl_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_float {
    ($($ty:ty),* $(,)?) => {$(
        impl FromBodyValue for $ty {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            fn from_body_value(value: BodyValue) -> Result<Self, String> {
                match value {
                    BodyValue::Empty => Ok(0.0),
                    BodyValue::Float(f) => Ok(f as $ty),
                    BodyValue::Int(n) => Ok(n as $ty),
                    BodyValue::Str(s) => s.trim().parse::<$ty>().map_err(|e| e.to_string()),
                    other => Err(other.mismatch("a number")),
                }
            }
        }

        impl ToBodyValue for $ty {
            const KIND: ValueKind = ValueKind::Float;

            fn to_body_text(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

impl_float!(f32, f64);

impl FromBodyValue for bool {
    fn from_body_value(value: BodyValue) -> Result<Self, String> {
        match value {
            BodyValue::Empty => Ok(false),
            BodyValue::Bool(b) => Ok(b),
            BodyValue::Int(0) => Ok(false),
            BodyValue::Int(1) => Ok(true),
            BodyValue::Str(s) => parse_bool(&s),
            other => Err(other.mismatch("a boolean")),
        }
    }
}

impl ToBodyValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn to_body_text(&self) -> String {
        self.to_string()
    }
}

impl FromBodyValue for DateTimeUtc {
    fn from_body_value(value: BodyValue) -> Result<Self, String> {
        match value {
            BodyValue::Empty => Ok(Self::default()),
            BodyValue::Time(t) => Ok(t),
            BodyValue::Str(s) => {
                Self::parse(&s).ok_or_else(|| format!("`{s}` is not a recognised date or time"))
            }
            other => Err(other.mismatch("a date or time")),
        }
    }
}

impl ToBodyValue for DateTimeUtc {
    const KIND: ValueKind = ValueKind::Time;

    fn to_body_text(&self) -> String {
        self.to_rfc3339()
    }
}

/// `None` for empty input, otherwise the inner conversion.
impl<T: FromBodyValue> FromBodyValue for Option<T> {
    fn from_body_value(value: BodyValue) -> Result<Self, String> {
        match value {
            BodyValue::Empty => Ok(None),
            BodyValue::Str(s) if s.is_empty() => Ok(None),
            other => T::from_body_value(other).map(Some),
        }
    }
}

impl<T: ToBodyValue> ToBodyValue for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn to_body_text(&self) -> String {
        self.as_ref().map(T::to_body_text).unwrap_or_default()
    }
}
