//! State Binder
//!
//! Applies a flat list of `{Name, Value, Type}` body items onto a destination
//! value by field name.
//!
//! Every bindable type owns a [`FieldTable`]: a name → setter/getter table
//! built once and cached, so binding never inspects the type at runtime.
//! The [`bindable!`](crate::bindable) macro generates it:
//!
//! ```ignore
//! #[derive(Clone, Default)]
//! struct Counter { count: i64, label: String }
//! bindable!(Counter { count as "Count", label });
//!
//! let mut counter = Counter::default();
//! bind(&items, &mut counter)?;
//! ```
//!
//! Binding is partial: an item that fails to parse leaves its field untouched,
//! is reported in [`BindErrors`], and does not stop the remaining items.
//! Unknown names are skipped.

mod error;
mod item;
mod value;

pub use error::{BindError, BindErrors};
pub use item::{BodyItem, ValueKind};
pub use value::{BodyValue, FromBodyValue, ToBodyValue};

use rustc_hash::FxHashMap;

// =============================================================================
// Field descriptors
// =============================================================================

type Setter<T> = fn(&mut T, BodyValue) -> Result<(), String>;
type Getter<T> = fn(&T) -> (ValueKind, String);

/// One named field of a bindable type.
pub struct Field<T> {
    name: &'static str,
    set: Setter<T>,
    get: Getter<T>,
}

impl<T> Field<T> {
    pub const fn new(name: &'static str, set: Setter<T>, get: Getter<T>) -> Self {
        Self { name, set, get }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// Per-type field table, looked up by exact (case-sensitive) name.
pub struct FieldTable<T> {
    fields: Vec<Field<T>>,
    index: FxHashMap<&'static str, usize>,
}

impl<T> FieldTable<T> {
    /// Build a table. A later field with a duplicate name shadows an earlier one.
    pub fn new(fields: Vec<Field<T>>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, field)| (field.name, i))
            .collect();
        Self { fields, index }
    }

    pub fn get(&self, name: &str) -> Option<&Field<T>> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Render the current value of every field as body items.
    pub fn export(&self, src: &T) -> Vec<BodyItem> {
        self.fields
            .iter()
            .map(|field| {
                let (kind, value) = (field.get)(src);
                BodyItem::new(field.name, value, kind)
            })
            .collect()
    }
}

// =============================================================================
// Bind
// =============================================================================

/// A type that body items can be bound onto.
pub trait Bind: Sized + 'static {
    fn fields() -> &'static FieldTable<Self>;

    /// Current state as body items (server → client direction).
    fn to_items(&self) -> Vec<BodyItem> {
        Self::fields().export(self)
    }
}

/// Bind `items` onto `dest`.
///
/// Applies every recognised item it can; returns the failures, if any.
pub fn bind<T: Bind>(items: &[BodyItem], dest: &mut T) -> Result<(), BindErrors> {
    let table = T::fields();
    let mut errors = BindErrors::default();

    for item in items {
        let Some(field) = table.get(&item.name) else {
            continue;
        };
        let result = item
            .kind
            .parse(&item.value)
            .and_then(|value| (field.set)(dest, value));
        if let Err(reason) = result {
            errors.push(BindError {
                field: item.name.clone(),
                value: item.value.clone(),
                kind: item.kind,
                reason,
            });
        }
    }

    errors.into_result()
}

/// Stateless actions bind nothing.
impl Bind for () {
    fn fields() -> &'static FieldTable<Self> {
        static TABLE: std::sync::OnceLock<FieldTable<()>> = std::sync::OnceLock::new();
        TABLE.get_or_init(|| FieldTable::new(Vec::new()))
    }
}

/// Generate a [`Bind`] impl for a struct.
///
/// Fields are bound under their Rust name unless renamed with `as "Name"`.
///
/// ```ignore
/// bindable!(Counter { count as "Count", step });
/// ```
#[macro_export]
macro_rules! bindable {
    (@name $field:ident) => {
        stringify!($field)
    };
    (@name $field:ident, $name:literal) => {
        $name
    };
    ($ty:ty { $($field:ident $(as $name:literal)?),* $(,)? }) => {
        impl $crate::bind::Bind for $ty {
            fn fields() -> &'static $crate::bind::FieldTable<Self> {
                static TABLE: ::std::sync::OnceLock<$crate::bind::FieldTable<$ty>> =
                    ::std::sync::OnceLock::new();
                TABLE.get_or_init(|| {
                    $crate::bind::FieldTable::new(vec![
                        $(
                            $crate::bind::Field::new(
                                $crate::bindable!(@name $field $(, $name)?),
                                |dest: &mut $ty, value| {
                                    $crate::bind::FromBodyValue::assign(&mut dest.$field, value)
                                },
                                |src: &$ty| $crate::bind::ToBodyValue::to_body_value(&src.$field),
                            ),
                        )*
                    ])
                })
            }
        }
    };
}
