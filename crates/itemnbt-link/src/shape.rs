//! Field declarations: the explicit replacement for reflective discovery.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use itemnbt_codec::TypeKey;

use crate::access::{ErasedAccess, OptionalAccess, PlainAccess};
use crate::linker::{resolve_nested, NestedResolver};

/// A type whose fields can be linked to a tree.
///
/// Implementors describe themselves once; the [`Linker`](crate::Linker)
/// compiles and caches the description.
pub trait Linked: Sized + 'static {
    fn shape() -> DataShape<Self>;
}

/// How a [`DataShape`] maps fields to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Every public field, keyed by its own name.
    Automatic,
    /// Only fields with an explicit scalar or composite key.
    Manual,
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automatic => f.write_str("automatic"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

/// Whether a field is visible to the linker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    /// Declared but never linked, in either mode.
    Private,
}

pub(crate) type Factory<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// A declared field with its value type erased.
pub struct FieldRef<T> {
    pub(crate) name: &'static str,
    pub(crate) visibility: Visibility,
    pub(crate) scalar_key: Option<String>,
    pub(crate) composite_key: Option<String>,
    pub(crate) nested: Option<NestedResolver>,
    pub(crate) access: Arc<dyn ErasedAccess<T>>,
}

impl<T> FieldRef<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn scalar_key(&self) -> Option<&str> {
        self.scalar_key.as_deref()
    }

    pub fn composite_key(&self) -> Option<&str> {
        self.composite_key.as_deref()
    }

    /// Type of the linked value (for `Option<V>` fields, `V`).
    pub fn value_type(&self) -> TypeKey {
        self.access.value_type()
    }

    /// Whether the field's type can be linked as a nested data object.
    pub fn is_linkable(&self) -> bool {
        self.nested.is_some()
    }
}

impl<T> Clone for FieldRef<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            visibility: self.visibility,
            scalar_key: self.scalar_key.clone(),
            composite_key: self.composite_key.clone(),
            nested: self.nested,
            access: Arc::clone(&self.access),
        }
    }
}

impl<T> fmt::Debug for FieldRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRef")
            .field("name", &self.name)
            .field("type", &self.value_type().name())
            .field("visibility", &self.visibility)
            .field("scalar_key", &self.scalar_key)
            .field("composite_key", &self.composite_key)
            .finish()
    }
}

/// A field declaration that still knows its value type `V`.
///
/// Knowing `V` lets [`composite`](Field::composite) and
/// [`nested`](Field::nested) require `V: Linked` at compile time. Convert into
/// a [`FieldRef`] (implicitly, via [`DataShape::field`]) once declared.
pub struct Field<T, V> {
    inner: FieldRef<T>,
    _value: PhantomData<fn() -> V>,
}

impl<T: 'static, V: 'static> Field<T, V> {
    fn from_access(name: &'static str, access: Arc<dyn ErasedAccess<T>>) -> Self {
        Self {
            inner: FieldRef {
                name,
                visibility: Visibility::Public,
                scalar_key: None,
                composite_key: None,
                nested: None,
                access,
            },
            _value: PhantomData,
        }
    }

    /// A readable and writable field of type `V`.
    pub fn new(name: &'static str, get: fn(&T) -> &V, get_mut: fn(&mut T) -> &mut V) -> Self {
        Self::from_access(
            name,
            Arc::new(PlainAccess {
                get: Some(get),
                get_mut: Some(get_mut),
            }),
        )
    }

    /// A field that can be read but not assigned; forward links skip it.
    pub fn read_only(name: &'static str, get: fn(&T) -> &V) -> Self {
        Self::from_access(
            name,
            Arc::new(PlainAccess {
                get: Some(get),
                get_mut: None,
            }),
        )
    }

    /// A field that can be assigned but not read; backward links skip it.
    pub fn write_only(name: &'static str, get_mut: fn(&mut T) -> &mut V) -> Self {
        Self::from_access(
            name,
            Arc::new(PlainAccess {
                get: None,
                get_mut: Some(get_mut),
            }),
        )
    }

    /// An `Option<V>` field. `None` is linked as a missing key: backward links
    /// remove the key and forward links reset a missing key to `None`.
    pub fn optional(
        name: &'static str,
        get: fn(&T) -> &Option<V>,
        get_mut: fn(&mut T) -> &mut Option<V>,
    ) -> Self {
        Self::from_access(
            name,
            Arc::new(OptionalAccess {
                get: Some(get),
                get_mut: Some(get_mut),
                required: false,
            }),
        )
    }

    /// An `Option<V>` field that must hold a value when synchronized.
    /// Backward links report `None` as [`NullValue`] and leave the key
    /// untouched; forward links report a missing key.
    ///
    /// [`NullValue`]: crate::FieldFailureReason::NullValue
    pub fn required(
        name: &'static str,
        get: fn(&T) -> &Option<V>,
        get_mut: fn(&mut T) -> &mut Option<V>,
    ) -> Self {
        Self::from_access(
            name,
            Arc::new(OptionalAccess {
                get: Some(get),
                get_mut: Some(get_mut),
                required: true,
            }),
        )
    }

    /// Map the field as a scalar under `key` (manual mode).
    pub fn scalar(mut self, key: impl Into<String>) -> Self {
        self.inner.scalar_key = Some(key.into());
        self
    }

    /// Hide the field from the linker.
    pub fn private(mut self) -> Self {
        self.inner.visibility = Visibility::Private;
        self
    }
}

impl<T: 'static, V: Linked> Field<T, V> {
    /// Map the field as a nested data object under `key` (manual mode).
    pub fn composite(self, key: impl Into<String>) -> Self {
        let mut field = self.nested();
        field.inner.composite_key = Some(key.into());
        field
    }

    /// Mark the field's type as linkable so automatic mode can recurse into
    /// it when the type has no codec.
    pub fn nested(mut self) -> Self {
        self.inner.nested = Some(resolve_nested::<V>);
        self
    }
}

impl<T, V> From<Field<T, V>> for FieldRef<T> {
    fn from(field: Field<T, V>) -> Self {
        field.inner
    }
}

/// Declarative description of a data-object type.
pub struct DataShape<T> {
    pub(crate) mode: LinkMode,
    pub(crate) factory: Option<Factory<T>>,
    pub(crate) fields: Vec<FieldRef<T>>,
}

impl<T: 'static> DataShape<T> {
    pub fn new(mode: LinkMode) -> Self {
        Self {
            mode,
            factory: None,
            fields: Vec::new(),
        }
    }

    /// Shape whose public fields are linked under their own names.
    pub fn automatic() -> Self {
        Self::new(LinkMode::Automatic)
    }

    /// Shape whose fields are linked only under explicitly declared keys.
    pub fn manual() -> Self {
        Self::new(LinkMode::Manual)
    }

    /// Set the zero-argument factory used for fresh instances.
    pub fn factory(mut self, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Declare a field.
    pub fn field(mut self, field: impl Into<FieldRef<T>>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn mode(&self) -> LinkMode {
        self.mode
    }

    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    pub fn fields(&self) -> &[FieldRef<T>] {
        &self.fields
    }
}

impl<T: Default + 'static> DataShape<T> {
    /// Use `T::default` as the factory.
    pub fn with_default_factory(self) -> Self {
        self.factory(T::default)
    }
}

impl<T> fmt::Debug for DataShape<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataShape")
            .field("type", &type_name::<T>())
            .field("mode", &self.mode)
            .field("has_factory", &self.factory.is_some())
            .field("fields", &self.fields)
            .finish()
    }
}
