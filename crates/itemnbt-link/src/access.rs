//! Type-erased field accessors.
//!
//! Each declared field is stored as an accessor pair of plain function
//! pointers. Either half may be missing, which models a field that cannot be
//! read or written from outside the type.

use std::any::{type_name, Any};

use itemnbt_codec::{CodecError, TypeKey};

use crate::report::FieldFailureReason;

pub(crate) trait ErasedAccess<T>: Send + Sync {
    /// Type of the value the codec layer sees (the `V` in `Option<V>`).
    fn value_type(&self) -> TypeKey;

    /// Read the field. `Ok(None)` means the field holds no value.
    fn read<'a>(&self, target: &'a T) -> Result<Option<&'a dyn Any>, FieldFailureReason>;

    /// Overwrite the field with a boxed value of the field's value type.
    fn write(&self, target: &mut T, value: Box<dyn Any>) -> Result<(), FieldFailureReason>;

    /// Whether an absent value is a legal state for the field. Such fields
    /// link `None` as a missing key in both directions.
    fn allows_absent(&self) -> bool {
        false
    }

    /// Reset the field to its absent value.
    fn clear(&self, _target: &mut T) -> Result<(), FieldFailureReason> {
        Err(FieldFailureReason::MissingKey)
    }
}

fn downcast<V: 'static>(value: Box<dyn Any>) -> Result<V, FieldFailureReason> {
    value.downcast::<V>().map(|v| *v).map_err(|_| {
        FieldFailureReason::Codec(CodecError::ValueTypeMismatch {
            expected: type_name::<V>(),
        })
    })
}

/// Accessor for a field of type `V`.
pub(crate) struct PlainAccess<T, V> {
    pub(crate) get: Option<fn(&T) -> &V>,
    pub(crate) get_mut: Option<fn(&mut T) -> &mut V>,
}

impl<T: 'static, V: 'static> ErasedAccess<T> for PlainAccess<T, V> {
    fn value_type(&self) -> TypeKey {
        TypeKey::of::<V>()
    }

    fn read<'a>(&self, target: &'a T) -> Result<Option<&'a dyn Any>, FieldFailureReason> {
        let get = self.get.ok_or(FieldFailureReason::AccessDenied)?;
        Ok(Some(get(target) as &dyn Any))
    }

    fn write(&self, target: &mut T, value: Box<dyn Any>) -> Result<(), FieldFailureReason> {
        let get_mut = self.get_mut.ok_or(FieldFailureReason::AccessDenied)?;
        *get_mut(target) = downcast::<V>(value)?;
        Ok(())
    }
}

/// Accessor for a field of type `Option<V>`; `None` reads as absent.
///
/// A `required` field must hold a value whenever it is written to a tree.
pub(crate) struct OptionalAccess<T, V> {
    pub(crate) get: Option<fn(&T) -> &Option<V>>,
    pub(crate) get_mut: Option<fn(&mut T) -> &mut Option<V>>,
    pub(crate) required: bool,
}

impl<T: 'static, V: 'static> ErasedAccess<T> for OptionalAccess<T, V> {
    fn value_type(&self) -> TypeKey {
        TypeKey::of::<V>()
    }

    fn read<'a>(&self, target: &'a T) -> Result<Option<&'a dyn Any>, FieldFailureReason> {
        let get = self.get.ok_or(FieldFailureReason::AccessDenied)?;
        Ok(get(target).as_ref().map(|v| v as &dyn Any))
    }

    fn write(&self, target: &mut T, value: Box<dyn Any>) -> Result<(), FieldFailureReason> {
        let get_mut = self.get_mut.ok_or(FieldFailureReason::AccessDenied)?;
        *get_mut(target) = Some(downcast::<V>(value)?);
        Ok(())
    }

    fn allows_absent(&self) -> bool {
        !self.required
    }

    fn clear(&self, target: &mut T) -> Result<(), FieldFailureReason> {
        if self.required {
            return Err(FieldFailureReason::MissingKey);
        }
        let get_mut = self.get_mut.ok_or(FieldFailureReason::AccessDenied)?;
        *get_mut(target) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        count: i32,
        note: Option<String>,
    }

    fn sample() -> Sample {
        Sample {
            count: 1,
            note: None,
        }
    }

    #[test]
    fn plain_access_reads_and_writes() {
        let access = PlainAccess::<Sample, i32> {
            get: Some(|s| &s.count),
            get_mut: Some(|s| &mut s.count),
        };
        let mut s = sample();
        let read = access.read(&s).unwrap().unwrap();
        assert_eq!(read.downcast_ref::<i32>(), Some(&1));

        access.write(&mut s, Box::new(9i32)).unwrap();
        assert_eq!(s.count, 9);
        assert_eq!(access.value_type(), TypeKey::of::<i32>());
    }

    #[test]
    fn missing_half_is_access_denied() {
        let access = PlainAccess::<Sample, i32> {
            get: Some(|s| &s.count),
            get_mut: None,
        };
        let mut s = sample();
        assert_eq!(
            access.write(&mut s, Box::new(2i32)).unwrap_err(),
            FieldFailureReason::AccessDenied
        );
        assert_eq!(s.count, 1);
    }

    #[test]
    fn write_rejects_wrong_value_type() {
        let access = PlainAccess::<Sample, i32> {
            get: None,
            get_mut: Some(|s| &mut s.count),
        };
        let mut s = sample();
        assert!(matches!(
            access.write(&mut s, Box::new("nope")),
            Err(FieldFailureReason::Codec(CodecError::ValueTypeMismatch { .. }))
        ));
        assert_eq!(access.read(&s).unwrap_err(), FieldFailureReason::AccessDenied);
    }

    #[test]
    fn optional_access_treats_none_as_absent() {
        let access = OptionalAccess::<Sample, String> {
            get: Some(|s| &s.note),
            get_mut: Some(|s| &mut s.note),
            required: false,
        };
        let mut s = sample();
        assert!(access.read(&s).unwrap().is_none());

        access.write(&mut s, Box::new("hi".to_string())).unwrap();
        assert_eq!(s.note.as_deref(), Some("hi"));
        assert_eq!(access.value_type(), TypeKey::of::<String>());

        assert!(access.allows_absent());
        access.clear(&mut s).unwrap();
        assert_eq!(s.note, None);
    }

    #[test]
    fn required_optional_cannot_be_cleared() {
        let access = OptionalAccess::<Sample, String> {
            get: Some(|s| &s.note),
            get_mut: Some(|s| &mut s.note),
            required: true,
        };
        let mut s = Sample {
            count: 1,
            note: Some("kept".into()),
        };
        assert!(!access.allows_absent());
        assert_eq!(access.clear(&mut s).unwrap_err(), FieldFailureReason::MissingKey);
        assert_eq!(s.note.as_deref(), Some("kept"));

        let plain = PlainAccess::<Sample, i32> {
            get: Some(|s| &s.count),
            get_mut: Some(|s| &mut s.count),
        };
        assert!(!plain.allows_absent());
        assert!(plain.clear(&mut s).is_err());
    }
}
