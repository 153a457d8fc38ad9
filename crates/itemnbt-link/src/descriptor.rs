use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use itemnbt_codec::{CodecError, CodecRegistry};
use itemnbt_tree::{Compound, Tag, TreeNode};
use tracing::warn;

use crate::report::{FieldFailure, FieldFailureReason, LinkDirection, LinkReport};
use crate::shape::{Factory, FieldRef, LinkMode};

/// A type-erased descriptor, used for composite fields whose nested type is
/// only known at build time.
pub(crate) trait ErasedLink: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn create_erased(&self) -> Box<dyn Any>;
    fn forward_erased(
        &self,
        source: &dyn TreeNode,
        target: &mut dyn Any,
        path: &str,
        report: &mut LinkReport,
    );
    fn backward_erased(
        &self,
        target: &mut dyn TreeNode,
        source: &dyn Any,
        path: &str,
        report: &mut LinkReport,
    );
}

pub(crate) struct CompositeLink<T> {
    pub(crate) field: FieldRef<T>,
    pub(crate) nested: Arc<dyn ErasedLink>,
}

/// Compiled key → field mapping for one data-object type.
///
/// Immutable once built and safe to share. Scalar keys are unique among
/// scalars, composite keys among composites, and no key appears in both.
pub struct LinkDescriptor<T> {
    pub(crate) mode: LinkMode,
    pub(crate) factory: Factory<T>,
    pub(crate) scalars: BTreeMap<String, FieldRef<T>>,
    pub(crate) composites: BTreeMap<String, CompositeLink<T>>,
    pub(crate) codecs: Arc<CodecRegistry>,
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn record_failure(
    report: &mut LinkReport,
    key: String,
    field: &'static str,
    direction: LinkDirection,
    reason: FieldFailureReason,
) {
    warn!(%key, field, %direction, %reason, "field link failed");
    report.record_failure(FieldFailure {
        key,
        field,
        direction,
        reason,
    });
}

/// Forward-link a key the tree does not hold. Optional fields go back to
/// `None`; anything else is a `MissingKey` failure that keeps the field.
fn link_absent<T>(report: &mut LinkReport, target: &mut T, field: &FieldRef<T>, key: String) {
    if field.access.allows_absent() {
        match field.access.clear(target) {
            Ok(()) => report.record_linked(),
            Err(reason) => record_failure(report, key, field.name, LinkDirection::Forward, reason),
        }
        return;
    }
    record_failure(
        report,
        key,
        field.name,
        LinkDirection::Forward,
        FieldFailureReason::MissingKey,
    );
}

impl<T: 'static> LinkDescriptor<T> {
    /// Build a fresh instance with the type's factory.
    pub fn create(&self) -> T {
        (self.factory)()
    }

    pub fn mode(&self) -> LinkMode {
        self.mode
    }

    pub fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    /// Scalar keys, sorted.
    pub fn scalar_keys(&self) -> Vec<&str> {
        self.scalars.keys().map(String::as_str).collect()
    }

    /// Composite keys, sorted.
    pub fn composite_keys(&self) -> Vec<&str> {
        self.composites.keys().map(String::as_str).collect()
    }

    pub fn is_scalar(&self, key: &str) -> bool {
        self.scalars.contains_key(key)
    }

    pub fn is_composite(&self, key: &str) -> bool {
        self.composites.contains_key(key)
    }

    /// The codec registry this descriptor converts through.
    pub fn codecs(&self) -> &Arc<CodecRegistry> {
        &self.codecs
    }

    /// Decode `source` into the fields of `target`.
    ///
    /// Every mapped key is attempted. Missing keys, codec failures, and
    /// unwritable fields are reported and leave the field untouched, except
    /// that an optional field whose key is missing is reset to `None`.
    pub fn forward_link(&self, source: &dyn TreeNode, target: &mut T) -> LinkReport {
        let mut report = LinkReport::new();
        self.forward_at(source, target, "", &mut report);
        report
    }

    /// Encode the fields of `source` into `target`.
    ///
    /// Keys are written on top of whatever `target` already holds; callers
    /// wanting a full overwrite clear the node first. An optional field
    /// holding `None` removes its key. Absent required values and unreadable
    /// fields are reported and their keys left unwritten.
    pub fn backward_link(&self, target: &mut dyn TreeNode, source: &T) -> LinkReport {
        let mut report = LinkReport::new();
        self.backward_at(target, source, "", &mut report);
        report
    }

    /// Create a fresh instance and forward-link `source` into it.
    pub fn read(&self, source: &dyn TreeNode) -> (T, LinkReport) {
        let mut instance = self.create();
        let report = self.forward_link(source, &mut instance);
        (instance, report)
    }

    /// Backward-link `source` into a new, empty compound.
    pub fn write_new(&self, source: &T) -> (Compound, LinkReport) {
        let mut tree = Compound::new();
        let report = self.backward_link(&mut tree, source);
        (tree, report)
    }

    fn forward_at(
        &self,
        source: &dyn TreeNode,
        target: &mut T,
        path: &str,
        report: &mut LinkReport,
    ) {
        for (key, field) in &self.scalars {
            let key_path = child_path(path, key);
            let Some(tag) = source.get(key) else {
                link_absent(report, target, field, key_path);
                continue;
            };
            let outcome = self
                .codecs
                .decode_any(field.value_type(), tag)
                .map_err(FieldFailureReason::from)
                .and_then(|value| field.access.write(target, value));
            match outcome {
                Ok(()) => report.record_linked(),
                Err(reason) => {
                    record_failure(report, key_path, field.name, LinkDirection::Forward, reason)
                }
            }
        }

        for (key, link) in &self.composites {
            let key_path = child_path(path, key);
            let field = &link.field;
            let subtree = match source.get(key) {
                Some(Tag::Compound(subtree)) => subtree,
                Some(other) => {
                    let reason = FieldFailureReason::NotACompound(other.kind());
                    record_failure(
                        report,
                        key_path,
                        field.name,
                        LinkDirection::Forward,
                        reason,
                    );
                    continue;
                }
                None => {
                    link_absent(report, target, field, key_path);
                    continue;
                }
            };

            let mut nested = link.nested.create_erased();
            link.nested.forward_erased(subtree, &mut *nested, &key_path, report);
            match field.access.write(target, nested) {
                Ok(()) => report.record_linked(),
                Err(reason) => {
                    record_failure(report, key_path, field.name, LinkDirection::Forward, reason)
                }
            }
        }
    }

    fn backward_at(
        &self,
        target: &mut dyn TreeNode,
        source: &T,
        path: &str,
        report: &mut LinkReport,
    ) {
        for (key, field) in &self.scalars {
            let key_path = child_path(path, key);
            let outcome = match field.access.read(source) {
                Ok(Some(value)) => self
                    .codecs
                    .encode_any(field.value_type(), value)
                    .map_err(FieldFailureReason::from),
                Ok(None) if field.access.allows_absent() => {
                    target.remove(key);
                    report.record_linked();
                    continue;
                }
                Ok(None) => Err(FieldFailureReason::NullValue),
                Err(reason) => Err(reason),
            };
            match outcome {
                Ok(tag) => {
                    target.put(key, tag);
                    report.record_linked();
                }
                Err(reason) => {
                    record_failure(report, key_path, field.name, LinkDirection::Backward, reason)
                }
            }
        }

        for (key, link) in &self.composites {
            let key_path = child_path(path, key);
            let field = &link.field;
            let value = match field.access.read(source) {
                Ok(Some(value)) => value,
                Ok(None) if field.access.allows_absent() => {
                    target.remove(key);
                    report.record_linked();
                    continue;
                }
                Ok(None) => {
                    record_failure(
                        report,
                        key_path,
                        field.name,
                        LinkDirection::Backward,
                        FieldFailureReason::NullValue,
                    );
                    continue;
                }
                Err(reason) => {
                    record_failure(
                        report,
                        key_path,
                        field.name,
                        LinkDirection::Backward,
                        reason,
                    );
                    continue;
                }
            };

            let mut subtree = Compound::new();
            link.nested.backward_erased(&mut subtree, value, &key_path, report);
            target.put(key, Tag::Compound(subtree));
            report.record_linked();
        }
    }
}

impl<T: 'static> ErasedLink for LinkDescriptor<T> {
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn create_erased(&self) -> Box<dyn Any> {
        Box::new(self.create())
    }

    fn forward_erased(
        &self,
        source: &dyn TreeNode,
        target: &mut dyn Any,
        path: &str,
        report: &mut LinkReport,
    ) {
        match target.downcast_mut::<T>() {
            Some(target) => self.forward_at(source, target, path, report),
            None => record_failure(
                report,
                path.to_string(),
                type_name::<T>(),
                LinkDirection::Forward,
                CodecError::ValueTypeMismatch {
                    expected: type_name::<T>(),
                }
                .into(),
            ),
        }
    }

    fn backward_erased(
        &self,
        target: &mut dyn TreeNode,
        source: &dyn Any,
        path: &str,
        report: &mut LinkReport,
    ) {
        match source.downcast_ref::<T>() {
            Some(source) => self.backward_at(target, source, path, report),
            None => record_failure(
                report,
                path.to_string(),
                type_name::<T>(),
                LinkDirection::Backward,
                CodecError::ValueTypeMismatch {
                    expected: type_name::<T>(),
                }
                .into(),
            ),
        }
    }
}

impl<T> fmt::Debug for LinkDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let composites: BTreeMap<&str, &str> = self
            .composites
            .iter()
            .map(|(key, link)| (key.as_str(), link.nested.type_name()))
            .collect();
        f.debug_struct("LinkDescriptor")
            .field("type", &type_name::<T>())
            .field("mode", &self.mode)
            .field("scalars", &self.scalars.keys().collect::<Vec<_>>())
            .field("composites", &composites)
            .finish()
    }
}
