//! Compiles a [`DataShape`] into a [`LinkDescriptor`].

use std::any::type_name;
use std::collections::BTreeMap;
use std::sync::Arc;

use itemnbt_codec::TypeKey;
use tracing::debug;

use crate::descriptor::{CompositeLink, ErasedLink, LinkDescriptor};
use crate::error::{LinkError, LinkResult};
use crate::linker::Linker;
use crate::shape::{DataShape, FieldRef, LinkMode, Visibility};

/// Builds link descriptors against a [`Linker`]'s codec registry.
///
/// Nested types of composite fields are resolved through the linker, so they
/// share its cache. Most callers go through [`Linker::descriptor`] instead of
/// using the builder directly.
pub struct LinkBuilder<'a> {
    linker: &'a Linker,
    /// Types whose descriptors are currently being built, outermost first.
    stack: Vec<TypeKey>,
}

impl<'a> LinkBuilder<'a> {
    pub fn new(linker: &'a Linker) -> Self {
        Self::with_stack(linker, Vec::new())
    }

    pub(crate) fn with_stack(linker: &'a Linker, stack: Vec<TypeKey>) -> Self {
        Self { linker, stack }
    }

    pub(crate) fn into_stack(self) -> Vec<TypeKey> {
        self.stack
    }

    /// Compile `shape` into a descriptor.
    ///
    /// # Errors
    ///
    /// - `NoUsableConstructor` if the shape has no factory.
    /// - `InvalidArgument` for a blank key.
    /// - `UnsupportedType` for a scalar without a codec, or an automatic
    ///   field that is neither registered nor nested.
    /// - `DuplicateKey` / `KeyCollision` for conflicting keys.
    /// - `CyclicComposite` if a nested type contains `T` again.
    pub fn build<T: 'static>(&mut self, shape: DataShape<T>) -> LinkResult<LinkDescriptor<T>> {
        let key = TypeKey::of::<T>();
        if self.stack.contains(&key) {
            let mut chain: Vec<&'static str> = self.stack.iter().map(TypeKey::name).collect();
            chain.push(key.name());
            return Err(LinkError::CyclicComposite { chain });
        }

        self.stack.push(key);
        let built = self.compile(shape);
        self.stack.pop();
        built
    }

    fn compile<T: 'static>(&mut self, shape: DataShape<T>) -> LinkResult<LinkDescriptor<T>> {
        let type_name = type_name::<T>();
        let factory = shape
            .factory
            .ok_or(LinkError::NoUsableConstructor { type_name })?;

        let mut scalars: BTreeMap<String, FieldRef<T>> = BTreeMap::new();
        let mut composites: BTreeMap<String, CompositeLink<T>> = BTreeMap::new();

        for field in shape.fields {
            if field.visibility == Visibility::Private {
                debug!(type_name, field = field.name, "skipping private field");
                continue;
            }

            match shape.mode {
                LinkMode::Automatic => {
                    let key = field.name.to_string();
                    if self.linker.codecs().contains_type(field.value_type()) {
                        insert_scalar(&mut scalars, key, field, type_name)?;
                    } else {
                        let nested = self.resolve(&field)?;
                        insert_composite(&mut composites, key, field, nested, type_name)?;
                    }
                }
                LinkMode::Manual => {
                    if let Some(key) = field.scalar_key.clone() {
                        if !self.linker.codecs().contains_type(field.value_type()) {
                            return Err(LinkError::UnsupportedType {
                                field: field.name,
                                type_name: field.value_type().name(),
                            });
                        }
                        insert_scalar(&mut scalars, key, field.clone(), type_name)?;
                    }
                    if let Some(key) = field.composite_key.clone() {
                        let nested = self.resolve(&field)?;
                        insert_composite(&mut composites, key, field, nested, type_name)?;
                    }
                }
            }
        }

        if let Some(key) = scalars.keys().find(|key| composites.contains_key(*key)) {
            return Err(LinkError::KeyCollision {
                key: key.clone(),
                type_name,
            });
        }

        debug!(
            type_name,
            mode = %shape.mode,
            scalars = scalars.len(),
            composites = composites.len(),
            "built link descriptor"
        );

        Ok(LinkDescriptor {
            mode: shape.mode,
            factory,
            scalars,
            composites,
            codecs: Arc::clone(self.linker.codecs()),
        })
    }

    fn resolve<T>(&mut self, field: &FieldRef<T>) -> LinkResult<Arc<dyn ErasedLink>> {
        let resolver = field.nested.ok_or(LinkError::UnsupportedType {
            field: field.name,
            type_name: field.value_type().name(),
        })?;
        resolver(self.linker, &mut self.stack)
    }
}

fn checked_key(key: String, field: &'static str, type_name: &'static str) -> LinkResult<String> {
    if key.trim().is_empty() {
        return Err(LinkError::InvalidArgument(format!(
            "blank key for field `{field}` of {type_name}"
        )));
    }
    Ok(key)
}

fn insert_scalar<T>(
    scalars: &mut BTreeMap<String, FieldRef<T>>,
    key: String,
    field: FieldRef<T>,
    type_name: &'static str,
) -> LinkResult<()> {
    let key = checked_key(key, field.name, type_name)?;
    if scalars.contains_key(&key) {
        return Err(LinkError::DuplicateKey { key, type_name });
    }
    scalars.insert(key, field);
    Ok(())
}

fn insert_composite<T>(
    composites: &mut BTreeMap<String, CompositeLink<T>>,
    key: String,
    field: FieldRef<T>,
    nested: Arc<dyn ErasedLink>,
    type_name: &'static str,
) -> LinkResult<()> {
    let key = checked_key(key, field.name, type_name)?;
    if composites.contains_key(&key) {
        return Err(LinkError::DuplicateKey { key, type_name });
    }
    composites.insert(key, CompositeLink { field, nested });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field;
    use crate::report::{FieldFailureReason, LinkDirection};
    use crate::shape::{Field, Linked};
    use itemnbt_codec::CodecRegistry;
    use itemnbt_tree::{Compound, Tag, TagKind, TreeNode};
    use proptest::prelude::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Stats {
        kills: i32,
        ratio: f64,
    }

    impl Linked for Stats {
        fn shape() -> DataShape<Self> {
            DataShape::automatic()
                .with_default_factory()
                .field(field!(Stats, kills))
                .field(field!(Stats, ratio))
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Profile {
        name: String,
        level: i16,
        stats: Stats,
        title: Option<String>,
        motto: Option<String>,
        secret: i64,
    }

    impl Linked for Profile {
        fn shape() -> DataShape<Self> {
            DataShape::automatic()
                .factory(|| Profile {
                    level: 1,
                    title: Some("novice".into()),
                    motto: Some("onward".into()),
                    ..Profile::default()
                })
                .field(field!(Profile, name))
                .field(field!(Profile, level))
                .field(field!(Profile, stats).nested())
                .field(field!(Profile, title?))
                .field(field!(Profile, motto!))
                .field(field!(Profile, secret).private())
        }
    }

    /// Fields linked only under explicit keys; `note` carries none.
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Badge {
        label: String,
        tier: i32,
        note: String,
        stats: Stats,
    }

    impl Linked for Badge {
        fn shape() -> DataShape<Self> {
            DataShape::manual()
                .with_default_factory()
                .field(field!(Badge, label).scalar("badge_label"))
                .field(field!(Badge, tier).scalar("tier"))
                .field(field!(Badge, note))
                .field(field!(Badge, stats).composite("s"))
        }
    }

    #[derive(Debug, Default)]
    struct Plain {
        count: u64,
        name: String,
    }

    fn linker() -> Linker {
        Linker::new(Arc::new(CodecRegistry::with_defaults()))
    }

    #[test]
    fn automatic_mode_classifies_by_registry() {
        let linker = linker();
        let descriptor = linker.descriptor::<Profile>().unwrap();
        assert_eq!(descriptor.mode(), LinkMode::Automatic);
        assert_eq!(
            descriptor.scalar_keys(),
            vec!["level", "motto", "name", "title"]
        );
        assert_eq!(descriptor.composite_keys(), vec!["stats"]);
        assert!(!descriptor.is_scalar("secret"));
        assert!(descriptor.is_composite("stats"));
    }

    #[test]
    fn manual_mode_uses_declared_keys_only() {
        let linker = linker();
        let descriptor = linker.descriptor::<Badge>().unwrap();
        assert_eq!(descriptor.mode(), LinkMode::Manual);
        assert_eq!(descriptor.scalar_keys(), vec!["badge_label", "tier"]);
        assert_eq!(descriptor.composite_keys(), vec!["s"]);
        assert!(!descriptor.is_scalar("note"));
        assert!(!descriptor.is_scalar("label"));
    }

    #[test]
    fn missing_factory_is_no_usable_constructor() {
        let shape = DataShape::<Plain>::automatic().field(field!(Plain, name));
        let err = linker().build_shape(shape).unwrap_err();
        assert!(matches!(err, LinkError::NoUsableConstructor { .. }));
    }

    #[test]
    fn unregistered_automatic_field_is_unsupported() {
        let shape = DataShape::<Plain>::automatic()
            .with_default_factory()
            .field(field!(Plain, count))
            .field(field!(Plain, name));
        let err = linker().build_shape(shape).unwrap_err();
        assert_eq!(
            err,
            LinkError::UnsupportedType {
                field: "count",
                type_name: "u64",
            }
        );
    }

    #[test]
    fn unregistered_manual_scalar_is_unsupported() {
        let shape = DataShape::<Plain>::manual()
            .with_default_factory()
            .field(field!(Plain, count).scalar("count"));
        assert!(matches!(
            linker().build_shape(shape),
            Err(LinkError::UnsupportedType { field: "count", .. })
        ));
    }

    #[test]
    fn private_fields_are_skipped_in_both_modes() {
        let linker = linker();
        let automatic = DataShape::<Plain>::automatic()
            .with_default_factory()
            .field(field!(Plain, count).private())
            .field(field!(Plain, name));
        let descriptor = linker.build_shape(automatic).unwrap();
        assert_eq!(descriptor.scalar_keys(), vec!["name"]);

        let manual = DataShape::<Plain>::manual()
            .with_default_factory()
            .field(field!(Plain, name).scalar("n").private());
        let descriptor = linker.build_shape(manual).unwrap();
        assert!(descriptor.scalar_keys().is_empty());
    }

    #[test]
    fn blank_key_is_invalid_argument() {
        let shape = DataShape::<Plain>::manual()
            .with_default_factory()
            .field(field!(Plain, name).scalar("  "));
        assert!(matches!(
            linker().build_shape(shape),
            Err(LinkError::InvalidArgument(_))
        ));
    }

    #[test]
    fn duplicate_scalar_key_is_rejected() {
        let shape = DataShape::<Badge>::manual()
            .with_default_factory()
            .field(field!(Badge, label).scalar("x"))
            .field(field!(Badge, note).scalar("x"));
        assert_eq!(
            linker().build_shape(shape).unwrap_err(),
            LinkError::DuplicateKey {
                key: "x".into(),
                type_name: type_name::<Badge>(),
            }
        );
    }

    #[test]
    fn key_in_both_maps_is_a_collision() {
        let shape = DataShape::<Badge>::manual()
            .with_default_factory()
            .field(field!(Badge, label).scalar("x"))
            .field(field!(Badge, stats).composite("x"));
        assert!(matches!(
            linker().build_shape(shape),
            Err(LinkError::KeyCollision { key, .. }) if key == "x"
        ));
    }

    #[test]
    fn forward_link_fills_fields_and_reports_missing_keys() {
        let linker = linker();
        let descriptor = linker.descriptor::<Profile>().unwrap();
        let tree = Compound::new()
            .with("name", "steve")
            .with("level", 7i16)
            .with("secret", 99i64)
            .with("stats", Compound::new().with("kills", 3).with("ratio", 0.5));

        let (profile, report) = descriptor.read(&tree);
        assert_eq!(profile.name, "steve");
        assert_eq!(profile.level, 7);
        assert_eq!(profile.stats, Stats { kills: 3, ratio: 0.5 });
        assert_eq!(profile.secret, 0);
        assert_eq!(profile.title, None);
        assert_eq!(profile.motto.as_deref(), Some("onward"));
        assert_eq!(report.failed_keys(), vec!["motto"]);
        assert_eq!(report.failures()[0].reason, FieldFailureReason::MissingKey);
    }

    #[test]
    fn backward_link_removes_absent_optional_key() {
        let linker = linker();
        let descriptor = linker.descriptor::<Profile>().unwrap();
        let profile = Profile {
            name: "alex".into(),
            motto: Some("carry on".into()),
            secret: 5,
            ..Profile::default()
        };
        let mut tree = Compound::new().with("title", "stale");
        let report = descriptor.backward_link(&mut tree, &profile);

        assert_eq!(tree.get("name"), Some(&Tag::String("alex".into())));
        assert_eq!(tree.get("level"), Some(&Tag::Short(0)));
        assert!(!tree.contains_key("title"));
        assert!(!tree.contains_key("secret"));
        assert!(report.is_complete());
    }

    #[test]
    fn backward_link_reports_absent_required_value() {
        let linker = linker();
        let descriptor = linker.descriptor::<Profile>().unwrap();
        let profile = Profile {
            title: Some("sage".into()),
            ..Profile::default()
        };
        let mut tree = Compound::new().with("motto", "old");
        let report = descriptor.backward_link(&mut tree, &profile);

        assert_eq!(tree.get("title"), Some(&Tag::String("sage".into())));
        assert_eq!(tree.get("motto"), Some(&Tag::String("old".into())));
        assert_eq!(report.failed_keys(), vec!["motto"]);
        assert_eq!(report.failures()[0].reason, FieldFailureReason::NullValue);
        assert_eq!(report.failures()[0].direction, LinkDirection::Backward);
    }

    #[test]
    fn absent_optional_survives_round_trip_over_some_default() {
        let linker = linker();
        let descriptor = linker.descriptor::<Profile>().unwrap();
        let original = Profile {
            title: None,
            motto: Some("quiet".into()),
            ..descriptor.create()
        };
        let (tree, report) = descriptor.write_new(&original);
        assert!(report.is_complete());

        let (copy, report) = descriptor.read(&tree);
        assert!(report.is_complete());
        assert_eq!(copy.title, None);
        assert_eq!(copy, original);
    }

    #[test]
    fn one_bad_field_does_not_stop_the_others() {
        let linker = linker();
        let descriptor = linker.descriptor::<Badge>().unwrap();
        let tree = Compound::new()
            .with("badge_label", "gold")
            .with("tier", "high")
            .with("s", Compound::new().with("kills", 2).with("ratio", "bad"));

        let mut badge = Badge {
            tier: 4,
            ..Badge::default()
        };
        let report = descriptor.forward_link(&tree, &mut badge);

        assert_eq!(badge.label, "gold");
        assert_eq!(badge.tier, 4);
        assert_eq!(badge.stats.kills, 2);
        assert_eq!(report.failed_keys(), vec!["tier", "s.ratio"]);
    }

    #[test]
    fn composite_key_holding_a_scalar_is_not_a_compound() {
        let linker = linker();
        let descriptor = linker.descriptor::<Badge>().unwrap();
        let tree = Compound::new().with("s", 1i32);
        let (badge, report) = descriptor.read(&tree);
        assert_eq!(badge.stats, Stats::default());
        let failure = report
            .failures()
            .iter()
            .find(|f| f.key == "s")
            .unwrap();
        assert_eq!(failure.reason, FieldFailureReason::NotACompound(TagKind::Int));
    }

    #[test]
    fn unreadable_and_unwritable_fields_are_access_denied() {
        let shape = DataShape::<Plain>::manual()
            .with_default_factory()
            .field(Field::<Plain, String>::read_only("name", |p| &p.name).scalar("name"));
        let linker = linker();
        let descriptor = linker.build_shape(shape).unwrap();

        let plain = Plain {
            count: 0,
            name: "kept".into(),
        };
        let (tree, report) = descriptor.write_new(&plain);
        assert!(report.is_complete());
        assert_eq!(tree.get("name"), Some(&Tag::String("kept".into())));

        let (copy, report) = descriptor.read(&tree);
        assert_eq!(copy.name, "");
        assert_eq!(report.failures()[0].reason, FieldFailureReason::AccessDenied);

        let shape = DataShape::<Plain>::manual()
            .with_default_factory()
            .field(Field::<Plain, String>::write_only("name", |p| &mut p.name).scalar("name"));
        let descriptor = linker.build_shape(shape).unwrap();
        let (_, report) = descriptor.write_new(&plain);
        assert_eq!(report.failures()[0].reason, FieldFailureReason::AccessDenied);
    }

    #[test]
    fn backward_link_overwrites_only_mapped_keys() {
        let linker = linker();
        let descriptor = linker.descriptor::<Badge>().unwrap();
        let mut tree = Compound::new().with("tier", 1).with("foreign", "stay");
        let badge = Badge {
            tier: 9,
            ..Badge::default()
        };
        descriptor.backward_link(&mut tree, &badge);
        assert_eq!(tree.get("tier"), Some(&Tag::Int(9)));
        assert_eq!(tree.get("foreign"), Some(&Tag::String("stay".into())));
        assert!(!tree.contains_key("note"));
    }

    proptest! {
        #[test]
        fn backward_then_forward_restores_fields(
            name in ".{0,16}",
            level in any::<i16>(),
            kills in any::<i32>(),
            ratio in -1.0e6f64..1.0e6,
            title in proptest::option::of("[a-z]{1,8}"),
            motto in "[a-z ]{0,12}",
        ) {
            let linker = linker();
            let descriptor = linker.descriptor::<Profile>().unwrap();
            let original = Profile {
                name,
                level,
                stats: Stats { kills, ratio },
                title,
                motto: Some(motto),
                secret: 0,
            };
            let (tree, written) = descriptor.write_new(&original);
            let (copy, read) = descriptor.read(&tree);
            prop_assert!(written.is_complete());
            prop_assert!(read.is_complete());
            prop_assert_eq!(copy, original);
        }
    }
}
