//! Class maps: how a record's labels become the properties of a Rust type.
//!
//! Rust has no runtime reflection, so a target type describes itself by
//! implementing [`Mappable`]. Its [`Mappable::configure`] declares a
//! constructor and, in order, one entry per property: a name, a setter
//! closure, and optionally a label and a converter.
//!
//! ```rust
//! use ltsv_helper::{ClassMapBuilder, LtsvReader, Mappable};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! impl Mappable for Person {
//!     fn configure(map: &mut ClassMapBuilder<Self>) {
//!         map.default_constructor();
//!         map.property("name", |p: &mut Person, v: String| p.name = v);
//!         map.property("age", |p: &mut Person, v: i32| p.age = v);
//!     }
//! }
//!
//! let mut reader = LtsvReader::from_str("name:Alice\tage:30\n");
//! reader.read().unwrap();
//! let person: Person = reader.get_record().unwrap();
//! assert_eq!(person, Person { name: "Alice".to_string(), age: 30 });
//! ```
//!
//! The label of each property defaults to its name passed through the
//! configured [`LabelConvention`]; an explicit `.label(..)` always wins. The
//! converter defaults to the registry entry for the setter's value kind.

use crate::convert::{FieldSource, TypeConverter, TypeConverterCache};
use crate::value::{FieldValue, Value, ValueKind};
use crate::{Error, Result};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A type that records can be mapped into.
pub trait Mappable: Sized + 'static {
    /// Declares the constructor and the properties of `Self`.
    fn configure(map: &mut ClassMapBuilder<Self>);
}

/// How a property name turns into a label when no explicit label is given.
///
/// # Examples
///
/// ```rust
/// use ltsv_helper::LabelConvention;
///
/// assert_eq!(LabelConvention::AsIs.apply("UserAgent"), "UserAgent");
/// assert_eq!(LabelConvention::Lowercase.apply("UserAgent"), "useragent");
/// assert_eq!(LabelConvention::SnakeCase.apply("UserAgent"), "user_agent");
/// assert_eq!(LabelConvention::CamelCase.apply("user_agent"), "userAgent");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LabelConvention {
    #[default]
    AsIs,
    Lowercase,
    SnakeCase,
    CamelCase,
}

impl LabelConvention {
    #[must_use]
    pub fn apply(&self, name: &str) -> String {
        match self {
            LabelConvention::AsIs => name.to_string(),
            LabelConvention::Lowercase => name.to_lowercase(),
            LabelConvention::SnakeCase => to_snake_case(name),
            LabelConvention::CamelCase => to_camel_case(name),
        }
    }
}

fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch == '-' || ch == ' ' {
            out.push('_');
            continue;
        }
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
            {
                out.push('_');
            }
        }
        out.extend(ch.to_lowercase());
    }
    out
}

fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, part) in name
        .split(['_', '-', ' '])
        .filter(|p| !p.is_empty())
        .enumerate()
    {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

/// What a converter knows about the property it is filling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyInfo {
    name: String,
    label: String,
    kind: ValueKind,
}

impl PropertyInfo {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: ValueKind) -> Self {
        PropertyInfo {
            name: name.into(),
            label: label.into(),
            kind,
        }
    }

    /// The property name as declared in [`Mappable::configure`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The record label the property reads from.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The declared value kind of the property.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

type Setter<T> = Box<dyn Fn(&mut T, Value) -> bool + Send + Sync>;
type Constructor<T> = Box<dyn Fn() -> T + Send + Sync>;

/// One property binding: label, converter and setter.
pub struct PropertyMap<T> {
    info: PropertyInfo,
    converter: Arc<dyn TypeConverter>,
    setter: Setter<T>,
}

impl<T> PropertyMap<T> {
    #[must_use]
    pub fn info(&self) -> &PropertyInfo {
        &self.info
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.info.label()
    }

    #[must_use]
    pub fn converter(&self) -> &Arc<dyn TypeConverter> {
        &self.converter
    }

    /// Converts `raw` and assigns it into `target`.
    ///
    /// # Errors
    ///
    /// Fails when the converter fails, or when it produced a value the
    /// property cannot hold.
    pub fn apply(&self, target: &mut T, raw: &str, reader: &dyn FieldSource) -> Result<()> {
        let value = self
            .converter
            .convert_from_string(Some(raw), reader, &self.info)?;
        if (self.setter)(target, value) {
            Ok(())
        } else {
            Err(Error::conversion(
                self.info.label(),
                self.info.kind(),
                Some(raw),
            ))
        }
    }
}

impl<T> fmt::Debug for PropertyMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMap")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// The immutable, built mapping for one target type.
pub struct ClassMap<T> {
    type_name: &'static str,
    constructor: Constructor<T>,
    property_maps: Vec<PropertyMap<T>>,
}

impl<T> ClassMap<T> {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Property maps in declaration order.
    #[must_use]
    pub fn property_maps(&self) -> &[PropertyMap<T>] {
        &self.property_maps
    }

    /// Finds a property map by property name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyMap<T>> {
        self.property_maps.iter().find(|p| p.info.name() == name)
    }

    /// Creates a fresh instance through the declared constructor.
    #[must_use]
    pub fn construct(&self) -> T {
        (self.constructor)()
    }

    /// Builds a new instance from the current record of `source`.
    ///
    /// Properties whose label is absent keep the constructor's value.
    ///
    /// # Errors
    ///
    /// Fails when `source` has no current record or a conversion fails.
    pub fn map_record(&self, source: &dyn FieldSource) -> Result<T> {
        let record = source
            .current_record()
            .ok_or_else(|| Error::state("the reader has no current record"))?;
        let mut target = self.construct();
        for property in &self.property_maps {
            if let Some(raw) = record.get(property.label()) {
                property.apply(&mut target, raw, source)?;
            }
        }
        Ok(target)
    }
}

impl<T> fmt::Debug for ClassMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMap")
            .field("type_name", &self.type_name)
            .field("property_maps", &self.property_maps)
            .finish_non_exhaustive()
    }
}

struct PropertyDecl<T> {
    name: String,
    label: Option<String>,
    kind: ValueKind,
    converter: Option<Arc<dyn TypeConverter>>,
    setter: Setter<T>,
}

/// An explicit per-property override held by the configuration.
#[derive(Clone)]
pub(crate) struct PropertyOverride {
    pub(crate) property: String,
    pub(crate) label: Option<String>,
    pub(crate) converter: Option<Arc<dyn TypeConverter>>,
}

/// Collects the declarations of a [`Mappable`] type.
pub struct ClassMapBuilder<T> {
    constructor: Option<Constructor<T>>,
    properties: Vec<PropertyDecl<T>>,
}

/// Refines the property just declared with [`ClassMapBuilder::property`].
pub struct PropertyBuilder<'a, T> {
    decl: &'a mut PropertyDecl<T>,
}

impl<'a, T> PropertyBuilder<'a, T> {
    /// Reads the property from `label` instead of the conventional label.
    pub fn label(self, label: &str) -> Self {
        self.decl.label = Some(label.to_string());
        self
    }

    /// Uses `converter` instead of the registry's converter for this kind.
    pub fn converter(self, converter: Arc<dyn TypeConverter>) -> Self {
        self.decl.converter = Some(converter);
        self
    }
}

impl<T: 'static> ClassMapBuilder<T> {
    #[must_use]
    pub fn new() -> Self {
        ClassMapBuilder {
            constructor: None,
            properties: Vec::new(),
        }
    }

    /// Declares the zero-argument constructor.
    pub fn constructor(&mut self, constructor: impl Fn() -> T + Send + Sync + 'static) -> &mut Self {
        self.constructor = Some(Box::new(constructor));
        self
    }

    /// Uses [`Default::default`] as the constructor.
    pub fn default_constructor(&mut self) -> &mut Self
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    /// Declares a property whose value kind comes from the setter's argument type.
    pub fn property<V>(
        &mut self,
        name: &str,
        setter: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> PropertyBuilder<'_, T>
    where
        V: FieldValue + 'static,
    {
        let index = self.properties.len();
        self.properties.push(PropertyDecl {
            name: name.to_string(),
            label: None,
            kind: V::kind(),
            converter: None,
            setter: Box::new(move |target, value| match V::from_value(value) {
                Some(v) => {
                    setter(target, v);
                    true
                }
                None => false,
            }),
        });
        PropertyBuilder {
            decl: &mut self.properties[index],
        }
    }

    /// Resolves labels and converters and freezes the map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when no constructor was declared, a
    /// property name repeats, a label is unusable, or an override names a
    /// property that does not exist.
    pub(crate) fn build(
        self,
        convention: LabelConvention,
        overrides: &[PropertyOverride],
        converters: &TypeConverterCache,
    ) -> Result<ClassMap<T>> {
        let type_name = std::any::type_name::<T>();
        let constructor = self.constructor.ok_or_else(|| {
            Error::configuration(type_name, "no zero-argument constructor declared")
        })?;

        let mut properties = self.properties;
        let mut seen = HashSet::new();
        for decl in &properties {
            if !seen.insert(decl.name.as_str()) {
                return Err(Error::configuration(
                    type_name,
                    &format!("property '{}' is declared twice", decl.name),
                ));
            }
        }

        for o in overrides {
            let decl = properties
                .iter_mut()
                .find(|d| d.name == o.property)
                .ok_or_else(|| {
                    Error::configuration(
                        type_name,
                        &format!("override references unknown property '{}'", o.property),
                    )
                })?;
            if let Some(label) = &o.label {
                decl.label = Some(label.clone());
            }
            if let Some(converter) = &o.converter {
                decl.converter = Some(Arc::clone(converter));
            }
        }

        let mut property_maps = Vec::with_capacity(properties.len());
        for decl in properties {
            let label = decl.label.unwrap_or_else(|| convention.apply(&decl.name));
            if label.is_empty() || label.contains([':', '\t', '\n', '\r']) {
                return Err(Error::configuration(
                    type_name,
                    &format!("property '{}' has unusable label {:?}", decl.name, label),
                ));
            }
            let converter = decl
                .converter
                .unwrap_or_else(|| converters.get_converter(decl.kind));
            property_maps.push(PropertyMap {
                info: PropertyInfo::new(decl.name, label, decl.kind),
                converter,
                setter: decl.setter,
            });
        }

        debug!(type_name, properties = property_maps.len(), "built class map");
        Ok(ClassMap {
            type_name,
            constructor,
            property_maps,
        })
    }
}

impl<T: 'static> Default for ClassMapBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::DefaultTypeConverter;
    use crate::Record;

    #[derive(Default, Debug, PartialEq)]
    struct Hit {
        host: String,
        status: u16,
        size: Option<u64>,
    }

    fn hit_builder() -> ClassMapBuilder<Hit> {
        let mut map = ClassMapBuilder::new();
        map.default_constructor();
        map.property("host", |h: &mut Hit, v: String| h.host = v);
        map.property("status", |h: &mut Hit, v: u16| h.status = v);
        map.property("size", |h: &mut Hit, v: Option<u64>| h.size = v)
            .label("bytes");
        map
    }

    fn build(builder: ClassMapBuilder<Hit>, overrides: &[PropertyOverride]) -> Result<ClassMap<Hit>> {
        builder.build(LabelConvention::AsIs, overrides, &TypeConverterCache::new())
    }

    #[test]
    fn test_declaration_order_and_labels() {
        let map = build(hit_builder(), &[]).unwrap();
        let labels: Vec<_> = map.property_maps().iter().map(|p| p.label()).collect();
        assert_eq!(labels, vec!["host", "status", "bytes"]);
        assert_eq!(map.property("size").unwrap().info().kind(), ValueKind::U64);
    }

    #[test]
    fn test_map_record_skips_missing_labels() {
        let map = build(hit_builder(), &[]).unwrap();
        let record: Record = [("host", "a"), ("bytes", "1,024")].into_iter().collect();
        let hit = map.map_record(&record).unwrap();
        assert_eq!(
            hit,
            Hit {
                host: "a".to_string(),
                status: 0,
                size: Some(1024),
            }
        );
    }

    #[test]
    fn test_missing_constructor() {
        let mut builder = ClassMapBuilder::<Hit>::new();
        builder.property("host", |h: &mut Hit, v: String| h.host = v);
        let err = build(builder, &[]).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("constructor"));
    }

    #[test]
    fn test_duplicate_property() {
        let mut builder = hit_builder();
        builder.property("host", |h: &mut Hit, v: String| h.host = v);
        assert!(build(builder, &[]).is_err());
    }

    #[test]
    fn test_override_unknown_property() {
        let overrides = [PropertyOverride {
            property: "missing".to_string(),
            label: Some("x".to_string()),
            converter: None,
        }];
        let err = build(hit_builder(), &overrides).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_override_wins_over_declared_label() {
        let overrides = [PropertyOverride {
            property: "size".to_string(),
            label: Some("size_bytes".to_string()),
            converter: Some(Arc::new(DefaultTypeConverter)),
        }];
        let map = build(hit_builder(), &overrides).unwrap();
        assert_eq!(map.property("size").unwrap().label(), "size_bytes");

        // The default converter does not accept group separators.
        let record: Record = [("size_bytes", "1,024")].into_iter().collect();
        assert!(map.map_record(&record).is_err());
    }

    #[test]
    fn test_unusable_label() {
        let mut builder = hit_builder();
        builder
            .property("extra", |_: &mut Hit, _: String| {})
            .label("a:b");
        assert!(build(builder, &[]).is_err());
    }

    #[test]
    fn test_value_of_wrong_kind_is_conversion_error() {
        let mut builder = ClassMapBuilder::<Hit>::new();
        builder.default_constructor();
        builder
            .property("status", |h: &mut Hit, v: u16| h.status = v)
            .converter(Arc::new(crate::convert::StringConverter));
        let map = build(builder, &[]).unwrap();
        let record: Record = [("status", "200")].into_iter().collect();
        match map.map_record(&record) {
            Err(Error::Conversion { label, target, .. }) => {
                assert_eq!(label, "status");
                assert_eq!(target, ValueKind::U16);
            }
            other => panic!("Expected conversion error, got {:?}", other),
        }
    }

    #[test]
    fn test_conventions() {
        assert_eq!(to_snake_case("HTTPStatus"), "http_status");
        assert_eq!(to_snake_case("requestTime2"), "request_time2");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_camel_case("request_time"), "requestTime");
        assert_eq!(to_camel_case("Name"), "name");
    }
}
