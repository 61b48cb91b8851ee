//! Reader configuration: parser options, converters and cached class maps.
//!
//! A [`Configuration`] is assembled once with its `with_*` and `override_*`
//! methods, then wrapped in an [`Arc`] and shared by any number of readers,
//! on any number of threads. Class maps are built lazily the first time a
//! type is read and cached for the lifetime of the configuration.
//!
//! ## Examples
//!
//! ```rust
//! use ltsv_helper::{
//!     ClassMapBuilder, Configuration, LabelConvention, LtsvReader, Mappable,
//! };
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Access {
//!     host: String,
//!     status: u16,
//! }
//!
//! impl Mappable for Access {
//!     fn configure(map: &mut ClassMapBuilder<Self>) {
//!         map.default_constructor();
//!         map.property("Host", |a: &mut Access, v: String| a.host = v);
//!         map.property("Status", |a: &mut Access, v: u16| a.status = v);
//!     }
//! }
//!
//! let mut config = Configuration::new().with_label_convention(LabelConvention::Lowercase);
//! config.override_label::<Access>("Status", "code");
//! let config = Arc::new(config);
//!
//! let mut reader = LtsvReader::with_configuration("host:a\tcode:404\n".as_bytes(), config);
//! reader.read().unwrap();
//! let access: Access = reader.get_record().unwrap();
//! assert_eq!((access.host.as_str(), access.status), ("a", 404));
//! ```

use crate::class_map::{ClassMap, ClassMapBuilder, LabelConvention, Mappable, PropertyOverride};
use crate::convert::{TypeConverter, TypeConverterCache};
use crate::{Error, LtsvOptions, Result, ValueKind};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type CachedMap = Arc<dyn Any + Send + Sync>;
type Configure<T> = Box<dyn Fn(&mut ClassMapBuilder<T>) + Send + Sync>;

/// Session-wide registry shared by readers.
pub struct Configuration {
    options: LtsvOptions,
    label_convention: LabelConvention,
    converters: TypeConverterCache,
    overrides: HashMap<TypeId, Vec<PropertyOverride>>,
    registered: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    class_maps: RwLock<HashMap<TypeId, CachedMap>>,
}

impl Configuration {
    /// Creates a configuration with default options and the built-in converters.
    #[must_use]
    pub fn new() -> Self {
        Configuration {
            options: LtsvOptions::default(),
            label_convention: LabelConvention::default(),
            converters: TypeConverterCache::new(),
            overrides: HashMap::new(),
            registered: HashMap::new(),
            class_maps: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: LtsvOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_label_convention(mut self, convention: LabelConvention) -> Self {
        self.label_convention = convention;
        self.class_maps.get_mut().clear();
        self
    }

    /// Registers `converter` for every property of `kind` without an explicit converter.
    #[must_use]
    pub fn with_converter(mut self, kind: ValueKind, converter: Arc<dyn TypeConverter>) -> Self {
        self.converters.add_converter(kind, converter);
        self.class_maps.get_mut().clear();
        self
    }

    #[must_use]
    pub fn options(&self) -> &LtsvOptions {
        &self.options
    }

    #[must_use]
    pub fn label_convention(&self) -> LabelConvention {
        self.label_convention
    }

    #[must_use]
    pub fn converters(&self) -> &TypeConverterCache {
        &self.converters
    }

    /// Mutable access to the converter registry. Drops every cached class map.
    pub fn converters_mut(&mut self) -> &mut TypeConverterCache {
        self.class_maps.get_mut().clear();
        &mut self.converters
    }

    /// Returns the registry's converter for `kind`.
    #[must_use]
    pub fn get_converter(&self, kind: ValueKind) -> Arc<dyn TypeConverter> {
        self.converters.get_converter(kind)
    }

    /// Reads `property` of `T` from `label`.
    ///
    /// Unknown property names are reported when the class map is built.
    pub fn override_label<T: 'static>(&mut self, property: &str, label: &str) -> &mut Self {
        self.push_override::<T>(PropertyOverride {
            property: property.to_string(),
            label: Some(label.to_string()),
            converter: None,
        })
    }

    /// Converts `property` of `T` with `converter`.
    pub fn override_converter<T: 'static>(
        &mut self,
        property: &str,
        converter: Arc<dyn TypeConverter>,
    ) -> &mut Self {
        self.push_override::<T>(PropertyOverride {
            property: property.to_string(),
            label: None,
            converter: Some(converter),
        })
    }

    fn push_override<T: 'static>(&mut self, o: PropertyOverride) -> &mut Self {
        let id = TypeId::of::<T>();
        self.overrides.entry(id).or_default().push(o);
        self.class_maps.get_mut().remove(&id);
        self
    }

    /// Declares `T`'s properties with `configure` instead of [`Mappable::configure`].
    ///
    /// The map is built right away, so errors surface here. `configure` is
    /// kept and used again whenever the cached map is invalidated, so later
    /// overrides, converter changes and label conventions apply to it as well.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the map cannot be built.
    pub fn register_class_map<T, F>(&mut self, configure: F) -> Result<()>
    where
        T: Mappable,
        F: Fn(&mut ClassMapBuilder<T>) + Send + Sync + 'static,
    {
        let configure: Configure<T> = Box::new(configure);
        let mut builder = ClassMapBuilder::new();
        configure(&mut builder);
        let map = self.build(builder)?;

        let id = TypeId::of::<T>();
        self.registered.insert(id, Arc::new(configure));
        self.class_maps.get_mut().insert(id, Arc::new(map));
        Ok(())
    }

    /// Returns the class map for `T`, building and caching it on first use.
    ///
    /// When two threads race on the first use, both build a map and the first
    /// one published is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `T` cannot be mapped.
    pub fn get_class_map<T: Mappable>(&self) -> Result<Arc<ClassMap<T>>> {
        let id = TypeId::of::<T>();
        if let Some(cached) = self.class_maps.read().get(&id) {
            return downcast(Arc::clone(cached));
        }

        let mut builder = ClassMapBuilder::new();
        match self.registered.get(&id) {
            Some(erased) => {
                let configure = erased.downcast_ref::<Configure<T>>().ok_or_else(|| {
                    Error::configuration(
                        std::any::type_name::<T>(),
                        "registered class map has a different type",
                    )
                })?;
                configure(&mut builder);
            }
            None => T::configure(&mut builder),
        }
        let built: CachedMap = Arc::new(self.build(builder)?);

        let published = Arc::clone(self.class_maps.write().entry(id).or_insert(built));
        downcast(published)
    }

    /// Returns `true` if a class map for `T` is cached.
    #[must_use]
    pub fn has_class_map<T: 'static>(&self) -> bool {
        self.class_maps.read().contains_key(&TypeId::of::<T>())
    }

    fn build<T: 'static>(&self, builder: ClassMapBuilder<T>) -> Result<ClassMap<T>> {
        let overrides = self
            .overrides
            .get(&TypeId::of::<T>())
            .map(Vec::as_slice)
            .unwrap_or_default();
        debug!(type_name = std::any::type_name::<T>(), "building class map");
        builder.build(self.label_convention, overrides, &self.converters)
    }
}

fn downcast<T: 'static>(cached: CachedMap) -> Result<Arc<ClassMap<T>>> {
    cached.downcast::<ClassMap<T>>().map_err(|_| {
        Error::configuration(
            std::any::type_name::<T>(),
            "cached class map has a different type",
        )
    })
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("options", &self.options)
            .field("label_convention", &self.label_convention)
            .field("converters", &self.converters)
            .field("cached_class_maps", &self.class_maps.read().len())
            .finish()
    }
}
