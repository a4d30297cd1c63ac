//! Extension registry with live list binding.
//!
//! Backend adaptors and lifecycle plugins register under an
//! [`ExtensionType`]. Consumers bind an [`ExtensionList`] to a type with
//! [`ExtensionRegistry::handle_by_list`]; the list receives every matching
//! extension already registered and stays in sync with later `add` and
//! `remove` calls.
//!
//! ```
//! use strata::extension::{Extension, ExtensionList, ExtensionRegistry, ExtensionType};
//! use strata::FnPlugin;
//!
//! let registry = ExtensionRegistry::new();
//! let plugins = ExtensionList::new();
//! registry.handle_by_list(ExtensionType::Application, &plugins);
//!
//! registry.add(Extension::plugin("hello", || {
//!     Box::new(FnPlugin::new("hello", |_| Ok(())))
//! }));
//! assert_eq!(plugins.names(), vec!["hello".to_string()]);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use strata_render::{
    AdaptorOptions, BackendKind, LegacyGraphicsAdaptor, ModernGraphicsAdaptor, RenderBackend,
    RenderResult, RendererBackendAdaptor,
};

use crate::plugin::ApplicationPlugin;

/// Capability tag an extension registers under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionType {
    LegacyGraphicsAdaptor,
    ModernGraphicsAdaptor,
    Application,
}

impl ExtensionType {
    /// The adaptor tag serving `kind`.
    pub fn adaptor_for(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Legacy => ExtensionType::LegacyGraphicsAdaptor,
            BackendKind::Modern => ExtensionType::ModernGraphicsAdaptor,
        }
    }
}

pub type AdaptorFactory = Arc<
    dyn Fn(&RenderBackend, &AdaptorOptions) -> RenderResult<Box<dyn RendererBackendAdaptor>>
        + Send
        + Sync,
>;
pub type PluginFactory = Arc<dyn Fn() -> Box<dyn ApplicationPlugin> + Send + Sync>;

/// What an extension provides.
#[derive(Clone)]
pub enum ExtensionPayload {
    GraphicsAdaptor(AdaptorFactory),
    ApplicationPlugin(PluginFactory),
}

/// A named registration.
#[derive(Clone)]
pub struct Extension {
    pub name: String,
    pub types: Vec<ExtensionType>,
    pub payload: ExtensionPayload,
}

impl Extension {
    /// A backend adaptor registered under `ty`.
    pub fn adaptor(
        name: impl Into<String>,
        ty: ExtensionType,
        factory: impl Fn(&RenderBackend, &AdaptorOptions) -> RenderResult<Box<dyn RendererBackendAdaptor>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            types: vec![ty],
            payload: ExtensionPayload::GraphicsAdaptor(Arc::new(factory)),
        }
    }

    /// A lifecycle plugin; `factory` runs once per `Application::init`.
    pub fn plugin(
        name: impl Into<String>,
        factory: impl Fn() -> Box<dyn ApplicationPlugin> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            types: vec![ExtensionType::Application],
            payload: ExtensionPayload::ApplicationPlugin(Arc::new(factory)),
        }
    }

    pub fn has_type(&self, ty: ExtensionType) -> bool {
        self.types.contains(&ty)
    }
}

impl std::fmt::Debug for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name)
            .field("types", &self.types)
            .finish_non_exhaustive()
    }
}

/// A shared, live list of extensions. Clones observe the same entries.
#[derive(Clone, Default)]
pub struct ExtensionList {
    entries: Arc<Mutex<Vec<Extension>>>,
}

impl ExtensionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current entries, in registration order.
    pub fn snapshot(&self) -> Vec<Extension> {
        self.entries.lock().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.name.clone()).collect()
    }

    pub fn first(&self) -> Option<Extension> {
        self.entries.lock().first().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn push(&self, extension: Extension) {
        self.entries.lock().push(extension);
    }

    fn remove(&self, name: &str) {
        self.entries.lock().retain(|e| e.name != name);
    }

    fn same_list(&self, other: &ExtensionList) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl std::fmt::Debug for ExtensionList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[derive(Default)]
struct RegistryInner {
    extensions: Vec<Extension>,
    bindings: Vec<(ExtensionType, ExtensionList)>,
}

/// Registry of extensions keyed by [`ExtensionType`].
///
/// Owned by startup code and handed to the application, so tests can build
/// an isolated registry per case.
#[derive(Default)]
pub struct ExtensionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in legacy and modern graphics adaptors.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.add(Extension::adaptor(
            "legacy-graphics-adaptor",
            ExtensionType::LegacyGraphicsAdaptor,
            |backend, options| {
                Ok(Box::new(LegacyGraphicsAdaptor::from_backend(
                    backend,
                    options.max_textures,
                )?))
            },
        ));
        registry.add(Extension::adaptor(
            "modern-graphics-adaptor",
            ExtensionType::ModernGraphicsAdaptor,
            |backend, options| {
                Ok(Box::new(ModernGraphicsAdaptor::from_backend(
                    backend,
                    options.max_textures,
                    options.uniform_batch,
                )?))
            },
        ));
        registry
    }

    /// Register an extension and push it to every bound list of a matching
    /// type. Returns false if the name is already taken.
    pub fn add(&self, extension: Extension) -> bool {
        let mut inner = self.inner.lock();
        if inner.extensions.iter().any(|e| e.name == extension.name) {
            tracing::warn!("Extension '{}' is already registered", extension.name);
            return false;
        }

        for (ty, list) in &inner.bindings {
            if extension.has_type(*ty) {
                list.push(extension.clone());
            }
        }
        tracing::debug!("Registered extension '{}' as {:?}", extension.name, extension.types);
        inner.extensions.push(extension);
        true
    }

    /// Unregister by name, removing it from every bound list.
    pub fn remove(&self, name: &str) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.extensions.len();
        inner.extensions.retain(|e| e.name != name);
        if inner.extensions.len() == before {
            return false;
        }

        for (_, list) in &inner.bindings {
            list.remove(name);
        }
        tracing::debug!("Removed extension '{}'", name);
        true
    }

    /// Keep `list` in sync with every extension of type `ty`, now and later.
    pub fn handle_by_list(&self, ty: ExtensionType, list: &ExtensionList) {
        let mut inner = self.inner.lock();
        if inner
            .bindings
            .iter()
            .any(|(bound, existing)| *bound == ty && existing.same_list(list))
        {
            return;
        }

        for extension in inner.extensions.iter().filter(|e| e.has_type(ty)) {
            list.push(extension.clone());
        }
        inner.bindings.push((ty, list.clone()));
    }

    /// Extensions of type `ty`, in registration order.
    pub fn list(&self, ty: ExtensionType) -> Vec<Extension> {
        self.inner
            .lock()
            .extensions
            .iter()
            .filter(|e| e.has_type(ty))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().extensions.is_empty()
    }
}
