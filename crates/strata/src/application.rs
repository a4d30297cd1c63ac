//! The application shell: owns the renderer, the stage and the plugins.

use std::sync::Arc;

use strata_render::{
    AdaptorOptions, BackendKind, BackendPreference, BackendProvider, BatchRenderStats, Color,
    Lifecycle, RenderError, Renderer, RendererOptions, select_backend,
};

use crate::extension::{ExtensionList, ExtensionPayload, ExtensionRegistry, ExtensionType};
use crate::plugin::ApplicationPlugin;
use crate::scene::Container;

/// Options passed to [`Application::init`] and to every plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationOptions {
    pub width: u32,
    pub height: u32,
    pub resolution: f32,
    pub background: Color,
    pub preference: BackendPreference,
    /// Snap every renderable to whole pixels.
    pub round_pixels: bool,
    pub label: String,
}

impl Default for ApplicationOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            resolution: 1.0,
            background: Color::BLACK,
            preference: BackendPreference::Auto,
            round_pixels: false,
            label: "strata".to_string(),
        }
    }
}

impl ApplicationOptions {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_preference(mut self, preference: BackendPreference) -> Self {
        self.preference = preference;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    fn renderer_options(&self, adaptor: AdaptorOptions) -> RendererOptions {
        RendererOptions {
            width: self.width,
            height: self.height,
            resolution: self.resolution,
            background: self.background,
            round_pixels: self.round_pixels,
            adaptor,
        }
    }
}

/// What [`Application::destroy`] tears down beyond the plugins, stage and
/// renderer themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DestroyOptions {
    /// Detach the render view.
    pub remove_view: bool,
    /// Cascade into child containers.
    pub children: bool,
    /// Evict texture bindings built from the destroyed contexts.
    pub texture: bool,
    /// Same as `texture`; kept separate so callers can express intent.
    pub texture_source: bool,
    /// Drop the destroyed renderables' paint contexts from the renderer.
    pub context: bool,
}

impl DestroyOptions {
    /// Everything on.
    pub fn all() -> Self {
        Self {
            remove_view: true,
            children: true,
            texture: true,
            texture_source: true,
            context: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplicationError {
    NotInitialized,
    AlreadyInitialized,
    Destroyed,
    NoAdaptorRegistered(BackendKind),
    Plugin { name: String, reason: String },
    Render(RenderError),
}

impl std::fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "Application used before init"),
            Self::AlreadyInitialized => write!(f, "Application is already initialised"),
            Self::Destroyed => write!(f, "Application used after destroy"),
            Self::NoAdaptorRegistered(kind) => {
                write!(f, "No graphics adaptor registered for the {} backend", kind)
            }
            Self::Plugin { name, reason } => write!(f, "Plugin '{}' failed: {}", name, reason),
            Self::Render(e) => write!(f, "Render error: {}", e),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderError> for ApplicationError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}

fn active<T>(slot: &Lifecycle<T>) -> Result<&T, ApplicationError> {
    match slot {
        Lifecycle::Active(value) => Ok(value),
        Lifecycle::Uninitialized => Err(ApplicationError::NotInitialized),
        Lifecycle::Destroyed => Err(ApplicationError::Destroyed),
    }
}

fn active_mut<T>(slot: &mut Lifecycle<T>) -> Result<&mut T, ApplicationError> {
    match slot {
        Lifecycle::Active(value) => Ok(value),
        Lifecycle::Uninitialized => Err(ApplicationError::NotInitialized),
        Lifecycle::Destroyed => Err(ApplicationError::Destroyed),
    }
}

/// Owns one renderer, the stage container and every lifecycle plugin.
///
/// # Example
///
/// ```ignore
/// let registry = Arc::new(ExtensionRegistry::with_defaults());
/// let mut app = Application::new(registry);
/// pollster::block_on(app.init(ApplicationOptions::default(), &provider))?;
/// app.stage_mut()?.add_renderable(GraphicsRenderable::new(id));
/// app.render()?;
/// app.destroy(&DestroyOptions::all())?;
/// ```
pub struct Application {
    registry: Arc<ExtensionRegistry>,
    legacy_adaptors: ExtensionList,
    modern_adaptors: ExtensionList,
    plugin_list: ExtensionList,
    plugins: Vec<Box<dyn ApplicationPlugin>>,
    renderer: Lifecycle<Renderer>,
    stage: Lifecycle<Container>,
    options: ApplicationOptions,
}

impl Application {
    /// Bind to the registry's adaptor and plugin lists. Nothing is created
    /// until `init`.
    pub fn new(registry: Arc<ExtensionRegistry>) -> Self {
        let legacy_adaptors = ExtensionList::new();
        let modern_adaptors = ExtensionList::new();
        let plugin_list = ExtensionList::new();
        registry.handle_by_list(ExtensionType::LegacyGraphicsAdaptor, &legacy_adaptors);
        registry.handle_by_list(ExtensionType::ModernGraphicsAdaptor, &modern_adaptors);
        registry.handle_by_list(ExtensionType::Application, &plugin_list);

        Self {
            registry,
            legacy_adaptors,
            modern_adaptors,
            plugin_list,
            plugins: Vec::new(),
            renderer: Lifecycle::Uninitialized,
            stage: Lifecycle::Uninitialized,
            options: ApplicationOptions::default(),
        }
    }

    /// Probe, pick a backend, build the renderer, then initialise every
    /// plugin in registration order.
    pub async fn init(
        &mut self,
        options: ApplicationOptions,
        provider: &impl BackendProvider,
    ) -> Result<(), ApplicationError> {
        match &self.renderer {
            Lifecycle::Active(_) => return Err(ApplicationError::AlreadyInitialized),
            Lifecycle::Destroyed => return Err(ApplicationError::Destroyed),
            Lifecycle::Uninitialized => {}
        }

        let report = provider.probe().await?;
        let kind = select_backend(&report, options.preference)?;
        let backend = provider.connect(kind, &report)?;

        let adaptors = match kind {
            BackendKind::Legacy => &self.legacy_adaptors,
            BackendKind::Modern => &self.modern_adaptors,
        };
        let factory = adaptors
            .snapshot()
            .into_iter()
            .find_map(|extension| match extension.payload {
                ExtensionPayload::GraphicsAdaptor(factory) => Some(factory),
                ExtensionPayload::ApplicationPlugin(_) => None,
            })
            .ok_or(ApplicationError::NoAdaptorRegistered(kind))?;

        let adaptor_options = AdaptorOptions::from_report(&report);
        let adaptor = factory(&backend, &adaptor_options)?;
        let renderer = Renderer::new(adaptor, &options.renderer_options(adaptor_options))?;
        self.renderer.activate(renderer);
        self.stage.activate(Container::new("stage"));
        tracing::info!(
            "Application '{}' initialised on the {} backend",
            options.label,
            kind
        );

        for extension in self.plugin_list.snapshot() {
            let ExtensionPayload::ApplicationPlugin(factory) = extension.payload else {
                continue;
            };
            let mut plugin = factory();
            plugin
                .init(&options)
                .map_err(|reason| ApplicationError::Plugin {
                    name: plugin.name().to_string(),
                    reason,
                })?;
            tracing::debug!("Plugin '{}' initialised", plugin.name());
            self.plugins.push(plugin);
        }

        self.options = options;
        Ok(())
    }

    /// Draw the stage.
    pub fn render(&mut self) -> Result<BatchRenderStats, ApplicationError> {
        let stage = active(&self.stage)?;
        let renderer = active_mut(&mut self.renderer)?;

        let mut renderables = Vec::new();
        stage.collect_renderables(&mut renderables);
        Ok(renderer.render(renderables)?)
    }

    /// Tear down plugins in reverse registration order, then the stage, then
    /// the renderer.
    pub fn destroy(&mut self, options: &DestroyOptions) -> Result<(), ApplicationError> {
        if matches!(self.renderer, Lifecycle::Destroyed) {
            return Err(ApplicationError::Destroyed);
        }

        while let Some(mut plugin) = self.plugins.pop() {
            tracing::debug!("Destroying plugin '{}'", plugin.name());
            plugin.destroy();
        }

        let released = match self.stage.destroy() {
            Some(mut stage) => stage.destroy(options.children),
            None => Vec::new(),
        };

        if let Some(mut renderer) = self.renderer.destroy() {
            // The adaptor is destroyed even if a release fails.
            let mut released_ok = Ok(());
            if options.context {
                let release_textures = options.texture || options.texture_source;
                let live: Vec<_> = released
                    .into_iter()
                    .filter(|id| renderer.paint_contexts().contains(*id))
                    .collect();
                released_ok = live
                    .into_iter()
                    .try_for_each(|id| renderer.release_context(id, release_textures));
            }
            renderer.destroy(options.remove_view)?;
            released_ok?;
        }

        tracing::info!("Application '{}' destroyed", self.options.label);
        Ok(())
    }

    pub fn stage(&self) -> Result<&Container, ApplicationError> {
        active(&self.stage)
    }

    pub fn stage_mut(&mut self) -> Result<&mut Container, ApplicationError> {
        active_mut(&mut self.stage)
    }

    pub fn renderer(&self) -> Result<&Renderer, ApplicationError> {
        active(&self.renderer)
    }

    pub fn renderer_mut(&mut self) -> Result<&mut Renderer, ApplicationError> {
        active_mut(&mut self.renderer)
    }

    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &ApplicationOptions {
        &self.options
    }

    /// Names of the initialised plugins, in initialisation order.
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn is_destroyed(&self) -> bool {
        self.renderer.is_destroyed()
    }
}
