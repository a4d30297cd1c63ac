//! Application lifecycle plugins.
//!
//! Plugins are discovered through the extension registry and initialised in
//! registration order once the renderer exists. They are destroyed in the
//! reverse order, so a plugin can rely on everything registered before it
//! for its whole lifetime.

use crate::application::ApplicationOptions;

/// A component that hooks into application `init` and `destroy`.
///
/// # Example
///
/// ```
/// use strata::{ApplicationOptions, ApplicationPlugin};
///
/// struct Banner;
///
/// impl ApplicationPlugin for Banner {
///     fn name(&self) -> &str {
///         "banner"
///     }
///
///     fn init(&mut self, options: &ApplicationOptions) -> Result<(), String> {
///         println!("{} starting", options.label);
///         Ok(())
///     }
/// }
/// ```
pub trait ApplicationPlugin: Send {
    fn name(&self) -> &str;

    /// Called once after the renderer is created, with the options passed
    /// to `Application::init`.
    fn init(&mut self, options: &ApplicationOptions) -> Result<(), String>;

    /// Called once during `Application::destroy`.
    fn destroy(&mut self) {}
}

type InitFn = Box<dyn FnMut(&ApplicationOptions) -> Result<(), String> + Send>;
type DestroyFn = Box<dyn FnMut() + Send>;

/// A closure-based plugin for simple use cases.
///
/// ```
/// use strata::FnPlugin;
///
/// let plugin = FnPlugin::new("log", |options| {
///     println!("{}x{}", options.width, options.height);
///     Ok(())
/// })
/// .on_destroy(|| println!("bye"));
/// ```
pub struct FnPlugin {
    name: String,
    init_fn: InitFn,
    destroy_fn: Option<DestroyFn>,
}

impl FnPlugin {
    pub fn new(
        name: impl Into<String>,
        init_fn: impl FnMut(&ApplicationOptions) -> Result<(), String> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            init_fn: Box::new(init_fn),
            destroy_fn: None,
        }
    }

    pub fn on_destroy(mut self, destroy_fn: impl FnMut() + Send + 'static) -> Self {
        self.destroy_fn = Some(Box::new(destroy_fn));
        self
    }
}

impl ApplicationPlugin for FnPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, options: &ApplicationOptions) -> Result<(), String> {
        (self.init_fn)(options)
    }

    fn destroy(&mut self) {
        if let Some(destroy_fn) = &mut self.destroy_fn {
            destroy_fn();
        }
    }
}
