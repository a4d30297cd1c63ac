//! Strata - a batched 2D renderer
//!
//! This crate is the application shell around [`strata_render`]:
//!
//! - **Extension registry**: backend adaptors and lifecycle plugins register
//!   under a capability tag and are discovered at startup
//! - **Plugins**: initialised in registration order, destroyed in reverse
//! - **Application**: owns the renderer, the stage container and the plugins
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use strata::prelude::*;
//!
//! let registry = Arc::new(ExtensionRegistry::with_defaults());
//! registry.add(Extension::plugin("stats", || {
//!     Box::new(FnPlugin::new("stats", |_| Ok(())))
//! }));
//!
//! let mut app = Application::new(registry);
//! pollster::block_on(app.init(ApplicationOptions::default(), &provider))?;
//! app.render()?;
//! app.destroy(&DestroyOptions::all())?;
//! ```

pub mod application;
pub mod extension;
pub mod plugin;
pub mod scene;

pub use strata_core as core;
pub use strata_render as render;

pub use application::{Application, ApplicationError, ApplicationOptions, DestroyOptions};
pub use extension::{Extension, ExtensionList, ExtensionPayload, ExtensionRegistry, ExtensionType};
pub use plugin::{ApplicationPlugin, FnPlugin};
pub use scene::Container;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::application::{Application, ApplicationError, ApplicationOptions, DestroyOptions};
    pub use crate::extension::{Extension, ExtensionRegistry, ExtensionType};
    pub use crate::plugin::{ApplicationPlugin, FnPlugin};
    pub use crate::scene::Container;

    pub use strata_core::math::{Mat3, Vec2};
    pub use strata_render::{
        BackendPreference, BackendProvider, BlendMode, Color, GraphicsRenderable, PaintContextId,
    };
}
