//! Explicit three-state lifecycle for components with `init` / `destroy`.

use crate::error::{RenderError, RenderResult};

/// Lifecycle slot holding a component's live state.
///
/// Every public operation on an adaptor goes through [`Lifecycle::get`] or
/// [`Lifecycle::get_mut`], so use before `init` or after `destroy` fails
/// immediately instead of touching stale state.
#[derive(Debug, Default)]
pub enum Lifecycle<T> {
    #[default]
    Uninitialized,
    Active(T),
    Destroyed,
}

impl<T> Lifecycle<T> {
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active(_))
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self, Lifecycle::Destroyed)
    }

    /// Borrow the live state, naming `component` in the error otherwise.
    pub fn get(&self, component: &'static str) -> RenderResult<&T> {
        match self {
            Lifecycle::Active(value) => Ok(value),
            Lifecycle::Uninitialized => Err(RenderError::NotInitialized(component)),
            Lifecycle::Destroyed => Err(RenderError::AdaptorDestroyed(component)),
        }
    }

    pub fn get_mut(&mut self, component: &'static str) -> RenderResult<&mut T> {
        match self {
            Lifecycle::Active(value) => Ok(value),
            Lifecycle::Uninitialized => Err(RenderError::NotInitialized(component)),
            Lifecycle::Destroyed => Err(RenderError::AdaptorDestroyed(component)),
        }
    }

    /// Install live state, returning the previous state if it was active.
    pub fn activate(&mut self, value: T) -> Option<T> {
        match std::mem::replace(self, Lifecycle::Active(value)) {
            Lifecycle::Active(previous) => Some(previous),
            _ => None,
        }
    }

    /// Move to `Destroyed`, handing back the live state for teardown.
    pub fn destroy(&mut self) -> Option<T> {
        match std::mem::replace(self, Lifecycle::Destroyed) {
            Lifecycle::Active(value) => Some(value),
            _ => None,
        }
    }
}
