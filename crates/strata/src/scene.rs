//! Minimal scene root: containers of already-ordered renderables.

use strata_render::{GraphicsRenderable, PaintContextId};

/// A node holding renderables and child containers.
///
/// Draw order is the container's own renderables, then each child in turn.
#[derive(Debug)]
pub struct Container {
    pub label: String,
    pub visible: bool,
    renderables: Vec<GraphicsRenderable>,
    children: Vec<Container>,
}

impl Container {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            visible: true,
            renderables: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn add_renderable(&mut self, renderable: GraphicsRenderable) -> &mut Self {
        self.renderables.push(renderable);
        self
    }

    /// Append a child and return it for further building.
    pub fn add_child(&mut self, child: Container) -> &mut Container {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn renderables(&self) -> &[GraphicsRenderable] {
        &self.renderables
    }

    pub fn children(&self) -> &[Container] {
        &self.children
    }

    /// Detach and return every child without destroying them.
    pub fn take_children(&mut self) -> Vec<Container> {
        std::mem::take(&mut self.children)
    }

    /// Visible renderables in draw order.
    pub fn collect_renderables<'a>(&'a self, out: &mut Vec<&'a GraphicsRenderable>) {
        if !self.visible {
            return;
        }
        out.extend(self.renderables.iter());
        for child in &self.children {
            child.collect_renderables(out);
        }
    }

    /// Destroy this container's renderables and, with `children`, the whole
    /// subtree. Children not cascaded into are detached and dropped.
    ///
    /// Returns the paint contexts of every destroyed renderable.
    pub fn destroy(&mut self, children: bool) -> Vec<PaintContextId> {
        let mut contexts: Vec<PaintContextId> =
            self.renderables.drain(..).map(|r| r.context).collect();

        for mut child in self.children.drain(..) {
            if children {
                contexts.extend(child.destroy(true));
            }
        }

        contexts.sort_unstable();
        contexts.dedup();
        tracing::trace!(
            "Destroyed container '{}' ({} paint contexts)",
            self.label,
            contexts.len()
        );
        contexts
    }
}
