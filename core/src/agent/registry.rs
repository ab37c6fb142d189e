use std::sync::Arc;

use anyhow::bail;

use crate::traits::{Tool, ToolId};

/// Fixed set of tools available to the executor. Built once at startup;
/// lookups never allocate.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// The fallback tool must be present; without it the executor has no
    /// last resort for unrecognized selections.
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> anyhow::Result<Self> {
        if !tools.iter().any(|t| t.id() == ToolId::FALLBACK) {
            bail!("tool registry requires the {} tool", ToolId::FALLBACK);
        }
        Ok(Self { tools })
    }

    pub fn get(&self, id: ToolId) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.id() == id)
    }

    pub fn fallback(&self) -> &Arc<dyn Tool> {
        self.get(ToolId::FALLBACK)
            .expect("registry construction guarantees the fallback tool")
    }

    /// The tool for `id`, or the fallback when `id` is not registered.
    pub fn resolve(&self, id: ToolId) -> &Arc<dyn Tool> {
        self.get(id).unwrap_or_else(|| self.fallback())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
