//! Save hooks.
//!
//! A [`SaveHook`] observes saves. `pre_save` runs after the target file is
//! resolved and before anything is written; an error aborts the save.
//! `post_save` runs after the save is committed; its errors are logged and
//! never reach the caller.

use crate::model::{ContentModel, SaveRequest};
use contents_core::Result;
use std::fmt;
use std::sync::Arc;

/// Callback around [`ContentTree::save`](crate::ContentTree::save).
#[allow(clippy::missing_errors_doc)]
pub trait SaveHook: Send + Sync + fmt::Debug {
    /// Called before the content is written.
    fn pre_save(&self, _request: &SaveRequest, _path: &str) -> Result<()> {
        Ok(())
    }

    /// Called with the saved model after commit.
    fn post_save(&self, _model: &ContentModel, _path: &str) -> Result<()> {
        Ok(())
    }
}

/// Ordered list of registered hooks.
#[derive(Debug, Clone, Default)]
pub struct Hooks {
    hooks: Vec<Arc<dyn SaveHook>>,
}

impl Hooks {
    /// Registers a hook. Hooks run in registration order.
    pub fn push(&mut self, hook: Arc<dyn SaveHook>) {
        self.hooks.push(hook);
    }

    /// Returns the number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` if no hook is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every `pre_save` hook, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first hook error.
    pub fn run_pre_save(&self, request: &SaveRequest, path: &str) -> Result<()> {
        for hook in &self.hooks {
            tracing::debug!(path, "Running pre-save hook {hook:?}");
            hook.pre_save(request, path)?;
        }
        Ok(())
    }

    /// Runs every `post_save` hook, logging failures.
    pub fn run_post_save(&self, model: &ContentModel, path: &str) {
        for hook in &self.hooks {
            tracing::debug!(path, "Running post-save hook {hook:?}");
            if let Err(e) = hook.post_save(model, path) {
                tracing::error!(path, "Post-save hook failed: {e}");
            }
        }
    }
}
