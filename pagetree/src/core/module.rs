//! Module: a group of endpoints registered into an application together.

use pagetree_core::CoreError;

use super::app::Application;

/// Implement to bundle related endpoints: `app.mount(&mut items_module)?`.
pub trait Module {
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError>;
}
