//! Default restart policy

use plugman_graph::Plugin;

use super::RestartPredicate;
use crate::operation::OperationKind;

/// Requires a restart when loaded code would be replaced or unloaded
///
/// Uninstalling or updating a loaded plugin always needs a restart. Enabling
/// needs one only when `restart_on_enable` is set, for hosts that cannot load
/// plugin code at runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadedCodeRestart {
    pub restart_on_enable: bool,
}

impl LoadedCodeRestart {
    pub fn new(restart_on_enable: bool) -> Self {
        Self { restart_on_enable }
    }
}

impl RestartPredicate for LoadedCodeRestart {
    fn restart_required(&self, operation: OperationKind, changed: &[&Plugin]) -> bool {
        match operation {
            OperationKind::Uninstall | OperationKind::Update => {
                changed.iter().any(|plugin| plugin.is_loaded())
            }
            OperationKind::Enable => {
                self.restart_on_enable && changed.iter().any(|plugin| !plugin.is_loaded())
            }
            OperationKind::Disable | OperationKind::Install => false,
        }
    }
}
