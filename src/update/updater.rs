use super::NodeUpdate;
use crate::node::Node;
use tracing::{debug, info};

/// Source of a migration's update list.
pub trait UpdateRules {
    fn updates(&self) -> Vec<NodeUpdate>;
}

impl UpdateRules for Vec<NodeUpdate> {
    fn updates(&self) -> Vec<NodeUpdate> {
        self.clone()
    }
}

/// Runs updates over a base tree.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdater {
    updates: Vec<NodeUpdate>,
    reconcile: bool,
}

impl SettingsUpdater {
    pub fn new(updates: Vec<NodeUpdate>) -> Self {
        Self {
            updates,
            reconcile: false,
        }
    }

    /// Only fills in keys missing from the base, recursively.
    pub fn simple() -> Self {
        Self {
            updates: Vec::new(),
            reconcile: true,
        }
    }

    pub fn from_rules(rules: &impl UpdateRules) -> Self {
        Self::new(rules.updates())
    }

    /// Merges missing keys from the provider before running updates.
    pub fn with_reconcile(mut self, reconcile: bool) -> Self {
        self.reconcile = reconcile;
        self
    }

    pub fn with_update(mut self, update: NodeUpdate) -> Self {
        self.updates.push(update);
        self
    }

    pub fn updates(&self) -> &[NodeUpdate] {
        &self.updates
    }

    pub fn reconciles(&self) -> bool {
        self.reconcile
    }

    /// Brings `base` up to date; returns whether anything changed.
    pub fn update(&self, base: &Node, provider: Option<&Node>) -> bool {
        let mut changed = false;
        if self.reconcile {
            if let Some(provider) = provider {
                if base.deep_merge(provider, false) {
                    debug!("Filled missing keys from provider");
                    changed = true;
                }
            }
        }
        for update in &self.updates {
            let applied = update.apply(base);
            debug!(action = update.action().name(), applied, "Applied update");
            changed |= applied;
        }
        if changed {
            info!(updates = self.updates.len(), "Settings updated");
        }
        changed
    }
}
