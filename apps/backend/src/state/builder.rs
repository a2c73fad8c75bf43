use std::sync::Arc;

use tracing::info;

use crate::ai::DecisionResolver;
use crate::config::{GameConfig, ProviderKeys};
use crate::error::AppError;
use crate::services::{GameFlowService, Notifier};
use crate::state::app_state::AppState;
use crate::ws::hub::WsRegistry;
use crate::ws::notifier::WsNotifier;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    config: GameConfig,
    keys: ProviderKeys,
    resolver: Option<DecisionResolver>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            config: GameConfig::default(),
            keys: ProviderKeys::default(),
            resolver: None,
            notifier: None,
        }
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_keys(mut self, keys: ProviderKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Replaces the resolver that would otherwise be built from the keys.
    pub fn with_resolver(mut self, resolver: DecisionResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Replaces the websocket notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn build(self) -> Result<AppState, AppError> {
        let rules = &self.config.rules;
        if rules.max_weeks == 0 {
            return Err(AppError::config("max_weeks must be at least 1"));
        }
        if self.config.max_order_quantity == 0 {
            return Err(AppError::config("max_order_quantity must be at least 1"));
        }

        let resolver = self.resolver.unwrap_or_else(|| {
            DecisionResolver::from_keys(
                &self.keys,
                self.config.ai.clone(),
                rules.starting_throughput,
                self.config.max_order_quantity,
            )
        });
        let registry = Arc::new(WsRegistry::new());
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(WsNotifier::new(Arc::clone(&registry))));

        info!(
            max_weeks = rules.max_weeks,
            starting_inventory = rules.starting_inventory,
            starting_throughput = rules.starting_throughput,
            "game state initialised"
        );
        let flow = GameFlowService::new(self.config, resolver, notifier);
        Ok(AppState::new(flow, registry))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
