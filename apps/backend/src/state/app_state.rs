use std::sync::Arc;

use crate::ai::DecisionResolver;
use crate::config::GameConfig;
use crate::services::GameFlowService;
use crate::ws::hub::WsRegistry;

/// Application state shared by every worker.
#[derive(Clone)]
pub struct AppState {
    flow: GameFlowService,
    registry: Arc<WsRegistry>,
}

impl AppState {
    pub fn new(flow: GameFlowService, registry: Arc<WsRegistry>) -> Self {
        Self { flow, registry }
    }

    pub fn flow(&self) -> &GameFlowService {
        &self.flow
    }

    pub fn config(&self) -> &GameConfig {
        self.flow.config()
    }

    pub fn resolver(&self) -> &DecisionResolver {
        self.flow.resolver()
    }

    pub fn websocket_registry(&self) -> Arc<WsRegistry> {
        Arc::clone(&self.registry)
    }
}
