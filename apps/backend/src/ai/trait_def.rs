//! Decision provider trait definition.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::participant::AiModel;
use crate::domain::rules::GameRules;
use crate::domain::snapshot::{GroupSnapshot, ParticipantSnapshot};
use crate::domain::state::GroupId;

/// Errors a provider can report for one decision attempt.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// The provider asked us to slow down. The only retried variant.
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    /// No client is configured for this provider or model.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("request failed: {0}")]
    Request(String),
    /// The provider answered, but not with a usable order quantity.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Everything a provider may look at when choosing an order.
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    pub group_id: GroupId,
    pub model: AiModel,
    pub participant: ParticipantSnapshot,
    pub group: GroupSnapshot,
    pub rules: GameRules,
}

/// Resolves the upstream order quantity for a non-human participant.
///
/// Implementations perform exactly one attempt per call; retry and fallback
/// live in [`DecisionResolver`](super::DecisionResolver).
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn decide(&self, request: &DecisionRequest) -> Result<u32, DecisionError>;
}
