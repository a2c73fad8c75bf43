//! Retry and fallback around the raw decision providers.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::http::{HttpDecisionProvider, ProviderApi};
use super::policies::LocalPolicies;
use super::trait_def::{DecisionError, DecisionProvider, DecisionRequest};
use crate::config::{AiTiming, ProviderKeys};
use crate::domain::participant::AiProvider;
use crate::domain::snapshot::ParticipantSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Provider,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub quantity: u32,
    pub source: DecisionSource,
    pub attempts: u32,
}

/// Maps an `AiProvider` tag to its provider and applies the retry policy.
///
/// Always yields a quantity: rate limits are retried up to
/// `timing.max_attempts`, any other failure falls back immediately.
#[derive(Clone)]
pub struct DecisionResolver {
    providers: HashMap<AiProvider, Arc<dyn DecisionProvider>>,
    timing: AiTiming,
    starting_throughput: u32,
    max_order_quantity: u32,
}

impl DecisionResolver {
    /// A resolver with only the local policies registered.
    pub fn new(timing: AiTiming, starting_throughput: u32, max_order_quantity: u32) -> Self {
        let mut providers: HashMap<AiProvider, Arc<dyn DecisionProvider>> = HashMap::new();
        providers.insert(AiProvider::Local, Arc::new(LocalPolicies));
        Self {
            providers,
            timing,
            starting_throughput,
            max_order_quantity,
        }
    }

    /// Local policies plus one HTTP provider per configured key.
    pub fn from_keys(
        keys: &ProviderKeys,
        timing: AiTiming,
        starting_throughput: u32,
        max_order_quantity: u32,
    ) -> Self {
        let timeout = timing.request_timeout;
        let mut resolver = Self::new(timing, starting_throughput, max_order_quantity);
        let hosted = [
            (AiProvider::OpenAi, ProviderApi::OpenAi, &keys.openai),
            (AiProvider::Anthropic, ProviderApi::Anthropic, &keys.anthropic),
            (AiProvider::Gemini, ProviderApi::Gemini, &keys.gemini),
        ];
        for (tag, api, key) in hosted {
            if let Some(key) = key {
                resolver = resolver.with_provider(
                    tag,
                    Arc::new(HttpDecisionProvider::new(api, key.clone(), timeout)),
                );
            } else {
                info!(provider = tag.as_str(), "no api key; decisions will use the fallback order");
            }
        }
        resolver
    }

    pub fn with_provider(mut self, tag: AiProvider, provider: Arc<dyn DecisionProvider>) -> Self {
        self.providers.insert(tag, provider);
        self
    }

    pub fn has_provider(&self, tag: AiProvider) -> bool {
        self.providers.contains_key(&tag)
    }

    pub fn timing(&self) -> &AiTiming {
        &self.timing
    }

    /// Last order received from downstream, or the starting throughput when
    /// none has arrived (a recorded zero counts as none).
    pub fn fallback_quantity(&self, participant: &ParticipantSnapshot) -> u32 {
        match participant.downstream.orders {
            0 => self.starting_throughput,
            n => n,
        }
    }

    pub async fn resolve(&self, request: &DecisionRequest) -> Decision {
        let model = &request.model;
        let Some(provider) = self.providers.get(&model.provider) else {
            warn!(group_id = %request.group_id, model = %model, "no provider registered");
            return self.fallback(request, 0);
        };

        let max_attempts = self.timing.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.attempt(provider.as_ref(), request).await {
                Ok(quantity) => {
                    info!(
                        group_id = %request.group_id,
                        role = %request.participant.role_name,
                        model = %model,
                        attempt,
                        quantity,
                        fallback = false,
                        "ai decision"
                    );
                    return Decision {
                        quantity,
                        source: DecisionSource::Provider,
                        attempts: attempt,
                    };
                }
                Err(DecisionError::RateLimited { retry_after }) => {
                    let wait = retry_after.unwrap_or(self.timing.default_retry_after);
                    warn!(
                        group_id = %request.group_id,
                        model = %model,
                        attempt,
                        max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        "rate limited"
                    );
                    if attempt < max_attempts {
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    return self.fallback(request, attempt);
                }
                Err(err) => {
                    warn!(group_id = %request.group_id, model = %model, attempt, error = %err, "decision failed");
                    return self.fallback(request, attempt);
                }
            }
        }
        self.fallback(request, max_attempts)
    }

    async fn attempt(
        &self,
        provider: &dyn DecisionProvider,
        request: &DecisionRequest,
    ) -> Result<u32, DecisionError> {
        let quantity = tokio::time::timeout(self.timing.request_timeout, provider.decide(request))
            .await
            .map_err(|_| DecisionError::Request(format!("{} timed out", provider.name())))??;
        if quantity > self.max_order_quantity {
            return Err(DecisionError::InvalidResponse(format!(
                "order {quantity} exceeds {}",
                self.max_order_quantity
            )));
        }
        Ok(quantity)
    }

    fn fallback(&self, request: &DecisionRequest, attempts: u32) -> Decision {
        let quantity = self.fallback_quantity(&request.participant);
        info!(
            group_id = %request.group_id,
            role = %request.participant.role_name,
            model = %request.model,
            attempts,
            quantity,
            fallback = true,
            "ai decision"
        );
        Decision {
            quantity,
            source: DecisionSource::Fallback,
            attempts,
        }
    }
}
