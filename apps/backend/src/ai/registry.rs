//! How to register a local policy
//!
//! 1) Implement `OrderPolicy` for your type in `policies.rs`.
//! 2) Add a `PolicyFactory` entry to the static list with a stable `name`.
//! 3) Keep ordering stable; constructors must be side-effect free.
//!
//! The model catalog below is what the admin surface offers when building
//! teams. Hosted models are listed even when their key is missing; the
//! `available` flag tells the caller whether decisions will reach a model.

use serde::Serialize;

use super::policies::{BaseStock, FixedThroughput, OrderPolicy, PassThrough};
use crate::domain::participant::AiProvider;

/// Factory definition for constructing local policies.
pub struct PolicyFactory {
    pub name: &'static str,
    pub make: fn() -> Box<dyn OrderPolicy>,
}

static POLICY_FACTORIES: &[PolicyFactory] = &[
    PolicyFactory {
        name: PassThrough::NAME,
        make: make_pass_through,
    },
    PolicyFactory {
        name: BaseStock::NAME,
        make: make_base_stock,
    },
    PolicyFactory {
        name: FixedThroughput::NAME,
        make: make_fixed,
    },
];

pub fn registered_policies() -> &'static [PolicyFactory] {
    POLICY_FACTORIES
}

pub fn policy_by_name(name: &str) -> Option<&'static PolicyFactory> {
    registered_policies().iter().find(|factory| factory.name == name)
}

fn make_pass_through() -> Box<dyn OrderPolicy> {
    Box::new(PassThrough)
}

fn make_base_stock() -> Box<dyn OrderPolicy> {
    Box::new(BaseStock::default())
}

fn make_fixed() -> Box<dyn OrderPolicy> {
    Box::new(FixedThroughput)
}

static HOSTED_MODELS: &[(AiProvider, &str)] = &[
    (AiProvider::OpenAi, "gpt-5-mini"),
    (AiProvider::OpenAi, "gpt-5.2"),
    (AiProvider::Anthropic, "claude-sonnet-4-5"),
    (AiProvider::Anthropic, "claude-opus-4-5"),
    (AiProvider::Gemini, "gemini-3-flash-preview"),
    (AiProvider::Gemini, "gemini-3-pro-preview"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub provider: AiProvider,
    pub model: String,
    pub available: bool,
}

/// Every selectable model, hosted first, then local policies.
pub fn model_catalog(is_available: impl Fn(AiProvider) -> bool) -> Vec<CatalogEntry> {
    HOSTED_MODELS
        .iter()
        .map(|&(provider, model)| (provider, model))
        .chain(registered_policies().iter().map(|f| (AiProvider::Local, f.name)))
        .map(|(provider, model)| CatalogEntry {
            provider,
            model: model.to_string(),
            available: is_available(provider),
        })
        .collect()
}

#[cfg(test)]
mod policy_registry_smoke {
    use super::*;

    #[test]
    fn enumerates_registered_policies() {
        let names: Vec<_> = registered_policies().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["pass-through", "base-stock", "fixed"]);
        assert!(policy_by_name("pass-through").is_some());
        assert!(policy_by_name("NotARealPolicy").is_none());
    }

    #[test]
    fn catalog_marks_unavailable_providers() {
        let catalog = model_catalog(|p| p == AiProvider::Local);
        assert!(catalog
            .iter()
            .filter(|e| e.provider == AiProvider::Local)
            .all(|e| e.available));
        assert!(catalog
            .iter()
            .any(|e| e.model == "claude-sonnet-4-5" && !e.available));
    }
}
