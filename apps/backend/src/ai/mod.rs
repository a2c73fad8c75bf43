//! AI participants: decision providers, local policies and the retry
//! wrapper the order collector calls.

mod http;
mod parse;
pub mod policies;
mod prompt;
pub mod registry;
mod resolver;
mod trait_def;

pub use http::{retry_after_hint, HttpDecisionProvider, ProviderApi};
pub use parse::parse_order_quantity;
pub use policies::{BaseStock, FixedThroughput, LocalPolicies, OrderPolicy, PassThrough};
pub use prompt::build_prompt;
pub use registry::{model_catalog, policy_by_name, CatalogEntry};
pub use resolver::{Decision, DecisionResolver, DecisionSource};
pub use trait_def::{DecisionError, DecisionProvider, DecisionRequest};
