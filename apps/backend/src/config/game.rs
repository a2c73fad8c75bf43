use std::time::Duration;

use crate::config::{env_lookup, parse_var};
use crate::domain::rules::{DemandSchedule, GameRules};
use crate::error::AppError;

/// Pacing and retry limits for model-backed decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct AiTiming {
    /// Total decision attempts per AI participant per week.
    pub max_attempts: u32,
    /// Wait applied after a rate-limit error that carries no hint.
    pub default_retry_after: Duration,
    /// Pause before each batch of AI decisions.
    pub thinking_delay: Duration,
    /// Upper bound on one provider call.
    pub request_timeout: Duration,
}

impl Default for AiTiming {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            default_retry_after: Duration::from_secs(5),
            thinking_delay: Duration::from_millis(1500),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub rules: GameRules,
    pub ai: AiTiming,
    /// Largest order quantity accepted from any participant.
    pub max_order_quantity: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rules: GameRules::default(),
            ai: AiTiming::default(),
            max_order_quantity: 10_000,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(env_lookup)
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let rules = GameRules {
            inventory_cost: parse_var(&lookup, "BEER_INVENTORY_COST", d.rules.inventory_cost)?,
            backlog_cost: parse_var(&lookup, "BEER_BACKLOG_COST", d.rules.backlog_cost)?,
            starting_inventory: parse_var(
                &lookup,
                "BEER_STARTING_INVENTORY",
                d.rules.starting_inventory,
            )?,
            starting_throughput: parse_var(
                &lookup,
                "BEER_STARTING_THROUGHPUT",
                d.rules.starting_throughput,
            )?,
            demand: demand_schedule(&lookup, d.rules.demand)?,
            max_weeks: parse_var(&lookup, "BEER_MAX_WEEKS", d.rules.max_weeks)?,
        };
        if rules.max_weeks == 0 {
            return Err(AppError::config("BEER_MAX_WEEKS must be at least 1"));
        }
        if rules.inventory_cost < 0.0 || rules.backlog_cost < 0.0 {
            return Err(AppError::config("cost rates must not be negative"));
        }

        let ai = AiTiming {
            max_attempts: parse_var(&lookup, "BEER_AI_MAX_ATTEMPTS", d.ai.max_attempts)?.max(1),
            default_retry_after: Duration::from_secs(parse_var(
                &lookup,
                "BEER_AI_RETRY_AFTER_SECS",
                d.ai.default_retry_after.as_secs(),
            )?),
            thinking_delay: Duration::from_millis(parse_var(
                &lookup,
                "BEER_AI_THINKING_DELAY_MS",
                d.ai.thinking_delay.as_millis() as u64,
            )?),
            request_timeout: Duration::from_secs(parse_var(
                &lookup,
                "BEER_AI_REQUEST_TIMEOUT_SECS",
                d.ai.request_timeout.as_secs(),
            )?),
        };

        Ok(Self {
            rules,
            ai,
            max_order_quantity: parse_var(
                &lookup,
                "BEER_MAX_ORDER_QUANTITY",
                d.max_order_quantity,
            )?,
        })
    }
}

fn demand_schedule<F>(lookup: &F, default: DemandSchedule) -> Result<DemandSchedule, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let levels = match lookup("BEER_DEMAND_LEVELS") {
        Some(raw) => parse_list::<5>("BEER_DEMAND_LEVELS", &raw)?,
        None => default.levels,
    };
    let boundaries = match lookup("BEER_DEMAND_BOUNDARIES") {
        Some(raw) => parse_list::<4>("BEER_DEMAND_BOUNDARIES", &raw)?,
        None => default.boundaries,
    };
    if boundaries.windows(2).any(|w| w[0] > w[1]) {
        return Err(AppError::config(format!(
            "BEER_DEMAND_BOUNDARIES must be ascending, got {boundaries:?}"
        )));
    }
    Ok(DemandSchedule { levels, boundaries })
}

fn parse_list<const N: usize>(key: &str, raw: &str) -> Result<[u32; N], AppError> {
    let values = raw
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::config(format!("{key}={raw:?}: {e}")))?;
    <[u32; N]>::try_from(values).map_err(|v| {
        AppError::config(format!("{key} needs {N} comma-separated values, got {}", v.len()))
    })
}
