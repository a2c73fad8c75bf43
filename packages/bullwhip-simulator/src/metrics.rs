//! Metrics collected from a simulated game.

use backend::domain::{RoleKind, ROLES};
use serde::Serialize;

use crate::simulator::GameResult;
use crate::types::MetricsLevel;

/// Complete game metrics for output.
#[derive(Debug, Clone, Serialize)]
pub struct GameMetrics {
    pub game_id: u32,
    pub seed: u64,
    pub timestamp: String,
    pub config: RunConfig,
    pub result: GameResultMetrics,
    pub role_metrics: Vec<RoleMetrics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub weeks: Vec<WeekMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub policies: [String; ROLES],
    pub max_weeks: u32,
    pub demand_levels: [u32; 5],
    pub total_games: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameResultMetrics {
    pub total_cost: f64,
    pub weeks_played: u32,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleMetrics {
    pub role: RoleKind,
    pub policy: String,
    pub cost: f64,
    pub peak_backlog: u32,
    pub peak_inventory: u32,
    pub order_variance: f64,
    /// Variance of this role's orders over the variance of customer demand.
    /// `None` when demand never changed.
    pub amplification: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekMetrics {
    pub week: u32,
    pub customer_demand: u32,
    pub orders: [u32; ROLES],
    pub inventory: [u32; ROLES],
    pub backlog: [u32; ROLES],
    pub group_cost: f64,
}

/// Population variance; zero for fewer than two samples.
pub fn variance(values: &[u32]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    values
        .iter()
        .map(|&v| {
            let d = f64::from(v) - mean;
            d * d
        })
        .sum::<f64>()
        / n
}

pub fn amplification_ratio(orders: &[u32], demand: &[u32]) -> Option<f64> {
    let base = variance(demand);
    (base > 0.0).then(|| variance(orders) / base)
}

pub struct MetricsInput<'a> {
    pub game_id: u32,
    pub seed: u64,
    pub policies: [String; ROLES],
    pub total_games: u32,
    pub duration_ms: f64,
    pub level: &'a MetricsLevel,
}

pub fn build_game_metrics(input: MetricsInput<'_>, result: &GameResult) -> GameMetrics {
    let timestamp = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("unknown"));
    let demand = result.customer_demand();
    let group = &result.group;

    let role_metrics = group
        .participants
        .iter()
        .zip(&input.policies)
        .map(|(p, policy)| RoleMetrics {
            role: p.role_kind(),
            policy: policy.clone(),
            cost: p.cost,
            peak_backlog: p.history.backlog.iter().copied().chain([p.backlog]).max().unwrap_or(0),
            peak_inventory: p
                .history
                .inventory
                .iter()
                .copied()
                .chain([p.inventory])
                .max()
                .unwrap_or(0),
            order_variance: variance(&p.history.orders),
            amplification: amplification_ratio(&p.history.orders, &demand),
        })
        .collect();

    let weeks = match input.level {
        MetricsLevel::Basic => Vec::new(),
        MetricsLevel::Detailed => result
            .weeks
            .iter()
            .map(|report| {
                let mut row = WeekMetrics {
                    week: report.week,
                    customer_demand: report.customer_demand,
                    orders: [0; ROLES],
                    inventory: [0; ROLES],
                    backlog: [0; ROLES],
                    group_cost: report.group_cost,
                };
                for (i, step) in report.steps.iter().enumerate().take(ROLES) {
                    row.orders[i] = step.placed_order;
                    row.inventory[i] = step.inventory;
                    row.backlog[i] = step.backlog;
                }
                row
            })
            .collect(),
    };

    GameMetrics {
        game_id: input.game_id,
        seed: input.seed,
        timestamp,
        config: RunConfig {
            policies: input.policies,
            max_weeks: result.rules.max_weeks,
            demand_levels: result.rules.demand.levels,
            total_games: input.total_games,
        },
        result: GameResultMetrics {
            total_cost: group.cost,
            weeks_played: group.week,
            duration_ms: input.duration_ms,
        },
        role_metrics,
        weeks,
    }
}

/// One CSV row per game.
#[derive(Debug, Serialize)]
pub struct CsvSummaryRow {
    pub game_id: u32,
    pub seed: u64,
    pub total_cost: f64,
    pub retailer_cost: f64,
    pub wholesaler_cost: f64,
    pub warehouse_cost: f64,
    pub factory_cost: f64,
    pub factory_amplification: Option<f64>,
    pub retailer_policy: String,
    pub wholesaler_policy: String,
    pub warehouse_policy: String,
    pub factory_policy: String,
}

impl From<&GameMetrics> for CsvSummaryRow {
    fn from(m: &GameMetrics) -> Self {
        let cost = |i: usize| m.role_metrics.get(i).map_or(0.0, |r| r.cost);
        let [retailer_policy, wholesaler_policy, warehouse_policy, factory_policy] =
            m.config.policies.clone();
        Self {
            game_id: m.game_id,
            seed: m.seed,
            total_cost: m.result.total_cost,
            retailer_cost: cost(0),
            wholesaler_cost: cost(1),
            warehouse_cost: cost(2),
            factory_cost: cost(3),
            factory_amplification: m.role_metrics.get(3).and_then(|r| r.amplification),
            retailer_policy,
            wholesaler_policy,
            warehouse_policy,
            factory_policy,
        }
    }
}
