use serde::{Deserialize, Serialize};

/// Fixed number of supply-chain positions in every group.
pub const ROLES: usize = 4;

/// Number of mailing queues (orders travel from role i to role i+1).
pub const MAIL_LINKS: usize = ROLES - 1;

/// Five-level customer demand step function.
///
/// `levels[k]` applies from `boundaries[k-1]` (inclusive) up to
/// `boundaries[k]` (exclusive); the last level is open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSchedule {
    pub levels: [u32; 5],
    pub boundaries: [u32; 4],
}

impl DemandSchedule {
    /// Demand placed by the customer on the retailer during `week`.
    pub fn demand_for_week(&self, week: u32) -> u32 {
        let step = self
            .boundaries
            .iter()
            .position(|&boundary| week < boundary)
            .unwrap_or(self.boundaries.len());
        self.levels[step]
    }
}

impl Default for DemandSchedule {
    fn default() -> Self {
        Self {
            levels: [4, 8, 12, 16, 20],
            boundaries: [8, 19, 26, 39],
        }
    }
}

/// Economic constants of one game. Fixed at process start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRules {
    /// Holding cost per unit of inventory per week.
    pub inventory_cost: f64,
    /// Penalty per unit of backlog per week.
    pub backlog_cost: f64,
    pub starting_inventory: u32,
    /// Seed value for every pipeline slot and every week-0 order.
    pub starting_throughput: u32,
    pub demand: DemandSchedule,
    pub max_weeks: u32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            inventory_cost: 0.5,
            backlog_cost: 1.0,
            starting_inventory: 12,
            starting_throughput: 4,
            demand: DemandSchedule::default(),
            max_weeks: 40,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demand_steps_at_boundaries() {
        let schedule = DemandSchedule::default();
        let cases = [
            (0, 4),
            (7, 4),
            (8, 8),
            (18, 8),
            (19, 12),
            (25, 12),
            (26, 16),
            (38, 16),
            (39, 20),
            (400, 20),
        ];
        for (week, expected) in cases {
            assert_eq!(
                schedule.demand_for_week(week),
                expected,
                "demand at week {week}"
            );
        }
    }
}
