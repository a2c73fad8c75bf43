use std::fmt::Write as _;

use super::trait_def::DecisionRequest;

/// Number of past weeks included in the prompt.
const HISTORY_WINDOW: usize = 5;

pub const SYSTEM_PROMPT: &str = "You are a supply chain manager making weekly ordering decisions. \
Respond with ONLY a single non-negative integer: the quantity to order.";

pub fn build_prompt(request: &DecisionRequest) -> String {
    let p = &request.participant;
    let rules = &request.rules;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "You play the {} in a four-stage beer supply chain. You ship to {} and order from {}.",
        p.role_name, p.downstream.name, p.upstream.name
    );
    let _ = writeln!(out, "\nGoal: keep your total cost as low as possible.");
    let _ = writeln!(
        out,
        "Costs: ${} per unit of inventory per week, ${} per unit of backlog per week.",
        rules.inventory_cost, rules.backlog_cost
    );
    let _ = writeln!(out, "\nWeek {}:", request.group.week);
    let _ = writeln!(
        out,
        "- inventory: {} units ({} arrived this week)",
        p.inventory, p.upstream.shipments
    );
    let _ = writeln!(out, "- backlog: {} units", p.backlog);
    let _ = writeln!(
        out,
        "- latest order from {}: {} units",
        p.downstream.name, p.downstream.orders
    );
    let _ = writeln!(out, "- cost so far: ${:.2}", p.cost);

    let weeks = p.history.inventory.len();
    if weeks > 0 {
        let start = weeks.saturating_sub(HISTORY_WINDOW);
        let _ = writeln!(out, "\nRecent weeks:");
        for week in start..weeks {
            let order = p
                .history
                .orders
                .get(week)
                .map_or_else(|| "n/a".to_string(), u32::to_string);
            let _ = writeln!(
                out,
                "- week {week}: inventory {}, backlog {}, ordered {order}",
                p.history.inventory[week],
                p.history.backlog.get(week).copied().unwrap_or_default(),
            );
        }
    }

    let _ = writeln!(
        out,
        "\nShipments take two weeks to arrive and orders take one week to reach {}. \
Watch the demand trend and avoid over-ordering.",
        p.upstream.name
    );
    let _ = write!(
        out,
        "How many units do you order from {}? Reply with the number only.",
        p.upstream.name
    );
    out
}
