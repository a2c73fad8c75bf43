use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::roles::{Role, RoleKind};
use crate::domain::rules::GameRules;

/// Opaque handle of a live human connection.
pub type ConnectionId = Uuid;

/// Which backend answers decision requests for an AI participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiProvider {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Gemini,
    /// In-process ordering policies (no network).
    Local,
}

impl AiProvider {
    pub const fn as_str(self) -> &'static str {
        match self {
            AiProvider::OpenAi => "openai",
            AiProvider::Anthropic => "anthropic",
            AiProvider::Gemini => "gemini",
            AiProvider::Local => "local",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AiModel {
    pub provider: AiProvider,
    pub model: String,
}

impl AiModel {
    pub fn new(provider: AiProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

impl fmt::Display for AiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider.as_str(), self.model)
    }
}

/// Who occupies a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlayerKind {
    Human,
    Ai(AiModel),
}

impl PlayerKind {
    pub fn ai(provider: AiProvider, model: impl Into<String>) -> Self {
        PlayerKind::Ai(AiModel::new(provider, model))
    }

    pub fn is_human(&self) -> bool {
        matches!(self, PlayerKind::Human)
    }

    pub fn ai_model(&self) -> Option<&AiModel> {
        match self {
            PlayerKind::Ai(model) => Some(model),
            PlayerKind::Human => None,
        }
    }
}

/// Per-week records, indexed by week.
///
/// Cost, inventory and backlog are captured at the start of each week;
/// orders record the upstream order decided during that week.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct History {
    pub cost: Vec<f64>,
    pub inventory: Vec<u32>,
    pub backlog: Vec<u32>,
    pub orders: Vec<u32>,
}

impl History {
    pub fn clear(&mut self) {
        self.cost.clear();
        self.inventory.clear();
        self.backlog.clear();
        self.orders.clear();
    }

    pub fn weeks(&self) -> usize {
        self.orders.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    /// `None` until a human claims the slot.
    pub name: Option<String>,
    pub connection: Option<ConnectionId>,
    pub kind: PlayerKind,
    pub cost: f64,
    pub inventory: u32,
    pub backlog: u32,
    pub history: History,
    pub role: Role,
}

impl Participant {
    pub fn new(kind: PlayerKind, role_kind: RoleKind, rules: &GameRules) -> Self {
        let name = match &kind {
            PlayerKind::Human => None,
            PlayerKind::Ai(model) => Some(format!(
                "AI-{}-{}",
                model.model,
                role_kind.display_name()
            )),
        };
        Self {
            name,
            connection: None,
            kind,
            cost: 0.0,
            inventory: rules.starting_inventory,
            backlog: 0,
            history: History::default(),
            role: Role::fresh(role_kind, rules.starting_throughput),
        }
    }

    pub fn role_kind(&self) -> RoleKind {
        self.role.kind
    }

    /// Back to starting stock and zero cost; identity and connection stay.
    pub fn reset(&mut self, rules: &GameRules) {
        self.cost = 0.0;
        self.inventory = rules.starting_inventory;
        self.backlog = 0;
        self.history.clear();
        self.role = Role::fresh(self.role.kind, rules.starting_throughput);
    }

    /// An empty human slot waiting for someone to claim it.
    pub fn is_open_slot(&self) -> bool {
        self.kind.is_human() && self.name.is_none()
    }

    /// Human slot whose player is claimed and currently connected.
    pub fn is_seated(&self) -> bool {
        match self.kind {
            PlayerKind::Human => self.name.is_some() && self.connection.is_some(),
            PlayerKind::Ai(_) => true,
        }
    }
}
