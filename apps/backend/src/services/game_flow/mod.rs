//! Game flow service: lobby, lifecycle, order collection and turn advance.
//!
//! Locking: `lifecycle` serializes admin operations and seat claims. Each
//! group's `state` mutex serializes everything that touches that group.
//! `ranks` and the notifier are leaves and may be taken under a group lock.
//! Allowed order is lifecycle → group state → leaves; no lock is ever held
//! across an `.await`.

mod lifecycle;
mod lobby;
mod order_collector;
mod turn_engine;

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

pub use lobby::Registration;
pub use order_collector::SubmitOutcome;

use crate::ai::DecisionResolver;
use crate::config::GameConfig;
use crate::domain::participant::ConnectionId;
use crate::domain::roles::RoleKind;
use crate::domain::state::{GamePhase, GroupId, GroupState};
use crate::services::notifier::Notifier;

/// Where a registered username sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Seat {
    pub group_id: GroupId,
    pub role: RoleKind,
}

pub(crate) struct GroupSlot {
    pub id: GroupId,
    pub state: Mutex<GroupState>,
    /// Mirror of `state.week`, readable without the group lock.
    pub week: AtomicU32,
    pub removed: AtomicBool,
}

impl GroupSlot {
    fn new(state: GroupState) -> Self {
        Self {
            id: state.id,
            week: AtomicU32::new(state.week),
            state: Mutex::new(state),
            removed: AtomicBool::new(false),
        }
    }

    fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }
}

/// Process-wide phase with compare-and-swap transitions.
pub(crate) struct PhaseCell(AtomicU8);

impl PhaseCell {
    fn new(phase: GamePhase) -> Self {
        Self(AtomicU8::new(phase.as_u8()))
    }

    pub fn get(&self) -> GamePhase {
        GamePhase::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, phase: GamePhase) {
        self.0.store(phase.as_u8(), Ordering::Release);
    }

    /// Succeeds for exactly one caller per `from → to` edge.
    fn transition(&self, from: GamePhase, to: GamePhase) -> bool {
        self.0
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

pub(crate) struct FlowInner {
    config: GameConfig,
    groups: DashMap<GroupId, Arc<GroupSlot>>,
    /// Group ids in lobby order; a group's rank is its index here.
    ranks: Mutex<Vec<GroupId>>,
    directory: DashMap<String, Seat>,
    connections: DashMap<ConnectionId, String>,
    phase: PhaseCell,
    lifecycle: Mutex<()>,
    next_id: AtomicU64,
    notifier: Arc<dyn Notifier>,
    resolver: DecisionResolver,
}

/// Cheap to clone; all clones share one game.
#[derive(Clone)]
pub struct GameFlowService {
    inner: Arc<FlowInner>,
}

impl GameFlowService {
    pub fn new(config: GameConfig, resolver: DecisionResolver, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inner: Arc::new(FlowInner {
                config,
                groups: DashMap::new(),
                ranks: Mutex::new(Vec::new()),
                directory: DashMap::new(),
                connections: DashMap::new(),
                phase: PhaseCell::new(GamePhase::Lobby),
                lifecycle: Mutex::new(()),
                next_id: AtomicU64::new(1),
                notifier,
                resolver,
            }),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.inner.config
    }

    pub fn phase(&self) -> GamePhase {
        self.inner.phase.get()
    }

    pub fn resolver(&self) -> &DecisionResolver {
        &self.inner.resolver
    }

    /// Copy of one group's state.
    pub fn group_state(&self, id: GroupId) -> Option<GroupState> {
        self.slot(id).map(|slot| {
            let state = slot.state.lock();
            state.clone()
        })
    }

    pub fn group_ids(&self) -> Vec<GroupId> {
        self.inner.ranks.lock().clone()
    }

    fn slot(&self, id: GroupId) -> Option<Arc<GroupSlot>> {
        self.inner.groups.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Live slots in rank order.
    fn ordered_slots(&self) -> Vec<Arc<GroupSlot>> {
        let ids = self.group_ids();
        ids.into_iter().filter_map(|id| self.slot(id)).collect()
    }

    fn rank_of(&self, id: GroupId) -> usize {
        self.inner
            .ranks
            .lock()
            .iter()
            .position(|&g| g == id)
            .unwrap_or(usize::MAX)
    }

    fn allocate_id(&self) -> GroupId {
        GroupId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn insert_group(&self, state: GroupState) -> Arc<GroupSlot> {
        let id = state.id;
        let slot = Arc::new(GroupSlot::new(state));
        self.inner.groups.insert(id, Arc::clone(&slot));
        self.inner.ranks.lock().push(id);
        slot
    }

    fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }
}
