//! The four supply-chain positions and the per-position order/shipment links.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::rules::ROLES;

/// Position in the chain, ordered downstream (customer side) to upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Retailer,
    Wholesaler,
    RegionalWarehouse,
    Factory,
}

impl RoleKind {
    pub const ALL: [RoleKind; ROLES] = [
        RoleKind::Retailer,
        RoleKind::Wholesaler,
        RoleKind::RegionalWarehouse,
        RoleKind::Factory,
    ];

    pub const fn index(self) -> usize {
        match self {
            RoleKind::Retailer => 0,
            RoleKind::Wholesaler => 1,
            RoleKind::RegionalWarehouse => 2,
            RoleKind::Factory => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            RoleKind::Retailer => "Retailer",
            RoleKind::Wholesaler => "Wholesaler",
            RoleKind::RegionalWarehouse => "Regional Warehouse",
            RoleKind::Factory => "Factory",
        }
    }

    /// Name of the party this role orders from.
    ///
    /// The factory orders from an abstract production source, also labelled
    /// "Factory".
    pub const fn upstream_name(self) -> &'static str {
        match self {
            RoleKind::Retailer => RoleKind::Wholesaler.display_name(),
            RoleKind::Wholesaler => RoleKind::RegionalWarehouse.display_name(),
            RoleKind::RegionalWarehouse => RoleKind::Factory.display_name(),
            RoleKind::Factory => "Factory",
        }
    }

    /// Name of the party this role ships to.
    pub const fn downstream_name(self) -> &'static str {
        match self {
            RoleKind::Retailer => "Customer",
            RoleKind::Wholesaler => RoleKind::Retailer.display_name(),
            RoleKind::RegionalWarehouse => RoleKind::Wholesaler.display_name(),
            RoleKind::Factory => RoleKind::RegionalWarehouse.display_name(),
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Last known order/shipment exchanged with one neighbour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub name: &'static str,
    pub orders: u32,
    pub shipments: u32,
}

/// A role's view of its two neighbours.
///
/// `upstream.orders` doubles as the pending order for the next advance: the
/// order collector writes it, the pipeline model reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    pub kind: RoleKind,
    pub upstream: Link,
    pub downstream: Link,
}

impl Role {
    pub fn fresh(kind: RoleKind, throughput: u32) -> Self {
        Self {
            kind,
            upstream: Link {
                name: kind.upstream_name(),
                orders: throughput,
                shipments: throughput,
            },
            downstream: Link {
                name: kind.downstream_name(),
                orders: throughput,
                shipments: throughput,
            },
        }
    }
}

/// Independent role values for one group, in index order.
pub fn fresh_roles(throughput: u32) -> [Role; ROLES] {
    RoleKind::ALL.map(|kind| Role::fresh(kind, throughput))
}
