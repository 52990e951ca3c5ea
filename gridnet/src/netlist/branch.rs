//! Netlist branches
//!
//! A branch is either a two-terminal component taken from a grid edge or a
//! device with named terminals taken from a grid point. `order` is the
//! insertion position and never changes once assigned.

use crate::grid::{Axis, ComponentKind, Coord, DeviceKind, EdgeComponent, Orientation, Quantity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the reference node.
pub const GROUND: &str = "0";

/// Terminal name used by supplies and ports.
pub const NODE_TERMINAL: &str = "node";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoTerminal {
    pub order: usize,
    /// Reference-positive node after the direction bit is applied.
    pub n1: String,
    pub n2: String,
    /// Edge the branch came from.
    pub at: Coord,
    pub axis: Axis,
    pub component: EdgeComponent,
}

impl TwoTerminal {
    pub fn kind(&self) -> &ComponentKind {
        &self.component.kind
    }

    /// Probe polarity as `(positive, negative)` nodes.
    pub fn probe_nodes(&self) -> (&str, &str) {
        if self.component.probe_aligned() {
            (&self.n1, &self.n2)
        } else {
            (&self.n2, &self.n1)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceBranch {
    pub order: usize,
    pub at: Coord,
    pub kind: DeviceKind,
    pub label: u32,
    pub orientation: Orientation,
    /// Pin name to node name. Unconnected pins are absent.
    pub terminals: BTreeMap<String, String>,
    pub value: Option<Quantity>,
}

impl DeviceBranch {
    /// Node of a terminal; missing terminals read as ground.
    pub fn node(&self, pin: &str) -> &str {
        self.terminals.get(pin).map(String::as_str).unwrap_or(GROUND)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "branch", rename_all = "snake_case")]
pub enum Branch {
    TwoTerminal(TwoTerminal),
    Device(DeviceBranch),
}

impl Branch {
    pub fn order(&self) -> usize {
        match self {
            Branch::TwoTerminal(b) => b.order,
            Branch::Device(b) => b.order,
        }
    }

    pub fn as_two_terminal(&self) -> Option<&TwoTerminal> {
        match self {
            Branch::TwoTerminal(b) => Some(b),
            Branch::Device(_) => None,
        }
    }

    pub fn as_device(&self) -> Option<&DeviceBranch> {
        match self {
            Branch::Device(b) => Some(b),
            Branch::TwoTerminal(_) => None,
        }
    }

    /// `(terminal, node)` pairs in a stable order.
    pub fn terminals(&self) -> Vec<(&str, &str)> {
        match self {
            Branch::TwoTerminal(b) => vec![("n1", b.n1.as_str()), ("n2", b.n2.as_str())],
            Branch::Device(b) => b
                .terminals
                .iter()
                .map(|(pin, node)| (pin.as_str(), node.as_str()))
                .collect(),
        }
    }

    /// Human-readable reference, `R1`, `Q2`, `VCC`.
    pub fn reference(&self) -> String {
        match self {
            Branch::TwoTerminal(b) => {
                let prefix = match b.kind() {
                    ComponentKind::Short => "W",
                    ComponentKind::Open => "P",
                    kind => kind.spice_prefix(),
                };
                format!("{}{}", prefix, b.component.label)
            }
            Branch::Device(b) => format!("{}{}", b.kind.prefix(), b.label),
        }
    }
}
