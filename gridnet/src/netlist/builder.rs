//! Netlist Builder
//!
//! Walks the grid once and turns edges and devices into ordered branches.
//! Edges are visited row-major, the right edge of each point before the one
//! below it. Devices follow, also row-major. The first inconsistency stops
//! the walk and is returned as a [`BuildFailure`].

use super::branch::{Branch, DeviceBranch, TwoTerminal, NODE_TERMINAL};
use super::names::NodeNames;
use crate::grid::{Axis, ComponentKind, Coord, DeviceKind, Edge, GridSpec, MeasureKind};
use crate::topology::EquivalenceClasses;
use crate::trace::{BuildEvent, BuildObserver};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a grid does not describe a valid circuit.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildFailure {
    #[error("dangling connection at {point}")]
    Structural { point: Coord },
    #[error("{component} on the {axis} edge at {at} has both ends on node {node}")]
    ShortedComponent {
        at: Coord,
        axis: Axis,
        component: String,
        node: String,
    },
    #[error("{component} on the {axis} edge at {at} cannot carry a {measure} probe")]
    MeasurementConflict {
        at: Coord,
        axis: Axis,
        component: String,
        measure: MeasureKind,
    },
    #[error("{source_ref} is controlled by '{control_label}' but {matches} {measure} probes carry that label")]
    ControlReference {
        source_ref: String,
        control_label: String,
        measure: MeasureKind,
        matches: usize,
    },
}

pub struct NetlistBuilder;

impl NetlistBuilder {
    /// Build the ordered branch list.
    pub fn build(
        spec: &GridSpec,
        classes: &EquivalenceClasses,
        names: &NodeNames,
        observer: Option<&dyn BuildObserver>,
    ) -> Result<Vec<Branch>, BuildFailure> {
        let emit = |event: BuildEvent| {
            if let Some(observer) = observer {
                observer.on_event(&event);
            }
        };
        let mut branches: Vec<Branch> = Vec::new();

        // Step 1: edges
        for edge in spec.edges() {
            if let Some(branch) = Self::edge_branch(&edge, classes, names, branches.len())? {
                emit(BuildEvent::BranchRecorded {
                    order: branch.order,
                    reference: Branch::TwoTerminal(branch.clone()).reference(),
                    terminals: vec![
                        ("n1".to_string(), branch.n1.clone()),
                        ("n2".to_string(), branch.n2.clone()),
                    ],
                });
                branches.push(Branch::TwoTerminal(branch));
            } else if edge.component.kind.is_short() {
                let node = Self::node_name(edge.from, edge.axis, classes, names);
                tracing::debug!(at = %edge.from, axis = %edge.axis, node = %node, "short elided");
                emit(BuildEvent::EdgeElided {
                    at: edge.from,
                    axis: edge.axis,
                    node,
                });
            }
        }

        // Step 2: devices
        for (at, device) in spec.devices() {
            if device.kind == DeviceKind::Ground {
                continue;
            }
            let mut terminals = BTreeMap::new();
            if device.kind.is_single_terminal() {
                let node = Self::node_name(at, Axis::Horizontal, classes, names);
                terminals.insert(NODE_TERMINAL.to_string(), node);
            } else {
                for (pin, target) in &device.pins {
                    let axis = device.kind.pin_axis(pin, device.orientation);
                    terminals.insert(pin.clone(), Self::node_name(*target, axis, classes, names));
                }
            }
            let branch = Branch::Device(DeviceBranch {
                order: branches.len(),
                at,
                kind: device.kind,
                label: device.label,
                orientation: device.orientation,
                terminals,
                value: device.value,
            });
            emit(BuildEvent::BranchRecorded {
                order: branch.order(),
                reference: branch.reference(),
                terminals: branch
                    .terminals()
                    .into_iter()
                    .map(|(pin, node)| (pin.to_string(), node.to_string()))
                    .collect(),
            });
            tracing::debug!(reference = %branch.reference(), "device recorded");
            branches.push(branch);
        }

        // Step 3: every control label must name exactly one matching probe
        Self::check_control_references(&branches)?;

        Ok(branches)
    }

    fn node_name(at: Coord, axis: Axis, classes: &EquivalenceClasses, names: &NodeNames) -> String {
        classes
            .class_at(at, axis)
            .map(|class| names.name(class).to_string())
            .unwrap_or_else(|| super::branch::GROUND.to_string())
    }

    /// Branch for one edge, `None` when the edge produces no element.
    fn edge_branch(
        edge: &Edge<'_>,
        classes: &EquivalenceClasses,
        names: &NodeNames,
        order: usize,
    ) -> Result<Option<TwoTerminal>, BuildFailure> {
        let component = edge.component;

        if let Some(measure) = component.measure_kind() {
            if component.kind.conflicts_with(measure) {
                return Err(BuildFailure::MeasurementConflict {
                    at: edge.from,
                    axis: edge.axis,
                    component: component.kind.to_string(),
                    measure,
                });
            }
        }

        let mut n1 = Self::node_name(edge.from, edge.axis, classes, names);
        let mut n2 = Self::node_name(edge.to, edge.axis, classes, names);

        if component.kind.is_open() {
            // Only a voltage probe across two distinct nodes survives.
            let probed = component.measure_kind() == Some(MeasureKind::Voltage);
            if !probed || n1 == n2 {
                return Ok(None);
            }
        } else if n1 == n2 {
            if component.kind.is_short() {
                return Ok(None);
            }
            return Err(BuildFailure::ShortedComponent {
                at: edge.from,
                axis: edge.axis,
                component: component.kind.to_string(),
                node: n1,
            });
        }

        if component.reversed {
            std::mem::swap(&mut n1, &mut n2);
        }

        tracing::debug!(order, n1 = %n1, n2 = %n2, kind = %component.kind, "branch recorded");
        Ok(Some(TwoTerminal {
            order,
            n1,
            n2,
            at: edge.from,
            axis: edge.axis,
            component: component.clone(),
        }))
    }

    fn check_control_references(branches: &[Branch]) -> Result<(), BuildFailure> {
        for branch in branches.iter().filter_map(Branch::as_two_terminal) {
            let (Some(controlled), Some(measure)) =
                (branch.kind().controlled(), branch.kind().control_kind())
            else {
                continue;
            };
            if controlled.control_label.is_empty() {
                continue;
            }
            let matches = branches
                .iter()
                .filter_map(Branch::as_two_terminal)
                .filter_map(|b| b.component.measurement.as_ref())
                .filter(|m| m.kind == measure && m.label == controlled.control_label)
                .count();
            if matches != 1 {
                return Err(BuildFailure::ControlReference {
                    source_ref: Branch::TwoTerminal(branch.clone()).reference(),
                    control_label: controlled.control_label.clone(),
                    measure,
                    matches,
                });
            }
        }
        Ok(())
    }
}

/// Branch whose probe a dependent source refers to.
pub fn control_branch<'a>(branches: &'a [Branch], kind: &ComponentKind) -> Option<&'a TwoTerminal> {
    let controlled = kind.controlled()?;
    let measure = kind.control_kind()?;
    branches
        .iter()
        .filter_map(Branch::as_two_terminal)
        .find(|b| {
            b.component
                .measurement
                .as_ref()
                .map(|m| m.kind == measure && m.label == controlled.control_label)
                .unwrap_or(false)
        })
}
