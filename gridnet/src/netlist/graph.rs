//! Netlist Graph View
//!
//! Bipartite petgraph view of a branch list: one node per net, one node per
//! branch, and one edge per terminal pointing from the branch to its net.
//! Useful for connectivity questions the flat branch list answers poorly.

use super::branch::Branch;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NetNode {
    /// Electrical node by name.
    Net(String),
    /// Branch by insertion order.
    Element { order: usize, reference: String },
}

impl NetNode {
    pub fn is_net(&self) -> bool {
        matches!(self, NetNode::Net(_))
    }

    pub fn as_net(&self) -> Option<&str> {
        match self {
            NetNode::Net(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<(usize, &str)> {
        match self {
            NetNode::Element { order, reference } => Some((*order, reference)),
            _ => None,
        }
    }
}

/// Terminal connection, labelled with the terminal name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminal {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NetGraph {
    graph: DiGraph<NetNode, Terminal>,
    net_indices: HashMap<String, NodeIndex>,
    element_indices: HashMap<usize, NodeIndex>,
    devices: usize,
}

impl NetGraph {
    pub fn from_branches(branches: &[Branch]) -> Self {
        let mut view = Self {
            graph: DiGraph::new(),
            net_indices: HashMap::new(),
            element_indices: HashMap::new(),
            devices: 0,
        };

        for branch in branches {
            if branch.as_device().is_some() {
                view.devices += 1;
            }
            let element = view.graph.add_node(NetNode::Element {
                order: branch.order(),
                reference: branch.reference(),
            });
            view.element_indices.insert(branch.order(), element);

            for (terminal, node) in branch.terminals() {
                let net = view.net_index(node);
                view.graph.add_edge(
                    element,
                    net,
                    Terminal {
                        name: terminal.to_string(),
                    },
                );
            }
        }

        view
    }

    fn net_index(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.net_indices.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(NetNode::Net(name.to_string()));
        self.net_indices.insert(name.to_string(), idx);
        idx
    }

    pub fn nets(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().filter_map(NetNode::as_net)
    }

    /// Nets a branch touches, in terminal order.
    pub fn nets_of(&self, order: usize) -> Vec<&str> {
        let Some(&idx) = self.element_indices.get(&order) else {
            return Vec::new();
        };
        let mut nets: Vec<(usize, &str)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|edge| {
                self.graph
                    .node_weight(edge.target())
                    .and_then(NetNode::as_net)
                    .map(|name| (edge.id().index(), name))
            })
            .collect();
        nets.sort_by_key(|(id, _)| *id);
        nets.into_iter().map(|(_, name)| name).collect()
    }

    /// Orders of branches with a terminal on a net, ascending.
    pub fn branches_on(&self, net: &str) -> Vec<usize> {
        let Some(&idx) = self.net_indices.get(net) else {
            return Vec::new();
        };
        let mut orders: Vec<usize> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|edge| {
                self.graph
                    .node_weight(edge.source())
                    .and_then(NetNode::as_element)
                    .map(|(order, _)| order)
            })
            .collect();
        orders.sort_unstable();
        orders.dedup();
        orders
    }

    /// Terminal through which a branch touches a net.
    pub fn terminal_between(&self, order: usize, net: &str) -> Option<&Terminal> {
        let element = self.element_indices.get(&order)?;
        let net = self.net_indices.get(net)?;
        self.graph
            .edges_connecting(*element, *net)
            .next()
            .map(|e| e.weight())
    }

    /// Shortest alternation of nets and branches joining two nets.
    pub fn find_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        use petgraph::algo::astar;

        let from_idx = *self.net_indices.get(from)?;
        let to_idx = *self.net_indices.get(to)?;

        // terminals are directed element -> net; walk them both ways
        let undirected = self.graph.clone().into_edge_type::<petgraph::Undirected>();
        let (_, path) = astar(&undirected, from_idx, |n| n == to_idx, |_| 1, |_| 0)?;

        Some(
            path.into_iter()
                .filter_map(|idx| match undirected.node_weight(idx) {
                    Some(NetNode::Net(name)) => Some(format!("[{}]", name)),
                    Some(NetNode::Element { reference, .. }) => Some(reference.clone()),
                    None => None,
                })
                .collect(),
        )
    }

    pub fn stats(&self) -> CircuitStats {
        CircuitStats {
            node_count: self.net_indices.len(),
            branch_count: self.element_indices.len(),
            device_count: self.devices,
            connection_count: self.graph.edge_count(),
            separate_parts: petgraph::algo::connected_components(&self.graph),
        }
    }
}

/// Counts describing a built circuit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitStats {
    pub node_count: usize,
    pub branch_count: usize,
    pub device_count: usize,
    pub connection_count: usize,
    pub separate_parts: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Axis, Coord, DeviceKind, EdgeComponent, Orientation, UnitScale};
    use crate::netlist::branch::{DeviceBranch, TwoTerminal};
    use std::collections::BTreeMap;

    fn two_terminal(order: usize, n1: &str, n2: &str, component: EdgeComponent) -> Branch {
        Branch::TwoTerminal(TwoTerminal {
            order,
            n1: n1.to_string(),
            n2: n2.to_string(),
            at: Coord::new(0, 0),
            axis: Axis::Horizontal,
            component,
        })
    }

    fn sample() -> Vec<Branch> {
        let mut terminals = BTreeMap::new();
        terminals.insert("node".to_string(), "3".to_string());
        vec![
            two_terminal(0, "1", "0", EdgeComponent::voltage_source("1", 5.0, UnitScale::One)),
            two_terminal(1, "1", "2", EdgeComponent::resistor("1", 1.0, UnitScale::Kilo)),
            two_terminal(2, "2", "0", EdgeComponent::resistor("2", 2.0, UnitScale::Kilo)),
            Branch::Device(DeviceBranch {
                order: 3,
                at: Coord::new(1, 1),
                kind: DeviceKind::Vcc,
                label: 0,
                orientation: Orientation::Right,
                terminals,
                value: None,
            }),
        ]
    }

    #[test]
    fn test_queries() {
        let graph = NetGraph::from_branches(&sample());
        assert_eq!(graph.nets_of(1), vec!["1", "2"]);
        assert_eq!(graph.branches_on("0"), vec![0, 2]);
        assert_eq!(graph.terminal_between(2, "0").unwrap().name, "n2");
        assert!(graph.terminal_between(0, "2").is_none());
        assert!(graph.nets_of(42).is_empty());
    }

    #[test]
    fn test_path() {
        let graph = NetGraph::from_branches(&sample());
        let path = graph.find_path("1", "0").unwrap();
        assert_eq!(path, vec!["[1]", "V1", "[0]"]);
        assert!(graph.find_path("1", "3").is_none());
    }

    #[test]
    fn test_stats() {
        let stats = NetGraph::from_branches(&sample()).stats();
        assert_eq!(stats.node_count, 4);
        assert_eq!(stats.branch_count, 4);
        assert_eq!(stats.device_count, 1);
        assert_eq!(stats.connection_count, 7);
        assert_eq!(stats.separate_parts, 2);
    }
}
