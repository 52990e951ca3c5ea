//! Branch lists built from resolved grids.

pub mod branch;
pub mod builder;
pub mod graph;
pub mod names;

pub use branch::{Branch, DeviceBranch, TwoTerminal, GROUND, NODE_TERMINAL};
pub use builder::{control_branch, BuildFailure, NetlistBuilder};
pub use graph::{CircuitStats, NetGraph, NetNode, Terminal};
pub use names::NodeNames;
