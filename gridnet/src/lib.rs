//! gridnet - grid circuit resolver and netlist emitters
//!
//! This library turns a rectangular grid description of a circuit (edges
//! carrying two-terminal components, points carrying multi-pin devices)
//! into a validated netlist, a circuitikz drawing and a SPICE deck.
//!
//! # Quick Start
//!
//! ```no_run
//! use gridnet::{Circuit, CircuitOptions, SpiceEmitter};
//! use std::path::Path;
//!
//! let spec = gridnet::load_grid(Path::new("circuit.json")).unwrap();
//! let circuit = Circuit::build(spec, CircuitOptions::default());
//!
//! match circuit.failure() {
//!     Some(failure) => eprintln!("invalid: {}", failure),
//!     None => print!("{}", SpiceEmitter::emit(&circuit).unwrap()),
//! }
//! ```
//!
//! # Features
//!
//! - **Crossing-aware node resolution**: unmarked 4-way crossings keep their
//!   horizontal and vertical wires apart
//! - **Validated netlists**: dangling points, shorted components, probe
//!   conflicts and unresolved control references are reported as values
//! - **Two emitters**: circuitikz fragments (seeded arrow styles) and SPICE decks
//! - **Editor files**: JSON grids saved by the circuit editor

pub mod core;
pub mod emit;
pub mod grid;
pub mod netlist;
pub mod topology;
pub mod trace;

// Re-export main types
pub use core::{
    build_project, discover_grid_files, load_circuit, Annotation, Circuit, CircuitOptions,
    CircuitReport, GridnetError,
};
pub use emit::{wrap_document, EmitError, SchematicEmitter, SpiceEmitter};
pub use grid::{
    ComponentKind, Coord, DeviceKind, EdgeComponent, EditorGrid, GridError, GridSpec, Measurement,
    NodeDevice, Orientation, Quantity, UnitScale,
};
pub use netlist::{Branch, BuildFailure, CircuitStats, NetGraph};
pub use topology::{ClassId, EquivalenceClasses, NodeEquivalenceResolver};
pub use trace::{BuildEvent, BuildObserver, JsonLinesObserver};

/// Load a grid from an editor JSON file (convenience wrapper).
pub fn load_grid(path: &std::path::Path) -> Result<GridSpec, GridnetError> {
    let text = std::fs::read_to_string(path)?;
    Ok(GridSpec::from_editor_json(&text)?)
}

/// Load the raw editor file, keeping its annotation flag and layout.
pub fn load_editor(path: &std::path::Path) -> Result<EditorGrid, GridnetError> {
    let text = std::fs::read_to_string(path)?;
    Ok(EditorGrid::from_json(&text)?)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Annotation, Branch, BuildFailure, Circuit, CircuitOptions, EdgeComponent, EmitError,
        GridSpec, GridnetError, SchematicEmitter, SpiceEmitter, UnitScale,
    };
}
