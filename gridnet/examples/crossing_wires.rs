//! Example: two wires crossing in the middle of a 3x3 grid, with and
//! without a junction marker.
//! Run with: cargo run --example crossing_wires

use gridnet::grid::Axis;
use gridnet::prelude::*;
use gridnet::{Coord, NodeEquivalenceResolver};

fn grid(junction: bool) -> Result<GridSpec, gridnet::GridError> {
    let r = |label: u32| EdgeComponent::resistor(label.to_string(), 1.0, UnitScale::Kilo);
    let mut builder = GridSpec::builder(3, 3)
        .hedge(0, 0, r(1))
        .hedge(0, 1, r(2))
        .hedge(2, 0, r(3))
        .hedge(2, 1, r(4))
        .vedge(0, 0, r(5))
        .vedge(1, 0, r(6))
        .vedge(0, 2, r(7))
        .vedge(1, 2, r(8))
        .hedge(1, 0, EdgeComponent::short())
        .hedge(1, 1, EdgeComponent::short())
        .vedge(0, 1, EdgeComponent::short())
        .vedge(1, 1, EdgeComponent::short());
    if junction {
        builder = builder.junction(1, 1);
    }
    builder.build()
}

fn main() -> Result<(), GridnetError> {
    let centre = Coord::new(1, 1);

    for junction in [false, true] {
        let spec = grid(junction)?;
        let classes = NodeEquivalenceResolver::resolve(&spec);
        println!(
            "junction={}: {} nodes, centre horizontal={:?} vertical={:?}",
            junction,
            classes.count(),
            classes.class_at(centre, Axis::Horizontal),
            classes.class_at(centre, Axis::Vertical),
        );

        let circuit = Circuit::build(spec, CircuitOptions::default());
        print!("{}", SpiceEmitter::emit(&circuit)?);
        println!();
    }
    Ok(())
}
