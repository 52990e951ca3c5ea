//! Simple build example: load an editor file and print its SPICE deck and
//! circuitikz drawing.
//! Run with: cargo run --example simple_build [path/to/grid.json]

use gridnet::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

fn main() -> Result<(), GridnetError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/loop_probe.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example simple_build [path/to/grid.json]");
        std::process::exit(1);
    }

    let circuit = gridnet::load_circuit(path, CircuitOptions::default())?;

    if let Some(failure) = circuit.failure() {
        println!("{} is not a valid circuit: {}", path.display(), failure);
        std::process::exit(1);
    }

    let stats = circuit.stats();
    println!("Circuit: {}", path.display());
    println!("  Nodes:    {}", stats.node_count);
    println!("  Branches: {}", stats.branch_count);
    println!("  Devices:  {}", stats.device_count);
    println!();
    print!("{}", SpiceEmitter::emit(&circuit)?);
    println!();

    let mut rng = StdRng::seed_from_u64(0);
    print!("{}", SchematicEmitter::emit(&circuit, &mut rng)?);
    Ok(())
}
