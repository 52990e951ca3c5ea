//! circuitikz output from editor files

use gridnet::prelude::*;
use gridnet::{load_circuit, wrap_document};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn draw(name: &str, seed: u64) -> String {
    let circuit = load_circuit(&fixture_path(name), CircuitOptions::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    SchematicEmitter::emit(&circuit, &mut rng).unwrap()
}

#[test]
fn test_loop_drawing_uses_file_layout() {
    let tikz = draw("loop_probe.json", 7);

    assert!(tikz.starts_with("\\draw (0.0,3.0) to[generic, l=$4 \\mathrm{ k\\Omega }$, ] (3.0,3.0);\n"));
    assert!(tikz.contains("=$I_{1}$] (3.0,3.0);\n"));
    // the source is reversed, so it is drawn bottom to top
    assert!(tikz.contains("\\draw (0.0,0.0) to [short] (0.0,3.0);\n\\ctikzset{american};\n"));
    assert!(tikz.contains("v=$10 \\mathrm{ V }$] (0.0,3.0);\n"));
    assert!(!tikz.contains("circ"));
}

#[test]
fn test_seed_reproduces_output() {
    assert_eq!(draw("loop_probe.json", 42), draw("loop_probe.json", 42));
}

#[test]
fn test_label_mode_and_junction_dot() {
    let plain = draw("crossing.json", 1);
    assert!(plain.contains("l=$R_{ 1 }$"));
    assert!(plain.contains("l=$R_{ 8 }$"));
    assert!(!plain.contains("\\node[circ]"));

    let joined = draw("crossing_junction.json", 1);
    assert!(joined.ends_with("\\node[circ] at (3.0,3.0) {};\n"));
}

#[test]
fn test_transistor_drawing() {
    let tikz = draw("transistor.json", 3);

    assert!(tikz.contains("% NPN/PNP Transistor Q_{1}\n"));
    assert!(tikz.contains("(Q1) at (3.0,3.0) {};\n"));
    assert!(tikz.contains("\\draw (Q1.B) -- (0.0,3.0);\n"));
    assert!(tikz.contains("\\draw (Q1.C) |- (3.0,6.0);\n"));
    // the emitter is unconnected and stays off the collector's grid point
    assert!(tikz.contains("\\draw (Q1.E) |- (3.0,4.0);\n"));
    assert!(tikz.contains("\\draw (0.0,0.0) node[ground] {};\n"));
    assert!(tikz.contains("\\draw[fill=black] (6.0,3.0) circle (2pt);\n"));
}

#[test]
fn test_standalone_document() {
    let circuit = load_circuit(&fixture_path("loop_probe.json"), CircuitOptions::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let fragment = SchematicEmitter::emit(&circuit, &mut rng).unwrap();
    let doc = wrap_document(&fragment, &circuit.options().font_size);

    assert!(doc.starts_with("\\documentclass[border=10pt]{standalone}\n"));
    assert!(doc.contains(&fragment));
    assert!(doc.contains("font=\\large"));
}

#[test]
fn test_invalid_circuit_has_no_drawing() {
    let circuit = load_circuit(&fixture_path("dangling.json"), CircuitOptions::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    assert!(matches!(
        SchematicEmitter::emit(&circuit, &mut rng),
        Err(EmitError::InvalidCircuit(_))
    ));
}
