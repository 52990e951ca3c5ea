//! SPICE deck generation from editor files

use gridnet::prelude::*;
use gridnet::load_circuit;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn deck(name: &str) -> String {
    let circuit = load_circuit(&fixture_path(name), CircuitOptions::default()).unwrap();
    assert!(circuit.is_valid(), "{} failed: {:?}", name, circuit.failure());
    SpiceEmitter::emit(&circuit).unwrap()
}

#[test]
fn test_loop_with_ammeter() {
    let deck = deck("loop_probe.json");

    assert!(deck.starts_with(".title Active DC Circuit\n"));
    assert!(deck.contains("R1 0 N0_1 4k\nVI1 N0_1 1 0\n"));
    assert!(deck.contains("V1 1 0 10\n"));
    assert!(deck.contains("\n.control\nop\n"));
    assert!(deck.contains("print i(VI1) ; measurement of I1\n"));
    assert!(deck.ends_with(".endc\n.end\n"));
    assert!(!deck.contains(".MODEL"));
    assert_eq!(deck.matches("\nVI").count(), 1);
    assert_eq!(deck.matches("print i(").count(), 1);
}

#[test]
fn test_crossing_nodes_in_label_mode() {
    let crossing = deck("crossing.json");
    assert!(crossing.contains("R1 0 1 <Empty>\n"));
    // left column: corner (0,0) to the horizontal wire through the crossing
    assert!(crossing.contains("R5 0 3 <Empty>\n"));
    assert!(crossing.contains("R4 1 5 <Empty>\n"));

    let joined = deck("crossing_junction.json");
    assert!(joined.contains("R5 0 1 <Empty>\n"));
}

#[test]
fn test_vcvs_reads_probe_nodes() {
    let deck = deck("vcvs.json");
    assert!(deck.contains("V1 0 1 5\n"));
    assert!(deck.contains("E1 0 1 0 1 2\n"));
    assert!(deck.contains("; measurement of U1\n"));
}

#[test]
fn test_transistor_deck() {
    let deck = deck("transistor.json");
    assert!(deck.starts_with(".title Active DC Circuit\n.MODEL NPN_MODEL NPN\n"));
    assert!(deck.contains("R1 1 2 1k\nR2 1 0 1k\nQ1 2 1 0 NPN_MODEL\nVCC 2 0 12\n"));
}

#[test]
fn test_custom_title_and_transient_settings() {
    let options = CircuitOptions {
        title: "Bias point".to_string(),
        ..CircuitOptions::default()
    };
    let circuit = load_circuit(&fixture_path("loop_probe.json"), options).unwrap();
    let deck = SpiceEmitter::emit(&circuit).unwrap();
    assert!(deck.starts_with(".title Bias point\n"));
}

#[test]
fn test_invalid_fixtures_are_rejected() {
    for name in ["dangling.json", "shorted.json"] {
        let circuit = load_circuit(&fixture_path(name), CircuitOptions::default()).unwrap();
        assert!(
            matches!(SpiceEmitter::emit(&circuit), Err(EmitError::InvalidCircuit(_))),
            "{} should not produce a deck",
            name
        );
    }
}
