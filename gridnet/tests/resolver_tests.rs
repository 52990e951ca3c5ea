//! Node resolution over editor files with crossing wires

use gridnet::grid::Axis;
use gridnet::prelude::*;
use gridnet::topology::DegreeValidator;
use gridnet::{load_grid, Coord, NodeEquivalenceResolver};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_unmarked_crossing_keeps_wires_apart() {
    let spec = load_grid(&fixture_path("crossing.json")).unwrap();
    let centre = Coord::new(1, 1);
    assert!(NodeEquivalenceResolver::is_x_node(&spec, centre));

    let classes = NodeEquivalenceResolver::resolve(&spec);
    assert_eq!(classes.count(), 6);

    let horizontal = classes.class_at(centre, Axis::Horizontal).unwrap();
    let vertical = classes.class_at(centre, Axis::Vertical).unwrap();
    assert_ne!(horizontal, vertical);
    assert_eq!(classes.class_at(Coord::new(1, 0), Axis::Horizontal), Some(horizontal));
    assert_eq!(classes.class_at(Coord::new(1, 2), Axis::Vertical), Some(horizontal));
    assert_eq!(classes.class_at(Coord::new(0, 1), Axis::Horizontal), Some(vertical));
    assert_eq!(classes.class_at(Coord::new(2, 1), Axis::Horizontal), Some(vertical));

    let table = classes.crossing_table();
    assert_eq!(table.len(), 2);
    assert_eq!(table[0], (centre, Axis::Horizontal, horizontal));
    assert_eq!(table[1], (centre, Axis::Vertical, vertical));
}

#[test]
fn test_junction_joins_crossing() {
    let spec = load_grid(&fixture_path("crossing_junction.json")).unwrap();
    let centre = Coord::new(1, 1);
    assert!(!NodeEquivalenceResolver::is_x_node(&spec, centre));

    let classes = NodeEquivalenceResolver::resolve(&spec);
    assert_eq!(classes.count(), 5);
    assert!(classes.crossing_table().is_empty());
    assert_eq!(
        classes.class_at(Coord::new(1, 0), Axis::Horizontal),
        classes.class_at(Coord::new(0, 1), Axis::Horizontal)
    );
}

#[test]
fn test_crossing_circuit_stats() {
    let crossing = Circuit::build(
        load_grid(&fixture_path("crossing.json")).unwrap(),
        CircuitOptions::default(),
    );
    assert!(crossing.is_valid(), "{:?}", crossing.failure());
    let stats = crossing.stats();
    assert_eq!(stats.node_count, 6);
    assert_eq!(stats.branch_count, 8);
    assert_eq!(stats.separate_parts, 1);

    let joined = Circuit::build(
        load_grid(&fixture_path("crossing_junction.json")).unwrap(),
        CircuitOptions::default(),
    );
    assert!(joined.is_valid());
    assert_eq!(joined.stats().node_count, 5);
}

#[test]
fn test_every_class_has_members() {
    let spec = load_grid(&fixture_path("crossing.json")).unwrap();
    let classes = NodeEquivalenceResolver::resolve(&spec);
    for k in 0..classes.count() {
        assert!(
            !classes.members(gridnet::ClassId(k)).is_empty(),
            "class {} has no members",
            k
        );
    }
}

#[test]
fn test_dangling_detection() {
    let dangling = load_grid(&fixture_path("dangling.json")).unwrap();
    assert_eq!(
        DegreeValidator::find_dangling(&dangling),
        Some(Coord::new(0, 0))
    );

    let closed = load_grid(&fixture_path("loop_probe.json")).unwrap();
    assert_eq!(DegreeValidator::find_dangling(&closed), None);
}

#[test]
fn test_net_graph_path_through_crossing() {
    let circuit = Circuit::build(
        load_grid(&fixture_path("crossing.json")).unwrap(),
        CircuitOptions::default(),
    );
    let graph = circuit.graph();
    let path = graph.find_path("0", "5").unwrap();
    assert_eq!(path.first().map(String::as_str), Some("[0]"));
    assert_eq!(path.last().map(String::as_str), Some("[5]"));
    // net, element, net, element, ...
    assert_eq!(path.len() % 2, 1);
}
