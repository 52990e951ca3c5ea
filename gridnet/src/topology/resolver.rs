//! Node Equivalence Resolver
//!
//! Groups grid points joined by SHORT edges into electrical nodes. A point
//! with four incident edges and no junction marker is an x-node: wires cross
//! there without connecting, so traversal passes straight through and each
//! axis of the x-node is classified on its own.

use crate::grid::{Axis, Coord, GridSpec, Side};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

/// Index of an equivalence class, assigned in discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub usize);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Class membership of one grid point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointClass {
    Single { class: ClassId },
    Crossing { horizontal: ClassId, vertical: ClassId },
}

impl PointClass {
    pub fn on_axis(&self, axis: Axis) -> ClassId {
        match (*self, axis) {
            (PointClass::Single { class }, _) => class,
            (PointClass::Crossing { horizontal, .. }, Axis::Horizontal) => horizontal,
            (PointClass::Crossing { vertical, .. }, Axis::Vertical) => vertical,
        }
    }

    pub fn is_crossing(&self) -> bool {
        matches!(self, PointClass::Crossing { .. })
    }
}

/// Resolved classes for a whole grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquivalenceClasses {
    rows: usize,
    cols: usize,
    points: Vec<PointClass>,
    count: usize,
}

impl EquivalenceClasses {
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn point(&self, at: Coord) -> Option<&PointClass> {
        if at.row >= self.rows || at.col >= self.cols {
            return None;
        }
        self.points.get(at.row * self.cols + at.col)
    }

    /// Class of a point as seen along `axis`. X-nodes answer per axis,
    /// every other point ignores the axis.
    pub fn class_at(&self, at: Coord, axis: Axis) -> Option<ClassId> {
        self.point(at).map(|p| p.on_axis(axis))
    }

    /// `(point, axis) -> class` for every x-node, row-major, horizontal first.
    pub fn crossing_table(&self) -> Vec<(Coord, Axis, ClassId)> {
        let mut table = Vec::new();
        for (idx, point) in self.points.iter().enumerate() {
            if let PointClass::Crossing { horizontal, vertical } = *point {
                let at = Coord::new(idx / self.cols, idx % self.cols);
                table.push((at, Axis::Horizontal, horizontal));
                table.push((at, Axis::Vertical, vertical));
            }
        }
        table
    }

    /// Points belonging to a class. An x-node is listed when either axis matches.
    pub fn members(&self, class: ClassId) -> Vec<Coord> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| match p {
                PointClass::Single { class: c } => *c == class,
                PointClass::Crossing { horizontal, vertical } => {
                    *horizontal == class || *vertical == class
                }
            })
            .map(|(idx, _)| Coord::new(idx / self.cols, idx % self.cols))
            .collect()
    }
}

pub struct NodeEquivalenceResolver;

impl NodeEquivalenceResolver {
    pub fn is_x_node(spec: &GridSpec, at: Coord) -> bool {
        spec.incident_edges(at) == 4 && !spec.has_junction(at)
    }

    fn short_towards(spec: &GridSpec, at: Coord, side: Side) -> Option<Coord> {
        spec.edge(at, side)
            .filter(|component| component.kind.is_short())
            .and_then(|_| spec.neighbor(at, side))
    }

    pub fn resolve(spec: &GridSpec) -> EquivalenceClasses {
        let rows = spec.rows();
        let cols = spec.cols();
        let idx = |at: Coord| at.row * cols + at.col;

        let x_nodes: Vec<bool> = spec.coords().map(|at| Self::is_x_node(spec, at)).collect();
        let mut single: Vec<Option<ClassId>> = vec![None; rows * cols];
        let mut crossing: BTreeMap<(Coord, Axis), ClassId> = BTreeMap::new();
        let mut next = 0usize;

        for start in spec.coords() {
            if x_nodes[idx(start)] || single[idx(start)].is_some() {
                continue;
            }

            let class = ClassId(next);
            next += 1;

            // (point, side it was entered from)
            let mut queue: VecDeque<(Coord, Option<Side>)> = VecDeque::new();
            queue.push_back((start, None));

            while let Some((at, from)) = queue.pop_front() {
                if x_nodes[idx(at)] {
                    let Some(from) = from else { continue };
                    let axis = from.axis();
                    if crossing.get(&(at, axis)) == Some(&class) {
                        continue;
                    }
                    crossing.insert((at, axis), class);
                    tracing::debug!(%at, %axis, %class, "x-node axis joined class");

                    let onward = from.opposite();
                    if let Some(next_point) = Self::short_towards(spec, at, onward) {
                        queue.push_back((next_point, Some(onward.opposite())));
                    }
                    continue;
                }

                if single[idx(at)].is_some() {
                    continue;
                }
                single[idx(at)] = Some(class);

                for side in Side::ALL {
                    if let Some(next_point) = Self::short_towards(spec, at, side) {
                        queue.push_back((next_point, Some(side.opposite())));
                    }
                }
            }
        }

        // Axes of x-nodes no traversal reached get their own class.
        for at in spec.coords() {
            if !x_nodes[idx(at)] {
                continue;
            }
            for axis in [Axis::Horizontal, Axis::Vertical] {
                if spec.has_axis_edge(at, axis) && !crossing.contains_key(&(at, axis)) {
                    crossing.insert((at, axis), ClassId(next));
                    next += 1;
                }
            }
        }

        let points = spec
            .coords()
            .map(|at| {
                if x_nodes[idx(at)] {
                    PointClass::Crossing {
                        horizontal: crossing[&(at, Axis::Horizontal)],
                        vertical: crossing[&(at, Axis::Vertical)],
                    }
                } else {
                    PointClass::Single {
                        class: single[idx(at)].unwrap_or(ClassId(0)),
                    }
                }
            })
            .collect();

        tracing::debug!(classes = next, "resolved equivalence classes");
        EquivalenceClasses {
            rows,
            cols,
            points,
            count: next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{EdgeComponent, UnitScale};

    fn plus_3x3(junction: bool) -> GridSpec {
        let mut builder = GridSpec::builder(3, 3)
            .hedge(1, 0, EdgeComponent::short())
            .hedge(1, 1, EdgeComponent::short())
            .vedge(0, 1, EdgeComponent::short())
            .vedge(1, 1, EdgeComponent::short());
        if junction {
            builder = builder.junction(1, 1);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_all_short_2x2_is_one_class() {
        let spec = GridSpec::builder(2, 2)
            .hedge(0, 0, EdgeComponent::short())
            .hedge(1, 0, EdgeComponent::short())
            .vedge(0, 0, EdgeComponent::short())
            .vedge(0, 1, EdgeComponent::short())
            .build()
            .unwrap();
        let classes = NodeEquivalenceResolver::resolve(&spec);
        assert_eq!(classes.count(), 1);
        for at in spec.coords() {
            assert_eq!(classes.class_at(at, Axis::Horizontal), Some(ClassId(0)));
        }
    }

    #[test]
    fn test_unmarked_crossing_keeps_axes_apart() {
        let spec = plus_3x3(false);
        let classes = NodeEquivalenceResolver::resolve(&spec);
        let centre = Coord::new(1, 1);

        let h = classes.class_at(centre, Axis::Horizontal).unwrap();
        let v = classes.class_at(centre, Axis::Vertical).unwrap();
        assert_ne!(h, v);

        assert_eq!(classes.class_at(Coord::new(1, 0), Axis::Vertical), Some(h));
        assert_eq!(classes.class_at(Coord::new(1, 2), Axis::Vertical), Some(h));
        assert_eq!(classes.class_at(Coord::new(0, 1), Axis::Horizontal), Some(v));
        assert_eq!(classes.class_at(Coord::new(2, 1), Axis::Horizontal), Some(v));

        let table = classes.crossing_table();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0], (centre, Axis::Horizontal, h));
        assert_eq!(table[1], (centre, Axis::Vertical, v));
    }

    #[test]
    fn test_junction_joins_all_arms() {
        let spec = plus_3x3(true);
        let classes = NodeEquivalenceResolver::resolve(&spec);
        let centre = classes.class_at(Coord::new(1, 1), Axis::Horizontal).unwrap();
        for at in [
            Coord::new(0, 1),
            Coord::new(1, 0),
            Coord::new(1, 2),
            Coord::new(2, 1),
        ] {
            assert_eq!(classes.class_at(at, Axis::Horizontal), Some(centre));
        }
        assert!(classes.crossing_table().is_empty());
        // centre group plus the four isolated corners
        assert_eq!(classes.count(), 5);
    }

    #[test]
    fn test_non_short_edges_do_not_merge() {
        let spec = GridSpec::builder(2, 2)
            .hedge(0, 0, EdgeComponent::resistor("1", 1.0, UnitScale::One))
            .build()
            .unwrap();
        let classes = NodeEquivalenceResolver::resolve(&spec);
        assert_eq!(classes.count(), 4);
        assert_ne!(
            classes.class_at(Coord::new(0, 0), Axis::Horizontal),
            classes.class_at(Coord::new(0, 1), Axis::Horizontal)
        );
    }

    #[test]
    fn test_untraversed_crossing_axis_gets_fresh_class() {
        // Centre has four edges but only resistors on the vertical axis.
        let spec = GridSpec::builder(3, 3)
            .hedge(1, 0, EdgeComponent::short())
            .hedge(1, 1, EdgeComponent::short())
            .vedge(0, 1, EdgeComponent::resistor("1", 1.0, UnitScale::One))
            .vedge(1, 1, EdgeComponent::resistor("2", 1.0, UnitScale::One))
            .build()
            .unwrap();
        let classes = NodeEquivalenceResolver::resolve(&spec);
        let centre = Coord::new(1, 1);
        let h = classes.class_at(centre, Axis::Horizontal).unwrap();
        let v = classes.class_at(centre, Axis::Vertical).unwrap();
        assert_eq!(v, ClassId(classes.count() - 1));
        assert_ne!(h, v);
        assert_eq!(classes.class_at(Coord::new(1, 0), Axis::Horizontal), Some(h));
    }

    #[test]
    fn test_deterministic() {
        let spec = plus_3x3(false);
        assert_eq!(
            NodeEquivalenceResolver::resolve(&spec),
            NodeEquivalenceResolver::resolve(&spec)
        );
    }
}
