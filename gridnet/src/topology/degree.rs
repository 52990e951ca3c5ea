//! Dangling-terminal check run before class resolution.

use crate::grid::{Coord, GridSpec, Side};

/// Counts connections per grid point and rejects points with exactly one.
pub struct DegreeValidator;

impl DegreeValidator {
    /// Degree of every point, row-major.
    pub fn degrees(spec: &GridSpec) -> Vec<usize> {
        let cols = spec.cols();
        let mut degree = vec![0usize; spec.rows() * cols];

        // Step 1: existing non-OPEN edges
        for at in spec.coords() {
            degree[at.row * cols + at.col] = Side::ALL
                .iter()
                .filter_map(|side| spec.edge(at, *side))
                .filter(|component| !component.kind.is_open())
                .count();
        }

        // Step 2: device pins count at the point they land on
        for (at, device) in spec.devices() {
            if device.kind.is_single_terminal() {
                degree[at.row * cols + at.col] += 1;
                continue;
            }
            for target in device.pins.values() {
                if spec.contains(*target) {
                    degree[target.row * cols + target.col] += 1;
                }
            }
        }

        degree
    }

    /// First point, row-major, with degree exactly one.
    pub fn find_dangling(spec: &GridSpec) -> Option<Coord> {
        let cols = spec.cols();
        Self::degrees(spec)
            .iter()
            .position(|d| *d == 1)
            .map(|idx| Coord::new(idx / cols, idx % cols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{DeviceKind, EdgeComponent, NodeDevice, UnitScale};

    #[test]
    fn test_closed_loop_has_no_dangling_point() {
        let spec = GridSpec::builder(2, 2)
            .hedge(0, 0, EdgeComponent::short())
            .hedge(1, 0, EdgeComponent::short())
            .vedge(0, 0, EdgeComponent::voltage_source("1", 5.0, UnitScale::One))
            .vedge(0, 1, EdgeComponent::resistor("1", 1.0, UnitScale::Kilo))
            .build()
            .unwrap();
        assert_eq!(DegreeValidator::degrees(&spec), vec![2, 2, 2, 2]);
        assert_eq!(DegreeValidator::find_dangling(&spec), None);
    }

    #[test]
    fn test_single_edge_dangles() {
        let spec = GridSpec::builder(2, 2)
            .hedge(1, 0, EdgeComponent::resistor("1", 1.0, UnitScale::One))
            .build()
            .unwrap();
        assert_eq!(DegreeValidator::find_dangling(&spec), Some(Coord::new(1, 0)));
    }

    #[test]
    fn test_open_edges_do_not_count() {
        let spec = GridSpec::builder(2, 2)
            .hedge(0, 0, EdgeComponent::open())
            .build()
            .unwrap();
        assert_eq!(DegreeValidator::degrees(&spec), vec![0, 0, 0, 0]);
        assert_eq!(DegreeValidator::find_dangling(&spec), None);
    }

    #[test]
    fn test_device_pins_add_degree() {
        let spec = GridSpec::builder(2, 2)
            .hedge(0, 0, EdgeComponent::short())
            .device(1, 1, NodeDevice::new(DeviceKind::Ground, 0))
            .device(
                1,
                0,
                NodeDevice::new(DeviceKind::Diode, 1)
                    .with_pin("anode", Coord::new(0, 0))
                    .with_pin("cathode", Coord::new(1, 1)),
            )
            .build()
            .unwrap();
        // (0,0): short + anode; (0,1): short; (1,1): ground + cathode
        assert_eq!(DegreeValidator::degrees(&spec), vec![2, 1, 0, 2]);
        assert_eq!(DegreeValidator::find_dangling(&spec), Some(Coord::new(0, 1)));
    }

    #[test]
    fn test_single_terminal_device_counts_at_its_point() {
        let isolated = GridSpec::builder(2, 2)
            .device(0, 1, NodeDevice::new(DeviceKind::Ground, 0))
            .build()
            .unwrap();
        assert_eq!(DegreeValidator::degrees(&isolated), vec![0, 1, 0, 0]);
        assert_eq!(DegreeValidator::find_dangling(&isolated), Some(Coord::new(0, 1)));

        // a ground closes an otherwise dangling wire end
        let wired = GridSpec::builder(2, 2)
            .hedge(0, 0, EdgeComponent::short())
            .vedge(0, 0, EdgeComponent::resistor("1", 1.0, UnitScale::One))
            .vedge(0, 1, EdgeComponent::short())
            .device(1, 1, NodeDevice::new(DeviceKind::Ground, 0))
            .device(1, 0, NodeDevice::new(DeviceKind::Ground, 0))
            .build()
            .unwrap();
        assert_eq!(DegreeValidator::degrees(&wired), vec![2, 2, 2, 2]);
        assert_eq!(DegreeValidator::find_dangling(&wired), None);
    }
}
