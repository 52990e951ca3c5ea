//! Grid circuit description
//!
//! A [`GridSpec`] is an m×n lattice of points. Horizontal edges join
//! `(r, c)` to `(r, c + 1)`, vertical edges join `(r, c)` to `(r + 1, c)`.
//! An edge exists iff it carries an [`EdgeComponent`]. Points may carry a
//! [`NodeDevice`] and a junction marker.

pub mod component;
pub mod device;
pub mod editor;

pub use component::{
    format_number, ComponentKind, Controlled, EdgeComponent, MeasureKind, Measurement, Quantity,
    UnitScale,
};
pub use device::{DeviceKind, NodeDevice, Orientation};
pub use editor::{EditorGrid, LabelValue};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance when mapping physical coordinates back to grid points.
const LOCATE_TOLERANCE: f64 = 0.01;
/// Default spacing between neighbouring grid points.
const DEFAULT_PITCH: f64 = 3.0;

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("grid must be at least 2x2, got {rows}x{cols}")]
    Dimensions { rows: usize, cols: usize },
    #[error("{field} has shape {found_rows}x{found_cols}, expected {rows}x{cols}")]
    Shape {
        field: String,
        rows: usize,
        cols: usize,
        found_rows: usize,
        found_cols: usize,
    },
    #[error("unknown {field} code {code}")]
    UnknownCode { field: String, code: i64 },
    #[error("{what} at {at} is outside the {rows}x{cols} grid")]
    OutOfGrid {
        what: String,
        at: Coord,
        rows: usize,
        cols: usize,
    },
    #[error("pin '{pin}' of {kind} at {device} targets {target}, outside the grid")]
    PinOutOfGrid {
        kind: DeviceKind,
        device: Coord,
        pin: String,
        target: Coord,
    },
    #[error("{kind} has no pin named '{pin}'")]
    UnknownPin { kind: DeviceKind, pin: String },
    #[error("invalid label {0}")]
    Label(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Grid point, row-major with row 0 at the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Point displaced by `(d_row, d_col)`, if it stays non-negative.
    pub fn offset(self, d_row: isize, d_col: isize) -> Option<Coord> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        Some(Coord { row, col })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn orthogonal(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Horizontal => f.write_str("horizontal"),
            Axis::Vertical => f.write_str("vertical"),
        }
    }
}

/// One of the four edges around a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Up,
    Down,
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Up, Side::Down, Side::Left, Side::Right];

    pub fn offset(self) -> (isize, isize) {
        match self {
            Side::Up => (-1, 0),
            Side::Down => (1, 0),
            Side::Left => (0, -1),
            Side::Right => (0, 1),
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Up => Side::Down,
            Side::Down => Side::Up,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Side::Up | Side::Down => Axis::Vertical,
            Side::Left | Side::Right => Axis::Horizontal,
        }
    }
}

/// Physical drawing coordinates of the grid lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// x per column.
    pub xs: Vec<f64>,
    /// y per row; row 0 is the top, so y usually decreases with the row.
    pub ys: Vec<f64>,
}

impl Layout {
    pub fn uniform(rows: usize, cols: usize) -> Self {
        Self {
            xs: (0..cols).map(|c| c as f64 * DEFAULT_PITCH).collect(),
            ys: (0..rows)
                .map(|r| (rows - 1 - r) as f64 * DEFAULT_PITCH)
                .collect(),
        }
    }

    pub fn position(&self, at: Coord) -> (f64, f64) {
        (
            self.xs.get(at.col).copied().unwrap_or(0.0),
            self.ys.get(at.row).copied().unwrap_or(0.0),
        )
    }

    /// Grid point whose physical position matches `(x, y)`.
    pub fn locate(&self, x: f64, y: f64) -> Option<Coord> {
        let row = self.ys.iter().position(|v| (v - y).abs() < LOCATE_TOLERANCE)?;
        let col = self.xs.iter().position(|v| (v - x).abs() < LOCATE_TOLERANCE)?;
        Some(Coord { row, col })
    }
}

/// One existing edge, seen from its first endpoint.
#[derive(Debug, Clone, Copy)]
pub struct Edge<'a> {
    pub from: Coord,
    pub to: Coord,
    pub axis: Axis,
    pub component: &'a EdgeComponent,
}

/// Immutable grid circuit description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGridSpec")]
pub struct GridSpec {
    rows: usize,
    cols: usize,
    hedges: Vec<Option<EdgeComponent>>,
    vedges: Vec<Option<EdgeComponent>>,
    devices: Vec<Option<NodeDevice>>,
    junctions: Vec<bool>,
    layout: Layout,
}

impl GridSpec {
    /// Empty grid with no edges or devices.
    pub fn new(rows: usize, cols: usize) -> Result<Self, GridError> {
        check_dimensions(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            hedges: vec![None; rows * (cols - 1)],
            vedges: vec![None; (rows - 1) * cols],
            devices: vec![None; rows * cols],
            junctions: vec![false; rows * cols],
            layout: Layout::uniform(rows, cols),
        })
    }

    pub fn builder(rows: usize, cols: usize) -> GridSpecBuilder {
        GridSpecBuilder::new(rows, cols)
    }

    /// Assemble a grid from row-major matrices and validate shapes and pins.
    pub fn from_parts(
        rows: usize,
        cols: usize,
        hedges: Vec<Vec<Option<EdgeComponent>>>,
        vedges: Vec<Vec<Option<EdgeComponent>>>,
        devices: Vec<Vec<Option<NodeDevice>>>,
        junctions: Vec<Vec<bool>>,
        layout: Option<Layout>,
    ) -> Result<Self, GridError> {
        check_dimensions(rows, cols)?;
        let hedges = flatten("horizontal edges", hedges, rows, cols - 1)?;
        let vedges = flatten("vertical edges", vedges, rows - 1, cols)?;
        let devices = flatten("devices", devices, rows, cols)?;
        let junctions = flatten("junction markers", junctions, rows, cols)?;
        let layout = match layout {
            Some(layout) => {
                if layout.xs.len() != cols || layout.ys.len() != rows {
                    return Err(GridError::Shape {
                        field: "layout".to_string(),
                        rows,
                        cols,
                        found_rows: layout.ys.len(),
                        found_cols: layout.xs.len(),
                    });
                }
                layout
            }
            None => Layout::uniform(rows, cols),
        };
        let spec = Self {
            rows,
            cols,
            hedges,
            vedges,
            devices,
            junctions,
            layout,
        };
        spec.check_devices()?;
        Ok(spec)
    }

    fn check_devices(&self) -> Result<(), GridError> {
        for (at, device) in self.devices() {
            for (pin, target) in &device.pins {
                if !device.kind.pins().contains(&pin.as_str()) {
                    return Err(GridError::UnknownPin {
                        kind: device.kind,
                        pin: pin.clone(),
                    });
                }
                if !self.contains(*target) {
                    return Err(GridError::PinOutOfGrid {
                        kind: device.kind,
                        device: at,
                        pin: pin.clone(),
                        target: *target,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn position(&self, at: Coord) -> (f64, f64) {
        self.layout.position(at)
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.row < self.rows && at.col < self.cols
    }

    /// All points in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Coord { row, col }))
    }

    /// Edge from `(row, col)` to `(row, col + 1)`.
    pub fn hedge(&self, row: usize, col: usize) -> Option<&EdgeComponent> {
        if row >= self.rows || col + 1 >= self.cols {
            return None;
        }
        self.hedges[row * (self.cols - 1) + col].as_ref()
    }

    /// Edge from `(row, col)` to `(row + 1, col)`.
    pub fn vedge(&self, row: usize, col: usize) -> Option<&EdgeComponent> {
        if row + 1 >= self.rows || col >= self.cols {
            return None;
        }
        self.vedges[row * self.cols + col].as_ref()
    }

    /// Edge incident to `at` on the given side.
    pub fn edge(&self, at: Coord, side: Side) -> Option<&EdgeComponent> {
        match side {
            Side::Right => self.hedge(at.row, at.col),
            Side::Down => self.vedge(at.row, at.col),
            Side::Left => at.col.checked_sub(1).and_then(|c| self.hedge(at.row, c)),
            Side::Up => at.row.checked_sub(1).and_then(|r| self.vedge(r, at.col)),
        }
    }

    pub fn neighbor(&self, at: Coord, side: Side) -> Option<Coord> {
        let (dr, dc) = side.offset();
        at.offset(dr, dc).filter(|c| self.contains(*c))
    }

    /// Number of existing edges around a point, whatever their type.
    pub fn incident_edges(&self, at: Coord) -> usize {
        Side::ALL
            .iter()
            .filter(|side| self.edge(at, **side).is_some())
            .count()
    }

    pub fn has_axis_edge(&self, at: Coord, axis: Axis) -> bool {
        Side::ALL
            .iter()
            .filter(|side| side.axis() == axis)
            .any(|side| self.edge(at, *side).is_some())
    }

    /// Existing edges in row-major order, the right edge of a point before
    /// the one below it.
    pub fn edges(&self) -> impl Iterator<Item = Edge<'_>> + '_ {
        self.coords().flat_map(move |at| {
            let right = self.hedge(at.row, at.col).map(|component| Edge {
                from: at,
                to: Coord::new(at.row, at.col + 1),
                axis: Axis::Horizontal,
                component,
            });
            let down = self.vedge(at.row, at.col).map(|component| Edge {
                from: at,
                to: Coord::new(at.row + 1, at.col),
                axis: Axis::Vertical,
                component,
            });
            right.into_iter().chain(down)
        })
    }

    pub fn device(&self, at: Coord) -> Option<&NodeDevice> {
        if !self.contains(at) {
            return None;
        }
        self.devices[at.row * self.cols + at.col].as_ref()
    }

    /// Devices in row-major order.
    pub fn devices(&self) -> impl Iterator<Item = (Coord, &NodeDevice)> + '_ {
        self.coords()
            .filter_map(move |at| self.device(at).map(|device| (at, device)))
    }

    pub fn has_junction(&self, at: Coord) -> bool {
        self.contains(at) && self.junctions[at.row * self.cols + at.col]
    }

    pub fn ground_points(&self) -> impl Iterator<Item = Coord> + '_ {
        self.devices()
            .filter(|(_, device)| device.kind == DeviceKind::Ground)
            .map(|(at, _)| at)
    }
}

/// Serialized form of a [`GridSpec`], checked through `from_parts` on load.
#[derive(Deserialize)]
struct RawGridSpec {
    rows: usize,
    cols: usize,
    hedges: Vec<Option<EdgeComponent>>,
    vedges: Vec<Option<EdgeComponent>>,
    devices: Vec<Option<NodeDevice>>,
    junctions: Vec<bool>,
    layout: Layout,
}

impl TryFrom<RawGridSpec> for GridSpec {
    type Error = GridError;

    fn try_from(raw: RawGridSpec) -> Result<Self, Self::Error> {
        check_dimensions(raw.rows, raw.cols)?;
        GridSpec::from_parts(
            raw.rows,
            raw.cols,
            unflatten(raw.hedges, raw.cols - 1),
            unflatten(raw.vedges, raw.cols),
            unflatten(raw.devices, raw.cols),
            unflatten(raw.junctions, raw.cols),
            Some(raw.layout),
        )
    }
}

/// Incremental construction of a [`GridSpec`].
#[derive(Debug)]
pub struct GridSpecBuilder {
    rows: usize,
    cols: usize,
    hedges: Vec<Vec<Option<EdgeComponent>>>,
    vedges: Vec<Vec<Option<EdgeComponent>>>,
    devices: Vec<Vec<Option<NodeDevice>>>,
    junctions: Vec<Vec<bool>>,
    layout: Option<Layout>,
    error: Option<GridError>,
}

impl GridSpecBuilder {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            hedges: vec![vec![None; cols.saturating_sub(1)]; rows],
            vedges: vec![vec![None; cols]; rows.saturating_sub(1)],
            devices: vec![vec![None; cols]; rows],
            junctions: vec![vec![false; cols]; rows],
            layout: None,
            error: None,
        }
    }

    fn out_of_grid(&mut self, what: &str, at: Coord) {
        if self.error.is_none() {
            self.error = Some(GridError::OutOfGrid {
                what: what.to_string(),
                at,
                rows: self.rows,
                cols: self.cols,
            });
        }
    }

    /// Place a component on the edge from `(row, col)` to `(row, col + 1)`.
    pub fn hedge(mut self, row: usize, col: usize, component: EdgeComponent) -> Self {
        match self.hedges.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => *slot = Some(component),
            None => self.out_of_grid("horizontal edge", Coord::new(row, col)),
        }
        self
    }

    /// Place a component on the edge from `(row, col)` to `(row + 1, col)`.
    pub fn vedge(mut self, row: usize, col: usize, component: EdgeComponent) -> Self {
        match self.vedges.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => *slot = Some(component),
            None => self.out_of_grid("vertical edge", Coord::new(row, col)),
        }
        self
    }

    pub fn device(mut self, row: usize, col: usize, device: NodeDevice) -> Self {
        match self.devices.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => *slot = Some(device),
            None => self.out_of_grid("device", Coord::new(row, col)),
        }
        self
    }

    pub fn junction(mut self, row: usize, col: usize) -> Self {
        match self.junctions.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => *slot = true,
            None => self.out_of_grid("junction", Coord::new(row, col)),
        }
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn build(self) -> Result<GridSpec, GridError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        GridSpec::from_parts(
            self.rows,
            self.cols,
            self.hedges,
            self.vedges,
            self.devices,
            self.junctions,
            self.layout,
        )
    }
}

fn check_dimensions(rows: usize, cols: usize) -> Result<(), GridError> {
    if rows < 2 || cols < 2 {
        return Err(GridError::Dimensions { rows, cols });
    }
    Ok(())
}

fn flatten<T>(
    field: &str,
    matrix: Vec<Vec<T>>,
    rows: usize,
    cols: usize,
) -> Result<Vec<T>, GridError> {
    let shape_error = |found_rows: usize, found_cols: usize| GridError::Shape {
        field: field.to_string(),
        rows,
        cols,
        found_rows,
        found_cols,
    };
    if matrix.len() != rows {
        let found_cols = matrix.first().map(Vec::len).unwrap_or(0);
        return Err(shape_error(matrix.len(), found_cols));
    }
    let mut flat = Vec::with_capacity(rows * cols);
    for row in matrix {
        if row.len() != cols {
            return Err(shape_error(rows, row.len()));
        }
        flat.extend(row);
    }
    Ok(flat)
}

fn unflatten<T: Clone>(flat: Vec<T>, cols: usize) -> Vec<Vec<T>> {
    flat.chunks(cols.max(1)).map(<[T]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        assert!(matches!(
            GridSpec::new(1, 3),
            Err(GridError::Dimensions { rows: 1, cols: 3 })
        ));
        let spec = GridSpec::new(2, 3).unwrap();
        assert_eq!(spec.edges().count(), 0);
        assert_eq!(spec.coords().count(), 6);
    }

    #[test]
    fn test_shape_mismatch() {
        let err = GridSpec::from_parts(
            2,
            2,
            vec![vec![None, None], vec![None]],
            vec![vec![None, None]],
            vec![vec![None, None], vec![None, None]],
            vec![vec![false, false], vec![false, false]],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, GridError::Shape { .. }));
    }

    #[test]
    fn test_edge_lookup() {
        let spec = GridSpec::builder(2, 2)
            .hedge(0, 0, EdgeComponent::short())
            .vedge(0, 1, EdgeComponent::resistor("1", 1.0, UnitScale::Kilo))
            .build()
            .unwrap();

        let a = Coord::new(0, 0);
        let b = Coord::new(0, 1);
        assert!(spec.edge(a, Side::Right).is_some());
        assert!(spec.edge(b, Side::Left).is_some());
        assert!(spec.edge(b, Side::Down).is_some());
        assert!(spec.edge(a, Side::Up).is_none());
        assert!(spec.edge(a, Side::Left).is_none());
        assert_eq!(spec.incident_edges(b), 2);

        let edges: Vec<_> = spec.edges().collect();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].axis, Axis::Horizontal);
        assert_eq!(edges[1].from, b);
        assert_eq!(edges[1].to, Coord::new(1, 1));
    }

    #[test]
    fn test_builder_out_of_grid() {
        let err = GridSpec::builder(2, 2)
            .hedge(0, 1, EdgeComponent::short())
            .build()
            .unwrap_err();
        assert!(matches!(err, GridError::OutOfGrid { .. }));
    }

    #[test]
    fn test_device_pins_validated() {
        let err = GridSpec::builder(2, 2)
            .device(
                0,
                0,
                NodeDevice::new(DeviceKind::Npn, 1).with_pin("gate", Coord::new(0, 1)),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, GridError::UnknownPin { .. }));

        let err = GridSpec::builder(2, 2)
            .device(
                0,
                0,
                NodeDevice::new(DeviceKind::Npn, 1).with_pin("base", Coord::new(0, 5)),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, GridError::PinOutOfGrid { .. }));
    }

    #[test]
    fn test_layout() {
        let layout = Layout::uniform(3, 2);
        assert_eq!(layout.position(Coord::new(0, 1)), (3.0, 6.0));
        assert_eq!(layout.position(Coord::new(2, 0)), (0.0, 0.0));
        assert_eq!(layout.locate(3.001, 3.0), Some(Coord::new(1, 1)));
        assert_eq!(layout.locate(1.5, 3.0), None);
    }

    #[test]
    fn test_deserialize_checks_shapes() {
        let spec = GridSpec::builder(2, 3)
            .hedge(0, 1, EdgeComponent::resistor("1", 1.0, UnitScale::Kilo))
            .vedge(0, 2, EdgeComponent::short())
            .build()
            .unwrap();
        let json = serde_json::to_value(&spec).unwrap();
        let back: GridSpec = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, spec);

        let mut truncated = json;
        truncated["hedges"].as_array_mut().unwrap().pop();
        let err = serde_json::from_value::<GridSpec>(truncated).unwrap_err();
        assert!(err.to_string().contains("horizontal edges"), "{}", err);
    }
}
