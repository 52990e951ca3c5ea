//! Editor save-file adapter
//!
//! The desktop editor stores a grid as parallel integer matrices keyed by
//! field name. This module reads that JSON and turns it into a [`GridSpec`].
//! Numeric codes exist only here; everything past this boundary uses enums.

use super::component::{ComponentKind, EdgeComponent, MeasureKind, Measurement, Quantity, UnitScale};
use super::device::{DeviceKind, NodeDevice, Orientation};
use super::{Coord, GridError, GridSpec, Layout};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label cell: the editor writes integers, older files floats, hand-edited
/// files strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Default for LabelValue {
    fn default() -> Self {
        LabelValue::Int(0)
    }
}

impl LabelValue {
    fn as_int(&self) -> Option<i64> {
        match self {
            LabelValue::Int(v) => Some(*v),
            LabelValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            LabelValue::Float(_) => None,
            LabelValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Text form; `none` lists the integer values meaning "no label".
    fn to_label(&self, none: &[i64]) -> String {
        if let Some(v) = self.as_int() {
            if none.contains(&v) {
                return String::new();
            }
            return v.to_string();
        }
        match self {
            LabelValue::Float(v) => v.to_string(),
            LabelValue::Text(s) => s.clone(),
            LabelValue::Int(v) => v.to_string(),
        }
    }
}

type Matrix<T> = Vec<Vec<T>>;
type PinMap = BTreeMap<String, [f64; 2]>;

/// Raw editor file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorGrid {
    pub m: usize,
    pub n: usize,

    pub has_hedge: Matrix<i64>,
    pub hcomp_type: Matrix<i64>,
    pub hcomp_label: Matrix<LabelValue>,
    pub hcomp_value: Matrix<f64>,
    pub hcomp_value_unit: Matrix<i64>,
    pub hcomp_direction: Matrix<i64>,
    #[serde(default)]
    pub hcomp_measure: Option<Matrix<i64>>,
    #[serde(default)]
    pub hcomp_measure_label: Option<Matrix<LabelValue>>,
    #[serde(default)]
    pub hcomp_measure_direction: Option<Matrix<i64>>,
    #[serde(default)]
    pub hcomp_control_meas_label: Option<Matrix<LabelValue>>,

    pub has_vedge: Matrix<i64>,
    pub vcomp_type: Matrix<i64>,
    pub vcomp_label: Matrix<LabelValue>,
    pub vcomp_value: Matrix<f64>,
    pub vcomp_value_unit: Matrix<i64>,
    pub vcomp_direction: Matrix<i64>,
    #[serde(default)]
    pub vcomp_measure: Option<Matrix<i64>>,
    #[serde(default)]
    pub vcomp_measure_label: Option<Matrix<LabelValue>>,
    #[serde(default)]
    pub vcomp_measure_direction: Option<Matrix<i64>>,
    #[serde(default)]
    pub vcomp_control_meas_label: Option<Matrix<LabelValue>>,

    pub node_comp_type: Matrix<i64>,
    pub node_comp_label: Matrix<LabelValue>,
    pub node_comp_orientation: Matrix<i64>,
    pub node_comp_connections: Matrix<Option<PinMap>>,
    #[serde(default)]
    pub node_comp_value: Option<Matrix<f64>>,
    #[serde(default)]
    pub node_comp_value_unit: Option<Matrix<i64>>,

    pub junction_marker: Matrix<i64>,
    #[serde(default)]
    pub horizontal_dis: Option<Vec<f64>>,
    #[serde(default)]
    pub vertical_dis: Option<Vec<f64>>,
    #[serde(default)]
    pub use_value_annotation: Option<bool>,
}

/// Per-axis view over the parallel edge matrices.
struct EdgeFields<'a> {
    prefix: &'static str,
    exists: &'a Matrix<i64>,
    kind: &'a Matrix<i64>,
    label: &'a Matrix<LabelValue>,
    value: &'a Matrix<f64>,
    unit: &'a Matrix<i64>,
    direction: &'a Matrix<i64>,
    measure: Option<&'a Matrix<i64>>,
    measure_label: Option<&'a Matrix<LabelValue>>,
    measure_direction: Option<&'a Matrix<i64>>,
    control_label: Option<&'a Matrix<LabelValue>>,
}

impl EditorGrid {
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Files saved without the flag annotate values.
    pub fn use_value_annotation(&self) -> bool {
        self.use_value_annotation.unwrap_or(true)
    }

    pub fn to_spec(&self) -> Result<GridSpec, GridError> {
        let (m, n) = (self.m, self.n);
        if m < 2 || n < 2 {
            return Err(GridError::Dimensions { rows: m, cols: n });
        }

        let layout = match (&self.horizontal_dis, &self.vertical_dis) {
            (Some(xs), Some(ys)) => Layout {
                xs: xs.clone(),
                ys: ys.clone(),
            },
            _ => Layout::uniform(m, n),
        };

        let horizontal = EdgeFields {
            prefix: "hcomp",
            exists: &self.has_hedge,
            kind: &self.hcomp_type,
            label: &self.hcomp_label,
            value: &self.hcomp_value,
            unit: &self.hcomp_value_unit,
            direction: &self.hcomp_direction,
            measure: self.hcomp_measure.as_ref(),
            measure_label: self.hcomp_measure_label.as_ref(),
            measure_direction: self.hcomp_measure_direction.as_ref(),
            control_label: self.hcomp_control_meas_label.as_ref(),
        };
        let vertical = EdgeFields {
            prefix: "vcomp",
            exists: &self.has_vedge,
            kind: &self.vcomp_type,
            label: &self.vcomp_label,
            value: &self.vcomp_value,
            unit: &self.vcomp_value_unit,
            direction: &self.vcomp_direction,
            measure: self.vcomp_measure.as_ref(),
            measure_label: self.vcomp_measure_label.as_ref(),
            measure_direction: self.vcomp_measure_direction.as_ref(),
            control_label: self.vcomp_control_meas_label.as_ref(),
        };

        let hedges = edge_matrix(&horizontal, m, n - 1)?;
        let vedges = edge_matrix(&vertical, m - 1, n)?;

        check_shape("node_comp_type", &self.node_comp_type, m, n)?;
        check_shape("node_comp_label", &self.node_comp_label, m, n)?;
        check_shape("node_comp_orientation", &self.node_comp_orientation, m, n)?;
        check_shape("node_comp_connections", &self.node_comp_connections, m, n)?;
        check_shape("junction_marker", &self.junction_marker, m, n)?;

        let mut devices = Vec::with_capacity(m);
        for i in 0..m {
            let mut row = Vec::with_capacity(n);
            for j in 0..n {
                row.push(self.device_at(i, j, &layout)?);
            }
            devices.push(row);
        }

        let junctions = self
            .junction_marker
            .iter()
            .map(|row| row.iter().map(|v| *v != 0).collect())
            .collect();

        tracing::debug!(rows = m, cols = n, "converted editor grid");
        GridSpec::from_parts(m, n, hedges, vedges, devices, junctions, Some(layout))
    }

    fn device_at(&self, i: usize, j: usize, layout: &Layout) -> Result<Option<NodeDevice>, GridError> {
        let code = self.node_comp_type[i][j];
        let kind = match DeviceKind::from_code(code) {
            Ok(Some(kind)) => kind,
            Ok(None) => return Ok(None),
            Err(code) => {
                return Err(GridError::UnknownCode {
                    field: "node_comp_type".to_string(),
                    code,
                })
            }
        };

        let label_cell = &self.node_comp_label[i][j];
        let label = label_cell
            .as_int()
            .map(|v| v.max(0) as u32)
            .ok_or_else(|| GridError::Label(format!("{:?} at ({}, {})", label_cell, i, j)))?;

        let orientation_code = self.node_comp_orientation[i][j];
        let orientation =
            Orientation::from_code(orientation_code).ok_or_else(|| GridError::UnknownCode {
                field: "node_comp_orientation".to_string(),
                code: orientation_code,
            })?;

        let mut device = NodeDevice::new(kind, label).oriented(orientation);

        if let Some(pins) = &self.node_comp_connections[i][j] {
            for (pin, [x, y]) in pins {
                match layout.locate(*x, *y) {
                    Some(target) => device.pins.insert(pin.clone(), target),
                    None => {
                        tracing::warn!(
                            device = %kind,
                            at = %Coord::new(i, j),
                            pin = %pin,
                            x,
                            y,
                            "pin coordinate matches no grid point, dropping"
                        );
                        continue;
                    }
                };
            }
        }

        let value = cell(self.node_comp_value.as_ref(), i, j).copied().unwrap_or(0.0);
        if value != 0.0 {
            let unit_code = cell(self.node_comp_value_unit.as_ref(), i, j).copied().unwrap_or(0);
            let scale = unit_scale("node_comp_value_unit", unit_code)?;
            device.value = Some(Quantity::new(value, scale));
        }

        Ok(Some(device))
    }
}

impl GridSpec {
    /// Parse an editor save file.
    pub fn from_editor_json(json: &str) -> Result<GridSpec, GridError> {
        EditorGrid::from_json(json)?.to_spec()
    }
}

fn edge_matrix(
    fields: &EdgeFields<'_>,
    rows: usize,
    cols: usize,
) -> Result<Vec<Vec<Option<EdgeComponent>>>, GridError> {
    let p = fields.prefix;
    let name = |suffix: &str| format!("{}_{}", p, suffix);
    check_shape(&format!("has_{}edge", &p[..1]), fields.exists, rows, cols)?;
    check_shape(&name("type"), fields.kind, rows, cols)?;
    check_shape(&name("label"), fields.label, rows, cols)?;
    check_shape(&name("value"), fields.value, rows, cols)?;
    check_shape(&name("value_unit"), fields.unit, rows, cols)?;
    check_shape(&name("direction"), fields.direction, rows, cols)?;
    if let Some(matrix) = fields.measure {
        check_shape(&name("measure"), matrix, rows, cols)?;
    }
    if let Some(matrix) = fields.measure_label {
        check_shape(&name("measure_label"), matrix, rows, cols)?;
    }
    if let Some(matrix) = fields.measure_direction {
        check_shape(&name("measure_direction"), matrix, rows, cols)?;
    }
    if let Some(matrix) = fields.control_label {
        check_shape(&name("control_meas_label"), matrix, rows, cols)?;
    }

    let mut out = Vec::with_capacity(rows);
    for i in 0..rows {
        let mut row = Vec::with_capacity(cols);
        for j in 0..cols {
            if fields.exists[i][j] == 0 {
                row.push(None);
                continue;
            }

            let scale = unit_scale(&name("value_unit"), fields.unit[i][j])?;
            let quantity = Quantity::new(fields.value[i][j], scale);
            let control = cell(fields.control_label, i, j)
                .map(|l| l.to_label(&[-1, 0]))
                .unwrap_or_default();
            let code = fields.kind[i][j];
            let kind = ComponentKind::from_code(code, quantity, control).ok_or_else(|| {
                GridError::UnknownCode {
                    field: name("type"),
                    code,
                }
            })?;

            let mut component = EdgeComponent::new(kind)
                .with_label(fields.label[i][j].to_label(&[]))
                .reversed(fields.direction[i][j] != 0);

            let measure_code = cell(fields.measure, i, j).copied().unwrap_or(0);
            let measure = MeasureKind::from_code(measure_code).map_err(|code| {
                GridError::UnknownCode {
                    field: name("measure"),
                    code,
                }
            })?;
            if let Some(kind) = measure {
                let label = cell(fields.measure_label, i, j)
                    .map(|l| l.to_label(&[-1]))
                    .unwrap_or_default();
                let reversed = cell(fields.measure_direction, i, j).copied().unwrap_or(0) != 0;
                component = component.with_measurement(Measurement {
                    kind,
                    label,
                    reversed,
                });
            }
            row.push(Some(component));
        }
        out.push(row);
    }
    Ok(out)
}

fn unit_scale(field: &str, code: i64) -> Result<UnitScale, GridError> {
    UnitScale::from_code(code).ok_or_else(|| GridError::UnknownCode {
        field: field.to_string(),
        code,
    })
}

fn cell<T>(matrix: Option<&Matrix<T>>, i: usize, j: usize) -> Option<&T> {
    matrix.and_then(|m| m.get(i)).and_then(|row| row.get(j))
}

fn check_shape<T>(field: &str, matrix: &Matrix<T>, rows: usize, cols: usize) -> Result<(), GridError> {
    let bad_row = matrix.iter().find(|row| row.len() != cols);
    if matrix.len() != rows || bad_row.is_some() {
        return Err(GridError::Shape {
            field: field.to_string(),
            rows,
            cols,
            found_rows: matrix.len(),
            found_cols: bad_row.or(matrix.first()).map(Vec::len).unwrap_or(0),
        });
    }
    Ok(())
}
