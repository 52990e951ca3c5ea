//! Multi-pin and single-terminal devices placed on grid points.

use super::component::Quantity;
use super::{Axis, Coord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Npn,
    Pnp,
    Diode,
    OpAmp,
    NMos,
    PMos,
    Ground,
    Vcc,
    Vdd,
    Vss,
    Vee,
    Vbb,
    PortIn,
    PortOut,
}

const TRANSISTOR_PINS: &[&str] = &["base", "collector", "emitter"];
const MOSFET_PINS: &[&str] = &["gate", "drain", "source"];
const DIODE_PINS: &[&str] = &["anode", "cathode"];
const OPAMP_PINS: &[&str] = &["in+", "in-", "out"];

impl DeviceKind {
    /// Editor code; 0 means "no device" and maps to `Ok(None)`.
    pub fn from_code(code: i64) -> Result<Option<Self>, i64> {
        let kind = match code {
            0 => return Ok(None),
            1 => DeviceKind::Npn,
            2 => DeviceKind::Pnp,
            3 => DeviceKind::Diode,
            4 => DeviceKind::OpAmp,
            5 => DeviceKind::NMos,
            6 => DeviceKind::PMos,
            7 => DeviceKind::Ground,
            8 => DeviceKind::Vcc,
            9 => DeviceKind::Vdd,
            10 => DeviceKind::Vss,
            11 => DeviceKind::Vee,
            12 => DeviceKind::Vbb,
            13 => DeviceKind::PortIn,
            14 => DeviceKind::PortOut,
            other => return Err(other),
        };
        Ok(Some(kind))
    }

    /// Valid pin names. Empty for devices that sit on their own point.
    pub fn pins(self) -> &'static [&'static str] {
        match self {
            DeviceKind::Npn | DeviceKind::Pnp => TRANSISTOR_PINS,
            DeviceKind::NMos | DeviceKind::PMos => MOSFET_PINS,
            DeviceKind::Diode => DIODE_PINS,
            DeviceKind::OpAmp => OPAMP_PINS,
            _ => &[],
        }
    }

    pub fn is_single_terminal(self) -> bool {
        self.pins().is_empty()
    }

    pub fn is_transistor(self) -> bool {
        matches!(self, DeviceKind::Npn | DeviceKind::Pnp)
    }

    pub fn is_mosfet(self) -> bool {
        matches!(self, DeviceKind::NMos | DeviceKind::PMos)
    }

    pub fn is_supply(self) -> bool {
        matches!(
            self,
            DeviceKind::Vcc | DeviceKind::Vdd | DeviceKind::Vss | DeviceKind::Vee | DeviceKind::Vbb
        )
    }

    pub fn is_port(self) -> bool {
        matches!(self, DeviceKind::PortIn | DeviceKind::PortOut)
    }

    /// Reference prefix used for symbol names and labels.
    pub fn prefix(self) -> &'static str {
        match self {
            DeviceKind::Npn | DeviceKind::Pnp => "Q",
            DeviceKind::Diode => "D",
            DeviceKind::OpAmp => "U",
            DeviceKind::NMos | DeviceKind::PMos => "M",
            DeviceKind::Ground => "GND",
            DeviceKind::Vcc => "VCC",
            DeviceKind::Vdd => "VDD",
            DeviceKind::Vss => "VSS",
            DeviceKind::Vee => "VEE",
            DeviceKind::Vbb => "VBB",
            DeviceKind::PortIn => "VIN",
            DeviceKind::PortOut => "VOUT",
        }
    }

    /// circuitikz shape name for devices drawn as nodes.
    pub fn shape(self) -> &'static str {
        match self {
            DeviceKind::Npn => "npn",
            DeviceKind::Pnp => "pnp",
            DeviceKind::Diode => "D",
            DeviceKind::OpAmp => "op amp",
            DeviceKind::NMos => "nmos",
            DeviceKind::PMos => "pmos",
            DeviceKind::Ground => "ground",
            DeviceKind::Vcc => "vcc",
            DeviceKind::Vdd => "vdd",
            DeviceKind::Vss => "vss",
            DeviceKind::Vee => "vee",
            DeviceKind::Vbb => "vbb",
            DeviceKind::PortIn | DeviceKind::PortOut => "",
        }
    }

    /// `.MODEL` card for device families that need one.
    pub fn model(self) -> Option<(&'static str, &'static str)> {
        match self {
            DeviceKind::Npn => Some(("NPN_MODEL", "NPN")),
            DeviceKind::Pnp => Some(("PNP_MODEL", "PNP")),
            DeviceKind::NMos => Some(("NMOS_MODEL", "NMOS")),
            DeviceKind::PMos => Some(("PMOS_MODEL", "PMOS")),
            DeviceKind::Diode => Some(("DIODE_MODEL", "D")),
            _ => None,
        }
    }

    /// Axis used to look up the class of the point a pin lands on.
    pub fn pin_axis(self, pin: &str, orientation: Orientation) -> Axis {
        if self.is_single_terminal() {
            return Axis::Horizontal;
        }
        if self.is_transistor() || self.is_mosfet() {
            let control = pin == "base" || pin == "gate";
            if control {
                orientation.axis()
            } else {
                orientation.axis().orthogonal()
            }
        } else {
            orientation.axis()
        }
    }

    /// Direction `(d_row, d_col)` of the stub drawn for a transistor or
    /// MOSFET pin that is not connected.
    pub fn fallback_offset(self, pin: &str, orientation: Orientation) -> Option<(isize, isize)> {
        if !(self.is_transistor() || self.is_mosfet()) {
            return None;
        }
        let slot = self.pins().iter().position(|p| *p == pin)?;
        let table: [(isize, isize); 3] = match orientation {
            Orientation::Up => [(-1, 0), (0, -1), (0, 1)],
            Orientation::Right => [(0, 1), (-1, 0), (1, 0)],
            Orientation::Down => [(1, 0), (0, 1), (0, -1)],
            Orientation::Left => [(0, -1), (1, 0), (-1, 0)],
        };
        Some(table[slot])
    }

    /// `(rotation, xscale, yscale)` for the drawn symbol.
    pub fn transform(self, orientation: Orientation) -> (i32, i32, i32) {
        let rotation = orientation.angle();
        match self {
            DeviceKind::Npn | DeviceKind::NMos => (rotation, -1, 1),
            DeviceKind::Pnp | DeviceKind::PMos => (rotation, -1, -1),
            DeviceKind::OpAmp => (rotation, 1, -1),
            _ => (rotation, 1, 1),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceKind::Npn => "npn",
            DeviceKind::Pnp => "pnp",
            DeviceKind::Diode => "diode",
            DeviceKind::OpAmp => "opamp",
            DeviceKind::NMos => "nmos",
            DeviceKind::PMos => "pmos",
            DeviceKind::Ground => "ground",
            DeviceKind::Vcc => "vcc",
            DeviceKind::Vdd => "vdd",
            DeviceKind::Vss => "vss",
            DeviceKind::Vee => "vee",
            DeviceKind::Vbb => "vbb",
            DeviceKind::PortIn => "port_in",
            DeviceKind::PortOut => "port_out",
        };
        f.write_str(name)
    }
}

/// Direction the device's control pin (base, gate, output) points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Up,
    #[default]
    Right,
    Down,
    Left,
}

impl Orientation {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Orientation::Up),
            1 => Some(Orientation::Right),
            2 => Some(Orientation::Down),
            3 => Some(Orientation::Left),
            _ => None,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Orientation::Up | Orientation::Down => Axis::Vertical,
            Orientation::Right | Orientation::Left => Axis::Horizontal,
        }
    }

    /// Rotation in degrees, counter-clockwise from "right".
    pub fn angle(self) -> i32 {
        match self {
            Orientation::Up => 90,
            Orientation::Right => 0,
            Orientation::Down => -90,
            Orientation::Left => 180,
        }
    }

    /// Label anchor and offset from the device centre.
    pub fn label_anchor(self) -> (&'static str, f64, f64) {
        match self {
            Orientation::Up => ("above", 0.0, 0.5),
            Orientation::Right => ("right", 0.5, 0.0),
            Orientation::Down => ("below", 0.0, -0.5),
            Orientation::Left => ("left", -0.5, 0.0),
        }
    }
}

/// Device descriptor for one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDevice {
    pub kind: DeviceKind,
    pub label: u32,
    pub orientation: Orientation,
    /// Pin name to the grid point the pin connects to.
    pub pins: BTreeMap<String, Coord>,
    /// Supply or port value.
    pub value: Option<Quantity>,
}

impl NodeDevice {
    pub fn new(kind: DeviceKind, label: u32) -> Self {
        Self {
            kind,
            label,
            orientation: Orientation::default(),
            pins: BTreeMap::new(),
            value: None,
        }
    }

    pub fn oriented(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_pin(mut self, pin: impl Into<String>, target: Coord) -> Self {
        self.pins.insert(pin.into(), target);
        self
    }

    pub fn with_value(mut self, value: Quantity) -> Self {
        self.value = Some(value);
        self
    }

    /// Reference name such as `Q1`.
    pub fn reference(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.label)
    }

    pub fn pin(&self, name: &str) -> Option<Coord> {
        self.pins.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_axis() {
        assert_eq!(DeviceKind::Npn.pin_axis("base", Orientation::Up), Axis::Vertical);
        assert_eq!(DeviceKind::Npn.pin_axis("collector", Orientation::Up), Axis::Horizontal);
        assert_eq!(DeviceKind::NMos.pin_axis("gate", Orientation::Left), Axis::Horizontal);
        assert_eq!(DeviceKind::NMos.pin_axis("drain", Orientation::Left), Axis::Vertical);
        assert_eq!(DeviceKind::Diode.pin_axis("anode", Orientation::Down), Axis::Vertical);
        assert_eq!(DeviceKind::OpAmp.pin_axis("out", Orientation::Right), Axis::Horizontal);
        assert_eq!(DeviceKind::Vcc.pin_axis("node", Orientation::Up), Axis::Horizontal);
    }

    #[test]
    fn test_fallback_offsets() {
        assert_eq!(DeviceKind::Npn.fallback_offset("base", Orientation::Up), Some((-1, 0)));
        assert_eq!(DeviceKind::Pnp.fallback_offset("emitter", Orientation::Right), Some((1, 0)));
        assert_eq!(DeviceKind::PMos.fallback_offset("drain", Orientation::Left), Some((1, 0)));
        assert_eq!(DeviceKind::Diode.fallback_offset("anode", Orientation::Up), None);
        assert_eq!(DeviceKind::Npn.fallback_offset("gate", Orientation::Up), None);
    }

    #[test]
    fn test_transforms() {
        assert_eq!(DeviceKind::Npn.transform(Orientation::Up), (90, -1, 1));
        assert_eq!(DeviceKind::Pnp.transform(Orientation::Left), (180, -1, -1));
        assert_eq!(DeviceKind::PMos.transform(Orientation::Down), (-90, -1, -1));
        assert_eq!(DeviceKind::OpAmp.transform(Orientation::Right), (0, 1, -1));
    }

    #[test]
    fn test_codes() {
        assert_eq!(DeviceKind::from_code(0), Ok(None));
        assert_eq!(DeviceKind::from_code(7), Ok(Some(DeviceKind::Ground)));
        assert_eq!(DeviceKind::from_code(14), Ok(Some(DeviceKind::PortOut)));
        assert_eq!(DeviceKind::from_code(15), Err(15));
        assert_eq!(Orientation::from_code(3), Some(Orientation::Left));
        assert_eq!(Orientation::from_code(4), None);
    }
}
