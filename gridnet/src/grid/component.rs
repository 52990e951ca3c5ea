//! Edge component descriptors
//!
//! Two-terminal components that sit on grid edges. Payloads live on the
//! variants: passives and independent sources carry a value with a unit
//! scale, dependent sources carry a gain and the label of the measurement
//! that controls them, SHORT and OPEN carry nothing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metric prefix applied to a component value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitScale {
    #[default]
    One,
    Kilo,
    Milli,
    Micro,
    Nano,
    Pico,
}

impl UnitScale {
    /// Editor code order: `1, k, m, u, n, p`.
    pub const ALL: [UnitScale; 6] = [
        UnitScale::One,
        UnitScale::Kilo,
        UnitScale::Milli,
        UnitScale::Micro,
        UnitScale::Nano,
        UnitScale::Pico,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Suffix understood by SPICE value parsing.
    pub fn spice_suffix(self) -> &'static str {
        match self {
            UnitScale::One => "",
            UnitScale::Kilo => "k",
            UnitScale::Milli => "m",
            UnitScale::Micro => "u",
            UnitScale::Nano => "n",
            UnitScale::Pico => "p",
        }
    }

    /// Prefix used inside a LaTeX `\mathrm{}` group.
    pub fn latex_prefix(self) -> &'static str {
        match self {
            UnitScale::One => "",
            UnitScale::Kilo => "k",
            UnitScale::Milli => "m",
            UnitScale::Micro => "\\mu ",
            UnitScale::Nano => "n",
            UnitScale::Pico => "p",
        }
    }
}

/// A value with its unit scale, e.g. `4` `k` for 4 kOhm.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub scale: UnitScale,
}

impl Quantity {
    pub fn new(value: f64, scale: UnitScale) -> Self {
        Self { value, scale }
    }

    /// SPICE value token, `4k`, `10m`, `3`.
    pub fn to_spice(&self) -> String {
        format!("{}{}", format_number(self.value), self.scale.spice_suffix())
    }
}

/// Gain and control reference of a dependent source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Controlled {
    pub gain: Quantity,
    /// Label of the measurement probe that drives this source. Empty when
    /// the source has no control reference.
    pub control_label: String,
}

impl Controlled {
    /// Unscaled gain.
    pub fn new(gain: f64, control_label: impl Into<String>) -> Self {
        Self::scaled(Quantity::new(gain, UnitScale::One), control_label)
    }

    pub fn scaled(gain: Quantity, control_label: impl Into<String>) -> Self {
        Self {
            gain,
            control_label: control_label.into(),
        }
    }
}

/// Component type with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ComponentKind {
    Short,
    VoltageSource(Quantity),
    CurrentSource(Quantity),
    Resistor(Quantity),
    Capacitor(Quantity),
    Inductor(Quantity),
    Open,
    Vccs(Controlled),
    Vcvs(Controlled),
    Cccs(Controlled),
    Ccvs(Controlled),
}

impl ComponentKind {
    /// Build a kind from the editor's integer code. The editor stores value,
    /// unit and control label in parallel matrices, so they are passed in here.
    pub fn from_code(code: i64, quantity: Quantity, control_label: String) -> Option<Self> {
        let controlled = || Controlled::scaled(quantity, control_label.clone());
        let kind = match code {
            0 => ComponentKind::Short,
            1 => ComponentKind::VoltageSource(quantity),
            2 => ComponentKind::CurrentSource(quantity),
            3 => ComponentKind::Resistor(quantity),
            4 => ComponentKind::Capacitor(quantity),
            5 => ComponentKind::Inductor(quantity),
            6 => ComponentKind::Open,
            7 => ComponentKind::Vccs(controlled()),
            8 => ComponentKind::Vcvs(controlled()),
            9 => ComponentKind::Cccs(controlled()),
            10 => ComponentKind::Ccvs(controlled()),
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_short(&self) -> bool {
        matches!(self, ComponentKind::Short)
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ComponentKind::Open)
    }

    /// Capacitors and inductors force a transient analysis.
    pub fn is_reactive(&self) -> bool {
        matches!(self, ComponentKind::Capacitor(_) | ComponentKind::Inductor(_))
    }

    pub fn quantity(&self) -> Option<&Quantity> {
        match self {
            ComponentKind::VoltageSource(q)
            | ComponentKind::CurrentSource(q)
            | ComponentKind::Resistor(q)
            | ComponentKind::Capacitor(q)
            | ComponentKind::Inductor(q) => Some(q),
            _ => None,
        }
    }

    pub fn controlled(&self) -> Option<&Controlled> {
        match self {
            ComponentKind::Vccs(c)
            | ComponentKind::Vcvs(c)
            | ComponentKind::Cccs(c)
            | ComponentKind::Ccvs(c) => Some(c),
            _ => None,
        }
    }

    /// Measurement kind a dependent source is controlled by.
    pub fn control_kind(&self) -> Option<MeasureKind> {
        match self {
            ComponentKind::Vccs(_) | ComponentKind::Vcvs(_) => Some(MeasureKind::Voltage),
            ComponentKind::Cccs(_) | ComponentKind::Ccvs(_) => Some(MeasureKind::Current),
            _ => None,
        }
    }

    /// Whether the component cannot carry a probe of the given kind: a wire
    /// has no voltage, an open has no current, an ideal source fixes the
    /// quantity it would be probed for.
    pub fn conflicts_with(&self, measure: MeasureKind) -> bool {
        match measure {
            MeasureKind::Voltage => matches!(
                self,
                ComponentKind::Short
                    | ComponentKind::VoltageSource(_)
                    | ComponentKind::Vcvs(_)
                    | ComponentKind::Ccvs(_)
            ),
            MeasureKind::Current => matches!(
                self,
                ComponentKind::Open
                    | ComponentKind::CurrentSource(_)
                    | ComponentKind::Vccs(_)
                    | ComponentKind::Cccs(_)
            ),
        }
    }

    /// SPICE element letter; empty for SHORT and OPEN, which have no card.
    pub fn spice_prefix(&self) -> &'static str {
        match self {
            ComponentKind::Short | ComponentKind::Open => "",
            ComponentKind::VoltageSource(_) => "V",
            ComponentKind::CurrentSource(_) => "I",
            ComponentKind::Resistor(_) => "R",
            ComponentKind::Capacitor(_) => "C",
            ComponentKind::Inductor(_) => "L",
            ComponentKind::Vccs(_) => "G",
            ComponentKind::Vcvs(_) => "E",
            ComponentKind::Cccs(_) => "F",
            ComponentKind::Ccvs(_) => "H",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Short => "short",
            ComponentKind::VoltageSource(_) => "voltage_source",
            ComponentKind::CurrentSource(_) => "current_source",
            ComponentKind::Resistor(_) => "resistor",
            ComponentKind::Capacitor(_) => "capacitor",
            ComponentKind::Inductor(_) => "inductor",
            ComponentKind::Open => "open",
            ComponentKind::Vccs(_) => "vccs",
            ComponentKind::Vcvs(_) => "vcvs",
            ComponentKind::Cccs(_) => "cccs",
            ComponentKind::Ccvs(_) => "ccvs",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    Voltage,
    Current,
}

impl MeasureKind {
    /// Editor code: 0 none, 1 voltage, 2 current.
    pub fn from_code(code: i64) -> Result<Option<Self>, i64> {
        match code {
            0 => Ok(None),
            1 => Ok(Some(MeasureKind::Voltage)),
            2 => Ok(Some(MeasureKind::Current)),
            other => Err(other),
        }
    }

    /// Symbol used in drawn labels and SPICE comments.
    pub fn symbol(self) -> &'static str {
        match self {
            MeasureKind::Voltage => "U",
            MeasureKind::Current => "I",
        }
    }
}

impl fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureKind::Voltage => f.write_str("voltage"),
            MeasureKind::Current => f.write_str("current"),
        }
    }
}

/// Probe attached to an edge component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub kind: MeasureKind,
    pub label: String,
    /// Probe polarity bit, compared against the component's own direction bit.
    pub reversed: bool,
}

impl Measurement {
    pub fn voltage(label: impl Into<String>) -> Self {
        Self {
            kind: MeasureKind::Voltage,
            label: label.into(),
            reversed: false,
        }
    }

    pub fn current(label: impl Into<String>) -> Self {
        Self {
            kind: MeasureKind::Current,
            label: label.into(),
            reversed: false,
        }
    }

    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }
}

/// Everything placed on one existing edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeComponent {
    pub kind: ComponentKind,
    pub label: String,
    /// Direction bit: set means the declared reference runs from the second
    /// endpoint (right/below) to the first.
    pub reversed: bool,
    pub measurement: Option<Measurement>,
}

impl EdgeComponent {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            label: String::new(),
            reversed: false,
            measurement: None,
        }
    }

    pub fn short() -> Self {
        Self::new(ComponentKind::Short)
    }

    pub fn open() -> Self {
        Self::new(ComponentKind::Open)
    }

    pub fn resistor(label: impl Into<String>, value: f64, scale: UnitScale) -> Self {
        Self::new(ComponentKind::Resistor(Quantity::new(value, scale))).with_label(label)
    }

    pub fn capacitor(label: impl Into<String>, value: f64, scale: UnitScale) -> Self {
        Self::new(ComponentKind::Capacitor(Quantity::new(value, scale))).with_label(label)
    }

    pub fn inductor(label: impl Into<String>, value: f64, scale: UnitScale) -> Self {
        Self::new(ComponentKind::Inductor(Quantity::new(value, scale))).with_label(label)
    }

    pub fn voltage_source(label: impl Into<String>, value: f64, scale: UnitScale) -> Self {
        Self::new(ComponentKind::VoltageSource(Quantity::new(value, scale))).with_label(label)
    }

    pub fn current_source(label: impl Into<String>, value: f64, scale: UnitScale) -> Self {
        Self::new(ComponentKind::CurrentSource(Quantity::new(value, scale))).with_label(label)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    pub fn with_measurement(mut self, measurement: Measurement) -> Self {
        self.measurement = Some(measurement);
        self
    }

    pub fn measure_kind(&self) -> Option<MeasureKind> {
        self.measurement.as_ref().map(|m| m.kind)
    }

    /// True when the probe points the same way as the component reference.
    pub fn probe_aligned(&self) -> bool {
        self.measurement
            .as_ref()
            .map(|m| m.reversed == self.reversed)
            .unwrap_or(true)
    }

    /// Labels made only of digits are rendered with numeric subscripts.
    pub fn has_numeric_label(&self) -> bool {
        !self.label.is_empty() && self.label.chars().all(|c| c.is_ascii_digit())
    }
}

/// Print a number without a trailing `.0` when it is integral.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
