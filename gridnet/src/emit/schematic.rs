//! circuitikz schematic emitter
//!
//! Draws edges row-major (the right edge of each point, then the one below
//! it), then devices, then junction dots. Coordinates come from the grid
//! layout and are printed with one decimal place.
//!
//! The injected random source only picks between equivalent current-arrow
//! styles, so a fixed seed reproduces the output byte for byte.

use super::EmitError;
use crate::core::{Annotation, Circuit};
use crate::grid::{
    format_number, ComponentKind, Coord, DeviceKind, Edge, EdgeComponent, GridSpec, MeasureKind,
    NodeDevice,
};
use rand::Rng;

/// circuitikz flow-arrow placements.
const FLOW_DIRECTIONS: [&str; 4] = ["^>", ">_", "^>", "_>"];

type Point = (f64, f64);

fn pt((x, y): Point) -> String {
    format!("({:.1},{:.1})", x, y)
}

/// How a current label is attached to a branch.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ArrowStyle {
    /// Separate arrow beside the branch, on the given side of it.
    Beside(f64),
    /// Flow arrow drawn on the branch itself.
    Inline(&'static str),
}

pub struct SchematicEmitter;

impl SchematicEmitter {
    pub fn emit<R>(circuit: &Circuit, rng: &mut R) -> Result<String, EmitError>
    where
        R: Rng + ?Sized,
    {
        circuit.ensure_valid()?;
        let spec = circuit.spec();
        let annotation = circuit.options().annotation;
        let mut out = String::new();

        // Step 1: edges
        for edge in spec.edges() {
            out.push_str(&Self::edge(spec, &edge, annotation, rng));
        }

        // Step 2: devices
        for (at, device) in spec.devices() {
            out.push_str(&Self::device(spec, at, device));
        }

        // Step 3: junction dots
        for at in spec.coords().filter(|at| spec.has_junction(*at)) {
            out.push_str(&format!("\\node[circ] at {} {{}};\n", pt(spec.position(at))));
        }

        tracing::debug!(bytes = out.len(), "schematic emitted");
        Ok(out)
    }

    /// Uniform pick among the four flow placements.
    fn any_flow<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
        FLOW_DIRECTIONS[rng.gen_range(0..FLOW_DIRECTIONS.len())]
    }

    /// Source labels mostly sit on a separate arrow beside the symbol.
    fn source_arrow<R: Rng + ?Sized>(rng: &mut R) -> ArrowStyle {
        match rng.gen_range(0..22) {
            0..=9 => ArrowStyle::Beside(1.0),
            10..=19 => ArrowStyle::Beside(-1.0),
            20 => ArrowStyle::Inline(FLOW_DIRECTIONS[2]),
            _ => ArrowStyle::Inline(FLOW_DIRECTIONS[3]),
        }
    }

    fn side_arrow(a: Point, b: Point, side: f64, label: &str) -> String {
        let mid = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
        let (vx, vy) = (b.0 - a.0, b.1 - a.1);
        let len = (vx * vx + vy * vy).sqrt();
        let (ux, uy) = if len > f64::EPSILON {
            (vx / len, vy / len)
        } else {
            (1.0, 0.0)
        };
        let (nx, ny) = (-uy * side, ux * side);
        let arrow_mid = (mid.0 + 0.6 * nx, mid.1 + 0.6 * ny);
        let text_at = (mid.0 + nx, mid.1 + ny);
        let start = (arrow_mid.0 - 0.4 * ux, arrow_mid.1 - 0.4 * uy);
        let end = (arrow_mid.0 + 0.4 * ux, arrow_mid.1 + 0.4 * uy);
        format!(
            "\\draw[-latexslim] {} to {};\n\\node at ({:.1}, {:.1}) {{${}$}};\n",
            pt(start),
            pt(end),
            text_at.0,
            text_at.1,
            label
        )
    }

    fn edge<R: Rng + ?Sized>(
        spec: &GridSpec,
        edge: &Edge<'_>,
        annotation: Annotation,
        rng: &mut R,
    ) -> String {
        let component = edge.component;
        let (mut a, mut b) = (spec.position(edge.from), spec.position(edge.to));
        if component.reversed {
            std::mem::swap(&mut a, &mut b);
        }
        let label = component_label(component, annotation);
        let measure = component.measure_kind();
        let probe = probe_label(component);
        // Probe endpoints follow the probe's own direction.
        let (pa, pb) = if component.probe_aligned() { (a, b) } else { (b, a) };
        let v_extra = if component.probe_aligned() { "" } else { "^" };

        let mut out = String::new();
        match &component.kind {
            ComponentKind::Short => {
                out.push_str(&format!("\\draw {} to[short] {};\n", pt(a), pt(b)));
                if measure == Some(MeasureKind::Current) {
                    out.push_str(&format!(
                        "\\draw {} to[short, f{}=${}$] {};\n",
                        pt(pa),
                        Self::any_flow(rng),
                        probe,
                        pt(pb)
                    ));
                }
            }
            ComponentKind::VoltageSource(_) => {
                out.push_str(&format!(
                    "\\draw {a} to [short] {b};\n\\ctikzset{{american}};\n\\draw {a} to[rmeter, t, v=${l}$] {b};\n\\ctikzset{{european}};\n",
                    a = pt(a),
                    b = pt(b),
                    l = label
                ));
                if measure == Some(MeasureKind::Current) {
                    out.push_str(&format!(
                        "\\draw {} to[rmeter, f{}=${}$] {};\n",
                        pt(pa),
                        Self::any_flow(rng),
                        probe,
                        pt(pb)
                    ));
                }
            }
            ComponentKind::CurrentSource(_) | ComponentKind::Vccs(_) | ComponentKind::Cccs(_) => {
                let shape = if matches!(component.kind, ComponentKind::CurrentSource(_)) {
                    "I"
                } else {
                    "cisource"
                };
                let inline = if shape == "I" { "rmeter" } else { "cisource" };
                out.push_str(&format!("\\draw {} to[{}] {};\n", pt(a), shape, pt(b)));
                match Self::source_arrow(rng) {
                    ArrowStyle::Beside(side) => out.push_str(&Self::side_arrow(a, b, side, &label)),
                    ArrowStyle::Inline(flow) => out.push_str(&format!(
                        "\\draw {} to[{}, f{}=${}$] {};\n",
                        pt(a),
                        inline,
                        flow,
                        label,
                        pt(b)
                    )),
                }
                if measure == Some(MeasureKind::Voltage) {
                    let probe_shape = if shape == "I" { "rmeter" } else { "open" };
                    out.push_str(&format!(
                        "\\ctikzset{{american}};\n\\draw {} to[{}, v{}=${}$] {};\n\\ctikzset{{european}};\n",
                        pt(pa),
                        probe_shape,
                        v_extra,
                        probe,
                        pt(pb)
                    ));
                }
            }
            ComponentKind::Resistor(_) | ComponentKind::Capacitor(_) | ComponentKind::Inductor(_) => {
                let shape = match component.kind {
                    ComponentKind::Resistor(_) => "generic",
                    ComponentKind::Capacitor(_) => "C",
                    _ => "L",
                };
                out.push_str(&format!(
                    "\\draw {} to[{}, l=${}$, ] {};\n",
                    pt(a),
                    shape,
                    label,
                    pt(b)
                ));
                match measure {
                    Some(MeasureKind::Voltage) => out.push_str(&format!(
                        "\\ctikzset{{american}};\n\\draw {} to[{}, v{}=${}$] {};\n\\ctikzset{{european}};\n",
                        pt(pa),
                        shape,
                        v_extra,
                        probe,
                        pt(pb)
                    )),
                    Some(MeasureKind::Current) => out.push_str(&format!(
                        "\\draw {} to[{}, f{}=${}$] {};\n",
                        pt(pa),
                        shape,
                        Self::any_flow(rng),
                        probe,
                        pt(pb)
                    )),
                    None => {}
                }
            }
            ComponentKind::Open => {
                if measure == Some(MeasureKind::Voltage) {
                    out.push_str(&format!(
                        "\\ctikzset{{american}};\n\\draw {} to[open, v{}=${}$] {};\n\\ctikzset{{european}};\n",
                        pt(pa),
                        v_extra,
                        probe,
                        pt(pb)
                    ));
                }
            }
            ComponentKind::Vcvs(_) | ComponentKind::Ccvs(_) => {
                out.push_str(&format!(
                    "\\ctikzset{{american}};\n\\draw {a} to [short, v=${l}$] {b};\n\\ctikzset{{european}};\n\\draw {a} to[cvsource] {b};\n",
                    a = pt(a),
                    b = pt(b),
                    l = label
                ));
                if measure == Some(MeasureKind::Current) {
                    out.push_str(&format!(
                        "\\draw {} to[short, f{}=${}$] {};\n",
                        pt(pa),
                        Self::any_flow(rng),
                        probe,
                        pt(pb)
                    ));
                }
            }
        }
        out
    }

    fn device(spec: &GridSpec, at: Coord, device: &NodeDevice) -> String {
        let here = spec.position(at);
        let prefix = device.kind.prefix();
        let name = device.reference();
        let math = format!("{}_{{{}}}", prefix, device.label);
        let mut out = String::new();

        match device.kind {
            DeviceKind::Npn | DeviceKind::Pnp | DeviceKind::NMos | DeviceKind::PMos => {
                let title = match device.kind {
                    DeviceKind::Npn | DeviceKind::Pnp => "NPN/PNP Transistor",
                    DeviceKind::NMos => "MOSFET",
                    _ => "P-MOSFET",
                };
                out.push_str(&format!("% {} {}\n", title, math));
                out.push_str(&Self::symbol(device, &name, here));
                out.push_str(&Self::device_label(device, &math, here));

                let anchors = if device.kind.is_transistor() {
                    ["B", "C", "E"]
                } else {
                    ["G", "D", "S"]
                };
                for (slot, pin) in device.kind.pins().iter().enumerate() {
                    // unconnected pins get a stub one unit out, not a grid point
                    let target = match device.pin(pin) {
                        Some(target) => spec.position(target),
                        None => {
                            let Some((dr, dc)) =
                                device.kind.fallback_offset(pin, device.orientation)
                            else {
                                continue;
                            };
                            (here.0 + dc as f64, here.1 - dr as f64)
                        }
                    };
                    let path = if slot == 0 { "--" } else { "|-" };
                    out.push_str(&format!(
                        "\\draw ({}.{}) {} {};\n",
                        name,
                        anchors[slot],
                        path,
                        pt(target)
                    ));
                }
            }
            DeviceKind::Diode => {
                let angle = f64::from(device.orientation.angle()).to_radians();
                let (dx, dy) = (0.5 * angle.cos(), 0.5 * angle.sin());
                let start = (here.0 - dx, here.1 - dy);
                let end = (here.0 + dx, here.1 + dy);
                out.push_str(&format!("% Diode {}\n", math));
                out.push_str(&format!(
                    "\\draw {} to[D, l=${}$] {};\n",
                    pt(start),
                    math,
                    pt(end)
                ));
                for (pin, from) in [("anode", start), ("cathode", end)] {
                    if let Some(target) = device.pin(pin) {
                        out.push_str(&format!(
                            "\\draw {} -- {};\n",
                            pt(from),
                            pt(spec.position(target))
                        ));
                    }
                }
            }
            DeviceKind::OpAmp => {
                out.push_str(&format!("% Op Amp {}\n", math));
                out.push_str(&Self::symbol(device, &name, here));
                out.push_str(&Self::device_label(device, &math, here));
                for (pin, anchor) in [("in+", "+"), ("in-", "-"), ("out", "out")] {
                    if let Some(target) = device.pin(pin) {
                        out.push_str(&format!(
                            "\\draw ({}.{}) |- {};\n",
                            name,
                            anchor,
                            pt(spec.position(target))
                        ));
                    }
                }
            }
            DeviceKind::Ground => {
                out.push_str(&format!("% GND {}\n", math));
                out.push_str(&format!("\\draw {} node[ground] {{}};\n", pt(here)));
                if device.label > 0 {
                    out.push_str(&format!("\\node[above] at {} {{${}$}};\n", pt(here), math));
                }
            }
            kind => {
                let fill = if kind.is_port() {
                    "draw=black, fill=white"
                } else {
                    "fill=black"
                };
                let text = if device.label > 0 { math.clone() } else { prefix.to_string() };
                out.push_str(&format!("% {} {}\n", prefix, math));
                out.push_str(&format!("\\draw[{}] {} circle (2pt);\n", fill, pt(here)));
                out.push_str(&format!("\\node[above] at {} {{${}$}};\n", pt(here), text));
            }
        }
        out
    }

    fn symbol(device: &NodeDevice, name: &str, at: Point) -> String {
        let (rotation, xscale, yscale) = device.kind.transform(device.orientation);
        let mut options = format!("{}, rotate={}", device.kind.shape(), rotation);
        if xscale == -1 {
            options.push_str(", xscale=-1");
        }
        if yscale == -1 {
            options.push_str(", yscale=-1");
        }
        format!("\\node[{}] ({}) at {} {{}};\n", options, name, pt(at))
    }

    fn device_label(device: &NodeDevice, math: &str, at: Point) -> String {
        let (anchor, dx, dy) = device.orientation.label_anchor();
        format!(
            "\\node[{}, rotate=0] at {} {{${}$}};\n",
            anchor,
            pt((at.0 + dx, at.1 + dy)),
            math
        )
    }
}

/// Probe text, `U_{1}` or a bare `I`.
fn probe_label(component: &EdgeComponent) -> String {
    let Some(measurement) = &component.measurement else {
        return String::new();
    };
    let symbol = measurement.kind.symbol();
    if measurement.label.is_empty() {
        symbol.to_string()
    } else {
        format!("{}_{{{}}}", symbol, measurement.label)
    }
}

/// Component annotation in either value or label form.
pub fn component_label(component: &EdgeComponent, annotation: Annotation) -> String {
    let kind = &component.kind;
    let (symbol, unit) = match kind {
        ComponentKind::VoltageSource(_) => ("U", "V"),
        ComponentKind::CurrentSource(_) => ("I", "A"),
        ComponentKind::Resistor(_) => ("R", "\\Omega"),
        ComponentKind::Capacitor(_) => ("C", "F"),
        ComponentKind::Inductor(_) => ("L", "H"),
        _ => ("", ""),
    };

    if let Some(controlled) = kind.controlled() {
        let measured = match kind.control_kind() {
            Some(MeasureKind::Current) => "I",
            _ => "U",
        };
        let control = if controlled.control_label.is_empty() {
            measured.to_string()
        } else {
            format!("{}_{{ {} }}", measured, controlled.control_label)
        };
        return match annotation {
            Annotation::Value => format!("{} {}", format_number(controlled.gain.value), control),
            Annotation::Label => {
                let coefficient = if measured == "U" { "\\beta" } else { "\\alpha" };
                format!("{}_{{ {} }} {}", coefficient, component.label, control)
            }
        };
    }

    let Some(quantity) = kind.quantity() else {
        return String::new();
    };
    match annotation {
        Annotation::Value => format!(
            "{} \\mathrm{{ {}{} }}",
            format_number(quantity.value),
            quantity.scale.latex_prefix(),
            unit
        ),
        Annotation::Label if component.label.is_empty() => symbol.to_string(),
        Annotation::Label => {
            let sources = matches!(
                kind,
                ComponentKind::VoltageSource(_) | ComponentKind::CurrentSource(_)
            );
            if sources && component.has_numeric_label() {
                format!("{}_{{ S{} }}", symbol, component.label)
            } else {
                format!("{}_{{ {} }}", symbol, component.label)
            }
        }
    }
}
