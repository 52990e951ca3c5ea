//! SPICE deck emitter
//!
//! Produces a deck with `.MODEL` cards for the device families present,
//! one element card per branch in insertion order, and a `.control` block.
//! Circuits without capacitors or inductors get an operating point analysis
//! with one `print` line per measurement probe; the others get a transient
//! analysis and no prints.

use super::EmitError;
use crate::core::{Annotation, Circuit, CircuitOptions};
use crate::grid::{format_number, ComponentKind, DeviceKind, MeasureKind, Quantity};
use crate::netlist::{control_branch, Branch, DeviceBranch, TwoTerminal, GROUND};
use std::collections::HashSet;

/// Device families that need a `.MODEL` card, in card order.
const MODEL_ORDER: [DeviceKind; 5] = [
    DeviceKind::Npn,
    DeviceKind::Pnp,
    DeviceKind::NMos,
    DeviceKind::PMos,
    DeviceKind::Diode,
];

/// Value written in place of component values when annotating by label.
const EMPTY_VALUE: &str = "<Empty>";

pub struct SpiceEmitter;

impl SpiceEmitter {
    pub fn emit(circuit: &Circuit) -> Result<String, EmitError> {
        circuit.ensure_valid()?;
        let branches = circuit.branches();
        let options = circuit.options();

        // Step 1: models
        let mut models = String::new();
        for kind in MODEL_ORDER {
            let present = branches
                .iter()
                .filter_map(Branch::as_device)
                .any(|d| d.kind == kind);
            if let (true, Some((name, family))) = (present, kind.model()) {
                models.push_str(&format!(".MODEL {} {}\n", name, family));
            }
        }

        // Step 2: element cards
        let mut cards = String::new();
        let mut midpoints = HashSet::new();
        for branch in branches {
            match branch {
                Branch::TwoTerminal(b) => {
                    cards.push_str(&Self::two_terminal_card(b, branches, options, &mut midpoints))
                }
                Branch::Device(d) => cards.push_str(&Self::device_card(d, options)),
            }
        }

        // Step 3: analysis
        let reactive = branches
            .iter()
            .filter_map(Branch::as_two_terminal)
            .any(|b| b.kind().is_reactive());
        let control = if reactive {
            format!(".control\ntran {} {}\n.endc\n", options.tran_step, options.tran_stop)
        } else {
            let mut control = String::from(".control\nop\n");
            for b in branches.iter().filter_map(Branch::as_two_terminal) {
                control.push_str(&Self::print_line(b));
            }
            control.push_str(".endc\n");
            control
        };

        tracing::debug!(branches = branches.len(), reactive, "spice deck emitted");
        Ok(format!(
            ".title {}\n{}{}\n\n{}.end\n",
            options.title, models, cards, control
        ))
    }

    fn value(quantity: &Quantity, options: &CircuitOptions) -> String {
        match options.annotation {
            Annotation::Value => quantity.to_spice(),
            Annotation::Label => EMPTY_VALUE.to_string(),
        }
    }

    fn ammeter(label: &str) -> String {
        format!("VI{}", label)
    }

    /// Unique name of the node between an element and its ammeter.
    fn midpoint(b: &TwoTerminal, used: &mut HashSet<String>) -> String {
        let base = format!("N{}_{}", b.n1, b.n2);
        let mut name = base.clone();
        let mut suffix = 1;
        while used.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        used.insert(name.clone());
        name
    }

    fn two_terminal_card(
        b: &TwoTerminal,
        branches: &[Branch],
        options: &CircuitOptions,
        midpoints: &mut HashSet<String>,
    ) -> String {
        let component = &b.component;
        let current_probe = component
            .measurement
            .as_ref()
            .filter(|m| m.kind == MeasureKind::Current);

        let tail = match b.kind() {
            ComponentKind::Open => return String::new(),
            ComponentKind::Short => {
                // Only a probed wire reaches the netlist.
                let Some(probe) = current_probe else {
                    return String::new();
                };
                let (p, q) = b.probe_nodes();
                return format!("{} {} {} 0\n", Self::ammeter(&probe.label), p, q);
            }
            ComponentKind::VoltageSource(q)
            | ComponentKind::CurrentSource(q)
            | ComponentKind::Resistor(q)
            | ComponentKind::Capacitor(q)
            | ComponentKind::Inductor(q) => Self::value(q, options),
            ComponentKind::Vccs(c) | ComponentKind::Vcvs(c) => {
                let (cp, cn) = control_branch(branches, b.kind())
                    .map(|ctrl| ctrl.probe_nodes())
                    .unwrap_or((GROUND, GROUND));
                format!("{} {} {}", cp, cn, Self::value(&c.gain, options))
            }
            ComponentKind::Cccs(c) | ComponentKind::Ccvs(c) => {
                format!("{} {}", Self::ammeter(&c.control_label), Self::value(&c.gain, options))
            }
        };

        let name = format!("{}{}", b.kind().spice_prefix(), component.label);
        match current_probe {
            None => format!("{} {} {} {}\n", name, b.n1, b.n2, tail),
            Some(probe) => {
                let mid = Self::midpoint(b, midpoints);
                let meter = Self::ammeter(&probe.label);
                let meter_card = if component.probe_aligned() {
                    format!("{} {} {} 0\n", meter, mid, b.n2)
                } else {
                    format!("{} {} {} 0\n", meter, b.n2, mid)
                };
                format!("{} {} {} {}\n{}", name, b.n1, mid, tail, meter_card)
            }
        }
    }

    fn device_card(d: &DeviceBranch, options: &CircuitOptions) -> String {
        let model = d.kind.model().map(|(name, _)| name).unwrap_or_default();
        match d.kind {
            DeviceKind::Npn | DeviceKind::Pnp => format!(
                "Q{} {} {} {} {}\n",
                d.label,
                d.node("collector"),
                d.node("base"),
                d.node("emitter"),
                model
            ),
            DeviceKind::NMos | DeviceKind::PMos => format!(
                "M{} {} {} {} 0 {}\n",
                d.label,
                d.node("drain"),
                d.node("gate"),
                d.node("source"),
                model
            ),
            DeviceKind::Diode => format!(
                "D{} {} {} {}\n",
                d.label,
                d.node("anode"),
                d.node("cathode"),
                model
            ),
            DeviceKind::OpAmp => format!(
                "EU{} {} 0 {} {} {}\n",
                d.label,
                d.node("out"),
                d.node("in+"),
                d.node("in-"),
                format_number(options.opamp_gain)
            ),
            DeviceKind::Ground => String::new(),
            kind => {
                let label = if d.label > 0 {
                    d.label.to_string()
                } else {
                    String::new()
                };
                let value = d
                    .value
                    .filter(|q| q.value > 0.0)
                    .map(|q| q.to_spice())
                    .unwrap_or_else(|| "0".to_string());
                format!(
                    "{}{} {} 0 {}\n",
                    kind.prefix(),
                    label,
                    d.node(crate::netlist::NODE_TERMINAL),
                    value
                )
            }
        }
    }

    fn print_line(b: &TwoTerminal) -> String {
        let Some(measurement) = &b.component.measurement else {
            return String::new();
        };
        let label = &measurement.label;
        match measurement.kind {
            MeasureKind::Voltage => {
                let (p, q) = b.probe_nodes();
                if p == GROUND {
                    format!("print -v({}) ; measurement of U{}\n", q, label)
                } else if q == GROUND {
                    format!("print v({}) ; measurement of U{}\n", p, label)
                } else {
                    format!("print v({}, {}) ; measurement of U{}\n", p, q, label)
                }
            }
            MeasureKind::Current => {
                format!("print i({}) ; measurement of I{}\n", Self::ammeter(label), label)
            }
        }
    }
}
