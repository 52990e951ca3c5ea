//! Structured build trace
//!
//! [`BuildObserver`] receives one [`BuildEvent`] per pipeline step. Nothing
//! is installed by default; pass an observer to
//! [`Circuit::build_with_observer`](crate::Circuit::build_with_observer).

use crate::grid::{Axis, Coord};
use crate::netlist::BuildFailure;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BuildEvent {
    DegreeChecked {
        dangling: Option<Coord>,
    },
    ClassesResolved {
        classes: usize,
        crossings: usize,
    },
    NodesBound {
        grounded: bool,
        nodes: usize,
    },
    EdgeElided {
        at: Coord,
        axis: Axis,
        node: String,
    },
    BranchRecorded {
        order: usize,
        reference: String,
        terminals: Vec<(String, String)>,
    },
    Failed {
        failure: BuildFailure,
    },
    Finished {
        branches: usize,
    },
}

pub trait BuildObserver {
    fn on_event(&self, event: &BuildEvent);
}

/// Writes each event as one line of JSON.
pub struct JsonLinesObserver<W: Write> {
    out: Mutex<W>,
}

impl<W: Write> JsonLinesObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write> BuildObserver for JsonLinesObserver<W> {
    fn on_event(&self, event: &BuildEvent) {
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let written = serde_json::to_writer(&mut *out, event)
            .map_err(std::io::Error::from)
            .and_then(|_| out.write_all(b"\n"));
        if let Err(e) = written {
            tracing::warn!("failed to write build event: {}", e);
        }
    }
}

/// Keeps events in memory.
#[derive(Default)]
pub struct MemoryObserver {
    events: Mutex<Vec<BuildEvent>>,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BuildEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl BuildObserver for MemoryObserver {
    fn on_event(&self, event: &BuildEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_lines() {
        let observer = JsonLinesObserver::new(Vec::new());
        observer.on_event(&BuildEvent::DegreeChecked { dangling: None });
        observer.on_event(&BuildEvent::Finished { branches: 3 });

        let text = String::from_utf8(observer.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "degree_checked");
        let second: BuildEvent = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second, BuildEvent::Finished { branches: 3 });
    }

    #[test]
    fn test_memory_observer() {
        let observer = MemoryObserver::new();
        observer.on_event(&BuildEvent::NodesBound {
            grounded: true,
            nodes: 2,
        });
        assert_eq!(observer.events().len(), 1);
    }
}
