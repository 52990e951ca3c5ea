//! Core build pipeline shared by the library API and the CLI.
//! No I/O happens here apart from the file helpers at the bottom.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::emit::EmitError;
use crate::grid::{EditorGrid, GridError, GridSpec};
use crate::netlist::{Branch, BuildFailure, CircuitStats, NetGraph, NetlistBuilder, NodeNames};
use crate::topology::{DegreeValidator, EquivalenceClasses, NodeEquivalenceResolver};
use crate::trace::{BuildEvent, BuildObserver};

#[derive(Debug, thiserror::Error)]
pub enum GridnetError {
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),
    #[error("Emit error: {0}")]
    Emit(#[from] EmitError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How component labels are written in the schematic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    /// `4 \mathrm{ k\Omega }`
    #[default]
    Value,
    /// `R_{ 1 }`
    Label,
}

/// Options for building and emitting a circuit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircuitOptions {
    pub annotation: Annotation,
    pub title: String,
    pub tran_step: String,
    pub tran_stop: String,
    /// Open-loop gain of the ideal op-amp model.
    pub opamp_gain: f64,
    /// Font size command placed in the standalone document.
    pub font_size: String,
}

impl Default for CircuitOptions {
    fn default() -> Self {
        Self {
            annotation: Annotation::Value,
            title: "Active DC Circuit".to_string(),
            tran_step: "1u".to_string(),
            tran_stop: "10m".to_string(),
            opamp_gain: 1e6,
            font_size: "\\large".to_string(),
        }
    }
}

impl CircuitOptions {
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotation = annotation;
        self
    }
}

/// A grid together with everything derived from it.
///
/// Construction runs the whole pipeline once. A failing grid still yields a
/// `Circuit`, carrying the failure instead of branches.
#[derive(Debug, Clone)]
pub struct Circuit {
    spec: GridSpec,
    options: CircuitOptions,
    classes: Option<EquivalenceClasses>,
    names: Option<NodeNames>,
    branches: Vec<Branch>,
    failure: Option<BuildFailure>,
}

impl Circuit {
    pub fn build(spec: GridSpec, options: CircuitOptions) -> Self {
        Self::run(spec, options, None)
    }

    /// Build while reporting every pipeline step to `observer`.
    pub fn build_with_observer(
        spec: GridSpec,
        options: CircuitOptions,
        observer: &dyn BuildObserver,
    ) -> Self {
        Self::run(spec, options, Some(observer))
    }

    /// Replace the grid and recompute everything from scratch.
    pub fn rebuild(&mut self, spec: GridSpec) {
        let options = std::mem::take(&mut self.options);
        *self = Self::run(spec, options, None);
    }

    fn run(spec: GridSpec, options: CircuitOptions, observer: Option<&dyn BuildObserver>) -> Self {
        let emit = |event: BuildEvent| {
            if let Some(observer) = observer {
                observer.on_event(&event);
            }
        };
        let mut circuit = Self {
            spec,
            options,
            classes: None,
            names: None,
            branches: Vec::new(),
            failure: None,
        };

        // Step 1: no dangling connection points
        let dangling = DegreeValidator::find_dangling(&circuit.spec);
        emit(BuildEvent::DegreeChecked { dangling });
        if let Some(point) = dangling {
            circuit.fail(BuildFailure::Structural { point }, &emit);
            return circuit;
        }

        // Step 2: equivalence classes
        let classes = NodeEquivalenceResolver::resolve(&circuit.spec);
        emit(BuildEvent::ClassesResolved {
            classes: classes.count(),
            crossings: classes.crossing_table().len() / 2,
        });

        // Step 3: ground binding
        let names = NodeNames::bind(&circuit.spec, &classes);
        emit(BuildEvent::NodesBound {
            grounded: circuit.spec.ground_points().next().is_some(),
            nodes: names.distinct().len(),
        });

        // Step 4: branches
        let built = NetlistBuilder::build(&circuit.spec, &classes, &names, observer);
        circuit.classes = Some(classes);
        circuit.names = Some(names);
        match built {
            Ok(branches) => {
                emit(BuildEvent::Finished {
                    branches: branches.len(),
                });
                tracing::info!(
                    rows = circuit.spec.rows(),
                    cols = circuit.spec.cols(),
                    branches = branches.len(),
                    "circuit is valid"
                );
                circuit.branches = branches;
            }
            Err(failure) => circuit.fail(failure, &emit),
        }
        circuit
    }

    fn fail(&mut self, failure: BuildFailure, emit: &dyn Fn(BuildEvent)) {
        tracing::info!(%failure, "circuit is invalid");
        emit(BuildEvent::Failed {
            failure: failure.clone(),
        });
        self.failure = Some(failure);
    }

    pub fn is_valid(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failure(&self) -> Option<&BuildFailure> {
        self.failure.as_ref()
    }

    /// Branches in insertion order. Empty for an invalid circuit.
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// Absent when the degree check stopped the build.
    pub fn classes(&self) -> Option<&EquivalenceClasses> {
        self.classes.as_ref()
    }

    pub fn names(&self) -> Option<&NodeNames> {
        self.names.as_ref()
    }

    pub fn graph(&self) -> NetGraph {
        NetGraph::from_branches(&self.branches)
    }

    pub fn stats(&self) -> CircuitStats {
        self.graph().stats()
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn options(&self) -> &CircuitOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: CircuitOptions) {
        self.options = options;
    }

    /// Error out unless the build succeeded.
    pub fn ensure_valid(&self) -> Result<(), EmitError> {
        match &self.failure {
            Some(failure) => Err(EmitError::InvalidCircuit(failure.clone())),
            None => Ok(()),
        }
    }
}

/// Verdict and counts for one grid file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitReport {
    pub file: PathBuf,
    pub valid: bool,
    pub failure: Option<BuildFailure>,
    pub stats: CircuitStats,
}

impl CircuitReport {
    pub fn from_circuit(file: &Path, circuit: &Circuit) -> Self {
        Self {
            file: file.to_path_buf(),
            valid: circuit.is_valid(),
            failure: circuit.failure().cloned(),
            stats: circuit.stats(),
        }
    }
}

/// Read an editor file. The file's annotation flag overrides `options`.
pub fn load_circuit(path: &Path, options: CircuitOptions) -> Result<Circuit, GridnetError> {
    let text = std::fs::read_to_string(path)?;
    let editor = EditorGrid::from_json(&text)?;
    let annotation = if editor.use_value_annotation() {
        Annotation::Value
    } else {
        Annotation::Label
    };
    let spec = editor.to_spec()?;
    Ok(Circuit::build(spec, options.with_annotation(annotation)))
}

/// Build every grid file found under `dir`.
pub fn build_project(dir: &Path, options: CircuitOptions) -> Result<Vec<CircuitReport>, GridnetError> {
    let files = discover_grid_files(dir)?;
    let mut reports = Vec::new();
    for path in files {
        let circuit = load_circuit(&path, options.clone())?;
        reports.push(CircuitReport::from_circuit(&path, &circuit));
    }
    Ok(reports)
}

/// Recursively discover editor grid files (`*.json`) in a directory.
pub fn discover_grid_files(dir: &Path) -> Result<Vec<PathBuf>, GridnetError> {
    let mut files = Vec::new();
    walk_dir(dir, &mut files, 0)?;
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>, depth: usize) -> Result<(), GridnetError> {
    if depth > 20 {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with('.') || name == "node_modules" || name == "target" || name == "build" {
                continue;
            }
            walk_dir(&path, files, depth + 1)?;
        } else if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{EdgeComponent, UnitScale};
    use crate::trace::MemoryObserver;

    fn loop_2x2() -> GridSpec {
        GridSpec::builder(2, 2)
            .hedge(0, 0, EdgeComponent::short())
            .hedge(1, 0, EdgeComponent::short())
            .vedge(0, 0, EdgeComponent::voltage_source("1", 5.0, UnitScale::One))
            .vedge(0, 1, EdgeComponent::resistor("1", 1.0, UnitScale::Kilo))
            .build()
            .unwrap()
    }

    #[test]
    fn test_valid_build() {
        let circuit = Circuit::build(loop_2x2(), CircuitOptions::default());
        assert!(circuit.is_valid());
        assert_eq!(circuit.branches().len(), 2);
        assert_eq!(circuit.classes().unwrap().count(), 2);
        assert!(circuit.ensure_valid().is_ok());
    }

    #[test]
    fn test_dangling_point_fails_before_resolution() {
        let spec = GridSpec::builder(2, 2)
            .hedge(0, 0, EdgeComponent::resistor("1", 1.0, UnitScale::One))
            .build()
            .unwrap();
        let circuit = Circuit::build(spec, CircuitOptions::default());
        assert!(!circuit.is_valid());
        assert!(circuit.classes().is_none());
        assert!(matches!(
            circuit.failure(),
            Some(BuildFailure::Structural { .. })
        ));
        assert!(matches!(
            circuit.ensure_valid(),
            Err(EmitError::InvalidCircuit(_))
        ));
    }

    #[test]
    fn test_rebuild_replaces_everything() {
        let mut circuit = Circuit::build(loop_2x2(), CircuitOptions::default());
        let bad = GridSpec::builder(2, 2)
            .hedge(0, 0, EdgeComponent::short())
            .build()
            .unwrap();
        circuit.rebuild(bad);
        assert!(!circuit.is_valid());
        assert!(circuit.branches().is_empty());
        assert_eq!(circuit.options().title, "Active DC Circuit");
    }

    #[test]
    fn test_observer_sees_every_step() {
        let observer = MemoryObserver::new();
        let circuit = Circuit::build_with_observer(loop_2x2(), CircuitOptions::default(), &observer);
        assert!(circuit.is_valid());
        let events = observer.events();
        assert!(matches!(events[0], BuildEvent::DegreeChecked { dangling: None }));
        assert!(matches!(events[1], BuildEvent::ClassesResolved { classes: 2, .. }));
        assert!(matches!(events[2], BuildEvent::NodesBound { grounded: false, .. }));
        assert!(matches!(
            events.last(),
            Some(BuildEvent::Finished { branches: 2 })
        ));
    }

    #[test]
    fn test_circuit_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Circuit>();
    }

    #[test]
    fn test_discover_grid_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join(".hidden")).unwrap();
        std::fs::write(dir.path().join(".hidden").join("b.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.json"), "{}").unwrap();

        let files = discover_grid_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "json"));
    }
}
