//! gridnet CLI - build grid circuits into SPICE decks and circuitikz drawings.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use gridnet::grid::Axis;
use gridnet::topology::PointClass;
use gridnet::{
    build_project, wrap_document, Annotation, Circuit, CircuitOptions, CircuitReport,
    JsonLinesObserver, SchematicEmitter, SpiceEmitter,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

/// Exit code for a grid that parses but is not a valid circuit.
const EXIT_INVALID_CIRCUIT: i32 = 2;

#[derive(Parser)]
#[command(name = "gridnet")]
#[command(about = "Grid circuit builder: SPICE decks and circuitikz drawings", long_about = None)]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one grid file and print an artifact
    Build {
        /// Path to an editor .json grid file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Artifact to print
        #[arg(short, long, value_enum, default_value = "spice")]
        format: BuildFormat,

        /// Seed for the drawing's arrow styles
        #[arg(long)]
        seed: Option<u64>,

        /// Override the file's annotation mode
        #[arg(long, value_enum)]
        annotate: Option<AnnotateMode>,

        /// Write build events as JSON lines to this file
        #[arg(long, value_name = "TRACE_FILE")]
        trace: Option<PathBuf>,
    },

    /// Check whether a grid file describes a valid circuit
    Check {
        /// Path to an editor .json grid file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: ReportFormat,
    },

    /// Show equivalence classes, crossings and node names
    Nodes {
        /// Path to an editor .json grid file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Check every grid file in a directory
    Project {
        /// Path to project directory
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: ReportFormat,

        /// Exit with error code if any circuit is invalid
        #[arg(long)]
        fail_on_invalid: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildFormat {
    /// SPICE deck
    Spice,
    /// circuitikz fragment
    Latex,
    /// Standalone LaTeX document
    Document,
    /// Branches and stats as JSON
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum AnnotateMode {
    Value,
    Label,
}

impl From<AnnotateMode> for Annotation {
    fn from(mode: AnnotateMode) -> Self {
        match mode {
            AnnotateMode::Value => Annotation::Value,
            AnnotateMode::Label => Annotation::Label,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Build {
            file,
            format,
            seed,
            annotate,
            trace,
        } => handle_build(&file, format, seed, annotate, trace.as_deref()),
        Commands::Check { file, format } => handle_check(&file, format),
        Commands::Nodes { file } => handle_nodes(&file),
        Commands::Project {
            dir,
            format,
            fail_on_invalid,
        } => handle_project(&dir, format, fail_on_invalid),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load a grid file, applying the annotation override and trace sink.
fn load(file: &Path, annotate: Option<AnnotateMode>, trace: Option<&Path>) -> anyhow::Result<Circuit> {
    let editor = gridnet::load_editor(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let annotation = match annotate {
        Some(mode) => mode.into(),
        None if editor.use_value_annotation() => Annotation::Value,
        None => Annotation::Label,
    };
    let spec = editor
        .to_spec()
        .with_context(|| format!("invalid grid in {}", file.display()))?;
    let options = CircuitOptions::default().with_annotation(annotation);

    let Some(trace) = trace else {
        return Ok(Circuit::build(spec, options));
    };
    let sink = File::create(trace)
        .with_context(|| format!("failed to create trace file {}", trace.display()))?;
    let observer = JsonLinesObserver::new(BufWriter::new(sink));
    let circuit = Circuit::build_with_observer(spec, options, &observer);
    observer
        .into_inner()
        .flush()
        .with_context(|| format!("failed to write trace file {}", trace.display()))?;
    Ok(circuit)
}

fn handle_build(
    file: &Path,
    format: BuildFormat,
    seed: Option<u64>,
    annotate: Option<AnnotateMode>,
    trace: Option<&Path>,
) -> anyhow::Result<i32> {
    let circuit = load(file, annotate, trace)?;

    if let Some(failure) = circuit.failure() {
        if matches!(format, BuildFormat::Json) {
            output_build_json(file, &circuit)?;
        }
        eprintln!("{}: invalid circuit: {}", file.display(), failure);
        return Ok(EXIT_INVALID_CIRCUIT);
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match format {
        BuildFormat::Spice => print!("{}", SpiceEmitter::emit(&circuit)?),
        BuildFormat::Latex => print!("{}", SchematicEmitter::emit(&circuit, &mut rng)?),
        BuildFormat::Document => {
            let fragment = SchematicEmitter::emit(&circuit, &mut rng)?;
            println!("{}", wrap_document(&fragment, &circuit.options().font_size));
        }
        BuildFormat::Json => output_build_json(file, &circuit)?,
    }
    Ok(0)
}

fn output_build_json(file: &Path, circuit: &Circuit) -> anyhow::Result<()> {
    let report = CircuitReport::from_circuit(file, circuit);
    let output = serde_json::json!({
        "report": report,
        "branches": circuit.branches(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn handle_check(file: &Path, format: ReportFormat) -> anyhow::Result<i32> {
    let circuit = load(file, None, None)?;
    let report = CircuitReport::from_circuit(file, &circuit);
    output_reports(&[report], format)?;
    Ok(if circuit.is_valid() { 0 } else { 1 })
}

fn handle_project(dir: &Path, format: ReportFormat, fail_on_invalid: bool) -> anyhow::Result<i32> {
    let reports = build_project(dir, CircuitOptions::default())
        .with_context(|| format!("failed to build project {}", dir.display()))?;
    output_reports(&reports, format)?;
    if fail_on_invalid && reports.iter().any(|r| !r.valid) {
        return Ok(1);
    }
    Ok(0)
}

fn output_reports(reports: &[CircuitReport], format: ReportFormat) -> anyhow::Result<()> {
    match format {
        ReportFormat::Human => output_human(reports),
        ReportFormat::Json => output_json(reports)?,
    }
    Ok(())
}

fn output_human(reports: &[CircuitReport]) {
    for report in reports {
        println!("\nFile: {}", report.file.display());
        println!("{}", "─".repeat(60));

        match &report.failure {
            Some(failure) => println!("  INVALID: {}", failure),
            None => println!("  Valid circuit"),
        }

        println!("\n  Summary:");
        println!("    Nodes:       {}", report.stats.node_count);
        println!("    Branches:    {}", report.stats.branch_count);
        println!("    Devices:     {}", report.stats.device_count);
        println!("    Connections: {}", report.stats.connection_count);
        println!("    Parts:       {}", report.stats.separate_parts);
    }
}

fn output_json(reports: &[CircuitReport]) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "results": reports,
        "summary": {
            "total_files": reports.len(),
            "valid": reports.iter().filter(|r| r.valid).count(),
            "invalid": reports.iter().filter(|r| !r.valid).count(),
        }
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn handle_nodes(file: &Path) -> anyhow::Result<i32> {
    let circuit = load(file, None, None)?;

    let Some(classes) = circuit.classes() else {
        if let Some(failure) = circuit.failure() {
            eprintln!("{}: invalid circuit: {}", file.display(), failure);
        }
        return Ok(EXIT_INVALID_CIRCUIT);
    };

    println!("Classes ({}):", classes.count());
    for row in 0..classes.rows() {
        let cells: Vec<String> = (0..classes.cols())
            .map(|col| match classes.point(gridnet::Coord::new(row, col)) {
                Some(PointClass::Single { class }) => format!("{:>5}", class.0),
                Some(PointClass::Crossing { horizontal, vertical }) => {
                    format!("{:>5}", format!("{}/{}", horizontal.0, vertical.0))
                }
                None => format!("{:>5}", "-"),
            })
            .collect();
        println!("  {}", cells.join(" "));
    }

    let table = classes.crossing_table();
    if !table.is_empty() {
        println!("\nCrossings:");
        for (at, axis, class) in table {
            let axis = match axis {
                Axis::Horizontal => "h",
                Axis::Vertical => "v",
            };
            println!("  {} {} -> {}", at, axis, class);
        }
    }

    if let Some(names) = circuit.names() {
        println!("\nNode names:");
        for k in 0..classes.count() {
            println!("  class {} -> node {}", k, names.name(gridnet::ClassId(k)));
        }
    }

    if let Some(failure) = circuit.failure() {
        eprintln!("{}: invalid circuit: {}", file.display(), failure);
        return Ok(EXIT_INVALID_CIRCUIT);
    }
    Ok(0)
}
