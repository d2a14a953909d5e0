//! wirebom CLI - generates a wire bill of materials from a KiCad-style
//! hierarchical schematic.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use wirebom_core::diagnostics::Severity;
use wirebom_core::{run_pipeline, PipelineOutput, Settings};

#[derive(Parser)]
#[command(name = "wirebom")]
#[command(about = "Schematic-to-wire-BOM pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a wire BOM from a schematic file
    Build {
        /// Path to the root .kicad_sch file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with a non-zero status if diagnostics reach this severity
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,

        /// Tolerate missing/malformed location-role fields with a warning
        /// instead of aborting
        #[arg(long)]
        permissive: bool,

        /// Nominal system voltage, used for voltage-drop calculations
        #[arg(long, default_value_t = 14.0)]
        system_voltage: f64,

        /// Maximum allowed voltage-drop fraction of system voltage
        #[arg(long, default_value_t = 0.05)]
        max_voltage_drop: f64,

        /// Fixed routing slack added to every wire's length, in inches
        #[arg(long, default_value_t = 24.0)]
        slack_inches: f64,

        /// Maximum label-to-wire association distance, in millimeters
        #[arg(long, default_value_t = 10.0)]
        label_distance_mm: f64,

        /// Write the BOM to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable table
    Human,
    /// JSON output for tooling
    Json,
    /// Comma-separated values
    Csv,
}

#[derive(Clone, ValueEnum)]
enum FailOnSeverity {
    Error,
    Warning,
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Build {
            file,
            format,
            fail_on,
            permissive,
            system_voltage,
            max_voltage_drop,
            slack_inches,
            label_distance_mm,
            output,
        } => handle_build(
            file,
            format,
            fail_on,
            permissive,
            system_voltage,
            max_voltage_drop,
            slack_inches,
            label_distance_mm,
            output,
        ),
    };

    process::exit(exit_code);
}

#[allow(clippy::too_many_arguments)]
fn handle_build(
    file: PathBuf,
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
    permissive: bool,
    system_voltage: f64,
    max_voltage_drop: f64,
    slack_inches: f64,
    label_distance_mm: f64,
    output: Option<PathBuf>,
) -> i32 {
    let settings = Settings {
        input_path: file,
        output_dir: None,
        permissive,
        system_voltage,
        max_voltage_drop_fraction: max_voltage_drop,
        slack_inches,
        label_distance_threshold_mm: label_distance_mm,
        ..Settings::default()
    };

    match run_pipeline(settings) {
        Ok(result) => {
            let rendered = render(&result, &format);
            match &output {
                Some(path) => {
                    if let Err(e) = std::fs::write(path, rendered) {
                        eprintln!("Error writing {}: {e}", path.display());
                        return 1;
                    }
                }
                None => println!("{rendered}"),
            }

            if let Some(severity) = fail_on {
                if should_fail(&result, &severity) {
                    return 1;
                }
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn should_fail(result: &PipelineOutput, severity: &FailOnSeverity) -> bool {
    match severity {
        FailOnSeverity::Error => result.diagnostics.has_errors(),
        FailOnSeverity::Warning => !result.diagnostics.0.is_empty(),
    }
}

fn render(result: &PipelineOutput, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Human => render_human(result),
        OutputFormat::Json => serde_json::to_string_pretty(result).unwrap(),
        OutputFormat::Csv => render_csv(result),
    }
}

fn render_human(result: &PipelineOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!("Sheets: {}\n", result.sheet_count));
    out.push_str(&format!("{:<10} {:<8} {:<16} {:<16} {:<6} {:<6}\n", "WIRE", "LABEL", "FROM", "TO", "AWG", "AMPS"));
    for row in &result.bom {
        out.push_str(&format!(
            "{:<10} {:<8} {:<16} {:<16} {:<6} {:<6}\n",
            row.wire_id,
            row.label.as_deref().unwrap_or("-"),
            row.from,
            row.to,
            row.awg,
            row.circuit_amps.map(|a| format!("{a:.2}")).unwrap_or_else(|| "?".to_string()),
        ));
    }
    if !result.diagnostics.0.is_empty() {
        out.push_str("\nDiagnostics:\n");
        for d in &result.diagnostics.0 {
            let level = match d.severity {
                Severity::Error => "ERROR",
                Severity::Warning => "WARN",
            };
            out.push_str(&format!("  [{level}] {:?}: {}\n", d.kind, d.message));
        }
    }
    out
}

fn render_csv(result: &PipelineOutput) -> String {
    let mut out = String::from("wire_id,label,from,to,awg,circuit_amps,length_feet,color\n");
    for row in &result.bom {
        out.push_str(&format!(
            "{},{},{},{},{},{},{:.2},{}\n",
            row.wire_id,
            row.label.as_deref().unwrap_or(""),
            row.from,
            row.to,
            row.awg,
            row.circuit_amps.map(|a| format!("{a:.2}")).unwrap_or_default(),
            row.length_feet,
            row.color,
        ));
    }
    out
}
