//! wirebom-core - converts a KiCad-style hierarchical schematic into an
//! engineering-annotated wire bill of materials.
//!
//! The pipeline runs as a fixed sequence of stages, each documented in its
//! own module: read the s-expression source (`sexp`), extract the typed
//! schematic model (`extract`, using `symbols` for library pin lookups),
//! compute absolute pin positions (`pins`), associate text labels to wires
//! (`labels`), build the electrical connectivity graph (`graph`), resolve
//! each wire's endpoints (`resolve`), aggregate circuit current (`circuits`),
//! select wire gauge (`gauge`), validate design-wide invariants
//! (`validate`), and finally assemble the BOM (`bom`).
//!
//! # Quick start
//!
//! ```no_run
//! use wirebom_core::{run_pipeline, Settings};
//!
//! let settings = Settings::new("design.kicad_sch");
//! let output = run_pipeline(settings).unwrap();
//! for row in &output.bom {
//!     println!("{}: {} -> {} ({} AWG)", row.wire_id, row.from, row.to, row.awg);
//! }
//! ```

pub mod bom;
pub mod circuits;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod gauge;
pub mod graph;
pub mod labels;
pub mod model;
pub mod pins;
pub mod resolve;
pub mod settings;
pub mod sexp;
pub mod symbols;
pub mod tables;
pub mod validate;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use bom::WireBomRow;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::PipelineError;
pub use model::SchematicModel;
pub use settings::Settings;

/// Everything a pipeline run produces: the assembled BOM, every stage's
/// diagnostics, and the sheet count for sanity display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub bom: Vec<WireBomRow>,
    pub diagnostics: Diagnostics,
    pub sheet_count: usize,
}

/// Runs the full schematic-to-BOM pipeline for the given settings.
///
/// Fatal conditions (malformed source, an unresolved symbol library id, a
/// strict-mode duplicate label, a strict-mode dangling wire end, or a
/// strict-mode multipoint label mismatch) abort the run with an `Err`.
/// Everything else — orphan labels, infeasible gauges, permissive-mode
/// dangling ends and multipoint mismatches — is recorded as a [`Diagnostic`]
/// in the returned output instead, so callers can decide for themselves what
/// severity should fail a build (the CLI does this via `--fail-on`).
pub fn run_pipeline(settings: Settings) -> Result<PipelineOutput, PipelineError> {
    tracing::info!(input = %settings.input_path.display(), "starting wirebom pipeline");

    let mut diags = Diagnostics::default();

    let model = extract::extract_model(&settings.input_path, settings.permissive, &mut diags)?;
    tracing::debug!(sheets = model.sheet_files.len(), components = model.components.len(), "extracted schematic model");

    let pins = pins::calculate_all_pin_positions(&model)?;
    let cg = graph::build_graph(&model, &pins);

    let associations = labels::associate_labels(&model, settings.label_distance_threshold_mm, &mut diags);
    let wire_labels: HashMap<String, labels::WireLabelAssociation> =
        associations.into_iter().map(|a| (a.wire_id.clone(), a)).collect();

    let resolved_wires = resolve::resolve_wires(&model, &cg, &wire_labels, settings.permissive, &mut diags)?;

    let wire_labels = validate::validate(&model, &cg, wire_labels, settings.permissive, &mut diags)?;

    let circuit_currents = circuits::aggregate_circuit_currents(&model, &resolved_wires, &wire_labels);

    let bom = bom::assemble_bom(&model, &resolved_wires, &wire_labels, &circuit_currents, &settings, &mut diags);

    tracing::info!(rows = bom.len(), errors = diags.error_count(), "wirebom pipeline finished");

    Ok(PipelineOutput { bom, diagnostics: diags, sheet_count: model.sheet_files.len() })
}
