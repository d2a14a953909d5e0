//! Validator (§4.9). Runs design-wide invariant checks that need the full
//! set of resolved wire labels at once: duplicate label text across distinct
//! nets, the multipoint rule — a transitively-connected net of N component
//! pins must carry exactly N-1 labeled wire segments — and per-component
//! field sanity (non-negative amperage).

use std::collections::{HashMap, HashSet, VecDeque};

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location as DLoc, Severity};
use crate::error::{ExtractError, PipelineError};
use crate::graph::{ConnectivityGraph, GraphNode};
use crate::labels::WireLabelAssociation;
use crate::model::{parse_wire_label, SchematicModel};

/// Runs every design-wide check, possibly renaming duplicate labels in
/// permissive mode, and returns the (possibly updated) label associations.
pub fn validate(
    model: &SchematicModel,
    cg: &ConnectivityGraph,
    mut wire_labels: HashMap<String, WireLabelAssociation>,
    permissive: bool,
    diags: &mut Diagnostics,
) -> Result<HashMap<String, WireLabelAssociation>, PipelineError> {
    check_duplicate_labels(&mut wire_labels, permissive, diags)?;
    check_multipoint_rule(model, cg, &wire_labels, permissive, diags)?;
    check_component_amperage(model, permissive, diags)?;
    Ok(wire_labels)
}

/// Strict mode: a label text shared by two distinct nets is fatal. Permissive
/// mode: every occurrence after the first (in wire-id order, for
/// determinism) is renamed with a `-2`, `-3`, ... suffix and a warning is
/// recorded. The renamed copy no longer parses as a circuit identifier, so
/// it drops out of current aggregation — it exists for BOM display only.
fn check_duplicate_labels(
    wire_labels: &mut HashMap<String, WireLabelAssociation>,
    permissive: bool,
    diags: &mut Diagnostics,
) -> Result<(), PipelineError> {
    let mut by_text: HashMap<String, Vec<String>> = HashMap::new();
    for (wire_id, assoc) in wire_labels.iter() {
        by_text.entry(assoc.label.text.clone()).or_default().push(wire_id.clone());
    }

    for (text, mut wire_ids) in by_text {
        if wire_ids.len() <= 1 {
            continue;
        }
        wire_ids.sort();

        if !permissive {
            diags.push(Diagnostic::new(
                Severity::Error,
                DiagnosticKind::DuplicateLabel,
                DLoc::WireLabel(text.clone()),
                format!("label {text:?} is used by {} distinct wires", wire_ids.len()),
            ));
            return Err(PipelineError::DuplicateLabel(text));
        }

        for (i, wire_id) in wire_ids.iter().enumerate().skip(1) {
            let new_text = format!("{text}-{}", i + 1);
            diags.push(Diagnostic::new(
                Severity::Warning,
                DiagnosticKind::DuplicateLabel,
                DLoc::WireLabel(text.clone()),
                format!("renaming duplicate label {text:?} on wire {wire_id} to {new_text:?}"),
            ));
            if let Some(assoc) = wire_labels.get_mut(wire_id) {
                assoc.parsed = parse_wire_label(&new_text);
                assoc.label.text = new_text;
            }
        }
    }

    Ok(())
}

/// Traces every transitively-connected net of wire endpoints and junctions
/// (via their coincidence/wire edges), counts the distinct component pins it
/// terminates on, and checks that exactly N-1 of its wires carry a parsed
/// label — the one unlabeled branch is the common node of the net (§4.6).
/// Hierarchical labels, global labels, and sheet pins are treated as net
/// boundaries here, not crossed: this rule is scoped to a single sheet's
/// local physical net, distinct from the cross-sheet/global linkage the
/// resolver follows.
fn check_multipoint_rule(
    model: &SchematicModel,
    cg: &ConnectivityGraph,
    wire_labels: &HashMap<String, WireLabelAssociation>,
    permissive: bool,
    diags: &mut Diagnostics,
) -> Result<(), PipelineError> {
    let mut visited: HashSet<_> = HashSet::new();
    let mut node_indices: Vec<_> = cg
        .graph
        .node_indices()
        .filter(|&idx| matches!(cg.graph[idx], GraphNode::WireEndpoint { .. } | GraphNode::Junction { .. }))
        .collect();
    node_indices.sort_by_key(|idx| idx.index());

    for &start in &node_indices {
        if visited.contains(&start) {
            continue;
        }

        let mut cluster_wire_ids: HashSet<String> = HashSet::new();
        let mut component_pins: HashSet<(String, String)> = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        visited.insert(start);

        while let Some(node) = queue.pop_front() {
            if let GraphNode::WireEndpoint { wire_id, .. } = &cg.graph[node] {
                cluster_wire_ids.insert(wire_id.clone());
            }
            for neighbor in cg.graph.neighbors(node) {
                match &cg.graph[neighbor] {
                    GraphNode::WireEndpoint { .. } | GraphNode::Junction { .. } => {
                        if visited.insert(neighbor) {
                            queue.push_back(neighbor);
                        }
                    }
                    GraphNode::ComponentPin { reference, pin_number } => {
                        component_pins.insert((reference.clone(), pin_number.clone()));
                    }
                    GraphNode::HierarchicalLabel { .. }
                    | GraphNode::GlobalLabel { .. }
                    | GraphNode::SheetPin { .. } => {}
                }
            }
        }

        if component_pins.len() < 2 {
            continue;
        }

        let labeled_count = cluster_wire_ids
            .iter()
            .filter(|id| wire_labels.get(id.as_str()).and_then(|a| a.parsed.as_ref()).is_some())
            .count();
        let expected = component_pins.len() - 1;

        if labeled_count != expected {
            let mut ids: Vec<&String> = cluster_wire_ids.iter().collect();
            ids.sort();
            let position = ids
                .first()
                .and_then(|id| model.wires.iter().find(|w| &w.id == *id))
                .map(|w| (w.sheet.0, w.p1.x, w.p1.y))
                .unwrap_or((0, 0.0, 0.0));

            let diag = Diagnostic::new(
                if permissive { Severity::Warning } else { Severity::Error },
                DiagnosticKind::MultipointLabelMismatch,
                DLoc::Coordinate { sheet: position.0, x: position.1, y: position.2 },
                format!(
                    "multipoint net near ({:.2}, {:.2}) spans {} component pins but carries {} labeled wire(s), expected {}",
                    position.1, position.2, component_pins.len(), labeled_count, expected
                ),
            );

            if !permissive {
                diags.push(diag);
                return Err(PipelineError::MultipointLabelMismatch(
                    crate::model::Position::new(position.1, position.2),
                    expected,
                    labeled_count,
                ));
            }
            diags.push(diag.with_suggestion("continuing with a best-effort trace of this net"));
        }
    }

    Ok(())
}

fn check_component_amperage(
    model: &SchematicModel,
    permissive: bool,
    diags: &mut Diagnostics,
) -> Result<(), PipelineError> {
    for component in &model.components {
        if component.amperage < 0.0 {
            diags.push(Diagnostic::new(
                if permissive { Severity::Warning } else { Severity::Error },
                DiagnosticKind::MalformedLocationRole,
                DLoc::Component(component.reference.clone()),
                format!("component {} has a negative amperage of {:.2}", component.reference, component.amperage),
            ));
            if !permissive {
                return Err(ExtractError::MalformedLocationRole(
                    component.reference.clone(),
                    format!("{:.2}", component.amperage),
                )
                .into());
            }
        }
    }
    Ok(())
}
