//! Label associator (§4.4). Attaches each text label to the nearest wire
//! segment on its own sheet, within a configurable distance threshold, then
//! resolves segments that picked up more than one label down to a single
//! canonical one.

use std::collections::HashMap;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location as DLoc, Severity};
use crate::model::{parse_wire_label, Label, ParsedLabel, SchematicModel};

/// A label resolved onto exactly one wire segment.
#[derive(Debug, Clone)]
pub struct WireLabelAssociation {
    pub wire_id: String,
    pub label: Label,
    pub parsed: Option<ParsedLabel>,
    pub distance: f64,
    /// Text of every other label that landed on this same segment and lost
    /// the canonical pick (§4.4: "other labels become notes on the segment").
    pub other_labels: Vec<String>,
}

/// Associates every label in the model to its nearest wire, emitting
/// `OrphanLabel` (always a warning, per §7) and `AmbiguousLabel` (tie)
/// diagnostics along the way. Returns at most one resolved association per
/// wire id.
pub fn associate_labels(
    model: &SchematicModel,
    threshold_mm: f64,
    diags: &mut Diagnostics,
) -> Vec<WireLabelAssociation> {
    let mut by_wire: HashMap<String, Vec<(Label, f64)>> = HashMap::new();

    for label in &model.labels {
        let mut best_dist = f64::MAX;
        let mut candidates: Vec<(&str, f64)> = Vec::new();

        for wire in model.wires.iter().filter(|w| w.sheet == label.sheet) {
            let d = wire.distance_to_point(&label.position);
            if d > threshold_mm {
                continue;
            }
            if d < best_dist - 1e-9 {
                best_dist = d;
                candidates.clear();
                candidates.push((&wire.id, d));
            } else if (d - best_dist).abs() <= 1e-9 {
                candidates.push((&wire.id, d));
            }
        }

        if candidates.is_empty() {
            diags.push(Diagnostic::new(
                Severity::Warning,
                DiagnosticKind::OrphanLabel,
                DLoc::WireLabel(label.text.clone()),
                format!("label {:?} is not within {threshold_mm}mm of any wire", label.text),
            ));
            continue;
        }

        if candidates.len() > 1 {
            diags.push(Diagnostic::new(
                Severity::Warning,
                DiagnosticKind::AmbiguousLabel,
                DLoc::WireLabel(label.text.clone()),
                format!(
                    "label {:?} is equidistant from {} wires; choosing the lowest wire id",
                    label.text,
                    candidates.len()
                ),
            ));
        }

        candidates.sort_by(|a, b| a.0.cmp(b.0));
        let (wire_id, distance) = candidates[0];
        by_wire
            .entry(wire_id.to_string())
            .or_default()
            .push((label.clone(), distance));
    }

    let mut out = Vec::new();
    for (wire_id, mut labels) in by_wire {
        // Descending by id: `max_by_key` below returns the *last* maximum
        // among ties, so this makes ties resolve to the lowest id.
        labels.sort_by(|a, b| b.0.id.cmp(&a.0.id));
        let (label, distance, other_labels) = pick_canonical_label(labels);
        let parsed = parse_wire_label(&label.text);
        out.push(WireLabelAssociation {
            wire_id,
            label,
            parsed,
            distance,
            other_labels,
        });
    }
    out.sort_by(|a, b| a.wire_id.cmp(&b.wire_id));
    out
}

/// When a segment picked up more than one label, prefer whichever parses as a
/// valid circuit identifier (§6 grammar); ties broken by label id, which was
/// already sorted into `labels` before this is called. The labels that lose
/// the pick are returned alongside so the caller can keep them as notes.
fn pick_canonical_label(labels: Vec<(Label, f64)>) -> (Label, f64, Vec<String>) {
    let winner_pos = labels
        .iter()
        .enumerate()
        .max_by_key(|(_, (label, _))| parse_wire_label(&label.text).is_some())
        .map(|(i, _)| i)
        .expect("labels is non-empty by construction");
    let mut labels = labels;
    let (winner, dist) = labels.remove(winner_pos);
    let others = labels.into_iter().map(|(l, _)| l.text).collect();
    (winner, dist, others)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LabelKind, Position, SheetId, WireSegment};

    fn wire(id: &str, x1: f64, y1: f64, x2: f64, y2: f64) -> WireSegment {
        WireSegment {
            id: id.to_string(),
            sheet: SheetId(0),
            p1: Position::new(x1, y1),
            p2: Position::new(x2, y2),
        }
    }

    fn label(id: &str, text: &str, x: f64, y: f64) -> Label {
        Label {
            id: id.to_string(),
            sheet: SheetId(0),
            text: text.to_string(),
            position: Position::new(x, y),
            kind: LabelKind::Local,
        }
    }

    #[test]
    fn associates_label_to_nearest_wire() {
        let mut model = SchematicModel::default();
        model.wires.push(wire("w1", 0.0, 0.0, 10.0, 0.0));
        model.labels.push(label("l1", "P1A", 5.0, 0.5));

        let mut diags = Diagnostics::default();
        let result = associate_labels(&model, 10.0, &mut diags);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].wire_id, "w1");
        assert!(diags.0.is_empty());
    }

    #[test]
    fn orphan_label_beyond_threshold_warns() {
        let mut model = SchematicModel::default();
        model.wires.push(wire("w1", 0.0, 0.0, 10.0, 0.0));
        model.labels.push(label("l1", "P1A", 5.0, 50.0));

        let mut diags = Diagnostics::default();
        let result = associate_labels(&model, 10.0, &mut diags);
        assert!(result.is_empty());
        assert_eq!(diags.0.len(), 1);
        assert_eq!(diags.0[0].kind, DiagnosticKind::OrphanLabel);
    }

    #[test]
    fn prefers_valid_circuit_identifier_on_shared_segment() {
        let mut model = SchematicModel::default();
        model.wires.push(wire("w1", 0.0, 0.0, 10.0, 0.0));
        model.labels.push(label("l1", "notes", 2.0, 0.0));
        model.labels.push(label("l2", "P1A", 8.0, 0.0));

        let mut diags = Diagnostics::default();
        let result = associate_labels(&model, 10.0, &mut diags);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].label.text, "P1A");
    }
}
