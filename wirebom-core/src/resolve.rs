//! Wire-connection resolver (§4.6). For each wire endpoint, determines what
//! it ultimately connects to. A `ComponentPin` is the only stopping
//! condition; junctions, sheet pins, and hierarchical/global labels are all
//! priority *crossings* the search passes through on its way to a real pin,
//! never a terminal result on their own (§8 property 1, "Endpoint purity").
//! Only a different wire's already-labeled endpoint blocks further expansion
//! — that is someone else's net — and stands in as a fallback identity if no
//! pin is ever found. An end that reaches nothing at all is dangling.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location as DLoc, Severity};
use crate::error::PipelineError;
use crate::graph::{ConnectivityGraph, GraphNode};
use crate::labels::WireLabelAssociation;
use crate::model::SchematicModel;

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedEndpoint {
    ComponentPin { reference: String, pin_number: String },
    NetLabel { text: String },
    Dangling,
}

#[derive(Debug, Clone)]
pub struct ResolvedWire {
    pub wire_id: String,
    pub from: ResolvedEndpoint,
    pub to: ResolvedEndpoint,
}

/// Resolves every wire's two endpoints. A dangling end is *error* in strict
/// mode (§7: fatal, short-circuits the pipeline) and *warn* in permissive
/// mode (the row is left dangling here; `bom::assemble_bom` omits it).
pub fn resolve_wires(
    model: &SchematicModel,
    cg: &ConnectivityGraph,
    wire_labels: &HashMap<String, WireLabelAssociation>,
    permissive: bool,
    diags: &mut Diagnostics,
) -> Result<Vec<ResolvedWire>, PipelineError> {
    let mut out = Vec::with_capacity(model.wires.len());
    for wire in &model.wires {
        let from = resolve_endpoint(cg, wire_labels, &wire.id, 0);
        let to = resolve_endpoint(cg, wire_labels, &wire.id, 1);

        for (end, endpoint) in [("start", &from), ("end", &to)] {
            if matches!(endpoint, ResolvedEndpoint::Dangling) {
                let diag = Diagnostic::new(
                    if permissive { Severity::Warning } else { Severity::Error },
                    DiagnosticKind::DanglingEnd,
                    DLoc::WireLabel(wire.id.clone()),
                    format!("wire {} has a dangling {end} with no component, net, or further connection", wire.id),
                );
                if !permissive {
                    diags.push(diag);
                    return Err(PipelineError::DanglingEnd(wire.id.clone()));
                }
                diags.push(diag);
            }
        }

        out.push(ResolvedWire { wire_id: wire.id.clone(), from, to });
    }
    Ok(out)
}

/// Breadth-first search from one wire endpoint. `ComponentPin` is the only
/// terminal node; junctions, sheet pins, and hierarchical/global labels are
/// all crossed through so a cross-sheet circuit resolves to the real pin on
/// the other side, never to the label text itself.
fn resolve_endpoint(
    cg: &ConnectivityGraph,
    wire_labels: &HashMap<String, WireLabelAssociation>,
    wire_id: &str,
    end: u8,
) -> ResolvedEndpoint {
    let Some(&start) = cg.wire_endpoints.get(&(wire_id.to_string(), end)) else {
        return ResolvedEndpoint::Dangling;
    };

    let mut visited = HashSet::new();
    visited.insert(start);
    let mut queue = VecDeque::new();
    queue.push_back(start);

    // A labeled wire reached while recursing terminates that branch of the
    // search, but still stands in as a fallback net identity if nothing
    // better (a direct pin, a hierarchical label) turns up elsewhere.
    let mut boundary_fallback: Option<String> = None;

    while let Some(node) = queue.pop_front() {
        for neighbor in cg.graph.neighbors(node) {
            if visited.contains(&neighbor) {
                continue;
            }

            match &cg.graph[neighbor] {
                GraphNode::ComponentPin { reference, pin_number } => {
                    return ResolvedEndpoint::ComponentPin {
                        reference: reference.clone(),
                        pin_number: pin_number.clone(),
                    };
                }
                GraphNode::SheetPin { .. }
                | GraphNode::Junction { .. }
                | GraphNode::HierarchicalLabel { .. }
                | GraphNode::GlobalLabel { .. } => {
                    visited.insert(neighbor);
                    queue.push_back(neighbor);
                }
                GraphNode::WireEndpoint { wire_id: other_wire, .. } => {
                    // Only a *valid, parsed* circuit label marks someone
                    // else's net boundary. A hierarchical/global label's raw
                    // text rides along on its host wire via the associator
                    // too, but it doesn't parse as a circuit identifier, so
                    // it must not block the crossing that leads to the real
                    // pin on the other sheet.
                    let other_parsed = wire_labels.get(other_wire).and_then(|a| a.parsed.as_ref());
                    if other_wire != wire_id && other_parsed.is_some() {
                        if boundary_fallback.is_none() {
                            boundary_fallback = Some(wire_labels[other_wire].label.text.clone());
                        }
                        continue;
                    }
                    visited.insert(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }
    }

    match boundary_fallback {
        Some(text) => ResolvedEndpoint::NetLabel { text },
        None => ResolvedEndpoint::Dangling,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::model::{ComponentInstance, Location, Pin, Position, Role, SheetId, WireSegment};
    use std::collections::HashMap;

    fn component(reference: &str, x: f64, y: f64) -> ComponentInstance {
        ComponentInstance {
            reference: reference.into(),
            sheet: SheetId(0),
            lib_id: "Device:R".into(),
            value: String::new(),
            description: String::new(),
            footprint: String::new(),
            location: Location::UNKNOWN,
            role: Role::Load,
            amperage: 1.0,
            position: Position::new(x, y),
            rotation: crate::model::Rotation::Deg0,
            mirror: false,
            is_power_symbol: false,
        }
    }

    #[test]
    fn wire_resolves_directly_to_component_pin() {
        let mut model = SchematicModel::default();
        model.wires.push(WireSegment {
            id: "w1".into(),
            sheet: SheetId(0),
            p1: Position::new(0.0, 0.0),
            p2: Position::new(10.0, 0.0),
        });
        model.components.push(component("R1", 10.0, 0.0));

        let mut pins = HashMap::new();
        pins.insert(("R1".to_string(), "1".to_string()), Pin { position: Position::new(10.0, 0.0) });

        let cg = build_graph(&model, &pins);
        let wire_labels = HashMap::new();
        let resolved = resolve_wires(&model, &cg, &wire_labels, true, &mut Diagnostics::default()).unwrap();

        assert_eq!(resolved.len(), 1);
        assert!(matches!(resolved[0].to, ResolvedEndpoint::ComponentPin { ref reference, .. } if reference == "R1"));
        assert!(matches!(resolved[0].from, ResolvedEndpoint::Dangling));
    }

    #[test]
    fn dangling_end_is_diagnosed_in_permissive_mode() {
        let mut model = SchematicModel::default();
        model.wires.push(WireSegment {
            id: "w1".into(),
            sheet: SheetId(0),
            p1: Position::new(0.0, 0.0),
            p2: Position::new(10.0, 0.0),
        });
        let pins = HashMap::new();
        let cg = build_graph(&model, &pins);
        let mut diags = Diagnostics::default();
        resolve_wires(&model, &cg, &HashMap::new(), true, &mut diags).unwrap();
        assert_eq!(diags.0.len(), 2);
        assert!(diags.0.iter().all(|d| d.kind == DiagnosticKind::DanglingEnd && d.severity == Severity::Warning));
    }

    #[test]
    fn dangling_end_is_fatal_in_strict_mode() {
        let mut model = SchematicModel::default();
        model.wires.push(WireSegment {
            id: "w1".into(),
            sheet: SheetId(0),
            p1: Position::new(0.0, 0.0),
            p2: Position::new(10.0, 0.0),
        });
        let pins = HashMap::new();
        let cg = build_graph(&model, &pins);
        let mut diags = Diagnostics::default();
        let result = resolve_wires(&model, &cg, &HashMap::new(), false, &mut diags);
        assert!(result.is_err());
        assert_eq!(diags.0.len(), 1);
    }
}
