//! Circuit-current aggregator (§4.7). Groups labeled wires by `(system,
//! circuit-number)` and sums the amperage of every distinct Load component
//! reachable without crossing into a different circuit group. Rating
//! components pass current through unchanged; Source and Ground terminate
//! traversal.

use std::collections::{HashMap, HashSet};

use crate::labels::WireLabelAssociation;
use crate::model::{ParsedLabel, Role, SchematicModel};
use crate::resolve::{ResolvedEndpoint, ResolvedWire};

/// Total current demanded by one `(system, circuit-number)` group.
#[derive(Debug, Clone, Default)]
pub struct CircuitCurrent {
    pub amperage: f64,
    pub load_references: Vec<String>,
}

/// Aggregates current per circuit key. Wires with no resolved circuit label
/// (orphans, unlabeled stubs) are simply excluded from every group.
pub fn aggregate_circuit_currents(
    model: &SchematicModel,
    resolved_wires: &[ResolvedWire],
    wire_labels: &HashMap<String, WireLabelAssociation>,
) -> HashMap<(char, u64), CircuitCurrent> {
    let mut groups: HashMap<(char, u64), CircuitCurrent> = HashMap::new();
    let mut seen_per_group: HashMap<(char, u64), HashSet<String>> = HashMap::new();

    for wire in resolved_wires {
        let Some(parsed) = wire_labels.get(&wire.wire_id).and_then(|a| a.parsed.as_ref()) else {
            continue;
        };
        let key = parsed.circuit_key();
        let entry = groups.entry(key).or_default();
        let seen = seen_per_group.entry(key).or_default();

        for reference in loads_reachable_from(model, wire, parsed, resolved_wires, wire_labels) {
            if seen.insert(reference.clone()) {
                if let Some(component) = model.component_by_ref(&reference) {
                    entry.amperage += component.amperage;
                    entry.load_references.push(reference);
                }
            }
        }
    }

    groups
}

/// Walks outward from both ends of `wire` through Rating components (which
/// pass current through) until it finds Load components, stopping at
/// Source/Ground terminators or at a wire whose own circuit key differs.
fn loads_reachable_from(
    model: &SchematicModel,
    wire: &ResolvedWire,
    parsed: &ParsedLabel,
    resolved_wires: &[ResolvedWire],
    wire_labels: &HashMap<String, WireLabelAssociation>,
) -> Vec<String> {
    let mut found = Vec::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<String> = Vec::new();

    for endpoint in [&wire.from, &wire.to] {
        if let ResolvedEndpoint::ComponentPin { reference, .. } = endpoint {
            stack.push(reference.clone());
        }
    }

    while let Some(reference) = stack.pop() {
        if !visited.insert(reference.clone()) {
            continue;
        }
        let Some(component) = model.component_by_ref(&reference) else { continue };
        match component.role {
            Role::Load => found.push(reference),
            Role::Rating => {
                // A Rating component passes current through to whatever is
                // wired to its other pins within the same circuit group.
                for other in component_group_neighbors(&reference, parsed, resolved_wires, wire_labels) {
                    stack.push(other);
                }
            }
            Role::Source | Role::Ground => {}
        }
    }

    found
}

/// References of components directly wired to `reference` via a wire that is
/// either unlabeled (a plain physical continuation) or carries the same
/// circuit key (still inside the group) — never a wire labeled into a
/// different circuit.
fn component_group_neighbors(
    reference: &str,
    parsed: &ParsedLabel,
    resolved_wires: &[ResolvedWire],
    wire_labels: &HashMap<String, WireLabelAssociation>,
) -> Vec<String> {
    let mut out = Vec::new();
    for wire in resolved_wires {
        let in_group = match wire_labels.get(&wire.wire_id).and_then(|a| a.parsed.as_ref()) {
            Some(other_parsed) => other_parsed.circuit_key() == parsed.circuit_key(),
            None => true,
        };
        if !in_group {
            continue;
        }
        let refs: Vec<&str> = [&wire.from, &wire.to]
            .into_iter()
            .filter_map(|e| match e {
                ResolvedEndpoint::ComponentPin { reference, .. } => Some(reference.as_str()),
                _ => None,
            })
            .collect();
        if refs.contains(&reference) {
            for other in refs {
                if other != reference {
                    out.push(other.to_string());
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentInstance, Location, Position, Rotation, SheetId, WireSegment};

    fn load(reference: &str, amps: f64) -> ComponentInstance {
        ComponentInstance {
            reference: reference.into(),
            sheet: SheetId(0),
            lib_id: "Device:Lamp".into(),
            value: String::new(),
            description: String::new(),
            footprint: String::new(),
            location: Location::UNKNOWN,
            role: Role::Load,
            amperage: amps,
            position: Position::new(0.0, 0.0),
            rotation: Rotation::Deg0,
            mirror: false,
            is_power_symbol: false,
        }
    }

    #[test]
    fn sums_distinct_loads_once() {
        let mut model = SchematicModel::default();
        model.components.push(load("L1", 2.0));
        model.wires.push(WireSegment {
            id: "w1".into(),
            sheet: SheetId(0),
            p1: Position::new(0.0, 0.0),
            p2: Position::new(1.0, 0.0),
        });
        model.wires.push(WireSegment {
            id: "w2".into(),
            sheet: SheetId(0),
            p1: Position::new(1.0, 0.0),
            p2: Position::new(2.0, 0.0),
        });

        let parsed = ParsedLabel { system: 'L', circuit_text: "1".into(), circuit_number: 1, segment: Some('A') };
        let label = crate::model::Label {
            id: "lbl1".into(),
            sheet: SheetId(0),
            text: "L1A".into(),
            position: Position::new(0.5, 0.0),
            kind: crate::model::LabelKind::Local,
        };
        let mut wire_labels = HashMap::new();
        wire_labels.insert(
            "w1".to_string(),
            WireLabelAssociation { wire_id: "w1".into(), label: label.clone(), parsed: Some(parsed.clone()), distance: 0.1, other_labels: Vec::new() },
        );
        wire_labels.insert(
            "w2".to_string(),
            WireLabelAssociation { wire_id: "w2".into(), label, parsed: Some(parsed), distance: 0.1, other_labels: Vec::new() },
        );

        let resolved_wires = vec![
            ResolvedWire {
                wire_id: "w1".into(),
                from: ResolvedEndpoint::Dangling,
                to: ResolvedEndpoint::ComponentPin { reference: "L1".into(), pin_number: "1".into() },
            },
            ResolvedWire {
                wire_id: "w2".into(),
                from: ResolvedEndpoint::ComponentPin { reference: "L1".into(), pin_number: "1".into() },
                to: ResolvedEndpoint::Dangling,
            },
        ];

        let totals = aggregate_circuit_currents(&model, &resolved_wires, &wire_labels);
        let total = totals.get(&('L', 1)).unwrap();
        assert_eq!(total.amperage, 2.0);
        assert_eq!(total.load_references, vec!["L1".to_string()]);
    }
}
