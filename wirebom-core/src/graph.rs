//! Connectivity graph builder (§4.5). Builds an undirected multigraph over
//! wire endpoints, junctions, component pins, hierarchical labels, global
//! labels, and sheet pins, connecting everything that occupies the same point
//! in space. Frozen once built — later stages only traverse it.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};

use crate::model::{LabelKind, Pin, SchematicModel, SheetId};

/// A node in the connectivity graph (§3, §9 "Polymorphism over graph nodes").
#[derive(Debug, Clone, PartialEq)]
pub enum GraphNode {
    WireEndpoint { wire_id: String, sheet: SheetId, end: u8 },
    Junction { sheet: SheetId },
    ComponentPin { reference: String, pin_number: String },
    HierarchicalLabel { label_id: String, sheet: SheetId },
    GlobalLabel { label_id: String, sheet: SheetId },
    SheetPin { sheet_symbol_id: String, pin_name: String },
}

/// The frozen connectivity graph plus the indices needed to look nodes back
/// up by spatial key or identity.
pub struct ConnectivityGraph {
    pub graph: UnGraph<GraphNode, ()>,
    spatial_index: HashMap<(SheetId, i64, i64), Vec<NodeIndex>>,
    pub wire_endpoints: HashMap<(String, u8), NodeIndex>,
    pub component_pins: HashMap<(String, String), NodeIndex>,
}

impl ConnectivityGraph {
    pub fn nodes_at(&self, sheet: SheetId, key: (i64, i64)) -> &[NodeIndex] {
        self.spatial_index
            .get(&(sheet, key.0, key.1))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn add_node(
    graph: &mut UnGraph<GraphNode, ()>,
    spatial_index: &mut HashMap<(SheetId, i64, i64), Vec<NodeIndex>>,
    node: GraphNode,
    sheet: SheetId,
    key: (i64, i64),
) -> NodeIndex {
    let idx = graph.add_node(node);
    spatial_index.entry((sheet, key.0, key.1)).or_default().push(idx);
    idx
}

/// Builds the graph: one node per wire endpoint, junction, component pin,
/// hierarchical label, global label, and sheet pin; one coincidence edge
/// between any two nodes in the same sheet that occupy the same
/// 0.01mm-rounded point; one wire edge between a segment's two endpoints; one
/// cross-sheet edge between a parent sheet pin and its matching child
/// hierarchical label; one equivalence edge between every pair of global
/// labels sharing identical text anywhere in the design, a linkage pass kept
/// entirely separate from the spatial one above (§9 "Global-label scope").
pub fn build_graph(
    model: &SchematicModel,
    pins: &HashMap<(String, String), Pin>,
) -> ConnectivityGraph {
    let mut graph = UnGraph::new_undirected();
    let mut spatial_index: HashMap<(SheetId, i64, i64), Vec<NodeIndex>> = HashMap::new();
    let mut wire_endpoints = HashMap::new();
    let mut component_pins = HashMap::new();

    for wire in &model.wires {
        let a = add_node(&mut graph, &mut spatial_index, GraphNode::WireEndpoint {
            wire_id: wire.id.clone(),
            sheet: wire.sheet,
            end: 0,
        }, wire.sheet, wire.p1.key());
        let b = add_node(&mut graph, &mut spatial_index, GraphNode::WireEndpoint {
            wire_id: wire.id.clone(),
            sheet: wire.sheet,
            end: 1,
        }, wire.sheet, wire.p2.key());
        graph.add_edge(a, b, ());
        wire_endpoints.insert((wire.id.clone(), 0u8), a);
        wire_endpoints.insert((wire.id.clone(), 1u8), b);
    }

    for junction in &model.junctions {
        add_node(
            &mut graph,
            &mut spatial_index,
            GraphNode::Junction { sheet: junction.sheet },
            junction.sheet,
            junction.position.key(),
        );
    }

    for component in &model.components {
        for ((reference, pin_number), pin) in pins.iter() {
            if reference != &component.reference {
                continue;
            }
            let idx = add_node(
                &mut graph,
                &mut spatial_index,
                GraphNode::ComponentPin {
                    reference: reference.clone(),
                    pin_number: pin_number.clone(),
                },
                component.sheet,
                pin.position.key(),
            );
            component_pins.insert((reference.clone(), pin_number.clone()), idx);
        }
    }

    for label in model.labels.iter().filter(|l| l.kind == LabelKind::Hierarchical) {
        add_node(
            &mut graph,
            &mut spatial_index,
            GraphNode::HierarchicalLabel { label_id: label.id.clone(), sheet: label.sheet },
            label.sheet,
            label.position.key(),
        );
    }

    let mut global_label_nodes: HashMap<String, Vec<NodeIndex>> = HashMap::new();
    for label in model.labels.iter().filter(|l| l.kind == LabelKind::Global) {
        let idx = add_node(
            &mut graph,
            &mut spatial_index,
            GraphNode::GlobalLabel { label_id: label.id.clone(), sheet: label.sheet },
            label.sheet,
            label.position.key(),
        );
        global_label_nodes.entry(label.text.clone()).or_default().push(idx);
    }

    for sheet_symbol in &model.sheet_symbols {
        for pin in &sheet_symbol.pins {
            add_node(
                &mut graph,
                &mut spatial_index,
                GraphNode::SheetPin {
                    sheet_symbol_id: sheet_symbol.id.clone(),
                    pin_name: pin.name.clone(),
                },
                sheet_symbol.sheet,
                pin.position.key(),
            );
        }
    }

    // Coincidence edges: anything sharing a spatial key on the same sheet is
    // electrically the same point.
    for nodes in spatial_index.values() {
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                if graph.find_edge(nodes[i], nodes[j]).is_none() {
                    graph.add_edge(nodes[i], nodes[j], ());
                }
            }
        }
    }

    // Global-label equivalence pass: every occurrence of the same text forms
    // one electrical net, design-wide, independent of the spatial index above.
    for nodes in global_label_nodes.values() {
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                if graph.find_edge(nodes[i], nodes[j]).is_none() {
                    graph.add_edge(nodes[i], nodes[j], ());
                }
            }
        }
    }

    // Cross-sheet edges: a sheet pin on the parent connects to the matching
    // hierarchical label (same name) inside the child sheet.
    for sheet_symbol in &model.sheet_symbols {
        for sheet_pin in &sheet_symbol.pins {
            let Some(&pin_idx) = spatial_index
                .get(&(sheet_symbol.sheet, sheet_pin.position.key().0, sheet_pin.position.key().1))
                .and_then(|nodes| {
                    nodes.iter().find(|idx| {
                        matches!(
                            &graph[**idx],
                            GraphNode::SheetPin { pin_name, .. } if pin_name == &sheet_pin.name
                        )
                    })
                })
            else {
                continue;
            };

            if let Some(label_idx) = find_matching_hierarchical_label(
                model,
                &graph,
                sheet_symbol.child_sheet,
                &sheet_pin.name,
            ) {
                if graph.find_edge(pin_idx, label_idx).is_none() {
                    graph.add_edge(pin_idx, label_idx, ());
                }
            }
        }
    }

    ConnectivityGraph {
        graph,
        spatial_index,
        wire_endpoints,
        component_pins,
    }
}

fn find_matching_hierarchical_label(
    model: &SchematicModel,
    graph: &UnGraph<GraphNode, ()>,
    child_sheet: SheetId,
    pin_name: &str,
) -> Option<NodeIndex> {
    let label = model
        .labels
        .iter()
        .find(|l| l.sheet == child_sheet && l.kind == LabelKind::Hierarchical && l.text == pin_name)?;
    graph
        .node_indices()
        .find(|&idx| matches!(&graph[idx], GraphNode::HierarchicalLabel { label_id, .. } if label_id == &label.id))
}
