//! Wire BOM assembler (§4.10). Joins every prior stage's output into the
//! final ordered rows: gauge, color, length, and the engineering annotations
//! (current, voltage drop, ampacity utilization, resistance, power loss).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::circuits::CircuitCurrent;
use crate::diagnostics::Diagnostics;
use crate::gauge::{select_gauge, GaugeSelection};
use crate::labels::WireLabelAssociation;
use crate::model::{Location, SchematicModel, WireSegment};
use crate::resolve::{ResolvedEndpoint, ResolvedWire};
use crate::settings::Settings;
use crate::tables::{default_color_for_system, GaugeTables, INFEASIBLE_GAUGE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireBomRow {
    pub wire_id: String,
    pub label: Option<String>,
    pub from: String,
    pub to: String,
    pub from_location: Option<Location>,
    pub to_location: Option<Location>,
    pub length_feet: f64,
    pub awg: i32,
    pub color: String,
    pub circuit_amps: Option<f64>,
    pub ampacity_amps: Option<f64>,
    pub ampacity_utilization: Option<f64>,
    pub voltage_drop_volts: Option<f64>,
    pub voltage_drop_fraction: Option<f64>,
    pub resistance_ohms: Option<f64>,
    pub power_loss_watts: Option<f64>,
    /// Other labels that landed on this segment but lost the canonical pick
    /// (§4.4), kept as notes rather than silently dropped.
    pub notes: Vec<String>,
}

/// Assembles one BOM row per wire segment, in `(sheet, wire id)` order for
/// reproducible output (§5, §8 property 6).
pub fn assemble_bom(
    model: &SchematicModel,
    resolved_wires: &[ResolvedWire],
    wire_labels: &HashMap<String, WireLabelAssociation>,
    circuit_currents: &HashMap<(char, u64), CircuitCurrent>,
    settings: &Settings,
    diags: &mut Diagnostics,
) -> Vec<WireBomRow> {
    let mut rows: Vec<(SortKey, WireBomRow)> = Vec::with_capacity(model.wires.len());

    for wire in &model.wires {
        let Some(resolved) = resolved_wires.iter().find(|r| r.wire_id == wire.id) else {
            continue;
        };
        // Strict mode never reaches here with a dangling wire (resolve_wires
        // aborts first); permissive mode leaves the row out entirely (§7).
        if matches!(resolved.from, ResolvedEndpoint::Dangling) || matches!(resolved.to, ResolvedEndpoint::Dangling) {
            continue;
        }
        let association = wire_labels.get(&wire.id);
        let parsed = association.and_then(|a| a.parsed.as_ref());

        let circuit_amps = parsed.and_then(|p| circuit_currents.get(&p.circuit_key())).map(|c| c.amperage);

        let length_feet = wire_length_feet(wire, settings.slack_inches);

        let gauge = select_gauge(
            circuit_amps,
            length_feet,
            settings.system_voltage,
            settings.max_voltage_drop_fraction,
            &settings.gauge_tables,
            association.map(|a| a.label.text.as_str()).unwrap_or(&wire.id),
            diags,
        );

        let color = parsed
            .map(|p| default_color_for_system(p.system).to_string())
            .unwrap_or_else(|| "White".to_string());

        let row = build_row(model, wire, resolved, association, &settings.gauge_tables, length_feet, circuit_amps, gauge, color);
        let sort_key = SortKey { sheet: wire.sheet.0, wire_id: wire.id.clone() };
        rows.push((sort_key, row));
    }

    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows.into_iter().map(|(_, row)| row).collect()
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    sheet: u32,
    wire_id: String,
}

fn build_row(
    model: &SchematicModel,
    wire: &WireSegment,
    resolved: &ResolvedWire,
    association: Option<&WireLabelAssociation>,
    tables: &GaugeTables,
    length_feet: f64,
    circuit_amps: Option<f64>,
    gauge: Option<GaugeSelection>,
    color: String,
) -> WireBomRow {
    let (from_desc, from_loc) = describe_endpoint(model, &resolved.from);
    let (to_desc, to_loc) = describe_endpoint(model, &resolved.to);

    let awg = gauge.map(|g| g.awg).unwrap_or(INFEASIBLE_GAUGE);
    let ampacity_amps = tables.ampacity(awg);
    let ampacity_utilization = match (circuit_amps, ampacity_amps) {
        (Some(c), Some(a)) if a > 0.0 => Some(c / a),
        _ => None,
    };
    let resistance_ohms = tables.resistance(awg).map(|r| r * length_feet * 2.0);
    let power_loss_watts = match (circuit_amps, resistance_ohms) {
        (Some(c), Some(r)) => Some(c * c * r),
        _ => None,
    };

    WireBomRow {
        wire_id: wire.id.clone(),
        label: association.map(|a| a.label.text.clone()),
        from: from_desc,
        to: to_desc,
        from_location: from_loc,
        to_location: to_loc,
        length_feet,
        awg,
        color,
        circuit_amps,
        ampacity_amps,
        ampacity_utilization,
        voltage_drop_volts: gauge.map(|g| g.voltage_drop_volts),
        voltage_drop_fraction: gauge.map(|g| g.voltage_drop_fraction),
        resistance_ohms,
        power_loss_watts,
        notes: association.map(|a| a.other_labels.clone()).unwrap_or_default(),
    }
}

fn describe_endpoint(model: &SchematicModel, endpoint: &ResolvedEndpoint) -> (String, Option<Location>) {
    match endpoint {
        ResolvedEndpoint::ComponentPin { reference, pin_number } => {
            let location = model.component_by_ref(reference).map(|c| c.location);
            (format!("{reference}-{pin_number}"), location)
        }
        ResolvedEndpoint::NetLabel { text } => (text.clone(), None),
        ResolvedEndpoint::Dangling => ("UNCONNECTED".to_string(), None),
    }
}

/// Physical wire length: straight-line distance between the two endpoints
/// plus fixed routing slack (§4.10), converted from mm to feet.
fn wire_length_feet(wire: &WireSegment, slack_inches: f64) -> f64 {
    const MM_PER_INCH: f64 = 25.4;
    const INCHES_PER_FOOT: f64 = 12.0;
    let length_mm = wire.p1.distance(&wire.p2);
    let length_inches = length_mm / MM_PER_INCH + slack_inches;
    length_inches / INCHES_PER_FOOT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Position, SheetId};

    #[test]
    fn wire_length_includes_slack() {
        let wire = WireSegment {
            id: "w1".into(),
            sheet: SheetId(0),
            p1: Position::new(0.0, 0.0),
            p2: Position::new(254.0, 0.0), // 10 inches
        };
        let feet = wire_length_feet(&wire, 24.0);
        assert!((feet - (34.0 / 12.0)).abs() < 1e-9);
    }

    #[test]
    fn assembles_rows_in_sheet_then_wire_id_order() {
        let mut model = SchematicModel::default();
        model.wires.push(WireSegment { id: "w2".into(), sheet: SheetId(0), p1: Position::new(0.0, 0.0), p2: Position::new(1.0, 0.0) });
        model.wires.push(WireSegment { id: "w1".into(), sheet: SheetId(0), p1: Position::new(0.0, 0.0), p2: Position::new(1.0, 0.0) });

        let pin = |n: &str| ResolvedEndpoint::ComponentPin { reference: "R1".into(), pin_number: n.into() };
        let resolved_wires = vec![
            ResolvedWire { wire_id: "w2".into(), from: pin("1"), to: pin("2") },
            ResolvedWire { wire_id: "w1".into(), from: pin("1"), to: pin("2") },
        ];

        let settings = Settings::default();
        let mut diags = Diagnostics::default();
        let rows = assemble_bom(&model, &resolved_wires, &HashMap::new(), &HashMap::new(), &settings, &mut diags);
        assert_eq!(rows[0].wire_id, "w1");
        assert_eq!(rows[1].wire_id, "w2");
    }
}
