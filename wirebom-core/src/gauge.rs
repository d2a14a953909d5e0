//! Gauge selector (§4.8). Picks the smallest standard wire gauge that
//! satisfies both the ampacity constraint and the maximum voltage-drop
//! fraction, over the wire's own length plus the configured slack.

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location as DLoc, Severity};
use crate::tables::{GaugeTables, INFEASIBLE_GAUGE, STANDARD_GAUGES};

#[derive(Debug, Clone, Copy)]
pub struct GaugeSelection {
    pub awg: i32,
    pub voltage_drop_volts: f64,
    pub voltage_drop_fraction: f64,
}

/// Selects the smallest gauge whose ampacity covers `current_amps` and whose
/// voltage drop at `length_feet` stays within `max_drop_fraction` of
/// `system_voltage`. Returns `None` (and a diagnostic) if no candidate works,
/// or if current is unknown to begin with.
pub fn select_gauge(
    current_amps: Option<f64>,
    length_feet: f64,
    system_voltage: f64,
    max_drop_fraction: f64,
    tables: &GaugeTables,
    wire_label: &str,
    diags: &mut Diagnostics,
) -> Option<GaugeSelection> {
    let Some(current_amps) = current_amps else {
        diags.push(Diagnostic::new(
            Severity::Warning,
            DiagnosticKind::UnknownCircuitCurrent,
            DLoc::WireLabel(wire_label.to_string()),
            format!("wire {wire_label} has no determinable circuit current; gauge left infeasible"),
        ));
        return None;
    };

    for &awg in STANDARD_GAUGES.iter() {
        let Some(ampacity) = tables.ampacity(awg) else { continue };
        if ampacity < current_amps {
            continue;
        }
        let Some(resistance) = tables.resistance(awg) else { continue };
        let drop = current_amps * resistance * length_feet;
        let fraction = drop / system_voltage;
        if fraction <= max_drop_fraction {
            return Some(GaugeSelection { awg, voltage_drop_volts: drop, voltage_drop_fraction: fraction });
        }
    }

    diags.push(Diagnostic::new(
        Severity::Error,
        DiagnosticKind::GaugeInfeasible,
        DLoc::WireLabel(wire_label.to_string()),
        format!(
            "no standard gauge carries {current_amps:.2}A over {length_feet:.1}ft within {:.0}% voltage drop",
            max_drop_fraction * 100.0
        ),
    ));
    None
}

pub fn infeasible_marker() -> i32 {
    INFEASIBLE_GAUGE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_smallest_gauge_that_satisfies_both_constraints() {
        let tables = GaugeTables::default();
        let mut diags = Diagnostics::default();
        let result = select_gauge(Some(3.0), 5.0, 14.0, 0.05, &tables, "L1A", &mut diags).unwrap();
        assert!(tables.ampacity(result.awg).unwrap() >= 3.0);
        assert!(result.voltage_drop_fraction <= 0.05);
    }

    #[test]
    fn unknown_current_is_infeasible() {
        let tables = GaugeTables::default();
        let mut diags = Diagnostics::default();
        let result = select_gauge(None, 5.0, 14.0, 0.05, &tables, "L1A", &mut diags);
        assert!(result.is_none());
        assert_eq!(diags.0[0].kind, DiagnosticKind::UnknownCircuitCurrent);
    }

    #[test]
    fn huge_current_over_huge_length_is_infeasible() {
        let tables = GaugeTables::default();
        let mut diags = Diagnostics::default();
        let result = select_gauge(Some(500.0), 1000.0, 14.0, 0.05, &tables, "L1A", &mut diags);
        assert!(result.is_none());
        assert_eq!(diags.0[0].kind, DiagnosticKind::GaugeInfeasible);
    }
}
