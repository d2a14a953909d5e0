//! Reference tables (§4.8, §6): resistance/ampacity over the standard gauge
//! set, the default system-code-to-color map, and the fixed power-symbol
//! reference set used by the resolver (§4.6).

use serde::{Deserialize, Serialize};

/// Standard gauges considered, ordered smallest-copper-first (§4.8).
pub const STANDARD_GAUGES: [i32; 11] = [22, 20, 18, 16, 14, 12, 10, 8, 6, 4, 2];

/// Sentinel gauge returned when no candidate satisfies both constraints, or
/// when circuit current could not be determined at all (§4.8).
pub const INFEASIBLE_GAUGE: i32 = -99;

/// Per-gauge ohms/foot and amperes. Overridable via [`Settings::gauge_tables`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaugeTables {
    pub resistance_ohms_per_foot: Vec<(i32, f64)>,
    pub ampacity_amps: Vec<(i32, f64)>,
}

impl Default for GaugeTables {
    fn default() -> Self {
        // Representative values for stranded copper aircraft wire (MIL-W-22759
        // style), consistent with the ordering in §4.8.
        Self {
            resistance_ohms_per_foot: vec![
                (22, 0.01640),
                (20, 0.01015),
                (18, 0.00639),
                (16, 0.00402),
                (14, 0.00252),
                (12, 0.00159),
                (10, 0.00100),
                (8, 0.000628),
                (6, 0.000395),
                (4, 0.000249),
                (2, 0.000156),
            ],
            ampacity_amps: vec![
                (22, 5.0),
                (20, 7.5),
                (18, 10.0),
                (16, 13.0),
                (14, 17.0),
                (12, 23.0),
                (10, 33.0),
                (8, 46.0),
                (6, 60.0),
                (4, 80.0),
                (2, 100.0),
            ],
        }
    }
}

impl GaugeTables {
    pub fn resistance(&self, awg: i32) -> Option<f64> {
        self.resistance_ohms_per_foot
            .iter()
            .find(|(g, _)| *g == awg)
            .map(|(_, r)| *r)
    }

    pub fn ampacity(&self, awg: i32) -> Option<f64> {
        self.ampacity_amps.iter().find(|(g, _)| *g == awg).map(|(_, a)| *a)
    }
}

/// Default system-code to color map, used when a component does not override.
pub fn default_color_for_system(system: char) -> &'static str {
    match system {
        'P' => "Red",
        'G' => "Black",
        'L' => "Yellow",
        'A' => "White",
        'R' => "Blue",
        'N' => "Orange",
        'F' => "Brown",
        'E' => "Green",
        _ => "White",
    }
}

/// Exact-match power-symbol reference set (§4.6, §6). Not a regex: the set is
/// finite and fully enumerated by the spec.
pub fn is_power_symbol_reference(reference: &str) -> bool {
    const GROUND_REFS: &[&str] = &[
        "GND", "GND1", "GND2", "GND3", "GND4", "GND5", "GND6", "GND12", "GND24", "GNDREF",
    ];
    if GROUND_REFS.contains(&reference) {
        return true;
    }
    if reference == "VDC" || reference == "VAC" {
        return true;
    }
    const RAIL_NUMBERS: &[&str] = &["1", "2", "3", "4", "5", "6", "12", "24"];
    for sign in ["+", "-"] {
        for n in RAIL_NUMBERS {
            if reference == format!("{sign}{n}V") || reference == format!("{sign}{n}VA") {
                return true;
            }
        }
    }
    false
}
