//! End-to-end pipeline tests against small literal schematic fixtures.

use std::path::PathBuf;

use wirebom_core::diagnostics::DiagnosticKind;
use wirebom_core::{run_pipeline, Settings};

fn write_fixture(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("wirebom_pipeline_test_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Writes a main + child sheet pair into the same directory, for hierarchical
/// (cross-sheet) fixtures, returning the main file's path.
fn write_hierarchical_fixture(main_name: &str, main: &str, child_name: &str, child: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("wirebom_pipeline_test_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(child_name), child).unwrap();
    let main_path = dir.join(main_name);
    std::fs::write(&main_path, main).unwrap();
    main_path
}

const SYMBOL_LIB: &str = r#"
    (lib_symbols
        (symbol "power:Source"
            (symbol "Source_0_1"
                (pin power_in line (at 0 0 0) (length 0) (name "~" (effects (font))) (number "1" (effects (font))))
            )
        )
        (symbol "Device:Lamp"
            (symbol "Lamp_0_1"
                (pin passive line (at 0 0 0) (length 0) (name "~" (effects (font))) (number "1" (effects (font))))
            )
        )
    )
"#;

#[test]
fn simple_two_component_circuit_produces_one_bom_row() {
    let content = format!(
        r#"(kicad_sch
            {SYMBOL_LIB}
            (wire (pts (xy 0 0) (xy 50 0)) (uuid w1))
            (label "P1A" (at 25 0 0) (uuid lbl1))
            (symbol (lib_id "power:Source") (at 0 0 0)
                (property "Reference" "BT1")
                (property "Value" "14V")
                (property "WireLoc" "bat|(10,0,0)S40"))
            (symbol (lib_id "Device:Lamp") (at 50 0 0)
                (property "Reference" "LMP1")
                (property "Value" "Lamp")
                (property "WireLoc" "lamp|(20,0,0)L2.0"))
        )"#
    );
    let path = write_fixture("main.kicad_sch", &content);

    let settings = Settings::new(path);
    let result = run_pipeline(settings).unwrap();

    assert_eq!(result.bom.len(), 1);
    let row = &result.bom[0];
    assert_eq!(row.label.as_deref(), Some("P1A"));
    assert_eq!(row.circuit_amps, Some(2.0));
    assert!(row.awg > 0);
    assert!(!result.diagnostics.has_errors());
}

#[test]
fn missing_location_role_is_fatal_in_strict_mode() {
    let content = format!(
        r#"(kicad_sch
            {SYMBOL_LIB}
            (wire (pts (xy 0 0) (xy 50 0)) (uuid w1))
            (symbol (lib_id "Device:Lamp") (at 50 0 0)
                (property "Reference" "LMP1")
                (property "Value" "Lamp"))
        )"#
    );
    let path = write_fixture("main.kicad_sch", &content);

    let settings = Settings::new(path);
    let result = run_pipeline(settings);
    assert!(result.is_err());
}

#[test]
fn missing_location_role_is_a_warning_in_permissive_mode() {
    let content = format!(
        r#"(kicad_sch
            {SYMBOL_LIB}
            (wire (pts (xy 0 0) (xy 50 0)) (uuid w1))
            (symbol (lib_id "Device:Lamp") (at 50 0 0)
                (property "Reference" "LMP1")
                (property "Value" "Lamp"))
        )"#
    );
    let path = write_fixture("main.kicad_sch", &content);

    let mut settings = Settings::new(path);
    settings.permissive = true;
    let result = run_pipeline(settings).unwrap();
    assert!(result
        .diagnostics
        .0
        .iter()
        .any(|d| d.kind == DiagnosticKind::MissingLocationRole));
}

#[test]
fn orphan_label_is_a_warning_not_a_failure() {
    let content = format!(
        r#"(kicad_sch
            {SYMBOL_LIB}
            (wire (pts (xy 0 0) (xy 50 0)) (uuid w1))
            (label "P9Z" (at 25 500 0) (uuid lbl1))
            (symbol (lib_id "power:Source") (at 0 0 0)
                (property "Reference" "BT1")
                (property "Value" "14V")
                (property "WireLoc" "bat|(10,0,0)S40"))
            (symbol (lib_id "Device:Lamp") (at 50 0 0)
                (property "Reference" "LMP1")
                (property "Value" "Lamp")
                (property "WireLoc" "lamp|(20,0,0)L2.0"))
        )"#
    );
    let path = write_fixture("main.kicad_sch", &content);

    let settings = Settings::new(path);
    let result = run_pipeline(settings).unwrap();
    assert!(result.diagnostics.0.iter().any(|d| d.kind == DiagnosticKind::OrphanLabel));
    assert_eq!(result.bom.len(), 1);
    assert_eq!(result.bom[0].label, None);
}

const SWITCH_SYMBOL_LIB: &str = r#"
    (lib_symbols
        (symbol "power:Source"
            (symbol "Source_0_1"
                (pin power_in line (at 0 0 0) (length 0) (name "~" (effects (font))) (number "1" (effects (font))))
            )
        )
        (symbol "Device:Lamp"
            (symbol "Lamp_0_1"
                (pin passive line (at 0 0 0) (length 0) (name "~" (effects (font))) (number "1" (effects (font))))
            )
        )
        (symbol "Device:Switch"
            (symbol "Switch_0_1"
                (pin passive line (at 0 0 0) (length 0) (name "~" (effects (font))) (number "1" (effects (font))))
                (pin passive line (at 10 0 0) (length 0) (name "~" (effects (font))) (number "2" (effects (font))))
            )
        )
    )
"#;

/// S2: a pass-through switch splits one circuit into two wire segments
/// (`L1A`, `L1B`); both must aggregate the same circuit current and receive
/// consistent gauge selection even though neither wire touches the lamp or
/// source directly.
#[test]
fn pass_through_switch_shares_circuit_current_across_segments() {
    let content = format!(
        r#"(kicad_sch
            {SWITCH_SYMBOL_LIB}
            (wire (pts (xy 0 0) (xy 50 0)) (uuid w1))
            (label "L1A" (at 25 0 0) (uuid lbl1))
            (wire (pts (xy 60 0) (xy 110 0)) (uuid w2))
            (label "L1B" (at 85 0 0) (uuid lbl2))
            (symbol (lib_id "power:Source") (at 0 0 0)
                (property "Reference" "BT1")
                (property "Value" "14V")
                (property "WireLoc" "bat|(0,0,0)S40"))
            (symbol (lib_id "Device:Switch") (at 50 0 0)
                (property "Reference" "SW1")
                (property "Value" "SPST")
                (property "WireLoc" "sw|(30,0,0)R"))
            (symbol (lib_id "Device:Lamp") (at 110 0 0)
                (property "Reference" "LMP1")
                (property "Value" "Lamp")
                (property "WireLoc" "lamp|(80,0,0)L3.0"))
        )"#
    );
    let path = write_fixture("main.kicad_sch", &content);

    let settings = Settings::new(path);
    let result = run_pipeline(settings).unwrap();

    assert!(!result.diagnostics.has_errors());
    assert_eq!(result.bom.len(), 2);
    for row in &result.bom {
        assert_eq!(row.circuit_amps, Some(3.0));
    }
}

/// S3: a ground bus ties three component pins together through one junction.
/// Two of the three branches carry distinct, valid labels (`G1A`, `G2A`); the
/// third is the common unlabeled node. This is the N-1 rule's expected
/// passing shape, not a mismatch.
#[test]
fn multipoint_ground_bus_with_n_minus_one_labels_is_not_flagged() {
    let content = r#"(kicad_sch
        (lib_symbols
            (symbol "power:Battery"
                (symbol "Battery_0_1"
                    (pin power_in line (at 0 0 0) (length 0) (name "~" (effects (font))) (number "1" (effects (font))))
                    (pin power_in line (at 0 -10 0) (length 0) (name "~" (effects (font))) (number "2" (effects (font))))
                )
            )
            (symbol "Device:Lamp"
                (symbol "Lamp_0_1"
                    (pin passive line (at 0 0 0) (length 0) (name "~" (effects (font))) (number "1" (effects (font))))
                )
            )
        )
        (wire (pts (xy 0 -10) (xy 20 -10)) (uuid wA))
        (label "G1A" (at 10 -10 0) (uuid lblA))
        (wire (pts (xy 20 -10) (xy 40 -10)) (uuid wB))
        (label "G2A" (at 30 -10 0) (uuid lblB))
        (wire (pts (xy 20 -10) (xy 20 -30)) (uuid wC))
        (junction (at 20 -10))
        (symbol (lib_id "power:Battery") (at 0 0 0)
            (property "Reference" "BT1")
            (property "Value" "14V")
            (property "WireLoc" "bat|(0,0,0)S40"))
        (symbol (lib_id "Device:Lamp") (at 40 -10 0)
            (property "Reference" "LMP1")
            (property "Value" "Lamp")
            (property "WireLoc" "lamp|(40,-10,0)L1.0"))
        (symbol (lib_id "Device:Lamp") (at 20 -30 0)
            (property "Reference" "LMP2")
            (property "Value" "Lamp")
            (property "WireLoc" "lamp|(20,-30,0)L1.0"))
    )"#
    .to_string();
    let path = write_fixture("main.kicad_sch", &content);

    let settings = Settings::new(path);
    let result = run_pipeline(settings).unwrap();

    assert!(!result
        .diagnostics
        .0
        .iter()
        .any(|d| d.kind == DiagnosticKind::MultipointLabelMismatch));
}

/// S4: a wire on the main sheet crosses into a child sheet through a sheet
/// pin / hierarchical label pair and must resolve to the lamp's real
/// component pin over there, not to the `SIG1` label text itself.
#[test]
fn cross_sheet_link_resolves_to_real_component_pins() {
    let main = format!(
        r#"(kicad_sch
            {SYMBOL_LIB}
            (wire (pts (xy 0 0) (xy 50 0)) (uuid w1))
            (symbol (lib_id "power:Source") (at 0 0 0)
                (property "Reference" "BT1")
                (property "Value" "14V")
                (property "WireLoc" "bat|(0,0,0)S40"))
            (sheet (at 50 0 0)
                (property "Sheetfile" "child.kicad_sch")
                (pin "SIG1" input (at 50 0 0)))
        )"#
    );
    let child = format!(
        r#"(kicad_sch
            {SYMBOL_LIB}
            (hierarchical_label "SIG1" (at 0 0 0) (uuid hlbl1))
            (wire (pts (xy 0 0) (xy 50 0)) (uuid w2))
            (symbol (lib_id "Device:Lamp") (at 50 0 0)
                (property "Reference" "LMP1")
                (property "Value" "Lamp")
                (property "WireLoc" "lamp|(20,0,0)L2.0"))
        )"#
    );
    let path = write_hierarchical_fixture("main.kicad_sch", &main, "child.kicad_sch", &child);

    let settings = Settings::new(path);
    let result = run_pipeline(settings).unwrap();

    assert!(!result.diagnostics.has_errors());
    assert!(!result.diagnostics.0.iter().any(|d| d.kind == DiagnosticKind::DanglingEnd));
    assert_eq!(result.bom.len(), 2);
    for row in &result.bom {
        assert_ne!(row.from, "SIG1");
        assert_ne!(row.to, "SIG1");
        assert!(row.from.contains('-'));
        assert!(row.to.contains('-'));
    }
}

/// S6: a load demanding far more current than any standard gauge's ampacity
/// covers must select the infeasible sentinel, not silently pick the
/// thickest gauge.
#[test]
fn gauge_infeasibility_selects_sentinel_awg() {
    let content = format!(
        r#"(kicad_sch
            {SYMBOL_LIB}
            (wire (pts (xy 0 0) (xy 50 0)) (uuid w1))
            (label "L1A" (at 25 0 0) (uuid lbl1))
            (symbol (lib_id "power:Source") (at 0 0 0)
                (property "Reference" "BT1")
                (property "Value" "14V")
                (property "WireLoc" "bat|(10,0,0)S40"))
            (symbol (lib_id "Device:Lamp") (at 50 0 0)
                (property "Reference" "LMP1")
                (property "Value" "Lamp")
                (property "WireLoc" "lamp|(20,0,0)L500.0"))
        )"#
    );
    let path = write_fixture("main.kicad_sch", &content);

    let settings = Settings::new(path);
    let result = run_pipeline(settings).unwrap();

    assert_eq!(result.bom.len(), 1);
    assert_eq!(result.bom[0].awg, wirebom_core::gauge::infeasible_marker());
    assert!(result.diagnostics.0.iter().any(|d| d.kind == DiagnosticKind::GaugeInfeasible));
}
