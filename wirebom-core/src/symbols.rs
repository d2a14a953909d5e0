//! Symbol-library resolver (§4.3): builds a `lib_id -> SymbolDef` map from the
//! schematic's `lib_symbols` section, exposing each pin's local (unrotated,
//! unmirrored) position.

use std::collections::HashMap;

use crate::model::{PinDef, Position, SymbolDef};
use crate::sexp::SExp;

/// Parses the `(lib_symbols (symbol "Lib:Name" ...) ...)` top-level form.
/// Real KiCad symbol definitions nest pins inside per-unit sub-`symbol`
/// forms; we don't care about units for BOM purposes, so we collect every
/// `pin` descendant regardless of nesting depth.
pub fn build_symbol_library(lib_symbols: &SExp) -> HashMap<String, SymbolDef> {
    let mut map = HashMap::new();
    for sym in lib_symbols.get_all("symbol") {
        let Some(list) = sym.as_list() else { continue };
        let Some(lib_id) = list.get(1).and_then(|a| a.as_atom()) else { continue };
        let mut pins = Vec::new();
        collect_pins(sym, &mut pins);
        map.insert(lib_id.to_string(), SymbolDef { lib_id: lib_id.to_string(), pins });
    }
    map
}

fn collect_pins(node: &SExp, out: &mut Vec<PinDef>) {
    let Some(list) = node.as_list() else { return };
    for item in list {
        let Some(item_list) = item.as_list() else { continue };
        match item_list.first().and_then(|a| a.as_atom()) {
            Some("pin") => {
                if let Some(pin_def) = parse_pin(item) {
                    out.push(pin_def);
                }
                // pins themselves may not nest further, but keep walking in
                // case of alternate_pin / other annotations.
                collect_pins(item, out);
            }
            Some("symbol") => collect_pins(item, out),
            _ => collect_pins(item, out),
        }
    }
}

fn parse_pin(pin_sexp: &SExp) -> Option<PinDef> {
    let at = pin_sexp.get("at")?;
    let at_list = at.as_list()?;
    let x: f64 = at_list.get(1)?.as_atom()?.parse().ok()?;
    let y: f64 = at_list.get(2)?.as_atom()?.parse().ok()?;

    let number = pin_sexp
        .get("number")
        .and_then(|n| n.as_list())
        .and_then(|l| l.get(1))
        .and_then(|a| a.as_atom())
        .unwrap_or("")
        .to_string();

    if number.is_empty() {
        return None;
    }

    Some(PinDef {
        number,
        local_offset: Position::new(x, y),
    })
}
