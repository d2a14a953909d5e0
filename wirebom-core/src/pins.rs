//! Pin-position calculator (§4.3). Turns a component's local, unrotated pin
//! offsets into absolute schematic coordinates by applying the component's
//! rotation, optional mirror, and translation — grounded on the teacher's
//! `calculate_pin_positions` rotation-matrix idiom.

use std::collections::HashMap;

use crate::error::SymbolError;
use crate::model::{round_cmm, ComponentInstance, Pin, Position, Rotation, SchematicModel};

/// Resolves every component's absolute pin positions, keyed by
/// `(reference, pin_number)`.
pub fn calculate_all_pin_positions(
    model: &SchematicModel,
) -> Result<HashMap<(String, String), Pin>, SymbolError> {
    let mut out = HashMap::new();
    for component in &model.components {
        let def = model
            .symbol_defs
            .get(&component.lib_id)
            .ok_or_else(|| SymbolError::UnresolvedSymbol(component.lib_id.clone()))?;
        for pin_def in &def.pins {
            let position = calculate_pin_position(component, pin_def.local_offset);
            out.insert(
                (component.reference.clone(), pin_def.number.clone()),
                Pin { position },
            );
        }
    }
    Ok(out)
}

/// Applies mirror (across the horizontal axis, i.e. negate Y) then rotation
/// then translation, rounding the result to 0.01mm (§4.3 invariant).
pub fn calculate_pin_position(component: &ComponentInstance, local: Position) -> Position {
    let (mut x, mut y) = (local.x, local.y);
    if component.mirror {
        y = -y;
    }
    let (rx, ry) = match component.rotation {
        Rotation::Deg0 => (x, y),
        Rotation::Deg90 => (-y, x),
        Rotation::Deg180 => (-x, -y),
        Rotation::Deg270 => (y, -x),
    };
    x = rx;
    y = ry;

    let abs_x = component.position.x + x;
    let abs_y = component.position.y + y;
    let key_x = round_cmm(abs_x) as f64 / 100.0;
    let key_y = round_cmm(abs_y) as f64 / 100.0;
    Position::new(key_x, key_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, Role, SheetId};

    fn component(rotation: Rotation, mirror: bool) -> ComponentInstance {
        ComponentInstance {
            reference: "R1".into(),
            sheet: SheetId(0),
            lib_id: "Device:R".into(),
            value: "1k".into(),
            description: String::new(),
            footprint: String::new(),
            location: Location::UNKNOWN,
            role: Role::Load,
            amperage: 0.0,
            position: Position::new(100.0, 50.0),
            rotation,
            mirror,
            is_power_symbol: false,
        }
    }

    #[test]
    fn no_rotation_just_translates() {
        let c = component(Rotation::Deg0, false);
        let p = calculate_pin_position(&c, Position::new(0.0, 3.81));
        assert_eq!(p, Position::new(100.0, 53.81));
    }

    #[test]
    fn rotation_90_swaps_axes() {
        let c = component(Rotation::Deg90, false);
        let p = calculate_pin_position(&c, Position::new(0.0, 3.81));
        assert_eq!(p, Position::new(96.19, 50.0));
    }

    #[test]
    fn mirror_negates_y_before_rotation() {
        let c = component(Rotation::Deg0, true);
        let p = calculate_pin_position(&c, Position::new(0.0, 3.81));
        assert_eq!(p, Position::new(100.0, 46.19));
    }

    #[test]
    fn unresolved_symbol_is_an_error() {
        let mut model = SchematicModel::default();
        model.components.push(component(Rotation::Deg0, false));
        let result = calculate_all_pin_positions(&model);
        assert!(result.is_err());
    }
}
