//! Typed records produced by the schematic extractor (§3, §4.2 of the design doc).
//!
//! Everything in this module is immutable once built: the extractor produces
//! a [`SchematicModel`] once, and every later stage only reads it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A sheet identifier. Sheet 0 is always the main/root sheet; sub-sheets are
/// assigned ids in the order the extractor first recurses into them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SheetId(pub u32);

pub const ROOT_SHEET: SheetId = SheetId(0);

/// A point in the schematic plane, millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Key used for exact 0.01mm coincidence comparisons (§3, §9): fixed-point
    /// centi-millimeters rather than repeated float rounding.
    pub fn key(&self) -> (i64, i64) {
        (round_cmm(self.x), round_cmm(self.y))
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

pub fn round_cmm(v: f64) -> i64 {
    (v * 100.0).round() as i64
}

/// Four orthogonal schematic rotations (§3 invariant on ComponentInstance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(deg: f64) -> Self {
        let norm = ((deg % 360.0) + 360.0) % 360.0;
        if (norm - 90.0).abs() < 1.0 {
            Rotation::Deg90
        } else if (norm - 180.0).abs() < 1.0 {
            Rotation::Deg180
        } else if (norm - 270.0).abs() < 1.0 {
            Rotation::Deg270
        } else {
            Rotation::Deg0
        }
    }
}

/// Electrical role parsed from the location-and-role custom field (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Load,
    Rating,
    Source,
    Ground,
}

impl Role {
    pub fn from_letter(c: char) -> Option<Role> {
        match c {
            'L' => Some(Role::Load),
            'R' => Some(Role::Rating),
            'S' => Some(Role::Source),
            'G' => Some(Role::Ground),
            _ => None,
        }
    }
}

/// Aircraft-coordinate location, inches: fuselage station, waterline, buttline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub fs: f64,
    pub wl: f64,
    pub bl: f64,
}

impl Location {
    pub const UNKNOWN: Location = Location { fs: -9.0, wl: -9.0, bl: -9.0 };

    pub fn manhattan_to(&self, other: &Location) -> f64 {
        (self.fs - other.fs).abs() + (self.wl - other.wl).abs() + (self.bl - other.bl).abs()
    }
}

/// A physical wire segment — the unit of the eventual BOM row (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSegment {
    pub id: String,
    pub sheet: SheetId,
    pub p1: Position,
    pub p2: Position,
}

impl WireSegment {
    /// Perpendicular distance from a point to this segment, and the closest
    /// point on the segment (§4.4).
    pub fn distance_to_point(&self, p: &Position) -> f64 {
        self.closest_point(p).distance(p)
    }

    pub fn closest_point(&self, p: &Position) -> Position {
        let dx = self.p2.x - self.p1.x;
        let dy = self.p2.y - self.p1.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq < 1e-12 {
            return self.p1;
        }
        let t = ((p.x - self.p1.x) * dx + (p.y - self.p1.y) * dy) / len_sq;
        let t = t.clamp(0.0, 1.0);
        Position::new(self.p1.x + t * dx, self.p1.y + t * dy)
    }
}

/// A junction: a point where three or more wire endpoints meet (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub sheet: SheetId,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelKind {
    Local,
    Global,
    Hierarchical,
}

/// A text label attached (by the associator) to a wire segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub sheet: SheetId,
    pub text: String,
    pub position: Position,
    pub kind: LabelKind,
}

/// The child-side half of a hierarchical link: a named pin on a sheet symbol
/// placed on the *parent* sheet (§3, GLOSSARY).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetPin {
    pub name: String,
    pub position: Position,
}

/// A sheet symbol on the main sheet referencing a child schematic file (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSymbol {
    pub id: String,
    pub sheet: SheetId,
    pub child_sheet: SheetId,
    pub child_file: String,
    pub pins: Vec<SheetPin>,
}

/// A single pin in a library symbol definition, local (unrotated, unmirrored)
/// offset from the symbol origin (§4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinDef {
    pub number: String,
    pub local_offset: Position,
}

/// A library symbol definition from `lib_symbols` (§4.2, §4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDef {
    pub lib_id: String,
    pub pins: Vec<PinDef>,
}

/// A placed component/symbol instance (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInstance {
    pub reference: String,
    pub sheet: SheetId,
    pub lib_id: String,
    pub value: String,
    pub description: String,
    pub footprint: String,
    pub location: Location,
    pub role: Role,
    pub amperage: f64,
    pub position: Position,
    pub rotation: Rotation,
    pub mirror: bool,
    /// True for the fixed power-symbol reference set (§4.6); these are still
    /// ComponentInstances so resolution treats them uniformly.
    pub is_power_symbol: bool,
}

/// A resolved absolute pin position (§4.3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub position: Position,
}

/// Parsed wire-marking label, per the grammar in §6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLabel {
    pub system: char,
    pub circuit_text: String,
    pub circuit_number: u64,
    pub segment: Option<char>,
}

impl ParsedLabel {
    pub fn circuit_key(&self) -> (char, u64) {
        (self.system, self.circuit_number)
    }

    /// Canonical rendering: `SYSTEM CIRCUIT [SEGMENT]`, dashes stripped.
    pub fn canonical(&self) -> String {
        let mut s = format!("{}{}", self.system, self.circuit_text);
        if let Some(seg) = self.segment {
            s.push(seg);
        }
        s
    }
}

/// Parses a wire label per §6's grammar: `SYSTEM CIRCUIT [SEGMENT]`, one
/// letter system code, one-or-more digits, optional trailing letter segment,
/// dashes between parts accepted on input.
pub fn parse_wire_label(raw: &str) -> Option<ParsedLabel> {
    let cleaned: String = raw.chars().filter(|c| *c != '-').collect();
    let mut chars = cleaned.chars().peekable();

    let system = chars.next()?;
    if !system.is_ascii_uppercase() {
        return None;
    }

    let mut circuit_text = String::new();
    while let Some(c) = chars.peek() {
        if c.is_ascii_digit() {
            circuit_text.push(*c);
            chars.next();
        } else {
            break;
        }
    }
    if circuit_text.is_empty() {
        return None;
    }
    let circuit_number: u64 = circuit_text.parse().ok()?;

    let segment = match chars.next() {
        Some(c) if c.is_ascii_uppercase() => Some(c),
        Some(_) => return None,
        None => None,
    };
    if chars.next().is_some() {
        return None;
    }

    Some(ParsedLabel {
        system,
        circuit_text,
        circuit_number,
        segment,
    })
}

/// The complete, immutable output of parsing + extraction (§3 "Ownership and
/// lifecycle"). Built once; every later stage borrows from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchematicModel {
    pub sheet_files: Vec<String>,
    pub wires: Vec<WireSegment>,
    pub junctions: Vec<Junction>,
    pub labels: Vec<Label>,
    pub sheet_symbols: Vec<SheetSymbol>,
    pub components: Vec<ComponentInstance>,
    pub symbol_defs: HashMap<String, SymbolDef>,
}

impl SchematicModel {
    pub fn component_by_ref(&self, reference: &str) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.reference == reference)
    }
}
