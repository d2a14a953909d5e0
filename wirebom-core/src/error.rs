//! Error taxonomy (§7). Every stage either returns a `Result` that can
//! short-circuit the run (fatal errors) or pushes a [`crate::diagnostics::Diagnostic`]
//! into the shared list (non-fatal). This module covers the former.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unbalanced parentheses at byte {0}")]
    UnbalancedParens(usize),
    #[error("invalid escape sequence at byte {0}")]
    InvalidEscape(usize),
}

/// *MalformedSource* (§7): fatal in both strict and permissive mode.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("malformed source: {0}")]
    MalformedSource(#[from] ParseError),
}

/// *UnresolvedSymbol* (§7): fatal in both modes.
#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("unresolved symbol library id: {0}")]
    UnresolvedSymbol(String),
}

/// Extractor-level fatal conditions. `MissingLocationRole` and
/// `MalformedLocationRole` are only fatal in strict mode; in permissive mode
/// the extractor instead pushes a diagnostic and substitutes defaults (§4.2,
/// §7), so those two variants never actually reach this enum in permissive
/// runs — callers check `Settings::permissive` before raising it.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("component {0} is missing the location-and-role custom field")]
    MissingLocationRole(String),
    #[error("component {0} has a malformed location-and-role field: {1}")]
    MalformedLocationRole(String, String),
    #[error("sheet references unknown child file: {0}")]
    UnresolvedSheet(String),
}

/// Top-level error that aborts the pipeline run (strict mode only — in
/// permissive mode the run only aborts for [`ReaderError`] / [`SymbolError`],
/// which have no recoverable default).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Reader(#[from] ReaderError),
    #[error(transparent)]
    Symbol(#[from] SymbolError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("validation failed with {0} error-level diagnostic(s)")]
    Validation(usize),
    #[error("duplicate wire label {0} in strict mode")]
    DuplicateLabel(String),
    #[error("multipoint label mismatch for net at {0:?}: expected {1} labels, found {2}")]
    MultipointLabelMismatch(crate::model::Position, usize, usize),
    #[error("dangling wire end on segment {0}")]
    DanglingEnd(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
