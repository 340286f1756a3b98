//! Find-references lookup
//!
//! Variable references match any sigil, so `$x`, `#x`, `@x` and `!x` are
//! all occurrences of the string variable `x`, scoped to the enclosing
//! rule. Rule-name references match the bare identifier across the whole
//! document. A trailing `*` on the query symbol is a wildcard over variable
//! names; the wildcard token itself is not reported as an occurrence.

use regex::Regex;

use crate::error::CapabilityError;
use crate::textpos::{
    char_column, document_lines, get_rule_range, resolve_symbol, Symbol, VARIABLE_SIGILS,
};
use yara_proto::{Location, Position, Range};

pub fn provide_reference(
    document: &str,
    position: Position,
    uri: &str,
) -> Result<Vec<Location>, CapabilityError> {
    let Some(token) = resolve_symbol(document, position) else {
        return Ok(Vec::new());
    };
    let Some(symbol) = Symbol::classify(&token) else {
        return Ok(Vec::new());
    };

    let sigil_class: String = VARIABLE_SIGILS.iter().collect();
    match symbol {
        Symbol::Variable { name, wildcard, .. } => {
            let Some(scope) = get_rule_range(document, position) else {
                return Ok(Vec::new());
            };
            let name_pattern = if wildcard {
                format!(r"{}\w*", regex::escape(&name))
            } else {
                regex::escape(&name)
            };
            let pattern = format!(r"[{}]{}\b", regex::escape(&sigil_class), name_pattern);
            Ok(occurrences(document, &pattern, uri, Some(scope), wildcard))
        }
        Symbol::RuleName(name) => {
            let pattern = format!(r"\b{}\b", regex::escape(&name));
            Ok(occurrences(document, &pattern, uri, None, false))
        }
    }
}

/// Collect every match of the occurrence pattern, in document order. When
/// `skip_wildcard_token` is set, a match immediately followed by `*` is the
/// wildcard query token itself and is left out.
fn occurrences(
    document: &str,
    pattern: &str,
    uri: &str,
    scope: Option<Range>,
    skip_wildcard_token: bool,
) -> Vec<Location> {
    let Ok(regex) = Regex::new(pattern) else {
        return Vec::new();
    };
    let lines = document_lines(document);
    let (first, last) = match scope {
        Some(range) => (range.start.line as usize, range.end.line as usize),
        None => (0, lines.len().saturating_sub(1)),
    };

    let mut locations = Vec::new();
    for (offset, line) in lines.iter().take(last + 1).skip(first).enumerate() {
        for found in regex.find_iter(line) {
            if skip_wildcard_token && line[found.end()..].starts_with('*') {
                continue;
            }
            let line_no = (first + offset) as u32;
            locations.push(Location::new(
                Range::new(
                    Position::new(line_no, char_column(line, found.start())),
                    Position::new(line_no, char_column(line, found.end())),
                ),
                uri,
            ));
        }
    }
    locations
}
