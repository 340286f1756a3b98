//! Go-to-definition lookup
//!
//! Variable definitions are assignment lines (`$name = ...`) inside the
//! enclosing rule only; rule definitions are `rule <name>` headers anywhere
//! in the document. Any sigil (`$ # @ !`) on the query symbol resolves to
//! the `$` assignment of the same name.

use regex::Regex;

use crate::error::CapabilityError;
use crate::textpos::{char_column, document_lines, get_rule_range, resolve_symbol, Symbol};
use yara_proto::{Location, Position, Range};

pub fn provide_definition(
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

    match symbol {
        Symbol::Variable { name, wildcard, .. } => {
            let Some(rule_range) = get_rule_range(document, position) else {
                return Ok(Vec::new());
            };
            let name_pattern = if wildcard {
                format!("{}.*?", regex::escape(&name))
            } else {
                regex::escape(&name)
            };
            let pattern = format!(r"\$({}) =\s", name_pattern);
            Ok(collect_matches(
                document,
                &pattern,
                uri,
                Some(rule_range),
                MatchSpan::CapturedName,
            ))
        }
        Symbol::RuleName(name) => {
            let pattern = format!(r"\brule {}\b", regex::escape(&name));
            Ok(collect_matches(
                document,
                &pattern,
                uri,
                None,
                MatchSpan::Full,
            ))
        }
    }
}

enum MatchSpan {
    /// The whole regex match (used for `rule <name>` headers).
    Full,
    /// The sigil plus the first capture group (the variable name), leaving
    /// the ` = ` assignment tail out of the reported range.
    CapturedName,
}

/// Run a symbol pattern over the document and translate matches back to
/// absolute document coordinates. When `scope` is set, only the lines of
/// that rule range are searched and match lines are offset by its start.
/// An invalid dynamically-built pattern yields no results rather than an
/// error.
fn collect_matches(
    document: &str,
    pattern: &str,
    uri: &str,
    scope: Option<Range>,
    span: MatchSpan,
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
    for (offset, line) in lines
        .iter()
        .take(last + 1)
        .skip(first)
        .enumerate()
    {
        for captures in regex.captures_iter(line) {
            let Some(full) = captures.get(0) else { continue };
            let (start_byte, end_byte) = match span {
                MatchSpan::Full => (full.start(), full.end()),
                MatchSpan::CapturedName => match captures.get(1) {
                    // include the sigil character just before the name
                    Some(name) => (full.start(), name.end()),
                    None => (full.start(), full.end()),
                },
            };
            let line_no = (first + offset) as u32;
            locations.push(Location::new(
                Range::new(
                    Position::new(line_no, char_column(line, start_byte)),
                    Position::new(line_no, char_column(line, end_byte)),
                ),
                uri,
            ));
        }
    }
    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::PEEK_RULES;

    const URI: &str = "file:///rules/peek_rules.yara";

    fn definition_at(line: u32, character: u32) -> Vec<Location> {
        provide_definition(PEEK_RULES, Position::new(line, character), URI).unwrap()
    }

    #[test]
    fn variable_definition_spans_sigil_and_name() {
        // $dstring referenced in SecondRule's condition
        let result = definition_at(22, 9);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].uri, URI);
        assert_eq!(result[0].range.start, Position::new(19, 8));
        assert_eq!(result[0].range.end, Position::new(19, 16));
    }

    #[test]
    fn count_sigil_resolves_to_dollar_definition() {
        // #hex_string counts matches of $hex_string
        let result = definition_at(22, 21);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].range.start, Position::new(20, 8));
        assert_eq!(result[0].range.end, Position::new(20, 19));
    }

    #[test]
    fn variable_lookup_stays_inside_enclosing_rule() {
        // $a* in FirstRule must not see SecondRule's strings
        let result = definition_at(13, 9);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].range.start, Position::new(10, 8));
        assert_eq!(result[0].range.end, Position::new(10, 11));
        assert_eq!(result[1].range.start, Position::new(11, 8));
        assert_eq!(result[1].range.end, Position::new(11, 11));
    }

    #[test]
    fn rule_definition_spans_keyword_and_name() {
        let result = definition_at(28, 10);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].range.start, Position::new(5, 0));
        assert_eq!(result[0].range.end, Position::new(5, 14));
    }

    #[test]
    fn unknown_symbol_has_no_definition() {
        // "and" on the condition line is neither variable nor rule
        assert!(definition_at(13, 12).is_empty());
    }

    #[test]
    fn whitespace_position_has_no_definition() {
        assert!(definition_at(13, 11).is_empty());
    }
}
