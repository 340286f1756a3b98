//! Text-position utilities
//!
//! Positions are zero-based (line, character) pairs with character counted
//! in characters, not bytes. Documents are split at newlines with carriage
//! returns stripped, so CRLF and LF rule files behave identically.

use once_cell::sync::Lazy;
use regex::Regex;
use yara_proto::{Position, Range};

/// Leading characters that mark a token as a string-variable reference.
///
/// The sigil selects the reference semantics: `$` plain reference, `#`
/// match count, `@` match offset, `!` match length. All four refer to the
/// same underlying variable name.
pub const VARIABLE_SIGILS: [char; 4] = ['$', '#', '@', '!'];

static RULE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^((private|global) )?rule\b").expect("rule start pattern"));
static RULE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\}$").expect("rule end pattern"));

/// A symbol extracted from document text at a cursor position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    /// A string variable like `$a`, `#a`, `@a` or `!a`; `wildcard` when the
    /// name carries a trailing `*`.
    Variable {
        sigil: char,
        name: String,
        wildcard: bool,
    },
    /// A bare identifier, treated as a rule name.
    RuleName(String),
}

impl Symbol {
    /// Classify a resolved token by its first character.
    pub fn classify(token: &str) -> Option<Symbol> {
        let mut chars = token.chars();
        let first = chars.next()?;
        if VARIABLE_SIGILS.contains(&first) {
            let rest: &str = &token[first.len_utf8()..];
            let (name, wildcard) = match rest.strip_suffix('*') {
                Some(prefix) => (prefix, true),
                None => (rest, false),
            };
            if name.is_empty() && !wildcard {
                return None;
            }
            Some(Symbol::Variable {
                sigil: first,
                name: name.to_string(),
                wildcard,
            })
        } else {
            Some(Symbol::RuleName(token.to_string()))
        }
    }
}

pub(crate) fn document_lines(document: &str) -> Vec<&str> {
    document
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Number of characters before the given byte offset on a line.
pub(crate) fn char_column(line: &str, byte_offset: usize) -> u32 {
    line[..byte_offset].chars().count() as u32
}

/// Index of the first non-whitespace character on a line.
pub fn first_non_whitespace_index(line: &str) -> Option<usize> {
    line.chars().position(|ch| !ch.is_whitespace())
}

/// Resolve the symbol token under the given position.
///
/// Scans left from the cursor to a whitespace boundary or line start, and
/// right to a whitespace boundary or line end. Returns `None` when the
/// position is outside the document or the cursor sits on whitespace.
pub fn resolve_symbol(document: &str, position: Position) -> Option<String> {
    let lines = document_lines(document);
    let line = lines.get(position.line as usize)?;
    let chars: Vec<char> = line.chars().collect();
    let cursor = position.character as usize;
    if cursor >= chars.len() || chars[cursor].is_whitespace() {
        return None;
    }

    let mut left = cursor;
    while left > 0 && !chars[left - 1].is_whitespace() {
        left -= 1;
    }
    let mut right = cursor;
    while right < chars.len() && !chars[right].is_whitespace() {
        right += 1;
    }
    Some(chars[left..right].iter().collect())
}

/// Find the line span of the rule enclosing the given position.
///
/// Scans backward for the nearest `rule` header line (optionally prefixed
/// with `private` or `global`) and forward for the nearest line that is
/// exactly `}`. The returned start/end line numbers are the zero-based
/// indices of those two lines, both at character zero.
pub fn get_rule_range(document: &str, position: Position) -> Option<Range> {
    let lines = document_lines(document);
    let origin = position.line as usize;
    if origin >= lines.len() {
        return None;
    }

    let start_line = (0..=origin)
        .rev()
        .find(|&index| RULE_START.is_match(lines[index]))?;
    let end_line = (origin..lines.len()).find(|&index| RULE_END.is_match(lines[index]))?;

    Some(Range::new(
        Position::new(start_line as u32, 0),
        Position::new(end_line as u32, 0),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::PEEK_RULES;

    #[test]
    fn resolves_count_sigil_symbol() {
        let document = "rule ResolveSymbol {\n strings:\n  $a = \"test\"\n condition:\n  #a > 3\n}\n";
        let symbol = resolve_symbol(document, Position::new(4, 3)).unwrap();
        assert_eq!(symbol, "#a");
    }

    #[test]
    fn cursor_on_whitespace_is_no_symbol() {
        let document = "rule R {\n condition:\n  true and false\n}\n";
        assert!(resolve_symbol(document, Position::new(2, 6)).is_none());
    }

    #[test]
    fn out_of_range_positions_are_no_symbol() {
        let document = "rule R { condition: true }";
        assert!(resolve_symbol(document, Position::new(5, 0)).is_none());
        assert!(resolve_symbol(document, Position::new(0, 200)).is_none());
    }

    #[test]
    fn symbol_at_line_start_stops_at_column_zero() {
        let document = "$boundary = \"x\"";
        assert_eq!(
            resolve_symbol(document, Position::new(0, 2)).unwrap(),
            "$boundary"
        );
    }

    #[test]
    fn crlf_documents_resolve_like_lf_documents() {
        let document = "rule R {\r\n strings:\r\n  $a = \"t\"\r\n condition:\r\n  #a > 3\r\n}\r\n";
        assert_eq!(resolve_symbol(document, Position::new(4, 3)).unwrap(), "#a");
    }

    #[test]
    fn rule_range_spans_header_to_closing_brace() {
        let range = get_rule_range(PEEK_RULES, Position::new(21, 4)).unwrap();
        assert_eq!(range.start.line, 16);
        assert_eq!(range.start.character, 0);
        assert_eq!(range.end.line, 23);
        assert_eq!(range.end.character, 0);
    }

    #[test]
    fn rule_range_is_stable_across_interior_lines() {
        for line in 17..=22 {
            let range = get_rule_range(PEEK_RULES, Position::new(line, 0)).unwrap();
            assert_eq!(range.start.line, 16, "query at line {}", line);
            assert_eq!(range.end.line, 23, "query at line {}", line);
        }
    }

    #[test]
    fn rule_on_first_line_is_found() {
        let document = "rule First {\n condition:\n  true\n}\n";
        let range = get_rule_range(document, Position::new(2, 0)).unwrap();
        assert_eq!(range.start.line, 0);
        assert_eq!(range.end.line, 3);
    }

    #[test]
    fn position_outside_any_rule_has_no_range() {
        assert!(get_rule_range(PEEK_RULES, Position::new(0, 0)).is_none());
        assert!(get_rule_range("no rules here\n", Position::new(0, 0)).is_none());
    }

    #[test]
    fn first_non_whitespace_skips_indentation() {
        assert_eq!(first_non_whitespace_index("    test"), Some(4));
        assert_eq!(first_non_whitespace_index("\t\tcondition:"), Some(2));
        assert_eq!(first_non_whitespace_index("   "), None);
    }

    #[test]
    fn classifies_variables_and_rules() {
        assert_eq!(
            Symbol::classify("$a"),
            Some(Symbol::Variable {
                sigil: '$',
                name: "a".to_string(),
                wildcard: false
            })
        );
        assert_eq!(
            Symbol::classify("#count*"),
            Some(Symbol::Variable {
                sigil: '#',
                name: "count".to_string(),
                wildcard: true
            })
        );
        assert_eq!(
            Symbol::classify("MyRule"),
            Some(Symbol::RuleName("MyRule".to_string()))
        );
        assert_eq!(Symbol::classify(""), None);
        assert_eq!(Symbol::classify("$"), None);
    }
}
