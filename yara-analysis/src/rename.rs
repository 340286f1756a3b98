//! Workspace-edit rename
//!
//! Built on top of reference lookup: every reported occurrence becomes a
//! text edit. Variable occurrences keep whatever sigil each site already
//! uses, so renaming `$a` leaves a `#a` count reference as `#<new name>`;
//! only the identifier after the sigil is rewritten. Rule names are
//! replaced whole.

use std::collections::HashMap;

use crate::error::CapabilityError;
use crate::references::provide_reference;
use crate::textpos::{resolve_symbol, Symbol, VARIABLE_SIGILS};
use yara_proto::{Position, Range, TextEdit, WorkspaceEdit};

pub fn provide_rename(
    document: &str,
    position: Position,
    uri: &str,
    new_name: &str,
) -> Result<WorkspaceEdit, CapabilityError> {
    let symbol = resolve_symbol(document, position).and_then(|token| Symbol::classify(&token));
    let Some(symbol) = symbol else {
        return Ok(WorkspaceEdit::default());
    };

    let replacement = match symbol {
        // a client may echo the sigil back in the new name; it stays put
        Symbol::Variable { .. } => new_name
            .strip_prefix(|ch| VARIABLE_SIGILS.contains(&ch))
            .unwrap_or(new_name),
        Symbol::RuleName(_) => new_name,
    };

    let mut edits = Vec::new();
    for location in provide_reference(document, position, uri)? {
        let range = match symbol {
            Symbol::Variable { .. } => Range::new(
                // skip past the occurrence's own sigil
                Position::new(
                    location.range.start.line,
                    location.range.start.character + 1,
                ),
                location.range.end,
            ),
            Symbol::RuleName(_) => location.range,
        };
        edits.push(TextEdit::new(range, replacement));
    }

    let mut changes = HashMap::new();
    if !edits.is_empty() {
        changes.insert(uri.to_string(), edits);
    }
    Ok(WorkspaceEdit { changes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::PEEK_RULES;

    const URI: &str = "file:///rules/peek_rules.yara";

    #[test]
    fn renames_every_occurrence_of_a_variable() {
        let edit = provide_rename(PEEK_RULES, Position::new(22, 9), URI, "generic_string").unwrap();
        let edits = &edit.changes[URI];
        assert_eq!(edits.len(), 2);
        // ranges exclude the per-site sigil
        assert_eq!(edits[0].range.start, Position::new(19, 9));
        assert_eq!(edits[0].range.end, Position::new(19, 16));
        assert_eq!(edits[1].range.start, Position::new(22, 9));
        assert_eq!(edits[1].range.end, Position::new(22, 16));
        assert!(edits.iter().all(|edit| edit.new_text == "generic_string"));
    }

    #[test]
    fn strips_a_sigil_supplied_with_the_new_name() {
        let edit = provide_rename(PEEK_RULES, Position::new(22, 9), URI, "$generic_string").unwrap();
        let edits = &edit.changes[URI];
        assert!(edits.iter().all(|edit| edit.new_text == "generic_string"));
    }

    #[test]
    fn count_references_keep_their_count_sigil() {
        // #hex_string on line 22 and its definition $hex_string on line 20
        let edit = provide_rename(PEEK_RULES, Position::new(22, 25), URI, "hex_text").unwrap();
        let edits = &edit.changes[URI];
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].range.start, Position::new(20, 9));
        assert_eq!(edits[1].range.start, Position::new(22, 21));
        assert_eq!(edits[1].range.end, Position::new(22, 31));
    }

    #[test]
    fn renames_rule_names_document_wide() {
        let edit = provide_rename(PEEK_RULES, Position::new(28, 10), URI, "PrimaryRule").unwrap();
        let edits = &edit.changes[URI];
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].range.start, Position::new(5, 5));
        assert_eq!(edits[0].range.end, Position::new(5, 14));
        assert_eq!(edits[1].range.start, Position::new(28, 8));
        assert!(edits.iter().all(|edit| edit.new_text == "PrimaryRule"));
    }

    #[test]
    fn no_symbol_means_an_empty_edit() {
        let edit = provide_rename(PEEK_RULES, Position::new(4, 0), URI, "anything").unwrap();
        assert!(edit.changes.is_empty());
    }
}
