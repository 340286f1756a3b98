//! Hover lookup
//!
//! Hovering a variable shows what it is defined as: the text after the
//! ` = ` on its single definition line, as plaintext. Anything without
//! exactly one definition carrying an assignment produces no hover.

use crate::definitions::provide_definition;
use crate::error::CapabilityError;
use crate::textpos::document_lines;
use yara_proto::{Hover, MarkupKind, Position};

pub fn provide_hover(
    document: &str,
    position: Position,
    uri: &str,
) -> Result<Option<Hover>, CapabilityError> {
    let definitions = provide_definition(document, position, uri)?;
    let [definition] = definitions.as_slice() else {
        return Ok(None);
    };

    let lines = document_lines(document);
    let Some(line) = lines.get(definition.range.start.line as usize) else {
        return Ok(None);
    };
    let Some((_, value)) = line.split_once(" = ") else {
        return Ok(None);
    };

    Ok(Some(Hover::new(
        MarkupKind::Plaintext,
        value.trim_end(),
        Some(definition.range),
    )))
}
