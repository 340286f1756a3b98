//! Diagnostics from an external rule compiler
//!
//! Deep semantic validation is not done here: a [`RuleCompiler`]
//! collaborator compiles the document and reports at most one failure in
//! the `line <N>: <text>` format (1-based line, message may itself contain
//! colons). This module turns that report into a protocol diagnostic
//! spanning the offending line from its first non-whitespace column to an
//! effectively unbounded end column.

use crate::error::CapabilityError;
use crate::textpos::{document_lines, first_non_whitespace_index};
use yara_proto::{Diagnostic, DiagnosticSeverity, Position, Range};

/// End column standing in for "the rest of the line".
const LINE_END_CHAR: u32 = 10_000;

/// Result of one compilation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Clean,
    SyntaxError(String),
    CompileWarning(String),
}

/// The external compiler collaborator. Implementations wrap whatever can
/// actually compile YARA sources; the server treats absence of an
/// implementation as degraded, not fatal.
pub trait RuleCompiler: Send + Sync {
    fn compile(&self, source: &str) -> CompileOutcome;
}

/// Parse a compiler result of the form `line <N>: <text>`.
///
/// Splits on the first colon only, so messages containing further colons
/// come through intact.
pub fn parse_compiler_message(result: &str) -> Result<(u32, String), CapabilityError> {
    let (meta, message) = result.split_once(':').ok_or_else(|| {
        CapabilityError::Diagnostic(format!("unrecognized compiler output: {:?}", result))
    })?;
    let line_no = meta
        .trim()
        .strip_prefix("line ")
        .and_then(|number| number.trim().parse::<u32>().ok())
        .ok_or_else(|| {
            CapabilityError::Diagnostic(format!("unrecognized compiler output: {:?}", result))
        })?;
    Ok((line_no, message.trim().to_string()))
}

/// Compile the document and convert the outcome into diagnostics. A clean
/// compile is an empty list.
pub fn provide_diagnostic(
    compiler: &dyn RuleCompiler,
    document: &str,
) -> Result<Vec<Diagnostic>, CapabilityError> {
    let (severity, result) = match compiler.compile(document) {
        CompileOutcome::Clean => return Ok(Vec::new()),
        CompileOutcome::SyntaxError(result) => (DiagnosticSeverity::Error, result),
        CompileOutcome::CompileWarning(result) => (DiagnosticSeverity::Warning, result),
    };

    let (line_no, message) = parse_compiler_message(&result)?;
    // compiler lines are 1-based, positions are 0-based
    let line_index = line_no.saturating_sub(1);
    let lines = document_lines(document);
    let line = lines.get(line_index as usize).copied().unwrap_or("");
    let first_char = first_non_whitespace_index(line).unwrap_or(0) as u32;
    let range = Range::new(
        Position::new(line_index, first_char),
        Position::new(line_index, LINE_END_CHAR),
    );
    Ok(vec![Diagnostic::new(range, severity, message)])
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCompiler(CompileOutcome);

    impl RuleCompiler for FixedCompiler {
        fn compile(&self, _source: &str) -> CompileOutcome {
            self.0.clone()
        }
    }

    #[test]
    fn clean_compile_yields_no_diagnostics() {
        let compiler = FixedCompiler(CompileOutcome::Clean);
        let result = provide_diagnostic(&compiler, "rule NoDiagnostics { condition: true }");
        assert_eq!(result.unwrap(), Vec::new());
    }

    #[test]
    fn syntax_error_yields_one_error_diagnostic() {
        let compiler = FixedCompiler(CompileOutcome::SyntaxError(
            "line 1: undefined string \"$true\"".to_string(),
        ));
        let result = provide_diagnostic(&compiler, "rule OneDiagnostic { condition: $true }")
            .unwrap();
        assert_eq!(result.len(), 1);
        let diagnostic = &result[0];
        assert_eq!(diagnostic.severity, DiagnosticSeverity::Error);
        assert_eq!(diagnostic.message, "undefined string \"$true\"");
        assert_eq!(diagnostic.range.start.line, 0);
        assert_eq!(diagnostic.range.end.line, 0);
        assert_eq!(diagnostic.range.start.character, 0);
    }

    #[test]
    fn warning_outcome_maps_to_warning_severity() {
        let compiler = FixedCompiler(CompileOutcome::CompileWarning(
            "line 2: $a is slowing down scanning".to_string(),
        ));
        let document = "rule Slow {\n    strings: $a = /a.*/\n    condition: $a\n}";
        let result = provide_diagnostic(&compiler, document).unwrap();
        assert_eq!(result[0].severity, DiagnosticSeverity::Warning);
        // range starts at the first non-whitespace column of line 1
        assert_eq!(result[0].range.start, Position::new(1, 4));
        assert_eq!(result[0].range.end, Position::new(1, 10_000));
    }

    #[test]
    fn parses_messages_with_extra_colons() {
        let (line, message) =
            parse_compiler_message("line 15: invalid hex string \"$hex_string\": syntax error")
                .unwrap();
        assert_eq!(line, 15);
        assert_eq!(message, "invalid hex string \"$hex_string\": syntax error");
    }

    #[test]
    fn parses_the_plain_form() {
        let (line, message) =
            parse_compiler_message("line 14: syntax error, unexpected <true>, expecting text string")
                .unwrap();
        assert_eq!(line, 14);
        assert_eq!(
            message,
            "syntax error, unexpected <true>, expecting text string"
        );
    }

    #[test]
    fn unrecognized_output_is_a_diagnostic_error() {
        assert!(matches!(
            parse_compiler_message("no colon here"),
            Err(CapabilityError::Diagnostic(_))
        ));
        assert!(matches!(
            parse_compiler_message("row 3: wrong prefix"),
            Err(CapabilityError::Diagnostic(_))
        ));
        let compiler = FixedCompiler(CompileOutcome::SyntaxError("garbage".to_string()));
        assert!(provide_diagnostic(&compiler, "rule R { condition: true }").is_err());
    }
}
