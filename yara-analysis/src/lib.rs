//! Rule-document analysis for the YARA language server
//!
//! Definition, reference, hover, completion and diagnostic lookups over raw
//! rule text. The resolvers are deliberately line- and regex-based rather
//! than a real parser: a symbol is whatever sits between whitespace
//! boundaries at the cursor, a rule body is whatever sits between a
//! `rule` header line and a bare closing brace, and occurrences are found
//! by matching patterns built from the symbol under the cursor.
//!
//! Deep semantic validation stays behind the [`RuleCompiler`] trait; this
//! crate only converts its `line N: message` results into diagnostics.

pub mod completion;
pub mod definitions;
pub mod diagnostics;
pub mod error;
pub mod hover;
pub mod references;
pub mod rename;
pub mod textpos;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use completion::provide_code_completion;
pub use definitions::provide_definition;
pub use diagnostics::{provide_diagnostic, CompileOutcome, RuleCompiler};
pub use error::CapabilityError;
pub use hover::provide_hover;
pub use references::provide_reference;
pub use rename::provide_rename;
pub use textpos::{first_non_whitespace_index, get_rule_range, resolve_symbol, Symbol};
