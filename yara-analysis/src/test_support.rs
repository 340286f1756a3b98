//! Shared rule fixtures for resolver tests.

/// A three-rule document with known coordinates:
///
/// - `FirstRule` spans lines 5..=14 with strings `$a1`/`$a2` and a wildcard
///   condition reference `$a*` on line 13.
/// - `SecondRule` (private) spans lines 16..=23 with strings `$dstring`
///   (line 19) and `$hex_string` (line 20), both referenced on line 22.
/// - `ThirdRule` references the other two rules by name on line 28.
pub const PEEK_RULES: &str = "\
/*
    Sample rules for resolver tests
*/
import \"cuckoo\"

rule FirstRule
{
    meta:
        author = \"test\"
    strings:
        $a1 = \"first\"
        $a2 = \"second\"
    condition:
        $a* and true
}

private rule SecondRule
{
    strings:
        $dstring = \"double string\" wide nocase fullword
        $hex_string = { E2 34 A1 C8 23 FB }
    condition:
        $dstring or #hex_string > 3
}

rule ThirdRule
{
    condition:
        FirstRule and SecondRule
}
";

/// A minimal document for completion tests, cursor after the module dot on
/// line 5.
pub const CODE_COMPLETION: &str = "\
import \"cuckoo\"

rule Completion
{
    condition:
        cuckoo.
}
";
