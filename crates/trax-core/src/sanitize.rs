//! Filename-safe equipment tokens.
//!
//! Every equipment identity ends up as a path component
//! (`{name}_analysis.json`) and as the join key across dashboard tables, so
//! it is reduced to a single token of letters, digits, and underscores.

/// Returned when nothing usable survives sanitisation.
pub const UNKNOWN_EQUIPMENT: &str = "Unknown_Equipment";

/// Maximum length of a sanitised token, in characters.
pub const MAX_TOKEN_CHARS: usize = 50;

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Turn any free-text candidate into a filesystem-safe token.
///
/// Input: "Elm Street 4", "  a/b  ", ""
/// Output: "Elm_Street_4", "a_b", "Unknown_Equipment"
///
/// # Algorithm
///
/// 1. Replace each of `<>:"/\|?*` with `_`
/// 2. Replace each run of whitespace with a single `_`
/// 3. Collapse runs of `_` and strip them from both ends
/// 4. Truncate to 50 characters (and re-strip a trailing `_` exposed by the cut)
/// 5. Fall back to [`UNKNOWN_EQUIPMENT`] if nothing is left
///
/// The function is total and idempotent.
pub fn sanitize(candidate: &str) -> String {
    let mut out = String::with_capacity(candidate.len());
    let mut last_was_underscore = false;

    for ch in candidate.chars() {
        let mapped = if FORBIDDEN.contains(&ch) || ch.is_whitespace() {
            '_'
        } else {
            ch
        };
        if mapped == '_' {
            if !last_was_underscore {
                out.push('_');
            }
            last_was_underscore = true;
        } else {
            out.push(mapped);
            last_was_underscore = false;
        }
    }

    let trimmed = out.trim_matches('_');
    let truncated: String = trimmed.chars().take(MAX_TOKEN_CHARS).collect();
    let truncated = truncated.trim_end_matches('_');

    if truncated.is_empty() {
        UNKNOWN_EQUIPMENT.to_string()
    } else {
        truncated.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_become_single_underscore() {
        assert_eq!(sanitize("Elm Street 4"), "Elm_Street_4");
        assert_eq!(sanitize("Elm   Street\t\n4"), "Elm_Street_4");
    }

    #[test]
    fn forbidden_characters_replaced() {
        assert_eq!(sanitize(r#"a<b>c:d"e/f\g|h?i*j"#), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn underscores_collapsed_and_stripped() {
        assert_eq!(sanitize("__a___b__"), "a_b");
        assert_eq!(sanitize(" / a / "), "a");
    }

    #[test]
    fn empty_falls_back() {
        assert_eq!(sanitize(""), UNKNOWN_EQUIPMENT);
        assert_eq!(sanitize("   "), UNKNOWN_EQUIPMENT);
        assert_eq!(sanitize("???"), UNKNOWN_EQUIPMENT);
    }

    #[test]
    fn truncated_to_fifty_chars() {
        let long = "x".repeat(80);
        assert_eq!(sanitize(&long).chars().count(), MAX_TOKEN_CHARS);
    }

    #[test]
    fn truncation_does_not_leave_trailing_underscore() {
        // 49 letters, a space, then more text: the cut lands right after the `_`.
        let input = format!("{} tail", "a".repeat(49));
        let once = sanitize(&input);
        assert!(!once.ends_with('_'));
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "",
            "Substation_Elm Street 4",
            "  <weird>  name?? ",
            "Transformer_20240101_120000",
            "ü ñ 数字 / 1",
            &"ab ".repeat(30),
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn output_never_contains_forbidden_or_whitespace() {
        let inputs = ["a b", "a\u{00a0}b", "x:y", "", "\t\n", "a|b|c"];
        for input in inputs {
            let out = sanitize(input);
            assert!(!out.is_empty());
            assert!(!out.chars().any(|c| FORBIDDEN.contains(&c) || c.is_whitespace()));
        }
    }

    #[test]
    fn non_ascii_letters_survive() {
        assert_eq!(sanitize("Umspannwerk Süd"), "Umspannwerk_Süd");
    }
}
