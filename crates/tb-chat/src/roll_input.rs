use serde::Serialize;

/// A chat line split into a roll formula and free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedRollInput {
    /// The longest leading run of words that forms a valid roll formula.
    pub formula: String,
    /// The remaining words, or empty.
    pub description: String,
}

/// Split `input` into a formula and a description.
///
/// Words are tried as ever longer prefixes; the longest prefix that would
/// roll wins. Returns `None` when no prefix is a valid formula.
pub fn parse_roll_input(input: &str) -> Option<ParsedRollInput> {
    let words: Vec<&str> = input.split_whitespace().collect();

    let longest = (1..=words.len())
        .rev()
        .find(|&n| tb_formula::validate(&words[..n].join(" ")).is_ok())?;

    Some(ParsedRollInput {
        formula: words[..longest].join(" "),
        description: words[longest..].join(" "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parsed(input: &str) -> Option<(String, String)> {
        parse_roll_input(input).map(|p| (p.formula, p.description))
    }

    fn pair(formula: &str, description: &str) -> Option<(String, String)> {
        Some((formula.to_string(), description.to_string()))
    }

    #[test]
    fn bare_formula() {
        assert_eq!(parsed("2d6"), pair("2d6", ""));
    }

    #[test]
    fn formula_with_description() {
        assert_eq!(parsed("2d6 Attack"), pair("2d6", "Attack"));
    }

    #[test]
    fn spaced_formula() {
        assert_eq!(
            parsed("(2d6 + 3) * 2 Critical Hit"),
            pair("(2d6 + 3) * 2", "Critical Hit")
        );
    }

    #[test]
    fn plain_text_is_not_a_roll() {
        assert_eq!(parsed("Hello world"), None);
        assert_eq!(parsed(""), None);
        assert_eq!(parsed("   "), None);
    }

    #[test]
    fn number_with_text() {
        assert_eq!(parsed("100 gold"), pair("100", "gold"));
    }

    #[test]
    fn comparison() {
        assert_eq!(
            parsed("1d100<=50 Sanity Check"),
            pair("1d100<=50", "Sanity Check")
        );
    }

    #[test]
    fn variables_and_functions() {
        assert_eq!(
            parsed("2d6 + {肉体} Body check"),
            pair("2d6 + {肉体}", "Body check")
        );
        assert_eq!(parsed("max(1d6, 1d8) best of"), pair("max(1d6, 1d8)", "best of"));
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(parsed("  1d20   +  5   to   hit "), pair("1d20 + 5", "to hit"));
    }

    #[test]
    fn oversized_dice_are_not_a_roll() {
        assert_eq!(parsed("5000d6 fireball"), None);
    }

    #[test]
    fn unknown_function_is_not_a_roll() {
        assert_eq!(parsed("pow(2, 3) power"), None);
    }

    proptest! {
        #[test]
        fn words_are_preserved(input in "[a-z0-9d+ ]{0,24}") {
            if let Some(p) = parse_roll_input(&input) {
                let rejoined = format!("{} {}", p.formula, p.description);
                let words: Vec<&str> = input.split_whitespace().collect();
                prop_assert_eq!(rejoined.split_whitespace().collect::<Vec<_>>(), words);
                prop_assert!(tb_formula::validate(&p.formula).is_ok());
            }
        }
    }
}
