//! Text-level helpers for function literals and templates

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};
use crate::parser::{self, print_expression, print_lambda, Expression};

lazy_static! {
    static ref TEMPLATE_PATTERN: Regex = Regex::new(r"\{.*\}").expect("valid template pattern");
}

/// Number of parameters of a function literal, read from the text left of
/// the first `=>`. `()` has none; otherwise parameters are comma separated.
pub fn parameter_count(source: &str) -> usize {
    let params = source.split("=>").next().unwrap_or("").trim();
    if params == "()" {
        0
    } else {
        params.split(',').count()
    }
}

/// Parses a function literal and prints it canonically. Idempotent.
pub fn reformat(source: &str) -> Result<String> {
    match parser::parse_expression(source)? {
        Expression::Lambda(lambda) => Ok(print_lambda(&lambda)),
        other => Err(Error::ParseError(format!(
            "Expected a function literal, got '{}'",
            print_expression(&other)
        ))),
    }
}

/// True when the text contains `=>`
pub fn is_lambda(text: &str) -> bool {
    text.contains("=>")
}

/// True when the text contains a `{...}` placeholder
pub fn is_template(text: &str) -> bool {
    TEMPLATE_PATTERN.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_count() {
        assert_eq!(parameter_count("(source) => false"), 1);
        assert_eq!(parameter_count("source => false"), 1);
        assert_eq!(parameter_count("(device, otherDevice) => false"), 2);
        assert_eq!(parameter_count("() => false"), 0);
        assert_eq!(parameter_count("  ()  => 1"), 0);
    }

    #[test]
    fn test_reformat_expression_body() {
        assert_eq!(reformat("(a,b)=>a*b").unwrap(), "(a, b) => a * b");
        assert_eq!(reformat("x=>x.Name").unwrap(), "x => x.Name");
        assert!(reformat("1 + 2").is_err());
    }

    #[test]
    fn test_reformat_block_body() {
        let input = "(source) => { string ohug = ohugOrientation(source); string phase_count_string = phasingCountString123(source.PhasingCode); return\n                ohug + \" \" + phase_count_string; }";
        let expected = "(source) =>\n{\n    string ohug = ohugOrientation(source);\n    string phase_count_string = phasingCountString123(source.PhasingCode);\n    return ohug + \" \" + phase_count_string;\n}";
        assert_eq!(reformat(input).unwrap(), expected);
    }

    #[test]
    fn test_classification_predicates() {
        assert!(is_lambda("i => i"));
        assert!(!is_lambda("Name"));
        assert!(is_template("Name: {first} {last}"));
        assert!(!is_template("}{"));
        assert!(!is_template("plain"));
    }
}
