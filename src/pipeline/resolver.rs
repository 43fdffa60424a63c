//! Transitive resolution of support expressions

use super::SupportMap;
use crate::lambda::parameter_count;

/// A support expression declared in the synthesized unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Support name
    pub name: String,
    /// Type slots of the `Func<...>` annotation: parameters plus return
    pub arity: usize,
    /// Function literal source
    pub source: String,
}

impl Declaration {
    /// `let <name>: Func<dynamic, ...> = <source>;`
    pub fn render(&self) -> String {
        format!(
            "let {}: Func<{}> = {};",
            self.name,
            vec!["dynamic"; self.arity].join(", "),
            self.source
        )
    }
}

/// Collects every support entry the primary body needs, directly or
/// through other support entries.
///
/// Each round selects the unresolved entries whose name occurs anywhere in
/// the current search text (plain substring match); the rendered text of
/// those entries is searched in the next round. Later rounds are placed
/// first, so dependencies precede their users.
pub fn resolve(primary_body: &str, support: &SupportMap) -> Vec<Declaration> {
    let mut resolved: Vec<Declaration> = Vec::new();
    let mut search = primary_body.to_string();

    loop {
        let round: Vec<Declaration> = support
            .iter()
            .filter(|(name, _)| !resolved.iter().any(|d| d.name == *name))
            .filter(|(name, _)| search.contains(name))
            .map(|(name, source)| Declaration {
                name: name.to_string(),
                arity: parameter_count(source) + 1,
                source: source.to_string(),
            })
            .collect();

        if round.is_empty() {
            break;
        }

        tracing::trace!(count = round.len(), "resolved support round");
        search = render_all(&round);
        resolved.splice(0..0, round);
    }

    resolved
}

/// Rendered declarations, one per line
pub fn render_all(declarations: &[Declaration]) -> String {
    declarations
        .iter()
        .map(Declaration::render)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(declarations: &[Declaration]) -> Vec<&str> {
        declarations.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_direct_support() {
        let support = SupportMap::new()
            .with("multiply", "(a, b) => a * b")
            .with("add", "(a, b) => a + b");

        let declarations = resolve("(v) => multiply(v, 5)", &support);
        assert_eq!(names(&declarations), vec!["multiply"]);
        assert_eq!(declarations[0].arity, 3);
        assert_eq!(
            declarations[0].render(),
            "let multiply: Func<dynamic, dynamic, dynamic> = (a, b) => a * b;"
        );
    }

    #[test]
    fn test_transitive_support_is_deepest_first() {
        let support = SupportMap::new()
            .with("outer", "x => middle(x)")
            .with("middle", "x => inner(x) + 1")
            .with("inner", "x => x * 2")
            .with("unused", "x => x");

        let declarations = resolve("v => outer(v)", &support);
        assert_eq!(names(&declarations), vec!["inner", "middle", "outer"]);
    }

    #[test]
    fn test_substring_matches_are_included() {
        let support = SupportMap::new().with("add", "(a, b) => a + b");
        let declarations = resolve("v => v.address", &support);
        assert_eq!(names(&declarations), vec!["add"]);
    }

    #[test]
    fn test_nothing_to_resolve() {
        let support = SupportMap::new().with("helper", "x => x");
        assert!(resolve("v => v * 2", &support).is_empty());
        assert_eq!(render_all(&[]), "");
    }
}
