//! Compilation pipeline for one expression
//!
//! ```text
//! primary + support → resolve → synthesize → compile → inject hook → load → bind
//! ```
//!
//! A [`Session`] owns exactly one synthesized unit and is consumed by
//! [`Session::compile`].

pub mod hook;
pub mod resolver;
pub mod synthesize;

pub use hook::{default_hook, inject, HookTool, TraceHook};
pub use resolver::{render_all, resolve, Declaration};
pub use synthesize::{synthesize, SynthesizedUnit};

use crate::binder::{bind, Arity, Callable, Signature, SupportedArity};
use crate::compiler::CompileService;
use crate::error::{Error, Result};

/// Names the synthesized unit declares itself
pub const RESERVED_NAMES: [&str; 4] = [
    synthesize::HOOK_FIELD,
    synthesize::TRACE_METHOD,
    synthesize::MAPPER_FIELD,
    synthesize::ENTRY_METHOD,
];

/// Named helper function literals, in insertion order. Names are unique;
/// inserting an existing name replaces its source in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportMap {
    entries: Vec<(String, String)>,
}

impl SupportMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        let (name, source) = (name.into(), source.into());
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = source,
            None => self.entries.push((name, source)),
        }
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    /// Source of an entry
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_str())
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s.as_str()))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rejects names that are not identifiers or that the synthesized unit
    /// already declares
    pub fn validate(&self) -> Result<()> {
        for (name, _) in self.iter() {
            if RESERVED_NAMES.contains(&name) {
                return Err(Error::InvalidSupport {
                    name: name.to_string(),
                    reason: "the name is reserved by the compiled unit".to_string(),
                });
            }
            if !is_identifier(name) {
                return Err(Error::InvalidSupport {
                    name: name.to_string(),
                    reason: "the name is not an identifier".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SupportMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = SupportMap::new();
        for (name, source) in iter {
            map.insert(name, source);
        }
        map
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// One compile request: a primary expression plus its support map, hook
/// and references
pub struct Session<'a> {
    compiler: &'a dyn CompileService,
    support: Option<&'a SupportMap>,
    hook: Option<TraceHook>,
    references: Vec<String>,
}

impl<'a> Session<'a> {
    /// Starts a session on a compiler
    pub fn new(compiler: &'a dyn CompileService) -> Self {
        Session {
            compiler,
            support: None,
            hook: None,
            references: Vec::new(),
        }
    }

    /// Support expressions the primary may call
    pub fn support(mut self, support: &'a SupportMap) -> Self {
        self.support = Some(support);
        self
    }

    /// Instrumentation hook
    pub fn hook(mut self, hook: Option<TraceHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Extra references
    pub fn references(mut self, references: Vec<String>) -> Self {
        self.references = references;
        self
    }

    /// Runs the pipeline and binds the `N`-ary wrapper
    pub fn compile<const N: usize>(
        self,
        primary: &str,
        signature: &Signature<N>,
    ) -> Result<Callable<N>>
    where
        Arity<N>: SupportedArity,
    {
        let declarations = match self.support {
            Some(support) => {
                support.validate()?;
                resolve(primary, support)
            }
            None => Vec::new(),
        };
        tracing::debug!(declarations = declarations.len(), "resolved support expressions");

        let unit = synthesize(primary, signature, &declarations);
        tracing::debug!(namespace = %unit.namespace, arity = N, "synthesized unit");

        let mut program = self
            .compiler
            .compile(std::slice::from_ref(&unit.text), &self.references)?;

        inject(&mut program, &unit.hook_field(), self.hook)?;
        let module = program.load()?;
        bind::<N>(module, &unit.entry_point())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::InMemoryCompiler;
    use crate::runtime::Value;

    #[test]
    fn test_support_map_order_and_replace() {
        let mut map = SupportMap::new().with("b", "x => 1").with("a", "x => 2");
        map.insert("b", "x => 3");
        let entries: Vec<_> = map.iter().collect();
        assert_eq!(entries, vec![("b", "x => 3"), ("a", "x => 2")]);
        assert_eq!(map.get("a"), Some("x => 2"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_reserved_names_are_rejected() {
        for name in ["trace", "_trace", "mapper", "execute", "not valid"] {
            let map = SupportMap::new().with(name, "x => x");
            assert!(matches!(map.validate(), Err(Error::InvalidSupport { .. })));
        }
        assert!(SupportMap::new().with("tracer", "x => x").validate().is_ok());
    }

    #[test]
    fn test_session_compiles() {
        let compiler = InMemoryCompiler::default();
        let support: SupportMap = [("inc", "x => x + 1")].into_iter().collect();
        let callable = Session::new(&compiler)
            .support(&support)
            .compile("v => inc(v) * 10", &Signature::<1>::dynamic())
            .unwrap();
        assert_eq!(callable.apply(1).unwrap(), Value::Int(20));
    }

    #[test]
    fn test_compile_failure_carries_unit() {
        let compiler = InMemoryCompiler::default();
        let err = Session::new(&compiler)
            .compile("v => nothing(v)", &Signature::<1>::dynamic())
            .unwrap_err();
        match err {
            Error::CompileFailure {
                source_text,
                diagnostics,
            } => {
                assert!(source_text.contains("let mapper: Func<dynamic, dynamic> = v => nothing(v);"));
                assert_eq!(
                    diagnostics[0].message,
                    "The name 'nothing' does not exist in the current context"
                );
            }
            other => panic!("expected compile failure, got {:?}", other),
        }
    }
}
