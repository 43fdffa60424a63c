//! Reference libraries
//!
//! Native functions and constants that compiled expressions can address by
//! qualified name (`Math.Max`, `Json.Parse`, ...). Libraries are grouped
//! under reference identifiers and looked up through a [`ReferenceRegistry`].

pub mod stdlib;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::runtime::Value;

/// Tool trait - every native function implements this
pub trait Tool: Send + Sync {
    /// Qualified export name
    fn name(&self) -> &str;

    /// Tool description
    fn description(&self) -> &str;

    /// Execute the tool
    fn execute(&self, args: &[Value]) -> Result<Value>;

    /// Check if tool requires specific number of arguments
    fn arity(&self) -> Option<usize> {
        None // None means variadic
    }
}

impl fmt::Debug for dyn Tool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tool({})", self.name())
    }
}

/// A named set of exports
#[derive(Debug, Clone)]
pub struct Library {
    name: String,
    exports: HashMap<String, Value>,
}

impl Library {
    /// Create an empty library
    pub fn new(name: impl Into<String>) -> Self {
        Library {
            name: name.into(),
            exports: HashMap::new(),
        }
    }

    /// Reference identifier of the library
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a tool under its own name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.exports.insert(name, Value::Native(Arc::new(tool)));
    }

    /// Export a value under a qualified name
    pub fn export(&mut self, name: impl Into<String>, value: Value) {
        self.exports.insert(name.into(), value);
    }

    /// Get an export by qualified name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.exports.get(name)
    }

    /// Check if an export exists
    pub fn has(&self, name: &str) -> bool {
        self.exports.contains_key(name)
    }

    /// List all export names
    pub fn list_exports(&self) -> Vec<String> {
        let mut names: Vec<_> = self.exports.keys().cloned().collect();
        names.sort();
        names
    }

    /// Export count
    pub fn count(&self) -> usize {
        self.exports.len()
    }

    pub(crate) fn merge_into(&self, exports: &mut HashMap<String, Value>) {
        for (name, value) in &self.exports {
            if exports.insert(name.clone(), value.clone()).is_some() {
                tracing::warn!(library = %self.name, export = %name, "export shadows an earlier reference");
            }
        }
    }
}

/// Libraries addressable by reference identifier. The baseline set is
/// present from construction; hosts may register more.
pub struct ReferenceRegistry {
    libraries: RwLock<HashMap<String, Arc<Library>>>,
}

impl ReferenceRegistry {
    /// Reference identifiers that every compilation sees
    pub const BASELINE: [&'static str; 3] = ["core", "dynamic", "lucid"];

    /// Create a registry holding the baseline libraries
    pub fn new() -> Self {
        let registry = Self::empty();
        for library in stdlib::baseline() {
            registry.register(library);
        }
        registry
    }

    /// Create empty registry (for testing)
    pub fn empty() -> Self {
        ReferenceRegistry {
            libraries: RwLock::new(HashMap::new()),
        }
    }

    /// Register (or replace) a library under its name
    pub fn register(&self, library: Library) {
        tracing::debug!(library = %library.name(), exports = library.count(), "registered reference library");
        self.libraries
            .write()
            .insert(library.name().to_string(), Arc::new(library));
    }

    /// Get a library by reference identifier
    pub fn get(&self, name: &str) -> Option<Arc<Library>> {
        self.libraries.read().get(name).cloned()
    }

    /// Check if a library is registered
    pub fn has(&self, name: &str) -> bool {
        self.libraries.read().contains_key(name)
    }

    /// List registered reference identifiers
    pub fn list_libraries(&self) -> Vec<String> {
        let mut names: Vec<_> = self.libraries.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Merged exports of the baseline libraries plus the named ones
    pub fn exports(&self, names: &[String]) -> Result<HashMap<String, Value>> {
        let mut exports = HashMap::new();
        let libraries = self.libraries.read();

        for name in Self::BASELINE.iter().copied() {
            if let Some(library) = libraries.get(name) {
                library.merge_into(&mut exports);
            }
        }

        for name in names {
            if Self::BASELINE.contains(&name.as_str()) {
                continue;
            }
            let library = libraries.get(name).ok_or_else(|| Error::ResourceFailure {
                path: name.clone(),
                reason: "no reference library is registered under this name".to_string(),
            })?;
            library.merge_into(&mut exports);
        }

        Ok(exports)
    }
}

impl Default for ReferenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReferenceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ReferenceRegistry")
            .field("libraries", &self.list_libraries())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestTool;

    impl Tool for TestTool {
        fn name(&self) -> &str {
            "Test.Echo"
        }

        fn description(&self) -> &str {
            "A test tool"
        }

        fn execute(&self, args: &[Value]) -> Result<Value> {
            if args.is_empty() {
                Ok(Value::Int(42))
            } else {
                Ok(args[0].clone())
            }
        }
    }

    #[test]
    fn test_library_registration() {
        let mut library = Library::new("test");
        library.register(TestTool);
        library.export("Test.Answer", Value::Int(42));

        assert!(library.has("Test.Echo"));
        assert!(!library.has("Test.Unknown"));
        assert_eq!(library.list_exports(), vec!["Test.Answer", "Test.Echo"]);
    }

    #[test]
    fn test_tool_execution() {
        let tool = TestTool;
        assert_eq!(tool.execute(&[]).unwrap(), Value::Int(42));
        assert_eq!(
            tool.execute(&[Value::from("hello")]).unwrap(),
            Value::from("hello")
        );
    }

    #[test]
    fn test_baseline_is_always_visible() {
        let registry = ReferenceRegistry::new();
        let exports = registry.exports(&[]).unwrap();
        assert!(exports.contains_key("Math.Max"));
        assert!(exports.contains_key("Json.Parse"));
        assert!(exports.contains_key("Lucid.ParameterCount"));
    }

    #[test]
    fn test_extra_references() {
        let registry = ReferenceRegistry::new();
        let mut library = Library::new("test");
        library.register(TestTool);
        registry.register(library);

        assert!(!registry.exports(&[]).unwrap().contains_key("Test.Echo"));
        let exports = registry.exports(&["test".to_string()]).unwrap();
        assert!(exports.contains_key("Test.Echo"));

        assert!(matches!(
            registry.exports(&["missing".to_string()]),
            Err(Error::ResourceFailure { .. })
        ));
    }
}
