//! # Lucid Compiler - lambda units to loadable modules
//!
//! Compiles source units of the lambda language against a set of references
//! into a [`Program`], which is then loaded into a [`LoadedModule`].
//!
//! ## Architecture
//!
//! ```text
//! Source units → Scanner → Parser → Linker (names, arities, returns) → Program → load()
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use lucid::compiler::{CompileService, InMemoryCompiler};
//!
//! let compiler = InMemoryCompiler::default();
//! let program = compiler.compile(&[source], &[])?;
//! let module = program.load()?;
//! let result = module.invoke("Demo.Math.double", vec![Value::Int(21)])?;
//! ```

pub mod ir;
mod linker;
mod module;

pub use linker::{always_returns, link};
pub use module::{LoadedModule, MethodTool, ModuleImage, Program, IMAGE_FORMAT};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Diagnostic, Error, Result};
use crate::lexer::Scanner;
use crate::parser::{CompilationUnit, Parser};
use crate::runtime::Value;
use crate::tools::ReferenceRegistry;

/// How deep `.lxm` references may reference further `.lxm` files
pub const MAX_REFERENCE_DEPTH: usize = 8;

/// Compiles source units against references into a loadable program
pub trait CompileService: Send + Sync {
    /// Compiles `units` (source text) against `references`
    fn compile(&self, units: &[String], references: &[String]) -> Result<Program>;

    /// Links a prebuilt module image without parsing
    fn link_image(&self, image: ModuleImage) -> Result<Program>;
}

/// The in-crate compiler for the lambda language.
///
/// References are reference identifiers registered in the
/// [`ReferenceRegistry`], or paths of module images ending in the module
/// suffix. Relative image paths resolve against `base_dir`.
#[derive(Debug, Clone)]
pub struct InMemoryCompiler {
    registry: Arc<ReferenceRegistry>,
    base_dir: PathBuf,
    module_suffix: String,
}

impl InMemoryCompiler {
    /// Creates a compiler over a registry
    pub fn new(registry: Arc<ReferenceRegistry>) -> Self {
        InMemoryCompiler {
            registry,
            base_dir: PathBuf::from("."),
            module_suffix: ".lxm".to_string(),
        }
    }

    /// Directory relative image references resolve against
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Suffix that marks a reference as a module image path
    pub fn with_module_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.module_suffix = suffix.into();
        self
    }

    /// Reference registry in use
    pub fn registry(&self) -> &Arc<ReferenceRegistry> {
        &self.registry
    }

    fn resolve_path(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Exports visible to a compilation: the baseline libraries, the named
    /// registry libraries, and every member of the referenced images
    fn exports(&self, references: &[String], depth: usize) -> Result<HashMap<String, Value>> {
        let (images, names): (Vec<&String>, Vec<&String>) = references
            .iter()
            .partition(|r| r.ends_with(&self.module_suffix));
        let names: Vec<String> = names.into_iter().cloned().collect();
        let mut exports = self.registry.exports(&names)?;

        for reference in images {
            if depth >= MAX_REFERENCE_DEPTH {
                return Err(Error::ResourceFailure {
                    path: reference.clone(),
                    reason: format!(
                        "module references nest deeper than {} levels",
                        MAX_REFERENCE_DEPTH
                    ),
                });
            }
            let image = ModuleImage::read(self.resolve_path(reference))?;
            let module = self.link_at_depth(image, depth + 1)?.load()?;
            module.to_library(reference.clone()).merge_into(&mut exports);
            tracing::debug!(reference = %reference, "linked module reference");
        }

        Ok(exports)
    }

    fn link_at_depth(&self, image: ModuleImage, depth: usize) -> Result<Program> {
        let exports = self.exports(&image.references, depth)?;
        let code = link(&image.units, &exports).map_err(|diagnostics| Error::CompileFailure {
            source_text: "<module image>".to_string(),
            diagnostics,
        })?;
        Ok(Program::new(code, image))
    }
}

impl Default for InMemoryCompiler {
    fn default() -> Self {
        Self::new(Arc::new(ReferenceRegistry::new()))
    }
}

impl CompileService for InMemoryCompiler {
    fn compile(&self, units: &[String], references: &[String]) -> Result<Program> {
        let mut parsed = Vec::with_capacity(units.len());
        let mut diagnostics = Vec::new();

        for source in units {
            match parse_source(source) {
                Ok(unit) => parsed.push(unit),
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }

        if diagnostics.is_empty() {
            let exports = self.exports(references, 0)?;
            match link(&parsed, &exports) {
                Ok(code) => {
                    tracing::debug!(
                        units = units.len(),
                        classes = code.classes.len(),
                        "compiled units"
                    );
                    let image = ModuleImage::new(parsed, references.to_vec());
                    return Ok(Program::new(code, image));
                }
                Err(found) => diagnostics = found,
            }
        }

        tracing::debug!(diagnostics = diagnostics.len(), "compilation failed");
        Err(Error::CompileFailure {
            source_text: units.first().cloned().unwrap_or_default(),
            diagnostics,
        })
    }

    fn link_image(&self, image: ModuleImage) -> Result<Program> {
        self.link_at_depth(image, 0)
    }
}

fn parse_source(source: &str) -> std::result::Result<CompilationUnit, Diagnostic> {
    Scanner::new(source)
        .scan_tokens()
        .and_then(|tokens| Parser::new(tokens).parse_unit())
        .map_err(|error| match error {
            Error::SyntaxError { line, col, message } => Diagnostic::new(line, col, message),
            Error::UnexpectedEof => {
                let (line, column) = end_position(source);
                Diagnostic::new(line, column, "Unexpected end of input")
            }
            other => Diagnostic::new(1, 1, other.to_string()),
        })
}

/// Line and column just past the last character
fn end_position(source: &str) -> (usize, usize) {
    let line = source.lines().count().max(1) + usize::from(source.ends_with('\n'));
    let column = if source.ends_with('\n') {
        1
    } else {
        source.lines().last().map_or(0, |l| l.chars().count()) + 1
    };
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "namespace Demo {
    class Math {
        let factor = 2;
        fn scale(x) => x * factor;
        fn scale(x, y) => scale(x) + y;
    }
}";

    #[test]
    fn test_compile_and_invoke() {
        let compiler = InMemoryCompiler::default();
        let program = compiler.compile(&[SAMPLE.to_string()], &[]).unwrap();
        assert_eq!(program.class_names(), vec!["Demo.Math"]);

        let module = program.load().unwrap();
        assert_eq!(
            module.invoke("Demo.Math.scale", vec![Value::Int(21)]).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            module
                .invoke("Demo.Math.scale", vec![Value::Int(1), Value::Int(1)])
                .unwrap(),
            Value::Int(3)
        );
        assert_eq!(module.field("Demo.Math.factor").unwrap(), Value::Int(2));
    }

    #[test]
    fn test_parse_errors_become_diagnostics() {
        let compiler = InMemoryCompiler::default();
        let err = compiler
            .compile(&["namespace N { class C { fn m(x) => ; } }".to_string()], &[])
            .unwrap_err();
        match err {
            Error::CompileFailure { diagnostics, .. } => {
                assert_eq!(diagnostics.len(), 1);
                assert_eq!(diagnostics[0].line, 1);
            }
            other => panic!("expected compile failure, got {:?}", other),
        }

        let err = compiler
            .compile(&["namespace N {\n class C {".to_string()], &[])
            .unwrap_err();
        match err {
            Error::CompileFailure { diagnostics, .. } => {
                assert_eq!((diagnostics[0].line, diagnostics[0].column), (2, 11));
            }
            other => panic!("expected compile failure, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_reference() {
        let compiler = InMemoryCompiler::default();
        let err = compiler
            .compile(&[SAMPLE.to_string()], &["nowhere".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::ResourceFailure { .. }));
    }

    #[test]
    fn test_image_references() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = InMemoryCompiler::default().with_base_dir(dir.path());

        let library = compiler.compile(&[SAMPLE.to_string()], &[]).unwrap();
        library.image().save(dir.path().join("Demo.Math.lxm")).unwrap();

        let user = "namespace App { class Main { fn run(x) => Demo.Math.scale(x, 1); } }";
        let program = compiler
            .compile(&[user.to_string()], &["Demo.Math.lxm".to_string()])
            .unwrap();
        let module = program.load().unwrap();
        assert_eq!(
            module.invoke("App.Main.run", vec![Value::Int(5)]).unwrap(),
            Value::Int(11)
        );

        let relinked = compiler.link_image(program.image().clone()).unwrap();
        assert_eq!(relinked.class_names(), vec!["App.Main"]);
    }

    #[test]
    fn test_end_position() {
        assert_eq!(end_position(""), (1, 1));
        assert_eq!(end_position("ab"), (1, 3));
        assert_eq!(end_position("ab\ncd"), (2, 3));
        assert_eq!(end_position("ab\n"), (2, 1));
    }
}
