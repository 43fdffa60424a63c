//! Public entry point: classify an expression and compile it to a callable

use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::binder::{bind, Arity, Callable, QualifiedMethod, Signature, SupportedArity};
use crate::compiler::{CompileService, InMemoryCompiler, ModuleImage, Program};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::lambda::{is_lambda, is_template};
use crate::pipeline::{Session, SupportMap, TraceHook};
use crate::runtime::Value;
use crate::tools::ReferenceRegistry;

lazy_static! {
    static ref TYPE_PATH: Regex =
        Regex::new(r"^(?P<namespace>.+)\.(?P<class>[^.]+)$").expect("valid type path pattern");
}

/// Per-request inputs besides the expression itself
#[derive(Clone, Default)]
pub struct CompileOptions {
    /// Helper function literals the expression may call
    pub support: SupportMap,
    /// Instrumentation hook behind `trace(...)`
    pub hook: Option<TraceHook>,
    /// References in addition to the configured defaults
    pub references: Vec<String>,
}

impl CompileOptions {
    /// Empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the support map
    pub fn with_support(mut self, support: SupportMap) -> Self {
        self.support = support;
        self
    }

    /// Sets the instrumentation hook
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value, &str) -> Value + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Adds a reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.references.push(reference.into());
        self
    }
}

impl fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CompileOptions")
            .field("support", &self.support)
            .field("hook", &self.hook.is_some())
            .field("references", &self.references)
            .finish()
    }
}

/// How an expression is treated, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Contains `=>`
    Lambda,
    /// Contains a `{...}` placeholder
    Template,
    /// Path of an external source file
    Source,
    /// Path of a prebuilt module image
    Module,
    /// Anything else; evaluates to the text itself
    Literal,
}

/// Compiles expression text into callables.
///
/// Cheap to clone; clones share the reference registry and compiler.
#[derive(Clone)]
pub struct Engine {
    config: Arc<EngineConfig>,
    registry: Arc<ReferenceRegistry>,
    compiler: Arc<dyn CompileService>,
}

impl Engine {
    /// Creates an engine with the in-crate compiler
    pub fn new(config: EngineConfig) -> Self {
        let registry = Arc::new(ReferenceRegistry::new());
        let compiler = InMemoryCompiler::new(registry.clone())
            .with_base_dir(config.base_dir.clone())
            .with_module_suffix(config.module_suffix.clone());
        Engine {
            config: Arc::new(config),
            registry,
            compiler: Arc::new(compiler),
        }
    }

    /// Creates an engine on a custom compile service
    pub fn with_compiler(
        config: EngineConfig,
        registry: Arc<ReferenceRegistry>,
        compiler: Arc<dyn CompileService>,
    ) -> Self {
        Engine {
            config: Arc::new(config),
            registry,
            compiler,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reference libraries; hosts may register more
    pub fn registry(&self) -> &Arc<ReferenceRegistry> {
        &self.registry
    }

    /// Decides how [`compile_map_expression`](Self::compile_map_expression)
    /// treats `expression`
    pub fn classify(&self, expression: &str) -> Classification {
        if is_lambda(expression) {
            Classification::Lambda
        } else if is_template(expression) {
            Classification::Template
        } else if expression.ends_with(&self.config.source_suffix) {
            Classification::Source
        } else if expression.ends_with(&self.config.module_suffix) {
            Classification::Module
        } else {
            Classification::Literal
        }
    }

    /// Compiles a function literal taking `N` dynamic inputs
    pub fn compile_lambda<const N: usize>(
        &self,
        lambda: &str,
        options: &CompileOptions,
    ) -> Result<Callable<N>>
    where
        Arity<N>: SupportedArity,
    {
        self.compile_lambda_with(lambda, Signature::dynamic(), options)
    }

    /// Compiles a function literal against declared parameter/return kinds
    pub fn compile_lambda_with<const N: usize>(
        &self,
        lambda: &str,
        signature: Signature<N>,
        options: &CompileOptions,
    ) -> Result<Callable<N>>
    where
        Arity<N>: SupportedArity,
    {
        Session::new(self.compiler.as_ref())
            .support(&options.support)
            .hook(options.hook.clone())
            .references(self.references(options))
            .compile(lambda, &signature)
    }

    /// Compiles a `{field}` template into a function of one record input
    pub fn compile_template(&self, template: &str) -> Result<Callable<1>> {
        self.compile_template_with(template, &CompileOptions::default())
    }

    fn compile_template_with(&self, template: &str, options: &CompileOptions) -> Result<Callable<1>> {
        let lambda = template_lambda(template);
        tracing::trace!(lambda = %lambda, "template rewritten");
        self.compile_lambda::<1>(&lambda, options)
    }

    /// Compiles a mapping expression: a function literal, a template, an
    /// external source or module path, or literal text.
    ///
    /// `method` names the entry point for source and module paths. Failures
    /// are wrapped with the expression text.
    pub fn compile_map_expression(
        &self,
        expression: &str,
        method: &str,
        options: &CompileOptions,
    ) -> Result<Callable<1>> {
        let classification = self.classify(expression);
        tracing::debug!(?classification, "classified expression");

        let result = match classification {
            Classification::Lambda => self.compile_lambda::<1>(expression, options),
            Classification::Template => self.compile_template_with(expression, options),
            Classification::Source => self.compile_source_file(expression, method, options),
            Classification::Module => self.load_module_file(expression, method),
            Classification::Literal => {
                return Ok(Callable::constant(Value::String(expression.to_string())))
            }
        };

        result.map_err(|e| e.in_expression(expression))
    }

    /// [`compile_map_expression`](Self::compile_map_expression) on the
    /// blocking thread pool
    pub async fn compile_map_expression_async(
        &self,
        expression: impl Into<String>,
        method: impl Into<String>,
        options: CompileOptions,
    ) -> Result<Callable<1>> {
        let engine = self.clone();
        let (expression, method) = (expression.into(), method.into());
        tokio::task::spawn_blocking(move || {
            engine.compile_map_expression(&expression, &method, &options)
        })
        .await
        .map_err(|e| Error::runtime(format!("Compile task failed: {}", e)))?
    }

    fn references(&self, options: &CompileOptions) -> Vec<String> {
        self.config
            .default_references
            .iter()
            .chain(options.references.iter())
            .cloned()
            .collect()
    }

    fn compile_source_file(
        &self,
        expression: &str,
        method: &str,
        options: &CompileOptions,
    ) -> Result<Callable<1>> {
        let path = self.config.resolve(expression);
        let source = std::fs::read_to_string(&path).map_err(|e| Error::ResourceFailure {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let program = self.compiler.compile(&[source], &self.references(options))?;
        self.bind_file(program, expression, &self.config.source_suffix, method)
    }

    fn load_module_file(&self, expression: &str, method: &str) -> Result<Callable<1>> {
        let image = ModuleImage::read(self.config.resolve(expression))?;
        let program = self.compiler.link_image(image)?;
        self.bind_file(program, expression, &self.config.module_suffix, method)
    }

    fn bind_file(
        &self,
        program: Program,
        expression: &str,
        suffix: &str,
        method: &str,
    ) -> Result<Callable<1>> {
        let target = entry_point(expression, suffix, method)?;
        tracing::debug!(entry = %target, "binding external entry point");
        bind::<1>(program.load()?, &target)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}

/// `input => $"..."` with every `{` opening a field access on `input`
pub fn template_lambda(template: &str) -> String {
    let escaped = template
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('{', "{input.");
    format!("input => $\"{}\"", escaped)
}

/// Entry point of an external file: the file name without `suffix` is
/// `Namespace.Class`
fn entry_point(expression: &str, suffix: &str, method: &str) -> Result<QualifiedMethod> {
    let file_name = std::path::Path::new(expression)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(expression);
    let stem = file_name.strip_suffix(suffix).unwrap_or(file_name);

    let captures = TYPE_PATH.captures(stem).ok_or_else(|| {
        Error::binding(format!(
            "Cannot derive a namespace and class from '{}'",
            expression
        ))
    })?;
    Ok(QualifiedMethod::new(
        &captures["namespace"],
        &captures["class"],
        method,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_priority() {
        let engine = Engine::default();
        assert_eq!(engine.classify("i => i"), Classification::Lambda);
        assert_eq!(engine.classify("{a} => x"), Classification::Lambda);
        assert_eq!(engine.classify("Hello {name}"), Classification::Template);
        assert_eq!(engine.classify("{A.B.lx}"), Classification::Template);
        assert_eq!(engine.classify("A.B.lx"), Classification::Source);
        assert_eq!(engine.classify("A.B.lxm"), Classification::Module);
        assert_eq!(engine.classify("plain"), Classification::Literal);
    }

    #[test]
    fn test_template_lambda() {
        assert_eq!(
            template_lambda("Name: {first} {last}"),
            "input => $\"Name: {input.first} {input.last}\""
        );
        assert_eq!(
            template_lambda("say \"{word}\" \\o/"),
            "input => $\"say \\\"{input.word}\\\" \\\\o/\""
        );
    }

    #[test]
    fn test_entry_point() {
        let target = entry_point("maps/Acme.Billing.Mapper.lx", ".lx", "Map").unwrap();
        assert_eq!(target.to_string(), "Acme.Billing.Mapper.Map");
        assert!(matches!(
            entry_point("Mapper.lx", ".lx", "Map"),
            Err(Error::BindingFailure(_))
        ));
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Engine>();
        assert_send_sync::<CompileOptions>();
    }
}
