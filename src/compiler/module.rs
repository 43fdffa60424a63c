//! Compiled programs, loaded modules and the `.lxm` module image

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use super::ir::{FieldId, LambdaCode, MethodId, ModuleCode};
use crate::error::{Error, Result};
use crate::parser::CompilationUnit;
use crate::runtime::{Interpreter, Value};
use crate::tools::{Library, Tool};

/// Current `.lxm` format version
pub const IMAGE_FORMAT: u32 = 1;

/// Serialisable form of a compiled program: its parsed units and the
/// references they were linked against. Loading an image links it again
/// without scanning or parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleImage {
    /// Format version
    pub format: u32,
    /// Parsed compilation units
    pub units: Vec<CompilationUnit>,
    /// Reference identifiers and module paths
    pub references: Vec<String>,
}

impl ModuleImage {
    /// Creates an image for the current format
    pub fn new(units: Vec<CompilationUnit>, references: Vec<String>) -> Self {
        ModuleImage {
            format: IMAGE_FORMAT,
            units,
            references,
        }
    }

    /// Serializes to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::runtime(format!("Failed to serialize module image: {}", e)))
    }

    /// Parses JSON, checking the format version
    pub fn from_json_str(json: &str) -> Result<Self> {
        let image: ModuleImage = serde_json::from_str(json).map_err(|e| Error::ResourceFailure {
            path: "<module image>".to_string(),
            reason: e.to_string(),
        })?;
        if image.format != IMAGE_FORMAT {
            return Err(Error::ResourceFailure {
                path: "<module image>".to_string(),
                reason: format!(
                    "unsupported image format {} (expected {})",
                    image.format, IMAGE_FORMAT
                ),
            });
        }
        Ok(image)
    }

    /// Writes the image to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|e| Error::ResourceFailure {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Reads an image from `path`
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::ResourceFailure {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&text).map_err(|e| match e {
            Error::ResourceFailure { reason, .. } => Error::ResourceFailure {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }
}

/// A compiled, linked program that has not been instantiated yet.
///
/// Field overrides set here (the instrumentation hook) take the place of
/// the field's initializer when the program is loaded.
#[derive(Debug)]
pub struct Program {
    code: Arc<ModuleCode>,
    overrides: HashMap<FieldId, Value>,
    image: ModuleImage,
}

impl Program {
    pub(crate) fn new(code: ModuleCode, image: ModuleImage) -> Self {
        Program {
            code: Arc::new(code),
            overrides: HashMap::new(),
            image,
        }
    }

    /// `Namespace.Class` of every class, in declaration order
    pub fn class_names(&self) -> Vec<String> {
        self.code
            .classes
            .iter()
            .map(|c| c.qualified_name())
            .collect()
    }

    /// Linked code
    pub fn code(&self) -> &ModuleCode {
        &self.code
    }

    /// Replaces the initial value of `Namespace.Class.field`. Last write wins.
    pub fn inject_hook(&mut self, field: &str, value: Value) -> Result<()> {
        let id = self.code.field_id(field).ok_or_else(|| {
            Error::binding(format!("Field '{}' was not found in the compiled module", field))
        })?;
        tracing::trace!(field = %field, "field override registered");
        self.overrides.insert(id, value);
        Ok(())
    }

    /// Serialisable image of the program
    pub fn image(&self) -> &ModuleImage {
        &self.image
    }

    /// Instantiates the program: fields are initialized in declaration order,
    /// overrides replacing initializers.
    pub fn load(&self) -> Result<Arc<LoadedModule>> {
        let module = Arc::new(LoadedModule {
            code: self.code.clone(),
            fields: (0..self.code.fields.len()).map(|_| OnceLock::new()).collect(),
        });

        let interpreter = Interpreter::new(&module);
        for (id, field) in self.code.fields.iter().enumerate() {
            let value = match self.overrides.get(&id) {
                Some(value) => value.clone(),
                None => {
                    let value = interpreter.eval_init(&field.init)?;
                    match &field.ty {
                        Some(super::ir::DeclaredType::Value(kind)) => kind.coerce(value)?,
                        _ => value,
                    }
                }
            };
            if module.fields[id].set(value).is_err() {
                return Err(Error::runtime(format!(
                    "Field '{}' initialized twice",
                    self.code.field_name(id)
                )));
            }
        }

        tracing::debug!(
            classes = self.code.classes.len(),
            fields = self.code.fields.len(),
            methods = self.code.methods.len(),
            "module loaded"
        );
        Ok(module)
    }
}

/// An instantiated module. Immutable once loaded.
#[derive(Debug)]
pub struct LoadedModule {
    code: Arc<ModuleCode>,
    fields: Vec<OnceLock<Value>>,
}

impl LoadedModule {
    /// Linked code
    pub fn code(&self) -> &ModuleCode {
        &self.code
    }

    /// Current value of a field; `null` while its initializer has not run
    pub fn field_value(&self, id: FieldId) -> Value {
        self.fields
            .get(id)
            .and_then(OnceLock::get)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Compiled body of a method overload
    pub fn method_code(&self, id: MethodId) -> Result<Arc<LambdaCode>> {
        self.code
            .methods
            .get(id)
            .map(|m| m.code.clone())
            .ok_or_else(|| Error::runtime(format!("Unknown method id {}", id)))
    }

    /// Calls a method overload by id
    pub fn invoke_method(self: &Arc<Self>, id: MethodId, args: Vec<Value>) -> Result<Value> {
        let code = self.method_code(id)?;
        Interpreter::new(self).call(&code, args, None)
    }

    /// Value of `Namespace.Class.field`
    pub fn field(&self, qualified: &str) -> Result<Value> {
        self.code
            .field_id(qualified)
            .map(|id| self.field_value(id))
            .ok_or_else(|| Error::binding(format!("Field '{}' was not found", qualified)))
    }

    /// Resolves `Namespace.Class.member` to a value: a field's value, or a
    /// function dispatching over a method's overloads
    pub fn lookup(self: &Arc<Self>, qualified: &str) -> Option<Value> {
        if let Some(id) = self.code.field_id(qualified) {
            return Some(self.field_value(id));
        }
        let (owner, member) = qualified.rsplit_once('.')?;
        let class = self.code.class_index(owner)?;
        if !self.code.classes[class].methods.contains_key(member) {
            return None;
        }
        Some(Value::native(MethodTool {
            module: self.clone(),
            class,
            method: member.to_string(),
            qualified: qualified.to_string(),
        }))
    }

    /// Calls `Namespace.Class.member` with `args`: the method overload of
    /// matching arity, or the function held by a field
    pub fn invoke(self: &Arc<Self>, qualified: &str, args: Vec<Value>) -> Result<Value> {
        if let Some(id) = self.code.method_overload(qualified, args.len()) {
            return self.invoke_method(id, args);
        }
        match self.lookup(qualified) {
            Some(value) => value.call(args),
            None => Err(Error::binding(format!(
                "Member '{}' was not found",
                qualified
            ))),
        }
    }

    /// Exposes every field and method of the module as exports of a library
    pub fn to_library(self: &Arc<Self>, name: impl Into<String>) -> Library {
        let mut library = Library::new(name);
        for class in &self.code.classes {
            let owner = class.qualified_name();
            let members = class.fields.keys().chain(class.methods.keys());
            for member in members {
                let qualified = format!("{}.{}", owner, member);
                if let Some(value) = self.lookup(&qualified) {
                    library.export(qualified, value);
                }
            }
        }
        library
    }
}

/// A method group of a loaded module, callable as a native function.
/// Holds its module alive.
pub struct MethodTool {
    module: Arc<LoadedModule>,
    class: usize,
    method: String,
    qualified: String,
}

impl Tool for MethodTool {
    fn name(&self) -> &str {
        &self.qualified
    }

    fn description(&self) -> &str {
        "Method of a referenced module"
    }

    fn arity(&self) -> Option<usize> {
        let overloads = self.module.code.classes[self.class].methods.get(&self.method)?;
        match overloads.as_slice() {
            [only] => Some(self.module.code.methods[*only].code.params),
            _ => None,
        }
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let id = self
            .module
            .code
            .overload(self.class, &self.method, args.len())
            .ok_or_else(|| Error::InvalidArguments {
                tool: self.qualified.clone(),
                reason: format!("No overload takes {} arguments", args.len()),
            })?;
        self.module.invoke_method(id, args.to_vec())
    }
}
