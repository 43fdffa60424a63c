//! Delegate binding and the arity model
//!
//! Compiled expressions are exposed as [`Callable<N>`]: a cheaply cloneable,
//! thread-safe function of exactly `N` dynamic arguments. `N` is limited to
//! the supported shapes (0 to 4 inputs) at compile time through the sealed
//! [`SupportedArity`] trait.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::compiler::LoadedModule;
use crate::error::{Error, Result};
use crate::runtime::Value;

mod sealed {
    pub trait Sealed {}
}

/// Type-level arity marker
pub struct Arity<const N: usize>;

/// Implemented for the arities a [`Callable`] can have
pub trait SupportedArity: sealed::Sealed {}

macro_rules! supported_arity {
    ($($n:literal),*) => {
        $(
            impl sealed::Sealed for Arity<$n> {}
            impl SupportedArity for Arity<$n> {}
        )*
    };
}

supported_arity!(0, 1, 2, 3, 4);

/// Declared kind of a parameter or return value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Generic object kind, rendered as `dynamic`
    Object,
    /// 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Boolean
    Bool,
    /// String (nullable)
    String,
    /// Record (nullable)
    Record,
    /// Array (nullable)
    Array,
}

impl ValueKind {
    /// Parses a type name used in annotations and local declarations
    pub fn from_type_name(name: &str) -> Option<ValueKind> {
        let kind = match name {
            "dynamic" | "object" => ValueKind::Object,
            "int" | "long" => ValueKind::Int,
            "double" | "float" => ValueKind::Float,
            "bool" => ValueKind::Bool,
            "string" => ValueKind::String,
            "record" => ValueKind::Record,
            "array" => ValueKind::Array,
            _ => return None,
        };
        Some(kind)
    }

    /// Source spelling of the kind
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueKind::Object => "dynamic",
            ValueKind::Int => "int",
            ValueKind::Float => "double",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::Record => "record",
            ValueKind::Array => "array",
        }
    }

    /// Converts a value to this kind. `int` widens to `double`; reference
    /// kinds accept `null`.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        match (self, value) {
            (ValueKind::Object, v) => Ok(v),
            (ValueKind::Int, v @ Value::Int(_)) => Ok(v),
            (ValueKind::Float, v @ Value::Float(_)) => Ok(v),
            (ValueKind::Float, Value::Int(n)) => Ok(Value::Float(n as f64)),
            (ValueKind::Bool, v @ Value::Bool(_)) => Ok(v),
            (ValueKind::String, v @ (Value::String(_) | Value::Null)) => Ok(v),
            (ValueKind::Record, v @ (Value::Object(_) | Value::Null)) => Ok(v),
            (ValueKind::Array, v @ (Value::Array(_) | Value::Null)) => Ok(v),
            (kind, v) => Err(Error::TypeError {
                expected: kind.type_name().to_string(),
                got: v.type_name(),
            }),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Parameter and return kinds of an `N`-ary expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature<const N: usize> {
    /// Parameter kinds
    pub params: [ValueKind; N],
    /// Return kind
    pub returns: ValueKind,
}

impl<const N: usize> Signature<N> {
    /// Creates a signature
    pub fn new(params: [ValueKind; N], returns: ValueKind) -> Self {
        Signature { params, returns }
    }

    /// All slots dynamic
    pub fn dynamic() -> Self {
        Signature {
            params: [ValueKind::Object; N],
            returns: ValueKind::Object,
        }
    }
}

impl<const N: usize> Default for Signature<N> {
    fn default() -> Self {
        Self::dynamic()
    }
}

/// `Namespace.Class.method` address of an entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedMethod {
    /// Dotted namespace
    pub namespace: String,
    /// Class name
    pub class: String,
    /// Method name
    pub method: String,
}

impl QualifiedMethod {
    /// Creates a method address
    pub fn new(
        namespace: impl Into<String>,
        class: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        QualifiedMethod {
            namespace: namespace.into(),
            class: class.into(),
            method: method.into(),
        }
    }

    /// `Namespace.Class`
    pub fn class_path(&self) -> String {
        format!("{}.{}", self.namespace, self.class)
    }
}

impl fmt::Display for QualifiedMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.namespace, self.class, self.method)
    }
}

type CallFn<const N: usize> = dyn Fn([Value; N]) -> Result<Value> + Send + Sync;

/// A compiled expression taking exactly `N` arguments.
///
/// Holds its module alive; clones share it. A function value returned
/// directly by the callable keeps the module alive too. Functions nested
/// inside returned records or arrays do not: calling one after every
/// callable for the module was dropped fails with
/// [`Error::ModuleUnloaded`].
pub struct Callable<const N: usize>
where
    Arity<N>: SupportedArity,
{
    inner: Arc<CallFn<N>>,
}

impl<const N: usize> Callable<N>
where
    Arity<N>: SupportedArity,
{
    /// Wraps a Rust function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn([Value; N]) -> Result<Value> + Send + Sync + 'static,
    {
        Callable { inner: Arc::new(f) }
    }

    /// A callable that ignores its arguments and returns `value`
    pub fn constant(value: Value) -> Self {
        Callable::new(move |_| Ok(value.clone()))
    }

    /// Invokes the callable
    pub fn call(&self, args: [Value; N]) -> Result<Value> {
        (self.inner)(args)
    }

    /// Number of inputs
    pub fn arity(&self) -> usize {
        N
    }
}

impl Callable<1> {
    /// Invokes a one-input callable with anything convertible to a value
    pub fn apply(&self, input: impl Into<Value>) -> Result<Value> {
        self.call([input.into()])
    }
}

impl<const N: usize> Clone for Callable<N>
where
    Arity<N>: SupportedArity,
{
    fn clone(&self) -> Self {
        Callable {
            inner: self.inner.clone(),
        }
    }
}

impl<const N: usize> fmt::Debug for Callable<N>
where
    Arity<N>: SupportedArity,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Callable<{}>", N)
    }
}

/// Binds the `N`-ary overload of `path` in a loaded module
pub fn bind<const N: usize>(module: Arc<LoadedModule>, path: &QualifiedMethod) -> Result<Callable<N>>
where
    Arity<N>: SupportedArity,
{
    let class_path = path.class_path();
    if module.code().class_index(&class_path).is_none() {
        return Err(Error::binding(format!(
            "Class '{}' was not found in the compiled module",
            class_path
        )));
    }

    let method = module
        .code()
        .method_overload(&path.to_string(), N)
        .ok_or_else(|| {
            Error::binding(format!(
                "Method '{}' taking {} argument(s) was not found",
                path, N
            ))
        })?;

    tracing::debug!(method = %path, arity = N, "bound entry point");

    Ok(Callable::new(move |args: [Value; N]| {
        match module.invoke_method(method, Vec::from(args))? {
            Value::Function(closure) => Ok(Value::Function(Arc::new(
                closure.retained(module.clone()),
            ))),
            other => Ok(other),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_callable() {
        let callable = Callable::<1>::constant(Value::from("literal"));
        assert_eq!(callable.apply(42).unwrap(), Value::from("literal"));
        assert_eq!(callable.arity(), 1);
    }

    #[test]
    fn test_callable_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Callable<0>>();
        assert_send_sync::<Callable<4>>();

        let add = Callable::<2>::new(|[a, b]| Ok(Value::Int(a.as_int()? + b.as_int()?)));
        let copy = add.clone();
        let handle = std::thread::spawn(move || copy.call([Value::Int(1), Value::Int(2)]));
        assert_eq!(handle.join().unwrap().unwrap(), Value::Int(3));
        assert_eq!(add.call([Value::Int(2), Value::Int(2)]).unwrap(), Value::Int(4));
    }

    #[test]
    fn test_kind_coercion() {
        assert_eq!(ValueKind::Float.coerce(Value::Int(2)).unwrap(), Value::Float(2.0));
        assert_eq!(ValueKind::String.coerce(Value::Null).unwrap(), Value::Null);
        assert!(ValueKind::Int.coerce(Value::from("2")).is_err());
        assert!(ValueKind::Int.coerce(Value::Null).is_err());
        assert_eq!(ValueKind::Object.type_name(), "dynamic");
        assert_eq!(ValueKind::from_type_name("double"), Some(ValueKind::Float));
        assert_eq!(ValueKind::from_type_name("Widget"), None);
    }

    #[test]
    fn test_signature_defaults() {
        let sig = Signature::<3>::dynamic();
        assert!(sig.params.iter().all(|k| *k == ValueKind::Object));
        assert_eq!(sig, Signature::<3>::default());
    }
}
