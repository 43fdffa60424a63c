//! Instrumentation hook injection

use std::sync::Arc;

use crate::compiler::Program;
use crate::error::{Error, Result};
use crate::runtime::Value;
use crate::tools::Tool;

/// Receives `trace(value[, message])` calls; its result replaces the value
pub type TraceHook = Arc<dyn Fn(&Value, &str) -> Value + Send + Sync>;

/// Identity hook
pub fn default_hook() -> TraceHook {
    Arc::new(|value: &Value, _: &str| value.clone())
}

/// A [`TraceHook`] exposed as a two-argument native function
pub struct HookTool {
    hook: TraceHook,
}

impl HookTool {
    /// Wraps a hook
    pub fn new(hook: TraceHook) -> Self {
        HookTool { hook }
    }
}

impl Tool for HookTool {
    fn name(&self) -> &str {
        "trace"
    }

    fn description(&self) -> &str {
        "Instrumentation hook"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        match args {
            [value, message] => Ok((self.hook)(value, &message.to_display_string())),
            _ => Err(Error::ArityMismatch {
                name: self.name().to_string(),
                expected: 2,
                got: args.len(),
            }),
        }
    }
}

/// Overrides the hook field `field` of a program before it is loaded.
/// `None` leaves the default identity hook in place.
pub fn inject(program: &mut Program, field: &str, hook: Option<TraceHook>) -> Result<()> {
    let Some(hook) = hook else {
        return Ok(());
    };
    program
        .inject_hook(field, Value::native(HookTool::new(hook)))
        .map_err(|e| match e {
            Error::BindingFailure(reason) => Error::binding(format!(
                "Instrumentation hook could not be injected: {}",
                reason
            )),
            other => other,
        })?;
    tracing::debug!(field = %field, "instrumentation hook injected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompileService, InMemoryCompiler};
    use parking_lot::Mutex;

    const UNIT: &str = "namespace N { class C {
        let _trace: Func<dynamic, string, dynamic> = (i, m) => i;
        fn run(x) => _trace(x, \"seen\") * 2;
    } }";

    #[test]
    fn test_hook_tool_forwards_message() {
        let tool = HookTool::new(Arc::new(|v: &Value, m: &str| {
            Value::String(format!("{}:{}", v.to_display_string(), m))
        }));
        assert_eq!(
            tool.execute(&[Value::Int(1), Value::Null]).unwrap(),
            Value::from("1:")
        );
        assert!(tool.execute(&[Value::Int(1)]).is_err());
        assert_eq!(
            default_hook()(&Value::Int(3), "ignored"),
            Value::Int(3)
        );
    }

    #[test]
    fn test_injected_hook_observes_calls() {
        let compiler = InMemoryCompiler::default();
        let mut program = compiler.compile(&[UNIT.to_string()], &[]).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let hook: TraceHook = Arc::new(move |v: &Value, m: &str| {
            sink.lock().push(format!("{}/{}", v.to_display_string(), m));
            v.clone()
        });
        inject(&mut program, "N.C._trace", Some(hook)).unwrap();

        let module = program.load().unwrap();
        assert_eq!(module.invoke("N.C.run", vec![Value::Int(2)]).unwrap(), Value::Int(4));
        assert_eq!(seen.lock().as_slice(), ["2/seen".to_string()]);
    }

    #[test]
    fn test_missing_field_is_binding_failure() {
        let compiler = InMemoryCompiler::default();
        let mut program = compiler.compile(&[UNIT.to_string()], &[]).unwrap();
        assert!(inject(&mut program, "N.C.missing", None).is_ok());
        let err = inject(&mut program, "N.C.missing", Some(default_hook())).unwrap_err();
        assert!(matches!(err, Error::BindingFailure(_)));
    }
}
