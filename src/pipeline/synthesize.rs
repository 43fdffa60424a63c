//! Synthesis of the compilable unit around a primary expression

use uuid::Uuid;

use super::resolver::Declaration;
use crate::binder::{QualifiedMethod, Signature};

/// Class every synthesized unit declares
pub const CLASS_NAME: &str = "DynamicClass";
/// Field holding the instrumentation hook
pub const HOOK_FIELD: &str = "_trace";
/// Convenience overloads forwarding to the hook
pub const TRACE_METHOD: &str = "trace";
/// Field holding the typed primary expression
pub const MAPPER_FIELD: &str = "mapper";
/// Arity-erased wrapper the binder looks up
pub const ENTRY_METHOD: &str = "execute";

/// A generated compilation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedUnit {
    /// Fresh namespace, `InMemory_<uuid>`
    pub namespace: String,
    /// Class name
    pub class: String,
    /// Unit source text
    pub text: String,
}

impl SynthesizedUnit {
    /// Address of the arity-erased wrapper
    pub fn entry_point(&self) -> QualifiedMethod {
        QualifiedMethod::new(&self.namespace, &self.class, ENTRY_METHOD)
    }

    /// `Namespace.Class._trace`
    pub fn hook_field(&self) -> String {
        format!("{}.{}.{}", self.namespace, self.class, HOOK_FIELD)
    }
}

/// Builds the unit: hook field and `trace` overloads, the resolved
/// declarations, the typed `mapper` field and the `execute` wrapper.
pub fn synthesize<const N: usize>(
    primary: &str,
    signature: &Signature<N>,
    declarations: &[Declaration],
) -> SynthesizedUnit {
    let namespace = format!("InMemory_{}", Uuid::new_v4().simple());

    let kinds = signature
        .params
        .iter()
        .chain(std::iter::once(&signature.returns))
        .map(|kind| kind.type_name())
        .collect::<Vec<_>>()
        .join(", ");
    let params = (0..N)
        .map(|i| format!("item{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    let mut lines = vec![
        format!("namespace {} {{", namespace),
        format!("    class {} {{", CLASS_NAME),
        format!(
            "        let {}: Func<dynamic, string, dynamic> = (i, m) => i;",
            HOOK_FIELD
        ),
        format!("        fn {}(i) => {}(i, \"\");", TRACE_METHOD, HOOK_FIELD),
        format!("        fn {}(i, m) => {}(i, m);", TRACE_METHOD, HOOK_FIELD),
    ];
    lines.extend(
        declarations
            .iter()
            .map(|declaration| format!("        {}", declaration.render())),
    );
    lines.push(format!("        let {}: Func<{}> = {};", MAPPER_FIELD, kinds, primary));
    lines.push(format!(
        "        fn {}({}) => {}({});",
        ENTRY_METHOD, params, MAPPER_FIELD, params
    ));
    lines.push("    }".to_string());
    lines.push("}".to_string());
    let text = lines.join("\n");

    SynthesizedUnit {
        namespace,
        class: CLASS_NAME.to_string(),
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::ValueKind;

    #[test]
    fn test_unit_layout() {
        let declarations = vec![Declaration {
            name: "twice".to_string(),
            arity: 2,
            source: "x => x * 2".to_string(),
        }];
        let signature = Signature::new([ValueKind::Object, ValueKind::Int], ValueKind::String);
        let unit = synthesize("(a, b) => twice(b)", &signature, &declarations);

        assert!(unit.namespace.starts_with("InMemory_"));
        assert_eq!(unit.class, "DynamicClass");

        let lines: Vec<&str> = unit.text.lines().map(str::trim).collect();
        assert_eq!(
            lines,
            vec![
                format!("namespace {} {{", unit.namespace).as_str(),
                "class DynamicClass {",
                "let _trace: Func<dynamic, string, dynamic> = (i, m) => i;",
                "fn trace(i) => _trace(i, \"\");",
                "fn trace(i, m) => _trace(i, m);",
                "let twice: Func<dynamic, dynamic> = x => x * 2;",
                "let mapper: Func<dynamic, int, string> = (a, b) => twice(b);",
                "fn execute(item0, item1) => mapper(item0, item1);",
                "}",
                "}",
            ]
        );
        assert_eq!(unit.hook_field(), format!("{}.DynamicClass._trace", unit.namespace));
        assert_eq!(unit.entry_point().method, "execute");
    }

    #[test]
    fn test_fresh_namespace_per_call() {
        let signature = Signature::<0>::dynamic();
        let a = synthesize("() => 1", &signature, &[]);
        let b = synthesize("() => 1", &signature, &[]);
        assert_ne!(a.namespace, b.namespace);
        assert!(a.text.contains("fn execute() => mapper();"));
    }
}
