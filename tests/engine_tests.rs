//! End-to-end tests for `Engine`: lambdas, support maps, the trace hook,
//! templates and literals

use std::sync::Arc;

use lucid::{
    CompileOptions, Engine, Error, Signature, SupportMap, Value, ValueKind,
};
use parking_lot::Mutex;

fn engine() -> Engine {
    Engine::default()
}

fn root_message(err: &Error) -> String {
    match err.root_cause() {
        Error::CompileFailure { diagnostics, .. } => diagnostics
            .iter()
            .map(|d| d.message.clone())
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

#[test]
fn test_simple_lambda() {
    let double = engine()
        .compile_lambda::<1>("(source) => source * 2", &CompileOptions::default())
        .unwrap();
    assert_eq!(double.apply(2).unwrap(), Value::Int(4));
    assert_eq!(double.apply(2.5).unwrap(), Value::Float(5.0));
}

#[test]
fn test_zero_and_two_argument_lambdas() {
    let engine = engine();
    let options = CompileOptions::default();

    let constant = engine.compile_lambda::<0>("() => 42", &options).unwrap();
    assert_eq!(constant.call([]).unwrap(), Value::Int(42));

    let product = engine
        .compile_lambda::<2>("(arg1, arg2) => arg1 * arg2", &options)
        .unwrap();
    assert_eq!(
        product.call([Value::Int(2), Value::Int(2)]).unwrap(),
        Value::Int(4)
    );
}

#[test]
fn test_support_multiply() {
    let options = CompileOptions::new()
        .with_support(SupportMap::new().with("multiply", "(a, b) => a * b"));
    let callable = engine()
        .compile_lambda::<1>("(v) => multiply(v, 5)", &options)
        .unwrap();
    assert_eq!(callable.apply(3).unwrap(), Value::Int(15));
}

#[test]
fn test_support_string_concatenation() {
    let options =
        CompileOptions::new().with_support(SupportMap::new().with("add", "(x, y) => x + y"));
    let callable = engine()
        .compile_lambda::<1>("(a) => add(a, \"B\")", &options)
        .unwrap();
    assert_eq!(callable.apply("A").unwrap(), Value::from("AB"));
}

#[test]
fn test_chained_support() {
    let options = CompileOptions::new().with_support(
        SupportMap::new()
            .with("multiplyBy2", "i => i * 2")
            .with("multiplyBy3", "i => i * 3"),
    );
    let callable = engine()
        .compile_lambda::<1>("(source) => multiplyBy3(multiplyBy2(source))", &options)
        .unwrap();
    assert_eq!(callable.apply(2).unwrap(), Value::Int(12));
}

#[test]
fn test_transitive_support() {
    // Only `quadruple` is named by the primary; `twice` is pulled in through it
    let options = CompileOptions::new().with_support(
        SupportMap::new()
            .with("twice", "i => i * 2")
            .with("quadruple", "i => twice(twice(i))")
            .with("unused", "i => missing(i)"),
    );
    let callable = engine()
        .compile_lambda::<1>("x => quadruple(x) + 1", &options)
        .unwrap();
    assert_eq!(callable.apply(3).unwrap(), Value::Int(13));
}

#[test]
fn test_trace_hook_observes_value() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let options = CompileOptions::new().with_hook(move |value: &Value, _: &str| {
        sink.lock().push(value.clone());
        value.clone()
    });

    let callable = engine()
        .compile_lambda::<1>("(source) => trace(source) * 2", &options)
        .unwrap();
    assert_eq!(callable.apply(2).unwrap(), Value::Int(4));
    assert_eq!(seen.lock().as_slice(), [Value::Int(2)]);
}

#[test]
fn test_trace_hook_receives_message() {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();
    let options = CompileOptions::new().with_hook(move |value: &Value, message: &str| {
        sink.lock().push(message.to_string());
        value.clone()
    });

    let callable = engine()
        .compile_lambda::<1>("(source) => trace(source, \"Message\")", &options)
        .unwrap();
    assert_eq!(callable.apply(7).unwrap(), Value::Int(7));
    assert_eq!(messages.lock().as_slice(), ["Message".to_string()]);
}

#[test]
fn test_trace_hook_replaces_value() {
    let options = CompileOptions::new().with_hook(|value: &Value, _: &str| match value {
        Value::Int(n) => Value::Int(n + 100),
        other => other.clone(),
    });
    let callable = engine()
        .compile_lambda::<1>("x => trace(x) + 1", &options)
        .unwrap();
    assert_eq!(callable.apply(1).unwrap(), Value::Int(102));
}

#[test]
fn test_trace_without_hook_is_identity() {
    let callable = engine()
        .compile_lambda::<1>("x => trace(x, \"ignored\") + 1", &CompileOptions::default())
        .unwrap();
    assert_eq!(callable.apply(1).unwrap(), Value::Int(2));
}

#[test]
fn test_support_can_trace() {
    let count = Arc::new(Mutex::new(0usize));
    let sink = count.clone();
    let options = CompileOptions::new()
        .with_support(SupportMap::new().with("inc", "i => trace(i + 1, \"inc\")"))
        .with_hook(move |value: &Value, _: &str| {
            *sink.lock() += 1;
            value.clone()
        });
    let callable = engine()
        .compile_lambda::<1>("x => inc(inc(x))", &options)
        .unwrap();
    assert_eq!(callable.apply(0).unwrap(), Value::Int(2));
    assert_eq!(*count.lock(), 2);
}

#[test]
fn test_block_body_with_locals() {
    let callable = engine()
        .compile_lambda::<2>(
            "(a, b) => { var sum = a + b; if (sum > 10) { return \"big\"; } return sum; }",
            &CompileOptions::default(),
        )
        .unwrap();
    assert_eq!(
        callable.call([Value::Int(1), Value::Int(2)]).unwrap(),
        Value::Int(3)
    );
    assert_eq!(
        callable.call([Value::Int(10), Value::Int(2)]).unwrap(),
        Value::from("big")
    );
}

#[test]
fn test_record_input() {
    let callable = engine()
        .compile_lambda::<1>("p => p.first + \" \" + p.last", &CompileOptions::default())
        .unwrap();
    let person = Value::record([("first", Value::from("Ada")), ("last", Value::from("Lovelace"))]);
    assert_eq!(callable.apply(person).unwrap(), Value::from("Ada Lovelace"));
}

#[test]
fn test_native_references() {
    let callable = engine()
        .compile_lambda::<2>("(a, b) => Math.Max(a, b) + Math.Abs(-1)", &CompileOptions::default())
        .unwrap();
    assert_eq!(
        callable.call([Value::Int(3), Value::Int(9)]).unwrap(),
        Value::Int(10)
    );
}

#[test]
fn test_typed_signature_coerces() {
    let signature = Signature::new([ValueKind::Int], ValueKind::Float);
    let callable = engine()
        .compile_lambda_with::<1>("x => x + 1", signature, &CompileOptions::default())
        .unwrap();
    assert_eq!(callable.apply(1).unwrap(), Value::Float(2.0));
    assert!(matches!(callable.apply("1"), Err(Error::TypeError { .. })));
}

#[test]
fn test_undefined_name_is_compile_failure() {
    let err = engine()
        .compile_lambda::<1>("x => undefinedThing(x)", &CompileOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::CompileFailure { .. }));
    assert_eq!(
        root_message(&err),
        "The name 'undefinedThing' does not exist in the current context"
    );
}

#[test]
fn test_lambda_arity_mismatch_is_compile_failure() {
    let err = engine()
        .compile_lambda::<1>("(a, b) => a * b", &CompileOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::CompileFailure { .. }));
}

#[test]
fn test_support_arity_mismatch_is_compile_failure() {
    let options = CompileOptions::new()
        .with_support(SupportMap::new().with("multiply", "(a, b) => a * b"));
    let err = engine()
        .compile_lambda::<1>("v => multiply(v)", &options)
        .unwrap_err();
    assert!(root_message(&err).contains("does not take 1 arguments"));
}

#[test]
fn test_syntax_error_is_compile_failure() {
    let err = engine()
        .compile_lambda::<1>("(a => a +", &CompileOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::CompileFailure { .. }));
}

#[test]
fn test_reserved_support_name() {
    let options = CompileOptions::new().with_support(SupportMap::new().with("trace", "x => x"));
    let err = engine()
        .compile_lambda::<1>("x => trace(x)", &options)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSupport { ref name, .. } if name == "trace"));
}

#[test]
fn test_runtime_errors_propagate() {
    let callable = engine()
        .compile_lambda::<1>("x => 10 / x", &CompileOptions::default())
        .unwrap();
    assert_eq!(callable.apply(2).unwrap(), Value::Int(5));
    assert!(matches!(callable.apply(0), Err(Error::DivisionByZero)));
}

#[test]
fn test_callables_are_independent() {
    let engine = engine();
    let options = CompileOptions::default();
    let a = engine.compile_lambda::<1>("x => x + 1", &options).unwrap();
    let b = engine.compile_lambda::<1>("x => x + 2", &options).unwrap();
    assert_eq!(a.apply(1).unwrap(), Value::Int(2));
    assert_eq!(b.apply(1).unwrap(), Value::Int(3));
}

#[test]
fn test_callable_across_threads() {
    let callable = engine()
        .compile_lambda::<1>("x => x * x", &CompileOptions::default())
        .unwrap();
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let callable = callable.clone();
            std::thread::spawn(move || callable.apply(n as i64).unwrap())
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        results,
        vec![Value::Int(0), Value::Int(1), Value::Int(4), Value::Int(9)]
    );
}

#[test]
fn test_returned_closure_keeps_module_loaded() {
    let adder = engine()
        .compile_lambda::<1>("n => x => x + n", &CompileOptions::default())
        .unwrap()
        .apply(5)
        .unwrap();
    assert_eq!(adder.call(vec![Value::Int(1)]).unwrap(), Value::Int(6));
}

#[test]
fn test_nested_closure_after_unload() {
    let maker = engine()
        .compile_lambda::<1>("n => new { add = x => x + n }", &CompileOptions::default())
        .unwrap();
    let add = maker.apply(5).unwrap().get_field("add").unwrap();
    assert_eq!(add.call(vec![Value::Int(1)]).unwrap(), Value::Int(6));

    drop(maker);
    assert!(matches!(
        add.call(vec![Value::Int(1)]),
        Err(Error::ModuleUnloaded { .. })
    ));
}

#[test]
fn test_three_and_four_argument_lambdas() {
    let engine = engine();
    let options = CompileOptions::default();

    let three = engine
        .compile_lambda::<3>("(a, b, c) => a + b * c", &options)
        .unwrap();
    assert_eq!(
        three.call([Value::Int(1), Value::Int(2), Value::Int(3)]).unwrap(),
        Value::Int(7)
    );

    let four = engine
        .compile_lambda::<4>("(a, b, c, d) => a + b + c + d", &options)
        .unwrap();
    assert_eq!(
        four.call([Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)])
            .unwrap(),
        Value::Int(10)
    );
    assert_eq!(four.arity(), 4);
}

#[test]
fn test_undefined_name_inside_support_is_compile_failure() {
    let options =
        CompileOptions::new().with_support(SupportMap::new().with("helper", "x => missingFn(x)"));
    let err = engine()
        .compile_lambda::<1>("v => helper(v)", &options)
        .unwrap_err();
    assert!(matches!(err, Error::CompileFailure { .. }));
    assert_eq!(
        root_message(&err),
        "The name 'missingFn' does not exist in the current context"
    );
}

#[test]
fn test_support_name_inside_unrelated_identifier() {
    // `add` occurs in `address`, so it is declared without being called
    let options =
        CompileOptions::new().with_support(SupportMap::new().with("add", "(x, y) => x + y"));
    let callable = engine()
        .compile_lambda::<1>("v => v.address", &options)
        .unwrap();
    let customer = Value::record([("address", Value::from("X"))]);
    assert_eq!(callable.apply(customer).unwrap(), Value::from("X"));
}

#[test]
fn test_deeply_nested_input_is_compile_failure() {
    let source = format!("x => {}x{}", "(".repeat(1000), ")".repeat(1000));
    let err = engine()
        .compile_lambda::<1>(&source, &CompileOptions::default())
        .unwrap_err();
    assert!(root_message(&err).contains("nested too deeply"));

    let nested = format!("x => {}x{}", "(".repeat(50), ")".repeat(50));
    let callable = engine()
        .compile_lambda::<1>(&nested, &CompileOptions::default())
        .unwrap();
    assert_eq!(callable.apply(3).unwrap(), Value::Int(3));
}

#[test]
fn test_typed_lambda_parameters() {
    let callable = engine()
        .compile_lambda::<2>("(int a, b) => a + b", &CompileOptions::default())
        .unwrap();
    assert_eq!(
        callable.call([Value::Int(1), Value::from("x")]).unwrap(),
        Value::from("1x")
    );
    assert!(matches!(
        callable.call([Value::from("1"), Value::Int(2)]),
        Err(Error::TypeError { .. })
    ));

    let widened = engine()
        .compile_lambda::<1>("(double d) => d / 2", &CompileOptions::default())
        .unwrap();
    assert_eq!(widened.apply(3).unwrap(), Value::Float(1.5));

    let err = engine()
        .compile_lambda::<1>("(money m) => m", &CompileOptions::default())
        .unwrap_err();
    assert_eq!(
        root_message(&err),
        "The type or namespace name 'money' could not be found"
    );
}
