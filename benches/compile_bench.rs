use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lucid::{reformat, CompileOptions, Engine, Scanner, SupportMap, Value};

fn lexer_benchmark(c: &mut Criterion) {
    let source = "(order, rate) => { var total = order.qty * order.price; return total * (1 + rate); }";

    c.bench_function("tokenize block lambda", |b| {
        b.iter(|| {
            let mut scanner = Scanner::new(black_box(source));
            scanner.scan_tokens().unwrap()
        })
    });

    c.bench_function("reformat lambda", |b| {
        b.iter(|| reformat(black_box(source)).unwrap())
    });
}

fn compile_benchmark(c: &mut Criterion) {
    let engine = Engine::default();
    let options = CompileOptions::new().with_support(
        SupportMap::new()
            .with("multiplyBy2", "i => i * 2")
            .with("multiplyBy3", "i => i * 3"),
    );

    c.bench_function("compile lambda with support", |b| {
        b.iter(|| {
            engine
                .compile_lambda::<1>(black_box("(source) => multiplyBy3(multiplyBy2(source))"), &options)
                .unwrap()
        })
    });

    c.bench_function("compile template", |b| {
        b.iter(|| engine.compile_template(black_box("{first} {last}")).unwrap())
    });
}

fn invoke_benchmark(c: &mut Criterion) {
    let engine = Engine::default();
    let callable = engine
        .compile_lambda::<1>("p => p.first + \" \" + p.last", &CompileOptions::default())
        .unwrap();
    let person = Value::record([("first", Value::from("Ada")), ("last", Value::from("Lovelace"))]);

    c.bench_function("invoke compiled lambda", |b| {
        b.iter(|| callable.apply(black_box(person.clone())).unwrap())
    });
}

criterion_group!(benches, lexer_benchmark, compile_benchmark, invoke_benchmark);
criterion_main!(benches);
