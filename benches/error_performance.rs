// benches/error_performance.rs
//! Benchmarks for modern_errors hot paths
//!
//! Covers construction, cause merging, normalization, method dispatch and
//! the log/serialization views.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use modern_errors::{
    ClassOptions, ErrorClass, ForeignError, GlobalOptions, InstanceOptions, MethodOutput, Plugin,
    Thrown, modern_errors, to_plain_object,
};
use serde_json::json;

fn classes() -> (ErrorClass, ErrorClass) {
    let echo = Plugin::builder("echo")
        .get_options(|raw, _full| Ok(raw.clone()))
        .is_options(serde_json::Value::is_object)
        .instance_method("echo", |info, _args| Ok(MethodOutput::from(info.options().clone())))
        .build();
    let any_error = ErrorClass::any_error(GlobalOptions::new().plugin(echo)).expect("hierarchy");
    any_error
        .subclass("UnknownError", ClassOptions::new())
        .expect("UnknownError");
    let input = any_error
        .subclass(
            "InputError",
            ClassOptions::new().option("echo", json!({ "level": 1 })),
        )
        .expect("InputError");
    (any_error, input)
}

// ============================================================================
// Construction
// ============================================================================

fn bench_create_simple(c: &mut Criterion) {
    let (_, input) = classes();
    c.bench_function("create_simple_error", |b| {
        b.iter(|| black_box(input.create("invalid input", InstanceOptions::new())))
    });
}

fn bench_create_with_props(c: &mut Criterion) {
    let (_, input) = classes();
    c.bench_function("create_error_with_props", |b| {
        b.iter(|| {
            black_box(input.create(
                "invalid input",
                InstanceOptions::new().props(json!({ "path": "/tmp/file", "line": 42 })),
            ))
        })
    });
}

fn bench_create_with_cause(c: &mut Criterion) {
    let (_, input) = classes();
    let mut group = c.benchmark_group("create_with_cause");

    let instance = input.create("inner", InstanceOptions::new()).expect("cause");
    let causes = [
        ("value", Thrown::from("inner")),
        ("foreign", Thrown::from(ForeignError::new("TypeError", "inner"))),
        ("instance", Thrown::from(instance)),
    ];
    for (label, cause) in causes {
        group.bench_with_input(BenchmarkId::from_parameter(label), &cause, |b, cause| {
            b.iter(|| {
                black_box(input.create("outer", InstanceOptions::new().cause(cause.clone())))
            })
        });
    }
    group.finish();
}

fn bench_create_aggregate(c: &mut Criterion) {
    let (_, input) = classes();
    let mut group = c.benchmark_group("create_aggregate");
    for count in [1usize, 8, 64] {
        let errors: Vec<Thrown> = (0..count).map(|i| Thrown::from(format!("error {i}"))).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &errors, |b, errors| {
            b.iter(|| {
                black_box(input.create("outer", InstanceOptions::new().errors(errors.clone())))
            })
        });
    }
    group.finish();
}

// ============================================================================
// Normalization
// ============================================================================

fn bench_normalize(c: &mut Criterion) {
    let (any_error, input) = classes();
    let known = input.create("known", InstanceOptions::new()).expect("known");
    let mut group = c.benchmark_group("normalize");

    group.bench_function("known_instance", |b| {
        b.iter(|| black_box(any_error.normalize(known.clone())))
    });
    group.bench_function("string_value", |b| {
        b.iter(|| black_box(any_error.normalize("boom")))
    });
    group.bench_function("foreign_chain", |b| {
        b.iter(|| {
            let foreign = ForeignError::new("Error", "outer")
                .with_cause(ForeignError::new("Error", "middle").with_cause("inner"));
            black_box(any_error.normalize(foreign))
        })
    });
    group.finish();
}

fn bench_error_handler(c: &mut Criterion) {
    let errors = modern_errors(
        ["InputError"],
        GlobalOptions::new().bugs_url("https://example.com/bugs"),
    )
    .expect("classes");
    c.bench_function("error_handler_foreign", |b| {
        b.iter(|| black_box(errors.error_handler(ForeignError::new("Error", "boom"))))
    });
}

// ============================================================================
// Dispatch and views
// ============================================================================

fn bench_method_dispatch(c: &mut Criterion) {
    let (_, input) = classes();
    let error = input.create("test", InstanceOptions::new()).expect("error");
    let mut group = c.benchmark_group("method_dispatch");

    group.bench_function("instance_method", |b| {
        b.iter(|| black_box(error.call("echo", vec![])))
    });
    group.bench_function("instance_method_with_options", |b| {
        b.iter(|| black_box(error.call("echo", vec![json!({ "level": 2 })])))
    });
    group.finish();
}

fn bench_views(c: &mut Criterion) {
    let (_, input) = classes();
    let error = input
        .create(
            "x".repeat(4096),
            InstanceOptions::new().props(json!({ "path": "/tmp/file" })),
        )
        .expect("error");
    let mut group = c.benchmark_group("views");

    group.bench_function("log_write_truncated", |b| {
        b.iter(|| {
            let mut buffer = String::with_capacity(1200);
            error.log().write_to(&mut buffer).expect("write");
            black_box(buffer)
        })
    });
    group.bench_function("to_plain_object", |b| {
        b.iter(|| black_box(to_plain_object(&error)))
    });
    group.finish();
}

criterion_group!(
    creation_benches,
    bench_create_simple,
    bench_create_with_props,
    bench_create_with_cause,
    bench_create_aggregate,
);

criterion_group!(normalization_benches, bench_normalize, bench_error_handler);

criterion_group!(dispatch_benches, bench_method_dispatch, bench_views);

criterion_main!(creation_benches, normalization_benches, dispatch_benches);
