use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lattice_core::{Function, Public, Type, TypeBuilder, Value};

fn noop() -> Function {
    Function::free(|_| Ok(Value::Undefined))
}

fn chain(depth: usize) -> Type {
    let mut ty = TypeBuilder::new("Level0")
        .member("Step", Public::virtual_fn(noop()))
        .member("Count", Public::member(0))
        .build()
        .unwrap();
    for i in 1..depth {
        ty = TypeBuilder::new(format!("Level{}", i))
            .base(&ty)
            .member("Step", Public::override_fn(noop()))
            .build()
            .unwrap();
    }
    ty
}

fn diamond() -> Type {
    let v = TypeBuilder::new("V")
        .member("Shared", Public::member(0))
        .member("Touch", Public::virtual_fn(noop()))
        .build()
        .unwrap();
    let l = TypeBuilder::new("L")
        .virtual_base(&v)
        .member("Touch", Public::override_fn(noop()))
        .build()
        .unwrap();
    let r = TypeBuilder::new("R").virtual_base(&v).build().unwrap();
    TypeBuilder::new("D").base(&l).base(&r).build().unwrap()
}

fn bench_definition(c: &mut Criterion) {
    let mut group = c.benchmark_group("define");

    for depth in [2usize, 8, 32] {
        group.bench_with_input(BenchmarkId::new("override_chain", depth), &depth, |b, &depth| {
            b.iter(|| chain(black_box(depth)));
        });
    }

    group.bench_function("virtual_diamond", |b| {
        b.iter(diamond);
    });

    group.finish();
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construct");

    let d = diamond();
    group.bench_function("virtual_diamond", |b| {
        b.iter(|| d.construct(&[]).unwrap());
    });

    let deep = chain(16);
    group.bench_function("override_chain_16", |b| {
        b.iter(|| deep.construct(&[]).unwrap());
    });

    let obj = deep.construct(&[]).unwrap();
    group.bench_function("call_overridden", |b| {
        b.iter(|| obj.call(black_box("Step"), &[]).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_definition, bench_construction);
criterion_main!(benches);
