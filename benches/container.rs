#![allow(dead_code)]

use beanery::{cond, Container, Inject, InstantiateErrorKind, Selector};
use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

struct A(Arc<B>, Arc<C>);
struct B(i32);
struct C(Arc<CA>);
struct CA(Arc<CAA>);
struct CAA(Arc<CAAA>);
struct CAAA(Arc<CAAAA>);
struct CAAAA(Arc<CAAAAA>);
struct CAAAAA;

struct Optional;

#[inline]
fn container_with_chain() -> Container {
    let mut container = Container::new();
    container.property("optional.enabled", true);
    container.provide(|Inject(b): Inject<B>, Inject(c): Inject<C>| Ok::<_, InstantiateErrorKind>(A(b, c)));
    container.provide(|| Ok::<_, InstantiateErrorKind>(B(2)));
    container.provide(|Inject(ca): Inject<CA>| Ok::<_, InstantiateErrorKind>(C(ca)));
    container.provide(|Inject(caa): Inject<CAA>| Ok::<_, InstantiateErrorKind>(CA(caa)));
    container.provide(|Inject(caaa): Inject<CAAA>| Ok::<_, InstantiateErrorKind>(CAA(caaa)));
    container.provide(|Inject(caaaa): Inject<CAAAA>| Ok::<_, InstantiateErrorKind>(CAAA(caaaa)));
    container.provide(|Inject(caaaaa): Inject<CAAAAA>| Ok::<_, InstantiateErrorKind>(CAAAA(caaaaa)));
    container.provide(|| Ok::<_, InstantiateErrorKind>(CAAAAA)).destroy(|_| Ok(()));
    container
        .object(Optional)
        .on(cond::on_property_value("optional.enabled", "true"))
        .on(cond::on_bean(Selector::of::<A>()));
    container
}

#[inline]
fn container_refresh() {
    let mut container = container_with_chain();
    container.refresh().unwrap();
}

#[inline]
fn container_get(container: &Container) {
    let _ = container.get::<A>().unwrap();
}

#[inline]
fn container_find(container: &Container) {
    let _ = container.find("CA:").unwrap();
}

#[inline]
fn container_close() {
    let mut container = container_with_chain();
    container.refresh().unwrap();
    container.spawn(|token| while !token.is_cancelled() {});
    container.close();
}

fn container_benchmark(c: &mut Criterion) {
    let mut container = container_with_chain();
    container.refresh().unwrap();

    c.bench_function("container_refresh", |b| b.iter(container_refresh))
        .bench_function("container_get", |b| b.iter(|| container_get(&container)))
        .bench_function("container_find", |b| b.iter(|| container_find(&container)))
        .bench_function("container_close", |b| b.iter(container_close));
}

criterion_group!(benches, container_benchmark);
criterion_main!(benches);
