use color::{resolve, Options, Resolver};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn uncached(c: &mut Criterion) {
    let options = Options::default();

    for value in [
        "rebeccapurple",
        "rgb(from #123456 calc(r * 2) g b / 0.5)",
        "color-mix(in oklch longer hue, lab(50 20 -30), color(display-p3 1 0 0) 30%)",
    ] {
        c.bench_function(value, |b| b.iter(|| resolve(black_box(value), &options)));
    }
}

fn cached(c: &mut Criterion) {
    let resolver = Resolver::new();
    let options = Options::default();
    let value = "color-mix(in oklab, red, blue)";

    c.bench_function("cached color-mix", |b| {
        b.iter(|| resolver.resolve(black_box(value), &options))
    });
}

criterion_group!(benches, uncached, cached);
criterion_main!(benches);
