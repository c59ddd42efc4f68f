use cookievault::repository::{CookieJar, CookieRepository};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use url::Url;

fn benchmark_save(c: &mut Criterion) {
    let jar = CookieRepository::open_in_memory().unwrap();
    let url = Url::parse("https://example.com").unwrap();

    c.bench_function("cookie_save_set_cookie", |b| {
        b.iter(|| {
            jar.save_set_cookie(black_box(&url), black_box("foo=bar; Path=/; Secure"))
                .unwrap();
        })
    });
}

fn benchmark_load(c: &mut Criterion) {
    let jar = CookieRepository::open_in_memory().unwrap();
    let url = Url::parse("https://example.com/foo/bar").unwrap();
    // Pre-populate.
    for i in 0..100 {
        jar.save_set_cookie(&url, &format!("cookie{}=val; Path=/foo", i)).unwrap();
    }

    c.bench_function("cookie_load_for_request", |b| {
        b.iter(|| {
            black_box(jar.load_for_request(black_box(&url)).unwrap());
        })
    });
}

criterion_group!(benches, benchmark_save, benchmark_load);
criterion_main!(benches);
