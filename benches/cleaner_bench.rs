use criterion::{black_box, criterion_group, criterion_main, Criterion};
use event_sanitizer::{Cleaner, Event, HeaderPolicy, PolicyConfig, Request};
use serde_json::{json, Map};

fn policy() -> PolicyConfig {
    let mut policy = PolicyConfig::new();
    policy
        .set_fields(["password", "token", "secret", "api_key", "ssn"])
        .unwrap();
    policy
        .set_http_headers(HeaderPolicy::Names(vec!["Cookie".into(), "X-Api-Key".into()]))
        .unwrap();
    policy.set_cookies(true);
    policy.set_query_string(true);
    policy
}

fn request_event() -> Event {
    let items: Vec<_> = (0..50)
        .map(|i| json!({"id": i, "name": format!("item-{}", i), "token": "abc", "tags": ["a", "b"]}))
        .collect();

    let mut extra = Map::new();
    extra.insert("user".into(), json!({"email": "me@example.com", "password": "hunter2"}));
    extra.insert("items".into(), json!(items.clone()));

    Event::new()
        .with_request(Request {
            url: Some("https://example.com/login".into()),
            method: Some("POST".into()),
            data: Some(json!({"form": {"username": "me", "password": "hunter2"}, "items": items})),
            query_string: Some(json!("page=2&token=abc&sort=asc&api_key=xyz")),
            cookies: Some(json!({"session": "abc", "csrf": "def"})),
            headers: Some(json!({
                "Authorization": "Bearer abc",
                "Content-Type": "application/json",
                "X-Api-Key": "xyz",
                "User-Agent": "bench"
            })),
        })
        .with_extra(extra)
}

fn bench_cleaner(c: &mut Criterion) {
    let cleaner = Cleaner::new(&policy()).unwrap();
    let event = request_event();
    let value = serde_json::to_value(&event).unwrap();

    c.bench_function("apply_event", |b| {
        b.iter(|| cleaner.apply_event(black_box(event.clone())))
    });

    c.bench_function("apply_value", |b| {
        b.iter(|| cleaner.apply_value(black_box(value.clone())))
    });

    c.bench_function("compile_policy", |b| {
        let policy = policy();
        b.iter(|| Cleaner::new(black_box(&policy)).unwrap())
    });
}

criterion_group!(benches, bench_cleaner);
criterion_main!(benches);
