//! Sensitive value masking for events and breadcrumbs.
//!
//! A [`Cleaner`] is built from a [`PolicyConfig`] and rewrites:
//! - `request.data` and `extra` by field name, recursively
//! - `request.headers` by header name
//! - `request.cookies` wholesale
//! - `request.query_string` by the key of each `key=value` pair
//!
//! Values of an unexpected shape are returned unchanged. Masking never
//! fails, so an event is never dropped because of its contents.

use serde_json::{Map, Value};

use crate::config::policy::{HeaderPolicy, PolicyConfig};
use crate::error::{Result, ValidationError};
use crate::event::models::{Breadcrumb, Event, Request};
use crate::hooks::chain::ExtensionPoint;
use crate::logging::structured::LogContext;
use crate::security::patterns::{SensitivePattern, DEFAULT_SENSITIVE_HEADERS};
use crate::security::query_string::mask_query;
use crate::{log_debug, log_warn};

/// Nesting deeper than this is replaced by the mask as a whole.
pub const MAX_DEPTH: usize = 128;

/// Keys an untyped request may carry its query string under.
const QUERY_STRING_KEYS: &[&str] = &["query_string", "queryString"];

/// Counts of what a single cleaning pass masked.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MaskStats {
    pub fields_masked: usize,
    pub headers_masked: usize,
    pub cookies_masked: usize,
    pub query_values_masked: usize,
    pub depth_limited: usize,
}

impl MaskStats {
    pub fn total(&self) -> usize {
        self.fields_masked
            + self.headers_masked
            + self.cookies_masked
            + self.query_values_masked
            + self.depth_limited
    }
}

#[derive(Debug, Clone)]
enum HeaderMatcher {
    All,
    Named(SensitivePattern),
}

/// Masks sensitive values according to one policy.
///
/// Matchers are compiled once here; the cleaner holds no other state and
/// can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct Cleaner {
    fields: Option<SensitivePattern>,
    headers: HeaderMatcher,
    cookies: bool,
    query_string: bool,
    mask: String,
    breadcrumb_json_data_fields: Vec<String>,
}

impl Cleaner {
    pub fn new(config: &PolicyConfig) -> Result<Self> {
        let fields = SensitivePattern::compile(config.fields()).map_err(|source| {
            ValidationError::InvalidPattern {
                option: "fields",
                pattern: config.fields().join("|"),
                source,
            }
        })?;

        // Configured names extend the defaults rather than replacing them.
        let headers = match config.http_headers() {
            Some(HeaderPolicy::All) => HeaderMatcher::All,
            Some(HeaderPolicy::Names(names)) => {
                let union: Vec<&str> = DEFAULT_SENSITIVE_HEADERS
                    .iter()
                    .copied()
                    .chain(names.iter().map(String::as_str))
                    .collect();
                let pattern = SensitivePattern::compile(&union)
                    .map_err(|source| ValidationError::InvalidPattern {
                        option: "http_headers",
                        pattern: union.join("|"),
                        source,
                    })?
                    .unwrap_or_else(SensitivePattern::default_headers);
                HeaderMatcher::Named(pattern)
            }
            Some(HeaderPolicy::DefaultsOnly) | None => {
                HeaderMatcher::Named(SensitivePattern::default_headers())
            }
        };

        Ok(Self {
            fields,
            headers,
            cookies: config.cookies(),
            query_string: config.query_string(),
            mask: config.mask().to_string(),
            breadcrumb_json_data_fields: config.breadcrumb_json_data_fields().to_vec(),
        })
    }

    /// Check a key against the sensitive field names.
    pub fn is_sensitive_field(&self, key: &str) -> bool {
        self.fields.as_ref().map_or(false, |p| p.is_match(key))
    }

    /// Clean a typed event: its request section and `extra`.
    pub fn apply_event(&self, mut event: Event) -> Event {
        let ctx = LogContext::for_event(&event);
        let mut stats = MaskStats::default();

        if let Some(request) = event.request.as_mut() {
            self.clean_request(request, &mut stats);
        }
        self.mask_entries(&mut event.extra, 0, &mut stats);

        log_stats(&ctx, &stats);
        event
    }

    /// Clean an untyped event: an object with `request` and `extra` entries.
    ///
    /// Anything that is not an object is returned unchanged.
    pub fn apply_value(&self, value: Value) -> Value {
        self.apply_value_with_stats(value).0
    }

    pub fn apply_value_with_stats(&self, mut value: Value) -> (Value, MaskStats) {
        let stats = self.clean_event_value(&mut value);
        (value, stats)
    }

    /// Clean an untyped event the caller already owns mutably.
    pub fn apply_in_place(&self, value: &mut Value) {
        self.clean_event_value(value);
    }

    /// Clean a breadcrumb's `data`.
    ///
    /// Configured JSON data fields are decoded, masked, and re-encoded first;
    /// then `data` as a whole is masked by field name.
    pub fn apply_breadcrumb(&self, mut breadcrumb: Breadcrumb) -> Breadcrumb {
        let ctx = LogContext::new(ExtensionPoint::BeforeBreadcrumb);
        let mut stats = MaskStats::default();

        if let Some(data) = breadcrumb.data.as_mut() {
            self.clean_breadcrumb_data(data, &mut stats);
        }

        log_stats(&ctx, &stats);
        breadcrumb
    }

    /// Mask a mapping by field name, recursively.
    ///
    /// Identity when no fields are configured or `value` is not an object.
    /// Otherwise unmatched data comes back unchanged with one exception: a
    /// subtree nested deeper than [`MAX_DEPTH`] is replaced by the mask
    /// whether or not any key in it matches, and a warning is logged.
    pub fn mask_fields(&self, mut value: Value) -> Value {
        self.mask_fields_in_place(&mut value, &mut MaskStats::default());
        value
    }

    /// Mask header values according to the header policy.
    pub fn mask_headers(&self, mut value: Value) -> Value {
        self.mask_headers_in_place(&mut value, &mut MaskStats::default());
        value
    }

    /// Mask every cookie value when cookie masking is on.
    pub fn mask_cookies(&self, mut value: Value) -> Value {
        self.mask_cookies_in_place(&mut value, &mut MaskStats::default());
        value
    }

    /// Mask sensitive values in a query string when query string masking is on.
    pub fn mask_query_string(&self, mut value: Value) -> Value {
        self.mask_query_string_in_place(&mut value, &mut MaskStats::default());
        value
    }

    fn clean_event_value(&self, value: &mut Value) -> MaskStats {
        let mut stats = MaskStats::default();
        let Value::Object(event) = value else {
            log::debug!("SANITIZE_SKIP reason=not_an_object");
            return stats;
        };

        let ctx = LogContext::for_event_value(event);

        if let Some(Value::Object(request)) = event.get_mut("request") {
            if let Some(data) = request.get_mut("data") {
                self.mask_fields_in_place(data, &mut stats);
            }
            if let Some(headers) = request.get_mut("headers") {
                self.mask_headers_in_place(headers, &mut stats);
            }
            if let Some(cookies) = request.get_mut("cookies") {
                self.mask_cookies_in_place(cookies, &mut stats);
            }
            for key in QUERY_STRING_KEYS {
                if let Some(query) = request.get_mut(*key) {
                    self.mask_query_string_in_place(query, &mut stats);
                }
            }
        }
        if let Some(extra) = event.get_mut("extra") {
            self.mask_fields_in_place(extra, &mut stats);
        }

        log_stats(&ctx, &stats);
        stats
    }

    fn clean_request(&self, request: &mut Request, stats: &mut MaskStats) {
        if let Some(data) = request.data.as_mut() {
            self.mask_fields_in_place(data, stats);
        }
        if let Some(headers) = request.headers.as_mut() {
            self.mask_headers_in_place(headers, stats);
        }
        if let Some(cookies) = request.cookies.as_mut() {
            self.mask_cookies_in_place(cookies, stats);
        }
        if let Some(query) = request.query_string.as_mut() {
            self.mask_query_string_in_place(query, stats);
        }
    }

    fn clean_breadcrumb_data(&self, data: &mut Value, stats: &mut MaskStats) {
        if let Value::Object(entries) = &mut *data {
            for name in &self.breadcrumb_json_data_fields {
                if let Some(Value::String(raw)) = entries.get_mut(name) {
                    self.mask_embedded_json(raw, stats);
                }
            }
        }
        self.mask_fields_in_place(data, stats);
    }

    /// Rewrite a JSON document held in a string. Unparseable text, or a
    /// document with nothing to mask, is left byte-for-byte as it was.
    fn mask_embedded_json(&self, raw: &mut String, stats: &mut MaskStats) {
        let Ok(mut parsed) = serde_json::from_str::<Value>(raw.as_str()) else {
            return;
        };

        let before = stats.total();
        self.mask_fields_in_place(&mut parsed, stats);
        if stats.total() == before {
            return;
        }

        if let Ok(encoded) = serde_json::to_string(&parsed) {
            *raw = encoded;
        }
    }

    fn mask_fields_in_place(&self, value: &mut Value, stats: &mut MaskStats) {
        if self.fields.is_none() {
            return;
        }
        if let Value::Object(entries) = value {
            self.mask_entries(entries, 0, stats);
        }
    }

    fn mask_entries(&self, entries: &mut Map<String, Value>, depth: usize, stats: &mut MaskStats) {
        if self.fields.is_none() {
            return;
        }
        for (key, value) in entries.iter_mut() {
            self.mask_value(value, Some(key.as_str()), depth + 1, stats);
        }
    }

    /// Mask one value in the context of the key it sits under.
    ///
    /// A sensitive key replaces a whole object or a string. Arrays pass the
    /// key down to their elements, so strings and objects inside an array
    /// under a sensitive key are masked one by one while other scalars stay.
    fn mask_value(&self, value: &mut Value, key: Option<&str>, depth: usize, stats: &mut MaskStats) {
        if depth > MAX_DEPTH {
            log::warn!("DEPTH_LIMIT_EXCEEDED limit={}", MAX_DEPTH);
            *value = Value::String(self.mask.clone());
            stats.depth_limited += 1;
            return;
        }

        let sensitive = key.map_or(false, |k| self.is_sensitive_field(k));

        match value {
            Value::Object(_) | Value::String(_) if sensitive => {
                *value = Value::String(self.mask.clone());
                stats.fields_masked += 1;
            }
            Value::Object(entries) => {
                for (child_key, child) in entries.iter_mut() {
                    self.mask_value(child, Some(child_key.as_str()), depth + 1, stats);
                }
            }
            Value::Array(items) => {
                for item in items.iter_mut() {
                    self.mask_value(item, key, depth + 1, stats);
                }
            }
            _ => {}
        }
    }

    fn mask_headers_in_place(&self, value: &mut Value, stats: &mut MaskStats) {
        let Value::Object(headers) = value else {
            return;
        };

        for (name, header) in headers.iter_mut() {
            let masked = match &self.headers {
                HeaderMatcher::All => true,
                HeaderMatcher::Named(pattern) => pattern.is_match(name),
            };
            if masked {
                *header = Value::String(self.mask.clone());
                stats.headers_masked += 1;
            }
        }
    }

    fn mask_cookies_in_place(&self, value: &mut Value, stats: &mut MaskStats) {
        if !self.cookies {
            return;
        }
        let Value::Object(cookies) = value else {
            return;
        };

        for cookie in cookies.values_mut() {
            *cookie = Value::String(self.mask.clone());
            stats.cookies_masked += 1;
        }
    }

    fn mask_query_string_in_place(&self, value: &mut Value, stats: &mut MaskStats) {
        if !self.query_string {
            return;
        }
        let Value::String(query) = value else {
            return;
        };

        let (masked, count) = mask_query(query.as_str(), self.fields.as_ref(), &self.mask);
        if count > 0 {
            *query = masked;
            stats.query_values_masked += count;
        }
    }
}

fn log_stats(ctx: &LogContext, stats: &MaskStats) {
    if stats.depth_limited > 0 {
        log_warn!(ctx, "SANITIZE_DEPTH_LIMITED", subtrees = stats.depth_limited, limit = MAX_DEPTH);
    }
    log_debug!(
        ctx,
        "SANITIZE_COMPLETE",
        fields = stats.fields_masked,
        headers = stats.headers_masked,
        cookies = stats.cookies_masked,
        query_values = stats.query_values_masked,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cleaner(fields: &[&str]) -> Cleaner {
        let mut config = PolicyConfig::new();
        config.set_fields(fields.iter().copied()).unwrap();
        Cleaner::new(&config).unwrap()
    }

    #[test]
    fn test_mask_fields_flat() {
        let cleaner = cleaner(&["password"]);
        let masked = cleaner.mask_fields(json!({
            "password": "SECRET",
            "not_password": "NOT SECRET"
        }));

        assert_eq!(
            masked,
            json!({"password": "[FILTERED]", "not_password": "NOT SECRET"})
        );
    }

    #[test]
    fn test_mask_fields_array_of_objects() {
        let cleaner = cleaner(&["password", "secret_token"]);
        let masked = cleaner.mask_fields(json!({
            "password": "SECRET",
            "secret_token": "SECRET",
            "oops": "OOPS",
            "hmm": [{"password": "SECRET", "array": "too"}]
        }));

        assert_eq!(
            masked,
            json!({
                "password": "[FILTERED]",
                "secret_token": "[FILTERED]",
                "oops": "OOPS",
                "hmm": [{"password": "[FILTERED]", "array": "too"}]
            })
        );
    }

    #[test]
    fn test_sensitive_key_replaces_nested_object() {
        let cleaner = cleaner(&["credentials"]);
        let masked = cleaner.mask_fields(json!({
            "credentials": {"user": "u", "pass": "p"}
        }));
        assert_eq!(masked, json!({"credentials": "[FILTERED]"}));
    }

    #[test]
    fn test_array_under_sensitive_key_masks_elements() {
        let cleaner = cleaner(&["token"]);
        let masked = cleaner.mask_fields(json!({
            "token": ["a", 7, {"x": 1}, null]
        }));
        assert_eq!(
            masked,
            json!({"token": ["[FILTERED]", 7, "[FILTERED]", null]})
        );
    }

    #[test]
    fn test_non_string_scalars_pass_through() {
        let cleaner = cleaner(&["pin"]);
        let masked = cleaner.mask_fields(json!({"pin": 1234, "flag": true}));
        assert_eq!(masked, json!({"pin": 1234, "flag": true}));
    }

    #[test]
    fn test_no_fields_is_identity() {
        let cleaner = cleaner(&[]);
        let data = json!({"password": "SECRET"});
        assert_eq!(cleaner.mask_fields(data.clone()), data);
    }

    #[test]
    fn test_mask_fields_ignores_non_objects() {
        let cleaner = cleaner(&["password"]);
        assert_eq!(cleaner.mask_fields(json!("password")), json!("password"));
        assert_eq!(
            cleaner.mask_fields(json!([{"password": "x"}])),
            json!([{"password": "x"}])
        );
    }

    #[test]
    fn test_depth_limit_masks_deep_subtree() {
        let cleaner = cleaner(&["password"]);
        let mut deep = json!("leaf");
        for _ in 0..(MAX_DEPTH + 5) {
            deep = json!({ "level": deep });
        }

        let (masked, stats) = cleaner.apply_value_with_stats(json!({ "extra": deep }));
        assert_eq!(stats.depth_limited, 1);
        assert!(masked.to_string().contains("[FILTERED]"));
        assert!(!masked.to_string().contains("leaf"));
    }

    #[test]
    fn test_depth_limit_applies_without_matching_key() {
        let cleaner = cleaner(&["password"]);
        let mut deep = json!("leaf");
        for _ in 0..200 {
            deep = json!([deep]);
        }
        let data = json!({ "items": deep });

        let masked = cleaner.mask_fields(data.clone());
        assert_ne!(masked, data);
        assert!(masked.to_string().contains("[FILTERED]"));
        assert!(!masked.to_string().contains("leaf"));

        let mut shallow = json!("leaf");
        for _ in 0..(MAX_DEPTH - 2) {
            shallow = json!([shallow]);
        }
        let data = json!({ "items": shallow });
        assert_eq!(cleaner.mask_fields(data.clone()), data);
    }

    #[test]
    fn test_default_headers_only() {
        let cleaner = Cleaner::new(&PolicyConfig::new()).unwrap();
        let masked = cleaner.mask_headers(json!({
            "Authorization": "token",
            "X-Xsrf-Token": "xsrf=token",
            "H-1": "secret1"
        }));
        assert_eq!(
            masked,
            json!({
                "Authorization": "[FILTERED]",
                "X-Xsrf-Token": "[FILTERED]",
                "H-1": "secret1"
            })
        );
    }

    #[test]
    fn test_header_names_union_with_defaults() {
        let mut config = PolicyConfig::new();
        config
            .set_http_headers(HeaderPolicy::Names(vec!["H-1".into(), "H-2".into()]))
            .unwrap();
        let cleaner = Cleaner::new(&config).unwrap();

        let masked = cleaner.mask_headers(json!({
            "H-1": "secret1",
            "H-2": "secret2",
            "H-3": "secret3",
            "Authorization": "token"
        }));
        assert_eq!(
            masked,
            json!({
                "H-1": "[FILTERED]",
                "H-2": "[FILTERED]",
                "H-3": "secret3",
                "Authorization": "[FILTERED]"
            })
        );
    }

    #[test]
    fn test_all_headers() {
        let mut config = PolicyConfig::new();
        config.set_http_headers(HeaderPolicy::All).unwrap();
        let cleaner = Cleaner::new(&config).unwrap();

        let masked = cleaner.mask_headers(json!({"H-3": "secret3", "Accept": "*/*"}));
        assert_eq!(masked, json!({"H-3": "[FILTERED]", "Accept": "[FILTERED]"}));
    }

    #[test]
    fn test_cookies_gate() {
        let cookies = json!({"cookie1": "wooo", "cookie2": "weee"});

        let off = Cleaner::new(&PolicyConfig::new()).unwrap();
        assert_eq!(off.mask_cookies(cookies.clone()), cookies);

        let mut config = PolicyConfig::new();
        config.set_cookies(true);
        let on = Cleaner::new(&config).unwrap();
        assert_eq!(
            on.mask_cookies(cookies),
            json!({"cookie1": "[FILTERED]", "cookie2": "[FILTERED]"})
        );
        assert_eq!(on.mask_cookies(json!("a=b; c=d")), json!("a=b; c=d"));
    }

    #[test]
    fn test_query_string_gate_and_shape() {
        let mut config = PolicyConfig::new();
        config.set_fields(["password"]).unwrap();
        let off = Cleaner::new(&config).unwrap();
        assert_eq!(
            off.mask_query_string(json!("password=SECRET")),
            json!("password=SECRET")
        );

        config.set_query_string(true);
        let on = Cleaner::new(&config).unwrap();
        assert_eq!(
            on.mask_query_string(json!("password=SECRET&a=1")),
            json!("password=[FILTERED]&a=1")
        );
        assert_eq!(on.mask_query_string(json!(42)), json!(42));
    }

    #[test]
    fn test_apply_value_non_object_passes_through() {
        let cleaner = cleaner(&["password"]);
        assert_eq!(cleaner.apply_value(json!("password")), json!("password"));
        assert_eq!(cleaner.apply_value(json!(null)), json!(null));
    }

    #[test]
    fn test_breadcrumb_json_data_fields() {
        let mut config = PolicyConfig::new();
        config.set_fields(["password"]).unwrap();
        config.set_breadcrumb_json_data_fields(["body"]);
        let cleaner = Cleaner::new(&config).unwrap();

        let crumb = Breadcrumb::new("test").with_data(json!({
            "body": r#"{"password":"PASSWORD"}"#
        }));
        let cleaned = cleaner.apply_breadcrumb(crumb);
        assert_eq!(
            cleaned.data,
            Some(json!({"body": r#"{"password":"[FILTERED]"}"#}))
        );

        for data in [json!({"body": null}), json!({"body": "not parseable JSON"}), json!("just a string")] {
            let crumb = Breadcrumb::new("test").with_data(data.clone());
            assert_eq!(cleaner.apply_breadcrumb(crumb).data, Some(data));
        }
    }

    #[test]
    fn test_breadcrumb_embedded_json_without_matches_keeps_bytes() {
        let mut config = PolicyConfig::new();
        config.set_fields(["password"]).unwrap();
        config.set_breadcrumb_json_data_fields(["body"]);
        let cleaner = Cleaner::new(&config).unwrap();

        let body = r#"{ "login" : "me" }"#;
        let crumb = Breadcrumb::new("test").with_data(json!({ "body": body }));
        assert_eq!(
            cleaner.apply_breadcrumb(crumb).data,
            Some(json!({ "body": body }))
        );
    }

    #[test]
    fn test_stats_total() {
        let stats = MaskStats {
            fields_masked: 2,
            headers_masked: 1,
            cookies_masked: 3,
            query_values_masked: 1,
            depth_limited: 0,
        };
        assert_eq!(stats.total(), 7);
    }
}
