//! URL-encoded query string masking.

use crate::security::patterns::SensitivePattern;

/// Mask the value side of every `key=value` pair whose key is sensitive.
///
/// Pairs are split on `&`, then on the first `=`. Everything that is not a
/// masked value, including pairs without `=`, is kept byte-for-byte.
///
/// Returns the rewritten query and the number of values masked.
pub fn mask_query(query: &str, fields: Option<&SensitivePattern>, mask: &str) -> (String, usize) {
    let Some(fields) = fields else {
        return (query.to_string(), 0);
    };

    let mut masked = 0;
    let pairs: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if fields.is_match(key) => {
                masked += 1;
                format!("{}={}", key, mask)
            }
            _ => pair.to_string(),
        })
        .collect();

    (pairs.join("&"), masked)
}
