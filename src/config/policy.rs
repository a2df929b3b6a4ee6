//! Masking policy options.
//!
//! A [`PolicyConfig`] is filled in once at startup, either through the typed
//! setters or through [`PolicyConfig::set_option`] from an untyped
//! configuration source, and read by every [`Cleaner`](crate::security::Cleaner)
//! built from it afterwards.
//!
//! Every setter validates its value first and only then assigns it, so a
//! rejected assignment leaves the previous value in place.

use serde_json::Value;

use crate::error::{Result, ValidationError};
use crate::security::patterns::validate_name;

/// Replacement string used when no mask is configured.
pub const DEFAULT_MASK: &str = "[FILTERED]";

/// Which HTTP headers get masked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Mask every header value (`true`).
    All,
    /// Mask only the built-in defaults (`false`).
    DefaultsOnly,
    /// Mask the built-in defaults plus these names.
    Names(Vec<String>),
}

impl From<bool> for HeaderPolicy {
    fn from(all: bool) -> Self {
        if all {
            HeaderPolicy::All
        } else {
            HeaderPolicy::DefaultsOnly
        }
    }
}

/// Sanitizer options for a reporting client.
#[derive(Debug, Clone, Default)]
pub struct PolicyConfig {
    fields: Option<Vec<String>>,
    http_headers: Option<HeaderPolicy>,
    cookies: Option<bool>,
    query_string: Option<bool>,
    mask: Option<String>,
    breadcrumb_json_data_fields: Vec<String>,
}

impl PolicyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a policy from a JSON object of option names to values.
    pub fn from_value(value: &Value) -> Result<Self> {
        let options = value
            .as_object()
            .ok_or_else(|| ValidationError::invalid_type("sanitize", "an object"))?;

        let mut config = Self::new();
        for (name, option) in options {
            config.set_option(name, option)?;
        }
        Ok(config)
    }

    /// Parse JSON configuration text into a policy.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// True once any of fields, http_headers, cookies or query_string has
    /// been set, even to an empty or false value.
    pub fn configured(&self) -> bool {
        self.fields.is_some()
            || self.http_headers.is_some()
            || self.cookies.is_some()
            || self.query_string.is_some()
    }

    pub fn fields(&self) -> &[String] {
        self.fields.as_deref().unwrap_or(&[])
    }

    pub fn http_headers(&self) -> Option<&HeaderPolicy> {
        self.http_headers.as_ref()
    }

    pub fn cookies(&self) -> bool {
        self.cookies.unwrap_or(false)
    }

    pub fn query_string(&self) -> bool {
        self.query_string.unwrap_or(false)
    }

    /// The configured mask, or [`DEFAULT_MASK`].
    pub fn mask(&self) -> &str {
        self.mask.as_deref().unwrap_or(DEFAULT_MASK)
    }

    pub fn breadcrumb_json_data_fields(&self) -> &[String] {
        &self.breadcrumb_json_data_fields
    }

    pub fn set_fields<I, S>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = validated_names("fields", fields)?;
        self.fields = Some(fields);
        Ok(())
    }

    pub fn set_http_headers(&mut self, headers: HeaderPolicy) -> Result<()> {
        if let HeaderPolicy::Names(names) = &headers {
            for name in names {
                check_name("http_headers", name)?;
            }
        }
        self.http_headers = Some(headers);
        Ok(())
    }

    pub fn set_cookies(&mut self, cookies: bool) {
        self.cookies = Some(cookies);
    }

    pub fn set_query_string(&mut self, query_string: bool) {
        self.query_string = Some(query_string);
    }

    pub fn set_mask(&mut self, mask: impl Into<String>) {
        self.mask = Some(mask.into());
    }

    /// Breadcrumb `data` keys whose string values carry serialized JSON.
    pub fn set_breadcrumb_json_data_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.breadcrumb_json_data_fields = fields.into_iter().map(Into::into).collect();
    }

    /// Assign an option from an untyped value, checking its shape.
    ///
    /// # Arguments
    /// * `name` - option name (`fields`, `http_headers`, `cookies`,
    ///   `query_string`, `mask`, `breadcrumbs.json_data_fields`; camelCase
    ///   aliases are accepted)
    /// * `value` - the raw value from the configuration source
    pub fn set_option(&mut self, name: &str, value: &Value) -> Result<()> {
        match name {
            "fields" => {
                let fields = string_list(value, "fields")?;
                self.set_fields(fields)
            }
            "http_headers" | "httpHeaders" => {
                let headers = match value {
                    Value::Bool(all) => HeaderPolicy::from(*all),
                    Value::Array(_) => HeaderPolicy::Names(string_list(value, "http_headers")?),
                    _ => {
                        return Err(ValidationError::invalid_type(
                            "http_headers",
                            "an array of strings or a boolean",
                        ))
                    }
                };
                self.set_http_headers(headers)
            }
            "cookies" => {
                let cookies = boolean(value, "cookies")?;
                self.set_cookies(cookies);
                Ok(())
            }
            "query_string" | "queryString" => {
                let query_string = boolean(value, "query_string")?;
                self.set_query_string(query_string);
                Ok(())
            }
            "mask" => {
                let mask = value
                    .as_str()
                    .ok_or_else(|| ValidationError::invalid_type("mask", "a string"))?;
                self.set_mask(mask);
                Ok(())
            }
            "breadcrumbs" => {
                let breadcrumbs = value
                    .as_object()
                    .ok_or_else(|| ValidationError::invalid_type("breadcrumbs", "an object"))?;

                let mut json_data_fields = None;
                for (key, option) in breadcrumbs {
                    match key.as_str() {
                        "json_data_fields" => {
                            json_data_fields =
                                Some(string_list(option, "breadcrumbs.json_data_fields")?);
                        }
                        other => {
                            return Err(ValidationError::UnknownOption(format!(
                                "breadcrumbs.{}",
                                other
                            )))
                        }
                    }
                }

                if let Some(fields) = json_data_fields {
                    self.set_breadcrumb_json_data_fields(fields);
                }
                Ok(())
            }
            "breadcrumbs.json_data_fields" => {
                let fields = string_list(value, "breadcrumbs.json_data_fields")?;
                self.set_breadcrumb_json_data_fields(fields);
                Ok(())
            }
            other => Err(ValidationError::UnknownOption(other.to_string())),
        }
    }
}

fn validated_names<I, S>(option: &'static str, names: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    for name in &names {
        check_name(option, name)?;
    }
    Ok(names)
}

fn check_name(option: &'static str, name: &str) -> Result<()> {
    validate_name(name).map_err(|source| ValidationError::InvalidPattern {
        option,
        pattern: name.to_string(),
        source,
    })
}

fn string_list(value: &Value, option: &'static str) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| ValidationError::invalid_type(option, "an array of strings"))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ValidationError::invalid_type(option, "an array of strings"))
        })
        .collect()
}

fn boolean(value: &Value, option: &'static str) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| ValidationError::invalid_type(option, "a boolean"))
}
