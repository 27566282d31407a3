use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tera::Tera;

use crate::format::{human_size, relative_time};

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("release.html", include_str!("../templates/release.html")),
    ("README.md", include_str!("../templates/README.md")),
];

/// Build the template engine with the built-in templates and filters.
///
/// Autoescaping applies to the `.html` templates only.
pub fn setup_templates() -> tera::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.to_vec())?;

    tera.register_filter("timeago", timeago_filter);
    tera.register_filter("filesize", filesize_filter);
    tera.register_filter("datetime", datetime_filter);

    Ok(tera)
}

fn parse_timestamp(value: &tera::Value) -> tera::Result<DateTime<Utc>> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("Value must be a timestamp string"))?;
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| tera::Error::msg(format!("Invalid timestamp '{}': {}", text, e)))
}

/// `{{ ts | timeago(now=reference) }}`
fn timeago_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    if value.is_null() {
        return Ok(tera::Value::String("never".to_string()));
    }
    let reference = args
        .get("now")
        .ok_or_else(|| tera::Error::msg("timeago requires a `now` argument"))?;
    let ts = parse_timestamp(value)?;
    let reference = parse_timestamp(reference)?;
    Ok(tera::Value::String(relative_time(ts, reference)))
}

fn filesize_filter(
    value: &tera::Value,
    _: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let bytes = value
        .as_u64()
        .ok_or_else(|| tera::Error::msg("Value must be a byte count"))?;
    Ok(tera::Value::String(human_size(bytes)))
}

fn datetime_filter(
    value: &tera::Value,
    _: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    if value.is_null() {
        return Ok(tera::Value::String("N/A".to_string()));
    }
    let ts = parse_timestamp(value)?;
    Ok(tera::Value::String(
        ts.format("%Y-%m-%d %H:%M UTC").to_string(),
    ))
}
