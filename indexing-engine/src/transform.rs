//! Typed value conversion.
//!
//! Converts extracted string values under a declarative [`TransformSpec`]:
//! `date` -> `timestamp` (epoch milliseconds) and `string` -> `string`
//! (global regex substitution). Any other combination is a configuration
//! error naming the offending type.
//!
//! Date formats keep the pattern tokens of the configuration corpus
//! (`yyyyMMdd`, `yyyy-MM-dd'T'HH:mm:ss`, ...) and are translated to chrono
//! specifiers before parsing; an unsupported pattern letter is rejected as a
//! configuration error instead of being mis-parsed.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde_json::Value;

use indexing_shared::TransformSpec;

use crate::errors::EngineError;

/// Apply a transform spec to a raw string value.
pub fn apply(spec: &TransformSpec, raw: &str) -> Result<Value, EngineError> {
    if spec.from.eq_ignore_ascii_case("date") {
        transform_date(spec, raw)
    } else if spec.from.eq_ignore_ascii_case("string") {
        transform_string(spec, raw)
    } else {
        Err(EngineError::config(format!(
            "Impossible to transform the following type: {}",
            spec.from
        )))
    }
}

fn transform_date(spec: &TransformSpec, raw: &str) -> Result<Value, EngineError> {
    if !spec.to.eq_ignore_ascii_case("timestamp") {
        return Err(EngineError::config(format!(
            "Impossible to transform a date to the following type: {}",
            spec.to
        )));
    }
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    let format = spec.format.as_deref().ok_or_else(|| {
        EngineError::config("A 'format' is required to transform a date to a timestamp")
    })?;
    parse_epoch_millis(raw, format).map(Value::from)
}

fn transform_string(spec: &TransformSpec, raw: &str) -> Result<Value, EngineError> {
    if !spec.to.eq_ignore_ascii_case("string") {
        return Err(EngineError::config(format!(
            "Impossible to transform a string to the following type: {}",
            spec.to
        )));
    }
    match spec.regex.as_deref() {
        Some(pattern) => {
            let re = Regex::new(pattern).map_err(|e| {
                EngineError::config(format!("Invalid transform regex '{}': {}", pattern, e))
            })?;
            let replacement = spec.replacement.as_deref().unwrap_or("");
            Ok(Value::String(re.replace_all(raw, replacement).into_owned()))
        }
        None => Ok(Value::String(raw.to_owned())),
    }
}

/// Parse a date string under a date-pattern format, yielding epoch
/// milliseconds. The timestamp is interpreted as UTC.
fn parse_epoch_millis(raw: &str, format: &str) -> Result<i64, EngineError> {
    let (strftime, has_time) = strftime_format(format)?;
    let datetime = if has_time {
        NaiveDateTime::parse_from_str(raw, &strftime).map_err(|e| {
            EngineError::value(format!("Unparseable date '{}' for format '{}': {}", raw, format, e))
        })?
    } else {
        NaiveDate::parse_from_str(raw, &strftime)
            .map_err(|e| {
                EngineError::value(format!(
                    "Unparseable date '{}' for format '{}': {}",
                    raw, format, e
                ))
            })?
            .and_time(NaiveTime::MIN)
    };
    Ok(datetime.and_utc().timestamp_millis())
}

/// Translate a date-pattern format into a chrono strftime string.
///
/// Returns the translated format and whether it carries a time component.
fn strftime_format(format: &str) -> Result<(String, bool), EngineError> {
    let mut out = String::with_capacity(format.len());
    let mut has_time = false;
    let chars: Vec<char> = format.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            // Quoted literal; '' inside a literal is an escaped quote.
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                    } else {
                        i += 1;
                        break;
                    }
                } else {
                    if chars[i] == '%' {
                        out.push('%');
                    }
                    out.push(chars[i]);
                    i += 1;
                }
            }
            continue;
        }
        if !c.is_ascii_alphabetic() {
            if c == '%' {
                out.push('%');
            }
            out.push(c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }
        let spec = match (c, run) {
            ('y', 4) => "%Y",
            ('y', 2) => "%y",
            ('M', 1) | ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('d', 1) | ('d', 2) => "%d",
            ('H', 1) | ('H', 2) => {
                has_time = true;
                "%H"
            }
            ('h', 1) | ('h', 2) => {
                has_time = true;
                "%I"
            }
            ('m', 1) | ('m', 2) => {
                has_time = true;
                "%M"
            }
            ('s', 1) | ('s', 2) => {
                has_time = true;
                "%S"
            }
            ('S', 3) => {
                has_time = true;
                "%3f"
            }
            ('a', 1) => {
                has_time = true;
                "%p"
            }
            ('Z', 1) => "%z",
            _ => {
                return Err(EngineError::config(format!(
                    "Unsupported date pattern token '{}' in format '{}'",
                    c.to_string().repeat(run),
                    format
                )))
            }
        };
        out.push_str(spec);
        i += run;
    }

    Ok((out, has_time))
}
