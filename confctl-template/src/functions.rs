//! Sprig-equivalent helper library (§4.2b).
//!
//! `tera`'s own builtins already cover a large slice of the ~70-function
//! Sprig surface: `upper`/`lower`/`trim`/`truncate`/`replace`/`split`/
//! `join`/`length`/`first`/`last`/`nth`/`slice`/`reverse`/`sort`/`unique`/
//! `filter`/`map`/`concat`/`date`/`get_random`/`range`/`default`/`json_encode`.
//! This module adds the handful Sprig has that tera doesn't: base64,
//! hashing, semver comparison, dict construction/merging, YAML
//! re-serialization, and the `indent`/`nindent`/`include` trio this spec
//! calls out by name.

use std::collections::HashMap;
use std::iter;

use base64::{decode as b64_decode, encode as b64_encode};
use chrono::Utc;
use semver::{Version, VersionReq};
use sha2::{Digest, Sha256};
use tera::{try_get_value, Error as TeraError, Result as TeraResult, Tera, Value};

fn indent_lines(s: &str, spaces: usize) -> String {
    let pad: String = iter::repeat(' ').take(spaces).collect();
    s.lines()
        .map(|l| if l.is_empty() { l.to_string() } else { format!("{}{}", pad, l) })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `{{ value | indent(spaces=2) }}` — prefix every non-empty line.
pub fn indent(v: &Value, args: &HashMap<String, Value>) -> TeraResult<Value> {
    let s: String = try_get_value!("indent", "value", String, v);
    let spaces = args.get("spaces").and_then(Value::as_u64).unwrap_or(2) as usize;
    Ok(Value::String(indent_lines(&s, spaces)))
}

/// `{{ value | nindent(spaces=2) }}` — `indent` plus a leading newline, the
/// idiom used to splice a block under a YAML key on its own line.
pub fn nindent(v: &Value, args: &HashMap<String, Value>) -> TeraResult<Value> {
    let indented = indent(v, args)?;
    let s: String = try_get_value!("nindent", "value", String, indented);
    Ok(Value::String(format!("\n{}", s)))
}

pub fn b64enc(v: &Value, _: &HashMap<String, Value>) -> TeraResult<Value> {
    let s: String = try_get_value!("b64enc", "value", String, v);
    Ok(Value::String(b64_encode(s.as_bytes())))
}

pub fn b64dec(v: &Value, _: &HashMap<String, Value>) -> TeraResult<Value> {
    let s: String = try_get_value!("b64dec", "value", String, v);
    let bytes = b64_decode(&s).map_err(|e| TeraError::msg(format!("b64dec: {}", e)))?;
    let decoded = String::from_utf8(bytes).map_err(|e| TeraError::msg(format!("b64dec: {}", e)))?;
    Ok(Value::String(decoded))
}

pub fn sha256sum(v: &Value, _: &HashMap<String, Value>) -> TeraResult<Value> {
    let s: String = try_get_value!("sha256sum", "value", String, v);
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    Ok(Value::String(format!("{:x}", hasher.finalize())))
}

pub fn quote(v: &Value, _: &HashMap<String, Value>) -> TeraResult<Value> {
    let s: String = try_get_value!("quote", "value", String, v);
    Ok(Value::String(format!("\"{}\"", s.replace('"', "\\\""))))
}

/// `{{ value | toYaml }}` — re-serialize a (sub)value as YAML, the
/// counterpart to Sprig's `toYaml` used to splice structured values into a
/// template (seen throughout the pack's Helm-adjacent examples).
pub fn to_yaml(v: &Value, _: &HashMap<String, Value>) -> TeraResult<Value> {
    let yaml = serde_yaml::to_string(v).map_err(|e| TeraError::msg(format!("toYaml: {}", e)))?;
    Ok(Value::String(yaml.trim_end().to_string()))
}

/// `{{ semverCompare(requirement="^1.2.0", version=appVersion) }}`
pub fn semver_compare(args: &HashMap<String, Value>) -> TeraResult<Value> {
    let req = args
        .get("requirement")
        .and_then(Value::as_str)
        .ok_or_else(|| TeraError::msg("semverCompare: missing `requirement`"))?;
    let ver = args
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| TeraError::msg("semverCompare: missing `version`"))?;
    let req = VersionReq::parse(req).map_err(|e| TeraError::msg(format!("semverCompare: {}", e)))?;
    let ver = Version::parse(ver).map_err(|e| TeraError::msg(format!("semverCompare: {}", e)))?;
    Ok(Value::Bool(req.matches(&ver)))
}

/// `{{ dict(a=1, b=2) }}` — builds an object from keyword arguments.
pub fn dict(args: &HashMap<String, Value>) -> TeraResult<Value> {
    let map: serde_json::Map<String, Value> = args.clone().into_iter().collect();
    Ok(Value::Object(map))
}

/// `{{ merge(base=a, overlay=b) }}` — shallow merge, `overlay` wins on key
/// collision (Sprig's `merge`, simplified to top-level keys which is all
/// the include templates in this layout ever need).
pub fn merge(args: &HashMap<String, Value>) -> TeraResult<Value> {
    let base = args.get("base").cloned().unwrap_or_else(|| Value::Object(Default::default()));
    let overlay = args.get("overlay").cloned().unwrap_or_else(|| Value::Object(Default::default()));
    match (base, overlay) {
        (Value::Object(mut b), Value::Object(o)) => {
            for (k, v) in o {
                b.insert(k, v);
            }
            Ok(Value::Object(b))
        }
        _ => Err(TeraError::msg("merge: both `base` and `overlay` must be objects")),
    }
}

/// `{{ now() }}` — current UTC timestamp, RFC3339.
pub fn now(_: &HashMap<String, Value>) -> TeraResult<Value> {
    Ok(Value::String(Utc::now().to_rfc3339()))
}

fn numeric_arg(args: &HashMap<String, Value>, fn_name: &str, key: &str) -> TeraResult<Value> {
    args.get(key)
        .cloned()
        .filter(Value::is_number)
        .ok_or_else(|| TeraError::msg(format!("{}: missing or non-numeric `{}`", fn_name, key)))
}

/// `{{ max(a=1, b=2) }}` — Sprig's variadic `max` narrowed to the
/// two-argument case every include template in this layout needs; keeps
/// whichever of `a`/`b` is larger as-is, so an integer input stays an
/// integer in the rendered YAML.
pub fn max(args: &HashMap<String, Value>) -> TeraResult<Value> {
    let a = numeric_arg(args, "max", "a")?;
    let b = numeric_arg(args, "max", "b")?;
    Ok(if a.as_f64() >= b.as_f64() { a } else { b })
}

/// `{{ min(a=1, b=2) }}` — the `max` counterpart.
pub fn min(args: &HashMap<String, Value>) -> TeraResult<Value> {
    let a = numeric_arg(args, "min", "a")?;
    let b = numeric_arg(args, "min", "b")?;
    Ok(if a.as_f64() <= b.as_f64() { a } else { b })
}

/// `{{ list | without(omit=[1, 2]) }}` — Sprig's `without`: drop the
/// `omit`ted elements from `list`.
pub fn without(v: &Value, args: &HashMap<String, Value>) -> TeraResult<Value> {
    let items: Vec<Value> = try_get_value!("without", "value", Vec<Value>, v);
    let omit = args.get("omit").and_then(Value::as_array).cloned().unwrap_or_default();
    let kept: Vec<Value> = items.into_iter().filter(|item| !omit.contains(item)).collect();
    Ok(Value::Array(kept))
}

/// `{{ list | has(item=x) }}` — Sprig's `has`: list-membership test.
pub fn has(v: &Value, args: &HashMap<String, Value>) -> TeraResult<Value> {
    let items: Vec<Value> = try_get_value!("has", "value", Vec<Value>, v);
    let item = args.get("item").cloned().ok_or_else(|| TeraError::msg("has: missing `item`"))?;
    Ok(Value::Bool(items.contains(&item)))
}

/// `{{ pluck(key="name", items=list) }}` — Sprig's `pluck`: collect the
/// value at `key` from every object in `items` that has it.
pub fn pluck(args: &HashMap<String, Value>) -> TeraResult<Value> {
    let key = args.get("key").and_then(Value::as_str).ok_or_else(|| TeraError::msg("pluck: missing `key`"))?;
    let items = args.get("items").and_then(Value::as_array).ok_or_else(|| TeraError::msg("pluck: missing `items`"))?;
    let plucked: Vec<Value> = items.iter().filter_map(|item| item.get(key).cloned()).collect();
    Ok(Value::Array(plucked))
}

/// `{{ value | trunc(count=5) }}` — Sprig's `trunc`: keep the first
/// `count` characters, or the last `|count|` when `count` is negative.
pub fn trunc(v: &Value, args: &HashMap<String, Value>) -> TeraResult<Value> {
    let s: String = try_get_value!("trunc", "value", String, v);
    let count = args.get("count").and_then(Value::as_i64).ok_or_else(|| TeraError::msg("trunc: missing `count`"))?;
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let truncated: String = if count >= 0 {
        chars.into_iter().take(count as usize).collect()
    } else {
        let start = (len + count).max(0) as usize;
        chars[start..].iter().collect()
    };
    Ok(Value::String(truncated))
}

fn parse_signed_duration(spec: &str) -> Option<chrono::Duration> {
    let (sign, rest) = match spec.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, spec.strip_prefix('+').unwrap_or(spec)),
    };
    let unit = rest.chars().last()?;
    let amount: i64 = sign * rest[..rest.len() - unit.len_utf8()].parse::<i64>().ok()?;
    match unit {
        's' => Some(chrono::Duration::seconds(amount)),
        'm' => Some(chrono::Duration::minutes(amount)),
        'h' => Some(chrono::Duration::hours(amount)),
        'd' => Some(chrono::Duration::days(amount)),
        _ => None,
    }
}

/// `{{ value | dateModify(modification="+1h") }}` — Sprig's `dateModify`:
/// offset an RFC3339 timestamp by a signed `<n><unit>` duration, unit one
/// of `s`/`m`/`h`/`d`.
pub fn date_modify(v: &Value, args: &HashMap<String, Value>) -> TeraResult<Value> {
    let s: String = try_get_value!("dateModify", "value", String, v);
    let modification = args
        .get("modification")
        .and_then(Value::as_str)
        .ok_or_else(|| TeraError::msg("dateModify: missing `modification`"))?;
    let dt = chrono::DateTime::parse_from_rfc3339(&s).map_err(|e| TeraError::msg(format!("dateModify: {}", e)))?;
    let delta = parse_signed_duration(modification)
        .ok_or_else(|| TeraError::msg(format!("dateModify: invalid modification `{}`", modification)))?;
    Ok(Value::String((dt + delta).to_rfc3339()))
}

pub fn register_sprig_library(tera: &mut Tera) {
    tera.register_filter("indent", indent);
    tera.register_filter("nindent", nindent);
    tera.register_filter("b64enc", b64enc);
    tera.register_filter("b64dec", b64dec);
    tera.register_filter("sha256sum", sha256sum);
    tera.register_filter("quote", quote);
    tera.register_filter("toYaml", to_yaml);
    tera.register_filter("without", without);
    tera.register_filter("has", has);
    tera.register_filter("trunc", trunc);
    tera.register_filter("dateModify", date_modify);
    tera.register_function("semverCompare", semver_compare);
    tera.register_function("dict", dict);
    tera.register_function("merge", merge);
    tera.register_function("now", now);
    tera.register_function("max", max);
    tera.register_function("min", min);
    tera.register_function("pluck", pluck);
}
