use serde_json::Value;

const LEGACY_HOSTS: [&str; 2] = ["v.cdn.vine.co", "mtc.cdn.vine.co"];
const CANONICAL_ORIGIN: &str = "https://vines.s3.amazonaws.com";

/// Recursively rewrites every string leaf in `value` that mentions a legacy
/// CDN host, replacing `{http,https}://{v,mtc}.cdn.vine.co` with the
/// canonical archival origin. Maps and arrays are walked in place; non-string
/// leaves pass through untouched. Idempotent: running this twice produces
/// the same tree as running it once, since the output never contains a
/// legacy host substring for the second pass to match.
pub fn rewrite_urls(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(rewrite_string(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(rewrite_urls).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, rewrite_urls(v)))
                .collect(),
        ),
        other => other,
    }
}

fn rewrite_string(s: &str) -> String {
    if !LEGACY_HOSTS.iter().any(|host| s.contains(host)) {
        return s.to_string();
    }

    let mut out = s.to_string();
    for scheme in ["https", "http"] {
        for host in LEGACY_HOSTS {
            let legacy = format!("{scheme}://{host}");
            out = out.replace(&legacy, CANONICAL_ORIGIN);
        }
    }
    out
}
