use serde_json::Value;

use crate::ids::PostId;

/// Two-pass strategy over a ProfileRecord: a preferred pass over the
/// top-level `posts` array, falling back to a recursive deep scan for
/// `postId`/`postIdStr` keys only when the preferred pass yields nothing.
/// Both passes feed a common insertion-ordered deduplicator; empty and
/// whitespace-only IDs are dropped.
pub fn extract_post_ids(profile: &Value) -> Vec<PostId> {
    let preferred = preferred_pass(profile);
    if !preferred.is_empty() {
        return preferred;
    }
    fallback_pass(profile)
}

fn preferred_pass(profile: &Value) -> Vec<PostId> {
    let mut dedup = Dedup::new();
    if let Some(Value::Array(items)) = profile.get("posts") {
        for item in items {
            if let Some(id) = id_from_posts_element(item) {
                dedup.push(id);
            }
        }
    }
    dedup.into_vec()
}

fn id_from_posts_element(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => non_empty(s),
        Value::Number(n) => number_as_integer(n),
        Value::Object(map) => {
            if let Some(Value::String(s)) = map.get("postIdStr") {
                if let Some(id) = non_empty(s) {
                    return Some(id);
                }
            }
            if let Some(Value::Number(n)) = map.get("postId") {
                return number_as_integer(n);
            }
            None
        }
        _ => None,
    }
}

fn fallback_pass(profile: &Value) -> Vec<PostId> {
    let mut dedup = Dedup::new();
    walk_for_post_id_keys(profile, &mut dedup);
    dedup.into_vec()
}

fn walk_for_post_id_keys(value: &Value, dedup: &mut Dedup) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let lower = key.to_ascii_lowercase();
                if lower == "postid" || lower == "postidstr" {
                    match val {
                        Value::String(s) => {
                            if let Some(id) = non_empty(s) {
                                dedup.push(id);
                            }
                        }
                        Value::Number(n) => {
                            if let Some(id) = number_as_integer(n) {
                                dedup.push(id);
                            }
                        }
                        _ => {}
                    }
                }
                walk_for_post_id_keys(val, dedup);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_for_post_id_keys(item, dedup);
            }
        }
        _ => {}
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn number_as_integer(n: &serde_json::Number) -> Option<String> {
    if let Some(i) = n.as_i64() {
        return Some(i.to_string());
    }
    if let Some(u) = n.as_u64() {
        return Some(u.to_string());
    }
    n.as_f64().map(|f| (f as i64).to_string())
}

/// Insertion-ordered deduplicator, shared by both passes.
struct Dedup {
    seen: std::collections::HashSet<String>,
    order: Vec<String>,
}

impl Dedup {
    fn new() -> Self {
        Self {
            seen: std::collections::HashSet::new(),
            order: Vec::new(),
        }
    }

    fn push(&mut self, id: String) {
        if self.seen.insert(id.clone()) {
            self.order.push(id);
        }
    }

    fn into_vec(self) -> Vec<PostId> {
        self.order.into_iter().map(PostId).collect()
    }
}
