use serde_json::Value;

/// Opaque video-slug token extracted from seed text. Wraps a plain `String`
/// so call sites cannot accidentally pass a slug where a `UserId`/`PostId`
/// is expected, mirroring the teacher's newtype-per-identifier style in
/// `types::types` (`Piece`, `SegmentState`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slug(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostId(pub String);

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Renders a JSON number as its integer text form, dropping any fractional
/// part — used wherever the spec says "numeric value, rendered as integer".
fn number_as_integer_string(n: &serde_json::Number) -> Option<String> {
    if let Some(i) = n.as_i64() {
        return Some(i.to_string());
    }
    if let Some(u) = n.as_u64() {
        return Some(u.to_string());
    }
    n.as_f64().map(|f| (f as i64).to_string())
}

/// Extracts a string-or-numeric identifier field pair from an object,
/// preferring the `*Str` field when present and non-empty, falling back to
/// the numeric field rendered as an integer.
fn extract_preferred(map: &serde_json::Map<String, Value>, str_key: &str, num_key: &str) -> Option<String> {
    if let Some(Value::String(s)) = map.get(str_key) {
        if !s.trim().is_empty() {
            return Some(s.clone());
        }
    }
    if let Some(Value::Number(n)) = map.get(num_key) {
        return number_as_integer_string(n);
    }
    None
}

/// `userIdStr` (string, preferred) or `userId` (numeric, rendered as integer).
pub fn extract_user_id(record: &Value) -> Option<UserId> {
    record
        .as_object()
        .and_then(|map| extract_preferred(map, "userIdStr", "userId"))
        .map(UserId)
}

/// `postIdStr` (string, preferred) or `postId` (numeric, rendered as integer).
pub fn extract_post_id(record: &Value) -> Option<PostId> {
    record
        .as_object()
        .and_then(|map| extract_preferred(map, "postIdStr", "postId"))
        .map(PostId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefers_string_id_over_numeric() {
        let v = json!({"userIdStr": "u1", "userId": 999});
        assert_eq!(extract_user_id(&v), Some(UserId("u1".to_string())));
    }

    #[test]
    fn falls_back_to_numeric_rendered_as_integer() {
        let v = json!({"postId": 42});
        assert_eq!(extract_post_id(&v), Some(PostId("42".to_string())));
    }

    #[test]
    fn falls_back_to_numeric_even_when_float_valued() {
        let v = json!({"userId": 7.0});
        assert_eq!(extract_user_id(&v), Some(UserId("7".to_string())));
    }

    #[test]
    fn ignores_empty_string_id_and_falls_back_to_numeric() {
        let v = json!({"postIdStr": "", "postId": 42});
        assert_eq!(extract_post_id(&v), Some(PostId("42".to_string())));
    }

    #[test]
    fn missing_fields_yield_none() {
        assert_eq!(extract_user_id(&json!({"other": 1})), None);
    }
}
