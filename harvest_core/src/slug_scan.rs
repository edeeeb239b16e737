use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

static SLUG_PATTERN: OnceLock<Regex> = OnceLock::new();

fn slug_pattern() -> &'static Regex {
    SLUG_PATTERN.get_or_init(|| Regex::new(r"vine\.co/v/([A-Za-z0-9]+)").unwrap())
}

/// Reads `reader` line-by-line as raw bytes, inserting every non-overlapping
/// `vine.co/v/<slug>` capture into `set`. Each line is lossily decoded before
/// matching, so a line containing invalid UTF-8 never aborts the scan — it
/// just can't match the (ASCII-only) pattern, and the scanner moves on to
/// the next line. Only reader I/O errors propagate.
pub async fn scan_slugs<R: AsyncRead + Unpin>(
    reader: R,
    set: &mut HashSet<String>,
) -> std::io::Result<()> {
    let mut lines = BufReader::new(reader).split(b'\n');
    while let Some(line) = lines.next_segment().await? {
        let text = String::from_utf8_lossy(&line);
        for captures in slug_pattern().captures_iter(&text) {
            set.insert(captures[1].to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn extracts_slug_surrounded_by_prose() {
        let mut set = HashSet::new();
        scan_slugs(
            Cursor::new(b"check this out https://vine.co/v/abc123 nice".to_vec()),
            &mut set,
        )
        .await
        .unwrap();
        assert_eq!(set, HashSet::from(["abc123".to_string()]));
    }

    #[tokio::test]
    async fn dedups_repeated_slugs_across_lines() {
        let mut set = HashSet::new();
        let text = b"vine.co/v/abc123\nvine.co/v/abc123\nvine.co/v/xyz789\n".to_vec();
        scan_slugs(Cursor::new(text), &mut set).await.unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("abc123"));
        assert!(set.contains("xyz789"));
    }

    #[tokio::test]
    async fn finds_multiple_matches_per_line() {
        let mut set = HashSet::new();
        let text = b"a vine.co/v/one and vine.co/v/two in one line".to_vec();
        scan_slugs(Cursor::new(text), &mut set).await.unwrap();
        assert_eq!(set, HashSet::from(["one".to_string(), "two".to_string()]));
    }

    #[tokio::test]
    async fn ignores_non_matching_binary_garbage() {
        let mut set = HashSet::new();
        let mut text = vec![0xff, 0xfe, 0x00, 0x01];
        text.extend_from_slice(b"\nvine.co/v/found\n");
        scan_slugs(Cursor::new(text), &mut set).await.unwrap();
        assert_eq!(set, HashSet::from(["found".to_string()]));
    }

    proptest::proptest! {
        #[test]
        fn extraction_equals_the_multiset_set_projection(slugs in proptest::collection::vec("[A-Za-z0-9]{1,12}", 0..20)) {
            let mut text = String::new();
            for s in &slugs {
                text.push_str("noise before vine.co/v/");
                text.push_str(s);
                text.push_str(" noise after\n");
            }
            let expected: HashSet<String> = slugs.into_iter().collect();
            let mut set = HashSet::new();
            tokio::runtime::Runtime::new().unwrap().block_on(async {
                scan_slugs(Cursor::new(text.into_bytes()), &mut set).await.unwrap();
            });
            proptest::prop_assert_eq!(set, expected);
        }
    }
}
