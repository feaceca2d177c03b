use std::sync::LazyLock;

use regex::Regex;

static GROUP_ID_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"GROUP-ID="([^"]+)""#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantUrl {
    pub group_id: String,
    pub url: String,
}

/// Pair every `GROUP-ID` label of a master playlist with the playable url
/// that follows it.
///
/// A `GROUP-ID="x"` line arms the label `x` and the next `https://` line
/// consumes it. Tag lines in between keep the label armed, a later
/// `GROUP-ID` replaces it. Url lines with no armed label are skipped, and so
/// is a label never followed by a url.
pub fn group_variants(manifest: &str) -> Vec<VariantUrl> {
    let mut variants = Vec::new();
    let mut pending: Option<String> = None;

    for line in manifest.lines().map(str::trim) {
        if let Some(group_id) = GROUP_ID_REGEXP.captures(line).and_then(|c| c.get(1)) {
            pending = Some(group_id.as_str().to_string());
            continue;
        }

        if line.starts_with("https://") {
            if let Some(group_id) = pending.take() {
                variants.push(VariantUrl {
                    group_id,
                    url: line.to_string(),
                });
            }
        }
    }

    variants
}
