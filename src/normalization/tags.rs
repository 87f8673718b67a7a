use std::collections::HashSet;

/// Comparison key for a tag: trimmed, inner whitespace collapsed, lowercased.
pub fn tag_key(tag: &str) -> String {
    tag.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Display form of a tag: trimmed with inner whitespace collapsed, casing kept.
pub fn tag_display(tag: &str) -> String {
    tag.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Ordered, duplicate-free union of tag lists.
///
/// Order is first-seen across the inputs and the first-seen casing wins.
/// Blank tags are dropped.
pub fn union_tags<'a, I, S>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [S]>,
    S: AsRef<str> + 'a,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for list in lists {
        for tag in list {
            let display = tag_display(tag.as_ref());
            if display.is_empty() {
                continue;
            }
            if seen.insert(tag_key(&display)) {
                out.push(display);
            }
        }
    }
    out
}

/// Lowercased key set for set arithmetic.
pub fn tag_set<S: AsRef<str>>(tags: &[S]) -> HashSet<String> {
    tags.iter()
        .map(|t| tag_key(t.as_ref()))
        .filter(|k| !k.is_empty())
        .collect()
}
