use std::collections::BTreeSet;

/// Line-continuation marker appended to every list line but the last.
pub const CONTINUATION: &str = " \\";

fn sorted_unique<I, S>(entries: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries.into_iter().map(|e| e.as_ref().to_string()).collect()
}

/// One `prefix + entry` per line, deduplicated and sorted.
///
/// All lines but the last end with [`CONTINUATION`], every line ends with
/// a newline. Empty input renders as an empty string.
pub fn format_list<I, S>(entries: I, prefix: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines: Vec<String> = sorted_unique(entries)
        .iter()
        .map(|entry| format!("{prefix}{entry}"))
        .collect();
    if lines.is_empty() {
        return String::new();
    }
    let separator = format!("{CONTINUATION}\n");
    lines.join(&separator) + "\n"
}

/// Deduplicated, sorted `prefix + entry + ' '` on a single line.
pub fn format_single_line<I, S>(entries: I, prefix: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    sorted_unique(entries)
        .iter()
        .map(|entry| format!("{prefix}{entry} "))
        .collect()
}

/// Prepends `prefix` unless `token` is empty or already contains it.
pub fn prefix_if_missing(token: &str, prefix: &str) -> String {
    let token = token.trim();
    if token.is_empty() {
        return String::new();
    }
    if token.contains(prefix) {
        return token.to_string();
    }
    format!("{prefix}{token}")
}

/// Strips one leading `prefix` from each entry; the rest is kept intact.
pub fn strip_prefix<I, S>(entries: I, prefix: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|entry| {
            let entry = entry.as_ref();
            entry.strip_prefix(prefix).unwrap_or(entry).to_string()
        })
        .collect()
}
