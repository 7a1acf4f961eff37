//! Result rendering — raw provider payloads to one readable chat message.
//!
//! List-shaped responses become a numbered listing, one line per entry,
//! using per-provider field preferences (repo name, subject + sender +
//! date, full path, …). Everything else falls back to key/value lines or a
//! structured dump. Rendering never fails: any unrecognized or malformed
//! payload still produces a string.

pub mod shapes;

use serde_json::Value;

pub use shapes::{detect, ResponseShape};

/// Listing cap — entries beyond this are summarized, not printed.
const MAX_ENTRIES: usize = 50;

/// Longest single rendered line before truncation.
const MAX_LINE_LEN: usize = 200;

/// Render a raw result payload for a provider into display text.
pub fn render_result(provider: &str, raw: &Value) -> String {
    match detect(raw) {
        ResponseShape::Entries(entries) => render_listing(
            entries.iter().map(|e| entry_line(provider, e)),
            entries.len(),
        ),
        ResponseShape::OutputRows(rows) => {
            let total = rows.len();
            render_listing(rows.into_iter().map(str::to_string), total)
        }
        ResponseShape::Object(map) => render_object(map),
        ResponseShape::Other(value) => render_dump(value),
    }
}

// ─── Listings ────────────────────────────────────────────────────────────────

/// Number the first `MAX_ENTRIES` lines; summarize the rest.
fn render_listing(lines: impl Iterator<Item = String>, total: usize) -> String {
    if total == 0 {
        return "No results.".to_string();
    }

    let mut out = String::new();
    for (index, line) in lines.take(MAX_ENTRIES).enumerate() {
        out.push_str(&format!("{}. {}\n", index + 1, truncate_line(&line)));
    }
    if total > MAX_ENTRIES {
        out.push_str(&format!("…and {} more\n", total - MAX_ENTRIES));
    }
    out.trim_end().to_string()
}

/// One listing line for an entry, using the provider's field preferences.
fn entry_line(provider: &str, entry: &Value) -> String {
    if let Value::String(s) = entry {
        return s.clone();
    }
    let Value::Object(map) = entry else {
        return compact(entry);
    };

    match provider {
        "github" | "gitlab" => str_field(map, &["full_name", "name", "title"])
            .map(str::to_string)
            .unwrap_or_else(|| generic_line(map)),
        "mail" => {
            let subject = str_field(map, &["subject", "title"]).unwrap_or("(no subject)");
            let sender = str_field(map, &["from", "sender"]);
            let date = str_field(map, &["date", "received_at", "receivedAt"]);
            match (sender, date) {
                (Some(sender), Some(date)) => format!("{subject} — {sender} ({date})"),
                (Some(sender), None) => format!("{subject} — {sender}"),
                _ => subject.to_string(),
            }
        }
        "drive" | "dropbox" => str_field(map, &["path", "path_display", "name"])
            .map(str::to_string)
            .unwrap_or_else(|| generic_line(map)),
        "calendar" => {
            let title = str_field(map, &["title", "summary"]).unwrap_or("(untitled)");
            match str_field(map, &["start", "start_time", "when"]) {
                Some(start) => format!("{title} ({start})"),
                None => title.to_string(),
            }
        }
        _ => generic_line(map),
    }
}

/// Fallback line for an object entry: the first conventional label field,
/// else the compact object itself.
fn generic_line(map: &serde_json::Map<String, Value>) -> String {
    str_field(map, &["name", "title", "id", "subject", "label"])
        .map(str::to_string)
        .unwrap_or_else(|| compact(&Value::Object(map.clone())))
}

/// First present string field among the preferred names.
fn str_field<'a>(map: &'a serde_json::Map<String, Value>, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|n| map.get(*n).and_then(Value::as_str))
}

// ─── Fallbacks ───────────────────────────────────────────────────────────────

/// `key: value` lines for an object that matched no list shape.
fn render_object(map: &serde_json::Map<String, Value>) -> String {
    if map.is_empty() {
        return "Done.".to_string();
    }

    let mut out = String::new();
    for (key, value) in map.iter().take(MAX_ENTRIES) {
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => compact(other),
        };
        out.push_str(&format!("{key}: {}\n", truncate_line(&rendered)));
    }
    out.trim_end().to_string()
}

/// Structured dump for scalars and anything unrecognized.
fn render_dump(value: &Value) -> String {
    match value {
        Value::Null => "Done.".to_string(),
        Value::String(s) if s.is_empty() => "Done.".to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Compact single-line JSON for a value.
fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

/// Truncate a rendered line at a char boundary.
fn truncate_line(line: &str) -> String {
    if line.len() <= MAX_LINE_LEN {
        return line.to_string();
    }
    let mut end = MAX_LINE_LEN;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &line[..end])
}

// ─── Tests ───────────────────────────────────────────────────────────────────
