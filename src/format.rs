//! Formatting helpers: timestamps, previews and bot-message HTML.

use ammonia::Builder;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use time::format_description::{BorrowedFormatItem, well_known::Rfc3339};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub const PREVIEW_CHARS: usize = 60;
pub const INVALID_DATE: &str = "Invalid Date";

/// Tags a bot reply may keep
const ALLOWED_TAGS: [&str; 9] = ["b", "strong", "a", "ul", "ol", "li", "p", "em", "i"];

/// Timestamps without an offset are read as UTC
const NAIVE_FORMATS: [&[BorrowedFormatItem<'static>]; 5] = [
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];

const DATE_ONLY: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

const DISPLAY_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[day padding:none] [month repr:short] [year]");

const DISPLAY_DATE_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[day padding:none] [month repr:short] [year], [hour]:[minute]");

/// Parse an upstream `CREATED DATE` value
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    for desc in NAIVE_FORMATS {
        if let Ok(dt) = PrimitiveDateTime::parse(raw, desc) {
            return Some(dt.assume_utc());
        }
    }
    Date::parse(raw, DATE_ONLY)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Shift into the local offset, falling back to UTC when it can't be determined
pub fn to_local(ts: OffsetDateTime) -> OffsetDateTime {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    ts.to_offset(offset)
}

fn format_with(ts: Option<OffsetDateTime>, desc: &[BorrowedFormatItem<'_>]) -> String {
    ts.and_then(|ts| ts.format(desc).ok())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

/// `1 Jan 2024`
pub fn format_date(ts: Option<OffsetDateTime>) -> String {
    format_with(ts, DISPLAY_DATE)
}

/// `1 Jan 2024, 09:05`
pub fn format_date_time(ts: Option<OffsetDateTime>) -> String {
    format_with(ts, DISPLAY_DATE_TIME)
}

/// Truncate a string to max_chars, adding "..." if truncated
pub fn truncate(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let mut out: String = input.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

static BOT_HTML: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut tags: HashSet<&str> = ALLOWED_TAGS.into_iter().collect();
    // Line breaks survive sanitizing only to be turned into newlines below.
    tags.insert("br");

    let mut builder = Builder::default();
    builder
        .tags(tags)
        .generic_attributes(HashSet::new())
        .tag_attributes(HashMap::from([("a", HashSet::from(["href"]))]))
        .link_rel(Some("noopener"))
        .set_tag_attribute_value("a", "target", "_blank");
    builder
});

static TEXT_ONLY: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut builder = Builder::empty();
    builder.clean_content_tags(HashSet::from(["script", "style"]));
    builder
});

/// Sanitize a bot reply down to the allowed tags and collapse its layout into
/// `<br>`-separated lines.
///
/// `script` and `style` are dropped with their content, any other unknown tag
/// is unwrapped. Links open in a new tab without an opener reference.
pub fn format_html_message(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let clean = BOT_HTML.clean(html).to_string();
    clean
        .replace("<br>", "\n")
        .replace("</p>", "\n\n")
        .replace("<p>", "")
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("<br>")
}

/// Bot reply as terminal text, one line per `<br>`
pub fn plain_text(html: &str) -> String {
    let formatted = format_html_message(html).replace("<br>", "\n");
    let text = TEXT_ONLY.clean(&formatted).to_string();
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
