//! Tagged-block grammar parser.
//!
//! The first surface grammar embeds actions in the response text as
//! XML-ish blocks (`<edit>…</edit>`, `<create>…</create>`, …) with named
//! sub-tags for each field. Blocks are extracted in document order; a
//! block missing a required field is treated as prose and left in the
//! remainder, never an error. `<question>` blocks are not actions and
//! stay in the remainder for the user to read.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::action::{Action, Extraction, TaskStatus};
use crate::paths::normalize_path;

// ─────────────────────────────────────────────────────────────────────────────
// Block patterns
// ─────────────────────────────────────────────────────────────────────────────

static EDIT_BLOCK: LazyLock<Regex> = LazyLock::new(|| block_regex("edit"));
static CREATE_BLOCK: LazyLock<Regex> = LazyLock::new(|| block_regex("create"));
static DELETE_BLOCK: LazyLock<Regex> = LazyLock::new(|| block_regex("delete"));
static TASK_UPDATE_BLOCK: LazyLock<Regex> = LazyLock::new(|| block_regex("task_update"));
static SEARCH_BLOCK: LazyLock<Regex> = LazyLock::new(|| block_regex("search"));
static READ_RANGE_BLOCK: LazyLock<Regex> = LazyLock::new(|| block_regex("read_range"));
static WEB_SEARCH_BLOCK: LazyLock<Regex> = LazyLock::new(|| block_regex("web_search"));
static WEB_FETCH_BLOCK: LazyLock<Regex> = LazyLock::new(|| block_regex("web_fetch"));

fn block_regex(tag: &str) -> Regex {
    Regex::new(&format!(r"(?s)<{tag}>(.*?)</{tag}>")).expect("valid regex")
}

/// Returns the inner text of `<tag>…</tag>` within a block body.
fn field<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(&body[start..end])
}

/// Trims at most one leading and one trailing newline from a text payload,
/// preserving interior whitespace exactly.
fn text_payload(raw: &str) -> String {
    let s = raw.strip_prefix('\n').unwrap_or(raw);
    let s = s.strip_suffix('\n').unwrap_or(s);
    s.to_string()
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|kw| !kw.is_empty())
        .map(str::to_string)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Extraction
// ─────────────────────────────────────────────────────────────────────────────

/// Parses every recognized tagged block out of a response.
///
/// Actions are returned in document order, except that keywords from all
/// `<search>` blocks aggregate into a single [`Action::SearchRequest`] at
/// the position of the first one. The remainder is the response with the
/// recognized blocks cut out.
#[must_use]
pub fn parse_tagged(response: &str) -> Extraction {
    // (byte offset, byte range to remove, parsed action)
    let mut found: Vec<(usize, (usize, usize), Option<Action>)> = Vec::new();
    let mut keywords: Vec<String> = Vec::new();
    let mut first_search: Option<(usize, (usize, usize))> = None;

    let mut collect = |re: &Regex, parse: &dyn Fn(&str) -> Option<Action>| {
        for caps in re.captures_iter(response) {
            let whole = caps.get(0).expect("whole match");
            let body = caps.get(1).map_or("", |m| m.as_str());
            match parse(body) {
                Some(action) => {
                    found.push((whole.start(), (whole.start(), whole.end()), Some(action)));
                }
                None => debug!(block = %whole.as_str().chars().take(48).collect::<String>(),
                    "skipping malformed tagged block"),
            }
        }
    };

    collect(&EDIT_BLOCK, &|body| {
        Some(Action::Edit {
            path: normalize_path(field(body, "path")?),
            old_text: text_payload(field(body, "old_text")?),
            new_text: text_payload(field(body, "new_text")?),
        })
    });
    collect(&CREATE_BLOCK, &|body| {
        Some(Action::Create {
            path: normalize_path(field(body, "path")?),
            content: text_payload(field(body, "content")?),
        })
    });
    collect(&DELETE_BLOCK, &|body| {
        Some(Action::Delete {
            path: normalize_path(field(body, "path")?),
            reason: field(body, "reason").map(str::trim).unwrap_or_default().to_string(),
        })
    });
    collect(&TASK_UPDATE_BLOCK, &|body| {
        Some(Action::TaskUpdate {
            description: field(body, "description")?.trim().to_string(),
            status: TaskStatus::parse(field(body, "status")?)?,
        })
    });
    collect(&READ_RANGE_BLOCK, &|body| {
        Some(Action::ReadRangeRequest {
            path: normalize_path(field(body, "path")?),
            start_line: field(body, "start_line")?.trim().parse().ok()?,
            end_line: field(body, "end_line")?.trim().parse().ok()?,
        })
    });
    collect(&WEB_SEARCH_BLOCK, &|body| {
        Some(Action::WebSearchRequest {
            query: field(body, "query")?.trim().to_string(),
        })
    });
    collect(&WEB_FETCH_BLOCK, &|body| {
        Some(Action::WebFetchRequest {
            url: field(body, "url")?.trim().to_string(),
        })
    });

    for caps in SEARCH_BLOCK.captures_iter(response) {
        let whole = caps.get(0).expect("whole match");
        let body = caps.get(1).map_or("", |m| m.as_str());
        let Some(raw) = field(body, "keywords") else {
            debug!("skipping search block without keywords");
            continue;
        };
        let kws = split_keywords(raw);
        if kws.is_empty() {
            debug!("skipping search block with empty keywords");
            continue;
        }
        keywords.extend(kws);
        match first_search {
            Some(_) => found.push((whole.start(), (whole.start(), whole.end()), None)),
            None => first_search = Some((whole.start(), (whole.start(), whole.end()))),
        }
    }
    if let Some((offset, range)) = first_search {
        found.push((
            offset,
            range,
            Some(Action::SearchRequest { keywords }),
        ));
    }

    found.sort_by_key(|(offset, _, _)| *offset);

    let mut remainder = String::with_capacity(response.len());
    let mut cursor = 0usize;
    for (_, (start, end), _) in &found {
        remainder.push_str(&response[cursor..*start]);
        cursor = *end;
    }
    remainder.push_str(&response[cursor..]);

    Extraction {
        actions: found.into_iter().filter_map(|(_, _, action)| action).collect(),
        remainder: tidy_remainder(&remainder),
    }
}

/// Collapses the blank gaps left where blocks were cut out.
fn tidy_remainder(raw: &str) -> String {
    static BLANK_RUN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
    BLANK_RUN.replace_all(raw.trim(), "\n\n").into_owned()
}
