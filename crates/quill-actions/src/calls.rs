//! Structured tool-call grammar parser.
//!
//! The second surface grammar arrives as a list of named calls with JSON
//! argument objects, alongside the response's plain text. Calls map
//! field-for-field onto the same [`Action`] set the tagged grammar
//! produces, so a response saying the same thing in either grammar yields
//! structurally equal actions.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::action::{Action, Extraction, TaskStatus};
use crate::paths::normalize_path;

/// One structured call as received from the model layer.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Call name, e.g. `edit_file`.
    pub name: String,
    /// JSON argument object.
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchArgs {
    keywords: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadLinesArgs {
    path: String,
    start_line: usize,
    end_line: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditArgs {
    path: String,
    old_text: String,
    new_text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateArgs {
    path: String,
    content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteArgs {
    path: String,
    #[serde(default)]
    reason: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskArgs {
    description: String,
    status: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebSearchArgs {
    query: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebFetchArgs {
    url: String,
}

fn args<T: serde::de::DeserializeOwned>(call: &ToolCall) -> Option<T> {
    match serde_json::from_value(call.arguments.clone()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            debug!(name = %call.name, %err, "skipping tool call with malformed arguments");
            None
        }
    }
}

/// Parses a list of structured calls into the canonical action set.
///
/// Calls are processed in order. Keywords from every `search_codebase`
/// call aggregate into a single [`Action::SearchRequest`] at the position
/// of the first one. Unknown call names and malformed argument objects
/// are skipped. The plain text travels through as the remainder.
#[must_use]
pub fn parse_tool_calls(text: &str, calls: &[ToolCall]) -> Extraction {
    let mut actions: Vec<Action> = Vec::new();
    let mut search_slot: Option<usize> = None;
    let mut keywords: Vec<String> = Vec::new();

    for call in calls {
        match call.name.as_str() {
            "search_codebase" => {
                if let Some(a) = args::<SearchArgs>(call) {
                    if search_slot.is_none() {
                        search_slot = Some(actions.len());
                        actions.push(Action::SearchRequest { keywords: vec![] });
                    }
                    keywords.extend(a.keywords);
                }
            }
            "read_lines" => {
                if let Some(a) = args::<ReadLinesArgs>(call) {
                    actions.push(Action::ReadRangeRequest {
                        path: normalize_path(&a.path),
                        start_line: a.start_line,
                        end_line: a.end_line,
                    });
                }
            }
            "edit_file" => {
                if let Some(a) = args::<EditArgs>(call) {
                    actions.push(Action::Edit {
                        path: normalize_path(&a.path),
                        old_text: a.old_text,
                        new_text: a.new_text,
                    });
                }
            }
            "create_file" => {
                if let Some(a) = args::<CreateArgs>(call) {
                    actions.push(Action::Create {
                        path: normalize_path(&a.path),
                        content: a.content,
                    });
                }
            }
            "delete_file" => {
                if let Some(a) = args::<DeleteArgs>(call) {
                    actions.push(Action::Delete {
                        path: normalize_path(&a.path),
                        reason: a.reason,
                    });
                }
            }
            "update_task" => {
                if let Some(a) = args::<UpdateTaskArgs>(call) {
                    match TaskStatus::parse(&a.status) {
                        Some(status) => actions.push(Action::TaskUpdate {
                            description: a.description,
                            status,
                        }),
                        None => debug!(status = %a.status, "skipping task update with unknown status"),
                    }
                }
            }
            "web_search" => {
                if let Some(a) = args::<WebSearchArgs>(call) {
                    actions.push(Action::WebSearchRequest { query: a.query });
                }
            }
            "web_fetch" => {
                if let Some(a) = args::<WebFetchArgs>(call) {
                    actions.push(Action::WebFetchRequest { url: a.url });
                }
            }
            other => debug!(name = %other, "skipping unknown tool call"),
        }
    }

    if let Some(slot) = search_slot {
        if keywords.is_empty() {
            let _ = actions.remove(slot);
        } else {
            actions[slot] = Action::SearchRequest { keywords };
        }
    }

    Extraction {
        actions,
        remainder: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tagged::parse_tagged;

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            name: name.into(),
            arguments,
        }
    }

    #[test]
    fn maps_calls_field_for_field() {
        let calls = vec![
            call(
                "edit_file",
                json!({"path": "src/util.rs", "oldText": "fn helper() {}", "newText": "fn renamed_helper() {}"}),
            ),
            call(
                "read_lines",
                json!({"path": "src/lib.rs", "startLine": 10, "endLine": 25}),
            ),
        ];
        let out = parse_tool_calls("ok", &calls);
        assert_eq!(
            out.actions,
            vec![
                Action::Edit {
                    path: "src/util.rs".into(),
                    old_text: "fn helper() {}".into(),
                    new_text: "fn renamed_helper() {}".into(),
                },
                Action::ReadRangeRequest {
                    path: "src/lib.rs".into(),
                    start_line: 10,
                    end_line: 25,
                },
            ]
        );
        assert_eq!(out.remainder, "ok");
    }

    #[test]
    fn search_calls_aggregate_into_one_request() {
        let calls = vec![
            call("search_codebase", json!({"keywords": ["parser", "lexer"]})),
            call("web_fetch", json!({"url": "https://example.com"})),
            call("search_codebase", json!({"keywords": ["tokenizer"]})),
        ];
        let out = parse_tool_calls("", &calls);
        assert_eq!(
            out.actions,
            vec![
                Action::SearchRequest {
                    keywords: vec!["parser".into(), "lexer".into(), "tokenizer".into()],
                },
                Action::WebFetchRequest {
                    url: "https://example.com".into()
                },
            ]
        );
    }

    #[test]
    fn unknown_and_malformed_calls_are_skipped() {
        let calls = vec![
            call("format_disk", json!({})),
            call("edit_file", json!({"path": "a.rs"})),
            call("delete_file", json!({"path": "old.rs"})),
        ];
        let out = parse_tool_calls("", &calls);
        assert_eq!(
            out.actions,
            vec![Action::Delete {
                path: "old.rs".into(),
                reason: String::new(),
            }]
        );
    }

    #[test]
    fn task_status_keywords_match_tagged_grammar() {
        let calls = vec![call(
            "update_task",
            json!({"description": "wire logging", "status": "done"}),
        )];
        let out = parse_tool_calls("", &calls);
        assert_eq!(
            out.actions,
            vec![Action::TaskUpdate {
                description: "wire logging".into(),
                status: TaskStatus::Completed,
            }]
        );
    }

    #[test]
    fn equivalent_responses_yield_equal_actions_across_grammars() {
        let tagged = parse_tagged(
            "\
<search>
<keywords>ledger, budget</keywords>
</search>
<edit>
<path>`src/budget.rs`</path>
<old_text>
let share = 0.3;
</old_text>
<new_text>
let share = 0.35;
</new_text>
</edit>
<task_update>
<description>retune shares</description>
<status>completed</status>
</task_update>",
        );
        let calls = vec![
            call("search_codebase", json!({"keywords": ["ledger", "budget"]})),
            call(
                "edit_file",
                json!({"path": "`src/budget.rs`", "oldText": "let share = 0.3;", "newText": "let share = 0.35;"}),
            ),
            call(
                "update_task",
                json!({"description": "retune shares", "status": "completed"}),
            ),
        ];
        let structured = parse_tool_calls("", &calls);
        assert_eq!(tagged.actions, structured.actions);
        assert!(tagged.has_actions());
        assert!(structured.has_actions());
    }
}
