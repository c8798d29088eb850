use serde_json::json;
use xlchat_cli::chat::{
    derive_title, format_results, normalize, Reply, ResponseShape, FALLBACK_REPLY,
};

// ── normalize ─────────────────────────────────────────────────────────────────

#[test]
fn nested_results_array_is_unwrapped() {
    let reply = normalize(json!({"results": {"success": true, "results": [{"a": 1}]}}));
    assert_eq!(reply, Reply::Format(json!({"success": true, "results": [{"a": 1}]})));
}

#[test]
fn nested_without_success_omits_it() {
    let reply = normalize(json!({"results": {"results": []}}));
    assert_eq!(reply, Reply::Format(json!({"results": []})));
}

#[test]
fn inner_object_without_results_array_is_wrapped() {
    let reply = normalize(json!({"results": {"foo": "bar"}}));
    assert_eq!(reply, Reply::Format(json!({"results": [{"foo": "bar"}]})));
}

#[test]
fn wrapped_prefers_top_level_success() {
    let reply = normalize(json!({"success": false, "results": {"success": true, "foo": 1}}));
    assert_eq!(
        reply,
        Reply::Format(json!({"success": false, "results": [{"success": true, "foo": 1}]}))
    );
}

#[test]
fn wrapped_falls_back_to_inner_success() {
    let reply = normalize(json!({"success": null, "results": {"success": true, "foo": 1}}));
    assert_eq!(
        reply,
        Reply::Format(json!({"success": true, "results": [{"success": true, "foo": 1}]}))
    );
}

#[test]
fn inner_results_that_is_not_an_array_wraps_the_object() {
    let body = json!({"results": {"success": true, "results": {"x": 1}}});
    let reply = normalize(body);
    assert_eq!(
        reply,
        Reply::Format(json!({"success": true, "results": [{"success": true, "results": {"x": 1}}]}))
    );
}

#[test]
fn nested_error_is_kept_for_the_formatter() {
    let body = json!({"results": {
        "success": false,
        "error": "Could not determine which file to query.",
        "results": []
    }});
    let reply = normalize(body);
    assert_eq!(
        reply,
        Reply::Format(json!({
            "success": false,
            "error": "Could not determine which file to query.",
            "results": []
        }))
    );
    let Reply::Format(payload) = reply else { unreachable!() };
    assert_eq!(format_results(&payload), "Could not determine which file to query.");
}

#[test]
fn top_level_results_array_passes_body_through() {
    let body = json!({"success": true, "results": [{"filename": "a.xlsx"}], "extra": 3});
    assert_eq!(normalize(body.clone()), Reply::Format(body));
}

#[test]
fn scalar_results_pass_body_through() {
    for body in [json!({"results": "text"}), json!({"results": 42}), json!({"results": true})] {
        assert_eq!(normalize(body.clone()), Reply::Format(body));
    }
}

#[test]
fn message_is_used_verbatim() {
    assert_eq!(normalize(json!({"message": "hello"})), Reply::Text("hello".to_string()));
}

#[test]
fn results_take_precedence_over_message() {
    let reply = normalize(json!({"results": {"foo": 1}, "message": "ignored"}));
    assert!(matches!(reply, Reply::Format(_)));
}

#[test]
fn falsy_results_fall_through_to_message() {
    for results in [json!(null), json!(false), json!(0), json!("")] {
        let reply = normalize(json!({"results": results, "message": "m"}));
        assert_eq!(reply, Reply::Text("m".to_string()));
    }
}

#[test]
fn missing_everything_uses_fallback() {
    assert_eq!(normalize(json!({})), Reply::Text(FALLBACK_REPLY.to_string()));
    assert_eq!(normalize(json!({"message": ""})), Reply::Text(FALLBACK_REPLY.to_string()));
    assert_eq!(normalize(json!([1, 2])), Reply::Text(FALLBACK_REPLY.to_string()));
}

#[test]
fn classify_names_each_shape() {
    assert!(matches!(
        ResponseShape::classify(json!({"results": {"results": []}})),
        ResponseShape::Nested { .. }
    ));
    assert!(matches!(
        ResponseShape::classify(json!({"results": {"k": 1}})),
        ResponseShape::Wrapped { .. }
    ));
    assert!(matches!(
        ResponseShape::classify(json!({"results": []})),
        ResponseShape::PassThrough(_)
    ));
    assert!(matches!(
        ResponseShape::classify(json!({"message": "m"})),
        ResponseShape::Message(_)
    ));
    assert_eq!(ResponseShape::classify(json!({"other": 1})), ResponseShape::Empty);
}

// ── derive_title ──────────────────────────────────────────────────────────────

#[test]
fn long_title_is_truncated_and_cleaned() {
    // First 30 chars: "Hello, world! This is a long q", then "..." which is stripped too.
    assert_eq!(derive_title("Hello, world! This is a long query"), "Hello world This is a long q");
}

#[test]
fn punctuation_only_title_falls_back() {
    assert_eq!(derive_title("?!...,;"), "New Conversation");
    assert_eq!(derive_title("   "), "New Conversation");
}

#[test]
fn exactly_thirty_chars_is_not_truncated() {
    let msg = "abcdefghijklmnopqrstuvwxyz1234";
    assert_eq!(derive_title(msg), msg);
}

#[test]
fn underscores_and_digits_survive() {
    assert_eq!(derive_title("sum of col_2 (2024)"), "sum of col_2 2024");
}

// ── format_results ────────────────────────────────────────────────────────────

#[test]
fn formats_table_results() {
    let payload = json!({
        "success": true,
        "results": [{
            "filename": "sales.xlsx",
            "query": "sales by region",
            "success": true,
            "table_info": {
                "final_columns": ["Region", "Total"],
                "data_rows": [["North", 10], ["South", 7.5]]
            }
        }]
    });
    let text = format_results(&payload);
    assert!(text.contains("📄 sales.xlsx"));
    assert!(text.contains("Query: sales by region"));
    assert!(text.contains("Region │ Total"));
    assert!(text.contains("South  │ 7.5"));
}

#[test]
fn formats_result_message_when_no_table() {
    let payload = json!({"results": [{"filename": "a.xlsx", "success": false, "message": "No matching data found."}]});
    assert_eq!(format_results(&payload), "📄 a.xlsx\nNo matching data found.");
}

#[test]
fn empty_results_show_top_level_error() {
    let payload = json!({"success": false, "error": "Could not determine which file to query.", "results": []});
    assert_eq!(format_results(&payload), "Could not determine which file to query.");
}

#[test]
fn multiple_results_are_separated() {
    let payload = json!({"results": [{"message": "one"}, {"message": "two"}]});
    assert_eq!(format_results(&payload), "one\n\ntwo");
}

#[test]
fn non_list_results_are_shown_as_text() {
    assert_eq!(format_results(&json!({"results": "plain"})), "plain");
}
