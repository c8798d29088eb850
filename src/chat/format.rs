use serde_json::Value;

/// Rows shown per result table before the rest is summarized.
const MAX_TABLE_ROWS: usize = 20;

/// Render a query payload (`{success, results: [...]}`) as transcript text.
///
/// Each result becomes a section headed by its file name and sub-query,
/// followed by its table or its message. Payloads that do not carry a
/// results list are shown as pretty-printed JSON.
pub fn format_results(payload: &Value) -> String {
    let results = match payload.get("results") {
        Some(Value::Array(items)) => items,
        Some(other) => return scalar_text(other),
        None => return pretty(payload),
    };

    if results.is_empty() {
        return match payload.get("error").and_then(Value::as_str) {
            Some(error) => error.to_string(),
            None => "No results found.".to_string(),
        };
    }

    results
        .iter()
        .map(format_result)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_result(result: &Value) -> String {
    let Some(obj) = result.as_object() else {
        return scalar_text(result);
    };

    let mut out = Vec::new();
    if let Some(filename) = obj.get("filename").and_then(Value::as_str) {
        out.push(format!("📄 {filename}"));
    }
    if let Some(query) = obj.get("query").and_then(Value::as_str) {
        out.push(format!("Query: {query}"));
    }

    let table = obj
        .get("table_info")
        .filter(|t| !t.is_null())
        .or_else(|| obj.get("flattened_table_info").filter(|t| !t.is_null()));
    if let Some(table) = table {
        out.push(format_table(table));
    } else if let Some(text) = obj
        .get("message")
        .or_else(|| obj.get("error"))
        .and_then(Value::as_str)
    {
        out.push(text.to_string());
    } else if out.is_empty() {
        out.push(pretty(result));
    }
    out.join("\n")
}

/// Plain-text table from `final_columns` + `data_rows`.
fn format_table(table: &Value) -> String {
    let columns: Vec<String> = table
        .get("final_columns")
        .and_then(Value::as_array)
        .map(|cols| cols.iter().map(scalar_text).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<String>> = table
        .get("data_rows")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| match row.as_array() {
                    Some(cells) => cells.iter().map(scalar_text).collect(),
                    None => vec![scalar_text(row)],
                })
                .collect()
        })
        .unwrap_or_default();

    if columns.is_empty() && rows.is_empty() {
        return "No matching data found.".to_string();
    }

    let ncols = rows.iter().map(Vec::len).chain([columns.len()]).max().unwrap_or(0);
    let mut widths = vec![0usize; ncols];
    for row in std::iter::once(&columns).chain(rows.iter().take(MAX_TABLE_ROWS)) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let render_row = |cells: &[String]| -> String {
        (0..ncols)
            .map(|i| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                let pad = widths[i].saturating_sub(cell.chars().count());
                format!("{cell}{}", " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join(" │ ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::new();
    if !columns.is_empty() {
        lines.push(render_row(&columns));
        lines.push(
            widths
                .iter()
                .map(|w| "─".repeat(*w))
                .collect::<Vec<_>>()
                .join("─┼─"),
        );
    }
    for row in rows.iter().take(MAX_TABLE_ROWS) {
        lines.push(render_row(row));
    }
    if rows.len() > MAX_TABLE_ROWS {
        lines.push(format!("… {} more row(s)", rows.len() - MAX_TABLE_ROWS));
    }
    lines.join("\n")
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
