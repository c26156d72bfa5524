use serde_json::Value;

/// Quote a single field for delimited output.
///
/// Fields containing the delimiter, a double quote, or a line break are
/// wrapped in double quotes with embedded quotes doubled (RFC 4180).
///
/// # Examples
///
/// ```
/// use sessions_core::formatting::quote_field;
///
/// assert_eq!(quote_field("view", ','), "view");
/// assert_eq!(quote_field("a,b", ','), "\"a,b\"");
/// assert_eq!(quote_field("say \"hi\"", ','), "\"say \"\"hi\"\"\"");
/// ```
pub fn quote_field(field: &str, delimiter: char) -> String {
    let needs_quotes = field
        .chars()
        .any(|c| c == delimiter || c == '"' || c == '\n' || c == '\r');

    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render one row of already-stringified cells.
pub fn format_row<S: AsRef<str>>(cells: &[S], delimiter: char) -> String {
    let sep = delimiter.to_string();
    cells
        .iter()
        .map(|c| quote_field(c.as_ref(), delimiter))
        .collect::<Vec<_>>()
        .join(&sep)
}

/// Render a header line followed by `rows`, each terminated by `\n`.
///
/// An empty `rows` still yields the header line so the output keeps its
/// column layout.
pub fn render_table<S: AsRef<str>>(headers: &[&str], rows: &[Vec<S>], delimiter: char) -> String {
    let mut out = format_row(headers, delimiter);
    out.push('\n');
    for row in rows {
        out.push_str(&format_row(row, delimiter));
        out.push('\n');
    }
    out
}

/// Render an optional raw JSON value as a table cell.
///
/// Strings are written bare, other values as compact JSON, and absent
/// values as an empty cell.
pub fn value_cell(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
