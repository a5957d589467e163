//! Output formatting: JSON or tab-separated plain lines.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

use itch_core::{PushPayload, PushSlice, Record};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Serialize `data` as pretty or compact JSON.
pub fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let out = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(out)
}

/// Render a tab's view data.
///
/// `plain` prints one `slice<TAB>id<TAB>title` line per row: listed ids
/// first, in order, then any remaining rows of the slice.
pub fn render_tab(format: &OutputFormat, data: &PushPayload) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Plain => Ok(data
            .slices()
            .flat_map(|(name, slice)| plain_rows(name, slice))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

fn plain_rows(name: &str, slice: &PushSlice) -> Vec<String> {
    let listed = slice.ids.iter().filter_map(|id| slice.set.get(id));
    let unlisted = slice
        .set
        .iter()
        .filter(|(id, _)| !slice.ids.contains(id))
        .map(|(_, row)| row);
    listed
        .chain(unlisted)
        .map(|row| format!("{name}\t{}\t{}", field(row, "id"), field(row, "title")))
        .collect()
}

fn field(row: &Record, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Print to stdout unless `quiet`.
pub fn print_output(out: &str, quiet: bool) {
    if quiet || out.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    // A closed pipe is not worth a panic.
    let _ = writeln!(stdout, "{out}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use itch_core::EntityId;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn row(v: Value) -> Record {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn plain_lists_ids_in_order_then_the_rest() {
        let set = BTreeMap::from([
            (EntityId::Int(1), row(json!({"id": 1, "title": "One"}))),
            (EntityId::Int(2), row(json!({"id": 2, "title": "Two"}))),
            (EntityId::Int(3), row(json!({"id": 3}))),
        ]);
        let data = PushPayload::new().with(
            "games",
            PushSlice::new(set, vec![EntityId::Int(2), EntityId::Int(1)]),
        );

        let out = render_tab(&OutputFormat::Plain, &data).unwrap();
        assert_eq!(out, "games\t2\tTwo\ngames\t1\tOne\ngames\t3\t");
    }

    #[test]
    fn compact_json_is_one_line() {
        let data = PushPayload::new().with("games", PushSlice::default());
        let out = render_tab(&OutputFormat::JsonCompact, &data).unwrap();
        assert!(!out.contains('\n'));
        assert!(out.contains("\"games\""));
    }
}
