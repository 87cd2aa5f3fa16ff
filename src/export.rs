//! JSON export of a session.
//!
//! Layout:
//! ```json
//! {
//!   "experimentInfo": { "name", "startTime", "endTime", "totalTime",
//!                       "<totalKey>", "totalPoints", ...summary },
//!   "<recordsKey>": [ { "<indexKey>", ...detail, "timestamp", "reactionTime" } ]
//! }
//! ```
//! `reactionTime` is the gap to the previous record (0 for the first).
//! Unfinished runs export what they have, with `endTime` set to now.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::LabResult;
use crate::clock::{Clock, iso_millis};
use crate::systems::sdk::{Experiment, Session, SessionState};

/// `<slug>-results-<unixMillis>.json`
pub fn file_name(slug: &str, now_ms: i64) -> String {
    format!("{slug}-results-{now_ms}.json")
}

/// Build the export document for `state` as of `now_ms`.
pub fn export_document<E: Experiment>(exp: &E, state: &SessionState<E>, now_ms: i64) -> LabResult<Value> {
    let meta = exp.meta();
    let end_ms = state.ended_ms.unwrap_or(now_ms);

    let mut info = Map::new();
    info.insert("name".into(), json!(meta.name));
    info.insert("startTime".into(), json!(state.started_ms.map(iso_millis)));
    info.insert("endTime".into(), json!(iso_millis(end_ms)));
    info.insert("totalTime".into(), json!(state.started_ms.map(|s| end_ms - s)));
    info.insert(meta.total_key.into(), json!(state.total_trials()));
    info.insert("totalPoints".into(), json!(state.cumulative_score));
    merge(&mut info, &exp.summarize(&state.history))?;

    let mut previous = None;
    let mut rows = Vec::with_capacity(state.history.len());
    for rec in &state.history {
        let mut row = Map::new();
        row.insert(meta.index_key.into(), json!(rec.trial_index + 1));
        merge(&mut row, &rec.detail)?;
        row.insert("timestamp".into(), json!(iso_millis(rec.timestamp_ms)));
        row.insert("reactionTime".into(), json!(previous.map_or(0, |p| rec.timestamp_ms - p)));
        previous = Some(rec.timestamp_ms);
        rows.push(Value::Object(row));
    }

    let mut doc = Map::new();
    doc.insert("experimentInfo".into(), Value::Object(info));
    doc.insert(meta.records_key.into(), Value::Array(rows));
    Ok(Value::Object(doc))
}

/// Export a live session using its own clock; returns `(file name, document)`.
pub fn export_session<E: Experiment, C: Clock>(session: &Session<E, C>) -> LabResult<(String, Value)> {
    let now_ms = session.now_ms();
    let doc = export_document(session.experiment(), session.state(), now_ms)?;
    Ok((file_name(session.experiment().meta().slug, now_ms), doc))
}

/// Pretty-printed JSON, two-space indented.
pub fn to_pretty(doc: &Value) -> LabResult<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Flatten a struct's fields into `into`; non-object values land under `"value"`.
fn merge<T: Serialize>(into: &mut Map<String, Value>, item: &T) -> LabResult<()> {
    match serde_json::to_value(item)? {
        Value::Object(fields) => into.extend(fields),
        Value::Null => {}
        other => {
            into.insert("value".into(), other);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_embeds_slug_and_millis() {
        assert_eq!(file_name("dictator-game", 1_700_000_000_123), "dictator-game-results-1700000000123.json");
    }

    #[test]
    fn merge_flattens_objects_and_wraps_scalars() {
        let mut m = Map::new();
        merge(&mut m, &json!({ "a": 1, "b": true })).unwrap();
        merge(&mut m, &3.5).unwrap();
        assert_eq!(Value::Object(m), json!({ "a": 1, "b": true, "value": 3.5 }));
    }
}
