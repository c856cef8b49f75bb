//! Whole-store backup documents.
//!
//! An export carries every persisted key. Daily intentions are grouped under `data.intentions`
//! and values that are not valid JSON under `data.unparsed`, both as raw strings; every other key
//! is written under its own name with its JSON value parsed. Import writes the values back
//! verbatim, overwriting what is there.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::{
    ACTIVITY_LOG, CALENDAR_EVENTS, GOALS, INTENTION_PREFIX, JOURNAL_ENTRIES, MONTHLY_REVIEWS,
    PROJECTS, TIME_ENTRIES, iso_millis,
};
use crate::repository::encode;
use crate::store::{KeyedStore, StoreError, UnitOfWork};

pub const EXPORT_VERSION: &str = "1.0";
pub const INTENTIONS_KEY: &str = "intentions";
pub const UNPARSED_KEY: &str = "unparsed";

/// Namespaces always present in an export, with the value used when the key is absent.
const COLLECTIONS: [(&str, DefaultValue); 7] = [
    (CALENDAR_EVENTS, DefaultValue::List),
    (ACTIVITY_LOG, DefaultValue::List),
    (GOALS, DefaultValue::List),
    (PROJECTS, DefaultValue::List),
    (TIME_ENTRIES, DefaultValue::List),
    (MONTHLY_REVIEWS, DefaultValue::Map),
    (JOURNAL_ENTRIES, DefaultValue::List),
];

#[derive(Debug, Clone, Copy)]
enum DefaultValue {
    List,
    Map,
}

impl DefaultValue {
    fn value(self) -> Value {
        match self {
            DefaultValue::List => Value::Array(Vec::new()),
            DefaultValue::Map => Value::Object(Map::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    #[serde(with = "iso_millis")]
    pub exported_at: DateTime<Utc>,
    pub data: Map<String, Value>,
}

impl ExportDocument {
    pub fn to_json_pretty(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(self).map_err(StoreError::Encode)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub namespaces: usize,
    pub intentions: usize,
}

pub fn export_all<S: KeyedStore + ?Sized>(store: &S, now: DateTime<Utc>) -> ExportDocument {
    let mut data = Map::new();
    let mut intentions = Map::new();
    let mut unparsed = Map::new();

    for key in store.keys() {
        let Some(raw) = store.get(&key) else {
            continue;
        };
        if key.starts_with(INTENTION_PREFIX) {
            intentions.insert(key, Value::String(raw));
            continue;
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => {
                data.insert(key, value);
            }
            Err(err) => {
                log::warn!("exporting {key} verbatim, it is not valid JSON: {err}");
                unparsed.insert(key, Value::String(raw));
            }
        }
    }

    let mut ordered = Map::new();
    ordered.insert(INTENTIONS_KEY.to_string(), Value::Object(intentions));
    for (namespace, default) in COLLECTIONS {
        let value = data.remove(namespace).unwrap_or_else(|| default.value());
        ordered.insert(namespace.to_string(), value);
    }
    ordered.extend(data);
    if !unparsed.is_empty() {
        ordered.insert(UNPARSED_KEY.to_string(), Value::Object(unparsed));
    }

    log::info!("exported {} namespaces", ordered.len());
    ExportDocument {
        version: EXPORT_VERSION.to_string(),
        exported_at: now,
        data: ordered,
    }
}

/// Parses a backup document. Nothing is written unless the whole document is usable.
pub fn parse_document(raw: &str) -> Result<Map<String, Value>, AppError> {
    let document: Value = serde_json::from_str(raw)
        .map_err(|err| AppError::InvalidImport(format!("not valid JSON: {err}")))?;
    let Value::Object(mut document) = document else {
        return Err(AppError::InvalidImport("expected a JSON object".to_string()));
    };

    if !document.contains_key("version") {
        return Err(AppError::InvalidImport("missing version field".to_string()));
    }

    match document.remove("data") {
        Some(Value::Object(data)) => Ok(data),
        Some(_) => Err(AppError::InvalidImport("data must be an object".to_string())),
        None => Err(AppError::InvalidImport("missing data field".to_string())),
    }
}

/// Overwrites every namespace named in the document as one unit of work. Keys the document
/// does not mention are left alone; callers reload their state afterwards.
pub fn import_all<S: KeyedStore + ?Sized>(store: &mut S, raw: &str) -> Result<ImportSummary, AppError> {
    let mut data = parse_document(raw)?;
    let mut summary = ImportSummary::default();
    let mut work = UnitOfWork::new();

    let unparsed = match data.remove(UNPARSED_KEY) {
        Some(Value::Object(unparsed)) => unparsed,
        Some(_) => {
            log::warn!("skipping {UNPARSED_KEY}, expected an object");
            Map::new()
        }
        None => Map::new(),
    };

    for (key, value) in data {
        if key == INTENTIONS_KEY {
            let Value::Object(intentions) = value else {
                log::warn!("skipping intentions, expected an object");
                continue;
            };
            for (intention_key, text) in intentions {
                work.set(&intention_key, raw_text(text));
                summary.intentions += 1;
            }
            continue;
        }

        // The raw copy wins over the placeholder default written for a collection.
        if unparsed.contains_key(&key) {
            continue;
        }
        work.set(&key, encode(&value)?);
        summary.namespaces += 1;
    }

    for (key, text) in unparsed {
        work.set(&key, raw_text(text));
        summary.namespaces += 1;
    }

    work.commit(store)?;
    log::info!(
        "imported {} namespaces and {} intentions",
        summary.namespaces,
        summary.intentions
    );
    Ok(summary)
}

fn raw_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

pub fn clear_all<S: KeyedStore + ?Sized>(store: &mut S) -> Result<(), AppError> {
    store.clear()?;
    log::info!("cleared every namespace");
    Ok(())
}

/// Stored value length in KiB, counted in UTF-16 code units like browser string lengths.
/// Keys are not counted.
pub fn data_size_kb<S: KeyedStore + ?Sized>(store: &S) -> f64 {
    let units: usize = store
        .keys()
        .iter()
        .filter_map(|key| store.get(key))
        .map(|value| value.encode_utf16().count())
        .sum();
    units as f64 / 1024.0
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use crate::error::AppError;
    use crate::models::Category;
    use crate::planner::NewGoal;
    use crate::store::{KeyedStore, MemoryStore};
    use crate::test_utils::{FlakyStore, at, memory_workspace};
    use crate::tracker::ManualEntry;
    use crate::workspace::Workspace;

    use super::{clear_all, data_size_kb, export_all, import_all};

    fn populated() -> Workspace<MemoryStore> {
        let mut workspace = memory_workspace();
        let now = at(2026, 10, 14, 9, 0, 0);
        workspace
            .log_manual_entry(
                now,
                ManualEntry {
                    description: "Write".to_string(),
                    category: Category::Work,
                    goal_id: None,
                    start: now,
                    end: now + Duration::minutes(90),
                },
            )
            .expect("manual entry");
        workspace
            .add_goal(
                now,
                NewGoal {
                    title: "Novel".to_string(),
                    kind: crate::models::GoalType::Personal,
                    deadline: Some("2026-12-31".to_string()),
                    progress: 20,
                },
            )
            .expect("goal");
        workspace
            .set_intention(now.date_naive(), "Stay focused")
            .expect("intention");
        workspace
            .log_energy(now.date_naive(), 4)
            .expect("energy");
        workspace
            .store_mut()
            .set("theme_override", "\"night\"".to_string())
            .expect("extra key");
        workspace
    }

    #[test]
    fn export_then_import_restores_every_namespace() {
        let source = populated();
        let document = export_all(source.store(), at(2026, 10, 14, 12, 0, 0));
        let raw = document.to_json_pretty().expect("encode");

        let mut target = MemoryStore::new();
        target
            .set("goals", "[\"stale\"]".to_string())
            .expect("seed");
        import_all(&mut target, &raw).expect("import");

        for key in source.store().keys() {
            assert_eq!(target.get(&key), source.store().get(&key), "namespace {key}");
        }
        assert_eq!(target.get("projects").as_deref(), Some("[]"));
    }

    #[test]
    fn export_document_has_the_documented_shape() {
        let source = populated();
        let document = export_all(source.store(), at(2026, 10, 14, 12, 0, 0));
        let value = serde_json::to_value(&document).expect("encode");

        assert_eq!(value["version"], "1.0");
        assert_eq!(value["exportedAt"], "2026-10-14T12:00:00.000Z");
        assert_eq!(
            value["data"]["intentions"],
            json!({ "intention_Wed Oct 14 2026": "Stay focused" })
        );
        assert_eq!(value["data"]["calendar_events"], json!([]));
        assert_eq!(value["data"]["goals"][0]["title"], "Novel");
        assert_eq!(value["data"]["monthly_reviews"]["2026-10"]["energy"]["Wed Oct 14 2026"], 4);
        assert_eq!(value["data"]["theme_override"], "night");

        let keys = document.data.keys().take(8).cloned().collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec![
                "intentions",
                "calendar_events",
                "activity_log",
                "goals",
                "projects",
                "time_entries",
                "monthly_reviews",
                "journal_entries",
            ]
        );
    }

    #[test]
    fn invalid_documents_write_nothing() {
        let mut store = MemoryStore::new();
        store.set("goals", "[]".to_string()).expect("seed");

        for raw in [
            "{ nope",
            "[1, 2]",
            r#"{"data": {"goals": [1]}}"#,
            r#"{"version": "1.0", "data": []}"#,
        ] {
            assert!(matches!(
                import_all(&mut store, raw),
                Err(AppError::InvalidImport(_))
            ));
        }
        assert_eq!(store.keys(), vec!["goals".to_string()]);
        assert_eq!(store.get("goals").as_deref(), Some("[]"));
    }

    #[test]
    fn failed_import_leaves_the_store_untouched() {
        let mut store = FlakyStore::failing_on("time_entries");
        store.set("goals", "[]".to_string()).expect("seed");
        let raw = r#"{"version":"1.0","data":{"goals":[{"id":1}],"time_entries":[]}}"#;

        assert!(matches!(import_all(&mut store, raw), Err(AppError::Store(_))));
        assert_eq!(store.get("goals").as_deref(), Some("[]"));
    }

    #[test]
    fn unknown_namespaces_pass_through_on_import() {
        let mut store = MemoryStore::new();
        let raw = r#"{"version":"0.9","data":{"habits":[{"id":1}],"intentions":{"intention_Sun Oct 04 2026":"Rest"}}}"#;

        let summary = import_all(&mut store, raw).expect("import");
        assert_eq!(summary.namespaces, 1);
        assert_eq!(summary.intentions, 1);
        assert_eq!(store.get("habits").as_deref(), Some(r#"[{"id":1}]"#));
        assert_eq!(store.get("intention_Sun Oct 04 2026").as_deref(), Some("Rest"));
    }

    #[test]
    fn values_that_are_not_json_survive_the_round_trip() {
        let mut source = MemoryStore::new();
        source.set("goals", "{ not json".to_string()).expect("seed");
        source.set("theme", "night".to_string()).expect("seed");
        source.set("projects", "[]".to_string()).expect("seed");

        let document = export_all(&source, at(2026, 10, 14, 12, 0, 0));
        assert_eq!(document.data["goals"], json!([]));
        assert_eq!(
            document.data["unparsed"],
            json!({ "goals": "{ not json", "theme": "night" })
        );

        let raw = document.to_json_pretty().expect("encode");
        let mut target = MemoryStore::new();
        import_all(&mut target, &raw).expect("import");

        for key in source.keys() {
            assert_eq!(target.get(&key), source.get(&key), "namespace {key}");
        }
    }

    #[test]
    fn data_size_counts_value_length_in_utf16_units() {
        let mut store = MemoryStore::new();
        store.set("intention_Sun Oct 04 2026", "é".repeat(1024)).expect("seed");
        store.set("mood", "😊".repeat(512)).expect("seed");
        assert_eq!(data_size_kb(&store), 2.0);
    }

    #[test]
    fn clear_all_wipes_everything() {
        let mut workspace = populated();
        assert!(data_size_kb(workspace.store()) > 0.0);
        clear_all(workspace.store_mut()).expect("clear");
        assert!(workspace.store().keys().is_empty());
        assert_eq!(data_size_kb(workspace.store()), 0.0);
    }
}
