use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(rename = "createdTime")]
    pub created_time: String,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            id: format!("rec{}", &suffix[..14]),
            created_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            fields,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub records: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page_size: Option<usize>,
    pub offset: Option<String>,
    pub filter_by_formula: Option<String>,
}

#[derive(Deserialize)]
pub struct FieldsBody {
    pub fields: Map<String, Value>,
}

/// Records per table, in insertion order. Bases are not distinguished.
pub type Db = Arc<RwLock<HashMap<String, Vec<Record>>>>;

type Failure = (StatusCode, Json<Value>);

pub fn new_db() -> Db {
    Arc::new(RwLock::new(HashMap::new()))
}

/// Insert records directly, bypassing the HTTP surface.
pub async fn seed(db: &Db, table: &str, records: Vec<Record>) {
    db.write()
        .await
        .entry(table.to_string())
        .or_default()
        .extend(records);
}

pub fn app() -> Router {
    router(new_db())
}

pub fn router(db: Db) -> Router {
    Router::new()
        .route("/{base}/{table}", get(list_records).post(create_record))
        .route("/{base}/{table}/{record_id}", patch(update_record))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, new_db()).await
}

pub async fn run_with(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, router(db)).await
}

fn failure(status: StatusCode, kind: &str, message: impl Into<String>) -> Failure {
    (
        status,
        Json(json!({ "error": { "type": kind, "message": message.into() } })),
    )
}

async fn list_records(
    State(db): State<Db>,
    Path((_base, table)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, Failure> {
    let page_size = query.page_size.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let start = match query.offset.as_deref() {
        None => 0,
        Some(cursor) => parse_cursor(cursor).ok_or_else(|| {
            failure(
                StatusCode::UNPROCESSABLE_ENTITY,
                "LIST_RECORDS_ITERATOR_NOT_AVAILABLE",
                format!("unknown offset {cursor}"),
            )
        })?,
    };
    let filter = match query.filter_by_formula.as_deref() {
        None => None,
        Some(formula) => Some(parse_equality_formula(formula).ok_or_else(|| {
            failure(
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_FILTER_BY_FORMULA",
                format!("unsupported formula {formula}"),
            )
        })?),
    };

    let tables = db.read().await;
    let matching: Vec<&Record> = tables
        .get(&table)
        .map(|records| {
            records
                .iter()
                .filter(|record| match &filter {
                    Some((field, value)) => field_equals(record, field, value),
                    None => true,
                })
                .collect()
        })
        .unwrap_or_default();

    if start > matching.len() {
        return Err(failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "LIST_RECORDS_ITERATOR_NOT_AVAILABLE",
            format!("offset itr{start} is past the last record"),
        ));
    }
    let end = start.saturating_add(page_size).min(matching.len());
    let records = matching
        .get(start..end)
        .map(|page| page.iter().map(|record| (*record).clone()).collect())
        .unwrap_or_default();
    let offset = (end < matching.len()).then(|| format!("itr{end}"));

    Ok(Json(ListResponse { records, offset }))
}

async fn create_record(
    State(db): State<Db>,
    Path((_base, table)): Path<(String, String)>,
    Json(body): Json<FieldsBody>,
) -> Json<Record> {
    let record = Record::new(body.fields);
    db.write()
        .await
        .entry(table)
        .or_default()
        .push(record.clone());
    Json(record)
}

async fn update_record(
    State(db): State<Db>,
    Path((_base, table, record_id)): Path<(String, String, String)>,
    Json(body): Json<FieldsBody>,
) -> Result<Json<Record>, Failure> {
    let mut tables = db.write().await;
    let record = tables
        .get_mut(&table)
        .and_then(|records| records.iter_mut().find(|record| record.id == record_id))
        .ok_or_else(|| {
            failure(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("record {record_id} not found"),
            )
        })?;
    record.fields.extend(body.fields);
    Ok(Json(record.clone()))
}

fn parse_cursor(cursor: &str) -> Option<usize> {
    cursor.strip_prefix("itr")?.parse().ok()
}

/// Parse `{Field}='value'`, the only formula shape the server evaluates.
pub fn parse_equality_formula(formula: &str) -> Option<(String, String)> {
    let rest = formula.trim().strip_prefix('{')?;
    let (field, rest) = rest.split_once('}')?;
    let quoted = rest
        .trim_start()
        .strip_prefix('=')?
        .trim_start()
        .strip_prefix('\'')?
        .strip_suffix('\'')?;

    let mut value = String::new();
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => value.push(chars.next()?),
            '\'' => return None,
            other => value.push(other),
        }
    }
    Some((field.to_string(), value))
}

/// Blank and missing fields compare equal to `''`.
fn field_equals(record: &Record, field: &str, value: &str) -> bool {
    match record.fields.get(field) {
        Some(Value::String(s)) => s == value,
        Some(Value::Null) | None => value.is_empty(),
        Some(other) => other.to_string() == value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_to_airtable_shape() {
        let mut fields = Map::new();
        fields.insert("Name".to_string(), json!("Test"));
        let record = Record::new(fields);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["id"].as_str().unwrap().starts_with("rec"));
        assert_eq!(json["id"].as_str().unwrap().len(), 17);
        assert!(json["createdTime"].as_str().unwrap().ends_with('Z'));
        assert_eq!(json["fields"]["Name"], "Test");
    }

    #[test]
    fn list_query_uses_camel_case_keys() {
        let query: ListQuery =
            serde_json::from_str(r#"{"pageSize":2,"offset":"itr2","filterByFormula":"{Id}='a'"}"#)
                .unwrap();
        assert_eq!(query.page_size, Some(2));
        assert_eq!(query.offset.as_deref(), Some("itr2"));
        assert_eq!(query.filter_by_formula.as_deref(), Some("{Id}='a'"));
    }

    #[test]
    fn formula_parses_simple_equality() {
        assert_eq!(
            parse_equality_formula("{Id}='abc'"),
            Some(("Id".to_string(), "abc".to_string()))
        );
        assert_eq!(
            parse_equality_formula(" {Name} = 'o\\'neil' "),
            Some(("Name".to_string(), "o'neil".to_string()))
        );
    }

    #[test]
    fn formula_rejects_other_shapes() {
        assert!(parse_equality_formula("AND({Id}='a',{Name}='b')").is_none());
        assert!(parse_equality_formula("{Id}=abc").is_none());
        assert!(parse_equality_formula("{Id}='a'b'").is_none());
    }

    #[test]
    fn cursor_roundtrip() {
        assert_eq!(parse_cursor("itr42"), Some(42));
        assert_eq!(parse_cursor("bogus"), None);
    }
}
