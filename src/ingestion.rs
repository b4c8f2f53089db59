//! Conversion between stored report documents and [`Report`].
//!
//! Stored documents carry the row cells as typed (strings or numbers), the derived
//! figures either merged into each row or in a parallel `calculated` array, per-section
//! `totals`, and an optional `all_total`. Decoding never re-derives figures: a report is
//! read back exactly as it was saved, with garbled parts reading as zero.

use crate::error::{BoxOfficeError, Result};
use crate::schema::{DerivedRow, Report, RowEntry, RowInput, Section, Totals};
use crate::utils::{amount_from_value, text_from_value};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decodes one stored report. Only a document that is not a JSON object is an error;
/// missing or malformed parts degrade to empty/zero with a warning.
pub fn decode_report(document: &Value) -> Result<Report> {
    let object = document.as_object().ok_or_else(|| {
        BoxOfficeError::MalformedReport(format!(
            "expected a JSON object, got {}",
            json_kind(document)
        ))
    })?;

    let id = optional_text(object.get("id"));
    let label = id.clone().unwrap_or_else(|| "<unsaved>".to_string());

    let sections = match object.get("sections") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| decode_section(item, idx, &label))
            .collect(),
        Some(other) => {
            warn!(
                "Report {} has a non-array sections field ({}); treating as empty",
                label,
                json_kind(other)
            );
            Vec::new()
        }
        None => {
            warn!("Report {} has no sections", label);
            Vec::new()
        }
    };

    let all_total = match object.get("all_total") {
        Some(Value::Object(fields)) => Some(decode_totals(fields)),
        _ => None,
    };

    Ok(Report {
        id,
        owner_id: optional_text(object.get("user_id")),
        inserted_at: object.get("inserted_at").and_then(parse_timestamp),
        name: text_from_value(object.get("name")),
        movie_title: text_from_value(object.get("movie")),
        running_day: text_from_value(object.get("running_day")),
        sections,
        all_total,
        finalized: true,
    })
}

/// Decodes a batch. Documents that are not reports at all are dropped with a warning.
pub fn decode_reports(documents: &[Value]) -> Vec<Report> {
    info!("Decoding {} stored reports", documents.len());

    documents
        .iter()
        .filter_map(|document| match decode_report(document) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Skipping stored report: {}", e);
                None
            }
        })
        .collect()
}

fn decode_section(item: &Value, index: usize, report_label: &str) -> Section {
    let Some(object) = item.as_object() else {
        warn!(
            "Report {} section {} is {}, not an object; counting it as zero",
            report_label,
            index,
            json_kind(item)
        );
        return Section::default();
    };

    let calculated = object
        .get("calculated")
        .and_then(Value::as_array)
        .map(Vec::as_slice);

    let entries = match object.get("rows") {
        Some(Value::Array(rows)) => rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| decode_entry(row, calculated, row_idx))
            .collect(),
        _ => Vec::new(),
    };

    let totals = match object.get("totals") {
        Some(Value::Object(fields)) => decode_totals(fields),
        _ => {
            warn!(
                "Report {} section {} has no totals; counting it as zero",
                report_label, index
            );
            Totals::default()
        }
    };

    Section {
        title: text_from_value(object.get("title")),
        entries,
        totals,
    }
}

/// `calculated` is the section's parallel array when the document uses that legacy shape.
fn decode_entry(row: &Value, calculated: Option<&[Value]>, index: usize) -> RowEntry {
    let empty = Map::new();
    let fields = row.as_object().unwrap_or(&empty);

    let input = RowInput {
        price_class: text_from_value(fields.get("class")),
        ticket_count: text_from_value(fields.get("tickets")),
        online_count: text_from_value(fields.get("online")),
        // With a parallel `calculated` array the row's own nett is the typed one;
        // otherwise it was overwritten by the derived nett when the row was saved.
        typed_nett: if calculated.is_some() {
            text_from_value(fields.get("nett"))
        } else {
            String::new()
        },
    };

    let derived = match calculated {
        Some(items) => items
            .get(index)
            .and_then(Value::as_object)
            .map(decode_derived)
            .unwrap_or_default(),
        None => decode_derived(fields),
    };

    RowEntry {
        row: input,
        derived,
    }
}

fn decode_derived(fields: &Map<String, Value>) -> DerivedRow {
    let dis_gross = fields.get("disGross").or_else(|| fields.get("dis_gross"));
    DerivedRow {
        dis_gross: amount_from_value(dis_gross),
        gross: amount_from_value(fields.get("gross")),
        gst18: amount_from_value(fields.get("gst18")),
        gst12: amount_from_value(fields.get("gst12")),
        nett: amount_from_value(fields.get("nett")),
    }
}

fn decode_totals(fields: &Map<String, Value>) -> Totals {
    Totals {
        tickets: amount_from_value(fields.get("tickets")),
        gross: amount_from_value(fields.get("gross")),
        dis_gross: amount_from_value(fields.get("disGross").or_else(|| fields.get("dis_gross"))),
        nett: amount_from_value(fields.get("nett")),
        gst18: amount_from_value(fields.get("gst18")),
        gst12: amount_from_value(fields.get("gst12")),
        online: amount_from_value(fields.get("online")),
    }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    Some(text_from_value(value)).filter(|s| !s.is_empty())
}

/// Accepts RFC 3339 timestamps, and offset-less ones as UTC.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
        })
        .ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Serialize)]
struct StoredRow<'a> {
    class: &'a str,
    tickets: &'a str,
    online: &'a str,
    #[serde(flatten)]
    derived: &'a DerivedRow,
}

#[derive(Serialize)]
struct StoredSection<'a> {
    title: &'a str,
    rows: Vec<StoredRow<'a>>,
    totals: &'a Totals,
}

#[derive(Serialize)]
struct StoredReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inserted_at: Option<&'a DateTime<Utc>>,
    name: &'a str,
    movie: &'a str,
    running_day: &'a str,
    sections: Vec<StoredSection<'a>>,
    all_total: Option<&'a Totals>,
}

/// Produces the stored document shape: each row merged with its derived figures.
pub fn encode_report(report: &Report) -> Result<Value> {
    let stored = StoredReport {
        id: report.id.as_deref(),
        user_id: report.owner_id.as_deref(),
        inserted_at: report.inserted_at.as_ref(),
        name: &report.name,
        movie: &report.movie_title,
        running_day: &report.running_day,
        sections: report
            .sections
            .iter()
            .map(|section| StoredSection {
                title: &section.title,
                rows: section
                    .entries
                    .iter()
                    .map(|entry| StoredRow {
                        class: &entry.row.price_class,
                        tickets: &entry.row.ticket_count,
                        online: &entry.row.online_count,
                        derived: &entry.derived,
                    })
                    .collect(),
                totals: &section.totals,
            })
            .collect(),
        all_total: report.all_total.as_ref(),
    };

    Ok(serde_json::to_value(stored)?)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportListEntry {
    pub id: Option<String>,
    pub name: String,
    pub movie_title: String,
    pub running_day: String,
    pub inserted_at: Option<DateTime<Utc>>,
    /// Sum of every row's derived gross.
    pub total_gross: f64,
}

/// Newest first; reports without a timestamp go last in their original order.
pub fn summarize_reports(reports: &[Report]) -> Vec<ReportListEntry> {
    let mut entries: Vec<ReportListEntry> = reports
        .iter()
        .map(|report| ReportListEntry {
            id: report.id.clone(),
            name: report.name.clone(),
            movie_title: report.movie_title.clone(),
            running_day: report.running_day.clone(),
            inserted_at: report.inserted_at,
            total_gross: report
                .sections
                .iter()
                .flat_map(|section| &section.entries)
                .map(|entry| entry.derived.gross)
                .sum(),
        })
        .collect();

    entries.sort_by(|a, b| b.inserted_at.cmp(&a.inserted_at));
    entries
}

pub fn reports_owned_by<'a>(reports: &'a [Report], owner_id: &str) -> Vec<&'a Report> {
    reports
        .iter()
        .filter(|report| report.owner_id.as_deref() == Some(owner_id))
        .collect()
}
