use crate::error::{BoxOfficeError, Result};
use crate::utils::parse_amount;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

pub const DEFAULT_SERVICE_CHARGE_PER_TICKET: f64 = 5.0;
pub const DEFAULT_ROWS_PER_SECTION: usize = 5;
pub const DEFAULT_TOP_MOVIES_LIMIT: usize = 5;

/// Day label used by analytics when a report has no running day.
pub const UNKNOWN_DAY: &str = "Unknown";

pub const DEFAULT_SHOW_SLOTS: [&str; 5] = [
    "Noon Show",
    "Matinee Show",
    "First Show",
    "Second Show",
    "Special Show",
];

pub const DEFAULT_DASHBOARD_SLOTS: [&str; 6] = [
    "Noon Show",
    "Matinee Show",
    "First Show",
    "Second Show",
    "Special Show",
    "Late Night Show",
];

/// The editable cells of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RowField {
    PriceClass,
    TicketCount,
    OnlineCount,
    Nett,
}

/// Operator-entered values for one price class, kept exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RowInput {
    #[schemars(description = "Ticket rate of this price class, as typed")]
    pub price_class: String,

    #[schemars(description = "Number of tickets sold at this rate, as typed")]
    pub ticket_count: String,

    #[schemars(description = "Tickets sold through the online channel, as typed")]
    pub online_count: String,

    #[serde(default)]
    #[schemars(
        description = "Nett typed by the operator on legacy sheets. Display only, never used in totals."
    )]
    pub typed_nett: String,
}

impl RowInput {
    pub fn new(
        price_class: impl Into<String>,
        ticket_count: impl Into<String>,
        online_count: impl Into<String>,
    ) -> Self {
        Self {
            price_class: price_class.into(),
            ticket_count: ticket_count.into(),
            online_count: online_count.into(),
            typed_nett: String::new(),
        }
    }

    pub fn price_class_value(&self) -> f64 {
        parse_amount(&self.price_class)
    }

    pub fn ticket_count_value(&self) -> f64 {
        parse_amount(&self.ticket_count)
    }

    pub fn online_count_value(&self) -> f64 {
        parse_amount(&self.online_count)
    }

    pub fn is_blank(&self) -> bool {
        self.price_class.trim().is_empty()
    }

    pub fn set(&mut self, field: RowField, value: impl Into<String>) {
        let value = value.into();
        match field {
            RowField::PriceClass => self.price_class = value,
            RowField::TicketCount => self.ticket_count = value,
            RowField::OnlineCount => self.online_count = value,
            RowField::Nett => self.typed_nett = value,
        }
    }
}

/// Tax and revenue figures computed from a [`RowInput`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DerivedRow {
    pub dis_gross: f64,
    pub gross: f64,
    pub gst18: f64,
    pub gst12: f64,
    pub nett: f64,
}

/// One sale line: the typed row and the figures derived from it, always together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RowEntry {
    pub row: RowInput,
    pub derived: DerivedRow,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub tickets: f64,
    pub gross: f64,
    pub dis_gross: f64,
    pub nett: f64,
    pub gst18: f64,
    pub gst12: f64,
    pub online: f64,
}

impl AddAssign<&Totals> for Totals {
    fn add_assign(&mut self, other: &Totals) {
        self.tickets += other.tickets;
        self.gross += other.gross;
        self.dis_gross += other.dis_gross;
        self.nett += other.nett;
        self.gst18 += other.gst18;
        self.gst12 += other.gst12;
        self.online += other.online;
    }
}

/// One show slot of a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Section {
    pub title: String,
    pub entries: Vec<RowEntry>,
    pub totals: Totals,
}

impl Section {
    pub fn empty(title: impl Into<String>, rows: usize) -> Self {
        Self {
            title: title.into(),
            entries: vec![RowEntry::default(); rows],
            totals: Totals::default(),
        }
    }
}

/// The serde shape of `Report` is this crate's own camelCase form (`movieTitle`,
/// `allTotal`, ...), not the stored-document layout. Stored documents (`movie`,
/// `all_total`, merged rows) go through `decode_report` and `encode_report`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[schemars(description = "Opaque identifier assigned by the persistence layer")]
    pub id: Option<String>,

    #[schemars(description = "Identifier of the operator who owns the report")]
    pub owner_id: Option<String>,

    pub inserted_at: Option<DateTime<Utc>>,

    pub name: String,

    pub movie_title: String,

    #[schemars(description = "Free-form running day label, e.g. 'Monday' or 'Day 3'")]
    pub running_day: String,

    #[schemars(description = "Sections in show-slot order")]
    pub sections: Vec<Section>,

    #[schemars(
        description = "Sum of every section's totals. Absent when the stored report never had it computed."
    )]
    pub all_total: Option<Totals>,

    #[serde(default)]
    pub finalized: bool,
}

impl Report {
    /// Marks the report immutable. Edits on a finalized report are rejected.
    pub fn finalize(mut self) -> Self {
        self.finalized = true;
        self
    }

    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Report)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BoxOfficeConfig {
    #[schemars(description = "Titles of the daily show slots, in screening order. One section per slot.")]
    pub show_slots: Vec<String>,

    #[schemars(description = "Number of price-class rows in every section")]
    pub rows_per_section: usize,

    #[schemars(description = "Flat charge added to gross for each ticket. Not subject to GST.")]
    pub service_charge_per_ticket: f64,

    #[schemars(
        description = "Show slot labels bucketed by the analytics dashboard. May be longer than show_slots."
    )]
    pub dashboard_slots: Vec<String>,

    #[schemars(description = "Maximum number of entries in the top movies ranking")]
    pub top_movies_limit: usize,
}

impl Default for BoxOfficeConfig {
    fn default() -> Self {
        Self {
            show_slots: DEFAULT_SHOW_SLOTS.iter().map(|s| s.to_string()).collect(),
            rows_per_section: DEFAULT_ROWS_PER_SECTION,
            service_charge_per_ticket: DEFAULT_SERVICE_CHARGE_PER_TICKET,
            dashboard_slots: DEFAULT_DASHBOARD_SLOTS.iter().map(|s| s.to_string()).collect(),
            top_movies_limit: DEFAULT_TOP_MOVIES_LIMIT,
        }
    }
}

impl BoxOfficeConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.show_slots.is_empty() {
            return Err(BoxOfficeError::InvalidConfig(
                "at least one show slot is required".to_string(),
            ));
        }
        if self.dashboard_slots.is_empty() {
            return Err(BoxOfficeError::InvalidConfig(
                "at least one dashboard slot is required".to_string(),
            ));
        }
        if self.rows_per_section == 0 {
            return Err(BoxOfficeError::InvalidConfig(
                "rows_per_section must be greater than zero".to_string(),
            ));
        }
        if !self.service_charge_per_ticket.is_finite() {
            return Err(BoxOfficeError::InvalidConfig(format!(
                "service_charge_per_ticket must be finite (got {})",
                self.service_charge_per_ticket
            )));
        }
        Ok(())
    }
}
