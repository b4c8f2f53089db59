//! Dashboard aggregates over many finalized reports.
//!
//! Only the pre-computed section totals of each report are read; row-level tax splits
//! are never re-derived here. A report with no usable sections simply contributes 0.

use crate::schema::{BoxOfficeConfig, Report, Totals, UNKNOWN_DAY};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KeyedAmount {
    pub key: String,
    pub amount: f64,
}

/// Running sums keyed by label, kept in first-encountered key order.
///
/// Lookups scan the entries linearly. Key counts are dashboard-sized (days, titles), and
/// the vector doubles as the ordering that top-movie tie-breaks depend on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct KeyedTotals(Vec<KeyedAmount>);

impl KeyedTotals {
    /// Adds to an existing key, or appends the key at the end.
    pub fn add(&mut self, key: &str, amount: f64) {
        match self.0.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.amount += amount,
            None => self.0.push(KeyedAmount {
                key: key.to_string(),
                amount,
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.amount)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyedAmount> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|entry| entry.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RevenueSplit {
    pub gross: f64,
    pub nett: f64,
    pub online: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MovieTickets {
    pub title: String,
    pub tickets: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_report_count: usize,
    /// Labels for the buckets of `tickets_by_show_slot`, same length.
    pub show_slot_labels: Vec<String>,
    pub tickets_by_show_slot: Vec<f64>,
    pub revenue_by_day: KeyedTotals,
    pub movie_ticket_totals: KeyedTotals,
    pub revenue_split: RevenueSplit,
    /// Tickets descending; ties keep first-encountered order.
    pub top_movies: Vec<MovieTickets>,
}

pub struct CrossReportAnalytics {
    slot_labels: Vec<String>,
    top_movies_limit: usize,
}

impl CrossReportAnalytics {
    pub fn new(slot_labels: Vec<String>, top_movies_limit: usize) -> Self {
        Self {
            slot_labels,
            top_movies_limit,
        }
    }

    pub fn from_config(config: &BoxOfficeConfig) -> Self {
        Self::new(config.dashboard_slots.clone(), config.top_movies_limit)
    }

    pub fn slot_count(&self) -> usize {
        self.slot_labels.len()
    }

    pub fn aggregate(&self, reports: &[Report]) -> AnalyticsSummary {
        info!("Aggregating analytics over {} reports", reports.len());

        let mut summary = self.empty_summary();
        summary.total_report_count = reports.len();

        for report in reports {
            self.accumulate(&mut summary, report);
        }

        summary.top_movies = self.rank_movies(&summary.movie_ticket_totals);
        summary
    }

    /// Combines two partial summaries. Keys of `left` come first, so the tie-break of the
    /// ranking is the same as aggregating `left`'s reports followed by `right`'s.
    pub fn merge(&self, left: &AnalyticsSummary, right: &AnalyticsSummary) -> AnalyticsSummary {
        let mut merged = self.empty_summary();
        merged.total_report_count = left.total_report_count + right.total_report_count;

        for part in [left, right] {
            for (slot, tickets) in merged
                .tickets_by_show_slot
                .iter_mut()
                .zip(&part.tickets_by_show_slot)
            {
                *slot += tickets;
            }
            for entry in part.revenue_by_day.iter() {
                merged.revenue_by_day.add(&entry.key, entry.amount);
            }
            for entry in part.movie_ticket_totals.iter() {
                merged.movie_ticket_totals.add(&entry.key, entry.amount);
            }
            merged.revenue_split.gross += part.revenue_split.gross;
            merged.revenue_split.nett += part.revenue_split.nett;
            merged.revenue_split.online += part.revenue_split.online;
        }

        merged.top_movies = self.rank_movies(&merged.movie_ticket_totals);
        merged
    }

    fn empty_summary(&self) -> AnalyticsSummary {
        AnalyticsSummary {
            show_slot_labels: self.slot_labels.clone(),
            tickets_by_show_slot: vec![0.0; self.slot_labels.len()],
            ..Default::default()
        }
    }

    fn accumulate(&self, summary: &mut AnalyticsSummary, report: &Report) {
        let mut report_total = Totals::default();

        for (index, section) in report.sections.iter().enumerate() {
            // Sections past the configured slots still count toward every other aggregate.
            if let Some(slot) = summary.tickets_by_show_slot.get_mut(index) {
                *slot += section.totals.tickets;
            }
            summary.revenue_split.gross += section.totals.gross;
            summary.revenue_split.nett += section.totals.nett;
            summary.revenue_split.online += section.totals.online;
            report_total += &section.totals;
        }

        let day = if report.running_day.is_empty() {
            UNKNOWN_DAY
        } else {
            report.running_day.as_str()
        };
        summary.revenue_by_day.add(day, report_total.gross);
        summary
            .movie_ticket_totals
            .add(&report.movie_title, report_total.tickets);

        debug!(
            "Report '{}' contributed {} tickets and {} gross across {} sections",
            report.label(),
            report_total.tickets,
            report_total.gross,
            report.sections.len()
        );
    }

    fn rank_movies(&self, totals: &KeyedTotals) -> Vec<MovieTickets> {
        let mut ranked: Vec<MovieTickets> = totals
            .iter()
            .map(|entry| MovieTickets {
                title: entry.key.clone(),
                tickets: entry.amount,
            })
            .collect();
        // sort_by is stable: equal counts keep insertion order.
        ranked.sort_by(|a, b| b.tickets.partial_cmp(&a.tickets).unwrap_or(Ordering::Equal));
        ranked.truncate(self.top_movies_limit);
        ranked
    }
}
