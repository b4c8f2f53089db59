//! # Box Office Settlement
//!
//! A calculation and aggregation engine for cinema box-office settlement reports.
//!
//! ## Core Concepts
//!
//! - **Rows**: Per price class ticket sales, typed by an operator. Blank or garbled cells
//!   read as zero.
//! - **Derived figures**: Discounted gross, gross with the per-ticket service charge, and the
//!   GST extracted at 18% (price class above 100) or 12%, plus the resulting nett.
//! - **Sections**: One per daily show slot, each with a fixed number of rows and a totals record.
//! - **All total**: The report-wide sum of every section's totals.
//! - **Analytics**: Dashboard aggregates over many finalized reports: tickets per show slot,
//!   gross per running day, tickets per movie, the gross/nett/online split and the top movies.
//!
//! ## Example
//!
//! ```rust
//! use box_office_settlement::*;
//!
//! let engine = SettlementEngine::new(BoxOfficeConfig::default()).unwrap();
//! let report = engine.new_report("Week 1", "Night Train", "Monday");
//! let report = engine.apply_edit(&report, 0, 0, RowField::PriceClass, "120").unwrap();
//! let report = engine.apply_edit(&report, 0, 0, RowField::TicketCount, "10").unwrap();
//!
//! assert_eq!(report.sections[0].totals.gross, 1250.0);
//! assert_eq!(report.all_total.unwrap().dis_gross, 1200.0);
//!
//! let summary = CrossReportAnalytics::from_config(engine.config()).aggregate(&[report.finalize()]);
//! assert_eq!(summary.revenue_by_day.get("Monday"), Some(1250.0));
//! ```

pub mod aggregator;
pub mod analytics;
pub mod calculator;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod schema;
pub mod utils;

pub use aggregator::{ReportAggregator, ReportVerifier, SectionAggregator};
pub use analytics::{
    AnalyticsSummary, CrossReportAnalytics, KeyedAmount, KeyedTotals, MovieTickets, RevenueSplit,
};
pub use calculator::{GstBracket, RowCalculator, GST_THRESHOLD_PRICE_CLASS};
pub use engine::SettlementEngine;
pub use error::{BoxOfficeError, Result};
pub use ingestion::{
    decode_report, decode_reports, encode_report, reports_owned_by, summarize_reports,
    ReportListEntry,
};
pub use schema::*;
pub use utils::parse_amount;

use log::{debug, info};
use serde_json::Value;

pub struct BoxOfficeProcessor;

impl BoxOfficeProcessor {
    /// Decodes stored report documents and aggregates them for the dashboard.
    ///
    /// The caller is responsible for passing only the documents the viewer may see.
    pub fn analyze_documents(
        config: &BoxOfficeConfig,
        documents: &[Value],
    ) -> Result<AnalyticsSummary> {
        config.validate()?;

        info!("Analyzing {} stored report documents", documents.len());

        let reports = decode_reports(documents);
        if reports.len() != documents.len() {
            debug!(
                "{} documents were not reports and were skipped",
                documents.len() - reports.len()
            );
        }

        Ok(CrossReportAnalytics::from_config(config).aggregate(&reports))
    }

    /// Decodes one stored document and checks its arithmetic invariants.
    pub fn decode_with_verification(document: &Value, tolerance: f64) -> Result<Report> {
        let report = decode_report(document)?;
        ReportVerifier::new(tolerance).verify(&report)?;
        Ok(report)
    }
}

pub fn analyze_documents(config: &BoxOfficeConfig, documents: &[Value]) -> Result<AnalyticsSummary> {
    BoxOfficeProcessor::analyze_documents(config, documents)
}

pub fn verify_report(report: &Report, tolerance: f64) -> Result<()> {
    ReportVerifier::new(tolerance).verify(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_end_to_end_edit_save_analyze() {
        let config = BoxOfficeConfig::default();
        let engine = SettlementEngine::new(config.clone()).unwrap();

        let mut report = engine.new_report("Week 1", "Night Train", "Monday");
        for (section, row, class, tickets) in [(0, 0, "120", "10"), (2, 1, "80", "4")] {
            report = engine
                .apply_edit(&report, section, row, RowField::PriceClass, class)
                .unwrap();
            report = engine
                .apply_edit(&report, section, row, RowField::TicketCount, tickets)
                .unwrap();
        }
        assert!(verify_report(&report, 1e-9).is_ok());

        let document = encode_report(&report.finalize()).unwrap();
        let summary = analyze_documents(&config, &[document.clone(), document]).unwrap();

        assert_eq!(summary.total_report_count, 2);
        assert_eq!(summary.revenue_by_day.get("Monday"), Some(2.0 * 1590.0));
        assert_eq!(summary.tickets_by_show_slot[0], 20.0);
        assert_eq!(summary.tickets_by_show_slot[2], 8.0);
        assert_eq!(summary.top_movies.len(), 1);
        assert_eq!(summary.top_movies[0].tickets, 28.0);
    }

    #[test]
    fn test_invalid_config_rejected_before_analysis() {
        let config = BoxOfficeConfig {
            dashboard_slots: vec![],
            ..Default::default()
        };
        assert!(matches!(
            analyze_documents(&config, &[]),
            Err(BoxOfficeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_decode_with_verification_flags_bad_totals() {
        let document = json!({
            "name": "Bad",
            "sections": [{
                "title": "Noon Show",
                "rows": [{ "class": "80", "tickets": "4", "disGross": 320, "gross": 340,
                           "gst18": 0, "gst12": 34.285714285714285, "nett": 285.7142857142857 }],
                "totals": { "tickets": 4, "gross": 999, "disGross": 320,
                            "nett": 285.7142857142857, "gst18": 0, "gst12": 34.285714285714285, "online": 0 }
            }]
        });

        assert!(matches!(
            BoxOfficeProcessor::decode_with_verification(&document, 1e-6),
            Err(BoxOfficeError::InvariantViolation { .. })
        ));
    }
}
