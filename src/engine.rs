use crate::aggregator::{ReportAggregator, SectionAggregator};
use crate::calculator::RowCalculator;
use crate::error::{BoxOfficeError, Result};
use crate::schema::{BoxOfficeConfig, Report, RowField, Section, Totals};
use log::debug;

/// Creates blank reports and applies operator edits to them.
///
/// Every edit returns a new [`Report`]; the input is never mutated. One edit runs one
/// recomputation chain: the edited row's derived figures, then its section's totals,
/// then the report's grand total.
pub struct SettlementEngine {
    config: BoxOfficeConfig,
    calculator: RowCalculator,
}

impl SettlementEngine {
    pub fn new(config: BoxOfficeConfig) -> Result<Self> {
        config.validate()?;
        let calculator = RowCalculator::from_config(&config);
        Ok(Self { config, calculator })
    }

    pub fn config(&self) -> &BoxOfficeConfig {
        &self.config
    }

    pub fn calculator(&self) -> &RowCalculator {
        &self.calculator
    }

    /// One section per configured show slot, every row blank, every figure zero.
    pub fn new_report(
        &self,
        name: impl Into<String>,
        movie_title: impl Into<String>,
        running_day: impl Into<String>,
    ) -> Report {
        Report {
            name: name.into(),
            movie_title: movie_title.into(),
            running_day: running_day.into(),
            sections: self
                .config
                .show_slots
                .iter()
                .map(|title| Section::empty(title.clone(), self.config.rows_per_section))
                .collect(),
            all_total: Some(Totals::default()),
            ..Default::default()
        }
    }

    pub fn apply_edit(
        &self,
        report: &Report,
        section_index: usize,
        row_index: usize,
        field: RowField,
        value: &str,
    ) -> Result<Report> {
        if report.finalized {
            return Err(BoxOfficeError::ReportFinalized(report.label().to_string()));
        }

        let mut next = report.clone();
        let section_count = next.sections.len();
        let section = next
            .sections
            .get_mut(section_index)
            .ok_or(BoxOfficeError::SectionOutOfRange {
                index: section_index,
                len: section_count,
            })?;

        let row_count = section.entries.len();
        let entry = section
            .entries
            .get_mut(row_index)
            .ok_or_else(|| BoxOfficeError::RowOutOfRange {
                section: section.title.clone(),
                index: row_index,
                len: row_count,
            })?;

        entry.row.set(field, value);
        entry.derived = self.calculator.derive(&entry.row);

        debug!(
            "Edited {:?} of '{}' row {}: disGross {}, gross {}",
            field, section.title, row_index, entry.derived.dis_gross, entry.derived.gross
        );

        section.totals = SectionAggregator::aggregate(&section.entries);
        next.all_total = Some(ReportAggregator::aggregate(&next.sections));

        Ok(next)
    }

    /// Re-derives every row and total from the typed cells.
    pub fn recompute(&self, report: &Report) -> Report {
        let mut next = report.clone();
        for section in &mut next.sections {
            for entry in &mut section.entries {
                entry.derived = self.calculator.derive(&entry.row);
            }
            section.totals = SectionAggregator::aggregate(&section.entries);
        }
        next.all_total = Some(ReportAggregator::aggregate(&next.sections));
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SettlementEngine {
        SettlementEngine::new(BoxOfficeConfig::default()).unwrap()
    }

    #[test]
    fn test_new_report_is_blank() {
        let report = engine().new_report("Week 1", "The Movie", "Monday");

        assert_eq!(report.sections.len(), 5);
        assert_eq!(report.sections[0].title, "Noon Show");
        assert_eq!(report.sections[4].title, "Special Show");
        for section in &report.sections {
            assert_eq!(section.entries.len(), 5);
            assert_eq!(section.totals, Totals::default());
            assert!(section.entries.iter().all(|e| e.row.is_blank()));
        }
        assert_eq!(report.all_total, Some(Totals::default()));
        assert!(!report.finalized);
    }

    #[test]
    fn test_apply_edit_recomputes_chain() {
        let engine = engine();
        let report = engine.new_report("Week 1", "The Movie", "Monday");

        let report = engine
            .apply_edit(&report, 1, 0, RowField::PriceClass, "120")
            .unwrap();
        let report = engine
            .apply_edit(&report, 1, 0, RowField::TicketCount, "10")
            .unwrap();
        let report = engine
            .apply_edit(&report, 1, 0, RowField::OnlineCount, "4")
            .unwrap();

        let entry = &report.sections[1].entries[0];
        assert_eq!(entry.derived.dis_gross, 1200.0);
        assert_eq!(entry.derived.gross, 1250.0);

        let totals = &report.sections[1].totals;
        assert_eq!(totals.tickets, 10.0);
        assert_eq!(totals.online, 4.0);
        assert_eq!(totals.gross, 1250.0);

        let all_total = report.all_total.unwrap();
        assert_eq!(all_total.gross, 1250.0);
        assert_eq!(all_total.tickets, 10.0);
        assert_eq!(report.sections[0].totals, Totals::default());
    }

    #[test]
    fn test_apply_edit_leaves_input_untouched() {
        let engine = engine();
        let original = engine.new_report("Week 1", "The Movie", "Monday");
        let edited = engine
            .apply_edit(&original, 0, 0, RowField::TicketCount, "3")
            .unwrap();

        assert_eq!(original.sections[0].entries[0].row.ticket_count, "");
        assert_eq!(edited.sections[0].entries[0].row.ticket_count, "3");
        assert_eq!(edited.sections[0].totals.gross, 15.0);
    }

    #[test]
    fn test_typed_nett_does_not_reach_totals() {
        let engine = engine();
        let report = engine.new_report("Week 1", "The Movie", "Monday");
        let report = engine
            .apply_edit(&report, 0, 2, RowField::Nett, "5000")
            .unwrap();

        assert_eq!(report.sections[0].entries[2].row.typed_nett, "5000");
        assert_eq!(report.sections[0].totals.nett, 0.0);
    }

    #[test]
    fn test_out_of_range_edits() {
        let engine = engine();
        let report = engine.new_report("Week 1", "The Movie", "Monday");

        assert!(matches!(
            engine.apply_edit(&report, 9, 0, RowField::PriceClass, "1"),
            Err(BoxOfficeError::SectionOutOfRange { index: 9, len: 5 })
        ));
        assert!(matches!(
            engine.apply_edit(&report, 0, 5, RowField::PriceClass, "1"),
            Err(BoxOfficeError::RowOutOfRange { index: 5, len: 5, .. })
        ));
    }

    #[test]
    fn test_finalized_report_rejects_edits() {
        let engine = engine();
        let report = engine.new_report("Week 1", "The Movie", "Monday").finalize();

        assert!(matches!(
            engine.apply_edit(&report, 0, 0, RowField::PriceClass, "1"),
            Err(BoxOfficeError::ReportFinalized(_))
        ));
    }

    #[test]
    fn test_recompute_matches_incremental_edits() {
        let engine = engine();
        let mut report = engine.new_report("Week 1", "The Movie", "Monday");
        let edits = [
            (0, 0, RowField::PriceClass, "150"),
            (0, 0, RowField::TicketCount, "40"),
            (0, 1, RowField::PriceClass, "60"),
            (0, 1, RowField::TicketCount, "25"),
            (3, 4, RowField::PriceClass, "101"),
            (3, 4, RowField::TicketCount, "7"),
            (3, 4, RowField::OnlineCount, "2"),
        ];
        for (section, row, field, value) in edits {
            report = engine.apply_edit(&report, section, row, field, value).unwrap();
        }

        let recomputed = engine.recompute(&report);
        assert_eq!(recomputed, report);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = BoxOfficeConfig {
            rows_per_section: 0,
            ..Default::default()
        };
        assert!(SettlementEngine::new(config).is_err());
    }
}
