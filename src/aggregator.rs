use crate::error::{BoxOfficeError, Result};
use crate::schema::{Report, RowEntry, Section, Totals};
use crate::utils::approx_eq;

/// Rolls the rows of one show slot into its [`Totals`].
pub struct SectionAggregator;

impl SectionAggregator {
    /// Full recomputation in row order. Tickets and online come from the typed cells,
    /// everything else from the derived figures.
    pub fn aggregate(entries: &[RowEntry]) -> Totals {
        entries.iter().fold(Totals::default(), |mut totals, entry| {
            totals.tickets += entry.row.ticket_count_value();
            totals.online += entry.row.online_count_value();

            totals.dis_gross += entry.derived.dis_gross;
            totals.gross += entry.derived.gross;
            totals.gst18 += entry.derived.gst18;
            totals.gst12 += entry.derived.gst12;
            totals.nett += entry.derived.nett;
            totals
        })
    }
}

/// Rolls section totals into the report-wide grand total.
pub struct ReportAggregator;

impl ReportAggregator {
    /// Sections are summed in show-slot order so rounding is reproducible.
    pub fn aggregate(sections: &[Section]) -> Totals {
        let mut all_total = Totals::default();
        for section in sections {
            all_total += &section.totals;
        }
        all_total
    }
}

/// Checks the arithmetic invariants of a report.
pub struct ReportVerifier {
    tolerance: f64,
}

impl ReportVerifier {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Verifies, for every row, that one GST bracket is empty and
    /// `nett + gst18 + gst12 == disGross`; for every section, that its totals match its rows;
    /// and that the grand total (when present) matches the sections.
    pub fn verify(&self, report: &Report) -> Result<()> {
        for section in &report.sections {
            for (idx, entry) in section.entries.iter().enumerate() {
                let d = &entry.derived;
                let location = format!("{} / {} row {}", report.label(), section.title, idx);

                if d.gst18 != 0.0 && d.gst12 != 0.0 {
                    return Err(BoxOfficeError::InvariantViolation {
                        location,
                        details: format!(
                            "both GST brackets are non-zero (gst18 {}, gst12 {})",
                            d.gst18, d.gst12
                        ),
                    });
                }

                let reassembled = d.nett + d.gst18 + d.gst12;
                if !approx_eq(reassembled, d.dis_gross, self.tolerance) {
                    return Err(BoxOfficeError::InvariantViolation {
                        location,
                        details: format!(
                            "nett + gst ({}) != disGross ({})",
                            reassembled, d.dis_gross
                        ),
                    });
                }
            }

            let expected = SectionAggregator::aggregate(&section.entries);
            self.compare_totals(
                &format!("{} / {} totals", report.label(), section.title),
                &section.totals,
                &expected,
            )?;
        }

        if let Some(all_total) = &report.all_total {
            let expected = ReportAggregator::aggregate(&report.sections);
            self.compare_totals(
                &format!("{} all total", report.label()),
                all_total,
                &expected,
            )?;
        }

        Ok(())
    }

    fn compare_totals(&self, location: &str, actual: &Totals, expected: &Totals) -> Result<()> {
        let fields = [
            ("tickets", actual.tickets, expected.tickets),
            ("gross", actual.gross, expected.gross),
            ("disGross", actual.dis_gross, expected.dis_gross),
            ("nett", actual.nett, expected.nett),
            ("gst18", actual.gst18, expected.gst18),
            ("gst12", actual.gst12, expected.gst12),
            ("online", actual.online, expected.online),
        ];

        for (name, actual, expected) in fields {
            if !approx_eq(actual, expected, self.tolerance) {
                return Err(BoxOfficeError::InvariantViolation {
                    location: location.to_string(),
                    details: format!("{} is {} but rows sum to {}", name, actual, expected),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::RowCalculator;
    use crate::schema::RowInput;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn entry(calc: &RowCalculator, class: &str, tickets: &str, online: &str) -> RowEntry {
        let row = RowInput::new(class, tickets, online);
        let derived = calc.derive(&row);
        RowEntry { row, derived }
    }

    fn section(title: &str, entries: Vec<RowEntry>) -> Section {
        let totals = SectionAggregator::aggregate(&entries);
        Section {
            title: title.to_string(),
            entries,
            totals,
        }
    }

    fn random_section(rng: &mut StdRng, calc: &RowCalculator, title: &str) -> Section {
        let entries = (0..5)
            .map(|_| {
                let class = format!("{:.2}", rng.gen_range(-10.0..400.0));
                let tickets = rng.gen_range(0..500).to_string();
                let online = rng.gen_range(0..50).to_string();
                entry(calc, &class, &tickets, &online)
            })
            .collect();
        section(title, entries)
    }

    #[test]
    fn test_section_totals_sum_fields() {
        let calc = RowCalculator::default();
        let entries = vec![
            entry(&calc, "120", "10", "3"),
            entry(&calc, "80", "4", "1"),
            entry(&calc, "", "5", ""),
            RowEntry::default(),
            RowEntry::default(),
        ];

        let totals = SectionAggregator::aggregate(&entries);

        assert_eq!(totals.tickets, 19.0);
        assert_eq!(totals.online, 4.0);
        assert_eq!(totals.dis_gross, 1520.0);
        assert_eq!(totals.gross, 1250.0 + 340.0 + 25.0);
        assert_eq!(totals.gst18, entries[0].derived.gst18);
        assert_eq!(totals.gst12, entries[1].derived.gst12);
        assert_eq!(
            totals.nett,
            entries[0].derived.nett + entries[1].derived.nett
        );
    }

    #[test]
    fn test_section_tickets_use_typed_cells() {
        // Tickets are counted from the row even when the derived figures disagree.
        let mut entries = vec![entry(&RowCalculator::default(), "50", "2", "")];
        entries[0].derived = Default::default();

        let totals = SectionAggregator::aggregate(&entries);
        assert_eq!(totals.tickets, 2.0);
        assert_eq!(totals.gross, 0.0);
    }

    #[test]
    fn test_report_total_sums_sections() {
        let calc = RowCalculator::default();
        let sections = vec![
            section("Noon Show", vec![entry(&calc, "120", "10", "2")]),
            section("Matinee Show", vec![entry(&calc, "80", "4", "")]),
            section("First Show", vec![]),
        ];

        let all_total = ReportAggregator::aggregate(&sections);
        assert_eq!(all_total.tickets, 14.0);
        assert_eq!(all_total.gross, 1590.0);
        assert_eq!(all_total.dis_gross, 1520.0);
        assert_eq!(all_total.online, 2.0);
        assert_eq!(all_total.gst18, sections[0].totals.gst18);
        assert_eq!(all_total.gst12, sections[1].totals.gst12);
    }

    #[test]
    fn test_report_total_is_deterministic() {
        let calc = RowCalculator::default();
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..200 {
            let sections: Vec<Section> = (0..5)
                .map(|i| random_section(&mut rng, &calc, &format!("Show {}", i)))
                .collect();

            let first = ReportAggregator::aggregate(&sections);
            let second = ReportAggregator::aggregate(&sections.clone());
            assert_eq!(first, second);

            for s in &sections {
                assert_eq!(SectionAggregator::aggregate(&s.entries), s.totals);
            }
        }
    }

    #[test]
    fn test_verifier_accepts_consistent_report() {
        let calc = RowCalculator::default();
        let mut rng = StdRng::seed_from_u64(7);
        let sections: Vec<Section> = (0..5)
            .map(|i| random_section(&mut rng, &calc, &format!("Show {}", i)))
            .collect();
        let report = Report {
            name: "Consistent".to_string(),
            all_total: Some(ReportAggregator::aggregate(&sections)),
            sections,
            ..Default::default()
        };

        assert!(ReportVerifier::new(1e-6).verify(&report).is_ok());
    }

    #[test]
    fn test_verifier_flags_tampered_totals() {
        let calc = RowCalculator::default();
        let mut report = Report {
            name: "Tampered".to_string(),
            sections: vec![section("Noon Show", vec![entry(&calc, "120", "10", "")])],
            ..Default::default()
        };
        report.sections[0].totals.gross += 1.0;

        let err = ReportVerifier::new(1e-6).verify(&report).unwrap_err();
        match err {
            BoxOfficeError::InvariantViolation { location, details } => {
                assert!(location.contains("Noon Show"));
                assert!(details.starts_with("gross"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_verifier_flags_double_bracket_and_stale_all_total() {
        let calc = RowCalculator::default();
        let mut report = Report {
            name: "Broken".to_string(),
            sections: vec![section("Noon Show", vec![entry(&calc, "80", "4", "")])],
            ..Default::default()
        };
        report.all_total = Some(Totals::default());
        assert!(ReportVerifier::new(1e-6).verify(&report).is_err());

        report.all_total = None;
        report.sections[0].entries[0].derived.gst18 = 1.0;
        assert!(matches!(
            ReportVerifier::new(1e-6).verify(&report),
            Err(BoxOfficeError::InvariantViolation { .. })
        ));
    }
}
