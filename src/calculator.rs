use crate::schema::{BoxOfficeConfig, DerivedRow, RowInput, DEFAULT_SERVICE_CHARGE_PER_TICKET};

/// Price classes strictly above this rate are taxed in the 18% bracket.
pub const GST_THRESHOLD_PRICE_CLASS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GstBracket {
    Twelve,
    Eighteen,
}

impl GstBracket {
    /// Hard threshold: the whole row is taxed at one rate.
    pub fn for_price_class(price_class: f64) -> Self {
        if price_class > GST_THRESHOLD_PRICE_CLASS {
            GstBracket::Eighteen
        } else {
            GstBracket::Twelve
        }
    }

    pub fn rate(self) -> f64 {
        match self {
            GstBracket::Twelve => 12.0,
            GstBracket::Eighteen => 18.0,
        }
    }

    /// Divisor for extracting tax from a tax-inclusive amount.
    pub fn base(self) -> f64 {
        100.0 + self.rate()
    }

    /// Tax portion of a tax-inclusive amount.
    pub fn extract(self, inclusive_amount: f64) -> f64 {
        inclusive_amount * (self.rate() / self.base())
    }
}

/// Derives the tax split and revenue figures of a single row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowCalculator {
    service_charge_per_ticket: f64,
}

impl Default for RowCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_CHARGE_PER_TICKET)
    }
}

impl RowCalculator {
    pub fn new(service_charge_per_ticket: f64) -> Self {
        Self {
            service_charge_per_ticket,
        }
    }

    pub fn from_config(config: &BoxOfficeConfig) -> Self {
        Self::new(config.service_charge_per_ticket)
    }

    pub fn service_charge_per_ticket(&self) -> f64 {
        self.service_charge_per_ticket
    }

    /// Only the price class and ticket count feed the result. Unparseable cells count as 0.
    pub fn derive(&self, row: &RowInput) -> DerivedRow {
        self.derive_values(row.price_class_value(), row.ticket_count_value())
    }

    /// Negative and zero inputs are not clamped; they flow through the arithmetic.
    pub fn derive_values(&self, price_class: f64, ticket_count: f64) -> DerivedRow {
        let dis_gross = price_class * ticket_count;
        let gross = dis_gross + ticket_count * self.service_charge_per_ticket;

        // GST comes out of dis_gross only; the service charge is untaxed.
        let bracket = GstBracket::for_price_class(price_class);
        let gst = bracket.extract(dis_gross);

        let (gst18, gst12) = match bracket {
            GstBracket::Eighteen => (gst, 0.0),
            GstBracket::Twelve => (0.0, gst),
        };

        DerivedRow {
            dis_gross,
            gross,
            gst18,
            gst12,
            nett: dis_gross - gst,
        }
    }
}
