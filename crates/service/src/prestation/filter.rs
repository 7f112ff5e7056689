use chrono::NaiveDate;
use models::prestation::{Column, Model};
use sea_orm::{ColumnTrait, Condition};
use serde::Deserialize;

/// Raw listing filters, as received on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub invoice_number: Option<String>,
    pub matricule: Option<String>,
    pub specialty: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// Parsed listing filters. Every constraint is optional; date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrestationFilter {
    pub invoice_number: Option<String>,
    pub matricule: Option<String>,
    pub specialty: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

// malformed bounds are dropped, not reported
fn parse_date(v: Option<String>) -> Option<NaiveDate> {
    v.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}

impl From<FilterParams> for PrestationFilter {
    fn from(p: FilterParams) -> Self {
        Self {
            invoice_number: non_empty(p.invoice_number),
            matricule: non_empty(p.matricule),
            specialty: non_empty(p.specialty),
            date_from: parse_date(p.date_from),
            date_to: parse_date(p.date_to),
        }
    }
}

impl PrestationFilter {
    /// SQL condition equivalent to [`matches`](Self::matches).
    pub fn condition(&self) -> Condition {
        let mut cond = Condition::all();
        if let Some(v) = &self.invoice_number {
            cond = cond.add(Column::InvoiceNumber.eq(v.as_str()));
        }
        if let Some(v) = &self.matricule {
            cond = cond.add(Column::Matricule.eq(v.as_str()));
        }
        if let Some(v) = &self.specialty {
            cond = cond.add(Column::Specialty.eq(v.as_str()));
        }
        if let Some(d) = self.date_from {
            cond = cond.add(Column::Date.gte(d));
        }
        if let Some(d) = self.date_to {
            cond = cond.add(Column::Date.lte(d));
        }
        cond
    }

    pub fn matches(&self, m: &Model) -> bool {
        self.invoice_number.as_ref().map_or(true, |v| *v == m.invoice_number)
            && self.matricule.as_ref().map_or(true, |v| *v == m.matricule)
            && self.specialty.as_ref().map_or(true, |v| *v == m.specialty)
            && self.date_from.map_or(true, |d| m.date >= d)
            && self.date_to.map_or(true, |d| m.date <= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_model;

    fn params(matricule: &str, date_from: &str) -> FilterParams {
        FilterParams {
            matricule: Some(matricule.into()),
            date_from: Some(date_from.into()),
            ..Default::default()
        }
    }

    #[test]
    fn malformed_date_bound_is_ignored() {
        let with_bad = PrestationFilter::from(params("M123", "not-a-date"));
        let without = PrestationFilter::from(FilterParams { matricule: Some("M123".into()), ..Default::default() });
        assert_eq!(with_bad, without);
        assert_eq!(with_bad.date_from, None);
    }

    #[test]
    fn empty_strings_are_no_filter() {
        let f = PrestationFilter::from(FilterParams {
            invoice_number: Some(String::new()),
            specialty: Some(String::new()),
            date_to: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(f, PrestationFilter::default());
    }

    #[test]
    fn bounds_are_inclusive() {
        let m = sample_model(1);
        let f = PrestationFilter::from(FilterParams {
            date_from: Some("2024-03-05".into()),
            date_to: Some("2024-03-05".into()),
            ..Default::default()
        });
        assert!(f.matches(&m));

        let after = PrestationFilter::from(FilterParams { date_from: Some("2024-03-06".into()), ..Default::default() });
        assert!(!after.matches(&m));
    }

    #[test]
    fn filters_combine_with_and() {
        let m = sample_model(1);
        assert!(PrestationFilter::from(params("M123", "2024-01-01")).matches(&m));
        assert!(!PrestationFilter::from(params("M999", "2024-01-01")).matches(&m));
        assert!(!PrestationFilter::from(params("M123", "2025-01-01")).matches(&m));
    }
}
