//! Record schema for prestations.
//!
//! Three input shapes share one validation path:
//! - [`PrestationInput`]: create / full-replace payload, every field required except `order_number`
//! - [`PrestationPatch`]: partial update, every field optional
//! - [`PrestationDraft`]: typed accumulator filled cell by cell by the spreadsheet row mapper
//!
//! Each of them ends up as a [`NewPrestation`], whose amounts are fixed-point with
//! exactly two fractional digits.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Canonical prestation fields, in table declaration order (without `id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    OrderNumber,
    Date,
    LastName,
    FirstName,
    InvoiceNumber,
    PatientIndex,
    Matricule,
    Specialty,
    Act,
    RatePercent,
    PatientShare,
    EmployeeShare,
    TotalAmount,
    Adjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Date,
    Decimal,
    Text,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::OrderNumber => "order_number",
            Field::Date => "date",
            Field::LastName => "last_name",
            Field::FirstName => "first_name",
            Field::InvoiceNumber => "invoice_number",
            Field::PatientIndex => "patient_index",
            Field::Matricule => "matricule",
            Field::Specialty => "specialty",
            Field::Act => "act",
            Field::RatePercent => "rate_percent",
            Field::PatientShare => "patient_share",
            Field::EmployeeShare => "employee_share",
            Field::TotalAmount => "total_amount",
            Field::Adjustment => "adjustment",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::OrderNumber => FieldKind::Integer,
            Field::Date => FieldKind::Date,
            Field::RatePercent
            | Field::PatientShare
            | Field::EmployeeShare
            | Field::TotalAmount
            | Field::Adjustment => FieldKind::Decimal,
            _ => FieldKind::Text,
        }
    }

    /// Column length for text fields.
    pub fn max_len(self) -> Option<usize> {
        match self {
            Field::LastName | Field::FirstName => Some(128),
            Field::InvoiceNumber | Field::PatientIndex | Field::Matricule | Field::Specialty => Some(64),
            Field::Act => Some(256),
            _ => None,
        }
    }

    /// Integer digits allowed by the NUMERIC column (scale is always 2).
    pub fn integer_digits(self) -> Option<u32> {
        match self {
            Field::RatePercent => Some(3),
            Field::PatientShare | Field::EmployeeShare | Field::TotalAmount | Field::Adjustment => Some(10),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),
    #[error("field `{0}` must be a finite number")]
    NonFinite(&'static str),
    #[error("field `{field}` value {value} does not fit NUMERIC({precision}, 2)")]
    Precision { field: &'static str, value: String, precision: u32 },
    #[error("field `{field}` exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Where a record comes from. Direct API input requires non-empty names,
/// spreadsheet rows keep whatever the cell held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Api,
    Import,
}

/// A validated prestation ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPrestation {
    pub order_number: Option<i32>,
    pub date: NaiveDate,
    pub last_name: String,
    pub first_name: String,
    pub invoice_number: String,
    pub patient_index: String,
    pub matricule: String,
    pub specialty: String,
    pub act: String,
    pub rate_percent: Decimal,
    pub patient_share: Decimal,
    pub employee_share: Decimal,
    pub total_amount: Decimal,
    pub adjustment: Decimal,
}

impl NewPrestation {
    fn check_text(&self, origin: Origin) -> Result<(), RecordError> {
        let texts = [
            (Field::LastName, &self.last_name),
            (Field::FirstName, &self.first_name),
            (Field::InvoiceNumber, &self.invoice_number),
            (Field::PatientIndex, &self.patient_index),
            (Field::Matricule, &self.matricule),
            (Field::Specialty, &self.specialty),
            (Field::Act, &self.act),
        ];
        for (field, value) in texts {
            check_text_field(field, value, origin)?;
        }
        Ok(())
    }
}

fn check_text_field(field: Field, value: &str, origin: Origin) -> Result<(), RecordError> {
    if origin == Origin::Api && matches!(field, Field::LastName | Field::FirstName) && value.is_empty() {
        return Err(RecordError::EmptyField(field.name()));
    }
    if let Some(max) = field.max_len() {
        if value.chars().count() > max {
            return Err(RecordError::TooLong { field: field.name(), max });
        }
    }
    Ok(())
}

/// Convert a transport float into the stored fixed-point value.
///
/// The float goes through its shortest decimal representation, is rounded half
/// away from zero to two decimals and must fit the column's integer digits.
pub fn to_fixed(field: Field, value: f64) -> Result<Decimal, RecordError> {
    let name = field.name();
    if !value.is_finite() {
        return Err(RecordError::NonFinite(name));
    }
    let digits = field.integer_digits().unwrap_or(10);
    let overflow = || RecordError::Precision { field: name, value: value.to_string(), precision: digits + 2 };

    let exact = Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
        .ok_or_else(overflow)?;
    let mut fixed = exact.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if fixed.abs() >= Decimal::from(10i64.pow(digits)) {
        return Err(overflow());
    }
    fixed.rescale(2);
    if fixed.is_zero() {
        fixed.set_sign_positive(true);
    }
    Ok(fixed)
}

fn trimmed<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let s = String::deserialize(d)?;
    Ok(s.trim().to_string())
}

fn trimmed_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let s = Option::<String>::deserialize(d)?;
    Ok(s.map(|s| s.trim().to_string()))
}

// absent -> None (via `default`), null -> Some(None), value -> Some(Some(v))
fn nullable<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

/// Create / full-replace payload. Unknown JSON keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrestationInput {
    #[serde(default)]
    pub order_number: Option<i32>,
    pub date: NaiveDate,
    #[serde(deserialize_with = "trimmed")]
    pub last_name: String,
    #[serde(deserialize_with = "trimmed")]
    pub first_name: String,
    #[serde(deserialize_with = "trimmed")]
    pub invoice_number: String,
    #[serde(deserialize_with = "trimmed")]
    pub patient_index: String,
    #[serde(deserialize_with = "trimmed")]
    pub matricule: String,
    #[serde(deserialize_with = "trimmed")]
    pub specialty: String,
    #[serde(deserialize_with = "trimmed")]
    pub act: String,
    pub rate_percent: f64,
    pub patient_share: f64,
    pub employee_share: f64,
    pub total_amount: f64,
    pub adjustment: f64,
}

impl PrestationInput {
    /// Validate as direct API input.
    pub fn validate(self) -> Result<NewPrestation, RecordError> {
        self.into_record(Origin::Api)
    }

    pub fn into_record(self, origin: Origin) -> Result<NewPrestation, RecordError> {
        let record = NewPrestation {
            order_number: self.order_number,
            date: self.date,
            last_name: self.last_name.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            invoice_number: self.invoice_number.trim().to_string(),
            patient_index: self.patient_index.trim().to_string(),
            matricule: self.matricule.trim().to_string(),
            specialty: self.specialty.trim().to_string(),
            act: self.act.trim().to_string(),
            rate_percent: to_fixed(Field::RatePercent, self.rate_percent)?,
            patient_share: to_fixed(Field::PatientShare, self.patient_share)?,
            employee_share: to_fixed(Field::EmployeeShare, self.employee_share)?,
            total_amount: to_fixed(Field::TotalAmount, self.total_amount)?,
            adjustment: to_fixed(Field::Adjustment, self.adjustment)?,
        };
        record.check_text(origin)?;
        Ok(record)
    }
}

/// Partial update payload.
///
/// A key left out keeps the stored value. `order_number: null` clears it; `null`
/// on any other (non-nullable) field is treated as left out.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PrestationPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub order_number: Option<Option<i32>>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub patient_index: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub matricule: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub specialty: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub act: Option<String>,
    #[serde(default)]
    pub rate_percent: Option<f64>,
    #[serde(default)]
    pub patient_share: Option<f64>,
    #[serde(default)]
    pub employee_share: Option<f64>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub adjustment: Option<f64>,
}

/// Produce the record obtained by applying `patch` on top of `current`.
///
/// Only the patched fields are validated; untouched values are carried over as-is.
pub fn apply_patch(current: &NewPrestation, patch: PrestationPatch) -> Result<NewPrestation, RecordError> {
    let mut next = current.clone();

    if let Some(v) = patch.order_number {
        next.order_number = v;
    }
    if let Some(v) = patch.date {
        next.date = v;
    }

    let texts = [
        (Field::LastName, patch.last_name, &mut next.last_name),
        (Field::FirstName, patch.first_name, &mut next.first_name),
        (Field::InvoiceNumber, patch.invoice_number, &mut next.invoice_number),
        (Field::PatientIndex, patch.patient_index, &mut next.patient_index),
        (Field::Matricule, patch.matricule, &mut next.matricule),
        (Field::Specialty, patch.specialty, &mut next.specialty),
        (Field::Act, patch.act, &mut next.act),
    ];
    for (field, value, slot) in texts {
        if let Some(v) = value {
            let v = v.trim().to_string();
            check_text_field(field, &v, Origin::Api)?;
            *slot = v;
        }
    }

    let amounts = [
        (Field::RatePercent, patch.rate_percent, &mut next.rate_percent),
        (Field::PatientShare, patch.patient_share, &mut next.patient_share),
        (Field::EmployeeShare, patch.employee_share, &mut next.employee_share),
        (Field::TotalAmount, patch.total_amount, &mut next.total_amount),
        (Field::Adjustment, patch.adjustment, &mut next.adjustment),
    ];
    for (field, value, slot) in amounts {
        if let Some(v) = value {
            *slot = to_fixed(field, v)?;
        }
    }

    Ok(next)
}

/// Strongly typed partial record assembled by the spreadsheet row mapper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrestationDraft {
    pub order_number: Option<i32>,
    pub date: Option<NaiveDate>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub invoice_number: Option<String>,
    pub patient_index: Option<String>,
    pub matricule: Option<String>,
    pub specialty: Option<String>,
    pub act: Option<String>,
    pub rate_percent: Option<f64>,
    pub patient_share: Option<f64>,
    pub employee_share: Option<f64>,
    pub total_amount: Option<f64>,
    pub adjustment: Option<f64>,
}

impl PrestationDraft {
    /// Store a text value for a text field. Ignored for other kinds.
    pub fn set_text(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::LastName => &mut self.last_name,
            Field::FirstName => &mut self.first_name,
            Field::InvoiceNumber => &mut self.invoice_number,
            Field::PatientIndex => &mut self.patient_index,
            Field::Matricule => &mut self.matricule,
            Field::Specialty => &mut self.specialty,
            Field::Act => &mut self.act,
            _ => return,
        };
        *slot = Some(value);
    }

    /// Store an amount for a decimal field. Ignored for other kinds.
    pub fn set_amount(&mut self, field: Field, value: f64) {
        let slot = match field {
            Field::RatePercent => &mut self.rate_percent,
            Field::PatientShare => &mut self.patient_share,
            Field::EmployeeShare => &mut self.employee_share,
            Field::TotalAmount => &mut self.total_amount,
            Field::Adjustment => &mut self.adjustment,
            _ => return,
        };
        *slot = Some(value);
    }

    /// Required fields that were never filled.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let filled = [
            (Field::Date, self.date.is_some()),
            (Field::LastName, self.last_name.is_some()),
            (Field::FirstName, self.first_name.is_some()),
            (Field::InvoiceNumber, self.invoice_number.is_some()),
            (Field::PatientIndex, self.patient_index.is_some()),
            (Field::Matricule, self.matricule.is_some()),
            (Field::Specialty, self.specialty.is_some()),
            (Field::Act, self.act.is_some()),
            (Field::RatePercent, self.rate_percent.is_some()),
            (Field::PatientShare, self.patient_share.is_some()),
            (Field::EmployeeShare, self.employee_share.is_some()),
            (Field::TotalAmount, self.total_amount.is_some()),
            (Field::Adjustment, self.adjustment.is_some()),
        ];
        filled.into_iter().filter(|(_, ok)| !ok).map(|(f, _)| f.name()).collect()
    }

    /// Single validation step: presence of every required field, then the
    /// shared record rules with import permissiveness.
    pub fn finish(self) -> Result<NewPrestation, RecordError> {
        let missing = self.missing_fields();
        let (
            Some(date),
            Some(last_name),
            Some(first_name),
            Some(invoice_number),
            Some(patient_index),
            Some(matricule),
            Some(specialty),
            Some(act),
            Some(rate_percent),
            Some(patient_share),
            Some(employee_share),
            Some(total_amount),
            Some(adjustment),
        ) = (
            self.date,
            self.last_name,
            self.first_name,
            self.invoice_number,
            self.patient_index,
            self.matricule,
            self.specialty,
            self.act,
            self.rate_percent,
            self.patient_share,
            self.employee_share,
            self.total_amount,
            self.adjustment,
        )
        else {
            return Err(RecordError::MissingFields(missing));
        };

        PrestationInput {
            order_number: self.order_number,
            date,
            last_name,
            first_name,
            invoice_number,
            patient_index,
            matricule,
            specialty,
            act,
            rate_percent,
            patient_share,
            employee_share,
            total_amount,
            adjustment,
        }
        .into_record(Origin::Import)
    }
}
