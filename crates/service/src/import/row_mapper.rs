//! Spreadsheet row → prestation record.
//!
//! Cell coercion never fails: every malformed cell resolves to a fallback
//! (no order number, the 1970-01-01 sentinel date, a zero amount, an empty
//! string). Only the final [`PrestationDraft::finish`] step can reject a row,
//! when a required column is missing altogether or a value does not fit its
//! column.

use chrono::NaiveDate;
use models::record::{Field, FieldKind, NewPrestation, PrestationDraft, RecordError};

use super::xldate::{self, DateSystem};

/// Legacy header labels and the field each one feeds.
pub const HEADER_ALIASES: [(&str, Field); 14] = [
    ("N° d'ordre", Field::OrderNumber),
    ("Date", Field::Date),
    ("Nom", Field::LastName),
    ("Prenom", Field::FirstName),
    ("N° Facture", Field::InvoiceNumber),
    ("Index Patient", Field::PatientIndex),
    ("Matricule", Field::Matricule),
    ("Spécialité", Field::Specialty),
    ("Acte", Field::Act),
    ("Taux", Field::RatePercent),
    ("Part Patient", Field::PatientShare),
    ("Part Employé", Field::EmployeeShare),
    ("Montant Total", Field::TotalAmount),
    ("Reglage", Field::Adjustment),
];

/// Field fed by a header label, if the label is known.
pub fn header_field(label: &str) -> Option<Field> {
    let label = label.trim();
    HEADER_ALIASES.iter().find(|(alias, _)| *alias == label).map(|(_, f)| *f)
}

/// Date stored when a date cell cannot be read.
pub fn sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Raw spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    /// Empty, or text made of whitespace only.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Integer value, or `None` for empty, unparsable or out-of-range cells.
    pub fn to_order_number(&self) -> Option<i32> {
        match self {
            CellValue::Int(i) => i32::try_from(*i).ok(),
            CellValue::Float(f) => {
                let t = f.trunc();
                if t.is_finite() && t >= f64::from(i32::MIN) && t <= f64::from(i32::MAX) {
                    Some(t as i32)
                } else {
                    None
                }
            }
            CellValue::Bool(b) => Some(i32::from(*b)),
            CellValue::Text(s) => s.trim().parse::<i64>().ok().and_then(|i| i32::try_from(i).ok()),
            CellValue::Empty => None,
        }
    }

    /// Calendar date from a day offset or a `DD/MM/YYYY` text; sentinel otherwise.
    pub fn to_date(&self, system: DateSystem) -> NaiveDate {
        let parsed = match self {
            CellValue::Text(s) => {
                let head: String = s.chars().take(10).collect();
                if is_day_month_year(&head) {
                    NaiveDate::parse_from_str(&head, "%d/%m/%Y").ok()
                } else {
                    None
                }
            }
            other => other
                .as_number()
                .and_then(|serial| xldate::from_serial(serial, system))
                .map(|dt| dt.date()),
        };
        parsed.unwrap_or_else(sentinel_date)
    }

    /// Floating-point amount; `0.0` for empty or unparsable cells.
    pub fn to_amount(&self) -> f64 {
        match self {
            CellValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            other => other.as_number().unwrap_or(0.0),
        }
    }

    /// Trimmed text rendering. Numbers keep the legacy float form (`1042.0`),
    /// booleans read as `1`/`0`.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Int(i) => format!("{i}.0"),
            CellValue::Float(f) => float_text(*f),
            CellValue::Bool(b) => u8::from(*b).to_string(),
        }
    }
}

/// `D/M/YYYY` shape: one or two digit day and month, exactly four digit year.
fn is_day_month_year(head: &str) -> bool {
    let digits = |part: &str, min: usize, max: usize| {
        (min..=max).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
    };
    let mut parts = head.split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(d), Some(m), Some(y), None) => digits(d, 1, 2) && digits(m, 1, 2) && digits(y, 4, 4),
        _ => false,
    }
}

/// Shortest round-trip form with a mandatory fraction or exponent:
/// `1042.0`, `12.25`, `1e+16`, `1.5e-05`.
fn float_text(f: f64) -> String {
    if f.is_nan() {
        return "nan".into();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf".into() } else { "-inf".into() };
    }
    let abs = f.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let sci = format!("{f:e}");
        return match sci.split_once('e') {
            Some((mantissa, exp)) => {
                let exp: i32 = exp.parse().unwrap_or_default();
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.abs())
            }
            None => sci,
        };
    }
    let plain = f.to_string();
    if plain.contains('.') { plain } else { format!("{plain}.0") }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Header row resolved once, then applied to every data row of the sheet.
#[derive(Debug, Clone)]
pub struct RowMapper {
    columns: Vec<(usize, Field)>,
    date_system: DateSystem,
}

impl RowMapper {
    pub fn new<S: AsRef<str>>(headers: &[S], date_system: DateSystem) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, h)| header_field(h.as_ref()).map(|f| (idx, f)))
            .collect();
        Self { columns, date_system }
    }

    /// Coerce every recognized cell into a draft. Never fails.
    pub fn draft(&self, cells: &[CellValue]) -> PrestationDraft {
        let mut draft = PrestationDraft::default();
        for &(idx, field) in &self.columns {
            let cell = cells.get(idx).unwrap_or(&EMPTY_CELL);
            match field.kind() {
                FieldKind::Integer => draft.order_number = cell.to_order_number(),
                FieldKind::Date => draft.date = Some(cell.to_date(self.date_system)),
                FieldKind::Decimal => draft.set_amount(field, cell.to_amount()),
                FieldKind::Text => draft.set_text(field, cell.to_text()),
            }
        }
        draft
    }

    pub fn map(&self, cells: &[CellValue]) -> Result<NewPrestation, RecordError> {
        self.draft(cells).finish()
    }
}

/// Map one row given its header row and the workbook date system.
pub fn map_row<S: AsRef<str>>(
    headers: &[S],
    cells: &[CellValue],
    date_system: DateSystem,
) -> Result<NewPrestation, RecordError> {
    RowMapper::new(headers, date_system).map(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADERS: [&str; 14] = [
        "N° d'ordre", "Date", "Nom", "Prenom", "N° Facture", "Index Patient", "Matricule",
        "Spécialité", "Acte", "Taux", "Part Patient", "Part Employé", "Montant Total", "Reglage",
    ];

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn row() -> Vec<CellValue> {
        vec![
            CellValue::Float(3.0),
            CellValue::Float(45356.0),
            text(" Sow "),
            text("Aminata"),
            text("F-2024-001"),
            CellValue::Float(1042.0),
            text("M123"),
            text("Ophtalmologie"),
            text("Consultation"),
            CellValue::Float(80.0),
            text("12.50"),
            CellValue::Int(50),
            CellValue::Float(62.5),
            CellValue::Empty,
        ]
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn maps_a_complete_row() {
        let rec = map_row(&HEADERS, &row(), DateSystem::Excel1900).unwrap();
        assert_eq!(rec.order_number, Some(3));
        assert_eq!(rec.date, date(2024, 3, 5));
        assert_eq!(rec.last_name, "Sow");
        assert_eq!(rec.patient_index, "1042.0");
        assert_eq!(rec.patient_share.to_string(), "12.50");
        assert_eq!(rec.employee_share.to_string(), "50.00");
        assert_eq!(rec.adjustment.to_string(), "0.00");
    }

    #[test]
    fn epoch_serial_maps_to_1970() {
        assert_eq!(CellValue::Float(25569.0).to_date(DateSystem::Excel1900), date(1970, 1, 1));
        assert_eq!(CellValue::Int(25569).to_date(DateSystem::Excel1900), date(1970, 1, 1));
    }

    #[test]
    fn failing_serial_falls_back_to_sentinel() {
        for cell in [CellValue::Float(f64::NAN), CellValue::Float(1e15), CellValue::Float(-1e9)] {
            assert_eq!(cell.to_date(DateSystem::Excel1900), sentinel_date());
        }
    }

    #[test]
    fn text_dates_read_only_the_first_ten_characters() {
        assert_eq!(text("05/03/2024").to_date(DateSystem::Excel1900), date(2024, 3, 5));
        assert_eq!(text("05/03/2024 08:30:00").to_date(DateSystem::Excel1900), date(2024, 3, 5));
        assert_eq!(text("05/03/2024abc").to_date(DateSystem::Excel1904), date(2024, 3, 5));
        assert_eq!(text("2024-03-05").to_date(DateSystem::Excel1900), sentinel_date());
        assert_eq!(text("31/02/2024").to_date(DateSystem::Excel1900), sentinel_date());
        assert_eq!(text("5/3/2024").to_date(DateSystem::Excel1900), date(2024, 3, 5));
        assert_eq!(text("05/03/24").to_date(DateSystem::Excel1900), sentinel_date());
        assert_eq!(text(" 05/03/2024").to_date(DateSystem::Excel1900), sentinel_date());
        assert_eq!(text("05/03/202").to_date(DateSystem::Excel1900), sentinel_date());
        assert_eq!(text("05/03/+2024").to_date(DateSystem::Excel1900), sentinel_date());
        assert_eq!(text("005/03/2024").to_date(DateSystem::Excel1900), sentinel_date());
        assert_eq!(CellValue::Empty.to_date(DateSystem::Excel1900), sentinel_date());
    }

    #[test]
    fn amounts_fall_back_to_zero() {
        assert_eq!(text("").to_amount(), 0.0);
        assert_eq!(CellValue::Empty.to_amount(), 0.0);
        assert_eq!(text("abc").to_amount(), 0.0);
        assert_eq!(text("12.50").to_amount(), 12.5);
        assert_eq!(text(" 7 ").to_amount(), 7.0);
        assert_eq!(CellValue::Bool(true).to_amount(), 1.0);
    }

    #[test]
    fn order_number_falls_back_to_none() {
        assert_eq!(CellValue::Empty.to_order_number(), None);
        assert_eq!(text("").to_order_number(), None);
        assert_eq!(text("n/a").to_order_number(), None);
        assert_eq!(text("3.5").to_order_number(), None);
        assert_eq!(text(" 12 ").to_order_number(), Some(12));
        assert_eq!(CellValue::Float(7.9).to_order_number(), Some(7));
        assert_eq!(CellValue::Float(f64::NAN).to_order_number(), None);
        assert_eq!(CellValue::Int(i64::MAX).to_order_number(), None);
    }

    #[test]
    fn text_rendering() {
        assert_eq!(CellValue::Empty.to_text(), "");
        assert_eq!(text("  abc \t").to_text(), "abc");
        assert_eq!(CellValue::Float(12345.0).to_text(), "12345.0");
        assert_eq!(CellValue::Float(12.25).to_text(), "12.25");
        assert_eq!(CellValue::Float(-0.0).to_text(), "-0.0");
        assert_eq!(CellValue::Float(1e16).to_text(), "1e+16");
        assert_eq!(CellValue::Float(0.000015).to_text(), "1.5e-05");
        assert_eq!(CellValue::Int(-4).to_text(), "-4.0");
        assert_eq!(CellValue::Bool(true).to_text(), "1");
        assert_eq!(CellValue::Bool(false).to_text(), "0");
    }

    #[test]
    fn coercion_never_panics_for_any_cell_kind() {
        let cells = [
            CellValue::Empty,
            CellValue::Int(i64::MIN),
            CellValue::Float(f64::NEG_INFINITY),
            CellValue::Float(-0.0),
            text("\u{0}\u{fffd}"),
            text("1e400"),
            CellValue::Bool(true),
        ];
        for cell in &cells {
            let _ = cell.to_order_number();
            let _ = cell.to_date(DateSystem::Excel1900);
            let _ = cell.to_date(DateSystem::Excel1904);
            let _ = cell.to_amount();
            let _ = cell.to_text();
        }
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let base = map_row(&HEADERS, &row(), DateSystem::Excel1900).unwrap();

        let mut headers: Vec<&str> = HEADERS.to_vec();
        headers.insert(4, "Commentaire");
        let mut cells = row();
        cells.insert(4, text("should not matter"));
        let with_extra = map_row(&headers, &cells, DateSystem::Excel1900).unwrap();

        assert_eq!(base, with_extra);
    }

    #[test]
    fn column_order_is_irrelevant() {
        let base = map_row(&HEADERS, &row(), DateSystem::Excel1900).unwrap();
        let mut headers: Vec<&str> = HEADERS.to_vec();
        let mut cells = row();
        headers.reverse();
        cells.reverse();
        assert_eq!(map_row(&headers, &cells, DateSystem::Excel1900).unwrap(), base);
    }

    #[test]
    fn renamed_header_drops_the_field_and_fails_validation() {
        let mut headers: Vec<&str> = HEADERS.to_vec();
        headers[2] = "Nom de famille";
        let err = map_row(&headers, &row(), DateSystem::Excel1900).unwrap_err();
        assert_eq!(err, RecordError::MissingFields(vec!["last_name"]));
    }

    #[test]
    fn missing_order_number_column_is_fine() {
        let headers = &HEADERS[1..];
        let cells = &row()[1..];
        let rec = map_row(headers, cells, DateSystem::Excel1900).unwrap();
        assert_eq!(rec.order_number, None);
    }

    #[test]
    fn short_rows_read_missing_cells_as_empty() {
        let mut cells = row();
        cells.truncate(10);
        let rec = map_row(&HEADERS, &cells, DateSystem::Excel1900).unwrap();
        assert_eq!(rec.total_amount.to_string(), "0.00");
    }

    #[test]
    fn headers_are_trimmed_before_lookup() {
        assert_eq!(header_field("  Matricule "), Some(Field::Matricule));
        assert_eq!(header_field("matricule"), None);
    }
}
