//! Spreadsheet day-offset dates.
//!
//! Legacy workbooks store dates as a number of days since an epoch that depends
//! on the workbook's date system. The fractional part is the time of day.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Workbook date system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateSystem {
    /// Windows default. Serial 1 is 1900-01-01 and the phantom 1900-02-29 is absorbed.
    #[default]
    Excel1900,
    /// Classic Mac default. Serial 0 is 1904-01-01.
    Excel1904,
}

impl DateSystem {
    /// Map the workbook flag: 0 selects the 1900 system, anything else 1904.
    pub fn from_indicator(indicator: u8) -> Self {
        if indicator == 0 { DateSystem::Excel1900 } else { DateSystem::Excel1904 }
    }
}

const MS_PER_DAY: f64 = 86_400_000.0;
// well past year 9999 in either direction
const MAX_ABS_DAYS: f64 = 4_000_000.0;

fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(0, 0, 0)
}

/// Convert a serial day offset to a timestamp.
///
/// Returns `None` for non-finite input and for results outside years 1..=9999.
pub fn from_serial(serial: f64, system: DateSystem) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = match system {
        DateSystem::Excel1904 => ymd(1904, 1, 1)?,
        DateSystem::Excel1900 if serial < 60.0 => ymd(1899, 12, 31)?,
        DateSystem::Excel1900 => ymd(1899, 12, 30)?,
    };
    let days = serial.trunc();
    if days.abs() > MAX_ABS_DAYS {
        return None;
    }
    let millis = ((serial - days) * MS_PER_DAY).round() as i64;
    let dt = epoch
        .checked_add_signed(Duration::try_days(days as i64)?)?
        .checked_add_signed(Duration::try_milliseconds(millis)?)?;
    if !(1..=9999).contains(&dt.year()) {
        return None;
    }
    Some(dt)
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn unix_epoch_in_both_systems() {
        assert_eq!(from_serial(25569.0, DateSystem::Excel1900).unwrap().date(), date(1970, 1, 1));
        assert_eq!(from_serial(24107.0, DateSystem::Excel1904).unwrap().date(), date(1970, 1, 1));
    }

    #[test]
    fn early_1900_serials_use_the_shifted_epoch() {
        assert_eq!(from_serial(1.0, DateSystem::Excel1900).unwrap().date(), date(1900, 1, 1));
        assert_eq!(from_serial(59.0, DateSystem::Excel1900).unwrap().date(), date(1900, 2, 28));
        assert_eq!(from_serial(61.0, DateSystem::Excel1900).unwrap().date(), date(1900, 3, 1));
    }

    #[test]
    fn fraction_is_time_of_day() {
        let dt = from_serial(45356.75, DateSystem::Excel1900).unwrap();
        assert_eq!(dt.date(), date(2024, 3, 5));
        assert_eq!(dt.hour(), 18);
    }

    #[test]
    fn out_of_range_and_non_finite_fail() {
        assert!(from_serial(f64::NAN, DateSystem::Excel1900).is_none());
        assert!(from_serial(f64::INFINITY, DateSystem::Excel1904).is_none());
        assert!(from_serial(1e12, DateSystem::Excel1900).is_none());
        assert!(from_serial(-800_000.0, DateSystem::Excel1900).is_none());
    }

    #[test]
    fn agrees_with_the_workbook_reader() {
        use calamine::{ExcelDateTime, ExcelDateTimeType};
        for (system, is_1904) in [(DateSystem::Excel1900, false), (DateSystem::Excel1904, true)] {
            for serial in [1.0, 59.0, 61.0, 25569.0, 45356.5] {
                let reader = ExcelDateTime::new(serial, ExcelDateTimeType::DateTime, is_1904).as_datetime();
                assert_eq!(from_serial(serial, system), reader, "serial {serial} in {system:?}");
            }
        }
    }

    #[test]
    fn indicator_round_trip() {
        assert_eq!(DateSystem::from_indicator(0), DateSystem::Excel1900);
        assert_eq!(DateSystem::from_indicator(1), DateSystem::Excel1904);
        assert_eq!(DateSystem::from_indicator(7), DateSystem::Excel1904);
    }
}
