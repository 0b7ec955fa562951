//! Packed directory-entry timestamps.
//!
//! Entries store local wall-clock time with two-second resolution: the date
//! word holds `year - 1980` (7 bits), month (4 bits), day (5 bits), and the
//! time word holds hour (5 bits), minute (6 bits), seconds / 2 (5 bits).

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};

const MIN_YEAR: i32 = 1980;
const MAX_YEAR: i32 = 2107;

/// The `(time, date)` word pair as stored in a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackedDateTime {
    pub time: u16,
    pub date: u16,
}

/// 1980-01-01 00:00:00, the earliest representable instant.
pub fn earliest() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(MIN_YEAR, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// 2107-12-31 23:59:58, the latest representable instant.
pub fn latest() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(MAX_YEAR, 12, 31)
        .and_then(|date| date.and_hms_opt(23, 59, 58))
        .unwrap_or_default()
}

/// The current local time, as stamped on newly created entries.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl PackedDateTime {
    /// Odd seconds are truncated to the even second below; years outside
    /// 1980..=2107 are clamped.
    pub fn pack(datetime: &NaiveDateTime) -> Self {
        let datetime = if datetime.year() < MIN_YEAR {
            earliest()
        } else if datetime.year() > MAX_YEAR {
            latest()
        } else {
            *datetime
        };
        let time = ((datetime.hour() as u16) << 11)
            | ((datetime.minute() as u16) << 5)
            | ((datetime.second() as u16) >> 1);
        let date = (((datetime.year() - MIN_YEAR) as u16) << 9)
            | ((datetime.month() as u16) << 5)
            | (datetime.day() as u16);
        Self { time, date }
    }

    /// Field combinations that are not a real calendar instant (such as the
    /// all-zero words of a blank entry) decode as [`earliest`].
    pub fn unpack(self) -> NaiveDateTime {
        let year = ((self.date >> 9) & 0x7F) as i32 + MIN_YEAR;
        let month = ((self.date >> 5) & 0xF) as u32;
        let day = (self.date & 0x1F) as u32;
        let hour = ((self.time >> 11) & 0x1F) as u32;
        let minute = ((self.time >> 5) & 0x3F) as u32;
        let second = ((self.time & 0x1F) << 1) as u32;
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .unwrap_or_else(earliest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn even_seconds_survive() {
        let original = datetime(2023, 7, 23, 15, 3, 28);
        let packed = PackedDateTime::pack(&original);
        assert_eq!(packed.unpack(), original);
    }

    #[test]
    fn odd_seconds_truncate() {
        let packed = PackedDateTime::pack(&datetime(1999, 12, 31, 23, 59, 59));
        assert_eq!(packed.unpack(), datetime(1999, 12, 31, 23, 59, 58));
    }

    #[test]
    fn bit_layout() {
        let packed = PackedDateTime::pack(&datetime(2055, 7, 23, 15, 3, 28));
        assert_eq!(packed.date, 38647);
        assert_eq!(packed.time, (15 << 11) | (3 << 5) | 14);
    }

    #[test]
    fn range_limits() {
        assert_eq!(PackedDateTime::pack(&earliest()).date, 33);
        assert_eq!(PackedDateTime::pack(&latest()).unpack(), latest());
        assert_eq!(
            PackedDateTime::pack(&datetime(1970, 1, 1, 0, 0, 0)).unpack(),
            earliest()
        );
        assert_eq!(
            PackedDateTime::pack(&datetime(2200, 6, 1, 12, 0, 0)).unpack(),
            latest()
        );
    }

    #[test]
    fn blank_words_decode_as_earliest() {
        assert_eq!(PackedDateTime::default().unpack(), earliest());
    }
}
