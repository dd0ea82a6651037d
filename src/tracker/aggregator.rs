use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use derive_more::Display;
use serde::{Serialize, Serializer};
use utoipa::ToSchema;

use crate::{
    error::{TrackerError, TrackerResult},
    model::attendance::{Approval, AttendanceRecord, AttendanceStatus},
    store::RecordStore,
};

/// Longest trend a caller may ask for.
pub const MAX_TREND_MONTHS: u32 = 120;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

/// A calendar month, displayed as `YYYY-MM`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display)]
#[display(fmt = "{:04}-{:02}", year, month)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    fn index(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    fn from_index(index: i64) -> Option<Self> {
        let year = i32::try_from(index.div_euclid(12)).ok()?;
        let month = u32::try_from(index.rem_euclid(12) + 1).ok()?;
        Self::new(year, month)
    }

    /// The month `delta` months away.
    pub fn shifted(self, delta: i64) -> Option<Self> {
        Self::from_index(self.index() + delta)
    }

    /// `[first instant of this month, first instant of the next)`.
    pub fn bounds(self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        let next = self.shifted(1)?;
        let end = NaiveDate::from_ymd_opt(next.year, next.month, 1)?;
        Some((start.and_time(NaiveTime::MIN), end.and_time(NaiveTime::MIN)))
    }

    /// Short Indonesian label such as `Okt 2026`. Display only.
    pub fn label(self) -> String {
        format!("{} {}", MONTH_LABELS[(self.month - 1) as usize], self.year)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-status counters shared by the monthly summary and the trend.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Tally {
    pub masuk: u64,
    pub izin: u64,
    pub sakit: u64,
    pub tidak_hadir: u64,
}

impl Tally {
    /// Only approved leave counts as izin/sakit; rejected leave counts as absent.
    pub fn add(&mut self, record: &AttendanceRecord) {
        match record.status {
            AttendanceStatus::Masuk => self.masuk += 1,
            AttendanceStatus::Izin if record.approval == Approval::Approved => self.izin += 1,
            AttendanceStatus::Sakit if record.approval == Approval::Approved => self.sakit += 1,
            _ if record.is_counted_absent() => self.tidak_hadir += 1,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "student_id": 1,
    "nis": "2023001",
    "name": "Ayu Lestari",
    "total_masuk": 18,
    "total_izin": 1,
    "total_sakit": 0,
    "total_tidak_hadir": 2
}))]
pub struct StudentSummary {
    pub student_id: u64,
    pub nis: String,
    pub name: String,
    pub total_masuk: u64,
    pub total_izin: u64,
    pub total_sakit: u64,
    pub total_tidak_hadir: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "month": "2026-10",
    "label": "Okt 2026",
    "masuk": 40,
    "izin": 2,
    "sakit": 1,
    "tidak_hadir": 3
}))]
pub struct TrendPoint {
    #[schema(value_type = String)]
    pub month: MonthKey,
    pub label: String,
    pub masuk: u64,
    pub izin: u64,
    pub sakit: u64,
    pub tidak_hadir: u64,
}

/// Per-student counts for one month. Every student appears, with zeros when
/// they have no rows; the result is ordered by name.
pub async fn monthly_summary(
    store: &dyn RecordStore,
    month: MonthKey,
) -> TrackerResult<Vec<StudentSummary>> {
    let mut students = store.list_students().await?;
    students.sort_by(|a, b| a.name.cmp(&b.name));

    let mut tallies: HashMap<u64, Tally> = HashMap::new();
    if let Some((from, to)) = month.bounds() {
        for record in store.records_between(from, to, None).await? {
            tallies.entry(record.student_id).or_default().add(&record);
        }
    }

    Ok(students
        .into_iter()
        .map(|s| {
            let t = tallies.get(&s.id).copied().unwrap_or_default();
            StudentSummary {
                student_id: s.id,
                nis: s.nis,
                name: s.name,
                total_masuk: t.masuk,
                total_izin: t.izin,
                total_sakit: t.sakit,
                total_tidak_hadir: t.tidak_hadir,
            }
        })
        .collect())
}

/// Counts for the `months` months ending with the month of `today`, oldest
/// first. Returns exactly `max(months, 1)` points, or `InvalidRange` when
/// `months` exceeds [`MAX_TREND_MONTHS`] or a month falls outside the calendar.
pub async fn monthly_trend(
    store: &dyn RecordStore,
    months: u32,
    student_id: Option<u64>,
    today: NaiveDate,
) -> TrackerResult<Vec<TrendPoint>> {
    if months > MAX_TREND_MONTHS {
        return Err(TrackerError::InvalidRange(format!(
            "Jumlah bulan maksimal {MAX_TREND_MONTHS}."
        )));
    }

    let current = MonthKey::of(today);
    let span = i64::from(months.max(1));
    let keys: Vec<MonthKey> = (0..span)
        .map(|i| current.shifted(i - (span - 1)))
        .collect::<Option<_>>()
        .ok_or_else(|| TrackerError::InvalidRange("Rentang bulan tidak valid.".into()))?;

    let mut tallies: HashMap<MonthKey, Tally> = HashMap::new();
    let range = keys
        .first()
        .and_then(|k| k.bounds())
        .zip(current.bounds())
        .map(|((from, _), (_, to))| (from, to));
    if let Some((from, to)) = range {
        for record in store.records_between(from, to, student_id).await? {
            tallies
                .entry(MonthKey::of(record.timestamp.date()))
                .or_default()
                .add(&record);
        }
    }

    Ok(keys
        .into_iter()
        .map(|key| {
            let t = tallies.get(&key).copied().unwrap_or_default();
            TrendPoint {
                month: key,
                label: key.label(),
                masuk: t.masuk,
                izin: t.izin,
                sakit: t.sakit,
                tidak_hadir: t.tidak_hadir,
            }
        })
        .collect())
}
