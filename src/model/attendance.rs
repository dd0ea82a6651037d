use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Status stored on every attendance row.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Masuk,
    Keluar,
    Izin,
    Sakit,
    #[serde(rename = "tidak hadir")]
    #[strum(serialize = "tidak hadir")]
    TidakHadir,
}

impl AttendanceStatus {
    /// Statuses produced by the RFID reader.
    pub fn is_scan(self) -> bool {
        matches!(self, AttendanceStatus::Masuk | AttendanceStatus::Keluar)
    }

    /// Statuses that go through the approval lifecycle.
    pub fn is_leave(self) -> bool {
        matches!(self, AttendanceStatus::Izin | AttendanceStatus::Sakit)
    }

    /// The status a badge scan produces after `last`, the latest scan of the same day.
    pub fn after_scan(last: Option<AttendanceStatus>) -> AttendanceStatus {
        match last {
            Some(AttendanceStatus::Masuk) => AttendanceStatus::Keluar,
            _ => AttendanceStatus::Masuk,
        }
    }
}

/// Approval tri-state. Stored as a nullable TINYINT: NULL, 1, and 0 or -1.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Approval {
    Pending,
    Approved,
    Rejected,
}

impl Approval {
    /// `None` for a value outside the three encodings.
    pub fn from_column(value: Option<i8>) -> Option<Self> {
        match value {
            None => Some(Approval::Pending),
            Some(1) => Some(Approval::Approved),
            Some(0 | -1) => Some(Approval::Rejected),
            Some(_) => None,
        }
    }

    pub fn to_column(self) -> Option<i8> {
        match self {
            Approval::Pending => None,
            Approval::Approved => Some(1),
            Approval::Rejected => Some(0),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReadMarker {
    Unread = 0,
    Read = 1,
    Cleared = 2,
}

impl ReadMarker {
    pub fn from_column(value: i8) -> Option<Self> {
        match value {
            0 => Some(ReadMarker::Unread),
            1 => Some(ReadMarker::Read),
            2 => Some(ReadMarker::Cleared),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub id: u64,
    pub student_id: u64,
    pub timestamp: NaiveDateTime,
    pub status: AttendanceStatus,
    pub approval: Approval,
    pub read_marker: ReadMarker,
}

impl AttendanceRecord {
    /// Counted as an absence: literal `tidak hadir`, or a leave request that was turned down.
    pub fn is_counted_absent(&self) -> bool {
        match self.status {
            AttendanceStatus::TidakHadir => true,
            status if status.is_leave() => self.approval == Approval::Rejected,
            _ => false,
        }
    }

    /// Unread leave request, shown in the notification list.
    pub fn is_notification(&self) -> bool {
        self.status.is_leave() && self.read_marker == ReadMarker::Unread
    }
}

/// Row to insert. The store stamps the id.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub student_id: u64,
    pub timestamp: NaiveDateTime,
    pub status: AttendanceStatus,
    pub approval: Approval,
}

/// Attendance row joined with the owning student, for admin and notification listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceEntry {
    #[schema(example = 12)]
    pub id: u64,
    #[schema(example = 1)]
    pub student_id: u64,
    #[schema(example = "Ayu Lestari")]
    pub name: String,
    #[schema(example = "2023001")]
    pub nis: String,
    #[schema(example = "XI IPA 2")]
    pub student_class: String,
    #[schema(example = "sakit")]
    pub status: AttendanceStatus,
    #[schema(example = "2026-10-18T07:02:11", format = "date-time", value_type = String)]
    pub timestamp: NaiveDateTime,
    /// null = pending, 1 = approved, 0 = rejected
    #[schema(example = json!(null), nullable = true)]
    pub approved: Option<i8>,
    #[schema(example = 0)]
    pub is_read: i8,
}

/// Wire shape of one attendance row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecordResponse {
    #[schema(example = 12)]
    pub id: u64,
    #[schema(example = 1)]
    pub student_id: u64,
    #[schema(example = "2026-10-18T07:02:11", format = "date-time", value_type = String)]
    pub timestamp: NaiveDateTime,
    #[schema(example = "masuk")]
    pub status: AttendanceStatus,
    #[schema(example = json!(null), nullable = true)]
    pub approved: Option<i8>,
    #[schema(example = 0)]
    pub is_read: i8,
}

impl From<AttendanceRecord> for RecordResponse {
    fn from(r: AttendanceRecord) -> Self {
        Self {
            id: r.id,
            student_id: r.student_id,
            timestamp: r.timestamp,
            status: r.status,
            approved: r.approval.to_column(),
            is_read: r.read_marker as i8,
        }
    }
}
