//! Persistence seam. The attendance logic only ever talks to a [`RecordStore`].

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    error::StoreError,
    model::{
        attendance::{Approval, AttendanceEntry, AttendanceRecord, AttendanceStatus, NewRecord},
        role::{AdminAccount, Identity, IdentityKind},
        student::{NewStudent, Student, StudentUpdate},
    },
};

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_student(&self, id: u64) -> StoreResult<Option<Student>>;

    async fn find_student_by_badge(&self, rfid_uid: &str) -> StoreResult<Option<Student>>;

    async fn find_student_by_nis(&self, nis: &str) -> StoreResult<Option<Student>>;

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<AdminAccount>>;

    /// One lookup for either account table, tagged by where it was found.
    async fn find_identity(&self, kind: IdentityKind, id: u64) -> StoreResult<Option<Identity>>;

    /// All students ordered by name.
    async fn list_students(&self) -> StoreResult<Vec<Student>>;

    async fn create_student(&self, student: NewStudent) -> StoreResult<u64>;

    /// Returns false when no student has `id`.
    async fn update_student(&self, id: u64, update: StudentUpdate) -> StoreResult<bool>;

    async fn delete_student(&self, id: u64) -> StoreResult<bool>;

    /// Status of the newest `masuk`/`keluar` row for the student on `day`.
    async fn last_scan_on(
        &self,
        student_id: u64,
        day: NaiveDate,
    ) -> StoreResult<Option<AttendanceStatus>>;

    async fn insert_record(&self, record: NewRecord) -> StoreResult<u64>;

    async fn find_record(&self, id: u64) -> StoreResult<Option<AttendanceRecord>>;

    /// Writes the decision only while the row is still a pending leave request.
    /// Returns false when nothing was updated.
    async fn apply_decision(
        &self,
        id: u64,
        approval: Approval,
        status: AttendanceStatus,
    ) -> StoreResult<bool>;

    async fn mark_read(&self, id: u64) -> StoreResult<bool>;

    /// Unread leave requests become read. Returns the number of rows touched.
    async fn mark_all_read(&self) -> StoreResult<u64>;

    /// Read and approved rows are cleared from the notification list.
    async fn clear_read(&self) -> StoreResult<u64>;

    /// A student's rows, newest first.
    async fn records_for_student(&self, student_id: u64) -> StoreResult<Vec<AttendanceRecord>>;

    /// Rows with `from <= timestamp < to`, optionally for one student.
    async fn records_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        student_id: Option<u64>,
    ) -> StoreResult<Vec<AttendanceRecord>>;

    /// Rows of one calendar day with their student, newest first.
    async fn entries_on(&self, day: NaiveDate) -> StoreResult<Vec<AttendanceEntry>>;

    /// Unread leave requests with their student, newest first.
    async fn unread_notifications(&self) -> StoreResult<Vec<AttendanceEntry>>;

    /// Leave requests still waiting for a decision, newest first.
    async fn pending_requests(&self) -> StoreResult<Vec<AttendanceEntry>>;
}
