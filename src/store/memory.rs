//! In-process [`RecordStore`] used by the tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    error::StoreError,
    model::{
        attendance::{
            Approval, AttendanceEntry, AttendanceRecord, AttendanceStatus, NewRecord, ReadMarker,
        },
        role::{AdminAccount, Identity, IdentityKind, Role},
        student::{NewStudent, Student, StudentUpdate},
    },
    store::{RecordStore, StoreResult},
};

#[derive(Default)]
struct Tables {
    students: Vec<Student>,
    admins: Vec<AdminAccount>,
    records: Vec<AttendanceRecord>,
    next_id: u64,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn entry(&self, r: &AttendanceRecord) -> Option<AttendanceEntry> {
        let s = self.students.iter().find(|s| s.id == r.student_id)?;
        Some(AttendanceEntry {
            id: r.id,
            student_id: s.id,
            name: s.name.clone(),
            nis: s.nis.clone(),
            student_class: s.student_class.clone(),
            status: r.status,
            timestamp: r.timestamp,
            approved: r.approval.to_column(),
            is_read: r.read_marker as i8,
        })
    }

    fn entries_where(&self, keep: impl Fn(&AttendanceRecord) -> bool) -> Vec<AttendanceEntry> {
        let mut rows: Vec<&AttendanceRecord> = self.records.iter().filter(|r| keep(r)).collect();
        rows.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        rows.into_iter().filter_map(|r| self.entry(r)).collect()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> StoreResult<std::sync::MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Corrupt("memory store poisoned".into()))
    }

    /// Adds a student with a placeholder password and returns its id.
    pub fn add_student(&self, rfid_uid: &str, nis: &str, name: &str) -> u64 {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        t.students.push(Student {
            id,
            rfid_uid: rfid_uid.into(),
            nis: nis.into(),
            name: name.into(),
            student_class: "X-1".into(),
            password: String::new(),
            role: Role::Student,
        });
        id
    }

    pub fn add_admin(&self, username: &str, password_hash: &str) -> u64 {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        t.admins.push(AdminAccount {
            id,
            username: username.into(),
            password: password_hash.into(),
        });
        id
    }

    pub fn set_password(&self, student_id: u64, password_hash: &str) {
        let mut t = self.tables.lock().unwrap();
        if let Some(s) = t.students.iter_mut().find(|s| s.id == student_id) {
            s.password = password_hash.into();
        }
    }

    /// Inserts a raw row, bypassing the lifecycle rules.
    pub fn add_record(
        &self,
        student_id: u64,
        timestamp: NaiveDateTime,
        status: AttendanceStatus,
        approval: Approval,
        read_marker: ReadMarker,
    ) -> u64 {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        t.records.push(AttendanceRecord {
            id,
            student_id,
            timestamp,
            status,
            approval,
            read_marker,
        });
        id
    }

    pub fn record(&self, id: u64) -> Option<AttendanceRecord> {
        let t = self.tables.lock().unwrap();
        t.records.iter().find(|r| r.id == id).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.tables.lock().unwrap().records.len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_student(&self, id: u64) -> StoreResult<Option<Student>> {
        Ok(self.tables()?.students.iter().find(|s| s.id == id).cloned())
    }

    async fn find_student_by_badge(&self, rfid_uid: &str) -> StoreResult<Option<Student>> {
        Ok(self
            .tables()?
            .students
            .iter()
            .find(|s| s.rfid_uid == rfid_uid)
            .cloned())
    }

    async fn find_student_by_nis(&self, nis: &str) -> StoreResult<Option<Student>> {
        Ok(self.tables()?.students.iter().find(|s| s.nis == nis).cloned())
    }

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<AdminAccount>> {
        Ok(self
            .tables()?
            .admins
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_identity(&self, kind: IdentityKind, id: u64) -> StoreResult<Option<Identity>> {
        let t = self.tables()?;
        Ok(match kind {
            IdentityKind::Student => t
                .students
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .map(Identity::Student),
            IdentityKind::Admin => t
                .admins
                .iter()
                .find(|a| a.id == id)
                .cloned()
                .map(Identity::Admin),
        })
    }

    async fn list_students(&self) -> StoreResult<Vec<Student>> {
        let mut students = self.tables()?.students.clone();
        students.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(students)
    }

    async fn create_student(&self, student: NewStudent) -> StoreResult<u64> {
        let mut t = self.tables()?;
        if t
            .students
            .iter()
            .any(|s| s.rfid_uid == student.rfid_uid || s.nis == student.nis)
        {
            return Err(StoreError::Duplicate("RFID UID or NIS".into()));
        }
        let id = t.next_id();
        t.students.push(Student {
            id,
            rfid_uid: student.rfid_uid,
            nis: student.nis,
            name: student.name,
            student_class: student.student_class,
            password: student.password,
            role: student.role,
        });
        Ok(id)
    }

    async fn update_student(&self, id: u64, update: StudentUpdate) -> StoreResult<bool> {
        let mut t = self.tables()?;
        if t.students.iter().any(|s| s.id != id && s.nis == update.nis) {
            return Err(StoreError::Duplicate("NIS".into()));
        }
        let Some(s) = t.students.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };
        s.nis = update.nis;
        s.name = update.name;
        s.student_class = update.student_class;
        s.role = update.role;
        if let Some(password) = update.password {
            s.password = password;
        }
        Ok(true)
    }

    async fn delete_student(&self, id: u64) -> StoreResult<bool> {
        let mut t = self.tables()?;
        let before = t.students.len();
        t.students.retain(|s| s.id != id);
        let removed = t.students.len() != before;
        if removed {
            t.records.retain(|r| r.student_id != id);
        }
        Ok(removed)
    }

    async fn last_scan_on(
        &self,
        student_id: u64,
        day: NaiveDate,
    ) -> StoreResult<Option<AttendanceStatus>> {
        let t = self.tables()?;
        Ok(t.records
            .iter()
            .filter(|r| {
                r.student_id == student_id && r.timestamp.date() == day && r.status.is_scan()
            })
            .max_by_key(|r| (r.timestamp, r.id))
            .map(|r| r.status))
    }

    async fn insert_record(&self, record: NewRecord) -> StoreResult<u64> {
        let mut t = self.tables()?;
        let id = t.next_id();
        t.records.push(AttendanceRecord {
            id,
            student_id: record.student_id,
            timestamp: record.timestamp,
            status: record.status,
            approval: record.approval,
            read_marker: ReadMarker::Unread,
        });
        Ok(id)
    }

    async fn find_record(&self, id: u64) -> StoreResult<Option<AttendanceRecord>> {
        Ok(self.tables()?.records.iter().find(|r| r.id == id).cloned())
    }

    async fn apply_decision(
        &self,
        id: u64,
        approval: Approval,
        status: AttendanceStatus,
    ) -> StoreResult<bool> {
        let mut t = self.tables()?;
        match t.records.iter_mut().find(|r| {
            r.id == id && r.approval == Approval::Pending && r.status.is_leave()
        }) {
            Some(r) => {
                r.approval = approval;
                r.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_read(&self, id: u64) -> StoreResult<bool> {
        let mut t = self.tables()?;
        match t.records.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                r.read_marker = ReadMarker::Read;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self) -> StoreResult<u64> {
        let mut t = self.tables()?;
        let mut touched = 0;
        for r in t.records.iter_mut().filter(|r| r.is_notification()) {
            r.read_marker = ReadMarker::Read;
            touched += 1;
        }
        Ok(touched)
    }

    async fn clear_read(&self) -> StoreResult<u64> {
        let mut t = self.tables()?;
        let mut touched = 0;
        for r in t.records.iter_mut().filter(|r| {
            r.read_marker == ReadMarker::Read && r.approval == Approval::Approved
        }) {
            r.read_marker = ReadMarker::Cleared;
            touched += 1;
        }
        Ok(touched)
    }

    async fn records_for_student(&self, student_id: u64) -> StoreResult<Vec<AttendanceRecord>> {
        let mut rows: Vec<AttendanceRecord> = self
            .tables()?
            .records
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        Ok(rows)
    }

    async fn records_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        student_id: Option<u64>,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let mut rows: Vec<AttendanceRecord> = self
            .tables()?
            .records
            .iter()
            .filter(|r| r.timestamp >= from && r.timestamp < to)
            .filter(|r| student_id.is_none_or(|id| r.student_id == id))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.timestamp, r.id));
        Ok(rows)
    }

    async fn entries_on(&self, day: NaiveDate) -> StoreResult<Vec<AttendanceEntry>> {
        Ok(self.tables()?.entries_where(|r| r.timestamp.date() == day))
    }

    async fn unread_notifications(&self) -> StoreResult<Vec<AttendanceEntry>> {
        Ok(self.tables()?.entries_where(|r| r.is_notification()))
    }

    async fn pending_requests(&self) -> StoreResult<Vec<AttendanceEntry>> {
        Ok(self
            .tables()?
            .entries_where(|r| r.status.is_leave() && r.approval == Approval::Pending))
    }
}
