use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::{
    error::{TrackerError, TrackerResult},
    model::{
        attendance::{Approval, AttendanceStatus, NewRecord},
        student::Student,
    },
    store::RecordStore,
    utils::scan_lock::ScanLocks,
};

#[derive(Debug)]
pub struct ScanOutcome {
    pub record_id: u64,
    pub student: Student,
    pub status: AttendanceStatus,
}

/// Records one badge scan. The first scan of a day is `masuk`, and each later
/// scan flips the previous one.
pub async fn resolve_scan(
    store: &dyn RecordStore,
    locks: &ScanLocks,
    rfid_uid: &str,
    now: NaiveDateTime,
) -> TrackerResult<ScanOutcome> {
    let student = store
        .find_student_by_badge(rfid_uid)
        .await?
        .ok_or_else(|| TrackerError::NotFound("Kartu RFID tidak terdaftar.".into()))?;

    let _guard = locks.acquire(student.id).await;

    let last = store.last_scan_on(student.id, now.date()).await?;
    let status = AttendanceStatus::after_scan(last);
    debug!(student_id = student.id, ?last, %status, "Resolved scan");

    let record_id = store
        .insert_record(NewRecord {
            student_id: student.id,
            timestamp: now,
            status,
            approval: Approval::Pending,
        })
        .await?;

    info!(student_id = student.id, record_id, %status, "Scan recorded");

    Ok(ScanOutcome {
        record_id,
        student,
        status,
    })
}
