use std::str::FromStr;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::{
    error::{TrackerError, TrackerResult},
    model::{
        attendance::{Approval, AttendanceRecord, AttendanceStatus, NewRecord},
        student::StudentRef,
    },
    store::RecordStore,
};

/// Files an izin/sakit request for a student. The request starts pending and unread.
pub async fn submit_request(
    store: &dyn RecordStore,
    student: &StudentRef,
    status: &str,
    now: NaiveDateTime,
) -> TrackerResult<u64> {
    let status = AttendanceStatus::from_str(status)
        .ok()
        .filter(|s| s.is_leave())
        .ok_or_else(|| TrackerError::InvalidStatus("Status harus 'izin' atau 'sakit'.".into()))?;

    let found = match student {
        StudentRef::Id(id) => store.find_student(*id).await?,
        StudentRef::Badge(rfid_uid) => store.find_student_by_badge(rfid_uid).await?,
    };
    let student = found.ok_or_else(|| TrackerError::NotFound("Murid tidak ditemukan.".into()))?;

    let id = store
        .insert_record(NewRecord {
            student_id: student.id,
            timestamp: now,
            status,
            approval: Approval::Pending,
        })
        .await?;

    info!(record_id = id, student_id = student.id, %status, "Leave request submitted");
    Ok(id)
}

/// Approves or rejects a pending leave request. A rejected request is rewritten
/// to `tidak hadir`. Decided requests cannot be decided again.
pub async fn decide(
    store: &dyn RecordStore,
    id: u64,
    approve: bool,
) -> TrackerResult<AttendanceRecord> {
    let record = store
        .find_record(id)
        .await?
        .ok_or_else(|| TrackerError::NotFound(format!("Absensi dengan id={} tidak ditemukan.", id)))?;

    if !record.status.is_leave() {
        return Err(TrackerError::InvalidState(
            "Hanya data izin/sakit yang bisa diproses.".into(),
        ));
    }
    if record.approval != Approval::Pending {
        return Err(TrackerError::InvalidState(
            "Pengajuan ini sudah diproses.".into(),
        ));
    }

    let (approval, status) = if approve {
        (Approval::Approved, record.status)
    } else {
        (Approval::Rejected, AttendanceStatus::TidakHadir)
    };

    if !store.apply_decision(id, approval, status).await? {
        // Someone else decided it between the read and the write.
        warn!(record_id = id, "Leave request decided concurrently");
        return Err(TrackerError::InvalidState(
            "Pengajuan ini sudah diproses.".into(),
        ));
    }

    info!(record_id = id, approve, "Leave request decided");

    Ok(AttendanceRecord {
        approval,
        status,
        ..record
    })
}

pub async fn mark_read(store: &dyn RecordStore, id: u64) -> TrackerResult<()> {
    if store.mark_read(id).await? {
        Ok(())
    } else {
        Err(TrackerError::NotFound(format!(
            "Absensi dengan id={} tidak ditemukan.",
            id
        )))
    }
}

/// Marks every unread izin/sakit request as read. Scan rows are left alone.
pub async fn mark_all_read(store: &dyn RecordStore) -> TrackerResult<u64> {
    let touched = store.mark_all_read().await?;
    info!(touched, "Notifications marked read");
    Ok(touched)
}

/// Hides read, approved requests from the notification list. The rows stay.
pub async fn clear_read(store: &dyn RecordStore) -> TrackerResult<u64> {
    let touched = store.clear_read().await?;
    info!(touched, "Read notifications cleared");
    Ok(touched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::ReadMarker;
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 5)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn store_with_student() -> (MemoryStore, u64) {
        let store = MemoryStore::new();
        let id = store.add_student("CARD-1", "2023001", "Ayu");
        (store, id)
    }

    #[tokio::test]
    async fn submit_by_id_or_badge_creates_pending_unread_row() {
        let (store, student_id) = store_with_student();

        let by_id = submit_request(&store, &StudentRef::Id(student_id), "izin", now())
            .await
            .unwrap();
        let by_badge = submit_request(&store, &StudentRef::Badge("CARD-1".into()), "sakit", now())
            .await
            .unwrap();

        let a = store.record(by_id).unwrap();
        assert_eq!(a.status, AttendanceStatus::Izin);
        assert_eq!(a.approval, Approval::Pending);
        assert_eq!(a.read_marker, ReadMarker::Unread);
        assert_eq!(a.timestamp, now());

        let b = store.record(by_badge).unwrap();
        assert_eq!(b.student_id, student_id);
        assert_eq!(b.status, AttendanceStatus::Sakit);
    }

    #[tokio::test]
    async fn submit_rejects_non_leave_status_without_writing() {
        let (store, student_id) = store_with_student();

        for status in ["terlambat", "masuk", "tidak hadir", ""] {
            let err = submit_request(&store, &StudentRef::Id(student_id), status, now())
                .await
                .unwrap_err();
            assert!(matches!(err, TrackerError::InvalidStatus(_)), "{status}");
        }
        assert_eq!(store.record_count(), 0);
    }

    #[tokio::test]
    async fn submit_for_unknown_student_is_not_found() {
        let (store, _) = store_with_student();

        let err = submit_request(&store, &StudentRef::Id(999), "izin", now())
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));

        let err = submit_request(&store, &StudentRef::Badge("NOPE".into()), "izin", now())
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));
        assert_eq!(store.record_count(), 0);
    }

    #[tokio::test]
    async fn approve_keeps_status() {
        let (store, student_id) = store_with_student();
        let id = submit_request(&store, &StudentRef::Id(student_id), "sakit", now())
            .await
            .unwrap();

        let updated = decide(&store, id, true).await.unwrap();
        assert_eq!(updated.approval, Approval::Approved);
        assert_eq!(updated.status, AttendanceStatus::Sakit);
        assert_eq!(store.record(id).unwrap(), updated);
    }

    #[tokio::test]
    async fn rejecting_izin_or_sakit_converges_to_absent() {
        let (store, student_id) = store_with_student();

        for status in ["izin", "sakit"] {
            let id = submit_request(&store, &StudentRef::Id(student_id), status, now())
                .await
                .unwrap();
            decide(&store, id, false).await.unwrap();

            let row = store.record(id).unwrap();
            assert_eq!(row.approval, Approval::Rejected);
            assert_eq!(row.approval.to_column(), Some(0));
            assert_eq!(row.status, AttendanceStatus::TidakHadir);
        }
    }

    #[tokio::test]
    async fn deciding_a_scan_row_fails_and_changes_nothing() {
        let (store, student_id) = store_with_student();
        let id = store.add_record(
            student_id,
            now(),
            AttendanceStatus::Masuk,
            Approval::Pending,
            ReadMarker::Unread,
        );
        let before = store.record(id).unwrap();

        for approve in [true, false] {
            let err = decide(&store, id, approve).await.unwrap_err();
            assert!(matches!(err, TrackerError::InvalidState(_)));
        }
        assert_eq!(store.record(id).unwrap(), before);
    }

    #[tokio::test]
    async fn decided_requests_are_terminal() {
        let (store, student_id) = store_with_student();
        let id = submit_request(&store, &StudentRef::Id(student_id), "izin", now())
            .await
            .unwrap();
        decide(&store, id, true).await.unwrap();

        let err = decide(&store, id, false).await.unwrap_err();
        assert!(matches!(err, TrackerError::InvalidState(_)));
        let row = store.record(id).unwrap();
        assert_eq!(row.approval, Approval::Approved);
        assert_eq!(row.status, AttendanceStatus::Izin);
    }

    #[tokio::test]
    async fn decide_unknown_record_is_not_found() {
        let (store, _) = store_with_student();
        let err = decide(&store, 42, true).await.unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));
    }

    #[tokio::test]
    async fn mark_read_touches_any_row() {
        let (store, student_id) = store_with_student();
        let scan = store.add_record(
            student_id,
            now(),
            AttendanceStatus::Keluar,
            Approval::Pending,
            ReadMarker::Unread,
        );

        mark_read(&store, scan).await.unwrap();
        assert_eq!(store.record(scan).unwrap().read_marker, ReadMarker::Read);

        let err = mark_read(&store, 999).await.unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));
    }

    #[tokio::test]
    async fn mark_all_read_only_touches_unread_leave_rows() {
        let (store, student_id) = store_with_student();
        let scan = store.add_record(
            student_id,
            now(),
            AttendanceStatus::Masuk,
            Approval::Pending,
            ReadMarker::Unread,
        );
        let absent = store.add_record(
            student_id,
            now(),
            AttendanceStatus::TidakHadir,
            Approval::Rejected,
            ReadMarker::Unread,
        );
        let leave = submit_request(&store, &StudentRef::Id(student_id), "izin", now())
            .await
            .unwrap();
        let sick = submit_request(&store, &StudentRef::Id(student_id), "sakit", now())
            .await
            .unwrap();

        assert_eq!(mark_all_read(&store).await.unwrap(), 2);

        assert_eq!(store.record(scan).unwrap().read_marker, ReadMarker::Unread);
        assert_eq!(store.record(absent).unwrap().read_marker, ReadMarker::Unread);
        assert_eq!(store.record(leave).unwrap().read_marker, ReadMarker::Read);
        assert_eq!(store.record(sick).unwrap().read_marker, ReadMarker::Read);
    }

    #[tokio::test]
    async fn clear_read_hides_only_read_approved_rows() {
        let (store, student_id) = store_with_student();
        let approved = store.add_record(
            student_id,
            now(),
            AttendanceStatus::Izin,
            Approval::Approved,
            ReadMarker::Read,
        );
        let rejected = store.add_record(
            student_id,
            now(),
            AttendanceStatus::TidakHadir,
            Approval::Rejected,
            ReadMarker::Read,
        );
        let pending = store.add_record(
            student_id,
            now(),
            AttendanceStatus::Sakit,
            Approval::Pending,
            ReadMarker::Read,
        );
        let unread = store.add_record(
            student_id,
            now(),
            AttendanceStatus::Sakit,
            Approval::Approved,
            ReadMarker::Unread,
        );

        assert_eq!(clear_read(&store).await.unwrap(), 1);

        assert_eq!(store.record(approved).unwrap().read_marker, ReadMarker::Cleared);
        assert_eq!(store.record(rejected).unwrap().read_marker, ReadMarker::Read);
        assert_eq!(store.record(pending).unwrap().read_marker, ReadMarker::Read);
        assert_eq!(store.record(unread).unwrap().read_marker, ReadMarker::Unread);
        // Cleared rows are still attendance facts.
        assert_eq!(store.record_count(), 4);
    }
}
