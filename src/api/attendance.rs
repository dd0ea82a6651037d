use crate::{
    api::local_now,
    auth::auth::AuthUser,
    error::TrackerError,
    model::attendance::{AttendanceStatus, RecordResponse},
    store::RecordStore,
    tracker::resolver::resolve_scan,
    utils::scan_lock::ScanLocks,
};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ScanRequest {
    #[schema(example = "04A1B2C3")]
    pub rfid_uid: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ScanResponse {
    #[schema(example = 42)]
    pub id: u64,
    #[schema(example = "✅ Absen MASUK berhasil! Selamat datang, Ayu!")]
    pub message: String,
    #[schema(example = "masuk")]
    pub status: AttendanceStatus,
}

#[derive(Serialize, ToSchema)]
pub struct MyAttendanceResponse {
    pub attendance: Vec<RecordResponse>,
}

/// RFID reader endpoint: toggles masuk/keluar for the card's student
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = ScanRequest,
    responses(
        (status = 201, description = "Scan recorded", body = ScanResponse),
        (status = 400, description = "Empty RFID UID", body = Object, example = json!({
            "error": "RFID UID tidak boleh kosong."
        })),
        (status = 404, description = "Card not registered", body = Object, example = json!({
            "error": "Kartu RFID tidak terdaftar."
        })),
        (status = 503, description = "Record store busy, retry")
    ),
    tag = "Attendance"
)]
pub async fn record_attendance(
    store: web::Data<dyn RecordStore>,
    locks: web::Data<ScanLocks>,
    payload: web::Json<ScanRequest>,
) -> actix_web::Result<impl Responder> {
    let rfid_uid = match payload.rfid_uid.as_deref().map(str::trim) {
        Some(uid) if !uid.is_empty() => uid,
        _ => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "RFID UID tidak boleh kosong."
            })));
        }
    };

    let outcome = resolve_scan(store.get_ref(), &locks, rfid_uid, local_now()).await?;

    let message = match outcome.status {
        AttendanceStatus::Masuk => format!(
            "✅ Absen MASUK berhasil! Selamat datang, {}!",
            outcome.student.name
        ),
        _ => format!(
            "🚪 Absen KELUAR berhasil! Sampai jumpa, {}!",
            outcome.student.name
        ),
    };

    Ok(HttpResponse::Created().json(ScanResponse {
        id: outcome.record_id,
        message,
        status: outcome.status,
    }))
}

/// The caller's own attendance, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/me",
    responses(
        (status = 200, description = "Own attendance rows", body = MyAttendanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a student")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
) -> actix_web::Result<impl Responder> {
    let student_id = auth.require_student()?;

    let rows = store
        .records_for_student(student_id)
        .await
        .map_err(TrackerError::from)?;

    Ok(HttpResponse::Ok().json(MyAttendanceResponse {
        attendance: rows.into_iter().map(RecordResponse::from).collect(),
    }))
}
