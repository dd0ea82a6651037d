use crate::{
    api::local_now,
    auth::auth::AuthUser,
    error::TrackerError,
    model::{
        attendance::{AttendanceEntry, RecordResponse},
        role::Identity,
        student::StudentRef,
    },
    store::RecordStore,
    tracker::lifecycle,
};
use actix_web::{HttpResponse, Responder, error::ErrorForbidden, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    /// Defaults to the caller when neither `student_id` nor `rfid_uid` is given
    #[schema(example = 1)]
    pub student_id: Option<u64>,
    #[schema(example = "04A1B2C3")]
    pub rfid_uid: Option<String>,
    #[schema(example = "sakit")]
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveCreated {
    #[schema(example = "Request SAKIT berhasil diajukan, menunggu persetujuan admin.")]
    pub message: String,
    #[schema(example = 12)]
    pub id: u64,
}

#[derive(Deserialize, ToSchema)]
pub struct Decision {
    /// 1 = approve, 0 = reject
    #[schema(example = 1)]
    pub approved: i64,
}

#[derive(Serialize, ToSchema)]
pub struct DecisionResponse {
    #[schema(example = "Izin/Sakit disetujui.")]
    pub message: String,
    pub record: RecordResponse,
}

fn student_ref(auth: &AuthUser, payload: &CreateLeave) -> actix_web::Result<StudentRef> {
    if let Some(id) = payload.student_id {
        return Ok(StudentRef::Id(id));
    }
    if let Some(uid) = payload.rfid_uid.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        return Ok(StudentRef::Badge(uid.to_string()));
    }
    Ok(StudentRef::Id(auth.require_student()?))
}

fn refers_to_caller(auth: &AuthUser, student: &StudentRef) -> bool {
    match (&auth.identity, student) {
        (Identity::Student(own), StudentRef::Id(id)) => own.id == *id,
        (Identity::Student(own), StudentRef::Badge(uid)) => own.rfid_uid == *uid,
        _ => false,
    }
}

/// Submit an izin/sakit request
#[utoipa::path(
    post,
    path = "/api/attendance/request",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Request submitted, waiting for approval", body = LeaveCreated),
        (status = 400, description = "Status is not izin or sakit", body = Object, example = json!({
            "error": "Status harus 'izin' atau 'sakit'."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Student not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let student = student_ref(&auth, &payload)?;

    if auth.is_student() && !refers_to_caller(&auth, &student) {
        return Err(ErrorForbidden("Students can only file for themselves"));
    }

    let id = lifecycle::submit_request(store.get_ref(), &student, &payload.status, local_now()).await?;

    Ok(HttpResponse::Created().json(LeaveCreated {
        message: format!(
            "Request {} berhasil diajukan, menunggu persetujuan admin.",
            payload.status.to_uppercase()
        ),
        id,
    }))
}

/// Unread izin/sakit notifications
#[utoipa::path(
    get,
    path = "/api/attendance/pending",
    responses(
        (status = 200, description = "Unread leave requests, newest first", body = [AttendanceEntry]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn unread_notifications(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let rows = store
        .unread_notifications()
        .await
        .map_err(TrackerError::from)?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Leave requests that still need a decision
#[utoipa::path(
    get,
    path = "/api/admin/attendance/pending",
    responses(
        (status = 200, description = "Undecided leave requests, newest first", body = [AttendanceEntry]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn pending_requests(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let rows = store.pending_requests().await.map_err(TrackerError::from)?;

    Ok(HttpResponse::Ok().json(rows))
}

async fn decide(
    store: &dyn RecordStore,
    record_id: u64,
    approve: bool,
) -> actix_web::Result<HttpResponse> {
    let record = lifecycle::decide(store, record_id, approve).await?;

    let message = if approve {
        "Izin/Sakit disetujui."
    } else {
        "Izin/Sakit ditolak → dianggap Tidak Hadir."
    };

    Ok(HttpResponse::Ok().json(DecisionResponse {
        message: message.to_string(),
        record: record.into(),
    }))
}

/// Approve (1) or reject (0) a leave request
#[utoipa::path(
    put,
    path = "/api/attendance/requests/{id}/approve",
    params(
        ("id" = u64, Path, description = "Attendance id of the request")
    ),
    request_body = Decision,
    responses(
        (status = 200, description = "Decision recorded", body = DecisionResponse),
        (status = 400, description = "Not a leave request, already decided, or bad value", body = Object, example = json!({
            "error": "Hanya data izin/sakit yang bisa diproses."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn decide_leave(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
    payload: web::Json<Decision>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let approve = match payload.approved {
        1 => true,
        0 => false,
        _ => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "Nilai approved harus 0 (tolak) atau 1 (setuju)."
            })));
        }
    };

    decide(store.get_ref(), path.into_inner(), approve).await
}

/// Approve a leave request
#[utoipa::path(
    put,
    path = "/api/admin/attendance/approve/{id}",
    params(
        ("id" = u64, Path, description = "Attendance id of the request")
    ),
    responses(
        (status = 200, description = "Approved", body = DecisionResponse),
        (status = 400, description = "Not a pending leave request"),
        (status = 404, description = "Record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn approve_leave(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    decide(store.get_ref(), path.into_inner(), true).await
}

/// Reject a leave request; it becomes a counted absence
#[utoipa::path(
    put,
    path = "/api/admin/attendance/reject/{id}",
    params(
        ("id" = u64, Path, description = "Attendance id of the request")
    ),
    responses(
        (status = 200, description = "Rejected", body = DecisionResponse),
        (status = 400, description = "Not a pending leave request"),
        (status = 404, description = "Record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn reject_leave(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    decide(store.get_ref(), path.into_inner(), false).await
}

/// Mark one notification as read
#[utoipa::path(
    patch,
    path = "/api/attendance/requests/{id}/read",
    params(
        ("id" = u64, Path, description = "Attendance id")
    ),
    responses(
        (status = 200, description = "Marked read", body = Object, example = json!({
            "message": "Notifikasi ditandai terbaca.", "id": 12
        })),
        (status = 404, description = "Record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn mark_read(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    lifecycle::mark_read(store.get_ref(), id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Notifikasi ditandai terbaca.",
        "id": id
    })))
}

/// Mark every unread izin/sakit notification as read
#[utoipa::path(
    patch,
    path = "/api/attendance/requests/read-all",
    responses(
        (status = 200, description = "Marked read", body = Object, example = json!({
            "message": "Semua notifikasi ditandai terbaca.", "updated": 3
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn mark_all_read(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let updated = lifecycle::mark_all_read(store.get_ref()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Semua notifikasi ditandai terbaca.",
        "updated": updated
    })))
}

/// Remove read, approved requests from the notification list (rows are kept)
#[utoipa::path(
    delete,
    path = "/api/attendance/requests/read-all",
    responses(
        (status = 200, description = "Cleared", body = Object, example = json!({
            "message": "Semua notifikasi terbaca berhasil dihapus dari daftar notifikasi.", "cleared": 2
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn clear_read(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let cleared = lifecycle::clear_read(store.get_ref()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Semua notifikasi terbaca berhasil dihapus dari daftar notifikasi.",
        "cleared": cleared
    })))
}
