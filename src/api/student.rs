use crate::{
    auth::{auth::AuthUser, password::hash_password},
    error::TrackerError,
    model::{
        role::Role,
        student::{CreateStudent, NewStudent, StudentResponse, StudentUpdate, UpdateStudent},
    },
    store::RecordStore,
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde_json::json;
use tracing::{error, info};

fn hash(password: &str) -> actix_web::Result<String> {
    hash_password(password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ErrorInternalServerError("Something went wrong, Contact with system admin")
    })
}

fn filled(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "Murid tidak ditemukan." }))
}

/// List students
#[utoipa::path(
    get,
    path = "/api/admin/students",
    responses(
        (status = 200, description = "All students ordered by name", body = [StudentResponse]),
        (status = 403, description = "Forbidden")
    ),
    tag = "Student",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_students(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let students = store.list_students().await.map_err(TrackerError::from)?;
    let data: Vec<StudentResponse> = students.into_iter().map(StudentResponse::from).collect();

    Ok(HttpResponse::Ok().json(data))
}

/// Register a student
#[utoipa::path(
    post,
    path = "/api/admin/students",
    request_body = CreateStudent,
    responses(
        (status = 201, description = "Student created", body = Object, example = json!({
            "message": "Murid berhasil ditambahkan.", "id": 7
        })),
        (status = 400, description = "Missing fields", body = Object, example = json!({
            "error": "Data tidak lengkap."
        })),
        (status = 409, description = "RFID UID or NIS already registered")
    ),
    tag = "Student",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_student(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    payload: web::Json<CreateStudent>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (Some(rfid_uid), Some(nis), Some(name), Some(student_class), Some(password)) = (
        filled(&payload.rfid_uid),
        filled(&payload.nis),
        filled(&payload.name),
        filled(&payload.student_class),
        filled(&payload.password),
    ) else {
        return Ok(HttpResponse::BadRequest().json(json!({ "error": "Data tidak lengkap." })));
    };

    let id = store
        .create_student(NewStudent {
            rfid_uid,
            nis,
            name,
            student_class,
            password: hash(&password)?,
            role: payload.role.unwrap_or(Role::Student),
        })
        .await
        .map_err(TrackerError::from)?;

    info!(student_id = id, "Student created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Murid berhasil ditambahkan.",
        "id": id
    })))
}

/// Update a student; the password changes only when a non-blank one is sent
#[utoipa::path(
    put,
    path = "/api/admin/students/{id}",
    params(
        ("id" = u64, Path, description = "Student id")
    ),
    request_body = UpdateStudent,
    responses(
        (status = 200, description = "Student updated", body = Object, example = json!({
            "message": "Data murid berhasil diperbarui."
        })),
        (status = 404, description = "Student not found")
    ),
    tag = "Student",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_student(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
    payload: web::Json<UpdateStudent>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    let password = match filled(&payload.password) {
        Some(p) => Some(hash(&p)?),
        None => None,
    };

    let updated = store
        .update_student(
            path.into_inner(),
            StudentUpdate {
                nis: payload.nis.trim().to_string(),
                name: payload.name.trim().to_string(),
                student_class: payload.student_class.trim().to_string(),
                role: payload.role,
                password,
            },
        )
        .await
        .map_err(TrackerError::from)?;

    if !updated {
        return Ok(not_found());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Data murid berhasil diperbarui." })))
}

/// Delete a student and their attendance rows
#[utoipa::path(
    delete,
    path = "/api/admin/students/{id}",
    params(
        ("id" = u64, Path, description = "Student id")
    ),
    responses(
        (status = 200, description = "Student deleted", body = Object, example = json!({
            "message": "Murid berhasil dihapus."
        })),
        (status = 404, description = "Student not found")
    ),
    tag = "Student",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_student(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    if !store.delete_student(id).await.map_err(TrackerError::from)? {
        return Ok(not_found());
    }

    info!(student_id = id, "Student deleted");
    Ok(HttpResponse::Ok().json(json!({ "message": "Murid berhasil dihapus." })))
}
