use crate::{
    auth::{jwt::generate_access_token, password::verify_password},
    config::Config,
    model::{role::IdentityKind, student::StudentResponse},
    models::{AdminLoginReqDto, LoginReqDto},
    store::RecordStore,
};
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = "Login berhasil!")]
    message: String,
    token: String,
    student: StudentResponse,
}

#[derive(Serialize, ToSchema)]
pub struct AdminLoginResponse {
    #[schema(example = "Login berhasil!")]
    message: String,
    token: String,
    #[schema(value_type = Object, example = json!({"id": 1, "username": "admin", "role": "admin"}))]
    admin: serde_json::Value,
}

fn issue_token(
    user_id: u64,
    subject: String,
    kind: IdentityKind,
    config: &Config,
) -> Result<String, HttpResponse> {
    generate_access_token(user_id, subject, kind, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to sign token");
            HttpResponse::InternalServerError().finish()
        })
}

/// Student login with enrollment number
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing NIS or password"),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Unknown NIS")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, user),
    fields(nis = %user.nis)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    store: web::Data<dyn RecordStore>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.nis.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty NIS or password");
        return HttpResponse::BadRequest().json(json!({
            "error": "NIS dan password harus diisi."
        }));
    }

    // 2️⃣ Fetch student
    let student = match store.find_student_by_nis(user.nis.trim()).await {
        Ok(Some(student)) => {
            debug!(student_id = student.id, "Student found");
            student
        }
        Ok(None) => {
            info!("Invalid credentials: NIS not found");
            return HttpResponse::NotFound().json(json!({ "error": "NIS tidak ditemukan." }));
        }
        Err(e) => {
            error!(error = %e, "Store error while fetching student");
            return HttpResponse::InternalServerError()
                .json(json!({ "error": "Server error saat login." }));
        }
    };

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&user.password, &student.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({ "error": "Password salah." }));
    }

    // 4️⃣ Issue token
    let token = match issue_token(student.id, student.nis.clone(), IdentityKind::Student, &config) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        message: "Login berhasil!".into(),
        token,
        student: student.into(),
    })
}

/// Admin account login
#[utoipa::path(
    post,
    path = "/api/auth/admin/login",
    request_body = AdminLoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = AdminLoginResponse),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Unknown username")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_admin_login",
    skip(store, config, user),
    fields(username = %user.username)
)]
pub async fn admin_login(
    user: web::Json<AdminLoginReqDto>,
    store: web::Data<dyn RecordStore>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Admin login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "Username dan password harus diisi."
        }));
    }

    let admin = match store.find_admin_by_username(user.username.trim()).await {
        Ok(Some(admin)) => admin,
        Ok(None) => {
            info!("Invalid credentials: admin not found");
            return HttpResponse::NotFound().json(json!({ "error": "Admin tidak ditemukan." }));
        }
        Err(e) => {
            error!(error = %e, "Store error while fetching admin");
            return HttpResponse::InternalServerError()
                .json(json!({ "error": "Server error saat login." }));
        }
    };

    if let Err(e) = verify_password(&user.password, &admin.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({ "error": "Password salah." }));
    }

    let token = match issue_token(admin.id, admin.username.clone(), IdentityKind::Admin, &config) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    info!("Admin login successful");

    HttpResponse::Ok().json(AdminLoginResponse {
        message: "Login berhasil!".into(),
        token,
        admin: json!({ "id": admin.id, "username": admin.username, "role": "admin" }),
    })
}
