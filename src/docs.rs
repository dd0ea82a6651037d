use crate::api::attendance::{MyAttendanceResponse, ScanRequest, ScanResponse};
use crate::api::leave_request::{CreateLeave, Decision, DecisionResponse, LeaveCreated};
use crate::auth::handlers::{AdminLoginResponse, LoginResponse};
use crate::model::attendance::{AttendanceEntry, AttendanceStatus, RecordResponse};
use crate::model::student::{CreateStudent, StudentResponse, UpdateStudent};
use crate::models::{AdminLoginReqDto, LoginReqDto};
use crate::tracker::aggregator::{StudentSummary, TrendPoint};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Absensi RFID API",
        version = "1.0.0",
        description = r#"
## RFID School Attendance

Students badge in and out with an RFID card, file **izin** (excused) or
**sakit** (sick) requests, and administrators review them and read the
monthly numbers.

### 🔹 Key Features
- **Scanning**
  - Each scan toggles masuk/keluar for the day, starting with masuk
- **Leave Requests**
  - Submit izin/sakit, approve or reject once; a rejection counts as absent
  - Notification bookkeeping: mark read, mark all read, clear read
- **Reports**
  - Per-student monthly summary and a multi-month trend
- **Students**
  - Admin CRUD for student accounts

### 🔐 Security
Everything except login and the reader endpoint needs a **JWT Bearer** token.
Admin endpoints need an admin account or a student with the admin role.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::admin_login,

        crate::api::attendance::record_attendance,
        crate::api::attendance::my_attendance,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::unread_notifications,
        crate::api::leave_request::pending_requests,
        crate::api::leave_request::decide_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::mark_read,
        crate::api::leave_request::mark_all_read,
        crate::api::leave_request::clear_read,

        crate::api::report::monthly_summary,
        crate::api::report::admin_monthly_summary,
        crate::api::report::monthly_trend,
        crate::api::report::attendance_by_date,

        crate::api::student::list_students,
        crate::api::student::create_student,
        crate::api::student::update_student,
        crate::api::student::delete_student
    ),
    components(
        schemas(
            LoginReqDto,
            AdminLoginReqDto,
            LoginResponse,
            AdminLoginResponse,
            ScanRequest,
            ScanResponse,
            MyAttendanceResponse,
            AttendanceStatus,
            AttendanceEntry,
            RecordResponse,
            CreateLeave,
            LeaveCreated,
            Decision,
            DecisionResponse,
            StudentSummary,
            TrendPoint,
            StudentResponse,
            CreateStudent,
            UpdateStudent
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Student and admin login"),
        (name = "Attendance", description = "RFID scans and own history"),
        (name = "Leave", description = "Izin/sakit requests and notifications"),
        (name = "Report", description = "Monthly summary and trend"),
        (name = "Admin", description = "Admin views over attendance"),
        (name = "Student", description = "Student management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
