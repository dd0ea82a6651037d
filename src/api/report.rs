use crate::{
    api::local_now,
    auth::auth::AuthUser,
    error::TrackerError,
    model::attendance::AttendanceEntry,
    store::RecordStore,
    tracker::aggregator::{self, MonthKey, StudentSummary, TrendPoint},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

const DEFAULT_TREND_MONTHS: u32 = 6;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    /// 1-12, defaults to the current month
    pub month: Option<u32>,
    /// Defaults to the current year
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrendQuery {
    /// Number of months ending with the current one (default 6, 1 to 120)
    pub months: Option<u32>,
    /// Restrict to one student; ignored for student callers
    pub student_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateQuery {
    /// `YYYY-MM-DD`, defaults to today
    pub date: Option<String>,
}

/// Per-student counts for one month
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "One row per student, ordered by name", body = [StudentSummary]),
        (status = 400, description = "Invalid month or year", body = Object, example = json!({
            "error": "Bulan atau tahun tidak valid."
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn monthly_summary(
    _auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    query: web::Query<SummaryQuery>,
) -> actix_web::Result<impl Responder> {
    let today = local_now().date();
    let month = query.month.unwrap_or_else(|| today.month());
    let year = query.year.unwrap_or_else(|| today.year());

    let Some(key) = MonthKey::new(year, month) else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Bulan atau tahun tidak valid."
        })));
    };

    let rows = aggregator::monthly_summary(store.get_ref(), key).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Same summary, under the admin scope
#[utoipa::path(
    get,
    path = "/api/admin/attendance/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "One row per student, ordered by name", body = [StudentSummary]),
        (status = 400, description = "Invalid month or year"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn admin_monthly_summary(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    query: web::Query<SummaryQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    monthly_summary(auth, store, query).await
}

/// Monthly counts for the last N months, oldest first
#[utoipa::path(
    get,
    path = "/api/attendance/monthly-trend",
    params(TrendQuery),
    responses(
        (status = 200, description = "Exactly `months` points", body = [TrendPoint]),
        (status = 400, description = "More than 120 months", body = Object, example = json!({
            "error": "Jumlah bulan maksimal 120."
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn monthly_trend(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    query: web::Query<TrendQuery>,
) -> actix_web::Result<impl Responder> {
    let months = query.months.unwrap_or(DEFAULT_TREND_MONTHS);

    // students only ever see their own trend
    let student_id = if auth.is_student() {
        Some(auth.require_student()?)
    } else {
        query.student_id
    };

    let points =
        aggregator::monthly_trend(store.get_ref(), months, student_id, local_now().date()).await?;
    Ok(HttpResponse::Ok().json(points))
}

/// Attendance rows of one day joined with the student
#[utoipa::path(
    get,
    path = "/api/admin/attendance",
    params(DateQuery),
    responses(
        (status = 200, description = "Rows of the day, newest first", body = [AttendanceEntry]),
        (status = 400, description = "Malformed date", body = Object, example = json!({
            "error": "Format tanggal harus YYYY-MM-DD."
        })),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn attendance_by_date(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    query: web::Query<DateQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let day = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        None => local_now().date(),
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(day) => day,
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "error": "Format tanggal harus YYYY-MM-DD."
                })));
            }
        },
    };

    let rows = store.entries_on(day).await.map_err(TrackerError::from)?;
    Ok(HttpResponse::Ok().json(rows))
}
