use crate::{
    api::{attendance, leave_request, report, student},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let burst = requests_per_min.max(1);
        let per_ms = (60_000 / u64::from(burst)).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(burst)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("period and burst are non-zero");
        Governor::new(&cfg)
    }

    let prefix = config.api_prefix.trim_end_matches('/');

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let scan_limiter = Arc::new(build_limiter(config.rate_scan_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::resource(format!("{prefix}/auth/login"))
            .wrap(login_limiter.clone())
            .route(web::post().to(handlers::login)),
    )
    .service(
        web::resource(format!("{prefix}/auth/admin/login"))
            .wrap(login_limiter)
            .route(web::post().to(handlers::admin_login)),
    )
    // RFID reader, no token
    .service(
        web::resource(format!("{prefix}/attendance"))
            .wrap(scan_limiter)
            .route(web::post().to(attendance::record_attendance)),
    );

    // Protected routes
    cfg.service(
        web::scope(prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    .route("/me", web::get().to(attendance::my_attendance))
                    .route("/request", web::post().to(leave_request::create_leave))
                    .route("/summary", web::get().to(report::monthly_summary))
                    .route("/monthly-trend", web::get().to(report::monthly_trend))
                    // admin only
                    .route("/pending", web::get().to(leave_request::unread_notifications))
                    .service(
                        web::resource("/requests/read-all")
                            .route(web::patch().to(leave_request::mark_all_read))
                            .route(web::delete().to(leave_request::clear_read)),
                    )
                    .route("/requests/{id}/read", web::patch().to(leave_request::mark_read))
                    .route(
                        "/requests/{id}/approve",
                        web::put().to(leave_request::decide_leave),
                    ),
            )
            .service(
                web::scope("/admin")
                    // /admin/students
                    .service(
                        web::resource("/students")
                            .route(web::get().to(student::list_students))
                            .route(web::post().to(student::create_student)),
                    )
                    // /admin/students/{id}
                    .service(
                        web::resource("/students/{id}")
                            .route(web::put().to(student::update_student))
                            .route(web::delete().to(student::delete_student)),
                    )
                    .route("/attendance", web::get().to(report::attendance_by_date))
                    .route(
                        "/attendance/summary",
                        web::get().to(report::admin_monthly_summary),
                    )
                    .route(
                        "/attendance/pending",
                        web::get().to(leave_request::pending_requests),
                    )
                    .route(
                        "/attendance/approve/{id}",
                        web::put().to(leave_request::approve_leave),
                    )
                    .route(
                        "/attendance/reject/{id}",
                        web::put().to(leave_request::reject_leave),
                    )
                    .service(
                        web::resource("/attendance/read-all")
                            .route(web::put().to(leave_request::mark_all_read))
                            .route(web::delete().to(leave_request::clear_read)),
                    )
                    .route(
                        "/attendance/read/{id}",
                        web::put().to(leave_request::mark_read),
                    ),
            ),
    );
}
