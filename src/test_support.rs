//! Shared fixtures for the HTTP tests.

use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use actix_web::{
    App, Error,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    http::header,
    test::TestRequest,
    web::Data,
};

use crate::{
    auth::jwt::generate_access_token, config::Config, model::role::IdentityKind, routes,
    store::{RecordStore, memory::MemoryStore},
    utils::scan_lock::ScanLocks,
};

pub fn test_config() -> Config {
    Config {
        database_url: "mysql://unused".into(),
        jwt_secret: "test-secret".into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 3600,
        db_max_connections: 1,
        store_timeout: Duration::from_secs(5),
        scan_lock_idle: Duration::from_secs(60),
        rate_login_per_min: 10_000,
        rate_scan_per_min: 10_000,
        rate_protected_per_min: 10_000,
        api_prefix: "/api".into(),
    }
}

/// The full application over an in-memory store.
pub fn test_app(
    store: Arc<MemoryStore>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let config = test_config();
    let store: Data<dyn RecordStore> = Data::from(store as Arc<dyn RecordStore>);

    App::new()
        .app_data(store)
        .app_data(Data::new(ScanLocks::new(config.scan_lock_idle)))
        .app_data(Data::new(config.clone()))
        .configure(|cfg| routes::configure(cfg, config))
}

/// `Authorization` header for a freshly signed token.
pub fn bearer(user_id: u64, kind: IdentityKind) -> (header::HeaderName, String) {
    let config = test_config();
    let token = generate_access_token(
        user_id,
        format!("{kind}-{user_id}"),
        kind,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .unwrap();
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

// The rate limiter keys on the peer address, so every request carries one.
fn peer() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 40_000))
}

pub fn get(uri: &str) -> TestRequest {
    TestRequest::get().uri(uri).peer_addr(peer())
}

pub fn post(uri: &str) -> TestRequest {
    TestRequest::post().uri(uri).peer_addr(peer())
}

pub fn put(uri: &str) -> TestRequest {
    TestRequest::put().uri(uri).peer_addr(peer())
}

pub fn patch(uri: &str) -> TestRequest {
    TestRequest::patch().uri(uri).peer_addr(peer())
}

pub fn delete(uri: &str) -> TestRequest {
    TestRequest::delete().uri(uri).peer_addr(peer())
}
