use crate::{
    api::{attendance, employee, leave_request},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::AppError,
};
use actix_cors::Cors;
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Replenish interval for `requests_per_min`, at least one millisecond.
fn replenish_ms(requests_per_min: u32) -> u64 {
    (60_000 / u64::from(requests_per_min.max(1))).max(1)
}

/// Per-IP limiter allowing `requests_per_min` with a burst of the same size.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(replenish_ms(requests_per_min))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_else(GovernorConfig::default);

    Governor::new(&cfg)
}

/// CORS for the browser frontend. `*` in the origin list allows any origin.
pub fn cors(config: &Config) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_any_header()
        .max_age(3600);

    if config.cors_allowed_origins.iter().any(|origin| origin == "*") {
        cors.allow_any_origin()
    } else {
        config
            .cors_allowed_origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

/// Bodies, queries and paths that fail to parse answer with the same JSON
/// error body as the handlers.
fn extractor_errors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::validation(err.to_string()).into()),
    );
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    extractor_errors(cfg);

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let signup_limiter = Arc::new(build_limiter(config.rate_signup_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public login/signup plus the token-protected session endpoints
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/company/signup")
                    .wrap(signup_limiter)
                    .route(web::post().to(handlers::company_signup)),
            )
            .service(
                web::resource("/company/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::company_login)),
            )
            .service(
                web::resource("/employee/login")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::employee_login)),
            )
            .service(
                web::resource("/company/logout")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter.clone())
                    .route(web::post().to(handlers::company_logout)),
            )
            .service(
                web::resource("/company/me")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter.clone())
                    .route(web::get().to(handlers::company_me)),
            )
            .service(
                web::resource("/employee/logout")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter.clone())
                    .route(web::post().to(handlers::employee_logout)),
            )
            .service(
                web::resource("/employee/me")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter.clone())
                    .route(web::get().to(handlers::employee_me)),
            ),
    );

    cfg.service(
        web::scope("/employees")
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter.clone())
            // /employees
            .service(
                web::resource("")
                    .route(web::get().to(employee::list_employees))
                    .route(web::post().to(employee::create_employee)),
            )
            // /employees/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(employee::get_employee))
                    .route(web::put().to(employee::update_employee))
                    .route(web::delete().to(employee::delete_employee)),
            )
            .service(web::resource("/{id}/resume").route(web::put().to(employee::update_resume)))
            .service(web::resource("/{id}/salary").route(web::put().to(employee::update_salary)))
            .service(
                web::resource("/{id}/private-info")
                    .route(web::put().to(employee::update_private_info)),
            )
            .service(
                web::resource("/{id}/password").route(web::put().to(employee::update_password)),
            ),
    );

    cfg.service(
        web::scope("/attendance")
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter.clone())
            .service(web::resource("/checkin").route(web::post().to(attendance::check_in)))
            .service(web::resource("/checkout").route(web::post().to(attendance::check_out)))
            .service(web::resource("/status").route(web::get().to(attendance::status)))
            .service(
                web::resource("/company").route(web::get().to(attendance::company_attendance)),
            )
            .service(
                web::resource("/employee").route(web::get().to(attendance::employee_attendance)),
            ),
    );

    cfg.service(
        web::scope("/leaves")
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(web::resource("/request").route(web::post().to(leave_request::request_leave)))
            .service(web::resource("/admin").route(web::get().to(leave_request::list_admin)))
            .service(web::resource("/emp").route(web::get().to(leave_request::list_emp)))
            // /leaves/{leave_id}/approve
            .service(
                web::resource("/{leave_id}/approve")
                    .route(web::put().to(leave_request::approve_leave)),
            )
            // /leaves/{leave_id}/reject
            .service(
                web::resource("/{leave_id}/reject")
                    .route(web::put().to(leave_request::reject_leave)),
            ),
    );
}
