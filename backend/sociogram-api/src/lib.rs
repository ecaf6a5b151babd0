/// Sociogram API Library
///
/// REST backend for a small social feed: accounts, posts, likes, comments
/// and push notifications to post authors.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `models`: Users, the post aggregate, request payloads
/// - `services`: Business logic and the push notification side channel
/// - `db`: Repository traits with Postgres and in-memory implementations
/// - `middleware`: Bearer-token authentication and ownership checks
/// - `security`: Password hashing
/// - `error` / `response`: Error type and the JSON envelope
/// - `config`: Configuration from the environment
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod response;
pub mod security;
pub mod services;

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use crypto_core::JwtKeys;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::Config;
pub use error::{AppError, Result};

use db::{PostRepository, UserRepository};
use openapi::ApiDoc;
use services::{AuthService, NotificationDispatcher, PostService, PushNotifier};

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub posts: PostService,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        notifier: Arc<dyn PushNotifier>,
        jwt: JwtKeys,
    ) -> Self {
        let notifications = NotificationDispatcher::new(notifier);
        Self {
            auth: AuthService::new(users.clone(), jwt),
            posts: PostService::new(posts, users, notifications),
        }
    }
}

/// Route table under `/api`
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(handlers::signup))
                    .route("/login", web::post().to(handlers::login))
                    .service(
                        web::resource("/profile")
                            .route(web::get().to(handlers::get_profile))
                            .route(web::put().to(handlers::update_profile)),
                    )
                    .route("/device-token", web::put().to(handlers::update_device_token))
                    .route("/users/{username}", web::get().to(handlers::get_user))
                    .route("/search", web::get().to(handlers::search_users)),
            )
            .service(
                web::scope("/posts")
                    .service(
                        web::resource("")
                            .route(web::get().to(handlers::get_feed))
                            .route(web::post().to(handlers::create_post)),
                    )
                    .service(
                        web::resource("/{post_id}")
                            .route(web::get().to(handlers::get_post))
                            .route(web::put().to(handlers::update_post))
                            .route(web::delete().to(handlers::delete_post)),
                    )
                    .route("/{post_id}/like", web::post().to(handlers::toggle_like))
                    .route("/{post_id}/comment", web::post().to(handlers::add_comment))
                    .route(
                        "/{post_id}/comment/{comment_id}",
                        web::delete().to(handlers::delete_comment),
                    ),
            ),
    );
}

/// Extractor failures share the error envelope.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(256 * 1024)
            .error_handler(|err, _req| {
                AppError::Validation(format!("Invalid request body: {}", err)).into()
            }),
    )
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Invalid query string: {}", err)).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Invalid path parameter: {}", err)).into()
    }));
}

/// The complete application without outer middleware. `main` wraps it with
/// CORS and request logging; tests use it as is.
pub fn app(
    state: AppState,
    jwt: JwtKeys,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(web::Data::new(jwt))
        .configure(extractor_configs)
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}")
                .url(ApiDoc::openapi_json_path(), ApiDoc::openapi()),
        )
        .route("/health", web::get().to(handlers::health))
        .route("/metrics", web::get().to(metrics::serve_metrics))
        .configure(configure_routes)
        .default_service(web::to(handlers::not_found))
}
