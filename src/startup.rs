use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{InMemoryRevocationStore, RevocationStore, SessionController};
use crate::configuration::Settings;
use crate::error::{json_error_handler, AppError};
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    create_status, delete_status, get_status, health_check, list_statuses, login, login_page,
    logout, register, register_page, status_page, token, update_status, PUBLIC_DIR,
};
use crate::store::{
    self, InMemoryStatusStore, InMemoryUserStore, PgStatusStore, PgUserStore, StatusStore,
    UserStore,
};

const JSON_BODY_LIMIT: usize = 16 * 1024;

/// The collaborators a running server needs
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub statuses: Arc<dyn StatusStore>,
    pub revocations: Arc<dyn RevocationStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::new()),
            statuses: Arc::new(InMemoryStatusStore::new()),
            revocations: Arc::new(InMemoryRevocationStore::new()),
        }
    }

    /// Postgres-backed users and statuses when a database is configured,
    /// in-memory otherwise. Refresh tokens always live in process memory.
    pub async fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        match &settings.database {
            Some(database) => {
                tracing::info!(host = %database.host, "Using Postgres stores");
                let pool = store::connect(database).await?;
                Ok(Self {
                    users: Arc::new(PgUserStore::new(pool.clone())),
                    statuses: Arc::new(PgStatusStore::new(pool)),
                    revocations: Arc::new(InMemoryRevocationStore::new()),
                })
            }
            None => {
                tracing::info!("No database configured, using in-memory stores");
                Ok(Self::in_memory())
            }
        }
    }
}

pub fn run(
    listener: TcpListener,
    sessions: SessionController,
    statuses: Arc<dyn StatusStore>,
) -> Result<Server, std::io::Error> {
    let issuer = sessions.issuer().clone();
    let sessions = web::Data::new(sessions);
    let statuses: web::Data<dyn StatusStore> = web::Data::from(statuses);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(sessions.clone())
            .app_data(statuses.clone())
            .app_data(
                web::JsonConfig::default()
                    .limit(JSON_BODY_LIMIT)
                    .error_handler(json_error_handler),
            )

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/register", web::get().to(register_page))
            .route("/register", web::post().to(register))
            .route("/login", web::get().to(login_page))
            .route("/login", web::post().to(login))
            .route("/token", web::post().to(token))
            .route("/logout", web::delete().to(logout))

            // Status mutations require a valid access token
            .service(
                web::scope("/statuses")
                    .guard(guard::Any(guard::Post()).or(guard::Patch()).or(guard::Delete()))
                    .wrap(JwtMiddleware::new(issuer.clone()))
                    .route("", web::post().to(create_status))
                    .route("/{id}", web::patch().to(update_status))
                    .route("/{id}", web::delete().to(delete_status)),
            )
            .service(
                web::scope("/statuses")
                    .route("", web::get().to(list_statuses))
                    .route("/{id}", web::get().to(status_page))
                    .route("/{id}/data", web::get().to(get_status)),
            )

            // Static file serving (must be last to not override API routes)
            .service(fs::Files::new("/", PUBLIC_DIR).index_file("index.html"))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
