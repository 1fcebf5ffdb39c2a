/// HTML pages served from the public directory
use actix_files::NamedFile;
use std::path::PathBuf;

pub const PUBLIC_DIR: &str = "./public";

async fn page(name: &str) -> actix_web::Result<NamedFile> {
    let path: PathBuf = [PUBLIC_DIR, name].iter().collect();
    Ok(NamedFile::open_async(path).await?)
}

/// GET /register
pub async fn register_page() -> actix_web::Result<NamedFile> {
    page("register.html").await
}

/// GET /login
pub async fn login_page() -> actix_web::Result<NamedFile> {
    page("login.html").await
}

/// GET /statuses/{id}
///
/// The page fetches `/statuses/{id}/data` itself.
pub async fn status_page() -> actix_web::Result<NamedFile> {
    page("status.html").await
}
