mod health_check;
mod pages;
mod statuses;
mod users;

pub use health_check::health_check;
pub use pages::{login_page, register_page, status_page, PUBLIC_DIR};
pub use statuses::{create_status, delete_status, get_status, list_statuses, update_status};
pub use users::{login, logout, register, token, RefreshTokenRequest};
