// Route exports
pub mod discover;

use actix_web::web;

pub use discover::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(discover::configure),
    );
}
