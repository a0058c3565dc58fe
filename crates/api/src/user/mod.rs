mod get_me;
mod sync_user;

use actix_web::web;
use get_me::get_me_controller;

pub use sync_user::SyncUserUseCase;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/me", web::get().to(get_me_controller));
}
