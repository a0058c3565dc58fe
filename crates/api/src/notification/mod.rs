mod send_email;

use actix_web::web;
use send_email::send_email_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/notifications/email", web::post().to(send_email_controller));
}
