use crate::{handler::GenerationHandler, midware::jwt::Authentication};
use actix_web::web;

pub fn init(cfg: &mut web::ServiceConfig) {
	cfg.service(
		web::resource("/api/generate-code")
			.wrap(Authentication)
			.route(web::post().to(GenerationHandler::generate_code_handler)),
	);
}
