use crate::handler::{UserHandler, VerificationHandler};
use actix_web::web;

pub fn init(cfg: &mut web::ServiceConfig) {
	cfg
		// user mgmt routes
		.route("/api/users", web::post().to(UserHandler::sign_up_handler))
		.route("/api/users", web::get().to(UserHandler::list_users_handler))
		.route("/api/users/{id}", web::get().to(UserHandler::get_user_handler))
		.route("/api/auth/sign-in", web::post().to(UserHandler::sign_in_handler))
		// email verification
		.route("/api/verify-email/send-otp", web::post().to(VerificationHandler::send_otp_handler))
		.route(
			"/api/verify-email/verify-otp",
			web::post().to(VerificationHandler::verify_otp_handler),
		);
}
