use crate::{
	generator::CodeGenerator, mailer::Mailer, midware::jwt::JWT, otp::OtpStore, repo::UserStore,
	scrape::Scraper,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Settings {
	pub generation_cost: i32,
	pub signup_credits: i32,
	pub otp_ttl_secs: u64,
	pub otp_max_attempts: u32,
}

/// Everything a handler needs, shared across workers through `web::Data`.
pub struct AppState {
	pub users: Arc<dyn UserStore>,
	pub otps: Arc<dyn OtpStore>,
	pub mailer: Arc<dyn Mailer>,
	pub scraper: Arc<dyn Scraper>,
	pub generator: Arc<dyn CodeGenerator>,
	pub jwt: JWT,
	pub settings: Settings,
}
