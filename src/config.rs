use clap::Parser;

/// Runtime configuration. Every flag falls back to the environment, so a
/// `.env` file is enough for local runs.
#[derive(Parser, Debug, Clone)]
#[command(name = "codetheft", about = "Scrape a site and turn it into generated front-end code")]
pub struct Config {
	#[arg(long, env = "SOCKET_URL", default_value = "127.0.0.1:8080")]
	pub socket_url: String,

	#[arg(long, env = "WORKERS")]
	pub workers: Option<usize>,

	#[arg(long, env = "DATABASE_URL", hide_env_values = true)]
	pub database_url: String,

	#[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
	pub redis_url: String,

	#[arg(long, env = "JWT_SECRET", hide_env_values = true)]
	pub jwt_secret: String,

	#[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
	pub gemini_api_key: String,

	#[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.5-flash")]
	pub gemini_model: String,

	#[arg(
		long,
		env = "GEMINI_API_BASE",
		default_value = "https://generativelanguage.googleapis.com/v1beta"
	)]
	pub gemini_api_base: String,

	#[arg(long, env = "EMAIL_USER")]
	pub email_user: String,

	#[arg(long, env = "EMAIL_PASS", hide_env_values = true)]
	pub email_pass: String,

	#[arg(long, env = "SMTP_RELAY", default_value = "smtp.gmail.com")]
	pub smtp_relay: String,

	/// Delegate scraping to this service instead of fetching pages directly.
	#[arg(long, env = "SCRAPE_SERVICE_URL")]
	pub scrape_service_url: Option<String>,

	#[arg(long, env = "NAV_TIMEOUT_SECS", default_value_t = 60)]
	pub nav_timeout_secs: u64,

	#[arg(
		long,
		env = "GENERATION_COST",
		default_value_t = 5,
		value_parser = clap::value_parser!(i32).range(1..)
	)]
	pub generation_cost: i32,

	#[arg(
		long,
		env = "SIGNUP_CREDITS",
		default_value_t = 50,
		value_parser = clap::value_parser!(i32).range(0..)
	)]
	pub signup_credits: i32,

	#[arg(long, env = "OTP_MAX_ATTEMPTS", default_value_t = 5)]
	pub otp_max_attempts: u32,
}

impl Config {
	pub fn worker_count(&self) -> usize {
		self.workers.unwrap_or_else(num_cpus::get).max(1)
	}
}
