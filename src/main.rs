mod config;
mod constants;
mod db;
mod errors;
mod generation;
mod generation_routes;
mod generator;
mod handler;
mod mailer;
mod midware;
mod models;
mod otp;
mod prompt;
mod repo;
mod schema;
mod scrape;
mod state;
#[cfg(test)]
mod tests;
mod user_routes;
use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use env_logger::Env;
use std::{sync::Arc, time::Duration};

use crate::{
	config::Config,
	constants::OTP_TTL_SECS,
	generator::GeminiClient,
	mailer::SmtpMailer,
	midware::jwt::JWT,
	otp::RedisOtpStore,
	repo::PgUserStore,
	scrape::{DirectScraper, RemoteScraper, Scraper},
	state::{AppState, Settings},
};

const MODEL_TIMEOUT: Duration = Duration::from_secs(120);

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
	dotenv().ok();
	env_logger::init_from_env(Env::default().default_filter_or("info"));
	let config = Config::parse();

	let pool = db::get_db_pool(&config.database_url).context("Failed to create db pool")?;
	db::init(&pool).context("Unable to initialize the db")?;

	let otps = RedisOtpStore::new(&config.redis_url).context("Invalid REDIS_URL")?;
	if let Err(e) = otps.ping().await {
		log::warn!("Redis is not reachable yet: {}", e);
	}

	let mailer = SmtpMailer::new(&config.smtp_relay, &config.email_user, &config.email_pass)
		.context("Failed to build the mail transport")?;
	match mailer.verify().await {
		Ok(true) => log::info!("Mail transporter ready"),
		Ok(false) => log::warn!("Mail relay {} refused the connection test", config.smtp_relay),
		Err(e) => log::warn!("Mail transporter error: {}", e),
	}

	let nav_timeout = Duration::from_secs(config.nav_timeout_secs);
	let scraper: Arc<dyn Scraper> = match &config.scrape_service_url {
		Some(endpoint) => {
			log::info!("Scraping through {}", endpoint);
			Arc::new(RemoteScraper::new(endpoint, nav_timeout).context("Invalid SCRAPE_SERVICE_URL")?)
		},
		None => Arc::new(DirectScraper::new(nav_timeout)?),
	};

	let generator = GeminiClient::new(
		&config.gemini_api_base,
		&config.gemini_model,
		&config.gemini_api_key,
		MODEL_TIMEOUT,
	)?;

	let state = web::Data::new(AppState {
		users: Arc::new(PgUserStore::new(pool)),
		otps: Arc::new(otps),
		mailer: Arc::new(mailer),
		scraper,
		generator: Arc::new(generator),
		jwt: JWT::new(&config.jwt_secret),
		settings: Settings {
			generation_cost: config.generation_cost,
			signup_credits: config.signup_credits,
			otp_ttl_secs: OTP_TTL_SECS,
			otp_max_attempts: config.otp_max_attempts,
		},
	});

	log::info!("Listening on: {}..", config.socket_url);

	HttpServer::new(move || {
		App::new()
			.app_data(state.clone())
			.app_data(errors::json_config())
			.wrap(
				Cors::default()
					.allow_any_origin()
					.allow_any_method()
					.allow_any_header()
					.supports_credentials()
					.max_age(3600),
			)
			.wrap(actix_web::middleware::Logger::default())
			.configure(user_routes::init)
			.configure(generation_routes::init)
	})
	.workers(config.worker_count())
	.bind(&config.socket_url)?
	.run()
	.await?;

	Ok(())
}
