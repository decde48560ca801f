use crate::{
	constants::{MESSAGE_INSUFFICIENT_CREDITS, MESSAGE_URL_REQUIRED, MESSAGE_USER_NOT_FOUND},
	errors::AppError,
	generator::LlmError,
	models::{GenerateRequest, Language, MODE_URL},
	prompt::build_prompt,
	repo::StoreError,
	scrape::{sanitize_html, target_url, ScrapeError},
	state::AppState,
};
use reqwest::Url;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GenerationError {
	#[error("{}", MESSAGE_USER_NOT_FOUND)]
	UserNotFound,

	#[error("{}", MESSAGE_INSUFFICIENT_CREDITS)]
	InsufficientCredits,

	#[error("{}", MESSAGE_URL_REQUIRED)]
	MissingUrl,

	#[error("Unsupported mode")]
	UnsupportedMode(String),

	#[error("Unsupported language")]
	UnsupportedLanguage(String),

	#[error("Invalid URL")]
	InvalidUrl(String),

	#[error("{0}")]
	Scrape(ScrapeError),

	#[error("{0}")]
	Llm(LlmError),

	#[error(transparent)]
	Store(#[from] StoreError),
}

impl From<GenerationError> for AppError {
	fn from(e: GenerationError) -> Self {
		match e {
			GenerationError::Scrape(_) | GenerationError::Llm(_) => AppError::Upstream(e.to_string()),
			GenerationError::Store(e) => e.into(),
			GenerationError::UnsupportedMode(ref input) |
			GenerationError::UnsupportedLanguage(ref input) |
			GenerationError::InvalidUrl(ref input) => {
				log::info!("Rejected generation input {:?}: {}", input, e);
				AppError::BadRequest(e.to_string())
			},
			other => AppError::BadRequest(other.to_string()),
		}
	}
}

#[derive(Debug, PartialEq)]
pub struct Generation {
	pub code: String,
	pub remaining_credits: i32,
}

/// Validated form of a generation request.
struct Job {
	language: Language,
	target: Url,
}

fn parse_request(req: &GenerateRequest) -> Result<Job, GenerationError> {
	let url =
		req.url.as_deref().map(str::trim).filter(|u| !u.is_empty()).ok_or(GenerationError::MissingUrl)?;

	let mode = req.mode.as_deref().unwrap_or(MODE_URL);
	if mode != MODE_URL {
		return Err(GenerationError::UnsupportedMode(mode.to_string()));
	}

	let language = match req.language.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
		Some(label) => label.parse().map_err(GenerationError::UnsupportedLanguage)?,
		None => Language::default(),
	};

	let target = target_url(url).map_err(|_| GenerationError::InvalidUrl(url.to_string()))?;
	Ok(Job { language, target })
}

/// Scrape the requested site and have the model rewrite it, charging the
/// user's credits for a successful run.
///
/// Credits are reserved with a conditional update before any upstream call
/// so concurrent requests cannot overdraw the balance; the reservation is
/// given back if the scrape or the model call fails.
pub async fn generate_code(
	state: &AppState,
	user_id: i32,
	req: &GenerateRequest,
) -> Result<Generation, GenerationError> {
	let cost = state.settings.generation_cost;
	let user = state.users.find_by_id(user_id).await?.ok_or(GenerationError::UserNotFound)?;
	if user.credits < cost {
		log::info!("User {} has {} credits, generation costs {}", user.id, user.credits, cost);
		return Err(GenerationError::InsufficientCredits);
	}

	let job = parse_request(req)?;

	let remaining_credits = state
		.users
		.reserve_credits(user.id, cost)
		.await?
		.ok_or(GenerationError::InsufficientCredits)?;

	let generation_id = Uuid::new_v4();
	log::info!(
		"Generation {} started for user {}: {} as {}",
		generation_id,
		user.id,
		job.target,
		job.language.as_str()
	);

	match run(state, &job).await {
		Ok(code) => {
			log::info!("Generation {} finished, {} credits left", generation_id, remaining_credits);
			Ok(Generation { code, remaining_credits })
		},
		Err(e) => {
			log::error!("Generation {} failed: {}", generation_id, e);
			if let Err(refund_err) = state.users.refund_credits(user.id, cost).await {
				log::error!(
					"Could not refund {} credits to user {} after generation {}: {}",
					cost,
					user.id,
					generation_id,
					refund_err
				);
			}
			Err(e)
		},
	}
}

async fn run(state: &AppState, job: &Job) -> Result<String, GenerationError> {
	let raw = state.scraper.fetch(&job.target).await.map_err(GenerationError::Scrape)?;
	let html = sanitize_html(&raw);
	let prompt = build_prompt(job.language, &html);
	state.generator.generate(&prompt).await.map_err(GenerationError::Llm)
}
