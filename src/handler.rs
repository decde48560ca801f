use crate::{
	constants::{BCRYPT_COST, MESSAGE_INVALID_OTP, MESSAGE_OTP_EXPIRED, MESSAGE_USER_NOT_FOUND},
	errors::AppError,
	generation,
	midware::jwt::Claims,
	models::{
		ApiResponse, GenerateRequest, GenerateResponse, MessageResponse, SendOtpRequest,
		SignInRequest, SignInResp, SignUpRequest, SignUpResp, UserProfile, VerifyOtpRequest,
	},
	otp::generate_otp,
	repo::{StoreError, UserDraft},
	state::AppState,
};
use actix_web::{web, HttpResponse};
use bcrypt::{hash, verify};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use validator::{Validate, ValidateEmail};

fn non_blank(value: &Option<String>) -> Option<&str> {
	value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub struct UserHandler;

impl UserHandler {
	pub async fn sign_up_handler(
		state: web::Data<AppState>,
		req: web::Json<SignUpRequest>,
	) -> Result<HttpResponse, AppError> {
		let mut req = req.into_inner();
		req.name = req.name.trim().to_string();
		req.validate()?;
		log::info!("Sign up requested for {}", req.email);

		if state.users.find_by_email(&req.email).await?.is_some() {
			log::info!("Email {} is already registered", req.email);
			return Err(AppError::Validation(vec!["email already exists".to_string()]));
		}

		let password = req.password.clone();
		let password_hash = web::block(move || hash(password, BCRYPT_COST))
			.await
			.map_err(|e| AppError::Internal(e.to_string()))?
			.map_err(|e| {
				log::error!("Password hashing failed for {}: {}", req.email, e);
				AppError::Internal("Failed to hash password".to_string())
			})?;

		let draft = UserDraft {
			email: req.email.clone(),
			name: Some(req.name.clone()),
			password_hash: Some(password_hash),
			credits: state.settings.signup_credits,
		};

		let user = match state.users.create(draft).await {
			Ok(user) => user,
			Err(StoreError::Query(DieselError::DatabaseError(
				DatabaseErrorKind::UniqueViolation,
				_,
			))) => {
				return Err(AppError::Validation(vec!["email already exists".to_string()]));
			},
			Err(e) => return Err(e.into()),
		};

		log::info!("Created user {} for {}", user.id, user.email);
		Ok(HttpResponse::Created().json(SignUpResp {
			success: true,
			message: "User created!".to_string(),
			user: user.into(),
		}))
	}

	pub async fn list_users_handler(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
		let users = state.users.list_avatars().await?;
		Ok(HttpResponse::Ok().json(users))
	}

	pub async fn get_user_handler(
		state: web::Data<AppState>,
		path: web::Path<String>,
	) -> Result<HttpResponse, AppError> {
		let user_id = path
			.parse::<i32>()
			.map_err(|_| AppError::BadRequest("Invalid user ID".to_string()))?;

		let user = state
			.users
			.find_by_id(user_id)
			.await?
			.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

		Ok(HttpResponse::Ok().json(UserProfile::from(user)))
	}

	pub async fn sign_in_handler(
		state: web::Data<AppState>,
		req: web::Json<SignInRequest>,
	) -> Result<HttpResponse, AppError> {
		let (email, password) = match (non_blank(&req.email), req.password.as_deref()) {
			(Some(email), Some(password)) if !password.is_empty() => {
				(email.to_string(), password.to_string())
			},
			_ => return Err(AppError::BadRequest("Email and password are required".to_string())),
		};

		let user = state.users.find_by_email(&email).await?.ok_or_else(|| {
			log::info!("Sign in for unknown email {}", email);
			AppError::Unauthorized("No user found with this email".to_string())
		})?;

		let incorrect = || AppError::Unauthorized("Incorrect password".to_string());
		let stored = user.password.clone().ok_or_else(incorrect)?;
		let matches = web::block(move || verify(password, &stored))
			.await
			.map_err(|e| AppError::Internal(e.to_string()))?
			.map_err(|e| {
				log::error!("Stored hash for user {} is unusable: {}", user.id, e);
				incorrect()
			})?;
		if !matches {
			log::info!("Wrong password for user {}", user.id);
			return Err(incorrect());
		}

		let token = state.jwt.create_jwt(user.id, user.is_verified).map_err(|e| {
			log::error!("JWT creation error: {:?}", e);
			AppError::Internal("Failed to create authentication token".to_string())
		})?;

		log::info!("Sign in successful for user {}", user.id);
		Ok(HttpResponse::Ok().json(SignInResp { success: true, token, user: user.into() }))
	}
}

pub struct VerificationHandler;

impl VerificationHandler {
	pub async fn send_otp_handler(
		state: web::Data<AppState>,
		req: web::Json<SendOtpRequest>,
	) -> Result<HttpResponse, AppError> {
		let email = non_blank(&req.email)
			.ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;
		if !email.validate_email() {
			return Err(AppError::BadRequest("Invalid email".to_string()));
		}

		let code = generate_otp();
		state.otps.put(email, &code, state.settings.otp_ttl_secs).await.map_err(|e| {
			log::error!("Failed to store OTP for {}: {}", email, e);
			AppError::Internal("Database error".to_string())
		})?;
		log::info!("Stored OTP for {}", email);

		state.mailer.send_otp(email, &code).await.map_err(|e| {
			log::error!("Failed to send OTP email to {}: {}", email, e);
			AppError::Internal("Failed to send OTP".to_string())
		})?;

		Ok(HttpResponse::Ok().json(MessageResponse { message: "OTP sent successfully".to_string() }))
	}

	pub async fn verify_otp_handler(
		state: web::Data<AppState>,
		req: web::Json<VerifyOtpRequest>,
	) -> Result<HttpResponse, AppError> {
		let otp = req.otp.as_deref().filter(|otp| !otp.is_empty());
		let (email, otp) = match (non_blank(&req.email), otp) {
			(Some(email), Some(otp)) => (email, otp),
			_ => return Err(AppError::BadRequest("Invalid credentials".to_string())),
		};

		let internal = |e: &dyn std::fmt::Display| {
			log::error!("OTP verification error for {}: {}", email, e);
			AppError::Internal("Internal server error".to_string())
		};

		let stored = state.otps.get(email).await.map_err(|e| internal(&e))?;
		let Some(stored) = stored else {
			return Err(AppError::Unauthorized(MESSAGE_OTP_EXPIRED.to_string()));
		};

		if stored != otp {
			let ttl = state.settings.otp_ttl_secs;
			let failures = state.otps.record_failure(email, ttl).await.map_err(|e| internal(&e))?;
			log::warn!("Wrong OTP for {} ({} failed attempts)", email, failures);
			if failures >= state.settings.otp_max_attempts {
				log::warn!("Too many wrong OTPs for {}, discarding the code", email);
				state.otps.remove(email).await.map_err(|e| internal(&e))?;
			}
			return Err(AppError::Unauthorized(MESSAGE_INVALID_OTP.to_string()));
		}

		state.otps.remove(email).await.map_err(|e| internal(&e))?;
		if !state.users.mark_verified(email).await.map_err(|e| internal(&e))? {
			return Err(AppError::BadRequest(MESSAGE_USER_NOT_FOUND.to_string()));
		}

		log::info!("Email {} verified", email);
		Ok(HttpResponse::Ok()
			.json(ApiResponse { success: true, message: "OTP verified successfully".to_string() }))
	}
}

pub struct GenerationHandler;

impl GenerationHandler {
	pub async fn generate_code_handler(
		state: web::Data<AppState>,
		claims: web::ReqData<Claims>,
		req: web::Json<GenerateRequest>,
	) -> Result<HttpResponse, AppError> {
		let user_id = claims
			.user_id()
			.ok_or_else(|| AppError::BadRequest(MESSAGE_USER_NOT_FOUND.to_string()))?;

		let generation = generation::generate_code(&state, user_id, &req).await?;
		Ok(HttpResponse::Ok().json(GenerateResponse {
			success: true,
			code: generation.code,
			remaining_credits: generation.remaining_credits,
		}))
	}
}
