use crate::{
	generator::MockCodeGenerator,
	mailer::MockMailer,
	midware::jwt::JWT,
	models::{User, UserAvatar},
	otp::{OtpStore, OtpStoreError},
	repo::{StoreError, UserDraft, UserStore},
	scrape::MockScraper,
	state::{AppState, Settings},
};
use actix_web::web;
use async_trait::async_trait;
use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

pub const TEST_SECRET: &str = "test_secret";
pub const TEST_COST: i32 = 5;
pub const TEST_SIGNUP_CREDITS: i32 = 50;
pub const TEST_MAX_ATTEMPTS: u32 = 3;

pub fn generate_test_token(user_id: i32) -> String {
	JWT::new(TEST_SECRET).create_jwt(user_id, false).unwrap()
}

/// Builds the app with the real route configuration around a test state.
macro_rules! test_app {
	($state:expr) => {
		actix_web::test::init_service(
			actix_web::App::new()
				.app_data($state)
				.app_data(crate::errors::json_config())
				.configure(crate::user_routes::init)
				.configure(crate::generation_routes::init),
		)
		.await
	};
}
pub(crate) use test_app;

#[derive(Default)]
pub struct InMemoryUserStore {
	rows: Mutex<Vec<User>>,
}

impl InMemoryUserStore {
	pub fn with_users(users: Vec<User>) -> Self {
		Self { rows: Mutex::new(users) }
	}

	pub fn credits_of(&self, user_id: i32) -> Option<i32> {
		self.rows.lock().unwrap().iter().find(|u| u.id == user_id).map(|u| u.credits)
	}

	pub fn by_email(&self, email: &str) -> Option<User> {
		self.rows.lock().unwrap().iter().find(|u| u.email == email).cloned()
	}
}

#[async_trait]
impl UserStore for InMemoryUserStore {
	async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, StoreError> {
		Ok(self.rows.lock().unwrap().iter().find(|u| u.id == user_id).cloned())
	}

	async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
		Ok(self.by_email(email))
	}

	async fn create(&self, draft: UserDraft) -> Result<User, StoreError> {
		let mut rows = self.rows.lock().unwrap();
		let user = User {
			id: rows.iter().map(|u| u.id).max().unwrap_or(0) + 1,
			email: draft.email,
			name: draft.name,
			password: draft.password_hash,
			image: None,
			credits: draft.credits,
			is_verified: false,
			created_at: chrono::Utc::now(),
		};
		rows.push(user.clone());
		Ok(user)
	}

	async fn list_avatars(&self) -> Result<Vec<UserAvatar>, StoreError> {
		Ok(self
			.rows
			.lock()
			.unwrap()
			.iter()
			.map(|u| UserAvatar { id: u.id, image: u.image.clone() })
			.collect())
	}

	async fn reserve_credits(&self, user_id: i32, cost: i32) -> Result<Option<i32>, StoreError> {
		let mut rows = self.rows.lock().unwrap();
		Ok(rows.iter_mut().find(|u| u.id == user_id && u.credits >= cost).map(|u| {
			u.credits -= cost;
			u.credits
		}))
	}

	async fn refund_credits(&self, user_id: i32, cost: i32) -> Result<(), StoreError> {
		if let Some(u) = self.rows.lock().unwrap().iter_mut().find(|u| u.id == user_id) {
			u.credits += cost;
		}
		Ok(())
	}

	async fn mark_verified(&self, email: &str) -> Result<bool, StoreError> {
		let mut rows = self.rows.lock().unwrap();
		match rows.iter_mut().find(|u| u.email == email) {
			Some(u) => {
				u.is_verified = true;
				Ok(true)
			},
			None => Ok(false),
		}
	}
}

/// Keeps codes until removed; expiry is simulated with [`InMemoryOtpStore::expire`].
#[derive(Default)]
pub struct InMemoryOtpStore {
	codes: Mutex<HashMap<String, String>>,
	failures: Mutex<HashMap<String, u32>>,
}

impl InMemoryOtpStore {
	pub fn with_code(email: &str, code: &str) -> Self {
		let store = Self::default();
		store.codes.lock().unwrap().insert(email.to_string(), code.to_string());
		store
	}

	pub fn code_for(&self, email: &str) -> Option<String> {
		self.codes.lock().unwrap().get(email).cloned()
	}

	pub fn expire(&self, email: &str) {
		self.codes.lock().unwrap().remove(email);
	}
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
	async fn put(&self, email: &str, code: &str, _ttl_secs: u64) -> Result<(), OtpStoreError> {
		self.codes.lock().unwrap().insert(email.to_string(), code.to_string());
		self.failures.lock().unwrap().remove(email);
		Ok(())
	}

	async fn get(&self, email: &str) -> Result<Option<String>, OtpStoreError> {
		Ok(self.code_for(email))
	}

	async fn remove(&self, email: &str) -> Result<(), OtpStoreError> {
		self.codes.lock().unwrap().remove(email);
		self.failures.lock().unwrap().remove(email);
		Ok(())
	}

	async fn record_failure(&self, email: &str, _ttl_secs: u64) -> Result<u32, OtpStoreError> {
		let mut failures = self.failures.lock().unwrap();
		let count = failures.entry(email.to_string()).or_insert(0);
		*count += 1;
		Ok(*count)
	}
}

pub fn test_settings() -> Settings {
	Settings {
		generation_cost: TEST_COST,
		signup_credits: TEST_SIGNUP_CREDITS,
		otp_ttl_secs: 300,
		otp_max_attempts: TEST_MAX_ATTEMPTS,
	}
}

/// Collaborators for one test. Stores are shared so the test can inspect
/// them after the request; mocks are moved into the state.
pub struct TestDeps {
	pub users: Arc<dyn UserStore>,
	pub otps: Arc<dyn OtpStore>,
	pub mailer: MockMailer,
	pub scraper: MockScraper,
	pub generator: MockCodeGenerator,
}

impl TestDeps {
	pub fn new(users: Arc<dyn UserStore>, otps: Arc<dyn OtpStore>) -> Self {
		Self {
			users,
			otps,
			mailer: MockMailer::new(),
			scraper: MockScraper::new(),
			generator: MockCodeGenerator::new(),
		}
	}

	/// Upstream mocks that fail the test if anything reaches them.
	pub fn untouched(mut self) -> Self {
		self.mailer.expect_send_otp().never();
		self.scraper.expect_fetch().never();
		self.generator.expect_generate().never();
		self
	}

	pub fn into_state(self) -> web::Data<AppState> {
		web::Data::new(AppState {
			users: self.users,
			otps: self.otps,
			mailer: Arc::new(self.mailer),
			scraper: Arc::new(self.scraper),
			generator: Arc::new(self.generator),
			jwt: JWT::new(TEST_SECRET),
			settings: test_settings(),
		})
	}
}
