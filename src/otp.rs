use crate::constants::{OTP_ATTEMPTS_PREFIX, OTP_PREFIX};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use rand::Rng;
use redis::AsyncCommands;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OtpStoreError {
	#[error("redis: {0}")]
	Redis(#[from] redis::RedisError),
}

/// Short-lived one-time passcodes keyed by email. Writing a code replaces
/// whatever was stored for that email before.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OtpStore: Send + Sync {
	/// Store `code` with a TTL and clear the failed-attempt counter.
	async fn put(&self, email: &str, code: &str, ttl_secs: u64) -> Result<(), OtpStoreError>;

	async fn get(&self, email: &str) -> Result<Option<String>, OtpStoreError>;

	/// Drop the code and its attempt counter.
	async fn remove(&self, email: &str) -> Result<(), OtpStoreError>;

	/// Count one failed verification; returns the running total.
	async fn record_failure(&self, email: &str, ttl_secs: u64) -> Result<u32, OtpStoreError>;
}

pub fn otp_key(email: &str) -> String {
	format!("{OTP_PREFIX}:{email}")
}

pub fn attempts_key(email: &str) -> String {
	format!("{OTP_ATTEMPTS_PREFIX}:{email}")
}

pub fn generate_otp() -> String {
	let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
	code.to_string()
}

pub struct RedisOtpStore {
	client: redis::Client,
}

impl RedisOtpStore {
	pub fn new(redis_url: &str) -> Result<Self, OtpStoreError> {
		Ok(Self { client: redis::Client::open(redis_url)? })
	}

	/// Fail fast at startup if Redis is unreachable.
	pub async fn ping(&self) -> Result<(), OtpStoreError> {
		let mut conn = self.client.get_multiplexed_async_connection().await?;
		let _: String = redis::cmd("PING").query_async(&mut conn).await?;
		Ok(())
	}
}

#[async_trait]
impl OtpStore for RedisOtpStore {
	async fn put(&self, email: &str, code: &str, ttl_secs: u64) -> Result<(), OtpStoreError> {
		let mut conn = self.client.get_multiplexed_async_connection().await?;
		let _: () = redis::pipe()
			.atomic()
			.cmd("SET")
			.arg(otp_key(email))
			.arg(code)
			.arg("EX")
			.arg(ttl_secs)
			.ignore()
			.cmd("DEL")
			.arg(attempts_key(email))
			.ignore()
			.query_async(&mut conn)
			.await?;
		Ok(())
	}

	async fn get(&self, email: &str) -> Result<Option<String>, OtpStoreError> {
		let mut conn = self.client.get_multiplexed_async_connection().await?;
		let code: Option<String> = conn.get(otp_key(email)).await?;
		Ok(code)
	}

	async fn remove(&self, email: &str) -> Result<(), OtpStoreError> {
		let mut conn = self.client.get_multiplexed_async_connection().await?;
		let _: () = conn.del(vec![otp_key(email), attempts_key(email)]).await?;
		Ok(())
	}

	async fn record_failure(&self, email: &str, ttl_secs: u64) -> Result<u32, OtpStoreError> {
		let mut conn = self.client.get_multiplexed_async_connection().await?;
		let key = attempts_key(email);
		let (count,): (u32,) = redis::pipe()
			.atomic()
			.cmd("INCR")
			.arg(&key)
			.cmd("EXPIRE")
			.arg(&key)
			.arg(ttl_secs)
			.ignore()
			.query_async(&mut conn)
			.await?;
		Ok(count)
	}
}
