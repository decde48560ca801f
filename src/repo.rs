use crate::{
	db::DbPool,
	models::{NewUser, User, UserAvatar},
	schema::users,
};
use actix_web::{error::BlockingError, web};
use async_trait::async_trait;
use diesel::prelude::*;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("connection pool: {0}")]
	Pool(#[from] diesel::r2d2::PoolError),

	#[error("query: {0}")]
	Query(#[from] diesel::result::Error),

	#[error("blocking task was cancelled")]
	Blocking(#[from] BlockingError),
}

/// Account data for a signup, owned so it can cross into the blocking pool.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDraft {
	pub email: String,
	pub name: Option<String>,
	pub password_hash: Option<String>,
	pub credits: i32,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
	async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, StoreError>;

	async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

	async fn create(&self, draft: UserDraft) -> Result<User, StoreError>;

	async fn list_avatars(&self) -> Result<Vec<UserAvatar>, StoreError>;

	/// Debit `cost` only if the balance covers it, in a single statement.
	/// Returns the remaining balance, or `None` when the balance was short.
	async fn reserve_credits(&self, user_id: i32, cost: i32) -> Result<Option<i32>, StoreError>;

	async fn refund_credits(&self, user_id: i32, cost: i32) -> Result<(), StoreError>;

	/// Returns false when no user has this email.
	async fn mark_verified(&self, email: &str) -> Result<bool, StoreError>;
}

pub struct PgUserStore {
	pool: DbPool,
}

impl PgUserStore {
	pub fn new(pool: DbPool) -> Self {
		Self { pool }
	}

	async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
	where
		F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
		T: Send + 'static,
	{
		let pool = self.pool.clone();
		web::block(move || {
			let mut conn = pool.get()?;
			f(&mut conn)
		})
		.await?
	}
}

#[async_trait]
impl UserStore for PgUserStore {
	async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, StoreError> {
		self.run(move |conn| {
			Ok(users::table
				.filter(users::id.eq(user_id))
				.select(User::as_select())
				.first::<User>(conn)
				.optional()?)
		})
		.await
	}

	async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
		let email = email.to_string();
		self.run(move |conn| {
			Ok(users::table
				.filter(users::email.eq(&email))
				.select(User::as_select())
				.first::<User>(conn)
				.optional()?)
		})
		.await
	}

	async fn create(&self, draft: UserDraft) -> Result<User, StoreError> {
		self.run(move |conn| {
			let new_user = NewUser {
				email: &draft.email,
				name: draft.name.as_deref(),
				password: draft.password_hash.as_deref(),
				credits: draft.credits,
			};
			Ok(diesel::insert_into(users::table)
				.values(&new_user)
				.returning(User::as_returning())
				.get_result::<User>(conn)?)
		})
		.await
	}

	async fn list_avatars(&self) -> Result<Vec<UserAvatar>, StoreError> {
		self.run(|conn| {
			Ok(users::table
				.select((users::id, users::image))
				.order(users::id.asc())
				.load::<UserAvatar>(conn)?)
		})
		.await
	}

	async fn reserve_credits(&self, user_id: i32, cost: i32) -> Result<Option<i32>, StoreError> {
		self.run(move |conn| {
			Ok(diesel::update(
				users::table.filter(users::id.eq(user_id)).filter(users::credits.ge(cost)),
			)
			.set(users::credits.eq(users::credits - cost))
			.returning(users::credits)
			.get_result::<i32>(conn)
			.optional()?)
		})
		.await
	}

	async fn refund_credits(&self, user_id: i32, cost: i32) -> Result<(), StoreError> {
		self.run(move |conn| {
			diesel::update(users::table.filter(users::id.eq(user_id)))
				.set(users::credits.eq(users::credits + cost))
				.execute(conn)?;
			Ok(())
		})
		.await
	}

	async fn mark_verified(&self, email: &str) -> Result<bool, StoreError> {
		let email = email.to_string();
		self.run(move |conn| {
			let updated = diesel::update(users::table.filter(users::email.eq(&email)))
				.set(users::is_verified.eq(true))
				.execute(conn)?;
			Ok(updated > 0)
		})
		.await
	}
}
