use crate::{
	constants::{AUTHORIZATION, MESSAGE_UNAUTHORIZED, ONE_MONTH},
	errors::ErrorBody,
	state::AppState,
};
use actix_service::forward_ready;
use actix_web::{
	body::EitherBody,
	dev::{Service, ServiceRequest, ServiceResponse, Transform},
	http::{header::HeaderMap, Method},
	web, Error as AxError, HttpMessage, HttpResponse,
};
use chrono::Utc;
use futures::future::{ok, LocalBoxFuture, Ready};
use jsonwebtoken::{decode, encode, errors::Error, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
	pub iat: usize,
	pub exp: usize,
	pub sub: String,
	#[serde(default)]
	pub is_verified: bool,
}

impl Claims {
	pub fn user_id(&self) -> Option<i32> {
		self.sub.parse().ok()
	}
}

pub struct JWT {
	encoding: EncodingKey,
	decoding: DecodingKey,
}

impl JWT {
	pub fn new(s: &str) -> Self {
		Self {
			encoding: EncodingKey::from_secret(s.as_bytes()),
			decoding: DecodingKey::from_secret(s.as_bytes()),
		}
	}

	/// Issue a session token valid for thirty days.
	pub fn create_jwt(&self, user_id: i32, is_verified: bool) -> Result<String, Error> {
		let now = Utc::now().timestamp() as usize;
		let claims =
			Claims { iat: now, exp: now + ONE_MONTH, sub: user_id.to_string(), is_verified };
		debug!("Creating session token for user {}", claims.sub);
		encode(&Header::default(), &claims, &self.encoding)
	}

	pub fn verify_jwt(&self, token: &str) -> Result<Claims, Error> {
		decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
	}
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
	let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
	let token = value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))?.trim();
	if token.is_empty() {
		None
	} else {
		Some(token)
	}
}

/// Rejects requests without a valid bearer token and hands the verified
/// [`Claims`] to handlers through request extensions.
pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
	S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = AxError>,
	S::Future: 'static,
	B: 'static,
{
	type Response = ServiceResponse<EitherBody<B>>;
	type Error = AxError;
	type InitError = ();
	type Transform = AuthenticationMiddleware<S>;
	type Future = Ready<Result<Self::Transform, Self::InitError>>;

	fn new_transform(&self, service: S) -> Self::Future {
		ok(AuthenticationMiddleware { service })
	}
}

pub struct AuthenticationMiddleware<S> {
	service: S,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
	S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = AxError>,
	S::Future: 'static,
	B: 'static,
{
	type Response = ServiceResponse<EitherBody<B>>;
	type Error = AxError;
	type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

	forward_ready!(service);

	fn call(&self, req: ServiceRequest) -> Self::Future {
		if Method::OPTIONS == *req.method() {
			let res = self.service.call(req);
			return Box::pin(async move { res.await.map(ServiceResponse::map_into_left_body) });
		}

		let claims = bearer_token(req.headers()).and_then(|token| {
			let state = req.app_data::<web::Data<AppState>>()?;
			state.jwt.verify_jwt(token).map_err(|e| warn!("Invalid token: {:?}", e)).ok()
		});

		match claims {
			Some(claims) => {
				req.extensions_mut().insert(claims);
				let res = self.service.call(req);
				Box::pin(async move { res.await.map(ServiceResponse::map_into_left_body) })
			},
			None => {
				debug!("Rejecting unauthenticated request to {}", req.path());
				let (request, _pl) = req.into_parts();
				let response = HttpResponse::Unauthorized()
					.json(ErrorBody::message(MESSAGE_UNAUTHORIZED))
					.map_into_right_body();
				Box::pin(async move { Ok(ServiceResponse::new(request, response)) })
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::header::{HeaderName, HeaderValue};

	#[test]
	fn token_round_trips_user_and_verification() {
		let jwt = JWT::new("test-secret");
		let token = jwt.create_jwt(42, true).unwrap();
		let claims = jwt.verify_jwt(&token).unwrap();
		assert_eq!(claims.user_id(), Some(42));
		assert!(claims.is_verified);
		assert_eq!(claims.exp - claims.iat, ONE_MONTH);
	}

	#[test]
	fn token_signed_with_another_secret_is_rejected() {
		let token = JWT::new("one").create_jwt(1, false).unwrap();
		assert!(JWT::new("two").verify_jwt(&token).is_err());
	}

	#[test]
	fn expired_token_is_rejected() {
		let now = Utc::now().timestamp() as usize;
		let claims = Claims { iat: now - 7200, exp: now - 3600, sub: "1".into(), is_verified: false };
		let token =
			encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap();
		assert!(JWT::new("test-secret").verify_jwt(&token).is_err());
	}

	#[test]
	fn bearer_prefix_is_required() {
		let mut headers = HeaderMap::new();
		let name = HeaderName::from_static("authorization");
		assert_eq!(bearer_token(&headers), None);

		headers.insert(name.clone(), HeaderValue::from_static("Bearer abc.def"));
		assert_eq!(bearer_token(&headers), Some("abc.def"));

		headers.insert(name.clone(), HeaderValue::from_static("Basic abc"));
		assert_eq!(bearer_token(&headers), None);

		headers.insert(name, HeaderValue::from_static("Bearer   "));
		assert_eq!(bearer_token(&headers), None);
	}
}
