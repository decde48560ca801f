use crate::schema::*;
use diesel::{pg::Pg, prelude::*};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

#[derive(Queryable, Serialize, Deserialize, Clone, Debug, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: i32,
	pub email: String,
	pub name: Option<String>,
	#[serde(skip_serializing, default)]
	pub password: Option<String>,
	pub image: Option<String>,
	pub credits: i32,
	pub is_verified: bool,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
	pub email: &'a str,
	pub name: Option<&'a str>,
	pub password: Option<&'a str>,
	pub credits: i32,
}

#[derive(Queryable, Serialize, Deserialize, Debug, PartialEq)]
pub struct UserAvatar {
	pub id: i32,
	pub image: Option<String>,
}

/// Public view of a user; never carries the password hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
	pub id: i32,
	pub name: Option<String>,
	pub email: String,
	pub image: Option<String>,
	pub credits: i32,
	pub is_verified: bool,
}

impl From<User> for UserProfile {
	fn from(u: User) -> Self {
		Self {
			id: u.id,
			name: u.name,
			email: u.email,
			image: u.image,
			credits: u.credits,
			is_verified: u.is_verified,
		}
	}
}

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct SignUpRequest {
	#[validate(email(message = "Invalid email address"))]
	pub email: String,
	#[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
	pub name: String,
	#[validate(length(min = 8, message = "Password must be at least 8 characters"))]
	pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SignUpResp {
	pub success: bool,
	pub message: String,
	pub user: UserProfile,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct SignInRequest {
	pub email: Option<String>,
	pub password: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SignInResp {
	pub success: bool,
	pub token: String,
	pub user: UserProfile,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct SendOtpRequest {
	pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct VerifyOtpRequest {
	pub email: Option<String>,
	pub otp: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
	pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse {
	pub success: bool,
	pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct GenerateRequest {
	pub url: Option<String>,
	pub mode: Option<String>,
	pub language: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
	pub success: bool,
	pub code: String,
	pub remaining_credits: i32,
}

/// Output format requested for the generated component.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
	#[default]
	Jsx,
	HtmlCss,
	HtmlCssJs,
	React,
}

impl Language {
	pub fn as_str(&self) -> &str {
		match self {
			Language::Jsx => "JSX",
			Language::HtmlCss => "HTML/CSS",
			Language::HtmlCssJs => "HTML/CSS/JS",
			Language::React => "React",
		}
	}

	/// React output is styled with Tailwind utility classes, everything else
	/// with plain inline CSS.
	pub fn styling(&self) -> &str {
		match self {
			Language::React => "inline Tailwind CSS",
			_ => "inline normal CSS",
		}
	}
}

impl FromStr for Language {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"JSX" => Ok(Language::Jsx),
			"HTML/CSS" => Ok(Language::HtmlCss),
			"HTML/CSS/JS" => Ok(Language::HtmlCssJs),
			"React" => Ok(Language::React),
			other => Err(other.to_string()),
		}
	}
}

/// Only URL scraping is supported as a generation source.
pub const MODE_URL: &str = "url";
