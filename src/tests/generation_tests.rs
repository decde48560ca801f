use actix_web::{http::StatusCode, test};
use reqwest::Url;
use serde_json::json;
use std::sync::Arc;

use crate::{
	errors::ErrorBody,
	generator::LlmError,
	models::GenerateResponse,
	scrape::ScrapeError,
	tests::{
		fixtures::TestFixtures,
		test_utils::{
			generate_test_token, test_app, InMemoryOtpStore, InMemoryUserStore, TestDeps, TEST_COST,
		},
	},
};

const USER_ID: i32 = 12;

fn store_with_credits(credits: i32) -> Arc<InMemoryUserStore> {
	Arc::new(InMemoryUserStore::with_users(vec![TestFixtures::user(
		USER_ID,
		"gen@example.com",
		credits,
	)]))
}

fn deps(users: &Arc<InMemoryUserStore>) -> TestDeps {
	TestDeps::new(users.clone(), Arc::new(InMemoryOtpStore::default()))
}

#[actix_web::test]
async fn test_generate_code_debits_exactly_once() {
	let users = store_with_credits(12);
	let mut deps = deps(&users);
	deps.scraper
		.expect_fetch()
		.times(1)
		.withf(|target: &Url| target.as_str() == "https://www.acme.dev/")
		.returning(|_| Ok(TestFixtures::landing_page()));
	deps.generator
		.expect_generate()
		.times(1)
		.withf(|prompt: &str| {
			prompt.contains("<h1>Build faster</h1>") &&
				!prompt.contains("<script") &&
				!prompt.contains("window.track") &&
				prompt.contains("specializing in React development")
		})
		.returning(|_| Ok("export default function Result() { return <h1/>; }".to_string()));
	let app = test_app!(deps.into_state());

	let resp = test::TestRequest::post()
		.uri("/api/generate-code")
		.insert_header(("Authorization", format!("Bearer {}", generate_test_token(USER_ID))))
		.set_json(&TestFixtures::generate_request("acme.dev", "React"))
		.send_request(&app)
		.await;
	assert!(resp.status().is_success());

	let body: GenerateResponse = test::read_body_json(resp).await;
	assert!(body.success);
	assert_eq!(body.code, "export default function Result() { return <h1/>; }");
	assert_eq!(body.remaining_credits, 12 - TEST_COST);
	assert_eq!(users.credits_of(USER_ID), Some(12 - TEST_COST));
}

#[actix_web::test]
async fn test_unauthorized_generation() {
	let users = store_with_credits(50);
	let app = test_app!(deps(&users).untouched().into_state());

	let missing = test::TestRequest::post()
		.uri("/api/generate-code")
		.set_json(&TestFixtures::generate_request("acme.dev", "JSX"))
		.send_request(&app)
		.await;
	assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
	let body: ErrorBody = test::read_body_json(missing).await;
	assert_eq!(body.message.as_deref(), Some("Unauthorized"));

	let forged = test::TestRequest::post()
		.uri("/api/generate-code")
		.insert_header(("Authorization", "Bearer not.a.token"))
		.set_json(&TestFixtures::generate_request("acme.dev", "JSX"))
		.send_request(&app)
		.await;
	assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(users.credits_of(USER_ID), Some(50));
}

#[actix_web::test]
async fn test_insufficient_credits_never_scrapes() {
	for credits in [3, 0, -2] {
		let users = store_with_credits(credits);
		let app = test_app!(deps(&users).untouched().into_state());

		let resp = test::TestRequest::post()
			.uri("/api/generate-code")
			.insert_header(("Authorization", format!("Bearer {}", generate_test_token(USER_ID))))
			.set_json(&TestFixtures::generate_request("acme.dev", "JSX"))
			.send_request(&app)
			.await;
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

		let body: ErrorBody = test::read_body_json(resp).await;
		assert_eq!(body, ErrorBody::message("Insufficient credits"));
		assert_eq!(users.credits_of(USER_ID), Some(credits));
	}
}

#[actix_web::test]
async fn test_unknown_user() {
	let users = store_with_credits(50);
	let app = test_app!(deps(&users).untouched().into_state());

	let resp = test::TestRequest::post()
		.uri("/api/generate-code")
		.insert_header(("Authorization", format!("Bearer {}", generate_test_token(999))))
		.set_json(&TestFixtures::generate_request("acme.dev", "JSX"))
		.send_request(&app)
		.await;
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	let body: ErrorBody = test::read_body_json(resp).await;
	assert_eq!(body.message.as_deref(), Some("User Not Found"));
}

#[actix_web::test]
async fn test_invalid_requests_are_not_charged() {
	let users = store_with_credits(50);
	let app = test_app!(deps(&users).untouched().into_state());

	let cases = [
		(json!({"mode": "url", "language": "JSX"}), "URL is required"),
		(json!({"url": "  ", "mode": "url"}), "URL is required"),
		(json!({"url": "acme.dev", "mode": "prompt"}), "Unsupported mode"),
		(json!({"url": "acme.dev", "language": "Svelte"}), "Unsupported language"),
		(json!({"url": "localhost", "language": "JSX"}), "Invalid URL"),
	];

	for (payload, message) in cases {
		let resp = test::TestRequest::post()
			.uri("/api/generate-code")
			.insert_header(("Authorization", format!("Bearer {}", generate_test_token(USER_ID))))
			.set_json(&payload)
			.send_request(&app)
			.await;
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", payload);
		let body: ErrorBody = test::read_body_json(resp).await;
		assert_eq!(body.message.as_deref(), Some(message), "{}", payload);
	}
	assert_eq!(users.credits_of(USER_ID), Some(50));
}

#[actix_web::test]
async fn test_scrape_failure_refunds_and_passes_message_through() {
	let users = store_with_credits(20);
	let mut deps = deps(&users);
	deps.scraper
		.expect_fetch()
		.times(1)
		.returning(|_| Err(ScrapeError::Service { status: 502, body: "render timeout".into() }));
	deps.generator.expect_generate().never();
	let app = test_app!(deps.into_state());

	let resp = test::TestRequest::post()
		.uri("/api/generate-code")
		.insert_header(("Authorization", format!("Bearer {}", generate_test_token(USER_ID))))
		.set_json(&TestFixtures::generate_request("acme.dev", "HTML/CSS"))
		.send_request(&app)
		.await;
	assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

	let body: ErrorBody = test::read_body_json(resp).await;
	assert!(!body.success);
	assert_eq!(body.error.as_deref(), Some("scrape service returned 502: render timeout"));
	assert_eq!(users.credits_of(USER_ID), Some(20));
}

#[actix_web::test]
async fn test_model_failure_refunds() {
	let users = store_with_credits(20);
	let mut deps = deps(&users);
	deps.scraper.expect_fetch().times(1).returning(|_| Ok(TestFixtures::landing_page()));
	deps.generator.expect_generate().times(1).returning(|_| {
		Err(LlmError::Api { status: 429, message: "Resource has been exhausted".into() })
	});
	let app = test_app!(deps.into_state());

	let resp = test::TestRequest::post()
		.uri("/api/generate-code")
		.insert_header(("Authorization", format!("Bearer {}", generate_test_token(USER_ID))))
		.set_json(&TestFixtures::generate_request("acme.dev", "HTML/CSS/JS"))
		.send_request(&app)
		.await;
	assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

	let body: ErrorBody = test::read_body_json(resp).await;
	assert_eq!(body.error.as_deref(), Some("model API returned 429: Resource has been exhausted"));
	assert_eq!(users.credits_of(USER_ID), Some(20));
}

#[actix_web::test]
async fn test_last_credits_cover_only_one_generation() {
	let users = store_with_credits(TEST_COST);
	let mut deps = deps(&users);
	deps.scraper.expect_fetch().times(1).returning(|_| Ok(TestFixtures::landing_page()));
	deps.generator.expect_generate().times(1).returning(|_| Ok("<div></div>".to_string()));
	let app = test_app!(deps.into_state());

	let send = || {
		test::TestRequest::post()
			.uri("/api/generate-code")
			.insert_header(("Authorization", format!("Bearer {}", generate_test_token(USER_ID))))
			.set_json(&TestFixtures::generate_request("acme.dev", "JSX"))
	};

	let first = send().send_request(&app).await;
	assert!(first.status().is_success());
	let second = send().send_request(&app).await;
	assert_eq!(second.status(), StatusCode::BAD_REQUEST);
	assert_eq!(users.credits_of(USER_ID), Some(0));
}
