use crate::constants::OTP_VALIDITY_MINS;
use actix_web::{error::BlockingError, web};
use async_trait::async_trait;
use chrono::Datelike;
use lettre::{
	message::{Mailbox, MultiPart},
	transport::smtp::authentication::Credentials,
	Message, SmtpTransport, Transport,
};
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

pub const OTP_SUBJECT: &str = "Your One-Time Passcode for CodeTheft";
const SENDER_NAME: &str = "CodeTheft Security";

#[derive(Debug, Error)]
pub enum MailError {
	#[error("invalid address: {0}")]
	Address(#[from] lettre::address::AddressError),

	#[error("message: {0}")]
	Message(#[from] lettre::error::Error),

	#[error("smtp: {0}")]
	Smtp(#[from] lettre::transport::smtp::Error),

	#[error("mail task was cancelled")]
	Blocking(#[from] BlockingError),
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
	async fn send_otp(&self, to_email: &str, code: &str) -> Result<(), MailError>;
}

pub struct SmtpMailer {
	from: Mailbox,
	transport: SmtpTransport,
}

impl SmtpMailer {
	pub fn new(relay: &str, user: &str, pass: &str) -> Result<Self, MailError> {
		let from = format!("{} <{}>", SENDER_NAME, user).parse::<Mailbox>()?;
		let creds = Credentials::new(user.to_string(), pass.to_string());
		let transport = SmtpTransport::relay(relay)?.credentials(creds).build();
		Ok(Self { from, transport })
	}

	/// Check the relay accepts our credentials before serving traffic.
	pub async fn verify(&self) -> Result<bool, MailError> {
		let transport = self.transport.clone();
		Ok(web::block(move || transport.test_connection()).await??)
	}
}

#[async_trait]
impl Mailer for SmtpMailer {
	async fn send_otp(&self, to_email: &str, code: &str) -> Result<(), MailError> {
		let year = chrono::Utc::now().year();
		let message = Message::builder()
			.from(self.from.clone())
			.to(to_email.parse::<Mailbox>()?)
			.subject(OTP_SUBJECT)
			.multipart(MultiPart::alternative_plain_html(
				otp_text_body(code, year),
				otp_html_body(code, year),
			))?;

		let transport = self.transport.clone();
		web::block(move || transport.send(&message)).await??;
		log::info!("OTP sent successfully to {}", to_email);
		Ok(())
	}
}

pub fn otp_text_body(code: &str, year: i32) -> String {
	format!(
		"CodeTheft Authentication

Your verification code is: {code}

This code will expire in {OTP_VALIDITY_MINS} minutes.
If you didn't request this code, please ignore this email.

© {year} CodeTheft. All rights reserved."
	)
}

pub fn otp_html_body(code: &str, year: i32) -> String {
	format!(
		r#"<!DOCTYPE html>
<html>
<head>
  <style>
    body {{ font-family: 'Segoe UI', Arial, sans-serif; line-height: 1.6; color: #333; }}
    .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
    .header {{ color: #2c3e50; border-bottom: 1px solid #eee; padding-bottom: 10px; }}
    .otp-code {{ font-size: 24px; letter-spacing: 2px; color: #2c3e50; font-weight: bold;
      margin: 20px 0; padding: 10px; background: #f8f9fa; display: inline-block; }}
    .footer {{ margin-top: 20px; padding-top: 10px; border-top: 1px solid #eee;
      font-size: 12px; color: #7f8c8d; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header"><h2>CodeTheft Authentication</h2></div>
    <p>Your verification code is:</p>
    <div class="otp-code">{code}</div>
    <p>This code will expire in {OTP_VALIDITY_MINS} minutes.</p>
    <p>If you didn't request this code, please ignore this email.</p>
    <div class="footer">
      <p>© {year} CodeTheft. All rights reserved.</p>
      <p>This is an automated message - please do not reply directly to this email.</p>
    </div>
  </div>
</body>
</html>"#
	)
}
