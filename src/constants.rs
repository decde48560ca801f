pub const AUTHORIZATION: &str = "Authorization";
pub const ONE_MONTH: usize = 30 * 24 * 60 * 60;

pub const OTP_PREFIX: &str = "otp";
pub const OTP_ATTEMPTS_PREFIX: &str = "otp-attempts";
pub const OTP_TTL_SECS: u64 = 300;
pub const OTP_VALIDITY_MINS: u64 = OTP_TTL_SECS / 60;

pub const BCRYPT_COST: u32 = 10;

pub const MESSAGE_UNAUTHORIZED: &str = "Unauthorized";
pub const MESSAGE_USER_NOT_FOUND: &str = "User Not Found";
pub const MESSAGE_INSUFFICIENT_CREDITS: &str = "Insufficient credits";
pub const MESSAGE_URL_REQUIRED: &str = "URL is required";
pub const MESSAGE_OTP_EXPIRED: &str = "OTP expired";
pub const MESSAGE_INVALID_OTP: &str = "Invalid OTP";
