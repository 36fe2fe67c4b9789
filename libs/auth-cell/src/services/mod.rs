pub mod account;
pub mod password;
pub mod phone;
pub mod sms;

pub use account::AccountService;
pub use password::PasswordService;
pub use phone::PhoneVerificationService;
pub use sms::{SmsSender, TwilioSmsClient};
