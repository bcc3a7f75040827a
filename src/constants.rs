pub(crate) const DEFAULT_BASE_URL: &str = "https://kp.m-team.cc/";
pub(crate) const DEFAULT_LOGIN_URL: &str = "https://kp.m-team.cc/login";
pub(crate) const DEFAULT_LANDING_URL: &str = "https://kp.m-team.cc/index";
pub(crate) const DEFAULT_PROFILE_API_URL: &str = "https://api2.m-team.cc/api/member/profile";

pub(crate) const DEFAULT_ARTIFACT_FILE: &str = "mteam_localstorage.json";

pub(crate) const DEFAULT_NAV_TIMEOUT_SECS: u64 = 60;
pub(crate) const DEFAULT_OTP_WAIT_SECS: u64 = 30;
pub(crate) const DEFAULT_SETTLE_SECS: u64 = 5;

pub(crate) const USERNAME_SELECTOR: &str = "input[id=\"username\"]";
pub(crate) const PASSWORD_SELECTOR: &str = "input[id=\"password\"]";
pub(crate) const OTP_CODE_SELECTOR: &str = "input[id=\"otpCode\"]";
pub(crate) const SUBMIT_SELECTOR: &str = "button[type=\"submit\"]";

pub(crate) const NOTIFY_SUBJECT_PREFIX: &str = "[mt-checkin] ";

pub(crate) const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
