//! Access code domain models and candidate generation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Length of an access code.
pub const CODE_LENGTH: usize = 8;

/// Alphabet access codes are drawn from. Letters first, digits after; run
/// detection works over these indexes.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Code lifetime applied when a batch request does not specify one.
pub const DEFAULT_EXPIRY_HOURS: i64 = 72;

lazy_static::lazy_static! {
    /// Shape of a well-formed code. Full issuance rules live in
    /// [`code_format_ok`].
    pub static ref CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Z0-9]{8}$").unwrap();
}

/// A single-use access code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccessCode {
    pub id: Uuid,
    pub code: String,
    pub is_used: bool,
    pub event_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

/// Lifecycle status derived from the stored flags, never persisted.
///
/// A used code reports `used` even after its expiry passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    Unused,
    Used,
    Expired,
}

impl CodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeStatus::Unused => "unused",
            CodeStatus::Used => "used",
            CodeStatus::Expired => "expired",
        }
    }
}

impl AccessCode {
    /// Derives the lifecycle status at `now`.
    pub fn status_at(&self, now: DateTime<Utc>) -> CodeStatus {
        if self.is_used {
            CodeStatus::Used
        } else if self.expires_at <= now {
            CodeStatus::Expired
        } else {
            CodeStatus::Unused
        }
    }

    /// Derives the lifecycle status at the current instant.
    pub fn status(&self) -> CodeStatus {
        self.status_at(Utc::now())
    }
}

/// Outcome of an atomic reservation attempt.
#[derive(Debug, Clone)]
pub enum ReserveOutcome {
    /// The caller won the conditional update; the code is now consumed.
    Reserved(AccessCode),
    NotFound,
    AlreadyUsed,
    Expired,
}

/// Outcome of an admin attempt to release a stuck code.
#[derive(Debug, Clone)]
pub enum ReleaseOutcome {
    /// The code was used with no registration behind it; it is unused again.
    Released(AccessCode),
    /// The code exists but is either unused or backed by a registration.
    NotReleasable,
    NotFound,
}

/// Cheap shape check applied before lookups; malformed input never reaches
/// SQL.
pub fn is_well_formed(code: &str) -> bool {
    CODE_REGEX.is_match(code)
}

fn alphabet_index(c: char) -> Option<usize> {
    CODE_ALPHABET.iter().position(|&b| b as char == c)
}

/// Issuance rules for a candidate code. Candidates failing any rule are
/// discarded and regenerated, never repaired a second time.
///
/// Rejects: wrong length, characters outside the alphabet, all eight
/// characters identical, strictly ascending or descending runs of adjacent
/// alphabet indexes, missing letter, missing digit.
pub fn code_format_ok(code: &str) -> bool {
    if code.chars().count() != CODE_LENGTH {
        return false;
    }
    let indexes: Option<Vec<usize>> = code.chars().map(alphabet_index).collect();
    let indexes = match indexes {
        Some(idx) => idx,
        None => return false,
    };
    if indexes.windows(2).all(|w| w[0] == w[1]) {
        return false;
    }
    if indexes.windows(2).all(|w| w[1] == w[0] + 1) {
        return false;
    }
    if indexes.windows(2).all(|w| w[0] == w[1] + 1) {
        return false;
    }
    let has_letter = code.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = code.chars().any(|c| c.is_ascii_digit());
    has_letter && has_digit
}

/// Generates one candidate code.
///
/// Eight bytes from the OS CSPRNG are mapped onto the alphabet, then the
/// candidate is repaired to contain at least one letter and one digit:
/// a missing class is injected at a random position, and the two injection
/// positions never collide.
pub fn generate_candidate() -> String {
    use rand::rngs::OsRng;
    use rand::{Rng, RngCore};

    let mut bytes = [0u8; CODE_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    let mut chars: [u8; CODE_LENGTH] = [0; CODE_LENGTH];
    for (slot, &b) in chars.iter_mut().zip(bytes.iter()) {
        *slot = CODE_ALPHABET[(b as usize) % CODE_ALPHABET.len()];
    }

    let mut letter_pos = None;
    if !chars.iter().any(u8::is_ascii_uppercase) {
        let pos = OsRng.gen_range(0..CODE_LENGTH);
        chars[pos] = CODE_ALPHABET[OsRng.gen_range(0..26)];
        letter_pos = Some(pos);
    }
    if !chars.iter().any(u8::is_ascii_digit) {
        let mut pos = OsRng.gen_range(0..CODE_LENGTH);
        while letter_pos == Some(pos) {
            pos = OsRng.gen_range(0..CODE_LENGTH);
        }
        chars[pos] = CODE_ALPHABET[26 + OsRng.gen_range(0..10)];
    }

    // Alphabet bytes are ASCII.
    String::from_utf8_lossy(&chars).into_owned()
}

/// Request to generate a batch of access codes.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateAccessCodesRequest {
    /// Number of codes to issue.
    #[validate(range(min = 1, max = 500, message = "count must be between 1 and 500"))]
    pub count: u32,

    /// Hours until expiry (default: 72).
    #[validate(range(
        min = 1,
        max = 8760,
        message = "expiry_hours must be between 1 and 8760"
    ))]
    pub expiry_hours: Option<i64>,

    /// Free-text label for the batch.
    #[validate(length(max = 200, message = "event_name must be at most 200 characters"))]
    pub event_name: Option<String>,
}

impl CreateAccessCodesRequest {
    /// Expiry instant for codes issued by this request.
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::hours(self.expiry_hours.unwrap_or(DEFAULT_EXPIRY_HOURS))
    }
}

/// Per-index failure inside a generation batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationFailure {
    pub index: u32,
    pub message: String,
}

/// Result of a batch generation request. Partial success is reported, never
/// rolled back.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationReport {
    pub issued: Vec<AccessCode>,
    pub errors: Vec<GenerationFailure>,
    pub success_count: u32,
    pub total_requested: u32,
}

/// Non-mutating verification report for a code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct VerifyCodeResponse {
    pub code: String,
    pub valid: bool,
    pub status: Option<CodeStatus>,
    pub event_name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl VerifyCodeResponse {
    /// Report for a code that does not exist (or is malformed). Fail-closed.
    pub fn not_found(code: &str) -> Self {
        Self {
            code: code.to_string(),
            valid: false,
            status: None,
            event_name: None,
            expires_at: None,
        }
    }

    /// Report for a stored code; only an unused, unexpired code is valid.
    pub fn from_code(access_code: &AccessCode, now: DateTime<Utc>) -> Self {
        let status = access_code.status_at(now);
        Self {
            code: access_code.code.clone(),
            valid: status == CodeStatus::Unused,
            status: Some(status),
            event_name: access_code.event_name.clone(),
            expires_at: Some(access_code.expires_at),
        }
    }
}

/// One code in the admin inventory listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AccessCodeSummary {
    pub code: String,
    pub status: CodeStatus,
    pub event_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl From<AccessCode> for AccessCodeSummary {
    fn from(ac: AccessCode) -> Self {
        let status = ac.status();
        Self {
            code: ac.code,
            status,
            event_name: ac.event_name,
            created_at: ac.created_at,
            expires_at: ac.expires_at,
            used_at: ac.used_at,
        }
    }
}

/// Inventory counters split by derived status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CodeStats {
    pub total: i64,
    pub unused: i64,
    pub used: i64,
    pub expired: i64,
}

/// Result of an expired-code sweep.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CleanupReport {
    pub deleted_count: u64,
}
