//! Registration domain models, check-in types and admin DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::access_code::{is_well_formed, CODE_REGEX};
use super::participant::Participant;

/// Lifecycle status of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Confirmed,
    Cancelled,
    Attended,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Attended => "attended",
        }
    }

    /// Returns true when an admin may move a registration from `self` to
    /// `to`. Only confirmed registrations transition.
    pub fn can_transition_to(&self, to: RegistrationStatus) -> bool {
        matches!(
            (*self, to),
            (RegistrationStatus::Confirmed, RegistrationStatus::Cancelled)
                | (RegistrationStatus::Confirmed, RegistrationStatus::Attended)
        )
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confirmed" => Ok(RegistrationStatus::Confirmed),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            "attended" => Ok(RegistrationStatus::Attended),
            _ => Err(format!("Invalid registration status: {}", s)),
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A completed registration with its embedded participant snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Registration {
    pub id: Uuid,
    pub access_code: String,
    pub participant_id: String,
    pub participant: Participant,
    pub status: RegistrationStatus,
    pub qr_payload: String,
    pub created_at: DateTime<Utc>,
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// A registration ready to persist. Status starts as `confirmed` and the
/// ticket payload is already built.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub id: Uuid,
    pub access_code: String,
    pub participant_id: String,
    pub participant: Participant,
    pub qr_payload: String,
}

/// Request to redeem an access code and register a participant.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RegisterRequest {
    /// The 8-character access code being redeemed.
    #[validate(regex(
        path = *CODE_REGEX,
        message = "Access code must be 8 characters, A-Z and 0-9"
    ))]
    pub access_code: String,

    #[validate(custom(function = "shared::validation::validate_person_name"))]
    pub first_name: String,

    #[validate(custom(function = "shared::validation::validate_person_name"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: String,

    #[validate(range(min = 10, max = 100, message = "age must be between 10 and 100"))]
    pub age: i32,

    #[validate(length(min = 1, max = 32, message = "gender must be 1-32 characters"))]
    pub gender: String,

    #[validate(length(min = 1, max = 100, message = "district must be 1-100 characters"))]
    pub district: String,

    #[validate(length(min = 1, max = 100, message = "occupation must be 1-100 characters"))]
    pub occupation: String,

    #[validate(length(min = 1, max = 100, message = "interest must be 1-100 characters"))]
    pub interest: String,

    #[validate(length(max = 200, message = "affiliation must be at most 200 characters"))]
    pub affiliation: Option<String>,
}

impl RegisterRequest {
    /// Trims and uppercases the code and trims the email before validation.
    /// Codes are case-insensitive on input, canonical uppercase in storage.
    pub fn normalize(&mut self) {
        self.access_code = self.access_code.trim().to_ascii_uppercase();
        self.email = self.email.trim().to_string();
    }

    /// The participant snapshot carried by this request.
    pub fn participant(&self) -> Participant {
        Participant {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.clone(),
            phone: self.phone.trim().to_string(),
            age: self.age,
            gender: self.gender.clone(),
            district: self.district.clone(),
            occupation: self.occupation.clone(),
            interest: self.interest.clone(),
            affiliation: self.affiliation.clone(),
        }
    }
}

/// Response after a successful registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegisterResponse {
    pub registration_id: Uuid,
    pub participant_id: String,
    pub qr_payload: String,
    /// Set when an external renderer produced a hosted ticket image.
    pub ticket_url: Option<String>,
    pub status: RegistrationStatus,
}

/// Scanner check-in request. The reference may be a registration UUID or an
/// access code.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CheckInRequest {
    #[validate(length(min = 1, max = 64, message = "reference must be 1-64 characters"))]
    pub reference: String,
}

/// Parsed scanner reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanReference {
    RegistrationId(Uuid),
    AccessCode(String),
}

impl ScanReference {
    /// Parses scanner input: a UUID resolves by registration ID, anything
    /// shaped like a code resolves by access code.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if let Ok(id) = Uuid::parse_str(trimmed) {
            return Some(ScanReference::RegistrationId(id));
        }
        let upper = trimmed.to_ascii_uppercase();
        if is_well_formed(&upper) {
            return Some(ScanReference::AccessCode(upper));
        }
        None
    }
}

/// Outcome of an atomic check-in attempt.
#[derive(Debug, Clone)]
pub enum CheckInOutcome {
    /// This call performed the write.
    CheckedIn(Registration),
    /// A previous call already checked the participant in; carries the
    /// record with the original timestamp.
    AlreadyCheckedIn(Registration),
    /// The registration exists but is cancelled (or otherwise not
    /// confirmed) and was not checked in.
    NotConfirmed(RegistrationStatus),
    NotFound,
}

/// Scanner response for a check-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckInResponse {
    pub registration_id: Uuid,
    pub participant_id: String,
    pub first_name: String,
    pub last_name: String,
    pub already_checked_in: bool,
    pub checked_in_at: DateTime<Utc>,
}

impl CheckInResponse {
    pub fn new(
        registration: &Registration,
        already_checked_in: bool,
        checked_in_at: DateTime<Utc>,
    ) -> Self {
        Self {
            registration_id: registration.id,
            participant_id: registration.participant_id.clone(),
            first_name: registration.participant.first_name.clone(),
            last_name: registration.participant.last_name.clone(),
            already_checked_in,
            checked_in_at,
        }
    }
}

/// Outcome of an admin status transition.
#[derive(Debug, Clone)]
pub enum StatusUpdateOutcome {
    Updated(Registration),
    /// The registration was not in a state the requested transition allows.
    InvalidTransition(RegistrationStatus),
    NotFound,
}

/// Query parameters for the admin registrations listing.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ListRegistrationsQuery {
    pub status: Option<RegistrationStatus>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    pub cursor: Option<String>,

    #[validate(range(min = 1, max = 200, message = "limit must be between 1 and 200"))]
    pub limit: Option<i64>,
}

/// One registration in the admin listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationSummary {
    pub id: Uuid,
    pub access_code: String,
    pub participant_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl From<Registration> for RegistrationSummary {
    fn from(reg: Registration) -> Self {
        Self {
            id: reg.id,
            access_code: reg.access_code,
            participant_id: reg.participant_id,
            first_name: reg.participant.first_name,
            last_name: reg.participant.last_name,
            email: reg.participant.email,
            status: reg.status,
            created_at: reg.created_at,
            checked_in_at: reg.checked_in_at,
        }
    }
}

/// Response for the admin registrations listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListRegistrationsResponse {
    pub data: Vec<RegistrationSummary>,
    pub next_cursor: Option<String>,
}

/// Admin request to transition a registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UpdateStatusRequest {
    pub status: RegistrationStatus,
}

/// Response after queueing a confirmation resend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ResendResponse {
    pub registration_id: Uuid,
    pub email: String,
    pub queued: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> RegisterRequest {
        RegisterRequest {
            access_code: "X7K2P9QT".to_string(),
            first_name: "Aminata".to_string(),
            last_name: "Kamara".to_string(),
            email: "aminata@example.com".to_string(),
            phone: "+23276123456".to_string(),
            age: 24,
            gender: "female".to_string(),
            district: "Bo".to_string(),
            occupation: "Student".to_string(),
            interest: "Robotics".to_string(),
            affiliation: None,
        }
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            RegistrationStatus::Confirmed,
            RegistrationStatus::Cancelled,
            RegistrationStatus::Attended,
        ] {
            assert_eq!(status.as_str().parse::<RegistrationStatus>(), Ok(status));
        }
        assert!("unknown".parse::<RegistrationStatus>().is_err());
    }

    #[test]
    fn test_status_transitions() {
        use RegistrationStatus::*;
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Attended));
        assert!(!Confirmed.can_transition_to(Confirmed));
        assert!(!Cancelled.can_transition_to(Attended));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Attended.can_transition_to(Cancelled));
    }

    #[test]
    fn test_register_request_valid() {
        assert!(sample_request().validate().is_ok());
    }

    #[test]
    fn test_register_request_rejects_bad_code() {
        let mut req = sample_request();
        req.access_code = "short".to_string();
        assert!(req.validate().is_err());

        req.access_code = "x7k2p9qt".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_register_request_rejects_bad_email() {
        let mut req = sample_request();
        req.email = "not-an-email".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_register_request_rejects_bad_phone() {
        let mut req = sample_request();
        req.phone = "123".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_register_request_rejects_age_out_of_range() {
        let mut req = sample_request();
        req.age = 7;
        assert!(req.validate().is_err());
        req.age = 150;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_register_request_rejects_empty_district() {
        let mut req = sample_request();
        req.district = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_normalize_canonicalizes_code() {
        let mut req = sample_request();
        req.access_code = "  x7k2p9qt ".to_string();
        req.email = " aminata@example.com ".to_string();
        req.normalize();
        assert_eq!(req.access_code, "X7K2P9QT");
        assert_eq!(req.email, "aminata@example.com");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_participant_snapshot_trims_names() {
        let mut req = sample_request();
        req.first_name = " Aminata ".to_string();
        let participant = req.participant();
        assert_eq!(participant.first_name, "Aminata");
        assert_eq!(participant.full_name(), "Aminata Kamara");
    }

    #[test]
    fn test_scan_reference_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(
            ScanReference::parse(&id.to_string()),
            Some(ScanReference::RegistrationId(id))
        );
    }

    #[test]
    fn test_scan_reference_code() {
        assert_eq!(
            ScanReference::parse("x7k2p9qt"),
            Some(ScanReference::AccessCode("X7K2P9QT".to_string()))
        );
        assert_eq!(
            ScanReference::parse(" X7K2P9QT "),
            Some(ScanReference::AccessCode("X7K2P9QT".to_string()))
        );
    }

    #[test]
    fn test_scan_reference_garbage() {
        assert_eq!(ScanReference::parse(""), None);
        assert_eq!(ScanReference::parse("too-short"), None);
        assert_eq!(ScanReference::parse("way too long to be a code"), None);
    }

    #[test]
    fn test_list_query_validation() {
        let query = ListRegistrationsQuery {
            status: Some(RegistrationStatus::Confirmed),
            email: None,
            cursor: None,
            limit: Some(50),
        };
        assert!(query.validate().is_ok());

        let bad_limit = ListRegistrationsQuery {
            status: None,
            email: None,
            cursor: None,
            limit: Some(1000),
        };
        assert!(bad_limit.validate().is_err());
    }
}
