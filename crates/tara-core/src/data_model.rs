//! Data Model: TravelRequest, Profile, AdvisoryResult, ResolvedRequest
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::context::RequestContext;
use crate::error::TaraError;
use crate::merge::ProfileAttributes;

/// Country name used when a structured nationality omits `country`.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Code derived from [`UNKNOWN_COUNTRY`]; never treated as a real citizenship.
pub const UNKNOWN_CODE: &str = "UN";

/// Label returned by a rule store when no row matches.
pub const UNKNOWN_REQUIREMENT: &str = "unknown";

pub const CITIZENSHIP_PROMPT: &str = "We need to know your country of citizenship to determine \
visa requirements. This will be saved to your profile and you won't be asked again.";

/// Two-character uppercased code taken from the start of a country name.
pub fn country_code(country: &str) -> String {
    country.trim().chars().take(2).collect::<String>().to_uppercase()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// INBOUND REQUEST
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelRequest {
    #[serde(default = "default_request_type")]
    pub request_type: String,
    /// Destination country as typed by the user
    #[serde(rename = "country")]
    pub destination: String,
    /// Purpose of travel (Tourism, Work, Study, ...)
    #[serde(rename = "type")]
    pub purpose: String,
    pub profile: SuppliedProfile,
    /// Wizard-style supplemental answers
    #[serde(default)]
    pub context: Option<BTreeMap<String, Value>>,
}

fn default_request_type() -> String {
    "travel_check".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuppliedProfile {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(rename = "displayName", default = "default_display_name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub nationalities: Vec<Nationality>,
}

fn default_display_name() -> Option<String> {
    Some("User".to_string())
}

impl SuppliedProfile {
    /// User id, falling back to email. Blank values count as absent.
    pub fn identity_key(&self) -> Option<String> {
        non_blank(self.user_id.as_deref())
            .or_else(|| non_blank(self.email.as_deref()))
            .map(str::to_string)
    }
}

/// A nationality entry as sent by the frontend: either `"India"` or
/// `{"country": "India", "code": "IN"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Nationality {
    Name(String),
    Structured {
        #[serde(default)]
        country: Option<String>,
        #[serde(default)]
        code: Option<String>,
    },
}

impl Nationality {
    pub fn citizenship(&self) -> Citizenship {
        match self {
            Nationality::Name(name) => Citizenship::from_name(name),
            Nationality::Structured { country, code } => {
                let name = non_blank(country.as_deref()).unwrap_or(UNKNOWN_COUNTRY);
                match non_blank(code.as_deref()) {
                    Some(code) => Citizenship {
                        name: name.to_string(),
                        code: code.to_uppercase(),
                    },
                    None => Citizenship::from_name(name),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citizenship {
    pub name: String,
    pub code: String,
}

impl Citizenship {
    pub fn from_name(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            code: country_code(name),
        }
    }

    /// False for an empty code or the `"UN"` placeholder.
    pub fn is_known(&self) -> bool {
        !self.code.is_empty() && self.code != UNKNOWN_CODE
    }
}

// ============================================================================
// PERSISTED RECORDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub citizenship: Option<String>,
    pub citizenship_code: Option<String>,
    pub date_of_birth: Option<String>,
    pub passport_number: Option<String>,
    /// JSON-encoded list of visas already held
    pub existing_visas: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            email: None,
            display_name: None,
            citizenship: None,
            citizenship_code: None,
            date_of_birth: None,
            passport_number: None,
            existing_visas: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stored citizenship code, if present and non-blank
    pub fn citizenship_code(&self) -> Option<&str> {
        non_blank(self.citizenship_code.as_deref())
    }

    /// Stored citizenship, falling back to the code when no name was saved
    pub fn stored_citizenship(&self) -> Option<Citizenship> {
        let code = self.citizenship_code()?;
        let name = non_blank(self.citizenship.as_deref()).unwrap_or(code);
        Some(Citizenship {
            name: name.to_string(),
            code: code.to_string(),
        })
    }

    /// Applies the present fields of `update`, leaving the rest untouched.
    pub fn apply_update(&mut self, update: &ProfileUpdate) {
        let fields = [
            (&mut self.email, &update.email),
            (&mut self.display_name, &update.display_name),
            (&mut self.citizenship, &update.citizenship),
            (&mut self.citizenship_code, &update.citizenship_code),
            (&mut self.date_of_birth, &update.date_of_birth),
            (&mut self.passport_number, &update.passport_number),
            (&mut self.existing_visas, &update.existing_visas),
        ];
        for (current, new) in fields {
            if new.is_some() {
                current.clone_from(new);
            }
        }
        self.updated_at = Utc::now();
    }

    /// Present fields as a merge layer
    pub fn attributes(&self) -> ProfileAttributes {
        let mut attrs = ProfileAttributes::new();
        attrs.insert("user_id", self.user_id.clone());
        let optional = [
            ("email", &self.email),
            ("display_name", &self.display_name),
            ("citizenship", &self.citizenship),
            ("citizenship_code", &self.citizenship_code),
            ("date_of_birth", &self.date_of_birth),
            ("passport_number", &self.passport_number),
            ("existing_visas", &self.existing_visas),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                attrs.insert(key, value.clone());
            }
        }
        attrs.insert("created_at", self.created_at.to_rfc3339());
        attrs.insert("updated_at", self.updated_at.to_rfc3339());
        attrs
    }
}

/// Partial profile write. `None` fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub citizenship: Option<String>,
    #[serde(default)]
    pub citizenship_code: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub existing_visas: Option<String>,
}

impl ProfileUpdate {
    pub fn citizenship(citizenship: &Citizenship) -> Self {
        Self {
            citizenship: Some(citizenship.name.clone()),
            citizenship_code: Some(citizenship.code.clone()),
            ..Self::default()
        }
    }

    pub fn with_contact(mut self, email: Option<String>, display_name: Option<String>) -> Self {
        self.email = email;
        self.display_name = display_name;
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Interaction about to be appended to the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInteraction {
    pub request_type: String,
    pub origin: String,
    pub destination: String,
    pub purpose: String,
    pub status: ResolutionStatus,
    /// JSON-encoded advisory payload
    pub advisory_payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub id: i64,
    pub user_id: String,
    pub request_type: String,
    pub origin: String,
    pub destination: String,
    pub purpose: String,
    pub status: String,
    pub advisory_payload: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// COLLABORATOR RESULTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryResult {
    #[serde(default)]
    pub forms: Vec<String>,
    #[serde(default)]
    pub health: Vec<String>,
    #[serde(default)]
    pub safety: Vec<String>,
    /// Field name → why it is still needed. Empty means the profile is sufficient.
    #[serde(default, rename = "awaiting_feedback")]
    pub outstanding_fields: BTreeMap<String, String>,
}

impl AdvisoryResult {
    pub const OFFLINE_MESSAGE: &'static str = "Expert service temporarily offline";

    /// Fallback used whenever the advisory service cannot answer.
    pub fn unavailable() -> Self {
        let mut outstanding_fields = BTreeMap::new();
        outstanding_fields.insert("error".to_string(), Self::OFFLINE_MESSAGE.to_string());
        Self {
            outstanding_fields,
            ..Self::default()
        }
    }

    pub fn needs_more_info(&self) -> bool {
        !self.outstanding_fields.is_empty()
    }
}

// ============================================================================
// RESOLUTION STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStatus {
    Complete,
    Incomplete,
    Error,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStatus::Complete => "COMPLETE",
            ResolutionStatus::Incomplete => "INCOMPLETE",
            ResolutionStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a request ended INCOMPLETE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncompleteReason {
    /// No usable citizenship, stored or supplied
    MissingIdentity,
    /// The advisory service asked for more profile detail
    AdvisoryNeedsMore,
    /// The advisory service failed and the offline fallback was used
    AdvisoryUnavailable,
}

/// Working state of one resolution. Only its projections are persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedRequest {
    pub trace_id: String,
    pub identity_key: Option<String>,
    pub request_type: String,
    pub origin_country: Option<String>,
    pub origin_code: Option<String>,
    pub destination_country: String,
    pub destination_code: Option<String>,
    pub purpose: String,
    pub profile: ProfileAttributes,
    pub status: ResolutionStatus,
    pub reason: Option<IncompleteReason>,
    pub visa_requirement: Option<String>,
    pub advisory: Option<AdvisoryResult>,
    pub outstanding_fields: BTreeMap<String, String>,
    pub user_has_stored_profile: bool,
    pub citizenship_was_stored: bool,
    pub error: Option<String>,
}

impl ResolvedRequest {
    pub fn begin(request: &TravelRequest, ctx: &RequestContext) -> Self {
        Self {
            trace_id: ctx.trace_id.clone(),
            identity_key: ctx.identity_key.clone(),
            request_type: request.request_type.clone(),
            origin_country: None,
            origin_code: None,
            destination_country: request.destination.clone(),
            destination_code: None,
            purpose: request.purpose.clone(),
            profile: ProfileAttributes::new(),
            status: ResolutionStatus::Incomplete,
            reason: None,
            visa_requirement: None,
            advisory: None,
            outstanding_fields: BTreeMap::new(),
            user_has_stored_profile: false,
            citizenship_was_stored: false,
            error: None,
        }
    }

    /// Short-circuit: nothing is known about the traveler's citizenship.
    pub fn await_citizenship(&mut self) {
        self.status = ResolutionStatus::Incomplete;
        self.reason = Some(IncompleteReason::MissingIdentity);
        self.outstanding_fields.clear();
        self.outstanding_fields
            .insert("citizenship".to_string(), CITIZENSHIP_PROMPT.to_string());
    }

    /// Final status follows the advisory's outstanding fields only, never the
    /// rule label.
    pub fn conclude(
        &mut self,
        visa_requirement: String,
        advisory: AdvisoryResult,
        fallback_used: bool,
    ) {
        self.status = if advisory.needs_more_info() {
            ResolutionStatus::Incomplete
        } else {
            ResolutionStatus::Complete
        };
        self.reason = match (self.status, fallback_used) {
            (ResolutionStatus::Complete, _) => None,
            (_, true) => Some(IncompleteReason::AdvisoryUnavailable),
            (_, false) => Some(IncompleteReason::AdvisoryNeedsMore),
        };
        self.outstanding_fields = advisory.outstanding_fields.clone();
        self.visa_requirement = Some(visa_requirement);
        self.advisory = Some(advisory);
    }

    pub fn fail(&mut self, err: &TaraError) {
        self.status = ResolutionStatus::Error;
        self.reason = None;
        self.error = Some(err.to_string());
    }

    pub fn needs_more_info(&self) -> bool {
        !self.outstanding_fields.is_empty()
    }

    /// Projection written to the interaction log
    pub fn to_interaction(&self) -> Result<NewInteraction, TaraError> {
        let advisory_payload = match &self.advisory {
            Some(advisory) => serde_json::to_string(advisory)?,
            None => serde_json::to_string(&serde_json::json!({
                "awaiting_feedback": self.outstanding_fields,
                "error": self.error,
            }))?,
        };
        Ok(NewInteraction {
            request_type: self.request_type.clone(),
            origin: self.origin_code.clone().unwrap_or_default(),
            destination: self.destination_code.clone().unwrap_or_default(),
            purpose: self.purpose.clone(),
            status: self.status,
            advisory_payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_country_code_takes_two_chars() {
        assert_eq!(country_code("France"), "FR");
        assert_eq!(country_code("  india"), "IN");
        assert_eq!(country_code("X"), "X");
        assert_eq!(country_code(""), "");
        assert_eq!(country_code("Österreich"), "ÖS");
    }

    #[test]
    fn test_nationality_shapes() {
        let parsed: Vec<Nationality> =
            serde_json::from_value(json!(["India", {"country": "Germany", "code": "de"}, {}]))
                .unwrap();

        assert_eq!(
            parsed[0].citizenship(),
            Citizenship { name: "India".into(), code: "IN".into() }
        );
        assert_eq!(parsed[1].citizenship().code, "DE");

        let unknown = parsed[2].citizenship();
        assert_eq!(unknown.name, UNKNOWN_COUNTRY);
        assert_eq!(unknown.code, UNKNOWN_CODE);
        assert!(!unknown.is_known());
    }

    #[test]
    fn test_structured_without_code_derives_from_country() {
        let nat = Nationality::Structured {
            country: Some("Brazil".into()),
            code: Some("  ".into()),
        };
        assert_eq!(nat.citizenship().code, "BR");
    }

    #[test]
    fn test_identity_key_falls_back_to_email() {
        let profile = SuppliedProfile {
            user_id: Some("  ".into()),
            email: Some("a@b.c".into()),
            ..Default::default()
        };
        assert_eq!(profile.identity_key().as_deref(), Some("a@b.c"));

        let anonymous = SuppliedProfile::default();
        assert_eq!(anonymous.identity_key(), None);
    }

    #[test]
    fn test_travel_request_wire_names() {
        let request: TravelRequest = serde_json::from_value(json!({
            "request_type": "visa_check",
            "country": "France",
            "type": "Work",
            "profile": {"user_id": "u1", "nationalities": [{"country": "India", "code": "IN"}]},
            "context": null
        }))
        .unwrap();

        assert_eq!(request.destination, "France");
        assert_eq!(request.purpose, "Work");
        assert_eq!(request.profile.display_name.as_deref(), Some("User"));
        assert!(request.context.is_none());
    }

    #[test]
    fn test_apply_update_keeps_unspecified_fields() {
        let mut profile = Profile::new("u1");
        profile.email = Some("u1@example.com".into());
        profile.passport_number = Some("P123".into());

        profile.apply_update(&ProfileUpdate {
            citizenship_code: Some("FR".into()),
            ..Default::default()
        });

        assert_eq!(profile.citizenship_code(), Some("FR"));
        assert_eq!(profile.email.as_deref(), Some("u1@example.com"));
        assert_eq!(profile.passport_number.as_deref(), Some("P123"));
    }

    #[test]
    fn test_advisory_result_defaults_missing_keys() {
        let advisory: AdvisoryResult =
            serde_json::from_value(json!({"forms": ["ETIAS"]})).unwrap();
        assert_eq!(advisory.forms, vec!["ETIAS"]);
        assert!(!advisory.needs_more_info());

        let offline = AdvisoryResult::unavailable();
        assert_eq!(
            offline.outstanding_fields.get("error").map(String::as_str),
            Some(AdvisoryResult::OFFLINE_MESSAGE)
        );
        assert!(offline.forms.is_empty());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_value(ResolutionStatus::Incomplete).unwrap(),
            json!("INCOMPLETE")
        );
        assert_eq!(ResolutionStatus::Complete.to_string(), "COMPLETE");
    }
}
