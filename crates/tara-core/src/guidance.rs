//! Guidance: required documents and procedural steps per visa category
//!
//! The rule table returns free-form labels ("visa required", "e-visa",
//! "visa free", "90", "unknown", ...). They are bucketed into four categories
//! by case-insensitive substring match, checked in this order:
//!
//! | Category      | Matches                 |
//! |---------------|-------------------------|
//! | VisaRequired  | `visa required`         |
//! | EVisa         | `e-visa`, `evisa`       |
//! | VisaFree      | `free`                  |
//! | Unknown       | anything else           |

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisaRequirement {
    VisaRequired,
    EVisa,
    VisaFree,
    Unknown,
}

impl VisaRequirement {
    pub fn classify(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("visa required") {
            VisaRequirement::VisaRequired
        } else if label.contains("e-visa") || label.contains("evisa") {
            VisaRequirement::EVisa
        } else if label.contains("free") {
            VisaRequirement::VisaFree
        } else {
            VisaRequirement::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelPurpose {
    Work,
    Study,
    Other,
}

impl TravelPurpose {
    pub fn classify(purpose: &str) -> Self {
        let purpose = purpose.to_lowercase();
        if purpose.contains("work") {
            TravelPurpose::Work
        } else if purpose.contains("student") || purpose.contains("study") {
            TravelPurpose::Study
        } else {
            TravelPurpose::Other
        }
    }
}

/// One checklist item, shaped for the frontend's application detail view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProceduralStep {
    pub id: String,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
}

impl ProceduralStep {
    fn new(id: impl Into<String>, title: &str, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.to_string(),
            description: description.into(),
            is_completed: false,
        }
    }
}

pub fn required_documents(
    requirement: VisaRequirement,
    destination: &str,
    purpose: TravelPurpose,
    origin: &str,
) -> Vec<String> {
    let mut docs = vec![format!("Valid Passport (from {})", origin)];

    match requirement {
        VisaRequirement::VisaRequired => {
            docs.push(format!("Visa Application Form for {}", destination));
            docs.extend(
                [
                    "Passport-sized Photos (2)",
                    "Proof of Accommodation (Hotel booking or invitation letter)",
                    "Proof of Financial Means (Bank statements)",
                    "Travel Itinerary",
                    "Travel Insurance",
                ]
                .map(String::from),
            );
            match purpose {
                TravelPurpose::Work => docs.extend(
                    [
                        "Job Offer Letter",
                        "Employer Sponsorship Documents",
                        "Professional Qualifications/Certificates",
                    ]
                    .map(String::from),
                ),
                TravelPurpose::Study => docs.extend(
                    [
                        "University Acceptance Letter",
                        "Proof of Tuition Payment",
                        "Academic Transcripts",
                    ]
                    .map(String::from),
                ),
                TravelPurpose::Other => {}
            }
        }
        VisaRequirement::EVisa => {
            docs.push(format!("e-Visa Application for {}", destination));
            docs.extend(
                [
                    "Digital Passport Photo",
                    "Proof of Accommodation",
                    "Return Flight Ticket",
                ]
                .map(String::from),
            );
        }
        VisaRequirement::VisaFree => {
            docs.extend(
                [
                    "Return Flight Ticket",
                    "Proof of Accommodation (recommended)",
                    "Travel Insurance (recommended)",
                ]
                .map(String::from),
            );
        }
        VisaRequirement::Unknown => {}
    }

    docs
}

pub fn procedural_steps(
    requirement: VisaRequirement,
    destination: &str,
    purpose: TravelPurpose,
) -> Vec<ProceduralStep> {
    let mut steps = match requirement {
        VisaRequirement::VisaFree => vec![
            ProceduralStep::new("1", "Verify Passport Validity", format!(
                "Ensure your passport is valid for at least 6 months beyond your planned stay in {}",
                destination
            )),
            ProceduralStep::new("2", "Book Accommodation", "Reserve flights and accommodation with confirmation emails"),
            ProceduralStep::new("3", "Arrange Travel Insurance", "Purchase comprehensive travel insurance"),
            ProceduralStep::new("4", "Check Entry Requirements", format!("Review current entry requirements for {}", destination)),
            ProceduralStep::new("5", "Prepare for Arrival", format!("Pack documents and prepare for arrival in {}", destination)),
        ],
        VisaRequirement::EVisa => vec![
            ProceduralStep::new("1", "Visit e-Visa Portal", format!("Visit the {} e-Visa portal", destination)),
            ProceduralStep::new("2", "Complete Application", "Complete the online application form"),
            ProceduralStep::new("3", "Upload Documents", "Upload required documents (passport scan, photo)"),
            ProceduralStep::new("4", "Pay Fee", "Pay the visa processing fee"),
            ProceduralStep::new("5", "Await Approval", "Wait for e-Visa approval (typically 3-5 business days)"),
            ProceduralStep::new("6", "Print e-Visa", "Download and print the e-Visa"),
            ProceduralStep::new("7", "Present on Arrival", "Present the e-Visa upon arrival"),
        ],
        VisaRequirement::VisaRequired => vec![
            ProceduralStep::new("1", "Locate Embassy", format!("Locate the nearest {} embassy or consulate", destination)),
            ProceduralStep::new("2", "Schedule Appointment", "Schedule a visa appointment"),
            ProceduralStep::new("3", "Gather Documents", "Gather all required documents"),
            ProceduralStep::new("4", "Complete Application", "Complete the visa application form"),
            ProceduralStep::new("5", "Pay Fee", "Pay the visa application fee"),
            ProceduralStep::new("6", "Attend Interview", "Attend the visa interview (if required)"),
            ProceduralStep::new("7", "Submit Biometrics", "Submit biometric data (fingerprints, photo)"),
            ProceduralStep::new("8", "Await Processing", "Wait for visa processing (typically 2-4 weeks)"),
            ProceduralStep::new("9", "Collect Passport", "Collect your passport with the visa"),
        ],
        VisaRequirement::Unknown => vec![
            ProceduralStep::new("1", "Research Requirements", format!("Research specific visa requirements for {}", destination)),
            ProceduralStep::new("2", "Contact Embassy", "Contact the embassy for clarification on requirements"),
            ProceduralStep::new("3", "Prepare Documentation", "Gather and prepare all necessary documentation"),
        ],
    };

    if requirement == VisaRequirement::VisaRequired {
        let extra = match purpose {
            TravelPurpose::Work => Some(ProceduralStep::new(
                "1a",
                "Obtain Work Authorization",
                "Obtain a work permit or employment authorization",
            )),
            TravelPurpose::Study => Some(ProceduralStep::new(
                "1a",
                "Obtain Institution Approval",
                "Obtain student visa approval from your institution",
            )),
            TravelPurpose::Other => None,
        };
        if let Some(step) = extra {
            steps.insert(2, step);
        }
    }

    steps
}
