use serde::{Deserialize, Serialize};

/// Structured fields pulled out of an uploaded résumé.
/// Consumed as an opaque value by the chat core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeProfile {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<u32>,
}

/// Result of analysing an uploaded résumé: the extracted document text plus
/// the profile derived from it.
#[derive(Debug, Clone)]
pub struct ResumeAnalysis {
    pub full_text: String,
    pub profile: ResumeProfile,
}
