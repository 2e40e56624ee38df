//! Builds the semantic search query used to match a résumé against job postings.

use crate::models::resume::ResumeProfile;

const MAX_QUERY_SKILLS: usize = 10;
const MAX_FALLBACK_CHARS: usize = 500;
/// Used when the résumé yields neither profile signal nor text.
pub const FALLBACK_QUERY: &str = "Tìm việc làm";

/// Query built from the profile's skills and seniority only.
/// Empty when the profile has neither.
pub fn build_search_query(profile: &ResumeProfile) -> String {
    let mut parts = Vec::new();

    if !profile.skills.is_empty() {
        let top: Vec<&str> = profile
            .skills
            .iter()
            .take(MAX_QUERY_SKILLS)
            .map(String::as_str)
            .collect();
        parts.push(format!("Kỹ năng: {}", top.join(", ")));
    }

    if let Some(years) = profile.experience_years.filter(|y| *y > 0) {
        parts.push(seniority_phrase(years).to_string());
    }

    parts.join(". ")
}

/// Query for a résumé, falling back to the leading document text and then to
/// a generic phrase when the profile carries no signal.
pub fn search_query_or_fallback(profile: &ResumeProfile, full_text: &str) -> String {
    let query = build_search_query(profile);
    if !query.is_empty() {
        return query;
    }
    let lead: String = full_text.trim().chars().take(MAX_FALLBACK_CHARS).collect();
    if lead.is_empty() {
        FALLBACK_QUERY.to_string()
    } else {
        lead
    }
}

fn seniority_phrase(years: u32) -> &'static str {
    match years {
        0..=1 => "Junior, fresher, entry level",
        2..=4 => "Middle, intermediate level",
        _ => "Senior, expert level",
    }
}
