//! Résumé text and field extraction.
//!
//! Pattern based: no model calls. Produces a `ResumeProfile` from the text of
//! an uploaded PDF.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::models::resume::{ResumeAnalysis, ResumeProfile};

/// Documents with less extracted text than this are treated as unreadable.
pub const MIN_TEXT_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to read PDF: {0}")]
    Unreadable(String),

    #[error("CV is too short or its content could not be read")]
    TooShort,
}

/// Technology vocabulary recognised in résumés, in reporting order.
const SKILL_VOCABULARY: &[&str] = &[
    // Programming languages
    "python", "java", "javascript", "typescript", "c++", "c#", "php", "ruby", "go", "rust",
    "swift", "kotlin", "scala", "r", "matlab",
    // Web
    "html", "css", "react", "angular", "vue", "nodejs", "express", "django", "flask",
    "spring", "fastapi", "nextjs", "nuxt",
    // Databases
    "mysql", "postgresql", "mongodb", "redis", "oracle", "sql server", "sqlite",
    "dynamodb", "cassandra", "elasticsearch",
    // Cloud and DevOps
    "aws", "azure", "gcp", "docker", "kubernetes", "jenkins", "gitlab", "github",
    "terraform", "ansible", "ci/cd", "devops",
    // Mobile
    "android", "ios", "react native", "flutter", "xamarin",
    // Data and AI
    "machine learning", "deep learning", "data science", "ai", "nlp", "computer vision",
    "tensorflow", "pytorch", "keras", "pandas", "numpy", "scikit-learn",
    // Other
    "git", "agile", "scrum", "rest api", "graphql", "microservices", "linux",
    "testing", "junit", "selenium", "jest",
];

fn email_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid regex")
    })
}

/// Tried in order; the first pattern with any match wins.
fn phone_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"\+?\d{1,3}[-.\s]?\(?\d{1,4}\)?[-.\s]?\d{1,4}[-.\s]?\d{1,9}",
            r"\d{10,11}",
            r"\(\d{3}\)\s*\d{3}[-.\s]?\d{4}",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
    })
}

fn experience_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [r"(\d+)\+?\s*(?:years?|năm)", r"(\d+)-\d+\s*(?:years?|năm)"]
            .iter()
            .map(|p| Regex::new(p).expect("valid regex"))
            .collect()
    })
}

/// One matcher per vocabulary entry. Skills must stand alone, so "r" does
/// not match inside "rust" and "java" does not match inside "javascript".
fn skill_matchers() -> &'static [(&'static str, Regex)] {
    static RES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    RES.get_or_init(|| {
        SKILL_VOCABULARY
            .iter()
            .map(|skill| {
                let pattern = format!(r"(?:^|[^\w+#]){}(?:$|[^\w+#])", regex::escape(skill));
                (*skill, Regex::new(&pattern).expect("valid regex"))
            })
            .collect()
    })
}

/// Extracts the text layer of a PDF. CPU bound; call from a blocking task.
pub fn extract_text(pdf: &[u8]) -> Result<String, ExtractionError> {
    // pdf-extract can panic on malformed documents.
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(pdf))
        .map_err(|_| ExtractionError::Unreadable("malformed PDF document".to_string()))?
        .map_err(|e| ExtractionError::Unreadable(e.to_string()))?;
    let text = text.trim().to_string();
    debug!("Extracted {} characters from PDF", text.len());
    Ok(text)
}

/// Reads a PDF and derives its profile.
pub fn analyze_pdf(pdf: &[u8]) -> Result<ResumeAnalysis, ExtractionError> {
    let text = extract_text(pdf)?;
    analyze_text(text)
}

/// Derives a profile from already extracted résumé text.
pub fn analyze_text(full_text: String) -> Result<ResumeAnalysis, ExtractionError> {
    if full_text.chars().count() < MIN_TEXT_CHARS {
        return Err(ExtractionError::TooShort);
    }
    let profile = extract_fields(&full_text);
    debug!(
        "Résumé profile: {} skills, experience_years={:?}, email={}, phone={}",
        profile.skills.len(),
        profile.experience_years,
        profile.email.is_some(),
        profile.phone.is_some()
    );
    Ok(ResumeAnalysis { full_text, profile })
}

pub fn extract_fields(text: &str) -> ResumeProfile {
    ResumeProfile {
        email: extract_email(text),
        phone: extract_phone(text),
        skills: extract_skills(text),
        experience_years: extract_experience_years(text),
    }
}

pub fn extract_email(text: &str) -> Option<String> {
    email_pattern().find(text).map(|m| m.as_str().to_string())
}

pub fn extract_phone(text: &str) -> Option<String> {
    phone_patterns()
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().to_string())
}

/// Skills found in `text`, title-cased, in vocabulary order without duplicates.
pub fn extract_skills(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut skills: Vec<String> = Vec::new();
    for (skill, matcher) in skill_matchers() {
        if matcher.is_match(&lower) {
            let display = title_case(skill);
            if !skills.contains(&display) {
                skills.push(display);
            }
        }
    }
    skills
}

pub fn extract_experience_years(text: &str) -> Option<u32> {
    let lower = text.to_lowercase();
    experience_patterns()
        .iter()
        .find_map(|re| re.captures(&lower))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Capitalises each letter that follows a non-letter: "ci/cd" → "Ci/Cd".
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}
