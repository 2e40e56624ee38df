//! Multipart form reading for résumé uploads.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;

/// Name of the multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn is_pdf(&self) -> bool {
        self.file_name.to_lowercase().ends_with(".pdf")
    }

    /// Rejects anything that is not a non-empty `.pdf` upload.
    pub fn validate_pdf(&self) -> Result<(), AppError> {
        if !self.is_pdf() {
            return Err(AppError::Validation("Only PDF files are accepted".to_string()));
        }
        if self.bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        Ok(())
    }
}

/// A parsed multipart form: at most one file plus plain text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == FILE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                // Browsers send an empty, unnamed part when no file was chosen.
                if !(file_name.is_empty() && bytes.is_empty()) {
                    form.file = Some(UploadedFile { file_name, bytes });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid form field '{name}': {e}")))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The uploaded file, required to be a non-empty PDF.
    pub fn require_pdf(self) -> Result<UploadedFile, AppError> {
        let file = self
            .file
            .ok_or_else(|| AppError::Validation("A PDF file is required".to_string()))?;
        file.validate_pdf()?;
        Ok(file)
    }
}
