use actix_multipart::Multipart;
use futures_util::StreamExt;
use std::collections::HashMap;

use crate::error::AppError;

pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Parsed multipart form: file parts keyed by field name, plus text fields.
#[derive(Default)]
pub struct FormData {
    files: HashMap<String, UploadedFile>,
    texts: HashMap<String, String>,
}

impl FormData {
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(|s| s.as_str())
    }

    pub fn require_text(&self, name: &str) -> Result<&str, AppError> {
        self.text(name)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Validation(format!("Missing '{}' field", name)))
    }
}

/// Drains a multipart payload into memory. Parts with a filename become file
/// entries, the rest are decoded as UTF-8 text fields.
pub async fn read_form(mut payload: Multipart) -> Result<FormData, AppError> {
    let mut form = FormData::default();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let content_disposition = field.content_disposition().ok_or_else(|| {
            AppError::BadRequest("Content-Disposition header missing".to_string())
        })?;

        let field_name = content_disposition
            .get_name()
            .ok_or_else(|| AppError::BadRequest("Field name missing".to_string()))?
            .to_string();
        let file_name = content_disposition.get_filename().map(|f| f.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            data.extend_from_slice(&chunk?);
        }

        match file_name {
            Some(file_name) => {
                form.files.insert(field_name, UploadedFile { file_name, bytes: data });
            }
            None => {
                let text = String::from_utf8(data).map_err(|_| {
                    AppError::BadRequest(format!("Invalid encoding in '{}' field", field_name))
                })?;
                form.texts.insert(field_name, text.trim().to_string());
            }
        }
    }

    Ok(form)
}
