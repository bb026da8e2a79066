//! Multipart form intake shared by the policy and claim routes.
//!
//! Text fields are collected by name. Files are only accepted on the field
//! named by the route's [`UploadRules`]; each is type-checked and size-capped
//! while streaming, and nothing touches the disk until the whole form has
//! been read.

use std::collections::HashMap;

use axum::extract::Multipart;
use lifesure_core::uploads::{UploadRules, UploadStorage};

use crate::error::{AppError, AppResult};

/// A file that passed the type filter, held in memory until saved.
#[derive(Debug)]
pub struct PendingFile {
    pub ext: String,
    pub bytes: Vec<u8>,
}

/// Parsed multipart form.
#[derive(Debug, Default)]
pub struct Form {
    fields: HashMap<String, String>,
    pub files: Vec<PendingFile>,
}

impl Form {
    /// Text value of `name`, if sent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }
}

/// Read the entire form, enforcing `rules` on file fields.
pub async fn read_form(
    multipart: &mut Multipart,
    rules: &UploadRules,
    storage: &UploadStorage,
) -> AppResult<Form> {
    let mut form = Form::default();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let Some(file_name) = field.file_name().map(str::to_string) else {
            let value = field.text().await?;
            form.fields.insert(name, value);
            continue;
        };

        if name != rules.field {
            return Err(AppError::Validation(format!(
                "Unexpected file field '{name}'"
            )));
        }
        if form.files.len() >= rules.max_files {
            return Err(AppError::Validation(format!(
                "At most {} file(s) allowed for {}",
                rules.max_files, rules.field
            )));
        }
        let ext = rules.accept(&file_name, field.content_type())?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            bytes.extend_from_slice(&chunk);
            storage.check_size(rules.field, bytes.len())?;
        }
        form.files.push(PendingFile { ext, bytes });
    }

    Ok(form)
}

/// Persist pending files, returning their URLs. On failure every file
/// written so far is removed again.
pub async fn save_files(
    storage: &UploadStorage,
    rules: &UploadRules,
    files: Vec<PendingFile>,
) -> AppResult<Vec<String>> {
    let mut urls = Vec::with_capacity(files.len());
    for file in files {
        match storage.save(rules, &file.ext, &file.bytes).await {
            Ok(url) => urls.push(url),
            Err(e) => {
                storage.remove_all(&urls).await;
                return Err(e.into());
            }
        }
    }
    Ok(urls)
}
