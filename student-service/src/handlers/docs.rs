use axum::{http::header, response::IntoResponse};
use service_core::error::AppError;
use std::collections::BTreeMap;

use crate::dtos::Documentation;

const INTRODUCTION: &str =
    "This is just a documentation of available API endpoints and how to use them.";
const STUDENT_BODY: &str = "{ \"name\": string, \"age\": int, \"email\": string }";

pub fn documentation() -> Documentation {
    let mut api = BTreeMap::new();
    let mut add = |method: &str, path: &str, description: String| {
        api.entry(method.to_string())
            .or_insert_with(BTreeMap::new)
            .insert(path.to_string(), description);
    };

    add(
        "POST",
        "/students",
        format!("Create a new student. Expected format: {}", STUDENT_BODY),
    );
    add("GET", "/students", "Retrieve a list of all students.".to_string());
    add("GET", "/students/{id}", "Retrieve a student by ID.".to_string());
    add(
        "GET",
        "/students/{id}/summary",
        "Get a summary of a student by ID using the local text-generation service.".to_string(),
    );
    add(
        "PUT",
        "/students/{id}",
        format!(
            "Update a student's information by ID. Expected format: {}",
            STUDENT_BODY
        ),
    );
    add("DELETE", "/students/{id}", "Delete a student by ID.".to_string());

    let mut additional_information = BTreeMap::new();
    additional_information.insert(
        "NOTE".to_string(),
        "**IMPORTANT:** To send requests for POST, PUT, DELETE you may use Postman, curl, or a code script.".to_string(),
    );

    Documentation {
        introduction: INTRODUCTION.to_string(),
        api_documentation: api,
        additional_information,
    }
}

/// Pretty-printed endpoint listing served at `/`.
pub async fn documentation_page() -> Result<impl IntoResponse, AppError> {
    let body = serde_json::to_string_pretty(&documentation()).map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("Failed to format JSON: {}", e))
    })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}
