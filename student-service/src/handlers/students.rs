//! CRUD handlers over the in-memory student store.

use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;

use crate::{
    dtos::CreateStudentResponse,
    extract::{AppJson, StudentId},
    models::{Student, StudentInput},
    startup::AppState,
};

pub async fn create_student(
    State(state): State<AppState>,
    AppJson(payload): AppJson<StudentInput>,
) -> Json<CreateStudentResponse> {
    let student = state.store.create(payload).await;

    tracing::info!(student_id = student.id, "Created student");

    Json(CreateStudentResponse::from(student))
}

pub async fn list_students(State(state): State<AppState>) -> Json<Vec<Student>> {
    Json(state.store.get_all().await)
}

pub async fn get_student(
    State(state): State<AppState>,
    StudentId(id): StudentId,
) -> Result<Json<Student>, AppError> {
    let student = state.store.get_by_id(id).await?;
    Ok(Json(student))
}

/// Replace every field of the student, keeping its id.
pub async fn update_student(
    State(state): State<AppState>,
    StudentId(id): StudentId,
    AppJson(payload): AppJson<StudentInput>,
) -> Result<Json<Student>, AppError> {
    let student = state.store.update(id, payload).await?;

    tracing::info!(student_id = id, "Updated student");

    Ok(Json(student))
}

pub async fn delete_student(
    State(state): State<AppState>,
    StudentId(id): StudentId,
) -> Result<StatusCode, AppError> {
    state.store.delete(id).await?;

    tracing::info!(student_id = id, "Deleted student");

    Ok(StatusCode::NO_CONTENT)
}
