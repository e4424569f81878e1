use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{dtos::SummaryResponse, extract::AppPath, startup::AppState};

/// Ask the generation backend to summarize one student.
///
/// The store read completes before the outbound call starts. Backend
/// failures come back as the summary text with a 200 status.
pub async fn get_student_summary(
    State(state): State<AppState>,
    AppPath(id): AppPath<u64>,
) -> Result<Json<SummaryResponse>, AppError> {
    let student = state.store.get_by_id(id).await?;

    tracing::info!(
        student_id = id,
        model = %state.generator.model(),
        "Generating student summary"
    );

    let summary = state.generator.generate(&student.summary_prompt()).await;

    Ok(Json(SummaryResponse { summary }))
}
