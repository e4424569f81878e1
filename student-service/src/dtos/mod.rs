use crate::models::Student;
use serde::Serialize;
use std::collections::BTreeMap;

pub const STUDENT_CREATED_MESSAGE: &str = "Student created successfully";

#[derive(Debug, Serialize)]
pub struct CreateStudentResponse {
    pub message: String,
    pub student: Student,
}

impl From<Student> for CreateStudentResponse {
    fn from(student: Student) -> Self {
        Self {
            message: STUDENT_CREATED_MESSAGE.to_string(),
            student,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Body of the `GET /` documentation page.
#[derive(Debug, Serialize)]
pub struct Documentation {
    #[serde(rename = "Introduction")]
    pub introduction: String,
    /// HTTP method -> path -> description.
    #[serde(rename = "API Documentation")]
    pub api_documentation: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(rename = "Additional Information")]
    pub additional_information: BTreeMap<String, String>,
}
