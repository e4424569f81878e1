use serde::{Deserialize, Serialize};

/// A stored student record. `id` is owned by the store.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: u64,
    pub name: String,
    pub age: i32,
    pub email: String,
}

/// Request body for create and update. Any `id` sent by the client is ignored.
///
/// Missing fields decode to their zero value and the capitalized keys
/// (`Name`, `Age`, `Email`) are accepted as well; only a wrong JSON type
/// is rejected.
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StudentInput {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Age")]
    pub age: i32,
    #[serde(alias = "Email")]
    pub email: String,
}

impl StudentInput {
    pub fn into_student(self, id: u64) -> Student {
        Student {
            id,
            name: self.name,
            age: self.age,
            email: self.email,
        }
    }
}

impl Student {
    /// Prompt asking the generation backend for a short profile of this student.
    pub fn summary_prompt(&self) -> String {
        format!(
            "\"Summarize the profile of a student with the following details: Name: {}, Age: {}, Email: {}\"",
            self.name, self.age, self.email
        )
    }
}
