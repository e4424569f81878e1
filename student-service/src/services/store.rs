//! In-memory student record store.
//!
//! One `RwLock` guards both the record map and the id counter. Reads share
//! the lock; every mutation, including the existence check that precedes an
//! update or delete, happens inside a single write guard.

use crate::models::{Student, StudentInput};
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Student {0} not found")]
    NotFound(u64),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::NotFound(anyhow::Error::new(err))
    }
}

struct Inner {
    students: HashMap<u64, Student>,
    next_id: u64,
}

/// Cheaply clonable handle to the shared record map.
#[derive(Clone)]
pub struct StudentStore {
    inner: Arc<RwLock<Inner>>,
}

impl Default for StudentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StudentStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                students: HashMap::new(),
                next_id: 1,
            })),
        }
    }

    /// Assign the next id and insert. Ids start at 1 and are never reused.
    pub async fn create(&self, input: StudentInput) -> Student {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let student = input.into_student(id);
        inner.students.insert(id, student.clone());

        tracing::debug!(student_id = id, "Stored new student");
        student
    }

    /// Snapshot of every record, in no particular order.
    pub async fn get_all(&self) -> Vec<Student> {
        let inner = self.inner.read().await;
        inner.students.values().cloned().collect()
    }

    pub async fn get_by_id(&self, id: u64) -> Result<Student, StoreError> {
        let inner = self.inner.read().await;
        inner
            .students
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    /// Replace the whole record, keeping `id`.
    pub async fn update(&self, id: u64, input: StudentInput) -> Result<Student, StoreError> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .students
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;

        *slot = input.into_student(id);
        Ok(slot.clone())
    }

    pub async fn delete(&self, id: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .students
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.students.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, age: i32) -> StudentInput {
        StudentInput {
            name: name.to_string(),
            age,
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids_from_one() {
        let store = StudentStore::new();

        let ids: Vec<u64> = futures::future::join_all((0..5).map(|i| {
            let store = store.clone();
            async move { store.create(input("Ann", 20 + i)).await.id }
        }))
        .await;

        let mut sorted = ids;
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = StudentStore::new();
        let first = store.create(input("Ann", 20)).await;
        store.delete(first.id).await.unwrap();

        let second = store.create(input("Bob", 21)).await;
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn get_by_id_returns_stored_copy() {
        let store = StudentStore::new();
        let created = store.create(input("Ann", 20)).await;

        assert_eq!(store.get_by_id(created.id).await, Ok(created));
    }

    #[tokio::test]
    async fn get_by_id_unknown_is_not_found() {
        let store = StudentStore::new();
        assert_eq!(store.get_by_id(42).await, Err(StoreError::NotFound(42)));
    }

    #[tokio::test]
    async fn update_replaces_body_and_keeps_id() {
        let store = StudentStore::new();
        let created = store.create(input("Ann", 20)).await;

        let updated = store
            .update(created.id, input("Annie", 21))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Annie");
        assert_eq!(updated.age, 21);
        assert_eq!(store.get_by_id(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_unknown_is_not_found_and_inserts_nothing() {
        let store = StudentStore::new();
        assert_eq!(
            store.update(3, input("Ghost", 99)).await,
            Err(StoreError::NotFound(3))
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = StudentStore::new();
        let created = store.create(input("Ann", 20)).await;

        store.delete(created.id).await.unwrap();

        assert_eq!(
            store.get_by_id(created.id).await,
            Err(StoreError::NotFound(created.id))
        );
        assert_eq!(
            store.delete(created.id).await,
            Err(StoreError::NotFound(created.id))
        );
    }

    #[tokio::test]
    async fn get_all_returns_every_record() {
        let store = StudentStore::new();
        store.create(input("Ann", 20)).await;
        store.create(input("Bob", 21)).await;

        let mut names: Vec<String> = store
            .get_all()
            .await
            .into_iter()
            .map(|s| s.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Ann", "Bob"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_update_and_delete_keep_ids_consistent() {
        let store = StudentStore::new();
        let mut ids = Vec::new();
        for i in 0..20 {
            ids.push(store.create(input("Seed", i)).await.id);
        }

        let mut handles = Vec::new();
        for &id in &ids {
            for round in 0..4 {
                let store = store.clone();
                handles.push(tokio::spawn(async move {
                    if round == 2 && id % 2 == 0 {
                        let _ = store.delete(id).await;
                    } else {
                        let _ = store.update(id, input("Racer", round)).await;
                    }
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let inner = store.inner.read().await;
        for (key, student) in &inner.students {
            assert_eq!(*key, student.id);
        }
        for id in ids {
            assert_eq!(inner.students.contains_key(&id), id % 2 == 1);
        }
    }
}
