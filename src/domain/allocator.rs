use crate::error::AppError;
use crate::store::VoteStore;
use rand::Rng;

/// The allocator only pre-checks; final uniqueness is delegated to the
/// store's `public_id` constraint at session insert. The residual race
/// between check and insert is accepted and surfaces as an insert error.
const MAX_ATTEMPTS: u32 = 10_000;

/// Draws a 6-digit decimal public id, uniform over [100000, 999999],
/// retried until no existing session holds it.
pub async fn allocate_public_id(store: &dyn VoteStore) -> Result<String, AppError> {
    for _ in 0..MAX_ATTEMPTS {
        let candidate = rand::thread_rng().gen_range(100_000..=999_999).to_string();
        if store.get_session_by_public_id(&candidate).await?.is_none() {
            return Ok(candidate);
        }
    }
    Err(AppError::AllocationExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem::MemStore;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_allocates_six_digit_ids() {
        let store = MemStore::new();
        for _ in 0..20 {
            let id = allocate_public_id(&store).await.unwrap();
            assert_eq!(id.len(), 6);
            assert!(id.chars().all(|c| c.is_ascii_digit()));
            assert!(!id.starts_with('0'));
        }
    }

    #[tokio::test]
    async fn test_allocated_ids_unique_against_existing_sessions() {
        let store = MemStore::new();
        let mut seen = HashSet::new();
        for i in 0..50 {
            let id = allocate_public_id(&store).await.unwrap();
            assert!(seen.insert(id.clone()), "id {id} allocated twice");
            store
                .create_session(&id, &format!("session {i}"), None, &[], &[])
                .await
                .unwrap();
        }
    }
}
