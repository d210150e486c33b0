use gym_console::{
    models::Role,
    session::{
        FileStorage, MemoryStorage, ROLE_KEY, SessionError, SessionStorage, SessionStore,
        StorageError, StorageState, TOKEN_KEY,
    },
};
use std::{path::PathBuf, sync::Arc};
use uuid::Uuid;

fn store_over(storage: MemoryStorage) -> (SessionStore, Arc<MemoryStorage>) {
    let storage = Arc::new(storage);
    let store = SessionStore::new(storage.clone() as StorageState);
    (store, storage)
}

#[cfg(test)]
mod memory_tests {
    use super::*;

    #[tokio::test]
    async fn test_login_persists_token_and_role() {
        let (store, storage) = store_over(MemoryStorage::new());

        let session = store
            .login("tok-1".to_string(), Some(Role::Receptionist))
            .await
            .unwrap();

        assert_eq!(session.role(), Role::Receptionist);
        assert_eq!(storage.get(TOKEN_KEY).await.unwrap().as_deref(), Some("tok-1"));
        assert_eq!(
            storage.get(ROLE_KEY).await.unwrap().as_deref(),
            Some("receptionist")
        );
        assert_eq!(store.current().await, Some(session));
    }

    #[tokio::test]
    async fn test_login_without_role_drops_stale_role_record() {
        let (store, storage) =
            store_over(MemoryStorage::new().with_entry(ROLE_KEY, "administrator"));

        let session = store.login("tok-2".to_string(), None).await.unwrap();

        assert_eq!(session.role(), Role::Anonymous);
        assert_eq!(storage.get(ROLE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_clears_token_and_role() {
        let (store, storage) = store_over(MemoryStorage::new());
        store
            .login("tok-3".to_string(), Some(Role::Trainer))
            .await
            .unwrap();

        store.logout().await.unwrap();

        assert!(store.current().await.is_none());
        assert_eq!(storage.get(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(storage.get(ROLE_KEY).await.unwrap(), None);
        assert!(!store.summary().await.authenticated);
    }

    #[tokio::test]
    async fn test_restore_token_without_role_is_anonymous() {
        let (store, _) = store_over(MemoryStorage::new().with_entry(TOKEN_KEY, "tok-4"));

        let session = store.restore().await.unwrap().expect("session restored");

        assert_eq!(session.token(), "tok-4");
        assert_eq!(session.role(), Role::Anonymous);
    }

    #[tokio::test]
    async fn test_restore_unknown_role_is_anonymous() {
        let (store, _) = store_over(
            MemoryStorage::new()
                .with_entry(TOKEN_KEY, "tok-5")
                .with_entry(ROLE_KEY, "gerente"),
        );

        let session = store.restore().await.unwrap().unwrap();
        assert_eq!(session.role(), Role::Anonymous);
    }

    #[tokio::test]
    async fn test_restore_accepts_backend_role_spelling() {
        let (store, _) = store_over(
            MemoryStorage::new()
                .with_entry(TOKEN_KEY, "tok-6")
                .with_entry(ROLE_KEY, "Recepcionista"),
        );

        let session = store.restore().await.unwrap().unwrap();
        assert_eq!(session.role(), Role::Receptionist);
    }

    #[tokio::test]
    async fn test_restore_without_token_yields_no_session() {
        let (store, _) = store_over(
            MemoryStorage::new()
                .with_entry(TOKEN_KEY, "   ")
                .with_entry(ROLE_KEY, "administrator"),
        );

        assert!(store.restore().await.unwrap().is_none());
        assert!(store.current().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected() {
        let (store, storage) = store_over(MemoryStorage::new());

        let result = store.login(String::new(), Some(Role::Administrator)).await;

        assert!(matches!(result, Err(SessionError::EmptyToken)));
        assert_eq!(storage.get(TOKEN_KEY).await.unwrap(), None);
        assert!(store.current().await.is_none());
    }

    #[tokio::test]
    async fn test_expire_ignores_outdated_epoch() {
        let (store, _) = store_over(MemoryStorage::new());
        store
            .login("old".to_string(), Some(Role::Trainer))
            .await
            .unwrap();
        let old_epoch = store.epoch();
        store
            .login("new".to_string(), Some(Role::Trainer))
            .await
            .unwrap();

        assert!(!store.expire(old_epoch).await.unwrap());
        assert_eq!(store.current().await.unwrap().token(), "new");

        assert!(store.expire(store.epoch()).await.unwrap());
        assert!(store.current().await.is_none());
    }

    #[tokio::test]
    async fn test_failing_storage_keeps_console_logged_out() {
        let (store, _) = store_over(MemoryStorage::new_failing());

        let result = store
            .login("tok-7".to_string(), Some(Role::Receptionist))
            .await;

        assert!(matches!(result, Err(SessionError::Storage(_))));
        assert!(store.current().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_role_write_never_pairs_token_with_old_role() {
        let storage = Arc::new(
            MemoryStorage::new_rejecting(ROLE_KEY)
                .with_entry(TOKEN_KEY, "admin-token")
                .with_entry(ROLE_KEY, "administrator"),
        );
        let store = SessionStore::new(storage.clone() as StorageState);
        store.restore().await.unwrap();

        let result = store
            .login("trainer-token".to_string(), Some(Role::Trainer))
            .await;

        assert!(matches!(result, Err(SessionError::Storage(_))));
        assert!(store.current().await.is_none());
        assert_eq!(storage.get(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(storage.get(ROLE_KEY).await.unwrap(), None);

        // A restart over the same storage comes up logged out.
        let restarted = SessionStore::new(storage as StorageState);
        assert!(restarted.restore().await.unwrap().is_none());
    }
}

#[cfg(test)]
mod file_tests {
    use super::*;

    fn temp_session_file() -> PathBuf {
        std::env::temp_dir()
            .join(format!("gym-console-{}", Uuid::new_v4()))
            .join("session.json")
    }

    fn file_store(path: &PathBuf) -> SessionStore {
        SessionStore::new(Arc::new(FileStorage::new(path.clone())) as StorageState)
    }

    #[tokio::test]
    async fn test_session_survives_restart() {
        let path = temp_session_file();

        file_store(&path)
            .login("persisted".to_string(), Some(Role::Administrator))
            .await
            .unwrap();

        // A fresh store over the same file, as after a console restart.
        let restarted = file_store(&path);
        let session = restarted.restore().await.unwrap().expect("session restored");
        assert_eq!(session.token(), "persisted");
        assert_eq!(session.role(), Role::Administrator);
    }

    #[tokio::test]
    async fn test_logout_removes_keys_from_file() {
        let path = temp_session_file();
        let store = file_store(&path);
        store
            .login("tok".to_string(), Some(Role::Trainer))
            .await
            .unwrap();

        store.logout().await.unwrap();

        let storage = FileStorage::new(path.clone());
        assert_eq!(storage.get(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(storage.get(ROLE_KEY).await.unwrap(), None);
        assert!(file_store(&path).restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let storage = FileStorage::new(temp_session_file());
        assert_eq!(storage.get(TOKEN_KEY).await.unwrap(), None);
        // Removing from a file that does not exist is a no-op.
        storage.remove(TOKEN_KEY).await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let path = temp_session_file();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let result = file_store(&path).restore().await;

        assert!(matches!(
            result,
            Err(SessionError::Storage(StorageError::Corrupt(_)))
        ));
    }
}
