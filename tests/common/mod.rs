use std::sync::Arc;

use bitfolio_core::crypto::{Sha256StreamCipher, TransactionCipher};
use bitfolio_core::db::{self, DbPool};
use bitfolio_core::transactions::{NewTransactionEnvelope, SessionContext};

pub const TEST_PASSPHRASE: &str = "hunter2-but-longer";
pub const TEST_SALT: &str = "per-user-salt";

/// Creates an on-disk sqlite database under `dir` with all migrations applied.
pub fn setup_test_db(dir: &tempfile::TempDir) -> Arc<DbPool> {
    let db_path = db::init(dir.path().to_str().expect("tempdir path is not UTF-8"))
        .expect("Failed to initialize database");
    let pool = db::create_pool(&db_path).expect("Failed to create database pool");
    db::run_migrations(&pool).expect("Failed to run migrations");
    pool
}

pub fn test_session(user_id: &str) -> SessionContext {
    SessionContext {
        user_id: user_id.to_string(),
        passphrase: Some(TEST_PASSPHRASE.to_string()),
        salt: Some(TEST_SALT.to_string()),
    }
}

/// Encrypts a payload the way a client would before submitting it.
pub fn sealed_envelope(payload_json: &str, timestamp: &str) -> NewTransactionEnvelope {
    let cipher = Sha256StreamCipher::new();
    let key = cipher.derive_key(TEST_PASSPHRASE, TEST_SALT);
    NewTransactionEnvelope {
        timestamp: timestamp.to_string(),
        ciphertext: cipher.encrypt(payload_json, &key),
    }
}
