//! Shared fixtures for integration tests: a deterministic test cipher, an
//! account-store builder whose blobs the cipher can actually decrypt, and a
//! mock trading session with failure injection.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use custody::accounts::{FileAccountStore, PersistedAccount};
use custody::errors::CustodyResult;
use custody::execution::{ChainKeyMap, SessionError, SessionFactory, TradingSession};
use custody::vault::{CipherError, KeyCipher};

pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// XOR cipher over a sha256-derived key, with a short checksum tag so a
/// wrong password fails instead of yielding garbage. Test-only stand-in
/// for the application's real crypto layer.
pub struct XorCipher;

const TAG_LEN: usize = 4;

impl XorCipher {
    fn keystream(password: &str, salt: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hasher.update(salt);
        hasher.finalize().to_vec()
    }

    fn tag(plaintext: &[u8]) -> Vec<u8> {
        Sha256::digest(plaintext)[..TAG_LEN].to_vec()
    }

    fn xor(data: &[u8], key: &[u8]) -> Vec<u8> {
        data.iter()
            .enumerate()
            .map(|(i, b)| b ^ key[i % key.len()])
            .collect()
    }

    /// Inverse of decrypt; used by fixtures to produce valid blobs
    pub fn encrypt(plaintext: &[u8], password: &str, salt: &[u8]) -> Vec<u8> {
        let key = Self::keystream(password, salt);
        let mut buf = plaintext.to_vec();
        buf.extend(Self::tag(plaintext));
        Self::xor(&buf, &key)
    }
}

impl KeyCipher for XorCipher {
    fn derive_key(&self, password: &str, salt: &[u8]) -> Vec<u8> {
        Self::keystream(password, salt)
    }

    fn decrypt(&self, ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError> {
        if key.is_empty() {
            return Err(CipherError("empty derived key".to_string()));
        }
        let buf = Self::xor(ciphertext, key);
        if buf.len() < TAG_LEN {
            return Err(CipherError("ciphertext too short".to_string()));
        }
        let (body, tag) = buf.split_at(buf.len() - TAG_LEN);
        if Self::tag(body) != tag {
            return Err(CipherError("authentication failed".to_string()));
        }
        Ok(body.to_vec())
    }
}

/// Build one persisted record whose encrypted blob decrypts to
/// `key-<account_id>` under `TEST_PASSWORD`
pub fn persisted_account(account_id: &str) -> PersistedAccount {
    let salt = format!("salt-{}", account_id);
    let plaintext = format!("key-{}", account_id);
    let ciphertext = XorCipher::encrypt(plaintext.as_bytes(), TEST_PASSWORD, salt.as_bytes());
    PersistedAccount {
        account_id: account_id.to_string(),
        account_name: format!("{} name", account_id),
        address: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
        key_salt: BASE64.encode(salt.as_bytes()),
        encrypted_key: BASE64.encode(&ciphertext),
    }
}

pub fn account_store(ids: &[&str]) -> Arc<FileAccountStore> {
    let records = ids.iter().map(|id| persisted_account(id)).collect();
    Arc::new(FileAccountStore::from_records(records).unwrap())
}

/// How a mock session behaves when closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseBehavior {
    Succeed,
    Fail,
    /// Never returns; exercises the cleanup timeout
    Hang,
}

pub struct MockSession {
    execution_id: String,
    close_behavior: CloseBehavior,
    close_calls: Arc<AtomicUsize>,
    closed_ids: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl TradingSession for MockSession {
    async fn initialize(&self) -> Result<(), SessionError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        match self.close_behavior {
            CloseBehavior::Succeed => {
                self.closed_ids.lock().push(self.execution_id.clone());
                Ok(())
            }
            CloseBehavior::Fail => Err(SessionError("downstream settlement failed".to_string())),
            CloseBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }
}

/// Factory producing `MockSession`s and recording what it built
pub struct MockSessionFactory {
    pub close_behavior: CloseBehavior,
    pub close_calls: Arc<AtomicUsize>,
    pub closed_ids: Arc<Mutex<Vec<String>>>,
    pub seen_keys: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockSessionFactory {
    pub fn new(close_behavior: CloseBehavior) -> Self {
        Self {
            close_behavior,
            close_calls: Arc::new(AtomicUsize::new(0)),
            closed_ids: Arc::new(Mutex::new(Vec::new())),
            seen_keys: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl SessionFactory for MockSessionFactory {
    fn create_session(
        &self,
        execution_id: &str,
        _strategy_id: &str,
        _execution_type: &str,
        keys: ChainKeyMap,
    ) -> CustodyResult<Arc<dyn TradingSession>> {
        let mut chains: Vec<String> = keys.keys().cloned().collect();
        chains.sort();
        self.seen_keys.lock().push(chains);
        Ok(Arc::new(MockSession {
            execution_id: execution_id.to_string(),
            close_behavior: self.close_behavior,
            close_calls: self.close_calls.clone(),
            closed_ids: self.closed_ids.clone(),
        }))
    }
}
