//! Collaborator seams: the transform registry, the encrypt/decrypt engine and the
//! sensitivity harness. The search layer only ever talks to these traits.

pub mod builtin;

use crate::error::CfResult;
use crate::sequence::{CandidateSequence, TransformStep};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformInfo {
    pub name: String,
    pub inverse_id: u8,
    /// Inverse-only transforms are applied by decryption, never searched directly.
    pub exclude_from_permutations: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    entries: BTreeMap<u8, TransformInfo>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: u8, info: TransformInfo) {
        self.entries.insert(id, info);
    }

    pub fn get(&self, id: u8) -> Option<&TransformInfo> {
        self.entries.get(&id)
    }

    pub fn inverse_of(&self, id: u8) -> Option<u8> {
        self.entries.get(&id).map(|t| t.inverse_id)
    }

    pub fn name_of(&self, id: u8) -> String {
        match self.entries.get(&id) {
            Some(t) => t.name.clone(),
            None => format!("#{}", id),
        }
    }

    /// Case-insensitive lookup by transform name.
    pub fn id_of(&self, name: &str) -> Option<u8> {
        let needle = name.trim();
        self.entries
            .iter()
            .find(|(_, t)| t.name.eq_ignore_ascii_case(needle))
            .map(|(&id, _)| id)
    }

    /// Ids eligible for sequence search, in ascending id order.
    pub fn permutable_ids(&self) -> Vec<u8> {
        self.entries
            .iter()
            .filter(|(_, t)| !t.exclude_from_permutations)
            .map(|(&id, _)| id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u8, &TransformInfo)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 256-bit key material derived from a password.
#[derive(Clone, PartialEq, Eq)]
pub struct Key([u8; 32]);

impl Key {
    pub fn from_password(password: &str) -> Self {
        let digest = Sha256::digest(password.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Key(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Key(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[inline(always)]
    pub fn byte(&self, i: usize) -> u8 {
        self.0[i % 32]
    }

    /// Copy of this key with a single bit inverted.
    pub fn with_flipped_bit(&self, byte: usize, bit: u8) -> Key {
        let mut bytes = self.0;
        bytes[byte % 32] ^= 1 << (bit % 8);
        Key(bytes)
    }

    /// Short hex identifier safe to log.
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key({}..)", self.fingerprint())
    }
}

pub trait CryptoEngine: Send + Sync {
    fn registry(&self) -> &TransformRegistry;

    /// Applies `steps` `global_rounds` times and returns header + payload.
    /// Must never mutate `input`.
    fn encrypt(
        &self,
        steps: &[TransformStep],
        global_rounds: u32,
        key: &Key,
        input: &[u8],
    ) -> CfResult<Vec<u8>>;

    fn decrypt(&self, key: &Key, ciphertext: &[u8]) -> CfResult<Vec<u8>>;

    /// Strips header/metadata, leaving only the transformed bytes.
    fn payload_only<'a>(&self, ciphertext: &'a [u8]) -> &'a [u8];
}

/// Payloads re-encrypted after a single-bit perturbation.
#[derive(Debug, Clone, Default)]
pub struct SensitivitySamples {
    pub avalanche: Vec<u8>,
    pub key_dependency: Vec<u8>,
}

pub trait SensitivityHarness: Send + Sync {
    fn derive(
        &self,
        engine: &dyn CryptoEngine,
        sequence: &CandidateSequence,
        input: &[u8],
        key: &Key,
        profile: &str,
    ) -> CfResult<SensitivitySamples>;
}
