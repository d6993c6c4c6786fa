//! Reference byte transforms used to exercise the search end to end.
//! These are toy primitives, not a cipher anyone should rely on.

use super::{
    CryptoEngine, Key, SensitivityHarness, SensitivitySamples, TransformInfo, TransformRegistry,
};
use crate::consts::CIPHERTEXT_MAGIC;
use crate::error::{CfResult, CipherForgeError};
use crate::sequence::{CandidateSequence, TransformStep};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, FromRepr};

const HEADER_FIXED_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, FromRepr)]
#[strum(serialize_all = "kebab-case")]
#[repr(u8)]
pub enum BuiltinTransform {
    XorKey = 1,
    AddKey = 2,
    SubKey = 3,
    RotlBits = 4,
    RotrBits = 5,
    Reverse = 6,
    NibbleSwap = 7,
    Sbox = 8,
    InvSbox = 9,
    ChainMix = 10,
    ChainUnmix = 11,
    MaskLowBit = 12,
}

impl BuiltinTransform {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn inverse(self) -> BuiltinTransform {
        use BuiltinTransform::*;
        match self {
            AddKey => SubKey,
            SubKey => AddKey,
            RotlBits => RotrBits,
            RotrBits => RotlBits,
            Sbox => InvSbox,
            InvSbox => Sbox,
            ChainMix => ChainUnmix,
            ChainUnmix => ChainMix,
            // Self-inverse, or (MaskLowBit) registered as such although lossy.
            other => other,
        }
    }

    fn inverse_only(self) -> bool {
        matches!(
            self,
            BuiltinTransform::SubKey
                | BuiltinTransform::RotrBits
                | BuiltinTransform::InvSbox
                | BuiltinTransform::ChainUnmix
        )
    }

    fn apply(self, data: &mut [u8], key: &Key, tweak: u8) {
        use BuiltinTransform::*;
        match self {
            XorKey => {
                for (i, b) in data.iter_mut().enumerate() {
                    *b ^= key.byte(i) ^ tweak;
                }
            }
            AddKey => {
                for (i, b) in data.iter_mut().enumerate() {
                    *b = b.wrapping_add(key.byte(i).wrapping_add(tweak));
                }
            }
            SubKey => {
                for (i, b) in data.iter_mut().enumerate() {
                    *b = b.wrapping_sub(key.byte(i).wrapping_add(tweak));
                }
            }
            RotlBits => {
                for (i, b) in data.iter_mut().enumerate() {
                    *b = b.rotate_left(rotation(key, i, tweak));
                }
            }
            RotrBits => {
                for (i, b) in data.iter_mut().enumerate() {
                    *b = b.rotate_right(rotation(key, i, tweak));
                }
            }
            Reverse => data.reverse(),
            NibbleSwap => {
                for b in data.iter_mut() {
                    *b = b.rotate_left(4);
                }
            }
            Sbox => {
                let table = substitution_table(key, tweak);
                for b in data.iter_mut() {
                    *b = table[*b as usize];
                }
            }
            InvSbox => {
                let table = substitution_table(key, tweak);
                let mut inverse = [0u8; 256];
                for (i, &v) in table.iter().enumerate() {
                    inverse[v as usize] = i as u8;
                }
                for b in data.iter_mut() {
                    *b = inverse[*b as usize];
                }
            }
            ChainMix => {
                let mut prev = key.byte(0) ^ tweak;
                for b in data.iter_mut() {
                    *b = b.wrapping_add(prev);
                    prev = *b;
                }
            }
            ChainUnmix => {
                let mut prev = key.byte(0) ^ tweak;
                for b in data.iter_mut() {
                    let c = *b;
                    *b = c.wrapping_sub(prev);
                    prev = c;
                }
            }
            MaskLowBit => {
                for b in data.iter_mut() {
                    *b &= 0xFE;
                }
            }
        }
    }
}

#[inline(always)]
fn rotation(key: &Key, i: usize, tweak: u8) -> u32 {
    ((key.byte(i) ^ tweak) % 7 + 1) as u32
}

fn substitution_table(key: &Key, tweak: u8) -> [u8; 256] {
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&key.as_bytes()[..8]);
    let seed = u64::from_le_bytes(seed_bytes) ^ (tweak as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut table: [u8; 256] = std::array::from_fn(|i| i as u8);
    rng.shuffle(&mut table);
    table
}

#[inline(always)]
fn tweak_for(global_round: u32, step_round: u8) -> u8 {
    (global_round as u8).wrapping_mul(31).wrapping_add(step_round)
}

/// Engine over [`BuiltinTransform`] with a self-describing header.
pub struct ReferenceEngine {
    registry: TransformRegistry,
}

impl Default for ReferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceEngine {
    pub fn new() -> Self {
        let mut registry = TransformRegistry::new();
        for t in BuiltinTransform::iter() {
            registry.register(
                t.id(),
                TransformInfo {
                    name: t.to_string(),
                    inverse_id: t.inverse().id(),
                    exclude_from_permutations: t.inverse_only(),
                },
            );
        }
        Self { registry }
    }

    fn resolve(&self, id: u8) -> CfResult<BuiltinTransform> {
        if self.registry.get(id).is_none() {
            return Err(CipherForgeError::Cipher(format!(
                "Unknown transform id {}",
                id
            )));
        }
        BuiltinTransform::from_repr(id)
            .ok_or_else(|| CipherForgeError::Cipher(format!("Unknown transform id {}", id)))
    }

    fn parse_header(&self, ciphertext: &[u8]) -> CfResult<(u32, Vec<TransformStep>, usize)> {
        if ciphertext.len() < HEADER_FIXED_LEN || ciphertext[0] != CIPHERTEXT_MAGIC {
            return Err(CipherForgeError::Cipher(
                "Ciphertext header missing or corrupt".to_string(),
            ));
        }
        let global_rounds =
            u32::from_le_bytes([ciphertext[1], ciphertext[2], ciphertext[3], ciphertext[4]]);
        let count = ciphertext[5] as usize;
        let header_len = HEADER_FIXED_LEN + count * 2;
        if ciphertext.len() < header_len {
            return Err(CipherForgeError::Cipher(format!(
                "Header declares {} steps but ciphertext is {} bytes",
                count,
                ciphertext.len()
            )));
        }
        let steps = ciphertext[HEADER_FIXED_LEN..header_len]
            .chunks_exact(2)
            .map(|pair| TransformStep::new(pair[0], pair[1]))
            .collect();
        Ok((global_rounds, steps, header_len))
    }
}

impl CryptoEngine for ReferenceEngine {
    fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    fn encrypt(
        &self,
        steps: &[TransformStep],
        global_rounds: u32,
        key: &Key,
        input: &[u8],
    ) -> CfResult<Vec<u8>> {
        if steps.len() > u8::MAX as usize {
            return Err(CipherForgeError::Cipher(format!(
                "Sequence of {} steps cannot be encoded",
                steps.len()
            )));
        }
        let transforms = steps
            .iter()
            .map(|s| self.resolve(s.id))
            .collect::<CfResult<Vec<_>>>()?;

        let mut payload = input.to_vec();
        for g in 0..global_rounds {
            for (step, t) in steps.iter().zip(&transforms) {
                for r in 0..step.rounds_per_step {
                    t.apply(&mut payload, key, tweak_for(g, r));
                }
            }
        }

        let mut out = Vec::with_capacity(HEADER_FIXED_LEN + steps.len() * 2 + payload.len());
        out.push(CIPHERTEXT_MAGIC);
        out.extend_from_slice(&global_rounds.to_le_bytes());
        out.push(steps.len() as u8);
        for s in steps {
            out.push(s.id);
            out.push(s.rounds_per_step);
        }
        out.extend_from_slice(&payload);
        Ok(out)
    }

    fn decrypt(&self, key: &Key, ciphertext: &[u8]) -> CfResult<Vec<u8>> {
        let (global_rounds, steps, header_len) = self.parse_header(ciphertext)?;
        let inverses = steps
            .iter()
            .map(|s| {
                let inverse_id = self.registry.inverse_of(s.id).ok_or_else(|| {
                    CipherForgeError::Cipher(format!("Unknown transform id {}", s.id))
                })?;
                self.resolve(inverse_id)
            })
            .collect::<CfResult<Vec<_>>>()?;

        let mut data = ciphertext[header_len..].to_vec();
        for g in (0..global_rounds).rev() {
            for (step, t) in steps.iter().zip(&inverses).rev() {
                for r in (0..step.rounds_per_step).rev() {
                    t.apply(&mut data, key, tweak_for(g, r));
                }
            }
        }
        Ok(data)
    }

    fn payload_only<'a>(&self, ciphertext: &'a [u8]) -> &'a [u8] {
        match self.parse_header(ciphertext) {
            Ok((_, _, header_len)) => &ciphertext[header_len..],
            Err(_) => ciphertext,
        }
    }
}

/// Flips bit 0 of the first input byte and bit 0 of the first key byte.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitFlipHarness;

impl SensitivityHarness for BitFlipHarness {
    fn derive(
        &self,
        engine: &dyn CryptoEngine,
        sequence: &CandidateSequence,
        input: &[u8],
        key: &Key,
        _profile: &str,
    ) -> CfResult<SensitivitySamples> {
        let mut flipped_input = input.to_vec();
        if let Some(first) = flipped_input.first_mut() {
            *first ^= 1;
        }
        let avalanche_ct =
            engine.encrypt(&sequence.steps, sequence.global_rounds, key, &flipped_input)?;

        let flipped_key = key.with_flipped_bit(0, 0);
        let key_ct = engine.encrypt(&sequence.steps, sequence.global_rounds, &flipped_key, input)?;

        Ok(SensitivitySamples {
            avalanche: engine.payload_only(&avalanche_ct).to_vec(),
            key_dependency: engine.payload_only(&key_ct).to_vec(),
        })
    }
}
