pub mod bench;
pub mod best_fit;
pub mod metrics;
pub mod rounds;
pub mod search;
pub mod step_rounds;
pub mod tune;

use cipherforge::error::{CfResult, CipherForgeError};
use cipherforge::sequence::{CandidateSequence, TransformStep};
use cipherforge::transform::TransformRegistry;

/// Comma or whitespace separated transform names -> ids.
pub fn parse_transforms(registry: &TransformRegistry, list: &str) -> CfResult<Vec<u8>> {
    list.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|name| {
            registry.id_of(name).ok_or_else(|| {
                CipherForgeError::Validation(format!("Unknown transform '{}'", name))
            })
        })
        .collect()
}

pub fn parse_rounds(list: &str) -> CfResult<Vec<u8>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .ok()
                .filter(|&r| r > 0)
                .ok_or_else(|| CipherForgeError::Validation(format!("Invalid round count '{}'", s)))
        })
        .collect()
}

/// Builds a sequence from names, each step with `rounds_per_step`.
pub fn parse_sequence(
    registry: &TransformRegistry,
    list: &str,
    rounds_per_step: u8,
    global_rounds: u32,
) -> CfResult<CandidateSequence> {
    let ids = parse_transforms(registry, list)?;
    if ids.is_empty() {
        return Err(CipherForgeError::Validation(
            "Sequence needs at least one transform".to_string(),
        ));
    }
    let steps = ids
        .into_iter()
        .map(|id| TransformStep::new(id, rounds_per_step))
        .collect();
    Ok(CandidateSequence::new(steps, global_rounds))
}
