use crate::error::CfResult;
use crate::transform::TransformRegistry;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Reads a log of previously recorded top sequences, one per line, best first.
///
/// Names may be separated by commas or whitespace. Lines starting with `#` and
/// blank lines are ignored. A line naming an unregistered transform is skipped.
/// Returns at most `top_n` distinct sequences as transform ids, in file order.
pub fn load_top_sequences<R: Read>(
    reader: R,
    registry: &TransformRegistry,
    top_n: usize,
) -> CfResult<Vec<Vec<u8>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut sequences: Vec<Vec<u8>> = Vec::new();
    let mut skipped = 0;

    for (row_idx, result) in rdr.records().enumerate() {
        if sequences.len() >= top_n {
            break;
        }
        let rec = result?;
        let names: Vec<&str> = rec
            .iter()
            .flat_map(|field| field.split_whitespace())
            .collect();
        if names.is_empty() {
            continue;
        }

        let ids: Option<Vec<u8>> = names.iter().map(|n| registry.id_of(n)).collect();
        match ids {
            Some(ids) => {
                if !sequences.contains(&ids) {
                    sequences.push(ids);
                }
            }
            None => {
                skipped += 1;
                warn!(
                    "Seed log row {}: unknown transform in {:?}, skipped",
                    row_idx + 1,
                    names
                );
            }
        }
    }

    debug!(
        "Seed log: {} sequences loaded, {} rows skipped",
        sequences.len(),
        skipped
    );
    Ok(sequences)
}

pub fn load_top_sequences_from_path<P: AsRef<Path>>(
    path: P,
    registry: &TransformRegistry,
    top_n: usize,
) -> CfResult<Vec<Vec<u8>>> {
    let file = File::open(path)?;
    load_top_sequences(file, registry, top_n)
}

/// Distinct permutable transform ids across the seed sequences, first seen first.
pub fn extract_transform_pool(sequences: &[Vec<u8>], registry: &TransformRegistry) -> Vec<u8> {
    let mut pool = Vec::new();
    for &id in sequences.iter().flatten() {
        let permutable = registry
            .get(id)
            .is_some_and(|t| !t.exclude_from_permutations);
        if permutable && !pool.contains(&id) {
            pool.push(id);
        }
    }
    pool
}
