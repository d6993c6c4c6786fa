/// Pool is trimmed back to its target once it grows past this multiple of it.
pub const POOL_TRIM_FACTOR: usize = 4;

/// Longest sequence the mini search will build.
pub const MINI_SEARCH_MAX_LEN: usize = 4;

/// Default number of consecutive rejected weight variations before tuning stops.
pub const DEFAULT_TUNING_PATIENCE: usize = 5;

/// Default absolute floor no tuned weight may drop below.
pub const DEFAULT_WEIGHT_FLOOR: f64 = 0.005;

/// Maximum relative drop of any metric average tolerated by the stability check.
pub const DEFAULT_STABILITY_TOLERANCE: f64 = 0.05;

/// Tolerance used when checking that a weight vector sums to 1.0.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-9;

/// Upper bound of every metric quality score.
pub const MAX_QUALITY: f64 = 100.0;

/// Scale applied to the weighted sum when it only breaks pass-ratio ties.
/// Keeps the secondary signal strictly below 1.0.
pub const PRACTICAL_TIEBREAK_SCALE: f64 = 0.0099;

/// Leading byte of every ciphertext produced by the reference engine.
pub const CIPHERTEXT_MAGIC: u8 = 0xCF;

/// Default password used when none is configured.
pub const DEFAULT_PASSWORD: &str = "cipherforge";

/// Built-in sample input used by the CLI when no input file is given.
pub const DEFAULT_SAMPLE_INPUT: &[u8] =
    b"The quick brown fox jumps over the lazy dog. 0123456789 \
      Pack my box with five dozen liquor jugs! ABCDEFGHIJKLMNOPQRSTUVWXYZ \
      abcdefghijklmnopqrstuvwxyz ~!@#$%^&*()_+ The five boxing wizards jump quickly.";
