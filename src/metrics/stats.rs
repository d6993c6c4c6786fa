//! Raw statistics over byte buffers. Each function returns the measured value;
//! turning it into a 0..100 quality score happens in the metric catalog.

#[inline(always)]
pub fn byte_histogram(data: &[u8]) -> [usize; 256] {
    let mut hist = [0usize; 256];
    for &b in data {
        hist[b as usize] += 1;
    }
    hist
}

/// Shannon entropy in bits per byte.
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let n = data.len() as f64;
    byte_histogram(data)
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum()
}

/// Highest entropy reachable by a buffer of this length.
pub fn max_entropy_for_len(len: usize) -> f64 {
    if len <= 1 {
        0.0
    } else {
        (len.min(256) as f64).log2()
    }
}

/// Pearson chi-square statistic of the byte distribution against uniform.
pub fn chi_square(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let expected = data.len() as f64 / 256.0;
    byte_histogram(data)
        .iter()
        .map(|&c| {
            let d = c as f64 - expected;
            d * d / expected
        })
        .sum()
}

pub fn count_ones(data: &[u8]) -> usize {
    data.iter().map(|b| b.count_ones() as usize).sum()
}

/// Monobit z-score: distance of the ones count from N/2 in standard deviations.
pub fn monobit_z(data: &[u8]) -> f64 {
    let bits = data.len() * 8;
    if bits == 0 {
        return f64::INFINITY;
    }
    let ones = count_ones(data) as f64;
    let half = bits as f64 / 2.0;
    (ones - half).abs() / (bits as f64 / 4.0).sqrt()
}

/// Wald-Wolfowitz runs z-score over the bit stream (MSB first).
pub fn runs_z(data: &[u8]) -> f64 {
    let total = data.len() * 8;
    if total < 2 {
        return f64::INFINITY;
    }
    let mut runs = 1usize;
    let mut prev = (data[0] >> 7) & 1;
    for (i, &byte) in data.iter().enumerate() {
        let start = if i == 0 { 1 } else { 0 };
        for bit in start..8 {
            let cur = (byte >> (7 - bit)) & 1;
            if cur != prev {
                runs += 1;
                prev = cur;
            }
        }
    }
    let n1 = count_ones(data) as f64;
    let n0 = total as f64 - n1;
    if n1 == 0.0 || n0 == 0.0 {
        return f64::INFINITY;
    }
    let n = total as f64;
    let mu = 2.0 * n1 * n0 / n + 1.0;
    let var = (mu - 1.0) * (mu - 2.0) / (n - 1.0);
    if var <= 0.0 {
        return f64::INFINITY;
    }
    (runs as f64 - mu).abs() / var.sqrt()
}

/// Pearson correlation of two equally long series; `None` when either is constant.
pub fn pearson(xs: &[u8], ys: &[u8]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = xs[..n].iter().map(|&v| v as f64).sum::<f64>() / nf;
    let mean_y = ys[..n].iter().map(|&v| v as f64).sum::<f64>() / nf;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..n {
        let dx = xs[i] as f64 - mean_x;
        let dy = ys[i] as f64 - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Lag-1 autocorrelation of the byte stream.
pub fn serial_correlation(data: &[u8]) -> Option<f64> {
    if data.len() < 3 {
        return None;
    }
    pearson(&data[..data.len() - 1], &data[1..])
}

/// Fraction of differing bits over the common prefix of two buffers.
pub fn bit_difference_ratio(a: &[u8], b: &[u8]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let diff: u32 = a[..n]
        .iter()
        .zip(&b[..n])
        .map(|(x, y)| (x ^ y).count_ones())
        .sum();
    diff as f64 / (n * 8) as f64
}

/// Share of 4-byte windows that repeat an earlier window.
pub fn repeated_window_ratio(data: &[u8]) -> f64 {
    const WINDOW: usize = 4;
    if data.len() < WINDOW + 1 {
        return 0.0;
    }
    let windows = data.len() - WINDOW + 1;
    let mut seen = std::collections::HashSet::with_capacity(windows);
    let mut repeats = 0usize;
    for w in data.windows(WINDOW) {
        if !seen.insert(w) {
            repeats += 1;
        }
    }
    repeats as f64 / windows as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_uniform_bytes_is_eight_bits() {
        let data: Vec<u8> = (0..=255u8).collect();
        assert!((shannon_entropy(&data) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn constant_buffer_has_zero_entropy_and_no_correlation() {
        let data = vec![7u8; 64];
        assert_eq!(shannon_entropy(&data), 0.0);
        assert!(serial_correlation(&data).is_none());
    }

    #[test]
    fn bit_difference_of_complement_is_one() {
        let a = vec![0x00u8; 16];
        let b = vec![0xFFu8; 16];
        assert_eq!(bit_difference_ratio(&a, &b), 1.0);
        assert_eq!(bit_difference_ratio(&a, &a), 0.0);
    }

    #[test]
    fn repeated_windows_detected() {
        let data = b"abcdabcdabcd";
        assert!(repeated_window_ratio(data) > 0.5);
        let unique: Vec<u8> = (0..64u8).collect();
        assert_eq!(repeated_window_ratio(&unique), 0.0);
    }
}
