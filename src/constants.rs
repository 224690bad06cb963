//! Global constants for the svd-demo binary and library

/// Default test image width
pub const DEFAULT_TEST_WIDTH: u32 = 256;

/// Default test image height
pub const DEFAULT_TEST_HEIGHT: u32 = 192;

/// Mode counts tried by a sweep, before capping at the image's maximum
pub const SWEEP_MODES: [usize; 9] = [1, 2, 5, 10, 20, 50, 100, 200, 500];

/// How often the CLI polls the reconstruction worker, in milliseconds
pub const WORKER_POLL_MS: u64 = 100;

/// Sweep mode counts valid for an image with `max_modes` modes.
///
/// Always ends with `max_modes` itself so the sweep includes the
/// full-rank reconstruction.
pub fn sweep_modes(max_modes: usize) -> Vec<usize> {
    let mut modes: Vec<usize> = SWEEP_MODES
        .iter()
        .copied()
        .filter(|&k| k < max_modes)
        .collect();
    if max_modes > 0 {
        modes.push(max_modes);
    }
    modes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_modes_capped() {
        assert_eq!(sweep_modes(12), vec![1, 2, 5, 10, 12]);
        assert_eq!(sweep_modes(10), vec![1, 2, 5, 10]);
        assert_eq!(sweep_modes(1), vec![1]);
        assert!(sweep_modes(0).is_empty());
    }
}
