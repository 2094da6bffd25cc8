//! Block convolution
//!
//! [`BlockConvolver`] is the contract a reverb shell feeds: fixed-size blocks
//! of host-rate samples in, the same number of host-rate samples out. Engines
//! that run at an internal rate do their own resampling behind it.
//!
//! [`FirConvolver`] is the plain direct-form engine: a static kernel applied
//! at the host rate with a ring of past input. O(block × kernel) per block, so
//! it suits short kernels and tests.

use bl_core::{BlError, BlResult};

/// Default block length handed to a convolver
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Longest kernel a [`FirConvolver`] accepts
pub const MAX_KERNEL_LEN: usize = 1 << 16;

/// Fixed-block convolution engine driven from the audio thread
pub trait BlockConvolver: Send {
    /// Samples per block, for both input and output
    fn block_size(&self) -> usize;

    /// Host rate changed; engines with an internal rate retune their resamplers
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Convolve one block. Both slices are `block_size()` long.
    fn process_block(&mut self, input: &[f32], output: &mut [f32]);

    /// Clear all convolution history
    fn reset(&mut self);
}

/// Direct-form FIR convolution with a static kernel
#[derive(Debug, Clone)]
pub struct FirConvolver {
    kernel: Vec<f32>,
    /// Past inputs, newest at `pos`
    history: Vec<f32>,
    pos: usize,
    block_size: usize,
    sample_rate: f32,
}

impl FirConvolver {
    pub fn new(kernel: &[f32], block_size: usize) -> BlResult<Self> {
        if block_size == 0 {
            return Err(BlError::InvalidParam("block size must be non-zero".into()));
        }
        let mut convolver = Self {
            kernel: Vec::new(),
            history: Vec::new(),
            pos: 0,
            block_size,
            sample_rate: 48000.0,
        };
        convolver.set_kernel(kernel)?;
        Ok(convolver)
    }

    /// Replace the kernel and clear history. Allocates; call off the audio path.
    pub fn set_kernel(&mut self, kernel: &[f32]) -> BlResult<()> {
        if kernel.is_empty() || kernel.len() > MAX_KERNEL_LEN {
            return Err(BlError::InvalidParam(format!(
                "kernel length {} outside 1..={MAX_KERNEL_LEN}",
                kernel.len()
            )));
        }
        if kernel.iter().any(|k| !k.is_finite()) {
            return Err(BlError::InvalidParam("kernel contains non-finite taps".into()));
        }
        self.kernel = kernel.to_vec();
        self.history = vec![0.0; kernel.len()];
        self.pos = 0;
        log::debug!("FIR kernel loaded: {} taps", kernel.len());
        Ok(())
    }

    pub fn kernel_len(&self) -> usize {
        self.kernel.len()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    #[inline]
    fn process_sample(&mut self, x: f32) -> f32 {
        let len = self.history.len();
        self.pos = if self.pos == 0 { len - 1 } else { self.pos - 1 };
        self.history[self.pos] = x;

        // history[pos + k] (wrapped) holds x[n - k]
        let (tail, head) = self.history.split_at(self.pos);
        let (k_head, k_tail) = self.kernel.split_at(head.len());
        let mut acc = 0.0;
        for (h, k) in head.iter().zip(k_head) {
            acc += h * k;
        }
        for (h, k) in tail.iter().zip(k_tail) {
            acc += h * k;
        }
        acc
    }
}

impl BlockConvolver for FirConvolver {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        // Kernel runs at whatever rate the host delivers
        self.sample_rate = sample_rate;
    }

    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        for (x, y) in input.iter().zip(output.iter_mut()) {
            *y = self.process_sample(*x);
        }
        // Short input: the rest of the block sees silence
        if input.len() < output.len() {
            for y in output[input.len()..].iter_mut() {
                *y = self.process_sample(0.0);
            }
        }
    }

    fn reset(&mut self) {
        self.history.fill(0.0);
        self.pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_response_reproduces_kernel() {
        let kernel = [0.5, -0.25, 0.125, 1.0];
        let mut conv = FirConvolver::new(&kernel, 8).unwrap();
        let mut input = [0.0; 8];
        input[0] = 1.0;
        let mut output = [0.0; 8];
        conv.process_block(&input, &mut output);
        assert_eq!(&output[..4], &kernel);
        assert_eq!(&output[4..], &[0.0; 4]);
    }

    #[test]
    fn test_history_carries_across_blocks() {
        let kernel = [1.0, 1.0, 1.0];
        let mut conv = FirConvolver::new(&kernel, 2).unwrap();
        let mut out = [0.0; 2];
        conv.process_block(&[1.0, 0.0], &mut out);
        assert_eq!(out, [1.0, 1.0]);
        conv.process_block(&[0.0, 0.0], &mut out);
        assert_eq!(out, [1.0, 0.0]);
    }

    #[test]
    fn test_matches_naive_convolution() {
        let kernel: Vec<f32> = (0..37).map(|i| ((i as f32) * 0.3).cos() / (i + 1) as f32).collect();
        let input: Vec<f32> = (0..96).map(|i| ((i as f32) * 0.11).sin()).collect();
        let mut conv = FirConvolver::new(&kernel, 32).unwrap();

        let mut output = vec![0.0; 96];
        for (inp, out) in input.chunks(32).zip(output.chunks_mut(32)) {
            conv.process_block(inp, out);
        }

        for n in 0..input.len() {
            let expected: f32 = (0..kernel.len().min(n + 1)).map(|k| kernel[k] * input[n - k]).sum();
            assert!((output[n] - expected).abs() < 1e-5, "n = {n}");
        }
    }

    #[test]
    fn test_rejects_bad_kernels() {
        assert!(FirConvolver::new(&[], 16).is_err());
        assert!(FirConvolver::new(&[f32::NAN], 16).is_err());
        assert!(FirConvolver::new(&[1.0], 0).is_err());
    }

    #[test]
    fn test_reset_clears_tail() {
        let mut conv = FirConvolver::new(&[1.0, 1.0], 1).unwrap();
        let mut out = [0.0];
        conv.process_block(&[1.0], &mut out);
        conv.reset();
        conv.process_block(&[0.0], &mut out);
        assert_eq!(out, [0.0]);
    }
}
