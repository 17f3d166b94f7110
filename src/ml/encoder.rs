// ============================================================
// Layer 5 — Convolutional Image Encoder
// ============================================================
// A small CNN shared by both architectures.
//
//   [N, 3, S, S]
//     → num_blocks × (conv 3×3 stride 2 → batch norm → ReLU)
//     → adaptive average pool to grid × grid
//   [N, C, grid, grid]     C = base_channels · 2^(num_blocks-1)
//
// The baseline pools to a 1×1 grid (one vector per image); the
// transformer keeps a 7×7 grid and treats each cell as a token.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

#[derive(Config, Debug)]
pub struct ConvEncoderConfig {
    #[config(default = 32)]
    pub base_channels: usize,
    #[config(default = 4)]
    pub num_blocks:    usize,
    #[config(default = 1)]
    pub grid:          usize,
}

impl ConvEncoderConfig {
    pub fn out_channels(&self) -> usize {
        self.base_channels << self.num_blocks.saturating_sub(1)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvEncoder<B> {
        let mut blocks  = Vec::with_capacity(self.num_blocks);
        let mut in_chan = 3;
        for i in 0..self.num_blocks {
            let out_chan = self.base_channels << i;
            let conv = Conv2dConfig::new([in_chan, out_chan], [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device);
            let norm = BatchNormConfig::new(out_chan).init(device);
            blocks.push(ConvBlock { conv, norm });
            in_chan = out_chan;
        }
        let pool = AdaptiveAvgPool2dConfig::new([self.grid, self.grid]).init();
        ConvEncoder { blocks, pool }
    }
}

#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
}

impl<B: Backend> ConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        relu(self.norm.forward(self.conv.forward(x)))
    }
}

#[derive(Module, Debug)]
pub struct ConvEncoder<B: Backend> {
    blocks: Vec<ConvBlock<B>>,
    pool:   AdaptiveAvgPool2d,
}

impl<B: Backend> ConvEncoder<B> {
    /// [N, 3, S, S] → [N, C, grid, grid]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = images;
        for block in &self.blocks {
            x = block.forward(x);
        }
        self.pool.forward(x)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_output_shape() {
        let device = Default::default();
        let cfg    = ConvEncoderConfig::new().with_base_channels(4).with_num_blocks(3).with_grid(2);
        assert_eq!(cfg.out_channels(), 16);

        let enc = cfg.init::<TestBackend>(&device);
        let out = enc.forward(Tensor::zeros([2, 3, 32, 32], &device));
        assert_eq!(out.dims(), [2, 16, 2, 2]);
    }
}
