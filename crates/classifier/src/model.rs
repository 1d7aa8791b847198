//! EfficientNet-B0 classifier with an input normalization layer.
//!
//! Parameter names follow the PyTorch state-dict layout of the trained
//! checkpoints: `normalize.*` for the input batch norm, `model.features.*`
//! for the feature extractor and `model.classifier.1.*` for the output layer.

use candle_core::{Module, ModuleT, Result, Tensor, D};
use candle_nn::{
    batch_norm, conv2d, conv2d_no_bias, linear, BatchNorm, Conv2d, Conv2dConfig, Dropout, Linear,
    VarBuilder,
};

/// Number of output logits
pub const NUM_CLASSES: usize = 3;
/// Width of the pooled feature vector
pub const FEATURE_DIM: usize = 1280;

const BN_EPS: f64 = 1e-5;
const DROPOUT: f32 = 0.2;
const STEM_CHANNELS: usize = 32;
const INPUT_CHANNELS: usize = 3;

/// One MBConv stage of the feature extractor
#[derive(Debug, Clone, Copy)]
pub struct StageConfig {
    pub expand_ratio: usize,
    pub kernel: usize,
    pub stride: usize,
    pub in_channels: usize,
    pub out_channels: usize,
    pub layers: usize,
}

impl StageConfig {
    const fn new(
        expand_ratio: usize,
        kernel: usize,
        stride: usize,
        in_channels: usize,
        out_channels: usize,
        layers: usize,
    ) -> Self {
        Self {
            expand_ratio,
            kernel,
            stride,
            in_channels,
            out_channels,
            layers,
        }
    }
}

/// EfficientNet-B0 stage table (width and depth multipliers of 1.0)
pub const B0_STAGES: [StageConfig; 7] = [
    StageConfig::new(1, 3, 1, 32, 16, 1),
    StageConfig::new(6, 3, 2, 16, 24, 2),
    StageConfig::new(6, 5, 2, 24, 40, 2),
    StageConfig::new(6, 3, 2, 40, 80, 3),
    StageConfig::new(6, 5, 1, 80, 112, 3),
    StageConfig::new(6, 5, 2, 112, 192, 4),
    StageConfig::new(6, 3, 1, 192, 320, 1),
];

/// Conv -> BatchNorm -> optional SiLU
struct ConvNormActivation {
    conv: Conv2d,
    bn: BatchNorm,
    activation: bool,
}

impl ConvNormActivation {
    #[allow(clippy::too_many_arguments)]
    fn new(
        in_channels: usize,
        out_channels: usize,
        kernel: usize,
        stride: usize,
        groups: usize,
        activation: bool,
        vb: VarBuilder,
    ) -> Result<Self> {
        let config = Conv2dConfig {
            padding: (kernel - 1) / 2,
            stride,
            groups,
            ..Default::default()
        };
        let conv = conv2d_no_bias(in_channels, out_channels, kernel, config, vb.pp(0))?;
        let bn = batch_norm(out_channels, BN_EPS, vb.pp(1))?;

        Ok(Self {
            conv,
            bn,
            activation,
        })
    }
}

impl Module for ConvNormActivation {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = xs.apply(&self.conv)?.apply_t(&self.bn, false)?;
        if self.activation {
            candle_nn::ops::silu(&xs)
        } else {
            Ok(xs)
        }
    }
}

/// Channel attention: pool -> reduce -> SiLU -> expand -> sigmoid gate
struct SqueezeExcitation {
    fc1: Conv2d,
    fc2: Conv2d,
}

impl SqueezeExcitation {
    fn new(channels: usize, squeeze_channels: usize, vb: VarBuilder) -> Result<Self> {
        let fc1 = conv2d(channels, squeeze_channels, 1, Conv2dConfig::default(), vb.pp("fc1"))?;
        let fc2 = conv2d(squeeze_channels, channels, 1, Conv2dConfig::default(), vb.pp("fc2"))?;
        Ok(Self { fc1, fc2 })
    }
}

impl Module for SqueezeExcitation {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let scale = xs.mean_keepdim(D::Minus1)?.mean_keepdim(D::Minus2)?;
        let scale = candle_nn::ops::silu(&scale.apply(&self.fc1)?)?;
        let scale = candle_nn::ops::sigmoid(&scale.apply(&self.fc2)?)?;
        xs.broadcast_mul(&scale)
    }
}

/// Inverted residual block with squeeze-excitation
struct MBConv {
    expand: Option<ConvNormActivation>,
    depthwise: ConvNormActivation,
    se: SqueezeExcitation,
    project: ConvNormActivation,
    residual: bool,
}

impl MBConv {
    fn new(
        stage: &StageConfig,
        in_channels: usize,
        stride: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        let block = vb.pp("block");
        let expanded = in_channels * stage.expand_ratio;
        let mut index = 0;

        let expand = if expanded != in_channels {
            let layer =
                ConvNormActivation::new(in_channels, expanded, 1, 1, 1, true, block.pp(index))?;
            index += 1;
            Some(layer)
        } else {
            None
        };

        let depthwise = ConvNormActivation::new(
            expanded,
            expanded,
            stage.kernel,
            stride,
            expanded,
            true,
            block.pp(index),
        )?;
        index += 1;

        let se = SqueezeExcitation::new(expanded, (in_channels / 4).max(1), block.pp(index))?;
        index += 1;

        let project = ConvNormActivation::new(
            expanded,
            stage.out_channels,
            1,
            1,
            1,
            false,
            block.pp(index),
        )?;

        Ok(Self {
            expand,
            depthwise,
            se,
            project,
            residual: stride == 1 && in_channels == stage.out_channels,
        })
    }
}

impl Module for MBConv {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut out = match &self.expand {
            Some(expand) => xs.apply(expand)?,
            None => xs.clone(),
        };
        out = out.apply(&self.depthwise)?.apply(&self.se)?.apply(&self.project)?;

        // Stochastic depth is the identity at inference time
        if self.residual {
            out + xs
        } else {
            Ok(out)
        }
    }
}

/// EfficientNet-B0 feature extractor ending in global average pooling
pub struct EfficientNetB0 {
    stem: ConvNormActivation,
    blocks: Vec<MBConv>,
    head: ConvNormActivation,
}

impl EfficientNetB0 {
    /// Build from a `features` var builder
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let stem = ConvNormActivation::new(INPUT_CHANNELS, STEM_CHANNELS, 3, 2, 1, true, vb.pp(0))?;

        let mut blocks = Vec::new();
        for (i, stage) in B0_STAGES.iter().enumerate() {
            let stage_vb = vb.pp(i + 1);
            for layer in 0..stage.layers {
                let (in_channels, stride) = if layer == 0 {
                    (stage.in_channels, stage.stride)
                } else {
                    (stage.out_channels, 1)
                };
                blocks.push(MBConv::new(stage, in_channels, stride, stage_vb.pp(layer))?);
            }
        }

        let last = B0_STAGES[B0_STAGES.len() - 1].out_channels;
        let head = ConvNormActivation::new(
            last,
            FEATURE_DIM,
            1,
            1,
            1,
            true,
            vb.pp(B0_STAGES.len() + 1),
        )?;

        Ok(Self { stem, blocks, head })
    }
}

impl Module for EfficientNetB0 {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut xs = xs.apply(&self.stem)?;
        for block in &self.blocks {
            xs = xs.apply(block)?;
        }
        xs.apply(&self.head)?.mean(D::Minus1)?.mean(D::Minus1)
    }
}

/// Input batch norm, EfficientNet-B0 features, dropout and linear head.
///
/// Forward maps a (batch, 3, height, width) image to (batch, NUM_CLASSES)
/// logits. No activation is applied to the output.
pub struct SignalClassifier {
    normalize: BatchNorm,
    features: EfficientNetB0,
    dropout: Dropout,
    classifier: Linear,
}

impl SignalClassifier {
    pub fn new(num_classes: usize, vb: VarBuilder) -> Result<Self> {
        let normalize = batch_norm(INPUT_CHANNELS, BN_EPS, vb.pp("normalize"))?;

        let model = vb.pp("model");
        let features = EfficientNetB0::new(model.pp("features"))?;
        let classifier = linear(FEATURE_DIM, num_classes, model.pp("classifier").pp(1))?;

        Ok(Self {
            normalize,
            features,
            dropout: Dropout::new(DROPOUT),
            classifier,
        })
    }
}

impl Module for SignalClassifier {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = xs.apply_t(&self.normalize, false)?;
        let pooled = xs.apply(&self.features)?;
        let pooled = self.dropout.forward_t(&pooled, false)?;
        pooled.apply(&self.classifier)
    }
}
