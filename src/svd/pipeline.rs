//! End-to-end decomposition and reconstruction of RGB images.
//!
//! Loading an image extracts and factors the three color channels once;
//! every mode count change afterwards only truncates, reconstructs and
//! combines. Channels are independent and, when enabled, run on their own
//! scoped threads with the final combine as the join point.

use std::thread;

use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use web_time::Instant;

use super::cancel::CancelToken;
use super::combine::combine_channels;
use super::engine::{Factorization, SvdEngine};
use super::extract::extract_channel;
use super::reconstruct::reconstruct_channel;
use super::stats::CompressionStats;
use crate::data::Channel;
use crate::error::{Result, SvdError};

/// How out-of-range mode counts are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModePolicy {
    /// Fail with `ModeCountOutOfRange`
    #[default]
    Reject,
    /// Clamp into `[1, max]`
    Clamp,
}

impl ModePolicy {
    /// Resolve a requested mode count against `max` modes.
    pub fn resolve(self, requested: usize, max: usize) -> Result<usize> {
        if max == 0 {
            return Err(SvdError::EmptyImage);
        }
        if (1..=max).contains(&requested) {
            return Ok(requested);
        }
        match self {
            ModePolicy::Reject => Err(SvdError::mode_out_of_range(requested, max)),
            ModePolicy::Clamp => {
                let clamped = requested.clamp(1, max);
                log::warn!(
                    "Mode count {} out of range, clamped to {} (max {})",
                    requested,
                    clamped,
                    max
                );
                Ok(clamped)
            }
        }
    }
}

/// Pipeline behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Process red, green and blue on separate threads
    pub parallel_channels: bool,
    /// Out-of-range mode count handling
    pub mode_policy: ModePolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            parallel_channels: true,
            mode_policy: ModePolicy::Reject,
        }
    }
}

/// Run `work` for each color channel, returning results in RGB order.
fn for_each_channel<T, F>(parallel: bool, work: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(Channel) -> Result<T> + Sync,
{
    if !parallel {
        return Channel::COLORS.iter().map(|&channel| work(channel)).collect();
    }

    thread::scope(|scope| {
        let work = &work;
        let mut handles = Vec::with_capacity(Channel::COLORS.len());
        for channel in Channel::COLORS {
            let handle = thread::Builder::new()
                .name(format!("svd-{}", channel))
                .spawn_scoped(scope, move || work(channel))?;
            handles.push((channel, handle));
        }

        // Join every handle before reporting so no thread outlives an error.
        let joined: Vec<_> = handles
            .into_iter()
            .map(|(channel, handle)| (channel, handle.join()))
            .collect();

        joined
            .into_iter()
            .map(|(channel, result)| {
                result.unwrap_or_else(|_| {
                    Err(SvdError::decomposition(format!(
                        "{} channel worker panicked",
                        channel
                    )))
                })
            })
            .collect()
    })
}

/// Cached factorization of one color channel.
#[derive(Debug, Clone)]
pub struct ChannelDecomposition {
    /// Which channel this is
    pub channel: Channel,
    /// Thin SVD of the channel matrix
    pub factorization: Factorization,
}

/// Result of reconstructing an image at a given mode count.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    /// Combined RGB approximation
    pub image: RgbImage,
    /// Reconstructed red, green and blue channels
    pub channels: Vec<GrayImage>,
    /// Mode count actually used (after policy resolution)
    pub modes: usize,
    /// Fraction of each channel's energy kept by `modes` modes, in RGB order
    pub energy: Vec<f64>,
}

impl Reconstruction {
    /// The reconstructed single-channel image for `channel`.
    pub fn channel(&self, channel: Channel) -> Option<&GrayImage> {
        self.channels.get(channel.index()?)
    }

    /// Storage estimates for this reconstruction.
    pub fn stats(&self) -> CompressionStats {
        CompressionStats::new(self.image.width(), self.image.height(), self.modes)
    }
}

/// An RGB image with all three channels factored and cached.
#[derive(Debug, Clone)]
pub struct DecomposedImage {
    width: u32,
    height: u32,
    options: PipelineOptions,
    channels: Vec<ChannelDecomposition>,
}

impl DecomposedImage {
    /// Extract and factor every color channel of `image`.
    pub fn decompose(
        image: &RgbImage,
        engine: &dyn SvdEngine,
        options: PipelineOptions,
        cancel: &CancelToken,
    ) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(SvdError::EmptyImage);
        }

        log::info!(
            "Decomposing {}x{} image with {} engine ({})",
            width,
            height,
            engine.id(),
            if options.parallel_channels {
                "parallel"
            } else {
                "sequential"
            }
        );
        let start = Instant::now();

        let channels = for_each_channel(options.parallel_channels, |channel| {
            cancel.check()?;
            let matrix = extract_channel(image, channel)?;
            cancel.check()?;
            let channel_start = Instant::now();
            let factorization = engine.decompose(&matrix)?;
            log::debug!(
                "{} channel SVD took {:.1} ms",
                channel,
                channel_start.elapsed().as_secs_f64() * 1000.0
            );
            Ok(ChannelDecomposition {
                channel,
                factorization,
            })
        })?;

        log::debug!(
            "Decomposition complete in {:.1} ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Self {
            width,
            height,
            options,
            channels,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Largest valid mode count, `min(width, height)`.
    pub fn max_modes(&self) -> usize {
        self.width.min(self.height) as usize
    }

    /// Options this image was decomposed with.
    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Cached factorization of `channel`.
    pub fn channel(&self, channel: Channel) -> Option<&ChannelDecomposition> {
        self.channels.get(channel.index()?)
    }

    /// Reconstruct the image from its `modes` largest singular values.
    pub fn reconstruct(&self, modes: usize, cancel: &CancelToken) -> Result<Reconstruction> {
        let modes = self.options.mode_policy.resolve(modes, self.max_modes())?;
        let start = Instant::now();

        let channels = for_each_channel(self.options.parallel_channels, |channel| {
            cancel.check()?;
            let decomposition = self
                .channel(channel)
                .ok_or_else(|| SvdError::decomposition(format!("missing {} channel", channel)))?;
            reconstruct_channel(&decomposition.factorization, modes)
        })?;

        cancel.check()?;
        let image = combine_channels(&channels[0], &channels[1], &channels[2])?;
        let energy = self
            .channels
            .iter()
            .map(|c| c.factorization.energy_fraction(modes))
            .collect();

        log::debug!(
            "Reconstructed {}x{} image with {} modes in {:.1} ms",
            self.width,
            self.height,
            modes,
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Reconstruction {
            image,
            channels,
            modes,
            energy,
        })
    }
}

/// Decompose `image` and reconstruct it with `modes` modes in one call.
pub fn compress_image(
    image: &RgbImage,
    modes: usize,
    engine: &dyn SvdEngine,
    options: PipelineOptions,
) -> Result<Reconstruction> {
    let cancel = CancelToken::never();
    let decomposed = DecomposedImage::decompose(image, engine, options, &cancel)?;
    decomposed.reconstruct(modes, &cancel)
}
