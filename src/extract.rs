use std::collections::HashMap;

use kmeans_colors::get_kmeans;
use log::{debug, warn};
use palette::{IntoColor, Lab, Srgb};

use crate::buffer::PixelBuffer;
use crate::color::{color_name, hex_encode};
use crate::error::{InspectError, Result};

/// Channel width of one histogram cell.
pub const BUCKET_WIDTH: u8 = 16;
pub const DEFAULT_MAX_COLORS: usize = 8;
pub const DEFAULT_SAMPLE_STRIDE: usize = 4;
/// Pixels with alpha below this never count towards the palette.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 125;

const KMEANS_MAX_ITER: usize = 20;
const KMEANS_CONVERGE: f32 = 1e-4;

/// One entry of an extracted palette.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ColorSwatch {
    pub hex: String,
    pub population: usize,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub color: Srgb<u8>,
}

impl ColorSwatch {
    fn new(color: Srgb<u8>, population: usize) -> Self {
        Self {
            hex: hex_encode(color),
            population,
            name: color_name(color).to_string(),
            color,
        }
    }
}

/// How dominant colors are found.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaletteStrategy {
    /// Fixed-grid histogram over 16-wide channel buckets.
    #[default]
    Histogram,
    /// k-means in Lab space; centroids become the swatches.
    KMeans,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractOptions {
    pub max_colors: usize,
    /// Only every `sample_stride`-th pixel is scanned.
    pub sample_stride: usize,
    pub alpha_threshold: u8,
    pub strategy: PaletteStrategy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_colors: DEFAULT_MAX_COLORS,
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            strategy: PaletteStrategy::Histogram,
        }
    }
}

impl ExtractOptions {
    pub fn with_max_colors(mut self, max_colors: usize) -> Self {
        self.max_colors = max_colors;
        self
    }

    pub fn with_sample_stride(mut self, sample_stride: usize) -> Self {
        self.sample_stride = sample_stride;
        self
    }

    pub fn with_alpha_threshold(mut self, alpha_threshold: u8) -> Self {
        self.alpha_threshold = alpha_threshold;
        self
    }

    pub fn with_strategy(mut self, strategy: PaletteStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_colors == 0 {
            return Err(InspectError::InvalidInput("max_colors must be at least 1".into()));
        }
        if self.sample_stride == 0 {
            return Err(InspectError::InvalidInput("sample_stride must be at least 1".into()));
        }
        Ok(())
    }
}

#[inline(always)]
fn quantize(v: u8) -> u8 {
    (v / BUCKET_WIDTH) * BUCKET_WIDTH
}

/// Bucket counts in order of first discovery.
///
/// Histograms of consecutive pixel ranges, merged in order, equal the
/// histogram of a single scan over the whole range.
#[derive(Clone, Debug, Default)]
pub struct Histogram {
    slots: HashMap<[u8; 3], usize>,
    buckets: Vec<([u8; 3], usize)>,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, r: u8, g: u8, b: u8) {
        self.add_count([quantize(r), quantize(g), quantize(b)], 1);
    }

    fn add_count(&mut self, key: [u8; 3], count: usize) {
        match self.slots.get(&key) {
            Some(&i) => self.buckets[i].1 += count,
            None => {
                self.slots.insert(key, self.buckets.len());
                self.buckets.push((key, count));
            }
        }
    }

    /// Fold `other` into `self`. Buckets new to `self` keep `other`'s discovery order.
    pub fn merge(&mut self, other: Histogram) {
        for (key, count) in other.buckets {
            self.add_count(key, count);
        }
    }

    /// Number of distinct buckets seen.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total pixels counted.
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|(_, c)| c).sum()
    }

    /// Top `max_colors` buckets by count. Ties stay in discovery order.
    pub fn into_swatches(mut self, max_colors: usize) -> Vec<ColorSwatch> {
        // sort_by is stable
        self.buckets.sort_by(|a, b| b.1.cmp(&a.1));
        self.buckets
            .into_iter()
            .take(max_colors)
            .map(|([r, g, b], count)| ColorSwatch::new(Srgb::new(r, g, b), count))
            .collect()
    }
}

/// Dominant colors of `buffer`, most populous first, using the histogram strategy.
pub fn extract_palette(
    buffer: &PixelBuffer,
    max_colors: usize,
    sample_stride: usize,
) -> Result<Vec<ColorSwatch>> {
    let options = ExtractOptions::default()
        .with_max_colors(max_colors)
        .with_sample_stride(sample_stride);
    extract_palette_with(buffer, &options)
}

pub fn extract_palette_with(
    buffer: &PixelBuffer,
    options: &ExtractOptions,
) -> Result<Vec<ColorSwatch>> {
    if buffer.pixel_count() == 0 {
        return Err(InspectError::InvalidInput(format!(
            "image has no pixels ({}x{})",
            buffer.width(),
            buffer.height()
        )));
    }
    options.validate()?;

    let swatches = match options.strategy {
        PaletteStrategy::Histogram => {
            let hist = scan_histogram(buffer, options, 0..buffer.pixel_count());
            debug!(
                "histogram: {} opaque samples in {} buckets ({}x{}, stride {})",
                hist.total(),
                hist.len(),
                buffer.width(),
                buffer.height(),
                options.sample_stride
            );
            hist.into_swatches(options.max_colors)
        }
        PaletteStrategy::KMeans => kmeans_swatches(buffer, options),
    };
    Ok(swatches)
}

/// Histogram over the pixels in `range` whose scan index is a multiple of
/// `sample_stride`. The stride grid is anchored at pixel 0, not at the range
/// start, so any partition of the image samples the same pixels.
pub fn scan_histogram(
    buffer: &PixelBuffer,
    options: &ExtractOptions,
    range: std::ops::Range<usize>,
) -> Histogram {
    let stride = options.sample_stride.max(1);
    let start = range.start.next_multiple_of(stride);
    let end = range.end.min(buffer.pixel_count());
    let mut hist = Histogram::new();
    for i in (start..end).step_by(stride) {
        let [r, g, b, a] = buffer.rgba_at(i);
        if a < options.alpha_threshold {
            continue;
        }
        hist.add(r, g, b);
    }
    hist
}

fn kmeans_swatches(buffer: &PixelBuffer, options: &ExtractOptions) -> Vec<ColorSwatch> {
    let mut lab_pixels: Vec<Lab> = Vec::new();
    for i in (0..buffer.pixel_count()).step_by(options.sample_stride) {
        let [r, g, b, a] = buffer.rgba_at(i);
        if a < options.alpha_threshold {
            continue;
        }
        let srgb = Srgb::<u8>::new(r, g, b);
        lab_pixels.push(srgb.into_linear().into_color());
    }
    if lab_pixels.is_empty() {
        debug!("k-means: no opaque samples");
        return Vec::new();
    }

    // cluster indices are u8
    let k = options.max_colors.min(lab_pixels.len()).min(u8::MAX as usize);
    if k < options.max_colors {
        warn!(
            "k-means: clamped k from {} to {} ({} samples)",
            options.max_colors,
            k,
            lab_pixels.len()
        );
    }

    let kmeans = get_kmeans(k, KMEANS_MAX_ITER, KMEANS_CONVERGE, false, &lab_pixels, 0);
    let mut counts = vec![0usize; kmeans.centroids.len()];
    for &idx in &kmeans.indices {
        counts[idx as usize] += 1;
    }

    let mut clusters: Vec<(Srgb<u8>, usize)> = kmeans
        .centroids
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(&lab, count)| {
            let rgb_f32: Srgb<f32> = Srgb::from_linear(lab.into_color());
            (rgb_f32.into_format::<u8>(), count)
        })
        .collect();
    debug!("k-means: {} non-empty clusters from {} samples", clusters.len(), lab_pixels.len());

    clusters.sort_by(|a, b| b.1.cmp(&a.1));
    clusters
        .into_iter()
        .take(options.max_colors)
        .map(|(color, count)| ColorSwatch::new(color, count))
        .collect()
}
