use std::borrow::Cow;

use image::{self, GenericImageView, RgbaImage, imageops::FilterType};
use js_sys::{Array, Object, Reflect};
use log::debug;
use wasm_bindgen::prelude::*;

pub mod buffer;
pub mod color;
pub mod error;
pub mod extract;
pub mod sample;
pub mod state;

pub use buffer::PixelBuffer;
pub use color::{ColorFamily, color_name, hex_encode, parse_hex, rgb_string};
pub use error::InspectError;
pub use extract::{
    ColorSwatch, ExtractOptions, Histogram, PaletteStrategy, extract_palette, extract_palette_with,
};
pub use sample::{
    DisplayTransform, SampledColor, map_to_buffer_coordinates, sample_at, sample_pixel,
};
pub use state::{InspectorState, MAX_PICKED};

/// Longest side an image is shrunk to before palette extraction.
pub const DEFAULT_PREVIEW_SIDE: u32 = 800;

// ------------------------------------------------------------
// Decoding and preview helpers
// ------------------------------------------------------------

/// Decode any format `image` understands into natural-resolution RGBA.
pub fn decode_rgba(input: &[u8]) -> error::Result<RgbaImage> {
    let img = image::load_from_memory(input)?;
    let (w, h) = img.dimensions();
    debug!("decoded {w}x{h} image ({} bytes)", input.len());
    Ok(img.to_rgba8())
}

/// Shrink `img` so its longest side is at most `max_side`, keeping the aspect
/// ratio. Images already small enough are borrowed as-is.
///
/// Only palette extraction works on the shrunk copy; sampling always reads the
/// natural-resolution pixels.
pub fn downscale_for_palette(img: &RgbaImage, max_side: u32) -> Cow<'_, RgbaImage> {
    let (orig_w, orig_h) = img.dimensions();
    let longest = orig_w.max(orig_h);
    if max_side == 0 || longest <= max_side {
        return Cow::Borrowed(img);
    }
    let ratio = max_side as f32 / longest as f32;
    let w = ((orig_w as f32) * ratio).round().max(1.0) as u32;
    let h = ((orig_h as f32) * ratio).round().max(1.0) as u32;
    debug!("downscaling {orig_w}x{orig_h} to {w}x{h} for palette extraction");
    Cow::Owned(image::imageops::resize(img, w, h, FilterType::Triangle))
}

// ------------------------------------------------------------
// Browser surface
// ------------------------------------------------------------

fn js_err(e: InspectError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn swatch_to_js(swatch: &ColorSwatch) -> Result<Object, JsValue> {
    let obj = Object::new();
    Reflect::set(&obj, &JsValue::from_str("hex"), &JsValue::from_str(&swatch.hex))?;
    Reflect::set(
        &obj,
        &JsValue::from_str("population"),
        &JsValue::from_f64(swatch.population as f64),
    )?;
    Reflect::set(&obj, &JsValue::from_str("name"), &JsValue::from_str(&swatch.name))?;
    Ok(obj)
}

fn sampled_to_js(color: &SampledColor) -> Result<Object, JsValue> {
    let obj = Object::new();
    Reflect::set(&obj, &JsValue::from_str("hex"), &JsValue::from_str(&color.hex))?;
    Reflect::set(&obj, &JsValue::from_str("rgb"), &JsValue::from_str(&color.rgb))?;
    Reflect::set(&obj, &JsValue::from_str("name"), &JsValue::from_str(&color.name))?;
    Ok(obj)
}

/// One loaded image plus the palette/hover/picked state that goes with it.
///
/// Pointer coordinates and the displayed box are passed on every call, in the
/// same space (e.g. `clientX`/`clientY` and `getBoundingClientRect()`).
#[wasm_bindgen]
pub struct ColorInspector {
    image: RgbaImage,
    state: InspectorState,
}

impl ColorInspector {
    fn buffer(&self) -> PixelBuffer<'_> {
        PixelBuffer::from_image(&self.image)
    }

    fn sample_pointer(
        &self,
        pointer_x: f64,
        pointer_y: f64,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    ) -> error::Result<SampledColor> {
        let (natural_w, natural_h) = self.image.dimensions();
        let transform = DisplayTransform::new(natural_w, natural_h, left, top, width, height)?;
        sample_at(&self.buffer(), pointer_x, pointer_y, &transform)
    }

    /// Hand a successful sample to `update`. Pointer-outside-image yields
    /// `Ok(None)` and leaves the state alone.
    fn record(
        &mut self,
        sample: error::Result<SampledColor>,
        update: impl FnOnce(&mut InspectorState, SampledColor),
    ) -> error::Result<Option<SampledColor>> {
        match sample {
            Ok(color) => {
                update(&mut self.state, color.clone());
                Ok(Some(color))
            }
            Err(e) if e.is_out_of_bounds() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn sampled_or_null(color: Option<SampledColor>) -> Result<JsValue, JsValue> {
    match color {
        Some(color) => Ok(sampled_to_js(&color)?.into()),
        None => Ok(JsValue::NULL),
    }
}

#[wasm_bindgen]
impl ColorInspector {
    /// Decode an encoded image (PNG, JPEG, WebP, ...).
    #[wasm_bindgen(constructor)]
    pub fn new(input: Vec<u8>) -> Result<ColorInspector, JsValue> {
        let image = decode_rgba(&input).map_err(js_err)?;
        Ok(Self {
            image,
            state: InspectorState::new(),
        })
    }

    /// Wrap pixels already decoded by the browser, e.g. `ImageData.data`.
    #[wasm_bindgen(js_name = fromRgba)]
    pub fn from_rgba(
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> Result<ColorInspector, JsValue> {
        PixelBuffer::new(width, height, &data).map_err(js_err)?;
        let image = RgbaImage::from_raw(width, height, data)
            .ok_or_else(|| JsValue::from_str("Failed to build image buffer"))?;
        Ok(Self {
            image,
            state: InspectorState::new(),
        })
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Compute and store the palette; returns `[{hex, population, name}]`.
    #[wasm_bindgen(js_name = extractPalette)]
    pub fn extract_palette(
        &mut self,
        max_colors: usize,
        sample_stride: usize,
        use_kmeans: bool,
    ) -> Result<Array, JsValue> {
        let options = ExtractOptions::default()
            .with_max_colors(max_colors)
            .with_sample_stride(sample_stride)
            .with_strategy(if use_kmeans {
                PaletteStrategy::KMeans
            } else {
                PaletteStrategy::Histogram
            });
        let preview = downscale_for_palette(&self.image, DEFAULT_PREVIEW_SIDE);
        let swatches =
            extract_palette_with(&PixelBuffer::from_image(&preview), &options).map_err(js_err)?;

        let out = Array::new();
        for swatch in &swatches {
            let obj: JsValue = swatch_to_js(swatch)?.into();
            out.push(&obj);
        }
        self.state.set_palette(swatches);
        Ok(out)
    }

    /// Sample under the pointer and make it the hover color.
    /// Returns `null` when the pointer is outside the image.
    pub fn hover(
        &mut self,
        pointer_x: f64,
        pointer_y: f64,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    ) -> Result<JsValue, JsValue> {
        let sample = self.sample_pointer(pointer_x, pointer_y, left, top, width, height);
        let recorded = self
            .record(sample, |state, color| {
                state.hover(Ok(color));
            })
            .map_err(js_err)?;
        sampled_or_null(recorded)
    }

    /// Sample under the pointer and add it to the picked list.
    /// Returns `null` when the pointer is outside the image.
    pub fn pick(
        &mut self,
        pointer_x: f64,
        pointer_y: f64,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    ) -> Result<JsValue, JsValue> {
        let sample = self.sample_pointer(pointer_x, pointer_y, left, top, width, height);
        let recorded = self
            .record(sample, |state, color| {
                state.pick(Ok(color));
            })
            .map_err(js_err)?;
        sampled_or_null(recorded)
    }

    /// Add a color reported by the system eyedropper (`sRGBHex`).
    #[wasm_bindgen(js_name = pickHex)]
    pub fn pick_hex(&mut self, hex: &str) -> Result<Object, JsValue> {
        let color = SampledColor::from_hex(hex).map_err(js_err)?;
        let obj = sampled_to_js(&color)?;
        self.state.pick(Ok(color));
        Ok(obj)
    }

    /// Picked colors, newest first.
    pub fn picked(&self) -> Result<Array, JsValue> {
        let out = Array::new();
        for color in self.state.picked() {
            let obj: JsValue = sampled_to_js(color)?.into();
            out.push(&obj);
        }
        Ok(out)
    }

    #[wasm_bindgen(js_name = hoverColor)]
    pub fn hover_color(&self) -> Result<JsValue, JsValue> {
        sampled_or_null(self.state.hover_color().cloned())
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }
}

/// Family label for a `#RRGGBB` string.
#[wasm_bindgen(js_name = colorName)]
pub fn color_name_js(hex: &str) -> Result<String, JsValue> {
    let c = parse_hex(hex).map_err(js_err)?;
    Ok(color_name(c).to_string())
}

// ------------------------------------------------------------
// Native helpers
// ------------------------------------------------------------

/// Decode `input`, optionally shrink it, and extract its palette.
#[cfg(not(target_arch = "wasm32"))]
pub fn extract_palette_bytes(
    input: &[u8],
    options: &ExtractOptions,
    downscale: Option<u32>,
) -> error::Result<Vec<ColorSwatch>> {
    let img = decode_rgba(input)?;
    let working = match downscale {
        Some(side) => downscale_for_palette(&img, side),
        None => Cow::Borrowed(&img),
    };
    let buffer = PixelBuffer::from_image(&working);
    extract_palette_with(&buffer, options)
}

/// Decode `input` and read the pixel at natural-resolution `(x, y)`.
#[cfg(not(target_arch = "wasm32"))]
pub fn sample_bytes(input: &[u8], x: i64, y: i64) -> error::Result<SampledColor> {
    let img = decode_rgba(input)?;
    let buffer = PixelBuffer::from_image(&img);
    sample_pixel(&buffer, x, y)
}
