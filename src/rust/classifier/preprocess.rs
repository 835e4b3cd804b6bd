use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageError, ImageReader, Limits};
use ndarray::Array4;

use super::error::ClassifierError;

/// Side length of the square input the model expects.
pub const INPUT_SIZE: u32 = 224;

/// Number of color channels in the model input.
pub const CHANNELS: usize = 3;

const MAX_DECODED_DIMENSION: u32 = 16_384;
const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

/// Turns encoded image bytes into the model's input tensor.
///
/// The output is NHWC, `[1, height, width, 3]`, with every element scaled
/// into `[0.0, 1.0]`. Preprocessing is a pure function of the input bytes.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    width: u32,
    height: u32,
    filter: FilterType,
    max_dimension: u32,
    max_alloc: u64,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self {
            width: INPUT_SIZE,
            height: INPUT_SIZE,
            filter: FilterType::CatmullRom,
            max_dimension: MAX_DECODED_DIMENSION,
            max_alloc: MAX_DECODE_ALLOC,
        }
    }
}

impl ImagePreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target size. Only useful for models with a non-default input.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Bounds the decoder so oversized payloads fail instead of exhausting memory.
    pub fn with_decode_limits(mut self, max_dimension: u32, max_alloc: u64) -> Self {
        self.max_dimension = max_dimension;
        self.max_alloc = max_alloc;
        self
    }

    /// The shape of every tensor this preprocessor produces.
    pub fn output_shape(&self) -> [usize; 4] {
        [1, self.height as usize, self.width as usize, CHANNELS]
    }

    /// Decodes, converts to RGB, resizes and normalizes an encoded image.
    ///
    /// # Errors
    /// - `Decode` if the bytes are not a supported image or exceed the decode limits
    /// - `Format` if the decoded image has no pixels
    pub fn preprocess(&self, raw: &[u8]) -> Result<Array4<f32>, ClassifierError> {
        let image = self.decode(raw)?;
        self.to_tensor(&image)
    }

    fn decode(&self, raw: &[u8]) -> Result<DynamicImage, ClassifierError> {
        let mut reader = ImageReader::new(Cursor::new(raw))
            .with_guessed_format()
            .map_err(ImageError::from)?;

        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);
        limits.max_alloc = Some(self.max_alloc);
        reader.limits(limits);

        Ok(reader.decode()?)
    }

    /// Converts an already decoded image into the input tensor.
    pub fn to_tensor(&self, image: &DynamicImage) -> Result<Array4<f32>, ClassifierError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ClassifierError::Format(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }

        // Grayscale, alpha and high bit-depth inputs are all folded into 8-bit RGB.
        let rgb = image.to_rgb8();
        let resized = imageops::resize(&rgb, self.width, self.height, self.filter);

        let data: Vec<f32> = resized
            .into_raw()
            .into_iter()
            .map(|v| f32::from(v) / 255.0)
            .collect();

        Array4::from_shape_vec(self.output_shape(), data)
            .map_err(|e| ClassifierError::Format(format!("Failed to shape input tensor: {}", e)))
    }
}
