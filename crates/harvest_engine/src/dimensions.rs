use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    /// True when either side is below `min`.
    pub fn is_below(&self, min: u32) -> bool {
        self.width < min || self.height < min
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unrecognised image format")]
    UnknownFormat,
    #[error("failed to read image header: {0}")]
    Malformed(String),
}

/// Reads pixel dimensions from an encoded image.
pub trait DimensionDecoder: Send + Sync {
    fn dimensions(&self, bytes: &[u8]) -> Result<ImageDimensions, DecodeError>;
}

/// Whether pixel-dimension checks can run in this build.
#[derive(Clone)]
pub enum DecoderAvailability {
    Available(Arc<dyn DimensionDecoder>),
    Unavailable,
}

impl DecoderAvailability {
    /// The decoder compiled into this build, if any.
    pub fn detect() -> Self {
        #[cfg(feature = "dimensions")]
        {
            DecoderAvailability::Available(Arc::new(ImageCrateDecoder))
        }
        #[cfg(not(feature = "dimensions"))]
        {
            DecoderAvailability::Unavailable
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, DecoderAvailability::Available(_))
    }

    pub fn decoder(&self) -> Option<&dyn DimensionDecoder> {
        match self {
            DecoderAvailability::Available(decoder) => Some(decoder.as_ref()),
            DecoderAvailability::Unavailable => None,
        }
    }
}

impl std::fmt::Debug for DecoderAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecoderAvailability::Available(_) => f.write_str("Available"),
            DecoderAvailability::Unavailable => f.write_str("Unavailable"),
        }
    }
}

/// Header-only dimension probe backed by the `image` crate.
#[cfg(feature = "dimensions")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

#[cfg(feature = "dimensions")]
impl DimensionDecoder for ImageCrateDecoder {
    fn dimensions(&self, bytes: &[u8]) -> Result<ImageDimensions, DecodeError> {
        let reader = image::ImageReader::new(std::io::Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|err| DecodeError::Malformed(err.to_string()))?;
        if reader.format().is_none() {
            return Err(DecodeError::UnknownFormat);
        }
        let (width, height) = reader
            .into_dimensions()
            .map_err(|err| DecodeError::Malformed(err.to_string()))?;
        Ok(ImageDimensions { width, height })
    }
}
