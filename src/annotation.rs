use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("failed to read annotation file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse annotation file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("annotation has no embedded image data")]
    MissingImageData,
    #[error("embedded image data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("embedded image data is not a decodable image: {0}")]
    Image(#[from] image::ImageError),
}

/// One labeled polygon from an annotation record. Points are ordered
/// vertices in pixel coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct Shape {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// A parsed labelme annotation record: the source image embedded as
/// base64 plus its labeled shapes, in authoring order. Fields the
/// converter does not need (image path, flags, version) are ignored.
#[derive(Debug, Deserialize)]
pub struct AnnotationRecord {
    #[serde(rename = "imageData")]
    pub image_data: Option<String>,
    pub shapes: Vec<Shape>,
}

impl AnnotationRecord {
    pub fn from_file(path: &Path) -> Result<Self, AnnotationError> {
        let file = File::open(path)?;
        let record = serde_json::from_reader(BufReader::new(file))?;
        Ok(record)
    }

    /// Decodes the embedded source image. The converter only needs its
    /// dimensions, but decoding the whole image is the one reliable way
    /// to get them.
    pub fn decode_embedded_image(&self) -> Result<DynamicImage, AnnotationError> {
        let encoded = match &self.image_data {
            Some(data) if !data.is_empty() => data,
            _ => return Err(AnnotationError::MissingImageData),
        };
        let bytes = STANDARD.decode(encoded)?;
        let img = image::load_from_memory(&bytes)?;
        Ok(img)
    }
}
