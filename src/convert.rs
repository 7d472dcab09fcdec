use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use thiserror::Error;

use crate::annotation::{AnnotationError, AnnotationRecord};
use crate::color_map::ClassColorMap;
use crate::rasterize::{rasterize, RasterizeError};

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("directory input is not supported, pass a single annotation file: {0}")]
    DirectoryInput(PathBuf),
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
    #[error(transparent)]
    Rasterize(#[from] RasterizeError),
    #[error("failed to encode mask image: {0}")]
    Save(#[from] image::ImageError),
    #[error("failed to write mask image: {0}")]
    Io(#[from] std::io::Error),
}

/// Output file path for a given input: the input's file name with its
/// `.json` suffix swapped for `.png`, inside `out_dir`. Without an
/// explicit `out_dir` the mask lands in a sibling directory named after
/// the input file with dots replaced by underscores (`frame.json` →
/// `frame_json/frame.png`).
pub fn resolve_output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => {
            let parent = input.parent().unwrap_or_else(|| Path::new(""));
            parent.join(name.replace('.', "_"))
        }
    };

    dir.join(name.replace(".json", ".png"))
}

/// Converts one annotation file into a mask image on disk and returns
/// the path it was written to.
///
/// The mask is rasterized fully in memory before anything touches the
/// output directory, and it is persisted via a temporary sibling file
/// renamed into place, so a failed run never leaves a partial mask
/// behind.
pub fn convert_file(
    input: &Path,
    out_dir: Option<&Path>,
    color_map: &ClassColorMap,
) -> Result<PathBuf, ConvertError> {
    if input.is_dir() {
        return Err(ConvertError::DirectoryInput(input.to_path_buf()));
    }

    let record = AnnotationRecord::from_file(input)?;
    tracing::debug!(
        "loaded annotation {} with {} shapes",
        input.display(),
        record.shapes.len()
    );
    let mask = rasterize(&record, color_map)?;

    let output_path = resolve_output_path(input, out_dir);
    if let Some(dir) = output_path.parent() {
        fs::create_dir_all(dir)?;
    }

    tracing::info!("saving mask to {}", output_path.display());
    write_atomically(&mask, &output_path)?;

    Ok(output_path)
}

fn write_atomically(mask: &image::RgbImage, output_path: &Path) -> Result<(), ConvertError> {
    let format = ImageFormat::from_path(output_path).unwrap_or(ImageFormat::Png);

    let mut tmp_name = output_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = output_path.with_file_name(tmp_name);

    if let Err(err) = mask.save_with_format(&tmp_path, format) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    fs::rename(&tmp_path, output_path)?;
    Ok(())
}
