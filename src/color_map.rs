use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use image::Rgb;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ColorMapError {
    #[error("class name list ({classes} lines) and color map ({colors} lines) are not the same length")]
    Mismatch { classes: usize, colors: usize },
    #[error("incorrect RGB value in color map: {line:?}")]
    Format { line: String },
    #[error("failed to read color map file: {0}")]
    Io(#[from] io::Error),
}

/// Mapping from class label to the flat RGB color used when rendering
/// that class's polygons. Built once at startup, immutable afterwards.
///
/// A label appearing twice overwrites its earlier color (last write wins).
/// That matches the legacy two-file format, where nothing stops a class
/// name from repeating.
#[derive(Debug, Clone)]
pub struct ClassColorMap {
    colors: HashMap<String, Rgb<u8>>,
}

impl ClassColorMap {
    /// Loads the combined color-labels format: one `label,R,G,B` line per
    /// class.
    pub fn from_labels_file(path: &Path) -> Result<Self, ColorMapError> {
        let file = File::open(path)?;
        Self::from_labels_reader(BufReader::new(file))
    }

    /// Loads the legacy two-file format: one class name per line in
    /// `classnames`, one `R G B` line per class in `colormap`, paired by
    /// line position. The caller is responsible for keeping the two files
    /// in the same order.
    pub fn from_files(classnames: &Path, colormap: &Path) -> Result<Self, ColorMapError> {
        let classes = File::open(classnames)?;
        let colors = File::open(colormap)?;
        Self::from_readers(BufReader::new(classes), BufReader::new(colors))
    }

    fn from_labels_reader(reader: impl BufRead) -> Result<Self, ColorMapError> {
        let mut colors = HashMap::new();

        for line in reader.lines() {
            let line = line?;
            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() != 4 {
                return Err(ColorMapError::Format { line });
            }
            let rgb = match parse_rgb(&parts[1..]) {
                Some(rgb) => rgb,
                None => return Err(ColorMapError::Format { line }),
            };
            colors.insert(parts[0].trim().to_string(), rgb);
        }

        Ok(Self { colors })
    }

    fn from_readers(classes: impl BufRead, colors: impl BufRead) -> Result<Self, ColorMapError> {
        let class_lines: Vec<String> = classes.lines().collect::<io::Result<_>>()?;
        let color_lines: Vec<String> = colors.lines().collect::<io::Result<_>>()?;

        if class_lines.len() != color_lines.len() {
            return Err(ColorMapError::Mismatch {
                classes: class_lines.len(),
                colors: color_lines.len(),
            });
        }

        let mut map = HashMap::new();
        for (class, color) in class_lines.iter().zip(&color_lines) {
            let parts: Vec<&str> = color.split_whitespace().collect();
            if parts.len() != 3 {
                return Err(ColorMapError::Format {
                    line: color.clone(),
                });
            }
            let rgb = match parse_rgb(&parts) {
                Some(rgb) => rgb,
                None => {
                    return Err(ColorMapError::Format {
                        line: color.clone(),
                    })
                }
            };
            map.insert(class.trim().to_string(), rgb);
        }

        Ok(Self { colors: map })
    }

    pub fn color(&self, label: &str) -> Option<Rgb<u8>> {
        self.colors.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn parse_rgb(parts: &[&str]) -> Option<Rgb<u8>> {
    let red = parts[0].trim().parse().ok()?;
    let green = parts[1].trim().parse().ok()?;
    let blue = parts[2].trim().parse().ok()?;
    Some(Rgb([red, green, blue]))
}
