use image::{Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use thiserror::Error;

use crate::annotation::{AnnotationError, AnnotationRecord, Shape};
use crate::color_map::ClassColorMap;

#[derive(Error, Debug)]
pub enum RasterizeError {
    #[error("shape label {label:?} is not present in the color map")]
    UnknownLabel { label: String },
    #[error(transparent)]
    Decode(#[from] AnnotationError),
}

/// Converts a decoded image's array shape (rows, columns) into the
/// (width, height) pair canvas creation expects. The flip is easy to
/// transcribe wrong, so it lives in exactly one place.
fn canvas_size_from_shape(rows: u32, cols: u32) -> (u32, u32) {
    (cols, rows)
}

/// Rasterizes an annotation record into a flat-color segmentation mask.
///
/// The embedded source image is decoded only to size the canvas; its
/// pixel content is discarded. Shapes are drawn in REVERSE list order so
/// that the first shape in the record paints last and wins any overlap.
/// This matches the z-order the annotation tool authored and is part of
/// the output contract: changing it changes pixels.
pub fn rasterize(
    record: &AnnotationRecord,
    color_map: &ClassColorMap,
) -> Result<RgbImage, RasterizeError> {
    let source = record.decode_embedded_image()?;
    let (width, height) = canvas_size_from_shape(source.height(), source.width());
    let mut canvas = RgbImage::new(width, height);

    for shape in record.shapes.iter().rev() {
        let color = color_map
            .color(&shape.label)
            .ok_or_else(|| RasterizeError::UnknownLabel {
                label: shape.label.clone(),
            })?;
        draw_shape(&mut canvas, shape, color);
    }

    Ok(canvas)
}

fn draw_shape(canvas: &mut RgbImage, shape: &Shape, color: Rgb<u8>) {
    let points = polygon_points(shape);
    if points.len() < 2 {
        tracing::warn!(
            "skipping shape {:?} with fewer than 2 distinct points",
            shape.label
        );
        return;
    }
    tracing::debug!(
        "drawing {} vertex polygon for label {:?}",
        points.len(),
        shape.label
    );
    draw_polygon_mut(canvas, &points, color);
}

/// Vertex list in the form the polygon fill accepts: no consecutive
/// duplicates and no closing vertex equal to the first. Point shapes and
/// shapes whose vertices collapse under the integer cast shrink below 2
/// points here and get skipped by the caller.
fn polygon_points(shape: &Shape) -> Vec<Point<i32>> {
    let mut points: Vec<Point<i32>> = shape
        .points
        .iter()
        .map(|&(x, y)| Point::new(x as i32, y as i32))
        .collect();

    points.dedup();
    while points.len() >= 2 && points.first() == points.last() {
        points.pop();
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    fn record(width: u32, height: u32, shapes: Vec<Shape>) -> AnnotationRecord {
        let img = RgbImage::new(width, height);
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        AnnotationRecord {
            image_data: Some(STANDARD.encode(&buf)),
            shapes,
        }
    }

    fn square(label: &str, x0: f64, x1: f64) -> Shape {
        Shape {
            label: label.to_string(),
            points: vec![(x0, 0.0), (x1, 0.0), (x1, 9.0), (x0, 9.0)],
        }
    }

    fn cat_dog_map() -> ClassColorMap {
        let mut classes = tempfile::NamedTempFile::new().unwrap();
        let mut colors = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut classes, b"cat\ndog\n").unwrap();
        std::io::Write::write_all(&mut colors, b"255 0 0\n0 255 0\n").unwrap();
        ClassColorMap::from_files(classes.path(), colors.path()).unwrap()
    }

    #[test]
    fn test_canvas_size_flips_rows_and_columns() {
        assert_eq!(canvas_size_from_shape(7, 12), (12, 7));
    }

    #[test]
    fn test_zero_shapes_yields_blank_canvas() {
        let mask = rasterize(&record(8, 5, Vec::new()), &cat_dog_map()).unwrap();

        assert_eq!(mask.dimensions(), (8, 5));
        assert!(mask.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_single_shape_covers_whole_canvas() {
        let shapes = vec![square("cat", 0.0, 9.0)];
        let mask = rasterize(&record(10, 10, shapes), &cat_dog_map()).unwrap();

        assert_eq!(mask.dimensions(), (10, 10));
        assert!(mask.pixels().all(|p| *p == Rgb([255, 0, 0])));
    }

    #[test]
    fn test_first_listed_shape_wins_overlap() {
        // cat spans columns 0..=5, dog spans 3..=9; reverse-order drawing
        // paints cat last, so the overlap ends up cat-colored.
        let shapes = vec![square("cat", 0.0, 5.0), square("dog", 3.0, 9.0)];
        let mask = rasterize(&record(10, 10, shapes), &cat_dog_map()).unwrap();

        assert_eq!(*mask.get_pixel(1, 4), Rgb([255, 0, 0]));
        assert_eq!(*mask.get_pixel(4, 4), Rgb([255, 0, 0]));
        assert_eq!(*mask.get_pixel(8, 4), Rgb([0, 255, 0]));
    }

    #[test]
    fn test_explicit_closing_vertex_is_accepted() {
        let shapes = vec![Shape {
            label: "cat".to_string(),
            points: vec![(0.0, 0.0), (9.0, 0.0), (9.0, 9.0), (0.0, 9.0), (0.0, 0.0)],
        }];
        let mask = rasterize(&record(10, 10, shapes), &cat_dog_map()).unwrap();

        assert!(mask.pixels().all(|p| *p == Rgb([255, 0, 0])));
    }

    #[test]
    fn test_single_point_shape_is_skipped() {
        // labelme point shapes carry exactly one vertex; they cannot be
        // filled and must not bring the conversion down.
        let shapes = vec![Shape {
            label: "cat".to_string(),
            points: vec![(4.0, 4.0)],
        }];
        let mask = rasterize(&record(10, 10, shapes), &cat_dog_map()).unwrap();

        assert!(mask.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_shape_collapsing_under_integer_cast_is_skipped() {
        // Sub-pixel vertices truncate to the same integer point.
        let shapes = vec![Shape {
            label: "cat".to_string(),
            points: vec![(0.4, 0.4), (0.6, 0.6)],
        }];
        let mask = rasterize(&record(10, 10, shapes), &cat_dog_map()).unwrap();

        assert!(mask.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_repeated_closing_vertices_are_accepted() {
        let shapes = vec![Shape {
            label: "cat".to_string(),
            points: vec![
                (0.0, 0.0),
                (9.0, 0.0),
                (9.0, 9.0),
                (0.0, 9.0),
                (0.0, 0.0),
                (0.0, 0.0),
            ],
        }];
        let mask = rasterize(&record(10, 10, shapes), &cat_dog_map()).unwrap();

        assert!(mask.pixels().all(|p| *p == Rgb([255, 0, 0])));
    }

    #[test]
    fn test_unknown_label_fails() {
        let shapes = vec![square("bird", 0.0, 9.0)];
        let result = rasterize(&record(10, 10, shapes), &cat_dog_map());

        assert!(matches!(
            result,
            Err(RasterizeError::UnknownLabel { label }) if label == "bird"
        ));
    }

    #[test]
    fn test_missing_image_data_propagates() {
        let record = AnnotationRecord {
            image_data: None,
            shapes: Vec::new(),
        };

        assert!(matches!(
            rasterize(&record, &cat_dog_map()),
            Err(RasterizeError::Decode(AnnotationError::MissingImageData))
        ));
    }
}
