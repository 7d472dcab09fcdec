use std::path::PathBuf;

use clap::Parser;

use crate::color_map::{ClassColorMap, ColorMapError};
use crate::convert::convert_file;

/// Convert a labelme annotation JSON file into a flat-color segmentation
/// mask image.
#[derive(Parser, Debug)]
#[command(name = "labelmask", version)]
pub struct Args {
    /// Annotation JSON file to convert (directories are not supported)
    pub input: PathBuf,

    /// Output directory (default: derived from the input file name)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Combined color-labels file, one `label,R,G,B` line per class.
    /// When given, the two legacy files are ignored.
    #[arg(long, conflicts_with_all = ["classnames", "colormap"])]
    pub labels: Option<PathBuf>,

    /// File containing one class name per line (legacy two-file mode)
    #[arg(long, default_value = "class_names.txt")]
    pub classnames: PathBuf,

    /// File containing one `R G B` line per class, in the same order as
    /// the class names file (legacy two-file mode)
    #[arg(long, default_value = "color_map.txt")]
    pub colormap: PathBuf,
}

impl Args {
    fn load_color_map(&self) -> Result<ClassColorMap, ColorMapError> {
        match &self.labels {
            Some(path) => ClassColorMap::from_labels_file(path),
            None => ClassColorMap::from_files(&self.classnames, &self.colormap),
        }
    }
}

pub fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let color_map = args.load_color_map()?;
    tracing::debug!("loaded color map with {} classes", color_map.len());

    let written = convert_file(&args.input, args.out.as_deref(), &color_map)?;
    tracing::info!("wrote {}", written.display());

    Ok(())
}
