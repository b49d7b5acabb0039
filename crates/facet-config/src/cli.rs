//! Command-line flags for the viewer and the print exporter.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Facet command-line arguments.
///
/// Every flag that is given replaces the matching value from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "facet", about = "Polyhedral map viewer and papercraft exporter")]
pub struct CliArgs {
    /// Solid to unfold the map onto (icosahedron, cube, pyramid, ...).
    #[arg(long)]
    pub shape: Option<String>,

    #[arg(long)]
    pub zoom: Option<u32>,

    /// Start longitude in degrees.
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Start latitude in degrees.
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// JSON style rules.
    #[arg(long)]
    pub style: Option<PathBuf>,

    /// Directory of GeoJSON layers.
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Export print pages as PNG and exit instead of opening a window.
    #[arg(long)]
    pub print: bool,

    #[arg(long)]
    pub print_scale: Option<f64>,

    /// Directory receiving `<shape>_page_<n>.png`.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// Log filter (error, warn, info, debug, trace or an `EnvFilter` directive).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Config directory (overrides the platform default).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref shape) = args.shape {
            self.view.shape = shape.clone();
        }
        if let Some(zoom) = args.zoom {
            self.view.zoom = zoom;
        }
        if let Some(lon) = args.lon {
            self.view.center[0] = lon;
        }
        if let Some(lat) = args.lat {
            self.view.center[1] = lat;
        }
        if let Some(ref style) = args.style {
            self.style.path = Some(style.clone());
        }
        if let Some(ref data) = args.data {
            self.data.directory = Some(data.clone());
        }
        if let Some(scale) = args.print_scale {
            self.print.scale = scale;
        }
        if let Some(ref output) = args.output {
            self.print.output_dir = output.clone();
        }
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs::parse_from([
            "facet",
            "--shape",
            "cube",
            "--lon",
            "-73.9",
            "--lat",
            "40.7",
            "--print-scale",
            "2",
        ]);
        config.apply_cli_overrides(&args);
        assert_eq!(config.view.shape, "cube");
        assert_eq!(config.view.center, [-73.9, 40.7]);
        assert_eq!(config.print.scale, 2.0);
        assert!(!args.print);
        assert_eq!(config.window.width, 1280, "untouched fields keep defaults");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_print_flag() {
        let args = CliArgs::parse_from(["facet", "--print", "--output", "/tmp/pages"]);
        let mut config = Config::default();
        config.apply_cli_overrides(&args);
        assert!(args.print);
        assert_eq!(config.print.output_dir, PathBuf::from("/tmp/pages"));
    }
}
