//! Polyfile command - encode a polygon file as per-zoom paths.

use std::path::PathBuf;

use clap::Args;
use maptiles::shape::{Polyfile, ShapeInfo};

use crate::error::CliError;

/// Arguments for the polyfile command.
#[derive(Debug, Args)]
pub struct PolyfileArgs {
    /// Polyfile to read
    pub file: PathBuf,

    /// Lowest zoom level to encode
    #[arg(long, default_value = "0")]
    pub min_zoom: u8,

    /// Highest zoom level to encode
    #[arg(long, default_value = "10")]
    pub max_zoom: u8,

    /// Print one quoted path per zoom level instead of JSON
    #[arg(long)]
    pub quoted: bool,

    /// Pretty-print the JSON output
    #[arg(long, conflicts_with = "quoted")]
    pub pretty: bool,
}

/// Run the polyfile command.
pub fn run(args: PolyfileArgs) -> Result<(), CliError> {
    let polyfile = Polyfile::from_path(&args.file)?;
    let info = ShapeInfo::from_polyfile(&polyfile, args.min_zoom, args.max_zoom)?;
    println!("{}", render(&info, &args)?);
    Ok(())
}

fn render(info: &ShapeInfo, args: &PolyfileArgs) -> Result<String, CliError> {
    if args.quoted {
        let lines: Vec<String> = info
            .zoom_levels()
            .filter_map(|zoom| info.quoted_path(zoom))
            .collect();
        return Ok(lines.join("\n"));
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(info)?
    } else {
        serde_json::to_string(info)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SQUARE: &str = "Square\n1\n0.0 0.0\n1.0 0.0\n1.0 1.0\n0.0 1.0\nEND\nEND\n";

    fn args(file: PathBuf, quoted: bool) -> PolyfileArgs {
        PolyfileArgs {
            file,
            min_zoom: 2,
            max_zoom: 3,
            quoted,
            pretty: false,
        }
    }

    fn info() -> ShapeInfo {
        let polyfile = Polyfile::parse(SQUARE.as_bytes()).unwrap();
        ShapeInfo::from_polyfile(&polyfile, 2, 3).unwrap()
    }

    #[test]
    fn test_quoted_output_has_one_line_per_zoom() {
        let out = render(&info(), &args(PathBuf::new(), true)).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.starts_with("\"M ") && l.ends_with(" Z\",")));
    }

    #[test]
    fn test_json_output() {
        let out = render(&info(), &args(PathBuf::new(), false)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(json["description"], "Square");
        assert!(json["paths"]["2"].is_string());
    }

    #[test]
    fn test_run_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = run(args(temp_dir.path().join("missing.poly"), false));
        assert!(matches!(result, Err(CliError::Shape(_))));
    }
}
