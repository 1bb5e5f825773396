use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

mod api;
mod config;
mod domain;
mod geometry;
mod svg;

use api::WfsLayer;
use config::FileConfig;
use svg::{CanvasSpec, polygon_to_svg};

/// Query an OGC WFS endpoint and render polygon features as SVG
///
/// Examples:
///   # Render the municipality containing a point
///   wfs2svg -u https://geoservices.example.org/ws -l urbis:municipalities \
///       --cql-filter "DWITHIN(geom, POINT(4.35 50.85), 15, meters)" -n 1
///
///   # Count matching features without downloading them
///   wfs2svg -u https://geoservices.example.org/ws -l urbis:municipalities --hits
///
///   # Use a config file and override the canvas size
///   wfs2svg --config brussels.toml -s 400
#[derive(Parser, Debug)]
#[command(name = "wfs2svg")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches wfs2svg.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// WFS endpoint base URL
    #[arg(short = 'u', long)]
    url: Option<String>,

    /// Layer (feature type) name
    #[arg(short = 'l', long)]
    layer: Option<String>,

    /// WFS protocol version
    #[arg(long, default_value = "2.0.0")]
    wfs_version: String,

    /// CQL filter expression
    #[arg(long)]
    cql_filter: Option<String>,

    /// Output SRS as an EPSG code (e.g. 4326)
    #[arg(long)]
    srs: Option<u32>,

    /// Sort expression passed to the server
    #[arg(long)]
    sort_by: Option<String>,

    /// Comma-separated list of properties to return
    #[arg(long)]
    property_name: Option<String>,

    /// Maximum number of features to request
    #[arg(short = 'n', long)]
    count: Option<u32>,

    /// Print the number of matching features and exit
    #[arg(long)]
    hits: bool,

    /// Print the GetFeature URL and exit
    #[arg(long)]
    print_url: bool,

    /// Canvas size in pixels (square output)
    #[arg(short = 's', long, default_value = "200")]
    size: u32,

    /// Polygon fill color
    #[arg(long, default_value = "#3388ff")]
    fill: String,

    /// Polygon fill opacity (0-1)
    #[arg(long, default_value = "0.3")]
    fill_opacity: f64,

    /// Polygon stroke color
    #[arg(long, default_value = "#3388ff")]
    stroke: String,

    /// Polygon stroke width
    #[arg(long, default_value = "1.0")]
    stroke_width: f64,

    /// Inline style for the svg container element
    #[arg(long)]
    style: Option<String>,

    /// Output SVG path (defaults to {layer}.svg; extra features get a -N suffix)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    let file_config = if let Some(ref config_path) = args.config {
        if config_path.exists() {
            Some(FileConfig::from_path(config_path)?)
        } else {
            bail!("Config file not found: {:?}", config_path);
        }
    } else {
        FileConfig::load()
    };

    let url = args
        .url
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.url.clone()));
    let layer_name = args
        .layer
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.layer.clone()));
    let wfs_version = if args.wfs_version != "2.0.0" {
        args.wfs_version.clone()
    } else {
        file_config
            .as_ref()
            .map(|c| c.wfs_version.clone())
            .unwrap_or_else(|| "2.0.0".to_string())
    };
    let cql_filter = args
        .cql_filter
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.cql_filter.clone()));
    let srs = args
        .srs
        .or_else(|| file_config.as_ref().and_then(|c| c.srs));
    let sort_by = args
        .sort_by
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.sort_by.clone()));
    let property_name = args
        .property_name
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.property_name.clone()));
    let count = args
        .count
        .or_else(|| file_config.as_ref().and_then(|c| c.count));
    let size = if args.size != 200 {
        args.size
    } else {
        file_config.as_ref().map(|c| c.size).unwrap_or(200)
    };
    let fill = if args.fill != "#3388ff" {
        args.fill.clone()
    } else {
        file_config
            .as_ref()
            .map(|c| c.fill.clone())
            .unwrap_or_else(|| "#3388ff".to_string())
    };
    let fill_opacity = if (args.fill_opacity - 0.3).abs() > f64::EPSILON {
        args.fill_opacity
    } else {
        file_config.as_ref().map(|c| c.fill_opacity).unwrap_or(0.3)
    };
    let stroke = if args.stroke != "#3388ff" {
        args.stroke.clone()
    } else {
        file_config
            .as_ref()
            .map(|c| c.stroke.clone())
            .unwrap_or_else(|| "#3388ff".to_string())
    };
    let stroke_width = if (args.stroke_width - 1.0).abs() > f64::EPSILON {
        args.stroke_width
    } else {
        file_config.as_ref().map(|c| c.stroke_width).unwrap_or(1.0)
    };
    let style = args
        .style
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.style.clone()))
        .unwrap_or_default();
    let timeout_secs = file_config.as_ref().map(|c| c.timeout_secs).unwrap_or(30);
    let verbose = args.verbose || file_config.as_ref().map(|c| c.verbose).unwrap_or(false);
    let output = args
        .output
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.output.clone()));

    let Some(url) = url else {
        bail!("Must provide a WFS endpoint with --url/-u (or in a config file)");
    };
    let Some(layer_name) = layer_name else {
        bail!("Must provide a layer name with --layer/-l (or in a config file)");
    };

    if size == 0 {
        bail!("Canvas size must be a positive integer");
    }

    let mut layer = WfsLayer::new(&url, &layer_name)
        .with_version(&wfs_version)
        .with_timeout_secs(timeout_secs);
    if let Some(filter) = cql_filter {
        layer = layer.with_cql_filter(filter);
    }
    if let Some(srs) = srs {
        layer = layer.with_output_srs(srs);
    }
    if let Some(sort_by) = sort_by {
        layer = layer.with_sort_by(sort_by);
    }
    if let Some(property_name) = property_name {
        layer = layer.with_property_name(property_name);
    }
    if let Some(count) = count {
        layer = layer.with_count(count);
    }

    if verbose {
        println!("Configuration:");
        println!("  Endpoint: {}", url);
        println!("  Layer: {}", layer_name);
        println!("  WFS version: {}", wfs_version);
        println!("  Canvas size: {}px", size);
        println!();
    }

    if args.print_url {
        println!("{}", layer.query_url()?);
        return Ok(());
    }

    if args.hits {
        let spinner = create_spinner("Counting matching features...");
        let start = Instant::now();
        let hits = layer.hits().context("Failed to query hit count")?;
        spinner.finish_with_message(format!(
            "{} features match [{:.1}s]",
            hits,
            start.elapsed().as_secs_f32()
        ));
        println!("{}", hits);
        return Ok(());
    }

    let spinner = create_spinner("Fetching features from WFS...");
    let start = Instant::now();
    let collection = layer.fetch().context("Failed to fetch features")?;
    spinner.finish_with_message(format!(
        "Fetched {} features [{:.1}s]",
        collection.features.len(),
        start.elapsed().as_secs_f32()
    ));

    if collection.features.is_empty() {
        bail!("No features matched the query. Try relaxing the CQL filter.");
    }

    let spec = CanvasSpec {
        size,
        fill,
        fill_opacity,
        stroke,
        stroke_width,
        style,
    };

    let output_path = output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}.svg",
            layer_name.to_lowercase().replace([':', '/'], "_")
        ))
    });

    let mut written = 0usize;
    for (index, feature) in collection.features.iter().enumerate() {
        let drawing = polygon_to_svg(feature.geometry.as_ref(), &spec)
            .with_context(|| format!("Feature {} has malformed geometry", index))?;

        match drawing {
            Some(document) => {
                let path = indexed_path(&output_path, written);
                std::fs::write(&path, document.to_string())
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!(
                    "Wrote {} ({} rings, {}x{})",
                    path.display(),
                    document.rings().len(),
                    document.size(),
                    document.size()
                );
                written += 1;
            }
            None => {
                if verbose {
                    println!("  Feature {} has no renderable geometry, skipped", index);
                }
            }
        }
    }

    if written == 0 {
        bail!("No feature had renderable geometry");
    }

    println!(
        "Done: {} SVG file(s) in {:.1}s",
        written,
        total_start.elapsed().as_secs_f32()
    );

    Ok(())
}

/// out.svg, out-1.svg, out-2.svg, ...
fn indexed_path(path: &std::path::Path, index: usize) -> PathBuf {
    if index == 0 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "out".to_string());
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "svg".to_string());
    path.with_file_name(format!("{}-{}.{}", stem, index, extension))
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_path() {
        let base = PathBuf::from("out/municipalities.svg");
        assert_eq!(indexed_path(&base, 0), PathBuf::from("out/municipalities.svg"));
        assert_eq!(
            indexed_path(&base, 2),
            PathBuf::from("out/municipalities-2.svg")
        );
    }
}
