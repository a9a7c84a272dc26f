use clap::{ArgGroup, Parser};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use offline_tiles::confirm::{confirm_large_region, format_count};
use offline_tiles::http::{HttpConfig, create_client_with_config};
use offline_tiles::{
    AreaResolver, AreaSpec, BufferMode, GeneratorConfig, MapSource, ProviderFactory, TileGenerator,
};

use image::{Rgb, RgbImage};

const SAMPLE_TILE_SIZE: u32 = 256;
const SAMPLE_FRAME_WIDTH: u32 = 4;

#[derive(Parser)]
#[command(name = "offline-tiles")]
#[command(about = "Generate an offline map tile set for a region, city or bounding box")]
#[command(group(
    ArgGroup::new("area")
        .required(true)
        .args(["region", "city", "cities", "coords"])
))]
struct Args {
    /// Predefined region: north_america, usa, canada, mexico, california, texas, alaska
    #[arg(long)]
    region: Option<String>,

    /// City name (e.g. "San Francisco" or "Portland, Oregon")
    #[arg(long)]
    city: Option<String>,

    /// Multiple cities separated by semicolons (e.g. "San Francisco; Oakland; San Jose")
    #[arg(long)]
    cities: Option<String>,

    /// Use explicit coordinates (requires --north, --south, --east, --west)
    #[arg(long)]
    coords: bool,

    /// North latitude (used with --coords)
    #[arg(long, allow_negative_numbers = true)]
    north: Option<f64>,

    /// South latitude (used with --coords)
    #[arg(long, allow_negative_numbers = true)]
    south: Option<f64>,

    /// East longitude (used with --coords)
    #[arg(long, allow_negative_numbers = true)]
    east: Option<f64>,

    /// West longitude (used with --coords)
    #[arg(long, allow_negative_numbers = true)]
    west: Option<f64>,

    /// Buffer around city/cities in kilometers
    #[arg(long, default_value = "20")]
    buffer: f64,

    /// Convert the buffer with great-circle distances instead of 111 km per degree
    #[arg(long)]
    geodesic_buffer: bool,

    /// Minimum zoom level
    #[arg(long, default_value = "8")]
    min_zoom: u8,

    /// Maximum zoom level
    #[arg(long, default_value = "12")]
    max_zoom: u8,

    /// Map source: osm, satellite, terrain, cycle
    #[arg(long, default_value = "osm")]
    source: String,

    /// API key for sources that accept one (cycle)
    #[arg(long)]
    api_key: Option<String>,

    /// Output directory
    #[arg(long, default_value = "tiles")]
    output_dir: PathBuf,

    /// Pause after each downloaded tile, in seconds
    #[arg(long, default_value = "0.2")]
    delay: f64,

    /// Maximum concurrent downloads
    #[arg(long, default_value = "3")]
    max_workers: usize,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Generate a sample tile only
    #[arg(long)]
    sample_only: bool,

    /// Skip the confirmation prompt for large regions
    #[arg(short, long)]
    yes: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn area_spec(&self) -> AreaSpec {
        if let Some(region) = &self.region {
            AreaSpec::region(region)
        } else if let Some(city) = &self.city {
            AreaSpec::place(city)
        } else if let Some(cities) = &self.cities {
            AreaSpec::places(cities)
        } else {
            AreaSpec::Bounds {
                north: self.north,
                south: self.south,
                east: self.east,
                west: self.west,
            }
        }
    }

    fn generator_config(&self) -> offline_tiles::Result<GeneratorConfig> {
        let source: MapSource = self.source.parse()?;
        let delay = Duration::try_from_secs_f64(self.delay).map_err(|_| {
            offline_tiles::TilesError::Config(format!(
                "Delay must be a non-negative number of seconds, got {}",
                self.delay
            ))
        })?;
        let buffer_mode = if self.geodesic_buffer {
            BufferMode::Geodesic
        } else {
            BufferMode::Degrees
        };

        let mut builder = GeneratorConfig::builder()
            .zoom_range(self.min_zoom, self.max_zoom)
            .source(source)
            .output_dir(&self.output_dir)
            .workers(self.max_workers)
            .delay(delay)
            .buffer_km(self.buffer)
            .buffer_mode(buffer_mode)
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        builder.build()
    }
}

/// Log an error and turn it into the process exit message
fn fail(e: impl Display) -> String {
    error!("❌ {}", e);
    e.to_string()
}

/// Write a framed light-blue placeholder tile to `<output>/sample/sample.png`
async fn create_sample_tile(output_dir: &Path) -> Result<PathBuf, String> {
    let sample_dir = output_dir.join("sample");
    tokio::fs::create_dir_all(&sample_dir)
        .await
        .map_err(|e| format!("Failed to create {}: {}", sample_dir.display(), e))?;

    let mut img = RgbImage::from_pixel(SAMPLE_TILE_SIZE, SAMPLE_TILE_SIZE, Rgb([173, 216, 230]));
    let far_edge = SAMPLE_TILE_SIZE - SAMPLE_FRAME_WIDTH;
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        if x < SAMPLE_FRAME_WIDTH || y < SAMPLE_FRAME_WIDTH || x >= far_edge || y >= far_edge {
            *pixel = Rgb([0, 0, 0]);
        }
    }

    let path = sample_dir.join("sample.png");
    img.save(&path)
        .map_err(|e| format!("Failed to save PNG: {}", e))?;
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if args.sample_only {
        let path = create_sample_tile(&args.output_dir).await.map_err(fail)?;
        info!("🖼️  Sample tile saved to: {}", path.display());
        return Ok(());
    }

    let config = args.generator_config().map_err(fail)?;
    let spec = args.area_spec();

    info!("🌍 Offline tile generator starting...");
    info!("🗺️  Source: {}", config.source);
    info!("🔢 Zoom levels: {}-{}", config.min_zoom, config.max_zoom);
    info!("📁 Output: {}", config.output_dir.display());

    let http_config = HttpConfig::default().with_timeout(Duration::from_secs(config.timeout_seconds));
    let client = create_client_with_config(http_config).map_err(fail)?;

    let places = Arc::new(ProviderFactory::nominatim(client.clone()));
    let resolver = AreaResolver::from_config(places, &config);
    let area = resolver.resolve(&spec).await.map_err(fail)?;
    info!("📏 Area: {:.0} km²", area.bounds.area_km2());

    let source = ProviderFactory::tile_source(config.source, client, config.api_key.clone());
    let (min_zoom, max_zoom) = (config.min_zoom, config.max_zoom);
    let cancel = CancellationToken::new();
    let generator = TileGenerator::new(config, Arc::new(source))
        .map_err(fail)?
        .with_cancellation(cancel.clone());

    let plan = generator.plan(&area.bounds).map_err(fail)?;
    let estimate = plan.estimate();
    info!(
        "📦 Estimated download: {} tiles, {:.1} MB",
        format_count(estimate.tiles),
        estimate.megabytes
    );

    if spec.is_large_region() && !args.yes {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        let confirmed =
            confirm_large_region(&estimate, min_zoom, max_zoom, stdin.lock(), stdout.lock())
                .map_err(fail)?;
        if !confirmed {
            info!("Cancelled.");
            return Ok(());
        }
    }

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("⏹️  Interrupted, finishing in-flight tiles...");
                cancel.cancel();
            }
        }
    });

    let report = generator.run(&plan, &area.label).await.map_err(fail)?;
    let summary = &report.summary;
    info!(
        "✅ {} downloaded, {} already present, {} failed",
        summary.downloaded, summary.cached, summary.failed
    );
    if let Some(path) = &report.metadata_path {
        info!("💾 Metadata: {}", path.display());
    }

    if summary.cancelled {
        return Err(format!(
            "Interrupted with {} tiles not attempted",
            summary.not_attempted()
        ));
    }
    Ok(())
}
