use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use image::GenericImageView;

use chart_digitizer::calibration::{AxisExtrema, CalibrationModel};
use chart_digitizer::export::write_csv;
use chart_digitizer::plot::{overlay_trace, save_series_plot};
use chart_digitizer::{Connectivity, DigitizeError, ExtractConfig, extract_curve, map_to_data};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConnectivityArg {
    /// Diagonal foreground pixels join one curve
    Full,
    /// Only edge-sharing foreground pixels join
    Face,
}

impl From<ConnectivityArg> for Connectivity {
    fn from(value: ConnectivityArg) -> Self {
        match value {
            ConnectivityArg::Full => Connectivity::Full,
            ConnectivityArg::Face => Connectivity::Face,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "digitize",
    about = "Extract an (x, y) data series from a chart image",
    version,
    group(
        ArgGroup::new("extrema")
            .multiple(true)
            .args(["x_min", "x_max", "y_min", "y_max"])
            .conflicts_with("calibration")
    )
)]
struct Cli {
    /// Chart image (PNG, JPEG, BMP, ...)
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Luminance at or below this value is treated as curve ink
    #[arg(short = 't', long = "threshold", default_value_t = 127)]
    threshold: u8,

    /// Pick the threshold automatically (Otsu)
    #[arg(long = "auto-threshold", conflicts_with = "threshold")]
    auto_threshold: bool,

    /// How foreground pixels join into a curve
    #[arg(long = "connectivity", value_enum, default_value_t = ConnectivityArg::Full)]
    connectivity: ConnectivityArg,

    /// Calibration JSON (axis extrema or clicked anchors)
    #[arg(short = 'c', long = "calibration")]
    calibration: Option<PathBuf>,

    /// Data value at the left image edge
    #[arg(long = "x-min", default_value_t = 0.0, allow_negative_numbers = true)]
    x_min: f64,

    /// Data value at the right image edge
    #[arg(long = "x-max", default_value_t = 10.0, allow_negative_numbers = true)]
    x_max: f64,

    /// Data value at the bottom image edge
    #[arg(long = "y-min", default_value_t = 0.0, allow_negative_numbers = true)]
    y_min: f64,

    /// Data value at the top image edge
    #[arg(long = "y-max", default_value_t = 100.0, allow_negative_numbers = true)]
    y_max: f64,

    /// CSV output path
    #[arg(short = 'o', long = "output", default_value = "extracted_data.csv")]
    output: PathBuf,

    /// Also render a preview plot of the extracted series
    #[arg(long = "plot")]
    plot: Option<PathBuf>,

    /// Also write the input image with the selected trace drawn in red
    #[arg(long = "overlay")]
    overlay: Option<PathBuf>,
}

impl Cli {
    fn extract_config(&self) -> ExtractConfig {
        ExtractConfig {
            threshold: self.threshold,
            auto_threshold: self.auto_threshold,
            connectivity: self.connectivity.into(),
        }
    }

    fn calibration_model(&self) -> Result<CalibrationModel> {
        let Some(path) = &self.calibration else {
            return Ok(CalibrationModel::AxisExtrema(AxisExtrema {
                x_min: self.x_min,
                x_max: self.x_max,
                y_min: self.y_min,
                y_max: self.y_max,
            }));
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading calibration {}", path.display()))?;
        CalibrationModel::from_json(&text)
            .with_context(|| format!("parsing calibration {}", path.display()))
    }
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let calibration = cli.calibration_model()?;
    let config = cli.extract_config();

    let bytes = fs::read(&cli.input).with_context(|| format!("reading {}", cli.input.display()))?;
    let img = chart_digitizer::decode_image(&bytes)
        .with_context(|| format!("decoding {}", cli.input.display()))?;
    let (w, h) = img.dimensions();
    log::info!("loaded {} ({w}x{h})", cli.input.display());

    let trace = extract_curve(&img, &config)?;
    log::debug!(
        "selected trace with {} points ({:?} connectivity)",
        trace.len(),
        config.connectivity
    );
    let series = map_to_data(&trace, &calibration)?;

    create_parent_dir(&cli.output)?;
    let file = File::create(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    write_csv(&series, BufWriter::new(file))
        .with_context(|| format!("writing {}", cli.output.display()))?;
    println!(
        "Extracted {} points to {}",
        series.len(),
        cli.output.display()
    );

    if let Some(path) = &cli.plot {
        create_parent_dir(path)?;
        save_series_plot(path, w.max(320), h.max(240), &series)
            .with_context(|| format!("writing plot {}", path.display()))?;
        log::info!("wrote plot {}", path.display());
    }

    if let Some(path) = &cli.overlay {
        create_parent_dir(path)?;
        overlay_trace(&img, &trace)
            .save(path)
            .with_context(|| format!("writing overlay {}", path.display()))?;
        log::info!("wrote overlay {}", path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(DigitizeError::NoCurveFound { threshold }) = e.downcast_ref::<DigitizeError>() {
                log::error!("no curve found at threshold {threshold}");
                eprintln!(
                    "No curve found. Try a different --threshold (currently {threshold}) or --auto-threshold."
                );
            } else {
                log::error!("{e:#}");
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
