use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;

use chart_digitizer::calibration::{CalibrationModel, PlaneAnchors, PointCalibration};
use chart_digitizer::export::read_csv;
use chart_digitizer::legacy::{DEFAULT_TIMEOUT, ExternalDigitizer};

#[derive(Parser, Debug)]
#[command(
    name = "digitize_legacy",
    about = "Run an external command-line digitizer with three calibration anchors",
    version
)]
struct Cli {
    /// External digitizer executable
    #[arg(long = "tool")]
    tool: PathBuf,

    /// Chart image passed to the tool
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// JSON with the three P anchors, either bare or as a `points.plane` calibration
    #[arg(short = 'a', long = "anchors")]
    anchors: PathBuf,

    /// Where the tool should write its output
    #[arg(short = 'o', long = "output", default_value = "extracted_data.csv")]
    output: PathBuf,

    /// Kill the tool after this many seconds
    #[arg(long = "timeout-secs", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

fn parse_anchors(text: &str) -> Result<PlaneAnchors> {
    if let Ok(anchors) = serde_json::from_str::<PlaneAnchors>(text) {
        return Ok(anchors);
    }
    match CalibrationModel::from_json(text)? {
        CalibrationModel::Points(PointCalibration::Plane(anchors)) => Ok(anchors),
        other => bail!("the external tool needs three plane anchors, got {other:?}"),
    }
}

async fn run(cli: &Cli) -> Result<ExitCode> {
    let text = tokio::fs::read_to_string(&cli.anchors)
        .await
        .with_context(|| format!("reading anchors {}", cli.anchors.display()))?;
    let anchors =
        parse_anchors(&text).with_context(|| format!("parsing anchors {}", cli.anchors.display()))?;

    let (_, height) = image::image_dimensions(&cli.input)
        .with_context(|| format!("reading dimensions of {}", cli.input.display()))?;

    let tool = ExternalDigitizer::new(&cli.tool).with_timeout(Duration::from_secs(cli.timeout_secs));
    log::info!(
        "running {} on {} (timeout {}s)",
        tool.program().display(),
        cli.input.display(),
        tool.timeout().as_secs()
    );
    let outcome = tool.digitize(&anchors, height, &cli.input, &cli.output).await?;

    print!("{}", outcome.stdout);
    eprint!("{}", outcome.stderr);

    if !outcome.is_success() {
        log::error!("{} exited with {:?}", tool.program().display(), outcome.code);
        let code = outcome.code.and_then(|c| u8::try_from(c).ok()).unwrap_or(1);
        return Ok(ExitCode::from(code));
    }

    if let Ok(file) = std::fs::File::open(&cli.output) {
        match read_csv(file) {
            Ok(series) => log::info!("{} points in {}", series.len(), cli.output.display()),
            Err(e) => log::warn!("could not read {} back: {e}", cli.output.display()),
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
