//! Shim around an external command-line digitizer.
//!
//! The tool takes three `-p x,y` / `-l row,col` anchor pairs, with rows counted
//! from the bottom edge of the image, an `--output` path and the image as its
//! last positional argument.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::calibration::PlaneAnchors;
use crate::error::{DigitizeError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Builds the tool's argument list from three plane anchors.
pub fn external_args(
    anchors: &PlaneAnchors,
    image_height: u32,
    image: &Path,
    output: &Path,
) -> Result<Vec<OsString>> {
    let missing = anchors.missing();
    if !missing.is_empty() {
        return Err(DigitizeError::CalibrationIncomplete { missing });
    }

    let mut args = Vec::with_capacity(3 * 4 + 3);
    for (_, anchor) in anchors.named() {
        let Some(pixel) = anchor.pixel else {
            continue;
        };
        let row_from_bottom = f64::from(image_height) - pixel.row;
        args.push(OsString::from("-p"));
        args.push(OsString::from(format!("{},{}", anchor.value.x, anchor.value.y)));
        args.push(OsString::from("-l"));
        args.push(OsString::from(format!("{},{}", row_from_bottom, pixel.col)));
    }
    args.push(OsString::from("--output"));
    args.push(output.as_os_str().to_owned());
    args.push(image.as_os_str().to_owned());
    Ok(args)
}

/// Captured result of one external run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalRun {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExternalRun {
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Debug, Clone)]
pub struct ExternalDigitizer {
    program: PathBuf,
    timeout: Duration,
}

impl ExternalDigitizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs the tool and returns its exit status and output verbatim.
    ///
    /// A run exceeding the timeout is killed and reported as
    /// [`DigitizeError::ExternalTimeout`].
    pub async fn run<I, S>(&self, args: I) -> Result<ExternalRun>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let child = Command::new(&self.program)
            .args(args.into_iter().map(Into::<OsString>::into))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Dropping the pending future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                return Err(DigitizeError::ExternalTimeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        Ok(ExternalRun {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Builds the argument list from `anchors` and runs the tool on `image`.
    pub async fn digitize(
        &self,
        anchors: &PlaneAnchors,
        image_height: u32,
        image: &Path,
        output: &Path,
    ) -> Result<ExternalRun> {
        let args = external_args(anchors, image_height, image, output)?;
        self.run(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{AnchorName, PlaneAnchor};
    use crate::raster::PixelPoint;
    use crate::series::DataPoint;

    fn anchors() -> PlaneAnchors {
        PlaneAnchors {
            p1: PlaneAnchor::at(PixelPoint::new(90.0, 10.0), DataPoint::new(0.0, 0.0)),
            p2: PlaneAnchor::at(PixelPoint::new(90.0, 110.0), DataPoint::new(10.0, 0.0)),
            p3: PlaneAnchor::at(PixelPoint::new(40.0, 10.0), DataPoint::new(0.0, 2.5)),
        }
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn args_count_rows_from_the_bottom() {
        let args = external_args(&anchors(), 100, Path::new("chart.png"), Path::new("out.csv"))
            .expect("args");
        assert_eq!(
            strings(&args),
            vec![
                "-p", "0,0", "-l", "10,10", "-p", "10,0", "-l", "10,110", "-p", "0,2.5", "-l",
                "60,10", "--output", "out.csv", "chart.png",
            ]
        );
    }

    #[test]
    fn timeout_defaults_to_a_minute() {
        let tool = ExternalDigitizer::new("digitizer");
        assert_eq!(tool.timeout(), Duration::from_secs(60));
        assert_eq!(tool.with_timeout(Duration::from_secs(5)).timeout(), Duration::from_secs(5));
    }

    #[test]
    fn args_need_every_anchor() {
        let mut a = anchors();
        a.p2.pixel = None;
        match external_args(&a, 100, Path::new("c.png"), Path::new("o.csv")) {
            Err(DigitizeError::CalibrationIncomplete { missing }) => {
                assert_eq!(missing, vec![AnchorName::P2]);
            }
            other => panic!("expected CalibrationIncomplete, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_reports_status_and_output_verbatim() {
        let tool = ExternalDigitizer::new("sh");
        let run = tool
            .run(["-c", "echo points; echo warn 1>&2; exit 3"])
            .await
            .expect("run");
        assert_eq!(run.code, Some(3));
        assert!(!run.is_success());
        assert_eq!(run.stdout, "points\n");
        assert_eq!(run.stderr, "warn\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_times_out() {
        let tool = ExternalDigitizer::new("sh").with_timeout(Duration::from_secs(1));
        match tool.run(["-c", "sleep 5"]).await {
            Err(DigitizeError::ExternalTimeout { seconds }) => assert_eq!(seconds, 1),
            other => panic!("expected ExternalTimeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_an_io_error() {
        let tool = ExternalDigitizer::new("definitely-not-a-digitizer-binary");
        assert!(matches!(tool.run(Vec::<String>::new()).await, Err(DigitizeError::Io(_))));
    }
}
