//! Command line front end.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use image::RgbImage;

use svd_demo::config::{AppConfig, ConfigError, LogLevel};
use svd_demo::constants::{
    DEFAULT_TEST_HEIGHT, DEFAULT_TEST_WIDTH, WORKER_POLL_MS, sweep_modes,
};
use svd_demo::data::{Channel, codec};
use svd_demo::error::SvdError;
use svd_demo::state::{ReconstructionWorker, WorkerResult};
use svd_demo::svd::{
    ModePolicy, NalgebraSvd, Reconstruction, extract_with_preview, mean_squared_error, psnr,
    tint_channel,
};
use svd_demo::test_image::generate_test_image;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compress an image by truncating its SVD")]
struct Args {
    /// Input image (JPEG, PNG, BMP, TIFF or WebP)
    #[arg(required_unless_present = "test_image")]
    input: Option<PathBuf>,

    /// Output image; format chosen by extension
    #[arg(short, long)]
    output: PathBuf,

    /// Number of singular modes to keep (defaults to config, then full rank)
    #[arg(short = 'k', long, conflicts_with = "sweep")]
    modes: Option<usize>,

    /// Reconstruct with a series of mode counts and report the error of each
    #[arg(long)]
    sweep: bool,

    /// JPEG quality for the output, 1-100
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Also write isolated and reconstructed channel images to this directory
    #[arg(long)]
    split_dir: Option<PathBuf>,

    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use a generated WIDTHxHEIGHT test image instead of an input file
    #[arg(long, value_name = "WxH", value_parser = parse_dimensions, num_args = 0..=1,
          default_missing_value = "default")]
    test_image: Option<(u32, u32)>,

    /// Clamp out-of-range mode counts instead of failing
    #[arg(long)]
    clamp: bool,

    /// Process color channels one after another
    #[arg(long)]
    sequential: bool,
}

/// Errors surfaced to the user by the binary.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Svd(#[from] SvdError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Reconstruction worker stopped without a result")]
    WorkerStopped,
}

/// Parse `WIDTHxHEIGHT`, or `default` for the built-in size.
fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    if value == "default" {
        return Ok((DEFAULT_TEST_WIDTH, DEFAULT_TEST_HEIGHT));
    }
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width: u32 = w.trim().parse().map_err(|e| format!("bad width '{}': {}", w, e))?;
    let height: u32 = h.trim().parse().map_err(|e| format!("bad height '{}': {}", h, e))?;
    if width == 0 || height == 0 {
        return Err("dimensions must be non-zero".to_string());
    }
    Ok((width, height))
}

/// `dir/name.ext` becomes `dir/name_<suffix>.ext`.
fn suffixed_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let file_name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    };
    path.with_file_name(file_name)
}

/// Configuration from `--config`, else from `default_path` if that file
/// exists, else defaults; then command line overrides.
///
/// An existing file that fails to parse is an error in both cases.
fn load_config(args: &Args, default_path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let path = args
        .config
        .clone()
        .or_else(|| default_path.filter(|path| path.exists()));
    let mut config = match path {
        Some(path) => AppConfig::load_from_path(&path)?,
        None => {
            log::debug!("No config file, using defaults");
            AppConfig::default()
        }
    };

    if let Some(quality) = args.quality {
        config.output.jpeg_quality = quality;
    }
    if args.clamp {
        config.pipeline.mode_policy = ModePolicy::Clamp;
    }
    if args.sequential {
        config.pipeline.parallel_channels = false;
    }
    Ok(config)
}

/// Install the logger at the default level, before the config is read.
fn init_logging() {
    // The builder passes everything; the level is enforced by the max level.
    // RUST_LOG directives replace the catch-all one.
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Trace)
        .parse_default_env()
        .init();
    set_log_level(LogLevel::default());
}

/// Apply a log level unless RUST_LOG already chose one.
fn set_log_level(level: LogLevel) {
    if std::env::var_os("RUST_LOG").is_none() {
        log::set_max_level(level.to_level_filter());
    }
}

/// Block until the worker delivers a result or goes idle without one.
fn wait_for_result(worker: &mut ReconstructionWorker) -> Result<WorkerResult, CliError> {
    let poll = Duration::from_millis(WORKER_POLL_MS);
    loop {
        if let Some(result) = worker.wait_result(poll) {
            return Ok(result);
        }
        if !worker.is_busy() {
            return worker.take_one_result().ok_or(CliError::WorkerStopped);
        }
    }
}

fn reconstruct(
    worker: &mut ReconstructionWorker,
    modes: usize,
) -> Result<Reconstruction, CliError> {
    worker.request_modes(modes);
    match wait_for_result(worker)? {
        WorkerResult::Reconstructed { reconstruction, .. } => Ok(reconstruction),
        WorkerResult::Error { error, .. } => Err(error.into()),
        WorkerResult::Loaded { .. } => Err(CliError::WorkerStopped),
    }
}

fn report(original: &RgbImage, reconstruction: &Reconstruction) -> Result<(), CliError> {
    let stats = reconstruction.stats();
    let mse = mean_squared_error(original, &reconstruction.image)?;
    let psnr = psnr(original, &reconstruction.image)?;
    println!(
        "k={:<5} {:>8.3} MB of {:.3} MB ({:>6.2}x)  MSE {:>9.3}  PSNR {:>6.2} dB",
        stats.modes,
        stats.mode_megabytes(),
        stats.full_megabytes(),
        stats.compression_ratio(),
        mse,
        psnr
    );
    let energy: Vec<String> = reconstruction
        .energy
        .iter()
        .map(|e| format!("{:.2}%", e * 100.0))
        .collect();
    println!("        energy kept (R G B): {}", energy.join(" "));
    Ok(())
}

fn write_split_channels(
    original: &RgbImage,
    reconstruction: &Reconstruction,
    dir: &Path,
    quality: u8,
) -> Result<(), CliError> {
    std::fs::create_dir_all(dir).map_err(SvdError::from)?;
    for channel in Channel::COLORS {
        let (_, preview) = extract_with_preview(original, channel)?;
        codec::save_image(&preview, &dir.join(format!("{}.png", channel)), quality)?;

        if let Some(gray) = reconstruction.channel(channel) {
            let tinted = tint_channel(gray, channel);
            let name = format!("{}_k{}.png", channel, reconstruction.modes);
            codec::save_image(&tinted, &dir.join(name), quality)?;
        }
    }
    log::info!("Wrote channel images to {:?}", dir);
    Ok(())
}

fn execute(args: &Args, config: &AppConfig) -> Result<(), CliError> {
    // Fail before the expensive part
    codec::check_output_path(&args.output)?;

    let (name, image) = match (args.test_image, &args.input) {
        (Some((width, height)), _) => (
            format!("test {}x{}", width, height),
            generate_test_image(width, height),
        ),
        (None, Some(path)) => (path.display().to_string(), codec::open_image(path)?),
        (None, None) => return Err(SvdError::EmptyImage.into()),
    };
    let quality = config.output.jpeg_quality;

    let mut worker =
        ReconstructionWorker::spawn(Box::new(NalgebraSvd), config.pipeline_options())?;
    worker.request_load(name, image.clone());
    let max_modes = match wait_for_result(&mut worker)? {
        WorkerResult::Loaded {
            name,
            width,
            height,
            max_modes,
            ..
        } => {
            println!("{}: {}x{}, up to {} modes", name, width, height, max_modes);
            max_modes
        }
        WorkerResult::Error { error, .. } => return Err(error.into()),
        WorkerResult::Reconstructed { .. } => return Err(CliError::WorkerStopped),
    };

    if args.sweep {
        let mut last = None;
        for k in sweep_modes(max_modes) {
            let reconstruction = reconstruct(&mut worker, k)?;
            report(&image, &reconstruction)?;
            let path = suffixed_path(&args.output, &format!("k{}", k));
            codec::save_image(&reconstruction.image, &path, quality)?;
            last = Some(reconstruction);
        }
        if let (Some(dir), Some(reconstruction)) = (&args.split_dir, &last) {
            write_split_channels(&image, reconstruction, dir, quality)?;
        }
        return Ok(());
    }

    let modes = args
        .modes
        .or(config.pipeline.default_modes)
        .unwrap_or(max_modes);
    let reconstruction = reconstruct(&mut worker, modes)?;
    report(&image, &reconstruction)?;
    println!(
        "Storage breaks even at {} modes",
        reconstruction.stats().break_even_modes()
    );
    codec::save_image(&reconstruction.image, &args.output, quality)?;
    println!("Wrote {}", args.output.display());

    if let Some(dir) = &args.split_dir {
        write_split_channels(&image, &reconstruction, dir, quality)?;
    }
    Ok(())
}

/// Parse arguments, run, and map failures to an exit code.
pub fn run() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let config = match load_config(&args, AppConfig::default_path()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    set_log_level(config.log_level);
    log::debug!("Using configuration {:?}", config);

    match execute(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(parse_dimensions("64x48"), Ok((64, 48)));
        assert_eq!(parse_dimensions("8X2"), Ok((8, 2)));
        assert_eq!(
            parse_dimensions("default"),
            Ok((DEFAULT_TEST_WIDTH, DEFAULT_TEST_HEIGHT))
        );
        assert!(parse_dimensions("64").is_err());
        assert!(parse_dimensions("0x4").is_err());
        assert!(parse_dimensions("ax4").is_err());
    }

    #[test]
    fn test_suffixed_path() {
        assert_eq!(
            suffixed_path(Path::new("out/cat.jpg"), "k5"),
            PathBuf::from("out/cat_k5.jpg")
        );
        assert_eq!(suffixed_path(Path::new("cat"), "k1"), PathBuf::from("cat_k1"));
    }

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("svd-demo").chain(args.iter().copied()))
            .expect("parse")
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("svd-demo-cli-{}-{}", std::process::id(), name));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn test_args_parse() {
        let args = parse(&["in.png", "-o", "out.jpg", "-k", "20", "--clamp"]);
        assert_eq!(args.input, Some(PathBuf::from("in.png")));
        assert_eq!(args.modes, Some(20));
        assert!(args.clamp);

        let args = parse(&["--test-image", "32x16", "-o", "out.png"]);
        assert_eq!(args.test_image, Some((32, 16)));

        assert!(Args::try_parse_from(["svd-demo", "-o", "out.png"]).is_err());
        assert!(
            Args::try_parse_from(["svd-demo", "in.png", "-o", "o.png", "-k", "3", "--sweep"])
                .is_err()
        );
        assert!(
            Args::try_parse_from(["svd-demo", "in.png", "-o", "o.png", "--quality", "0"])
                .is_err()
        );
    }

    #[test]
    fn test_malformed_config_file_is_an_error() {
        let dir = scratch_dir("bad-config");
        let path = dir.join(AppConfig::default_filename());
        std::fs::write(&path, "{ not json").expect("write config");

        let args = parse(&["in.png", "-o", "out.png"]);
        let result = load_config(&args, Some(path));
        let _ = std::fs::remove_dir_all(&dir);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_default_config_uses_defaults_and_flags() {
        let args = parse(&["in.png", "-o", "out.png", "--sequential", "--quality", "80"]);
        let missing = std::env::temp_dir().join("svd-demo-cli-no-such-dir/svd-demo.json");
        let config = load_config(&args, Some(missing)).expect("defaults");
        assert!(!config.pipeline.parallel_channels);
        assert_eq!(config.output.jpeg_quality, 80);
        assert_eq!(config.pipeline.mode_policy, ModePolicy::Reject);
    }

    #[test]
    fn test_execute_writes_reconstruction() {
        let dir = scratch_dir("single");
        let output = dir.join("out.png");
        let output_arg = output.to_string_lossy().to_string();
        let args = parse(&["--test-image", "16x12", "-o", output_arg.as_str(), "-k", "3"]);

        execute(&args, &AppConfig::default()).expect("execute");
        let written = codec::open_image(&output).expect("open output");
        let _ = std::fs::remove_dir_all(&dir);
        assert_eq!(written.dimensions(), (16, 12));
    }

    #[test]
    fn test_execute_sweep_with_split_channels() {
        let dir = scratch_dir("sweep");
        let output_arg = dir.join("out.png").to_string_lossy().to_string();
        let split = dir.join("split");
        let split_arg = split.to_string_lossy().to_string();
        let args = parse(&[
            "--test-image",
            "6x4",
            "-o",
            output_arg.as_str(),
            "--sweep",
            "--split-dir",
            split_arg.as_str(),
        ]);

        execute(&args, &AppConfig::default()).expect("execute");
        for k in [1, 2, 4] {
            assert!(dir.join(format!("out_k{}.png", k)).exists(), "missing k={}", k);
        }
        for channel in Channel::COLORS {
            assert!(split.join(format!("{}.png", channel)).exists());
            assert!(split.join(format!("{}_k4.png", channel)).exists());
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_execute_rejects_unsupported_output_before_work() {
        let args = parse(&["--test-image", "4x4", "-o", "out.pdf"]);
        assert!(matches!(
            execute(&args, &AppConfig::default()),
            Err(CliError::Svd(SvdError::UnsupportedFormat(_)))
        ));
    }
}
