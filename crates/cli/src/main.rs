mod script;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use poseguide_core::capture::domain::capture_failure_policy::CaptureFailurePolicy;
use poseguide_core::capture::domain::sequencer_event::{SequencerEvent, StageArtifact};
use poseguide_core::capture::infrastructure::png_capture_encoder::PngCaptureEncoder;
use poseguide_core::detection::infrastructure::scripted_face_observer::ScriptedFaceObserver;
use poseguide_core::pipeline::guided_capture_use_case::{
    GuidedCaptureUseCase, SessionOutcome, SessionUpdate,
};
use poseguide_core::pipeline::session_logger::LogSessionLogger;
use poseguide_core::shared::config::GuidanceConfig;

use script::Script;

/// Replays a scripted face-measurement stream through a guided capture session.
#[derive(Parser)]
#[command(name = "poseguide")]
struct Cli {
    /// JSON script of face/luminance segments.
    script: PathBuf,

    /// JSON config file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames per second to replay the script at.
    #[arg(long, default_value = "30")]
    fps: f64,

    /// Yaw (radians) beyond which a face counts as turned.
    #[arg(long)]
    yaw_threshold: Option<f64>,

    /// Mean luma (0-255) that must be exceeded for adequate lighting.
    #[arg(long)]
    luminance_threshold: Option<f64>,

    /// Milliseconds between capture-condition evaluations.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Milliseconds per countdown step.
    #[arg(long)]
    countdown_step_ms: Option<u64>,

    /// Re-check the capture condition on every countdown step.
    #[arg(long)]
    revalidate: bool,

    /// What to do when encoding a capture fails: advance, retry-stage, halt.
    #[arg(long)]
    failure_policy: Option<String>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let script = Script::load(&cli.script)?;
    log::info!(
        "Replaying {} frames at {} fps",
        script.total_frames(),
        cli.fps
    );

    let use_case = GuidedCaptureUseCase::new(
        config.clone(),
        Box::new(ScriptedFaceObserver::new(script.observations())),
        Arc::new(PngCaptureEncoder::new()),
        Box::new(LogSessionLogger::new()),
        Box::new(LogSessionLogger::new()),
    )
    .with_frame_interval(Duration::from_secs_f64(1.0 / cli.fps));

    let outcome = use_case.execute(script.frames(), &mut print_update);

    match outcome {
        SessionOutcome::Completed(artifacts) => {
            let captured = artifacts.iter().filter(|a| a.is_captured()).count();
            println!("Sequence complete: {captured}/{} stages captured", artifacts.len());
            print_artifacts(&artifacts, &config);
            Ok(())
        }
        SessionOutcome::Aborted { stage, error } => {
            Err(format!("Capture aborted at stage {stage}: {error}").into())
        }
        SessionOutcome::Incomplete { progress } => Err(format!(
            "Script ended at stage {} of {} before the sequence finished",
            progress.stage_index + 1,
            progress.stage_count
        )
        .into()),
        SessionOutcome::Cancelled => Err("Session cancelled".into()),
    }
}

fn print_update(update: SessionUpdate) {
    match update {
        SessionUpdate::Prompt(prompt) => println!("> {prompt}"),
        SessionUpdate::Event(SequencerEvent::CountdownStep { remaining, .. }) => {
            println!("  {remaining}...")
        }
        SessionUpdate::Event(event) => println!("  {event}"),
    }
}

fn build_config(cli: &Cli) -> Result<GuidanceConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => GuidanceConfig::load(path)?,
        None => GuidanceConfig::load_or_default(),
    };

    if let Some(v) = cli.yaw_threshold {
        config.pose.yaw_threshold = v;
    }
    if let Some(v) = cli.luminance_threshold {
        config.lighting.threshold = v;
    }
    if let Some(v) = cli.tick_ms {
        config.sequence.tick_interval_ms = v;
    }
    if let Some(v) = cli.countdown_step_ms {
        config.sequence.countdown_step_ms = v;
    }
    if cli.revalidate {
        config.sequence.revalidate_during_countdown = true;
    }
    if let Some(policy) = &cli.failure_policy {
        config.sequence.capture_failure_policy = parse_failure_policy(policy);
    }

    config.validate()?;
    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.script.exists() {
        return Err(format!("Script file not found: {}", cli.script.display()).into());
    }
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
    }
    if !(cli.fps.is_finite() && cli.fps > 0.0 && cli.fps <= 1000.0) {
        return Err(format!("FPS must be between 0 and 1000, got {}", cli.fps).into());
    }
    if let Some(policy) = &cli.failure_policy {
        let valid = ["advance", "retry-stage", "halt"];
        if !valid.contains(&policy.as_str()) {
            return Err(format!(
                "Failure policy must be one of: advance, retry-stage, halt, got '{policy}'"
            )
            .into());
        }
    }
    Ok(())
}

fn parse_failure_policy(policy: &str) -> CaptureFailurePolicy {
    match policy {
        "retry-stage" => CaptureFailurePolicy::RetryStage,
        "halt" => CaptureFailurePolicy::Halt,
        _ => CaptureFailurePolicy::Advance,
    }
}

fn print_artifacts(artifacts: &[StageArtifact], config: &GuidanceConfig) {
    for (stage, artifact) in artifacts.iter().enumerate() {
        let orientation = config
            .sequence
            .required_orientations
            .get(stage)
            .map(|o| o.to_string())
            .unwrap_or_default();
        match artifact {
            StageArtifact::Captured(handle) => println!(
                "  stage {stage} ({orientation}): {}x{} PNG, {} bytes",
                handle.width(),
                handle.height(),
                handle.bytes().len()
            ),
            StageArtifact::Failed(error) => {
                println!("  stage {stage} ({orientation}): failed: {error}")
            }
        }
    }
}
