//! SignEase command line tool: landmark trace replay, text to ASL and history.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use signease::{
    app::SignEaseApp,
    cli::{Cli, Command},
    config::{Config, EXAMPLE_CONFIG},
    landmarks::{LandmarkTrace, ScriptedLandmarks},
    lip_reading::LipReader,
    session::SessionRegistry,
    text_to_asl,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logger
    if cli.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("SignEase {} ({})", env!("CARGO_PKG_VERSION"), env!("BUILD_TARGET"));

    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(path) = &cli.history {
        config.history.path = Some(path.clone());
    }

    match cli.command {
        Command::Replay {
            trace,
            fps,
            session,
            json,
        } => replay(config, &trace, fps, &session, json),
        Command::Translate { text } => {
            let translation = text_to_asl::translate(&text.join(" "))?;
            for (word, animation) in translation.words.iter().zip(&translation.animations) {
                if animation.is_empty() {
                    println!("{word}\t(no animation)");
                } else {
                    println!("{word}\t{animation}");
                }
            }
            Ok(())
        }
        Command::Words => {
            for template in &config.lip_reading.templates {
                println!(
                    "{:<10} open {:.2}  movement {:.2}  pattern {:?}",
                    template.name, template.target_open_ratio, template.target_movement, template.pattern_thirds
                );
            }
            Ok(())
        }
        Command::History { limit, kind, stats } => {
            let app = SignEaseApp::from_config(config)?;
            if stats {
                println!("{}", serde_json::to_string_pretty(&app.statistics()?)?);
            } else {
                for record in app.history(limit, kind.as_deref())? {
                    println!(
                        "#{:<4} {}  {:<12} {:<16} {:.2}",
                        record.id, record.date, record.kind, record.output, record.confidence
                    );
                }
            }
            Ok(())
        }
        Command::Config => {
            print!("{EXAMPLE_CONFIG}");
            Ok(())
        }
    }
}

fn replay(config: Config, path: &std::path::Path, fps: f64, session: &str, json: bool) -> Result<()> {
    if !fps.is_finite() || fps <= 0.0 {
        bail!("--fps must be a positive number");
    }

    let trace = Arc::new(LandmarkTrace::from_file(path).with_context(|| format!("loading trace {}", path.display()))?);
    info!("Replaying {} frames from {}", trace.len(), path.display());

    let lip_config = config.lip_reading.clone();
    let factory_trace = Arc::clone(&trace);
    let sessions = SessionRegistry::new(Box::new(move |_: &str| {
        LipReader::with_config(Box::new(ScriptedLandmarks::from(factory_trace.as_ref())), &lip_config)
    }));
    let mut app = SignEaseApp::with_sessions(config, sessions)?;

    let frame = trace.blank_frame();
    let frame_interval = Duration::try_from_secs_f64(1.0 / fps).context("--fps is too small")?;
    let start = Instant::now();
    let mut at = start;

    for index in 0..trace.len() {
        let response = app.predict_lip_at(session, &frame, at);
        if json {
            println!("{}", serde_json::to_string(&response)?);
        } else if response.outcome.emitted {
            println!(
                "frame {index:>5}: {} ({:.3})",
                response.outcome.matched_word.as_deref().unwrap_or_default(),
                response.outcome.confidence
            );
        } else if response.outcome.status.starts_with("Error") {
            warn!("frame {index}: {}", response.outcome.status);
        }
        at += frame_interval;
    }

    if let Some(stats) = app.lip_stats(session) {
        println!("Transcript: {}", stats.current_text.trim_end());
        println!(
            "Frames: {}  words: {}",
            stats.stats.frames_seen, stats.stats.words_emitted
        );
    }
    Ok(())
}
