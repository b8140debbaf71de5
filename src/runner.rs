//! Command runner - executes the parsed CLI subcommand.

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use std::path::Path;
use std::time::Duration;

use crate::cli::{Args, Command, ViewArgs};
use crate::config::ReelConfig;
use crate::entities::{frame_label, FrameStatus};
use crate::paths::{self, PathConfig};
use crate::reel::Reel;

/// Run the subcommand in `args`. Logging must already be initialized.
pub fn run(args: Args) -> Result<()> {
    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    let config = resolve_config(&args, &path_config)?;
    debug!("Effective config: {:?}", config);

    match &args.command {
        Command::Render { view, scroll, output, .. } => render(&config, view, *scroll, output),
        Command::Sweep {
            view,
            steps,
            resize,
            out_dir,
            ..
        } => sweep(&config, view, *steps, *resize, out_dir),
        Command::Probe { list_failed, .. } => probe(&config, *list_failed),
    }
}

/// CLI flags > config file > defaults
fn resolve_config(args: &Args, path_config: &PathConfig) -> Result<ReelConfig> {
    let mut config = match &args.config {
        Some(file) => ReelConfig::load(file)?,
        None => {
            let file = paths::config_file(paths::CONFIG_FILE, path_config);
            info!("Config path: {}", file.display());
            ReelConfig::load_or_default(&file)?
        }
    };
    args.command.reel().apply_to(&mut config);
    config.validate()?;
    Ok(config)
}

fn open_ready(config: &ReelConfig) -> Result<Reel> {
    let mut reel = Reel::open(config)?;
    let timeout = Duration::from_secs(config.load_timeout_secs);
    if !reel.wait_ready(timeout) {
        let state = reel.loader().state();
        bail!(
            "Loading timed out after {}s ({} of {} frames)",
            config.load_timeout_secs,
            state.completed(),
            state.total()
        );
    }
    let failed = reel.loader().state().failed();
    if failed > 0 {
        warn!("{} of {} frames failed to load", failed, config.total_frames);
    }
    Ok(reel)
}

fn render(config: &ReelConfig, view: &ViewArgs, scroll: f64, output: &Path) -> Result<()> {
    let reel = open_ready(config)?;
    let metrics = view.metrics(scroll);
    reel.resize(metrics);
    reel.tick();

    let index = reel.current_frame();
    debug!(
        "Overlay opacity {:.2}, scroll cue {}",
        metrics.hero_opacity(),
        if metrics.show_scroll_cue() { "shown" } else { "hidden" }
    );
    reel.save_canvas(output)
        .with_context(|| format!("Frame {} was not drawn", index))?;
    println!(
        "{} (progress {:.3}) -> {}",
        frame_label(index, config.total_frames),
        metrics.progress(),
        output.display()
    );
    Ok(())
}

fn sweep(
    config: &ReelConfig,
    view: &ViewArgs,
    steps: usize,
    resize: Option<(u32, u32)>,
    out_dir: &Path,
) -> Result<()> {
    let reel = open_ready(config)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let mut view = view.clone();
    let steps = steps.max(1);
    let mut written = 0usize;
    let mut last_count = reel.draw_count();

    // Even spacing from region start to the end of its scrollable span
    let offset_at = |view: &ViewArgs, step: usize| {
        let m = view.metrics(0.0);
        m.region_top + (m.scroll_end() - m.region_top) * step as f64 / steps as f64
    };

    // Give the renderer a viewport before the first step
    reel.resize(view.metrics(offset_at(&view, 0)));

    for step in 0..=steps {
        match resize {
            Some((w, h)) if step == steps / 2 => {
                info!("Resizing viewport to {}x{}", w, h);
                view.width = w;
                view.height = h;
                reel.resize(view.metrics(offset_at(&view, step)));
            }
            _ => reel.scroll(view.metrics(offset_at(&view, step))),
        }
        reel.tick();

        let count = reel.draw_count();
        if count != last_count {
            last_count = count;
            let index = reel.current_frame();
            let file = out_dir.join(format!("sweep_{:03}_frame_{:04}.png", step, index));
            reel.save_canvas(&file)?;
            debug!("Step {}: {} -> {}", step, frame_label(index, config.total_frames), file.display());
            written += 1;
        }
    }

    println!("{} steps, {} frames written to {}", steps + 1, written, out_dir.display());
    Ok(())
}

fn probe(config: &ReelConfig, list_failed: bool) -> Result<()> {
    let reel = open_ready(config)?;
    let loader = reel.loader();
    let state = loader.state();
    let (loaded, failed) = loader.sequence().counts();

    println!("Folder:   {}", loader.sequence().folder().display());
    println!("Frames:   {}", state.total());
    println!("Loaded:   {}", loaded);
    println!("Failed:   {}", failed);
    println!("Progress: {}%", state.progress_percent());
    println!("Ready:    {}", state.is_ready());

    if let Some(frame) = loader.frame(0) {
        if let Some((w, h)) = frame.resolution() {
            println!("Size:     {}x{}", w, h);
        }
    }

    if list_failed {
        for (index, frame) in loader.sequence().iter().enumerate() {
            if frame.status() == FrameStatus::Error {
                let reason = frame.error().map(|e| e.to_string()).unwrap_or_default();
                println!("  {:>5}  {}  {}", index, frame.path().display(), reason);
            }
        }
    }
    Ok(())
}
