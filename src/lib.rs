//! Converts truecolour images into ZX Spectrum screens.
//!
//! Frames are scaled, dithered onto the Spectrum palette and reduced to two
//! colours per 8x8 attribute block (or four blended colours in GigaScreen
//! mode), then encoded as SCR screen dumps, TAP tape images or text drawn
//! with the ROM font.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, bail};
use image::RgbImage;
use log::{debug, info};

pub mod attribute;
pub mod choice;
pub mod colour;
pub mod config;
pub mod distance;
pub mod dither;
pub mod error;
pub mod gigascreen;
pub mod options;
pub mod pipeline;
pub mod preprocess;
pub mod scr;
pub mod tap;
pub mod util;

pub use error::{Error, Result};
pub use gigascreen::GigaScreenCache;
pub use options::Options;
pub use pipeline::{ResultImage, ResultImageKind};

struct Frame {
    path: PathBuf,
    results: Vec<ResultImage>,
}

fn load_options(config: &config::Config) -> anyhow::Result<Options> {
    let mut options = match &config.options {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading options from {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing options in {}", path.display()))?
        }
        None => Options::default(),
    };

    config.apply(&mut options);
    options.validate()?;

    Ok(options)
}

fn load_image(path: &Path) -> anyhow::Result<RgbImage> {
    Ok(image::open(path)
        .with_context(|| format!("decoding {}", path.display()))?
        .to_rgb8())
}

/// Converts every source on its own scoped thread, keeping input order.
fn convert_frames(sources: Vec<(PathBuf, RgbImage)>, options: &Options) -> anyhow::Result<Vec<Frame>> {
    let cache = GigaScreenCache::default();

    thread::scope(|scope| {
        let handles: Vec<_> = sources
            .into_iter()
            .map(|(path, source)| {
                let cache = &cache;
                scope.spawn(move || {
                    let results = pipeline::process_frame(&source, options, cache)?;
                    Ok::<_, Error>(Frame { path, results })
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(frame) => Ok(frame?),
                Err(_) => bail!("conversion thread panicked"),
            })
            .collect()
    })
}

fn output_path(config: &config::Config, source: &Path, extension: &str) -> PathBuf {
    let stem = source.file_stem().map_or_else(|| "frame".into(), |stem| stem.to_string_lossy());
    config.output_dir.join(format!("{stem}.{extension}"))
}

pub fn run(config: config::Config) -> anyhow::Result<()> {
    let options = load_options(&config)?;
    info!(
        "Converting {} image(s): {:?} colours, {} dithering",
        config.inputs.len(),
        options.colour_mode,
        options.dither
    );

    let sources = config
        .inputs
        .iter()
        .map(|path| Ok((path.clone(), load_image(path)?)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let frames = convert_frames(sources, &options)?;

    if config.png || config.text || config.scr || config.tap.is_some() {
        fs::create_dir_all(&config.output_dir)
            .with_context(|| format!("creating {}", config.output_dir.display()))?;
    }

    let mut parts = Vec::new();

    for frame in &frames {
        if config.png {
            if let Some(image) = pipeline::final_image(&frame.results) {
                let path = output_path(&config, &frame.path, "png");
                image.save(&path).with_context(|| format!("writing {}", path.display()))?;
                info!("Wrote {}", path.display());
            }
        }

        if config.text {
            if let Some(image) = pipeline::final_image(&frame.results) {
                let path = output_path(&config, &frame.path, "txt");
                fs::write(&path, dither::character::to_text(image, &options))
                    .with_context(|| format!("writing {}", path.display()))?;
                info!("Wrote {}", path.display());
            }
        }

        if !config.scr && config.tap.is_none() {
            continue;
        }

        let data = scr::convert(&frame.results, &options);
        debug!("{} encoded to {} SCR bytes", frame.path.display(), data.len());

        if config.scr {
            let path = output_path(&config, &frame.path, "scr");
            fs::write(&path, &data).with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {}", path.display());
        }

        if config.tap.is_some() {
            parts.extend(tap::create_tap_parts(&data, &config.name)?);
        }
    }

    if let Some(name) = &config.tap {
        let loader = match &config.loader {
            Some(path) => fs::read(path).with_context(|| format!("reading loader {}", path.display()))?,
            None => Vec::new(),
        };

        let path = config.output_dir.join(name);
        fs::write(&path, tap::create_tap(&loader, &parts)).with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote {} with {} screen(s)", path.display(), parts.len());
    }

    Ok(())
}
