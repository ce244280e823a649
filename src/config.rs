use std::path::PathBuf;

use clap::Parser;

use crate::attribute::AttributeStrategy;
use crate::choice::ColourChoice;
use crate::dither::DitherStrategy;
use crate::distance::ColourDistance;
use crate::gigascreen::GigaScreenPaletteFamily;
use crate::gigascreen::order::GigaScreenPaletteOrder;
use crate::options::Options;
use crate::preprocess::Scaling;
use crate::tap;

#[derive(Debug, Parser)]
#[command(version, about, author = "Jason Lynch <jason@aexoden.com>")]
pub struct Config {
    /// Images to convert. Each one becomes a frame of the output.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory that receives the converted files.
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// JSON file with conversion options. Flags below override its values.
    #[arg(long)]
    pub options: Option<PathBuf>,

    #[arg(long)]
    pub dither: Option<DitherStrategy>,

    #[arg(long, value_enum)]
    pub colour_mode: Option<ColourChoice>,

    #[arg(long, value_enum)]
    pub colour_distance: Option<ColourDistance>,

    #[arg(long, value_enum)]
    pub attribute_mode: Option<AttributeStrategy>,

    #[arg(long, value_enum)]
    pub gigascreen_attribute_mode: Option<GigaScreenPaletteFamily>,

    #[arg(long, value_enum)]
    pub gigascreen_palette_order: Option<GigaScreenPaletteOrder>,

    #[arg(long, value_enum)]
    pub scaling: Option<Scaling>,

    /// Alternate error diffusion direction on every other row.
    #[arg(long)]
    pub serpentine: bool,

    /// Keep diffused error inside each attribute block.
    #[arg(long)]
    pub constrained: bool,

    /// Write a PNG preview of every frame.
    #[arg(long)]
    pub png: bool,

    /// Write an SCR file for every frame.
    #[arg(long)]
    pub scr: bool,

    /// Write every frame as text, one ROM font character per block.
    #[arg(long)]
    pub text: bool,

    /// Write every frame into a single TAP file with this name.
    #[arg(long)]
    pub tap: Option<PathBuf>,

    /// Framed TAP loader program placed before the screens.
    #[arg(long, requires = "tap")]
    pub loader: Option<PathBuf>,

    /// Tape header name for every screen.
    #[arg(long, default_value = tap::DEFAULT_NAME)]
    pub name: String,

    /// Increase log output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    /// Applies command line overrides on top of `options`.
    pub fn apply(&self, options: &mut Options) {
        if let Some(dither) = self.dither {
            options.dither = dither;
        }

        if let Some(colour_mode) = self.colour_mode {
            options.colour_mode = colour_mode;
        }

        if let Some(colour_distance) = self.colour_distance {
            options.colour_distance = colour_distance;
        }

        if let Some(attribute_mode) = self.attribute_mode {
            options.attribute_mode = attribute_mode;
        }

        if let Some(family) = self.gigascreen_attribute_mode {
            options.gigascreen_attribute_mode = family;
        }

        if let Some(order) = self.gigascreen_palette_order {
            options.gigascreen_palette_order = order;
        }

        if let Some(scaling) = self.scaling {
            options.scaling = scaling;
        }

        options.serpentine |= self.serpentine;
        options.constrained_error_diffusion |= self.constrained;
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dither::ErrorDiffusionKernel;

    #[test]
    fn flags_override_options() {
        let config = Config::parse_from([
            "zxspec",
            "--dither",
            "floyd-steinberg",
            "--colour-mode",
            "gigascreen",
            "--serpentine",
            "--text",
            "in.png",
        ]);
        let mut options = Options::default();

        config.apply(&mut options);

        assert_eq!(options.dither, DitherStrategy::ErrorDiffusion(ErrorDiffusionKernel::FloydSteinberg));
        assert_eq!(options.colour_mode, ColourChoice::GigaScreen);
        assert!(options.serpentine);
        assert!(!options.constrained_error_diffusion);
        assert!(config.text);
        assert_eq!(config.inputs, vec![PathBuf::from("in.png")]);
    }

    #[test]
    fn rejects_unknown_dither() {
        assert!(Config::try_parse_from(["zxspec", "--dither", "sparkle", "in.png"]).is_err());
    }

    #[test]
    fn loader_requires_tap() {
        assert!(Config::try_parse_from(["zxspec", "--loader", "boot.tap", "in.png"]).is_err());
    }

    #[test]
    fn cli_is_consistent() {
        use clap::CommandFactory;

        Config::command().debug_assert();
    }
}
