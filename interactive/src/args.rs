use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use canvas2d::{Config, DrawMode};

#[derive(Debug, Parser)]
pub struct Args {
    /// What to draw
    #[arg(value_enum, default_value_t = ModeArg::Rectangles)]
    pub mode: ModeArg,
    /// Amount of random rectangles (overrides the config file)
    #[arg(short, long)]
    pub count: Option<usize>,
    /// Seed for rectangle placement and colors (overrides the config file)
    #[arg(short, long)]
    pub seed: Option<u64>,
    /// Path to JSON5 config file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Draw one frame into a recording context instead of opening a window
    #[arg(long)]
    pub headless: bool,
    /// Only observe logical content box sizes
    #[arg(long)]
    pub no_device_pixels: bool,
    /// Log filter, e.g. "debug" or "canvas2d=trace"
    #[arg(long)]
    pub log: Option<String>,
}

impl Args {
    pub fn apply(&self, config: &mut Config) {
        if let Some(count) = self.count {
            config.random.count = count;
        }
        if let Some(seed) = self.seed {
            config.random.seed = seed;
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ModeArg {
    Triangle,
    Rectangle,
    Rectangles,
}

impl ModeArg {
    pub fn draw_mode(self, config: &Config) -> DrawMode {
        match self {
            ModeArg::Triangle => DrawMode::Triangle,
            ModeArg::Rectangle => DrawMode::Rectangle,
            ModeArg::Rectangles => DrawMode::RandomRectangles {
                count: config.random.count,
            },
        }
    }
}
