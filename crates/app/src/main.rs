use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use petri_layout::{Canvas, LayeredLayout, LayoutEngine, Orientation};
use petri_net::PetriNet;
use ron::ser::PrettyConfig;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Direction {
    LeftToRight,
    TopToBottom,
}

impl From<Direction> for Orientation {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::LeftToRight => Orientation::LeftToRight,
            Direction::TopToBottom => Orientation::TopToBottom,
        }
    }
}

/// Lay out a Petri net stored as RON and write it back with positions and
/// arc anchors
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Net to lay out
    input: PathBuf,

    /// Where to write the laid out net, stdout if omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Width of the drawing area in pixels
    #[arg(long)]
    width: Option<f32>,

    /// Height of the drawing area in pixels
    #[arg(long)]
    height: Option<f32>,

    #[arg(long, value_enum, default_value_t = Direction::LeftToRight)]
    orientation: Direction,

    /// Maximum barycenter sweeps for crossing reduction
    #[arg(long)]
    sweeps: Option<usize>,
}

impl Args {
    /// Layout engine for the arguments. A missing or empty drawing area
    /// falls back to the default canvas.
    fn engine(&self) -> LayeredLayout {
        let fallback = Canvas::default();
        let canvas = Canvas::from_render_target(Some((
            self.width.unwrap_or(fallback.width),
            self.height.unwrap_or(fallback.height),
        )));

        let mut engine = LayeredLayout::new(canvas).with_orientation(self.orientation.into());
        if let Some(sweeps) = self.sweeps {
            engine.max_ordering_sweeps = sweeps;
        }
        engine
    }
}

/// Parse a net, lay it out and serialize the result
fn layout_ron(text: &str, engine: &LayeredLayout) -> Result<String> {
    let mut net: PetriNet = ron::from_str(text).context("Failed to parse the net")?;
    debug!(
        "Loaded net with {} nodes and {} arcs",
        net.nodes().len(),
        net.arcs().len()
    );

    let layout = engine.layout(&net).context("Layout failed")?;
    info!(
        "Laid out {} nodes on {} layers with {} crossings, {} arcs reversed",
        layout.positions.len(),
        layout.layer_count,
        layout.crossings,
        layout.reversed.len()
    );
    layout
        .apply_to(&mut net)
        .context("Failed to apply the layout")?;

    ron::ser::to_string_pretty(&net, PrettyConfig::default())
        .context("Failed to serialize the net")
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let output = layout_ron(&text, &args.engine())?;

    match &args.output {
        Some(path) => std::fs::write(path, output)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{output}"),
    }
    Ok(())
}
