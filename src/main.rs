mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fontbatch::artifact::Compression;
use fontbatch::audit::AUDIT_LIMIT;
use fontbatch::config::{PipelineConfig, ToolConfig, DEFAULT_BATCH_SIZE, DEFAULT_WORKERS};
use fontbatch::model::{Alignment, OutputKind};

#[derive(Parser)]
#[command(
    name = "fontbatch",
    version,
    about = "Batch font asset pipeline over an external build toolchain"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Root of the drawing-library module; font repos are its siblings
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Registry file (default: all-fonts.txt under --root)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// External build-and-run tool
    #[arg(long, default_value = "moon", global = true)]
    tool: String,

    /// Compilation target passed to the tool
    #[arg(long, default_value = "native", global = true)]
    target: String,

    /// Do not pass --target to the tool
    #[arg(long, global = true)]
    no_target: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

impl Cli {
    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new(&self.root).with_tool(ToolConfig {
            program: self.tool.clone(),
            target: (!self.no_target).then(|| self.target.clone()),
        });
        if let Some(registry) = &self.registry {
            config = config.with_registry(registry);
        }
        config
    }
}

/// Options shared by commands that run units through the pool.
#[derive(Args)]
struct BatchArgs {
    /// Number of parallel workers
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Keep the temporary project directories
    #[arg(long)]
    keep: bool,

    /// Write the batch report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serialize every font package to a (compressed) JSON artifact
    #[command(alias = "compress")]
    Serialize {
        /// Specific font names or packages to process
        fonts: Vec<String>,
        /// Output directory
        #[arg(long, default_value = "all-fonts")]
        outdir: PathBuf,
        /// Limit the number of fonts to process
        #[arg(long)]
        limit: Option<usize>,
        /// Re-process even if the output file exists
        #[arg(long)]
        force: bool,
        /// Artifact codec (gzip, zstd, none)
        #[arg(long, default_value = "gzip")]
        compression: Compression,
        #[command(flatten)]
        batch: BatchArgs,
    },
    /// Render text in one font family
    Render {
        /// Input file or literal text; defaults to stdin
        input: Option<String>,
        /// Font family name (prefix matching supported)
        #[arg(short, long, default_value = "aaarghnormal")]
        font: String,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output kind (json, svg)
        #[arg(long, default_value = "json")]
        format: OutputKind,
        /// Horizontal alignment (left, center, right)
        #[arg(short, long, default_value = "left")]
        align: Alignment,
        /// Use y-up coordinates
        #[arg(long, conflicts_with = "y_down")]
        y_up: bool,
        /// Use y-down coordinates
        #[arg(long)]
        y_down: bool,
        /// Keep the temporary project directory
        #[arg(long)]
        keep: bool,
        /// List all available font families and exit
        #[arg(long)]
        list_fonts: bool,
    },
    /// Render sample sheets covering the whole corpus
    Sample {
        /// Input file or literal text; defaults to stdin
        input: Option<String>,
        /// Output SVG base name (sample.svg -> sample-001.svg)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Number of fonts per sheet
        #[arg(short = 'n', long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        /// Font used for labels
        #[arg(long, default_value = "aileron_bold")]
        label_font: String,
        /// Limit the total number of fonts to render
        #[arg(long)]
        limit: Option<usize>,
        /// Fonts per grid row
        #[arg(long, default_value_t = 6)]
        columns: usize,
        #[command(flatten)]
        batch: BatchArgs,
    },
    /// List font families and their variants
    List,
    /// Regenerate the registry from sibling font repositories
    Enumerate {
        /// Output file (defaults to the registry path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report oversize source files and lines in sibling repositories
    Audit {
        /// Maximum lines per file and characters per line
        #[arg(long, default_value_t = AUDIT_LIMIT)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);
    let config = cli.config();

    match cli.command {
        Commands::Serialize {
            fonts,
            outdir,
            limit,
            force,
            compression,
            batch,
        } => {
            let opts = commands::serialize::Options {
                fonts,
                outdir,
                limit,
                force,
                compression,
            };
            commands::serialize::execute(config.with_workers(batch.workers), opts, batch.into()).await
        }
        Commands::Render {
            input,
            font,
            output,
            format,
            align,
            y_up,
            y_down,
            keep,
            list_fonts,
        } => {
            if list_fonts {
                return commands::list::execute(&config);
            }
            let y_up = match (y_up, y_down) {
                (true, _) => true,
                (_, true) => false,
                _ => format.default_y_up(),
            };
            let opts = commands::render::Options {
                input,
                font,
                output,
                format,
                align,
                y_up,
            };
            commands::render::execute(config.with_retained_sandbox(keep), opts).await
        }
        Commands::Sample {
            input,
            output,
            batch_size,
            label_font,
            limit,
            columns,
            batch,
        } => {
            let opts = commands::sample::Options {
                input,
                output,
                label_font,
                limit,
                columns,
            };
            let config = config
                .with_workers(batch.workers)
                .with_batch_size(batch_size);
            commands::sample::execute(config, opts, batch.into()).await
        }
        Commands::List => commands::list::execute(&config),
        Commands::Enumerate { output } => commands::enumerate::execute(&config, output.as_deref()),
        Commands::Audit { limit } => commands::audit::execute(&config, limit),
    }
}

impl From<BatchArgs> for commands::RunOptions {
    fn from(args: BatchArgs) -> Self {
        Self {
            keep: args.keep,
            report: args.report,
        }
    }
}
