use clap::{Parser, Subcommand};
use image_converter::assets::{RawFile, expand_inputs};
use image_converter::config::{self, DEFAULT_CONFIG_FILE};
use image_converter::export::bundle::ZipArchiver;
use image_converter::export::document::PdfEncoder;
use image_converter::export::sink::{DirectoryDownloader, Downloader, SystemClipboard};
use image_converter::export::{ExportJob, ExportReport, Services};
use image_converter::imaging::{CommandConverter, PosterizeTracer, RustBackend};
use image_converter::naming::{base_name_or, indexed_name};
use image_converter::output;
use image_converter::workspace::Workspace;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SVG_MIME: &str = "image/svg+xml";

#[derive(clap::Args, Clone)]
struct Inputs {
    /// Image files or directories (searched recursively)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(clap::Args, Clone)]
struct SvgArgs {
    #[command(flatten)]
    inputs: Inputs,

    /// Copy the trace of image N (1-based) to the clipboard
    #[arg(long, value_name = "N")]
    copy: Option<usize>,

    /// Also print every trace to stdout
    #[arg(long)]
    print: bool,
}

#[derive(Parser)]
#[command(name = "image-converter")]
#[command(about = "Resize and convert batches of images")]
#[command(long_about = "\
Resize and convert batches of images

Loads every input image (directories are searched recursively), sets a
target size, then exports:

  png / jpg / ico   one file per image at the target size
  screenshots       fixed-size App Store screenshots (zipped when batching)
  svg               vector traces at the target size
  bundle            zipped web-app icon set plus a trace per image
  pdf               every image at natural size on one page

The target size starts at the first image's natural size. Width and height
keep the aspect ratio unless --no-keep-ratio is given or both are set.
HEIC/HEIF photos are converted to JPEG first with an external program.

Run 'image-converter gen-config' to generate a documented image-converter.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults apply when it does not exist)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory downloads are written to
    #[arg(long, short, default_value = ".", global = true)]
    output: PathBuf,

    /// Base name for exported files
    #[arg(long, global = true)]
    name: Option<String>,

    /// Target width
    #[arg(long, global = true, allow_hyphen_values = true)]
    width: Option<String>,

    /// Target height
    #[arg(long, global = true, allow_hyphen_values = true)]
    height: Option<String>,

    /// Named size preset from the config
    #[arg(long, global = true)]
    preset: Option<String>,

    /// Edit width and height independently
    #[arg(long, global = true)]
    no_keep_ratio: bool,

    /// Image (1-based) whose size seeds the target
    #[arg(long, global = true, value_name = "N")]
    select: Option<usize>,

    /// Print the info listing or export report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the loaded images and the target size
    Info(Inputs),
    /// Export PNG files at the target size
    Png(Inputs),
    /// Export JPEG files at the target size
    Jpg(Inputs),
    /// Export ICO files at the target size (max 256x256)
    Ico(Inputs),
    /// Export fixed-size App Store screenshots
    Screenshots(Inputs),
    /// Generate vector traces at the target size
    Svg(SvgArgs),
    /// Export the zipped web-app asset bundle
    Bundle(Inputs),
    /// Export every image into one PDF document
    Pdf(Inputs),
    /// Print a stock image-converter.toml with all options documented
    GenConfig,
}

impl Command {
    fn inputs(&self) -> &[PathBuf] {
        match self {
            Command::Info(i)
            | Command::Png(i)
            | Command::Jpg(i)
            | Command::Ico(i)
            | Command::Screenshots(i)
            | Command::Bundle(i)
            | Command::Pdf(i) => &i.inputs,
            Command::Svg(svg) => &svg.inputs.inputs,
            Command::GenConfig => &[],
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = config::load_config(&config_path)?;
    init_thread_pool(&config.processing);

    let backend = RustBackend::new();
    let heic = CommandConverter::new(config.heic.program.as_str());
    let tracer = PosterizeTracer::new(config.trace.levels, config.trace.min_alpha);
    let downloader = DirectoryDownloader::new(&cli.output);
    let services = Services {
        backend: &backend,
        heic: &heic,
        tracer: &tracer,
        document: &PdfEncoder,
        archiver: &ZipArchiver,
        downloader: &downloader,
    };

    let mut workspace = Workspace::new(config);
    let files = read_inputs(cli.command.inputs());
    let summary = workspace.load_files(files, &services);
    for line in output::format_load_summary(&summary) {
        eprintln!("{}", line);
    }
    if workspace.collection().is_empty() {
        return Err("No images could be loaded".into());
    }
    apply_edits(&cli, &mut workspace)?;

    let (job, report) = match &cli.command {
        Command::Info(_) => {
            if cli.json {
                let listing =
                    output::collection_listing(workspace.collection(), workspace.dimensions());
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                output::print_collection(workspace.collection(), workspace.dimensions());
            }
            return Ok(());
        }
        Command::Png(_) => (ExportJob::Png, workspace.export_png(&services)?),
        Command::Jpg(_) => (ExportJob::Jpeg, workspace.export_jpg(&services)?),
        Command::Ico(_) => (ExportJob::Ico, workspace.export_ico(&services)?),
        Command::Screenshots(_) => (
            ExportJob::Screenshots,
            workspace.export_screenshots(&services)?,
        ),
        Command::Bundle(_) => (ExportJob::Bundle, workspace.export_bundle(&services)?),
        Command::Pdf(_) => (ExportJob::Document, workspace.export_document(&services)?),
        Command::Svg(args) => {
            let mut report = workspace.generate_traces(&services)?;
            let written = write_traces(&workspace, &downloader, &mut report)?;
            if args.print {
                for (_, svg) in workspace.traces().iter() {
                    println!("{}", svg);
                }
            }
            if !cli.json {
                output::print_traces(workspace.collection(), workspace.traces(), &written);
            }
            if let Some(n) = args.copy {
                let index = n.checked_sub(1).ok_or("--copy is 1-based")?;
                if !workspace.copy_trace(index, &SystemClipboard)? {
                    eprintln!("Image {n} has no trace to copy");
                }
            }
            (ExportJob::Traces, report)
        }
        Command::GenConfig => return Ok(()),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_export_report(job, &report);
        if let Some(message) = workspace.message() {
            if message != job.status_message() {
                println!("{}", message);
            }
        }
    }
    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can only lower it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Read every input file; unreadable ones are dropped with a warning.
fn read_inputs(inputs: &[PathBuf]) -> Vec<RawFile> {
    expand_inputs(inputs)
        .into_iter()
        .filter_map(|path| match RawFile::from_path(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read input, skipping");
                None
            }
        })
        .collect()
}

/// Apply selection and size flags in order: select, preset, width, height.
fn apply_edits(cli: &Cli, workspace: &mut Workspace) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(n) = cli.select {
        let index = n.checked_sub(1).ok_or("--select is 1-based")?;
        workspace.select(index)?;
    }
    if let Some(name) = &cli.preset {
        let preset = workspace
            .config()
            .preset(name)
            .map(|p| (p.width, p.height))
            .ok_or_else(|| format!("Unknown preset '{name}'"))?;
        workspace.apply_preset(preset.0, preset.1);
    }
    if cli.no_keep_ratio || (cli.width.is_some() && cli.height.is_some()) {
        workspace.set_keep_ratio(false);
    }
    if let Some(width) = &cli.width {
        if !workspace.edit_width(width) {
            return Err(format!("Width must not be negative: {width}").into());
        }
    }
    if let Some(height) = &cli.height {
        if !workspace.edit_height(height) {
            return Err(format!("Height must not be negative: {height}").into());
        }
    }
    if let Some(name) = &cli.name {
        workspace.set_file_name(name.as_str());
    }
    Ok(())
}

/// Deliver each retained trace as `{name}-{i}.svg`.
fn write_traces(
    workspace: &Workspace,
    downloader: &dyn Downloader,
    report: &mut ExportReport,
) -> Result<Vec<(usize, String)>, Box<dyn std::error::Error>> {
    let base = base_name_or(workspace.file_name(), &workspace.config().file_name);
    let total = workspace.traces().len();
    let mut written = Vec::new();
    for (index, svg) in workspace.traces().iter() {
        let name = indexed_name(&base, index, total, "svg");
        downloader.download(&name, SVG_MIME, svg.as_bytes())?;
        report.downloads.push(name.clone());
        written.push((index, name));
    }
    Ok(written)
}
