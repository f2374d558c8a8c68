use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "carrossel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every carousel of a generation result into zip archives.
    Export(ExportArgs),
    /// Render a single slide as a PNG.
    Slide(SlideArgs),
    /// Schema-check a generation result JSON.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input generation result JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for the archives.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Extra font directory searched before system fonts.
    #[arg(long)]
    fonts: Option<PathBuf>,

    /// Also write the full generation result as carrossel_data.json.
    #[arg(long)]
    data_json: bool,
}

#[derive(Parser, Debug)]
struct SlideArgs {
    /// Input generation result JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Carousel id to render from.
    #[arg(long)]
    carousel: String,

    /// Slide order (1-based).
    #[arg(long)]
    order: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Extra font directory searched before system fonts.
    #[arg(long)]
    fonts: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input generation result JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Slide(args) => cmd_slide(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn read_result_json(path: &Path) -> anyhow::Result<carrossel::GenerationResult> {
    let f = File::open(path).with_context(|| format!("open result '{}'", path.display()))?;
    let r = BufReader::new(f);
    let result: carrossel::GenerationResult =
        serde_json::from_reader(r).with_context(|| "parse generation result JSON")?;
    Ok(result)
}

fn make_fonts(extra_dir: Option<&Path>) -> carrossel::FontCatalog {
    let mut fonts = carrossel::FontCatalog::system();
    if let Some(dir) = extra_dir {
        fonts.load_fonts_dir(dir);
    }
    fonts
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let result = read_result_json(&args.in_path)?;
    result.validate()?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let mut rasterizer = carrossel::SlideRasterizer::new(make_fonts(args.fonts.as_deref()));

    for carousel in &result.carousels {
        let archive =
            carrossel::export_carousel(&mut rasterizer, carousel, result.language, None)
                .with_context(|| format!("export carousel '{}'", carousel.id))?;

        let out_path = args.out_dir.join(&archive.file_name);
        std::fs::write(&out_path, &archive.bytes)
            .with_context(|| format!("write archive '{}'", out_path.display()))?;

        if archive.skipped.is_empty() {
            eprintln!("wrote {} ({} slides)", out_path.display(), archive.exported.len());
        } else {
            eprintln!(
                "wrote {} ({} slides, skipped orders {:?})",
                out_path.display(),
                archive.exported.len(),
                archive.skipped
            );
        }
    }

    if args.data_json {
        let bytes = carrossel::export_result_json(&result)?;
        let out_path = args.out_dir.join(carrossel::DATA_JSON_NAME);
        std::fs::write(&out_path, bytes)
            .with_context(|| format!("write '{}'", out_path.display()))?;
        eprintln!("wrote {}", out_path.display());
    }

    Ok(())
}

fn cmd_slide(args: SlideArgs) -> anyhow::Result<()> {
    let result = read_result_json(&args.in_path)?;
    result.validate()?;

    let carousel = result
        .carousels
        .iter()
        .find(|c| c.id == args.carousel)
        .with_context(|| format!("no carousel with id '{}'", args.carousel))?;
    let slide = carousel
        .slides
        .iter()
        .find(|s| s.order == args.order)
        .with_context(|| format!("no slide with order {} in '{}'", args.order, args.carousel))?;

    let mut rasterizer = carrossel::SlideRasterizer::new(make_fonts(args.fonts.as_deref()));
    let png = rasterizer.rasterize(slide, carousel, result.language, None)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let result = read_result_json(&args.in_path)?;
    result.validate()?;

    let slide_count: usize = result.carousels.iter().map(|c| c.slides.len()).sum();
    eprintln!(
        "ok: {} carousel(s), {} slide(s)",
        result.carousels.len(),
        slide_count
    );
    Ok(())
}
