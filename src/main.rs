use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use invoice_synth::batch::{BatchOptions, run_batch};
use invoice_synth::compose::{DocumentComposer, annotation_path_for};
use invoice_synth::config::SynthConfig;
use invoice_synth::content::{ContentCatalog, ContentResolver};
use invoice_synth::fonts::FontSet;
use invoice_synth::translate::{CommandTranslator, Passthrough, Translator};

#[derive(Parser)]
#[command(name = "invoice-synth", version)]
#[command(about = "Synthesize labeled invoice images from bounding-box annotations")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    synth: SynthArgs,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Synthesize one invoice from one annotation file
    Generate {
        /// Input annotation (JSON)
        input: PathBuf,
        /// Output image (JPEG); the annotation is written next to it as .json
        output: PathBuf,
        /// Template image the annotation was made on (page size, logo source)
        #[arg(short, long)]
        template: Option<PathBuf>,
    },
    /// Synthesize one invoice per annotation file in a dataset directory
    Batch {
        /// Directory of annotation JSON files
        annotations: PathBuf,
        /// Output directory (images/ and annotations/ are created inside)
        output: PathBuf,
        /// Directory of template images named like the annotations
        #[arg(short, long)]
        images: Option<PathBuf>,
        /// Worker threads (defaults to the number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Only process the first N documents
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Args)]
struct SynthArgs {
    /// Directory of table content files (<category>.txt)
    #[arg(long, global = true, default_value = "INVOICE_DATA/table_data")]
    data: PathBuf,
    /// Seed for reproducible output
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Font file to draw text with (default: DejaVu Sans from font directories)
    #[arg(long, global = true)]
    font: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = 12.0)]
    font_size: f32,
    #[arg(long, global = true, default_value_t = 2)]
    border_width: u32,
    #[arg(long, global = true, default_value_t = 20)]
    min_row_height: u32,
    /// Page size WIDTHxHEIGHT when no template image is available
    #[arg(long, global = true, default_value = "600x900", value_parser = parse_size)]
    size: (u32, u32),
    /// Translation command reading stdin, e.g. "trans -b {src}:{dst}"
    #[arg(long, global = true)]
    translate_cmd: Option<String>,
    /// Seconds before a translation call is abandoned
    #[arg(long, global = true, default_value_t = 10)]
    translate_timeout: u64,
    #[arg(long, global = true, default_value = "en")]
    source_lang: String,
    #[arg(long, global = true, default_value = "fr")]
    target_lang: String,
    /// Leave dollar amounts untouched
    #[arg(long, global = true)]
    keep_currency: bool,
    /// Euros per dollar when normalizing amounts
    #[arg(long, global = true, default_value_t = 0.85)]
    usd_to_eur: f64,
    /// Font family looked up in the font directories
    #[arg(long, global = true, default_value = "DejaVu Sans")]
    font_family: String,
    /// Chance that a table's header row is upper-cased
    #[arg(long, global = true, default_value_t = 0.4, value_parser = parse_probability)]
    uppercase_header_probability: f64,
    /// Chance that a table's header row is drawn bold
    #[arg(long, global = true, default_value_t = 0.4, value_parser = parse_probability)]
    bold_header_probability: f64,
    /// Chance that a table is drawn without visible borders
    #[arg(long, global = true, default_value_t = 0.25, value_parser = parse_probability)]
    light_border_probability: f64,
}

fn parse_probability(s: &str) -> Result<f64, String> {
    let p = s.trim().parse::<f64>().map_err(|e| e.to_string())?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("probability must be within 0..=1, got {p}"))
    }
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let h = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    if w == 0 || h == 0 {
        return Err("page size must be non-zero".into());
    }
    Ok((w, h))
}

impl SynthArgs {
    fn config(&self) -> SynthConfig {
        SynthConfig {
            font_size: self.font_size,
            border_width: self.border_width,
            min_row_height: self.min_row_height,
            surface_size: self.size,
            source_lang: self.source_lang.clone(),
            target_lang: self.target_lang.clone(),
            normalize_currency: !self.keep_currency,
            usd_to_eur: self.usd_to_eur,
            uppercase_header_probability: self.uppercase_header_probability,
            bold_header_probability: self.bold_header_probability,
            light_border_probability: self.light_border_probability,
            font_family: self.font_family.clone(),
            font_path: self.font.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = cli.synth.config();
    let fonts = FontSet::load(&config);
    let resolver = ContentResolver::new(ContentCatalog::from_dir(&cli.synth.data));

    let command_translator = cli.synth.translate_cmd.as_deref().and_then(|line| {
        CommandTranslator::from_command_line(line, Duration::from_secs(cli.synth.translate_timeout))
    });
    let translator: &dyn Translator = match &command_translator {
        Some(t) => t,
        None => &Passthrough,
    };
    let composer = DocumentComposer::new(&config, &fonts, &resolver).with_translator(translator);

    match cli.command {
        Command::Generate {
            input,
            output,
            template,
        } => {
            let mut rng = match cli.synth.seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_os_rng(),
            };
            let annotation_out = annotation_path_for(&output);
            match invoice_synth::synthesize_file(
                &input,
                template.as_deref(),
                &output,
                &annotation_out,
                &composer,
                &mut rng,
            ) {
                Ok(_) => {
                    println!("{} + {}", output.display(), annotation_out.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Command::Batch {
            annotations,
            output,
            images,
            jobs,
            limit,
        } => {
            let opts = BatchOptions {
                annotations_dir: annotations,
                images_dir: images,
                output_dir: output,
                seed: cli.synth.seed,
                jobs,
                limit,
            };
            match run_batch(&opts, &composer) {
                Ok(report) => {
                    println!(
                        "{} of {} invoices generated",
                        report.succeeded.len(),
                        report.total()
                    );
                    for (stem, e) in &report.failed {
                        eprintln!("  FAIL {stem}: {e}");
                    }
                    if report.failed.is_empty() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
