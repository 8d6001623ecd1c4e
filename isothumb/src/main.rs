use clap::Parser;
use env_logger::Env;
use isoposter::{
    HttpImageSource, Mode, MovieRecord, OmdbClient, PosterError, PosterPrompt, ScanEntry,
    Scanner, Settings, Thumbnailer, build_client,
};
use log::LevelFilter;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

/// Exit status when a scan finished but some entries failed.
const EXIT_SCAN_ERRORS: i32 = 2;

/// Write poster thumbnails next to .iso disc images
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory to scan (default: current directory), or an http(s) image URL
    #[arg(value_name = "PATH OR URL")]
    target: Option<String>,

    /// Output file in single-URL mode
    #[arg(short, long, default_value = isoposter::config::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// HTTP request timeout in seconds
    #[arg(short, long, default_value_t = 30)]
    timeout: u64,

    /// JPEG quality of the written thumbnails
    #[arg(short, long, default_value_t = isoposter::config::DEFAULT_JPEG_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Ask for a poster URL when the metadata has none
    #[arg(short, long)]
    prompt: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Reads a manual poster URL from stdin.
struct StdinPrompt;

impl PosterPrompt for StdinPrompt {
    fn ask(&self, entry: &ScanEntry, record: &MovieRecord) -> Option<String> {
        let title = record.title.as_deref().unwrap_or(&entry.file_name);
        print!(
            "No poster for {} ({}). Image URL (empty to skip): ",
            title,
            entry.relative_path.display()
        );
        io::stdout().flush().ok()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok()?;
        Some(line)
    }
}

fn init_logger(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

/// Returns whether every entry of a scan succeeded.
fn run(args: Args) -> Result<bool, PosterError> {
    let settings = Settings::from_env()?
        .with_timeout(Duration::from_secs(args.timeout))
        .with_jpeg_quality(args.quality);

    let cwd = std::env::current_dir()?;
    let mode = Mode::from_arg(args.target.as_deref(), &cwd)?;

    let client = build_client(&settings)?;
    let images = HttpImageSource::new(client.clone());
    let thumbnailer = Thumbnailer::from_settings(&settings);

    match mode {
        Mode::SingleUrl(url) => {
            thumbnailer.generate(&images, url.as_str(), &args.output)?;
            println!("Wrote {}", args.output.display());
            Ok(true)
        }
        Mode::Scan(root) => {
            let lookup = OmdbClient::from_settings(client, &settings);
            let prompt = StdinPrompt;
            let mut scanner = Scanner::new(&lookup, &images, &thumbnailer);
            if args.prompt {
                scanner = scanner.with_prompt(&prompt);
            }

            let summary = scanner.scan(&root)?;
            println!(
                "Scanned {}: {} candidates, {} generated, {} skipped, {} errors",
                root.display(),
                summary.candidates,
                summary.generated,
                summary.skipped,
                summary.errors
            );
            Ok(!summary.has_errors())
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);

    match run(args) {
        Ok(true) => {}
        Ok(false) => process::exit(EXIT_SCAN_ERRORS),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
