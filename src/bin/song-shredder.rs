use clap::Parser;
use song_shredder_core::{
    is_supported_audio, ShredEvent, ShredOptions, Shredder, SUPPORTED_EXTENSIONS,
};
use std::{path::PathBuf, process};

#[derive(Parser)]
#[command(name = "song-shredder")]
#[command(about = "Slice songs into pieces and stitch them back together in random order", long_about = None)]
#[command(version)]
struct Cli {
    /// Input files (mp3 or wav).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Slice length in milliseconds (1-9999).
    #[arg(short = 'l', long, default_value_t = 1000)]
    slice_length: u32,

    /// Alternate between songs instead of shuffling everything together.
    #[arg(short, long)]
    interlace: bool,

    /// JSON file with shred options; flags below override it.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Seed for a reproducible shuffle.
    #[arg(long)]
    seed: Option<u64>,

    /// Output file name, written next to the first input.
    #[arg(long)]
    output_name: Option<String>,

    /// MP3 bitrate in kbps.
    #[arg(long)]
    bitrate: Option<u32>,

    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if cli.quiet {
        "warn"
    } else {
        "info"
    }))
    .init();

    match handle_shred(cli) {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn handle_shred(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut opts = match &cli.options {
        Some(path) => ShredOptions::from_json_file(path)?,
        None => ShredOptions::default(),
    };
    if cli.seed.is_some() {
        opts.seed = cli.seed;
    }
    if let Some(name) = cli.output_name {
        opts.output_file_name = name;
    }
    if let Some(bitrate) = cli.bitrate {
        opts.bitrate_kbps = bitrate;
    }
    opts.validate()?;

    let inputs: Vec<PathBuf> = cli
        .inputs
        .into_iter()
        .filter(|p| {
            let ok = is_supported_audio(p);
            if !ok {
                log::warn!("Skipping {} (not one of {:?})", p.display(), SUPPORTED_EXTENSIONS);
            }
            ok
        })
        .collect();
    if inputs.is_empty() {
        return Err("You must select one or more audio files".into());
    }

    if !cli.quiet {
        eprintln!("🎵 Song Shredder");
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for input in &inputs {
            eprintln!("Input:  {}", input.display());
        }
        eprintln!("Slices: {} ms", cli.slice_length);
        eprintln!("Mode:   {}", if cli.interlace { "interlace" } else { "shuffle" });
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        eprintln!();
    }

    let mut shredder = Shredder::new(opts);
    let job = shredder.submit(inputs.as_slice(), cli.slice_length, cli.interlace)?;

    let mut outcome = Err("shred job ended without a result".into());
    for event in job.events().iter() {
        match event {
            ShredEvent::Progress(percent) => {
                if !cli.quiet {
                    eprint!("\r🔪 Shredding: {:>3}%", percent);
                }
            }
            ShredEvent::Freezing => {
                if !cli.quiet {
                    eprintln!();
                    eprintln!("💾 Writing output");
                }
            }
            ShredEvent::Completed(path) => {
                if cli.quiet {
                    println!("{}", path.display());
                } else {
                    eprintln!();
                    eprintln!("✅ Shred completed: {}", path.display());
                }
                outcome = Ok(());
            }
            ShredEvent::Failed(e) => {
                if !cli.quiet {
                    eprintln!();
                }
                outcome = Err(e.into());
            }
        }
    }

    job.join().map_err(|_| "shred worker panicked")?;
    outcome
}
