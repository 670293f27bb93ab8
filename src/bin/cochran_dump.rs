use std::ops::ControlFlow;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use cochran_dive::{
    decode_file, dive_logbook, dive_profile_bytes, for_each_dive, model_name, parse_samples, CochranError,
    ContainerDescriptor, DiveSummary, FileVariant, Sample, SampleRaw,
};

#[derive(Parser)]
#[command(name = "cochran-dump")]
#[command(about = "Decode Cochran can/wan/ana dive computer container files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum Variant {
    Can,
    Wan,
    Ana,
}

impl From<Variant> for FileVariant {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Can => FileVariant::Can,
            Variant::Wan => FileVariant::Wan,
            Variant::Ana => FileVariant::Ana,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print one logbook summary line per dive, plus the profile sample count
    Summary {
        /// Path to the .can/.wan/.ana container file
        input: PathBuf,

        /// Which container layout this file uses
        #[arg(short, long)]
        variant: Variant,

        /// Emit a JSON array instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Dump one dive's decoded sample stream
    Profile {
        /// Path to the .can/.wan/.ana container file
        input: PathBuf,

        /// Which container layout this file uses
        #[arg(short, long)]
        variant: Variant,

        /// Zero-based index into the pointer table
        #[arg(short, long, default_value = "0")]
        dive: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Summary { input, variant, json } => cmd_summary(input, variant.into(), json),
        Commands::Profile { input, variant, dive } => cmd_profile(input, variant.into(), dive),
    }
}

// ── Summary ──

fn cmd_summary(input: PathBuf, variant: FileVariant, json: bool) -> Result<()> {
    let cipher = std::fs::read(&input).with_context(|| format!("failed to read {}", input.display()))?;
    let (descriptor, image) = decode_file(variant, &cipher)
        .with_context(|| format!("failed to decode header of {}", input.display()))?;

    eprintln!(
        "{} ({}), format tag 0x{:02X}, {} dive slot(s)",
        model_name(&descriptor.model),
        std::str::from_utf8(&descriptor.model).unwrap_or("???"),
        descriptor.format.tag_byte(),
        descriptor.pointer_count,
    );

    let mut summaries = Vec::new();
    for_each_dive(
        &image,
        &descriptor,
        |descriptor, dive_bytes, index, is_tail| {
            if is_tail {
                eprintln!("  [inter-dive tail, {} byte(s)]", dive_bytes.len());
                return ControlFlow::Continue(());
            }
            match summarize_dive(descriptor, dive_bytes, index) {
                Ok(summary) => {
                    if !json {
                        print_summary_line(&summary);
                    }
                    summaries.push(summary);
                }
                Err(e) => eprintln!("  dive {index}: {e}"),
            }
            ControlFlow::Continue(())
        },
        |e: CochranError| eprintln!("warning: {e}"),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    }

    Ok(())
}

fn summarize_dive(
    descriptor: &ContainerDescriptor,
    dive_bytes: &[u8],
    index: usize,
) -> cochran_dive::Result<DiveSummary> {
    let logbook = dive_logbook(descriptor, dive_bytes)?;
    let samples = dive_profile_bytes(descriptor, dive_bytes, &logbook);
    let mut sample_count = 0usize;
    parse_samples(descriptor.family, &logbook, samples, |_, _, _| sample_count += 1)?;
    Ok(DiveSummary {
        dive_index: index,
        logbook,
        sample_count,
    })
}

fn print_summary_line(summary: &DiveSummary) {
    let lb = &summary.logbook;
    println!(
        "  dive {:>3}  #{:<5}  {}  {:>6.1} ft  {:>5}s  {} samples",
        summary.dive_index,
        lb.dive_number,
        lb.start_time.format("%Y-%m-%d %H:%M"),
        lb.max_depth_ft,
        lb.bottom_time_seconds,
        summary.sample_count,
    );
}

// ── Profile ──

#[derive(Serialize)]
struct SampleRow {
    time_seconds: u32,
    sample: Sample,
    raw: SampleRaw,
}

fn cmd_profile(input: PathBuf, variant: FileVariant, target_index: usize) -> Result<()> {
    let cipher = std::fs::read(&input).with_context(|| format!("failed to read {}", input.display()))?;
    let (descriptor, image) = decode_file(variant, &cipher)?;

    let mut found = false;
    for_each_dive(
        &image,
        &descriptor,
        |descriptor, dive_bytes, index, is_tail| {
            if is_tail || index != target_index {
                return ControlFlow::Continue(());
            }
            found = true;
            if let Err(e) = dump_dive_profile(descriptor, dive_bytes) {
                eprintln!("dive {index}: {e}");
            }
            ControlFlow::Break(())
        },
        |e: CochranError| eprintln!("warning: {e}"),
    )?;

    if !found {
        anyhow::bail!("no dive at index {target_index} in {}", input.display());
    }
    Ok(())
}

fn dump_dive_profile(descriptor: &ContainerDescriptor, dive_bytes: &[u8]) -> Result<()> {
    let logbook = dive_logbook(descriptor, dive_bytes)?;
    let samples = dive_profile_bytes(descriptor, dive_bytes, &logbook);

    let mut rows = Vec::new();
    parse_samples(descriptor.family, &logbook, samples, |time_seconds, sample, raw| {
        rows.push(SampleRow { time_seconds, sample, raw })
    })?;

    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
