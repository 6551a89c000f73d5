// src/main.rs
// Command-line converter for SDS1000X-E binary waveform captures

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sds_reader::{Capture, ConvertOptions, RowLayout, CODES_PER_DIVISION, DEFAULT_WORKERS};

/// Convert Siglent SDS1000X-E waveform captures to CSV
#[derive(Parser)]
#[command(name = "sds2csv")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display capture information
    Info {
        /// .bin file downloaded from the "Waveform Save" button of the web UI
        input: PathBuf,
    },

    /// Convert a capture to CSV
    Convert {
        /// .bin file downloaded from the "Waveform Save" button of the web UI
        input: PathBuf,

        /// Destination CSV file
        #[arg(default_value = "csv_data.csv")]
        output: PathBuf,

        /// Number of conversion threads
        #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// ADC code steps per vertical division
        #[arg(long, default_value_t = CODES_PER_DIVISION)]
        codes_per_division: f64,

        /// Row layout of the CSV output
        #[arg(long, value_enum, default_value_t = LayoutArg::Aligned)]
        layout: LayoutArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    /// Right-aligned columns; values that do not fit are an error
    Aligned,
    /// Original 27/35/43/51 byte rows
    Reference,
}

impl From<LayoutArg> for RowLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Aligned => RowLayout::default(),
            LayoutArg::Reference => RowLayout::Reference,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { input } => {
            let capture = load(&input)?;
            print_file_info(&input, &capture);
        }

        Commands::Convert {
            input,
            output,
            workers,
            codes_per_division,
            layout,
        } => {
            let capture = load(&input)?;
            print_channel_summary(&capture);

            let options = ConvertOptions::default()
                .with_workers(workers)
                .with_codes_per_division(codes_per_division)
                .with_layout(layout.into());

            capture
                .write_csv(&output, &options)
                .with_context(|| format!("Error writing CSV file '{}'", output.display()))?;

            println!(
                "Successfully converted {} to {}",
                input.display(),
                output.display()
            );
            println!("Total rows written: {}", capture.description().sample_count);
        }
    }

    Ok(())
}

fn load(input: &Path) -> Result<Capture> {
    Capture::load_file(input)
        .with_context(|| format!("Error loading capture file '{}'", input.display()))
}

fn print_channel_summary(capture: &Capture) {
    let desc = capture.description();
    println!(
        "Sample rate (if no units are shown, defaults to Hertz): {}",
        desc.sample_rate
    );
    println!("Channels (if no units are shown, defaults to Volts):");
    for ch in desc.enabled_channels() {
        println!(
            "CH{} - Vertical offset {}",
            ch + 1,
            desc.channel_vertical_offset[ch]
        );
    }
}

fn print_file_info(input: &Path, capture: &Capture) {
    let desc = capture.description();

    println!("SDS Capture Information");
    println!("=======================");
    println!();
    println!("File: {}", input.display());
    println!("Size: {} bytes", capture.bytes().len());
    println!();

    println!("Acquisition Parameters:");
    println!("  Time/div: {}", desc.time_per_division);
    println!("  Trigger delay: {}", desc.time_delay);
    println!("  Sample rate: {}", desc.sample_rate);
    println!("  Samples per channel: {}", desc.sample_count);
    println!("  Enabled channels: {}", desc.enabled_channel_count());
    println!();

    println!("Channels:");
    for ch in desc.enabled_channels() {
        println!(
            "  CH{}: {}/div, vertical offset {}, data at 0x{:x}",
            ch + 1,
            desc.channel_volts_per_division[ch],
            desc.channel_vertical_offset[ch],
            desc.channel_data_offset[ch].unwrap_or_default()
        );
    }
    println!();

    let model = capture.scaling(CODES_PER_DIVISION);
    println!("Scaling ({} codes/div):", CODES_PER_DIVISION);
    for ch in desc.enabled_channels() {
        println!("  CH{}: {:.6e} V/code", ch + 1, model.channel_scale[ch]);
    }
    println!("  First sample: {:.11} s", model.timestamp(0));
    println!("  Sample interval: {:.3e} s", model.time_step);
}
