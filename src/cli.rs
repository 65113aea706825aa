use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bandpass",
    version,
    about = "Streaming multichannel Butterworth bandpass filter",
    long_about = "Design band-pass cascades, filter CSV recordings buffer by buffer, \
                  and check the filter bank against simulated signals."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the second-order sections for a band
    Design(DesignArgs),
    /// Filter a CSV recording (rows = samples, columns = channels)
    Filter(FilterArgs),
    /// Stream a simulated recording through the filter bank
    Simulate(SimulateArgs),
}

#[derive(Args)]
pub struct DesignArgs {
    /// Filter order (sections = ceil(order / 2))
    #[arg(long, default_value_t = 2)]
    pub order: usize,

    /// Low cutoff in Hz
    #[arg(long, default_value_t = 500.0)]
    pub low: f64,

    /// High cutoff in Hz
    #[arg(long, default_value_t = 2000.0)]
    pub high: f64,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 30000.0)]
    pub rate: f64,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Input CSV file
    #[arg(long)]
    pub input: PathBuf,

    /// Output CSV file
    #[arg(long)]
    pub output: PathBuf,

    /// Sample rate of the recording in Hz
    #[arg(long)]
    pub rate: f64,

    /// Samples per buffer handed to the filter bank
    #[arg(long, default_value_t = 1024)]
    pub buffer_size: usize,

    /// First row holds channel names
    #[arg(long)]
    pub headers: bool,

    /// YAML configuration (band, processor options)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct SimulateArgs {
    #[arg(long, default_value_t = 4)]
    pub channels: usize,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 30000.0)]
    pub rate: f64,

    /// Length of the simulated recording in seconds
    #[arg(long, default_value_t = 2.0)]
    pub seconds: f64,

    /// Frequency of the tone expected to pass, in Hz
    #[arg(long, default_value_t = 1000.0)]
    pub in_band: f64,

    /// Frequency of the tone expected to be rejected, in Hz
    #[arg(long, default_value_t = 50.0)]
    pub out_of_band: f64,

    /// Uniform noise amplitude added to every sample
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// YAML configuration (band, processor options)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
