use clap::Parser;
use colored::Colorize;

mod cli;

use cli::{Cli, Command, DesignArgs, FilterArgs, SimulateArgs};
use neural_bandpass::config::{load_config, Config};
use neural_bandpass::filters::{design, FilterSpec};
use neural_bandpass::local::{process_file, SignalSource, Tone};
use neural_bandpass::processing::Processor;
use neural_bandpass::utils::log::init_logging;

use std::error::Error;
use std::path::Path;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Design(args) => run_design(args),
        Command::Filter(args) => run_filter(args),
        Command::Simulate(args) => run_simulate(args),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn config_or_default(path: Option<&Path>) -> Result<Config, Box<dyn Error>> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(Config::default()),
    }
}

// DESIGN ----------------------------------------------------------------------

fn run_design(args: DesignArgs) -> Result<(), Box<dyn Error>> {
    let spec = FilterSpec::new(args.order, args.low, args.high, args.rate);
    let cascade = design(&spec)?;

    println!(
        "{} order {} band {}-{} Hz at {} Hz, {} section(s)",
        "Butterworth band-pass".bold(),
        spec.order,
        spec.low_cutoff_hz,
        spec.high_cutoff_hz,
        spec.sample_rate_hz,
        cascade.len()
    );
    println!(
        "{:>4} {:>14} {:>14} {:>14} {:>6} {:>14} {:>14} {:>10}",
        "#", "b0", "b1", "b2", "a0", "a1", "a2", "|pole|"
    );
    for (i, section) in cascade.sections().iter().enumerate() {
        let [b0, b1, b2, a0, a1, a2] = section.coefficients();
        let pole = section
            .poles()
            .iter()
            .map(|p| p.norm())
            .fold(0.0, f64::max);
        println!(
            "{:>4} {:>14.8e} {:>14.8e} {:>14.8e} {:>6.1} {:>14.8e} {:>14.8e} {:>10.6}",
            i, b0, b1, b2, a0, a1, a2, pole
        );
    }

    let centre = (spec.low_cutoff_hz * spec.high_cutoff_hz).sqrt();
    for (label, freq) in [
        ("low edge", spec.low_cutoff_hz),
        ("centre", centre),
        ("high edge", spec.high_cutoff_hz),
    ] {
        let gain = cascade.frequency_response(freq, spec.sample_rate_hz);
        println!(
            "  {:<10} {:>10.2} Hz  |H| = {:.6} ({:+.2} dB)",
            label,
            freq,
            gain,
            20.0 * gain.log10()
        );
    }
    let stability = if cascade.is_stable() {
        "stable".green()
    } else {
        "UNSTABLE".red()
    };
    println!("  {}", stability);
    Ok(())
}

// FILTER ----------------------------------------------------------------------

fn run_filter(args: FilterArgs) -> Result<(), Box<dyn Error>> {
    let config = config_or_default(args.config.as_deref())?;
    let mut processor = Processor::new(config);

    let summary = process_file::run(
        &mut processor,
        &args.input,
        &args.output,
        args.rate,
        args.buffer_size,
        args.headers,
    )?;

    println!(
        "{} {} samples x {} channels in {} buffers -> {}",
        "Filtered".green().bold(),
        summary.samples,
        summary.channels,
        summary.buffers,
        args.output.display()
    );
    if summary.unstable_buffers > 0 {
        println!(
            "{} {} buffer(s) had non-finite output and were reset",
            "warning:".yellow().bold(),
            summary.unstable_buffers
        );
    }
    Ok(())
}

// SIMULATE --------------------------------------------------------------------

fn run_simulate(args: SimulateArgs) -> Result<(), Box<dyn Error>> {
    let config = config_or_default(args.config.as_deref())?;
    let total = (args.seconds * args.rate) as usize;
    // Skip the cascade's settling time before measuring
    let settle = total / 10;

    println!(
        "{} {} channel(s), {} Hz, band {}-{} Hz (order {})",
        "Simulating".bold(),
        args.channels,
        args.rate,
        config.band.f_low,
        config.band.f_high,
        config.band.order
    );

    let runs = [
        ("in-band", args.in_band, true),
        ("out-of-band", args.out_of_band, false),
    ];
    for (label, freq, should_pass) in runs {
        let mut source = SignalSource::new(args.channels, args.rate, args.seed)
            .with_tone(Tone::new(1.0, freq))
            .with_noise(args.noise);
        let mut processor = Processor::new(config.clone());
        processor.on_settings_changed(args.channels, args.rate)?;
        processor.on_acquisition_start();

        let mut peak = vec![0.0f64; args.channels];
        let mut position = 0;
        while position < total {
            let len = source.random_buffer_len(64, 2048).min(total - position);
            let mut buffer = source.next_buffer(len);
            match processor.on_buffer(&mut buffer) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    println!("{} {}", "warning:".yellow().bold(), e)
                }
                Err(e) => return Err(e.into()),
            }
            for (channel, row) in buffer.iter().enumerate() {
                for (i, value) in row.iter().enumerate() {
                    if position + i >= settle {
                        peak[channel] = peak[channel].max(value.abs());
                    }
                }
            }
            position += len;
        }
        processor.on_acquisition_stop();

        let worst = peak.iter().cloned().fold(0.0, f64::max);
        let line = format!(
            "  {:<12} {:>8.1} Hz  peak output {:.4} over {} buffer(s)",
            label,
            freq,
            worst,
            processor.buffers_processed()
        );
        let passed = worst > std::f64::consts::FRAC_1_SQRT_2;
        if passed == should_pass {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
    }
    Ok(())
}
