use neural_bandpass::config::{BandConfig, Config, ProcessorConfig};
use neural_bandpass::local::process_file;
use neural_bandpass::{ConfigError, FilterError, Processor};

use std::fs;

fn config_with_log(path: std::path::PathBuf) -> Config {
    Config {
        band: BandConfig::default(),
        processor: ProcessorConfig {
            parallel_channels: false,
            event_log: Some(path),
        },
    }
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[test]
fn buffers_before_settings_fault_the_session() {
    let mut processor = Processor::new(Config::default());
    let mut buffer = vec![vec![0.25f64; 32]; 2];

    assert_eq!(processor.on_buffer(&mut buffer), Err(FilterError::NotConfigured));
    assert_eq!(processor.on_buffer(&mut buffer), Err(FilterError::SessionFaulted));

    processor.on_settings_changed(2, 30000.0).unwrap();
    assert!(processor.on_buffer(&mut buffer).is_ok());
}

#[test]
fn settings_change_recovers_from_mismatch() {
    let mut processor = Processor::new(Config::default());
    processor.on_settings_changed(4, 30000.0).unwrap();

    let mut three = vec![vec![1.0f32; 16]; 3];
    assert!(matches!(
        processor.on_buffer(&mut three),
        Err(FilterError::ChannelCountMismatch { expected: 4, actual: 3 })
    ));
    assert!(processor.is_faulted());
    assert_eq!(three, vec![vec![1.0f32; 16]; 3]);

    processor.on_settings_changed(3, 30000.0).unwrap();
    assert!(!processor.is_faulted());
    assert!(processor.on_buffer(&mut three).is_ok());
}

#[test]
fn rejected_settings_keep_previous_configuration() {
    let mut processor = Processor::new(Config::default());
    processor.on_settings_changed(2, 30000.0).unwrap();

    // 2 kHz high cutoff is above Nyquist at 3 kHz sampling
    let result = processor.on_settings_changed(2, 3000.0);
    assert!(matches!(result, Err(FilterError::InvalidSpecification(_))));
    assert_eq!(processor.bank().spec().unwrap().sample_rate_hz, 30000.0);

    let mut buffer = vec![vec![0.5f64; 8]; 2];
    assert!(processor.on_buffer(&mut buffer).is_ok());
}

#[test]
fn acquisition_start_clears_delay_state() {
    let mut processor = Processor::new(Config::default());
    processor.on_settings_changed(1, 30000.0).unwrap();

    let mut buffer = vec![vec![1.0f64; 64]];
    processor.on_buffer(&mut buffer).unwrap();
    assert!(!processor
        .bank()
        .with_bank(|bank| bank.channel_state(0).unwrap().is_zero()));

    processor.on_acquisition_start();
    assert!(processor
        .bank()
        .with_bank(|bank| bank.channel_state(0).unwrap().is_zero()));
    assert_eq!(processor.buffers_processed(), 0);
}

#[test]
fn recording_notifications_do_not_touch_the_stream() {
    let mut processor = Processor::new(Config::default());
    processor.on_settings_changed(2, 30000.0).unwrap();

    let mut first = vec![vec![1.0f64; 32]; 2];
    processor.on_buffer(&mut first).unwrap();
    let state = processor
        .bank()
        .with_bank(|bank| bank.channel_state(1).unwrap().clone());

    processor.on_recording_start("/tmp/recording");
    processor.on_recording_stop();

    let after = processor
        .bank()
        .with_bank(|bank| bank.channel_state(1).unwrap().clone());
    assert_eq!(state, after);
}

// ── Instability log ──────────────────────────────────────────────────────────

#[test]
fn instability_events_are_written_on_stop() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("instability.csv");
    let mut processor = Processor::new(config_with_log(log_path.clone()));
    processor.on_settings_changed(3, 30000.0).unwrap();
    processor.on_acquisition_start();

    let mut clean = vec![vec![0.1f64; 16]; 3];
    processor.on_buffer(&mut clean).unwrap();

    let mut dirty = vec![vec![0.1f64; 16]; 3];
    dirty[2][4] = f64::INFINITY;
    assert_eq!(
        processor.on_buffer(&mut dirty),
        Err(FilterError::NumericInstability { channels: vec![2] })
    );
    assert!(!processor.is_faulted());
    assert!(FilterError::NumericInstability { channels: vec![2] }.is_recoverable());
    assert!(!FilterError::SessionFaulted.is_recoverable());
    assert_eq!(processor.pending_events().len(), 1);

    processor.on_acquisition_stop();
    assert!(processor.pending_events().is_empty());

    let contents = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with(",1,2"), "row {:?}", lines[1]);
}

#[test]
fn no_log_file_without_events() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("instability.csv");
    let mut processor = Processor::new(config_with_log(log_path.clone()));
    processor.on_settings_changed(1, 30000.0).unwrap();
    processor.on_acquisition_start();
    let mut buffer = vec![vec![0.0f64; 16]];
    processor.on_buffer(&mut buffer).unwrap();
    processor.on_acquisition_stop();
    assert!(!log_path.exists());
}

// ── CSV recordings ───────────────────────────────────────────────────────────

#[test]
fn csv_recording_is_filtered_like_a_single_stream() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");

    let fs_hz = 30000.0;
    let samples: Vec<[f64; 2]> = (0..1000)
        .map(|i| {
            let t = i as f64 / fs_hz;
            let s = (2.0 * std::f64::consts::PI * 1000.0 * t).sin();
            [s, 0.5 * s]
        })
        .collect();
    let mut text = String::from("a,b\n");
    for [x, y] in &samples {
        text.push_str(&format!("{x},{y}\n"));
    }
    fs::write(&input, text).unwrap();

    let mut processor = Processor::new(Config::default());
    let summary = process_file::run(&mut processor, &input, &output, fs_hz, 128, true).unwrap();
    assert_eq!(summary.channels, 2);
    assert_eq!(summary.samples, 1000);
    assert_eq!(summary.buffers, 8);
    assert_eq!(summary.unstable_buffers, 0);

    // Same data in one buffer through a fresh processor
    let mut reference = Processor::new(Config::default());
    reference.on_settings_changed(2, fs_hz).unwrap();
    let mut whole: Vec<Vec<f64>> = vec![
        samples.iter().map(|s| s[0]).collect(),
        samples.iter().map(|s| s[1]).collect(),
    ];
    reference.on_buffer(&mut whole).unwrap();

    let written = fs::read_to_string(&output).unwrap();
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some("a,b"));
    for (i, line) in lines.enumerate() {
        let values: Vec<f64> = line.split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(values, vec![whole[0][i], whole[1][i]], "row {i}");
    }
}

#[test]
fn ragged_csv_row_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    fs::write(&input, "0.1,0.2\n0.3\n").unwrap();

    let mut processor = Processor::new(Config::default());
    let result = process_file::run(&mut processor, &input, &output, 30000.0, 16, false);
    assert!(result.is_err());
}

#[test]
fn unreadable_first_row_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    fs::write(&input, b"0.1,\xff\xfe\n0.3,0.4\n").unwrap();

    let mut processor = Processor::new(Config::default());
    let result = process_file::run(&mut processor, &input, &output, 30000.0, 16, false);
    assert!(matches!(result, Err(ConfigError::Csv(_))), "{result:?}");
}

#[test]
fn empty_recording_gives_empty_summary() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    fs::write(&input, "").unwrap();

    let mut processor = Processor::new(Config::default());
    let summary = process_file::run(&mut processor, &input, &output, 30000.0, 16, false).unwrap();
    assert_eq!(summary, process_file::FileSummary::default());
}

#[test]
fn failed_recording_still_writes_instability_log() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    let log_path = dir.path().join("instability.csv");
    // First buffer resets channel 1, second buffer holds a bad value
    fs::write(&input, "0.1,0.2\n0.1,inf\n0.1,0.2\n0.1,0.2\n0.1,abc\n").unwrap();

    let mut processor = Processor::new(config_with_log(log_path.clone()));
    let result = process_file::run(&mut processor, &input, &output, 30000.0, 2, false);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));

    assert!(processor.pending_events().is_empty());
    let contents = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with(",0,1"), "row {:?}", lines[1]);
}
