use anyhow::{Context, Result};
use clap::Parser;
use micstream::{AudioStream, RecordingConfig, RecordingSession};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;

/// Capture microphone audio through an external recorder and write the
/// stream to a file or stdout.
#[derive(Debug, Parser)]
#[command(name = "micstream", version, about)]
struct Cli {
    /// Write captured audio here ("-" for stdout)
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Configuration file to use as the base (flags override it)
    #[arg(long)]
    config: Option<String>,

    /// Recorder backend to use
    #[arg(long)]
    recorder: Option<String>,

    /// Sample rate in Hz
    #[arg(long)]
    rate: Option<u32>,

    /// Number of channels to record
    #[arg(long)]
    channels: Option<u16>,

    /// Output container/format
    #[arg(long)]
    audio_type: Option<String>,

    /// Capture device
    #[arg(long)]
    device: Option<String>,

    /// Ask the backend for a compressed encoding
    #[arg(long)]
    compress: bool,

    /// Silence-detection threshold (0.0 to 1.0)
    #[arg(long)]
    threshold: Option<f64>,

    /// Silence duration that ends the recording
    #[arg(long)]
    silence: Option<String>,

    /// Stop recording once the backend detects silence
    #[arg(long)]
    end_on_silence: bool,

    /// Stop automatically after this many seconds
    #[arg(long)]
    duration: Option<f64>,
}

impl Cli {
    fn build_config(&self) -> Result<RecordingConfig> {
        let mut cfg = match &self.config {
            Some(path) => RecordingConfig::load(path)?,
            None => RecordingConfig::default(),
        };
        if let Some(recorder) = &self.recorder {
            cfg.recorder = recorder.clone();
        }
        if let Some(rate) = self.rate {
            cfg.sample_rate = rate;
        }
        if let Some(channels) = self.channels {
            cfg.channels = channels;
        }
        if let Some(audio_type) = &self.audio_type {
            cfg.audio_type = audio_type.clone();
        }
        if let Some(device) = &self.device {
            cfg.device = Some(device.clone());
        }
        if let Some(threshold) = self.threshold {
            cfg.threshold = threshold;
        }
        if let Some(silence) = &self.silence {
            cfg.silence = silence.clone();
        }
        if self.compress {
            cfg.compress = true;
        }
        if self.end_on_silence {
            cfg.end_on_silence = true;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is the audio pipe; keep logs on stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.build_config()?;

    info!(
        "recording with {} ({} Hz, {} channel(s), {})",
        config.recorder, config.sample_rate, config.channels, config.audio_type
    );

    let session =
        Arc::new(RecordingSession::new(config).context("could not create recording session")?);
    let stream = session.stream();
    session.start().await?;

    // Stop on Ctrl-C or once the requested duration elapses.
    let watcher = {
        let session = Arc::clone(&session);
        let duration = cli.duration;
        tokio::spawn(async move {
            let deadline = async move {
                match duration {
                    Some(secs) => tokio::time::sleep(Duration::from_secs_f64(secs)).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("interrupt received, stopping"),
                _ = deadline => info!("recording duration reached, stopping"),
            }
            session.stop().await;
        })
    };

    let mut out: Box<dyn AsyncWrite + Unpin> = if cli.output == "-" {
        Box::new(tokio::io::stdout())
    } else {
        let file = tokio::fs::File::create(&cli.output)
            .await
            .with_context(|| format!("could not create {}", cli.output))?;
        Box::new(file)
    };

    let outcome = drain(&stream, out.as_mut()).await;

    watcher.abort();
    session.stop().await;

    let stats = session.stats();
    info!("session stats: {}", serde_json::to_string(&stats)?);

    outcome
}

/// Copy the stream to the output until end-of-data.
async fn drain(stream: &AudioStream, out: &mut (dyn AsyncWrite + Unpin)) -> Result<()> {
    while let Some(item) = stream.next_chunk().await {
        let bytes = item?;
        out.write_all(&bytes).await?;
    }
    out.flush().await?;
    Ok(())
}
