use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tubelens_core::{
    AnalysisError, CommentSource, Config, Oracles, TranscriptSource, VideoAnalyzer,
    format_analysis_readable,
};

use crate::youtube::{
    FileComments, FileTranscript, NoComments, TimedTextTranscript, YoutubeComments,
    extract_video_id,
};

mod youtube;

const YOUTUBE_API_KEY_ENV: &str = "YOUTUBE_API_KEY";

#[derive(Parser)]
#[command(name = "tubelens")]
#[command(
    about = "Summarize a YouTube video's transcript, restore its punctuation and gauge how its comments react"
)]
struct Cli {
    /// Video URL or 11-character video id
    url: String,

    /// Read the transcript from a file ("-" for stdin) instead of fetching captions
    #[arg(short, long)]
    transcript: Option<PathBuf>,

    /// Read comments from a JSON array of strings instead of the YouTube API
    #[arg(short, long)]
    comments: Option<PathBuf>,

    /// Caption language to fetch
    #[arg(short, long, default_value = "en")]
    lang: String,

    /// Config file (defaults to the user config dir, then built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the analysis as JSON instead of markdown
    #[arg(long)]
    json: bool,

    /// Also save the report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn finish_step(spinner: ProgressBar, msg: &str, started: Instant) {
    spinner.finish_with_message(format!(
        "{} {} {}",
        style("✓").green().bold(),
        msg,
        style(format!("[{}]", format_duration(started.elapsed()))).dim()
    ));
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tubelens=info,tubelens_core=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn transcript_source(cli: &Cli, client: &reqwest::Client) -> Box<dyn TranscriptSource> {
    match &cli.transcript {
        Some(path) => Box::new(FileTranscript { path: path.clone() }),
        None => Box::new(TimedTextTranscript {
            client: client.clone(),
            lang: cli.lang.clone(),
        }),
    }
}

fn comment_source(cli: &Cli, client: &reqwest::Client) -> Box<dyn CommentSource> {
    if let Some(path) = &cli.comments {
        return Box::new(FileComments { path: path.clone() });
    }
    match std::env::var(YOUTUBE_API_KEY_ENV) {
        Ok(api_key) if !api_key.trim().is_empty() => Box::new(YoutubeComments {
            client: client.clone(),
            api_key,
        }),
        _ => {
            tracing::warn!("{} is not set; skipping comment retrieval", YOUTUBE_API_KEY_ENV);
            Box::new(NoComments)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let Some(video_id) = extract_video_id(&cli.url) else {
        eprintln!(
            "{} Invalid YouTube URL. Please enter a valid URL.",
            style("Error:").red().bold()
        );
        std::process::exit(1);
    };

    let config = Config::load_or_default(cli.config.as_deref()).context("loading config")?;
    let oracles = Oracles::init(&config);
    let analyzer = VideoAnalyzer::new(&config, oracles)?;

    let client = reqwest::Client::new();
    let transcripts = transcript_source(&cli, &client);
    let comment_source = comment_source(&cli, &client);

    println!(
        "\n{}  {}\n",
        style("tubelens").cyan().bold(),
        style("Video Analyzer").dim()
    );

    let total_start = Instant::now();
    let spinner = create_spinner("Analyzing video...");
    let analysis = match analyzer
        .analyze(&video_id, transcripts.as_ref(), comment_source.as_ref())
        .await
    {
        Ok(analysis) => analysis,
        Err(AnalysisError::NoTranscript { .. }) => {
            spinner.finish_and_clear();
            bail!("Unable to fetch video transcript. Please check the video URL and try again.");
        }
    };
    finish_step(
        spinner,
        &format!(
            "Analyzed {} comments, sentiment: {}",
            analysis.comment_count,
            style(analysis.sentiment.effectiveness).yellow()
        ),
        total_start,
    );

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );

    let rendered = if cli.json {
        serde_json::to_string_pretty(&analysis)?
    } else {
        format_analysis_readable(&analysis)
    };

    if let Some(path) = &cli.output {
        fs::write(path, &rendered).await?;
        println!("{} {}\n", style("Saved:").dim(), style(path.display()).cyan());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}", rendered);

    Ok(())
}
