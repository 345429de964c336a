use std::io::IsTerminal;
use std::path::PathBuf;

use artistdl::clients::entities::{OutcomeStatus, RunReport, Track};
use artistdl::clients::errors::{Error, Result};
use artistdl::config::ConfigBuilder;
use artistdl::logging;
use artistdl::orchestrator::Orchestrator;
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::{Cell, Table};
use dialoguer::{Input, Select};
use log::info;

const DEFAULT_LIMIT: u32 = 50;

#[derive(Parser, Debug)]
#[command(name = "artistdl")]
#[command(version, about = "Download an artist's top Last.fm tracks from YouTube Music", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Env file with LAST_FM_KEY and friends (default: ./.env)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Log file, appended to on every run
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the artist's top tracks
    Download {
        #[command(flatten)]
        selection: Selection,

        /// Base directory for downloaded audio
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Audio codec to extract (mp3, m4a, aac, flac, opus, vorbis, wav, alac)
        #[arg(long)]
        format: Option<String>,

        /// yt-dlp audio quality, 0-10 or a bitrate such as 192K
        #[arg(long)]
        quality: Option<String>,

        /// Netscape cookie file handed to yt-dlp
        #[arg(long)]
        cookies: Option<PathBuf>,
    },
    /// List the artist's top tracks without downloading
    Tracks {
        #[command(flatten)]
        selection: Selection,
    },
}

#[derive(Args, Debug)]
struct Selection {
    /// Artist name, prompted for when omitted
    artist: Option<String>,

    /// How many top tracks to fetch
    #[arg(long, value_enum, conflicts_with = "limit")]
    top: Option<TopTracks>,

    /// Exact number of top tracks to fetch
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..=1000))]
    limit: Option<u32>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TopTracks {
    #[value(name = "50")]
    Top50,
    #[value(name = "1000")]
    Top1000,
}

impl TopTracks {
    fn limit(self) -> u32 {
        match self {
            TopTracks::Top50 => 50,
            TopTracks::Top1000 => 1000,
        }
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = ConfigBuilder::from_env(cli.env_file.as_deref())?;
    if let Some(log_file) = cli.log_file {
        builder = builder.log_file(log_file);
    }
    if let Commands::Download {
        output_dir,
        format,
        quality,
        cookies,
        ..
    } = &cli.command
    {
        if let Some(dir) = output_dir {
            builder = builder.download_dir(dir);
        }
        if let Some(format) = format {
            builder = builder.audio_format(format);
        }
        if let Some(quality) = quality {
            builder = builder.audio_quality(quality);
        }
        if let Some(cookies) = cookies {
            builder = builder.cookie_file(cookies);
        }
    }

    logging::init(&builder.log_file_path(), cli.verbose)?;
    let config = builder.build()?;
    let orchestrator = Orchestrator::try_from_config(&config)?;

    match &cli.command {
        Commands::Download { selection, .. } => {
            orchestrator.preflight().await?;
            let (artist, limit) = resolve_selection(selection)?;
            info!("Saving audio under {}", config.download_dir.display());
            let report = orchestrator.run(&artist, limit).await?;
            print_report(&report);
        }
        Commands::Tracks { selection } => {
            let (artist, limit) = resolve_selection(selection)?;
            let tracks = orchestrator.top_tracks(&artist, limit).await?;
            print_tracks(&artist, &tracks);
        }
    }
    Ok(())
}

// Prompts only when attached to a terminal
fn resolve_selection(selection: &Selection) -> Result<(String, u32)> {
    let interactive = std::io::stdin().is_terminal();
    let given = selection
        .artist
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());

    let artist = match given {
        Some(artist) => artist.to_string(),
        None if interactive => Input::<String>::new()
            .with_prompt("Artist name")
            .interact_text()?,
        None => {
            return Err(Error::InvalidInput(
                "artist name is required when not running interactively".to_string(),
            ));
        }
    };

    let limit = match (selection.limit, selection.top) {
        (Some(limit), _) => limit,
        (None, Some(top)) => top.limit(),
        (None, None) if interactive && given.is_none() => prompt_top_tracks()?.limit(),
        (None, None) => DEFAULT_LIMIT,
    };
    Ok((artist, limit))
}

fn prompt_top_tracks() -> Result<TopTracks> {
    let choice = Select::new()
        .with_prompt("How many top tracks?")
        .items(&["Top 50", "Top 1000"])
        .default(0)
        .interact()?;
    Ok(if choice == 1 {
        TopTracks::Top1000
    } else {
        TopTracks::Top50
    })
}

fn print_report(report: &RunReport) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Track", "Match", "Result"]);

    for outcome in &report.outcomes {
        let matched = outcome.matched.as_ref().map_or_else(
            || "-".to_string(),
            |m| format!("{} ({})", m.title, m.artists.join(", ")),
        );
        let result = match &outcome.status {
            OutcomeStatus::Downloaded(path) => path.display().to_string(),
            OutcomeStatus::Failed(reason) => format!("FAILED: {reason}"),
        };
        table.add_row(vec![
            Cell::new(outcome.track.rank),
            Cell::new(&outcome.track.title),
            Cell::new(matched),
            Cell::new(result),
        ]);
    }

    println!("{table}");
    println!("\n{}: {}", report.artist, report.summary());
}

fn print_tracks(artist: &str, tracks: &[Track]) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Track", "Playcount"]);
    for track in tracks {
        let playcount = track
            .playcount
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        table.add_row(vec![
            Cell::new(track.rank),
            Cell::new(&track.title),
            Cell::new(playcount),
        ]);
    }
    println!("{table}");
    println!("\n{} top tracks for {artist}", tracks.len());
}
