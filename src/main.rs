// VIDFORGE Main Entry Point
// Copyright (c) 2026 Xing_The_Creator | VIDFORGE

use vidforge_core::agent::compliance;
use vidforge_core::agent::core::VideoPipeline;
use vidforge_core::agent::health;
use vidforge_core::agent::topic_discovery::TopicDiscovery;
use vidforge_core::agent::youtube::UploadManager;
use vidforge_core::config::Settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "vidforge")]
#[command(about = "Generate long-form narrated videos about AI and robotics", long_about = None)]
#[command(after_help = "Examples:\n  vidforge --topic \"AI Mass Layoffs in 2026\"\n  vidforge --discover\n  vidforge --test")]
struct Cli {
    /// Specific topic to generate a video about
    #[arg(short, long)]
    topic: Option<String>,

    /// Auto-discover a trending topic
    #[arg(short, long)]
    discover: bool,

    /// Test mode: run every stage except video rendering
    #[arg(long)]
    test: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List ranked trending topics without generating anything
    Discover {
        /// Number of topics to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Upload a rendered project from the output directory
    Upload {
        /// Project id (e.g. video_20260101_120000)
        #[arg(short, long)]
        project: String,

        /// Publish immediately instead of uploading as private
        #[arg(long)]
        public: bool,
    },

    /// Pull channel statistics and save performance patterns
    AnalyzeChannel,

    /// Print monetization best practices
    Practices,
}

/// Console plus a plain-text copy in `<logs>/video_generator.log`.
fn init_logging(settings: &Settings, verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{},symphonia=error,hyper=warn,reqwest=warn", level))
    };

    let file_layer = OpenOptions::new()
        .create(true)
        .append(true)
        .open(settings.log_file())
        .ok()
        .map(|file| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
}

async fn run_pipeline(settings: Settings, topic: Option<String>, discover: bool, test: bool) -> Result<()> {
    // Neither flag given: discover.
    let discover = discover || topic.is_none();
    let mut pipeline = VideoPipeline::new(settings)?;

    let outcome = tokio::select! {
        result = pipeline.run(topic.as_deref(), discover, test) => result?,
        _ = tokio::signal::ctrl_c() => {
            println!("\n\n⚠️ Pipeline interrupted by user");
            std::process::exit(1);
        }
    };

    match outcome.video_path {
        Some(path) => println!("\n✅ Video created: {}", path.display()),
        None => println!("\n✅ Pipeline completed (video rendering skipped)"),
    }
    if !outcome.compliance_passed {
        println!("⚠️ Compliance review needed: {}", outcome.compliance_path.display());
    }
    Ok(())
}

async fn run(cli: Cli, settings: Settings) -> Result<()> {
    match cli.command {
        None => run_pipeline(settings, cli.topic, cli.discover, cli.test).await,
        Some(Commands::Discover { limit }) => {
            let topics = TopicDiscovery::new(&settings).discover(limit).await;
            if topics.is_empty() {
                println!("No topics found.");
            }
            for (i, topic) in topics.iter().enumerate() {
                println!("{:>2}. [{:>5.1}] {} ({})", i + 1, topic.score, topic.title, topic.source);
            }
            Ok(())
        }
        Some(Commands::Upload { project, public }) => {
            println!("📤 Uploading project: {}", project);
            let mut manager = UploadManager::new(&settings);
            let video_id = manager.upload_from_output(&project, public).await?;
            println!("✅ Uploaded: https://youtube.com/watch?v={}", video_id);
            Ok(())
        }
        Some(Commands::AnalyzeChannel) => {
            println!("📊 Analyzing channel performance...");
            let mut manager = UploadManager::new(&settings);
            let patterns = manager.learn_from_channel().await?;
            println!("Average views: {}", patterns.avg_views);
            println!("Top videos: {:?}", patterns.best_performing_titles.iter().take(3).collect::<Vec<_>>());
            Ok(())
        }
        Some(Commands::Practices) => {
            println!("{}", compliance::best_practices());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::from_env();
    if let Err(e) = settings.ensure_dirs() {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
    init_logging(&settings, cli.verbose);

    // Global panic handler: log panics instead of crashing silently
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        error!("🚨 [VIDFORGE PANIC] at {}: {}", location, message);
        eprintln!("🚨 [VIDFORGE PANIC] at {}: {}", location, message);
    }));

    info!("--- VIDFORGE v{} ---", env!("CARGO_PKG_VERSION"));

    let missing_deps = health::check_dependencies();
    if !missing_deps.is_empty() {
        warn!("⚠️ Missing dependencies: {:?}. Rendering will fail.", missing_deps);
    }

    if let Err(e) = run(cli, settings).await {
        error!("{:#}", e);
        println!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}
