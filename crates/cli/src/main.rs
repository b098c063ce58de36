use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "banter")]
#[command(about = "Banter CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and default files (config, Data
    /// directory with empty quote and media lists).
    Init {
        /// Config file path (default: BANTER_CONFIG_PATH or ~/.banter/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the bot: poll the group and respond per the configured
    /// probabilities. Requires BOT_ID, GROUP_ID, and ACCESS_TOKEN (env or
    /// config file).
    Run {
        /// Config file path (default: BANTER_CONFIG_PATH or ~/.banter/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Seconds between polls (default from config or 5)
        #[arg(long, short)]
        interval: Option<u64>,

        /// Override the general response probability, in [0, 1]
        #[arg(long, value_name = "P")]
        response_probability: Option<f64>,
    },

    /// Upload an image file (or every file in a directory) to the GroupMe
    /// image service and append the hosted URLs to the images list.
    UploadImage {
        /// Image file or directory of images
        path: PathBuf,

        /// Config file path (default: BANTER_CONFIG_PATH or ~/.banter/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Download every listed media URL to local files for backup.
    DownloadMedia {
        /// Output directory (default: "Data Download" next to the data directory)
        #[arg(long, short, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Config file path (default: BANTER_CONFIG_PATH or ~/.banter/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("banter {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Run {
            config,
            interval,
            response_probability,
        }) => {
            if let Err(e) = run_bot(config, interval, response_probability).await {
                log::error!("bot failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::UploadImage { path, config }) => {
            if let Err(e) = run_upload_image(config, path).await {
                log::error!("upload failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::DownloadMedia { out, config }) => {
            if let Err(e) = run_download_media(config, out).await {
                log::error!("download failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_bot(
    config_path: Option<PathBuf>,
    interval: Option<u64>,
    response_probability: Option<f64>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(i) = interval {
        anyhow::ensure!(i > 0, "--interval must be positive");
        config.poll_interval_secs = i;
    }
    if let Some(p) = response_probability {
        config.probabilities.response_probability = p.clamp(0.0, 1.0);
    }
    lib::init::require_initialized(&path, &config)?;

    let bot_id = lib::config::resolve_bot_id(&config)
        .ok_or_else(|| anyhow::anyhow!("BOT_ID is required (env or credentials.botId)"))?;
    let group_id = lib::config::resolve_group_id(&config)
        .ok_or_else(|| anyhow::anyhow!("GROUP_ID is required (env or credentials.groupId)"))?;
    let access_token = lib::config::resolve_access_token(&config).ok_or_else(|| {
        anyhow::anyhow!("ACCESS_TOKEN is required (env or credentials.accessToken)")
    })?;

    let client =
        lib::groupme::GroupmeClient::new(Some(bot_id), Some(group_id), Some(access_token));
    let content =
        lib::content::FileContentSource::new(lib::config::resolve_data_dir(&config, &path));
    let directory = lib::members::MemberDirectory::new(
        Arc::new(client.clone()),
        Duration::from_secs(config.member_cache_ttl_secs),
    );
    let bot = lib::bot::Bot::new(
        client,
        content,
        directory,
        config.probabilities.clone(),
        Duration::from_secs(config.poll_interval_secs),
    );

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("shutdown requested, finishing the current cycle");
            flag.store(false, Ordering::SeqCst);
        }
    });

    bot.run(running).await;
    Ok(())
}

async fn run_upload_image(config_path: Option<PathBuf>, path: PathBuf) -> anyhow::Result<()> {
    let (config, config_file) = lib::config::load_config(config_path)?;
    let access_token = lib::config::resolve_access_token(&config).ok_or_else(|| {
        anyhow::anyhow!("ACCESS_TOKEN is required (env or credentials.accessToken)")
    })?;
    let client = lib::groupme::GroupmeClient::new(None, None, Some(access_token));

    let data_dir = lib::config::resolve_data_dir(&config, &config_file);
    let list_file = data_dir.join("images.txt");
    let urls = lib::media::upload_images(&client, &path, &list_file).await?;
    for url in &urls {
        println!("{}", url);
    }
    println!("uploaded {} image(s)", urls.len());
    Ok(())
}

async fn run_download_media(
    config_path: Option<PathBuf>,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (config, config_file) = lib::config::load_config(config_path)?;
    let data_dir = lib::config::resolve_data_dir(&config, &config_file);
    let out_dir = out.unwrap_or_else(|| {
        data_dir
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("Data Download")
    });

    let summaries = lib::media::download_all(&data_dir, &out_dir).await?;
    for (category, summary) in summaries {
        println!(
            "{:?}: {} downloaded, {} skipped, {} failed",
            category, summary.downloaded, summary.skipped, summary.failed
        );
    }
    Ok(())
}
