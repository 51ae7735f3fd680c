use std::io::Write as _;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use posterforge::catalog::client::{CatalogAuth, CatalogClient, fetch_artwork_bytes};
use posterforge::catalog::model::CatalogItem;
use posterforge::compose::build::compose;
use posterforge::palette::{FALLBACK_PALETTE, PALETTE_SIZE, extract_from_bytes};
use posterforge::render::export::{ExportOpts, Exporter, poster_filename};
use posterforge::render::raster::ArtworkPixels;
use posterforge::style::color::parse_hex;
use posterforge::style::config::StyleConfig;
use posterforge::style::resolve::resolve;
use posterforge::token::client::TokenApiClient;
use posterforge::token::gate::{ExportOutcome, GateState, TokenGate};
use posterforge::token::mail::LogMailer;
use posterforge::token::server::TokenServerState;
use posterforge::token::store::{JsonTokenStore, MemoryTokenStore, TokenStore};
use posterforge::waveform;

#[derive(Parser, Debug)]
#[command(name = "posterforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the catalog for releases.
    Search(SearchArgs),
    /// Fetch one catalog item (with its full listing) as JSON.
    Fetch(FetchArgs),
    /// Compose and export a poster PNG.
    Export(ExportArgs),
    /// Run the single-use token service.
    Serve(ServeArgs),
    /// Post a test order intake to a running token service.
    Webhook(WebhookArgs),
}

#[derive(Parser, Debug)]
struct SearchArgs {
    /// Free-text query.
    query: String,

    /// Maximum result count.
    #[arg(long, default_value_t = 10)]
    limit: u32,

    /// Catalog API base URL.
    #[arg(long, default_value = "https://api.spotify.com/v1")]
    catalog_base: String,
}

#[derive(Parser, Debug)]
struct FetchArgs {
    /// Catalog item id.
    id: String,

    /// Write the item JSON here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Catalog API base URL.
    #[arg(long, default_value = "https://api.spotify.com/v1")]
    catalog_base: String,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Catalog item JSON (as produced by `fetch`).
    #[arg(long = "item")]
    item_path: PathBuf,

    /// Style config JSON; defaults apply when omitted.
    #[arg(long = "style")]
    style_path: Option<PathBuf>,

    /// Output PNG path; derived from the item title when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Quality multiplier.
    #[arg(long, default_value_t = 4.0)]
    scale: f64,

    /// Base width in pixels before scaling.
    #[arg(long)]
    base_width: Option<u32>,

    /// Solid fill under the poster corners (hex), instead of transparency.
    #[arg(long)]
    background: Option<String>,

    /// Single-use download token; switches the export into gated mode.
    #[arg(long)]
    token: Option<String>,

    /// Token service base URL (required with --token).
    #[arg(long)]
    api_base: Option<String>,

    /// Skip the one-time-download confirmation prompt.
    #[arg(long, default_value_t = false)]
    yes: bool,
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 8787)]
    port: u16,

    /// JSON store file; an in-memory store is used when omitted.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Base URL embedded in creation links.
    #[arg(long, default_value = "http://localhost:5173")]
    link_base_url: String,
}

#[derive(Parser, Debug)]
struct WebhookArgs {
    /// Order id to provision.
    order_id: String,

    /// Buyer email.
    #[arg(long, default_value = "buyer@example.com")]
    email: String,

    /// Buyer name.
    #[arg(long, default_value = "Test Buyer")]
    name: String,

    /// Token service base URL.
    #[arg(long, default_value = "http://127.0.0.1:8787")]
    api_base: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Search(args) => cmd_search(args).await,
        Command::Fetch(args) => cmd_fetch(args).await,
        Command::Export(args) => cmd_export(args).await,
        Command::Serve(args) => cmd_serve(args).await,
        Command::Webhook(args) => cmd_webhook(args).await,
    }
}

async fn cmd_search(args: SearchArgs) -> anyhow::Result<()> {
    let client = CatalogClient::new(args.catalog_base, CatalogAuth::from_env()?)?;
    let items = client.search(&args.query, args.limit).await?;
    if items.is_empty() {
        println!("no results for \"{}\"", args.query);
        return Ok(());
    }
    for item in items {
        println!(
            "{}  {} - {} ({})",
            item.id,
            item.title,
            item.contributors_line(),
            item.release_date.as_deref().unwrap_or("unknown date"),
        );
    }
    Ok(())
}

async fn cmd_fetch(args: FetchArgs) -> anyhow::Result<()> {
    let client = CatalogClient::new(args.catalog_base, CatalogAuth::from_env()?)?;
    let item = client.item(&args.id).await?;
    let json = serde_json::to_string_pretty(&item)?;
    match args.out {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("write item '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let item: CatalogItem = serde_json::from_slice(
        &std::fs::read(&args.item_path)
            .with_context(|| format!("read item '{}'", args.item_path.display()))?,
    )
    .context("parse item JSON")?;

    let config: StyleConfig = match &args.style_path {
        Some(path) => serde_json::from_slice(
            &std::fs::read(path).with_context(|| format!("read style '{}'", path.display()))?,
        )
        .context("parse style JSON")?,
        None => StyleConfig::default(),
    };
    let theme = resolve(&config);

    // Artwork pixels and palette come from one fetch; both degrade
    // independently so the export never blocks on either.
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;
    let (artwork, palette) = match &item.artwork_url {
        Some(location) => match fetch_artwork_bytes(&http, location).await {
            Ok(bytes) => {
                let artwork = match ArtworkPixels::decode(&bytes) {
                    Ok(a) => Some(a),
                    Err(err) => {
                        tracing::warn!(%err, "artwork decode failed, rendering placeholder");
                        None
                    }
                };
                let palette = extract_from_bytes(&bytes, PALETTE_SIZE).unwrap_or_else(|err| {
                    tracing::warn!(%err, "palette extraction failed, using fallback");
                    FALLBACK_PALETTE.to_vec()
                });
                (artwork, palette)
            }
            Err(err) => {
                tracing::warn!(%err, "artwork fetch failed, using fallback palette");
                (None, FALLBACK_PALETTE.to_vec())
            }
        },
        None => (None, FALLBACK_PALETTE.to_vec()),
    };

    let bars = waveform::generate(&item.sub_items, waveform::DEFAULT_BAR_COUNT);
    let scene = compose(&item, &theme, &palette, &bars, &config);

    let mut exporter = Exporter::new();
    if let Some(source) = &config.font.source {
        let assets_root = args
            .item_path
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."));
        let font_path = assets_root.join(source);
        let bytes = std::fs::read(&font_path)
            .with_context(|| format!("read font '{}'", font_path.display()))?;
        exporter.register_font(bytes)?;
    }

    let background = args
        .background
        .as_deref()
        .map(|s| parse_hex(s).map_err(|e| anyhow::anyhow!("--background: {e}")))
        .transpose()?;
    let opts = ExportOpts {
        scale: args.scale,
        base_width_px: args.base_width,
        background,
        ..ExportOpts::default()
    };
    let out_path = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(poster_filename(&item.title)));

    let Some(token) = args.token else {
        exporter.export_png(&scene, artwork.as_ref(), &opts, &out_path)?;
        println!("wrote {}", out_path.display());
        return Ok(());
    };

    // Token-gated mode: validate first, confirm, export, then report.
    let api_base = args
        .api_base
        .context("--api-base is required with --token")?;
    let api = TokenApiClient::new(api_base)?;
    let mut gate = TokenGate::new(Box::new(api), token);

    match gate.validate().await {
        GateState::Active { expires_at, .. } => {
            if let Some(at) = expires_at {
                eprintln!("token valid, expires {at}");
            }
        }
        GateState::Used { downloaded_at } => {
            anyhow::bail!(
                "this token was already used{}",
                downloaded_at
                    .map(|t| format!(" (downloaded {t})"))
                    .unwrap_or_default()
            );
        }
        GateState::Expired { .. } => anyhow::bail!("this token has expired"),
        GateState::Invalid { message } => anyhow::bail!("token rejected: {message}"),
        GateState::Unvalidated => anyhow::bail!("token validation did not settle"),
    }

    let metadata = serde_json::json!({
        "itemId": item.id,
        "itemName": item.title,
        "contributors": item.contributors_line(),
        "customization": config,
    });
    let assume_yes = args.yes;
    let outcome = gate
        .export(
            || assume_yes || confirm_single_use(),
            || {
                exporter.export_png(&scene, artwork.as_ref(), &opts, &out_path)?;
                Ok(out_path.clone())
            },
            metadata,
        )
        .await;

    match outcome {
        ExportOutcome::Completed { path, tracked: true } => {
            println!("wrote {}", path.display());
            println!("download recorded; this link cannot be used again");
            Ok(())
        }
        ExportOutcome::Completed {
            path,
            tracked: false,
        } => {
            println!("wrote {}", path.display());
            println!(
                "the file is safe on your device, but download tracking failed; \
                 support may need to reconcile this order manually"
            );
            Ok(())
        }
        ExportOutcome::Declined => {
            println!("export cancelled; the token remains unused");
            Ok(())
        }
        ExportOutcome::Failed(err) => Err(anyhow::anyhow!(err)
            .context("export failed; check artwork availability and retry")),
        ExportOutcome::NotAllowed | ExportOutcome::InFlight => {
            anyhow::bail!("export is not available in the current token state")
        }
    }
}

fn confirm_single_use() -> bool {
    eprint!("You can download this poster ONE time only. Proceed? [y/N] ");
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let store: Box<dyn TokenStore> = match &args.store {
        Some(path) => Box::new(JsonTokenStore::open(path)?),
        None => Box::new(MemoryTokenStore::new()),
    };
    let mailer = Arc::new(LogMailer::new(args.link_base_url));
    let state = TokenServerState::new(store, mailer);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    posterforge::token::server::serve(addr, state).await?;
    Ok(())
}

async fn cmd_webhook(args: WebhookArgs) -> anyhow::Result<()> {
    let intake = posterforge::token::model::OrderIntake {
        order_id: args.order_id,
        buyer_email: args.email,
        name: Some(args.name),
        transaction_id: None,
    };
    let url = format!(
        "{}/api/webhooks/order",
        args.api_base.trim_end_matches('/')
    );
    let response = reqwest::Client::new()
        .post(&url)
        .json(&intake)
        .send()
        .await
        .with_context(|| format!("post order intake to {url}"))?
        .json::<posterforge::token::model::WebhookResponse>()
        .await
        .context("decode webhook response")?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
