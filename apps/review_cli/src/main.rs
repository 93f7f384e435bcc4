use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, load_settings_from, ClientSettings, HttpTransport, MemoryPage, ReviewClient,
    SelectedFile, SubmissionOutcome, UiEvent, UiOutcome,
};
use shared::domain::{ConfidenceTier, MatchId};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Upload documents and review suggested matches from the terminal")]
struct Cli {
    /// Overrides `server_url` from the settings file and environment.
    #[arg(long)]
    server_url: Option<String>,
    /// Settings file; defaults to `review_client.toml` in the working directory.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a PDF, then open the review page the backend redirects to.
    Upload {
        file: PathBuf,
        #[command(flatten)]
        review: ReviewArgs,
    },
    /// Open an existing review page.
    Review {
        url: String,
        #[command(flatten)]
        review: ReviewArgs,
    },
}

#[derive(clap::Args, Debug)]
struct ReviewArgs {
    /// Pick a candidate for a line item, as `MATCH_ID=INDEX`. Repeatable.
    #[arg(long = "select", value_parser = parse_selection)]
    selections: Vec<(MatchId, usize)>,
    /// Confirm the selections and write the export into this directory.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_selection(raw: &str) -> Result<(MatchId, usize), String> {
    let (id, index) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected MATCH_ID=INDEX, got '{raw}'"))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("invalid index in '{raw}': {err}"))?;
    Ok((MatchId::new(id.trim()), index))
}

fn settings(cli: &Cli) -> Result<ClientSettings> {
    let mut settings = match &cli.config {
        Some(path) => load_settings_from(Some(path.as_path()), |key| std::env::var(key).ok())?,
        None => load_settings()?,
    };
    if let Some(server_url) = &cli.server_url {
        settings.server_url = server_url.clone();
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let settings = settings(&cli)?;

    let transport = HttpTransport::new(&settings.server_url, settings.request_timeout())
        .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    let mut client = ReviewClient::new(&settings, MemoryPage::new(), Arc::new(transport));

    match cli.command {
        Command::Upload { file, review } => {
            let target = upload(&mut client, &file).await?;
            run_review(&mut client, &target, review).await
        }
        Command::Review { url, review } => run_review(&mut client, &url, review).await,
    }
}

async fn upload(client: &mut ReviewClient<MemoryPage>, path: &Path) -> Result<String> {
    client.initialize(None).await?;
    let file = SelectedFile::from_path(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;

    match client.dispatch(UiEvent::FilesSelected(vec![file])).await? {
        UiOutcome::Staged { name, size } => println!("staged {name} ({size})"),
        UiOutcome::Rejected(message) => bail!(message),
        other => bail!("unexpected intake outcome: {other:?}"),
    }

    match client.dispatch(UiEvent::Submit).await? {
        UiOutcome::SubmissionStarted => {}
        other => bail!("unexpected submit outcome: {other:?}"),
    }
    match client.finish_submission().await? {
        SubmissionOutcome::Redirected(target) => {
            info!(%target, "upload accepted");
            Ok(target)
        }
        SubmissionOutcome::Failed(reason) => bail!("upload failed: {reason}"),
        SubmissionOutcome::MissingFile => bail!("no file was staged for upload"),
    }
}

async fn run_review(
    client: &mut ReviewClient<MemoryPage>,
    url: &str,
    args: ReviewArgs,
) -> Result<()> {
    client.open_page(url).await?;
    if client.renderer().is_none() {
        bail!("'{url}' has no review data");
    }

    for (match_id, index) in args.selections {
        client
            .dispatch(UiEvent::SelectionChanged { match_id, index })
            .await?;
    }
    print_table(client)?;

    let Some(output) = args.output else {
        return Ok(());
    };
    let export = client.confirm().await?;
    let doc_id = client
        .renderer()
        .map(|renderer| renderer.payload().doc_id.to_string())
        .unwrap_or_default();
    let filename = export
        .filename
        .unwrap_or_else(|| format!("matches_{doc_id}.csv"));
    // Never let a server-provided name escape the output directory.
    let filename = Path::new(&filename)
        .file_name()
        .ok_or_else(|| anyhow!("export filename '{filename}' is not a file name"))?
        .to_owned();

    tokio::fs::create_dir_all(&output)
        .await
        .with_context(|| format!("failed to create '{}'", output.display()))?;
    let path = output.join(filename);
    tokio::fs::write(&path, &export.body)
        .await
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    println!("export written to {}", path.display());
    Ok(())
}

fn print_table(client: &ReviewClient<MemoryPage>) -> Result<()> {
    let renderer = client
        .renderer()
        .ok_or_else(|| anyhow!("no review table loaded"))?;
    let payload = renderer.payload();
    println!("Found {} line items for document {}", payload.rows.len(), payload.doc_id);

    for (position, row) in payload.rows.iter().enumerate() {
        let selected = renderer
            .selection(&row.match_id)
            .unwrap_or_else(|| row.initial_selection());
        let choice = row
            .choices
            .get(selected)
            .map(|choice| choice.label())
            .unwrap_or("-");
        let tier = ConfidenceTier::for_index(selected);
        println!(
            "{:>3}  {:<40}  {:<24}  {:>4}  [{}]",
            position + 1,
            row.description,
            choice,
            tier.label(),
            row.match_id
        );
    }
    Ok(())
}
