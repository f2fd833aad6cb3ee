//! Flowlinks Init - one-shot provisioning of the hosting site.

use std::sync::Arc;

use clap::Parser;
use flowlinks_core::{FirestoreStore, provider_from_env};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use flowlinks_init::{
    ExtensionsRuntime, HostingClient, InitConfig, LogReporter, Plan, ProcessingState, Provisioner,
    StateReporter,
};

/// Flowlinks Init - provision the hosting site.
#[derive(Parser, Debug)]
#[command(name = "flowlinks-init")]
#[command(about = "Provision the flowlinks hosting site", long_about = None)]
struct Args {
    /// Path to .env file (optional).
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    dotenv: String,

    /// Print the plan without calling any API.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if std::path::Path::new(&args.dotenv).exists() {
        dotenvy::from_path(&args.dotenv)?;
        eprintln!("Loaded environment from {}", args.dotenv);
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = InitConfig::from_env();
    let client = reqwest::Client::builder()
        .timeout(flowlinks_core::HTTP_TIMEOUT)
        .build()?;
    let tokens = provider_from_env(client.clone());

    let reporter: Arc<dyn StateReporter> = if config.project.instance_id.is_empty() {
        Arc::new(LogReporter)
    } else {
        Arc::new(ExtensionsRuntime::new(
            client.clone(),
            tokens.clone(),
            config.project.project_id.clone(),
            config.project.instance_id.clone(),
        ))
    };

    // Configuration errors are reported like any other failure
    let plan = match Plan::from_config(&config) {
        Ok(plan) => plan,
        Err(e) => {
            let state = ProcessingState::failed(&e);
            if !args.dry_run && let Err(report_err) = reporter.report(&state).await {
                tracing::warn!(error = %report_err, "failed to report processing state");
            }
            anyhow::bail!("{}", state.message());
        }
    };

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&plan.summary())?);
        return Ok(());
    }

    tracing::info!(
        project = %plan.project_id,
        site_id = %plan.site_id,
        files = plan.assets.len(),
        "starting provisioning"
    );

    let store = FirestoreStore::new(
        client.clone(),
        tokens.clone(),
        config.project.project_id.clone(),
        config.project.collection.clone(),
    );
    let provisioner =
        Provisioner::new(HostingClient::new(client, tokens), reporter).with_store(Arc::new(store));

    let state = provisioner.run(&plan).await;
    if state.is_failed() {
        anyhow::bail!("{}", state.message());
    }

    Ok(())
}
