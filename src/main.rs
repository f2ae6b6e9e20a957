use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pr_mirror::config::Config;
use pr_mirror::git::GitConfig;
use pr_mirror::github::OctocrabClient;
use pr_mirror::server::{build_router, AppState};
use pr_mirror::service::MirrorService;
use pr_mirror::setup;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pr_mirror=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let git = GitConfig {
        root: config.mirror_root.clone(),
        default_branch: config.default_branch.clone(),
        command_timeout: config.git_timeout,
    };
    let github = OctocrabClient::from_token(config.github_token.clone(), config.repo.clone())?;
    let service = MirrorService::new(git, github);

    if std::env::args().nth(1).as_deref() == Some("--setup") {
        setup::run(&config, &service).await?;
        return Ok(());
    }

    let state = AppState::new(service, config.webhook_secret.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(repo = %config.repo, addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
