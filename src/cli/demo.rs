//! Demo command - walks a user through a team against the in-memory backend

use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::{InMemoryRepositoryManager, LogMailer};
use crate::{AccessCore, Collaborators};

const OWNER: &str = "owner@example.com";
const USER: &str = "alice@example.com";
const TEAM: &str = "core";

/// Run the scenario, failing if the backend ever disagrees with the registry
pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let backend = Arc::new(InMemoryRepositoryManager::new());
    let mailer = Arc::new(LogMailer::new(config.recovery.sender.clone()));
    let core = AccessCore::build(config, Collaborators::new(backend.clone(), mailer))?;

    core.accounts.register(OWNER, "0wner-pw").await?;
    core.accounts.register(USER, "s3cret!").await?;
    core.credentials.authenticate(USER, "s3cret!").await?;

    core.teams.create_team(TEAM, OWNER).await?;
    core.teams.add_member(TEAM, USER).await?;

    let report = core.teams.sync_team_membership(TEAM).await?;
    let members = backend.members_of(TEAM).await.unwrap_or_default();
    info!(team = TEAM, members = ?members, noop = report.is_noop(), "After adding member");
    anyhow::ensure!(members.contains(USER), "{} missing from backend group", USER);

    core.teams.remove_member(TEAM, USER).await?;

    let report = core.teams.sync_team_membership(TEAM).await?;
    let members = backend.members_of(TEAM).await.unwrap_or_default();
    info!(team = TEAM, members = ?members, noop = report.is_noop(), "After removing member");
    anyhow::ensure!(!members.contains(USER), "{} still in backend group", USER);

    core.recovery.request_reset(USER).await?;

    info!(calls = backend.calls().await.len(), "Demo finished");
    Ok(())
}
