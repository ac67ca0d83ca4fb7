//! Loading the configured session and committing its changes.

use anyhow::{bail, Context, Result};
use kbdelta_adapters::{fetch_document, store_from_config, AnyStore, DocumentSource};
use kbdelta_core::{ChangeStore, Config, LoadOutcome, SaveOutcome, Session, SessionError};
use std::path::Path;
use std::time::Duration;

pub type KbSession = Session<AnyStore>;

pub struct Workspace {
    pub config: Config,
    pub session: KbSession,
    pub outcome: LoadOutcome,
}

/// Read the config, fetch the baseline and overlay the saved changes.
pub async fn open_workspace(config_path: &Path) -> Result<Workspace> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

    let source = DocumentSource::from_config(&config);
    let timeout = Duration::from_secs(config.fetch_timeout_secs);
    let document = fetch_document(&source, timeout)
        .await
        .context("Failed to load knowledge base")?;

    let store = store_from_config(&config).context("Failed to set up change store")?;
    let (session, outcome) = Session::open(document, store, config.store.key_encoding).await;

    Ok(Workspace {
        config,
        session,
        outcome,
    })
}

/// Save after a mutating command, or print the change set on a dry run.
pub async fn commit(session: &KbSession, dry_run: bool) -> Result<()> {
    if dry_run {
        let changes = session.changes();
        println!("{}", serde_json::to_string_pretty(&changes)?);
        eprintln!("(dry run: nothing saved)");
        return Ok(());
    }

    match session.save().await {
        Ok(SaveOutcome::Saved { entries }) => {
            println!(
                "💾 Saved {} change(s) to {}",
                entries,
                session.store().describe()
            );
            Ok(())
        }
        Ok(SaveOutcome::NothingToSave) => {
            println!("No changes to save");
            Ok(())
        }
        Err(SessionError::StoreNotConfigured) => {
            bail!("No change store configured; add a `store:` section to the config to keep edits")
        }
        Err(err) => Err(err).context("Failed to save changes"),
    }
}
