//! Command-line surface and dispatch.

use std::io::Write;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use coldstore_core::{DomainError, RecordId};
use coldstore_infra::{HistoryPolicy, RecordStore, StoreConfig, StoreError, UpsertOutcome};
use coldstore_observability::LogFormat;

use crate::form::{BillArgs, EditArgs, FormArgs};
use crate::render;
use crate::session::{EditSession, Submission};

#[derive(Debug, Parser)]
#[command(name = "coldstore")]
#[command(about = "Cold storage inventory and billing ledger")]
#[command(version)]
pub struct Cli {
    /// SQLite database URL (overrides COLDSTORE_DATABASE_URL).
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Which changes are written to the audit trail: off, updates, all.
    #[arg(long, global = true)]
    pub history: Option<HistoryPolicy>,

    /// Refuse items whose end date is before their start date.
    #[arg(long, global = true)]
    pub reject_reversed: bool,

    /// Accept items whose end date is before their start date, even when
    /// COLDSTORE_REJECT_REVERSED is set.
    #[arg(long, global = true, conflicts_with = "reject_reversed")]
    pub allow_reversed: bool,

    /// Log output format: pretty or json.
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Environment configuration with command-line overrides applied.
    pub fn store_config(&self) -> anyhow::Result<StoreConfig> {
        let config = StoreConfig::from_env().context("invalid COLDSTORE_* environment")?;
        Ok(self.apply_overrides(config))
    }

    /// Apply the global flags on top of `config`.
    pub fn apply_overrides(&self, mut config: StoreConfig) -> StoreConfig {
        if let Some(url) = &self.database_url {
            config = config.with_database_url(url.clone());
        }
        if let Some(history) = self.history {
            config = config.with_history(history);
        }
        if self.reject_reversed {
            config = config.with_reject_reversed_intervals(true);
        }
        if self.allow_reversed {
            config = config.with_reject_reversed_intervals(false);
        }
        config
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a new item.
    Add(FormArgs),

    /// Add an item, or update the existing item with the same name.
    QuickAdd(FormArgs),

    /// Replace every field of an item.
    Update {
        #[arg(long)]
        id: RecordId,

        #[command(flatten)]
        form: FormArgs,
    },

    /// Load an item and change only the given fields.
    Edit(EditArgs),

    /// Show one item.
    Show {
        #[arg(long)]
        id: RecordId,

        #[arg(long)]
        json: bool,
    },

    /// List all items.
    List {
        #[arg(long)]
        json: bool,
    },

    /// Delete an item by id, or every item with a name.
    Delete(DeleteArgs),

    /// Show the audit trail, optionally for one item.
    History {
        #[arg(long)]
        id: Option<RecordId>,

        #[arg(long)]
        json: bool,
    },

    /// Preview a bill without saving anything.
    Bill(BillArgs),
}

#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct DeleteArgs {
    #[arg(long)]
    pub id: Option<RecordId>,

    #[arg(long)]
    pub name: Option<String>,
}

/// Run one command against `store`, writing user-facing output to `out`.
pub async fn execute<S, W>(command: Command, store: &S, out: &mut W) -> anyhow::Result<()>
where
    S: RecordStore + ?Sized,
    W: Write,
{
    match command {
        Command::Add(args) => {
            let form = args.into_form()?;
            let mut session = EditSession::new();
            let submission = session.submit(store, form).await.context("failed to add item")?;
            report_submission(store, submission, out).await?;
        }
        Command::QuickAdd(args) => {
            let form = args.into_form()?;
            let (id, outcome) = store
                .upsert_by_name(form)
                .await
                .context("failed to save item")?;
            let verb = match outcome {
                UpsertOutcome::Created => "added",
                UpsertOutcome::Updated => "updated",
            };
            writeln!(out, "Item {verb} successfully (id {id}).")?;
        }
        Command::Update { id, form } => {
            let form = form.into_form()?;
            if store.update(id, form).await.context("failed to update item")? {
                report_submission(store, Submission::Updated(id), out).await?;
            } else {
                writeln!(out, "No item with id {id}; nothing was updated.")?;
            }
        }
        Command::Edit(args) => {
            let mut session = EditSession::new();
            session
                .load(store, args.id)
                .await
                .map_err(|e| not_found_as(e, args.id))?;

            let draft = session.draft().context("no record loaded")?;
            let form = args.apply(draft);
            let submission = session.submit(store, form).await.context("failed to save item")?;
            report_submission(store, submission, out).await?;
        }
        Command::Show { id, json } => {
            let record = store
                .find_by_id(id)
                .await
                .context("failed to load item")?
                .with_context(|| format!("no item with id {id}"))?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&record)?)?;
            } else {
                write!(out, "{}", render::record_detail(&record))?;
            }
        }
        Command::List { json } => {
            let records = store.list_all().await.context("failed to list items")?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&records)?)?;
            } else {
                write!(out, "{}", render::record_table(&records))?;
            }
        }
        Command::Delete(DeleteArgs { id, name }) => match (id, name) {
            (Some(id), _) => {
                if store.delete(id).await.context("failed to delete item")? {
                    writeln!(out, "Item deleted successfully.")?;
                } else {
                    writeln!(out, "No item with id {id}; nothing was deleted.")?;
                }
            }
            (None, Some(name)) => {
                let removed = store
                    .delete_by_name(&name)
                    .await
                    .context("failed to delete item")?;
                if removed == 0 {
                    writeln!(out, "No item named {name:?}; nothing was deleted.")?;
                } else {
                    writeln!(out, "Deleted {removed} item(s) named {name:?}.")?;
                }
            }
            (None, None) => anyhow::bail!("either --id or --name is required"),
        },
        Command::History { id, json } => {
            let entries = match id {
                Some(id) => store.history_for(id).await,
                None => store.history_all().await,
            }
            .context("failed to load history")?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
            } else {
                write!(out, "{}", render::history_table(&entries))?;
            }
        }
        Command::Bill(args) => {
            writeln!(out, "{}", render::money(args.bill_preview()))?;
        }
    }

    Ok(())
}

async fn report_submission<S, W>(store: &S, submission: Submission, out: &mut W) -> anyhow::Result<()>
where
    S: RecordStore + ?Sized,
    W: Write,
{
    let (id, verb) = match submission {
        Submission::Created(id) => (id, "added"),
        Submission::Updated(id) => (id, "updated"),
        Submission::Vanished(id) => {
            writeln!(out, "Item {id} no longer exists; nothing was saved.")?;
            return Ok(());
        }
    };

    let bill = store
        .find_by_id(id)
        .await
        .context("failed to reload item")?
        .map(|r| render::money(r.bill_amount))
        .unwrap_or_else(|| "-".to_string());

    writeln!(out, "Item {verb} successfully (id {id}, bill {bill}).")?;
    Ok(())
}

fn not_found_as(err: StoreError, id: RecordId) -> anyhow::Error {
    match err {
        StoreError::Domain(DomainError::NotFound) => anyhow::anyhow!("no item with id {id}"),
        other => anyhow::Error::new(other).context("failed to load item"),
    }
}
