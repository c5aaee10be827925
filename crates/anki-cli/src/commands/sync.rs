//! Sync command implementation

use colored::Colorize;

use anki_connect::AnkiConnectClient;
use anki_core::{CancellationToken, Outcome, RemoteGateway, SyncEngine, SyncSummary};
use anki_decl::{Deck, Model, load_decks, load_models, validate_models};

use crate::config::{Settings, SyncPlan};
use crate::error::{CliError, Result};

/// Parsed declarations ready for the engine
#[derive(Debug)]
pub struct Declarations {
    pub models: Vec<Model>,
    pub decks: Vec<Deck>,
}

/// Load and validate the models document, then load the deck documents.
///
/// Deck files that fail to parse are reported and left out.
pub fn load_declarations(plan: &SyncPlan) -> Result<Declarations> {
    let models = load_models(&plan.models)?;
    validate_models(&models)?;

    let loaded = load_decks(&plan.decks, plan.recursive)?;
    for skipped in &loaded.skipped {
        println!(
            "   {} skipped {}: {}",
            "!".yellow(),
            skipped.path.display().to_string().cyan(),
            skipped.reason
        );
    }

    Ok(Declarations {
        models,
        decks: loaded.decks,
    })
}

/// Run the sync command against AnkiConnect
pub fn run_sync(settings: &Settings, cancel: CancellationToken) -> Result<()> {
    let plan = settings.sync_plan()?;
    let client = AnkiConnectClient::connect(settings.anki_url.clone(), settings.timeout)?;
    execute(&plan, client, cancel).map(|_| ())
}

/// Load declarations from `plan` and reconcile them through `gateway`
pub fn execute<G: RemoteGateway>(
    plan: &SyncPlan,
    gateway: G,
    cancel: CancellationToken,
) -> Result<SyncSummary> {
    let dry_run = plan.options.dry_run;
    println!(
        "{} Loading declarations{}",
        "=>".blue().bold(),
        if dry_run { " (dry run)" } else { "" }
    );
    let declarations = load_declarations(plan)?;

    println!(
        "{} Syncing {} model(s) and {} deck(s)...",
        "=>".blue().bold(),
        declarations.models.len(),
        declarations.decks.len()
    );

    let engine = SyncEngine::new(gateway, plan.options, cancel)?;
    match engine.sync(&declarations.models, &declarations.decks) {
        Ok(summary) => {
            print_summary(&summary, dry_run);
            Ok(summary)
        }
        Err(e) if e.is_cancelled() => {
            println!("{} Sync interrupted", "INTERRUPTED".yellow().bold());
            Err(CliError::Core(e))
        }
        Err(e) => {
            let causes = e.causes();
            println!("{} Sync failed:", "ERROR".red().bold());
            for cause in &causes {
                println!("   {} {}", "!".red(), cause);
            }
            Err(CliError::user(format!(
                "Sync failed with {} error(s)",
                causes.len()
            )))
        }
    }
}

fn print_summary(summary: &SyncSummary, dry_run: bool) {
    let (new, existing) = if dry_run {
        println!(
            "{} {} change(s) projected, nothing was written:",
            "DRY-RUN".yellow().bold(),
            summary.projections()
        );
        (Outcome::WouldCreate, Outcome::WouldUpdate)
    } else {
        println!("{} Sync complete:", "OK".green().bold());
        (Outcome::Created, Outcome::Unchanged)
    };

    let rows = [
        ("models", summary.models_with(new), summary.models_with(existing)),
        ("decks", summary.decks_with(new), summary.decks_with(existing)),
        ("notes", summary.notes_with(new), summary.notes_with(existing)),
    ];
    for (kind, created, updated) in rows {
        println!(
            "   {} {:<6} {} {}, {} {}",
            "+".green(),
            kind,
            created,
            new,
            updated,
            existing
        );
    }
}
