//! Implementation of the `tagsmith backup` subcommands.

use super::{absolute, existing_file};
use crate::backup::BackupStore;
use crate::cli::{BackupFileArgs, BackupListArgs, BackupStoreArgs};
use crate::context::Session;
use crate::error::Result;
use crate::events::{Event, EventAction, append_event};
use serde_json::json;

/// Execute `tagsmith backup store`.
pub fn cmd_backup_store(args: BackupStoreArgs) -> Result<()> {
    let file = existing_file(&args.file)?;
    let session = Session::resolve_from(&file)?;

    let record = BackupStore::new(&session).store(&file, &args.comment)?;
    append_event(
        &session,
        &Event::new(EventAction::BackupStore)
            .with_file(record.source.clone())
            .with_details(json!({ "id": record.id, "comment": record.comment })),
    )?;

    println!("Stored backup {} of {}", record.id, record.source);
    Ok(())
}

/// Execute `tagsmith backup recover`.
pub fn cmd_backup_recover(args: BackupFileArgs) -> Result<()> {
    // The file itself may be gone; resolve the project from its location.
    let file = absolute(&args.file)?;
    let session = Session::resolve_from(&file)?;

    let record = BackupStore::new(&session).recover(&file)?;
    append_event(
        &session,
        &Event::new(EventAction::BackupRecover)
            .with_file(record.source.clone())
            .with_details(json!({ "id": record.id })),
    )?;

    println!(
        "Restored {} from backup {} ({})",
        record.source,
        record.id,
        record.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

/// Execute `tagsmith backup list`.
pub fn cmd_backup_list(args: BackupListArgs) -> Result<()> {
    let (session, file) = match &args.file {
        Some(file) => {
            let file = absolute(file)?;
            (Session::resolve_from(&file)?, Some(file))
        }
        None => (Session::resolve()?, None),
    };

    let records = BackupStore::new(&session).list(file.as_deref())?;
    if records.is_empty() {
        println!("No backups.");
        return Ok(());
    }

    println!("{:<8} {:<20} {:<40} COMMENT", "ID", "TIME (UTC)", "FILE");
    for record in &records {
        println!(
            "{:<8} {:<20} {:<40} {}",
            record.id,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.source,
            record.comment
        );
    }
    Ok(())
}

/// Execute `tagsmith backup cleanup`.
pub fn cmd_backup_cleanup() -> Result<()> {
    let session = Session::resolve()?;
    let report = BackupStore::new(&session).cleanup()?;

    append_event(
        &session,
        &Event::new(EventAction::BackupCleanup).with_details(json!({
            "dropped_records": report.dropped_records,
            "removed_blobs": report.removed_blobs,
        })),
    )?;

    if report.dropped_records.is_empty() && report.removed_blobs.is_empty() {
        println!("Backup store is consistent.");
        return Ok(());
    }
    for id in &report.dropped_records {
        println!("Dropped index entry {} (blob missing)", id);
    }
    for blob in &report.removed_blobs {
        println!("Removed unreferenced blob {}", blob);
    }
    Ok(())
}
