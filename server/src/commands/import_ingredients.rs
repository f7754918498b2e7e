use std::path::{Path, PathBuf};

use clap::Args;
use color_eyre::eyre::WrapErr;
use csv::{ReaderBuilder, StringRecord};
use db::{cooking::Ingredient, setup_db_pool, PgPool, StoreError};

use crate::Result;

#[derive(Args, Debug)]
pub(crate) struct ImportIngredients {
    /// CSV file with one `name,measurement_unit` pair per row
    #[arg(long)]
    path: PathBuf,

    /// Treat the first row as a header and skip it
    #[arg(long)]
    has_headers: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ImportSummary {
    pub created: usize,
    pub existing: usize,
    pub rejected: usize,
}

fn parse_row(record: &StringRecord) -> Option<(&str, &str)> {
    match (record.get(0), record.get(1), record.len()) {
        (Some(name), Some(unit), 2) => Some((name, unit)),
        _ => None,
    }
}

impl ImportIngredients {
    pub(crate) async fn import(&self) -> Result<()> {
        let pool = setup_db_pool().await?;

        let summary = import_file(&pool, &self.path, self.has_headers).await?;

        tracing::info!(
            created = summary.created,
            existing = summary.existing,
            rejected = summary.rejected,
            "Ingredient import finished"
        );

        Ok(())
    }
}

#[tracing::instrument(skip(pool), err)]
pub(crate) async fn import_file(
    pool: &PgPool,
    path: &Path,
    has_headers: bool,
) -> Result<ImportSummary> {
    let mut reader = ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_path(path)
        .wrap_err_with(|| format!("Failed to open {}", path.display()))?;

    let mut summary = ImportSummary::default();

    for (idx, result) in reader.records().enumerate() {
        let row = idx + 1;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(row, error = %e, "Skipping unreadable row");
                summary.rejected += 1;
                continue;
            }
        };

        let Some((name, unit)) = parse_row(&record) else {
            tracing::warn!(row, ?record, "Expected 2 columns, skipping row");
            summary.rejected += 1;
            continue;
        };

        match Ingredient::create_if_missing(pool, name, unit).await {
            Ok(Some(_)) => summary.created += 1,
            Ok(None) => {
                tracing::debug!(row, name, unit, "Ingredient already in the catalog");
                summary.existing += 1;
            }
            Err(StoreError::Invalid(reason)) => {
                tracing::warn!(row, name, unit, %reason, "Skipping invalid ingredient");
                summary.rejected += 1;
            }
            Err(e) => return Err(e).wrap_err_with(|| format!("Failed to import row {row}")),
        }
    }

    Ok(summary)
}
