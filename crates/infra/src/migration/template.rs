use serde::Serialize;
use tracing::instrument;

use super::{Filter, MigrationError, NotNullAction, TableHandler, Update};

/// Rows touched by [`register_template_table`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub consumable_flagged: u64,
    pub types_rewritten: u64,
    pub obsolete_category_column: bool,
}

/// Bring a `product_template` table up to the current schema.
///
/// Legacy rows typed `stockable` or `consumable` become `goods`, the former
/// `consumable` ones keeping that trait through the `consumable` flag. The
/// obsolete `category` column is only reported: dropping it is left to the
/// operator. Running it twice changes nothing the second time.
#[instrument(skip(handler), fields(table = handler.table()), err)]
pub async fn register_template_table(
    handler: &dyn TableHandler,
) -> Result<MigrationReport, MigrationError> {
    handler
        .not_null_action("category", NotNullAction::Remove)
        .await?;

    let consumable_flagged = handler
        .update(&Update::new(
            "consumable",
            true,
            Filter::Eq("type".to_string(), "consumable".into()),
        ))
        .await?;
    let types_rewritten = handler
        .update(&Update::new(
            "type",
            "goods",
            Filter::In(
                "type".to_string(),
                vec!["stockable".into(), "consumable".into()],
            ),
        ))
        .await?;

    let obsolete_category_column = handler.column_exists("category").await?;
    if obsolete_category_column {
        tracing::warn!(
            "the column \"category\" on table \"{}\" must be dropped manually",
            handler.table()
        );
    }

    let report = MigrationReport {
        consumable_flagged,
        types_rewritten,
        obsolete_category_column,
    };
    tracing::info!(?report, "template table registered");
    Ok(report)
}
