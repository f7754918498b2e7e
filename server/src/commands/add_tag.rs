use clap::Args;
use db::{cooking::Tag, setup_db_pool};

use crate::Result;

/// Create a recipe tag
#[derive(Args, Debug)]
pub(crate) struct AddTag {
    name: String,

    /// Defaults to a slug derived from the name
    #[arg(long)]
    slug: Option<String>,
}

impl AddTag {
    pub(crate) async fn add(&self) -> Result<()> {
        let pool = setup_db_pool().await?;

        let tag = Tag::create(&pool, &self.name, self.slug.as_deref()).await?;

        tracing::info!(tag.id = %tag.tag_id, tag.slug = %tag.slug, "Created tag");

        Ok(())
    }
}
