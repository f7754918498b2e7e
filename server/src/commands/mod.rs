use clap::Subcommand;

use crate::Result;

use self::{add_tag::AddTag, import_ingredients::ImportIngredients};

pub(crate) mod add_tag;
pub(crate) mod import_ingredients;

#[derive(Subcommand, Default)]
pub(crate) enum Command {
    #[default]
    Serve,
    /// Load the ingredient catalog from a `name,measurement_unit` CSV file
    ImportIngredients(ImportIngredients),
    AddTag(AddTag),
}

impl Command {
    pub(crate) async fn run(&self) -> Result<()> {
        match &self {
            Command::Serve => crate::http_server::cmd::serve().await,
            Command::ImportIngredients(cmd) => cmd.import().await,
            Command::AddTag(cmd) => cmd.add().await,
        }
    }
}
