//! App Service area registration.

use std::sync::Arc;

use common::command::CommandGroup;

use crate::commands::DatabaseAddCommand;
use crate::service::AppServiceServiceTrait;

/// Top-level group name of the area.
pub const AREA: &str = "appservice";

const AREA_DESCRIPTION: &str = "App Service operations - Commands for managing Azure App \
     Service resources including web apps, databases, and configurations.";

/// Adds the `appservice` group and its commands below `root`.
pub fn register(root: &mut CommandGroup, service: Arc<dyn AppServiceServiceTrait>) {
    root.subgroup_mut(AREA, AREA_DESCRIPTION)
        .subgroup_mut("database", "App Service database operations")
        .add_command(Arc::new(DatabaseAddCommand::new(service)));

    tracing::debug!(area = AREA, "Registered command area");
}
