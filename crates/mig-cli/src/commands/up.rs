//! Up command implementation

use anyhow::Result;
use mig_db::Runner;

use crate::cli::{GlobalArgs, UpArgs};
use crate::commands::common;

/// Execute the up command
pub(crate) async fn execute(args: &UpArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let target = common::resolve_revision(&project, &args.revision)?;
    let db = common::open_target_database(&project, global)?;

    let runner = Runner::new(
        db.as_ref(),
        &project.graph,
        common::state_store(&project)?,
        common::runner_options(&project, args.sql),
    );
    common::report_run(runner.upgrade(&target).await, args.sql)
}
