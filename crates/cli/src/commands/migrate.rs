use std::path::Path;

use atelier_db::{connect, migrations};

use crate::commands::{
    build_runtime, load_config, CommandResult, EXIT_DB_CONNECTIVITY, EXIT_MIGRATION,
};

const COMMAND: &str = "migrate";

pub fn run(config_path: Option<&Path>) -> CommandResult {
    let config = match load_config(COMMAND, config_path) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let runtime = match build_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DB_CONNECTIVITY))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;
        pool.close().await;
        Ok::<(), (&'static str, String, u8)>(())
    });

    match result {
        Ok(()) => CommandResult::success(COMMAND, "applied pending migrations"),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}
