mod command_line;

use anyhow::Result;
use elms_dynamo::config::AppConfig;
use elms_dynamo::dynamodb::{KeyKind, RepositoryFactory, TableConfig};
use elms_dynamo::logging;
use elms_dynamo::services::LmsServices;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    logging::init_logging(&config.log_level)?;

    let sdk_config = config.sdk_config().await;
    let factory = RepositoryFactory::new(&sdk_config);

    factory.client().check_auth().await?;

    for table in table_configs(&config) {
        match factory.client().create_table_if_not_exists(&table).await {
            Ok(true) => info!("Table '{}' created", table.table_name()),
            Ok(false) => info!("Table '{}' already exists", table.table_name()),
            Err(e) => info!("Error creating table '{}': {}", table.table_name(), e),
        }
    }

    let services = LmsServices::new(&factory, &config);
    command_line::run(&services).await
}

fn table_configs(config: &AppConfig) -> [TableConfig; 3] {
    [
        TableConfig::builder(&config.user_table, &config.user_key, KeyKind::String).build(),
        TableConfig::builder(&config.course_table, &config.course_key, KeyKind::String).build(),
        TableConfig::builder(
            &config.user_course_table,
            &config.user_course_key,
            KeyKind::String,
        )
        .build(),
    ]
}
