use std::sync::Arc;

use binder_service::BinderService;
use binder_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<BinderService>,
}
impl AppState {
	pub async fn new(config: binder_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self { service: Arc::new(BinderService::new(config, db)) })
	}
}
