use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::account::Database;
use crate::config::AppConfig;
use crate::inference::ClassifierHandle;
use crate::screening::ScreeningService;
use crate::user_auth::UserAuthService;

/// Gateway application state (shared, read-only after startup)
#[derive(Clone)]
pub struct AppState {
    /// SQLite pool for users and predictions
    pub db: Arc<Database>,
    /// Register / login / token verification
    pub user_auth: Arc<UserAuthService>,
    /// Prediction pipeline, history and stats
    pub screening: Arc<ScreeningService>,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        user_auth: Arc<UserAuthService>,
        screening: Arc<ScreeningService>,
    ) -> Self {
        Self {
            db,
            user_auth,
            screening,
        }
    }

    /// Wire services around an open database and an already-loaded classifier.
    pub fn assemble(
        config: &AppConfig,
        db: Database,
        classifier: ClassifierHandle,
    ) -> Result<Self> {
        let pool = db.pool().clone();
        let user_auth = UserAuthService::new(pool.clone(), &config.auth)
            .context("Failed to initialize auth service")?;
        let screening = ScreeningService::new(pool, classifier, config.model.input_size);

        Ok(Self::new(
            Arc::new(db),
            Arc::new(user_auth),
            Arc::new(screening),
        ))
    }

    /// Connect the database, apply migrations and load the classifier.
    ///
    /// A missing or broken model artifact is logged and leaves predictions
    /// answering 503; database failures abort startup.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let db = Database::connect(&config.database_url)
            .await
            .with_context(|| format!("Failed to open database {}", config.database_url))?;
        db.migrate().await.context("Failed to apply migrations")?;

        let model_path = config.model.path.clone();
        let input_size = config.model.input_size;
        let classifier = tokio::task::spawn_blocking(move || {
            ClassifierHandle::load_onnx(Path::new(&model_path), input_size)
        })
        .await
        .context("Model loading task failed")?;

        Self::assemble(config, db, classifier)
    }
}
