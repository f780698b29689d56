use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::account::{
    Label, NewPrediction, Prediction, PredictionRepository, Role, StatsRepository, SystemStats,
};
use crate::error::{ServiceError, ServiceResult};
use crate::imaging;
use crate::inference::{Classification, ClassifierHandle};
use crate::user_auth::{Identity, require_role};

/// One upload to classify, already separated from its wire framing
#[derive(Debug, Clone)]
pub struct PredictRequest {
    pub patient_name: String,
    pub patient_age: i64,
    /// Client-supplied file name, recorded as text only
    pub filename: String,
    pub image: Vec<u8>,
}

/// Prediction response data
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PredictionResult {
    #[schema(example = "Jane Doe")]
    pub patient: String,
    pub prediction: Label,
    /// Percentage rounded to 2 decimals
    #[schema(example = 91.73)]
    pub confidence: f64,
}

/// Round to 2 decimal places for display.
pub fn round_confidence(confidence: f64) -> f64 {
    (confidence * 100.0).round() / 100.0
}

/// Inference pipeline, history and admin statistics.
pub struct ScreeningService {
    db: SqlitePool,
    classifier: ClassifierHandle,
    input_size: u32,
}

impl ScreeningService {
    pub fn new(db: SqlitePool, classifier: ClassifierHandle, input_size: u32) -> Self {
        Self {
            db,
            classifier,
            input_size,
        }
    }

    pub fn classifier_loaded(&self) -> bool {
        self.classifier.is_loaded()
    }

    /// Normalize, classify and record one upload for an authenticated caller.
    ///
    /// Nothing is written unless classification succeeds, and the record is a
    /// single-row insert.
    pub async fn predict(
        &self,
        identity: &Identity,
        req: PredictRequest,
    ) -> ServiceResult<PredictionResult> {
        let classification = self.classify(req.image).await?;

        let record = PredictionRepository::insert(
            &self.db,
            &NewPrediction {
                user_id: identity.user_id,
                patient_name: &req.patient_name,
                patient_age: req.patient_age,
                filename: &req.filename,
                label: classification.label,
                confidence: classification.confidence,
            },
        )
        .await?;

        tracing::info!(
            prediction_id = record.id,
            user = %identity.username,
            label = %record.label,
            confidence = record.confidence,
            "Prediction recorded"
        );

        Ok(PredictionResult {
            patient: record.patient_name,
            prediction: record.label,
            confidence: round_confidence(record.confidence),
        })
    }

    /// Every prediction the caller made, newest first. Unpaginated.
    pub async fn history(&self, identity: &Identity) -> ServiceResult<Vec<Prediction>> {
        Ok(PredictionRepository::list_by_user(&self.db, identity.user_id).await?)
    }

    /// Admin-only aggregate counts over the whole store.
    pub async fn system_stats(&self, identity: &Identity) -> ServiceResult<SystemStats> {
        require_role(identity, Role::Admin)?;
        Ok(StatsRepository::system_stats(&self.db).await?)
    }

    /// Decode and run the model off the async workers.
    async fn classify(&self, image: Vec<u8>) -> ServiceResult<Classification> {
        let classifier = self.classifier.clone();
        let input_size = self.input_size;

        tokio::task::spawn_blocking(move || -> ServiceResult<Classification> {
            let tensor = imaging::normalize(&image, input_size)?;
            Ok(classifier.classify(&tensor)?)
        })
        .await
        .map_err(|e| ServiceError::InferenceFailure(format!("Classification task failed: {}", e)))?
    }
}
