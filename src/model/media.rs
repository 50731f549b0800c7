//! Media entities: videos and cameras attached to a match.
//!
//! Only the structured metadata lives here; frames and analysis output are
//! someone else's problem.

use crate::error::{StoreError, StoreResult};
use crate::model::validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded video of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Video {
    pub id: String,
    pub match_id: String,
    /// Storage path or URI of the footage.
    pub uri: String,
    pub duration_secs: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVideo {
    pub uri: String,
    pub duration_secs: i64,
}

impl NewVideo {
    pub fn validate(&self) -> StoreResult<()> {
        validate::non_empty("video", "uri", &self.uri)?;
        validate::positive("video", "duration_secs", self.duration_secs)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoPatch {
    pub uri: Option<String>,
    pub duration_secs: Option<i64>,
}

impl VideoPatch {
    pub fn apply(&self, current: &Video) -> NewVideo {
        NewVideo {
            uri: self.uri.clone().unwrap_or_else(|| current.uri.clone()),
            duration_secs: self.duration_secs.unwrap_or(current.duration_secs),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.uri.is_none() && self.duration_secs.is_none()
    }
}

/// A camera rigged for one match, with its calibration payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Camera {
    pub id: String,
    pub match_id: String,
    /// Rig position label, unique within the match.
    pub label: String,
    /// Opaque calibration blob (intrinsics, pose); stored as JSON.
    pub calibration: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCamera {
    pub label: String,
    pub calibration: serde_json::Value,
}

impl NewCamera {
    pub fn validate(&self) -> StoreResult<()> {
        validate::non_empty("camera", "label", &self.label)?;
        if !self.calibration.is_object() {
            return Err(StoreError::validation(
                "camera",
                "calibration",
                "must be a JSON object",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CameraPatch {
    pub label: Option<String>,
    pub calibration: Option<serde_json::Value>,
}

impl CameraPatch {
    pub fn apply(&self, current: &Camera) -> NewCamera {
        NewCamera {
            label: self.label.clone().unwrap_or_else(|| current.label.clone()),
            calibration: self
                .calibration
                .clone()
                .unwrap_or_else(|| current.calibration.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.calibration.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_video_validation() {
        let ok = NewVideo {
            uri: "s3://matches/2026/final.mp4".to_string(),
            duration_secs: 5400,
        };
        assert!(ok.validate().is_ok());

        let zero_duration = NewVideo {
            uri: "s3://x".to_string(),
            duration_secs: 0,
        };
        assert!(zero_duration.validate().is_err());

        let blank_uri = NewVideo {
            uri: "".to_string(),
            duration_secs: 10,
        };
        assert!(blank_uri.validate().is_err());
    }

    #[test]
    fn test_new_camera_validation() {
        let ok = NewCamera {
            label: "baseline-north".to_string(),
            calibration: json!({"fx": 1200.0, "fy": 1200.0, "cx": 960, "cy": 540}),
        };
        assert!(ok.validate().is_ok());

        let not_object = NewCamera {
            label: "baseline-north".to_string(),
            calibration: json!([1, 2, 3]),
        };
        assert!(not_object.validate().is_err());
    }
}
