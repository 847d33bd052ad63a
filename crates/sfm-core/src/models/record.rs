use serde::{Deserialize, Serialize};

use super::{CameraIntrinsics, CameraIntrinsicsError, CameraIntrinsicsModelType};
use crate::Real;

/// Current version of [`CameraIntrinsicsRecord`].
pub const CAMERA_INTRINSICS_RECORD_VERSION: u32 = 0;

/// Versioned, model-agnostic persistence format for camera intrinsics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsicsRecord {
    pub version: u32,
    pub model_type: CameraIntrinsicsModelType,
    pub parameters: Vec<Real>,
}

impl From<&CameraIntrinsics> for CameraIntrinsicsRecord {
    fn from(camera: &CameraIntrinsics) -> Self {
        Self {
            version: CAMERA_INTRINSICS_RECORD_VERSION,
            model_type: camera.model_type(),
            parameters: camera.parameters().to_vec(),
        }
    }
}

impl From<CameraIntrinsics> for CameraIntrinsicsRecord {
    fn from(camera: CameraIntrinsics) -> Self {
        Self::from(&camera)
    }
}

impl TryFrom<CameraIntrinsicsRecord> for CameraIntrinsics {
    type Error = CameraIntrinsicsError;

    fn try_from(record: CameraIntrinsicsRecord) -> Result<Self, Self::Error> {
        if record.version != CAMERA_INTRINSICS_RECORD_VERSION {
            return Err(CameraIntrinsicsError::UnsupportedVersion {
                found: record.version,
                supported: CAMERA_INTRINSICS_RECORD_VERSION,
            });
        }
        CameraIntrinsics::from_parameters(record.model_type, &record.parameters)
    }
}

impl Serialize for CameraIntrinsics {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CameraIntrinsicsRecord::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CameraIntrinsics {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = CameraIntrinsicsRecord::deserialize(deserializer)?;
        CameraIntrinsics::try_from(record).map_err(serde::de::Error::custom)
    }
}

impl CameraIntrinsics {
    pub fn to_json(&self) -> Result<String, CameraIntrinsicsError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CameraIntrinsicsError> {
        let record: CameraIntrinsicsRecord = serde_json::from_str(json)?;
        Self::try_from(record)
    }
}
