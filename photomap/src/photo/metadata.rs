//! EXIF-derived photo metadata.

use serde::{Deserialize, Serialize};

/// Camera details extracted from a photo's EXIF block at upload time.
///
/// Every field is optional; uploads from devices that strip EXIF carry none.
/// Field names serialize in camelCase to match the stored row shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aperture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutter_speed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_balance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<String>,
}

impl PhotoMetadata {
    /// True when no field is populated.
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.is_none())
    }

    /// Populated fields as `(label, value)` pairs, in display order.
    pub fn populated(&self) -> Vec<(&'static str, &str)> {
        self.fields()
            .into_iter()
            .filter_map(|(label, value)| value.map(|v| (label, v)))
            .collect()
    }

    fn fields(&self) -> [(&'static str, Option<&str>); 10] {
        [
            ("Camera", self.camera.as_deref()),
            ("Lens", self.lens.as_deref()),
            ("Focal length", self.focal_length.as_deref()),
            ("Aperture", self.aperture.as_deref()),
            ("Shutter speed", self.shutter_speed.as_deref()),
            ("ISO", self.iso.as_deref()),
            ("Taken", self.date_time.as_deref()),
            ("Resolution", self.resolution.as_deref()),
            ("White balance", self.white_balance.as_deref()),
            ("Brightness", self.brightness.as_deref()),
        ]
    }
}
