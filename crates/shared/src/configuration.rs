//! Configurator selection snapshots

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// The three independent selections of a configurator. Any may be unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub model: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
}

/// A configuration captured together with a rendered preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedConfiguration {
    #[serde(flatten)]
    pub configuration: Configuration,
    /// `data:image/png;base64,...`
    pub screenshot: String,
    /// RFC 3339, UTC, millisecond precision
    pub timestamp: String,
}

impl ExportedConfiguration {
    pub fn new(configuration: Configuration, screenshot: String, captured_at: DateTime<Utc>) -> Self {
        Self {
            configuration,
            screenshot,
            timestamp: captured_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_export_json_shape() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let export = ExportedConfiguration::new(
            Configuration {
                model: Some("chair".into()),
                material: None,
                color: Some("red".into()),
            },
            "data:image/png;base64,AAAA".into(),
            at,
        );
        assert_eq!(export.timestamp, "2024-03-01T12:30:00.000Z");

        let value: serde_json::Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();
        assert_eq!(value["model"], "chair");
        assert!(value["material"].is_null());
        assert_eq!(value["color"], "red");
        assert_eq!(value["screenshot"], "data:image/png;base64,AAAA");
    }
}
