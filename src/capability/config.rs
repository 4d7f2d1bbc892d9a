//! Capability configuration model and its wire mapping
//!
//! The model side keeps "not configured" (`None`) apart from "configured to
//! false/zero/empty", and the wire side omits whatever is not configured.
//!
//! Two rules keep repeated applies stable:
//!
//! - `content_tracing` missing on the wire reads back as `true`, the
//!   server's implicit default.
//! - A model with nothing set maps to no `config` block at all, never to an
//!   object of nulls.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use corax_core::DynamicValue;
use corax_core::value::entries_to_json;

use crate::client::{BlobConfig, CapabilityConfig, DataRetention};
use crate::{Error, Result};

/// Retention type keeping data for a number of hours
pub const RETENTION_TIMED: &str = "timed";
/// Retention type keeping data forever
pub const RETENTION_INFINITE: &str = "infinite";

const CUSTOM_PARAMETERS: &str = "custom_parameters";

/// `config` attribute of a capability resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityConfigModel {
    /// Sampling temperature
    pub temperature: Option<f64>,
    /// Upload limits
    pub blob_config: Option<BlobConfigModel>,
    /// Data retention policy
    pub data_retention: Option<DataRetentionModel>,
    /// Record content in observability systems
    pub content_tracing: Option<bool>,
    /// Free-form parameters: a JSON string, an object or a map
    pub custom_parameters: Option<DynamicValue>,
}

/// `config.blob_config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfigModel {
    /// Maximum size of one upload, in megabytes
    pub max_file_size_mb: Option<i64>,
    /// Maximum number of uploads
    pub max_blobs: Option<i64>,
    /// Accepted MIME types
    pub allowed_mime_types: Option<Vec<String>>,
}

/// `config.data_retention`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataRetentionModel {
    /// `timed` or `infinite`
    #[serde(rename = "type")]
    pub kind: String,
    /// Hours to keep data; only meaningful for `timed`
    pub hours: Option<i64>,
}

impl DataRetentionModel {
    /// Timed retention
    pub fn timed(hours: i64) -> Self {
        Self {
            kind: RETENTION_TIMED.to_string(),
            hours: Some(hours),
        }
    }

    /// Infinite retention
    pub fn infinite() -> Self {
        Self {
            kind: RETENTION_INFINITE.to_string(),
            hours: None,
        }
    }

    /// Check the type/hours pairing
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an unknown type, a `timed` policy
    /// without hours or with fewer than one, or an `infinite` policy with hours.
    pub fn validate(&self) -> Result<()> {
        match (self.kind.as_str(), self.hours) {
            (RETENTION_TIMED, None) => Err(Error::validation(
                "config.data_retention.hours is required when type is 'timed'",
            )),
            (RETENTION_TIMED, Some(hours)) if hours < 1 => Err(Error::validation(format!(
                "config.data_retention.hours must be at least 1, got {hours}"
            ))),
            (RETENTION_INFINITE, Some(_)) => Err(Error::validation(
                "config.data_retention.hours must not be set when type is 'infinite'",
            )),
            (RETENTION_TIMED | RETENTION_INFINITE, _) => Ok(()),
            (other, _) => Err(Error::validation(format!(
                "config.data_retention.type must be 'timed' or 'infinite', got '{other}'"
            ))),
        }
    }

    fn to_wire(&self) -> Result<DataRetention> {
        // Hours never travel with infinite retention.
        if self.kind == RETENTION_INFINITE {
            return Ok(DataRetention::infinite());
        }
        self.validate()?;
        let hours = self.hours.ok_or_else(|| {
            Error::validation("config.data_retention.hours is required when type is 'timed'")
        })?;
        Ok(DataRetention::timed(hours))
    }
}

// Inconsistent server values are kept, not rejected: timed without hours
// reads back with `hours` unset.
impl From<&DataRetention> for DataRetentionModel {
    fn from(wire: &DataRetention) -> Self {
        if wire.kind == RETENTION_INFINITE {
            return Self::infinite();
        }
        Self {
            kind: wire.kind.clone(),
            hours: wire.hours,
        }
    }
}

impl BlobConfigModel {
    fn to_wire(&self) -> Option<BlobConfig> {
        let wire = BlobConfig {
            max_file_size_mb: self.max_file_size_mb,
            max_blobs: self.max_blobs,
            allowed_mime_types: self.allowed_mime_types.clone(),
        };
        (wire != BlobConfig::default()).then_some(wire)
    }
}

impl From<&BlobConfig> for BlobConfigModel {
    fn from(wire: &BlobConfig) -> Self {
        Self {
            max_file_size_mb: wire.max_file_size_mb,
            max_blobs: wire.max_blobs,
            allowed_mime_types: wire.allowed_mime_types.clone(),
        }
    }
}

/// Check a configuration before anything is sent
///
/// # Errors
///
/// Returns [`Error::Validation`] for a non-finite temperature or an invalid
/// data retention policy.
pub fn validate(model: &CapabilityConfigModel) -> Result<()> {
    if let Some(t) = model.temperature {
        if !t.is_finite() {
            return Err(Error::validation(
                "config.temperature must be a finite number",
            ));
        }
    }
    if let Some(retention) = &model.data_retention {
        retention.validate()?;
    }
    Ok(())
}

/// Map a model configuration to its wire form.
///
/// Returns `Ok(None)` when the model is absent or sets nothing, so the
/// request omits the `config` key entirely.
///
/// # Errors
///
/// Fails when `custom_parameters` cannot be turned into a key/value mapping
/// or a `timed` retention lacks valid hours.
pub fn to_wire(model: Option<&CapabilityConfigModel>) -> Result<Option<CapabilityConfig>> {
    let Some(model) = model else {
        return Ok(None);
    };

    let wire = CapabilityConfig {
        temperature: model.temperature,
        blob_config: model.blob_config.as_ref().and_then(BlobConfigModel::to_wire),
        data_retention: model
            .data_retention
            .as_ref()
            .map(DataRetentionModel::to_wire)
            .transpose()?,
        content_tracing: model.content_tracing,
        custom_parameters: custom_parameters_to_wire(model.custom_parameters.as_ref())?,
    };

    Ok((wire != CapabilityConfig::default()).then_some(wire))
}

/// Map a wire configuration to the model.
///
/// Absent wire fields stay unset, except `content_tracing`, which reads
/// back as `true` when the server omits it.
pub fn from_wire(wire: Option<&CapabilityConfig>) -> Option<CapabilityConfigModel> {
    wire.map(|w| CapabilityConfigModel {
        temperature: w.temperature,
        blob_config: w.blob_config.as_ref().map(BlobConfigModel::from),
        data_retention: w.data_retention.as_ref().map(DataRetentionModel::from),
        content_tracing: Some(w.content_tracing.unwrap_or(true)),
        custom_parameters: w.custom_parameters.clone().map(DynamicValue::from),
    })
}

/// Normalize `custom_parameters` to a key/value mapping.
///
/// A JSON-encoded string, a structured object and a string-keyed map all
/// produce the same mapping.
///
/// A string holding JSON `null` maps to no parameters.
///
/// # Errors
///
/// Fails for unparsable JSON, JSON that is not an object, non-finite numbers
/// (the error names the entry) and any other top-level value kind.
pub fn custom_parameters_to_wire(value: Option<&DynamicValue>) -> Result<Option<Map<String, Value>>> {
    match value {
        None | Some(DynamicValue::Null) => Ok(None),
        // JSON `null` means no parameters.
        Some(DynamicValue::String(content))
            if serde_json::from_str::<Value>(content).is_ok_and(|v| v.is_null()) =>
        {
            Ok(None)
        }
        Some(DynamicValue::String(content)) => {
            let entries = DynamicValue::parse_object(CUSTOM_PARAMETERS, content)?;
            Ok(Some(entries_to_json(&entries, CUSTOM_PARAMETERS)?))
        }
        Some(DynamicValue::Map(entries)) => Ok(Some(entries_to_json(entries, CUSTOM_PARAMETERS)?)),
        Some(other) => Err(corax_core::Error::UnsupportedValue {
            key: CUSTOM_PARAMETERS.to_string(),
            expected: "a map, an object or a JSON string representing one",
            found: other.kind(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn full_model() -> CapabilityConfigModel {
        CapabilityConfigModel {
            temperature: Some(0.7),
            blob_config: Some(BlobConfigModel {
                max_file_size_mb: Some(10),
                max_blobs: Some(5),
                allowed_mime_types: Some(vec!["image/jpeg".to_string()]),
            }),
            data_retention: Some(DataRetentionModel::timed(24)),
            content_tracing: Some(false),
            custom_parameters: Some(DynamicValue::from(json!({"top_p": 0.9, "stop": ["\n"]}))),
        }
    }

    #[test]
    fn test_empty_model_omits_config() {
        assert_eq!(to_wire(None).unwrap(), None);
        assert_eq!(to_wire(Some(&CapabilityConfigModel::default())).unwrap(), None);
    }

    #[test]
    fn test_empty_blob_config_dropped() {
        let model = CapabilityConfigModel {
            blob_config: Some(BlobConfigModel::default()),
            ..Default::default()
        };
        assert_eq!(to_wire(Some(&model)).unwrap(), None);
    }

    #[test]
    fn test_model_wire_model_round_trip() {
        let model = full_model();
        let wire = to_wire(Some(&model)).unwrap();
        let back = from_wire(wire.as_ref()).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_wire_model_wire_round_trip_defaults_content_tracing() {
        // GIVEN: the server omitted content_tracing
        let wire = CapabilityConfig {
            temperature: Some(0.2),
            data_retention: Some(DataRetention::infinite()),
            ..Default::default()
        };

        // WHEN: reading it into the model and mapping back
        let model = from_wire(Some(&wire)).unwrap();
        let again = to_wire(Some(&model)).unwrap().unwrap();

        // THEN: only content_tracing changed, to its default
        assert_eq!(model.content_tracing, Some(true));
        assert_eq!(
            again,
            CapabilityConfig {
                content_tracing: Some(true),
                ..wire
            }
        );
    }

    #[test]
    fn test_absent_wire_fields_stay_unset() {
        let model = from_wire(Some(&CapabilityConfig::default())).unwrap();
        assert_eq!(model.temperature, None);
        assert_eq!(model.blob_config, None);
        assert_eq!(model.data_retention, None);
        assert_eq!(model.custom_parameters, None);
    }

    #[test]
    fn test_infinite_retention_drops_hours() {
        let model = CapabilityConfigModel {
            data_retention: Some(DataRetentionModel {
                kind: "infinite".to_string(),
                hours: Some(48),
            }),
            ..Default::default()
        };
        let wire = to_wire(Some(&model)).unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            json!({"data_retention": {"type": "infinite"}})
        );
    }

    #[test]
    fn test_timed_retention_without_hours_reads_back_unset() {
        let wire = CapabilityConfig {
            data_retention: Some(DataRetention {
                kind: RETENTION_TIMED.to_string(),
                hours: None,
            }),
            ..Default::default()
        };

        let model = from_wire(Some(&wire)).unwrap();

        assert_eq!(
            model.data_retention,
            Some(DataRetentionModel {
                kind: RETENTION_TIMED.to_string(),
                hours: None,
            })
        );
    }

    #[test]
    fn test_infinite_retention_reads_back_without_hours() {
        let wire = CapabilityConfig {
            data_retention: Some(DataRetention {
                kind: RETENTION_INFINITE.to_string(),
                hours: Some(12),
            }),
            ..Default::default()
        };
        let model = from_wire(Some(&wire)).unwrap();
        assert_eq!(model.data_retention, Some(DataRetentionModel::infinite()));
    }

    #[test]
    fn test_retention_validation() {
        assert!(DataRetentionModel::timed(24).validate().is_ok());
        assert!(DataRetentionModel::infinite().validate().is_ok());

        let err = DataRetentionModel::timed(0).validate().unwrap_err();
        assert!(err.to_string().contains("at least 1"));

        let err = DataRetentionModel {
            kind: "timed".to_string(),
            hours: None,
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("required when type is 'timed'"));

        let err = DataRetentionModel {
            kind: "infinite".to_string(),
            hours: Some(1),
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("must not be set"));

        let err = DataRetentionModel {
            kind: "weekly".to_string(),
            hours: None,
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("'weekly'"));
    }

    #[test]
    fn test_timed_without_hours_fails_mapping() {
        let model = CapabilityConfigModel {
            data_retention: Some(DataRetentionModel {
                kind: "timed".to_string(),
                hours: None,
            }),
            ..Default::default()
        };
        assert!(matches!(to_wire(Some(&model)), Err(Error::Validation(_))));
    }

    #[test]
    fn test_custom_parameters_shapes_agree() {
        let from_string =
            custom_parameters_to_wire(Some(&DynamicValue::from(r#"{"top_k": 40, "mode": "fast"}"#)))
                .unwrap();
        let from_map = custom_parameters_to_wire(Some(&DynamicValue::from(json!({
            "mode": "fast",
            "top_k": 40
        }))))
        .unwrap();
        assert_eq!(from_string, from_map);
        assert_eq!(
            Value::Object(from_string.unwrap()),
            json!({"mode": "fast", "top_k": 40})
        );
    }

    #[test]
    fn test_custom_parameters_invalid_json_names_key() {
        let err = custom_parameters_to_wire(Some(&DynamicValue::from("{oops"))).unwrap_err();
        assert_eq!(err.summary(), "Validation Error");
        assert!(err.to_string().contains("custom_parameters"));
    }

    #[test]
    fn test_custom_parameters_non_finite_names_entry() {
        let value = DynamicValue::Map(
            [("penalty".to_string(), DynamicValue::Float(f64::NAN))]
                .into_iter()
                .collect(),
        );
        let err = custom_parameters_to_wire(Some(&value)).unwrap_err();
        assert!(err.to_string().contains("custom_parameters.penalty"));
    }

    #[test]
    fn test_custom_parameters_null_string_omits_block() {
        assert_eq!(custom_parameters_to_wire(Some(&DynamicValue::from("null"))).unwrap(), None);

        let model = CapabilityConfigModel {
            custom_parameters: Some(DynamicValue::from(" null ")),
            ..Default::default()
        };
        assert_eq!(to_wire(Some(&model)).unwrap(), None);
    }

    #[test]
    fn test_custom_parameters_rejects_scalar() {
        let err = custom_parameters_to_wire(Some(&DynamicValue::Bool(true))).unwrap_err();
        assert!(err.to_string().contains("got bool"));
    }

    #[test]
    fn test_non_finite_temperature_rejected() {
        let model = CapabilityConfigModel {
            temperature: Some(f64::INFINITY),
            ..Default::default()
        };
        assert!(validate(&model).is_err());
    }
}
