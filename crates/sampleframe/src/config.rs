//! Protocol profiles: the framing settings a device speaks, as flags or JSON.

use std::path::Path;

use clap::ValueEnum;
use sampleframe_frame::{
    parse_sync_word, ChannelFormat, ConfigError, Endianness, FrameFormat, SizeMode,
};
use serde::{Deserialize, Serialize};

use crate::exit::{io_error, CliError, CliResult, DATA_INVALID};

/// How the payload length is carried on the wire.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeField {
    /// No size field; every payload is `frame_size` bytes.
    #[default]
    Fixed,
    /// One unsigned byte after the sync word.
    #[value(alias = "field1byte")]
    #[serde(alias = "field1byte")]
    Byte,
    /// Two unsigned bytes after the sync word, in the configured byte order.
    #[value(alias = "field2byte")]
    #[serde(alias = "field2byte")]
    Word,
}

/// Serializable protocol description, loadable with `--config FILE`.
///
/// Omitted keys take the same defaults as the command-line flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtocolProfile {
    pub sync: String,
    pub size_field: SizeField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_size: Option<usize>,
    pub endianness: String,
    pub checksum: bool,
    pub channels: Vec<String>,
    /// Log every sync mismatch at debug level while decoding.
    pub debug: bool,
}

impl Default for ProtocolProfile {
    fn default() -> Self {
        Self {
            sync: "AA BB".to_string(),
            size_field: SizeField::Fixed,
            frame_size: None,
            endianness: Endianness::Little.to_string(),
            checksum: false,
            channels: vec!["uint8".to_string()],
            debug: false,
        }
    }
}

impl ProtocolProfile {
    /// Read a JSON profile from disk.
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("read {}", path.display()), err))?;
        serde_json::from_str(&text).map_err(|err| {
            CliError::new(
                DATA_INVALID,
                format!("parse profile {}: {err}", path.display()),
            )
        })
    }

    /// Build the frame format this profile describes.
    ///
    /// Only parsing happens here; call `FrameFormat::validate` for the
    /// structural checks.
    pub fn to_format(&self) -> Result<FrameFormat, ConfigError> {
        let sync_word = parse_sync_word(&self.sync)?;
        let channels = self
            .channels
            .iter()
            .map(|name| name.parse::<ChannelFormat>())
            .collect::<Result<Vec<_>, _>>()?;
        let endianness = self.endianness.parse::<Endianness>()?;

        let format = FrameFormat::new(sync_word, channels)
            .with_endianness(endianness)
            .with_checksum(self.checksum);
        let size_mode = match self.size_field {
            SizeField::Fixed => SizeMode::Fixed(
                self.frame_size
                    .unwrap_or_else(|| format.sample_set_size()),
            ),
            SizeField::Byte => SizeMode::OneByteField,
            SizeField::Word => SizeMode::TwoByteField,
        };
        if self.frame_size.is_some() && self.size_field != SizeField::Fixed {
            tracing::warn!(
                size_field = ?self.size_field,
                "frame size ignored; payload length comes from the size field"
            );
        }

        Ok(format.with_size_mode(size_mode))
    }
}

#[cfg(test)]
mod tests {
    use sampleframe_frame::ChannelKind;

    use super::*;

    #[test]
    fn defaults_describe_single_byte_frames() {
        let format = ProtocolProfile::default().to_format().unwrap();
        assert_eq!(format, FrameFormat::default());
    }

    #[test]
    fn parses_json_profile() {
        let profile: ProtocolProfile = serde_json::from_str(
            r#"{
                "sync": "55 AA",
                "size_field": "field2byte",
                "endianness": "big",
                "checksum": true,
                "channels": ["uint16", "pad:3", "float"]
            }"#,
        )
        .unwrap();

        let format = profile.to_format().unwrap();
        assert_eq!(format.sync_word, vec![0x55, 0xAA]);
        assert_eq!(format.size_mode, SizeMode::TwoByteField);
        assert_eq!(format.endianness, Endianness::Big);
        assert!(format.checksum);
        assert_eq!(format.channels[1].kind, ChannelKind::Pad(3));
        assert_eq!(format.sample_set_size(), 9);
        assert!(!profile.debug);
    }

    #[test]
    fn fixed_size_defaults_to_one_sample_set() {
        let profile = ProtocolProfile {
            channels: vec!["int16".into(), "uint8".into()],
            ..ProtocolProfile::default()
        };
        assert_eq!(profile.to_format().unwrap().size_mode, SizeMode::Fixed(3));

        let profile = ProtocolProfile {
            frame_size: Some(9),
            ..profile
        };
        assert_eq!(profile.to_format().unwrap().size_mode, SizeMode::Fixed(9));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = serde_json::from_str::<ProtocolProfile>(r#"{"sync_word": "AA"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn reports_parse_errors() {
        let profile = ProtocolProfile {
            sync: "ABC".into(),
            ..ProtocolProfile::default()
        };
        assert!(matches!(
            profile.to_format(),
            Err(ConfigError::MalformedSyncWord(_))
        ));

        let profile = ProtocolProfile {
            channels: vec!["uint12".into()],
            ..ProtocolProfile::default()
        };
        assert!(matches!(
            profile.to_format(),
            Err(ConfigError::UnknownChannelFormat(_))
        ));
    }

    #[test]
    fn profile_serializes_back_to_json() {
        let profile = ProtocolProfile {
            size_field: SizeField::Byte,
            ..ProtocolProfile::default()
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["size_field"], "byte");
        assert!(json.get("frame_size").is_none());
    }
}
