//! Manifest codecs - YAML and JSON encodings of [`Manifest`]
//!
//! Formats are a closed set selected by file extension. Each codec is a
//! stateless value; [`Codecs`] owns one of each and hands out the matching
//! handler for a [`ManifestFormat`].
//!
//! Decoding happens in two steps so failures can be classified:
//! 1. Parse the raw text into a generic JSON value and check that every
//!    required field is present. Failures here mean "not a manifest".
//! 2. Convert the value into a typed [`Manifest`]. Failures here mean a value
//!    has the wrong type or shape and are reported as malformed.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::ManifestError;
use crate::types::{Manifest, MAIN_CLASS_FIELD, REQUIRED_FIELDS};

/// Supported manifest file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestFormat {
    Yaml,
    #[default]
    Json,
}

/// Extension lookup table; add a format by extending the enum and this table
const FORMAT_EXTENSIONS: &[(ManifestFormat, &[&str])] = &[
    (ManifestFormat::Yaml, &["yaml", "yml"]),
    (ManifestFormat::Json, &["json"]),
];

impl ManifestFormat {
    pub fn extensions(self) -> &'static [&'static str] {
        FORMAT_EXTENSIONS
            .iter()
            .find(|(format, _)| *format == self)
            .map(|(_, exts)| *exts)
            .unwrap_or_default()
    }

    /// Preferred extension used when writing files
    pub fn extension(self) -> &'static str {
        self.extensions().first().copied().unwrap_or("json")
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        FORMAT_EXTENSIONS
            .iter()
            .find(|(_, exts)| exts.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .map(|(format, _)| *format)
    }

    /// Format of a path, or `UnsupportedFormat` for an unknown extension
    pub fn of(path: &Path) -> Result<Self, ManifestError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| ManifestError::UnsupportedFormat(path.to_path_buf()))
    }
}

/// A stateless encoder/decoder for one manifest format
pub trait ManifestCodec {
    fn format(&self) -> ManifestFormat;

    /// Parse raw bytes into a generic value (step 1)
    fn parse_value(&self, bytes: &[u8]) -> Result<serde_json::Value, String>;

    fn encode(&self, manifest: &Manifest) -> Result<Vec<u8>, ManifestError>;

    fn decode(&self, bytes: &[u8], origin: &str) -> Result<Manifest, ManifestError> {
        let value = self
            .parse_value(bytes)
            .map_err(|reason| ManifestError::NotAManifest {
                origin: origin.to_string(),
                reason,
            })?;

        let Some(object) = value.as_object() else {
            return Err(ManifestError::NotAManifest {
                origin: origin.to_string(),
                reason: "document is not a mapping".to_string(),
            });
        };

        if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !object.contains_key(**f)) {
            return Err(ManifestError::NotAManifest {
                origin: origin.to_string(),
                reason: format!("missing field `{}`", missing),
            });
        }

        Manifest::deserialize(value).map_err(|e| ManifestError::MalformedManifest {
            origin: origin.to_string(),
            detail: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ManifestCodec for JsonCodec {
    fn format(&self) -> ManifestFormat {
        ManifestFormat::Json
    }

    fn parse_value(&self, bytes: &[u8]) -> Result<serde_json::Value, String> {
        serde_json::from_slice(bytes).map_err(|e| e.to_string())
    }

    fn encode(&self, manifest: &Manifest) -> Result<Vec<u8>, ManifestError> {
        let mut bytes =
            serde_json::to_vec_pretty(manifest).map_err(|e| ManifestError::Encode(e.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl ManifestCodec for YamlCodec {
    fn format(&self) -> ManifestFormat {
        ManifestFormat::Yaml
    }

    fn parse_value(&self, bytes: &[u8]) -> Result<serde_json::Value, String> {
        serde_yaml::from_slice(bytes).map_err(|e| e.to_string())
    }

    fn encode(&self, manifest: &Manifest) -> Result<Vec<u8>, ManifestError> {
        serde_yaml::to_string(manifest)
            .map(String::into_bytes)
            .map_err(|e| ManifestError::Encode(e.to_string()))
    }
}

/// One codec instance per format
#[derive(Debug, Clone, Copy, Default)]
pub struct Codecs {
    json: JsonCodec,
    yaml: YamlCodec,
}

impl Codecs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_format(&self, format: ManifestFormat) -> &dyn ManifestCodec {
        match format {
            ManifestFormat::Json => &self.json,
            ManifestFormat::Yaml => &self.yaml,
        }
    }

    /// Codec for a file path, chosen by its extension
    pub fn for_path(&self, path: &Path) -> Result<&dyn ManifestCodec, ManifestError> {
        ManifestFormat::of(path).map(|format| self.for_format(format))
    }
}

/// Cheap pre-filter: known extension and the entry-point key appears in the text
pub fn is_candidate(path: &Path, contents: &str) -> bool {
    ManifestFormat::of(path).is_ok() && contents.contains(MAIN_CLASS_FIELD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Access, Category, Feature, FeatureType, Trial};
    use bigdecimal::BigDecimal;
    use chrono::TimeDelta;
    use std::collections::BTreeSet;
    use std::path::PathBuf;
    use std::str::FromStr;

    fn sample_manifest() -> Manifest {
        let Ok(price) = BigDecimal::from_str("4.99") else {
            panic!("literal price");
        };
        Manifest {
            main_class: "bots/Woodcutter".to_string(),
            name: "Woodcutter".to_string(),
            tagline: "Simple woodcutting bot".to_string(),
            description: "Chops trees".to_string(),
            version: "1.2.0".to_string(),
            internal_id: "Woodcutter".to_string(),
            compatibility: crate::types::default_compatibility(),
            categories: BTreeSet::from([Category::Woodcutting, Category::Moneymaking]),
            features: BTreeSet::from([Feature::required(FeatureType::DirectInput)]),
            access: Access::Public,
            hidden: false,
            open_source: true,
            price,
            trial: Some(Trial::new(TimeDelta::hours(1), TimeDelta::days(1))),
            resources: BTreeSet::from(["images/logo.png".to_string()]),
            tags: BTreeSet::from(["trees".to_string(), "logs".to_string()]),
            obfuscation: BTreeSet::from(["bots.Woodcutter".to_string()]),
        }
    }

    #[test]
    fn test_format_selection_by_extension() {
        assert!(matches!(
            ManifestFormat::of(&PathBuf::from("a/woodcutter.yml")),
            Ok(ManifestFormat::Yaml)
        ));
        assert!(matches!(
            ManifestFormat::of(&PathBuf::from("a/woodcutter.YAML")),
            Ok(ManifestFormat::Yaml)
        ));
        assert!(matches!(
            ManifestFormat::of(&PathBuf::from("woodcutter.manifest.json")),
            Ok(ManifestFormat::Json)
        ));
        assert!(matches!(
            ManifestFormat::of(&PathBuf::from("Woodcutter.java")),
            Err(ManifestError::UnsupportedFormat(_))
        ));
        assert_eq!(ManifestFormat::Yaml.extension(), "yaml");
    }

    #[test]
    fn test_round_trip_both_formats() {
        let codecs = Codecs::new();
        let manifest = sample_manifest();
        for format in [ManifestFormat::Json, ManifestFormat::Yaml] {
            let codec = codecs.for_format(format);
            let Ok(bytes) = codec.encode(&manifest) else {
                panic!("encode failed for {format:?}");
            };
            let decoded = codec.decode(&bytes, "round-trip");
            assert!(
                decoded.as_ref().is_ok_and(|m| *m == manifest),
                "round trip failed for {format:?}: {decoded:?}"
            );
        }
    }

    #[test]
    fn test_decode_is_case_insensitive() {
        let yaml = br#"
mainClass: bots/Fisher
name: Fisher
tagline: Catches fish
description: Fishes at the docks
version: "1.0"
access: supporter
categories: [fishing, Cooking]
features:
  - type: direct_input
    mode: optional
"#;
        let decoded = YamlCodec.decode(yaml, "fisher.yml");
        let Ok(manifest) = decoded else {
            panic!("decode failed: {decoded:?}");
        };
        assert_eq!(manifest.access, Access::Supporter);
        assert_eq!(
            manifest.categories,
            BTreeSet::from([Category::Fishing, Category::Cooking])
        );
        assert_eq!(
            manifest.features,
            BTreeSet::from([Feature::optional(FeatureType::DirectInput)])
        );
        assert_eq!(manifest.internal_id, "Fisher");
    }

    #[test]
    fn test_decode_twice_is_equal() {
        let json = br#"{"mainClass":"bots/Miner","name":"Miner","tagline":"Mines","description":"Mines ore","version":"2","price":"0"}"#;
        let first = JsonCodec.decode(json, "miner.json");
        let second = JsonCodec.decode(json, "miner.json");
        assert!(first.is_ok());
        assert_eq!(first.ok(), second.ok());
    }

    #[test]
    fn test_missing_field_is_not_a_manifest() {
        let json = br#"{"mainClass":"bots/Miner","name":"Miner"}"#;
        let result = JsonCodec.decode(json, "miner.json");
        assert!(matches!(result, Err(ManifestError::NotAManifest { .. })));
    }

    #[test]
    fn test_unparseable_is_not_a_manifest() {
        let result = JsonCodec.decode(b"{ mainClass: ", "broken.json");
        assert!(matches!(result, Err(ManifestError::NotAManifest { .. })));

        let result = YamlCodec.decode(b"- just\n- a list\n", "list.yml");
        assert!(matches!(result, Err(ManifestError::NotAManifest { .. })));
    }

    #[test]
    fn test_wrong_typed_value_is_malformed() {
        let yaml = br#"
mainClass: bots/Fisher
name: Fisher
tagline: Catches fish
description: Fishes at the docks
version: "1.0"
access: VIP
"#;
        let result = YamlCodec.decode(yaml, "fisher.yml");
        let Err(ManifestError::MalformedManifest { origin, detail }) = result else {
            panic!("expected malformed manifest, got {result:?}");
        };
        assert_eq!(origin, "fisher.yml");
        assert!(detail.contains("VIP"));
    }

    #[test]
    fn test_scalar_text_fields_decode_as_strings() {
        let yaml = b"mainClass: bots/Fisher\nname: 1337\ntagline: true\ndescription: Fishes\nversion: 2\n";
        let decoded = YamlCodec.decode(yaml, "fisher.yml");
        let Ok(manifest) = decoded else {
            panic!("decode failed: {decoded:?}");
        };
        assert_eq!(manifest.version, "2");
        assert_eq!(manifest.name, "1337");
        assert_eq!(manifest.tagline, "true");

        let json = br#"{"mainClass":"bots/Miner","name":"Miner","tagline":"Mines","description":"Mines ore","version":1.0}"#;
        let decoded = JsonCodec.decode(json, "miner.json");
        assert!(
            decoded.as_ref().is_ok_and(|m| m.version == "1.0"),
            "unexpected decode: {decoded:?}"
        );
    }

    #[test]
    fn test_is_candidate() {
        assert!(is_candidate(
            &PathBuf::from("bot.yml"),
            "mainClass: bots/Bot\n"
        ));
        assert!(!is_candidate(&PathBuf::from("bot.yml"), "name: Bot\n"));
        assert!(!is_candidate(
            &PathBuf::from("Bot.java"),
            "String mainClass = \"x\";"
        ));
    }
}
