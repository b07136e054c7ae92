//! Bot manifest schema
//!
//! This module provides:
//! - The [`Manifest`] record describing one publishable bot
//! - Closed enumerations that decode case-insensitively ("public" == "PUBLIC")
//! - Serde helpers for scalar text fields, decimal prices and ISO-8601 trial durations

use bigdecimal::{BigDecimal, Zero};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Literal wire name of the entry-point field, used by the candidate pre-filter
pub const MAIN_CLASS_FIELD: &str = "mainClass";

/// Maximum number of tags a bot may carry
pub const MAX_TAGS: usize = 50;

// =============================================================================
// ENUMERATIONS - upper-case on the wire, case-insensitive on input
// =============================================================================

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| {
                        format!(
                            "unknown {} '{}', expected one of: {}",
                            stringify!($name),
                            s,
                            $name::ALL
                                .iter()
                                .map(|v| v.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        )
                    })
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

closed_enum! {
    /// Store visibility of a bot
    Access { Public => "PUBLIC", Supporter => "SUPPORTER" }
}

closed_enum! {
    /// Game flavours a bot supports
    GameType { Osrs => "OSRS" }
}

closed_enum! {
    /// Store category a bot is listed under
    Category {
        Agility => "AGILITY",
        Combat => "COMBAT",
        Construction => "CONSTRUCTION",
        Cooking => "COOKING",
        Crafting => "CRAFTING",
        DeveloperTools => "DEVELOPER_TOOLS",
        Divination => "DIVINATION",
        Dungeoneering => "DUNGEONEERING",
        Invention => "INVENTION",
        Farming => "FARMING",
        Firemaking => "FIREMAKING",
        Fishing => "FISHING",
        Fletching => "FLETCHING",
        Herblore => "HERBLORE",
        Hunter => "HUNTER",
        Magic => "MAGIC",
        Minigames => "MINIGAMES",
        Mining => "MINING",
        Moneymaking => "MONEYMAKING",
        Other => "OTHER",
        Prayer => "PRAYER",
        Questing => "QUESTING",
        Runecrafting => "RUNECRAFTING",
        Slayer => "SLAYER",
        Smithing => "SMITHING",
        Summoning => "SUMMONING",
        Thieving => "THIEVING",
        Woodcutting => "WOODCUTTING",
        Bossing => "BOSSING",
    }
}

closed_enum! {
    /// Client capability a bot may depend on
    FeatureType { DirectInput => "DIRECT_INPUT" }
}

closed_enum! {
    FeatureMode { Required => "REQUIRED", Optional => "OPTIONAL", None => "NONE" }
}

/// A (feature-type, mode) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: FeatureType,
    pub mode: FeatureMode,
}

impl Feature {
    pub fn required(feature_type: FeatureType) -> Self {
        Feature {
            feature_type,
            mode: FeatureMode::Required,
        }
    }

    pub fn optional(feature_type: FeatureType) -> Self {
        Feature {
            feature_type,
            mode: FeatureMode::Optional,
        }
    }
}

// =============================================================================
// TRIAL
// =============================================================================

/// Limited free-trial policy: `allowance` of play time within each `window`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    #[serde(default = "TimeDelta::zero", with = "iso_duration")]
    pub allowance: TimeDelta,
    #[serde(default = "TimeDelta::zero", with = "iso_duration")]
    pub window: TimeDelta,
}

impl Default for Trial {
    fn default() -> Self {
        Trial::new(TimeDelta::zero(), TimeDelta::zero())
    }
}

impl Trial {
    pub fn new(allowance: TimeDelta, window: TimeDelta) -> Self {
        Trial { allowance, window }
    }

    pub fn is_negative(&self) -> bool {
        self.allowance < TimeDelta::zero() || self.window < TimeDelta::zero()
    }

    /// True when any component grants time
    pub fn is_active(&self) -> bool {
        !self.allowance.is_zero() || !self.window.is_zero()
    }
}

// =============================================================================
// MANIFEST
// =============================================================================

/// Publishable metadata for one bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawManifest")]
pub struct Manifest {
    pub main_class: String,
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub version: String,
    pub internal_id: String,
    pub compatibility: BTreeSet<GameType>,
    pub categories: BTreeSet<Category>,
    pub features: BTreeSet<Feature>,
    pub access: Access,
    pub hidden: bool,
    pub open_source: bool,
    #[serde(with = "price")]
    pub price: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial: Option<Trial>,
    pub resources: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub obfuscation: BTreeSet<String>,
}

/// Wire form of [`Manifest`] where defaultable fields may be absent
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    #[serde(deserialize_with = "string_or_scalar::deserialize")]
    main_class: String,
    #[serde(deserialize_with = "string_or_scalar::deserialize")]
    name: String,
    #[serde(deserialize_with = "string_or_scalar::deserialize")]
    tagline: String,
    #[serde(deserialize_with = "string_or_scalar::deserialize")]
    description: String,
    #[serde(deserialize_with = "string_or_scalar::deserialize")]
    version: String,
    #[serde(default)]
    internal_id: Option<String>,
    #[serde(default = "default_compatibility")]
    compatibility: BTreeSet<GameType>,
    #[serde(default = "default_categories")]
    categories: BTreeSet<Category>,
    #[serde(default)]
    features: BTreeSet<Feature>,
    #[serde(default = "default_access")]
    access: Access,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    open_source: bool,
    #[serde(default = "BigDecimal::zero", with = "price")]
    price: BigDecimal,
    #[serde(default)]
    trial: Option<Trial>,
    #[serde(default)]
    resources: BTreeSet<String>,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    obfuscation: BTreeSet<String>,
}

impl From<RawManifest> for Manifest {
    fn from(raw: RawManifest) -> Self {
        let internal_id = raw
            .internal_id
            .unwrap_or_else(|| derive_internal_id(&raw.main_class));
        Manifest {
            main_class: raw.main_class,
            name: raw.name,
            tagline: raw.tagline,
            description: raw.description,
            version: raw.version,
            internal_id,
            compatibility: raw.compatibility,
            categories: raw.categories,
            features: raw.features,
            access: raw.access,
            hidden: raw.hidden,
            open_source: raw.open_source,
            price: raw.price,
            trial: raw.trial,
            resources: raw.resources,
            tags: raw.tags,
            obfuscation: raw.obfuscation,
        }
    }
}

/// Fields a manifest document must carry; anything lacking one is not a manifest
pub const REQUIRED_FIELDS: &[&str] = &[MAIN_CLASS_FIELD, "name", "tagline", "description", "version"];

pub(crate) fn default_compatibility() -> BTreeSet<GameType> {
    BTreeSet::from([GameType::Osrs])
}

pub(crate) fn default_categories() -> BTreeSet<Category> {
    BTreeSet::from([Category::Other])
}

fn default_access() -> Access {
    Access::Public
}

/// Substring of the entry point after the last `/`
pub fn derive_internal_id(main_class: &str) -> String {
    main_class
        .rsplit_once('/')
        .map_or(main_class, |(_, tail)| tail)
        .to_string()
}

/// Filesystem-safe slug of a display name: lowercase, strip, spaces to hyphens
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
        .map(|c| if c == ' ' { '-' } else { c })
        .collect()
}

impl Manifest {
    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }

    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

// =============================================================================
// SERDE HELPERS
// =============================================================================

/// Text fields also accept bare scalars (`version: 2`, `name: true`) and keep
/// their literal form
pub mod string_or_scalar {
    use serde::de::{self, Visitor};
    use serde::Deserializer;
    use std::fmt;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        deserializer.deserialize_any(ScalarVisitor)
    }

    struct ScalarVisitor;

    impl<'de> Visitor<'de> for ScalarVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number or boolean")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        // Debug keeps the fractional part, so `1.0` stays "1.0"
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(format!("{:?}", v))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(v)
        }
    }
}

/// Prices decode from numbers or strings and encode as strings, so no precision
/// is lost to binary floats in either format
pub mod price {
    use bigdecimal::BigDecimal;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigDecimal, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }

    struct PriceVisitor;

    impl<'de> Visitor<'de> for PriceVisitor {
        type Value = BigDecimal;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal price as a number or string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(BigDecimal::from(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(BigDecimal::from(v))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if !v.is_finite() {
                return Err(E::invalid_value(de::Unexpected::Float(v), &self));
            }
            // Display of f64 is the shortest round-trip form ("4.99", not 4.9900000000000002131...)
            BigDecimal::from_str(&v.to_string()).map_err(E::custom)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            BigDecimal::from_str(v.trim())
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

/// ISO-8601 durations (`PT1H30M`, `P1D`, `-PT5M`), possibly negative; bare
/// integers decode as seconds
pub mod iso_duration {
    use chrono::TimeDelta;
    use once_cell::sync::Lazy;
    use regex::Regex;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    static PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
        Regex::new(
            r"^(?i)([-+]?)P(?:([-+]?[0-9]+)D)?(?:T(?:([-+]?[0-9]+)H)?(?:([-+]?[0-9]+)M)?(?:([-+]?[0-9]+)(?:[.,]([0-9]{1,9}))?S)?)?$",
        )
        .ok()
    });

    pub fn parse(text: &str) -> Option<TimeDelta> {
        let text = text.trim();
        let caps = PATTERN.as_ref()?.captures(text)?;
        let has_time = caps.get(3).is_some() || caps.get(4).is_some() || caps.get(5).is_some();
        if caps.get(2).is_none() && !has_time {
            return None;
        }
        // A `T` designator must introduce at least one time component
        if !has_time && text.contains(['T', 't']) {
            return None;
        }

        let component = |idx: usize| -> Option<i64> {
            caps.get(idx)
                .map_or(Some(0), |m| m.as_str().trim_start_matches('+').parse().ok())
        };
        let days = component(2)?;
        let hours = component(3)?;
        let minutes = component(4)?;
        let seconds = component(5)?;

        let mut total = TimeDelta::try_days(days)?
            .checked_add(&TimeDelta::try_hours(hours)?)?
            .checked_add(&TimeDelta::try_minutes(minutes)?)?
            .checked_add(&TimeDelta::try_seconds(seconds)?)?;

        if let Some(fraction) = caps.get(6) {
            let digits = fraction.as_str();
            let nanos: i64 = format!("{:0<9}", digits).parse().ok()?;
            let nanos = if caps.get(5).is_some_and(|m| m.as_str().starts_with('-')) {
                -nanos
            } else {
                nanos
            };
            total = total.checked_add(&TimeDelta::nanoseconds(nanos))?;
        }

        if &caps[1] == "-" {
            total = -total;
        }
        Some(total)
    }

    pub fn format(value: &TimeDelta) -> String {
        if value.is_zero() {
            return "PT0S".to_string();
        }

        let sign = if *value < TimeDelta::zero() { "-" } else { "" };
        let magnitude = value.abs();
        let total_secs = magnitude.num_seconds();
        let nanos = magnitude.subsec_nanos();

        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        let mut out = format!("{}PT", sign);
        if hours > 0 {
            out.push_str(&format!("{}H", hours));
        }
        if minutes > 0 {
            out.push_str(&format!("{}M", minutes));
        }
        if seconds > 0 || nanos > 0 {
            if nanos > 0 {
                let fraction = format!("{:09}", nanos);
                out.push_str(&format!("{}.{}S", seconds, fraction.trim_end_matches('0')));
            } else {
                out.push_str(&format!("{}S", seconds));
            }
        }
        out
    }

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        deserializer.deserialize_any(DurationVisitor)
    }

    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = TimeDelta;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an ISO-8601 duration such as PT1H or a number of seconds")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            TimeDelta::try_seconds(v).ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &self))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            i64::try_from(v)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            parse(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}
