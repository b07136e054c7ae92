//! In-process manifest declarations
//!
//! A [`ManifestDeclaration`] is the mutable, pre-validation form of a
//! [`Manifest`]. Nested specifications (pricing, features, resources,
//! obfuscation) are configured through closures and folded into the
//! declaration when the closure returns. [`ManifestDeclaration::build`] checks
//! every required field at once and reports all that are missing.
//!
//! [`DeclarationSpec`] is the serde form of the same declaration as written in
//! a `runemate.toml` `[manifests.<name>]` table.

use bigdecimal::{BigDecimal, Zero};
use chrono::TimeDelta;
use serde::Deserialize;
use std::collections::BTreeSet;

use crate::errors::ManifestError;
use crate::types::{
    default_categories, default_compatibility, derive_internal_id, price, Access, Category,
    Feature, FeatureType, GameType, Manifest, Trial,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDeclaration {
    name: String,
    publish: bool,
    main_class: Option<String>,
    tagline: Option<String>,
    description: Option<String>,
    version: Option<String>,
    internal_id: Option<String>,
    compatibility: BTreeSet<GameType>,
    categories: BTreeSet<Category>,
    features: BTreeSet<Feature>,
    access: Access,
    hidden: bool,
    open_source: bool,
    price: BigDecimal,
    trial: Option<Trial>,
    resources: BTreeSet<String>,
    tags: BTreeSet<String>,
    obfuscation: BTreeSet<String>,
}

impl ManifestDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        ManifestDeclaration {
            name: name.into(),
            publish: true,
            main_class: None,
            tagline: None,
            description: None,
            version: None,
            internal_id: None,
            compatibility: default_compatibility(),
            categories: default_categories(),
            features: BTreeSet::new(),
            access: Access::Public,
            hidden: false,
            open_source: false,
            price: BigDecimal::zero(),
            trial: None,
            resources: BTreeSet::new(),
            tags: BTreeSet::new(),
            obfuscation: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the generate stage should emit this declaration
    pub fn is_published(&self) -> bool {
        self.publish
    }

    pub fn publish(mut self, publish: bool) -> Self {
        self.publish = publish;
        self
    }

    pub fn main_class(mut self, main_class: impl Into<String>) -> Self {
        self.main_class = Some(main_class.into());
        self
    }

    pub fn tagline(mut self, tagline: impl Into<String>) -> Self {
        self.tagline = Some(tagline.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Override the identity otherwise derived from the main class
    pub fn internal_id(mut self, internal_id: impl Into<String>) -> Self {
        self.internal_id = Some(internal_id.into());
        self
    }

    pub fn compatibility(mut self, games: impl IntoIterator<Item = GameType>) -> Self {
        self.compatibility = games.into_iter().collect();
        self
    }

    pub fn categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn open_source(mut self, open_source: bool) -> Self {
        self.open_source = open_source;
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// A positive price keeps the configured trial; anything else makes the
    /// bot free and drops the trial.
    pub fn pricing(mut self, configure: impl FnOnce(PricingSpec) -> PricingSpec) -> Self {
        let spec = configure(PricingSpec::default());
        if spec.price > BigDecimal::zero() {
            self.price = spec.price;
            self.trial = spec.trial;
        } else {
            self.price = BigDecimal::zero();
            self.trial = None;
        }
        self
    }

    pub fn features(mut self, configure: impl FnOnce(FeatureSpec) -> FeatureSpec) -> Self {
        self.features = configure(FeatureSpec::default()).features;
        self
    }

    pub fn resources(mut self, configure: impl FnOnce(ResourcesSpec) -> ResourcesSpec) -> Self {
        self.resources = configure(ResourcesSpec::default()).includes;
        self
    }

    pub fn obfuscation(
        mut self,
        configure: impl FnOnce(ObfuscationSpec) -> ObfuscationSpec,
    ) -> Self {
        self.obfuscation = configure(ObfuscationSpec::default()).exclusions;
        self
    }

    /// Convert into a [`Manifest`], failing with every unset required field.
    ///
    /// The result is not yet checked against the business rules.
    pub fn build(&self) -> Result<Manifest, ManifestError> {
        let missing: Vec<&'static str> = [
            ("mainClass", self.main_class.is_none()),
            ("tagline", self.tagline.is_none()),
            ("description", self.description.is_none()),
            ("version", self.version.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, unset)| unset.then_some(field))
        .collect();

        let (Some(main_class), Some(tagline), Some(description), Some(version)) = (
            &self.main_class,
            &self.tagline,
            &self.description,
            &self.version,
        ) else {
            return Err(ManifestError::MissingRequiredFields {
                declaration: self.name.clone(),
                fields: missing,
            });
        };

        Ok(Manifest {
            main_class: main_class.clone(),
            name: self.name.clone(),
            tagline: tagline.clone(),
            description: description.clone(),
            version: version.clone(),
            internal_id: self
                .internal_id
                .clone()
                .unwrap_or_else(|| derive_internal_id(main_class)),
            compatibility: self.compatibility.clone(),
            categories: self.categories.clone(),
            features: self.features.clone(),
            access: self.access,
            hidden: self.hidden,
            open_source: self.open_source,
            price: self.price.clone(),
            trial: self.trial,
            resources: self.resources.clone(),
            tags: self.tags.clone(),
            obfuscation: self.obfuscation.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PricingSpec {
    price: BigDecimal,
    trial: Option<Trial>,
}

impl PricingSpec {
    pub fn price(mut self, price: BigDecimal) -> Self {
        self.price = price;
        self
    }

    pub fn trial(mut self, configure: impl FnOnce(TrialSpec) -> TrialSpec) -> Self {
        let spec = configure(TrialSpec::default());
        self.trial = Some(Trial::new(spec.allowance, spec.window));
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrialSpec {
    allowance: TimeDelta,
    window: TimeDelta,
}

impl Default for TrialSpec {
    fn default() -> Self {
        TrialSpec {
            allowance: TimeDelta::zero(),
            window: TimeDelta::zero(),
        }
    }
}

impl TrialSpec {
    pub fn allowance(mut self, allowance: TimeDelta) -> Self {
        self.allowance = allowance;
        self
    }

    pub fn window(mut self, window: TimeDelta) -> Self {
        self.window = window;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureSpec {
    features: BTreeSet<Feature>,
}

impl FeatureSpec {
    pub fn required(mut self, feature_type: FeatureType) -> Self {
        self.features.insert(Feature::required(feature_type));
        self
    }

    pub fn optional(mut self, feature_type: FeatureType) -> Self {
        self.features.insert(Feature::optional(feature_type));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourcesSpec {
    includes: BTreeSet<String>,
}

impl ResourcesSpec {
    pub fn include(mut self, rule: impl Into<String>) -> Self {
        self.includes.insert(rule.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObfuscationSpec {
    exclusions: BTreeSet<String>,
}

impl ObfuscationSpec {
    pub fn exclude(mut self, exclusion: impl Into<String>) -> Self {
        self.exclusions.insert(exclusion.into());
        self
    }
}

// =============================================================================
// PROJECT FILE FORM
// =============================================================================

/// A `[manifests.<name>]` table; the table key supplies the name
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DeclarationSpec {
    pub publish: Option<bool>,
    pub main_class: Option<String>,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub internal_id: Option<String>,
    pub compatibility: Option<Vec<GameType>>,
    pub categories: Option<Vec<Category>>,
    pub access: Option<Access>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub open_source: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub pricing: Option<PricingTable>,
    pub features: Option<FeaturesTable>,
    pub resources: Option<ResourcesTable>,
    pub obfuscation: Option<ObfuscationTable>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PricingTable {
    #[serde(default = "BigDecimal::zero", deserialize_with = "price::deserialize")]
    pub price: BigDecimal,
    pub trial: Option<Trial>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeaturesTable {
    #[serde(default)]
    pub required: Vec<FeatureType>,
    #[serde(default)]
    pub optional: Vec<FeatureType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcesTable {
    #[serde(default)]
    pub include: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObfuscationTable {
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl DeclarationSpec {
    pub fn into_declaration(self, name: impl Into<String>) -> ManifestDeclaration {
        let mut declaration = ManifestDeclaration::new(name)
            .publish(self.publish.unwrap_or(true))
            .hidden(self.hidden)
            .open_source(self.open_source)
            .tags(self.tags);

        declaration.main_class = self.main_class;
        declaration.tagline = self.tagline;
        declaration.description = self.description;
        declaration.version = self.version;
        declaration.internal_id = self.internal_id;

        if let Some(games) = self.compatibility {
            declaration = declaration.compatibility(games);
        }
        if let Some(categories) = self.categories {
            declaration = declaration.categories(categories);
        }
        if let Some(access) = self.access {
            declaration = declaration.access(access);
        }
        if let Some(pricing) = self.pricing {
            declaration = declaration.pricing(|spec| {
                let spec = spec.price(pricing.price);
                match pricing.trial {
                    Some(trial) => spec.trial(|t| t.allowance(trial.allowance).window(trial.window)),
                    None => spec,
                }
            });
        }
        if let Some(features) = self.features {
            declaration = declaration.features(|mut spec| {
                for feature in features.required {
                    spec = spec.required(feature);
                }
                for feature in features.optional {
                    spec = spec.optional(feature);
                }
                spec
            });
        }
        if let Some(resources) = self.resources {
            declaration = declaration.resources(|spec| {
                resources
                    .include
                    .into_iter()
                    .fold(spec, |spec, rule| spec.include(rule))
            });
        }
        if let Some(obfuscation) = self.obfuscation {
            declaration = declaration.obfuscation(|spec| {
                obfuscation
                    .exclude
                    .into_iter()
                    .fold(spec, |spec, exclusion| spec.exclude(exclusion))
            });
        }
        declaration
    }
}
