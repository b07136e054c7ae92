//! Business rules every published manifest must satisfy
//!
//! Rules are evaluated in declaration order and the first failing rule is the
//! reported reason. Adding a rule means adding a variant and extending
//! [`Rule::ALL`], [`Rule::rejects`] and [`Rule::description`].

use bigdecimal::{BigDecimal, Zero};
use std::fmt;

use crate::errors::ManifestError;
use crate::types::{Access, Manifest, MAX_TAGS};

pub const MAX_DESCRIPTION_LEN: usize = 110;
pub const MAX_TAGLINE_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    InternalId,
    Description,
    Tagline,
    PriceTooLow,
    PriceBadAccess,
    TrialInvalid,
    TrialNonPremium,
    Tags,
}

impl Rule {
    /// Evaluation order: identity, text bounds, pricing, trial, volume bounds
    pub const ALL: &'static [Rule] = &[
        Rule::InternalId,
        Rule::Description,
        Rule::Tagline,
        Rule::PriceTooLow,
        Rule::PriceBadAccess,
        Rule::TrialInvalid,
        Rule::TrialNonPremium,
        Rule::Tags,
    ];

    /// True when the manifest violates this rule
    pub fn rejects(self, manifest: &Manifest) -> bool {
        let zero = BigDecimal::zero();
        match self {
            Rule::InternalId => manifest.internal_id.is_empty(),
            Rule::Description => !within(&manifest.description, MAX_DESCRIPTION_LEN),
            Rule::Tagline => !within(&manifest.tagline, MAX_TAGLINE_LEN),
            Rule::PriceTooLow => manifest.price < zero,
            Rule::PriceBadAccess => manifest.price > zero && manifest.access != Access::Public,
            Rule::TrialInvalid => manifest.trial.is_some_and(|t| t.is_negative()),
            Rule::TrialNonPremium => {
                manifest.trial.is_some_and(|t| t.is_active()) && manifest.price <= zero
            }
            Rule::Tags => manifest.tags.len() > MAX_TAGS,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Rule::InternalId => "INTERNAL_ID",
            Rule::Description => "DESCRIPTION",
            Rule::Tagline => "TAG_LINE",
            Rule::PriceTooLow => "PRICE_TOO_LOW",
            Rule::PriceBadAccess => "PRICE_BAD_ACCESS",
            Rule::TrialInvalid => "TRIAL_INVALID",
            Rule::TrialNonPremium => "TRIAL_NON_PREMIUM",
            Rule::Tags => "TAGS",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Rule::InternalId => "An internal-id has not been set in the bot manifest",
            Rule::Description => "Descriptions must be between 1 and 110 characters in size",
            Rule::Tagline => "Taglines must be between 1 and 50 characters in size",
            Rule::PriceTooLow => "Price cannot be negative",
            Rule::PriceBadAccess => "Bots with a positive price must have access level PUBLIC",
            Rule::TrialInvalid => "Trial window and allowance must both be non-negative durations",
            Rule::TrialNonPremium => "Only bots with a positive price may have a trial",
            Rule::Tags => "Bots may not have more than 50 tags",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn within(text: &str, max: usize) -> bool {
    let len = text.chars().count();
    (1..=max).contains(&len)
}

/// First rule the manifest violates, if any
pub fn first_violation(manifest: &Manifest) -> Option<Rule> {
    Rule::ALL.iter().copied().find(|rule| rule.rejects(manifest))
}

/// Accept the manifest or fail with the first violated rule
pub fn validate(manifest: Manifest, origin: &str) -> Result<Manifest, ManifestError> {
    match first_violation(&manifest) {
        Some(rule) => Err(ManifestError::Validation {
            rule,
            origin: origin.to_string(),
        }),
        None => Ok(manifest),
    }
}
