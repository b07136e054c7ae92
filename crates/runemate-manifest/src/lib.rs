//! RuneMate Manifest
//!
//! Typed bot manifests and everything needed to trust one: the in-process
//! declaration builder, the YAML/JSON codecs, the ordered business rules and
//! the duplicate-identity check run over a batch of discovered manifests.

pub mod codec;
pub mod declaration;
pub mod discovery;
pub mod errors;
pub mod rules;
pub mod types;

pub use codec::{is_candidate, Codecs, JsonCodec, ManifestCodec, ManifestFormat, YamlCodec};
pub use declaration::{DeclarationSpec, ManifestDeclaration};
pub use discovery::{check_duplicates, discover, SourcedManifest};
pub use errors::ManifestError;
pub use rules::{validate, Rule};
pub use types::{
    slugify, Access, Category, Feature, FeatureMode, FeatureType, GameType, Manifest, Trial,
};
