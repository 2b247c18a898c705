//! Region profiles.
//!
//! A `RegionProfile` is the complete identity of one deployment target:
//! which region, which database schema, which secret, which bucket. It is
//! constructed once per synthesis run and never mutated. The core does not
//! read environment variables; everything a synthesis needs is on the
//! profile, passed by value into a fresh synthesizer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::env_keys;
use crate::errors::{SynthError, SynthResult};

/// Closed set of supported deployment regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// United States deployment (us-east-2).
    UsEast2,
    /// India deployment (ap-south-1).
    ApSouth1,
}

impl Region {
    /// Short region id used in canonical names and export keys.
    pub fn id(&self) -> &'static str {
        match self {
            Self::UsEast2 => "us",
            Self::ApSouth1 => "in",
        }
    }

    /// The underlying cloud provider region string.
    pub fn cloud_region(&self) -> &'static str {
        match self {
            Self::UsEast2 => "us-east-2",
            Self::ApSouth1 => "ap-south-1",
        }
    }

    /// Country code handlers receive via the baseline environment.
    pub fn country_code(&self) -> &'static str {
        match self {
            Self::UsEast2 => "US",
            Self::ApSouth1 => "IN",
        }
    }
}

/// Immutable per-deployment-target configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionProfile {
    pub region: Region,
    pub schema_name: String,
    pub secret_id: String,
    pub bucket_name: String,
}

impl RegionProfile {
    pub fn new(
        region: Region,
        schema_name: impl Into<String>,
        secret_id: impl Into<String>,
        bucket_name: impl Into<String>,
    ) -> Self {
        Self {
            region,
            schema_name: schema_name.into(),
            secret_id: secret_id.into(),
            bucket_name: bucket_name.into(),
        }
    }

    /// Environment baseline shared by every handler in this region.
    ///
    /// Per-handler `extra_env` overlays these keys; on collision the
    /// handler's value wins.
    pub fn baseline_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(
            env_keys::DB_SECRET_NAME.to_string(),
            self.secret_id.clone(),
        );
        env.insert(env_keys::SCHEMA.to_string(), self.schema_name.clone());
        env.insert(
            env_keys::COUNTRY.to_string(),
            self.region.country_code().to_string(),
        );
        env
    }
}

/// Validate basic profile invariants.
///
/// The region enum is closed by construction; this checks the free-form
/// string fields are present.
pub fn validate_profile(profile: &RegionProfile) -> SynthResult<()> {
    if profile.schema_name.trim().is_empty() {
        return Err(SynthError::invariant("profile.schema_name is empty"));
    }
    if profile.secret_id.trim().is_empty() {
        return Err(SynthError::invariant("profile.secret_id is empty"));
    }
    if profile.bucket_name.trim().is_empty() {
        return Err(SynthError::invariant("profile.bucket_name is empty"));
    }
    Ok(())
}
