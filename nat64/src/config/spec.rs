// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Serializable description of a translation configuration

use crate::config::{ConfigError, Mtu, Nat64ParamsBuilder, Nat64Prefix, TranslationConfig};
use ipnet::Ipv6Net;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

/// One address mapping, referring to a prefix by its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingSpec {
    pub ip4: Ipv4Addr,
    pub ip6: Ipv6Addr,
    pub prefix: usize,
}

/// A translation configuration as found in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Nat64ConfigSpec {
    pub prefixes: Vec<Ipv6Net>,
    #[serde(default)]
    pub mappings: Vec<MappingSpec>,
    #[serde(default)]
    pub mtu: Option<Mtu>,
    #[serde(default)]
    pub drop_unknown_prefix: Option<bool>,
    #[serde(default)]
    pub drop_unknown_mapping: Option<bool>,
}

impl TryFrom<&Nat64ConfigSpec> for TranslationConfig {
    type Error = ConfigError;

    fn try_from(spec: &Nat64ConfigSpec) -> Result<Self, Self::Error> {
        let mut builder = TranslationConfig::builder();
        for net in &spec.prefixes {
            builder.add_prefix(Nat64Prefix::try_from(*net)?)?;
        }
        for mapping in &spec.mappings {
            builder.add_mapping(mapping.ip4, mapping.ip6, mapping.prefix)?;
        }
        let mut params = Nat64ParamsBuilder::default();
        if let Some(mtu) = spec.mtu {
            params.mtu(mtu);
        }
        if let Some(drop) = spec.drop_unknown_prefix {
            params.drop_unknown_prefix(drop);
        }
        if let Some(drop) = spec.drop_unknown_mapping {
            params.drop_unknown_mapping(drop);
        }
        let params = params
            .build()
            .map_err(|e| ConfigError::BadParams(e.to_string()))?;
        builder.params(params)?;
        Ok(builder.build())
    }
}

impl TryFrom<Nat64ConfigSpec> for TranslationConfig {
    type Error = ConfigError;

    fn try_from(spec: Nat64ConfigSpec) -> Result<Self, Self::Error> {
        TranslationConfig::try_from(&spec)
    }
}
