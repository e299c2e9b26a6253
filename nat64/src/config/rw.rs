// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Left-right wrapper publishing [`TranslationConfig`] generations to the data path

use left_right::new_from_empty;
use left_right::{Absorb, ReadGuard, ReadHandle, WriteHandle};
use tracing::debug;

use crate::config::TranslationConfig;

enum ConfigChange {
    Replace(Box<TranslationConfig>),
}

impl Absorb<ConfigChange> for TranslationConfig {
    fn absorb_first(&mut self, change: &mut ConfigChange, _: &Self) {
        match change {
            ConfigChange::Replace(config) => {
                *self = config.as_ref().clone();
            }
        }
    }
    fn drop_first(self: Box<Self>) {}
    fn sync_with(&mut self, first: &Self) {
        *self = first.clone();
    }
}

/// Publishes new configuration generations.
pub struct ConfigWriter(WriteHandle<TranslationConfig, ConfigChange>);

/// Gives access to the current configuration generation.
#[derive(Debug)]
pub struct ConfigReader(ReadHandle<TranslationConfig>);

impl ConfigReader {
    /// Pin the current generation. Returns `None` once the writer is gone.
    #[must_use]
    pub fn enter(&self) -> Option<ReadGuard<'_, TranslationConfig>> {
        self.0.enter()
    }
}

impl Clone for ConfigReader {
    fn clone(&self) -> Self {
        ConfigReader(self.0.clone())
    }
}

impl ConfigWriter {
    /// Start with an empty configuration, which maps nothing.
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new() -> ConfigWriter {
        let (w, _) =
            new_from_empty::<TranslationConfig, ConfigChange>(TranslationConfig::default());
        ConfigWriter(w)
    }

    #[must_use]
    pub fn get_reader(&self) -> ConfigReader {
        ConfigReader(self.0.clone())
    }

    /// Replace the configuration seen by every reader.
    pub fn update(&mut self, config: TranslationConfig) {
        self.0.append(ConfigChange::Replace(Box::new(config)));
        self.0.publish();
        debug!("Published new NAT64 configuration");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::ConfigWriter;
    use crate::config::TranslationConfig;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn readers_see_published_generations() {
        let mut writer = ConfigWriter::new();
        let reader = writer.get_reader();
        assert!(reader.enter().unwrap().mappings().is_empty());

        let mut builder = TranslationConfig::builder();
        let index = builder.add_prefix(Ipv6Addr::new(0x64, 0xff9b, 0, 0, 0, 0, 0, 0)).unwrap();
        let ip4 = Ipv4Addr::new(192, 0, 2, 1);
        builder.add_mapping(ip4, Ipv6Addr::LOCALHOST, index).unwrap();
        writer.update(builder.build());
        assert!(reader.enter().unwrap().find_v4_to_v6(&ip4).is_some());

        // a second update must also land, through the other copy
        writer.update(TranslationConfig::default());
        assert!(reader.enter().unwrap().find_v4_to_v6(&ip4).is_none());

        let other = reader.clone();
        drop(writer);
        assert!(other.enter().is_none());
    }
}
