//! Channel configuration for worker-to-collector communication

/// Buffer sizing for the record channel
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Record channel buffer size (workers -> collector)
    pub records_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            records_buffer: 1_024,
        }
    }
}

impl ChannelConfig {
    /// Create a new channel config with custom record buffer size
    ///
    /// A size of zero is raised to one, the smallest bounded channel tokio
    /// accepts.
    pub fn with_records_buffer(mut self, size: usize) -> Self {
        self.records_buffer = size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_config_default() {
        let config = ChannelConfig::default();
        assert_eq!(config.records_buffer, 1_024);
    }

    #[test]
    fn test_channel_config_builder() {
        let config = ChannelConfig::default().with_records_buffer(64);
        assert_eq!(config.records_buffer, 64);
    }

    #[test]
    fn test_channel_config_zero_clamped() {
        let config = ChannelConfig::default().with_records_buffer(0);
        assert_eq!(config.records_buffer, 1);
    }
}
