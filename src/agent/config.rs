//! Keepalive settings read from the instance metadata.
use crate::metadata::MetadataReader;
use crate::pipeline::ApiToken;
use std::env::{self, VarError};
use std::time::Duration;
use tracing::{debug, warn};

pub const CIRCLE_API_TOKEN: &str = "CIRCLE_API_TOKEN";
pub const CIRCLE_PIPELINE_ID: &str = "CIRCLE_PIPELINE_ID";
pub const SELF_DESTRUCT_INTERVAL_MINUTES: &str = "SELF_DESTRUCT_INTERVAL_MINUTES";

/// Environment variable holding the interval used when the metadata attribute is not set.
pub const DEFAULT_SELF_DESTRUCT_ENV: &str = "DEFAULT_SELF_DESTRUCT_MIN";
const FALLBACK_SELF_DESTRUCT_MINUTES: u64 = 2;

/// Maximum lifetime of the instance, in whole minutes. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfDestructInterval(u64);

impl SelfDestructInterval {
    pub fn from_minutes(minutes: u64) -> Option<Self> {
        (minutes > 0).then_some(Self(minutes))
    }

    /// Parses a positive amount of minutes.
    pub fn parse(value: &str) -> Option<Self> {
        value
            .trim()
            .parse::<u64>()
            .ok()
            .and_then(Self::from_minutes)
    }

    pub fn minutes(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0.saturating_mul(60))
    }
}

impl Default for SelfDestructInterval {
    fn default() -> Self {
        Self(FALLBACK_SELF_DESTRUCT_MINUTES)
    }
}

/// Returns the interval defined by `DEFAULT_SELF_DESTRUCT_MIN`, or 2 minutes if it is not set.
pub fn default_self_destruct_interval() -> SelfDestructInterval {
    env_aware_default_interval(env::var)
}

fn env_aware_default_interval<F>(env_var: F) -> SelfDestructInterval
where
    F: Fn(&'static str) -> Result<String, VarError>,
{
    let Ok(value) = env_var(DEFAULT_SELF_DESTRUCT_ENV) else {
        return SelfDestructInterval::default();
    };
    SelfDestructInterval::parse(&value).unwrap_or_else(|| {
        warn!(
            %value,
            "invalid {DEFAULT_SELF_DESTRUCT_ENV}, using {FALLBACK_SELF_DESTRUCT_MINUTES} minutes"
        );
        SelfDestructInterval::default()
    })
}

/// Immutable keepalive settings, resolved once at start.
#[derive(Debug, Clone, PartialEq)]
pub struct KeepaliveConfig {
    pub api_token: ApiToken,
    pub pipeline_id: String,
    pub self_destruct_interval: SelfDestructInterval,
}

impl KeepaliveConfig {
    /// Reads the settings from the instance attributes.
    ///
    /// Missing token or pipeline id are not an error here: they surface as a failed pipeline
    /// poll. An invalid interval falls back to `default_interval`.
    pub fn resolve<M: MetadataReader>(metadata: &M, default_interval: SelfDestructInterval) -> Self {
        let api_token = ApiToken::from(metadata.attribute(CIRCLE_API_TOKEN, ""));
        if api_token.is_empty() {
            warn!("{CIRCLE_API_TOKEN} metadata attribute is empty");
        }

        let pipeline_id = metadata.attribute(CIRCLE_PIPELINE_ID, "");
        if pipeline_id.is_empty() {
            warn!("{CIRCLE_PIPELINE_ID} metadata attribute is empty");
        }

        let raw_interval = metadata.attribute(
            SELF_DESTRUCT_INTERVAL_MINUTES,
            &default_interval.minutes().to_string(),
        );
        let self_destruct_interval =
            SelfDestructInterval::parse(&raw_interval).unwrap_or_else(|| {
                warn!(
                    value = %raw_interval,
                    default = default_interval.minutes(),
                    "invalid {SELF_DESTRUCT_INTERVAL_MINUTES}, using the default"
                );
                default_interval
            });

        debug!(
            %pipeline_id,
            self_destruct_minutes = self_destruct_interval.minutes(),
            "keepalive configuration resolved"
        );

        Self {
            api_token,
            pipeline_id,
            self_destruct_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tests::MockMetadataReader;
    use rstest::rstest;
    use std::collections::HashMap;

    fn metadata_with(attributes: HashMap<&'static str, &'static str>) -> MockMetadataReader {
        let mut metadata = MockMetadataReader::new();
        metadata
            .expect_attribute()
            .times(3)
            .returning(move |name, default_value| {
                attributes
                    .get(name)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| default_value.to_string())
            });
        metadata
    }

    #[rstest]
    #[case::one("1", Some(1))]
    #[case::padded(" 30\n", Some(30))]
    #[case::zero("0", None)]
    #[case::negative("-5", None)]
    #[case::fraction("1.5", None)]
    #[case::text("two", None)]
    #[case::empty("", None)]
    fn test_interval_parse(#[case] value: &str, #[case] expected: Option<u64>) {
        assert_eq!(
            SelfDestructInterval::parse(value).map(|i| i.minutes()),
            expected
        );
    }

    #[test]
    fn interval_duration() {
        let interval = SelfDestructInterval::from_minutes(3).unwrap();
        assert_eq!(interval.as_duration(), Duration::from_secs(180));
    }

    #[rstest]
    #[case::not_set(None, 2)]
    #[case::set(Some("15"), 15)]
    #[case::invalid(Some("soon"), 2)]
    #[case::zero(Some("0"), 2)]
    fn test_default_interval_from_env(#[case] env_value: Option<&'static str>, #[case] expected: u64) {
        let interval = env_aware_default_interval(|k| {
            assert_eq!(k, DEFAULT_SELF_DESTRUCT_ENV);
            env_value.map(String::from).ok_or(VarError::NotPresent)
        });
        assert_eq!(interval.minutes(), expected);
    }

    #[test]
    fn all_attributes_are_read() {
        let metadata = metadata_with(HashMap::from([
            (CIRCLE_API_TOKEN, "CCIPAT_token"),
            (CIRCLE_PIPELINE_ID, "5034460f-c7c4-4c43-9457-de07e2029e7b"),
            (SELF_DESTRUCT_INTERVAL_MINUTES, "45"),
        ]));

        let config = KeepaliveConfig::resolve(&metadata, SelfDestructInterval::default());

        assert_eq!(
            config,
            KeepaliveConfig {
                api_token: ApiToken::from("CCIPAT_token".to_string()),
                pipeline_id: "5034460f-c7c4-4c43-9457-de07e2029e7b".to_string(),
                self_destruct_interval: SelfDestructInterval::from_minutes(45).unwrap(),
            }
        );
    }

    #[test]
    fn missing_interval_uses_the_default() {
        let metadata = metadata_with(HashMap::from([
            (CIRCLE_API_TOKEN, "CCIPAT_token"),
            (CIRCLE_PIPELINE_ID, "some-id"),
        ]));

        let config = KeepaliveConfig::resolve(
            &metadata,
            SelfDestructInterval::from_minutes(7).unwrap(),
        );

        assert_eq!(config.self_destruct_interval.minutes(), 7);
    }

    #[test]
    fn invalid_interval_uses_the_default() {
        let metadata = metadata_with(HashMap::from([(SELF_DESTRUCT_INTERVAL_MINUTES, "never")]));

        let config = KeepaliveConfig::resolve(&metadata, SelfDestructInterval::default());

        assert_eq!(config.self_destruct_interval, SelfDestructInterval::default());
    }

    #[test]
    fn required_attributes_are_not_defaulted() {
        let metadata = metadata_with(HashMap::new());

        let config = KeepaliveConfig::resolve(&metadata, SelfDestructInterval::default());

        assert!(config.api_token.is_empty());
        assert!(config.pipeline_id.is_empty());
    }
}
