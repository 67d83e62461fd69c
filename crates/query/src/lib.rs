//! Request parameter translation.
//!
//! Converts the string parameters a calling layer receives (query string,
//! form fields) into a validated `MatchConfiguration`:
//! - `threshold`: minimum final score
//! - `max_results`: result cap
//! - `algo`: `tfidf` for vector cosine, anything else for edit distance
//! - `use_circle`: `true` to enable the maker bonus

use serde::Deserialize;
use shelfmatch_model::{ConfigError, MatchConfiguration};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error(transparent)]
    InvalidConfiguration(#[from] ConfigError),
}

/// Raw matching parameters as delivered by the calling layer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MatchParams {
    #[serde(default)]
    pub threshold: Option<String>,

    #[serde(default)]
    pub max_results: Option<String>,

    #[serde(default)]
    pub algo: Option<String>,

    #[serde(default)]
    pub use_circle: Option<String>,
}

impl MatchParams {
    /// Collect recognized parameters from key/value pairs. Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "threshold" => &mut params.threshold,
                "max_results" => &mut params.max_results,
                "algo" => &mut params.algo,
                "use_circle" => &mut params.use_circle,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        params
    }

    /// Parse a `key=value&key=value` string.
    pub fn from_query_string(query: &str) -> Self {
        Self::from_pairs(
            query
                .trim_start_matches('?')
                .split('&')
                .filter(|part| !part.is_empty())
                .map(|part| match part.split_once('=') {
                    Some((k, v)) => (k.trim(), v.trim().to_string()),
                    None => (part.trim(), String::new()),
                }),
        )
    }

    /// Build and validate the run configuration, starting from the defaults.
    pub fn into_configuration(self) -> Result<MatchConfiguration, QueryError> {
        self.apply_to(MatchConfiguration::default())
    }

    /// Override `config` with the parameters that are present, then validate.
    pub fn apply_to(self, mut config: MatchConfiguration) -> Result<MatchConfiguration, QueryError> {
        if let Some(raw) = self.threshold.as_deref().filter(|s| !s.is_empty()) {
            config.title_similarity_threshold =
                raw.parse::<f64>().map_err(|_| QueryError::InvalidNumber {
                    field: "threshold",
                    value: raw.to_string(),
                })?;
        }

        if let Some(raw) = self.max_results.as_deref().filter(|s| !s.is_empty()) {
            let value = raw.parse::<i64>().map_err(|_| QueryError::InvalidNumber {
                field: "max_results",
                value: raw.to_string(),
            })?;
            if value < 0 {
                return Err(ConfigError::NegativeMaxResults(value).into());
            }
            config.max_results = usize::try_from(value).unwrap_or(usize::MAX);
        }

        if let Some(algo) = &self.algo {
            config.use_tf_idf = algo == "tfidf";
        }

        if let Some(use_circle) = &self.use_circle {
            config.use_circle_name = use_circle == "true";
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_when_empty() {
        let config = MatchParams::default().into_configuration().unwrap();
        assert_eq!(config, MatchConfiguration::default());
    }

    #[test]
    fn test_query_string() {
        let params = MatchParams::from_query_string("?threshold=0.8&max_results=20&algo=levenshtein&use_circle=false&page=2");
        assert_eq!(params.threshold.as_deref(), Some("0.8"));
        let config = params.into_configuration().unwrap();
        assert_eq!(config.title_similarity_threshold, 0.8);
        assert_eq!(config.max_results, 20);
        assert!(!config.use_tf_idf);
        assert!(!config.use_circle_name);
    }

    #[test]
    fn test_threshold_out_of_range() {
        let err = MatchParams::from_query_string("threshold=1.1")
            .into_configuration()
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidConfiguration(ConfigError::ThresholdOutOfRange(1.1))
        );
    }

    #[test]
    fn test_negative_max_results() {
        let err = MatchParams::from_query_string("max_results=-5")
            .into_configuration()
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidConfiguration(ConfigError::NegativeMaxResults(-5))
        );
    }

    #[test]
    fn test_invalid_number() {
        let err = MatchParams::from_query_string("threshold=high")
            .into_configuration()
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidNumber { field: "threshold", .. }));
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let base = MatchConfiguration::default()
            .with_max_results(7)
            .with_parallel(true);
        let config = MatchParams::from_query_string("algo=edit")
            .apply_to(base)
            .unwrap();
        assert_eq!(config.max_results, 7);
        assert!(config.parallel);
        assert!(!config.use_tf_idf);
    }

    #[test]
    fn test_from_json_body() {
        let params: MatchParams =
            serde_json::from_str(r#"{"algo": "tfidf", "use_circle": "true"}"#).unwrap();
        let config = params.into_configuration().unwrap();
        assert!(config.use_tf_idf);
        assert!(config.use_circle_name);
    }
}
