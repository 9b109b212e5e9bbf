//! Debounced credential validation.
//!
//! Every scheduled effect carries the key it was scheduled for. When the
//! timer fires or the result arrives, that key is compared with the live
//! field and the message is dropped if they differ. Nothing is ever
//! cancelled.

use std::sync::Arc;
use std::time::Duration;

use crate::providers::{self, ApiProvider, FetchRequest, MediaType, MetadataProvider, ProviderOptions};

use super::models::{ProviderServiceState, ValidationState, ValidationStatus};

pub const DEBOUNCE: Duration = Duration::from_secs(1);

/// Builds a fresh client for each validation attempt.
pub type ProviderFactory = Arc<dyn Fn(ApiProvider) -> Box<dyn MetadataProvider> + Send + Sync>;

pub fn default_factory() -> ProviderFactory {
    Arc::new(providers::new_api_provider)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    pub provider: ApiProvider,
    pub key: String,
    pub language: Option<String>,
}

/// Async work the model asks the runtime to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver `DebounceElapsed` for this key after `delay`.
    ScheduleValidation {
        provider: ApiProvider,
        key: String,
        delay: Duration,
    },
    /// Run the credential check and deliver `ValidationFinished`.
    Validate(ValidationRequest),
}

/// The key field changed: forget the status and start the quiet period.
pub fn on_credential_edited(provider: ApiProvider, service: &mut ProviderServiceState, delay: Duration) -> Effect {
    service.validation.status = ValidationStatus::Unknown;
    Effect::ScheduleValidation {
        provider,
        key: service.key().to_string(),
        delay,
    }
}

/// Quiet period over for `key`. A no-op unless `key` is still the live value.
pub fn on_debounce_elapsed(provider: ApiProvider, service: &mut ProviderServiceState, key: &str) -> Option<Effect> {
    if !service.enabled || service.key() != key {
        tracing::trace!(%provider, "Dropping stale debounce");
        return None;
    }
    checkpoint(provider, service)
}

/// Validate the current key now, unless it is empty, already being checked,
/// or already has an outcome.
pub fn checkpoint(provider: ApiProvider, service: &mut ProviderServiceState) -> Option<Effect> {
    if !service.enabled || service.key().is_empty() {
        return None;
    }

    let validation = &mut service.validation;
    if validation.status == ValidationStatus::Validating {
        return None;
    }

    if service.api_key.as_str() == validation.last_validated_key {
        if let Some(outcome) = validation.last_outcome {
            validation.status = outcome;
        }
        return None;
    }

    validation.status = ValidationStatus::Validating;
    tracing::debug!(%provider, "Validating credentials");
    Some(Effect::Validate(ValidationRequest {
        provider,
        key: service.key().to_string(),
        language: service.language.as_ref().map(|l| l.as_str().to_string()),
    }))
}

/// Apply a finished check. Returns false when the result was stale.
pub fn on_validation_finished(service: &mut ProviderServiceState, key: &str, valid: bool) -> bool {
    if !service.enabled || service.key() != key {
        return false;
    }

    let outcome = if valid {
        ValidationStatus::Valid
    } else {
        ValidationStatus::Invalid
    };
    service.validation = ValidationState {
        status: outcome,
        last_validated_key: key.to_string(),
        last_outcome: Some(outcome),
    };
    true
}

pub fn on_disabled(service: &mut ProviderServiceState) {
    service.enabled = false;
    service.validation = ValidationState::default();
}

/// Stable title every provider should resolve with a working key.
pub fn canonical_lookup(provider: ApiProvider) -> FetchRequest {
    match provider {
        ApiProvider::Tmdb => FetchRequest::new(MediaType::Movie, "The Matrix", Some(1999)),
        ApiProvider::Tvdb => FetchRequest::new(MediaType::Show, "Breaking Bad", Some(2008)),
    }
}

/// Configure `client` with the candidate key and look up the canonical title.
///
/// Any failure counts as an invalid key, including network errors.
pub async fn validate_credentials(mut client: Box<dyn MetadataProvider>, request: &ValidationRequest) -> bool {
    let options = ProviderOptions {
        api_key: request.key.clone(),
        language: request.language.clone(),
        cache_enabled: false,
    };

    if let Err(err) = client.configure(options) {
        tracing::warn!(provider = %request.provider, "Could not configure provider: {}", err);
        return false;
    }

    match client.fetch(&canonical_lookup(request.provider)).await {
        Ok(_) => true,
        Err(err) if err.is_auth() => {
            tracing::debug!(provider = %request.provider, "Credentials rejected");
            false
        }
        Err(err) => {
            tracing::warn!(provider = %request.provider, "Validation lookup failed: {}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::providers::{Metadata, ProviderError, ProviderId, TemplateVariable};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn enabled(key: &str) -> ProviderServiceState {
        ProviderServiceState::from_config(
            ApiProvider::Tmdb,
            &ServiceConfig {
                enabled: true,
                api_key: key.to_string(),
                language: Some("en-US".to_string()),
            },
        )
    }

    #[test]
    fn test_edit_resets_status_and_schedules() {
        let mut service = enabled("abc");
        service.validation.status = ValidationStatus::Valid;

        let effect = on_credential_edited(ApiProvider::Tmdb, &mut service, DEBOUNCE);

        assert_eq!(service.validation.status, ValidationStatus::Unknown);
        assert_eq!(
            effect,
            Effect::ScheduleValidation {
                provider: ApiProvider::Tmdb,
                key: "abc".to_string(),
                delay: DEBOUNCE,
            }
        );
    }

    #[test]
    fn test_stale_debounce_is_dropped() {
        let mut service = enabled("abcd");
        assert_eq!(on_debounce_elapsed(ApiProvider::Tmdb, &mut service, "abc"), None);
        assert_eq!(service.validation.status, ValidationStatus::Unknown);
    }

    #[test]
    fn test_debounce_for_live_key_validates() {
        let mut service = enabled("abc");
        let effect = on_debounce_elapsed(ApiProvider::Tmdb, &mut service, "abc");

        assert_eq!(service.validation.status, ValidationStatus::Validating);
        assert_eq!(
            effect,
            Some(Effect::Validate(ValidationRequest {
                provider: ApiProvider::Tmdb,
                key: "abc".to_string(),
                language: Some("en-US".to_string()),
            }))
        );
    }

    #[test]
    fn test_already_validated_key_restores_outcome_without_request() {
        let mut service = enabled("abc");
        assert!(on_validation_finished(&mut service, "abc", true));
        service.validation.status = ValidationStatus::Unknown;

        assert_eq!(checkpoint(ApiProvider::Tmdb, &mut service), None);
        assert_eq!(service.validation.status, ValidationStatus::Valid);
    }

    #[test]
    fn test_stale_result_changes_nothing() {
        let mut service = enabled("new");
        service.validation.status = ValidationStatus::Validating;
        let before = service.validation.clone();

        assert!(!on_validation_finished(&mut service, "old", false));
        assert_eq!(service.validation, before);
    }

    #[test]
    fn test_disable_resets_validation() {
        let mut service = enabled("abc");
        on_validation_finished(&mut service, "abc", false);

        on_disabled(&mut service);

        assert_eq!(service.validation.status, ValidationStatus::Unknown);
        assert_eq!(service.validation.last_validated_key, "");
    }

    struct FakeProvider {
        good_key: &'static str,
        seen: Arc<Mutex<Vec<ProviderOptions>>>,
        options: ProviderOptions,
        fail_network: bool,
    }

    #[async_trait]
    impl MetadataProvider for FakeProvider {
        fn id(&self) -> ProviderId {
            ProviderId::Tmdb
        }

        fn configure(&mut self, options: ProviderOptions) -> Result<(), ProviderError> {
            self.seen.lock().unwrap().push(options.clone());
            self.options = options;
            Ok(())
        }

        async fn fetch(&self, request: &FetchRequest) -> Result<Metadata, ProviderError> {
            if self.fail_network {
                return Err(ProviderError::Status {
                    provider: ProviderId::Tmdb,
                    status: 503,
                });
            }
            if self.options.api_key != self.good_key {
                return Err(ProviderError::Auth(ProviderId::Tmdb));
            }
            Ok(Metadata::new().with("title", &request.name))
        }

        fn supported_variables(&self, _media_type: MediaType) -> Vec<TemplateVariable> {
            Vec::new()
        }
    }

    fn fake(fail_network: bool) -> (Box<dyn MetadataProvider>, Arc<Mutex<Vec<ProviderOptions>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let provider = FakeProvider {
            good_key: "good",
            seen: seen.clone(),
            options: ProviderOptions::default(),
            fail_network,
        };
        (Box::new(provider), seen)
    }

    fn request(key: &str) -> ValidationRequest {
        ValidationRequest {
            provider: ApiProvider::Tmdb,
            key: key.to_string(),
            language: None,
        }
    }

    #[tokio::test]
    async fn test_validator_accepts_good_key_with_cache_disabled() {
        let (client, seen) = fake(false);
        assert!(validate_credentials(client, &request("good")).await);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].api_key, "good");
        assert!(!seen[0].cache_enabled);
    }

    #[tokio::test]
    async fn test_validator_rejects_bad_key() {
        let (client, _) = fake(false);
        assert!(!validate_credentials(client, &request("bad")).await);
    }

    #[tokio::test]
    async fn test_network_failure_reads_as_invalid() {
        let (client, _) = fake(true);
        assert!(!validate_credentials(client, &request("good")).await);
    }
}
