//! Entry point of the merge engine.

use crate::error::value_type_name;
use crate::report::{Change, MergeReport};
use crate::validation::{self, ApproveAll, ValidationRequest, Validator};
use crate::{walker, MergeError, MergeObject, MergeOptions, MergeResult, Path, PatchConfig};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Applies JSON merge payloads to object graphs.
///
/// A `Merger` holds the per-path overrides, the validation hook and the engine
/// options. It keeps no state between calls and can be shared across threads.
///
/// # Examples
///
/// ```
/// use tirea_merge::{Merger, MergeObject};
///
/// #[derive(Clone, Default, MergeObject)]
/// #[merge(rename_all = "PascalCase")]
/// struct Person {
///     first_name: String,
///     last_name: String,
/// }
///
/// let mut person = Person { first_name: "John".into(), last_name: "Mustermann".into() };
/// let patch = Person { first_name: String::new(), last_name: "Doe".into() };
///
/// let report = Merger::new().apply(&mut person, &patch, r#"{"LastName": "Doe"}"#).unwrap();
/// assert_eq!(person.first_name, "John");
/// assert_eq!(person.last_name, "Doe");
/// assert_eq!(report.len(), 1);
/// ```
#[derive(Clone)]
pub struct Merger {
    config: PatchConfig,
    validator: Arc<dyn Validator>,
    options: MergeOptions,
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Merger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Merger")
            .field("config", &self.config)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Merger {
    /// Create a merger with no overrides that approves every mutation.
    pub fn new() -> Self {
        Self {
            config: PatchConfig::default(),
            validator: Arc::new(ApproveAll),
            options: MergeOptions::default(),
        }
    }

    /// Use the given per-path overrides.
    pub fn with_config(mut self, config: PatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Use the given validation hook.
    pub fn with_validator<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Use the given engine options.
    pub fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }

    /// The configured overrides.
    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// The engine options.
    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Apply the members mentioned in `json` from `patch` to `original`.
    ///
    /// On error `original` is left exactly as it was.
    pub fn apply<O, P>(&self, original: &mut O, patch: &P, json: &str) -> MergeResult<MergeReport>
    where
        O: MergeObject + Clone,
        P: MergeObject,
    {
        let payload = parse_payload(json)?;
        self.apply_value(original, patch, &payload)
    }

    /// Like [`apply`](Self::apply), for an already parsed payload.
    pub fn apply_value<O, P>(
        &self,
        original: &mut O,
        patch: &P,
        payload: &Value,
    ) -> MergeResult<MergeReport>
    where
        O: MergeObject + Clone,
        P: MergeObject,
    {
        let root = match payload {
            Value::Object(root) => root,
            other => {
                return Err(MergeError::malformed(
                    "json",
                    format!("expected a JSON object, found {}", value_type_name(other)),
                ))
            }
        };

        tracing::debug!(
            original = original.descriptor().type_name(),
            patch = patch.descriptor().type_name(),
            keys = root.len(),
            "applying merge payload"
        );

        let mut working = original.clone();
        let mut session = Session::new(&self.config, self.validator.as_ref(), &self.options);
        if let Err(error) = walker::walk(&mut session, root, patch, &mut working, &Path::root()) {
            tracing::debug!(error = %error, client = error.is_client_error(), "merge aborted");
            return Err(error);
        }
        *original = working;

        let report = session.into_report();
        tracing::debug!(changes = report.len(), "merge applied");
        Ok(report)
    }
}

/// Apply `json` with default options, no overrides and no validation.
pub fn merge_patch<O, P>(original: &mut O, patch: &P, json: &str) -> MergeResult<MergeReport>
where
    O: MergeObject + Clone,
    P: MergeObject,
{
    Merger::new().apply(original, patch, json)
}

/// Parse a request body, rejecting empty and unparseable input.
pub fn parse_payload(json: &str) -> MergeResult<Value> {
    if json.trim().is_empty() {
        return Err(MergeError::malformed("json", "payload is empty"));
    }
    serde_json::from_str(json).map_err(|e| MergeError::malformed("json", e.to_string()))
}

/// State of one merge call.
pub(crate) struct Session<'m> {
    pub(crate) config: &'m PatchConfig,
    pub(crate) options: &'m MergeOptions,
    validator: &'m dyn Validator,
    report: MergeReport,
    quiet: usize,
}

impl<'m> Session<'m> {
    pub(crate) fn new(
        config: &'m PatchConfig,
        validator: &'m dyn Validator,
        options: &'m MergeOptions,
    ) -> Self {
        Self {
            config,
            options,
            validator,
            report: MergeReport::new(),
            quiet: 0,
        }
    }

    /// Ask the validation hook; a rejection becomes an error.
    pub(crate) fn validate(&self, request: ValidationRequest<'_>) -> MergeResult<()> {
        validation::dispatch(self.validator, request)
    }

    pub(crate) fn record(&mut self, change: Change) {
        if self.quiet == 0 {
            self.report.push(change);
        }
    }

    /// Run `f` without recording changes; used while populating new elements.
    pub(crate) fn quietly<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.quiet += 1;
        let result = f(self);
        self.quiet -= 1;
        result
    }

    pub(crate) fn into_report(self) -> MergeReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Person, Phone};
    use crate::{ChangeKind, Operation};

    #[test]
    fn test_parse_payload_rejects_empty() {
        for input in ["", "   ", "\n"] {
            let err = parse_payload(input).unwrap_err();
            assert!(matches!(err, MergeError::MalformedInput { argument: "json", .. }));
        }
        assert!(matches!(
            parse_payload("{not json").unwrap_err(),
            MergeError::MalformedInput { .. }
        ));
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let mut person = Person::named("John", "Mustermann");
        let patch = Person::named("Jane", "Doe");
        for json in ["null", "[]", "42", "\"x\""] {
            let err = merge_patch(&mut person, &patch, json).unwrap_err();
            assert!(err.is_client_error());
        }
        assert_eq!(person, Person::named("John", "Mustermann"));
    }

    #[test]
    fn test_apply_updates_only_mentioned() {
        let mut person = Person::named("John", "Mustermann");
        let patch = Person::named("Jane", "Doe");

        let report = merge_patch(&mut person, &patch, r#"{"LastName":"Doe"}"#).unwrap();
        assert_eq!(person.first_name, "John");
        assert_eq!(person.last_name, "Doe");
        assert_eq!(report.count(ChangeKind::Updated), 1);
    }

    #[test]
    fn test_rejection_leaves_original_untouched() {
        let mut person = Person::named("John", "Mustermann");
        person.phone_numbers.push(Phone::with_number("1234"));
        let before = person.clone();

        let mut patch = Person::named("Jane", "Doe");
        patch.phone_numbers.push(Phone::with_number("5678"));

        let merger = Merger::new()
            .with_validator(|r: &ValidationRequest<'_>| r.operation != Operation::AddItem);
        let err = merger
            .apply(
                &mut person,
                &patch,
                r#"{"FirstName":"Jane","PhoneNumbers":[{"PhoneNumber":"5678"}]}"#,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            MergeError::ValidationRejected {
                operation: Operation::AddItem,
                ..
            }
        ));
        assert_eq!(person, before);
    }

    #[test]
    fn test_quiet_session_suppresses_records() {
        let config = PatchConfig::new();
        let options = MergeOptions::default();
        let mut session = Session::new(&config, &ApproveAll, &options);

        session.quietly(|s| s.record(Change::new(Path::parse("A"), ChangeKind::Updated)));
        session.record(Change::new(Path::parse("B"), ChangeKind::Updated));

        let report = session.into_report();
        assert_eq!(report.len(), 1);
        assert_eq!(report.changes()[0].path, Path::parse("B"));
    }

    #[test]
    fn test_merger_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Merger>();
    }
}
