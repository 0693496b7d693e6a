use std::borrow::Cow;
use std::fmt::{Display, Formatter};

use error_stack::{AttachmentKind, FrameKind, Report, ResultExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use time::OffsetDateTime;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use kernel::prelude::entity::{CreatedAt, IsDiscarded, Lifecycle, UpdatedAt, Version};
use kernel::KernelError;

/// Which way a value was travelling when its conversion failed.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ConversionDirection {
    JsonToApi,
    ApiToJson,
    ApiToDomain,
    DomainToApi,
    OrmToApi,
    ApiToOrm,
}

impl Display for ConversionDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionDirection::JsonToApi => write!(f, "json -> api"),
            ConversionDirection::ApiToJson => write!(f, "api -> json"),
            ConversionDirection::ApiToDomain => write!(f, "api -> domain"),
            ConversionDirection::DomainToApi => write!(f, "domain -> api"),
            ConversionDirection::OrmToApi => write!(f, "orm -> api"),
            ConversionDirection::ApiToOrm => write!(f, "api -> orm"),
        }
    }
}

/// A single rejected field. `field` is a dotted path such as
/// `recipes[0].tags`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Flattens nested validator output into one error per failed check.
    pub fn flatten(errors: &ValidationErrors) -> Vec<FieldError> {
        let mut out = Vec::new();
        push_validation_errors(&mut out, "", errors);
        out
    }

    /// Prefixes the path, used when a parent reports its children's errors.
    pub fn nested_in(mut self, prefix: &str) -> Self {
        self.field = join_path(prefix, &self.field);
        self
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.message, self.code)
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    match (prefix.is_empty(), field.is_empty()) {
        (true, _) => field.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) if field.starts_with('[') => format!("{prefix}{field}"),
        (false, false) => format!("{prefix}.{field}"),
    }
}

fn default_message(code: &str) -> Cow<'static, str> {
    match code {
        "length" => Cow::Borrowed("has invalid length"),
        "range" => Cow::Borrowed("is out of range"),
        "url" => Cow::Borrowed("must be a valid URL"),
        "email" => Cow::Borrowed("must be a valid email"),
        "regex" => Cow::Borrowed("has an invalid format"),
        other => Cow::Owned(other.to_string()),
    }
}

fn push_validation_errors(out: &mut Vec<FieldError>, prefix: &str, errors: &ValidationErrors) {
    for (field, kind) in errors.errors() {
        let path = join_path(prefix, field);
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .clone()
                        .unwrap_or_else(|| default_message(&error.code));
                    out.push(FieldError::new(path.clone(), error.code.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => push_validation_errors(out, &path, nested),
            ValidationErrorsKind::List(list) => {
                for (index, nested) in list {
                    push_validation_errors(out, &format!("{path}[{index}]"), nested);
                }
            }
        }
    }
}

/// Raised whenever a value fails to cross one of the conversion layers.
///
/// The report's root frame is the underlying `ValidationErrors` or
/// `serde_json::Error` when there is one.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionError {
    pub schema: &'static str,
    pub direction: ConversionDirection,
    pub source_data: String,
    pub errors: Vec<FieldError>,
}

impl ConversionError {
    pub fn new(
        schema: &'static str,
        direction: ConversionDirection,
        source_data: impl Into<String>,
    ) -> Self {
        Self {
            schema,
            direction,
            source_data: source_data.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }

    pub fn has_error_on(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} conversion failed ({})", self.schema, self.direction)?;
        for error in &self.errors {
            write!(f, "; {error}")?;
        }
        Ok(())
    }
}

impl error_stack::Context for ConversionError {}

/// Wire-format mirror of a domain type.
///
/// Validation runs in two phases: field checks derived through
/// [`Validate`], then [`ApiSchema::check_invariants`] over the fully typed
/// value for rules spanning several fields.
pub trait ApiSchema: Serialize + DeserializeOwned + Validate + Sized {
    const SCHEMA: &'static str;

    fn check_invariants(&self) -> Vec<FieldError> {
        Vec::new()
    }

    fn ensure_valid(
        &self,
        direction: ConversionDirection,
    ) -> error_stack::Result<(), ConversionError> {
        if let Err(errors) = self.validate() {
            let context = ConversionError::new(Self::SCHEMA, direction, self.source_data())
                .with_errors(FieldError::flatten(&errors));
            return Err(Report::new(errors).change_context(context));
        }
        let broken = self.check_invariants();
        if !broken.is_empty() {
            return Err(Report::new(
                ConversionError::new(Self::SCHEMA, direction, self.source_data())
                    .with_errors(broken),
            ));
        }
        Ok(())
    }

    fn from_json(json: &str) -> error_stack::Result<Self, ConversionError> {
        let value = serde_json::from_str::<Self>(json).map_err(|error| {
            let field = FieldError::new("", "json", error.to_string());
            let context = ConversionError::new(Self::SCHEMA, ConversionDirection::JsonToApi, json)
                .with_errors(vec![field]);
            Report::new(error).change_context(context)
        })?;
        value.ensure_valid(ConversionDirection::JsonToApi)?;
        Ok(value)
    }

    fn to_json(&self) -> error_stack::Result<String, ConversionError> {
        self.ensure_valid(ConversionDirection::ApiToJson)?;
        serde_json::to_string(self).change_context_lazy(|| {
            ConversionError::new(Self::SCHEMA, ConversionDirection::ApiToJson, "")
        })
    }

    /// JSON text of the value for error reports. Empty if it cannot be
    /// serialized.
    fn source_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

pub(crate) fn restore_lifecycle<T>(
    version: i64,
    discarded: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
) -> Lifecycle<T> {
    Lifecycle::restore(
        Version::new(version),
        IsDiscarded::new(discarded),
        CreatedAt::new(created_at),
        UpdatedAt::new(updated_at),
    )
}

/// An entity cannot be updated before it was created.
pub(crate) fn check_chronology(
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
) -> Option<FieldError> {
    (updated_at < created_at).then(|| {
        FieldError::new("updated_at", "chronology", "updated_at precedes created_at")
    })
}

/// Lifts a failure the domain raised while `api` was being rebuilt into a
/// conversion error.
pub(crate) fn domain_rejected<S: ApiSchema>(
    api: &S,
    report: Report<KernelError>,
) -> Report<ConversionError> {
    let code = report.current_context().to_string();
    let message = report
        .frames()
        .filter_map(|frame| match frame.kind() {
            FrameKind::Attachment(AttachmentKind::Printable(printable)) => Some(printable.to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("; ");
    report.change_context(
        ConversionError::new(S::SCHEMA, ConversionDirection::ApiToDomain, api.source_data())
            .with_errors(vec![FieldError::new("", code, message)]),
    )
}

#[cfg(test)]
mod test {
    use serde::{Deserialize, Serialize};
    use time::{Duration, OffsetDateTime};
    use validator::Validate;

    use super::{check_chronology, ApiSchema, ConversionDirection, ConversionError, FieldError};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
    #[serde(deny_unknown_fields)]
    struct Portion {
        #[validate(length(min = 1))]
        name: String,
        #[validate(range(min = 0.0, max = 100.0))]
        share: f64,
        #[validate(nested)]
        parts: Vec<Portion>,
    }

    impl ApiSchema for Portion {
        const SCHEMA: &'static str = "Portion";

        fn check_invariants(&self) -> Vec<FieldError> {
            let total: f64 = self.parts.iter().map(|part| part.share).sum();
            if total > 100.0 {
                return vec![FieldError::new("parts", "total", "shares exceed 100")];
            }
            Vec::new()
        }
    }

    #[test]
    fn nested_errors_are_flattened_with_paths() {
        let json = r#"{"name":"","share":10.0,"parts":[{"name":"a","share":120.0,"parts":[]}]}"#;
        let report = Portion::from_json(json).unwrap_err();
        let error = report.current_context();
        assert_eq!(error.direction, ConversionDirection::JsonToApi);
        assert!(error.has_error_on("name"));
        assert!(error.has_error_on("parts[0].share"));
        assert!(report.downcast_ref::<validator::ValidationErrors>().is_some());
    }

    #[test]
    fn invariants_run_after_field_checks() {
        let json = r#"{"name":"x","share":10.0,"parts":[
            {"name":"a","share":60.0,"parts":[]},
            {"name":"b","share":60.0,"parts":[]}]}"#;
        let report = Portion::from_json(json).unwrap_err();
        assert!(report.current_context().has_error_on("parts"));
        assert_eq!(report.current_context().errors[0].code, "total");
    }

    #[test]
    fn rejects_unknown_fields_and_loose_types() {
        let unknown = r#"{"name":"x","share":1.0,"parts":[],"extra":true}"#;
        let report = Portion::from_json(unknown).unwrap_err();
        assert!(report.downcast_ref::<serde_json::Error>().is_some());

        let stringly = r#"{"name":"x","share":"1.0","parts":[]}"#;
        assert!(Portion::from_json(stringly).is_err());
    }

    #[test]
    fn report_names_schema() {
        let error = ConversionError::new("Portion", ConversionDirection::ApiToDomain, "{}")
            .with_errors(vec![FieldError::new("name", "length", "too short")]);
        assert_eq!(
            error.to_string(),
            "Portion conversion failed (api -> domain); name: too short (length)"
        );
    }

    #[test]
    fn chronology_allows_equal_timestamps() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(check_chronology(now, now), None);
        assert_eq!(check_chronology(now, now + Duration::minutes(1)), None);

        let error = check_chronology(now, now - Duration::minutes(1)).unwrap();
        assert_eq!(error.field, "updated_at");
        assert_eq!(error.code, "chronology");
    }
}
