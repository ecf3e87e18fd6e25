//! Typed form records and the captured submission

use crate::error::{FieldError, FormError, Result};
use crate::rate_limit::ANONYMOUS;
use crate::validate::FieldKind;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which form a submission came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Donation,
    Request,
    Volunteer,
}

impl FormKind {
    /// Wire tag sent as `formType`
    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Donation => "donation",
            FormKind::Request => "request",
            FormKind::Volunteer => "volunteer",
        }
    }

    /// Confirmation shown after a successful submission
    pub fn success_message(&self) -> &'static str {
        match self {
            FormKind::Donation => {
                "Thank you for your donation! Our team will contact you to arrange drop-off or pickup."
            }
            FormKind::Request => {
                "Your request has been received. A coordinator will reach out within 24 hours."
            }
            FormKind::Volunteer => {
                "Thank you for signing up to volunteer! We'll be in touch with upcoming shifts."
            }
        }
    }
}

impl std::fmt::Display for FormKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "donation" | "donate" => Ok(FormKind::Donation),
            "request" => Ok(FormKind::Request),
            "volunteer" => Ok(FormKind::Volunteer),
            other => Err(FormError::ConfigError(format!("Unknown form type: {}", other))),
        }
    }
}

/// One field as presented to the validators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec<'a> {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub value: Option<&'a str>,
}

impl<'a> FieldSpec<'a> {
    fn new(name: &'static str, kind: FieldKind, required: bool, value: &'a Option<String>) -> Self {
        Self {
            name,
            kind,
            required,
            value: value.as_deref(),
        }
    }
}

/// Donation form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub donation_type: Option<String>,
    pub quantity: Option<String>,
    pub message: Option<String>,
}

/// Food assistance request form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestForm {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub household_size: Option<String>,
    pub dietary_needs: Option<String>,
    pub message: Option<String>,
}

/// Volunteer sign-up form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub availability: Option<String>,
    pub interests: Option<String>,
    pub message: Option<String>,
}

/// Any of the three site forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "formType", rename_all = "lowercase")]
pub enum Form {
    Donation(DonationForm),
    Request(RequestForm),
    Volunteer(VolunteerForm),
}

impl Form {
    pub fn kind(&self) -> FormKind {
        match self {
            Form::Donation(_) => FormKind::Donation,
            Form::Request(_) => FormKind::Request,
            Form::Volunteer(_) => FormKind::Volunteer,
        }
    }

    /// Field descriptors in display order
    pub fn fields(&self) -> Vec<FieldSpec<'_>> {
        use FieldKind::*;
        match self {
            Form::Donation(f) => vec![
                FieldSpec::new("name", Name, true, &f.name),
                FieldSpec::new("email", Email, true, &f.email),
                FieldSpec::new("phone", Tel, false, &f.phone),
                FieldSpec::new("organization", Text, false, &f.organization),
                FieldSpec::new("donationType", Select, true, &f.donation_type),
                FieldSpec::new("quantity", Text, false, &f.quantity),
                FieldSpec::new("message", TextArea, false, &f.message),
            ],
            Form::Request(f) => vec![
                FieldSpec::new("name", Name, true, &f.name),
                FieldSpec::new("phone", Tel, true, &f.phone),
                FieldSpec::new("email", Email, false, &f.email),
                FieldSpec::new("address", Text, false, &f.address),
                FieldSpec::new("householdSize", Number, true, &f.household_size),
                FieldSpec::new("dietaryNeeds", TextArea, false, &f.dietary_needs),
                FieldSpec::new("message", TextArea, false, &f.message),
            ],
            Form::Volunteer(f) => vec![
                FieldSpec::new("name", Name, true, &f.name),
                FieldSpec::new("email", Email, true, &f.email),
                FieldSpec::new("phone", Tel, false, &f.phone),
                FieldSpec::new("availability", Select, true, &f.availability),
                FieldSpec::new("interests", Text, false, &f.interests),
                FieldSpec::new("message", TextArea, false, &f.message),
            ],
        }
    }

    /// Build a form from `name=value` style pairs using wire field names
    pub fn from_pairs<I, K, V>(kind: FormKind, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut form = match kind {
            FormKind::Donation => Form::Donation(DonationForm::default()),
            FormKind::Request => Form::Request(RequestForm::default()),
            FormKind::Volunteer => Form::Volunteer(VolunteerForm::default()),
        };

        let mut unknown = vec![];
        for (key, value) in pairs {
            let key = key.as_ref();
            match form.slot_mut(key) {
                Some(slot) => *slot = Some(value.into()),
                None => unknown.push(FieldError {
                    field: key.to_string(),
                    message: format!("Unknown field for {} form", kind),
                }),
            }
        }

        if unknown.is_empty() {
            Ok(form)
        } else {
            Err(FormError::Validation { errors: unknown })
        }
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        match self {
            Form::Donation(f) => match name {
                "name" => Some(&mut f.name),
                "email" => Some(&mut f.email),
                "phone" => Some(&mut f.phone),
                "organization" => Some(&mut f.organization),
                "donationType" => Some(&mut f.donation_type),
                "quantity" => Some(&mut f.quantity),
                "message" => Some(&mut f.message),
                _ => None,
            },
            Form::Request(f) => match name {
                "name" => Some(&mut f.name),
                "phone" => Some(&mut f.phone),
                "email" => Some(&mut f.email),
                "address" => Some(&mut f.address),
                "householdSize" => Some(&mut f.household_size),
                "dietaryNeeds" => Some(&mut f.dietary_needs),
                "message" => Some(&mut f.message),
                _ => None,
            },
            Form::Volunteer(f) => match name {
                "name" => Some(&mut f.name),
                "email" => Some(&mut f.email),
                "phone" => Some(&mut f.phone),
                "availability" => Some(&mut f.availability),
                "interests" => Some(&mut f.interests),
                "message" => Some(&mut f.message),
                _ => None,
            },
        }
    }
}

/// Sanitized field values captured at submit time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSubmission {
    kind: FormKind,
    fields: Vec<(String, String)>,
}

impl FormSubmission {
    /// Capture already-sanitized values, in field order
    pub fn new(kind: FormKind, fields: Vec<(String, String)>) -> Self {
        Self { kind, fields }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Rate-limit key: email, then phone, then `anonymous`
    pub fn identifier(&self) -> &str {
        ["email", "phone"]
            .into_iter()
            .filter_map(|name| self.get(name))
            .find(|v| !v.is_empty())
            .unwrap_or(ANONYMOUS)
    }

    /// Field values as a JSON object
    pub fn fields_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(n, v)| (n.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Donation".parse::<FormKind>().unwrap(), FormKind::Donation);
        assert_eq!("volunteer".parse::<FormKind>().unwrap(), FormKind::Volunteer);
        assert!("pickup".parse::<FormKind>().is_err());
    }

    #[test]
    fn test_from_pairs() {
        let form = Form::from_pairs(
            FormKind::Request,
            [("name", "Ana Lopez"), ("householdSize", "4")],
        )
        .unwrap();
        match &form {
            Form::Request(r) => {
                assert_eq!(r.name.as_deref(), Some("Ana Lopez"));
                assert_eq!(r.household_size.as_deref(), Some("4"));
                assert!(r.phone.is_none());
            }
            other => panic!("unexpected form {other:?}"),
        }

        let err = Form::from_pairs(FormKind::Volunteer, [("donationType", "cash")]).unwrap_err();
        assert_eq!(err.field_errors()[0].field, "donationType");
    }

    #[test]
    fn test_fields_cover_every_slot() {
        for kind in [FormKind::Donation, FormKind::Request, FormKind::Volunteer] {
            let mut form = Form::from_pairs(kind, Vec::<(&str, &str)>::new()).unwrap();
            let names: Vec<&'static str> = form.fields().iter().map(|f| f.name).collect();
            for name in names {
                assert!(form.slot_mut(name).is_some(), "{kind}: {name}");
            }
        }
    }

    #[test]
    fn test_identifier_fallback() {
        let with_email = FormSubmission::new(
            FormKind::Donation,
            vec![
                ("email".into(), "a@b.co".into()),
                ("phone".into(), "5551234567".into()),
            ],
        );
        assert_eq!(with_email.identifier(), "a@b.co");

        let phone_only = FormSubmission::new(
            FormKind::Request,
            vec![
                ("phone".into(), "5551234567".into()),
                ("email".into(), "".into()),
            ],
        );
        assert_eq!(phone_only.identifier(), "5551234567");

        let neither = FormSubmission::new(FormKind::Volunteer, vec![("name".into(), "Al".into())]);
        assert_eq!(neither.identifier(), ANONYMOUS);
    }

    #[test]
    fn test_form_json_tagging() {
        let form: Form = serde_json::from_str(
            r#"{"formType":"volunteer","name":"Sam Lee","availability":"weekends"}"#,
        )
        .unwrap();
        assert_eq!(form.kind(), FormKind::Volunteer);
    }
}
