//! Normalisation of Brazilian payer contact data.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// CPF for individuals, CNPJ for companies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Cpf,
    Cnpj,
}

impl DocumentKind {
    /// Gateway `document_type` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Cpf => "CPF",
            DocumentKind::Cnpj => "CNPJ",
        }
    }

    /// Pagar.me customer `type` for this document.
    pub fn customer_type(&self) -> &'static str {
        match self {
            DocumentKind::Cpf => "individual",
            DocumentKind::Cnpj => "company",
        }
    }
}

/// Digits-only tax document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxDocument {
    pub number: String,
    pub kind: DocumentKind,
}

impl TaxDocument {
    /// Strips punctuation and classifies by length (11 CPF, 14 CNPJ).
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let number = digits(raw);
        let kind = match number.len() {
            0 => return Err(ValidationError::empty_field("customer_data.document")),
            11 => DocumentKind::Cpf,
            14 => DocumentKind::Cnpj,
            n => {
                return Err(ValidationError::invalid_format(
                    "customer_data.document",
                    format!("expected 11 (CPF) or 14 (CNPJ) digits, got {}", n),
                ))
            }
        };
        Ok(Self { number, kind })
    }
}

/// Brazilian phone split the way the gateway wants it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    pub country_code: String,
    pub area_code: String,
    pub number: String,
}

impl Phone {
    /// Accepts 10 or 11 digits (area code + number), optionally prefixed
    /// with the 55 country code.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let mut all = digits(raw);
        if all.len() > 11 && all.starts_with("55") {
            all = all.split_off(2);
        }
        if !(10..=11).contains(&all.len()) {
            return Err(ValidationError::invalid_format(
                "customer_data.phone",
                "expected area code and number (10 or 11 digits)",
            ));
        }
        let number = all.split_off(2);
        Ok(Self {
            country_code: "55".to_string(),
            area_code: all,
            number,
        })
    }
}

/// Minimal shape check; the gateway does the real validation.
pub(crate) fn check_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(ValidationError::empty_field("customer_data.email"));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::invalid_format(
            "customer_data.email",
            format!("'{}' is not an email address", email),
        ));
    }
    Ok(email.to_string())
}

pub(crate) fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eleven_digits_is_cpf() {
        let doc = TaxDocument::parse("123.456.789-01").unwrap();
        assert_eq!(doc.number, "12345678901");
        assert_eq!(doc.kind, DocumentKind::Cpf);
        assert_eq!(doc.kind.customer_type(), "individual");
    }

    #[test]
    fn fourteen_digits_is_cnpj() {
        let doc = TaxDocument::parse("12.345.678/0001-95").unwrap();
        assert_eq!(doc.kind, DocumentKind::Cnpj);
    }

    #[test]
    fn other_lengths_are_rejected() {
        assert!(TaxDocument::parse("1234").is_err());
        assert!(matches!(
            TaxDocument::parse("---"),
            Err(ValidationError::EmptyField { .. })
        ));
    }

    #[test]
    fn phone_splits_area_code() {
        let phone = Phone::parse("(11) 98765-4321").unwrap();
        assert_eq!(phone.area_code, "11");
        assert_eq!(phone.number, "987654321");
        assert_eq!(phone.country_code, "55");
    }

    #[test]
    fn phone_strips_country_code() {
        let phone = Phone::parse("+55 21 3333-4444").unwrap();
        assert_eq!(phone.area_code, "21");
        assert_eq!(phone.number, "33334444");
    }

    #[test]
    fn short_phone_is_rejected() {
        assert!(Phone::parse("98765").is_err());
    }

    #[test]
    fn email_shape_is_checked() {
        assert_eq!(check_email(" a@b.com ").unwrap(), "a@b.com");
        assert!(check_email("a.com").is_err());
        assert!(check_email("a@b").is_err());
        assert!(check_email("@b.com").is_err());
        assert!(check_email("a@b@c.com").is_err());
    }
}
