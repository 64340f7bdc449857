//! Device query validation
//!
//! A query selects a cloud device, e.g. `@os='android' and contains(@model,'Pixel')`.
//! One strict grammar is enforced everywhere:
//!
//! ```text
//! query  := clause ( (" and " | " or ") clause )*
//! clause := "@" name "=" value | "contains(@" name "," value ")"
//! name   := [A-Za-z][A-Za-z0-9_]*
//! value  := "'" [^']+ "'"
//! ```

use crate::error::{LocateError, LocateResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceQuery(String);

impl DeviceQuery {
    pub fn parse(raw: &str) -> LocateResult<Self> {
        let query = raw.trim();
        if query.is_empty() {
            return Err(invalid(query, "query is empty"));
        }

        let mut rest = query;
        loop {
            rest = parse_clause(rest).map_err(|d| invalid(query, &d))?;
            if rest.is_empty() {
                break;
            }
            rest = rest
                .strip_prefix(" and ")
                .or_else(|| rest.strip_prefix(" or "))
                .ok_or_else(|| invalid(query, &format!("expected ' and ' or ' or ' before {rest:?}")))?;
        }

        Ok(Self(query.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DeviceQuery {
    type Error = LocateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DeviceQuery::parse(&value)
    }
}

impl From<DeviceQuery> for String {
    fn from(query: DeviceQuery) -> Self {
        query.0
    }
}

fn invalid(query: &str, description: &str) -> LocateError {
    LocateError::Config {
        key: "deviceQuery".to_string(),
        description: format!("{description} in {query:?}"),
    }
}

fn parse_clause(input: &str) -> Result<&str, String> {
    if let Some(inner) = input.strip_prefix("contains(") {
        let rest = parse_attribute(inner)?;
        let rest = rest
            .strip_prefix(',')
            .ok_or_else(|| "expected ',' after attribute".to_string())?;
        let rest = parse_quoted(rest.trim_start())?;
        rest.strip_prefix(')')
            .ok_or_else(|| "expected ')' closing contains".to_string())
    } else {
        let rest = parse_attribute(input)?;
        let rest = rest
            .strip_prefix('=')
            .ok_or_else(|| "expected '=' after attribute".to_string())?;
        parse_quoted(rest)
    }
}

fn parse_attribute(input: &str) -> Result<&str, String> {
    let name = input
        .strip_prefix('@')
        .ok_or_else(|| format!("expected '@' at {input:?}"))?;
    let len = name
        .chars()
        .enumerate()
        .take_while(|(i, c)| {
            if *i == 0 {
                c.is_ascii_alphabetic()
            } else {
                c.is_ascii_alphanumeric() || *c == '_'
            }
        })
        .count();
    if len == 0 {
        return Err("attribute name is empty".to_string());
    }
    Ok(&name[len..])
}

fn parse_quoted(input: &str) -> Result<&str, String> {
    let body = input
        .strip_prefix('\'')
        .ok_or_else(|| format!("expected quoted value at {input:?}"))?;
    let end = body
        .find('\'')
        .ok_or_else(|| "unterminated value".to_string())?;
    if end == 0 {
        return Err("value is empty".to_string());
    }
    Ok(&body[end + 1..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_documented_forms() {
        for query in [
            "@os='android'",
            "@os='ios' and @version='16.0'",
            "contains(@model,'Pixel') or @os='android'",
            "contains(@model, 'Galaxy S23') and @category='PHONE'",
            "  @os='ios'  ",
        ] {
            assert!(DeviceQuery::parse(query).is_ok(), "{query}");
        }
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(DeviceQuery::parse(" @os='ios' ").unwrap().as_str(), "@os='ios'");
    }

    #[test]
    fn rejects_loose_forms() {
        for query in [
            "",
            "android",
            "@os=android",
            "@os=''",
            "@='android'",
            "@os='android",
            "@os='android' and",
            "@os='android' xor @os='ios'",
            "@os='android' @version='13'",
            "contains(@model 'Pixel')",
            "contains(@model,'Pixel'",
        ] {
            let err = DeviceQuery::parse(query).unwrap_err();
            assert!(matches!(err, LocateError::Config { .. }), "{query}");
        }
    }

    #[test]
    fn deserializes_with_validation() {
        let ok: DeviceQuery = serde_json::from_str("\"@os='android'\"").unwrap();
        assert_eq!(ok.to_string(), "@os='android'");
        assert!(serde_json::from_str::<DeviceQuery>("\"android\"").is_err());
    }
}
