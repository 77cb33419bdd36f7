use std::fmt::{Display, Formatter};
use std::str::FromStr;

use mongodb::bson::Bson;
use rocket::{
    http::{
        impl_from_uri_param_identity,
        uri::fmt::{Path, UriDisplay},
    },
    request::FromParam,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An electoral office, identified by a slug such as `vice-president`.
///
/// Slugs are lowercase ASCII letters, digits and hyphens. Parsing lowercases
/// the input, so `Treasurer` and `treasurer` name the same position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Position(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("Position must not be empty")]
    Empty,
    #[error("Position contains illegal character '{0}'")]
    IllegalChar(char),
}

impl Position {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable name: `vice-president` becomes `Vice President`.
    pub fn title(&self) -> String {
        self.0
            .split('-')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromStr for Position {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = s.trim().to_ascii_lowercase();
        if slug.is_empty() {
            return Err(PositionError::Empty);
        }
        if let Some(c) = slug
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(PositionError::IllegalChar(c));
        }
        Ok(Self(slug))
    }
}

impl TryFrom<String> for Position {
    type Error = PositionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.0
    }
}

impl From<&Position> for Bson {
    fn from(position: &Position) -> Self {
        Bson::String(position.0.clone())
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'a> FromParam<'a> for Position {
    type Error = PositionError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

impl UriDisplay<Path> for Position {
    fn fmt(&self, formatter: &mut rocket::http::uri::fmt::Formatter<'_, Path>) -> std::fmt::Result {
        formatter.write_value(&self.0)
    }
}

impl_from_uri_param_identity!([Path] Position);
