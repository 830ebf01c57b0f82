use std::{
	collections::BTreeMap,
	fmt::{Display, Formatter},
};

use serde_json::{Map, Value};
use time::{Date, macros::format_description};

use crate::{
	Error, Result,
	catalog::{Catalog, ValueKind},
};

pub const CURRENT_USER_ALIAS: &str = "me";
pub const RANGE_SEPARATOR: &str = "..";

const OPEN_BOUND: &str = "*";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DateParseError {
	message: String,
}
impl DateParseError {
	fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserRef {
	Literal(String),
	CurrentUser,
}
impl UserRef {
	pub fn literal(value: impl Into<String>) -> Self {
		Self::Literal(value.into())
	}

	/// Maps raw tool input onto a reference. This is the only place the alias text is inspected.
	pub fn from_input(raw: &str) -> Self {
		let trimmed = raw.trim();

		if trimmed.eq_ignore_ascii_case(CURRENT_USER_ALIAS) {
			Self::CurrentUser
		} else {
			Self::Literal(trimmed.to_string())
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateBound {
	Day(Date),
	Today,
	Yesterday,
	Tomorrow,
}
impl DateBound {
	pub fn parse(raw: &str) -> Result<Self, DateParseError> {
		match raw {
			"today" => return Ok(Self::Today),
			"yesterday" => return Ok(Self::Yesterday),
			"tomorrow" => return Ok(Self::Tomorrow),
			_ => {},
		}

		let bytes = raw.as_bytes();

		if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
			return Err(DateParseError::new(format!(
				"'{raw}' is not a YYYY-MM-DD date or one of today, yesterday, tomorrow."
			)));
		}

		Date::parse(raw, format_description!("[year]-[month]-[day]"))
			.map(Self::Day)
			.map_err(|err| DateParseError::new(format!("'{raw}' is not a valid date: {err}.")))
	}
}
impl Display for DateBound {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Day(date) =>
				write!(f, "{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day()),
			Self::Today => f.write_str("today"),
			Self::Yesterday => f.write_str("yesterday"),
			Self::Tomorrow => f.write_str("tomorrow"),
		}
	}
}

/// A single day or a `START..END` range where either bound may be omitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateExpr {
	On(DateBound),
	Range { start: Option<DateBound>, end: Option<DateBound> },
}
impl DateExpr {
	pub fn between(start: Option<Date>, end: Option<Date>) -> Self {
		Self::Range { start: start.map(DateBound::Day), end: end.map(DateBound::Day) }
	}

	pub fn parse(raw: &str) -> Result<Self, DateParseError> {
		let trimmed = raw.trim();

		if trimmed.is_empty() {
			return Err(DateParseError::new("date must be non-empty."));
		}

		let Some((start, end)) = trimmed.split_once(RANGE_SEPARATOR) else {
			return DateBound::parse(trimmed).map(Self::On);
		};

		if end.contains(RANGE_SEPARATOR) {
			return Err(DateParseError::new(format!(
				"'{trimmed}' contains more than one range separator."
			)));
		}

		let start = parse_open_bound(start)?;
		let end = parse_open_bound(end)?;

		if start.is_none() && end.is_none() {
			return Err(DateParseError::new("date range needs at least one bound."));
		}

		Ok(Self::Range { start, end })
	}
}
impl Display for DateExpr {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::On(bound) => bound.fmt(f),
			Self::Range { start, end } => {
				if let Some(start) = start {
					start.fmt(f)?;
				}

				f.write_str(RANGE_SEPARATOR)?;

				if let Some(end) = end {
					end.fmt(f)?;
				}

				Ok(())
			},
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
	Text(String),
	Number(i64),
	Bool(bool),
	Date(DateExpr),
	User(UserRef),
}
impl FieldValue {
	pub fn describe(&self) -> &'static str {
		match self {
			Self::Text(_) => "string",
			Self::Number(_) => "number",
			Self::Bool(_) => "boolean",
			Self::Date(_) => "date",
			Self::User(_) => "user",
		}
	}
}
impl From<&str> for FieldValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}
impl From<String> for FieldValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<i64> for FieldValue {
	fn from(value: i64) -> Self {
		Self::Number(value)
	}
}
impl From<bool> for FieldValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<DateExpr> for FieldValue {
	fn from(value: DateExpr) -> Self {
		Self::Date(value)
	}
}
impl From<UserRef> for FieldValue {
	fn from(value: UserRef) -> Self {
		Self::User(value)
	}
}

/// Filter values keyed by catalog key. Keys without a value carry no filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
	values: BTreeMap<String, FieldValue>,
}
impl QueryParams {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
		self.values.insert(key.to_string(), value.into());

		self
	}

	pub fn with_optional<V>(self, key: &str, value: Option<V>) -> Self
	where
		V: Into<FieldValue>,
	{
		match value {
			Some(value) => self.with(key, value),
			None => self,
		}
	}

	pub fn get(&self, key: &str) -> Option<&FieldValue> {
		self.values.get(key)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.values.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Validates raw tool arguments against `catalog` and converts them into typed values.
	/// JSON `null` is treated as absent.
	pub fn from_json(catalog: &Catalog, raw: &Map<String, Value>) -> Result<Self> {
		let mut params = Self::new();

		for (key, value) in raw {
			let field = catalog.lookup(key)?;

			if value.is_null() {
				continue;
			}

			let parsed = match field.kind {
				ValueKind::String => FieldValue::Text(json_text(key, value)?),
				ValueKind::Number => FieldValue::Number(json_number(key, value)?),
				ValueKind::Enum(allowed) => {
					let text = json_string(key, value)?;

					if !allowed.contains(&text.as_str()) {
						return Err(Error::invalid(
							key,
							format!("must be one of {}.", allowed.join(", ")),
						));
					}

					FieldValue::Text(text)
				},
				ValueKind::BooleanIs(_) | ValueKind::BooleanHas(_) => FieldValue::Bool(
					value.as_bool().ok_or_else(|| Error::invalid(key, "must be a boolean."))?,
				),
				ValueKind::Date => {
					let text = json_string(key, value)?;
					let expr =
						DateExpr::parse(&text).map_err(|err| Error::invalid(key, err.to_string()))?;

					FieldValue::Date(expr)
				},
				ValueKind::UserRef => FieldValue::User(UserRef::from_input(&json_string(key, value)?)),
			};

			params.values.insert(key.clone(), parsed);
		}

		Ok(params)
	}
}

fn parse_open_bound(raw: &str) -> Result<Option<DateBound>, DateParseError> {
	let trimmed = raw.trim();

	if trimmed.is_empty() || trimmed == OPEN_BOUND {
		return Ok(None);
	}

	DateBound::parse(trimmed).map(Some)
}

fn json_string(key: &str, value: &Value) -> Result<String> {
	let text = value.as_str().ok_or_else(|| Error::invalid(key, "must be a string."))?.trim();

	if text.is_empty() {
		return Err(Error::invalid(key, "must be non-empty."));
	}

	Ok(text.to_string())
}

fn json_text(key: &str, value: &Value) -> Result<String> {
	match value {
		Value::Number(number) => Ok(number.to_string()),
		other => json_string(key, other),
	}
}

fn json_number(key: &str, value: &Value) -> Result<i64> {
	match value {
		Value::Number(number) =>
			number.as_i64().ok_or_else(|| Error::invalid(key, "must be an integer.")),
		Value::String(text) =>
			text.trim().parse().map_err(|_| Error::invalid(key, "must be an integer.")),
		_ => Err(Error::invalid(key, "must be an integer.")),
	}
}
