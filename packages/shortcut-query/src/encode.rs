//! Per-kind serializers. Each one turns a present value into at most one `token:value` unit of
//! the backend search grammar.

use std::borrow::Cow;

use crate::{
	Error, Result,
	catalog::{FilterField, ValueKind},
	params::{DateExpr, FieldValue, UserRef},
	resolver::Identity,
};

pub const NEGATION_PREFIX: &str = "!";

/// Dispatches on the field kind. `current_user` must be provided when `value` is the current-user
/// alias.
pub fn encode(
	field: &FilterField,
	value: &FieldValue,
	current_user: Option<&Identity>,
) -> Result<Option<String>> {
	match field.kind {
		ValueKind::String => encode_text(field, value).map(Some),
		ValueKind::Number => encode_number(field, value).map(Some),
		ValueKind::Enum(_) => encode_enum(field, value).map(Some),
		ValueKind::BooleanIs(label) | ValueKind::BooleanHas(label) => match value {
			FieldValue::Bool(flag) => Ok(encode_flag(field.token, label, Some(*flag))),
			other => Err(mismatch(field, other)),
		},
		ValueKind::Date => encode_date(field, value).map(Some),
		ValueKind::UserRef => match value {
			FieldValue::User(user) => encode_user(field, user, current_user).map(Some),
			FieldValue::Text(text) =>
				encode_user(field, &UserRef::literal(text.as_str()), current_user).map(Some),
			other => Err(mismatch(field, other)),
		},
	}
}

pub fn encode_text(field: &FilterField, value: &FieldValue) -> Result<String> {
	match value {
		FieldValue::Text(text) => {
			if text.trim().is_empty() {
				return Err(Error::invalid(field.key, "must be non-empty."));
			}

			Ok(format!("{}:{}", field.token, quote_value(text)))
		},
		FieldValue::Number(number) => Ok(format!("{}:{number}", field.token)),
		other => Err(mismatch(field, other)),
	}
}

pub fn encode_number(field: &FilterField, value: &FieldValue) -> Result<String> {
	let number = match value {
		FieldValue::Number(number) => *number,
		FieldValue::Text(text) => text
			.trim()
			.parse::<i64>()
			.map_err(|_| Error::invalid(field.key, format!("'{text}' is not an integer.")))?,
		other => return Err(mismatch(field, other)),
	};

	Ok(format!("{}:{number}", field.token))
}

/// Membership in the allowed set is checked upstream; the value is emitted bare.
pub fn encode_enum(field: &FilterField, value: &FieldValue) -> Result<String> {
	match value {
		FieldValue::Text(text) if !text.trim().is_empty() => Ok(format!("{}:{text}", field.token)),
		FieldValue::Text(_) => Err(Error::invalid(field.key, "must be non-empty.")),
		other => Err(mismatch(field, other)),
	}
}

/// `None` means the flag is unset and contributes nothing.
pub fn encode_flag(prefix: &str, label: &str, value: Option<bool>) -> Option<String> {
	match value? {
		true => Some(format!("{prefix}:{label}")),
		false => Some(format!("{NEGATION_PREFIX}{prefix}:{label}")),
	}
}

pub fn encode_date(field: &FilterField, value: &FieldValue) -> Result<String> {
	let expr = match value {
		FieldValue::Date(expr) => *expr,
		FieldValue::Text(text) =>
			DateExpr::parse(text).map_err(|err| Error::invalid(field.key, err.to_string()))?,
		other => return Err(mismatch(field, other)),
	};

	if let DateExpr::Range { start: None, end: None } = expr {
		return Err(Error::invalid(field.key, "date range needs at least one bound."));
	}

	Ok(format!("{}:{expr}", field.token))
}

pub fn encode_user(
	field: &FilterField,
	user: &UserRef,
	current_user: Option<&Identity>,
) -> Result<String> {
	let mention = match user {
		UserRef::CurrentUser => current_user
			.map(|identity| identity.mention_name.as_str())
			.ok_or_else(|| Error::Resolution {
				key: field.key.to_string(),
				message: "current user was not resolved.".to_string(),
			})?,
		UserRef::Literal(raw) => raw.strip_prefix('@').unwrap_or(raw),
	};

	if mention.is_empty() {
		return Err(Error::invalid(field.key, "user reference must be non-empty."));
	}
	if mention.chars().any(char::is_whitespace) {
		return Err(Error::invalid(
			field.key,
			format!("user reference '{mention}' must not contain whitespace."),
		));
	}

	Ok(format!("{}:{mention}", field.token))
}

/// Wraps the value in double quotes when it contains whitespace, `:` or `"`. Inside quotes,
/// backslashes and quotes are escaped.
pub fn quote_value(raw: &str) -> Cow<'_, str> {
	if !raw.chars().any(needs_quoting) {
		return Cow::Borrowed(raw);
	}

	let mut quoted = String::with_capacity(raw.len() + 2);

	quoted.push('"');

	for ch in raw.chars() {
		if matches!(ch, '"' | '\\') {
			quoted.push('\\');
		}

		quoted.push(ch);
	}

	quoted.push('"');

	Cow::Owned(quoted)
}

fn needs_quoting(ch: char) -> bool {
	ch.is_whitespace() || matches!(ch, ':' | '"')
}

fn mismatch(field: &FilterField, value: &FieldValue) -> Error {
	Error::invalid(
		field.key,
		format!("expected a {} value, got a {} value.", field.kind.describe(), value.describe()),
	)
}
