use std::{collections::HashMap, sync::LazyLock};

use crate::{Error, Result};

pub const STORY_TYPES: &[&str] = &["feature", "bug", "chore"];
pub const EPIC_STATES: &[&str] = &["unstarted", "started", "done"];

static STORIES: LazyLock<Catalog> = LazyLock::new(|| Catalog::new(story_fields()));
static EPICS: LazyLock<Catalog> = LazyLock::new(|| Catalog::new(epic_fields()));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
	String,
	Number,
	Enum(&'static [&'static str]),
	BooleanIs(&'static str),
	BooleanHas(&'static str),
	Date,
	UserRef,
}
impl ValueKind {
	pub fn describe(&self) -> &'static str {
		match self {
			Self::String => "string",
			Self::Number => "number",
			Self::Enum(_) => "enum",
			Self::BooleanIs(_) | Self::BooleanHas(_) => "boolean",
			Self::Date => "date",
			Self::UserRef => "user",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterField {
	pub key: &'static str,
	pub token: &'static str,
	pub kind: ValueKind,
}
impl FilterField {
	pub const fn new(key: &'static str, token: &'static str, kind: ValueKind) -> Self {
		Self { key, token, kind }
	}

	pub const fn text(key: &'static str, token: &'static str) -> Self {
		Self::new(key, token, ValueKind::String)
	}

	pub const fn number(key: &'static str, token: &'static str) -> Self {
		Self::new(key, token, ValueKind::Number)
	}

	pub const fn one_of(
		key: &'static str,
		token: &'static str,
		allowed: &'static [&'static str],
	) -> Self {
		Self::new(key, token, ValueKind::Enum(allowed))
	}

	pub const fn is(key: &'static str, label: &'static str) -> Self {
		Self::new(key, "is", ValueKind::BooleanIs(label))
	}

	pub const fn has(key: &'static str, label: &'static str) -> Self {
		Self::new(key, "has", ValueKind::BooleanHas(label))
	}

	pub const fn date(key: &'static str, token: &'static str) -> Self {
		Self::new(key, token, ValueKind::Date)
	}

	pub const fn user(key: &'static str, token: &'static str) -> Self {
		Self::new(key, token, ValueKind::UserRef)
	}
}

/// Immutable filter registry. Iteration follows declaration order, which is also the order
/// tokens appear in a compiled query.
#[derive(Debug)]
pub struct Catalog {
	fields: Vec<FilterField>,
	index: HashMap<&'static str, usize>,
}
impl Catalog {
	/// Later duplicates of a key are dropped so each key maps to exactly one entry.
	pub fn new(fields: Vec<FilterField>) -> Self {
		let mut index = HashMap::with_capacity(fields.len());
		let mut unique = Vec::with_capacity(fields.len());

		for field in fields {
			if index.contains_key(field.key) {
				tracing::warn!(key = field.key, "Duplicate filter field ignored.");

				continue;
			}

			index.insert(field.key, unique.len());
			unique.push(field);
		}

		Self { fields: unique, index }
	}

	pub fn stories() -> &'static Self {
		&STORIES
	}

	pub fn epics() -> &'static Self {
		&EPICS
	}

	pub fn lookup(&self, key: &str) -> Result<&FilterField> {
		self.index
			.get(key)
			.map(|position| &self.fields[*position])
			.ok_or_else(|| Error::UnknownField { key: key.to_string() })
	}

	pub fn fields(&self) -> impl Iterator<Item = &FilterField> {
		self.fields.iter()
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}

fn story_fields() -> Vec<FilterField> {
	vec![
		FilterField::number("id", "id"),
		FilterField::text("name", "name"),
		FilterField::text("description", "description"),
		FilterField::text("comment", "comment"),
		FilterField::one_of("type", "type", STORY_TYPES),
		FilterField::number("estimate", "estimate"),
		FilterField::text("branch", "branch"),
		FilterField::text("commit", "commit"),
		FilterField::number("pr", "pr"),
		FilterField::number("project", "project"),
		FilterField::text("epic", "epic"),
		FilterField::text("objective", "objective"),
		FilterField::text("state", "state"),
		FilterField::text("label", "label"),
		FilterField::user("owner", "owner"),
		FilterField::user("requester", "requester"),
		FilterField::text("team", "team"),
		FilterField::text("skillSet", "skill-set"),
		FilterField::text("productArea", "product-area"),
		FilterField::text("technicalArea", "technical-area"),
		FilterField::text("priority", "priority"),
		FilterField::text("severity", "severity"),
		FilterField::is("isUnstarted", "unstarted"),
		FilterField::is("isStarted", "started"),
		FilterField::is("isDone", "done"),
		FilterField::is("isArchived", "archived"),
		FilterField::is("isOverdue", "overdue"),
		FilterField::is("isUnestimated", "unestimated"),
		FilterField::is("isBlocker", "blocker"),
		FilterField::is("isBlocked", "blocked"),
		FilterField::has("hasOwner", "owner"),
		FilterField::has("hasComment", "comment"),
		FilterField::has("hasLabel", "label"),
		FilterField::has("hasDeadline", "deadline"),
		FilterField::has("hasTask", "task"),
		FilterField::has("hasEpic", "epic"),
		FilterField::has("hasBranch", "branch"),
		FilterField::has("hasCommit", "commit"),
		FilterField::has("hasPr", "pr"),
		FilterField::has("hasAttachment", "attachment"),
		FilterField::date("created", "created"),
		FilterField::date("updated", "updated"),
		FilterField::date("completed", "completed"),
		FilterField::date("due", "due"),
	]
}

fn epic_fields() -> Vec<FilterField> {
	vec![
		FilterField::number("id", "id"),
		FilterField::text("name", "name"),
		FilterField::text("description", "description"),
		FilterField::one_of("state", "state", EPIC_STATES),
		FilterField::text("objective", "objective"),
		FilterField::user("owner", "owner"),
		FilterField::user("requester", "requester"),
		FilterField::text("team", "team"),
		FilterField::text("comment", "comment"),
		FilterField::is("isUnstarted", "unstarted"),
		FilterField::is("isStarted", "started"),
		FilterField::is("isDone", "done"),
		FilterField::is("isArchived", "archived"),
		FilterField::is("isOverdue", "overdue"),
		FilterField::has("hasOwner", "owner"),
		FilterField::has("hasComment", "comment"),
		FilterField::has("hasDeadline", "deadline"),
		FilterField::has("hasLabel", "label"),
		FilterField::date("created", "created"),
		FilterField::date("updated", "updated"),
		FilterField::date("completed", "completed"),
		FilterField::date("due", "due"),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lookup_rejects_unregistered_keys() {
		let err = Catalog::stories().lookup("assignee").expect_err("Expected lookup miss.");

		assert!(matches!(err, Error::UnknownField { ref key } if key == "assignee"));
	}

	#[test]
	fn duplicate_keys_keep_the_first_entry() {
		let catalog =
			Catalog::new(vec![FilterField::text("name", "name"), FilterField::text("name", "title")]);

		assert_eq!(catalog.len(), 1);
		assert_eq!(catalog.lookup("name").expect("Missing name field.").token, "name");
	}

	#[test]
	fn epic_state_is_an_enum() {
		let field = Catalog::epics().lookup("state").expect("Missing state field.");

		assert_eq!(field.kind, ValueKind::Enum(EPIC_STATES));
	}
}
