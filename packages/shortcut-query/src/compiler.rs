use std::fmt::{Display, Formatter};

use tokio_util::sync::CancellationToken;

use crate::{
	Result,
	catalog::{Catalog, ValueKind},
	encode,
	params::{FieldValue, QueryParams, UserRef},
	resolver::{CurrentUserMemo, UserResolver},
};

/// Tokens in catalog order. Joined with single spaces they form the backend query string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledQuery {
	tokens: Vec<String>,
}
impl CompiledQuery {
	pub fn tokens(&self) -> &[String] {
		&self.tokens
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	pub fn into_query(self) -> String {
		self.tokens.join(" ")
	}
}
impl Display for CompiledQuery {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		for (idx, token) in self.tokens.iter().enumerate() {
			if idx > 0 {
				f.write_str(" ")?;
			}

			f.write_str(token)?;
		}

		Ok(())
	}
}

#[derive(Clone, Copy)]
pub struct Compiler<'a> {
	catalog: &'a Catalog,
	resolver: &'a dyn UserResolver,
}
impl<'a> Compiler<'a> {
	pub fn new(catalog: &'a Catalog, resolver: &'a dyn UserResolver) -> Self {
		Self { catalog, resolver }
	}

	pub async fn compile(&self, params: &QueryParams, cancel: &CancellationToken) -> Result<String> {
		self.compile_tokens(params, cancel).await.map(CompiledQuery::into_query)
	}

	/// Either every present field is encoded or the first failure is returned; no partial
	/// query escapes. The current-user alias is resolved at most once per call.
	pub async fn compile_tokens(
		&self,
		params: &QueryParams,
		cancel: &CancellationToken,
	) -> Result<CompiledQuery> {
		for key in params.keys() {
			self.catalog.lookup(key)?;
		}

		let mut memo = CurrentUserMemo::new(self.resolver, cancel);
		let mut tokens = Vec::with_capacity(params.len());

		for field in self.catalog.fields() {
			let Some(value) = params.get(field.key) else {
				continue;
			};
			let token = match (field.kind, value) {
				(ValueKind::UserRef, FieldValue::User(UserRef::CurrentUser)) => {
					let identity = memo.get(field.key).await?;

					encode::encode(field, value, Some(identity))?
				},
				_ => encode::encode(field, value, None)?,
			};

			if let Some(token) = token {
				tokens.push(token);
			}
		}

		tracing::debug!(fields = params.len(), tokens = tokens.len(), "Compiled search query.");

		Ok(CompiledQuery { tokens })
	}
}
