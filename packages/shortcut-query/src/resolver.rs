use std::{future::Future, pin::Pin};

use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
	pub id: String,
	pub mention_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ResolveError {
	pub message: String,
}
impl ResolveError {
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}

/// Resolves the acting member behind the current session.
pub trait UserResolver
where
	Self: Send + Sync,
{
	fn resolve_current_user(&self) -> BoxFuture<'_, Result<Identity, ResolveError>>;
}

/// Holds the resolved identity for the lifetime of one compile call.
pub(crate) struct CurrentUserMemo<'a> {
	resolver: &'a dyn UserResolver,
	cancel: &'a CancellationToken,
	resolved: Option<Identity>,
}
impl<'a> CurrentUserMemo<'a> {
	pub(crate) fn new(resolver: &'a dyn UserResolver, cancel: &'a CancellationToken) -> Self {
		Self { resolver, cancel, resolved: None }
	}

	pub(crate) async fn get(&mut self, key: &str) -> Result<&Identity> {
		let identity = match self.resolved.take() {
			Some(identity) => identity,
			None => {
				let identity = tokio::select! {
					biased;
					_ = self.cancel.cancelled() => {
						return Err(Error::Cancelled { key: key.to_string() });
					},
					resolved = self.resolver.resolve_current_user() => resolved.map_err(|err| {
						Error::Resolution { key: key.to_string(), message: err.message }
					})?,
				};

				tracing::debug!(field = key, member_id = %identity.id, "Resolved current user alias.");

				identity
			},
		};

		Ok(self.resolved.insert(identity))
	}
}
