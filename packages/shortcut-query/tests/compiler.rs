use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use shortcut_query::{
	BoxFuture, CancellationToken, Catalog, Compiler, Error, FieldValue, FilterField, Identity,
	QueryParams, ResolveError, UserRef, UserResolver,
};

struct SpyResolver {
	calls: Arc<AtomicUsize>,
	mention_name: &'static str,
}
impl SpyResolver {
	fn new(mention_name: &'static str) -> Self {
		Self { calls: Arc::new(AtomicUsize::new(0)), mention_name }
	}

	fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl UserResolver for SpyResolver {
	fn resolve_current_user(&self) -> BoxFuture<'_, Result<Identity, ResolveError>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let identity = Identity {
			id: "6410fa00-0000-4000-8000-000000000001".to_string(),
			mention_name: self.mention_name.to_string(),
		};

		Box::pin(async move { Ok(identity) })
	}
}

struct FailingResolver;
impl UserResolver for FailingResolver {
	fn resolve_current_user(&self) -> BoxFuture<'_, Result<Identity, ResolveError>> {
		Box::pin(async { Err(ResolveError::new("no authenticated session.")) })
	}
}

struct PendingResolver;
impl UserResolver for PendingResolver {
	fn resolve_current_user(&self) -> BoxFuture<'_, Result<Identity, ResolveError>> {
		Box::pin(std::future::pending())
	}
}

async fn compile_stories(params: &QueryParams) -> shortcut_query::Result<String> {
	let resolver = SpyResolver::new("amcd");

	Compiler::new(Catalog::stories(), &resolver).compile(params, &CancellationToken::new()).await
}

#[tokio::test]
async fn empty_params_compile_to_empty_string() {
	let query = compile_stories(&QueryParams::new()).await.expect("Failed to compile.");

	assert_eq!(query, "");
}

#[tokio::test]
async fn boolean_flags_are_tri_state() {
	let positive = QueryParams::new().with("isDone", true);
	let negative = QueryParams::new().with("isDone", false);
	let unset = QueryParams::new().with_optional::<bool>("isDone", None).with("name", "bug");

	assert_eq!(compile_stories(&positive).await.expect("Failed to compile."), "is:done");
	assert_eq!(compile_stories(&negative).await.expect("Failed to compile."), "!is:done");

	let query = compile_stories(&unset).await.expect("Failed to compile.");

	assert_eq!(query, "name:bug");
	assert!(!query.contains("done"), "Unset flag leaked into query: {query}");
}

#[tokio::test]
async fn has_flags_negate_with_bang() {
	let params = QueryParams::new().with("hasOwner", false).with("hasEpic", true);
	let query = compile_stories(&params).await.expect("Failed to compile.");

	assert_eq!(query, "!has:owner has:epic");
}

#[tokio::test]
async fn date_ranges_keep_open_bounds() {
	let closed = QueryParams::new().with("created", "2024-03-01..2024-03-31");
	let open_end = QueryParams::new().with("created", "2024-03-01..");
	let open_start = QueryParams::new().with("due", "..2024-03-31");
	let single = QueryParams::new().with("updated", "2024-03-15");

	assert_eq!(
		compile_stories(&closed).await.expect("Failed to compile."),
		"created:2024-03-01..2024-03-31"
	);
	assert_eq!(compile_stories(&open_end).await.expect("Failed to compile."), "created:2024-03-01..");
	assert_eq!(compile_stories(&open_start).await.expect("Failed to compile."), "due:..2024-03-31");
	assert_eq!(compile_stories(&single).await.expect("Failed to compile."), "updated:2024-03-15");
}

#[tokio::test]
async fn current_user_alias_resolves_once_per_call() {
	let resolver = SpyResolver::new("amcd");
	let compiler = Compiler::new(Catalog::stories(), &resolver);
	let params = QueryParams::new()
		.with("requester", UserRef::CurrentUser)
		.with("owner", UserRef::CurrentUser);
	let query =
		compiler.compile(&params, &CancellationToken::new()).await.expect("Failed to compile.");

	assert_eq!(query, "owner:amcd requester:amcd");
	assert_eq!(resolver.count(), 1);
}

#[tokio::test]
async fn each_call_resolves_again() {
	let resolver = SpyResolver::new("amcd");
	let compiler = Compiler::new(Catalog::stories(), &resolver);
	let params = QueryParams::new().with("owner", UserRef::CurrentUser);
	let cancel = CancellationToken::new();

	compiler.compile(&params, &cancel).await.expect("Failed to compile.");
	compiler.compile(&params, &cancel).await.expect("Failed to compile.");

	assert_eq!(resolver.count(), 2);
}

#[tokio::test]
async fn literal_users_skip_the_resolver() {
	let resolver = SpyResolver::new("amcd");
	let compiler = Compiler::new(Catalog::stories(), &resolver);
	let params = QueryParams::new().with("owner", UserRef::literal("@jdoe"));
	let query =
		compiler.compile(&params, &CancellationToken::new()).await.expect("Failed to compile.");

	assert_eq!(query, "owner:jdoe");
	assert_eq!(resolver.count(), 0);
}

#[tokio::test]
async fn values_are_quoted_only_when_needed() {
	let spaced = QueryParams::new().with("name", "release notes");
	let bare = QueryParams::new().with("name", "bug");

	assert_eq!(
		compile_stories(&spaced).await.expect("Failed to compile."),
		"name:\"release notes\""
	);
	assert_eq!(compile_stories(&bare).await.expect("Failed to compile."), "name:bug");
}

#[tokio::test]
async fn output_follows_catalog_order() {
	let forward = QueryParams::new()
		.with("id", 42_i64)
		.with("type", "bug")
		.with("owner", UserRef::literal("jdoe"))
		.with("isDone", false)
		.with("created", "2024-01-01..");
	let reverse = QueryParams::new()
		.with("created", "2024-01-01..")
		.with("isDone", false)
		.with("owner", UserRef::literal("jdoe"))
		.with("type", "bug")
		.with("id", 42_i64);
	let first = compile_stories(&forward).await.expect("Failed to compile.");
	let second = compile_stories(&reverse).await.expect("Failed to compile.");

	assert_eq!(first, "id:42 type:bug owner:jdoe !is:done created:2024-01-01..");
	assert_eq!(first, second);
	assert_eq!(first, compile_stories(&forward).await.expect("Failed to compile."));
}

#[tokio::test]
async fn multi_word_fields_use_hyphenated_tokens() {
	let params = QueryParams::new().with("skillSet", "Rust").with("technicalArea", "Search API");
	let query = compile_stories(&params).await.expect("Failed to compile.");

	assert_eq!(query, "skill-set:Rust technical-area:\"Search API\"");
}

#[tokio::test]
async fn resolver_failure_aborts_compilation() {
	let params = QueryParams::new().with("name", "bug").with("owner", UserRef::CurrentUser);
	let err = Compiler::new(Catalog::stories(), &FailingResolver)
		.compile(&params, &CancellationToken::new())
		.await
		.expect_err("Expected resolution error.");

	assert!(matches!(err, Error::Resolution { ref key, .. } if key == "owner"), "Unexpected: {err}");
}

#[tokio::test]
async fn cancellation_during_resolution_fails_the_call() {
	let cancel = CancellationToken::new();
	let params = QueryParams::new().with("owner", UserRef::CurrentUser);
	let compiler = Compiler::new(Catalog::stories(), &PendingResolver);
	let trigger = cancel.clone();
	let (result, ()) = tokio::join!(compiler.compile(&params, &cancel), async move {
		tokio::task::yield_now().await;
		trigger.cancel();
	});
	let err = result.expect_err("Expected cancellation error.");

	assert!(matches!(err, Error::Cancelled { ref key } if key == "owner"), "Unexpected: {err}");
}

#[tokio::test]
async fn malformed_dates_abort_compilation() {
	let params = QueryParams::new().with("name", "bug").with("created", "March 1st");
	let err = compile_stories(&params).await.expect_err("Expected invalid date.");

	assert!(matches!(err, Error::InvalidValue { ref key, .. } if key == "created"));
}

#[tokio::test]
async fn blank_text_values_are_rejected() {
	let params = QueryParams::new().with("name", "   ");
	let err = compile_stories(&params).await.expect_err("Expected blank text rejection.");

	assert!(matches!(err, Error::InvalidValue { ref key, .. } if key == "name"), "Unexpected: {err}");
}

#[tokio::test]
async fn non_integer_numbers_are_rejected() {
	let params = QueryParams::new().with("id", "abc");
	let err = compile_stories(&params).await.expect_err("Expected integer rejection.");

	assert!(matches!(err, Error::InvalidValue { ref key, .. } if key == "id"), "Unexpected: {err}");
	assert!(err.to_string().contains("'abc' is not an integer."), "Unexpected: {err}");
}

#[tokio::test]
async fn text_user_values_are_literal_mentions() {
	let resolver = SpyResolver::new("amcd");
	let params = QueryParams::new().with("owner", "@jdoe").with("requester", "me");
	let query = Compiler::new(Catalog::stories(), &resolver)
		.compile(&params, &CancellationToken::new())
		.await
		.expect("Failed to compile.");

	assert_eq!(query, "owner:jdoe requester:me");
	assert_eq!(resolver.count(), 0);
}

#[tokio::test]
async fn unknown_keys_are_rejected() {
	let params = QueryParams::new().with("assignee", "jdoe");
	let err = compile_stories(&params).await.expect_err("Expected unknown field.");

	assert!(matches!(err, Error::UnknownField { ref key } if key == "assignee"));
}

#[tokio::test]
async fn fabricated_catalogs_drive_compilation() {
	let catalog = Catalog::new(vec![
		FilterField::is("isReady", "ready"),
		FilterField::text("title", "title"),
	]);
	let resolver = SpyResolver::new("amcd");
	let params = QueryParams::new().with("title", "a:b").with("isReady", true);
	let query = Compiler::new(&catalog, &resolver)
		.compile(&params, &CancellationToken::new())
		.await
		.expect("Failed to compile.");

	assert_eq!(query, "is:ready title:\"a:b\"");
}

#[tokio::test]
async fn compiled_tokens_display_as_query() {
	let resolver = SpyResolver::new("amcd");
	let params = QueryParams::new().with("estimate", FieldValue::Number(3)).with("isBlocked", true);
	let compiled = Compiler::new(Catalog::stories(), &resolver)
		.compile_tokens(&params, &CancellationToken::new())
		.await
		.expect("Failed to compile.");

	assert_eq!(compiled.tokens(), ["estimate:3", "is:blocked"]);
	assert_eq!(compiled.to_string(), "estimate:3 is:blocked");
}
