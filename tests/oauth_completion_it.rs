#![cfg(feature = "test")]

// crates.io
use color_eyre::{Result, eyre::eyre};
use time::macros;
// self
use plugin_registry::{
	_preludet::*,
	oauth::{
		AbandonReason, CallbackRequest, CallbackStatus, CompletionMessage, ProviderReturn,
		SessionOutcome, SessionState,
	},
};

// Replays what the identity provider does: send the popup back to `redirect_uri` with `state`.
fn provider_return_path(authorize_url: &Url, outcome: &str) -> Result<String> {
	let param = |name: &str| {
		authorize_url
			.query_pairs()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.into_owned())
			.ok_or_else(|| eyre!("authorization URL has no `{name}`"))
	};
	let mut redirect = Url::parse(&param("redirect_uri")?)?;

	redirect.query_pairs_mut().append_pair("state", &param("state")?);

	for pair in outcome.split('&') {
		if let Some((key, value)) = pair.split_once('=') {
			redirect.query_pairs_mut().append_pair(key, value);
		}
	}

	Ok(redirect[url::Position::BeforePath..].to_owned())
}

#[tokio::test]
async fn success_callback_resolves_the_waiter_exactly_once() {
	let channel = build_test_channel();
	let opener = MockOpener::default();
	let pending = channel
		.authorize(&google_api_credential(), &test_authorization_endpoint(), &opener)
		.expect("googleApi authorization should start.");
	let id = pending.session.id.clone();

	assert_eq!(pending.session.state(), SessionState::Pending);
	assert_eq!(pending.session.credential_name, "googleApi");

	let callback = format!("/oauth/success?session={}", &*id);
	let request =
		CallbackRequest::parse(channel.config(), &callback).expect("Callback route should parse.");
	let waiter = tokio::spawn(pending.waiter.wait());
	let resolution = channel
		.deliver(TEST_PLATFORM_ORIGIN, &request.message(channel.config()))
		.expect("Completion message should resolve the session.");

	assert_eq!(resolution.outcome, SessionOutcome::Succeeded);
	assert_eq!(resolution.session.state(), SessionState::Succeeded);
	assert_eq!(waiter.await.expect("Waiter task should join."), SessionOutcome::Succeeded);
	assert_eq!(channel.pending_count(), 0);

	let replay = channel
		.deliver(TEST_PLATFORM_ORIGIN, &request.message(channel.config()))
		.expect_err("A resolved session must not resolve again.");

	assert!(matches!(replay, Error::NotFound { what: "session", .. }));

	opener.last_popup().close_by_user();

	assert!(channel.sweep(OffsetDateTime::now_utc()).is_empty());
}

#[tokio::test]
async fn provider_return_follows_through_to_the_resolved_session() -> Result<()> {
	let channel = build_test_channel();
	let opener = MockOpener::default();

	for (outcome, expected) in [
		("code=4%2F0AdQt8qh&scope=drive", SessionOutcome::Succeeded),
		("error=access_denied", SessionOutcome::Failed),
	] {
		let pending =
			channel.authorize(&google_api_credential(), &test_authorization_endpoint(), &opener)?;
		let return_path = provider_return_path(&opener.last_url(), outcome)?;
		let provider_return = ProviderReturn::parse(channel.config(), &return_path)?;
		let target = provider_return.redirect_target(channel.config())?;
		let request = CallbackRequest::parse(channel.config(), target.as_str())?;

		assert_eq!(request.session.as_ref(), Some(&pending.session.id), "{outcome}");

		let waiter = tokio::spawn(pending.waiter.wait());
		let resolution = channel.deliver(TEST_PLATFORM_ORIGIN, &request.message(channel.config()))?;

		assert_eq!(resolution.outcome, expected, "{outcome}");
		assert_eq!(waiter.await?, expected, "{outcome}");
	}

	assert_eq!(channel.pending_count(), 0);

	Ok(())
}

#[tokio::test]
async fn any_other_status_fails_the_session() {
	let channel = build_test_channel();
	let opener = MockOpener::default();

	for segment in ["failure", "denied", "", "%00%FF", "SUCCESS"] {
		let pending = channel
			.authorize(&google_api_credential(), &test_authorization_endpoint(), &opener)
			.expect("Authorization should start.");
		let request = CallbackRequest::from_parts(segment, Some(&*pending.session.id))
			.expect("Callback request should build.");
		let resolution = channel
			.deliver(TEST_PLATFORM_ORIGIN, &request.message(channel.config()))
			.expect("Failure message should still resolve the session.");

		assert_eq!(resolution.outcome, SessionOutcome::Failed, "segment {segment:?}");
		assert_eq!(pending.waiter.wait().await, SessionOutcome::Failed);
		assert!(matches!(
			resolution.outcome.into_result(),
			Err(Error::AuthorizationFailed)
		));
	}
}

#[tokio::test]
async fn closed_popup_without_message_is_abandoned() {
	let channel = build_test_channel();
	let opener = MockOpener::default();
	let pending = channel
		.authorize(&google_api_credential(), &test_authorization_endpoint(), &opener)
		.expect("Authorization should start.");

	assert!(channel.sweep(OffsetDateTime::now_utc()).is_empty());

	opener.last_popup().close_by_user();

	let resolved = channel.sweep(OffsetDateTime::now_utc());

	assert_eq!(resolved.len(), 1);
	assert_eq!(resolved[0].outcome, SessionOutcome::Abandoned(AbandonReason::WindowClosed));

	let outcome = pending.waiter.wait().await;

	assert!(matches!(
		outcome.into_result(),
		Err(Error::AuthorizationAbandoned { reason: AbandonReason::WindowClosed })
	));

	let late = CompletionMessage::new(pending.session.id.clone(), CallbackStatus::Success);

	assert!(channel.deliver(TEST_PLATFORM_ORIGIN, &late).is_err());
}

#[tokio::test]
async fn concurrent_sessions_are_not_cross_resolved() {
	let channel = build_test_channel();
	let opener = MockOpener::default();
	let first = channel
		.authorize(&google_api_credential(), &test_authorization_endpoint(), &opener)
		.expect("First authorization should start.");
	let second = channel
		.authorize(&google_api_credential(), &test_authorization_endpoint(), &opener)
		.expect("Second authorization should start.");

	assert_ne!(first.session.id, second.session.id);

	let ambiguous = channel
		.deliver(TEST_PLATFORM_ORIGIN, &CompletionMessage::unscoped(CallbackStatus::Success))
		.expect_err("Unscoped messages cannot pick between two sessions.");

	assert!(matches!(ambiguous, Error::AmbiguousCompletion { pending: 2 }));

	channel
		.deliver(
			TEST_PLATFORM_ORIGIN,
			&CompletionMessage::new(second.session.id.clone(), CallbackStatus::Failure),
		)
		.expect("Second session should resolve.");

	assert_eq!(first.waiter.try_outcome(), None);
	assert_eq!(second.waiter.wait().await, SessionOutcome::Failed);
	assert_eq!(
		channel.session(&first.session.id).map(|session| session.state()),
		Some(SessionState::Pending)
	);

	let resolution = channel
		.deliver(TEST_PLATFORM_ORIGIN, &CompletionMessage::unscoped(CallbackStatus::Success))
		.expect("The only pending session should take the unscoped message.");

	assert_eq!(resolution.session.id, first.session.id);
	assert_eq!(first.waiter.wait().await, SessionOutcome::Succeeded);
}

#[tokio::test]
async fn untrusted_origins_and_foreign_messages_change_nothing() {
	let channel = build_test_channel();
	let opener = MockOpener::default();
	let pending = channel
		.authorize(&google_api_credential(), &test_authorization_endpoint(), &opener)
		.expect("Authorization should start.");
	let message = CompletionMessage::new(pending.session.id.clone(), CallbackStatus::Success);

	for origin in ["https://evil.example.com", "http://app.example.com", "null"] {
		let err = channel.deliver(origin, &message).expect_err("Foreign origins must be rejected.");

		assert!(matches!(err, Error::UntrustedOrigin { .. }));
	}

	let mut foreign = message.clone();

	foreign.message_type = "somethingElse".into();

	assert!(matches!(
		channel.deliver(TEST_PLATFORM_ORIGIN, &foreign),
		Err(Error::UnexpectedMessage { .. })
	));
	assert_eq!(channel.pending_count(), 1);
	assert_eq!(pending.waiter.try_outcome(), None);
}

#[test]
fn pending_sessions_time_out_and_close_their_popup() {
	let channel = build_test_channel();
	let opener = MockOpener::default();
	let created = macros::datetime!(2025-11-10 12:00 UTC);
	let pending = channel
		.authorize_at(&google_api_credential(), &test_authorization_endpoint(), &opener, created)
		.expect("Authorization should start.");

	assert!(channel.sweep(created + Duration::minutes(9)).is_empty());

	let resolved = channel.sweep(created + Duration::minutes(10));

	assert_eq!(resolved.len(), 1);
	assert_eq!(resolved[0].outcome, SessionOutcome::Abandoned(AbandonReason::TimedOut));
	assert_eq!(pending.waiter.try_outcome(), resolved.first().map(|r| r.outcome));
	assert_eq!(opener.last_popup().close_calls(), 1);
}

#[test]
fn blocked_popups_fail_fast() {
	let channel = build_test_channel();
	let err = channel
		.authorize(&google_api_credential(), &test_authorization_endpoint(), &MockOpener::blocked())
		.expect_err("Blocked popups must fail.");

	assert!(matches!(err, Error::PopupBlocked));
	assert_eq!(channel.pending_count(), 0);
}
