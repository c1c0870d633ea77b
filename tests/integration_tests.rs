// Integration tests for the matchmaking engine workflows

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use matchmaking_core::config::DiscoverySettings;
use matchmaking_core::core::PolicyLimits;
use matchmaking_core::error::{ConflictReason, EngineError, StoreError};
use matchmaking_core::models::{
    AccountStatus, Actor, AnswerProposalRequest, AuditAction, CreateProposalRequest,
    DiscoveryRequest, Interest, InterestResponse, InterestStatus, Match, NotificationKind,
    ProfileDetails, ProposalStatus, RespondToInterestRequest, SendMessageRequest, User, UserRole,
    Visibility,
};
use matchmaking_core::ports::{InterestStore, StoreResult, UserStore};
use uuid::Uuid;
use matchmaking_core::services::{
    ChannelNotificationSink, Engine, HttpEmailClient, InMemoryStore, Stores,
};

struct Harness {
    store: Arc<InMemoryStore>,
    sink: Arc<ChannelNotificationSink>,
    engine: Engine,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let sink = Arc::new(ChannelNotificationSink::new(16));
    let engine = Engine::new(Stores::from_backend(store.clone()), sink.clone());
    Harness { store, sink, engine }
}

/// 45%: identity fields only
fn core_details() -> ProfileDetails {
    ProfileDetails {
        gender: Some("female".to_string()),
        date_of_birth: NaiveDate::from_ymd_opt(1995, 5, 10).unwrap(),
        bio: "Software engineer who loves trekking and classical music".to_string(),
        location: "Pune".to_string(),
        photo_url: Some("https://cdn.example.com/p/1.jpg".to_string()),
        religion: Some("Hindu".to_string()),
        mother_tongue: Some("Marathi".to_string()),
        ..Default::default()
    }
}

/// Exactly at the readiness threshold
fn ready_details() -> ProfileDetails {
    ProfileDetails {
        height_cm: Some(165),
        caste: Some("Any".to_string()),
        job_status: Some("Employed".to_string()),
        marital_status: Some("Never married".to_string()),
        diet: Some("Vegetarian".to_string()),
        smoking: Some("No".to_string()),
        drinking: Some("No".to_string()),
        father_occupation: Some("Teacher".to_string()),
        mother_occupation: Some("Doctor".to_string()),
        ..core_details()
    }
}

/// 78.75 before rounding
fn almost_ready_details() -> ProfileDetails {
    ProfileDetails {
        mother_occupation: None,
        education: Some("B.Tech".to_string()),
        profession: Some("Engineer".to_string()),
        income_range: Some("10-20 LPA".to_string()),
        ..ready_details()
    }
}

async fn member(h: &Harness, id: &str, details: Option<ProfileDetails>) -> Actor {
    h.store
        .insert_user(User::new(id, format!("User {}", id), format!("{}@example.com", id), UserRole::Member))
        .await;
    if let Some(details) = details {
        h.engine
            .create_profile(id, details, Visibility::Public)
            .await
            .unwrap();
    }
    Actor::member(id)
}

fn accept(interest_id: Uuid) -> RespondToInterestRequest {
    RespondToInterestRequest {
        interest_id,
        action: InterestResponse::Accepted,
    }
}

#[tokio::test]
async fn test_interest_gate_at_eighty_percent() {
    let h = harness();
    let almost = member(&h, "almost", Some(almost_ready_details())).await;
    let ready = member(&h, "ready", Some(ready_details())).await;
    member(&h, "target", None).await;

    let report = h.engine.completion_report("almost").await.unwrap();
    assert_eq!(report.percentage, 79);
    assert!(!report.ready_for_interactions);

    let err = h.engine.send_interest(&almost, "target").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::ProfileIncomplete { completion: 79, required: 80 }
    ));

    assert_eq!(h.engine.completion_report("ready").await.unwrap().percentage, 80);
    let outcome = h.engine.send_interest(&ready, "target").await.unwrap();
    assert_eq!(outcome.interest.status(), InterestStatus::Pending);
}

#[tokio::test]
async fn test_interest_requires_profile_and_known_receiver() {
    let h = harness();
    let bare = member(&h, "bare", None).await;
    let ready = member(&h, "ready", Some(ready_details())).await;

    let err = h.engine.send_interest(&bare, "ready").await.unwrap_err();
    assert!(matches!(err, EngineError::ProfileRequired));

    let err = h.engine.send_interest(&ready, "ghost").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound { entity: "User", .. }));

    let err = h.engine.send_interest(&ready, "ready").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn test_daily_interest_quota() {
    let h = harness();
    let sender = member(&h, "sender", Some(ready_details())).await;
    for i in 0..6 {
        member(&h, &format!("r{}", i), None).await;
    }

    for i in 0..5 {
        h.engine
            .send_interest(&sender, &format!("r{}", i))
            .await
            .unwrap();
    }

    let err = h.engine.send_interest(&sender, "r5").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::RateLimited { action: "interests", limit: 5, window: "day" }
    ));
}

#[tokio::test]
async fn test_guardian_cannot_initiate() {
    let h = harness();
    member(&h, "ward", Some(ready_details())).await;
    member(&h, "other", None).await;
    let guardian = Actor::new("ward", UserRole::Guardian);

    let err = h.engine.send_interest(&guardian, "other").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = h
        .engine
        .send_message(
            &guardian,
            &SendMessageRequest {
                receiver_id: "other".to_string(),
                content: "Hello".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn test_accept_creates_match_and_notifies_sender() {
    let h = harness();
    let x = member(
        &h,
        "x",
        Some(ProfileDetails {
            siblings: Some("One sister".to_string()),
            ..ready_details()
        }),
    )
    .await;
    let y = member(&h, "y", Some(core_details())).await;
    assert_eq!(h.engine.completion_report("x").await.unwrap().percentage, 85);

    let mut x_inbox = h.sink.subscribe("x").await;
    let mut y_inbox = h.sink.subscribe("y").await;

    let sent = h.engine.send_interest(&x, "y").await.unwrap();
    assert!(sent.delivered);
    assert_eq!(y_inbox.try_recv().unwrap().kind, NotificationKind::InterestReceived);

    let outcome = h
        .engine
        .respond_to_interest(&y, &accept(sent.interest.id()))
        .await
        .unwrap();

    assert_eq!(outcome.interest.status(), InterestStatus::Accepted);
    let matched = outcome.matched.expect("accept should create a match");
    assert_eq!(matched.other_user("x"), Some("y"));
    assert_eq!(h.store.match_count().await, 1);

    let note = x_inbox.try_recv().unwrap();
    assert_eq!(note.kind, NotificationKind::InterestAccepted);
    assert_eq!(note.user_id, "x");
    assert!(x_inbox.try_recv().is_err());

    let audit = h.store.audit_entries().await;
    let sent_entries: Vec<_> = audit
        .iter()
        .filter(|e| e.action == AuditAction::InterestSent)
        .collect();
    assert_eq!(sent_entries.len(), 1);
    assert_eq!(sent_entries[0].user_id, "x");
    assert!(audit
        .iter()
        .any(|e| e.action == AuditAction::InterestAccepted && e.user_id == "y"));

    assert_eq!(h.engine.matches_for("y").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_only_receiver_responds_once() {
    let h = harness();
    let x = member(&h, "x", Some(ready_details())).await;
    let y = member(&h, "y", None).await;

    let sent = h.engine.send_interest(&x, "y").await.unwrap();

    let err = h
        .engine
        .respond_to_interest(&x, &accept(sent.interest.id()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));

    let declined = h
        .engine
        .respond_to_interest(
            &y,
            &RespondToInterestRequest {
                interest_id: sent.interest.id(),
                action: InterestResponse::Rejected,
            },
        )
        .await
        .unwrap();
    assert_eq!(declined.interest.status(), InterestStatus::Rejected);
    assert!(declined.matched.is_none());

    let err = h
        .engine
        .respond_to_interest(&y, &accept(sent.interest.id()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(ConflictReason::AlreadyResponded)
    ));
    assert_eq!(h.store.match_count().await, 0);
}

#[tokio::test]
async fn test_reverse_interest_is_duplicate() {
    let h = harness();
    let x = member(&h, "x", Some(ready_details())).await;
    let y = member(&h, "y", Some(ready_details())).await;

    h.engine.send_interest(&x, "y").await.unwrap();
    let err = h.engine.send_interest(&y, "x").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(ConflictReason::DuplicateInterest)
    ));
}

#[tokio::test]
async fn test_simultaneous_sends_store_one_interest() {
    let h = harness();
    let x = member(&h, "x", Some(ready_details())).await;
    let y = member(&h, "y", Some(ready_details())).await;

    let (a, b) = tokio::join!(
        h.engine.send_interest(&x, "y"),
        h.engine.send_interest(&y, "x")
    );

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    let sent = h.engine.sent_interests("x").await.unwrap().len()
        + h.engine.sent_interests("y").await.unwrap().len();
    assert_eq!(sent, 1);
}

#[tokio::test]
async fn test_concurrent_accepts_yield_single_match() {
    let h = harness();
    let x = member(&h, "x", Some(ready_details())).await;
    let y = member(&h, "y", None).await;
    let interest_id = h.engine.send_interest(&x, "y").await.unwrap().interest.id();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = h.engine.clone();
        let y = y.clone();
        handles.push(tokio::spawn(async move {
            engine.respond_to_interest(&y, &accept(interest_id)).await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(EngineError::Conflict(ConflictReason::AlreadyResponded)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(h.store.match_count().await, 1);
}

#[tokio::test]
async fn test_matched_pair_cannot_exchange_new_interest() {
    let h = harness();
    let x = member(&h, "x", Some(ready_details())).await;
    let y = member(&h, "y", Some(ready_details())).await;

    let sent = h.engine.send_interest(&x, "y").await.unwrap();
    h.engine
        .respond_to_interest(&y, &accept(sent.interest.id()))
        .await
        .unwrap();

    let err = h.engine.send_interest(&y, "x").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(ConflictReason::AlreadyMatched)
    ));
}

#[tokio::test]
async fn test_engaged_response_updates_both_accounts() {
    let h = harness();
    let x = member(&h, "x", Some(ready_details())).await;
    let y = member(&h, "y", Some(ready_details())).await;
    member(&h, "z", Some(ready_details())).await;

    let sent = h.engine.send_interest(&x, "y").await.unwrap();
    let outcome = h
        .engine
        .respond_to_interest(
            &y,
            &RespondToInterestRequest {
                interest_id: sent.interest.id(),
                action: InterestResponse::Engaged,
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.interest.status(), InterestStatus::Engaged);

    for id in ["x", "y"] {
        let user = UserStore::find_by_id(h.store.as_ref(), id).await.unwrap().unwrap();
        assert_eq!(user.status(), AccountStatus::Engaged);
    }

    let found = h
        .engine
        .discover(&DiscoveryRequest {
            user_id: "z".to_string(),
            limit: None,
        })
        .await
        .unwrap();
    assert!(found.matches.is_empty());
}

#[tokio::test]
async fn test_discovery_skips_blocked_and_private_profiles() {
    let h = harness();
    member(&h, "me", Some(ready_details())).await;
    member(&h, "good", Some(ready_details())).await;
    member(&h, "blocker", Some(ready_details())).await;
    member(&h, "hidden", None).await;
    h.engine
        .create_profile("hidden", ready_details(), Visibility::Private)
        .await
        .unwrap();
    h.store.block("blocker", "me").await;

    let response = h
        .engine
        .discover(&DiscoveryRequest {
            user_id: "me".to_string(),
            limit: Some(10),
        })
        .await
        .unwrap();

    let ids: Vec<&str> = response.matches.iter().map(|m| m.user_id.as_str()).collect();
    assert_eq!(ids, vec!["good"]);
    assert_eq!(response.total_candidates, 1);
    assert!(response.matches[0].score >= 50);
    assert!(!response.matches[0].reasons.is_empty());
}

#[tokio::test]
async fn test_discovery_requires_profile() {
    let h = harness();
    member(&h, "nobody", None).await;

    let err = h
        .engine
        .discover(&DiscoveryRequest {
            user_id: "nobody".to_string(),
            limit: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ProfileRequired));
}

#[tokio::test]
async fn test_messaging_requires_match() {
    let h = harness();
    let x = member(&h, "x", Some(ready_details())).await;
    let y = member(&h, "y", None).await;
    let hello = SendMessageRequest {
        receiver_id: "y".to_string(),
        content: "Hello!".to_string(),
    };

    let err = h.engine.send_message(&x, &hello).await.unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));

    let sent = h.engine.send_interest(&x, "y").await.unwrap();
    h.engine
        .respond_to_interest(&y, &accept(sent.interest.id()))
        .await
        .unwrap();

    let outcome = h.engine.send_message(&x, &hello).await.unwrap();
    assert_eq!(outcome.message.content(), "Hello!");

    let conversation = h.engine.conversation(&y, "x").await.unwrap();
    assert_eq!(conversation.len(), 1);
    assert_eq!(conversation[0].sender_id(), "x");
}

#[tokio::test]
async fn test_proposal_accepted_sends_email() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/emails")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "to": "x@example.com"
        })))
        .with_status(200)
        .create_async()
        .await;

    let h = harness();
    let email = HttpEmailClient::new(server.url(), "key".into(), "hello@example.com".into(), 5)
        .unwrap();
    let engine = h.engine.clone().with_email(Arc::new(email));

    let x = member(&h, "x", Some(core_details())).await;
    let y = member(&h, "y", None).await;

    let created = engine
        .create_proposal(
            &x,
            &CreateProposalRequest {
                recipient_id: "y".to_string(),
                message: "Would you like to meet our family?".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.proposal.status(), ProposalStatus::Pending);

    let answered = engine
        .answer_proposal(
            &y,
            &AnswerProposalRequest {
                proposal_id: created.proposal.id(),
                answer: ProposalStatus::Yes,
            },
        )
        .await
        .unwrap();

    assert_eq!(answered.proposal.status(), ProposalStatus::Yes);
    assert!(answered.proposal.answered_at().is_some());
    assert!(answered.email_sent);
    mock.assert_async().await;

    let err = engine
        .answer_proposal(
            &y,
            &AnswerProposalRequest {
                proposal_id: created.proposal.id(),
                answer: ProposalStatus::No,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(ConflictReason::AlreadyAnswered)
    ));
}

#[tokio::test]
async fn test_proposal_email_failure_does_not_fail_answer() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/emails")
        .with_status(500)
        .create_async()
        .await;

    let h = harness();
    let email = HttpEmailClient::new(server.url(), "key".into(), "hello@example.com".into(), 5)
        .unwrap();
    let engine = h.engine.clone().with_email(Arc::new(email));
    let x = member(&h, "x", Some(core_details())).await;
    let y = member(&h, "y", None).await;

    let created = engine
        .create_proposal(
            &x,
            &CreateProposalRequest {
                recipient_id: "y".to_string(),
                message: String::new(),
            },
        )
        .await
        .unwrap();

    let answered = engine
        .answer_proposal(
            &y,
            &AnswerProposalRequest {
                proposal_id: created.proposal.id(),
                answer: ProposalStatus::Yes,
            },
        )
        .await
        .unwrap();

    assert_eq!(answered.proposal.status(), ProposalStatus::Yes);
    assert!(!answered.email_sent);
}

#[tokio::test]
async fn test_second_pending_proposal_is_rejected() {
    let h = harness();
    let x = member(&h, "x", Some(core_details())).await;
    let y = member(&h, "y", Some(core_details())).await;

    let request = CreateProposalRequest {
        recipient_id: "y".to_string(),
        message: "Hello".to_string(),
    };
    h.engine.create_proposal(&x, &request).await.unwrap();

    let err = h
        .engine
        .create_proposal(
            &y,
            &CreateProposalRequest {
                recipient_id: "x".to_string(),
                message: String::new(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(ConflictReason::ProposalPending)
    ));

    let latest = h.engine.latest_proposal("y").await.unwrap().unwrap();
    assert_eq!(latest.proposer_id(), "x");
}

/// Interest store whose accept step always fails, as if the database went away
struct FailingAccept {
    inner: Arc<InMemoryStore>,
}

#[async_trait]
impl InterestStore for FailingAccept {
    async fn save(&self, interest: &Interest) -> StoreResult<()> {
        InterestStore::save(self.inner.as_ref(), interest).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Interest>> {
        InterestStore::find_by_id(self.inner.as_ref(), id).await
    }

    async fn find_by_user_pair(&self, a: &str, b: &str) -> StoreResult<Option<Interest>> {
        InterestStore::find_by_user_pair(self.inner.as_ref(), a, b).await
    }

    async fn update_status(&self, interest: &Interest) -> StoreResult<bool> {
        self.inner.update_status(interest).await
    }

    async fn accept(&self, _interest: &Interest, _candidate: &Match) -> StoreResult<Option<Match>> {
        Err(StoreError::NotFound("connection lost".to_string()))
    }

    async fn engage(&self, interest: &Interest) -> StoreResult<bool> {
        self.inner.engage(interest).await
    }

    async fn count_created_since(&self, sender_id: &str, since: DateTime<Utc>) -> StoreResult<u32> {
        self.inner.count_created_since(sender_id, since).await
    }

    async fn find_sent_by(&self, user_id: &str) -> StoreResult<Vec<Interest>> {
        self.inner.find_sent_by(user_id).await
    }

    async fn find_received_by(&self, user_id: &str) -> StoreResult<Vec<Interest>> {
        self.inner.find_received_by(user_id).await
    }
}

#[tokio::test]
async fn test_failed_accept_leaves_interest_pending() {
    let h = harness();
    let x = member(&h, "x", Some(ready_details())).await;
    let y = member(&h, "y", None).await;
    let sent = h.engine.send_interest(&x, "y").await.unwrap();

    let mut stores = Stores::from_backend(h.store.clone());
    stores.interests = Arc::new(FailingAccept {
        inner: h.store.clone(),
    });
    let broken = Engine::new(stores, h.sink.clone());

    let err = broken
        .respond_to_interest(&y, &accept(sent.interest.id()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Storage(_)));

    let stored = h.engine.get_interest(&y, sent.interest.id()).await.unwrap();
    assert_eq!(stored.status(), InterestStatus::Pending);
    assert_eq!(h.store.match_count().await, 0);

    // The receiver can simply try again
    let outcome = h
        .engine
        .respond_to_interest(&y, &accept(sent.interest.id()))
        .await
        .unwrap();
    assert!(outcome.matched.is_some());
    assert_eq!(h.store.match_count().await, 1);
}

#[tokio::test]
async fn test_proposal_requires_proposer_profile() {
    let h = harness();
    let bare = member(&h, "bare", None).await;
    member(&h, "y", Some(core_details())).await;

    let err = h
        .engine
        .create_proposal(
            &bare,
            &CreateProposalRequest {
                recipient_id: "y".to_string(),
                message: String::new(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ProfileRequired));
}

#[tokio::test]
async fn test_only_sender_withdraws_pending_interest() {
    let h = harness();
    let x = member(&h, "x", Some(ready_details())).await;
    let y = member(&h, "y", None).await;
    let sent = h.engine.send_interest(&x, "y").await.unwrap();
    let id = sent.interest.id();

    let err = h.engine.withdraw_interest(&y, id).await.unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));

    let withdrawn = h.engine.withdraw_interest(&x, id).await.unwrap();
    assert_eq!(withdrawn.status(), InterestStatus::Withdrawn);

    let err = h.engine.withdraw_interest(&x, id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Conflict(ConflictReason::AlreadyResponded)
    ));
}

#[tokio::test]
async fn test_third_parties_cannot_see_or_withdraw() {
    let h = harness();
    let x = member(&h, "x", Some(ready_details())).await;
    member(&h, "y", Some(core_details())).await;
    let outsider = member(&h, "outsider", Some(core_details())).await;

    let interest = h.engine.send_interest(&x, "y").await.unwrap().interest;
    let proposal = h
        .engine
        .create_proposal(
            &x,
            &CreateProposalRequest {
                recipient_id: "y".to_string(),
                message: "Hello".to_string(),
            },
        )
        .await
        .unwrap()
        .proposal;

    let err = h.engine.get_interest(&outsider, interest.id()).await.unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));

    let err = h.engine.get_proposal(&outsider, proposal.id()).await.unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));

    let err = h
        .engine
        .withdraw_proposal(&outsider, proposal.id())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));

    let still_open = h.engine.get_proposal(&x, proposal.id()).await.unwrap();
    assert_eq!(still_open.status(), ProposalStatus::Pending);
}

#[tokio::test]
async fn test_hourly_message_quota() {
    let h = harness();
    let x = member(&h, "x", Some(ready_details())).await;
    let y = member(&h, "y", None).await;
    let engine = h.engine.clone().with_policy(PolicyLimits {
        interests_per_day: 5,
        messages_per_hour: 2,
        messages_per_day: 500,
    });

    let sent = engine.send_interest(&x, "y").await.unwrap();
    engine
        .respond_to_interest(&y, &accept(sent.interest.id()))
        .await
        .unwrap();

    let hello = SendMessageRequest {
        receiver_id: "y".to_string(),
        content: "Hello!".to_string(),
    };
    engine.send_message(&x, &hello).await.unwrap();
    engine.send_message(&x, &hello).await.unwrap();

    let err = engine.send_message(&x, &hello).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::RateLimited { action: "messages", limit: 2, window: "hour" }
    ));

    // The other side has its own allowance
    let reply = SendMessageRequest {
        receiver_id: "x".to_string(),
        content: "Hi!".to_string(),
    };
    engine.send_message(&y, &reply).await.unwrap();
}

#[tokio::test]
async fn test_blocked_users_do_not_crowd_out_candidates() {
    let h = harness();
    member(&h, "me", Some(ready_details())).await;
    member(&h, "aaa-blocker", Some(ready_details())).await;
    member(&h, "zzz-good", Some(ready_details())).await;
    h.store.block("me", "aaa-blocker").await;

    let engine = h.engine.clone().with_discovery(DiscoverySettings {
        pool_size: 1,
        ..Default::default()
    });
    let response = engine
        .discover(&DiscoveryRequest {
            user_id: "me".to_string(),
            limit: Some(10),
        })
        .await
        .unwrap();

    let ids: Vec<&str> = response.matches.iter().map(|m| m.user_id.as_str()).collect();
    assert_eq!(ids, vec!["zzz-good"]);
    assert_eq!(response.total_candidates, 1);
}

#[tokio::test]
async fn test_simultaneous_proposals_open_one() {
    let h = harness();
    let x = member(&h, "x", Some(core_details())).await;
    let y = member(&h, "y", Some(core_details())).await;
    let to_y = CreateProposalRequest {
        recipient_id: "y".to_string(),
        message: String::new(),
    };
    let to_x = CreateProposalRequest {
        recipient_id: "x".to_string(),
        message: String::new(),
    };

    let (first, second) = tokio::join!(
        h.engine.create_proposal(&x, &to_y),
        h.engine.create_proposal(&y, &to_x)
    );
    assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);
    let err = first.err().or(second.err()).unwrap();
    assert!(matches!(
        err,
        EngineError::Conflict(ConflictReason::ProposalPending)
    ));
    assert_eq!(h.engine.proposals_between("x", "y").await.unwrap().len(), 1);
}
