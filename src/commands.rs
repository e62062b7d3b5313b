//! Command handlers shared by the CLI. Each takes its collaborators
//! (store, catalog, notifier) explicitly and returns `anyhow::Result`, with
//! `StoreError` / `NotifyError` kept intact for exit-code mapping.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use reqwest::Url;
use std::time::Duration;
use uuid::Uuid;

use crate::invite::{self, Delivery, Notifier};
use crate::output::SessionSummary;
use crate::quiz::{AnswerScale, AnswerSet, QuestionCatalog, Role};
use crate::scoring::{compute_category_scores, ScoreReport, ScoringRules};
use crate::store::{
    normalize_email, ContentKind, EmailInvite, InviteStatus, PremiumContent, SessionId,
    SessionStatus, SessionStore, StoreError, StoreResult, TestSession, UserProfile,
};

/// Current user: `--user` wins over the configured one
pub fn resolve_user(flag: Option<&str>, configured: Option<&str>) -> Result<String> {
    let Some(email) = flag.or(configured) else {
        bail!("No user selected. Pass --user EMAIL or set `user` in the config file (see `couplefin init`).");
    };
    Ok(normalize_email(email)?)
}

/// Accept a full session id, or an unambiguous prefix of one of the user's
/// sessions (the dashboard shows the first 8 characters).
pub fn resolve_session<S: SessionStore>(store: &S, user: &str, input: &str) -> Result<SessionId> {
    let input = input.trim();
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }
    if input.is_empty() {
        bail!("Session id is empty");
    }

    let prefix = input.to_lowercase();
    let matches: Vec<SessionId> = store
        .sessions_for(user, usize::MAX)
        .into_iter()
        .map(|s| s.id)
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("No session of yours matches '{}'", input),
        _ => bail!("Session id '{}' is ambiguous ({} matches)", input, matches.len()),
    }
}

/// The session and which side `user` answers for
pub fn role_in_session<S: SessionStore>(store: &S, id: SessionId, user: &str) -> Result<(TestSession, Role)> {
    let session = store.session(id)?;
    let email = normalize_email(user)?;
    let Some(role) = session.role_of(&email) else {
        return Err(StoreError::Unauthorized {
            email,
            session: id,
        }
        .into());
    };
    Ok((session, role))
}

/// Parse a `--set` argument of the form `QUESTION=VALUE`
pub fn parse_assignment(s: &str) -> Result<(String, i32)> {
    let Some((id, value)) = s.split_once('=') else {
        bail!("Expected QUESTION=VALUE, got '{}'", s);
    };
    let id = id.trim();
    if id.is_empty() {
        bail!("Missing question id in '{}'", s);
    }
    let value: i32 = value
        .trim()
        .parse()
        .with_context(|| format!("Answer for {} must be a whole number", id))?;
    Ok((id.to_string(), value))
}

pub fn register_user<S: SessionStore>(store: &mut S, email: &str) -> Result<UserProfile> {
    let profile = store.register_user(email)?;
    tracing::info!(email = %profile.email, "registered user");
    Ok(profile)
}

pub fn upgrade_user<S: SessionStore>(store: &mut S, email: &str) -> Result<UserProfile> {
    let profile = store.set_premium(email, true)?;
    tracing::info!(email = %profile.email, "upgraded to premium");
    Ok(profile)
}

/// Create a pending session and the link to send to the partner
pub fn start_session<S: SessionStore>(store: &mut S, owner: &str, base_url: &str) -> Result<(TestSession, Url)> {
    let session = store.create_session(owner)?;
    let link = invite::invite_link(base_url, session.id)?;
    tracing::info!(session = %session.id, owner = %session.owner, "started session");
    Ok((session, link))
}

pub fn join_session<S: SessionStore>(store: &mut S, id: SessionId, user: &str) -> Result<TestSession> {
    let session = store.join_session(id, user)?;
    tracing::info!(session = %id, partner = ?session.partner, "joined session");
    Ok(session)
}

/// Record answers for the user's side of a session.
///
/// Every assignment is checked against the catalog and the scale before
/// anything is written, so a bad value leaves the session untouched.
pub fn apply_answers<S: SessionStore>(
    store: &mut S,
    catalog: &QuestionCatalog,
    scale: AnswerScale,
    id: SessionId,
    user: &str,
    assignments: &[(String, i32)],
) -> Result<usize> {
    let (session, role) = role_in_session(store, id, user)?;
    if session.is_submitted(role) {
        return Err(StoreError::AlreadySubmitted { role }.into());
    }

    for (question_id, value) in assignments {
        if catalog.get(question_id).is_none() {
            bail!("Unknown question '{}' (see `couplefin questions`)", question_id);
        }
        scale
            .check(*value)
            .with_context(|| format!("Invalid answer for {}", question_id))?;
    }

    for (question_id, value) in assignments {
        store.record_answer(id, role, question_id, *value)?;
    }
    tracing::debug!(session = %id, %role, count = assignments.len(), "recorded answers");
    Ok(assignments.len())
}

/// Catalog questions the role has not answered yet, in display order
pub fn unanswered(catalog: &QuestionCatalog, answers: &AnswerSet) -> Vec<String> {
    catalog
        .iter()
        .filter(|q| !answers.contains(&q.id))
        .map(|q| q.id.clone())
        .collect()
}

/// Mark the user's answers as final. Refuses while catalog questions are
/// unanswered unless `force` is set.
pub fn submit_answers<S: SessionStore>(
    store: &mut S,
    catalog: &QuestionCatalog,
    id: SessionId,
    user: &str,
    force: bool,
) -> Result<SessionStatus> {
    let (session, role) = role_in_session(store, id, user)?;

    let missing = unanswered(catalog, session.answers_for(role));
    if !missing.is_empty() && !force {
        bail!(
            "{} questions still unanswered ({}). Answer them or pass --force.",
            missing.len(),
            missing.join(", ")
        );
    }

    let status = store.submit(id, role)?;
    tracing::info!(session = %id, %role, %status, "submitted answers");
    Ok(status)
}

/// Score a completed session. `StoreError::Incomplete` until both sides
/// have submitted.
pub fn session_report<S: SessionStore>(
    store: &S,
    catalog: &QuestionCatalog,
    rules: &ScoringRules,
    id: SessionId,
) -> Result<ScoreReport> {
    let comparison = store.comparison(id)?;
    Ok(compute_category_scores(
        &comparison.self_answers,
        &comparison.partner_answers,
        catalog,
        rules,
    ))
}

/// Most recent sessions for the user, with a score of 0 until completed
pub fn dashboard<S: SessionStore>(
    store: &S,
    catalog: &QuestionCatalog,
    rules: &ScoringRules,
    user: &str,
    limit: usize,
) -> Vec<SessionSummary> {
    let Ok(email) = normalize_email(user) else {
        return Vec::new();
    };
    store
        .sessions_for(&email, limit)
        .into_iter()
        .filter_map(|session| {
            let role = session.role_of(&email)?;
            let score = match session.status {
                SessionStatus::Completed => compute_category_scores(
                    &session.answers,
                    &session.partner_answers,
                    catalog,
                    rules,
                )
                .overall,
                SessionStatus::Pending => 0.0,
            };
            let partner = match role {
                Role::Owner => session.partner.clone(),
                Role::Partner => Some(session.owner.clone()),
            };
            Some(SessionSummary {
                id: session.id,
                role,
                partner,
                status: session.status,
                created_at: session.created_at,
                score,
            })
        })
        .collect()
}

/// Email the partner an invitation.
///
/// The invite is recorded as pending first and updated to sent or failed
/// once the notifier returns; a delivery failure is returned after the
/// status is recorded.
pub async fn send_invite<S: SessionStore, N: Notifier>(
    store: &mut S,
    notifier: &N,
    id: SessionId,
    sender: &str,
    recipient: &str,
    base_url: &str,
) -> Result<(EmailInvite, Delivery)> {
    let (session, role) = role_in_session(store, id, sender)?;
    if role != Role::Owner {
        bail!("Only the person who started the session can invite a partner");
    }
    let recipient = normalize_email(recipient)?;

    let mut invite = EmailInvite::new(session.id, session.owner.clone(), recipient.clone());
    store.record_invite(invite.clone())?;

    let link = invite::invite_link(base_url, id)?;
    let message = invite::compose_invitation(&session.owner, &recipient, &link);

    match notifier.send(&message).await {
        Ok(delivery) => {
            store.update_invite_status(invite.id, InviteStatus::Sent)?;
            invite.status = InviteStatus::Sent;
            Ok((invite, delivery))
        }
        Err(e) => {
            tracing::warn!(session = %id, to = %recipient, error = %e, "invitation not delivered");
            store.update_invite_status(invite.id, InviteStatus::Failed)?;
            Err(e.into())
        }
    }
}

/// WhatsApp share URL carrying the invite link
pub fn whatsapp_invite(base_url: &str, id: SessionId) -> Result<Url> {
    let link = invite::invite_link(base_url, id)?;
    invite::whatsapp_share_url(&invite::whatsapp_text(&link))
}

pub async fn send_test_mail<N: Notifier>(notifier: &N, to: &str) -> Result<Delivery> {
    let to = normalize_email(to)?;
    Ok(notifier.send(&invite::compose_test_message(&to)).await?)
}

/// Poll until the session is completed.
///
/// `check` is called once per `interval` and should read fresh state (the
/// partner answers from another process). After `timeout` the last
/// `StoreError::Incomplete` is returned.
pub async fn wait_for_completion<F>(
    mut check: F,
    interval: Duration,
    timeout: Option<Duration>,
) -> Result<TestSession>
where
    F: FnMut() -> StoreResult<TestSession>,
{
    let started = tokio::time::Instant::now();
    loop {
        let session = check()?;
        let Some(waiting_on) = session.waiting_on() else {
            return Ok(session);
        };

        if let Some(timeout) = timeout {
            if started.elapsed() >= timeout {
                return Err(StoreError::Incomplete {
                    session: session.id,
                    waiting_on,
                }
                .into());
            }
        }

        tracing::debug!(session = %session.id, %waiting_on, "still waiting");
        tokio::time::sleep(interval).await;
    }
}

/// Premium items, or an error for users without a premium membership
pub fn premium_content_for<S: SessionStore>(store: &S, user: &str) -> Result<Vec<PremiumContent>> {
    let profile = store.user(user)?;
    if !profile.is_premium {
        bail!("Premium membership required. Run `couplefin user upgrade` to unlock premium content.");
    }
    Ok(store.premium_content())
}

pub fn add_premium_content<S: SessionStore>(
    store: &mut S,
    title: &str,
    description: &str,
    kind: ContentKind,
    url: &str,
) -> Result<PremiumContent> {
    if title.trim().is_empty() {
        bail!("Premium content needs a title");
    }
    if !url.is_empty() {
        Url::parse(url).with_context(|| format!("Invalid content URL '{}'", url))?;
    }
    let content = PremiumContent {
        id: Uuid::new_v4(),
        title: title.trim().to_string(),
        description: description.trim().to_string(),
        kind,
        url: url.to_string(),
        created_at: Utc::now(),
    };
    store.add_premium_content(content.clone())?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invite::{Invitation, NotifyError, OutboxNotifier};
    use crate::quiz::load_catalog;
    use crate::store::StoreState;
    use std::sync::Mutex;

    const OWNER: &str = "ada@example.com";
    const PARTNER: &str = "bob@example.com";
    const BASE: &str = "https://couplefin.app";

    fn setup() -> (StoreState, QuestionCatalog, SessionId) {
        let mut store = StoreState::new();
        register_user(&mut store, OWNER).unwrap();
        register_user(&mut store, PARTNER).unwrap();
        let catalog = load_catalog(None).unwrap();
        let (session, _) = start_session(&mut store, OWNER, BASE).unwrap();
        join_session(&mut store, session.id, PARTNER).unwrap();
        (store, catalog, session.id)
    }

    fn answer_all(store: &mut StoreState, catalog: &QuestionCatalog, id: SessionId, user: &str, value: i32) {
        let assignments: Vec<(String, i32)> = catalog.iter().map(|q| (q.id.clone(), value)).collect();
        apply_answers(store, catalog, AnswerScale::default(), id, user, &assignments).unwrap();
    }

    /// Notifier that remembers what it was asked to send
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Invitation>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        async fn send(&self, invitation: &Invitation) -> Result<Delivery, NotifyError> {
            if self.fail {
                return Err(NotifyError::Transport("connection refused".to_string()));
            }
            self.sent.lock().unwrap().push(invitation.clone());
            Ok(Delivery {
                message_id: Some("m-1".to_string()),
            })
        }
    }

    #[test]
    fn test_resolve_user_prefers_flag() {
        assert_eq!(resolve_user(Some("Bob@Example.com"), Some(OWNER)).unwrap(), PARTNER);
        assert_eq!(resolve_user(None, Some(OWNER)).unwrap(), OWNER);
        assert!(resolve_user(None, None).is_err());
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("q01=3").unwrap(), ("q01".to_string(), 3));
        assert_eq!(parse_assignment(" q02 = 4 ").unwrap(), ("q02".to_string(), 4));
        assert!(parse_assignment("q01").is_err());
        assert!(parse_assignment("=3").is_err());
        assert!(parse_assignment("q01=many").is_err());
    }

    #[test]
    fn test_resolve_session_by_prefix() {
        let (store, _, id) = setup();
        let prefix: String = id.to_string().chars().take(8).collect();
        assert_eq!(resolve_session(&store, OWNER, &prefix).unwrap(), id);
        assert_eq!(resolve_session(&store, PARTNER, &id.to_string()).unwrap(), id);
        assert!(resolve_session(&store, OWNER, "zzzz").is_err());
    }

    #[test]
    fn test_apply_answers_validates_before_writing() {
        let (mut store, catalog, id) = setup();
        let assignments = vec![("q01".to_string(), 2), ("q02".to_string(), 9)];
        assert!(apply_answers(&mut store, &catalog, AnswerScale::default(), id, OWNER, &assignments).is_err());
        assert!(store.session(id).unwrap().answers.is_empty());

        let unknown = vec![("nope".to_string(), 2)];
        assert!(apply_answers(&mut store, &catalog, AnswerScale::default(), id, OWNER, &unknown).is_err());
    }

    #[test]
    fn test_apply_answers_rejects_outsider() {
        let (mut store, catalog, id) = setup();
        register_user(&mut store, "eve@example.com").unwrap();
        let err = apply_answers(
            &mut store,
            &catalog,
            AnswerScale::default(),
            id,
            "eve@example.com",
            &[("q01".to_string(), 2)],
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_submit_requires_all_answers_unless_forced() {
        let (mut store, catalog, id) = setup();
        apply_answers(&mut store, &catalog, AnswerScale::default(), id, OWNER, &[("q01".to_string(), 2)]).unwrap();

        let err = submit_answers(&mut store, &catalog, id, OWNER, false).unwrap_err();
        assert!(err.to_string().contains("still unanswered"));

        let status = submit_answers(&mut store, &catalog, id, OWNER, true).unwrap();
        assert_eq!(status, SessionStatus::Pending);
    }

    #[test]
    fn test_report_incomplete_then_complete() {
        let (mut store, catalog, id) = setup();
        let rules = ScoringRules::default();

        answer_all(&mut store, &catalog, id, OWNER, 2);
        submit_answers(&mut store, &catalog, id, OWNER, false).unwrap();

        let err = session_report(&store, &catalog, &rules, id).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Incomplete {
                waiting_on: Role::Partner,
                ..
            })
        ));

        answer_all(&mut store, &catalog, id, PARTNER, 3);
        let status = submit_answers(&mut store, &catalog, id, PARTNER, false).unwrap();
        assert_eq!(status, SessionStatus::Completed);

        let report = session_report(&store, &catalog, &rules, id).unwrap();
        assert_eq!(report.overall, 100.0);
        assert_eq!(report.categories.len(), 5);
        assert_eq!(report.pairs, catalog.len());
    }

    #[test]
    fn test_dashboard_scores_completed_only() {
        let (mut store, catalog, id) = setup();
        let rules = ScoringRules::default();
        answer_all(&mut store, &catalog, id, OWNER, 1);
        answer_all(&mut store, &catalog, id, PARTNER, 4);
        submit_answers(&mut store, &catalog, id, OWNER, false).unwrap();
        submit_answers(&mut store, &catalog, id, PARTNER, false).unwrap();

        let (pending, _) = start_session(&mut store, OWNER, BASE).unwrap();

        let rows = dashboard(&store, &catalog, &rules, OWNER, 3);
        assert_eq!(rows.len(), 2);
        let pending_row = rows.iter().find(|r| r.id == pending.id).unwrap();
        assert_eq!(pending_row.score, 0.0);
        assert_eq!(pending_row.partner, None);

        let done = rows.iter().find(|r| r.id == id).unwrap();
        assert_eq!(done.status, SessionStatus::Completed);
        assert_eq!(done.score, 0.0);
        assert_eq!(done.partner.as_deref(), Some(PARTNER));

        let partner_rows = dashboard(&store, &catalog, &rules, PARTNER, 3);
        assert_eq!(partner_rows.len(), 1);
        assert_eq!(partner_rows[0].role, Role::Partner);
        assert_eq!(partner_rows[0].partner.as_deref(), Some(OWNER));
    }

    #[tokio::test]
    async fn test_send_invite_marks_sent() {
        let (mut store, _, id) = setup();
        let notifier = RecordingNotifier::default();

        let (invite, delivery) = send_invite(&mut store, &notifier, id, OWNER, "Carol@Example.com", BASE)
            .await
            .unwrap();
        assert_eq!(invite.status, InviteStatus::Sent);
        assert_eq!(invite.recipient_email, "carol@example.com");
        assert_eq!(delivery.message_id.as_deref(), Some("m-1"));
        assert_eq!(store.invites_for(id)[0].status, InviteStatus::Sent);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent[0].to, "carol@example.com");
        assert!(sent[0].text.contains(&format!("sessionId={}", id)));
    }

    #[tokio::test]
    async fn test_send_invite_failure_recorded() {
        let (mut store, _, id) = setup();
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };

        let err = send_invite(&mut store, &notifier, id, OWNER, "carol@example.com", BASE)
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<NotifyError>().is_some());
        assert_eq!(store.invites_for(id)[0].status, InviteStatus::Failed);
    }

    #[tokio::test]
    async fn test_only_owner_invites() {
        let (mut store, _, id) = setup();
        let notifier = RecordingNotifier::default();
        assert!(send_invite(&mut store, &notifier, id, PARTNER, "carol@example.com", BASE)
            .await
            .is_err());
        assert!(store.invites_for(id).is_empty());
    }

    #[tokio::test]
    async fn test_invite_through_outbox() {
        let (mut store, _, id) = setup();
        let dir = tempfile::tempdir().unwrap();
        let outbox = OutboxNotifier::new(dir.path());

        send_invite(&mut store, &outbox, id, OWNER, "carol@example.com", BASE)
            .await
            .unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_whatsapp_invite_contains_link() {
        let id = Uuid::new_v4();
        let url = whatsapp_invite(BASE, id).unwrap();
        let (_, text) = url.query_pairs().next().unwrap();
        assert!(text.contains(&format!("https://couplefin.app/test/partner?sessionId={}", id)));
    }

    #[tokio::test]
    async fn test_wait_times_out_while_incomplete() {
        let (store, _, id) = setup();
        let err = wait_for_completion(
            || store.session(id),
            Duration::from_millis(10),
            Some(Duration::from_millis(30)),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Incomplete { .. })
        ));
    }

    #[tokio::test]
    async fn test_wait_returns_once_completed() {
        let (mut store, catalog, id) = setup();
        answer_all(&mut store, &catalog, id, OWNER, 2);
        answer_all(&mut store, &catalog, id, PARTNER, 2);
        submit_answers(&mut store, &catalog, id, OWNER, false).unwrap();

        // partner submits between the first and second poll
        let mut polls = 0;
        let session = wait_for_completion(
            || {
                polls += 1;
                if polls == 2 {
                    store.submit(id, Role::Partner)?;
                }
                store.session(id)
            },
            Duration::from_millis(5),
            None,
        )
        .await
        .unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(polls, 2);
    }

    #[test]
    fn test_premium_gate() {
        let (mut store, _, _) = setup();
        add_premium_content(&mut store, "Budget planner", "", ContentKind::Template, "").unwrap();

        let err = premium_content_for(&store, OWNER).unwrap_err();
        assert!(err.to_string().contains("Premium membership required"));

        upgrade_user(&mut store, OWNER).unwrap();
        let items = premium_content_for(&store, OWNER).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Budget planner");
    }

    #[test]
    fn test_add_premium_content_validates() {
        let mut store = StoreState::new();
        assert!(add_premium_content(&mut store, "  ", "", ContentKind::Pdf, "").is_err());
        assert!(add_premium_content(&mut store, "Guide", "", ContentKind::Pdf, "not a url").is_err());
    }
}
