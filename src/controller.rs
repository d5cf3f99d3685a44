//! Page controller: the state behind the one-button health page.
//!
//! The page cycles through three states. `Idle` only exists before the first
//! check; afterwards the page alternates between `Pending` and `Settled`:
//!
//! ```text
//! Idle --begin--> Pending --complete--> Settled --begin--> Pending --> ...
//! ```
//!
//! `begin` publishes `Pending` synchronously, before the probe is called, so any
//! render that happens while the request is in flight sees the busy state.
//! There is no cancel transition and no guard against a second `begin` while a
//! check is pending: the rendered button is disabled, but a direct caller can
//! still start an overlapping check. Outcomes are applied in completion order,
//! so a slow, older request can overwrite the result of a newer one. Each
//! `CheckTicket` carries a generation so that case is at least logged.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::Instrument;

use crate::config::{BackendConfig, ConfigError, RESULT_IN_PROGRESS, RESULT_PLACEHOLDER};
use crate::health::{HealthResponse, HealthStatus};
use crate::probe::{FailureKind, HealthProbe};

/// What a finished check produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// The backend answered with a JSON body, whatever its status or shape
    Reported(serde_json::Value),
    /// No usable body; shown to the user as `{"healthz":"fail"}`
    Failed(FailureKind),
}

impl CheckOutcome {
    /// Text shown in the result display.
    pub fn result_text(&self) -> String {
        match self {
            CheckOutcome::Reported(body) => body.to_string(),
            CheckOutcome::Failed(_) => HealthResponse::fail().to_json(),
        }
    }

    /// Status the backend reported, if the body had the expected shape.
    pub fn reported_status(&self) -> Option<HealthStatus> {
        match self {
            CheckOutcome::Reported(body) => HealthResponse::status_of(body),
            CheckOutcome::Failed(_) => None,
        }
    }

    /// Short tag for logs: which of the causes behind a result this was.
    pub fn label(&self) -> &'static str {
        match self {
            CheckOutcome::Reported(_) => match self.reported_status() {
                Some(HealthStatus::Success) => "success",
                Some(HealthStatus::Fail) => "fail",
                None => "unrecognized",
            },
            CheckOutcome::Failed(FailureKind::Network) => "network",
            CheckOutcome::Failed(FailureKind::Decode) => "decode",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PageState {
    #[default]
    Idle,
    Pending,
    Settled(CheckOutcome),
}

impl PageState {
    pub fn is_loading(&self) -> bool {
        matches!(self, PageState::Pending)
    }

    pub fn result_text(&self) -> String {
        match self {
            PageState::Idle => RESULT_PLACEHOLDER.to_string(),
            PageState::Pending => RESULT_IN_PROGRESS.to_string(),
            PageState::Settled(outcome) => outcome.result_text(),
        }
    }

    pub fn view(&self) -> PageView {
        PageView {
            result: self.result_text(),
            loading: self.is_loading(),
        }
    }
}

/// Render-ready projection of `PageState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub result: String,
    pub loading: bool,
}

/// Handle for one started check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckTicket {
    generation: u64,
}

impl CheckTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct PageController {
    url: String,
    probe: Arc<dyn HealthProbe>,
    state: watch::Sender<PageState>,
    generation: AtomicU64,
}

impl PageController {
    /// Creates a controller whose target URL is derived once from `backend`.
    pub fn new(backend: &BackendConfig, probe: Arc<dyn HealthProbe>) -> Self {
        let (state, _) = watch::channel(PageState::Idle);
        Self {
            url: backend.healthz_url(),
            probe,
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// Creates a controller from `BACK_BASE_URL` / `BACK_BASE_PORT`.
    ///
    /// Fails before anything is rendered or requested if either is missing or blank.
    pub fn from_env(probe: Arc<dyn HealthProbe>) -> Result<Self, ConfigError> {
        let backend = BackendConfig::from_env()?;
        Ok(Self::new(&backend, probe))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> PageState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> PageView {
        self.state.borrow().view()
    }

    /// Watch every state transition.
    pub fn subscribe(&self) -> watch::Receiver<PageState> {
        self.state.subscribe()
    }

    /// Enter `Pending`. Does not touch the network.
    pub fn begin(&self) -> CheckTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(PageState::Pending);
        tracing::debug!(generation, "Health check started");
        CheckTicket { generation }
    }

    /// Run the request for `ticket` and settle the page with its outcome.
    ///
    /// Never fails: every request error becomes `CheckOutcome::Failed`.
    pub async fn complete(&self, ticket: CheckTicket) -> CheckOutcome {
        let outcome = match self.probe.fetch(&self.url).await {
            Ok(body) => CheckOutcome::Reported(body),
            Err(err) => {
                tracing::warn!(
                    generation = ticket.generation,
                    kind = %err.kind(),
                    error = %err,
                    "Health check request failed"
                );
                CheckOutcome::Failed(err.kind())
            }
        };

        let latest = self.generation.load(Ordering::SeqCst);
        if ticket.generation != latest {
            tracing::warn!(
                generation = ticket.generation,
                latest,
                "Stale health check settled after a newer one started; its result replaces the page state"
            );
        }

        self.state.send_replace(PageState::Settled(outcome.clone()));
        tracing::info!(
            generation = ticket.generation,
            outcome = outcome.label(),
            "Health check settled"
        );
        outcome
    }

    /// `begin` followed by `complete`.
    pub async fn run_check(&self) -> CheckOutcome {
        let ticket = self.begin();
        self.complete(ticket).await
    }

    /// Enter `Pending` now and finish the check on a background task.
    pub fn trigger(self: &Arc<Self>) -> CheckTicket {
        let ticket = self.begin();
        let controller = Arc::clone(self);
        tokio::spawn(
            async move {
                controller.complete(ticket).await;
            }
            .in_current_span(),
        );
        ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::CheckError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Answers queued results in call order and records the URLs it was asked for.
    struct ScriptedProbe {
        answers: Mutex<VecDeque<Result<Value, CheckError>>>,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedProbe {
        fn with(answers: Vec<Result<Value, CheckError>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                urls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HealthProbe for ScriptedProbe {
        async fn fetch(&self, url: &str) -> Result<Value, CheckError> {
            self.urls.lock().unwrap().push(url.to_string());
            let answer = self.answers.lock().unwrap().pop_front();
            answer.expect("probe called more times than scripted")
        }
    }

    /// Holds each answer until the test releases it.
    struct GatedProbe {
        gates: Mutex<VecDeque<oneshot::Receiver<Result<Value, CheckError>>>>,
    }

    impl GatedProbe {
        fn new(count: usize) -> (Arc<Self>, Vec<oneshot::Sender<Result<Value, CheckError>>>) {
            let mut senders = Vec::new();
            let mut gates = VecDeque::new();
            for _ in 0..count {
                let (tx, rx) = oneshot::channel();
                senders.push(tx);
                gates.push_back(rx);
            }
            (
                Arc::new(Self {
                    gates: Mutex::new(gates),
                }),
                senders,
            )
        }
    }

    #[async_trait]
    impl HealthProbe for GatedProbe {
        async fn fetch(&self, _url: &str) -> Result<Value, CheckError> {
            let gate = self.gates.lock().unwrap().pop_front();
            gate.expect("probe called more times than gated")
                .await
                .expect("gate sender dropped")
        }
    }

    fn decode_error() -> CheckError {
        CheckError::Decode(serde_json::from_str::<Value>("<html>").unwrap_err())
    }

    fn backend() -> BackendConfig {
        BackendConfig::new("backend", "8000").unwrap()
    }

    #[test]
    fn test_initial_state_is_idle_placeholder() {
        let controller = PageController::new(&backend(), ScriptedProbe::with(vec![]));
        assert_eq!(controller.state(), PageState::Idle);
        assert_eq!(
            controller.view(),
            PageView {
                result: "未実行".to_string(),
                loading: false,
            }
        );
    }

    #[test]
    fn test_url_derived_from_backend() {
        let controller = PageController::new(&backend(), ScriptedProbe::with(vec![]));
        assert_eq!(controller.url(), "http://backend:8000/api/healthz");
    }

    #[test]
    fn test_begin_enters_pending_without_calling_probe() {
        let probe = ScriptedProbe::with(vec![]);
        let controller = PageController::new(&backend(), probe.clone());

        controller.begin();

        assert_eq!(
            controller.view(),
            PageView {
                result: "通信中...".to_string(),
                loading: true,
            }
        );
        assert!(probe.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_success_body_shown_verbatim() {
        let probe = ScriptedProbe::with(vec![Ok(json!({"healthz": "success"}))]);
        let controller = PageController::new(&backend(), probe.clone());

        let outcome = controller.run_check().await;

        assert_eq!(outcome.reported_status(), Some(HealthStatus::Success));
        assert_eq!(
            controller.view(),
            PageView {
                result: r#"{"healthz":"success"}"#.to_string(),
                loading: false,
            }
        );
        assert_eq!(
            *probe.urls.lock().unwrap(),
            vec!["http://backend:8000/api/healthz".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fail_body_shown_verbatim() {
        let controller = PageController::new(
            &backend(),
            ScriptedProbe::with(vec![Ok(json!({"healthz": "fail"}))]),
        );

        let outcome = controller.run_check().await;

        assert_eq!(outcome.label(), "fail");
        assert_eq!(controller.view().result, r#"{"healthz":"fail"}"#);
        assert!(!controller.view().loading);
    }

    #[tokio::test]
    async fn test_request_error_collapses_to_synthetic_fail() {
        let controller =
            PageController::new(&backend(), ScriptedProbe::with(vec![Err(decode_error())]));

        let outcome = controller.run_check().await;

        assert_eq!(outcome, CheckOutcome::Failed(FailureKind::Decode));
        assert_eq!(controller.view().result, r#"{"healthz":"fail"}"#);
        assert!(!controller.view().loading);
    }

    #[tokio::test]
    async fn test_unexpected_shape_accepted_as_is() {
        let controller = PageController::new(
            &backend(),
            ScriptedProbe::with(vec![Ok(json!({"status": "ok"}))]),
        );

        let outcome = controller.run_check().await;

        assert_eq!(outcome.label(), "unrecognized");
        assert_eq!(controller.view().result, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_body_key_order_preserved() {
        let body: Value = serde_json::from_str(r#"{"zeta":1,"healthz":"success","alpha":2}"#).unwrap();
        let controller = PageController::new(&backend(), ScriptedProbe::with(vec![Ok(body)]));

        controller.run_check().await;

        assert_eq!(
            controller.view().result,
            r#"{"zeta":1,"healthz":"success","alpha":2}"#
        );
    }

    #[tokio::test]
    async fn test_sequential_checks_overwrite_result() {
        let controller = PageController::new(
            &backend(),
            ScriptedProbe::with(vec![
                Ok(json!({"healthz": "success"})),
                Err(decode_error()),
                Ok(json!({"healthz": "success"})),
            ]),
        );

        for expected in [
            r#"{"healthz":"success"}"#,
            r#"{"healthz":"fail"}"#,
            r#"{"healthz":"success"}"#,
        ] {
            let ticket = controller.begin();
            assert!(controller.view().loading);
            assert_eq!(controller.view().result, "通信中...");

            controller.complete(ticket).await;
            assert_eq!(
                controller.view(),
                PageView {
                    result: expected.to_string(),
                    loading: false,
                }
            );
        }
    }

    #[tokio::test]
    async fn test_trigger_is_pending_until_response_arrives() {
        let (probe, mut gates) = GatedProbe::new(1);
        let controller = Arc::new(PageController::new(&backend(), probe));
        let mut updates = controller.subscribe();

        controller.trigger();
        assert_eq!(*updates.borrow_and_update(), PageState::Pending);
        assert!(controller.view().loading);

        gates
            .remove(0)
            .send(Ok(json!({"healthz": "success"})))
            .unwrap();
        updates.changed().await.unwrap();

        assert_eq!(
            *updates.borrow(),
            PageState::Settled(CheckOutcome::Reported(json!({"healthz": "success"})))
        );
        assert!(!controller.view().loading);
    }

    #[tokio::test]
    async fn test_tickets_increase_per_check() {
        let controller = PageController::new(&backend(), ScriptedProbe::with(vec![]));
        let first = controller.begin();
        let second = controller.begin();
        assert_eq!(first.generation(), 1);
        assert_eq!(second.generation(), 2);
    }

    // Overlapping checks are not reconciled: whichever completes last wins,
    // even if it was started first.
    #[tokio::test]
    async fn test_stale_completion_overwrites_newer_result() {
        let controller = PageController::new(
            &backend(),
            ScriptedProbe::with(vec![
                Ok(json!({"healthz": "success"})),
                Ok(json!({"healthz": "fail"})),
            ]),
        );

        let older = controller.begin();
        let newer = controller.begin();

        controller.complete(newer).await;
        assert_eq!(controller.view().result, r#"{"healthz":"success"}"#);

        controller.complete(older).await;
        assert_eq!(controller.view().result, r#"{"healthz":"fail"}"#);
        assert!(!controller.view().loading);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(
            CheckOutcome::Reported(json!({"healthz": "success"})).label(),
            "success"
        );
        assert_eq!(CheckOutcome::Failed(FailureKind::Network).label(), "network");
        assert_eq!(CheckOutcome::Failed(FailureKind::Decode).label(), "decode");
    }

    #[test]
    fn test_failed_outcomes_share_one_text() {
        assert_eq!(
            CheckOutcome::Failed(FailureKind::Network).result_text(),
            CheckOutcome::Failed(FailureKind::Decode).result_text()
        );
        assert_eq!(
            CheckOutcome::Failed(FailureKind::Network).result_text(),
            r#"{"healthz":"fail"}"#
        );
    }
}
