//! CheckoutSession - Client-side driver for one checkout.
//!
//! Holds the form, the current [`CheckoutStep`] and the payment descriptor
//! returned by the server. A PIX checkout runs a single polling task against
//! the status endpoint until it sees a terminal status; the task is owned by
//! a [`PollHandle`] that is stopped on every terminal transition, on
//! [`CheckoutSession::reset`] and when the session is dropped.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::domain::checkout::{CheckoutRequest, CheckoutStep};
use crate::domain::foundation::{StateMachine, ValidationError};
use crate::domain::payment::{PaymentMethod, PaymentStatus};
use crate::ports::{
    CardPaymentView, CardVerdict, CheckoutApi, ClientError, PaymentStatusView, PixPaymentView,
};

/// Poll cadence when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

const GENERIC_ERROR: &str = "Unable to process payment. Please try again.";
const DECLINED_MESSAGE: &str = "Payment was declined.";
const PIX_FAILED_MESSAGE: &str = "PIX payment failed.";

/// What the payer has entered so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormData {
    pub payment_method: PaymentMethod,
    pub request: CheckoutRequest,
}

impl Default for FormData {
    fn default() -> Self {
        Self {
            payment_method: PaymentMethod::Pix,
            request: CheckoutRequest::default(),
        }
    }
}

/// Payment descriptor returned by the server on submit.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmittedPayment {
    Pix(PixPaymentView),
    Card(CardPaymentView),
}

impl SubmittedPayment {
    pub fn transaction_id(&self) -> &str {
        match self {
            SubmittedPayment::Pix(view) => &view.transaction_id,
            SubmittedPayment::Card(view) => &view.transaction_id,
        }
    }
}

/// Read-only copy of the session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub step: CheckoutStep,
    pub form: FormData,
    pub payment: Option<SubmittedPayment>,
    pub latest_status: Option<PaymentStatusView>,
    pub error_message: Option<String>,
    pub polling: bool,
}

#[derive(Debug, Default)]
struct SessionState {
    step: Option<CheckoutStep>,
    form: FormData,
    payment: Option<SubmittedPayment>,
    latest_status: Option<PaymentStatusView>,
    error_message: Option<String>,
    /// Bumped by `reset`; results from an older generation are dropped.
    generation: u64,
}

impl SessionState {
    fn step(&self) -> CheckoutStep {
        self.step.unwrap_or(CheckoutStep::Form)
    }

    fn move_to(&mut self, target: CheckoutStep) -> Result<(), ValidationError> {
        self.step = Some(self.step().transition_to(target)?);
        Ok(())
    }

    /// Whether a poll started under `generation` still owns the session.
    fn is_waiting_on(&self, generation: u64) -> bool {
        self.generation == generation && self.step() == CheckoutStep::PixWaiting
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.step = Some(CheckoutStep::Error);
        self.error_message = Some(message.into());
    }
}

/// Owner of the single polling task of a session.
///
/// `start` aborts whatever was running; `stop` may be called any number of
/// times.
#[derive(Debug, Default)]
pub struct PollHandle {
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn start(&mut self, task: JoinHandle<()>) {
        self.stop();
        self.task = Some(task);
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |task| !task.is_finished())
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One checkout, from form to verdict.
pub struct CheckoutSession {
    api: Arc<dyn CheckoutApi>,
    state: Arc<Mutex<SessionState>>,
    poll: StdMutex<PollHandle>,
    poll_interval: Duration,
}

impl CheckoutSession {
    pub fn new(api: Arc<dyn CheckoutApi>) -> Self {
        Self::with_poll_interval(api, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(api: Arc<dyn CheckoutApi>, poll_interval: Duration) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(SessionState::default())),
            poll: StdMutex::new(PollHandle::default()),
            poll_interval,
        }
    }

    /// Edits the form. Ignored once the session left the form step.
    pub async fn update_form(&self, edit: impl FnOnce(&mut FormData)) {
        let mut state = self.state.lock().await;
        if state.step() == CheckoutStep::Form {
            edit(&mut state.form);
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            step: state.step(),
            form: state.form.clone(),
            payment: state.payment.clone(),
            latest_status: state.latest_status.clone(),
            error_message: state.error_message.clone(),
            polling: self.is_polling(),
        }
    }

    pub async fn step(&self) -> CheckoutStep {
        self.state.lock().await.step()
    }

    pub fn is_polling(&self) -> bool {
        self.with_poll(|poll| poll.is_running())
    }

    /// Validates the form and sends it.
    ///
    /// A form that fails validation stays on the form step with the
    /// message recorded and the server is not contacted. Server errors move
    /// the session to the error step and are not returned.
    ///
    /// # Errors
    ///
    /// - the first missing or malformed field
    /// - an invalid step transition when the session is not on the form
    pub async fn submit(&self) -> Result<CheckoutStep, ValidationError> {
        // 1. Local checks, then processing
        let (method, request, generation) = {
            let mut state = self.state.lock().await;
            if state.step() != CheckoutStep::Form {
                state.step().transition_to(CheckoutStep::Processing)?;
            }
            let method = state.form.payment_method;
            if let Err(err) = state.form.request.validate(method) {
                state.error_message = Some(err.to_string());
                return Err(err);
            }
            state.error_message = None;
            state.move_to(CheckoutStep::Processing)?;
            (method, state.form.request.clone(), state.generation)
        };

        // 2. Server call without holding the lock
        let outcome = match method {
            PaymentMethod::Pix => self
                .api
                .create_pix_payment(&request)
                .await
                .map(SubmittedPayment::Pix),
            PaymentMethod::CreditCard => self
                .api
                .create_card_payment(&request)
                .await
                .map(SubmittedPayment::Card),
        };

        // 3. Apply, unless a reset happened meanwhile
        let mut state = self.state.lock().await;
        if state.generation != generation {
            return Ok(state.step());
        }
        match outcome {
            Ok(SubmittedPayment::Pix(view)) => {
                let transaction_id = view.transaction_id.clone();
                state.payment = Some(SubmittedPayment::Pix(view));
                state.move_to(CheckoutStep::PixWaiting)?;
                self.start_polling(transaction_id, generation);
            }
            Ok(SubmittedPayment::Card(view)) => {
                let verdict = view.status;
                let message = view.acquirer_message.clone();
                state.payment = Some(SubmittedPayment::Card(view));
                match verdict {
                    CardVerdict::Approved => state.move_to(CheckoutStep::Success)?,
                    CardVerdict::Failed => {
                        state.fail(message.unwrap_or_else(|| DECLINED_MESSAGE.to_string()))
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, method = method.as_str(), "Checkout submit failed");
                state.fail(user_message(&err));
            }
        }
        Ok(state.step())
    }

    /// Back to an empty form; any polling stops and late results are dropped.
    pub async fn reset(&self) {
        self.stop_polling();
        let mut state = self.state.lock().await;
        let generation = state.generation + 1;
        *state = SessionState {
            generation,
            ..SessionState::default()
        };
    }

    pub fn stop_polling(&self) {
        self.with_poll(PollHandle::stop);
    }

    fn start_polling(&self, transaction_id: String, generation: u64) {
        let task = tokio::spawn(poll_status(
            self.api.clone(),
            self.state.clone(),
            transaction_id,
            generation,
            self.poll_interval,
        ));
        self.with_poll(|poll| poll.start(task));
    }

    fn with_poll<T>(&self, f: impl FnOnce(&mut PollHandle) -> T) -> T {
        let mut poll = self
            .poll
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut poll)
    }
}

impl Drop for CheckoutSession {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

/// Polls until a terminal status, a hard error or a newer generation.
async fn poll_status(
    api: Arc<dyn CheckoutApi>,
    state: Arc<Mutex<SessionState>>,
    transaction_id: String,
    generation: u64,
    interval: Duration,
) {
    loop {
        tokio::time::sleep(interval).await;
        if !state.lock().await.is_waiting_on(generation) {
            return;
        }
        let result = api.payment_status(&transaction_id).await;

        let mut state = state.lock().await;
        if !state.is_waiting_on(generation) {
            return;
        }
        match result {
            Ok(view) => {
                let status = view.status;
                let message = view.acquirer_message.clone();
                state.latest_status = Some(view);
                match status {
                    PaymentStatus::Pending => {}
                    PaymentStatus::Completed => {
                        state.step = Some(CheckoutStep::Success);
                        return;
                    }
                    PaymentStatus::Failed => {
                        state.fail(message.unwrap_or_else(|| PIX_FAILED_MESSAGE.to_string()));
                        return;
                    }
                }
            }
            Err(err) if is_transient(&err) => {
                tracing::debug!(
                    transaction_id = %transaction_id,
                    error = %err,
                    "Status poll failed, retrying"
                );
            }
            Err(err) => {
                tracing::warn!(transaction_id = %transaction_id, error = %err, "Status poll gave up");
                state.fail(user_message(&err));
                return;
            }
        }
    }
}

fn is_transient(err: &ClientError) -> bool {
    match err {
        ClientError::Transport(_) => true,
        ClientError::Api { status, .. } => *status >= 500,
        ClientError::Decode(_) => false,
    }
}

fn user_message(err: &ClientError) -> String {
    err.server_message().unwrap_or(GENERIC_ERROR).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::BillingInterval;
    use crate::domain::checkout::{CardData, CustomerData};
    use crate::ports::PlanView;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INTERVAL: Duration = Duration::from_secs(5);

    /// Scripted API: submit answers are fixed, status answers are popped in
    /// order and the last one repeats.
    struct ScriptedApi {
        pix: Result<PixPaymentView, ClientError>,
        card: Result<CardPaymentView, ClientError>,
        statuses: StdMutex<VecDeque<Result<PaymentStatusView, ClientError>>>,
        submits: AtomicUsize,
        polls: AtomicUsize,
    }

    impl ScriptedApi {
        fn new() -> Self {
            Self {
                pix: Ok(pix_view()),
                card: Ok(card_view(CardVerdict::Approved, None)),
                statuses: StdMutex::new(VecDeque::from([Ok(status_view(PaymentStatus::Pending))])),
                submits: AtomicUsize::new(0),
                polls: AtomicUsize::new(0),
            }
        }

        fn with_statuses(self, statuses: Vec<Result<PaymentStatusView, ClientError>>) -> Self {
            *self.statuses.lock().unwrap() = statuses.into();
            self
        }

        fn polls(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }

        fn submits(&self) -> usize {
            self.submits.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CheckoutApi for ScriptedApi {
        async fn create_pix_payment(
            &self,
            _request: &CheckoutRequest,
        ) -> Result<PixPaymentView, ClientError> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            self.pix.clone()
        }

        async fn create_card_payment(
            &self,
            _request: &CheckoutRequest,
        ) -> Result<CardPaymentView, ClientError> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            self.card.clone()
        }

        async fn payment_status(
            &self,
            _transaction_id: &str,
        ) -> Result<PaymentStatusView, ClientError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                statuses.pop_front().unwrap()
            } else {
                statuses.front().cloned().unwrap()
            }
        }
    }

    fn pix_view() -> PixPaymentView {
        PixPaymentView {
            payment_id: 1,
            transaction_id: "or_1".into(),
            status: PaymentStatus::Pending,
            pix_qr_code: Some("000201".into()),
            pix_qr_code_url: None,
            expires_at: None,
            amount: 99.9,
            currency: "BRL".into(),
            plan: PlanView {
                id: 1,
                name: "Pro".into(),
                price: 99.9,
                currency: "BRL".into(),
                interval: BillingInterval::Monthly,
            },
        }
    }

    fn card_view(status: CardVerdict, message: Option<&str>) -> CardPaymentView {
        CardPaymentView {
            payment_id: 2,
            transaction_id: "or_2".into(),
            status,
            subscription_id: None,
            acquirer_message: message.map(String::from),
        }
    }

    fn status_view(status: PaymentStatus) -> PaymentStatusView {
        PaymentStatusView {
            payment_id: 1,
            transaction_id: "or_1".into(),
            status,
            payment_method: PaymentMethod::Pix,
            pix_qr_code: None,
            pix_qr_code_url: None,
            expires_at: None,
            acquirer_message: None,
            subscription_id: None,
        }
    }

    fn api_error(status: u16, message: &str) -> ClientError {
        ClientError::Api {
            status,
            code: "X".into(),
            message: message.into(),
        }
    }

    fn filled_form(method: PaymentMethod) -> impl FnOnce(&mut FormData) {
        move |form| {
            form.payment_method = method;
            form.request = CheckoutRequest {
                plan_id: Some(1),
                subscription_type: Some("customer".into()),
                customer_id: Some(7),
                customer_data: Some(CustomerData {
                    name: Some("A".into()),
                    email: Some("a@b.com".into()),
                    document: Some("12345678901".into()),
                    ..Default::default()
                }),
                card_data: Some(CardData {
                    number: Some("4111111111111111".into()),
                    holder_name: Some("A B".into()),
                    exp_month: Some(12),
                    exp_year: Some(30),
                    cvv: Some("123".into()),
                }),
                ..Default::default()
            };
        }
    }

    async fn session_with(api: Arc<ScriptedApi>, method: PaymentMethod) -> CheckoutSession {
        let session = CheckoutSession::with_poll_interval(api, INTERVAL);
        session.update_form(filled_form(method)).await;
        session
    }

    #[tokio::test(start_paused = true)]
    async fn pix_waits_then_succeeds_when_poll_sees_completed() {
        let api = Arc::new(ScriptedApi::new().with_statuses(vec![
            Ok(status_view(PaymentStatus::Pending)),
            Ok(status_view(PaymentStatus::Completed)),
        ]));
        let session = session_with(api.clone(), PaymentMethod::Pix).await;

        assert_eq!(session.submit().await.unwrap(), CheckoutStep::PixWaiting);
        assert!(session.is_polling());

        tokio::time::sleep(INTERVAL * 5).await;

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.step, CheckoutStep::Success);
        assert!(!snapshot.polling);
        assert_eq!(api.polls(), 2);
        assert_eq!(
            snapshot.latest_status.map(|s| s.status),
            Some(PaymentStatus::Completed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pix_failure_moves_to_error() {
        let api = Arc::new(
            ScriptedApi::new().with_statuses(vec![Ok(status_view(PaymentStatus::Failed))]),
        );
        let session = session_with(api.clone(), PaymentMethod::Pix).await;
        session.submit().await.unwrap();

        tokio::time::sleep(INTERVAL * 3).await;

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.step, CheckoutStep::Error);
        assert_eq!(snapshot.error_message.as_deref(), Some(PIX_FAILED_MESSAGE));
        assert_eq!(api.polls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn orphaned_poll_exits_without_calling_the_server() {
        let api = Arc::new(ScriptedApi::new());
        let state = Arc::new(Mutex::new(SessionState {
            step: Some(CheckoutStep::PixWaiting),
            generation: 2,
            ..SessionState::default()
        }));

        poll_status(api.clone(), state.clone(), "or_1".into(), 1, INTERVAL).await;

        assert_eq!(api.polls(), 0);
        assert_eq!(state.lock().await.step(), CheckoutStep::PixWaiting);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_polling() {
        let api = Arc::new(ScriptedApi::new());
        let session = session_with(api.clone(), PaymentMethod::Pix).await;
        session.submit().await.unwrap();

        session.reset().await;
        tokio::time::sleep(INTERVAL * 10).await;

        assert_eq!(api.polls(), 0);
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.step, CheckoutStep::Form);
        assert!(snapshot.payment.is_none());
        assert!(!snapshot.polling);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_session_stops_polling() {
        let api = Arc::new(ScriptedApi::new());
        let session = session_with(api.clone(), PaymentMethod::Pix).await;
        session.submit().await.unwrap();
        tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
        let before = api.polls();

        drop(session);
        tokio::time::sleep(INTERVAL * 10).await;

        assert_eq!(before, 1);
        assert_eq!(api.polls(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_poll_errors_keep_polling() {
        let api = Arc::new(ScriptedApi::new().with_statuses(vec![
            Err(ClientError::Transport("connection refused".into())),
            Err(api_error(500, "Payment gateway error: timeout")),
            Ok(status_view(PaymentStatus::Completed)),
        ]));
        let session = session_with(api.clone(), PaymentMethod::Pix).await;
        session.submit().await.unwrap();

        tokio::time::sleep(INTERVAL * 5).await;

        assert_eq!(session.step().await, CheckoutStep::Success);
        assert_eq!(api.polls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_poll_gives_up_with_server_message() {
        let api = Arc::new(
            ScriptedApi::new().with_statuses(vec![Err(api_error(404, "Transaction or_1 not found"))]),
        );
        let session = session_with(api.clone(), PaymentMethod::Pix).await;
        session.submit().await.unwrap();

        tokio::time::sleep(INTERVAL * 5).await;

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.step, CheckoutStep::Error);
        assert_eq!(
            snapshot.error_message.as_deref(),
            Some("Transaction or_1 not found")
        );
        assert_eq!(api.polls(), 1);
    }

    #[tokio::test]
    async fn approved_card_succeeds_without_polling() {
        let api = Arc::new(ScriptedApi::new());
        let session = session_with(api.clone(), PaymentMethod::CreditCard).await;

        assert_eq!(session.submit().await.unwrap(), CheckoutStep::Success);
        assert!(!session.is_polling());
        assert_eq!(api.polls(), 0);
    }

    #[tokio::test]
    async fn declined_card_shows_acquirer_message() {
        let mut api = ScriptedApi::new();
        api.card = Ok(card_view(CardVerdict::Failed, Some("Cartão recusado")));
        let session = session_with(Arc::new(api), PaymentMethod::CreditCard).await;

        assert_eq!(session.submit().await.unwrap(), CheckoutStep::Error);
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.error_message.as_deref(), Some("Cartão recusado"));
    }

    #[tokio::test]
    async fn server_error_without_message_uses_generic_text() {
        let mut api = ScriptedApi::new();
        api.pix = Err(ClientError::Transport("reset".into()));
        let session = session_with(Arc::new(api), PaymentMethod::Pix).await;

        assert_eq!(session.submit().await.unwrap(), CheckoutStep::Error);
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.error_message.as_deref(), Some(GENERIC_ERROR));
        assert!(!snapshot.polling);
    }

    #[tokio::test]
    async fn incomplete_form_never_reaches_the_server() {
        let api = Arc::new(ScriptedApi::new());
        let session = session_with(api.clone(), PaymentMethod::CreditCard).await;
        session.update_form(|form| form.request.card_data = None).await;

        let err = session.submit().await.unwrap_err();

        assert_eq!(err.field(), "card_data");
        assert_eq!(api.submits(), 0);
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.step, CheckoutStep::Form);
        assert!(snapshot.error_message.is_some());
    }

    #[tokio::test]
    async fn second_submit_is_an_invalid_transition() {
        let api = Arc::new(ScriptedApi::new());
        let session = session_with(api.clone(), PaymentMethod::CreditCard).await;
        session.submit().await.unwrap();

        assert!(session.submit().await.is_err());
        assert_eq!(api.submits(), 1);
    }

    #[test]
    fn poll_handle_stop_is_idempotent() {
        let mut handle = PollHandle::default();
        handle.stop();
        handle.stop();
        assert!(!handle.is_running());
    }
}
