//! Checkout orchestration.
//!
//! ```text
//! SelectingAddress -> AwaitingIntent -> AwaitingGatewayPayment -> VerifyingPayment -> Confirmed
//! ```
//!
//! Each stage gates the next. A failing stage is recorded as a [`StageFailure`]
//! and a notification, and the flow stays where it was so the user can retry.
//! Calling a stage out of order is an [`StorefrontError::InvalidCheckoutStep`]
//! and changes nothing.

mod backend;
pub mod address;
pub mod confirmation;
pub mod gateway;
pub mod intent;
pub mod method;
pub mod verifier;

pub use address::{AddressResolver, AddressSelection};
pub use backend::CheckoutBackend;
pub use confirmation::{ConfirmationPresenter, ConfirmationView, OrderConfirmation, Route};
pub use gateway::{CallbackWidget, PaymentWidget, PendingPayment, Prefill, VerificationResult, WidgetOutcome, WidgetRequest};
pub use intent::PaymentIntent;
pub use method::{CashOnDelivery, GatewayHosted, PaymentContext, PaymentDriver, PaymentMethod, PaymentOutcome, UpiDeepLink};
pub use verifier::VerifiedOrder;

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::domain::aggregates::{Address, NewAddress};
use crate::domain::events::CheckoutEvent;
use crate::session::{Action, AppState, Notification};
use crate::{ErrorKind, Result, StorefrontError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutStage { Address, Intent, Payment, Verification, Confirmation }

#[derive(Clone, Debug, PartialEq)]
pub enum CheckoutState {
    SelectingAddress,
    AwaitingIntent { address: Address },
    AwaitingGatewayPayment { address: Address, intent: PaymentIntent },
    VerifyingPayment { address: Address, intent: PaymentIntent },
    Confirmed { order_id: Option<String> },
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectingAddress => "selecting an address",
            Self::AwaitingIntent { .. } => "awaiting the payment order",
            Self::AwaitingGatewayPayment { .. } => "awaiting payment",
            Self::VerifyingPayment { .. } => "verifying payment",
            Self::Confirmed { .. } => "confirmed",
        }
    }

    pub fn stage(&self) -> CheckoutStage {
        match self {
            Self::SelectingAddress => CheckoutStage::Address,
            Self::AwaitingIntent { .. } => CheckoutStage::Intent,
            Self::AwaitingGatewayPayment { .. } => CheckoutStage::Payment,
            Self::VerifyingPayment { .. } => CheckoutStage::Verification,
            Self::Confirmed { .. } => CheckoutStage::Confirmation,
        }
    }

    pub fn address(&self) -> Option<&Address> {
        match self {
            Self::AwaitingIntent { address } | Self::AwaitingGatewayPayment { address, .. } | Self::VerifyingPayment { address, .. } => Some(address),
            Self::SelectingAddress | Self::Confirmed { .. } => None,
        }
    }

    pub fn intent(&self) -> Option<&PaymentIntent> {
        match self {
            Self::AwaitingGatewayPayment { intent, .. } | Self::VerifyingPayment { intent, .. } => Some(intent),
            _ => None,
        }
    }
}

/// The last stage that failed, kept until a stage succeeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: CheckoutStage,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentResolution {
    Confirmed { order_id: Option<String> },
    /// The payer closed the widget; nothing was charged or cancelled.
    Dismissed,
}

pub struct CheckoutFlow {
    backend: Arc<dyn CheckoutBackend>,
    method: PaymentMethod,
    resolver: AddressResolver,
    state: CheckoutState,
    failure: Option<StageFailure>,
    events: Vec<CheckoutEvent>,
}

impl std::fmt::Debug for CheckoutFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutFlow")
            .field("method", &self.method.name())
            .field("state", &self.state)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

impl CheckoutFlow {
    pub fn new(backend: Arc<dyn CheckoutBackend>, method: PaymentMethod, session: &AppState) -> Self {
        Self {
            backend,
            method,
            resolver: AddressResolver::new(session.addresses()),
            state: CheckoutState::SelectingAddress,
            failure: None,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &CheckoutState { &self.state }
    pub fn failure(&self) -> Option<&StageFailure> { self.failure.as_ref() }
    pub fn method(&self) -> &PaymentMethod { &self.method }
    pub fn resolver(&self) -> &AddressResolver { &self.resolver }
    pub fn is_confirmed(&self) -> bool { matches!(self.state, CheckoutState::Confirmed { .. }) }

    pub fn take_events(&mut self) -> Vec<CheckoutEvent> { std::mem::take(&mut self.events) }

    // ------------------------------------------------------------------------
    // Address
    // ------------------------------------------------------------------------

    pub fn select_address(&mut self, session: &AppState, address_id: &str) -> Result<()> {
        self.ensure_before_payment("select an address")?;
        self.resolver.select(session.addresses(), address_id)?;
        self.state = CheckoutState::SelectingAddress;
        Ok(())
    }

    pub fn choose_new_address(&mut self) -> Result<()> {
        self.ensure_before_payment("enter a new address")?;
        self.resolver.choose_new();
        self.state = CheckoutState::SelectingAddress;
        Ok(())
    }

    pub fn confirm_address(&mut self, session: &mut AppState) -> Result<Address> {
        self.ensure_before_payment("confirm the address")?;
        self.resolver.refresh(session.addresses());
        let Some(address) = self.resolver.resolve(session.addresses()).cloned() else {
            return Err(self.fail(session, CheckoutStage::Address, StorefrontError::AddressRequired));
        };
        self.events.push(CheckoutEvent::AddressSelected { address_id: address.id.clone() });
        self.advance(CheckoutState::AwaitingIntent { address: address.clone() });
        Ok(address)
    }

    /// Saves a new address and moves straight on to the payment order.
    pub async fn submit_new_address(&mut self, session: &mut AppState, form: &NewAddress) -> Result<Address> {
        self.ensure_before_payment("add an address")?;
        self.resolver.choose_new();
        match self.resolver.submit_new(self.backend.as_ref(), session, form).await {
            Ok(address) => {
                session.apply(Action::Notify(Notification::success("Address added")));
                self.events.push(CheckoutEvent::AddressCreated { address_id: address.id.clone() });
                self.advance(CheckoutState::AwaitingIntent { address: address.clone() });
                Ok(address)
            }
            Err(e) => {
                self.state = CheckoutState::SelectingAddress;
                Err(self.fail(session, CheckoutStage::Address, e))
            }
        }
    }

    // ------------------------------------------------------------------------
    // Intent
    // ------------------------------------------------------------------------

    /// Creates a fresh payment intent. Also used to retry after a failed,
    /// dismissed or unverified payment; earlier intents are never reused.
    #[instrument(skip_all, fields(method = self.method.name()))]
    pub async fn create_intent(&mut self, session: &mut AppState) -> Result<PaymentIntent> {
        if session.user().is_none() {
            return Err(self.fail(session, CheckoutStage::Intent, StorefrontError::LoginRequired));
        }
        let address = if self.state == CheckoutState::SelectingAddress {
            self.confirm_address(session)?
        } else if let Some(address) = self.state.address() {
            address.clone()
        } else {
            return Err(self.wrong_step("create a payment order"));
        };

        let backend = Arc::clone(&self.backend);
        let ctx = PaymentContext { address: &address, cart: session.cart(), user: session.user() };
        let created = self.method.driver().initiate(backend.as_ref(), ctx).await;
        match created {
            Ok(intent) => {
                info!(intent_id = %intent.intent_id, amount = %intent.amount, "Payment intent created");
                self.events.push(CheckoutEvent::IntentCreated { intent_id: intent.intent_id.clone(), amount: intent.amount });
                self.advance(CheckoutState::AwaitingGatewayPayment { address, intent: intent.clone() });
                Ok(intent)
            }
            Err(e) => {
                self.events.push(CheckoutEvent::IntentRejected { reason: e.to_string() });
                Err(self.fail(session, CheckoutStage::Intent, e))
            }
        }
    }

    // ------------------------------------------------------------------------
    // Payment
    // ------------------------------------------------------------------------

    /// Waits for the payer. `None` means the payment was dismissed.
    #[instrument(skip_all, fields(method = self.method.name()))]
    pub async fn collect_payment(&mut self, session: &mut AppState) -> Result<Option<VerificationResult>> {
        let CheckoutState::AwaitingGatewayPayment { address, intent } = &self.state else {
            return Err(self.wrong_step("collect payment"));
        };
        let (address, intent) = (address.clone(), intent.clone());

        let backend = Arc::clone(&self.backend);
        let ctx = PaymentContext { address: &address, cart: session.cart(), user: session.user() };
        let outcome = self.method.driver().await_payment(backend.as_ref(), &intent, ctx).await;
        let intent_id = intent.intent_id.clone();
        match outcome {
            PaymentOutcome::Paid(proof) => {
                self.events.push(CheckoutEvent::PaymentCaptured { intent_id, payment_id: proof.payment_id.clone() });
                self.advance(CheckoutState::VerifyingPayment { address, intent });
                Ok(Some(proof))
            }
            PaymentOutcome::Dismissed => {
                info!(%intent_id, "Payment dismissed by user");
                self.events.push(CheckoutEvent::PaymentDismissed { intent_id });
                session.apply(Action::Notify(Notification::info("Payment cancelled. You can try again when ready.")));
                Ok(None)
            }
            PaymentOutcome::Failed { reason } => {
                self.events.push(CheckoutEvent::PaymentFailed { intent_id, reason: reason.clone() });
                Err(self.fail(session, CheckoutStage::Payment, StorefrontError::Gateway(reason)))
            }
            PaymentOutcome::TimedOut => {
                self.events.push(CheckoutEvent::PaymentTimedOut { intent_id });
                Err(self.fail(session, CheckoutStage::Payment, StorefrontError::PaymentTimedOut))
            }
        }
    }

    // ------------------------------------------------------------------------
    // Verification
    // ------------------------------------------------------------------------

    /// Confirms `proof` with the backend. The local cart is cleared only on success.
    pub async fn verify_payment(&mut self, session: &mut AppState, proof: VerificationResult) -> Result<Option<String>> {
        if !matches!(self.state, CheckoutState::VerifyingPayment { .. }) {
            return Err(self.wrong_step("verify payment"));
        }
        let payment_id = proof.payment_id.clone();
        let backend = Arc::clone(&self.backend);
        let verified = self.method.driver().verify(backend.as_ref(), proof).await;
        match verified {
            Ok(VerifiedOrder { order_id }) => {
                session.apply(Action::CartCleared);
                session.apply(Action::Notify(Notification::success("Order placed successfully")));
                self.events.push(CheckoutEvent::Confirmed { order_id: order_id.clone() });
                self.advance(CheckoutState::Confirmed { order_id: order_id.clone() });
                Ok(order_id)
            }
            Err(e) => {
                self.events.push(CheckoutEvent::VerificationFailed { payment_id, reason: e.to_string() });
                Err(self.fail(session, CheckoutStage::Verification, e))
            }
        }
    }

    /// Runs the remaining stages up to confirmation, creating an intent first if needed.
    /// After a failed verification this is the retry: a new intent is created.
    pub async fn complete_payment(&mut self, session: &mut AppState) -> Result<PaymentResolution> {
        let unverified = self.failure.as_ref().is_some_and(|f| f.stage == CheckoutStage::Verification);
        match self.state {
            CheckoutState::SelectingAddress | CheckoutState::AwaitingIntent { .. } => {
                self.create_intent(session).await?;
            }
            CheckoutState::VerifyingPayment { .. } if unverified => {
                self.create_intent(session).await?;
            }
            CheckoutState::AwaitingGatewayPayment { .. } => {}
            CheckoutState::VerifyingPayment { .. } | CheckoutState::Confirmed { .. } => {
                return Err(self.wrong_step("start a payment"));
            }
        }
        let Some(proof) = self.collect_payment(session).await? else {
            return Ok(PaymentResolution::Dismissed);
        };
        let order_id = self.verify_payment(session, proof).await?;
        Ok(PaymentResolution::Confirmed { order_id })
    }

    // ------------------------------------------------------------------------
    // Confirmation
    // ------------------------------------------------------------------------

    pub async fn confirmation(&self, session: &AppState) -> ConfirmationView {
        let order_id = match &self.state {
            CheckoutState::Confirmed { order_id } => order_id.as_deref(),
            _ => None,
        };
        let user_id = session.user().map(|u| u.id.as_str());
        ConfirmationPresenter::load(self.backend.as_ref(), user_id, order_id).await
    }

    fn ensure_before_payment(&self, action: &'static str) -> Result<()> {
        match self.state {
            CheckoutState::SelectingAddress | CheckoutState::AwaitingIntent { .. } => Ok(()),
            _ => Err(self.wrong_step(action)),
        }
    }

    fn wrong_step(&self, action: &'static str) -> StorefrontError {
        StorefrontError::InvalidCheckoutStep { action, state: self.state.name() }
    }

    fn advance(&mut self, next: CheckoutState) {
        self.failure = None;
        self.state = next;
    }

    fn fail(&mut self, session: &mut AppState, stage: CheckoutStage, error: StorefrontError) -> StorefrontError {
        warn!(?stage, kind = ?error.kind(), "Checkout stage failed: {}", error);
        session.apply(Action::Notify(Notification::error(error.to_string())));
        self.failure = Some(StageFailure { stage, kind: error.kind(), message: error.to_string() });
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{NewAddressResponse, PaymentOrderResponse, VerifyPaymentResponse};
    use crate::config::{Config, UpiConfig};
    use crate::domain::aggregates::address::{sample_address, sample_form};
    use crate::domain::aggregates::cart::line;
    use crate::domain::aggregates::order::sample_order;
    use crate::domain::aggregates::{Cart, OrderStatus};
    use crate::session::{logged_in_state, NotificationLevel};
    use crate::test_support::{push, FakeCheckoutBackend};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;

    fn cart_250() -> Cart { Cart::from_lines(vec![line("A", dec!(100), 2), line("B", dec!(50), 1)]) }

    fn intent_response(id: &str) -> PaymentOrderResponse {
        PaymentOrderResponse { id: Some(id.into()), amount: Some(dec!(250)), currency: Some("INR".into()), ..Default::default() }
    }

    fn gateway_flow(backend: &Arc<FakeCheckoutBackend>, session: &AppState) -> (CheckoutFlow, mpsc::Receiver<PendingPayment>) {
        let (widget, host) = CallbackWidget::new(4);
        let method = PaymentMethod::gateway(Arc::new(widget), &Config::default());
        (CheckoutFlow::new(backend.clone(), method, session), host)
    }

    fn answer(mut host: mpsc::Receiver<PendingPayment>, respond: impl FnOnce(PendingPayment) + Send + 'static) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Some(pending) = host.recv().await {
                respond(pending);
            }
        })
    }

    #[tokio::test]
    async fn test_successful_checkout_of_250() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        push(&backend.intents, Ok(intent_response("order_Gw1")));
        push(&backend.verifications, Ok(VerifyPaymentResponse { success: Some(true), order_id: Some("o1".into()), message: None }));
        push(&backend.orders, Ok(sample_order("o1", OrderStatus::Processing, Utc::now())));
        let mut session = logged_in_state(cart_250(), vec![sample_address("a1")]);
        let (mut flow, host) = gateway_flow(&backend, &session);
        let host = answer(host, |pending| {
            assert_eq!(pending.request().amount, dec!(250));
            assert_eq!(pending.request().prefill.contact, "9876543210");
            pending.succeed("pay_1", "order_Gw1", "sig");
        });

        let resolution = flow.complete_payment(&mut session).await.unwrap();
        host.await.unwrap();
        assert_eq!(resolution, PaymentResolution::Confirmed { order_id: Some("o1".into()) });
        assert!(session.cart().is_empty());
        assert_eq!(backend.intent_requests.lock().unwrap()[0].amount, dec!(250));

        let ConfirmationView::Confirmed(view) = flow.confirmation(&session).await else { panic!("expected confirmation") };
        assert_eq!(view.total, "₹250.00");
        let events = flow.take_events();
        assert!(matches!(events.first(), Some(CheckoutEvent::AddressSelected { .. })));
        assert!(matches!(events.last(), Some(CheckoutEvent::Confirmed { order_id }) if order_id.as_deref() == Some("o1")));
    }

    #[tokio::test]
    async fn test_invalid_new_address_stays_on_address_step() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        let mut session = logged_in_state(cart_250(), vec![]);
        let (mut flow, _host) = gateway_flow(&backend, &session);
        let form = NewAddress { mobile: "12345".into(), ..sample_form() };

        let err = flow.submit_new_address(&mut session, &form).await.unwrap_err();
        assert_eq!(err.field_errors().unwrap().len(), 1);
        assert!(backend.calls().is_empty());
        assert_eq!(flow.state(), &CheckoutState::SelectingAddress);
        assert_eq!(flow.failure().unwrap().stage, CheckoutStage::Address);
    }

    #[tokio::test]
    async fn test_new_address_advances_to_intent() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        push(&backend.addresses, Ok(NewAddressResponse { message: Some("Address added".into()), address: sample_address("a9") }));
        let mut session = logged_in_state(cart_250(), vec![]);
        let (mut flow, _host) = gateway_flow(&backend, &session);

        flow.submit_new_address(&mut session, &sample_form()).await.unwrap();
        assert_eq!(flow.state().address().unwrap().id, "a9");
        assert_eq!(flow.state().stage(), CheckoutStage::Intent);
    }

    #[tokio::test]
    async fn test_no_address_fails_locally() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        let mut session = logged_in_state(cart_250(), vec![]);
        let (mut flow, _host) = gateway_flow(&backend, &session);

        let err = flow.create_intent(&mut session).await.unwrap_err();
        assert!(matches!(err, StorefrontError::AddressRequired));
        assert!(backend.calls().is_empty());
        assert_eq!(session.notifications().last().unwrap().level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_malformed_intent_never_opens_widget() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        push(&backend.intents, Ok(PaymentOrderResponse { id: Some("order_1".into()), ..Default::default() }));
        let mut session = logged_in_state(cart_250(), vec![sample_address("a1")]);
        let (mut flow, mut host) = gateway_flow(&backend, &session);

        let err = flow.complete_payment(&mut session).await.unwrap_err();
        assert!(matches!(err, StorefrontError::MalformedIntent(_)));
        assert!(host.try_recv().is_err());
        assert_eq!(flow.state().stage(), CheckoutStage::Intent);
        assert_eq!(session.cart().total().amount(), dec!(250));
    }

    #[tokio::test]
    async fn test_dismissal_keeps_cart_and_intent() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        push(&backend.intents, Ok(intent_response("order_1")));
        let mut session = logged_in_state(cart_250(), vec![sample_address("a1")]);
        let (mut flow, host) = gateway_flow(&backend, &session);
        let host = answer(host, PendingPayment::dismiss);

        let resolution = flow.complete_payment(&mut session).await.unwrap();
        host.await.unwrap();
        assert_eq!(resolution, PaymentResolution::Dismissed);
        assert_eq!(flow.state().intent().unwrap().intent_id, "order_1");
        assert!(!session.cart().is_empty());
        assert_eq!(backend.count("cancel_payment"), 0);
        assert_eq!(session.notifications().last().unwrap().level, NotificationLevel::Info);
    }

    #[tokio::test]
    async fn test_gateway_failure_then_retry_uses_new_intent() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        push(&backend.intents, Ok(intent_response("order_1")));
        push(&backend.intents, Ok(intent_response("order_2")));
        let mut session = logged_in_state(cart_250(), vec![sample_address("a1")]);
        let (mut flow, host) = gateway_flow(&backend, &session);
        let host = answer(host, |pending| pending.fail("Card declined"));

        let err = flow.complete_payment(&mut session).await.unwrap_err();
        host.await.unwrap();
        assert_eq!(err.to_string(), "Payment failed: Card declined");
        assert_eq!(flow.failure().unwrap().kind, ErrorKind::Gateway);

        let retried = flow.create_intent(&mut session).await.unwrap();
        assert_eq!(retried.intent_id, "order_2");
        assert_eq!(backend.count("create_payment_order"), 2);
        assert!(flow.failure().is_none());
    }

    #[tokio::test]
    async fn test_verification_failure_keeps_cart() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        push(&backend.intents, Ok(intent_response("order_1")));
        push(&backend.verifications, Ok(VerifyPaymentResponse { success: Some(false), order_id: None, message: Some("Invalid signature".into()) }));
        let mut session = logged_in_state(cart_250(), vec![sample_address("a1")]);
        let (mut flow, host) = gateway_flow(&backend, &session);
        let host = answer(host, |pending| pending.succeed("pay_1", "order_1", "bad"));

        let err = flow.complete_payment(&mut session).await.unwrap_err();
        host.await.unwrap();
        assert_eq!(err.kind(), ErrorKind::Verification);
        assert_eq!(flow.state().stage(), CheckoutStage::Verification);
        assert_eq!(session.cart().item_count(), 2);
        assert_eq!(backend.count("verify_payment"), 1);
    }

    #[tokio::test]
    async fn test_create_intent_after_failed_verification() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        push(&backend.intents, Ok(intent_response("order_1")));
        push(&backend.intents, Ok(intent_response("order_2")));
        push(&backend.verifications, Err(StorefrontError::Transport("connection reset".into())));
        let mut session = logged_in_state(cart_250(), vec![sample_address("a1")]);
        let (mut flow, host) = gateway_flow(&backend, &session);
        let host = answer(host, |pending| pending.succeed("pay_1", "order_1", "sig"));

        flow.complete_payment(&mut session).await.unwrap_err();
        host.await.unwrap();
        assert_eq!(flow.state().stage(), CheckoutStage::Verification);

        let retried = flow.create_intent(&mut session).await.unwrap();
        assert_eq!(retried.intent_id, "order_2");
        assert_eq!(flow.state().stage(), CheckoutStage::Payment);
        assert_eq!(flow.state().address().unwrap().id, "a1");
        assert!(flow.failure().is_none());
    }

    #[tokio::test]
    async fn test_complete_payment_retries_failed_verification() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        push(&backend.intents, Ok(intent_response("order_1")));
        push(&backend.intents, Ok(intent_response("order_2")));
        push(&backend.verifications, Ok(VerifyPaymentResponse { success: Some(false), order_id: None, message: Some("Invalid signature".into()) }));
        push(&backend.verifications, Ok(VerifyPaymentResponse { success: Some(true), order_id: None, message: None }));
        let mut session = logged_in_state(cart_250(), vec![sample_address("a1")]);
        let (mut flow, mut host) = gateway_flow(&backend, &session);
        let host = tokio::spawn(async move {
            for signature in ["bad", "good"] {
                let pending = host.recv().await.unwrap();
                let intent_id = pending.request().intent_id.clone();
                pending.succeed("pay_1", intent_id, signature);
            }
        });

        let err = flow.complete_payment(&mut session).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Verification);
        let resolution = flow.complete_payment(&mut session).await.unwrap();
        host.await.unwrap();

        assert_eq!(resolution, PaymentResolution::Confirmed { order_id: None });
        assert_eq!(backend.count("create_payment_order"), 2);
        assert!(session.cart().is_empty());
        let events = flow.take_events();
        assert!(matches!(events.last(), Some(CheckoutEvent::Confirmed { order_id: None })));
        assert!(matches!(flow.confirmation(&session).await, ConfirmationView::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_complete_payment_needs_proof_when_verification_pending() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        push(&backend.intents, Ok(intent_response("order_1")));
        let mut session = logged_in_state(cart_250(), vec![sample_address("a1")]);
        let (mut flow, host) = gateway_flow(&backend, &session);
        let host = answer(host, |pending| pending.succeed("pay_1", "order_1", "sig"));

        flow.create_intent(&mut session).await.unwrap();
        let _proof = flow.collect_payment(&mut session).await.unwrap().unwrap();
        host.await.unwrap();

        let err = flow.complete_payment(&mut session).await.unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidCheckoutStep { .. }));
        assert_eq!(backend.count("create_payment_order"), 1);
    }

    #[tokio::test]
    async fn test_addresses_loaded_after_flow_creation_are_used() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        push(&backend.intents, Ok(intent_response("order_1")));
        let mut session = logged_in_state(cart_250(), vec![]);
        let (mut flow, _host) = gateway_flow(&backend, &session);
        assert!(flow.resolver().shows_new_form());

        session.apply(Action::AddressesLoaded(vec![sample_address("a1")]));
        flow.create_intent(&mut session).await.unwrap();
        assert_eq!(flow.state().address().unwrap().id, "a1");
        assert!(matches!(flow.take_events().first(), Some(CheckoutEvent::AddressSelected { address_id }) if address_id == "a1"));
    }

    #[tokio::test]
    async fn test_out_of_order_calls_are_rejected() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        let mut session = logged_in_state(cart_250(), vec![sample_address("a1")]);
        let (mut flow, _host) = gateway_flow(&backend, &session);

        let err = flow.collect_payment(&mut session).await.unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidCheckoutStep { .. }));
        let err = flow.verify_payment(&mut session, VerificationResult::new("p", "o", "s")).await.unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidCheckoutStep { .. }));
        assert_eq!(flow.state(), &CheckoutState::SelectingAddress);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_guest_cannot_check_out() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        let mut session = AppState::new();
        let (mut flow, _host) = gateway_flow(&backend, &session);
        let err = flow.create_intent(&mut session).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Session);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upi_timeout_cancels_and_allows_retry() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        push(&backend.intents, Ok(intent_response("order_U1")));
        push(&backend.statuses, Ok(crate::api::PaymentStatusResponse { status: "created".into(), ..Default::default() }));
        let mut session = logged_in_state(cart_250(), vec![sample_address("a1")]);
        let mut flow = CheckoutFlow::new(backend.clone(), PaymentMethod::upi(&UpiConfig::default()), &session);

        let err = flow.complete_payment(&mut session).await.unwrap_err();
        assert!(matches!(err, StorefrontError::PaymentTimedOut));
        assert_eq!(backend.count("cancel_payment"), 1);
        assert_eq!(flow.state().stage(), CheckoutStage::Payment);
        assert!(!session.cart().is_empty());
    }

    #[tokio::test]
    async fn test_cash_on_delivery_confirms_without_verification() {
        let backend = Arc::new(FakeCheckoutBackend::default());
        push(&backend.cod_orders, Ok(crate::api::CodOrderResponse { order_id: Some("o5".into()), message: None }));
        let mut session = logged_in_state(cart_250(), vec![sample_address("a1")]);
        let mut flow = CheckoutFlow::new(backend.clone(), PaymentMethod::cash_on_delivery(), &session);

        let resolution = flow.complete_payment(&mut session).await.unwrap();
        assert_eq!(resolution, PaymentResolution::Confirmed { order_id: Some("o5".into()) });
        assert_eq!(backend.count("verify_payment"), 0);
        assert!(session.cart().is_empty());
    }
}
