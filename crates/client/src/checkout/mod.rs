//! Checkout orchestrator.
//!
//! # States
//!
//! ```text
//! Browsing ──begin()──▶ Reviewing ──submit()──▶ Submitting ──ok──▶ Confirmed ──delay──▶ Browsing
//!     ▲                    │  ▲                     │
//!     └─────cancel()───────┘  └──── Failed ◀──err───┘
//! ```
//!
//! - `begin()` is refused while the cart is empty.
//! - `submit()` validates the cart and delivery details before any network
//!   call, then sends exactly one order. Further `submit()` calls while the
//!   request is in flight are ignored.
//! - `Failed` keeps the cart and the entered details; `submit()` retries.
//!   Dropping a `submit()` future mid-flight also lands in `Failed`.
//! - `Confirmed` clears the cart and the details, and falls back to
//!   `Browsing` on its own after the configured display delay.
//!
//! The phase lives behind a short lock that is released across the network
//! call, so other tasks (a shell reacting to clicks) can observe `Submitting`.

mod error;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use bistro_core::{DeliveryDetails, OrderConfirmation, OrderSubmission, Price};
use tracing::{info, instrument, warn};

pub use error::{CheckoutError, SubmissionError, ValidationError};

use crate::api::OrderService;
use crate::cart::CartStore;

/// Default wait for the order service before giving up.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(15);
/// Default time the confirmation stays up before returning to browsing.
pub const DEFAULT_CONFIRMATION_DISPLAY: Duration = Duration::from_secs(3);

/// Tunables for the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutSettings {
    /// Bound on the order submission call; exceeding it fails the attempt.
    pub submit_timeout: Duration,
    /// How long `Confirmed` is shown before returning to `Browsing`.
    pub confirmation_display: Duration,
    /// Flat delivery fee shown in the summary. The service charges its own.
    pub delivery_fee: Price,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            confirmation_display: DEFAULT_CONFIRMATION_DISPLAY,
            delivery_fee: Price::from_cents(500),
        }
    }
}

/// Where the customer is in the checkout flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutPhase {
    Browsing,
    Reviewing,
    Submitting,
    Confirmed(OrderConfirmation),
    /// The last attempt failed; details are kept and `submit()` retries.
    Failed { reason: String },
}

impl CheckoutPhase {
    /// Short lowercase name for logs and error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Browsing => "browsing",
            Self::Reviewing => "reviewing",
            Self::Submitting => "submitting",
            Self::Confirmed(_) => "confirmed",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether delivery details are editable and `submit()` is allowed.
    #[must_use]
    pub const fn is_reviewing(&self) -> bool {
        matches!(self, Self::Reviewing | Self::Failed { .. })
    }
}

/// Result of a `submit()` call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The order was accepted.
    Confirmed(OrderConfirmation),
    /// A submission was already in flight; this trigger was ignored.
    AlreadySubmitting,
}

/// Amounts shown on the review screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total: Price,
}

struct Session {
    phase: CheckoutPhase,
    details: DeliveryDetails,
    /// Bumped on every confirmation so a stale auto-dismiss timer is ignored.
    generation: u64,
}

struct CheckoutInner<S> {
    cart: CartStore,
    service: S,
    settings: CheckoutSettings,
    session: Mutex<Session>,
}

/// The checkout orchestrator. Cloning shares the same session.
pub struct Checkout<S> {
    inner: Arc<CheckoutInner<S>>,
}

impl<S> Clone for Checkout<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: OrderService + 'static> Checkout<S> {
    /// Create an orchestrator over `cart`, submitting through `service`.
    #[must_use]
    pub fn new(cart: CartStore, service: S, settings: CheckoutSettings) -> Self {
        Self {
            inner: Arc::new(CheckoutInner {
                cart,
                service,
                settings,
                session: Mutex::new(Session {
                    phase: CheckoutPhase::Browsing,
                    details: DeliveryDetails::default(),
                    generation: 0,
                }),
            }),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        lock_session(&self.inner)
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> CheckoutPhase {
        self.session().phase.clone()
    }

    /// The delivery details entered so far.
    #[must_use]
    pub fn delivery_details(&self) -> DeliveryDetails {
        self.session().details.clone()
    }

    /// The cart this checkout reads from.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Whether the checkout affordance should be enabled.
    #[must_use]
    pub fn can_begin(&self) -> bool {
        let session = self.session();
        matches!(
            session.phase,
            CheckoutPhase::Browsing | CheckoutPhase::Confirmed(_)
        ) && !self.inner.cart.is_empty()
    }

    /// Subtotal, delivery fee and total for the current cart.
    #[must_use]
    pub fn summary(&self) -> CheckoutSummary {
        let subtotal = self.inner.cart.total();
        let delivery_fee = if self.inner.cart.is_empty() {
            Price::ZERO
        } else {
            self.inner.settings.delivery_fee
        };
        CheckoutSummary {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }

    /// Enter review with fresh, empty delivery details.
    ///
    /// Already reviewing is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyCart` (and stays in `Browsing`) if the
    /// cart is empty, or `InvalidTransition` while a submission is in flight.
    pub fn begin(&self) -> Result<(), CheckoutError> {
        let mut session = self.session();
        match session.phase {
            CheckoutPhase::Reviewing | CheckoutPhase::Failed { .. } => Ok(()),
            CheckoutPhase::Submitting => Err(CheckoutError::InvalidTransition {
                action: "begin checkout",
                phase: session.phase.name(),
            }),
            CheckoutPhase::Browsing | CheckoutPhase::Confirmed(_) => {
                if self.inner.cart.is_empty() {
                    return Err(ValidationError::EmptyCart.into());
                }
                session.phase = CheckoutPhase::Reviewing;
                session.details = DeliveryDetails::default();
                Ok(())
            }
        }
    }

    /// Replace the delivery details being entered.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless reviewing (or after a failure).
    pub fn set_delivery_details(&self, details: DeliveryDetails) -> Result<(), CheckoutError> {
        let mut session = self.session();
        if !session.phase.is_reviewing() {
            return Err(CheckoutError::InvalidTransition {
                action: "edit delivery details",
                phase: session.phase.name(),
            });
        }
        session.details = details;
        Ok(())
    }

    /// Leave review and discard the entered details.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` while a submission is in flight; there is
    /// no cancelling a sent order.
    pub fn cancel(&self) -> Result<(), CheckoutError> {
        let mut session = self.session();
        if session.phase == CheckoutPhase::Submitting {
            return Err(CheckoutError::InvalidTransition {
                action: "cancel",
                phase: session.phase.name(),
            });
        }
        session.phase = CheckoutPhase::Browsing;
        session.details = DeliveryDetails::default();
        Ok(())
    }

    /// Dismiss a confirmation before its display delay runs out.
    pub fn acknowledge(&self) {
        let mut session = self.session();
        if matches!(session.phase, CheckoutPhase::Confirmed(_)) {
            session.phase = CheckoutPhase::Browsing;
        }
    }

    /// Validate and submit the order.
    ///
    /// # Errors
    ///
    /// - `Validation` if the cart is empty or a delivery field is blank; the
    ///   phase is unchanged and no request is sent.
    /// - `Submission` if the service fails or times out; the phase becomes
    ///   `Failed` and the cart and details are kept.
    /// - `InvalidTransition` outside of review.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<SubmitOutcome, CheckoutError> {
        let submission = {
            let mut session = self.session();
            match session.phase {
                CheckoutPhase::Submitting => {
                    info!("Submission already in flight; ignoring trigger");
                    return Ok(SubmitOutcome::AlreadySubmitting);
                }
                CheckoutPhase::Reviewing | CheckoutPhase::Failed { .. } => {}
                CheckoutPhase::Browsing | CheckoutPhase::Confirmed(_) => {
                    return Err(CheckoutError::InvalidTransition {
                        action: "submit an order",
                        phase: session.phase.name(),
                    });
                }
            }

            let cart = self.inner.cart.snapshot();
            if cart.is_empty() {
                return Err(ValidationError::EmptyCart.into());
            }
            let missing = session.details.missing_fields();
            if !missing.is_empty() {
                return Err(ValidationError::MissingFields(missing).into());
            }

            session.phase = CheckoutPhase::Submitting;
            OrderSubmission::from_cart(&cart, session.details.clone())
        };

        info!(
            lines = submission.line_items.len(),
            payment_method = %submission.delivery.payment_method,
            "Submitting order"
        );

        let abandon = AbandonGuard::new(&*self.inner);
        let timeout = self.inner.settings.submit_timeout;
        let result =
            match tokio::time::timeout(timeout, self.inner.service.submit_order(&submission)).await
            {
                Ok(Ok(confirmation)) => Ok(confirmation),
                Ok(Err(e)) => Err(SubmissionError::Service(e)),
                Err(_) => Err(SubmissionError::Timeout(timeout)),
            };
        abandon.disarm();

        let mut session = self.session();
        match result {
            Ok(confirmation) => {
                info!(
                    confirmation_id = %confirmation.confirmation_id,
                    total = %confirmation.total_price,
                    "Order confirmed"
                );
                self.inner.cart.clear();
                session.details = DeliveryDetails::default();
                session.phase = CheckoutPhase::Confirmed(confirmation.clone());
                session.generation = session.generation.wrapping_add(1);
                let generation = session.generation;
                drop(session);

                self.schedule_dismiss(generation);
                Ok(SubmitOutcome::Confirmed(confirmation))
            }
            Err(e) => {
                warn!(error = %e, "Order submission failed");
                session.phase = CheckoutPhase::Failed {
                    reason: e.to_string(),
                };
                Err(e.into())
            }
        }
    }

    fn schedule_dismiss(&self, generation: u64) {
        let delay = self.inner.settings.confirmation_display;
        let weak: Weak<CheckoutInner<S>> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut session = lock_session(&inner);
            if session.generation == generation
                && matches!(session.phase, CheckoutPhase::Confirmed(_))
            {
                session.phase = CheckoutPhase::Browsing;
            }
        });
    }
}

/// Reason recorded when a `submit()` future is dropped mid-flight.
const ABANDONED_REASON: &str = "submission abandoned";

/// Moves a dropped in-flight submission from `Submitting` to `Failed`, so the
/// session never stays stuck when the caller stops polling.
struct AbandonGuard<'a, S> {
    inner: &'a CheckoutInner<S>,
    armed: bool,
}

impl<'a, S> AbandonGuard<'a, S> {
    const fn new(inner: &'a CheckoutInner<S>) -> Self {
        Self { inner, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<S> Drop for AbandonGuard<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = lock_session(self.inner);
        if session.phase == CheckoutPhase::Submitting {
            warn!("Order submission dropped before completing");
            session.phase = CheckoutPhase::Failed {
                reason: ABANDONED_REASON.to_string(),
            };
        }
    }
}

fn lock_session<S>(inner: &CheckoutInner<S>) -> MutexGuard<'_, Session> {
    inner
        .session
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}
