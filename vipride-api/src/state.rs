use std::sync::Arc;
use vipride_core::booking::{BookingDefaults, PersistenceFailurePolicy};
use vipride_core::notification::Mailer;
use vipride_core::payment::PaymentGateway;
use vipride_core::ReservationRepository;

#[derive(Clone, Default)]
pub struct BookingSettings {
    pub defaults: BookingDefaults,
    pub persistence_failure: PersistenceFailurePolicy,
}

#[derive(Clone)]
pub struct AppState {
    pub reservations: Arc<dyn ReservationRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub payments: Arc<dyn PaymentGateway>,
    pub booking: BookingSettings,
}
