pub mod app_config;
pub mod database;
pub mod mailer;
pub mod payment_gateway;
pub mod reservation_repo;

pub use database::DbClient;
pub use mailer::SmtpMailer;
pub use payment_gateway::HttpPaymentGateway;
pub use reservation_repo::MySqlReservationRepository;
