use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vipride_api::{app, AppState, BookingSettings};
use vipride_core::booking::{BookingDefaults, PersistenceFailurePolicy};
use vipride_store::app_config::Config;
use vipride_store::{DbClient, HttpPaymentGateway, MySqlReservationRepository, SmtpMailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vipride_api=debug,vipride_store=debug,vipride_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting VIP Ride API on port {}", config.server.port);

    // MySQL: startup fails if the first pool cannot be built
    let db = DbClient::connect(config.database.clone()).await?;
    db.migrate().await?;
    db.spawn_health_check();

    let mailer = SmtpMailer::new(&config.email)?;
    let payments = HttpPaymentGateway::new(&config.payment)?;

    if !config.booking.swallow_persistence_failures {
        tracing::warn!("Reservation write failures will fail /api/payment requests");
    }

    let app_state = AppState {
        reservations: Arc::new(MySqlReservationRepository::new(db.clone())),
        mailer: Arc::new(mailer),
        payments: Arc::new(payments),
        booking: BookingSettings {
            defaults: BookingDefaults {
                default_vehicle: config.booking.default_vehicle.clone(),
            },
            persistence_failure: PersistenceFailurePolicy::from_swallow_flag(
                config.booking.swallow_persistence_failures,
            ),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
