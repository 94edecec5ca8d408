use std::env;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

use auth_cell::AuthService;
use doctor_cell::DoctorService;
use schedule_cell::{CalendarViewModel, ScheduleService, StatusTicker, SystemClock};
use shared_api::ApiClient;
use shared_config::AppConfig;
use shared_models::error::AppError;

fn required_env(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

async fn redraw(view_model: &CalendarViewModel, title: &str) {
    let grid = view_model.grid().await;
    println!("{}", render::render_grid(&grid, title));
}

#[tokio::main]
async fn main() -> Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic calendar");

    let config = AppConfig::from_env();
    if !config.is_configured() {
        warn!("API_BASE_URL not set, talking to {}", config.api_base_url);
    }
    let api = Arc::new(ApiClient::new(&config).context("Failed to build HTTP client")?);

    let email = required_env("CALENDAR_EMAIL")?;
    let password = required_env("CALENDAR_PASSWORD")?;
    let session = AuthService::new(Arc::clone(&api))
        .login(&email, &password)
        .await
        .context("Login failed")?;

    let doctor_id = env::var("CALENDAR_DOCTOR_ID")
        .ok()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| session.user_id().to_string());
    if doctor_id == session.user_id() && !session.is_doctor() {
        bail!("CALENDAR_DOCTOR_ID must name the doctor whose calendar to show");
    }

    let title = match DoctorService::new(Arc::clone(&api))
        .get_doctor(&doctor_id, Some(&session))
        .await
    {
        Ok(doctor) => format!("{} ({})", doctor.name, doctor.specialization),
        Err(e) => {
            warn!("Could not load doctor {}: {}", doctor_id, e);
            doctor_id.clone()
        }
    };

    let view_model = Arc::new(CalendarViewModel::new(
        Arc::new(ScheduleService::new(api)),
        Arc::new(SystemClock),
        session,
        doctor_id,
    ));
    info!("Viewing calendar as {:?}", view_model.viewer_role());

    if let Err(e) = view_model.refresh().await {
        AppError::from(e).log();
    }
    let mut events = view_model.subscribe();
    redraw(&view_model, &title).await;

    let ticker = StatusTicker::new(Arc::clone(&view_model), config.slot_refresh_interval())
        .context("Invalid slot refresh interval")?;
    let ticker_handle = ticker.start();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(_) | Err(RecvError::Lagged(_)) => redraw(&view_model, &title).await,
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    ticker.shutdown();
    ticker_handle.await.context("Status ticker panicked")?;
    Ok(())
}
