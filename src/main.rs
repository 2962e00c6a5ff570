use std::env;
use std::rc::Rc;

use anyhow::{Context, Result};
use attendance_kiosk::api::{KioskApiClient, StubService};
use attendance_kiosk::cli::{Cli, Command};
use attendance_kiosk::clock::{Clock, ManualClock, SystemClock};
use attendance_kiosk::config::KioskConfig;
use attendance_kiosk::connectivity::probe_loop;
use attendance_kiosk::kiosk::{KioskHandle, KioskRuntime};
use attendance_kiosk::state_machine::{CapturedImage, Event, Screen, SessionController};
use attendance_kiosk::ui::{self, Input, KioskDisplay};
use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use console::Style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{LocalSet, spawn_local};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = KioskConfig::load(cli.config.as_deref())?;
    if let Some(minutes) = cli.late_threshold {
        config.late_threshold_minutes = minutes;
        config.validate()?;
    }

    match cli.command {
        Command::Run => LocalSet::new().run_until(run(config)).await,
        Command::Demo => LocalSet::new().run_until(demo(config)).await,
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let debug_enabled = verbose
        || env::var("KIOSK_DEBUG_LOG")
            .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
            .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(config: KioskConfig) -> Result<()> {
    let client = KioskApiClient::new(
        config.api_url.as_str(),
        config.api_token.clone(),
        config.request_timeout(),
    )
    .context("building the attendance API client")?;
    info!(api_url = %client.base_url(), "Using attendance API");
    let service = Rc::new(client);

    let controller = SessionController::new(config.policy(), SystemClock);
    let mut runtime = KioskRuntime::new(controller, Rc::clone(&service));
    let handle = runtime.handle();
    spawn_local(probe_loop(
        Rc::clone(&service),
        config.probe_interval(),
        handle.clone(),
    ));
    spawn_local(read_terminal(handle));

    println!("Type ? for the list of commands.");
    let mut display = KioskDisplay::new();
    runtime
        .run(|controller, notices| display.show(controller, notices))
        .await;
    Ok(())
}

/// Turns operator input lines into events until stdin closes or `quit`.
async fn read_terminal(handle: KioskHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "Failed to read terminal input");
                break;
            }
        };
        let event = match ui::parse_command(&line) {
            Some(Input::Event(event)) => event,
            Some(Input::Capture(path)) => match tokio::fs::read(&path).await {
                Ok(bytes) if !bytes.is_empty() => Event::PhotoCaptured {
                    image: CapturedImage::new(bytes, Utc::now()),
                },
                Ok(_) => Event::CaptureFailed {
                    message: format!("{} is empty", path.display()),
                },
                Err(err) => Event::CaptureFailed {
                    message: format!("{}: {err}", path.display()),
                },
            },
            Some(Input::Usage) => {
                println!("{}", ui::USAGE);
                continue;
            }
            Some(Input::Quit) => break,
            None if line.trim().is_empty() => continue,
            None => {
                println!("Unknown command. Type ? for the list.");
                continue;
            }
        };
        if !handle.send(event) {
            return;
        }
    }
    handle.shutdown();
}

/// Scripted shift against the in-memory service.
struct Demo {
    runtime: KioskRuntime<StubService>,
    display: KioskDisplay,
    clock: ManualClock,
    heading: Style,
}

impl Demo {
    async fn act(&mut self, label: &str, event: Event, expect: Screen) {
        println!();
        println!("{}", self.heading.apply_to(format!("> {label}")));
        let mut notices = self.runtime.submit(event);
        notices.extend(
            self.runtime
                .run_until(|c| c.screen() == expect && !c.is_busy())
                .await,
        );
        self.display.show(self.runtime.controller(), &notices);
    }

    fn photo(&self) -> Event {
        Event::PhotoCaptured {
            image: CapturedImage::new(vec![0xff, 0xd8, 0xff, 0xe0], self.clock.now()),
        }
    }
}

async fn demo(config: KioskConfig) -> Result<()> {
    let clock = ManualClock::new(Utc::now());
    let service = Rc::new(StubService::demo(clock.clone()));
    let controller = SessionController::new(config.policy(), clock.clone());
    let mut demo = Demo {
        runtime: KioskRuntime::new(controller, service),
        display: KioskDisplay::new(),
        clock,
        heading: Style::new().magenta().bold(),
    };

    let login = Event::LoginSubmitted {
        email: "ops@agency.example".into(),
        password: "demo".into(),
    };
    demo.act("login ops@agency.example demo", login, Screen::EventSelection)
        .await;
    let choose = Event::EventChosen {
        event_id: "ev-1".into(),
    };
    demo.act("event ev-1", choose, Screen::StaffCheckIn).await;

    // On-time arrival.
    let pin = |pin: &str| Event::PinSubmitted { pin: pin.into() };
    demo.act("pin 1111", pin("1111"), Screen::PhotoConfirmation).await;
    demo.act("confirm", Event::ConfirmPhoto, Screen::Camera).await;
    let photo = demo.photo();
    demo.act("capture dana.jpg", photo, Screen::CheckInSuccess).await;
    demo.act("ok", Event::Acknowledge, Screen::StaffCheckIn).await;

    // Late arrival whose first photo does not match.
    demo.clock.advance(ChronoDuration::minutes(20));
    demo.runtime.service().push_face_results([false]);
    demo.act("pin 2222", pin("2222"), Screen::LateArrival).await;
    demo.act("ok", Event::Acknowledge, Screen::PhotoConfirmation).await;
    demo.act("confirm", Event::ConfirmPhoto, Screen::Camera).await;
    let photo = demo.photo();
    demo.act("capture lee.jpg", photo, Screen::CheckInError).await;
    demo.act("retake", Event::RetakePhoto, Screen::Camera).await;
    let photo = demo.photo();
    demo.act("capture lee-2.jpg", photo, Screen::CheckInSuccess).await;
    demo.act("ok", Event::Acknowledge, Screen::StaffCheckIn).await;

    // No assignment, then a repeat visit.
    demo.act("pin 3333", pin("3333"), Screen::StaffCheckIn).await;
    demo.act("pin 1111", pin("1111"), Screen::AlreadyCheckedIn).await;
    demo.act("retry", Event::TryAgain, Screen::StaffCheckIn).await;

    // Close check-in and run check-out.
    demo.clock.advance(ChronoDuration::hours(4));
    demo.act("end", Event::EndSession, Screen::CheckInComplete).await;
    demo.act("checkout", Event::BeginCheckOut, Screen::StaffCheckOut)
        .await;
    demo.act("pin 1111", pin("1111"), Screen::CheckOutSuccess).await;
    demo.act("ok", Event::Acknowledge, Screen::StaffCheckOut).await;
    demo.act("end", Event::EndSession, Screen::SessionEnded).await;
    demo.act("logout", Event::Logout, Screen::AdminLogin).await;
    Ok(())
}
