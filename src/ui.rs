//! Interface de terminal do quiosque: telas em texto, avisos coloridos e
//! spinner de espera.
//!
//! [`render`] é uma função pura do estado do controlador para texto; o
//! [`KioskDisplay`] cuida das cores (`console`) e do spinner (`indicatif`)
//! enquanto uma requisição está pendente. [`parse_command`] traduz as linhas
//! digitadas pelo operador em eventos.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::state_machine::{
    Event, KioskState, Notice, NoticeLevel, SessionController, SessionSummary, Step,
};

/// Resultado da leitura de uma linha de comando do operador.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Evento pronto para o controlador.
    Event(Event),
    /// Captura a partir de um arquivo JPEG; lido pelo chamador.
    Capture(PathBuf),
    /// Mostra a lista de comandos.
    Usage,
    Quit,
}

pub const USAGE: &str = "\
Commands:
  login <email> <password>   sign in as operator
  event <id>                 start check-in for an event
  pin <pin>                  submit a staff PIN
  ok                         acknowledge / continue
  confirm | reject           answer the photo confirmation
  capture <file.jpg>         take the face photo from a file
  retake | retry             after a failure (retry also reloads events)
  help                       ask for an administrator
  cancel                     abandon the current step
  forgot | reset <contact>   PIN recovery
  end                        end the current session
  checkout | finish          after check-in has ended
  switch | logout            after the shift has ended
  quit                       leave the kiosk";

/// Interpreta uma linha digitada. `None` para linhas vazias ou comandos
/// desconhecidos.
pub fn parse_command(line: &str) -> Option<Input> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let event = match verb.to_ascii_lowercase().as_str() {
        "" => return None,
        "?" | "commands" => return Some(Input::Usage),
        "quit" | "exit" => return Some(Input::Quit),
        "capture" if !rest.is_empty() => return Some(Input::Capture(PathBuf::from(rest))),
        "login" => {
            let (email, password) = rest.split_once(char::is_whitespace)?;
            Event::LoginSubmitted {
                email: email.to_string(),
                password: password.trim().to_string(),
            }
        }
        "event" if !rest.is_empty() => Event::EventChosen {
            event_id: rest.to_string(),
        },
        // Empty PINs still reach the controller, which explains the problem.
        "pin" => Event::PinSubmitted {
            pin: rest.to_string(),
        },
        "reset" => Event::PinResetRequested {
            identifier: rest.to_string(),
        },
        "ok" => Event::Acknowledge,
        "confirm" => Event::ConfirmPhoto,
        "reject" => Event::RejectPhoto,
        "retake" => Event::RetakePhoto,
        "retry" => Event::TryAgain,
        "help" => Event::GetHelp,
        "cancel" => Event::Cancel,
        "forgot" => Event::ForgotPin,
        "end" => Event::EndSession,
        "finish" => Event::FinishShift,
        "checkout" => Event::BeginCheckOut,
        "switch" => Event::SelectAnotherEvent,
        "logout" => Event::Logout,
        _ => return None,
    };
    Some(Input::Event(event))
}

/// Desenha a tela atual como texto simples.
pub fn render(controller: &SessionController) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", controller.screen());

    if let Some(shift) = controller.state().shift() {
        let mut context = format!(
            "{} | mode: {} | checked in: {}",
            shift.event.name,
            controller.mode(),
            shift.check_in.total_checked_in
        );
        if let Some(check_out) = &shift.check_out {
            let _ = write!(context, " | checked out: {}", check_out.total_checked_out);
        }
        let _ = writeln!(out, "{context}");
    }
    if !controller.connectivity().online {
        let _ = writeln!(out, "[offline] Check-ins need a network connection.");
    }

    match controller.state() {
        KioskState::AdminLogin => {
            let _ = writeln!(out, "Operator sign-in: login <email> <password>");
        }
        KioskState::EventSelection { operator, events, chosen } => {
            let _ = writeln!(out, "Signed in as {}", operator.name);
            if let Some(event) = chosen {
                let _ = writeln!(out, "Starting check-in for {}...", event.name);
            } else if events.is_empty() {
                let _ = writeln!(out, "No events loaded. Type retry to reload.");
            } else {
                for event in events {
                    let _ = writeln!(
                        out,
                        "  {}  {}  {}",
                        event.id,
                        event.name,
                        event.starts_at.format("%Y-%m-%d %H:%M")
                    );
                }
                let _ = writeln!(out, "Choose one: event <id>");
            }
        }
        KioskState::Active(shift) => render_step(&mut out, &shift.step),
        KioskState::SessionEnded { summary, .. } => {
            render_summary(&mut out, summary);
            let _ = writeln!(out, "switch: choose another event | logout: sign out");
        }
    }

    if let Some(countdown) = controller.countdown() {
        if !countdown.is_expired() {
            let _ = writeln!(out, "(continuing in {}s)", countdown.remaining_secs());
        }
    }
    out
}

fn render_step(out: &mut String, step: &Step) {
    let _ = match step {
        Step::StaffCheckIn => writeln!(
            out,
            "Welcome! Enter your PIN to check in: pin <pin>\n(forgot: reset your PIN | help: ask an admin | end: close check-in)"
        ),
        Step::ForgotPin => writeln!(
            out,
            "Forgot your PIN? Enter your email or phone: reset <contact>  (cancel to go back)"
        ),
        Step::LateArrival {
            candidate,
            minutes_late,
        } => writeln!(
            out,
            "{}, you are {} minutes late. Your manager will be notified.\nok: continue",
            candidate.name, minutes_late
        ),
        Step::PhotoConfirmation { candidate } => writeln!(
            out,
            "Is this you, {}?{}\nconfirm | reject",
            candidate.name,
            candidate
                .photo_url
                .as_deref()
                .map(|url| format!("\nProfile photo: {url}"))
                .unwrap_or_default()
        ),
        Step::Camera { candidate, .. } => writeln!(
            out,
            "{}, look at the camera: capture <file.jpg>",
            candidate.name
        ),
        Step::FaceVerification { candidate, .. } => {
            writeln!(out, "Verifying {}...", candidate.name)
        }
        Step::CheckInSuccess { name, entry } => writeln!(
            out,
            "Welcome, {name}! Checked in at {}.",
            entry.checked_in_at.format("%H:%M")
        ),
        Step::CheckInError { error, retry } => writeln!(
            out,
            "{}\n{}help: ask an admin",
            error.message,
            if retry.is_some() {
                "retake: new photo | retry: start over | "
            } else {
                "retry: start over | "
            }
        ),
        Step::AlreadyCheckedIn {
            name,
            checked_in_at,
        } => writeln!(
            out,
            "{name}, you already checked in at {}.",
            checked_in_at.format("%H:%M")
        ),
        Step::AdminHelp { reason } => writeln!(
            out,
            "An administrator has been called: {}\nok: resolved | cancel: back",
            reason.describe()
        ),
        Step::VerificationDenied { name, error } => {
            writeln!(out, "{name}: {}\nhelp: ask an admin | ok: back", error.message)
        }
        Step::CheckInComplete { summary } => {
            render_summary(out, summary);
            writeln!(out, "checkout: start check-out | finish: end the shift")
        }
        Step::StaffCheckOut => writeln!(
            out,
            "Check-out: enter your PIN: pin <pin>\n(help: ask an admin | end: close check-out)"
        ),
        Step::CheckOutSuccess { receipt } => writeln!(
            out,
            "Goodbye, {}! Checked out at {}.",
            receipt.staff_name,
            receipt.checked_out_at.format("%H:%M")
        ),
    };
}

fn render_summary(out: &mut String, summary: &SessionSummary) {
    let _ = writeln!(
        out,
        "{}: {} - {}",
        summary.event_name,
        summary.started_at.format("%H:%M"),
        summary.ended_at.format("%H:%M")
    );
    let _ = writeln!(out, "Checked in: {}", summary.total_checked_in);
    if let Some(out_count) = summary.total_checked_out {
        let _ = writeln!(out, "Checked out: {out_count}");
    }
    if let Some(on_site) = summary.still_on_site().filter(|n| *n > 0) {
        let _ = writeln!(out, "Still on site: {on_site}");
    }
}

/// Saída colorida da tela e spinner enquanto o servidor responde.
pub struct KioskDisplay {
    // Spinner ativo enquanto há requisição pendente.
    spinner: Option<ProgressBar>,
    green: Style,
    red: Style,
    yellow: Style,
    cyan: Style,
}

impl Default for KioskDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl KioskDisplay {
    pub fn new() -> Self {
        Self {
            spinner: None,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan(),
        }
    }

    /// Imprime os avisos e a tela atual; inicia o spinner se o controlador
    /// estiver aguardando uma resposta.
    pub fn show(&mut self, controller: &SessionController, notices: &[Notice]) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
        for notice in notices {
            println!("{}", self.format_notice(notice));
        }
        println!();
        print!("{}", self.cyan.apply_to(render(controller)));
        if controller.is_busy() {
            self.spinner = Some(Self::spinner());
        }
    }

    pub fn format_notice(&self, notice: &Notice) -> String {
        match notice.level {
            NoticeLevel::Success => format!("  {} {}", self.green.apply_to("✓"), notice.message),
            NoticeLevel::Error => format!("  {} {}", self.red.apply_to("✗"), notice.message),
            NoticeLevel::Warning => format!("  {} {}", self.yellow.apply_to("!"), notice.message),
            NoticeLevel::Info => format!("  · {}", notice.message),
        }
    }

    fn spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Waiting for the server...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

impl Drop for KioskDisplay {
    fn drop(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ServiceFailure;
    use crate::state_machine::{
        EventContext, KioskPolicy, Operator, SessionInfo, StaffLookup, StaffRecord,
    };
    use chrono::{TimeZone, Utc};

    fn at(h: u32, m: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, h, m, 0).unwrap()
    }

    fn checking_in(now: chrono::DateTime<Utc>) -> SessionController {
        let mut c = SessionController::new(KioskPolicy::default(), ManualClock::new(now));
        c.dispatch(Event::LoginSubmitted {
            email: "ops@agency.example".into(),
            password: "pw".into(),
        });
        c.dispatch(Event::LoginCompleted {
            token: c.generation(),
            result: Ok(Operator {
                id: "op-1".into(),
                name: "Sam Ortiz".into(),
            }),
        });
        c.dispatch(Event::EventsLoaded {
            token: c.generation(),
            result: Ok(vec![EventContext {
                id: "ev-1".into(),
                name: "Gala Dinner".into(),
                starts_at: at(18, 0),
                ends_at: at(23, 0),
            }]),
        });
        c.dispatch(Event::EventChosen {
            event_id: "ev-1".into(),
        });
        c.dispatch(Event::CheckInSessionStarted {
            token: c.generation(),
            result: Ok(SessionInfo {
                id: "cis-1".into(),
                started_at: now,
            }),
        });
        c
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_command("login ops@agency.example s3cret"),
            Some(Input::Event(Event::LoginSubmitted {
                email: "ops@agency.example".into(),
                password: "s3cret".into(),
            }))
        );
        assert_eq!(
            parse_command("  pin 4821 "),
            Some(Input::Event(Event::PinSubmitted { pin: "4821".into() }))
        );
        assert_eq!(parse_command("OK"), Some(Input::Event(Event::Acknowledge)));
        assert_eq!(
            parse_command("capture shots/dana 1.jpg"),
            Some(Input::Capture(PathBuf::from("shots/dana 1.jpg")))
        );
        assert_eq!(parse_command("quit"), Some(Input::Quit));
        assert_eq!(parse_command("?"), Some(Input::Usage));
    }

    #[test]
    fn rejects_unknown_or_incomplete_commands() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("dance"), None);
        assert_eq!(parse_command("login onlyemail"), None);
        assert_eq!(parse_command("event"), None);
        assert_eq!(parse_command("capture"), None);
    }

    #[test]
    fn renders_login_screen() {
        let c = SessionController::new(KioskPolicy::default(), ManualClock::new(at(17, 0)));
        let text = render(&c);
        assert!(text.starts_with("== ADMIN_LOGIN =="));
        assert!(text.contains("login <email> <password>"));
    }

    #[test]
    fn renders_check_in_context() {
        let c = checking_in(at(17, 30));
        let text = render(&c);
        assert!(text.contains("== STAFF_CHECK_IN =="));
        assert!(text.contains("Gala Dinner | mode: checkin | checked in: 0"));
    }

    #[test]
    fn renders_late_arrival_minutes() {
        let mut c = checking_in(at(18, 20));
        c.dispatch(Event::PinSubmitted { pin: "1".into() });
        c.dispatch(Event::StaffLookedUp {
            token: c.generation(),
            result: Ok(StaffLookup {
                staff: StaffRecord {
                    id: "st-9".into(),
                    name: "Dana Reyes".into(),
                    photo_url: None,
                    notes: Some("Assignment ID: asg-77".into()),
                },
                open_entry: None,
            }),
        });
        assert!(render(&c).contains("Dana Reyes, you are 20 minutes late."));
    }

    #[test]
    fn renders_countdown_and_offline_marker() {
        let mut c = checking_in(at(17, 30));
        c.dispatch(Event::GetHelp);
        c.dispatch(Event::ConnectivityChanged { online: false });
        let text = render(&c);
        assert!(text.contains("Assistance requested"));
        assert!(text.contains("(continuing in 120s)"));
        assert!(text.contains("[offline]"));
    }

    #[test]
    fn renders_summary_on_check_in_complete() {
        let mut c = checking_in(at(17, 30));
        c.dispatch(Event::EndSession);
        let text = render(&c);
        assert!(text.contains("Checked in: 0"));
        assert!(text.contains("checkout: start check-out"));
    }

    #[test]
    fn notice_formatting_keeps_message() {
        let display = KioskDisplay::new();
        let text = display.format_notice(&Notice::error(
            ServiceFailure::new("Rate limit exceeded").user_message(),
        ));
        assert!(text.contains("Too many attempts. Please wait a moment and try again."));
    }
}
