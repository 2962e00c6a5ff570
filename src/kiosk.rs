//! Kiosk runtime: owns the [`SessionController`], performs the effects it
//! returns and feeds every completion back in as an [`Event`].
//!
//! All work runs on the current thread. Remote calls and timers are
//! `spawn_local` tasks, so a [`KioskRuntime`] must be driven from inside a
//! [`tokio::task::LocalSet`]. Each task reports back through one channel and
//! the runtime applies those reports one at a time.

use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::{JoinHandle, spawn_local};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api::{ApiError, AttendanceService};
use crate::error::ServiceFailure;
use crate::state_machine::{Effect, Event, Notice, NoticeLevel, SessionController};

enum Message {
    Dispatch(Event),
    Shutdown,
}

/// Cloneable sender for input sources (terminal, camera, probes).
#[derive(Clone)]
pub struct KioskHandle {
    tx: UnboundedSender<Message>,
}

impl KioskHandle {
    /// Queues an event. `false` once the runtime is gone.
    pub fn send(&self, event: Event) -> bool {
        self.tx.send(Message::Dispatch(event)).is_ok()
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(Message::Shutdown);
    }
}

pub struct KioskRuntime<S> {
    controller: SessionController,
    service: Rc<S>,
    tx: UnboundedSender<Message>,
    rx: UnboundedReceiver<Message>,
    countdown: Option<JoinHandle<()>>,
    auto_close: Option<JoinHandle<()>>,
}

impl<S> KioskRuntime<S>
where
    S: AttendanceService + 'static,
{
    pub fn new(controller: SessionController, service: Rc<S>) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            controller,
            service,
            tx,
            rx,
            countdown: None,
            auto_close: None,
        }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn service(&self) -> &Rc<S> {
        &self.service
    }

    pub fn handle(&self) -> KioskHandle {
        KioskHandle {
            tx: self.tx.clone(),
        }
    }

    /// Applies one event immediately and returns the notices it raised.
    pub fn submit(&mut self, event: Event) -> Vec<Notice> {
        let effects = self.controller.dispatch(event);
        self.execute(effects)
    }

    /// Waits for the next queued event and applies it. `None` on shutdown.
    pub async fn step(&mut self) -> Option<Vec<Notice>> {
        match self.rx.recv().await {
            Some(Message::Dispatch(event)) => Some(self.submit(event)),
            Some(Message::Shutdown) | None => None,
        }
    }

    /// Steps until `done` holds for the controller. Returns every notice
    /// raised on the way.
    pub async fn run_until<F>(&mut self, done: F) -> Vec<Notice>
    where
        F: Fn(&SessionController) -> bool,
    {
        let mut notices = Vec::new();
        while !done(&self.controller) {
            match self.step().await {
                Some(raised) => notices.extend(raised),
                None => break,
            }
        }
        notices
    }

    /// Main loop. `render` is called once up front and after every event.
    pub async fn run<R>(&mut self, mut render: R)
    where
        R: FnMut(&SessionController, &[Notice]),
    {
        info!(screen = %self.controller.screen(), "Kiosk started");
        render(&self.controller, &[]);
        while let Some(notices) = self.step().await {
            render(&self.controller, &notices);
        }
        self.stop_timers();
        info!("Kiosk stopped");
    }

    fn stop_timers(&mut self) {
        if let Some(task) = self.countdown.take() {
            task.abort();
        }
        if let Some(task) = self.auto_close.take() {
            task.abort();
        }
    }

    fn execute(&mut self, effects: Vec<Effect>) -> Vec<Notice> {
        let mut notices = Vec::new();
        for effect in effects {
            debug!(effect = effect_label(&effect), "Executing effect");
            match effect {
                Effect::Authenticate {
                    token,
                    email,
                    password,
                } => {
                    let service = Rc::clone(&self.service);
                    self.request(
                        "authenticate",
                        async move { service.authenticate(&email, &password).await },
                        move |result| Event::LoginCompleted { token, result },
                    );
                }
                Effect::LoadEvents { token } => {
                    let service = Rc::clone(&self.service);
                    self.request(
                        "list_events",
                        async move { service.list_events().await },
                        move |result| Event::EventsLoaded { token, result },
                    );
                }
                Effect::StartCheckInSession {
                    token,
                    event_id,
                    operator_id,
                } => {
                    let service = Rc::clone(&self.service);
                    self.request(
                        "start_check_in_session",
                        async move { service.start_check_in_session(&event_id, &operator_id).await },
                        move |result| Event::CheckInSessionStarted { token, result },
                    );
                }
                Effect::EndCheckInSession { session_id } => {
                    let service = Rc::clone(&self.service);
                    let id = session_id.clone();
                    self.request(
                        "end_check_in_session",
                        async move { service.end_check_in_session(&id).await },
                        move |result| Event::SessionCloseConfirmed { session_id, result },
                    );
                }
                Effect::LookupStaff {
                    token,
                    pin,
                    event_id,
                } => {
                    let service = Rc::clone(&self.service);
                    self.request(
                        "lookup_staff",
                        async move { service.lookup_staff(&pin, &event_id).await },
                        move |result| Event::StaffLookedUp { token, result },
                    );
                }
                Effect::InitiateCheckIn {
                    token,
                    staff_id,
                    event_id,
                    assignment_id,
                } => {
                    let service = Rc::clone(&self.service);
                    self.request(
                        "initiate_check_in",
                        async move {
                            service
                                .initiate_check_in(&staff_id, &event_id, &assignment_id)
                                .await
                                .map(|resp| resp.clock_entry_id)
                        },
                        move |result| Event::CheckInInitiated { token, result },
                    );
                }
                Effect::VerifyFace {
                    token,
                    clock_entry_id,
                    image,
                } => {
                    let service = Rc::clone(&self.service);
                    self.request(
                        "verify_face_photo",
                        async move {
                            service
                                .verify_face_photo(&clock_entry_id, &image.bytes)
                                .await
                                .map(|resp| resp.verified)
                        },
                        move |result| Event::FaceVerified { token, result },
                    );
                }
                Effect::RequestPinReset { token, identifier } => {
                    let service = Rc::clone(&self.service);
                    self.request(
                        "request_pin_reset",
                        async move { service.request_pin_reset(&identifier).await },
                        move |result| Event::PinResetCompleted { token, result },
                    );
                }
                Effect::StartCheckOutSession {
                    token,
                    event_id,
                    operator_id,
                } => {
                    let service = Rc::clone(&self.service);
                    self.request(
                        "start_check_out_session",
                        async move { service.start_check_out_session(&event_id, &operator_id).await },
                        move |result| Event::CheckOutSessionStarted { token, result },
                    );
                }
                Effect::CheckOut {
                    token,
                    pin,
                    event_id,
                    session_id,
                } => {
                    let service = Rc::clone(&self.service);
                    self.request(
                        "check_out",
                        async move { service.check_out(&pin, &event_id, &session_id).await },
                        move |result| Event::CheckedOut { token, result },
                    );
                }
                Effect::EndCheckOutSession { session_id } => {
                    let service = Rc::clone(&self.service);
                    let id = session_id.clone();
                    self.request(
                        "end_check_out_session",
                        async move { service.end_check_out_session(&id).await },
                        move |result| Event::SessionCloseConfirmed { session_id, result },
                    );
                }
                Effect::StartCountdown { token, secs } => {
                    if let Some(task) = self.countdown.take() {
                        task.abort();
                    }
                    let tx = self.tx.clone();
                    self.countdown = Some(spawn_local(async move {
                        for _ in 0..secs.max(1) {
                            sleep(Duration::from_secs(1)).await;
                            if tx.send(Message::Dispatch(Event::CountdownTick { token })).is_err() {
                                return;
                            }
                        }
                    }));
                }
                Effect::CancelCountdown => {
                    if let Some(task) = self.countdown.take() {
                        task.abort();
                    }
                }
                Effect::ScheduleAutoClose { session_id, at } => {
                    if let Some(task) = self.auto_close.take() {
                        task.abort();
                    }
                    let delay = (at - self.controller.now())
                        .to_std()
                        .unwrap_or(Duration::ZERO);
                    info!(session_id = %session_id, delay_secs = delay.as_secs(), "Auto-close scheduled");
                    let tx = self.tx.clone();
                    self.auto_close = Some(spawn_local(async move {
                        sleep(delay).await;
                        let _ = tx.send(Message::Dispatch(Event::AutoCloseDue { session_id }));
                    }));
                }
                Effect::CancelAutoClose => {
                    if let Some(task) = self.auto_close.take() {
                        task.abort();
                    }
                }
                Effect::Notify(notice) => {
                    match notice.level {
                        NoticeLevel::Warning | NoticeLevel::Error => {
                            warn!(message = %notice.message, "Notice")
                        }
                        NoticeLevel::Info | NoticeLevel::Success => {
                            debug!(message = %notice.message, "Notice")
                        }
                    }
                    notices.push(notice);
                }
            }
        }
        notices
    }

    /// Runs `call` in the background and reports its outcome as one event.
    fn request<T, Fut, W>(&self, operation: &'static str, call: Fut, wrap: W)
    where
        T: 'static,
        Fut: Future<Output = Result<T, ApiError>> + 'static,
        W: FnOnce(Result<T, ServiceFailure>) -> Event + 'static,
    {
        let tx = self.tx.clone();
        spawn_local(async move {
            let result = call.await.map_err(|err| {
                warn!(operation, error = %err, "Attendance request failed");
                ServiceFailure::from(err)
            });
            if tx.send(Message::Dispatch(wrap(result))).is_err() {
                debug!(operation, "Kiosk stopped before the response arrived");
            }
        });
    }
}

impl<S> Drop for KioskRuntime<S> {
    fn drop(&mut self) {
        if let Some(task) = self.countdown.take() {
            task.abort();
        }
        if let Some(task) = self.auto_close.take() {
            task.abort();
        }
    }
}

/// Log-safe name of an effect. Credentials and image bytes stay out of logs.
fn effect_label(effect: &Effect) -> &'static str {
    match effect {
        Effect::Authenticate { .. } => "authenticate",
        Effect::LoadEvents { .. } => "load_events",
        Effect::StartCheckInSession { .. } => "start_check_in_session",
        Effect::EndCheckInSession { .. } => "end_check_in_session",
        Effect::LookupStaff { .. } => "lookup_staff",
        Effect::InitiateCheckIn { .. } => "initiate_check_in",
        Effect::VerifyFace { .. } => "verify_face",
        Effect::RequestPinReset { .. } => "request_pin_reset",
        Effect::StartCheckOutSession { .. } => "start_check_out_session",
        Effect::CheckOut { .. } => "check_out",
        Effect::EndCheckOutSession { .. } => "end_check_out_session",
        Effect::StartCountdown { .. } => "start_countdown",
        Effect::CancelCountdown => "cancel_countdown",
        Effect::ScheduleAutoClose { .. } => "schedule_auto_close",
        Effect::CancelAutoClose => "cancel_auto_close",
        Effect::Notify(_) => "notify",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StubService;
    use crate::clock::ManualClock;
    use crate::escalation::ADMIN_HELP_TIMEOUT_NOTICE;
    use crate::state_machine::{CapturedImage, KioskPolicy, Screen};
    use chrono::{TimeZone, Utc};
    use tokio::task::LocalSet;
    use tokio::time::{Instant, timeout_at};

    fn runtime() -> (KioskRuntime<StubService>, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0).unwrap());
        let controller = SessionController::new(KioskPolicy::default(), clock.clone());
        let service = Rc::new(StubService::demo(clock.clone()));
        (KioskRuntime::new(controller, service), clock)
    }

    fn on(screen: Screen) -> impl Fn(&SessionController) -> bool {
        move |c| c.screen() == screen
    }

    /// Applies queued events for `dur` of (paused) time.
    async fn drain_for(rt: &mut KioskRuntime<StubService>, dur: Duration) -> Vec<Notice> {
        let deadline = Instant::now() + dur;
        let mut notices = Vec::new();
        while let Ok(Some(raised)) = timeout_at(deadline, rt.step()).await {
            notices.extend(raised);
        }
        notices
    }

    async fn signed_in_at_check_in(rt: &mut KioskRuntime<StubService>) {
        rt.submit(Event::LoginSubmitted {
            email: "ops@agency.example".into(),
            password: "demo".into(),
        });
        rt.run_until(|c| {
            matches!(
                c.state(),
                crate::state_machine::KioskState::EventSelection { events, .. } if !events.is_empty()
            )
        })
        .await;
        rt.submit(Event::EventChosen {
            event_id: "ev-1".into(),
        });
        rt.run_until(on(Screen::StaffCheckIn)).await;
    }

    async fn to_camera(rt: &mut KioskRuntime<StubService>) {
        rt.submit(Event::PinSubmitted { pin: "1111".into() });
        rt.run_until(on(Screen::PhotoConfirmation)).await;
        rt.submit(Event::ConfirmPhoto);
        rt.run_until(on(Screen::Camera)).await;
    }

    fn shot(clock: &ManualClock) -> Event {
        use crate::clock::Clock;
        Event::PhotoCaptured {
            image: CapturedImage::new(vec![0xff, 0xd8], clock.now()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn check_in_cycle_against_stub() {
        LocalSet::new()
            .run_until(async {
                let (mut rt, clock) = runtime();
                signed_in_at_check_in(&mut rt).await;
                to_camera(&mut rt).await;
                rt.submit(shot(&clock));
                rt.run_until(on(Screen::CheckInSuccess)).await;
                let shift = rt.controller().state().shift().unwrap();
                assert_eq!(shift.check_in.total_checked_in, 1);

                let started = Instant::now();
                rt.run_until(on(Screen::StaffCheckIn)).await;
                assert_eq!(started.elapsed(), Duration::from_secs(5));

                assert_eq!(
                    rt.service().calls(),
                    vec![
                        "authenticate",
                        "list_events",
                        "start_check_in_session",
                        "lookup_staff",
                        "initiate_check_in",
                        "verify_face_photo",
                    ]
                );
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn admin_help_times_out_once_after_two_minutes() {
        LocalSet::new()
            .run_until(async {
                let (mut rt, _) = runtime();
                signed_in_at_check_in(&mut rt).await;
                rt.submit(Event::GetHelp);
                assert_eq!(rt.controller().screen(), Screen::AdminHelp);

                let started = Instant::now();
                let notices = rt.run_until(on(Screen::StaffCheckIn)).await;
                assert_eq!(started.elapsed(), Duration::from_secs(120));
                assert_eq!(notices.len(), 1);
                assert_eq!(notices[0].message, ADMIN_HELP_TIMEOUT_NOTICE);

                let later = drain_for(&mut rt, Duration::from_secs(300)).await;
                assert!(later.is_empty());
                assert_eq!(rt.controller().screen(), Screen::StaffCheckIn);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_admin_help_timer() {
        LocalSet::new()
            .run_until(async {
                let (mut rt, _) = runtime();
                signed_in_at_check_in(&mut rt).await;
                rt.submit(Event::GetHelp);
                drain_for(&mut rt, Duration::from_secs(30)).await;
                let notices = rt.submit(Event::Cancel);
                assert!(notices.is_empty());
                let later = drain_for(&mut rt, Duration::from_secs(300)).await;
                assert!(later.is_empty());
                assert_eq!(rt.controller().screen(), Screen::StaffCheckIn);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn late_verification_result_is_discarded() {
        LocalSet::new()
            .run_until(async {
                let (mut rt, clock) = runtime();
                signed_in_at_check_in(&mut rt).await;
                to_camera(&mut rt).await;
                rt.service().set_latency(Duration::from_secs(3));
                rt.submit(shot(&clock));
                assert_eq!(rt.controller().screen(), Screen::FaceVerification);
                rt.submit(Event::Cancel);

                drain_for(&mut rt, Duration::from_secs(10)).await;
                assert_eq!(rt.controller().screen(), Screen::StaffCheckIn);
                let shift = rt.controller().state().shift().unwrap();
                assert_eq!(shift.check_in.total_checked_in, 0);
                assert!(rt.service().calls().contains(&"verify_face_photo"));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn auto_close_fires_when_idle() {
        LocalSet::new()
            .run_until(async {
                let (mut rt, _) = runtime();
                signed_in_at_check_in(&mut rt).await;

                let started = Instant::now();
                let notices = rt.run_until(on(Screen::CheckInComplete)).await;
                assert_eq!(started.elapsed(), Duration::from_secs(3600));
                assert_eq!(notices[0].message, "Check-in session closed automatically");

                drain_for(&mut rt, Duration::from_secs(1)).await;
                assert!(rt.service().calls().contains(&"end_check_in_session"));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_session_close_raises_warning() {
        LocalSet::new()
            .run_until(async {
                let (mut rt, _) = runtime();
                signed_in_at_check_in(&mut rt).await;
                rt.service().fail_next("end_check_in_session", "already closed");
                rt.submit(Event::EndSession);
                assert_eq!(rt.controller().screen(), Screen::CheckInComplete);

                let notices = drain_for(&mut rt, Duration::from_secs(1)).await;
                assert_eq!(notices.len(), 1);
                assert_eq!(notices[0].level, NoticeLevel::Warning);
                assert_eq!(rt.controller().screen(), Screen::CheckInComplete);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn handle_feeds_events_until_shutdown() {
        LocalSet::new()
            .run_until(async {
                let (mut rt, _) = runtime();
                let handle = rt.handle();
                assert!(handle.send(Event::ConnectivityChanged { online: false }));
                handle.shutdown();

                let mut frames = Vec::new();
                rt.run(|c, notices| frames.push((c.screen(), notices.len())))
                    .await;
                assert_eq!(frames, vec![(Screen::AdminLogin, 0), (Screen::AdminLogin, 1)]);
                assert!(!rt.controller().connectivity().online);
            })
            .await;
    }
}
