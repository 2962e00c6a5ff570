mod candidate;
mod controller;
mod event;
mod session;
mod state;

pub use candidate::{
    Candidate, CapturedImage, CheckOutReceipt, ClockEntry, ErrorContext, ErrorKind, OpenEntry,
    StaffLookup, StaffRecord,
};
pub use controller::{KioskPolicy, SessionController};
pub use event::{Effect, Event, Generation, Notice, NoticeLevel};
pub use session::{
    CheckInSession, CheckOutSession, EventContext, LifecyclePolicy, MAX_AUTO_CLOSE_MINUTES,
    Operator, SessionInfo, SessionStatus, SessionSummary,
};
pub use state::{ActiveShift, KioskState, Mode, RetryContext, Screen, Step};
