//! Controller layer for filedesk.
//!
//! [`FileManagerView`] owns the file page state and drives every user action through the
//! injected storage, analysis, clipboard and URL-opener collaborators. [`TwoFactorGate`]
//! decides whether a signed-in user still has to complete MFA verification.

pub mod guard;
pub mod mfa_gate;
pub mod platform;
pub mod state;
pub mod view;

pub use guard::OperationGuard;
pub use mfa_gate::{GateDecision, GateState, TwoFactorGate};
#[cfg(feature = "system-clipboard")]
pub use platform::SystemClipboard;
pub use platform::{Clipboard, MemoryClipboard, PrintOpener, SystemOpener, UrlOpener};
pub use state::ViewState;
pub use view::{FileManagerView, ViewOptions};
