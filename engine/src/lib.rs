//! Aggregation engine for Beacon.
//!
//! One inbound view request becomes one [`Aggregator`] run:
//!
//! ```text
//! Idle ─► ProbingAuthenticating ─► Collecting ─► Assembling ─► Rendered
//!                 │                                  │
//!                 └──────────────► Failed ◄──────────┘
//! ```
//!
//! - [`probe`] - liveness probes, concurrent with the whole token path
//! - [`collect`] - stage three: validation, project, counts, price
//! - `assemble` - stage four: balances and entity lookups, then the merge
//! - [`render`] - the [`RenderSink`] trait and the file-backed template renderer
//! - [`watch`] / [`notify`] - the device watcher daemon and its SMTP alerts
//!
//! Every stage is a single join barrier over futures that each own one output
//! field. Nothing is shared between requests except read-only settings and the
//! HTTP connection pool.

mod aggregate;
mod assemble;
pub mod collect;
pub mod notify;
pub mod probe;
pub mod render;
pub mod stage;
pub mod watch;

pub use aggregate::{Aggregator, AggregatorSettings, RequestError, Sessions};
pub use collect::Collected;
pub use notify::{Notifier, NotifyError, SmtpNotifier, SmtpSettings};
pub use probe::{ProbeCheck, ProbeTarget, Prober, default_targets};
pub use render::{RenderError, RenderSink, TemplateRenderer, UNAVAILABLE};
pub use stage::{RequestStage, StageCursor, StageEdge, StageTransitionError};
pub use watch::{DeviceStatus, DeviceWatcher, WatchOutcome, WatcherSettings};

pub use beacon_types;
pub use beacon_upstream;
