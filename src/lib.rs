//! Per-tenant SLO governor — a latency-triggered circuit breaker for expensive features.
//!
//! sloguard watches how long an expensive operation takes for each tenant and
//! turns that operation off when tail latency breaches an objective. Each
//! tenant carries a small set of feature toggles, all on by default:
//!
//! | Flag | Gates | Default |
//! |------|-------|---------|
//! | `propagation_enabled` | Graph propagation during context injection (governed) | on |
//! | `slo_guard_enabled` | Whether latency is monitored at all | on |
//! | `edge_learning_enabled` | Background edge learning | on |
//!
//! # Architecture
//!
//! - **Flags**: in-memory tenant → toggles map behind one `RwLock`
//! - **Guard**: bounded FIFO of recent latencies per tenant, p95 estimate on
//!   every sample, cooldown after each trip
//! - **Admin API**: axum routes to read and write flags and inspect the guard
//!
//! All state is process-lifetime; instances do not coordinate.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`flags`] — Flag names, flag sets, and the per-tenant store
//! - [`guard`] — Latency window, clock, and the SLO circuit breaker
//! - [`governor`] — The handle request handlers use to check flags and report latency
//! - [`server`] — Admin HTTP routes
//! - [`replay`] — Offline what-if runs over latency traces

pub mod config;
pub mod error;
pub mod flags;
pub mod governor;
pub mod guard;
pub mod replay;
pub mod server;

pub use governor::Governor;
