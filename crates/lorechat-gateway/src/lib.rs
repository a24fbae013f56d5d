//! Real-time chat core: who is connected as which character, who is in
//! which channel, and getting every event to the right outbound queue.
//!
//! Locking discipline: all shared state lives in one
//! `parking_lot::Mutex<Tables>` owned by the [`Dispatcher`]. Every operation
//! takes it once, never across an `.await`. Fan-out only enqueues onto
//! bounded per-connection queues with `try_send`; the socket write to the
//! remote peer happens in each connection's writer task, outside the lock.

pub mod channels;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod gateway;
pub mod outbox;
pub mod presence;
pub mod registry;
pub mod router;

pub use config::GatewayConfig;
pub use dispatcher::{Departure, Dispatcher};
pub use gateway::{ChatGateway, Services, SessionState};
pub use outbox::{Delivery, Outbox};
