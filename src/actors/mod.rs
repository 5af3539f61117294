//! Actor-based runtime
//!
//! Each actor runs as an independent tokio task and is driven through a
//! cloneable handle.
//!
//! ## Architecture Overview
//!
//! ```text
//!                 +--------------------+
//!                 |   binary (main)    |
//!                 +---------+----------+
//!                           | spawns
//!        +------------------+--------------------+
//!        |                  |                    |
//! +------v---------+  +-----v-------+   +--------v--------+
//! | CollectorActor |  | AlertActor  |   | ReportActor x N |
//! | (PollCycle)    |  |             |   | (one per time)  |
//! +------+---------+  +-----^-------+   +--------+--------+
//!        |                  |                    |
//!        | CycleEvent       | subscribe          | reads
//!        +---> broadcast ---+                    |
//!        |                                       |
//!        | writes       +-------------------+    |
//!        +------------> | ChannelAggregates | <--+
//!                       +-------------------+
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: each actor has an mpsc command channel
//! 2. **Events**: the collector publishes cycle reports on a broadcast channel
//! 3. **Request/Response**: oneshot channels for replies

pub mod alert;
pub mod collector;
pub mod messages;
pub mod reporter;
