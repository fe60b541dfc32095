//! The sandboxed script runtime (C8-C14): loads TSL scripts, isolates
//! them, dispatches world events to them, and brokers their outbound API
//! calls to the host engine.

pub mod bridge;
pub mod commands;
pub mod compartment;
pub mod dispatcher;
pub mod linkbus;
pub mod manager;
pub mod timer;
pub mod worker;
