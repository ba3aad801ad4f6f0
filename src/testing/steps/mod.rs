//! Built-in step definitions
//!
//! Grouped by the area of the service they exercise. Actions record their
//! results in the scenario context; checks read them back and delegate to
//! [`crate::validators`].

pub mod common;
pub mod connect;
pub mod database;
pub mod monitoring;

use super::context::{ContextValue, BATCH_KEY, RESPONSE_KEY};
use super::registry::{StepRegistry, World};
use crate::common::Result;
use crate::http::{run_concurrent, RequestSpec};

/// Register every built-in step
pub fn register_all(registry: &mut StepRegistry) -> Result<()> {
    common::register(registry)?;
    connect::register(registry)?;
    database::register(registry)?;
    monitoring::register(registry)?;
    Ok(())
}

/// Issue one request and record its outcome as the scenario's response
pub(crate) async fn send(world: &mut World, spec: RequestSpec) -> Result<()> {
    let outcome = world.session.driver().request(&spec).await;
    world
        .context
        .set(RESPONSE_KEY, ContextValue::Outcome(outcome));
    Ok(())
}

/// Issue `count` concurrent copies of a request and record the batch
pub(crate) async fn send_batch(world: &mut World, count: usize, spec: RequestSpec) -> Result<()> {
    let timeout = world.session.config().requests.concurrent_timeout();
    let batch = run_concurrent(world.session.driver(), count, &spec, timeout).await;
    world.context.set(BATCH_KEY, ContextValue::Batch(batch));
    Ok(())
}
