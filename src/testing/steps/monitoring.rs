//! Monitoring endpoint checks

use crate::common::Result;
use crate::testing::registry::{StepArgs, StepHandler, StepRegistry, World};
use crate::validators::response;

pub fn register(r: &mut StepRegistry) -> Result<()> {
    r.then(
        "the response should be lightweight for monitoring",
        StepHandler::Check(lightweight),
    )
}

fn lightweight(world: &World, _args: &StepArgs) -> Result<()> {
    response::lightweight(world.context.last_response()?)
}
