//! Database health checks
//!
//! All checks read the last response recorded by a request step such as
//! `I make a GET request to "/health/database"`.

use crate::common::Result;
use crate::testing::registry::{StepArgs, StepHandler, StepRegistry, World};
use crate::validators::{batch, database, response};

pub fn register(r: &mut StepRegistry) -> Result<()> {
    r.then(
        "the JSON response should contain database information",
        StepHandler::Check(database_info),
    )?;
    r.then(
        "the JSON response should contain connection statistics",
        StepHandler::Check(connection_stats),
    )?;
    r.then(
        "the JSON response should contain a timestamp field",
        StepHandler::Check(timestamp),
    )?;
    r.then(
        "the database connection pool should be healthy",
        StepHandler::Check(pool_healthy),
    )?;
    r.then(
        "the connection statistics should be valid",
        StepHandler::Check(stats_valid),
    )?;
    r.then(
        "the connection statistics should include max_open_connections",
        StepHandler::Check(max_open_connections),
    )?;
    r.then(
        "the connection statistics should include current usage metrics",
        StepHandler::Check(usage_metrics),
    )?;
    r.then(
        "the database status should be {string}",
        StepHandler::Check(database_status),
    )?;
    r.then(
        "all database health requests should succeed",
        StepHandler::Check(all_database_requests_succeeded),
    )?;
    r.then(
        "all responses should contain valid connection statistics",
        StepHandler::Check(all_stats_valid),
    )?;
    Ok(())
}

fn database_info(world: &World, _args: &StepArgs) -> Result<()> {
    database::database_info(world.context.last_response()?)
}

fn connection_stats(world: &World, _args: &StepArgs) -> Result<()> {
    database::database_info_with_stats(world.context.last_response()?)
}

fn timestamp(world: &World, _args: &StepArgs) -> Result<()> {
    response::timestamp(world.context.last_response()?)
}

fn pool_healthy(world: &World, _args: &StepArgs) -> Result<()> {
    database::pool_healthy(world.context.last_response()?)
}

fn stats_valid(world: &World, _args: &StepArgs) -> Result<()> {
    database::connection_stats_valid(world.context.last_response()?)
}

fn max_open_connections(world: &World, _args: &StepArgs) -> Result<()> {
    database::max_open_connections(world.context.last_response()?)
}

fn usage_metrics(world: &World, _args: &StepArgs) -> Result<()> {
    database::usage_metrics(world.context.last_response()?)
}

fn database_status(world: &World, args: &StepArgs) -> Result<()> {
    database::database_status(world.context.last_response()?, args.str(0)?)
}

fn all_database_requests_succeeded(world: &World, _args: &StepArgs) -> Result<()> {
    batch::all_succeeded(world.context.last_batch()?)
}

fn all_stats_valid(world: &World, _args: &StepArgs) -> Result<()> {
    batch::all_connection_stats_valid(world.context.last_batch()?)
}
