//! Steps for the Connect RPC surface of the health service
//!
//! Requests are unary Connect calls over HTTP/JSON: a POST to
//! `/<service>/<method>` with an empty JSON message.

use futures_util::FutureExt;

use super::{send, send_batch};
use crate::common::Result;
use crate::http::{RequestSpec, HEALTH_SERVICE, JSON_CONTENT_TYPE};
use crate::testing::registry::{ActionFuture, StepArgs, StepHandler, StepRegistry, World};
use crate::validators::{batch, response, SERVING_STATUS};

const CHECK_METHOD: &str = "Check";
const MISSING_METHOD: &str = "NonExistentMethod";

pub fn register(r: &mut StepRegistry) -> Result<()> {
    r.when(
        "I make a health check request using Connect-Go client",
        StepHandler::Action(health_check),
    )?;
    r.when(
        "I make a health check request using HTTP/JSON",
        StepHandler::Action(health_check),
    )?;
    r.when(
        "I make a health check request with invalid content type",
        StepHandler::Action(health_check_plain_text),
    )?;
    r.when(
        "I make a request to a non-existent endpoint",
        StepHandler::Action(missing_method),
    )?;
    r.when(
        "I make {int} concurrent health check requests",
        StepHandler::Action(concurrent_health_checks),
    )?;

    r.then(
        "the response should indicate SERVING status",
        StepHandler::Check(indicates_serving),
    )?;
    r.then("the response should not be empty", StepHandler::Check(not_empty))?;
    r.then(
        "the JSON response should contain SERVING_STATUS_SERVING",
        StepHandler::Check(contains_serving),
    )?;
    r.then(
        "the server should reject the request",
        StepHandler::Check(rejected),
    )?;
    r.then("the request should fail", StepHandler::Check(request_failed))?;
    r.then(
        "all responses should indicate SERVING status",
        StepHandler::Check(all_serving),
    )?;
    r.then(
        "the response should contain proper Connect-Go headers",
        StepHandler::Check(connect_headers),
    )?;
    Ok(())
}

fn check_request() -> RequestSpec {
    RequestSpec::connect_unary(HEALTH_SERVICE, CHECK_METHOD)
        .with_header("Content-Type", JSON_CONTENT_TYPE)
}

fn health_check<'a>(world: &'a mut World, _args: &'a StepArgs) -> ActionFuture<'a> {
    send(world, check_request()).boxed()
}

fn health_check_plain_text<'a>(world: &'a mut World, _args: &'a StepArgs) -> ActionFuture<'a> {
    let spec = RequestSpec::connect_unary(HEALTH_SERVICE, CHECK_METHOD)
        .with_header("Content-Type", "text/plain");
    send(world, spec).boxed()
}

fn missing_method<'a>(world: &'a mut World, _args: &'a StepArgs) -> ActionFuture<'a> {
    let spec = RequestSpec::connect_unary(HEALTH_SERVICE, MISSING_METHOD)
        .with_header("Content-Type", JSON_CONTENT_TYPE);
    send(world, spec).boxed()
}

fn concurrent_health_checks<'a>(world: &'a mut World, args: &'a StepArgs) -> ActionFuture<'a> {
    async move {
        let count = args.count(0)?;
        send_batch(world, count, check_request()).await
    }
    .boxed()
}

fn indicates_serving(world: &World, _args: &StepArgs) -> Result<()> {
    response::serving(world.context.last_response()?)
}

fn not_empty(world: &World, _args: &StepArgs) -> Result<()> {
    response::not_empty(world.context.last_response()?)
}

fn contains_serving(world: &World, _args: &StepArgs) -> Result<()> {
    response::status_field(world.context.last_response()?, SERVING_STATUS)
}

fn rejected(world: &World, _args: &StepArgs) -> Result<()> {
    response::rejected(world.context.last_response()?)
}

fn request_failed(world: &World, _args: &StepArgs) -> Result<()> {
    response::request_failed(world.context.last_response()?)
}

fn all_serving(world: &World, _args: &StepArgs) -> Result<()> {
    batch::all(world.context.last_batch()?, |r| {
        response::status_field(r, SERVING_STATUS)
    })
}

fn connect_headers(world: &World, _args: &StepArgs) -> Result<()> {
    response::json_content_type(world.context.last_response()?)
}
