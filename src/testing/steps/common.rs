//! Steps shared by every feature: server preconditions, plain HTTP
//! requests, and status checks

use futures_util::FutureExt;

use super::{send, send_batch};
use crate::common::Result;
use crate::http::RequestSpec;
use crate::testing::registry::{ActionFuture, StepArgs, StepHandler, StepRegistry, World};
use crate::validators::{batch, response};

pub fn register(r: &mut StepRegistry) -> Result<()> {
    r.given("the server is running", StepHandler::Check(server_is_running))?;
    r.given(
        "the server is running on port {int}",
        StepHandler::Check(server_is_running_on_port),
    )?;

    r.when("I make a GET request to {string}", StepHandler::Action(get_request))?;
    r.when(
        "I make a POST request to {string} with content type {string} and body {string}",
        StepHandler::Action(post_request),
    )?;
    r.when(
        "I make {int} concurrent requests to {string}",
        StepHandler::Action(concurrent_get),
    )?;
    r.when(
        "I make {int} concurrent GET requests to {string}",
        StepHandler::Action(concurrent_get),
    )?;

    r.then(
        "the HTTP response status should be {int}",
        StepHandler::Check(status_should_be),
    )?;
    r.then("the HTTP status should be {int}", StepHandler::Check(status_should_be))?;
    r.then(
        "the response status should not be {int}",
        StepHandler::Check(status_should_not_be),
    )?;
    r.then(
        "the JSON response should contain status {string}",
        StepHandler::Check(status_field_should_be),
    )?;
    r.then(
        "the response should contain status {string}",
        StepHandler::Check(status_field_should_be),
    )?;
    r.then(
        "the response should contain field {string} with value {string}",
        StepHandler::Check(field_should_have_value),
    )?;
    r.then(
        "the content type should be {string}",
        StepHandler::Check(content_type_should_be),
    )?;
    r.then("all requests should succeed", StepHandler::Check(all_succeeded))?;
    r.then(
        "all responses should contain status {string}",
        StepHandler::Check(all_status_fields),
    )?;
    Ok(())
}

/// The readiness gate already ran when the session was created
fn server_is_running(_world: &World, _args: &StepArgs) -> Result<()> {
    Ok(())
}

fn server_is_running_on_port(world: &World, args: &StepArgs) -> Result<()> {
    let requested = args.int(0)?;
    let configured = world.session.config().server.port;
    if requested != i64::from(configured) {
        tracing::warn!(
            requested,
            configured,
            "scenario names a different port; using the configured one"
        );
    }
    Ok(())
}

fn get_request<'a>(world: &'a mut World, args: &'a StepArgs) -> ActionFuture<'a> {
    async move {
        let path = args.str(0)?;
        send(world, RequestSpec::get(path)).await
    }
    .boxed()
}

fn post_request<'a>(world: &'a mut World, args: &'a StepArgs) -> ActionFuture<'a> {
    async move {
        let spec = RequestSpec::post(args.str(0)?, args.str(2)?)
            .with_header("Content-Type", args.str(1)?);
        send(world, spec).await
    }
    .boxed()
}

fn concurrent_get<'a>(world: &'a mut World, args: &'a StepArgs) -> ActionFuture<'a> {
    async move {
        let count = args.count(0)?;
        let path = args.str(1)?;
        send_batch(world, count, RequestSpec::get(path)).await
    }
    .boxed()
}

fn status_should_be(world: &World, args: &StepArgs) -> Result<()> {
    response::status_code(world.context.last_response()?, args.status(0)?)
}

fn status_should_not_be(world: &World, args: &StepArgs) -> Result<()> {
    response::status_code_not(world.context.last_response()?, args.status(0)?)
}

fn status_field_should_be(world: &World, args: &StepArgs) -> Result<()> {
    response::status_field(world.context.last_response()?, args.str(0)?)
}

fn field_should_have_value(world: &World, args: &StepArgs) -> Result<()> {
    response::field_value(world.context.last_response()?, args.str(0)?, args.str(1)?)
}

fn content_type_should_be(world: &World, args: &StepArgs) -> Result<()> {
    response::content_type(world.context.last_response()?, args.str(0)?)
}

fn all_succeeded(world: &World, _args: &StepArgs) -> Result<()> {
    batch::all_succeeded(world.context.last_batch()?)
}

fn all_status_fields(world: &World, args: &StepArgs) -> Result<()> {
    batch::all_status_field(world.context.last_batch()?, args.str(0)?)
}
