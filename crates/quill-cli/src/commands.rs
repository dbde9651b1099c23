use std::{path::Path, sync::Arc};

use nu_ansi_term::Color::{Green, Red};
use quill_builder::{assemble, OperationInput, OperationType, Variables};
use quill_client::GraphQLClient;
use quill_config::{generate_default_config, Config};
use quill_events::{Hooks, RequestStatus};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::{
    cli::Args,
    error::{CliError, CliResult},
    operation::{load_operation, with_overrides},
    utils::{parse_headers, read_file, Colored},
};

/// Builds a client for the selected profile, applying command-line
/// overrides on top of it.
pub fn create_client(args: &Args) -> CliResult<GraphQLClient> {
    let config = Config::new()?;
    let name = args
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile.clone());

    let mut profile = config.get_profile(&name)?.clone();
    if let Some(user_agent) = &args.user_agent {
        profile.user_agent = Some(user_agent.clone());
    }
    if let Some(proxy) = &args.proxy {
        profile.proxy = Some(proxy.clone());
    }

    let mut client = GraphQLClient::from_profile(&name, &profile)?;
    for (header, value) in parse_headers(&args.header)? {
        client.add_header(header, value);
    }

    client.add_listener(Arc::new(Hooks::new().on_response(|lc| {
        let status = match lc.status {
            RequestStatus::Success => Colored(Green, "ok"),
            _ => Colored(Red, "failed"),
        };
        debug!(
            "{} {} {} in {}ms",
            lc.request.method,
            lc.request.url,
            status,
            lc.duration.map(|d| d.as_millis()).unwrap_or_default()
        );
        Ok(())
    })));

    debug!("using profile `{name}` at {}", client.config().endpoint);
    Ok(client)
}

pub fn render_operation(
    file: &Path,
    kind: Option<OperationType>,
    name: Option<String>,
) -> CliResult<()> {
    let input = with_overrides(load_operation(file)?, kind, name);
    let operation = assemble(&input)?;
    println!("{}", serde_json::to_string_pretty(&operation)?);
    Ok(())
}

pub fn exec_operation(
    client: &GraphQLClient,
    file: &Path,
    kind: Option<OperationType>,
    name: Option<String>,
) -> CliResult<()> {
    let input = with_overrides(load_operation(file)?, kind, name);
    let data = dispatch(client, input)?;
    print_data(&data)
}

fn dispatch(client: &GraphQLClient, input: OperationInput) -> CliResult<JsonValue> {
    let data = match input.operation_type {
        OperationType::Query => client.query(input)?,
        OperationType::Mutation => client.mutate(input)?,
        OperationType::Subscription => client.subscribe(input)?,
    };
    Ok(data)
}

pub fn exec_raw(client: &GraphQLClient, document: &Path, variables: Option<&str>) -> CliResult<()> {
    let query = read_file(document)?;
    let variables = parse_variables(variables)?;
    let data: JsonValue = client.execute(&query, variables)?;
    print_data(&data)
}

/// Parses `--variables`; absent means an empty object.
pub fn parse_variables(variables: Option<&str>) -> CliResult<Variables> {
    let Some(text) = variables else {
        return Ok(Variables::new());
    };

    match serde_json::from_str::<JsonValue>(text)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(CliError::InvalidVariables(format!(
            "expected an object, got {other}"
        ))),
    }
}

fn print_data(data: &JsonValue) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

pub fn write_default_config() -> CliResult<()> {
    let path = generate_default_config()?;
    info!("Edit {} to point quill at your endpoint", path.display());
    Ok(())
}
