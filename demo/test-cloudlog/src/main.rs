/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint, value_parser};
use http::{HeaderValue, Method, Uri};
use log::info;
use slog::{Drain, slog_o};
use slog_scope::GlobalLoggerGuard;
use yaml_rust::YamlLoader;

use g3_cloudlog::{CloudLogClient, CloudLogConfig, RequestContext, SinkTarget};

const ARG_PROJECT: &str = "project";
const ARG_CONFIG: &str = "config";
const ARG_NAME: &str = "name";
const ARG_URL: &str = "url";
const ARG_TRACE: &str = "trace";
const ARG_ERROR: &str = "error";
const ARG_LOCAL: &str = "local";
const ARG_DISCARD: &str = "discard";

fn build_cli_args() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .arg(
            Arg::new(ARG_PROJECT)
                .help("Cloud project id")
                .long(ARG_PROJECT)
                .num_args(1)
                .required_unless_present(ARG_CONFIG),
        )
        .arg(
            Arg::new(ARG_CONFIG)
                .help("Yaml config file")
                .long(ARG_CONFIG)
                .short('c')
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new(ARG_NAME)
                .help("Log name of the request logger")
                .long(ARG_NAME)
                .num_args(1)
                .default_value("test-cloudlog"),
        )
        .arg(
            Arg::new(ARG_URL)
                .help("Request url put into the summary entry")
                .long(ARG_URL)
                .num_args(1)
                .value_parser(value_parser!(Uri))
                .default_value("/demo"),
        )
        .arg(
            Arg::new(ARG_TRACE)
                .help("Value of the X-Cloud-Trace-Context request header")
                .long(ARG_TRACE)
                .num_args(1),
        )
        .arg(
            Arg::new(ARG_ERROR)
                .help("Also emit an error entry")
                .long(ARG_ERROR)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_LOCAL)
                .help("Echo request entries to stderr")
                .long(ARG_LOCAL)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_DISCARD)
                .help("Drop all entries instead of writing them to stdout")
                .long(ARG_DISCARD)
                .action(ArgAction::SetTrue),
        )
}

fn load_config(path: &Path) -> anyhow::Result<CloudLogConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
    let docs = YamlLoader::load_from_str(&content)
        .map_err(|e| anyhow!("invalid yaml file {}: {e}", path.display()))?;
    let doc = docs
        .first()
        .ok_or_else(|| anyhow!("no yaml document found in {}", path.display()))?;
    CloudLogConfig::parse_yaml(doc).context(format!("invalid config file {}", path.display()))
}

fn build_config(args: &ArgMatches) -> anyhow::Result<CloudLogConfig> {
    let mut config = match args.get_one::<PathBuf>(ARG_CONFIG) {
        Some(path) => load_config(path)?,
        None => CloudLogConfig::new(""),
    };
    if let Some(project) = args.get_one::<String>(ARG_PROJECT) {
        config.set_project_id(project.to_string());
    }
    if args.get_flag(ARG_LOCAL) {
        config.set_local_echo(true);
    }
    if args.get_flag(ARG_DISCARD) {
        config.set_target(SinkTarget::Discard);
    }
    Ok(config)
}

fn setup_log(client: &CloudLogClient) -> anyhow::Result<GlobalLoggerGuard> {
    let drain = client.logger("process");
    let logger = slog::Logger::root(drain.fuse(), slog_o!("pid" => std::process::id()));

    let scope_guard = slog_scope::set_global_logger(logger);

    slog_stdlog::init_with_level(log::Level::Info)
        .map_err(|e| anyhow!("failed to set std logger: {e}"))?;
    Ok(scope_guard)
}

fn main() -> anyhow::Result<()> {
    let args = build_cli_args().get_matches();
    let config = build_config(&args)?;

    let client = CloudLogClient::configure(&config)?;
    let _logger_guard = setup_log(&client)?;

    info!("hostname label: {}", g3_cloudlog::host::hostname());

    let url = args.get_one::<Uri>(ARG_URL).cloned().unwrap_or_default();
    let mut request = RequestContext::new(Method::GET, url);
    if let Some(trace) = args.get_one::<String>(ARG_TRACE) {
        let value = HeaderValue::from_str(trace).context("invalid trace header value")?;
        request = request.with_header(g3_cloudlog::trace::CLOUD_TRACE_CONTEXT, value);
    }

    let name = args
        .get_one::<String>(ARG_NAME)
        .map(String::as_str)
        .unwrap_or("test-cloudlog");
    let mut logger = client.scoped_logger(request, name);
    logger.info("request started");
    if args.get_flag(ARG_ERROR) {
        let trace_id = logger.trace_id().to_string();
        logger.error_fmt(format_args!("request {trace_id} failed"));
        logger.set_response_status(500);
    } else {
        logger.set_response_status(200);
    }
    logger.partial_finish();
    logger.debug("about to finish");
    logger.finish().context("failed to flush request log")?;

    if let Some(stats) = client.stats() {
        eprintln!("{:?}", stats.snapshot());
    }
    Ok(())
}
