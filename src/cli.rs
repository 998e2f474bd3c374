use crate::demo;
use crate::dispatcher::dispatch;
use crate::error::Error;
use crate::registry::Registry;
use crate::route::{route_key, HttpMethod, RequestEnvelope};
use crate::serializer::write_to_file;
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use serde_json::Value;
use std::path::PathBuf;

/// Dispatch one request against the demo API and print the result
#[derive(Parser, Debug)]
#[command(name = "openapi-route-map")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Route key to dispatch, as "METHOD /path"
    #[arg(short = 'r', long = "route", default_value = "GET /openapi.yml")]
    pub route: String,

    /// Request payload as JSON text
    #[arg(short = 'p', long = "payload", value_name = "JSON")]
    pub payload: Option<String>,

    /// Path parameter (repeatable)
    #[arg(long = "path-param", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    pub path_params: Vec<(String, String)>,

    /// Query parameter (repeatable)
    #[arg(
        short = 'q',
        long = "query",
        value_name = "NAME=VALUE",
        value_parser = parse_key_value
    )]
    pub query_params: Vec<(String, String)>,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    split_route_key(&args.route)?;
    if let Some(payload) = &args.payload {
        serde_json::from_str::<Value>(payload).context("Payload is not valid JSON")?;
    }

    info!("Route: {}", args.route);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

fn split_route_key(route_key: &str) -> Result<(HttpMethod, &str)> {
    let (method, path) = route_key
        .split_once(' ')
        .with_context(|| format!("Route must look like \"METHOD /path\", got '{}'", route_key))?;
    let method = method.parse::<HttpMethod>()?;
    Ok((method, path))
}

/// Build the request envelope described by the arguments
pub fn build_envelope(args: &CliArgs) -> Result<RequestEnvelope> {
    let (method, path) = split_route_key(&args.route)?;
    let mut envelope = RequestEnvelope::new(method, path);

    if let Some(payload) = &args.payload {
        let payload = serde_json::from_str(payload).context("Payload is not valid JSON")?;
        envelope = envelope.with_payload(payload);
    }
    for (name, value) in &args.path_params {
        envelope = envelope.with_path_param(name.as_str(), value.as_str());
    }
    for (name, value) in &args.query_params {
        envelope = envelope.with_query_param(name.as_str(), value.as_str());
    }

    Ok(envelope)
}

/// Run the main workflow
pub async fn run(args: CliArgs) -> Result<()> {
    info!("Compiling demo routes...");
    let registry = Registry::default();
    let route_map = demo::route_map(&registry)?;
    info!("{} routes available, {} documented", route_map.len(), registry.len());

    let (method, path) = split_route_key(&args.route)?;
    let route_key = route_key(method, path);
    let envelope = build_envelope(&args)?;
    let result = match dispatch(&route_map, &route_key, envelope).await {
        Ok(result) => result,
        Err(Error::RequestValidation(issues)) => {
            for issue in &issues {
                warn!("{}", issue);
            }
            anyhow::bail!("Request rejected with {} validation issue(s)", issues.len());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Dispatching {} failed", route_key));
        }
    };

    info!("{} answered {}", route_key, result.code);
    let Some(body) = result.body else {
        info!("No response body");
        return Ok(());
    };

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&body, output_path)
            .with_context(|| format!("Failed to write to file: {}", output_path.display()))?;
        info!("Successfully wrote response body to {}", output_path.display());
    } else {
        println!("{}", body);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn args(argv: &[&str]) -> CliArgs {
        let argv = std::iter::once("openapi-route-map").chain(argv.iter().copied());
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_to_document_route() {
        let parsed = args(&[]);
        assert_eq!(parsed.route, "GET /openapi.yml");
        assert!(parsed.payload.is_none());
        assert!(!parsed.verbose);
    }

    #[test]
    fn test_key_value_parsing() {
        assert_eq!(
            parse_key_value("who=World").unwrap(),
            ("who".to_string(), "World".to_string())
        );
        assert_eq!(parse_key_value("a=b=c").unwrap(), ("a".to_string(), "b=c".to_string()));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_build_envelope() {
        let parsed = args(&[
            "--route",
            "GET /my-route/{who}",
            "--path-param",
            "who=World",
            "-q",
            "page=2",
        ]);
        let envelope = build_envelope(&parsed).unwrap();

        assert_eq!(envelope.route_key, "GET /my-route/{who}");
        assert_eq!(envelope.path, "/my-route/{who}");
        assert_eq!(envelope.method, "GET");
        assert_eq!(Value::Object(envelope.path_params), json!({"who": "World"}));
        assert_eq!(Value::Object(envelope.query_params), json!({"page": "2"}));
        assert_eq!(envelope.payload, json!({}));
    }

    #[test]
    fn test_invalid_arguments_rejected() {
        assert!(parse_args_from_parsed(args(&["--route", "/no-method"])).is_err());
        assert!(parse_args_from_parsed(args(&["--route", "PATCH /x"])).is_err());
        assert!(parse_args_from_parsed(args(&["--payload", "{not json"])).is_err());
        assert!(parse_args_from_parsed(args(&["--payload", r#"{"who":"World"}"#])).is_ok());
    }

    #[tokio::test]
    async fn test_run_writes_body_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out").join("response.json");
        let parsed = args(&[
            "--route",
            "GET /my-route",
            "--payload",
            r#"{"who":"World"}"#,
            "--output",
            output.to_str().unwrap(),
        ]);

        run(parsed).await.unwrap();

        let body: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(body, json!({"who": "World", "message": "Hello, World!"}));
    }

    #[tokio::test]
    async fn test_run_accepts_lowercase_method() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("hello.json");
        let parsed = args(&[
            "--route",
            "get /my-route/{who}",
            "--path-param",
            "who=World",
            "--output",
            output.to_str().unwrap(),
        ]);

        run(parsed).await.unwrap();

        let body: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(body["message"], json!("Hello, World!"));
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_payload() {
        let parsed = args(&["--route", "GET /my-route", "--payload", r#"{"who":"123"}"#]);
        let err = run(parsed).await.unwrap_err();
        assert!(err.to_string().contains("validation"));
    }
}
