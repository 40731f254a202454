//! Send command: one exchange, then print the bound variables.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use sockvar_core::VariableBindings;

use crate::cli::SendArgs;
use crate::client::{ClientOptions, Response, SocketClient, execute_with_deadline};
use crate::config::{ClientConfig, OutputFormat};
use crate::connection::Timeouts;
use crate::error::{ClientError, ClientResult};

/// Slack added to the worst-case socket time when no deadline is configured.
const DEADLINE_SLACK: Duration = Duration::from_secs(5);

/// JSON shape of `sockvar send --json`.
#[derive(Debug, Serialize)]
pub struct SendReport<'a> {
    pub variables: &'a VariableBindings,
    pub count: usize,
    pub terminated: bool,
    pub timed_out: bool,
}

/// Merges command-line overrides into the configured options.
pub fn options(args: &SendArgs, config: &ClientConfig) -> ClientResult<ClientOptions> {
    let mut options = config.client_options()?;
    if let Some(secs) = args.timeout {
        options = options.with_timeouts(Timeouts::uniform(Duration::from_secs(secs)));
    }
    if let Some(capacity) = args.receive_buffer {
        options = options.with_receive_capacity(capacity);
    }
    if let Some(mode) = args.read_mode {
        options = options.with_read_mode(mode);
    }
    if args.strict {
        options = options.with_strict_timeouts(true);
    }
    if let Some(ref name) = args.count_variable {
        options = options.with_count_variable(name.clone());
    }
    options.validate()?;
    Ok(options)
}

/// Returns the overall call deadline.
pub fn deadline(
    args: &SendArgs,
    config: &ClientConfig,
    options: &ClientOptions,
) -> ClientResult<Duration> {
    match args.deadline.map(Duration::from_secs).or(config.deadline()) {
        Some(d) if d.is_zero() => Err(ClientError::validation(
            "deadline must be greater than zero",
        )),
        Some(d) => Ok(d),
        None => Ok(options.timeouts.total().saturating_add(DEADLINE_SLACK)),
    }
}

/// Renders the bindings in `format`.
pub fn render(
    bindings: &VariableBindings,
    response: &Response,
    format: OutputFormat,
) -> ClientResult<String> {
    match format {
        OutputFormat::Plain => Ok(bindings
            .iter()
            .map(|e| format!("{}={}\n", e.key, e.value))
            .collect()),
        OutputFormat::Json => {
            let report = SendReport {
                variables: bindings,
                count: response.entries.len(),
                terminated: response.terminated,
                timed_out: response.timed_out,
            };
            serde_json::to_string_pretty(&report)
                .map(|s| s + "\n")
                .map_err(|e| ClientError::Io(e.into()))
        }
    }
}

/// Runs `sockvar send`.
pub async fn run(args: &SendArgs, config: &ClientConfig) -> ClientResult<()> {
    let options = options(args, config)?;
    let deadline = deadline(args, config, &options)?;
    let count_variable = options.count_variable.clone();
    debug!(?options, ?deadline, "sending");

    let client = SocketClient::new(options);
    let response = execute_with_deadline(
        client,
        args.host.clone(),
        args.port.clone(),
        args.message.clone(),
        deadline,
    )
    .await?;

    if response.truncated() {
        warn!(
            bytes = response.bytes_received,
            timed_out = response.timed_out,
            "reply may be incomplete"
        );
    }

    let mut bindings = VariableBindings::new();
    response.bind_into(&mut bindings, &count_variable);

    let format = args.output_format().unwrap_or(config.output.format);
    print!("{}", render(&bindings, &response, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use insta::assert_snapshot;
    use sockvar_core::VariableEntry;

    use crate::cli::{Cli, Command};
    use crate::connection::ReadMode;

    fn send_args(extra: &[&str]) -> SendArgs {
        let mut argv = vec!["sockvar", "send", "127.0.0.1", "60013", "A=1"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Send(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    fn sample() -> (VariableBindings, Response) {
        let response = Response {
            entries: vec![
                VariableEntry::new("MessageID", "1234"),
                VariableEntry::new("Status", "OK"),
            ],
            bytes_received: 40,
            terminated: true,
            timed_out: false,
        };
        let mut bindings = VariableBindings::new();
        response.bind_into(&mut bindings, "ARRAYELEMENTS");
        (bindings, response)
    }

    #[test]
    fn cli_overrides_config() {
        let args = send_args(&["--timeout", "2", "--read-mode", "terminator", "--strict"]);
        let options = options(&args, &ClientConfig::default()).unwrap();
        assert_eq!(options.timeouts, Timeouts::uniform(Duration::from_secs(2)));
        assert_eq!(options.read_mode, ReadMode::UntilTerminator);
        assert!(options.strict_timeouts);
    }

    #[test]
    fn zero_timeout_rejected() {
        let args = send_args(&["--timeout", "0"]);
        assert!(matches!(
            options(&args, &ClientConfig::default()),
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn default_deadline_covers_all_timeouts() {
        let args = send_args(&[]);
        let config = ClientConfig::default();
        let options = options(&args, &config).unwrap();
        assert_eq!(
            deadline(&args, &config, &options).unwrap(),
            Duration::from_secs(35)
        );

        let args = send_args(&["--deadline", "3"]);
        assert_eq!(
            deadline(&args, &config, &options).unwrap(),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn huge_timeouts_saturate_default_deadline() {
        let max = u64::MAX.to_string();
        let args = send_args(&["--timeout", max.as_str()]);
        let config = ClientConfig::default();
        let options = options(&args, &config).unwrap();
        assert_eq!(deadline(&args, &config, &options).unwrap(), Duration::MAX);
    }

    #[test]
    fn plain_output() {
        let (bindings, response) = sample();
        let text = render(&bindings, &response, OutputFormat::Plain).unwrap();
        assert_snapshot!(text.trim_end(), @r"
        MessageID=1234
        Status=OK
        ARRAYELEMENTS=2
        ");
    }

    #[test]
    fn json_output() {
        let (bindings, response) = sample();
        let text = render(&bindings, &response, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["terminated"], true);
        assert_eq!(value["timed_out"], false);
        assert_eq!(value["variables"]["bindings"][0]["key"], "MessageID");
        assert_eq!(value["variables"]["bindings"][2]["value"], "2");
    }
}
