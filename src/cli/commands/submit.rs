//! Submit command implementation.

use colored::Colorize;
use serde_json::Value;

use crate::cli::args::{OutputFormat, SubmitArgs};
use crate::error::VetboxError;
use crate::features::forms::{AutoConfirm, Feedback, FormConfig, FormSubmitter, SubmissionError};
use crate::features::outbox::{Outbox, RequestBody};
use crate::output::{format_feedback_pretty, format_submission};

/// Execute submit command
///
/// # Errors
///
/// Returns an error if the arguments are malformed, the submission was
/// cancelled or rejected before sending, or output formatting fails.
pub fn submit(
    outbox: &Outbox,
    args: SubmitArgs,
    format: OutputFormat,
) -> Result<String, SubmissionError> {
    let assume_yes = args.yes;
    let body = parse_body(&args)?;
    let form = form_config(args)?;

    let mut submitter = FormSubmitter::new(outbox);
    if assume_yes {
        submitter = submitter.with_confirm(Box::new(AutoConfirm(true)));
    }
    if format == OutputFormat::Pretty {
        submitter = submitter.with_feedback(Box::new(|feedback: &Feedback| {
            if *feedback == Feedback::Loading {
                eprintln!("{}", format_feedback_pretty(feedback).dimmed());
            }
        }));
    }

    let submission = submitter.submit(&form, body)?;
    Ok(format_submission(&submission, format)?)
}

fn form_config(args: SubmitArgs) -> Result<FormConfig, VetboxError> {
    let mut form = FormConfig::new(args.form_id.unwrap_or_else(|| args.url.clone()), args.url);
    form.method = args.method;
    for header in &args.headers {
        let (name, value) = parse_header(header)?;
        form.headers.insert(name.to_string(), value.to_string());
    }
    form.timeout = args.timeout;
    form.confirm = args.confirm;
    form.target = args.target;
    form.no_reload = args.no_reload;
    form.required = args.require;
    Ok(form)
}

/// Build the request body from `--field`, `--json` or `--text`.
fn parse_body(args: &SubmitArgs) -> Result<Option<RequestBody>, VetboxError> {
    if let Some(json) = &args.json {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| VetboxError::Config(format!("Invalid --json body: {e}")))?;
        return Ok(Some(RequestBody::Json(value)));
    }
    if let Some(text) = &args.text {
        return Ok(Some(RequestBody::Text(text.clone())));
    }
    if args.fields.is_empty() {
        return Ok(None);
    }

    let pairs = args
        .fields
        .iter()
        .map(|field| {
            field
                .split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| {
                    VetboxError::Config(format!("Invalid field '{field}', expected key=value"))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(RequestBody::Form(pairs)))
}

fn parse_header(header: &str) -> Result<(&str, &str), VetboxError> {
    header
        .split_once(':')
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| {
            VetboxError::Config(format!("Invalid header '{header}', expected 'Name: value'"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{Cli, Commands};
    use clap::Parser;

    fn submit_args(argv: &[&str]) -> SubmitArgs {
        let mut full = vec!["vetbox", "submit"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Submit(args) => args,
            _ => panic!("Expected Submit command"),
        }
    }

    #[test]
    fn test_parse_form_fields_keep_order_and_repeats() {
        let args = submit_args(&["/animals/new", "-f", "tag=a", "-f", "tag=b", "-f", "note=x=y"]);
        let body = parse_body(&args).unwrap();

        assert_eq!(
            body,
            Some(RequestBody::Form(vec![
                ("tag".to_string(), "a".to_string()),
                ("tag".to_string(), "b".to_string()),
                ("note".to_string(), "x=y".to_string()),
            ]))
        );
    }

    #[test]
    fn test_parse_json_body() {
        let args = submit_args(&["/api/shares", "--json", r#"{"tutor_id": 5}"#]);
        assert_eq!(
            parse_body(&args).unwrap(),
            Some(RequestBody::Json(serde_json::json!({"tutor_id": 5})))
        );

        let bad = submit_args(&["/api/shares", "--json", "{tutor"]);
        assert!(matches!(parse_body(&bad), Err(VetboxError::Config(_))));
    }

    #[test]
    fn test_parse_field_without_equals_fails() {
        let args = submit_args(&["/animals/new", "-f", "name"]);
        assert!(matches!(parse_body(&args), Err(VetboxError::Config(_))));
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(parse_header("X-CSRFToken: abc").unwrap(), ("X-CSRFToken", "abc"));
        assert_eq!(parse_header("Accept:application/json").unwrap(), ("Accept", "application/json"));
        assert!(parse_header("no colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_form_config_from_args() {
        let args = submit_args(&[
            "/api/sales/3",
            "-X",
            "DELETE",
            "--form-id",
            "sale-3",
            "--target",
            "#sales",
            "--no-reload",
        ]);
        let form = form_config(args).unwrap();

        assert_eq!(form.id, "sale-3");
        assert_eq!(form.method, "DELETE");
        assert_eq!(form.target.as_deref(), Some("#sales"));
        assert!(form.no_reload);
    }
}
