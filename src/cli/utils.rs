use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::validation::Issue;
use crate::wizard::WizardError;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
    issues: &[Issue],
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }
            if !issues.is_empty() {
                response["issues"] = json!(issues);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
            for issue in issues {
                eprintln!("  - {}: {}", issue.field, issue.message);
            }
        }
    }
    Ok(())
}

/// Report a wizard failure, then turn it into the process error
pub fn output_wizard_error(output_format: &OutputFormat, err: WizardError) -> anyhow::Result<()> {
    let (code, issues) = match &err {
        WizardError::StepLocked(_) => ("STEP_LOCKED", Vec::new()),
        WizardError::MissingRider => ("MISSING_RIDER", Vec::new()),
        WizardError::Rejected { issues, .. } => ("REJECTED", issues.clone()),
        WizardError::Transport(_) => ("TRANSPORT", Vec::new()),
        WizardError::Session(_) => ("SESSION", Vec::new()),
        WizardError::RiderFetch { .. } => ("RIDER_FETCH_FAILED", Vec::new()),
    };

    output_error(output_format, &err.to_string(), Some(code), &issues)?;
    Err(anyhow::anyhow!("{}", err))
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    collection_name: []
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Print a record: raw JSON, or `key: value` lines for text
pub fn output_record<T: Serialize>(output_format: &OutputFormat, title: &str, record: &T) -> anyhow::Result<()> {
    let value = serde_json::to_value(record)?;
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            println!("{}", title);
            print_fields(&value, 1);
        }
    }
    Ok(())
}

fn print_fields(value: &Value, depth: usize) {
    let indent = "  ".repeat(depth);
    match value {
        Value::Object(map) => {
            for (key, field) in map {
                match field {
                    Value::Object(_) => {
                        println!("{}{}:", indent, key);
                        print_fields(field, depth + 1);
                    }
                    Value::Array(items) => {
                        println!("{}{}:", indent, key);
                        for item in items {
                            println!("{}  - {}", indent, scalar(item));
                        }
                    }
                    other => println!("{}{}: {}", indent, key, scalar(other)),
                }
            }
        }
        other => println!("{}{}", indent, scalar(other)),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
