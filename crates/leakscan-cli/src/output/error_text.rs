use leakscan_client::ClientError;
use serde_json::Value;

pub fn render_error(error: &ClientError) -> String {
    let mut lines = vec![
        "Something went wrong, but it's easy to fix.".to_string(),
        String::new(),
        format!("  Error:    {}", error.code),
        format!("  Details:  {}", error.message),
    ];

    let details = render_error_details(error.data.as_ref());
    if !details.is_empty() {
        lines.push(String::new());
        lines.extend(details);
    }

    lines.push(String::new());
    lines.push("What to do next:".to_string());
    if error.recovery_steps.is_empty() {
        lines.push("  1. Retry the command.".to_string());
    } else {
        for (index, step) in error.recovery_steps.iter().enumerate() {
            lines.push(format!("  {}. {step}", index + 1));
        }
    }

    lines.join("\n")
}

/// Headers seen and row issues attached to import failures.
fn render_error_details(data: Option<&Value>) -> Vec<String> {
    let Some(data) = data else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    if let Some(headers) = data.get("actual_headers").and_then(Value::as_array) {
        let names = headers
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<&str>>()
            .join(", ");
        lines.push(format!("  Headers found:  {names}"));
    }

    if let Some(issues) = data.get("issues").and_then(Value::as_array)
        && !issues.is_empty()
    {
        lines.push("  Issues:".to_string());
        for issue in issues {
            let row = issue.get("row").and_then(Value::as_i64).unwrap_or(0);
            let description = issue
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown issue");
            lines.push(format!("    row {row}: {description}"));
        }
    }

    lines
}
