//! Calculator page.

use std::fmt::Write as _;

use crate::calculator::{Operation, display_number};
use crate::session::{HistoryEntry, RequestState};

use super::escape_html;

/// Everything the page needs from one request.
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    /// Session anti-forgery token, embedded in every form.
    pub token: &'a str,
    pub state: &'a RequestState,
    /// Most recent first.
    pub history: &'a [HistoryEntry],
}

/// Render the full calculator page.
#[must_use]
pub fn render_page(view: &PageView<'_>) -> String {
    html_shell("Calculator", &calculator_content(view))
}

fn html_shell(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
    <div class="calculator">
{content}
    </div>
</body>
</html>"#
    )
}

fn calculator_content(view: &PageView<'_>) -> String {
    let token = escape_html(view.token);
    let num1 = escape_html(&view.state.num1);
    let num2 = escape_html(&view.state.num2);

    let mut buttons = String::new();
    for op in Operation::ALL {
        let _ = write!(
            buttons,
            r#"
                <button type="submit" name="operation" value="{}">{}</button>"#,
            op.key(),
            op.symbol()
        );
    }

    format!(
        r#"        <form method="post" action="/">
            <input type="hidden" name="token" value="{token}">
            <div class="input-group">
                <input type="number" name="num1" step="any" required value="{num1}" placeholder="First number">
            </div>
            <div class="input-group">
                <input type="number" name="num2" step="any" required value="{num2}" placeholder="Second number">
            </div>
            <div class="operations">{buttons}
            </div>
        </form>
{result}{history}"#,
        result = result_panel(view.state),
        history = history_panel(view.token, view.history),
    )
}

fn result_panel(state: &RequestState) -> String {
    if let Some(message) = state.error_message() {
        return format!(
            "        <div class=\"result error\" role=\"alert\">{}</div>\n",
            escape_html(&message)
        );
    }
    let Some(formatted) = state.formatted_result() else {
        return String::new();
    };
    let symbol = Operation::from_key(&state.operation)
        .map_or(state.operation.as_str(), |op| op.symbol());
    let line = format!("{} {} {} = {}", state.num1, symbol, state.num2, formatted);
    format!(
        "        <div class=\"result\">{}</div>\n",
        escape_html(&line)
    )
}

fn history_panel(token: &str, history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return String::new();
    }

    let mut items = String::new();
    for entry in history {
        let _ = write!(
            items,
            r#"
            <div class="history-item">
                <span>{}</span>
                <span>{}</span>
                <time datetime="{}">{}</time>
            </div>"#,
            escape_html(&entry.equation),
            display_number(entry.result),
            entry.timestamp.to_rfc3339(),
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        );
    }

    format!(
        r#"        <div class="history">
            <h3>History</h3>{items}
            <form method="post" action="/">
                <input type="hidden" name="token" value="{token}">
                <button type="submit" name="clear_history" value="1" class="clear-button">Clear History</button>
            </form>
        </div>
"#,
        token = escape_html(token),
    )
}

const STYLE: &str = r"
        :root {
            --primary: #CCD5AE;
            --background: #E9EDC9;
            --surface: #FEFAE0;
            --secondary: #FAEDCD;
            --accent: #D4A373;
            --text: #4A4A4A;
            --radius: 12px;
        }
        body {
            background: var(--background);
            color: var(--text);
            font-family: 'Segoe UI', system-ui;
            margin: 0;
            min-height: 100vh;
            display: grid;
            place-items: center;
        }
        .calculator {
            background: var(--surface);
            padding: 2rem;
            border-radius: var(--radius);
            box-shadow: 0 4px 12px rgba(0,0,0,0.1);
            width: min(90vw, 400px);
        }
        .input-group { margin-bottom: 1.5rem; }
        input {
            width: 100%;
            padding: 1rem;
            border: 2px solid var(--secondary);
            border-radius: calc(var(--radius) - 4px);
            background: var(--surface);
            font-size: 1rem;
            box-sizing: border-box;
        }
        .operations {
            display: grid;
            grid-template-columns: repeat(4, 1fr);
            gap: 0.5rem;
            margin: 1.5rem 0;
        }
        button {
            padding: 1rem;
            border: none;
            border-radius: calc(var(--radius) - 4px);
            background: var(--primary);
            color: var(--text);
            cursor: pointer;
        }
        button:hover { background: var(--accent); }
        .result {
            padding: 1rem;
            border-radius: var(--radius);
            margin: 1rem 0;
            background: var(--secondary);
            text-align: center;
        }
        .result.error { background: var(--accent); color: white; }
        .history {
            margin-top: 2rem;
            border-top: 2px solid var(--secondary);
            padding-top: 1rem;
        }
        .history-item {
            display: flex;
            justify-content: space-between;
            gap: 1rem;
            padding: 0.5rem 0;
            border-bottom: 1px solid var(--secondary);
        }
        .history-item time { font-size: 0.8rem; opacity: 0.7; }
        .clear-button {
            margin-top: 1rem;
            background: var(--accent);
            color: white;
            padding: 0.5rem 1rem;
            border-radius: 20px;
        }
    ";
