use crate::logs::context::{Context, ContextValue};
use crate::logs::level::LogLevel;
use chrono::{DateTime, Local};
use std::borrow::Cow;
use std::net::IpAddr;

/// Label used when the current actor has no display name
pub const ANONYMOUS_LABEL: &str = "Anonymous";

/// Marker written when the client address or the context is missing
pub const NONE_MARKER: &str = "[NONE]";

const ARRAY_MARKER: &str = "[array]";
const COMPLEX_MARKER: &str = "[complex value]";

/// String form of a context value when substituted into a message
pub fn placeholder_text(value: &ContextValue) -> Cow<'_, str> {
    match value {
        ContextValue::Null => Cow::Borrowed(""),
        ContextValue::Bool(true) => Cow::Borrowed("1"),
        ContextValue::Bool(false) => Cow::Borrowed(""),
        ContextValue::Int(i) => Cow::Owned(i.to_string()),
        ContextValue::Float(x) => Cow::Owned(x.to_string()),
        ContextValue::String(s) => Cow::Borrowed(s.as_str()),
        ContextValue::Display(d) => Cow::Owned(d.to_string()),
        ContextValue::Sequence(_) | ContextValue::Map(_) => Cow::Borrowed(ARRAY_MARKER),
        ContextValue::Opaque(_) => Cow::Borrowed(COMPLEX_MARKER),
    }
}

/// Replace every `{key}` in `template` that has a matching context entry.
///
/// Unknown placeholders are left untouched and substituted text is never
/// scanned again.
pub fn interpolate(template: &str, context: &Context) -> String {
    if context.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        let replaced = after_open.find('}').and_then(|close| {
            let key = &after_open[..close];
            context
                .get(key)
                .map(|value| (placeholder_text(value), close))
        });

        match replaced {
            Some((text, close)) => {
                out.push_str(&text);
                rest = &after_open[close + 1..];
            }
            None => {
                out.push('{');
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Who and where a record came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Origin {
    pub actor: Option<String>,
    pub client_ip: Option<IpAddr>,
}

/// Compose one log line, newline-terminated.
///
/// Format: `[YYYY-MM-DD HH:MM:SS] [level] [actor] [ip] message Original context: json`
pub fn format_line(
    timestamp: &DateTime<Local>,
    level: LogLevel,
    origin: &Origin,
    template: &str,
    context: &Context,
) -> String {
    let actor = origin
        .actor
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(ANONYMOUS_LABEL);
    let client_ip = origin
        .client_ip
        .map(|ip| Cow::Owned(ip.to_string()))
        .unwrap_or(Cow::Borrowed(NONE_MARKER));
    let interpolated = interpolate(template, context);
    let message = single_line(&interpolated);
    let context = if context.is_empty() {
        NONE_MARKER.to_string()
    } else {
        context.to_json()
    };

    format!(
        "[{}] [{}] [{}] [{}] {} Original context: {}\n",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        level.as_str(),
        single_line(actor),
        client_ip,
        message,
        context
    )
}

/// One record must stay one line in the file
fn single_line(text: &str) -> Cow<'_, str> {
    if text.contains(['\n', '\r']) {
        Cow::Owned(text.replace("\r\n", "\\n").replace(['\n', '\r'], "\\n"))
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::fmt;
    use std::net::Ipv4Addr;

    struct Node(u32);

    impl fmt::Display for Node {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "node/{}", self.0)
        }
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_interpolate_fallbacks() {
        let context = Context::new()
            .with("a", ContextValue::Null)
            .with("b", vec![1, 2])
            .with("c", ContextValue::display(Node(9)));
        assert_eq!(interpolate("{a} {b} {c}", &context), " [array] node/9");
    }

    #[test]
    fn test_interpolate_complex_value() {
        let context = Context::new().with("x", ContextValue::opaque(json!({"k": 1})));
        assert_eq!(interpolate("value={x}", &context), "value=[complex value]");
    }

    #[test]
    fn test_interpolate_scalars() {
        let context = Context::new()
            .with("yes", true)
            .with("no", false)
            .with("n", 42)
            .with("f", 1.5);
        assert_eq!(interpolate("{yes}|{no}|{n}|{f}", &context), "1||42|1.5");
    }

    #[test]
    fn test_interpolate_leaves_unknown_placeholders() {
        let context = Context::new().with("name", "Bob");
        assert_eq!(
            interpolate("{greeting} {name}, {unclosed", &context),
            "{greeting} Bob, {unclosed"
        );
    }

    #[test]
    fn test_interpolate_is_single_pass() {
        let context = Context::new().with("a", "{b}").with("b", "nope");
        assert_eq!(interpolate("{a}", &context), "{b}");
    }

    #[test]
    fn test_interpolate_nested_brace() {
        let context = Context::new().with("name", "Bob");
        assert_eq!(interpolate("{{name}}", &context), "{Bob}");
    }

    #[test]
    fn test_format_line() {
        let origin = Origin {
            actor: Some("admin".to_string()),
            client_ip: Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))),
        };
        let context = Context::new().with("name", "Bob");
        let line = format_line(&fixed_time(), LogLevel::Notice, &origin, "Hello {name}", &context);
        assert_eq!(
            line,
            "[2024-01-02 03:04:05] [notice] [admin] [10.0.0.1] Hello Bob Original context: {\"name\":\"Bob\"}\n"
        );
    }

    #[test]
    fn test_format_line_defaults() {
        let line = format_line(
            &fixed_time(),
            LogLevel::Error,
            &Origin::default(),
            "Plain",
            &Context::new(),
        );
        assert_eq!(
            line,
            "[2024-01-02 03:04:05] [error] [Anonymous] [[NONE]] Plain Original context: [NONE]\n"
        );
    }

    #[test]
    fn test_format_line_escapes_line_breaks() {
        let context = Context::new().with("trace", "line one\nline two");
        let line = format_line(
            &fixed_time(),
            LogLevel::Debug,
            &Origin::default(),
            "Trace: {trace}",
            &context,
        );
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.contains("Trace: line one\\nline two"));
    }
}
