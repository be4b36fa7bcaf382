use std::borrow::Cow;

use base64::Engine;
use serde_json::{Map, Value};
use tracing::debug;
use url::form_urlencoded;

use crate::error::{Error, Result};
use crate::request::{BodyType, HttpMethod, KeyValue, RequestData};

const LINE_BREAK: &str = " \\\n  ";

/// Options whose value we don't use but must not mistake for the URL.
const SKIPPED_WITH_VALUE: &[&str] = &[
    "-o",
    "--output",
    "-m",
    "--max-time",
    "--connect-timeout",
    "-w",
    "--write-out",
    "-x",
    "--proxy",
    "-U",
    "--proxy-user",
    "--retry",
    "-c",
    "--cookie-jar",
    "-T",
    "--upload-file",
    "-K",
    "--config",
    "-r",
    "--range",
    "-E",
    "--cert",
    "--key",
    "--cacert",
    "--resolve",
    "--limit-rate",
    "--max-redirs",
];

/// Short options that take a value and may have it glued on, as in `-XPOST`.
const SHORT_WITH_VALUE: &[char] = &['X', 'H', 'd', 'F', 'u', 'A', 'b', 'e'];

#[derive(Default)]
struct Parsed {
    url: Option<String>,
    method: Option<HttpMethod>,
    head: bool,
    get: bool,
    headers: Vec<KeyValue>,
    data: Vec<String>,
    form: Map<String, Value>,
}

/// Builds a request from a `curl ...` command line.
///
/// Line continuations (`\` at the end of a line) are accepted. Unknown flags are ignored.
pub fn parse_curl(command: &str) -> Result<RequestData> {
    let joined = command.trim().replace("\\\r\n", " ").replace("\\\n", " ");
    let tokens = shell_words::split(&joined).map_err(|e| Error::Curl(e.to_string()))?;

    let mut tokens = tokens.into_iter();
    if tokens.next().as_deref() != Some("curl") {
        return Err(Error::Curl("Command must start with 'curl'".into()));
    }

    let mut parsed = Parsed::default();
    while let Some(token) = tokens.next() {
        let (flag, inline) = split_flag(&token);
        let mut value = |flag: &str| -> Result<String> {
            match &inline {
                Some(v) => Ok(v.clone()),
                None => tokens
                    .next()
                    .ok_or_else(|| Error::Curl(format!("missing value for {flag}"))),
            }
        };

        match flag {
            "-X" | "--request" => parsed.method = Some(value(flag)?.parse()?),
            "-H" | "--header" => {
                if let Some(header) = parse_header(&value(flag)?) {
                    parsed.headers.push(header);
                }
            }
            "-d" | "--data" | "--data-raw" | "--data-binary" | "--data-ascii" => {
                parsed.data.push(value(flag)?)
            }
            "--data-urlencode" => parsed.data.push(urlencode_data(&value(flag)?)),
            "-F" | "--form" => {
                let field = value(flag)?;
                let (k, v) = field.split_once('=').unwrap_or((field.as_str(), ""));
                parsed.form.insert(k.to_string(), Value::String(v.to_string()));
            }
            "--url" => parsed.url = Some(value(flag)?),
            "-I" | "--head" => parsed.head = true,
            "-G" | "--get" => parsed.get = true,
            "-u" | "--user" => {
                let credentials = base64::engine::general_purpose::STANDARD.encode(value(flag)?);
                parsed
                    .headers
                    .push(KeyValue::new("Authorization", format!("Basic {credentials}")));
            }
            "-A" | "--user-agent" => parsed.headers.push(KeyValue::new("User-Agent", value(flag)?)),
            "-b" | "--cookie" => parsed.headers.push(KeyValue::new("Cookie", value(flag)?)),
            "-e" | "--referer" => parsed.headers.push(KeyValue::new("Referer", value(flag)?)),
            f if SKIPPED_WITH_VALUE.contains(&f) => {
                value(f)?;
            }
            f if f.starts_with('-') && f.len() > 1 => debug!(flag = f, "ignoring curl flag"),
            url if parsed.url.is_none() => parsed.url = Some(url.to_string()),
            _ => {}
        }
    }

    parsed.into_request()
}

/// Splits `--name=value` and glued short options like `-XPOST` into flag and value.
fn split_flag(token: &str) -> (&str, Option<String>) {
    if token.starts_with("--") {
        if let Some((flag, value)) = token.split_once('=') {
            return (flag, Some(value.to_string()));
        }
        return (token, None);
    }
    let mut chars = token.chars();
    if chars.next() == Some('-') {
        if let Some(c) = chars.next() {
            let rest = chars.as_str();
            if !rest.is_empty() && SHORT_WITH_VALUE.contains(&c) {
                return (&token[..2], Some(rest.to_string()));
            }
        }
    }
    (token, None)
}

fn parse_header(raw: &str) -> Option<KeyValue> {
    let (key, value) = raw.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some(KeyValue::new(key, value.trim()))
}

fn urlencode_data(raw: &str) -> String {
    let encode = |s: &str| form_urlencoded::byte_serialize(s.as_bytes()).collect::<String>();
    match raw.split_once('=') {
        Some((name, content)) => format!("{name}={}", encode(content)),
        None => encode(raw),
    }
}

fn infer_body_type(body: &str) -> BodyType {
    let trimmed = body.trim();
    let looks_structured = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));
    if looks_structured && serde_json::from_str::<Value>(trimmed).is_ok() {
        BodyType::Json
    } else if trimmed.contains('=') {
        BodyType::UrlEncoded
    } else {
        BodyType::Raw
    }
}

impl Parsed {
    fn into_request(self) -> Result<RequestData> {
        let url = self
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Curl("Could not parse URL from curl command".into()))?;

        let has_payload = !self.data.is_empty() || !self.form.is_empty();
        let method = match self.method {
            Some(m) => m,
            None if self.head => HttpMethod::Head,
            None if self.get => HttpMethod::Get,
            None if has_payload => HttpMethod::Post,
            None => HttpMethod::Get,
        };

        let mut request = RequestData {
            name: "Imported Request".to_string(),
            url,
            method,
            headers: self.headers,
            ..RequestData::draft()
        };

        let data = self.data.join("&");
        if self.get {
            request.params = form_urlencoded::parse(data.as_bytes())
                .map(|(k, v)| KeyValue::new(k, v))
                .collect();
        } else if !self.form.is_empty() {
            request.body = serde_json::to_string_pretty(&Value::Object(self.form))?;
            request.body_type = BodyType::FormData;
        } else if !data.is_empty() {
            request.body_type = infer_body_type(&data);
            request.body = data;
        }

        debug!(method = %request.method, url = %request.url, "parsed curl command");
        Ok(request)
    }
}

/// Renders `request` as a multi-line cURL command.
pub fn generate_curl(request: &RequestData) -> String {
    let url = match request.resolved_url() {
        Ok(url) => url.to_string(),
        Err(_) => request.url.trim().to_string(),
    };
    let mut command = format!("curl -X {} {}", request.method, double_quote(&url));

    for header in request.active_headers() {
        push_line(&mut command, "-H", &double_quote(&format!("{}: {}", header.key, header.value)));
    }

    if !request.sends_body() || request.body.is_empty() {
        return command;
    }

    let content_type = |command: &mut String, value: &str| {
        if !request.has_header("content-type") {
            push_line(command, "-H", &double_quote(&format!("Content-Type: {value}")));
        }
    };

    match request.body_type {
        BodyType::Json => {
            content_type(&mut command, "application/json");
            push_line(&mut command, "-d", &single_quote(&request.body));
        }
        BodyType::UrlEncoded => {
            content_type(&mut command, "application/x-www-form-urlencoded");
            push_line(&mut command, "-d", &single_quote(&request.body));
        }
        BodyType::FormData => match serde_json::from_str::<Map<String, Value>>(&request.body) {
            Ok(fields) => {
                for (key, value) in fields {
                    let value = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    push_line(&mut command, "-F", &double_quote(&format!("{key}={value}")));
                }
            }
            Err(_) => push_line(&mut command, "-d", &single_quote(&request.body)),
        },
        BodyType::Raw => push_line(&mut command, "-d", &single_quote(&request.body)),
        BodyType::None => {}
    }
    command
}

fn push_line(command: &mut String, flag: &str, value: &str) {
    command.push_str(LINE_BREAK);
    command.push_str(flag);
    command.push(' ');
    command.push_str(value);
}

fn double_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

// Bodies are always single-quoted, even when the shell would not need it.
fn single_quote(s: &str) -> String {
    match shell_words::quote(s) {
        Cow::Borrowed(plain) => format!("'{plain}'"),
        Cow::Owned(quoted) => quoted,
    }
}
