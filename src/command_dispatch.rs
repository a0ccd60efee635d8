//! Purpose: Hold top-level CLI command dispatch for `pixpeek`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Every command emits exactly one JSON value on stdout on success.
//! Invariants: Decoding is delegated to `pixpeek::api`; this module only shapes output.

use super::*;
use super::output_json::{fields_json, resolution_json, token_json, url_json};
use pixpeek::api::{
    Framing, HttpTokenSource, TlvField, decode_tlv_strict, decode_token, fetch_token_text, fields,
    locate_url, resolve_payload,
};
use tracing::{debug, info};

pub(super) fn dispatch_command(
    command: Command,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Tlv {
            input,
            source,
            strict,
            nested,
        } => {
            let input = read_input(input, &source, "tlv input")?;
            if strict {
                decode_tlv_strict(&input)?;
            }
            let decoded: Vec<TlvField> = fields(&input).collect();
            for field in decoded.iter().filter(|field| !field.is_complete()) {
                emit_notice(&framing_notice(field), color_mode);
            }
            emit_json(json!({ "fields": fields_json(&decoded, nested) }), color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Url { payload, source } => {
            let payload = read_input(payload, &source, "payload")?;
            let found = locate_url(&payload)?;
            emit_json(url_json(&found), color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Token {
            token,
            source,
            payload_only,
        } => {
            let token = read_input(token, &source, "token")?;
            let record = decode_token(&token)?.ok_or_else(|| {
                Error::new(ErrorKind::MalformedToken)
                    .with_message("token does not have three dot-separated segments")
                    .with_hint("Expected header.payload.signature.")
            })?;
            emit_json(token_json(&record, payload_only), color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Fetch {
            payload,
            source,
            fetch,
        } => {
            let payload = read_input(payload, &source, "payload")?;
            let http = HttpTokenSource::with_options(fetch.options());
            let (found, text) = fetch_token_text(&payload, &http)?;
            debug!(bytes = text.len(), "token text fetched");
            let mut value = url_json(&found);
            if let Value::Object(map) = &mut value {
                map.insert("token".to_string(), json!(text));
            }
            emit_json(value, color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Resolve {
            payload,
            source,
            fetch,
            payload_only,
        } => {
            let payload = read_input(payload, &source, "payload")?;
            let http = HttpTokenSource::with_options(fetch.options());
            let resolution = resolve_payload(&payload, &http)?;
            info!(tag = %resolution.tag, url = %resolution.url, "payload resolved");
            emit_json(resolution_json(&resolution, payload_only), color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "pixpeek", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_json(
                json!({ "name": "pixpeek", "version": env!("CARGO_PKG_VERSION") }),
                color_mode,
            );
            Ok(RunOutcome::ok())
        }
    }
}

fn framing_notice(field: &TlvField) -> Notice {
    let mut details = Map::new();
    details.insert("tag".to_string(), json!(field.tag));
    details.insert("offset".to_string(), json!(field.offset));
    let (kind, message) = match field.framing {
        Framing::Truncated => {
            let declared = field.length.unwrap_or_default();
            let available = field.value.chars().count();
            details.insert("declared".to_string(), json!(declared));
            details.insert("available".to_string(), json!(available));
            (
                "truncated",
                format!(
                    "tag {} declares {declared} characters but only {available} remain",
                    field.tag
                ),
            )
        }
        Framing::BadLength | Framing::Complete => (
            "bad_length",
            format!(
                "tag {} has no numeric length; decoding stopped at offset {}",
                field.tag, field.offset
            ),
        ),
    };
    Notice {
        kind: kind.to_string(),
        time: notice_time_now().unwrap_or_default(),
        cmd: "tlv".to_string(),
        message,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::framing_notice;
    use pixpeek::api::fields;

    #[test]
    fn truncated_field_notice_reports_sizes() {
        let field = fields("0102ab0210xyz").last().expect("field");
        let notice = framing_notice(&field);
        assert_eq!(notice.kind, "truncated");
        assert_eq!(notice.details["declared"], 10);
        assert_eq!(notice.details["available"], 3);
        assert_eq!(notice.details["offset"], 6);
    }

    #[test]
    fn bad_length_notice_names_tag() {
        let field = fields("01xx").next().expect("field");
        let notice = framing_notice(&field);
        assert_eq!(notice.kind, "bad_length");
        assert!(notice.message.contains("tag 01"));
    }
}
