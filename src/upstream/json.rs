//! JSON parsing utilities for upstream API clients.

use anyhow::Result;

/// Attempt to parse JSON and, on failure, report the serde path and the
/// type mismatch instead of a bare offset, so malformed upstream payloads
/// are diagnosable from logs alone.
pub fn parse_json_with_context<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let jd = &mut serde_json::Deserializer::from_str(body);
    match serde_path_to_error::deserialize(jd) {
        Ok(value) => Ok(value),
        Err(err) => {
            let inner_err = err.inner();
            let (line, column) = (inner_err.line(), inner_err.column());
            let path = err.path().to_string();

            let msg = inner_err.to_string();
            let loc = format!(" at line {line} column {column}");
            let msg_without_loc = msg.strip_suffix(&loc).unwrap_or(&msg).to_string();

            let mut final_err = String::new();
            if !path.is_empty() && path != "." {
                final_err.push_str(&format!("at path '{}': ", path));
            }
            final_err.push_str(&format!("{msg_without_loc} (line {line} col {column})"));

            Err(anyhow::anyhow!(final_err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn error_includes_path_of_the_offending_field() {
        #[derive(Debug, Deserialize)]
        struct Snippet {
            #[allow(dead_code)]
            title: String,
        }

        #[derive(Debug, Deserialize)]
        struct Item {
            #[allow(dead_code)]
            snippet: Snippet,
        }

        #[derive(Debug, Deserialize)]
        struct Response {
            #[allow(dead_code)]
            items: Vec<Item>,
        }

        let json = r#"{"items": [{"snippet": {"title": null}}]}"#;
        let result: Result<Response> = parse_json_with_context(json);

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("items[0].snippet.title"), "{err_msg}");
        assert!(err_msg.contains("invalid type"), "{err_msg}");
    }

    #[test]
    fn valid_payload_parses() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Small {
            n: u32,
        }
        let parsed: Small = parse_json_with_context(r#"{"n": 3}"#).expect("valid");
        assert_eq!(parsed, Small { n: 3 });
    }
}
