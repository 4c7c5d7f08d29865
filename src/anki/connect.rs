//! A blocking client for the AnkiConnect add-on
//!
//! AnkiConnect accepts `POST`ed JSON of the form
//! `{"action": ..., "version": 6, "params": {...}}` and always answers with
//! `{"result": ..., "error": ...}`, where exactly one of the two is non-null.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{CardId, Error, NoteId, StudyApp};

const API_VERSION: u32 = 6;
const TIMEOUT: Duration = Duration::from_secs(30);

/// A [`StudyApp`] backed by a running Anki instance with AnkiConnect.
#[derive(Debug, Clone)]
pub struct AnkiConnect {
    url: String,
    client: reqwest::blocking::Client,
}

impl AnkiConnect {
    /// Create a client for the AnkiConnect endpoint at `url`.
    ///
    /// No request is made until the first operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialised.
    pub fn new(url: impl Into<String>) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(TIMEOUT)
            .no_proxy()
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Perform a single action and decode its result.
    #[instrument(skip(self, params))]
    fn invoke<T: DeserializeOwned>(&self, action: &str, params: Value) -> Result<T, Error> {
        let response = self
            .client
            .post(&self.url)
            .json(&request_body(action, params))
            .send()
            .map_err(|source| {
                if source.is_connect() {
                    Error::Unreachable {
                        url: self.url.clone(),
                        source,
                    }
                } else {
                    Error::Transport(source)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status));
        }

        let body: Value = response.json()?;
        debug!("AnkiConnect {action} answered {body}");
        parse_response(action, body)
    }
}

impl StudyApp for AnkiConnect {
    fn find_note_by_tag(&self, tag: &str, deck_prefix: &str) -> Result<Option<NoteId>, Error> {
        let notes: Vec<NoteId> = self.invoke(
            "findNotes",
            json!({ "query": format!(r#"deck:"{deck_prefix}*" tag:"{tag}""#) }),
        )?;
        Ok(notes.first().copied())
    }

    fn cards_of_note(&self, note: NoteId) -> Result<Vec<CardId>, Error> {
        self.invoke("findCards", json!({ "query": format!("nid:{note}") }))
    }

    fn remove_tag(&self, notes: &[NoteId], tag: &str) -> Result<(), Error> {
        self.invoke("removeTags", json!({ "notes": notes, "tags": tag }))
    }

    fn add_tag(&self, notes: &[NoteId], tag: &str) -> Result<(), Error> {
        self.invoke("addTags", json!({ "notes": notes, "tags": tag }))
    }

    fn move_cards(&self, cards: &[CardId], deck: &str) -> Result<(), Error> {
        if cards.is_empty() {
            return Ok(());
        }
        self.invoke("changeDeck", json!({ "cards": cards, "deck": deck }))
    }
}

fn request_body(action: &str, params: Value) -> Value {
    json!({
        "action": action,
        "version": API_VERSION,
        "params": params,
    })
}

fn parse_response<T: DeserializeOwned>(action: &str, mut body: Value) -> Result<T, Error> {
    match body.get_mut("error").map(Value::take) {
        None | Some(Value::Null) => {}
        Some(Value::String(message)) => return Err(Error::Api(message)),
        Some(other) => return Err(Error::Api(other.to_string())),
    }

    let result = body.get_mut("result").map(Value::take).unwrap_or_default();
    serde_json::from_value(result).map_err(|source| Error::Decode {
        action: action.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::{
        io::{BufRead, BufReader, Read, Write},
        net::TcpListener,
        thread::{self, JoinHandle},
    };

    use super::*;

    /// Answer a single request with a canned response. The handle yields the
    /// request body.
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<Value>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" {
                    break;
                }
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    length = value.trim().parse().unwrap();
                }
            }
            let mut request = vec![0; length];
            reader.read_exact(&mut request).unwrap();

            stream.write_all(response.as_bytes()).unwrap();
            serde_json::from_slice(&request).unwrap()
        });

        (url, handle)
    }

    #[test]
    fn request_body_shape() {
        let body = request_body("findCards", json!({"query": "nid:1"}));
        assert_eq!(
            body,
            json!({"action": "findCards", "version": 6, "params": {"query": "nid:1"}})
        );
    }

    #[test]
    fn parse_result() {
        let notes: Vec<NoteId> =
            parse_response("findNotes", json!({"result": [11, 12], "error": null})).unwrap();
        assert_eq!(notes, [NoteId(11), NoteId(12)]);
    }

    #[test]
    fn parse_null_result_as_unit() {
        let () = parse_response("addTags", json!({"result": null, "error": null})).unwrap();
    }

    #[test]
    fn parse_error_field() {
        let error = parse_response::<Value>(
            "changeDeck",
            json!({"result": null, "error": "deck was not found"}),
        )
        .unwrap_err();
        assert!(matches!(error, Error::Api(ref message) if message == "deck was not found"));
        assert_eq!(error.to_string(), "AnkiConnect error: deck was not found");
    }

    #[test]
    fn parse_wrong_result_shape() {
        let error = parse_response::<Vec<CardId>>("findCards", json!({"result": "nope"}))
            .unwrap_err();
        assert!(matches!(error, Error::Decode { .. }));
    }

    #[test]
    fn unreachable_service_is_reported() {
        // Grab a free port and release it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = AnkiConnect::new(url).unwrap();
        let error = client.cards_of_note(NoteId(1)).unwrap_err();

        assert!(matches!(error, Error::Unreachable { .. }));
    }

    #[test]
    fn posts_action_envelope_and_decodes_result() {
        let (url, server) = serve_once("200 OK", r#"{"result": [5, 6], "error": null}"#);

        let note = AnkiConnect::new(url)
            .unwrap()
            .find_note_by_tag("uid:p-12-071", "Book")
            .unwrap();

        assert_eq!(note, Some(NoteId(5)));
        assert_eq!(
            server.join().unwrap(),
            json!({
                "action": "findNotes",
                "version": 6,
                "params": {"query": r#"deck:"Book*" tag:"uid:p-12-071""#},
            })
        );
    }

    #[test]
    fn error_status_is_reported() {
        let (url, server) = serve_once("500 Internal Server Error", "{}");

        let error = AnkiConnect::new(url)
            .unwrap()
            .add_tag(&[NoteId(1)], "ch08")
            .unwrap_err();

        assert!(matches!(
            error,
            Error::Status(status) if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR
        ));
        server.join().unwrap();
    }

    #[test]
    fn error_field_is_reported() {
        let (url, server) = serve_once("200 OK", r#"{"result": null, "error": "x"}"#);

        let error = AnkiConnect::new(url)
            .unwrap()
            .move_cards(&[CardId(10)], "Book::Lesson")
            .unwrap_err();

        assert!(matches!(error, Error::Api(ref message) if message == "x"));
        assert_eq!(server.join().unwrap()["action"], "changeDeck");
    }

    #[test]
    fn moving_no_cards_makes_no_request() {
        let client = AnkiConnect::new("http://127.0.0.1:1").unwrap();
        client.move_cards(&[], "Deck").unwrap();
    }
}
