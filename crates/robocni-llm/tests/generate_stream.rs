//! Drives `OllamaClient` against a one-shot local HTTP responder.

use robocni_core::{ModelQuery, TransportError};
use robocni_llm::{OllamaClient, OllamaConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accept one connection, answer with `status` and `body`, return the raw request.
async fn serve_once(status: &'static str, body: &'static str) -> (u16, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/x-ndjson\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    });

    (port, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8(buf).unwrap()
}

fn client(port: u16) -> OllamaClient {
    OllamaClient::new(OllamaConfig::new("127.0.0.1").with_port(port)).unwrap()
}

#[tokio::test]
async fn concatenates_streamed_fragments() {
    let (port, server) = serve_once(
        "200 OK",
        "{\"response\":\"  ```json\\n{\\\"name\\\":\",\"done\":false}\n\
         {\"response\":\"\\\"cfg1\\\"}\\n```\\n\",\"done\":false}\n\
         {\"response\":\"\",\"done\":true}\n",
    )
    .await;

    let reply = client(port).query("Use bridge CNI").await.unwrap();
    assert_eq!(reply, "```json\n{\"name\":\"cfg1\"}\n```");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/generate HTTP/1.1"));
    assert!(request.contains("\"model\":\"llama2:13b\""));
    assert!(request.contains("\"prompt\":\"Use bridge CNI\""));
}

#[tokio::test]
async fn accepts_unterminated_last_line() {
    let (port, _server) = serve_once("200 OK", "{\"response\":\"a\"}\n{\"response\":\"b\"}").await;
    assert_eq!(client(port).query("x").await.unwrap(), "ab");
}

#[tokio::test]
async fn non_success_status_is_transport_error() {
    let (port, _server) =
        serve_once("404 Not Found", "{\"error\":\"model 'llama2:13b' not found\"}").await;
    let err = client(port).query("x").await.unwrap_err();
    assert_eq!(
        err,
        TransportError::Status {
            status: 404,
            body: "model 'llama2:13b' not found".to_string(),
        }
    );
}

#[tokio::test]
async fn malformed_line_is_transport_error() {
    let (port, _server) = serve_once("200 OK", "{\"response\":\"a\"}\n<html>oops</html>\n").await;
    assert!(matches!(
        client(port).query("x").await,
        Err(TransportError::MalformedFragment(_))
    ));
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    assert!(matches!(
        client(port).query("x").await,
        Err(TransportError::Unreachable(_))
    ));
}
