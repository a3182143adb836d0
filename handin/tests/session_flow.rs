//! End-to-end exchanges against an in-process submission server.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use handin::{Client, ClientConfig, Credentials, Error, Request, ResponseBody, SessionState};

const EMAIL: &str = "ada@example.org";
const PASSWORD: &str = "correct horse";

/// How the fake server answers each step
#[derive(Clone, Copy)]
enum Script {
    Accept,
    RejectLogin,
    SplitWrites,
    Silent,
}

fn credentials(password: &str) -> Credentials {
    Credentials::new(EMAIL, password, "Ada Lovelace", "https://git.example.org/ada/a1")
}

async fn read_request(socket: &mut TcpStream, len: usize) -> Request {
    let mut buf = vec![0u8; len];
    socket.read_exact(&mut buf).await.unwrap();
    Request::decode(&buf).unwrap()
}

fn encode(body: ResponseBody) -> BytesMut {
    body.encode(handin_core::timestamp_now()).unwrap()
}

async fn serve(script: Script) -> (u16, JoinHandle<Vec<Request>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut seen = Vec::new();

        let login = read_request(&mut socket, 109).await;
        seen.push(login.clone());

        let accepted = match &login {
            Request::Login { email, password } => email == EMAIL && password == PASSWORD,
            _ => false,
        };

        match script {
            Script::Silent => {
                tokio::time::sleep(Duration::from_millis(500)).await;
                return seen;
            }
            Script::RejectLogin => {
                assert!(!accepted);
                let reason = encode(ResponseBody::Rejected {
                    reason: "Invalid credentials".into(),
                });
                socket.write_all(&reason).await.unwrap();
                return seen;
            }
            Script::SplitWrites => {
                assert!(accepted);
                let ack = encode(ResponseBody::LoginAccepted);
                socket.write_all(&ack[..7]).await.unwrap();
                socket.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
                socket.write_all(&ack[7..]).await.unwrap();
            }
            Script::Accept => {
                assert!(accepted);
                socket
                    .write_all(&encode(ResponseBody::LoginAccepted))
                    .await
                    .unwrap();
            }
        }

        seen.push(read_request(&mut socket, 205).await);
        socket
            .write_all(&encode(ResponseBody::SubmissionAccepted {
                token: "3f9a1c".into(),
            }))
            .await
            .unwrap();

        seen.push(read_request(&mut socket, 13).await);
        socket
            .write_all(&encode(ResponseBody::Rejected {
                reason: "Logout OK".into(),
            }))
            .await
            .unwrap();

        seen
    });

    (port, handle)
}

fn client(port: u16) -> Client {
    Client::new(ClientConfig::new("127.0.0.1", port).with_read_timeout(Duration::from_secs(2)))
}

#[tokio::test]
async fn test_full_exchange_over_tcp() {
    let (port, server) = serve(Script::Accept).await;
    let mut client = client(port);

    let receipt = client.run(credentials(PASSWORD)).await.unwrap();

    assert_eq!(receipt.token, "3f9a1c");
    assert_eq!(receipt.logout_reason, "Logout OK");
    assert_eq!(client.session_state(), Some(SessionState::Done));
    assert!(!client.is_connected());

    let seen = server.await.unwrap();
    assert_eq!(
        seen,
        vec![
            Request::login(EMAIL, PASSWORD),
            Request::submission("Ada Lovelace", EMAIL, "https://git.example.org/ada/a1"),
            Request::Logout,
        ]
    );
}

#[tokio::test]
async fn test_rejected_login_over_tcp() {
    let (port, server) = serve(Script::RejectLogin).await;
    let mut client = client(port);

    let err = client.run(credentials("wrong")).await.unwrap_err();

    assert_eq!(err.rejection_reason(), Some("Invalid credentials"));
    assert_eq!(client.session_state(), Some(SessionState::Failed));

    let seen = server.await.unwrap();
    assert_eq!(seen.len(), 1);
}

#[tokio::test]
async fn test_short_reads_are_accumulated() {
    let (port, server) = serve(Script::SplitWrites).await;
    let mut client = client(port);

    let receipt = client.run(credentials(PASSWORD)).await.unwrap();

    assert_eq!(receipt.token, "3f9a1c");
    assert_eq!(server.await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let (port, server) = serve(Script::Silent).await;
    let mut client = Client::new(
        ClientConfig::new("127.0.0.1", port).with_read_timeout(Duration::from_millis(100)),
    );

    let err = client.run(credentials(PASSWORD)).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Transport(handin_transport::Error::ReadTimeout(_))
    ));
    assert_eq!(
        client.session().and_then(|s| s.failed_during()),
        Some(SessionState::LoggingIn)
    );

    server.await.unwrap();
}

#[tokio::test]
async fn test_connection_refused() {
    // Bind then drop to get a port nobody listens on
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut client = client(port);
    let err = client.run(credentials(PASSWORD)).await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(client.session_state(), Some(SessionState::Failed));
}
