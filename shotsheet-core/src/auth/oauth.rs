//! Google OAuth 2.0 installed-app flow: refresh grant and loopback consent

use super::TokenProvider;
use super::secret::ClientSecret;
use super::token::StoredToken;
use crate::error::{Result, SyncError};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration as ChronoDuration, Utc};
use rand::RngCore;
use reqwest::blocking::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use url::Url;

/// How long the consent flow waits for the browser redirect
const CONSENT_TIMEOUT: Duration = Duration::from_secs(300);
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(3);
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

const CONSENT_PAGE: &str =
    "The authentication flow has completed. You may close this window.";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

pub struct GoogleOAuth {
    client: Client,
    client_secret_path: PathBuf,
    scopes: Vec<String>,
}

impl GoogleOAuth {
    /// The client secret is only read when interactive consent is needed
    pub fn new(client_secret_path: PathBuf, scopes: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Auth(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            client_secret_path,
            scopes,
        })
    }

    fn request_token(&self, token_uri: &str, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .client
            .post(token_uri)
            .form(form)
            .send()
            .map_err(|e| SyncError::RemoteService {
                status: None,
                message: format!("token endpoint unreachable: {}", e),
            })?;
        let status = response.status();
        let body = response.text().map_err(|e| SyncError::RemoteService {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

        if status.is_success() {
            return serde_json::from_str(&body)
                .map_err(|e| SyncError::Auth(format!("unexpected token response: {}", e)));
        }

        // 4xx means the grant itself was refused; anything else is the service.
        let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) => match err.error_description {
                Some(description) => format!("{}: {}", err.error, description),
                None => err.error,
            },
            Err(_) => body.trim().to_string(),
        };
        if status.is_client_error() {
            Err(SyncError::Auth(message))
        } else {
            Err(SyncError::RemoteService {
                status: Some(status.as_u16()),
                message,
            })
        }
    }

    fn build_stored(
        &self,
        response: TokenResponse,
        previous_refresh: Option<String>,
        token_uri: &str,
        client_id: &str,
        client_secret: &str,
    ) -> StoredToken {
        let scopes = match response.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => self.scopes.clone(),
        };
        StoredToken {
            token: Some(response.access_token),
            refresh_token: response.refresh_token.or(previous_refresh),
            token_uri: token_uri.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            scopes,
            expiry: response
                .expires_in
                .map(|secs| Utc::now() + ChronoDuration::seconds(secs)),
        }
    }
}

impl TokenProvider for GoogleOAuth {
    fn refresh(&self, token: &StoredToken) -> Result<StoredToken> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| SyncError::Auth("token has no refresh token".to_string()))?;
        log::info!("Refreshing access token");

        let response = self.request_token(
            &token.token_uri,
            &[
                ("client_id", token.client_id.as_str()),
                ("client_secret", token.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ],
        )?;
        Ok(self.build_stored(
            response,
            token.refresh_token.clone(),
            &token.token_uri,
            &token.client_id,
            &token.client_secret,
        ))
    }

    fn consent(&self) -> Result<StoredToken> {
        let secret = ClientSecret::from_file(&self.client_secret_path)?;
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .map_err(|e| SyncError::io("failed to open loopback listener", e))?;
        let port = listener
            .local_addr()
            .map_err(|e| SyncError::io("failed to open loopback listener", e))?
            .port();
        let redirect_uri = format!("http://127.0.0.1:{}/", port);

        let pkce = Pkce::generate();
        let state = random_token(16);
        let auth_url = authorization_url(&secret, &redirect_uri, &self.scopes, &state, &pkce)?;

        eprintln!("Please visit this URL to authorize this application: {}", auth_url);
        if let Err(e) = open::that(auth_url.as_str()) {
            log::warn!("Could not open a browser: {}", e);
        }

        let code = wait_for_code(&listener, &state, CONSENT_TIMEOUT)?;
        let response = self.request_token(
            &secret.token_uri,
            &[
                ("code", code.as_str()),
                ("client_id", secret.client_id.as_str()),
                ("client_secret", secret.client_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
                ("code_verifier", pkce.verifier.as_str()),
            ],
        )?;
        Ok(self.build_stored(
            response,
            None,
            &secret.token_uri,
            &secret.client_id,
            &secret.client_secret,
        ))
    }
}

/// PKCE verifier and its S256 challenge
struct Pkce {
    verifier: String,
    challenge: String,
}

impl Pkce {
    fn generate() -> Self {
        Self::from_verifier(random_token(64))
    }

    fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

fn random_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

fn authorization_url(
    secret: &ClientSecret,
    redirect_uri: &str,
    scopes: &[String],
    state: &str,
    pkce: &Pkce,
) -> Result<Url> {
    let scope = scopes.join(" ");
    Url::parse_with_params(
        &secret.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", secret.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("state", state),
            ("code_challenge", pkce.challenge.as_str()),
            ("code_challenge_method", "S256"),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|e| SyncError::Auth(format!("invalid auth_uri '{}': {}", secret.auth_uri, e)))
}

/// Accept loopback connections until the browser delivers the redirect.
///
/// Connections are served one at a time, so each gets a short read timeout;
/// an idle preconnect is dropped instead of blocking the real redirect.
fn wait_for_code(listener: &TcpListener, expected_state: &str, timeout: Duration) -> Result<String> {
    listener
        .set_nonblocking(true)
        .map_err(|e| SyncError::io("failed to configure loopback listener", e))?;
    let deadline = Instant::now() + timeout;

    loop {
        let mut stream = match listener.accept() {
            Ok((stream, _)) => stream,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Err(SyncError::Auth(format!(
                        "no authorization redirect received within {} seconds",
                        timeout.as_secs()
                    )));
                }
                thread::sleep(ACCEPT_POLL_INTERVAL);
                continue;
            }
            Err(e) => return Err(SyncError::io("loopback connection failed", e)),
        };

        let Some(target) = read_request_target(&stream) else {
            log::debug!("Dropping loopback connection without a request line");
            continue;
        };
        match parse_redirect(&target, expected_state) {
            Ok(Some(code)) => {
                respond(&mut stream, "200 OK", CONSENT_PAGE);
                return Ok(code);
            }
            // favicon and other stray requests
            Ok(None) => respond(&mut stream, "404 Not Found", ""),
            Err(e) => {
                respond(&mut stream, "400 Bad Request", &e.to_string());
                return Err(e);
            }
        }
    }
}

/// Request target of a GET; `None` for idle, timed-out or non-GET connections
fn read_request_target(stream: &TcpStream) -> Option<String> {
    // Accepted sockets may inherit the listener's non-blocking mode.
    stream.set_nonblocking(false).ok()?;
    stream.set_read_timeout(Some(REQUEST_READ_TIMEOUT)).ok()?;

    let mut line = String::new();
    BufReader::new(stream).read_line(&mut line).ok()?;
    // "GET /?state=..&code=.. HTTP/1.1"
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Some(target.to_string()),
        _ => None,
    }
}

fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()) {
        log::debug!("Failed to answer loopback request: {}", e);
    }
}

/// Extract the authorization code from a redirect request target.
///
/// Returns `Ok(None)` for requests that carry neither a code nor an error.
fn parse_redirect(target: &str, expected_state: &str) -> Result<Option<String>> {
    let url = Url::parse("http://127.0.0.1")
        .and_then(|base| base.join(target))
        .map_err(|e| SyncError::Auth(format!("malformed redirect '{}': {}", target, e)))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(SyncError::Auth(format!("consent denied: {}", error)));
    }
    let Some(code) = code else {
        return Ok(None);
    };
    if state.as_deref() != Some(expected_state) {
        return Err(SyncError::Auth(
            "state mismatch in authorization redirect".to_string(),
        ));
    }
    Ok(Some(code))
}
