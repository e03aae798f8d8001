use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, info};

use crate::scan_types::{
    CriteriaError, ExtractError, PASSKEY_HOST, SearchCriteria, SessionError, SessionHandle,
    base_url,
};

/// Name of the cookie carrying the session credential
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";

/// The booking site as seen by the poll loop
#[async_trait]
pub trait BookingSite: Send + Sync {
    /// Establish a session and submit the search
    async fn open_session(&self, criteria: &SearchCriteria) -> Result<SessionHandle, SessionError>;

    /// Fetch the HTML listing for a submitted search
    async fn fetch_results_page(&self, session: &SessionHandle) -> Result<String, ExtractError>;
}

/// Connection settings for the passkey site
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Entry link carrying the user's token
    pub entry_url: Url,

    /// Housing block base URL
    pub base_url: String,

    /// User agent sent with every request
    pub user_agent: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl SessionConfig {
    /// Settings for the given entry link with the default block and timeouts
    pub fn new(entry_url: Url) -> Self {
        Self {
            entry_url,
            base_url: base_url(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Check that a link is a passkey housing entry URL carrying a token
pub fn parse_entry_url(raw: &str) -> Result<Url, CriteriaError> {
    let url = Url::parse(raw).map_err(|_| CriteriaError::InvalidUrl(raw.to_string()))?;
    let has_token = url.query().is_some_and(|q| q.contains("token="));
    if url.host_str() == Some(PASSKEY_HOST) && url.path() == "/entry" && has_token {
        Ok(url)
    } else {
        Err(CriteriaError::InvalidUrl(raw.to_string()))
    }
}

/// Manages the cookie session with the passkey site
pub struct SessionManager {
    client: Client,
    jar: Arc<Jar>,
    config: SessionConfig,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let jar = Arc::new(Jar::default());

        let client = Client::builder()
            .cookie_provider(jar.clone())
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SessionError::Network {
                stage: "Client setup",
                message: e.to_string(),
            })?;

        Ok(Self { client, jar, config })
    }

    /// Landing page of the housing block, used by alerts
    pub fn home_url(&self) -> String {
        format!("{}/home", self.config.base_url)
    }

    fn search_url(&self) -> String {
        format!("{}/rooms/select", self.config.base_url)
    }

    fn results_url(&self) -> String {
        format!("{}/list/hotels", self.config.base_url)
    }

    /// Visit the entry link so the site hands out its XSRF cookie
    async fn request_session(&self) -> Result<String, SessionError> {
        info!("Requesting passkey session");

        let response = self
            .client
            .get(self.config.entry_url.clone())
            .send()
            .await
            .map_err(|e| SessionError::Network {
                stage: "Session request",
                message: e.to_string(),
            })?;

        expect_ok("Session request", response.status())?;

        let cookies = self.jar.cookies(&self.config.entry_url);
        let header = cookies.as_ref().and_then(|value| value.to_str().ok());
        find_cookie(header.unwrap_or_default(), XSRF_COOKIE).ok_or(SessionError::AuthRejected)
    }
}

#[async_trait]
impl BookingSite for SessionManager {
    async fn open_session(&self, criteria: &SearchCriteria) -> Result<SessionHandle, SessionError> {
        let xsrf_token = self.request_session().await?;
        debug!("Session established, submitting search");

        let response = self
            .client
            .post(self.search_url())
            .form(&search_form(criteria, &xsrf_token))
            .send()
            .await
            .map_err(|e| SessionError::Network {
                stage: "Search",
                message: e.to_string(),
            })?;

        expect_ok("Search", response.status())?;

        Ok(SessionHandle {
            xsrf_token,
            opened_at: Utc::now(),
        })
    }

    async fn fetch_results_page(&self, session: &SessionHandle) -> Result<String, ExtractError> {
        debug!("Fetching results for search submitted at {}", session.opened_at);

        let response = self
            .client
            .get(self.results_url())
            .send()
            .await
            .map_err(|e| ExtractError::Fetch(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(ExtractError::Fetch(response.status().as_u16().to_string()));
        }

        response
            .text()
            .await
            .map_err(|e| ExtractError::Fetch(e.to_string()))
    }
}

fn expect_ok(stage: &'static str, status: StatusCode) -> Result<(), SessionError> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(SessionError::UnexpectedStatus {
            stage,
            status: status.as_u16(),
        })
    }
}

/// Look a cookie up in a `name=value; name=value` header
fn find_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Form fields of the block search request
pub fn search_form(criteria: &SearchCriteria, xsrf_token: &str) -> Vec<(&'static str, String)> {
    vec![
        ("_csrf", xsrf_token.to_string()),
        ("hotelId", "0".to_string()),
        ("blockMap.blocks[0].blockId", "0".to_string()),
        (
            "blockMap.blocks[0].checkIn",
            criteria.check_in.format("%Y-%m-%d").to_string(),
        ),
        (
            "blockMap.blocks[0].checkOut",
            criteria.check_out.format("%Y-%m-%d").to_string(),
        ),
        ("blockMap.blocks[0].numberOfGuests", criteria.guests.to_string()),
        ("blockMap.blocks[0].numberOfRooms", criteria.rooms.to_string()),
        (
            "blockMap.blocks[0].numberOfChildren",
            criteria.children.to_string(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan_types::SearchRequest;

    #[test]
    fn test_search_form_fields() {
        let request = SearchRequest {
            guests: 3,
            children: 1,
            ..SearchRequest::default()
        };
        let criteria = SearchCriteria::from_request(request).unwrap();
        let form = search_form(&criteria, "abc123");

        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };
        assert_eq!(get("_csrf"), "abc123");
        assert_eq!(get("hotelId"), "0");
        assert_eq!(get("blockMap.blocks[0].blockId"), "0");
        assert_eq!(get("blockMap.blocks[0].checkIn"), "2023-08-03");
        assert_eq!(get("blockMap.blocks[0].checkOut"), "2023-08-06");
        assert_eq!(get("blockMap.blocks[0].numberOfGuests"), "3");
        assert_eq!(get("blockMap.blocks[0].numberOfRooms"), "1");
        assert_eq!(get("blockMap.blocks[0].numberOfChildren"), "1");
    }

    #[test]
    fn test_find_cookie() {
        let header = "JSESSIONID=xyz; XSRF-TOKEN=token-1; other=1";
        assert_eq!(find_cookie(header, XSRF_COOKIE).as_deref(), Some("token-1"));
        assert_eq!(find_cookie("JSESSIONID=xyz", XSRF_COOKIE), None);
    }

    #[test]
    fn test_entry_url_validation() {
        assert!(parse_entry_url("https://book.passkey.com/entry?token=ABC").is_ok());
        assert!(parse_entry_url("https://book.passkey.com/entry").is_err());
        assert!(parse_entry_url("https://example.com/entry?token=ABC").is_err());
        assert!(parse_entry_url("not a url").is_err());
    }

    /// Serves canned responses keyed by `METHOD /path` and records each request
    struct LocalSite {
        addr: std::net::SocketAddr,
        requests: Arc<std::sync::Mutex<Vec<String>>>,
    }

    fn respond(status: &str, headers: &[&str], body: &str) -> String {
        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            status,
            body.len()
        );
        for header in headers {
            response.push_str(header);
            response.push_str("\r\n");
        }
        response.push_str("\r\n");
        response.push_str(body);
        response
    }

    async fn local_site(routes: Vec<(&'static str, String)>) -> LocalSite {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(std::sync::Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let routes = routes.clone();
                let seen = seen.clone();
                tokio::spawn(async move {
                    let mut raw = Vec::new();
                    let mut buf = [0u8; 4096];
                    loop {
                        let n = stream.read(&mut buf).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        raw.extend_from_slice(&buf[..n]);
                        let text = String::from_utf8_lossy(&raw).to_string();
                        if let Some(end) = text.find("\r\n\r\n") {
                            let length = text[..end]
                                .lines()
                                .find_map(|line| {
                                    let (name, value) = line.split_once(':')?;
                                    name.eq_ignore_ascii_case("content-length")
                                        .then(|| value.trim().parse::<usize>().ok())
                                        .flatten()
                                })
                                .unwrap_or(0);
                            if raw.len() >= end + 4 + length {
                                break;
                            }
                        }
                    }

                    let request = String::from_utf8_lossy(&raw).to_string();
                    let response = routes
                        .iter()
                        .find(|(key, _)| {
                            request.starts_with(&format!("{} ", key))
                                || request.starts_with(&format!("{}?", key))
                        })
                        .map(|(_, response)| response.clone())
                        .unwrap_or_else(|| respond("404 Not Found", &[], ""));
                    seen.lock().unwrap().push(request);

                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        LocalSite { addr, requests }
    }

    fn local_manager(site: &LocalSite) -> SessionManager {
        let entry_url = Url::parse(&format!("http://{}/entry?token=abc", site.addr)).unwrap();
        let config = SessionConfig {
            base_url: format!("http://{}/event/1/owner/2", site.addr),
            timeout: Duration::from_secs(5),
            ..SessionConfig::new(entry_url)
        };
        SessionManager::new(config).unwrap()
    }

    fn default_criteria() -> SearchCriteria {
        SearchCriteria::from_request(SearchRequest::default()).unwrap()
    }

    fn ok_with_cookie() -> String {
        respond("200 OK", &["Set-Cookie: XSRF-TOKEN=t1; Path=/"], "welcome")
    }

    #[tokio::test]
    async fn test_open_session_submits_search_with_token() {
        let site = local_site(vec![
            ("GET /entry", ok_with_cookie()),
            ("POST /event/1/owner/2/rooms/select", respond("200 OK", &[], "")),
            (
                "GET /event/1/owner/2/list/hotels",
                respond("200 OK", &[], "<html>results</html>"),
            ),
        ])
        .await;
        let manager = local_manager(&site);

        let session = manager.open_session(&default_criteria()).await.unwrap();
        assert_eq!(session.xsrf_token, "t1");

        let page = manager.fetch_results_page(&session).await.unwrap();
        assert_eq!(page, "<html>results</html>");

        let requests = site.requests.lock().unwrap().clone();
        let search = requests
            .iter()
            .find(|r| r.starts_with("POST /event/1/owner/2/rooms/select"))
            .unwrap();
        assert!(search.contains("_csrf=t1"));
        assert!(search.contains(".checkIn=2023-08-03"));
    }

    #[tokio::test]
    async fn test_missing_cookie_is_auth_rejected() {
        let site = local_site(vec![("GET /entry", respond("200 OK", &[], "welcome"))]).await;
        let result = local_manager(&site).open_session(&default_criteria()).await;
        assert!(matches!(result, Err(SessionError::AuthRejected)));
    }

    #[tokio::test]
    async fn test_entry_status_outside_accepted_set() {
        let site = local_site(vec![(
            "GET /entry",
            respond("503 Service Unavailable", &[], "busy"),
        )])
        .await;
        let result = local_manager(&site).open_session(&default_criteria()).await;
        assert!(matches!(
            result,
            Err(SessionError::UnexpectedStatus {
                stage: "Session request",
                status: 503
            })
        ));
    }

    #[tokio::test]
    async fn test_search_status_outside_accepted_set() {
        let site = local_site(vec![
            ("GET /entry", ok_with_cookie()),
            (
                "POST /event/1/owner/2/rooms/select",
                respond("500 Internal Server Error", &[], ""),
            ),
        ])
        .await;
        let result = local_manager(&site).open_session(&default_criteria()).await;
        assert!(matches!(
            result,
            Err(SessionError::UnexpectedStatus {
                stage: "Search",
                status: 500
            })
        ));
    }

    #[tokio::test]
    async fn test_results_page_status_is_fetch_error() {
        let site = local_site(vec![(
            "GET /event/1/owner/2/list/hotels",
            respond("502 Bad Gateway", &[], ""),
        )])
        .await;
        let session = SessionHandle {
            xsrf_token: "t1".to_string(),
            opened_at: Utc::now(),
        };
        let result = local_manager(&site).fetch_results_page(&session).await;
        assert!(matches!(result, Err(ExtractError::Fetch(status)) if status == "502"));
    }

    #[tokio::test]
    async fn test_unreachable_site_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let entry_url = Url::parse(&format!("http://{}/entry?token=abc", addr)).unwrap();
        let manager = SessionManager::new(SessionConfig {
            base_url: format!("http://{}/event/1/owner/2", addr),
            timeout: Duration::from_secs(5),
            ..SessionConfig::new(entry_url)
        })
        .unwrap();

        let result = manager.open_session(&default_criteria()).await;
        assert!(matches!(
            result,
            Err(SessionError::Network {
                stage: "Session request",
                ..
            })
        ));
    }

    #[test]
    fn test_urls_derive_from_block() {
        let url = parse_entry_url("https://book.passkey.com/entry?token=ABC").unwrap();
        let manager = SessionManager::new(SessionConfig::new(url)).unwrap();
        assert_eq!(
            manager.home_url(),
            "https://book.passkey.com/event/50430831/owner/10909638/home"
        );
        assert!(manager.results_url().ends_with("/list/hotels"));
        assert!(manager.search_url().ends_with("/rooms/select"));
    }
}
