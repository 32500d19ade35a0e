//! Integration tests for listing and cloning against a loopback GitHub API.

use github_org_clone::prelude::*;
use git2::{Repository, Signature};
use serde_json::json;
use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;

struct Reply {
    status: &'static str,
    link: Option<String>,
    body: String,
}

/// Minimal HTTP/1.1 responder that records each request line.
struct FakeServer {
    addr: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeServer {
    fn start<F>(respond: F) -> Self
    where
        F: Fn(&str, &str) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        let own_addr = addr.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let request_line = read_request_line(&mut stream);
                recorded.lock().unwrap().push(request_line.clone());
                let reply = respond(&own_addr, &request_line);
                write_reply(&mut stream, &reply);
            }
        });

        Self { addr, requests }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_request_line(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buf)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

fn write_reply(stream: &mut TcpStream, reply: &Reply) {
    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        reply.status,
        reply.body.len()
    );
    if let Some(link) = &reply.link {
        head.push_str(&format!("Link: {}\r\n", link));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(reply.body.as_bytes());
    let _ = stream.flush();
}

fn page_of(request_line: &str) -> u32 {
    request_line
        .split(|c: char| c == '?' || c == '&' || c == ' ')
        .find_map(|part| part.strip_prefix("page="))
        .and_then(|p| p.parse().ok())
        .unwrap_or(1)
}

fn repo_json(name: &str, clone_url: &str) -> serde_json::Value {
    json!({
        "id": 1,
        "name": name,
        "full_name": format!("acme/{}", name),
        "url": format!("https://api.github.com/repos/acme/{}", name),
        "html_url": format!("https://github.com/acme/{}", name),
        "clone_url": clone_url,
        "default_branch": "main",
        "private": false
    })
}

fn ok(body: serde_json::Value, link: Option<String>) -> Reply {
    Reply {
        status: "200 OK",
        link,
        body: body.to_string(),
    }
}

fn direct_client(base_url: &str) -> GitHubClient {
    GitHubClient::new(&HttpTransport::direct(), base_url, None).unwrap()
}

#[test]
fn test_list_follows_link_pagination() {
    let server = FakeServer::start(|addr, line| {
        let page = page_of(line);
        let repos: Vec<_> = (0..2)
            .map(|i| {
                let name = format!("p{}-{}", page, i);
                repo_json(&name, &format!("https://github.com/acme/{}.git", name))
            })
            .collect();
        let link = (page < 3).then(|| {
            format!(
                "<http://{}/organizations/7/repos?type=all&per_page=100&page={}>; rel=\"next\", \
                 <http://{}/organizations/7/repos?type=all&per_page=100&page=3>; rel=\"last\"",
                addr,
                page + 1,
                addr
            )
        });
        ok(json!(repos), link)
    });

    let repos = list_org_repos(&direct_client(&server.url()), "acme").unwrap();

    let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["p1-0", "p1-1", "p2-0", "p2-1", "p3-0", "p3-1"]);
    assert_eq!(repos[0].url, "https://api.github.com/repos/acme/p1-0");

    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].starts_with("GET /orgs/acme/repos?type=all&per_page=100&page=1 "));
    assert!(requests[2].contains("page=3"));
}

#[test]
fn test_list_error_status_is_reported() {
    let server = FakeServer::start(|_, _| Reply {
        status: "404 Not Found",
        link: None,
        body: r#"{"message":"Not Found"}"#.into(),
    });

    let err = list_org_repos(&direct_client(&server.url()), "missing-org").unwrap_err();

    assert_eq!(err.page, 1);
    assert!(err.repos.is_empty());
    assert!(err.source.to_string().contains("404"));
}

#[test]
fn test_api_requests_route_through_proxy() {
    let proxy = FakeServer::start(|_, _| ok(json!([repo_json("w", "https://x/w.git")]), None));

    let transport = HttpTransport::from_proxy(Some(&proxy.url())).unwrap();
    let client = GitHubClient::new(&transport, "http://api.github.invalid", None).unwrap();

    let repos = list_org_repos(&client, "acme").unwrap();

    assert_eq!(repos.len(), 1);
    let requests = proxy.requests();
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0].starts_with("GET http://api.github.invalid/orgs/acme/repos?"),
        "request was not proxied: {}",
        requests[0]
    );
}

#[test]
fn test_clone_org_without_org_makes_no_requests() {
    let server = FakeServer::start(|_, _| ok(json!([]), None));
    let client = direct_client(&server.url());
    let cloner = Git2Cloner::new(HttpTransport::direct()).progress(false);

    let result = clone_org(&CloneConfig::new(""), &client, &cloner);

    assert!(matches!(result, Err(OrgCloneError::MissingOrg)));
    assert!(server.requests().is_empty());
}

fn init_origin(path: &Path, file: &str) {
    let repo = Repository::init(path).unwrap();
    fs::write(path.join(file), "content\n").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(file)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Test", "test@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "initial commit", &tree, &[])
        .unwrap();
}

#[test]
fn test_clone_org_end_to_end() {
    let origins = TempDir::new().unwrap();
    init_origin(&origins.path().join("alpha"), "alpha.txt");
    init_origin(&origins.path().join("gamma"), "gamma.txt");

    let alpha = origins.path().join("alpha").to_str().unwrap().to_string();
    let beta = origins.path().join("beta").to_str().unwrap().to_string();
    let gamma = origins.path().join("gamma").to_str().unwrap().to_string();

    let server = FakeServer::start(move |_, _| {
        ok(
            json!([
                repo_json("alpha", &alpha),
                repo_json("beta", &beta),
                repo_json("gamma", &gamma)
            ]),
            None,
        )
    });

    let target = TempDir::new().unwrap();
    let config = CloneConfig::new("acme").path(target.path()).quiet();
    let client = direct_client(&server.url());
    let cloner = Git2Cloner::new(HttpTransport::direct()).progress(config.progress);

    let report = clone_org(&config, &client, &cloner).unwrap();

    assert_eq!(report.attempted(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures().next().unwrap().repo, "acme/beta");
    assert!(target.path().join("alpha/alpha.txt").exists());
    assert!(target.path().join("gamma/gamma.txt").exists());
}

fn proxied_cloner(proxy: &str) -> Git2Cloner {
    Git2Cloner::new(HttpTransport::from_proxy(Some(proxy)).unwrap()).progress(false)
}

fn bad_gateway(_: &str, _: &str) -> Reply {
    Reply {
        status: "502 Bad Gateway",
        link: None,
        body: String::new(),
    }
}

#[test]
fn test_https_clone_tunnels_through_http_proxy() {
    let proxy = FakeServer::start(bad_gateway);
    let target = TempDir::new().unwrap();
    let repo = GitHubRepo::new("w", "acme/w", "https://github.com/acme/w.git");

    let result = proxied_cloner(&proxy.url()).clone_repo(&repo, target.path());

    assert!(matches!(result, Err(OrgCloneError::CloneError { .. })));
    assert_eq!(proxy.requests(), vec!["CONNECT github.com:443 HTTP/1.1"]);
}

#[test]
fn test_http_clone_goes_through_http_proxy() {
    let proxy = FakeServer::start(bad_gateway);
    let target = TempDir::new().unwrap();
    let repo = GitHubRepo::new("w", "acme/w", "http://127.0.0.2:9/acme/w.git");

    let result = proxied_cloner(&proxy.url()).clone_repo(&repo, target.path());

    assert!(result.is_err());
    let requests = proxy.requests();
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0].starts_with(
            "GET http://127.0.0.2:9/acme/w.git/info/refs?service=git-upload-pack "
        ),
        "clone did not use the proxy: {:?}",
        requests
    );
}

/// SOCKS5 endpoint that records each requested destination and refuses it.
struct FakeSocksProxy {
    addr: String,
    targets: Arc<Mutex<Vec<String>>>,
}

impl FakeSocksProxy {
    fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
        let targets = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&targets);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                if let Some(target) = read_socks_connect(&mut stream) {
                    recorded.lock().unwrap().push(target);
                }
                // general failure
                let _ = stream.write_all(&[5, 1, 0, 1, 0, 0, 0, 0, 0, 0]);
            }
        });

        Self { addr, targets }
    }

    fn url(&self) -> String {
        format!("socks5://{}", self.addr)
    }

    fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }
}

fn read_socks_connect(stream: &mut TcpStream) -> Option<String> {
    let mut greeting = [0u8; 2];
    stream.read_exact(&mut greeting).ok()?;
    let mut methods = vec![0u8; greeting[1] as usize];
    stream.read_exact(&mut methods).ok()?;
    stream.write_all(&[5, 0]).ok()?;

    let mut header = [0u8; 4];
    stream.read_exact(&mut header).ok()?;
    let host = match header[3] {
        1 => {
            let mut ip = [0u8; 4];
            stream.read_exact(&mut ip).ok()?;
            format!("{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3])
        }
        3 => {
            let mut len = [0u8; 1];
            stream.read_exact(&mut len).ok()?;
            let mut name = vec![0u8; len[0] as usize];
            stream.read_exact(&mut name).ok()?;
            String::from_utf8_lossy(&name).to_string()
        }
        _ => return None,
    };
    let mut port = [0u8; 2];
    stream.read_exact(&mut port).ok()?;
    Some(format!("{}:{}", host, u16::from_be_bytes(port)))
}

#[test]
fn test_clone_goes_through_socks5_proxy() {
    let proxy = FakeSocksProxy::start();
    let target = TempDir::new().unwrap();
    let repo = GitHubRepo::new("x", "acme/x", "https://127.0.0.2:9/acme/x.git");

    let result = proxied_cloner(&proxy.url()).clone_repo(&repo, target.path());

    assert!(result.is_err());
    let err = result.unwrap_err().to_string();
    assert!(!err.contains("unknown http scheme"), "{}", err);
    assert_eq!(proxy.targets(), vec!["127.0.0.2:9"]);
}
