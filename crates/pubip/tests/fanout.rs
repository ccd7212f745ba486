use {
    pubip::{Extractor, HttpProvider, Outcome, Registry, Resolver, ResultMap},
    std::{
        net::{Ipv4Addr, SocketAddr, TcpListener},
        time::{Duration, Instant},
    },
    wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    },
};

// Every stub lives on the same server but is reached under its own host name,
// so the result map gets one key per stub.
struct Stubs {
    server: MockServer,
    hosts: Vec<(String, SocketAddr)>,
}

impl Stubs {
    async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            hosts: Vec::new(),
        }
    }

    async fn respond(&mut self, host: &str, response: ResponseTemplate) -> String {
        let route = format!("/{}", host);
        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .respond_with(response)
            .mount(&self.server)
            .await;

        let addr = *self.server.address();
        self.hosts.push((host.to_owned(), addr));
        format!("http://{}:{}{}", host, addr.port(), route)
    }

    async fn json(&mut self, host: &str, body: &str) -> String {
        self.respond(host, ResponseTemplate::new(200).set_body_string(body))
            .await
    }

    // A host whose port has nothing listening on it.
    fn refusing(&mut self, host: &str) -> String {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        self.hosts.push((host.to_owned(), addr));
        format!("http://{}:{}/ip", host, addr.port())
    }

    fn resolver(&self) -> Resolver {
        self.resolver_with(Resolver::builder())
    }

    fn resolver_with(&self, builder: pubip::ResolverBuilder) -> Resolver {
        self.hosts
            .iter()
            .fold(builder.no_proxy(), |builder, (host, addr)| {
                builder.resolve_to(host.as_str(), *addr)
            })
            .build()
    }
}

fn value(results: &ResultMap, host: &str) -> Option<String> {
    results.get(host).and_then(Outcome::value).map(str::to_owned)
}

// The transport error text has to make it into the map, not just the variant.
fn assert_refused(results: &ResultMap, host: &str) {
    let err = results
        .get(host)
        .and_then(Outcome::error)
        .unwrap_or_else(|| panic!("{} is expected to fail", host));
    assert!(
        err.to_lowercase().contains("connection refused"),
        "unexpected error for {}: {}",
        host,
        err,
    );
}

#[tokio::test]
async fn mixed_registry_reports_every_provider() {
    let mut stubs = Stubs::start().await;
    let a = stubs.json("host-a.test", r#"{"ip":"1.2.3.4"}"#).await;
    let b = stubs.refusing("host-b.test");
    let c = stubs
        .respond("host-c.test", ResponseTemplate::new(200).set_body_string("5.6.7.8"))
        .await;

    let registry = Registry::new([
        HttpProvider::json(a, "ip"),
        HttpProvider::json(b, "ip"),
        HttpProvider::raw(c),
    ]);

    let results = stubs.resolver().resolve(&registry).await.unwrap();

    let hosts: Vec<_> = results.iter().map(|(host, _)| host).collect();
    assert_eq!(hosts, ["host-a.test", "host-b.test", "host-c.test"]);

    assert_eq!(results.get("host-a.test"), Some(&Outcome::Value("1.2.3.4".into())));
    assert_refused(&results, "host-b.test");
    assert_eq!(results.get("host-c.test"), Some(&Outcome::Value("5.6.7.8".into())));

    let merged = results.to_display_map();
    assert_eq!(merged["host-a.test"], "1.2.3.4");
    assert_eq!(merged["host-c.test"], "5.6.7.8");
    assert_eq!(merged["host-b.test"], results.get("host-b.test").unwrap().as_str());
    assert!(merged["host-b.test"].to_lowercase().contains("connection refused"));
}

#[tokio::test]
async fn failing_registry_still_completes() {
    let mut stubs = Stubs::start().await;
    let refused = stubs.refusing("refused.test");
    let garbage = stubs.json("garbage.test", "not json").await;
    let keyless = stubs.json("keyless.test", r#"{"address":"1.2.3.4"}"#).await;

    let registry = Registry::new([
        HttpProvider::json(refused, "ip"),
        HttpProvider::json(garbage, "ip"),
        HttpProvider::json(keyless, "ip"),
    ]);

    let results = stubs.resolver().resolve(&registry).await.unwrap();

    assert_eq!(results.len(), registry.len());
    assert!(results.iter().all(|(_, outcome)| outcome.is_error()));
    assert_refused(&results, "refused.test");
    assert!(
        results
            .get("garbage.test")
            .and_then(Outcome::error)
            .is_some_and(|err| err.starts_with("Unable to parse result as JSON: not json ("))
    );
    assert_eq!(
        results.get("keyless.test").and_then(Outcome::error),
        Some("Unknown error: missing field `ip`"),
    );
}

#[tokio::test]
async fn successful_values_are_exact() {
    let mut stubs = Stubs::start().await;
    let v4 = stubs.json("v4.test", r#"{"ipString":"203.0.113.7"}"#).await;
    let v6 = stubs.json("v6.test", r#"{"ipaddress":"2001:db8::1"}"#).await;

    let registry = Registry::new([
        HttpProvider::json(v4, "ipString"),
        HttpProvider::json(v6, "ipaddress"),
    ]);

    let results = stubs.resolver().resolve(&registry).await.unwrap();

    assert_eq!(value(&results, "v4.test").as_deref(), Some("203.0.113.7"));
    assert_eq!(value(&results, "v6.test").as_deref(), Some("2001:db8::1"));
    assert!(results.get("v6.test").and_then(Outcome::ip).is_some_and(|ip| ip.is_ipv6()));
}

#[tokio::test]
async fn one_failure_does_not_touch_the_others() {
    let mut stubs = Stubs::start().await;
    let mut providers = Vec::new();
    for n in 1..=4 {
        let url = stubs
            .json(&format!("ok-{}.test", n), &format!(r#"{{"ip":"10.0.0.{}"}}"#, n))
            .await;
        providers.push(HttpProvider::json(url, "ip"));
    }
    providers.insert(2, HttpProvider::json(stubs.refusing("down.test"), "ip"));

    let results = stubs.resolver().resolve(&providers).await.unwrap();

    assert_eq!(results.len(), 5);
    assert!(results.get("down.test").is_some_and(Outcome::is_error));
    for n in 1..=4 {
        assert_eq!(
            value(&results, &format!("ok-{}.test", n)),
            Some(format!("10.0.0.{}", n)),
        );
    }
}

#[tokio::test]
async fn raw_text_is_returned_verbatim() {
    let mut stubs = Stubs::start().await;
    let url = stubs
        .respond("raw.test", ResponseTemplate::new(200).set_body_string("198.51.100.4\n"))
        .await;

    let provider = HttpProvider::new(url, Extractor::default());
    let results = stubs.resolver().resolve([provider]).await.unwrap();

    assert_eq!(value(&results, "raw.test").as_deref(), Some("198.51.100.4\n"));
}

#[tokio::test]
async fn status_code_is_not_inspected() {
    let mut stubs = Stubs::start().await;
    let url = stubs
        .respond("teapot.test", ResponseTemplate::new(418).set_body_string("192.0.2.1"))
        .await;

    let results = stubs.resolver().resolve([HttpProvider::raw(url)]).await.unwrap();

    assert_eq!(value(&results, "teapot.test").as_deref(), Some("192.0.2.1"));
}

#[tokio::test]
async fn malformed_json_is_reported_with_body() {
    let mut stubs = Stubs::start().await;
    let url = stubs.json("broken.test", "<html>rate limited</html>").await;

    let results = stubs
        .resolver()
        .resolve([HttpProvider::json(url, "ip")])
        .await
        .unwrap();

    let err = results.get("broken.test").and_then(Outcome::error).unwrap();
    assert!(err.starts_with("Unable to parse result as JSON: <html>rate limited</html> ("));
}

#[tokio::test]
async fn requests_run_concurrently() {
    const DELAY: Duration = Duration::from_millis(500);

    let mut stubs = Stubs::start().await;
    let mut providers = Vec::new();
    for n in 1..=4 {
        let response = ResponseTemplate::new(200)
            .set_body_string(format!("10.1.0.{}", n))
            .set_delay(DELAY);
        let url = stubs.respond(&format!("slow-{}.test", n), response).await;
        providers.push(HttpProvider::raw(url));
    }

    let resolver = stubs.resolver();
    let started = Instant::now();
    let results = resolver.resolve(&providers).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(results.values().count(), 4);
    assert!(elapsed >= DELAY);
    assert!(elapsed < DELAY * 3, "took {:?}, requests look serialized", elapsed);
}

#[tokio::test]
async fn timeout_turns_into_error() {
    let mut stubs = Stubs::start().await;
    let hung = stubs
        .respond(
            "hung.test",
            ResponseTemplate::new(200)
                .set_body_string("10.2.0.1")
                .set_delay(Duration::from_secs(5)),
        )
        .await;
    let fast = stubs.json("fast.test", r#"{"ip":"10.2.0.2"}"#).await;

    let resolver = stubs.resolver_with(Resolver::builder().timeout(Duration::from_millis(200)));
    let started = Instant::now();
    let results = resolver
        .resolve([HttpProvider::raw(hung), HttpProvider::json(fast, "ip")])
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(results.get("hung.test").is_some_and(Outcome::is_error));
    assert_eq!(value(&results, "fast.test").as_deref(), Some("10.2.0.2"));
}

#[tokio::test]
async fn empty_registry_does_nothing() {
    let results = pubip::resolve(Registry::default()).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn malformed_url_is_a_provider_error() {
    let results = pubip::resolve([HttpProvider::raw("not a url")]).await.unwrap();

    let err = results.get("not a url").and_then(Outcome::error).unwrap();
    assert!(err.starts_with("Unknown request error: "));
}

#[tokio::test]
async fn both_families_resolve_independently() {
    let mut stubs = Stubs::start().await;
    let v4 = stubs.json("four.test", r#"{"ip":"192.0.2.10"}"#).await;
    let v6 = stubs
        .respond("six.test", ResponseTemplate::new(200).set_body_string("2001:db8::10"))
        .await;
    let dead = stubs.refusing("dead.test");

    let ipv4 = Registry::new([HttpProvider::json(v4, "ip")]);
    let ipv6 = Registry::new([HttpProvider::raw(v6), HttpProvider::raw(dead)]);

    let (ipv4, ipv6) = pubip::resolve_both(&stubs.resolver(), &ipv4, &ipv6)
        .await
        .unwrap();

    assert_eq!(ipv4.len(), 1);
    assert_eq!(value(&ipv4, "four.test").as_deref(), Some("192.0.2.10"));
    assert_eq!(ipv6.len(), 2);
    assert_eq!(value(&ipv6, "six.test").as_deref(), Some("2001:db8::10"));
    assert!(ipv6.get("dead.test").is_some_and(Outcome::is_error));
}
