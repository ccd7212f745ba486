use {
    crate::{error::FetchError, outcome::Outcome, providers::HttpProvider},
    bytes::Bytes,
    reqwest::Client,
    tracing::{debug, instrument},
};

/// Performs the HTTP request to the given provider using the shared `client`
/// and reads the address out of the response.
///
/// Never fails: whatever goes wrong ends up as [Outcome::Error].
#[instrument(name = "fetch", skip_all, fields(host = %provider.host()))]
pub(crate) async fn fetch(client: &Client, provider: &HttpProvider) -> Outcome {
    let result = get_body(client, provider)
        .await
        .and_then(|body| provider.response_decode(body));

    match &result {
        Ok(value) => debug!(%value, "provider responded"),
        Err(err) => debug!("provider cannot be used: {}", err),
    }

    result.into()
}

// The status code is only logged, the body is decoded whatever it is.
async fn get_body(client: &Client, provider: &HttpProvider) -> Result<Bytes, FetchError> {
    let response = client.get(provider.url()).send().await?;
    debug!(status = %response.status(), "response received");

    Ok(response.bytes().await?)
}
