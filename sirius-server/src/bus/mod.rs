pub mod parse;

use anyhow::{anyhow, Context, Result};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use sirius_types::BusPosition;

/// Fetch the raw feed document from the upstream telematics endpoint.
/// Caching is disabled so every call sees the latest positions.
pub async fn fetch_feed(http: &reqwest::Client, url: &str) -> Result<String> {
    let response = http
        .get(url)
        .header(ACCEPT, "application/xml,text/xml,*/*")
        .header(CACHE_CONTROL, "no-store")
        .send()
        .await
        .context("Upstream bus feed request failed")?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Upstream bus feed responded with status {}",
            response.status()
        ));
    }

    response
        .text()
        .await
        .context("Failed to read upstream bus feed body")
}

/// Three-tier document lookup: live upstream, then the last-known snapshot
/// file, then a minimal well-formed empty document. The response is always
/// schema-compatible XML, so the consuming parser never sees malformed input.
pub async fn locations_document(
    http: &reqwest::Client,
    upstream_url: &str,
    snapshot_path: &Path,
) -> String {
    match fetch_feed(http, upstream_url).await {
        Ok(xml) => return xml,
        Err(e) => {
            tracing::warn!("Bus feed upstream failed, trying snapshot: {}", e);
        }
    }

    match tokio::fs::read_to_string(snapshot_path).await {
        Ok(xml) => xml,
        Err(e) => {
            tracing::warn!("Bus feed snapshot unavailable, serving empty document: {}", e);
            parse::EMPTY_DOCUMENT.to_string()
        }
    }
}

/// Holds the latest parsed vehicle positions, refreshed by a polling task.
#[derive(Clone, Default)]
pub struct BusTracker {
    positions: Arc<RwLock<Vec<BusPosition>>>,
}

impl BusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest known positions (atomic snapshot)
    pub fn latest(&self) -> Vec<BusPosition> {
        self.positions.read().unwrap().clone()
    }

    /// Replace the position set from a feed document and refresh the
    /// snapshot file so the proxy's second fallback tier stays current.
    fn apply(&self, xml: &str, snapshot_path: &Path) {
        match parse::parse_positions(xml) {
            Ok(positions) => {
                tracing::debug!("Bus poll: {} vehicles", positions.len());
                *self.positions.write().unwrap() = positions;
                if let Err(e) = std::fs::write(snapshot_path, xml) {
                    tracing::warn!("Failed to refresh bus snapshot file: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!("Bus poll returned an unparseable document: {}", e);
            }
        }
    }

    /// Poll the upstream on a fixed interval. Each cycle cancels any still
    /// in-flight previous request before issuing its own, so a stale
    /// response can never replace fresher positions.
    pub async fn run(
        self,
        http: reqwest::Client,
        upstream_url: String,
        snapshot_path: PathBuf,
        poll_interval: Duration,
    ) {
        let mut interval = tokio::time::interval(poll_interval);
        let mut in_flight: Option<CancellationToken> = None;

        loop {
            interval.tick().await;

            if let Some(previous) = in_flight.take() {
                previous.cancel();
            }
            let token = CancellationToken::new();
            in_flight = Some(token.clone());

            let tracker = self.clone();
            let http = http.clone();
            let url = upstream_url.clone();
            let path = snapshot_path.clone();

            tokio::spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::debug!("Bus poll superseded by a newer cycle");
                    }
                    result = fetch_feed(&http, &url) => match result {
                        Ok(xml) => tracker.apply(&xml, &path),
                        Err(e) => tracing::warn!("Bus poll failed: {}", e),
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_replaces_positions_and_writes_snapshot() {
        let tracker = BusTracker::new();
        let snapshot = std::env::temp_dir().join("sirius_test_bus_snapshot.xml");
        let _ = std::fs::remove_file(&snapshot);

        let xml = r#"<ArrayOfUltimoAvlViewModel>
            <UltimoAvlViewModel>
                <Lat>7.1</Lat><Lng>-73.1</Lng><Placa>AAA111</Placa>
                <TipoVehiculo>Bus</TipoVehiculo><NombreEvento>Posicion</NombreEvento>
                <FhEvento>2026-08-30T10:00:00</FhEvento>
            </UltimoAvlViewModel>
        </ArrayOfUltimoAvlViewModel>"#;

        tracker.apply(xml, &snapshot);
        assert_eq!(tracker.latest().len(), 1);
        assert_eq!(tracker.latest()[0].plate, "AAA111");

        let written = std::fs::read_to_string(&snapshot).expect("snapshot should exist");
        assert_eq!(written, xml);

        // An unparseable document must not clobber known-good state
        tracker.apply("<broken", &snapshot);
        assert_eq!(tracker.latest().len(), 1);

        let _ = std::fs::remove_file(&snapshot);
    }

    #[tokio::test]
    async fn test_locations_document_falls_back_to_snapshot_then_empty() {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        // Unroutable upstream forces the fallback path
        let upstream = "http://127.0.0.1:1/feed";

        let snapshot = std::env::temp_dir().join("sirius_test_bus_fallback.xml");
        std::fs::write(&snapshot, parse::EMPTY_DOCUMENT).unwrap();

        let body = locations_document(&http, upstream, &snapshot).await;
        assert_eq!(body, parse::EMPTY_DOCUMENT);

        std::fs::remove_file(&snapshot).unwrap();
        let body = locations_document(&http, upstream, &snapshot).await;
        assert_eq!(body, parse::EMPTY_DOCUMENT);
        assert!(parse::parse_positions(&body).unwrap().is_empty());
    }
}
