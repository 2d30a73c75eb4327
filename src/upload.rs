use anyhow::Context;
use chrono::{DateTime, Local};
use embedded_nal_async::{AddrType, Dns};
use nourl::Url;
use reqwless::{
    client::HttpClient,
    headers::ContentType,
    request::{Method, RequestBuilder},
};
use serde::Serialize;

use crate::{
    measurement::Measurement,
    net::{TokioDns, TokioTcp},
};

const RX_BUF_SIZE: usize = 4096;

/// JSON body posted to the dashboard. Readings that were not fresh in the
/// sampled cycle are left out rather than repeated.
#[derive(Debug, Serialize, PartialEq)]
pub struct UploadPayload {
    pub timestamp: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvoc: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co2eq: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm1p0: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm1p0_2p5: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm2p5_4p0: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm4p0_10p0: Option<f32>,
}

impl UploadPayload {
    /// Returns `None` when the cycle produced nothing worth sending.
    pub fn from_measurement(measurement: &Measurement) -> Option<Self> {
        if measurement.is_empty() {
            return None;
        }

        let climate = measurement.climate.as_ref();
        let iaq = measurement.iaq.as_ref();
        let bands = measurement.particulate.as_ref().map(|pm| pm.mass_bands());

        Some(Self {
            timestamp: measurement.timestamp,
            temperature: climate.map(|c| c.temperature()),
            humidity: climate.map(|c| c.humidity()),
            tvoc: iaq.map(|i| i.tvoc_ppb),
            co2eq: iaq.map(|i| i.co2_eq_ppm),
            pm1p0: bands.map(|b| b.pm1p0),
            pm1p0_2p5: bands.map(|b| b.pm1p0_2p5),
            pm2p5_4p0: bands.map(|b| b.pm2p5_4p0),
            pm4p0_10p0: bands.map(|b| b.pm4p0_10p0),
        })
    }
}

/// Rate limit: every second loop iteration, starting with the first.
#[derive(Debug, Default)]
pub struct UploadSchedule {
    count: u32,
}

impl UploadSchedule {
    pub fn tick(&mut self) -> bool {
        let due = self.count % 2 == 0;
        self.count = self.count.wrapping_add(1);
        due
    }
}

#[derive(Debug)]
pub struct Uplink {
    endpoint: String,
    tcp: TokioTcp,
    dns: TokioDns,
    schedule: UploadSchedule,
    rx_buf: Box<[u8]>,
}

impl Uplink {
    /// Resolves the endpoint host once. Success here is what marks the
    /// network as up for the rest of the run.
    pub async fn connect(endpoint: &str) -> Result<Self, anyhow::Error> {
        let url = Url::parse(endpoint)
            .map_err(|e| anyhow::anyhow!("Invalid upload endpoint {endpoint}: {e:?}"))?;

        let dns = TokioDns;
        let ip = dns
            .get_host_by_name(url.host(), AddrType::Either)
            .await
            .with_context(|| format!("Failed to resolve {}", url.host()))?;
        log::info!(
            "Upload endpoint {} reachable at {}:{}",
            url.host(),
            ip,
            url.port_or_default()
        );

        Ok(Self {
            endpoint: endpoint.to_string(),
            tcp: TokioTcp,
            dns,
            schedule: UploadSchedule::default(),
            rx_buf: vec![0u8; RX_BUF_SIZE].into_boxed_slice(),
        })
    }

    pub fn due(&mut self) -> bool {
        self.schedule.tick()
    }

    pub async fn send(&mut self, payload: &UploadPayload) -> Result<(), anyhow::Error> {
        let body = serde_json::to_vec(payload).context("Failed to serialize upload payload")?;

        let mut client = HttpClient::new(&self.tcp, &self.dns);
        let mut request = client
            .request(Method::POST, &self.endpoint)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to {}: {e:?}", self.endpoint))?
            .body(body.as_slice())
            .content_type(ContentType::ApplicationJson);

        let response = request
            .send(&mut self.rx_buf)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to post to {}: {e:?}", self.endpoint))?;

        let status = response.status;
        if !status.is_successful() {
            return Err(anyhow::anyhow!("Upload rejected with status {status:?}"));
        }

        log::debug!("Upload accepted with status {status:?}");
        Ok(())
    }
}
