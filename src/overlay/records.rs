//! HTTP client for the records service
//!
//! `GET {base}/wrs` and `GET {base}/pbs`, both taking `steam_id`,
//! `map_identifier` and `mode` query parameters and answering with a JSON
//! array `[tp, pro]` where each entry is a record or `null`.

use reqwest::blocking::Client;
use tracing::{debug, trace};

use crate::core::{FetchError, RecordPair, RecordsQuery, RecordsSource};

use super::config::RecordsSettings;

pub struct HttpRecordsClient {
    client: Client,
    base_url: String,
}

impl HttpRecordsClient {
    pub fn new(settings: &RecordsSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| FetchError::Transport(format!("http client init failed: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
        })
    }

    fn lookup(&self, endpoint: &str, query: &RecordsQuery) -> Result<RecordPair, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        trace!(url = %url, map = %query.map_name, "[RECORDS] Request");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("steam_id", query.steam_id.as_str()),
                ("map_identifier", query.map_name.as_str()),
                ("mode", query.mode.api_name()),
            ])
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let records = response
            .json::<RecordPair>()
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        debug!(
            endpoint,
            tp = records.tp.is_some(),
            pro = records.pro.is_some(),
            "[RECORDS] Lookup complete"
        );
        Ok(records)
    }
}

impl RecordsSource for HttpRecordsClient {
    fn world_records(&self, query: &RecordsQuery) -> Result<RecordPair, FetchError> {
        self.lookup("wrs", query)
    }

    fn personal_bests(&self, query: &RecordsQuery) -> Result<RecordPair, FetchError> {
        self.lookup("pbs", query)
    }
}
