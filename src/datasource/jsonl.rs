//! Replay source over a newline-delimited JSON export of decoded logs.

use super::{DataSourceError, EventSource};
use crate::domain::{sort_events_canonical, EventPosition, LogEvent};
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

/// One `LogEvent` per line. Blank lines are skipped; lines may be in any order.
#[derive(Debug, Clone)]
pub struct JsonlEventSource {
    events: Vec<LogEvent>,
}

impl JsonlEventSource {
    /// Read and canonically order the whole file.
    ///
    /// # Errors
    /// Fails on unreadable files, undecodable lines, or two logs claiming the same position.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DataSourceError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let source = Self::from_str_lines(&content)?;
        info!(path = %path.display(), events = source.events.len(), "Loaded event replay file");
        Ok(source)
    }

    pub fn from_str_lines(content: &str) -> Result<Self, DataSourceError> {
        let mut events = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let event: LogEvent =
                serde_json::from_str(trimmed).map_err(|e| DataSourceError::ParseError {
                    line: idx + 1,
                    message: e.to_string(),
                })?;
            events.push(event);
        }

        sort_events_canonical(&mut events);
        if let Some(dup) = events
            .windows(2)
            .find(|pair| pair[0].position() == pair[1].position())
        {
            return Err(DataSourceError::DuplicatePosition(dup[0].position()));
        }

        Ok(Self { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl EventSource for JsonlEventSource {
    async fn fetch_after(
        &self,
        after: Option<EventPosition>,
        limit: usize,
    ) -> Result<Vec<LogEvent>, DataSourceError> {
        let start = match after {
            Some(pos) => self.events.partition_point(|e| e.position() <= pos),
            None => 0,
        };
        Ok(self.events.iter().skip(start).take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MARKET: &str = "0x00000000000000000000000000000000000000a1";

    fn line(block: u64, log: u64) -> String {
        format!(
            r#"{{"address":"{m}","blockNumber":{b},"blockTimestamp":1000,"txHash":"0xAA","logIndex":{l},"event":{{"name":"MarketListed","params":{{"cToken":"{m}"}}}}}}"#,
            m = MARKET,
            b = block,
            l = log
        )
    }

    #[tokio::test]
    async fn test_open_sorts_and_pages() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", line(5, 0)).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{}", line(1, 2)).unwrap();
        writeln!(file, "{}", line(1, 1)).unwrap();

        let source = JsonlEventSource::open(file.path()).await.unwrap();
        assert_eq!(source.len(), 3);

        let first = source.fetch_after(None, 2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].log_index, 1);
        assert_eq!(first[1].log_index, 2);

        let rest = source
            .fetch_after(Some(first[1].position()), 10)
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].block_number, 5);
        assert_eq!(rest[0].tx_hash.as_str(), "0xaa");

        let done = source.fetch_after(Some(rest[0].position()), 10).await.unwrap();
        assert!(done.is_empty());
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let content = format!("{}\nnot json\n", line(1, 0));
        let err = JsonlEventSource::from_str_lines(&content).unwrap_err();
        assert!(matches!(err, DataSourceError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_duplicate_position_rejected() {
        let content = format!("{}\n{}\n", line(1, 0), line(1, 0));
        assert!(matches!(
            JsonlEventSource::from_str_lines(&content),
            Err(DataSourceError::DuplicatePosition(_))
        ));
    }
}
